use async_trait::async_trait;
use eisenhower_rs_core::{Transport, TransportError};
use eisenhower_rs_protocol::{Request, Response};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Transport that is "not ready" for the first few sends, then answers
/// every request with a canned response.
#[derive(Debug)]
pub struct FlakyTransport {
    failures_left: Mutex<u32>,
    response: Response,
    attempts: Mutex<Vec<(Instant, Request)>>,
}

impl FlakyTransport {
    pub fn new(failures: u32, response: Response) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            response,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Never becomes ready.
    pub fn unreachable() -> Self {
        Self::new(u32::MAX, Response::Opened { id: String::new() })
    }

    /// When each send happened, in order.
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().iter().map(|(at, _)| *at).collect()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.attempts
            .lock()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.attempts.lock().push((Instant::now(), request));
        let mut failures = self.failures_left.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(TransportError::NotReady("receiving end does not exist".to_string()));
        }
        Ok(self.response.clone())
    }
}
