//! Request/response delivery between the background and page contexts.

use async_trait::async_trait;
use eisenhower_rs_config::TimingConfig;
use eisenhower_rs_protocol::{Request, Response};
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Delivery failures. Only [`TransportError::NotReady`] is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("receiving end is not ready: {0}")]
    NotReady(String),
    #[error("page context is gone")]
    Closed,
    #[error("page context dropped the request without replying")]
    NoReply,
}

/// Sends one request and waits for its single reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request).await
    }
}

/// Bounded retry with a fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self {
            max_retries: timing.retry_attempts,
            backoff: timing.retry_backoff(),
        }
    }
}

/// Retries deliveries that failed because the page was not listening yet.
///
/// Attempts of one send are strictly sequential.
#[derive(Debug)]
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryingTransport<T> {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let action = request.action();
        let mut retries = 0;
        loop {
            match self.inner.send(request.clone()).await {
                Err(TransportError::NotReady(reason)) if retries < self.policy.max_retries => {
                    retries += 1;
                    debug!(
                        "page not ready, retrying (action={action}, retry={retries}/{}, reason={reason})",
                        self.policy.max_retries
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(err) => {
                    warn!("dispatch failed (action={action}, retries={retries}, error={err})");
                    return Err(err);
                }
                Ok(response) => return Ok(response),
            }
        }
    }
}

/// A request travelling to the page agent together with its reply slot.
#[derive(Debug)]
pub struct Envelope {
    pub request: Request,
    reply: oneshot::Sender<Response>,
}

impl Envelope {
    /// Answer the request. Consumes the envelope, so a reply is sent at most once.
    pub fn respond(self, response: Response) {
        if self.reply.send(response).is_err() {
            debug!("requester went away before the reply");
        }
    }
}

/// In-process transport to a [`PageInbox`].
#[derive(Debug, Clone)]
pub struct LocalTransport {
    sender: mpsc::Sender<Envelope>,
    ready: Arc<AtomicBool>,
}

/// Receiving side owned by the page agent.
#[derive(Debug)]
pub struct PageInbox {
    receiver: mpsc::Receiver<Envelope>,
    ready: Arc<AtomicBool>,
}

impl LocalTransport {
    /// Connected transport and inbox. Sends fail with `NotReady` until the
    /// inbox is marked ready.
    pub fn channel(buffer: usize) -> (LocalTransport, PageInbox) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let ready = Arc::new(AtomicBool::new(false));
        (
            LocalTransport {
                sender,
                ready: ready.clone(),
            },
            PageInbox { receiver, ready },
        )
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(TransportError::NotReady(
                "page agent is not listening".to_string(),
            ));
        }
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { request, reply })
            .await
            .map_err(|_| TransportError::Closed)?;
        response.await.map_err(|_| TransportError::NoReply)
    }
}

impl PageInbox {
    /// Start accepting requests.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }
}

impl Drop for PageInbox {
    fn drop(&mut self) {
        self.ready.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalTransport, Transport, TransportError};
    use eisenhower_rs_protocol::{Request, Response};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn local_transport_needs_a_ready_inbox() {
        let (transport, mut inbox) = LocalTransport::channel(4);
        assert!(matches!(
            transport.send(Request::GetPriorities {}).await,
            Err(TransportError::NotReady(_))
        ));

        inbox.mark_ready();
        let server = tokio::spawn(async move {
            let envelope = inbox.recv().await.expect("envelope");
            assert_eq!(envelope.request, Request::GetPriorities {});
            envelope.respond(Response::Opened { id: "x".into() });
            inbox
        });
        assert_eq!(
            transport.send(Request::GetPriorities {}).await,
            Ok(Response::Opened { id: "x".into() })
        );
        drop(server.await.expect("server"));
        assert!(matches!(
            transport.send(Request::GetPriorities {}).await,
            Err(TransportError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn dropped_envelope_is_no_reply() {
        let (transport, mut inbox) = LocalTransport::channel(1);
        inbox.mark_ready();
        let server = tokio::spawn(async move {
            let envelope = inbox.recv().await.expect("envelope");
            drop(envelope);
            inbox
        });
        assert_eq!(
            transport.send(Request::ExportData {}).await,
            Err(TransportError::NoReply)
        );
        let _inbox = server.await.expect("server");
    }
}
