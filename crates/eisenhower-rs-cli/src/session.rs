//! A page snapshot served by a live page agent for the length of a command.

use crate::app::App;
use crate::cli::PageArgs;
use anyhow::Context;
use eisenhower_rs_core::{
    Dispatcher, LocalTransport, PageAgent, RetryPolicy, RetryingTransport,
};
use eisenhower_rs_dom::{Document, NodeId};
use log::debug;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INBOX_BUFFER: usize = 8;

/// Load a snapshot and attach it to `url`.
pub async fn load_snapshot(path: &Path, url: &str) -> anyhow::Result<Document> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    Document::parse_html_with_url(&source, url).context("invalid page url")
}

pub struct PageSession {
    agent: Arc<PageAgent>,
    dispatcher: Dispatcher,
    runner: JoinHandle<()>,
    mutations: mpsc::Sender<Vec<NodeId>>,
}

impl PageSession {
    pub async fn open(app: &App, page: &PageArgs) -> anyhow::Result<Self> {
        let document = load_snapshot(&page.snapshot, &page.url).await?;
        let settings = app.settings().await;
        let agent = Arc::new(
            PageAgent::new(document, app.config(), &settings, app.store(), app.clock())
                .context("failed to start page agent")?,
        );
        let (transport, inbox) = LocalTransport::channel(INBOX_BUFFER);
        let (mutations, mutation_rx) = mpsc::channel(INBOX_BUFFER);
        let runner = tokio::spawn(agent.clone().run(inbox, app.subscribe(), mutation_rx));
        let transport =
            RetryingTransport::new(transport, RetryPolicy::from_timing(&app.config().timing));
        let dispatcher = Dispatcher::new(app.config(), app.store(), Arc::new(transport))
            .context("failed to build dispatcher")?;
        debug!("page session opened (snapshot={})", page.snapshot.display());
        Ok(Self {
            agent,
            dispatcher,
            runner,
            mutations,
        })
    }

    pub fn agent(&self) -> &PageAgent {
        &self.agent
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Stop the agent and return the annotated page.
    pub async fn close(self) -> anyhow::Result<String> {
        let Self {
            agent,
            dispatcher,
            runner,
            mutations,
        } = self;
        drop(dispatcher);
        drop(mutations);
        runner.await.context("page agent stopped abnormally")?;
        Ok(agent.with_document(|doc| doc.to_html()))
    }

    /// Close and write the page to `output` when one was requested.
    pub async fn finish(self, output: Option<&Path>) -> anyhow::Result<()> {
        let html = self.close().await?;
        if let Some(output) = output {
            tokio::fs::write(output, html)
                .await
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
        Ok(())
    }
}
