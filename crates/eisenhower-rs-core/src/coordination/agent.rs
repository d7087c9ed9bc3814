//! The page-resident context: owns the document and answers requests.

use super::scheduler::ScanScheduler;
use super::transport::PageInbox;
use crate::classifier::classify;
use crate::clock::Clock;
use crate::error::EisenhowerError;
use crate::renderer::{Renderer, is_annotation};
use crate::resolver::{ItemLocator, PageResolver, ResolveMode, Resolution, Resolver, Target};
use chrono::{TimeZone, Utc};
use eisenhower_rs_config::{EisenhowerConfig, HostAllowList, TimingConfig};
use eisenhower_rs_dom::{Document, NodeId, Selector};
use eisenhower_rs_protocol::{ItemKind, Notice, PriorityRecord, Request, Response, Settings};
use eisenhower_rs_store::{PriorityStore, StoreEvent};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, sleep, sleep_until};

const MIN_SUBJECT_CHARS: usize = 3;

/// Which resolved list rows get highlighted after a categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowHighlight {
    /// Only rows with `role="row"`.
    RowsOnly,
    Always,
}

/// Resolver, renderer and store wired to one page.
///
/// The document sits behind a mutex so requests, store events and mutation
/// batches can be handled from one task; no guard is held across an await.
pub struct PageAgent {
    document: Mutex<Document>,
    resolver: Resolver,
    page_resolver: PageResolver,
    locator: ItemLocator,
    renderer: Renderer,
    store: Arc<dyn PriorityStore>,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    active: bool,
    scheduler: Mutex<ScanScheduler>,
    notices: Mutex<Vec<Notice>>,
    processing_click: AtomicBool,
    selected_rows: Selector,
}

impl std::fmt::Debug for PageAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageAgent")
            .field("active", &self.active)
            .field("state", &self.scheduler.lock().state())
            .finish_non_exhaustive()
    }
}

impl PageAgent {
    /// Build an agent for `document`.
    ///
    /// Activation is decided here, once: the mail features only run when the
    /// document's hostname is a builtin or custom mail host.
    pub fn new(
        document: Document,
        config: &EisenhowerConfig,
        settings: &Settings,
        store: Arc<dyn PriorityStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EisenhowerError> {
        let hosts = HostAllowList::new(&config.hosts.builtin, &settings.custom_exchange_urls);
        let hostname = document.hostname().unwrap_or_default().to_string();
        let active = hosts.is_allowed(&hostname);
        info!("page agent created (host={hostname}, active={active})");
        Ok(Self {
            resolver: Resolver::new(&config.locale, clock.clone())?,
            page_resolver: PageResolver::new(&config.locale)?,
            locator: ItemLocator::new()?,
            renderer: Renderer::new()?,
            document: Mutex::new(document),
            store,
            clock,
            timing: config.timing.clone(),
            active,
            scheduler: Mutex::new(ScanScheduler::from_timing(&config.timing)),
            notices: Mutex::new(Vec::new()),
            processing_click: AtomicBool::new(false),
            selected_rows: Selector::parse(r#"[aria-selected="true"]"#)?,
        })
    }

    /// Whether the mail features run on this page.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.document.lock())
    }

    /// Change the document the way the host application would.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.document.lock())
    }

    /// Notices shown since the last call, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn scheduler(&self) -> ScanScheduler {
        self.scheduler.lock().clone()
    }

    /// Answer one request. Every request gets exactly one response.
    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        debug!("page request received (action={action})");
        let response = match request {
            Request::CategorizeFromContextMenu { .. }
            | Request::SavePriority { .. }
            | Request::OpenEmail { .. }
            | Request::RemoveHighlight { .. }
                if !self.active =>
            {
                warn!("mail request on inactive page (action={action})");
                Response::Failed {
                    error: "page agent is not active on this host".to_string(),
                    notice: Some(Notice::warning("⚠️ Eisenhower is not enabled for this site")),
                }
            }
            Request::CategorizeFromContextMenu {
                importance,
                urgency,
            } => {
                self.categorize(
                    importance,
                    urgency,
                    ResolveMode::PreferListSelection,
                    RowHighlight::RowsOnly,
                )
                .await
            }
            Request::SavePriority {
                importance,
                urgency,
            } => {
                self.categorize(
                    importance,
                    urgency,
                    ResolveMode::ListSelectionOnly,
                    RowHighlight::Always,
                )
                .await
            }
            Request::CategorizeWebPage {
                importance,
                urgency,
            } => self.categorize_page(importance, urgency).await,
            Request::GetPriorities {} => match self.store.get_all(ItemKind::Email).await {
                Ok(priorities) => Response::Priorities { priorities },
                Err(err) => store_failure(action, err),
            },
            Request::ExportData {} => {
                let emails = self.store.get_all(ItemKind::Email).await;
                let web_links = self.store.get_all(ItemKind::WebPage).await;
                match (emails, web_links) {
                    (Ok(emails), Ok(web_links)) => Response::Export { emails, web_links },
                    (Err(err), _) | (_, Err(err)) => store_failure(action, err),
                }
            }
            Request::OpenEmail {
                email_id,
                email_subject,
                email_timestamp,
            } => {
                self.open_item(email_id, email_subject.as_deref(), email_timestamp)
                    .await
            }
            Request::RemoveHighlight { email_id } => {
                self.clear_item(ItemKind::Email, &email_id);
                Response::Removed {
                    id: Some(email_id),
                    notice: None,
                }
            }
            Request::RemoveWebPagePriority {} => self.remove_page_priority().await,
            Request::RenameLabel { kind, id, label } => {
                match self.store.patch_label(kind, &id, label).await {
                    Ok(applied) => Response::Renamed { id, applied },
                    Err(err) => store_failure(action, err),
                }
            }
            Request::DeletePriority { kind, id } => match self.store.delete(kind, &id).await {
                Ok(removed) => {
                    self.clear_item(kind, &id);
                    Response::Removed {
                        id: removed.then_some(id),
                        notice: Some(Notice::success("✅ Priority removed")),
                    }
                }
                Err(err) => store_failure(action, err),
            },
        };
        if let Some(notice) = response.notice() {
            self.notices.lock().push(notice.clone());
        }
        response
    }

    async fn categorize(
        &self,
        importance: i32,
        urgency: i32,
        mode: ResolveMode,
        rows: RowHighlight,
    ) -> Response {
        let resolution = {
            let doc = self.document.lock();
            self.resolver.resolve(&doc, mode)
        };
        let Resolution::Found {
            id,
            subject,
            target,
        } = resolution
        else {
            return not_found("no item located", "⚠️ Open an email to categorize it");
        };
        if subject.chars().count() < MIN_SUBJECT_CHARS {
            warn!("resolved subject too short (id={id})");
            return not_found("invalid subject", "⚠️ No open or selected email");
        }

        let record = PriorityRecord::new(id, subject, importance, urgency, self.clock.now());
        let category = classify(importance, urgency);
        if let Err(err) = self.store.upsert(ItemKind::Email, record.clone()).await {
            return store_failure("categorize", err);
        }
        info!(
            "priority stored (kind=email, id={}, category={category})",
            record.id
        );

        {
            let mut doc = self.document.lock();
            if let Target::ListItem(node) = target
                && (rows == RowHighlight::Always || doc.attr(node, "role") == Some("row"))
                && let Err(err) = self.renderer.highlight(&mut doc, node, &record)
            {
                warn!("highlight failed (id={}, error={err})", record.id);
            }
            if let Err(err) = self.renderer.show_reading_pane_badge(&mut doc, &record) {
                warn!("badge failed (id={}, error={err})", record.id);
            }
        }

        Response::Categorized {
            notice: Notice::success(format!("✅ Email added: {}", category.label())),
            record,
            category,
        }
    }

    async fn categorize_page(&self, importance: i32, urgency: i32) -> Response {
        let page = {
            let doc = self.document.lock();
            self.page_resolver.resolve(&doc)
        };
        let Some(page) = page else {
            return not_found("page has no url", "⚠️ This page has no address to save");
        };
        let record = page.to_record(importance, urgency, self.clock.now());
        let category = classify(importance, urgency);
        if let Err(err) = self.store.upsert(ItemKind::WebPage, record.clone()).await {
            return store_failure("categorizeWebPage", err);
        }
        info!(
            "priority stored (kind=web_page, id={}, category={category})",
            record.id
        );
        if let Err(err) = self.renderer.show_page_badge(&mut self.document.lock(), &record) {
            warn!("page badge failed (url={}, error={err})", record.id);
        }
        Response::Categorized {
            notice: Notice::success(format!("✅ Page added: {}", category.label())),
            record,
            category,
        }
    }

    async fn remove_page_priority(&self) -> Response {
        let url = self.with_document(|doc| doc.url().map(|url| url.to_string()));
        let Some(url) = url else {
            return not_found("page has no url", "⚠️ This page has no address to remove");
        };
        match self.store.delete(ItemKind::WebPage, &url).await {
            Ok(removed) => {
                self.renderer.remove_page_badge(&mut self.document.lock());
                Response::Removed {
                    id: removed.then_some(url),
                    notice: Some(Notice::success("✅ Priority removed")),
                }
            }
            Err(err) => store_failure("removeWebPagePriority", err),
        }
    }

    async fn open_item(
        &self,
        id: String,
        subject: Option<&str>,
        timestamp_millis: Option<i64>,
    ) -> Response {
        let timestamp = timestamp_millis.and_then(|millis| Utc.timestamp_millis_opt(millis).single());
        let flashed = {
            let mut doc = self.document.lock();
            let node = self
                .locator
                .locate(&doc, self.resolver.cleaner(), &id, subject, timestamp);
            match node {
                Some(node) => self
                    .renderer
                    .flash(&mut doc, node)
                    .map(|previous| (node, previous)),
                None => {
                    warn!("item to open not found (id={id})");
                    return not_found("item not found", "⚠️ Email not found on this page");
                }
            }
        };
        let (node, previous) = match flashed {
            Ok(flashed) => flashed,
            Err(err) => return Response::failed(err.to_string()),
        };

        sleep(self.timing.open_highlight()).await;

        let mut doc = self.document.lock();
        if let Err(err) = self
            .renderer
            .restore_background(&mut doc, node, previous.as_deref())
        {
            warn!("restoring background failed (id={id}, error={err})");
        }
        self.select_row(&mut doc, node);
        info!("item opened (id={id})");
        Response::Opened { id }
    }

    /// Mark `node` as the selected, focused row.
    fn select_row(&self, doc: &mut Document, node: NodeId) {
        for selected in doc.select(&self.selected_rows) {
            if selected != node {
                doc.remove_attr(selected, "aria-selected");
            }
        }
        if let Err(err) = doc.set_attr(node, "aria-selected", "true") {
            warn!("row selection failed (error={err})");
        }
        doc.set_focus(Some(node));
    }

    /// Drop every annotation tied to `id`.
    ///
    /// The reading pane badge goes regardless of which item it shows.
    fn clear_item(&self, kind: ItemKind, id: &str) {
        let mut doc = self.document.lock();
        match kind {
            ItemKind::Email => {
                let row = self
                    .renderer
                    .highlighted_row(&doc, id)
                    .or_else(|| self.locator.by_id(&doc, id));
                if let Some(row) = row {
                    self.renderer.clear_highlight(&mut doc, row);
                    debug!("highlight removed (id={id})");
                }
                self.renderer.remove_reading_pane_badge(&mut doc);
            }
            ItemKind::WebPage => {
                if doc.url().is_some_and(|url| url.as_str() == id) {
                    self.renderer.remove_page_badge(&mut doc);
                }
            }
        }
    }

    /// Highlight every listed item that has a stored record, then refresh
    /// both badges. Returns how many rows were highlighted.
    pub async fn apply_saved_priorities(&self) -> usize {
        let mut highlighted = 0;
        if self.active {
            match self.store.get_all(ItemKind::Email).await {
                Ok(priorities) => {
                    let mut guard = self.document.lock();
                    let doc = &mut *guard;
                    for node in self.resolver.list_items(doc) {
                        let Some(record) = self
                            .resolver
                            .stored_key(doc, node)
                            .and_then(|key| priorities.get(&key))
                        else {
                            continue;
                        };
                        match self.renderer.highlight(doc, node, record) {
                            Ok(()) => highlighted += 1,
                            Err(err) => warn!("highlight failed (id={}, error={err})", record.id),
                        }
                    }
                }
                Err(err) => warn!("saved priorities unavailable (error={err})"),
            }
            self.refresh_reading_pane_badge().await;
        }
        self.refresh_page_badge().await;
        debug!("saved priorities applied (highlighted={highlighted})");
        highlighted
    }

    /// Show the stored category of the current item in the reading pane, or
    /// remove the badge when it has none. Returns whether a badge is shown.
    pub async fn refresh_reading_pane_badge(&self) -> bool {
        let key = self.with_document(|doc| self.current_item_key(doc));
        let record = match key {
            Some(key) => match self.store.get(ItemKind::Email, &key).await {
                Ok(record) => record,
                Err(err) => {
                    warn!("badge refresh skipped (id={key}, error={err})");
                    return false;
                }
            },
            None => None,
        };
        let mut doc = self.document.lock();
        match record {
            Some(record) => self
                .renderer
                .show_reading_pane_badge(&mut doc, &record)
                .unwrap_or_else(|err| {
                    warn!("badge failed (id={}, error={err})", record.id);
                    false
                }),
            None => {
                self.renderer.remove_reading_pane_badge(&mut doc);
                false
            }
        }
    }

    async fn refresh_page_badge(&self) {
        let url = self.with_document(|doc| doc.url().map(|url| url.to_string()));
        let Some(url) = url else {
            return;
        };
        match self.store.get(ItemKind::WebPage, &url).await {
            Ok(Some(record)) => {
                if let Err(err) = self.renderer.show_page_badge(&mut self.document.lock(), &record) {
                    warn!("page badge failed (url={url}, error={err})");
                }
            }
            Ok(None) => {
                self.renderer.remove_page_badge(&mut self.document.lock());
            }
            Err(err) => warn!("page badge refresh skipped (url={url}, error={err})"),
        }
    }

    fn current_item_key(&self, doc: &Document) -> Option<String> {
        let target = self.resolver.locate(doc, ResolveMode::PreferListSelection)?;
        match target {
            Target::ListItem(node) => self
                .resolver
                .stored_key(doc, node)
                .or_else(|| self.resolver.describe(doc, target).map(|(id, _)| id)),
            Target::ReadingPane(_) => self.resolver.describe(doc, target).map(|(id, _)| id),
        }
    }

    /// Bring the page in line with a store change made anywhere.
    pub async fn handle_store_event(&self, event: &StoreEvent) {
        match event {
            StoreEvent::Upserted {
                kind: ItemKind::Email,
                record,
            } => {
                if !self.active {
                    return;
                }
                {
                    let mut doc = self.document.lock();
                    let row = self
                        .locator
                        .by_id(&doc, &record.id)
                        .or_else(|| self.renderer.highlighted_row(&doc, &record.id));
                    if let Some(row) = row
                        && let Err(err) = self.renderer.highlight(&mut doc, row, record)
                    {
                        warn!("highlight failed (id={}, error={err})", record.id);
                    }
                }
                self.refresh_reading_pane_badge().await;
            }
            StoreEvent::Upserted {
                kind: ItemKind::WebPage,
                record,
            } => {
                let mut doc = self.document.lock();
                if doc.url().is_some_and(|url| url.as_str() == record.id)
                    && let Err(err) = self.renderer.show_page_badge(&mut doc, record)
                {
                    warn!("page badge failed (url={}, error={err})", record.id);
                }
            }
            StoreEvent::Deleted { kind, id } => self.clear_item(*kind, id),
            StoreEvent::Swept { kind, ids } => {
                for id in ids {
                    self.clear_item(*kind, id);
                }
            }
            StoreEvent::Cleared => {
                let mut doc = self.document.lock();
                let cleared = self.renderer.clear_all_highlights(&mut doc);
                self.renderer.remove_reading_pane_badge(&mut doc);
                self.renderer.remove_page_badge(&mut doc);
                debug!("annotations cleared (rows={cleared})");
            }
            StoreEvent::LabelPatched { kind, id, .. } => {
                debug!("label changed, nothing rendered (kind={kind}, id={id})");
            }
            StoreEvent::SettingsSaved(_) => {
                debug!("settings changed, activation applies from the next page load");
            }
        }
    }

    /// Feed a batch of inserted nodes to the scheduler.
    ///
    /// Nodes the renderer inserted are ignored. A batch that swaps the
    /// reading pane content also refreshes the badge, at most once per
    /// cooldown. Returns whether a re-scan is pending.
    pub async fn on_mutations(&self, inserted: &[NodeId], now: Instant) -> bool {
        if !self.active {
            return false;
        }
        let (relevant, pane_changed) = {
            let doc = self.document.lock();
            let relevant: Vec<NodeId> = inserted
                .iter()
                .copied()
                .filter(|node| !is_annotation(&doc, *node))
                .collect();
            let pane_changed = relevant
                .iter()
                .any(|node| self.renderer.is_reading_pane_change(&doc, *node));
            (relevant, pane_changed)
        };
        if relevant.is_empty() {
            return false;
        }
        let (scheduled, refresh) = {
            let mut scheduler = self.scheduler.lock();
            let scheduled = scheduler.on_mutation(now);
            let refresh = scheduled && pane_changed && scheduler.request_badge_refresh(now);
            (scheduled, refresh)
        };
        if refresh {
            self.refresh_reading_pane_badge().await;
        }
        scheduled
    }

    /// Run the pending re-scan if its deadline has passed.
    pub async fn scan_if_due(&self, now: Instant) -> Option<usize> {
        if !self.scheduler.lock().poll(now) {
            return None;
        }
        let highlighted = self.apply_saved_priorities().await;
        self.scheduler.lock().finish_scan();
        Some(highlighted)
    }

    /// A click on a list row: select it, let the reading pane settle, then
    /// refresh the badge. Clicks arriving meanwhile are dropped.
    pub async fn on_selection_click(&self, node: NodeId) -> bool {
        if !self.active || self.processing_click.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.mutate(|doc| self.select_row(doc, node));
        sleep(self.timing.selection_settle()).await;
        let shown = self.refresh_reading_pane_badge().await;
        self.processing_click.store(false, Ordering::Release);
        shown
    }

    /// Stop watching mutations; the scheduler stays detached.
    pub fn teardown(&self) {
        self.scheduler.lock().detach();
        info!("page agent detached");
    }

    /// Serve requests, store events and mutation batches until the inbox
    /// closes, then tear down.
    pub async fn run(
        self: Arc<Self>,
        mut inbox: PageInbox,
        mut events: broadcast::Receiver<StoreEvent>,
        mut mutations: mpsc::Receiver<Vec<NodeId>>,
    ) {
        let start = Instant::now();
        {
            let mut scheduler = self.scheduler.lock();
            scheduler.schedule_at(start + self.timing.initial_scan_delay());
            scheduler.watch_from(start + self.timing.observer_start_delay());
        }
        inbox.mark_ready();
        info!("page agent listening (active={})", self.active);

        let mut events_open = true;
        let mut mutations_open = true;
        loop {
            let deadline = self.scheduler.lock().deadline();
            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(envelope) = envelope else {
                        break;
                    };
                    let response = self.handle(envelope.request.clone()).await;
                    envelope.respond(response);
                }
                event = events.recv(), if events_open => match event {
                    Ok(event) => self.handle_store_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("store events lagged, rescanning (skipped={skipped})");
                        self.scheduler.lock().schedule_at(Instant::now());
                    }
                    Err(broadcast::error::RecvError::Closed) => events_open = false,
                },
                batch = mutations.recv(), if mutations_open => match batch {
                    Some(batch) => {
                        self.on_mutations(&batch, Instant::now()).await;
                    }
                    None => mutations_open = false,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.scan_if_due(Instant::now()).await;
                }
            }
        }
        self.teardown();
    }
}

fn not_found(reason: &str, message: &str) -> Response {
    Response::NotFound {
        reason: reason.to_string(),
        notice: Notice::warning(message),
    }
}

fn store_failure(action: &str, err: eisenhower_rs_store::StoreError) -> Response {
    warn!("store operation failed (action={action}, error={err})");
    Response::failed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::PageAgent;
    use crate::clock::Clock;
    use crate::coordination::ScanState;
    use chrono::{DateTime, TimeZone, Utc};
    use eisenhower_rs_config::EisenhowerConfig;
    use eisenhower_rs_dom::Document;
    use eisenhower_rs_protocol::{
        Category, ItemKind, Notice, PriorityRecord, Request, Response, Settings,
    };
    use eisenhower_rs_store::{MemoryStore, PriorityStore, StoreEvent};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tokio::time::Instant;

    struct Fixed;

    impl Clock for Fixed {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 5, 2, 9, 30, 0)
                .single()
                .unwrap_or_default()
        }
    }

    const INBOX: &str = r#"<html><body>
        <div role="listbox">
          <div role="row" aria-selected="true" data-convid="AAQk1"
               aria-label="Jane Doe; Project Kickoff Meeting Notes; 14:02; Unread"><span>Jane Doe</span></div>
          <div role="row" data-convid="AAQk2"
               aria-label="John Roe; Invoice for April services; 09:15"><span>John Roe</span></div>
        </div>
        <div role="main"><div class="_rp_o1"><div class="_rp_32">Mon</div></div></div>
      </body></html>"#;

    fn agent_at(url: &str, html: &str, store: Arc<dyn PriorityStore>) -> PageAgent {
        let doc = Document::parse_html_with_url(html, url).expect("doc");
        PageAgent::new(
            doc,
            &EisenhowerConfig::default(),
            &Settings::default(),
            store,
            Arc::new(Fixed),
        )
        .expect("agent")
    }

    fn outlook(store: Arc<dyn PriorityStore>) -> PageAgent {
        agent_at("https://outlook.office.com/mail/", INBOX, store)
    }

    #[tokio::test]
    async fn context_menu_tags_highlights_and_badges() {
        let store = Arc::new(MemoryStore::new());
        let agent = outlook(store.clone());
        let response = agent
            .handle(Request::CategorizeFromContextMenu {
                importance: 4,
                urgency: 4,
            })
            .await;
        let Response::Categorized {
            record, category, ..
        } = &response
        else {
            panic!("expected categorized, got {response:?}");
        };
        assert_eq!(*category, Category::DoFirst);
        assert_eq!(record.subject, "Project Kickoff Meeting Notes");
        assert_eq!(
            store.get(ItemKind::Email, "AAQk1").await.expect("get"),
            Some(record.clone())
        );
        agent.with_document(|doc| {
            let row = doc.find_by_attr("data-convid", "AAQk1").expect("row");
            assert_eq!(doc.attr(row, "data-priority-category"), Some("Do First"));
            assert!(doc.to_html().contains("eisenhower-badge"));
        });
        assert_eq!(
            agent.take_notices(),
            vec![Notice::success("✅ Email added: 🔴 Do First")]
        );
        assert!(agent.take_notices().is_empty());
    }

    #[tokio::test]
    async fn nothing_selected_is_a_warning() {
        let agent = agent_at(
            "https://outlook.office.com/mail/",
            "<p>empty mailbox</p>",
            Arc::new(MemoryStore::new()),
        );
        let response = agent
            .handle(Request::SavePriority {
                importance: 1,
                urgency: 1,
            })
            .await;
        assert!(!response.is_success());
        assert_eq!(
            response.notice(),
            Some(&Notice::warning("⚠️ Open an email to categorize it"))
        );
    }

    #[tokio::test]
    async fn inactive_hosts_refuse_mail_requests_but_tag_pages() {
        let store = Arc::new(MemoryStore::new());
        let agent = agent_at(
            "https://jira.example.com/browse/OPS-7",
            "<html><head><title>OPS-7</title></head><body><h1>Broken build</h1></body></html>",
            store.clone(),
        );
        assert!(!agent.is_active());
        let refused = agent
            .handle(Request::CategorizeFromContextMenu {
                importance: 4,
                urgency: 4,
            })
            .await;
        assert!(matches!(refused, Response::Failed { .. }));

        let tagged = agent
            .handle(Request::CategorizeWebPage {
                importance: 4,
                urgency: 2,
            })
            .await;
        assert!(tagged.is_success());
        assert_eq!(
            tagged.notice(),
            Some(&Notice::success("✅ Page added: 🟡 Schedule"))
        );
        let stored = store
            .get(ItemKind::WebPage, "https://jira.example.com/browse/OPS-7")
            .await
            .expect("get")
            .expect("record");
        assert_eq!(stored.subject, "Broken build");
        assert_eq!(stored.hostname.as_deref(), Some("jira.example.com"));
        assert!(agent.with_document(|doc| doc.to_html().contains("eisenhower-page-badge")));

        let removed = agent.handle(Request::RemoveWebPagePriority {}).await;
        assert_eq!(
            removed.notice(),
            Some(&Notice::success("✅ Priority removed"))
        );
        assert!(!agent.with_document(|doc| doc.to_html().contains("eisenhower-page-badge")));
    }

    #[tokio::test]
    async fn saved_priorities_are_applied_and_cleared_by_events() {
        let store = Arc::new(MemoryStore::new());
        let record = PriorityRecord::new("AAQk2", "Invoice for April services", 2, 4, Fixed.now());
        store
            .upsert(ItemKind::Email, record.clone())
            .await
            .expect("upsert");
        let agent = outlook(store.clone());

        assert_eq!(agent.apply_saved_priorities().await, 1);
        let row_category = |agent: &PageAgent| {
            agent.with_document(|doc| {
                let row = doc.find_by_attr("data-convid", "AAQk2").expect("row");
                doc.attr(row, "data-priority-category").map(str::to_string)
            })
        };
        assert_eq!(row_category(&agent).as_deref(), Some("Delegate"));

        agent
            .handle_store_event(&StoreEvent::Deleted {
                kind: ItemKind::Email,
                id: "AAQk2".to_string(),
            })
            .await;
        assert_eq!(row_category(&agent), None);
    }

    #[tokio::test(start_paused = true)]
    async fn own_annotations_do_not_schedule_scans() {
        let agent = outlook(Arc::new(MemoryStore::new()));
        let badge = agent.mutate(|doc| {
            let node = doc.create_element("div");
            doc.set_attr(node, crate::renderer::ANNOTATION_ATTR, "badge")
                .expect("attr");
            doc.append_child(doc.body(), node).expect("append");
            node
        });
        let now = Instant::now();
        assert!(!agent.on_mutations(&[badge], now).await);
        assert_eq!(agent.scheduler().state(), ScanState::Idle);

        let row = agent.mutate(|doc| {
            let node = doc.create_element("div");
            doc.append_child(doc.body(), node).expect("append");
            node
        });
        assert!(agent.on_mutations(&[row], now).await);
        assert_eq!(agent.scan_if_due(now).await, None);
        assert_eq!(
            agent.scan_if_due(now + agent.timing.debounce()).await,
            Some(0)
        );
        assert_eq!(agent.scheduler().state(), ScanState::Idle);

        agent.teardown();
        assert!(!agent.on_mutations(&[row], now).await);
    }
}
