//! Locating the item a user points at and deriving its id and subject.
//!
//! The host page is not an API: every step is an ordered [`Cascade`] of
//! structural guesses, most confident first. Absence of an element is a normal
//! outcome at every step, so resolution never fails; it reports
//! [`Resolution::NotFound`] instead.

mod cascade;
mod identifier;
mod lookup;
mod page;
mod subject;

pub use cascade::Cascade;
pub use identifier::{
    ID_ATTRIBUTES, LOOKUP_ATTRIBUTES, content_hash, element_id, reading_pane_id, synthetic_id,
};
pub use lookup::ItemLocator;
pub use page::{PageResolver, WebPage};
pub use subject::{AriaLabelParser, MAX_SUBJECT_CHARS, SubjectCleaner, TextHeuristics};

use crate::clock::Clock;
use crate::error::EisenhowerError;
use crate::renderer::{PRIORITY_ID_ATTR, is_annotation};
use eisenhower_rs_config::LocaleConfig;
use eisenhower_rs_dom::{Document, NodeId};
use log::{debug, warn};
use std::sync::Arc;

const LIST_SELECTION: &[&str] = &[
    r#"div[role="row"][aria-selected="true"]"#,
    r#"div[role="listitem"][aria-selected="true"]"#,
    r#"div[class*="customScrollBar"] div[aria-selected="true"]"#,
    "div[data-convid]",
    r#"[data-is-focusable="true"][aria-selected="true"]"#,
    r#"[role="option"][aria-expanded="true"]"#,
    r#"[role="option"][aria-selected="true"]"#,
    "[data-convid]",
    ".selected-email",
    r#"[class*="selected"]"#,
    "tr.focused",
    "tr.selected",
    r#"div[tabindex="0"]:focus"#,
];

const READING_PANE: &[&str] = &[
    r#"[role="main"]"#,
    r#"div[class*="ReadingPane"]"#,
    r#"[data-app-section="MailReadingPane"]"#,
    r#"div[role="region"][aria-label*="Message"]"#,
];

const PANE_SUBJECT: &[&str] = &[
    r#"[class*="subject"]"#,
    "h1",
    "h2",
    r#"[class*="Subject"]"#,
    r#"div[class*="messageSubject"]"#,
    r#"span[class*="messageSubject"]"#,
];

const OPEN_ITEM_SUBJECT: &[&str] = &[
    r#"[role="main"] [class*="subject"]"#,
    r#"[role="main"] h1"#,
    r#"[role="main"] h2"#,
    r#"[role="main"] [class*="Subject"]"#,
    r#"[aria-label*="Message"] [class*="subject"]"#,
    r#"div[class*="ReadingPane"] [class*="subject"]"#,
    r#"div[class*="ReadingPane"] h1"#,
    r#"div[class*="ReadingPane"] h2"#,
    r#"[data-app-section="MailReadingPane"] [class*="subject"]"#,
    r#"div[role="region"][aria-label*="Message"] h1"#,
    r#"div[role="region"][aria-label*="Message"] h2"#,
    r#"div[class*="messageSubject"]"#,
    r#"span[class*="messageSubject"]"#,
    r#"[id*="SubjectNode"]"#,
];

const ITEM_SUBJECT: &[&str] = &[
    r#"span[id*="SubjectContainer"]"#,
    r#"span[id*="subject"]"#,
    r#"div[id*="SubjectLine"]"#,
    r#"[data-automationid="subject"]"#,
    r#"[class*="subject"][class*="line"]"#,
    r#"span[class*="itemSubject"]"#,
];

const GENERIC_SUBJECT: &[&str] = &[
    r#"[class*="subject"]"#,
    "[data-subject]",
    ".item-subject",
    r#"td[class*="subject"]"#,
];

const LIST_ITEMS: &[&str] = &[
    "[data-convid]",
    r#"[role="option"]"#,
    r#"tr[class*="email"]"#,
    ".email-item",
    r#"[class*="mail-item"]"#,
];

/// Pane-level subjects must be longer than this.
const PANE_SUBJECT_MIN: usize = 3;

/// Where to look first for the item being categorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Selected list row, then the reading pane.
    PreferListSelection,
    /// Reading pane, then the selected list row.
    PreferReadingPane,
    /// Selected list row only.
    ListSelectionOnly,
}

/// The element an item was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ListItem(NodeId),
    ReadingPane(NodeId),
}

impl Target {
    pub fn node(self) -> NodeId {
        match self {
            Target::ListItem(node) | Target::ReadingPane(node) => node,
        }
    }

    pub fn is_list_item(self) -> bool {
        matches!(self, Target::ListItem(_))
    }
}

/// Outcome of [`Resolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        id: String,
        subject: String,
        target: Target,
    },
    NotFound,
}

/// Resolves the selected or open mail item of a document.
pub struct Resolver {
    list_selection: Cascade,
    reading_pane: Cascade,
    pane_subject: Cascade,
    open_item_subject: Cascade,
    item_subject: Cascade,
    generic_subject: Cascade,
    list_items: Cascade,
    cleaner: SubjectCleaner,
    aria: AriaLabelParser,
    heuristics: TextHeuristics,
    fallback_label: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("fallback_label", &self.fallback_label)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Compile every cascade and locale pattern up front.
    pub fn new(locale: &LocaleConfig, clock: Arc<dyn Clock>) -> Result<Self, EisenhowerError> {
        Ok(Self {
            list_selection: Cascade::new("list-selection", LIST_SELECTION)?,
            reading_pane: Cascade::new("reading-pane", READING_PANE)?,
            pane_subject: Cascade::new("pane-subject", PANE_SUBJECT)?,
            open_item_subject: Cascade::new("open-item-subject", OPEN_ITEM_SUBJECT)?,
            item_subject: Cascade::new("item-subject", ITEM_SUBJECT)?,
            generic_subject: Cascade::new("generic-subject", GENERIC_SUBJECT)?,
            list_items: Cascade::new("list-items", LIST_ITEMS)?,
            cleaner: SubjectCleaner::new(locale)?,
            aria: AriaLabelParser::new(locale)?,
            heuristics: TextHeuristics::new(locale)?,
            fallback_label: locale.fallback_label.clone(),
            clock,
        })
    }

    pub fn cleaner(&self) -> &SubjectCleaner {
        &self.cleaner
    }

    /// Locate the current item and derive its id and cleaned subject.
    ///
    /// A reading pane without a subject is skipped in favour of the next
    /// target, so every resolved pane id derives from its content.
    pub fn resolve(&self, doc: &Document, mode: ResolveMode) -> Resolution {
        let found = self.targets(doc, mode).into_iter().find_map(|target| {
            self.describe(doc, target)
                .map(|(id, subject)| (id, subject, target))
        });
        let Some((id, subject, target)) = found else {
            warn!("no item located (mode={mode:?})");
            return Resolution::NotFound;
        };
        debug!("item resolved (id={id}, target={target:?}, subject_chars={})", subject.chars().count());
        Resolution::Found {
            id,
            subject,
            target,
        }
    }

    /// Target location only.
    pub fn locate(&self, doc: &Document, mode: ResolveMode) -> Option<Target> {
        self.targets(doc, mode).into_iter().next()
    }

    fn targets(&self, doc: &Document, mode: ResolveMode) -> Vec<Target> {
        let list = self.selected_item(doc).map(Target::ListItem);
        let pane = self.reading_pane(doc).map(Target::ReadingPane);
        let ordered = match mode {
            ResolveMode::PreferListSelection => [list, pane],
            ResolveMode::PreferReadingPane => [pane, list],
            ResolveMode::ListSelectionOnly => [list, None],
        };
        ordered.into_iter().flatten().collect()
    }

    /// The selected list row, if any.
    pub fn selected_item(&self, doc: &Document) -> Option<NodeId> {
        self.list_selection
            .first(doc, doc.root(), |node| !is_annotation(doc, node))
    }

    /// The reading pane container, if any.
    pub fn reading_pane(&self, doc: &Document) -> Option<NodeId> {
        self.reading_pane
            .first(doc, doc.root(), |node| !is_annotation(doc, node))
    }

    /// Rows of the item list: every match of the first pattern that finds any.
    pub fn list_items(&self, doc: &Document) -> Vec<NodeId> {
        self.list_items
            .all(doc, doc.root())
            .into_iter()
            .filter(|node| !is_annotation(doc, *node))
            .collect()
    }

    /// Id a stored record is keyed under for an already rendered row.
    ///
    /// Rows without identifier attributes are recognised by the marker the
    /// renderer left on them when they were highlighted.
    pub fn stored_key(&self, doc: &Document, node: NodeId) -> Option<String> {
        LOOKUP_ATTRIBUTES
            .iter()
            .chain(std::iter::once(&PRIORITY_ID_ATTR))
            .find_map(|name| {
                doc.attr(node, name)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
    }

    /// Id and cleaned subject of a located target. `None` for a reading pane
    /// that shows no usable subject.
    pub fn describe(&self, doc: &Document, target: Target) -> Option<(String, String)> {
        match target {
            Target::ReadingPane(pane) => {
                let raw = self.pane_subject.find_map(doc, pane, |node| {
                    node_text(doc, node, false).filter(|text| text.chars().count() > PANE_SUBJECT_MIN)
                })?;
                let subject = self.cleaner.clean(&raw, String::new);
                if subject.is_empty() {
                    debug!("reading pane subject empty after cleaning");
                    return None;
                }
                Some((reading_pane_id(&subject), subject))
            }
            Target::ListItem(item) => {
                let subject = self.clean(self.item_subject_text(doc, item));
                let id = element_id(doc, item).unwrap_or_else(|| synthetic_id(&subject));
                Some((id, subject))
            }
        }
    }

    fn item_subject_text(&self, doc: &Document, item: NodeId) -> Option<String> {
        self.open_item_subject
            .find_map(doc, doc.root(), |node| {
                node_text(doc, node, true).filter(|text| text.chars().count() > PANE_SUBJECT_MIN)
            })
            .or_else(|| {
                self.item_subject
                    .find_map(doc, item, |node| node_text(doc, node, true))
            })
            .or_else(|| {
                doc.attr(item, "aria-label")
                    .and_then(|label| self.aria.subject(label))
            })
            .or_else(|| {
                doc.attr(item, "title")
                    .map(str::trim)
                    .filter(|title| title.chars().count() > PANE_SUBJECT_MIN)
                    .map(str::to_string)
            })
            .or_else(|| {
                self.generic_subject
                    .find_map(doc, item, |node| node_text(doc, node, false))
            })
            .or_else(|| self.heuristics.longest_text(doc, item))
    }

    fn clean(&self, raw: Option<String>) -> String {
        let fallback = || self.fallback_subject();
        match raw {
            Some(raw) => self.cleaner.clean(&raw, fallback),
            None => {
                warn!("no subject found, using generated label");
                fallback()
            }
        }
    }

    /// `"<fallback_label> HH:MM:SS"` in local time.
    pub fn fallback_subject(&self) -> String {
        format!(
            "{} {}",
            self.fallback_label,
            self.clock.local_time().format("%H:%M:%S")
        )
    }
}

/// Trimmed text of `node`, or its `title` attribute when the text is empty.
fn node_text(doc: &Document, node: NodeId, with_title: bool) -> Option<String> {
    if is_annotation(doc, node) {
        return None;
    }
    let text = doc.text_content(node).trim().to_string();
    if !text.is_empty() {
        return Some(text);
    }
    if with_title {
        return doc
            .attr(node, "title")
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{Resolution, ResolveMode, Resolver, Target, reading_pane_id, synthetic_id};
    use crate::clock::Clock;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};
    use eisenhower_rs_config::LocaleConfig;
    use eisenhower_rs_dom::Document;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct Noon;

    impl Clock for Noon {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
                .single()
                .unwrap_or_default()
        }

        fn local_time(&self) -> NaiveTime {
            NaiveTime::from_hms_opt(12, 34, 56).unwrap_or_default()
        }
    }

    fn resolver() -> Resolver {
        Resolver::new(&LocaleConfig::default(), Arc::new(Noon)).expect("resolver")
    }

    fn found(resolution: Resolution) -> (String, String, Target) {
        match resolution {
            Resolution::Found {
                id,
                subject,
                target,
            } => (id, subject, target),
            Resolution::NotFound => panic!("expected an item"),
        }
    }

    #[test]
    fn aria_label_subject_for_bare_rows() {
        let doc = Document::parse_html(
            r#"<div role="listbox">
                 <div role="row" aria-selected="true" data-convid="AAQk1"
                      aria-label="Jane Doe; Project Kickoff Meeting Notes; 14:02; Unread">
                   <span>Jane Doe</span><span>14:02</span>
                 </div>
               </div>"#,
        );
        let (id, subject, target) = found(resolver().resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!(id, "AAQk1");
        assert_eq!(subject, "Project Kickoff Meeting Notes");
        assert!(target.is_list_item());
    }

    #[test]
    fn open_item_subject_beats_list_markup() {
        let doc = Document::parse_html(
            r#"<div role="row" aria-selected="true" data-convid="AAQk2">
                 <span id="SubjectContainer_1">RE: list subject</span>
               </div>
               <div role="main"><div class="allowTextSelection subject">RE: [Piszkozat] Budget   review</div></div>"#,
        );
        let (id, subject, _) = found(resolver().resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!(id, "AAQk2");
        assert_eq!(subject, "Budget review");
    }

    #[test]
    fn list_scoped_markers_then_title_then_spans() {
        let resolver = resolver();
        let doc = Document::parse_html(
            r#"<table><tr class="selected" id="row-1"><td><span id="subject_1">Invoice 42</span></td></tr></table>"#,
        );
        assert_eq!(found(resolver.resolve(&doc, ResolveMode::PreferListSelection)).1, "Invoice 42");

        let doc = Document::parse_html(
            r#"<div class="selected-email" data-id="d-9" title="Quarterly planning"></div>"#,
        );
        let (id, subject, _) = found(resolver.resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!((id.as_str(), subject.as_str()), ("d-9", "Quarterly planning"));

        let doc = Document::parse_html(
            r#"<div class="selected-email" aria-posinset="4">
                 <span>boss@example.com</span><span>Server migration plan for Q3</span><span>10:15</span>
               </div>"#,
        );
        let (id, subject, _) = found(resolver.resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!((id.as_str(), subject.as_str()), ("4", "Server migration plan for Q3"));
    }

    #[test]
    fn rows_without_ids_get_content_hash_ids() {
        let doc = Document::parse_html(
            r#"<div class="selected-email"><span class="item-subject">Team lunch</span></div>"#,
        );
        let resolver = resolver();
        let (id, subject, _) = found(resolver.resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!(subject, "Team lunch");
        assert_eq!(id, synthetic_id("Team lunch"));
        let (again, _, _) = found(resolver.resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!(again, id);
    }

    #[test]
    fn empty_rows_fall_back_to_a_time_label() {
        let doc = Document::parse_html(r#"<div class="selected-email" id="x1"><span>hi</span></div>"#);
        let (id, subject, _) = found(resolver().resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!(id, "x1");
        assert_eq!(subject, "Item 12:34:56");
    }

    #[test]
    fn reading_pane_mode_and_fallback() {
        let doc = Document::parse_html(
            r#"<div role="main"><h1>FW: Offsite agenda</h1></div>"#,
        );
        let resolver = resolver();
        let (id, subject, target) = found(resolver.resolve(&doc, ResolveMode::PreferListSelection));
        assert_eq!(subject, "Offsite agenda");
        assert_eq!(id, reading_pane_id("Offsite agenda"));
        assert!(matches!(target, Target::ReadingPane(_)));
        assert_eq!(resolver.resolve(&doc, ResolveMode::ListSelectionOnly), Resolution::NotFound);
    }

    #[test]
    fn reading_pane_without_subject_is_skipped() {
        let resolver = resolver();
        let pane_only = Document::parse_html(
            r#"<div role="main"><div class="_rp_o1"><span class="_rp_32">Mon 10:00</span></div></div>"#,
        );
        assert_eq!(resolver.resolve(&pane_only, ResolveMode::PreferReadingPane), Resolution::NotFound);
        assert_eq!(resolver.resolve(&pane_only, ResolveMode::PreferListSelection), Resolution::NotFound);

        let with_row = Document::parse_html(
            r#"<div role="row" aria-selected="true" data-convid="AAQk7"
                    aria-label="Jane Doe; Quarterly planning session; 09:30"></div>
               <div role="main"><div class="_rp_o1"><span class="_rp_32">Mon 10:00</span></div></div>"#,
        );
        let (id, subject, target) = found(resolver.resolve(&with_row, ResolveMode::PreferReadingPane));
        assert_eq!((id.as_str(), subject.as_str()), ("AAQk7", "Quarterly planning session"));
        assert!(target.is_list_item());
    }

    #[test]
    fn nothing_to_resolve_is_not_found() {
        let doc = Document::parse_html("<p>nothing here</p>");
        assert_eq!(
            resolver().resolve(&doc, ResolveMode::PreferReadingPane),
            Resolution::NotFound
        );
    }
}
