//! Visual annotations: list row highlights and category badges.
//!
//! Every node the renderer inserts carries [`ANNOTATION_ATTR`], so the
//! resolver and the mutation handling can tell our own changes apart from the
//! host page's.

use crate::classifier::classify;
use crate::error::EisenhowerError;
use crate::resolver::Cascade;
use eisenhower_rs_dom::{Document, NodeId, Selector};
use eisenhower_rs_protocol::{Category, PriorityRecord};
use log::{debug, warn};

/// Marker attribute on every inserted node.
pub const ANNOTATION_ATTR: &str = "data-eisenhower-annotation";
/// Id of the record a highlighted row was tagged with.
pub const PRIORITY_ID_ATTR: &str = "data-priority-id";

const CATEGORY_ATTR: &str = "data-priority-category";
const IMPORTANCE_ATTR: &str = "data-priority-importance";
const URGENCY_ATTR: &str = "data-priority-urgency";

const HIGHLIGHT_STYLES: [&str; 3] = ["background-color", "border-left", "padding-left"];
const HIGHLIGHT_ATTRS: [&str; 4] = [CATEGORY_ATTR, IMPORTANCE_ATTR, URGENCY_ATTR, PRIORITY_ID_ATTR];

/// Record id and ratings a reading pane badge was rendered from.
const BADGE_STATE_ATTR: &str = "data-badge-state";

const PANE_BADGE_CLASS: &str = "eisenhower-badge";
const PANE_BADGE_ROW_CLASS: &str = "eisenhower-badge-row";
const PAGE_BADGE_CLASS: &str = "eisenhower-page-badge";

/// Background used to flash an item that is being opened.
pub const OPEN_FLASH_COLOR: &str = "#ffeb3b";

const PANE_HEADER: &[&str] = &[
    r#"[role="main"] [class*="_rp_o1"]"#,
    r#"[role="main"] [role="heading"][aria-level="3"]"#,
    r#"[role="main"] [class*="ItemHeader"]"#,
    r#"[role="main"] [class*="messageHeader"]"#,
    r#"[data-app-section="MailReadingPane"] [class*="header"]"#,
];

const PANE_INSERTION: &[&str] = &[
    r#"[class*="_rp_32"]"#,
    r#"[class*="_rp_q2"]"#,
    r#"[class*="ItemHeader"]"#,
];

const PAGE_ANCHOR: &[&str] = &[
    ".aui-page-header-main h1",
    ".aui-page-header-main",
    "h1",
    r#"[role="main"] h1"#,
    r#"[class*="page-header"]"#,
    "header h1",
    "body",
];

/// Colours of one quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// List row background.
    pub background: &'static str,
    /// List row left border.
    pub border: &'static str,
    /// Reading pane badge colour.
    pub badge: &'static str,
}

impl Palette {
    pub fn for_category(category: Category) -> Self {
        let (background, border, badge) = match category {
            Category::DoFirst => ("#ffe6e6", "#ff4444", "#ef4444"),
            Category::Schedule => ("#fff9e6", "#ffb84d", "#f59e0b"),
            Category::Delegate => ("#e6f3ff", "#4499ff", "#3b82f6"),
            Category::Eliminate => ("#e6ffe6", "#44bb44", "#10b981"),
        };
        Self {
            background,
            border,
            badge,
        }
    }
}

/// Whether `node` is, or sits inside, something the renderer inserted.
pub fn is_annotation(doc: &Document, node: NodeId) -> bool {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .any(|id| doc.attr(id, ANNOTATION_ATTR).is_some())
}

/// Applies and removes annotations on a [`Document`].
#[derive(Debug, Clone)]
pub struct Renderer {
    pane_header: Cascade,
    pane_insertion: Cascade,
    page_anchor: Cascade,
    pane_badge: Selector,
    page_badge: Selector,
    highlighted: Selector,
    pane_change: Selector,
    pane_subject: Selector,
}

impl Renderer {
    pub fn new() -> Result<Self, EisenhowerError> {
        Ok(Self {
            pane_header: Cascade::new("pane-header", PANE_HEADER)?,
            pane_insertion: Cascade::new("pane-insertion", PANE_INSERTION)?,
            page_anchor: Cascade::new("page-anchor", PAGE_ANCHOR)?,
            pane_badge: Selector::parse(&format!(".{PANE_BADGE_ROW_CLASS}"))?,
            page_badge: Selector::parse(&format!(".{PAGE_BADGE_CLASS}"))?,
            highlighted: Selector::parse(&format!("[{PRIORITY_ID_ATTR}]"))?,
            pane_change: Selector::parse(r#"[role="main"], [class*="ReadingPane"]"#)?,
            pane_subject: Selector::parse(r#"[class*="Subject"]"#)?,
        })
    }

    /// Colour a list row by the record's quadrant. Re-applying is a no-op.
    pub fn highlight(
        &self,
        doc: &mut Document,
        node: NodeId,
        record: &PriorityRecord,
    ) -> Result<(), EisenhowerError> {
        let category = classify(record.importance, record.urgency);
        let palette = Palette::for_category(category);
        doc.set_style(node, "background-color", palette.background)?;
        doc.set_style(node, "border-left", &format!("4px solid {}", palette.border))?;
        doc.set_style(node, "padding-left", "12px")?;
        doc.set_attr(node, CATEGORY_ATTR, category.name())?;
        doc.set_attr(node, IMPORTANCE_ATTR, record.importance.to_string())?;
        doc.set_attr(node, URGENCY_ATTR, record.urgency.to_string())?;
        doc.set_attr(node, PRIORITY_ID_ATTR, record.id.as_str())?;
        debug!("row highlighted (id={}, category={})", record.id, category);
        Ok(())
    }

    /// Remove exactly what [`Renderer::highlight`] added.
    pub fn clear_highlight(&self, doc: &mut Document, node: NodeId) {
        for property in HIGHLIGHT_STYLES {
            doc.remove_style(node, property);
        }
        for attr in HIGHLIGHT_ATTRS {
            doc.remove_attr(node, attr);
        }
    }

    /// Highlighted row tagged with `id`, if one is rendered.
    pub fn highlighted_row(&self, doc: &Document, id: &str) -> Option<NodeId> {
        doc.select(&self.highlighted)
            .into_iter()
            .find(|node| doc.attr(*node, PRIORITY_ID_ATTR) == Some(id))
    }

    /// Clear every highlight on the page; returns how many were removed.
    pub fn clear_all_highlights(&self, doc: &mut Document) -> usize {
        let rows = doc.select(&self.highlighted);
        for row in &rows {
            self.clear_highlight(doc, *row);
        }
        rows.len()
    }

    /// Temporarily replace a row's background, returning the previous value.
    pub fn flash(&self, doc: &mut Document, node: NodeId) -> Result<Option<String>, EisenhowerError> {
        let previous = doc.style(node, "background-color");
        doc.set_style(node, "background-color", OPEN_FLASH_COLOR)?;
        Ok(previous)
    }

    /// Undo [`Renderer::flash`].
    pub fn restore_background(
        &self,
        doc: &mut Document,
        node: NodeId,
        previous: Option<&str>,
    ) -> Result<(), EisenhowerError> {
        match previous {
            Some(value) => doc.set_style(node, "background-color", value)?,
            None => {
                doc.remove_style(node, "background-color");
            }
        }
        Ok(())
    }

    /// Show the record's badge in the reading pane header.
    ///
    /// Returns `false` when there is no header to attach to. An existing badge
    /// rendered from the same id and ratings is left untouched; any other one
    /// is replaced.
    pub fn show_reading_pane_badge(
        &self,
        doc: &mut Document,
        record: &PriorityRecord,
    ) -> Result<bool, EisenhowerError> {
        let category = classify(record.importance, record.urgency);
        let state = format!("{}|{}|{}", record.id, record.importance, record.urgency);
        if let Some(existing) = doc.select_first(&self.pane_badge) {
            if doc.attr(existing, BADGE_STATE_ATTR) == Some(state.as_str()) {
                debug!("reading pane badge unchanged (id={}, category={category})", record.id);
                return Ok(true);
            }
            self.remove_reading_pane_badge(doc);
        }

        let Some(header) = self
            .pane_header
            .first(doc, doc.root(), |node| !is_annotation(doc, node))
        else {
            warn!("reading pane header not found, badge skipped");
            return Ok(false);
        };
        let anchor = self
            .pane_insertion
            .first(doc, header, |node| !is_annotation(doc, node))
            .unwrap_or(header);

        let color = Palette::for_category(category).badge;
        let badge = build_badge(doc, PANE_BADGE_CLASS, category, record)?;
        doc.set_style(badge, "border", &format!("2px solid {color}"))?;
        doc.set_style(badge, "color", color)?;
        let row = doc.create_element("div");
        doc.set_attr(row, "class", PANE_BADGE_ROW_CLASS)?;
        doc.set_attr(row, ANNOTATION_ATTR, "badge")?;
        doc.set_attr(row, BADGE_STATE_ATTR, state)?;
        doc.set_style(row, "display", "flex")?;
        doc.set_style(row, "align-items", "center")?;
        doc.append_child(row, badge)?;
        doc.insert_after(anchor, row)?;
        debug!("reading pane badge shown (id={}, category={category})", record.id);
        Ok(true)
    }

    /// Returns whether a badge was removed.
    pub fn remove_reading_pane_badge(&self, doc: &mut Document) -> bool {
        let rows = doc.select(&self.pane_badge);
        for row in &rows {
            doc.remove(*row);
        }
        !rows.is_empty()
    }

    /// Category shown by the reading pane badge, if any.
    pub fn reading_pane_badge(&self, doc: &Document) -> Option<String> {
        doc.select_first(&self.pane_badge)
            .and_then(|row| badge_text(doc, row))
    }

    /// Show the record's badge next to the page heading, replacing any other.
    pub fn show_page_badge(
        &self,
        doc: &mut Document,
        record: &PriorityRecord,
    ) -> Result<bool, EisenhowerError> {
        self.remove_page_badge(doc);
        let Some(anchor) = self
            .page_anchor
            .first(doc, doc.root(), |node| !is_annotation(doc, node))
        else {
            warn!("no anchor for page badge (url={})", record.id);
            return Ok(false);
        };
        let category = classify(record.importance, record.urgency);
        let palette = Palette::for_category(category);
        let badge = build_badge(doc, PAGE_BADGE_CLASS, category, record)?;
        doc.set_attr(badge, ANNOTATION_ATTR, "badge")?;
        doc.set_style(badge, "border", &format!("2px solid {}", palette.border))?;
        doc.set_style(badge, "color", palette.border)?;
        if doc.tag_name(anchor) == Some("h1") {
            doc.insert_after(anchor, badge)?;
        } else {
            doc.append_child(anchor, badge)?;
        }
        debug!("page badge shown (url={}, category={category})", record.id);
        Ok(true)
    }

    pub fn remove_page_badge(&self, doc: &mut Document) -> bool {
        let badges = doc.select(&self.page_badge);
        for badge in &badges {
            doc.remove(*badge);
        }
        !badges.is_empty()
    }

    /// Category shown by the page badge, if any.
    pub fn page_badge(&self, doc: &Document) -> Option<String> {
        doc.select_first(&self.page_badge)
            .and_then(|badge| badge_text(doc, badge))
    }

    /// Whether an inserted node means the reading pane now shows another item.
    pub fn is_reading_pane_change(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node)
            && (self.pane_change.matches(doc, node)
                || doc.select_first_within(node, &self.pane_subject).is_some())
    }
}

fn build_badge(
    doc: &mut Document,
    class: &str,
    category: Category,
    record: &PriorityRecord,
) -> Result<NodeId, EisenhowerError> {
    let badge = doc.create_element("div");
    doc.set_attr(badge, "class", class)?;
    doc.set_style(badge, "display", "inline-flex")?;
    let parts = [
        ("badge-icon", category.icon().to_string()),
        ("badge-text", category.name().to_string()),
        (
            "badge-meta",
            format!("F: {}/4 | S: {}/4", record.importance, record.urgency),
        ),
    ];
    for (class, text) in parts {
        let span = doc.create_element("span");
        doc.set_attr(span, "class", class)?;
        let text = doc.create_text(text);
        doc.append_child(span, text)?;
        doc.append_child(badge, span)?;
    }
    Ok(badge)
}

fn badge_text(doc: &Document, badge: NodeId) -> Option<String> {
    doc.descendants(badge)
        .into_iter()
        .find(|node| doc.has_class(*node, "badge-text"))
        .map(|node| doc.text_content(node))
}
