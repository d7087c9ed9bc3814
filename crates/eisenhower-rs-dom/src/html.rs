//! Loading HTML snapshots and serializing annotated documents.

use crate::document::{Document, NodeId, NodeKind};
use crate::error::DomError;
use log::debug;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use url::Url;

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

impl Document {
    /// Parse an HTML snapshot. The first `autofocus` element receives focus.
    pub fn parse_html(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Document::new();
        let root = doc.root();
        let mut focus = None;
        import_element(&mut doc, root, html.root_element(), &mut focus);
        doc.set_focus(focus);
        debug!(
            "html snapshot parsed (nodes={}, parse_errors={})",
            doc.descendants(root).len(),
            html.errors.len()
        );
        doc
    }

    /// Parse an HTML snapshot captured from `url`.
    pub fn parse_html_with_url(source: &str, url: &str) -> Result<Self, DomError> {
        let parsed = Url::parse(url).map_err(|source| DomError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self::parse_html(source).with_url(parsed))
    }

    /// Serialize the connected tree back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serialize one node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => escape_into(text, false, out),
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(element.name());
                for (name, value) in element.attrs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.name()) {
                    return;
                }
                for child in self.children(node) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(element.name());
                out.push('>');
            }
            Some(NodeKind::Root) => {
                for child in self.children(node) {
                    self.write_node(*child, out);
                }
            }
            None => {}
        }
    }
}

fn import_element(
    doc: &mut Document,
    parent: NodeId,
    source: ElementRef<'_>,
    focus: &mut Option<NodeId>,
) {
    let element = source.value();
    let id = doc.create_element(element.name());
    for (name, value) in element.attrs() {
        // Attribute names come from the parser and are always valid.
        let _ = doc.set_attr(id, name, value);
    }
    if focus.is_none() && element.attr("autofocus").is_some() {
        *focus = Some(id);
    }
    let _ = doc.append_child(parent, id);

    for child in source.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            import_element(doc, id, child_element, focus);
        } else if let Node::Text(text) = child.value() {
            let text_id = doc.create_text(&**text);
            let _ = doc.append_child(id, text_id);
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, DomError, Selector};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_snapshot_with_focus_and_url() {
        let doc = Document::parse_html_with_url(
            r#"<html><head><title> Inbox - Outlook </title></head>
            <body><div role="listbox">
              <div role="option" data-convid="AAQk1" aria-selected="true" autofocus>Weekly sync</div>
              <div role="option" data-convid="AAQk2">Budget &amp; plan</div>
            </div></body></html>"#,
            "https://outlook.office.com/mail/inbox",
        )
        .expect("doc");

        assert_eq!(doc.hostname(), Some("outlook.office.com"));
        assert_eq!(doc.title().as_deref(), Some("Inbox - Outlook"));
        let focused = doc.focused().expect("focused");
        assert_eq!(doc.attr(focused, "data-convid"), Some("AAQk1"));
        let options = doc.select(&Selector::parse("[role=\"option\"]").expect("selector"));
        assert_eq!(options.len(), 2);
        assert_eq!(doc.text_content(options[1]), "Budget & plan");
    }

    #[test]
    fn serializes_with_escaping() {
        let mut doc = Document::parse_html("<p title='a \"b\"'>x &lt; y<br></p>");
        let body = doc.body();
        let badge = doc.create_element("span");
        doc.set_attr(badge, "class", "badge").expect("class");
        let text = doc.create_text("F: 4/4");
        doc.append_child(badge, text).expect("text");
        doc.append_child(body, badge).expect("badge");

        let html = doc.to_html();
        assert!(html.contains(r#"<p title="a &quot;b&quot;">x &lt; y<br></p>"#));
        assert!(html.contains(r#"<span class="badge">F: 4/4</span></body>"#));
        assert_eq!(doc.outer_html(badge), r#"<span class="badge">F: 4/4</span>"#);
    }

    #[test]
    fn rejects_invalid_url() {
        let err = Document::parse_html_with_url("<p></p>", "not a url").unwrap_err();
        assert!(matches!(err, DomError::InvalidUrl { .. }));
    }
}
