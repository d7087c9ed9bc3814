//! Ordered selector cascades.

use eisenhower_rs_dom::{Document, NodeId, Selector, SelectorError};
use log::trace;

/// An ordered list of selectors tried until one produces a result.
///
/// Order encodes confidence: earlier selectors are more specific guesses at
/// the host page's markup, later ones are broader fallbacks.
#[derive(Debug, Clone)]
pub struct Cascade {
    name: &'static str,
    selectors: Vec<Selector>,
}

impl Cascade {
    pub fn new(name: &'static str, sources: &[&str]) -> Result<Self, SelectorError> {
        let selectors = sources
            .iter()
            .map(|source| Selector::parse(source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, selectors })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// First accepted element of the first selector that yields one.
    pub fn first(
        &self,
        doc: &Document,
        scope: NodeId,
        accept: impl Fn(NodeId) -> bool,
    ) -> Option<NodeId> {
        self.selectors.iter().find_map(|selector| {
            let found = doc
                .select_within(scope, selector)
                .into_iter()
                .find(|node| accept(*node));
            if found.is_some() {
                trace!("cascade hit (cascade={}, selector={})", self.name, selector);
            }
            found
        })
    }

    /// Apply `extract` to the first match of each selector in turn and return
    /// the first value it accepts.
    pub fn find_map<T>(
        &self,
        doc: &Document,
        scope: NodeId,
        mut extract: impl FnMut(NodeId) -> Option<T>,
    ) -> Option<T> {
        self.selectors.iter().find_map(|selector| {
            let node = doc.select_first_within(scope, selector)?;
            let value = extract(node);
            if value.is_some() {
                trace!("cascade hit (cascade={}, selector={})", self.name, selector);
            }
            value
        })
    }

    /// All matches of the first selector that matches anything.
    pub fn all(&self, doc: &Document, scope: NodeId) -> Vec<NodeId> {
        self.selectors
            .iter()
            .map(|selector| doc.select_within(scope, selector))
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::Cascade;
    use eisenhower_rs_dom::Document;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::parse_html(
            r#"<div class="row" id="a"></div>
               <div class="row selected" id="b"><span class="subject">  </span></div>
               <div class="subject" id="c">Quarterly numbers</div>"#,
        )
    }

    #[test]
    fn first_selector_with_a_match_wins() {
        let doc = doc();
        let cascade = Cascade::new("test", &[".missing", ".row", ".selected"]).expect("cascade");
        let hit = cascade.first(&doc, doc.root(), |_| true).expect("hit");
        assert_eq!(doc.attr(hit, "id"), Some("a"));

        let filtered = cascade
            .first(&doc, doc.root(), |node| doc.attr(node, "id") != Some("a"))
            .expect("filtered");
        assert_eq!(doc.attr(filtered, "id"), Some("b"));
        assert_eq!(cascade.all(&doc, doc.root()).len(), 2);
    }

    #[test]
    fn find_map_moves_on_when_extraction_rejects() {
        let doc = doc();
        let cascade = Cascade::new("subject", &["span.subject", "div.subject"]).expect("cascade");
        let text = cascade.find_map(&doc, doc.root(), |node| {
            let text = doc.text_content(node).trim().to_string();
            (!text.is_empty()).then_some(text)
        });
        assert_eq!(text.as_deref(), Some("Quarterly numbers"));
    }
}
