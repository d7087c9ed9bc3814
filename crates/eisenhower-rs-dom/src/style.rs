//! Inline `style` attribute helpers.

use crate::document::{Document, NodeId};
use crate::error::DomError;

fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty()).then(|| (property, value.to_string()))
        })
        .collect()
}

fn render(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Document {
    /// Value of one inline style property.
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attr(node, "style")?;
        declarations(style)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set one inline style property, keeping the others in place.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let property = property.to_ascii_lowercase();
        let mut decls = declarations(self.attr(node, "style").unwrap_or_default());
        match decls.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => decls.push((property, value.to_string())),
        }
        self.set_attr(node, "style", render(&decls))
    }

    /// Remove one inline style property. The attribute is dropped once empty.
    pub fn remove_style(&mut self, node: NodeId, property: &str) -> Option<String> {
        let mut decls = declarations(self.attr(node, "style")?);
        let idx = decls
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(property))?;
        let (_, removed) = decls.remove(idx);
        if decls.is_empty() {
            self.remove_attr(node, "style");
        } else {
            self.set_attr(node, "style", render(&decls)).ok()?;
        }
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_and_remove_properties() {
        let mut doc = Document::new();
        let row = doc.create_element("div");
        doc.set_attr(row, "style", "color: red;  MARGIN:0 ;;")
            .expect("style");
        doc.set_style(row, "background-color", "#ffe6e6")
            .expect("bg");
        doc.set_style(row, "color", "blue").expect("color");
        assert_eq!(
            doc.attr(row, "style"),
            Some("color: blue; margin: 0; background-color: #ffe6e6;")
        );
        assert_eq!(doc.style(row, "Margin").as_deref(), Some("0"));

        assert_eq!(doc.remove_style(row, "color").as_deref(), Some("blue"));
        assert_eq!(doc.remove_style(row, "color"), None);
        doc.remove_style(row, "margin");
        doc.remove_style(row, "background-color");
        assert_eq!(doc.attr(row, "style"), None);
    }
}
