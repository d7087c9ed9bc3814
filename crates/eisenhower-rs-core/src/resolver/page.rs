//! The web page variant: any page is an item keyed by its URL.

use super::cascade::Cascade;
use super::subject::MAX_SUBJECT_CHARS;
use crate::error::EisenhowerError;
use eisenhower_rs_config::LocaleConfig;
use eisenhower_rs_dom::Document;
use eisenhower_rs_protocol::PriorityRecord;

const ISSUE_SUMMARY: &[&str] = &["h1#summary-val"];

const PAGE_TITLE: &[&str] = &[
    "h1",
    r#"[class*="page-header"] h1"#,
    r#"[class*="page-title"]"#,
    r#"[class*="issue-link"]"#,
    "title",
];

/// Identity of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPage {
    pub url: String,
    pub title: String,
    pub hostname: String,
}

impl WebPage {
    /// Record for this page with the given ratings.
    pub fn to_record(
        &self,
        importance: i32,
        urgency: i32,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> PriorityRecord {
        PriorityRecord::new(&self.url, &self.title, importance, urgency, timestamp)
            .with_hostname(&self.hostname)
    }
}

/// Resolves a [`WebPage`] from a document with a URL.
#[derive(Debug, Clone)]
pub struct PageResolver {
    issue_summary: Cascade,
    page_title: Cascade,
    title_noise: String,
    untitled: String,
}

impl PageResolver {
    pub fn new(locale: &LocaleConfig) -> Result<Self, EisenhowerError> {
        Ok(Self {
            issue_summary: Cascade::new("issue-summary", ISSUE_SUMMARY)?,
            page_title: Cascade::new("page-title", PAGE_TITLE)?,
            title_noise: locale.web_title_noise.clone(),
            untitled: locale.untitled_page_label.clone(),
        })
    }

    /// `None` only when the document has no URL.
    pub fn resolve(&self, doc: &Document) -> Option<WebPage> {
        let url = doc.url()?;
        let heading = |node| {
            let text = self.without_noise(&doc.text_content(node));
            (!text.is_empty()).then_some(text)
        };
        let title = self
            .issue_summary
            .find_map(doc, doc.root(), heading)
            .or_else(|| self.page_title.find_map(doc, doc.root(), heading))
            .or_else(|| doc.title())
            .unwrap_or_else(|| self.untitled.clone());
        Some(WebPage {
            url: url.to_string(),
            title: title.chars().take(MAX_SUBJECT_CHARS).collect(),
            hostname: doc.hostname().unwrap_or_default().to_string(),
        })
    }

    fn without_noise(&self, text: &str) -> String {
        let text = if self.title_noise.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.title_noise, "")
        };
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::PageResolver;
    use eisenhower_rs_config::LocaleConfig;
    use eisenhower_rs_dom::Document;
    use pretty_assertions::assert_eq;

    fn resolver() -> PageResolver {
        PageResolver::new(&LocaleConfig::default()).expect("page resolver")
    }

    #[test]
    fn issue_summary_wins_and_loses_its_edit_hint() {
        let doc = Document::parse_html_with_url(
            r#"<html><head><title>[OPS-7] Broken build - Jira</title></head>
               <body><h1>Dashboard</h1><h1 id="summary-val">Broken build Click to edit</h1></body></html>"#,
            "https://jira.example.com/browse/OPS-7",
        )
        .expect("doc");
        let page = resolver().resolve(&doc).expect("page");
        assert_eq!(page.title, "Broken build");
        assert_eq!(page.url, "https://jira.example.com/browse/OPS-7");
        assert_eq!(page.hostname, "jira.example.com");
    }

    #[test]
    fn falls_back_through_headings_and_title() {
        let doc = Document::parse_html_with_url(
            r#"<html><head><title>Release notes</title></head><body><p>text</p></body></html>"#,
            "https://docs.example.org/notes",
        )
        .expect("doc");
        assert_eq!(resolver().resolve(&doc).expect("page").title, "Release notes");

        let bare = Document::parse_html_with_url("<p>x</p>", "https://x.example/")
            .expect("doc");
        assert_eq!(resolver().resolve(&bare).expect("page").title, "Untitled Page");
        assert_eq!(resolver().resolve(&Document::parse_html("<h1>x</h1>")), None);
    }
}
