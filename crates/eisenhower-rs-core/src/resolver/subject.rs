//! Subject text heuristics: cleaning, aria-label parsing, free-text scan.

use crate::error::EisenhowerError;
use eisenhower_rs_config::LocaleConfig;
use eisenhower_rs_dom::{Document, NodeId, Selector};
use regex::{Regex, RegexBuilder};

/// Longest subject kept, in characters.
pub const MAX_SUBJECT_CHARS: usize = 200;
/// Cleaned subjects shorter than this are replaced by the fallback label.
const MIN_SUBJECT_CHARS: usize = 2;
/// aria-label fields considered at most.
const MAX_ARIA_FIELDS: usize = 6;
/// Free-text candidates shorter than this are ignored.
const MIN_CANDIDATE_CHARS: usize = 10;

fn compile(pattern: &str) -> Result<Regex, EisenhowerError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| EisenhowerError::Pattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes raw subject text.
#[derive(Debug, Clone)]
pub struct SubjectCleaner {
    prefixes: Vec<Regex>,
    empty_subject_label: String,
}

impl SubjectCleaner {
    pub fn new(locale: &LocaleConfig) -> Result<Self, EisenhowerError> {
        let prefixes = locale
            .subject_prefixes
            .iter()
            .map(|prefix| compile(&format!("^(?:{prefix})")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            prefixes,
            empty_subject_label: locale.empty_subject_label.clone(),
        })
    }

    /// Collapse whitespace and strip leading reply/forward/draft/unread
    /// markers until none is left.
    pub fn strip(&self, raw: &str) -> String {
        let mut subject = collapse_whitespace(raw);
        loop {
            let before = subject.len();
            for prefix in &self.prefixes {
                if let Some(found) = prefix.find(&subject) {
                    subject = subject[found.end()..].trim_start().to_string();
                }
            }
            if subject.len() == before {
                break;
            }
        }
        subject.trim().to_string()
    }

    /// Strip, cap at 200 characters and substitute `fallback` when nothing
    /// meaningful remains.
    pub fn clean(&self, raw: &str, fallback: impl FnOnce() -> String) -> String {
        let stripped: String = self.strip(raw).chars().take(MAX_SUBJECT_CHARS).collect();
        if char_len(&stripped) < MIN_SUBJECT_CHARS {
            fallback()
        } else {
            stripped
        }
    }

    pub fn empty_subject_label(&self) -> &str {
        &self.empty_subject_label
    }
}

/// Picks the subject field out of a semicolon separated aria-label.
#[derive(Debug, Clone)]
pub struct AriaLabelParser {
    ticket: Regex,
    time: Regex,
    year: Regex,
    trailing_name: Regex,
    status_words: Vec<String>,
}

impl AriaLabelParser {
    pub fn new(locale: &LocaleConfig) -> Result<Self, EisenhowerError> {
        Ok(Self {
            ticket: compile(&locale.ticket_pattern)?,
            time: compile(r"^\d{1,2}:\d{2}")?,
            year: compile(r"^\d{4}")?,
            trailing_name: compile(r"\(\w+\)$")?,
            status_words: locale
                .status_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        })
    }

    /// Ticket-like fields win, then the first long field that is not a time,
    /// year, status or "(Name)" suffix, then a non-trivial second field.
    pub fn subject(&self, label: &str) -> Option<String> {
        let fields: Vec<&str> = label.split(';').map(str::trim).collect();
        for field in fields.iter().take(MAX_ARIA_FIELDS) {
            if self.ticket.is_match(field) {
                return Some(field.to_string());
            }
            if self.is_plain_subject(field) {
                return Some(field.to_string());
            }
        }
        fields
            .get(1)
            .filter(|field| char_len(field) > 5)
            .map(|field| field.to_string())
    }

    fn is_plain_subject(&self, field: &str) -> bool {
        let lower = field.to_lowercase();
        char_len(field) > 15
            && !self.time.is_match(field)
            && !self.year.is_match(field)
            && !self.status_words.iter().any(|word| lower.contains(word))
            && !self.trailing_name.is_match(field)
    }
}

/// Last-resort scan for the longest meaningful inline text.
#[derive(Debug, Clone)]
pub struct TextHeuristics {
    inline: Selector,
    date: Regex,
    time: Regex,
    noise_words: Vec<String>,
}

impl TextHeuristics {
    pub fn new(locale: &LocaleConfig) -> Result<Self, EisenhowerError> {
        Ok(Self {
            inline: Selector::parse("span")?,
            date: compile(r"^\d+[/\-.]\d+")?,
            time: compile(r"^\d+:\d+")?,
            noise_words: locale
                .noise_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        })
    }

    /// Longest candidate below `node`; earlier nodes win ties.
    pub fn longest_text(&self, doc: &Document, node: NodeId) -> Option<String> {
        let mut best: Option<String> = None;
        for inline in doc.select_within(node, &self.inline) {
            let text = doc.text_content(inline).trim().to_string();
            if !self.is_candidate(&text) {
                continue;
            }
            if best
                .as_ref()
                .is_none_or(|current| char_len(&text) > char_len(current))
            {
                best = Some(text);
            }
        }
        best
    }

    fn is_candidate(&self, text: &str) -> bool {
        char_len(text) >= MIN_CANDIDATE_CHARS
            && !text.contains('@')
            && !self.date.is_match(text)
            && !self.time.is_match(text)
            && !self.noise_words.contains(&text.to_lowercase())
    }
}
