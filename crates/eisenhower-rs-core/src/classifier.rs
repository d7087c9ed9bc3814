//! Quadrant classification and the matrix view built on it.

use crate::resolver::SubjectCleaner;
use chrono::{DateTime, Utc};
use eisenhower_rs_protocol::{Category, ItemKind, PriorityRecord};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Ratings at or above this value count as important / urgent.
pub const THRESHOLD: i32 = 3;

const DISPLAY_LIMIT: usize = 60;

/// Map an (importance, urgency) pair to its quadrant.
///
/// Total over `i32`: out-of-range ratings are compared against the same
/// threshold, ties go towards "important".
pub fn classify(importance: i32, urgency: i32) -> Category {
    match (importance >= THRESHOLD, urgency >= THRESHOLD) {
        (true, true) => Category::DoFirst,
        (true, false) => Category::Schedule,
        (false, true) => Category::Delegate,
        (false, false) => Category::Eliminate,
    }
}

/// Label of a stored record as shown in the matrix.
///
/// Custom labels win; subjects get the cleaner's prefix stripping again for
/// records written by older versions, then are cut to 60 characters.
pub fn display_subject(record: &PriorityRecord, cleaner: &SubjectCleaner) -> String {
    let text = match record.custom_label.as_deref() {
        Some(label) if !label.trim().is_empty() => label.split_whitespace().collect::<Vec<_>>().join(" "),
        _ => cleaner.strip(&record.subject),
    };
    let text = if text.chars().count() < 2 {
        cleaner.empty_subject_label().to_string()
    } else {
        text
    };
    if text.chars().count() > DISPLAY_LIMIT {
        let cut: String = text.chars().take(DISPLAY_LIMIT - 3).collect();
        format!("{cut}...")
    } else {
        text
    }
}

/// One record placed in a quadrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixEntry {
    pub kind: ItemKind,
    pub id: String,
    pub label: String,
    pub importance: i32,
    pub urgency: i32,
    pub timestamp: DateTime<Utc>,
}

/// Store snapshot regrouped by quadrant, newest first within each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    quadrants: BTreeMap<Category, Vec<MatrixEntry>>,
}

impl Matrix {
    pub fn build<'a>(
        records: impl IntoIterator<Item = (ItemKind, &'a PriorityRecord)>,
        cleaner: &SubjectCleaner,
    ) -> Self {
        let mut quadrants: BTreeMap<Category, Vec<MatrixEntry>> = BTreeMap::new();
        for (kind, record) in records {
            quadrants
                .entry(classify(record.importance, record.urgency))
                .or_default()
                .push(MatrixEntry {
                    kind,
                    id: record.id.clone(),
                    label: display_subject(record, cleaner),
                    importance: record.importance,
                    urgency: record.urgency,
                    timestamp: record.timestamp,
                });
        }
        for entries in quadrants.values_mut() {
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        }
        Self { quadrants }
    }

    pub fn entries(&self, category: Category) -> &[MatrixEntry] {
        self.quadrants
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn count(&self, category: Category) -> usize {
        self.entries(category).len()
    }

    pub fn total(&self) -> usize {
        self.quadrants.values().map(Vec::len).sum()
    }

    /// Plain-text rendering, one block per quadrant.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for category in Category::ALL {
            let entries = self.entries(category);
            let _ = writeln!(
                out,
                "{} ({}) [{}]",
                category.label(),
                category.description(),
                entries.len()
            );
            if entries.is_empty() {
                let _ = writeln!(out, "  (empty)");
            }
            for entry in entries {
                let _ = writeln!(
                    out,
                    "  - {} [{}] F:{}/4 S:{}/4 {}",
                    entry.label,
                    entry.kind,
                    entry.importance,
                    entry.urgency,
                    entry.timestamp.format("%Y-%m-%d %H:%M")
                );
            }
        }
        out
    }
}
