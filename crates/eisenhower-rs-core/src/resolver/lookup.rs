//! Finding a stored item again in a freshly rendered list.

use super::identifier::LOOKUP_ATTRIBUTES;
use super::subject::{SubjectCleaner, collapse_whitespace};
use crate::error::EisenhowerError;
use crate::renderer::{PRIORITY_ID_ATTR, is_annotation};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use eisenhower_rs_dom::{Document, NodeId, Selector};
use log::debug;
use regex::Regex;

/// Dates further than this from the stored timestamp do not disambiguate.
const MAX_DATE_DISTANCE_HOURS: i64 = 24;

fn date_patterns() -> Result<[Regex; 2], EisenhowerError> {
    let compile = |pattern: &str| {
        Regex::new(pattern).map_err(|err| EisenhowerError::Pattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
    };
    Ok([
        compile(r"(\d{4})[^\d]*(\d{1,2})[^\d]*(\d{1,2})[^\d]*(\d{1,2}):(\d{2})")?,
        compile(r"(\d{4})-(\d{2})-(\d{2})T?(\d{2}):(\d{2})")?,
    ])
}

/// Parse the first `YYYY. MM. DD. HH:MM` or `YYYY-MM-DDTHH:MM` date in `text`,
/// read as local time.
pub fn parse_embedded_date(patterns: &[Regex], text: &str) -> Option<DateTime<Utc>> {
    patterns.iter().find_map(|pattern| {
        let captures = pattern.captures(text)?;
        let field = |index: usize| -> Option<u32> { captures.get(index)?.as_str().parse().ok() };
        let year = i32::try_from(field(1)?).ok()?;
        let naive = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?
            .and_hms_opt(field(4)?, field(5)?, 0)?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    })
}

/// Locates a stored item by id, or by subject and timestamp.
#[derive(Debug, Clone)]
pub struct ItemLocator {
    candidates: Selector,
    date_nodes: Selector,
    patterns: [Regex; 2],
}

impl ItemLocator {
    pub fn new() -> Result<Self, EisenhowerError> {
        Ok(Self {
            candidates: Selector::parse(r#"[data-convid], [role="option"]"#)?,
            date_nodes: Selector::parse("[title], time, span")?,
            patterns: date_patterns()?,
        })
    }

    /// Element carrying `id` in one of the identifier attributes.
    pub fn by_id(&self, doc: &Document, id: &str) -> Option<NodeId> {
        LOOKUP_ATTRIBUTES
            .iter()
            .chain(std::iter::once(&PRIORITY_ID_ATTR))
            .find_map(|name| doc.find_by_attr(name, id))
            .filter(|node| !is_annotation(doc, *node))
    }

    /// Find by id first, then by subject, using the stored timestamp to pick
    /// among several subject matches.
    pub fn locate(
        &self,
        doc: &Document,
        cleaner: &SubjectCleaner,
        id: &str,
        subject: Option<&str>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<NodeId> {
        if let Some(node) = self.by_id(doc, id) {
            return Some(node);
        }
        let subject = cleaner.strip(subject?);
        if subject.is_empty() {
            return None;
        }
        let matches: Vec<NodeId> = doc
            .select(&self.candidates)
            .into_iter()
            .filter(|item| {
                doc.attr(*item, "aria-label")
                    .is_some_and(|label| label.contains(&subject))
                    || collapse_whitespace(&doc.text_content(*item)).contains(&subject)
            })
            .collect();
        debug!("subject lookup (id={id}, candidates={})", matches.len());
        match matches.as_slice() {
            [] => None,
            [only] => Some(*only),
            [first, ..] => Some(
                timestamp
                    .and_then(|timestamp| self.closest_by_date(doc, &matches, timestamp))
                    .unwrap_or(*first),
            ),
        }
    }

    fn closest_by_date(
        &self,
        doc: &Document,
        candidates: &[NodeId],
        timestamp: DateTime<Utc>,
    ) -> Option<NodeId> {
        let mut best: Option<(NodeId, i64)> = None;
        for candidate in candidates {
            for node in doc.select_within(*candidate, &self.date_nodes) {
                let text = doc
                    .attr(node, "title")
                    .filter(|title| !title.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| doc.text_content(node));
                let Some(date) = parse_embedded_date(&self.patterns, &text) else {
                    continue;
                };
                let distance = (date - timestamp).num_milliseconds().abs();
                if best.is_none_or(|(_, current)| distance < current) {
                    best = Some((*candidate, distance));
                }
            }
        }
        best.filter(|(_, distance)| *distance < MAX_DATE_DISTANCE_HOURS * 60 * 60 * 1000)
            .map(|(node, _)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemLocator, date_patterns, parse_embedded_date};
    use crate::resolver::SubjectCleaner;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use eisenhower_rs_config::LocaleConfig;
    use eisenhower_rs_dom::Document;
    use pretty_assertions::assert_eq;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .earliest()
            .expect("local time")
            .with_timezone(&Utc)
    }

    #[test]
    fn parses_both_date_shapes() {
        let patterns = date_patterns().expect("patterns");
        assert_eq!(
            parse_embedded_date(&patterns, "Sent 2025. 11. 17. 14:17"),
            Some(local(2025, 11, 17, 14, 17))
        );
        assert_eq!(
            parse_embedded_date(&patterns, "2025-03-04T09:05"),
            Some(local(2025, 3, 4, 9, 5))
        );
        assert_eq!(parse_embedded_date(&patterns, "14:17"), None);
        assert_eq!(parse_embedded_date(&patterns, "2025. 13. 40. 10:00"), None);
    }

    fn inbox() -> Document {
        Document::parse_html(
            r#"<div role="option" aria-label="Ops; Weekly report; 2025. 05. 01. 09:00">
                 <span title="2025. 05. 01. 09:00">Thu</span>
               </div>
               <div role="option" aria-label="Ops; Weekly report; 2025. 05. 08. 09:00">
                 <span title="2025. 05. 08. 09:00">Thu</span>
               </div>
               <div data-convid="AAQk7"><span>Budget review</span></div>"#,
        )
    }

    #[test]
    fn finds_by_id_then_subject() {
        let doc = inbox();
        let cleaner = SubjectCleaner::new(&LocaleConfig::default()).expect("cleaner");
        let locator = ItemLocator::new().expect("locator");

        let by_id = locator
            .locate(&doc, &cleaner, "AAQk7", None, None)
            .expect("by id");
        assert_eq!(doc.attr(by_id, "data-convid"), Some("AAQk7"));

        let by_subject = locator
            .locate(&doc, &cleaner, "gone", Some("RE: Budget review"), None)
            .expect("by subject");
        assert_eq!(by_subject, by_id);
        assert_eq!(locator.locate(&doc, &cleaner, "gone", Some("RE:"), None), None);
        assert_eq!(locator.locate(&doc, &cleaner, "gone", None, None), None);
    }

    #[test]
    fn timestamps_pick_among_duplicates() {
        let doc = inbox();
        let cleaner = SubjectCleaner::new(&LocaleConfig::default()).expect("cleaner");
        let locator = ItemLocator::new().expect("locator");
        let label = |node| doc.attr(node, "aria-label").map(str::to_string);

        let second = locator
            .locate(
                &doc,
                &cleaner,
                "gone",
                Some("Weekly report"),
                Some(local(2025, 5, 8, 10, 30)),
            )
            .expect("second");
        assert!(label(second).expect("label").contains("05. 08."));

        let far = locator
            .locate(
                &doc,
                &cleaner,
                "gone",
                Some("Weekly report"),
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("ts")),
            )
            .expect("first");
        assert!(label(far).expect("label").contains("05. 01."));
    }
}
