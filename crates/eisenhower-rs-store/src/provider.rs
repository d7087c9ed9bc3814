//! The priority store abstraction and helpers shared by its implementations.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eisenhower_rs_protocol::{ItemKind, PriorityMap, PriorityRecord, Settings};

#[async_trait]
/// Persistent `id -> PriorityRecord` mapping, one namespace per [`ItemKind`].
pub trait PriorityStore: Send + Sync {
    /// Insert or fully replace the record stored under `record.id`.
    async fn upsert(&self, kind: ItemKind, record: PriorityRecord) -> Result<(), StoreError>;

    /// Set or clear the custom label of an existing record.
    ///
    /// Returns `false` without writing anything when `id` is absent.
    async fn patch_label(
        &self,
        kind: ItemKind,
        id: &str,
        label: Option<String>,
    ) -> Result<bool, StoreError>;

    /// Remove a record. Returns whether it existed; deleting twice is fine.
    async fn delete(&self, kind: ItemKind, id: &str) -> Result<bool, StoreError>;

    /// Snapshot of a whole namespace.
    async fn get_all(&self, kind: ItemKind) -> Result<PriorityMap, StoreError>;

    async fn get(&self, kind: ItemKind, id: &str) -> Result<Option<PriorityRecord>, StoreError> {
        Ok(self.get_all(kind).await?.remove(id))
    }

    /// Remove every record strictly older than `now - max_age`.
    ///
    /// Returns the removed ids; a second run with the same `now` returns none.
    async fn sweep(
        &self,
        kind: ItemKind,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError>;

    /// Drop both namespaces. Settings are kept.
    async fn clear(&self) -> Result<(), StoreError>;

    async fn load_settings(&self) -> Result<Settings, StoreError>;

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError>;
}

/// Reject records that would break the namespace invariants.
pub fn validate_record(record: &PriorityRecord) -> Result<(), StoreError> {
    if record.id.trim().is_empty() {
        return Err(StoreError::InvalidRecord("id must not be empty".to_string()));
    }
    if record.subject.trim().is_empty() {
        return Err(StoreError::InvalidRecord(format!(
            "subject of {} must not be empty",
            record.id
        )));
    }
    Ok(())
}

/// Remove records older than `now - max_age` from `map`, returning their ids.
pub fn remove_expired(map: &mut PriorityMap, max_age: Duration, now: DateTime<Utc>) -> Vec<String> {
    let cutoff = now - max_age;
    let expired: Vec<String> = map
        .iter()
        .filter(|(_, record)| record.timestamp < cutoff)
        .map(|(id, _)| id.clone())
        .collect();
    for id in &expired {
        map.remove(id);
    }
    expired
}

/// Normalize a user supplied label: blank means "no custom label".
pub(crate) fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{normalize_label, remove_expired, validate_record};
    use chrono::{Duration, TimeZone, Utc};
    use eisenhower_rs_protocol::{PriorityMap, PriorityRecord};
    use pretty_assertions::assert_eq;

    #[test]
    fn expiry_is_strict() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).single().expect("now");
        let mut map = PriorityMap::new();
        for (id, age) in [
            ("boundary", Duration::days(30)),
            ("old", Duration::days(30) + Duration::seconds(1)),
            ("fresh", Duration::days(2)),
        ] {
            map.insert(
                id.to_string(),
                PriorityRecord::new(id, "Subject", 4, 4, now - age),
            );
        }
        assert_eq!(remove_expired(&mut map, Duration::days(30), now), vec!["old"]);
        assert_eq!(
            map.keys().cloned().collect::<Vec<_>>(),
            vec!["boundary".to_string(), "fresh".to_string()]
        );
        assert!(remove_expired(&mut map, Duration::days(30), now).is_empty());
    }

    #[test]
    fn rejects_blank_ids_and_subjects() {
        let now = Utc::now();
        assert!(validate_record(&PriorityRecord::new(" ", "Subject", 1, 1, now)).is_err());
        assert!(validate_record(&PriorityRecord::new("id", "", 1, 1, now)).is_err());
        assert!(validate_record(&PriorityRecord::new("id", "Subject", 1, 1, now)).is_ok());
    }

    #[test]
    fn blank_labels_clear() {
        assert_eq!(normalize_label(Some("  Q3 ".to_string())).as_deref(), Some("Q3"));
        assert_eq!(normalize_label(Some("   ".to_string())), None);
        assert_eq!(normalize_label(None), None);
    }
}
