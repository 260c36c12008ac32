//! Incremental update planning.
//!
//! Compares the records currently in a source against the chunks already
//! persisted for them. A record is unchanged when the first persisted chunk
//! of its group carries the same title and modified marker; everything else
//! is re-chunked, and stale chunks are deleted.

use crate::types::{IncrementalUpdatePlan, PersistedChunk, SourceRecordMetadata};
use std::collections::{BTreeSet, HashMap};

/// Compute the add/delete plan for one collection.
pub fn compute_plan(
    current: &[SourceRecordMetadata],
    persisted: &[PersistedChunk],
) -> IncrementalUpdatePlan {
    // Later duplicates win
    let mut current_by_id: HashMap<&str, &SourceRecordMetadata> = HashMap::new();
    for record in current {
        current_by_id.insert(record.source_id.as_str(), record);
    }

    let groups = group_by_source(persisted);

    let mut unchanged: BTreeSet<&str> = BTreeSet::new();
    let mut chunk_ids_to_delete = BTreeSet::new();

    for (source_id, chunks) in &groups {
        let first = chunks[0];
        let matched = current_by_id
            .get(source_id.as_str())
            .copied()
            .filter(|record| {
                record.title == first.title() && record.modified_marker == first.modified_marker()
            });

        match matched {
            Some(record) => {
                unchanged.insert(record.source_id.as_str());
            }
            None => chunk_ids_to_delete.extend(chunks.iter().map(|c| c.chunk_id.clone())),
        }
    }

    let record_ids_to_add = current_by_id
        .keys()
        .filter(|id| !unchanged.contains(**id))
        .map(|id| id.to_string())
        .collect();

    let plan = IncrementalUpdatePlan {
        record_ids_to_add,
        chunk_ids_to_delete,
    };

    tracing::debug!(
        current = current_by_id.len(),
        persisted_groups = groups.len(),
        unchanged = unchanged.len(),
        to_add = plan.record_ids_to_add.len(),
        to_delete = plan.chunk_ids_to_delete.len(),
        "Computed incremental update plan"
    );

    plan
}

/// Source ids whose persisted chunks disagree on title or modified marker.
///
/// Only the first chunk of a group decides whether it is unchanged, so a
/// partially rewritten group can hide stale chunks. This surfaces them.
pub fn inconsistent_groups(persisted: &[PersistedChunk]) -> Vec<String> {
    let mut ids: Vec<String> = group_by_source(persisted)
        .into_iter()
        .filter(|(_, chunks)| {
            let (title, marker) = (chunks[0].title(), chunks[0].modified_marker());
            chunks[1..]
                .iter()
                .any(|c| c.title() != title || c.modified_marker() != marker)
        })
        .map(|(source_id, _)| source_id)
        .collect();
    ids.sort();
    ids
}

/// Group chunks by owning record, keeping store order inside each group.
fn group_by_source(persisted: &[PersistedChunk]) -> HashMap<String, Vec<&PersistedChunk>> {
    let mut groups: HashMap<String, Vec<&PersistedChunk>> = HashMap::new();
    for chunk in persisted {
        groups.entry(chunk.source_id()).or_default().push(chunk);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, title: &str, marker: &str) -> SourceRecordMetadata {
        SourceRecordMetadata::new(id, title, marker)
    }

    fn chunk(id: &str, source_id: &str, title: &str, marker: &str) -> PersistedChunk {
        let metadata = json!({
            "source_id": source_id,
            "title": title,
            "modified_marker": marker,
        });
        PersistedChunk::new(id, metadata.as_object().cloned().unwrap())
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unchanged_record_is_left_alone() {
        let current = vec![record("A", "T", "v1")];
        let persisted = vec![chunk("c1", "A", "T", "v1"), chunk("c2", "A", "T", "v1")];

        let plan = compute_plan(&current, &persisted);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_changed_marker_replaces_chunks() {
        let current = vec![record("A", "T", "v2")];
        let persisted = vec![chunk("c1", "A", "T", "v1"), chunk("c2", "A", "T", "v1")];

        let plan = compute_plan(&current, &persisted);
        assert_eq!(plan.record_ids_to_add, ids(&["A"]));
        assert_eq!(plan.chunk_ids_to_delete, ids(&["c1", "c2"]));
    }

    #[test]
    fn test_changed_title_replaces_chunks() {
        let current = vec![record("A", "Renamed", "v1")];
        let persisted = vec![chunk("c1", "A", "T", "v1")];

        let plan = compute_plan(&current, &persisted);
        assert_eq!(plan.record_ids_to_add, ids(&["A"]));
        assert_eq!(plan.chunk_ids_to_delete, ids(&["c1"]));
    }

    #[test]
    fn test_removed_and_new_records() {
        let current = vec![record("B", "U", "v1")];
        let persisted = vec![chunk("c1", "A", "T", "v1")];

        let plan = compute_plan(&current, &persisted);
        assert_eq!(plan.record_ids_to_add, ids(&["B"]));
        assert_eq!(plan.chunk_ids_to_delete, ids(&["c1"]));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(compute_plan(&[], &[]).is_empty());

        let plan = compute_plan(&[record("A", "T", "")], &[]);
        assert_eq!(plan.record_ids_to_add, ids(&["A"]));
        assert!(plan.chunk_ids_to_delete.is_empty());

        let plan = compute_plan(&[], &[chunk("c1", "A", "T", "v1")]);
        assert!(plan.record_ids_to_add.is_empty());
        assert_eq!(plan.chunk_ids_to_delete, ids(&["c1"]));
    }

    #[test]
    fn test_empty_markers_compare_equal() {
        let current = vec![record("https://docs/a", "A", "")];
        let persisted = vec![chunk("c1", "https://docs/a", "A", "")];
        assert!(compute_plan(&current, &persisted).is_empty());
    }

    #[test]
    fn test_only_first_chunk_decides() {
        let current = vec![record("A", "T", "v2")];
        let persisted = vec![chunk("c1", "A", "T", "v2"), chunk("c2", "A", "T", "v1")];

        assert!(compute_plan(&current, &persisted).is_empty());
        assert_eq!(inconsistent_groups(&persisted), vec!["A".to_string()]);
    }

    #[test]
    fn test_duplicate_records_last_wins() {
        let current = vec![record("A", "T", "v1"), record("A", "T", "v2")];
        let persisted = vec![chunk("c1", "A", "T", "v2")];

        assert!(compute_plan(&current, &persisted).is_empty());
    }

    #[test]
    fn test_chunks_without_source_id_are_deleted() {
        let orphan = PersistedChunk::new("c9", serde_json::Map::new());
        let plan = compute_plan(&[record("A", "T", "v1")], &[orphan]);

        assert_eq!(plan.record_ids_to_add, ids(&["A"]));
        assert_eq!(plan.chunk_ids_to_delete, ids(&["c9"]));
    }

    #[test]
    fn test_plan_sets_are_disjoint_from_unchanged() {
        let current = vec![
            record("A", "T", "v1"),
            record("B", "U", "v2"),
            record("C", "V", "v1"),
        ];
        let persisted = vec![
            chunk("a1", "A", "T", "v1"),
            chunk("b1", "B", "U", "v1"),
            chunk("d1", "D", "W", "v1"),
        ];

        let plan = compute_plan(&current, &persisted);
        assert_eq!(plan.record_ids_to_add, ids(&["B", "C"]));
        assert_eq!(plan.chunk_ids_to_delete, ids(&["b1", "d1"]));

        // Every persisted chunk is either kept (unchanged owner) or deleted
        for c in &persisted {
            let kept = c.source_id() == "A";
            assert_eq!(kept, !plan.chunk_ids_to_delete.contains(&c.chunk_id));
        }
    }
}
