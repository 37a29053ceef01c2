//! Document scanner collecting annotation records from tagged items.

use crate::config::ScanDepth;
use crate::error::QuoteResult;
use crate::record::{self, AnnotationRecord, Decoded, RecordShape};
use doc_model::{Document, ObjectId, PageItem};
use serde::Serialize;

/// Name shown in reports for items without a name.
pub const UNNAMED_OBJECT: &str = "Unnamed object";

/// An annotated item found in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScannedRecord {
    pub object_id: ObjectId,
    /// Name of the top-level layer the item lives in.
    pub layer_name: String,
    /// Item name, or [`UNNAMED_OBJECT`] when the item has none.
    pub display_name: String,
    pub record: AnnotationRecord,
    pub shape: RecordShape,
}

/// Statistics about a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Items visited, containers included
    pub visited: usize,
    /// Items carrying the annotation tag
    pub tagged: usize,
    /// Records decoded from the legacy shape
    pub legacy: usize,
    /// Tags skipped because they could not be decoded
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanOutcome {
    /// Records in document order (layer order, then depth-first item order).
    pub records: Vec<ScannedRecord>,
    pub stats: ScanStats,
}

/// Decode the annotation carried by `item`, if any.
///
/// Only the first tag named `tag_name` is considered. `None` means the item
/// is not annotated; `Some(Err(_))` means the tag exists but cannot be read.
pub fn inspect(item: &PageItem, tag_name: &str) -> Option<QuoteResult<Decoded>> {
    item.tag(tag_name).map(|tag| record::decode(&tag.value))
}

/// Walk every layer of `document` and collect decodable annotation records.
///
/// Undecodable tags are logged and skipped; they never abort the scan.
pub fn scan(document: &Document, tag_name: &str, depth: ScanDepth) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for layer in &document.layers {
        for item in &layer.items {
            visit(item, &layer.name, tag_name, depth, &mut outcome);
        }
    }

    tracing::info!(
        found = outcome.records.len(),
        visited = outcome.stats.visited,
        skipped = outcome.stats.skipped,
        "document scan finished"
    );
    outcome
}

fn visit(item: &PageItem, layer_name: &str, tag_name: &str, depth: ScanDepth, outcome: &mut ScanOutcome) {
    outcome.stats.visited += 1;

    match inspect(item, tag_name) {
        None => {}
        Some(Ok(decoded)) => {
            outcome.stats.tagged += 1;
            if decoded.shape == RecordShape::Legacy {
                outcome.stats.legacy += 1;
            }
            let display_name = if item.name.trim().is_empty() {
                UNNAMED_OBJECT.to_string()
            } else {
                item.name.clone()
            };
            outcome.records.push(ScannedRecord {
                object_id: item.id,
                layer_name: layer_name.to_string(),
                display_name,
                record: decoded.record,
                shape: decoded.shape,
            });
        }
        Some(Err(error)) => {
            outcome.stats.tagged += 1;
            outcome.stats.skipped += 1;
            tracing::debug!(object = %item.id, %error, "skipping unreadable annotation tag");
        }
    }

    if depth == ScanDepth::Recursive {
        for child in &item.children {
            visit(child, layer_name, tag_name, depth, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{ItemKind, Layer, Tag};

    const TAG: &str = "QuoteMaterial";

    fn tagged(id: u64, name: &str, value: &str) -> PageItem {
        let mut item = PageItem::new(ObjectId(id), ItemKind::Path).with_name(name);
        item.tags.push(Tag { name: TAG.to_string(), value: value.to_string() });
        item
    }

    fn document() -> Document {
        let nested = tagged(4, "", r#"{"material":"Oak","unitValue":"2"}"#);
        let group = PageItem::new(ObjectId(3), ItemKind::Group).with_children(vec![nested]);

        let mut first = Layer::new("Walls");
        first.items = vec![
            tagged(1, "north wall", r#"{"materials":["PVC"],"area":1.5}"#),
            PageItem::new(ObjectId(2), ItemKind::Path),
            group,
        ];

        let mut second = Layer::new("Doors");
        second.items = vec![tagged(5, "front", "{broken"), tagged(6, "back", r#"{"area":3}"#)];

        Document { name: "plan".to_string(), layers: vec![first, second], selection: Vec::new() }
    }

    #[test]
    fn test_recursive_scan_finds_nested_items() {
        let outcome = scan(&document(), TAG, ScanDepth::Recursive);
        let ids: Vec<_> = outcome.records.iter().map(|r| r.object_id).collect();

        assert_eq!(ids, vec![ObjectId(1), ObjectId(4)]);
        assert_eq!(outcome.records[1].display_name, UNNAMED_OBJECT);
        assert_eq!(outcome.records[1].layer_name, "Walls");
        assert_eq!(outcome.records[1].shape, RecordShape::Legacy);
        assert_eq!(
            outcome.stats,
            ScanStats { visited: 6, tagged: 4, legacy: 1, skipped: 2 }
        );
    }

    #[test]
    fn test_top_level_scan_skips_children() {
        let outcome = scan(&document(), TAG, ScanDepth::TopLevel);
        let ids: Vec<_> = outcome.records.iter().map(|r| r.object_id).collect();

        assert_eq!(ids, vec![ObjectId(1)]);
        assert_eq!(outcome.stats.visited, 5);
    }

    #[test]
    fn test_only_first_matching_tag_is_read() {
        let mut item = tagged(1, "panel", "{broken");
        item.tags.push(Tag {
            name: TAG.to_string(),
            value: r#"{"materials":["Steel"]}"#.to_string(),
        });

        assert!(matches!(inspect(&item, TAG), Some(Err(_))));
    }

    #[test]
    fn test_other_tags_are_ignored() {
        let mut item = PageItem::new(ObjectId(9), ItemKind::Path);
        item.tags.push(Tag { name: "Other".to_string(), value: "{}".to_string() });

        assert!(inspect(&item, TAG).is_none());
        assert!(scan(&Document::default(), TAG, ScanDepth::Recursive).records.is_empty());
    }
}
