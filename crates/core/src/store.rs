//! Annotation records keyed by host object.
//!
//! The host keeps one tag per object; this store is the same data as an
//! explicit map, loaded from a document and flushed back as tag actions.

use crate::config::AnnotationSettings;
use crate::error::QuoteResult;
use crate::record::{self, AnnotationRecord};
use crate::scanner;
use doc_model::{apply_document_action, Document, DocumentAction, ObjectId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    records: BTreeMap<ObjectId, AnnotationRecord>,
    removed: BTreeSet<ObjectId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every readable record in `document`.
    pub fn load(document: &Document, settings: &AnnotationSettings) -> Self {
        let outcome = scanner::scan(document, &settings.tag_name, settings.scan_depth);
        let records =
            outcome.records.into_iter().map(|scanned| (scanned.object_id, scanned.record)).collect();
        Self { records, removed: BTreeSet::new() }
    }

    pub fn read(&self, id: ObjectId) -> Option<&AnnotationRecord> {
        self.records.get(&id)
    }

    /// Store `record` for `id`, returning the record it replaces.
    pub fn write(&mut self, id: ObjectId, record: AnnotationRecord) -> Option<AnnotationRecord> {
        self.removed.remove(&id);
        self.records.insert(id, record)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<AnnotationRecord> {
        let previous = self.records.remove(&id);
        if previous.is_some() {
            self.removed.insert(id);
        }
        previous
    }

    /// Records in object-id order.
    pub fn scan(&self) -> impl Iterator<Item = (ObjectId, &AnnotationRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write every record back to `document` as a `tag_name` tag, and drop the
    /// tags of removed records. Returns the number of tags written.
    pub fn flush(&mut self, document: &mut Document, tag_name: &str) -> QuoteResult<usize> {
        for id in std::mem::take(&mut self.removed) {
            apply_document_action(
                document,
                DocumentAction::RemoveTag { object_id: id, name: tag_name.to_string() },
            )?;
        }

        for (id, record) in &self.records {
            apply_document_action(
                document,
                DocumentAction::SetTag {
                    object_id: *id,
                    name: tag_name.to_string(),
                    value: record::encode(record)?,
                },
            )?;
        }

        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{ItemKind, Layer, PageItem, Tag};

    fn record(material: &str) -> AnnotationRecord {
        AnnotationRecord::new(vec![material.to_string()], BTreeMap::new(), 1.0)
    }

    fn document() -> Document {
        let mut tagged = PageItem::new(ObjectId(7), ItemKind::Path);
        tagged.tags.push(Tag {
            name: "QuoteMaterial".to_string(),
            value: r#"{"material":"Oak","unitValue":"1"}"#.to_string(),
        });
        let mut layer = Layer::new("Layer 1");
        layer.items = vec![PageItem::new(ObjectId(3), ItemKind::Path), tagged];
        Document { name: String::new(), layers: vec![layer], selection: Vec::new() }
    }

    #[test]
    fn test_write_replaces() {
        let mut store = AnnotationStore::new();
        assert!(store.write(ObjectId(1), record("Oak")).is_none());
        let previous = store.write(ObjectId(1), record("Pine"));

        assert_eq!(previous.map(|r| r.materials), Some(vec!["Oak".to_string()]));
        assert_eq!(store.read(ObjectId(1)).map(|r| r.materials[0].as_str()), Some("Pine"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_scan_is_ordered_by_id() {
        let mut store = AnnotationStore::new();
        store.write(ObjectId(9), record("A"));
        store.write(ObjectId(2), record("B"));
        store.write(ObjectId(5), record("C"));

        let ids: Vec<_> = store.scan().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ObjectId(2), ObjectId(5), ObjectId(9)]);
    }

    #[test]
    fn test_load_and_flush() {
        let mut document = document();
        let settings = AnnotationSettings::default();
        let mut store = AnnotationStore::load(&document, &settings);
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(ObjectId(7)).map(|r| r.quantity("Oak")), Some("1"));

        store.write(ObjectId(3), record("Steel"));
        store.remove(ObjectId(7));
        assert_eq!(store.flush(&mut document, &settings.tag_name).unwrap(), 1);

        assert!(document.find_item(ObjectId(7)).unwrap().tags.is_empty());
        let reloaded = AnnotationStore::load(&document, &settings);
        let ids: Vec<_> = reloaded.scan().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![ObjectId(3)]);
        let value = &document.find_item(ObjectId(3)).unwrap().tags[0].value;
        assert!(value.contains("\"materials\":[\"Steel\"]"));
    }

    #[test]
    fn test_flush_unknown_object_fails() {
        let mut document = document();
        let mut store = AnnotationStore::new();
        store.write(ObjectId(99), record("Oak"));
        assert!(store.flush(&mut document, "QuoteMaterial").is_err());
    }
}
