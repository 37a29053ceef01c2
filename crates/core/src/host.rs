//! In-process host over a [`Document`].
//!
//! [`LocalHost`] answers bridge payloads the way the drawing application
//! does: it reads the selection, creates the annotation group, tags the
//! selected objects and writes quote reports.

use crate::annotate::{self, AnnotateRequest, Primitive};
use crate::bridge::{ExportRequest, HostEngine, HostRequest, HostResponse};
use crate::config::AnnotationSettings;
use crate::csv_export::{self, CsvExportConfig};
use crate::error::{QuoteError, QuoteResult};
use crate::geometry::BoundingBox;
use crate::report;
use crate::scanner;
use crate::store::AnnotationStore;
use doc_model::{
    apply_document_action, Document, DocumentAction, ItemKind, MaterialCatalog, ObjectId, PageItem,
};
use serde_json::json;

pub const APP_NAME: &str = "matquote";

/// Layer used for annotation groups when the selection has no layer.
pub const ANNOTATION_LAYER: &str = "Annotations";

#[derive(Debug, Clone)]
pub struct LocalHost {
    document: Option<Document>,
    catalog: MaterialCatalog,
    settings: AnnotationSettings,
}

impl LocalHost {
    pub fn new(document: Option<Document>, catalog: MaterialCatalog, settings: AnnotationSettings) -> Self {
        Self { document, catalog, settings }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    /// Handle one typed request.
    pub fn handle(&mut self, request: HostRequest) -> HostResponse {
        let result = match request {
            HostRequest::Probe => Ok(self.probe()),
            HostRequest::Annotate(request) => self.annotate(&request),
            HostRequest::Export(request) => self.export(&request),
        };

        result.unwrap_or_else(|error| {
            tracing::warn!(%error, "host request failed");
            let debug = self.settings.debug_messages;
            HostResponse::failure(error.display_message(debug), debug.then(|| error.to_string()))
        })
    }

    fn probe(&self) -> HostResponse {
        let data = json!({
            "appName": APP_NAME,
            "appVersion": env!("CARGO_PKG_VERSION"),
            "documentExists": self.document.is_some(),
            "selectionCount": self.document.as_ref().map_or(0, |d| d.selection.len()),
        });
        HostResponse::ok("Host is reachable.", Some(data))
    }

    fn annotate(&mut self, request: &AnnotateRequest) -> QuoteResult<HostResponse> {
        let document = self.document.as_mut().ok_or(QuoteError::NoDocument)?;
        let selection: Vec<ObjectId> = document
            .selection
            .iter()
            .copied()
            .filter(|id| {
                let found = document.find_item(*id).is_some();
                if !found {
                    tracing::debug!(object = %id, "selected object no longer exists; skipping");
                }
                found
            })
            .collect();

        let boxes: Vec<Option<BoundingBox>> = selection
            .iter()
            .map(|id| document.find_item(*id).and_then(|item| item.bounds).map(BoundingBox::from))
            .collect();

        let timestamp = chrono::Utc::now().timestamp_millis();
        let plan =
            annotate::plan_annotation(&boxes, request, &self.catalog, &self.settings, timestamp)?;

        let layer = selection
            .first()
            .and_then(|id| document.layer_of(*id))
            .map_or_else(|| ANNOTATION_LAYER.to_string(), |layer| layer.name.clone());

        let mut store = AnnotationStore::new();
        for (index, id) in selection.iter().enumerate() {
            let unnamed = document.find_item(*id).is_some_and(|item| item.name.trim().is_empty());
            if unnamed {
                apply_document_action(
                    document,
                    DocumentAction::RenameItem {
                        object_id: *id,
                        name: format!("{} {}", self.settings.unnamed_prefix, index + 1),
                    },
                )?;
            }
            store.write(*id, plan.record.clone());
        }
        store.flush(document, &self.settings.tag_name)?;

        let group = build_group(document, &plan.group_name, &plan.primitives, plan.route.frame);
        apply_document_action(document, DocumentAction::AddItem { layer, item: group })?;

        tracing::info!(group = %plan.group_name, objects = plan.summary.object_count, "annotation applied");

        let data = json!({
            "objectCount": plan.summary.object_count,
            "area": round3(plan.summary.total_area_m2),
            "groupName": plan.group_name,
            "label": plan.label,
        });
        Ok(HostResponse::ok(
            format!("Annotated {} object(s).", plan.summary.object_count),
            Some(data),
        ))
    }

    fn export(&self, request: &ExportRequest) -> QuoteResult<HostResponse> {
        let document = self.document.as_ref().ok_or(QuoteError::NoDocument)?;
        let outcome = scanner::scan(document, &self.settings.tag_name, self.settings.scan_depth);
        let report = report::aggregate(&outcome.records, &self.catalog, self.settings.report_variant)?;

        let config = CsvExportConfig::default().with_quoting(self.settings.quoting);
        let now = chrono::Local::now();
        let path = csv_export::export_to_dir(&request.output_dir, &report, &config, &now)?;

        let mut data = json!({
            "itemCount": report.totals.item_count,
            "path": path.display().to_string(),
        });
        if let Some(amount) = report.totals.total_amount {
            data["totalAmount"] = json!((amount * 100.0).round() / 100.0);
        }

        let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
        Ok(HostResponse::ok(
            format!("Quote exported: {}", file_name.unwrap_or_default()),
            Some(data),
        ))
    }
}

impl HostEngine for LocalHost {
    fn evaluate(&mut self, payload: &str) -> Option<String> {
        let response = match serde_json::from_str::<HostRequest>(payload) {
            Ok(request) => self.handle(request),
            Err(error) => {
                HostResponse::failure("Unsupported request.", Some(error.to_string()))
            }
        };
        serde_json::to_string(&response).ok()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Annotation group holding one page item per primitive.
fn build_group(document: &Document, name: &str, primitives: &[Primitive], frame: BoundingBox) -> PageItem {
    let group_id = document.next_object_id();
    let children = primitives
        .iter()
        .zip(1..)
        .map(|(primitive, offset)| primitive_item(ObjectId(group_id.0 + offset), primitive))
        .collect();

    PageItem::new(group_id, ItemKind::Group)
        .with_name(name)
        .with_bounds(frame.into())
        .with_children(children)
}

fn primitive_item(id: ObjectId, primitive: &Primitive) -> PageItem {
    match primitive {
        Primitive::Rectangle { bounds, stroke, .. } => {
            let mut item = PageItem::new(id, ItemKind::Rectangle).with_name("frame").with_bounds((*bounds).into());
            item.stroke = Some(stroke.clone());
            item
        }
        Primitive::Polyline { points, stroke, .. } => {
            let mut item = PageItem::new(id, ItemKind::Polyline).with_name("leader");
            item.points = points.iter().map(|p| (*p).into()).collect();
            item.stroke = Some(stroke.clone());
            item
        }
        Primitive::Polygon { points, fill } => {
            let mut item = PageItem::new(id, ItemKind::Polygon).with_name("arrowhead");
            item.points = points.iter().map(|p| (*p).into()).collect();
            item.fill = Some(fill.clone());
            item
        }
        Primitive::Text { origin, contents, fill, .. } => {
            let mut item = PageItem::new(id, ItemKind::Text).with_name("label");
            item.points = vec![(*origin).into()];
            item.contents = Some(contents.clone());
            item.fill = Some(fill.clone());
            item
        }
    }
}
