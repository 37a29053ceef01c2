//! Material quote core library
//!
//! Annotation geometry and persistence engine: aggregates the bounds of a
//! selection, routes a leader line to its label, persists annotation records
//! as tags on host objects, and turns the records found in a document into a
//! CSV quote report.

pub mod annotate;
pub mod bridge;
pub mod color;
pub mod config;
pub mod csv_export;
pub mod envelope;
pub mod error;
pub mod geometry;
pub mod host;
pub mod label;
pub mod record;
pub mod report;
pub mod routing;
pub mod scanner;
pub mod store;
pub mod units;

pub use annotate::{plan_annotation, AnnotateRequest, AnnotationPlan, Primitive};
pub use bridge::{
    Bridge, BridgeError, ExportRequest, HostEngine, HostRequest, HostResponse, PendingRequest,
    RequestId,
};
pub use color::Color;
pub use config::{AnnotationSettings, ConfigError, Quoting, ReportVariant, ScanDepth};
pub use csv_export::{CsvExportConfig, CsvExportError, CsvExportResult};
pub use envelope::EnvelopeSummary;
pub use error::{QuoteError, QuoteResult};
pub use geometry::{BoundingBox, Point};
pub use host::LocalHost;
pub use label::{MaterialRef, SelectionValue};
pub use record::{AnnotationRecord, Decoded, RecordShape};
pub use report::{Report, ReportRow, ReportTotals};
pub use routing::{AnchorSide, Route, RouteParams};
pub use scanner::{ScanOutcome, ScanStats, ScannedRecord};
pub use store::AnnotationStore;
