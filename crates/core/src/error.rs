//! Error taxonomy for annotation and report operations.

use crate::bridge::BridgeError;
use crate::csv_export::CsvExportError;
use doc_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("no document is open")]
    NoDocument,

    #[error("selection is empty")]
    EmptySelection,

    #[error("no selected object reported usable geometry")]
    NoValidGeometry,

    #[error("no material selected")]
    NoMaterialSelected,

    #[error("selection envelope is degenerate ({width} x {height} units)")]
    DegenerateGeometry { width: f64, height: f64 },

    #[error("annotation record has neither `materials` nor `material`")]
    UnrecognizedRecordShape,

    #[error("annotation record is not valid JSON: {0}")]
    CorruptRecord(String),

    #[error("no annotation records found")]
    EmptyReport,

    #[error("color {0:?} is not a 6-digit hex value")]
    InvalidColorFormat(String),

    #[error("material {0:?} is not in the catalog")]
    UnknownMaterial(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Export(#[from] CsvExportError),
}

pub type QuoteResult<T> = Result<T, QuoteError>;

impl QuoteError {
    /// Short sentence suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            QuoteError::NoDocument => "Open a document first.".to_string(),
            QuoteError::EmptySelection => "Select at least one object.".to_string(),
            QuoteError::NoValidGeometry => {
                "None of the selected objects has measurable bounds.".to_string()
            }
            QuoteError::NoMaterialSelected => "Select at least one material.".to_string(),
            QuoteError::DegenerateGeometry { .. } => {
                "The selection has no area to annotate.".to_string()
            }
            QuoteError::UnrecognizedRecordShape | QuoteError::CorruptRecord(_) => {
                "An annotation could not be read.".to_string()
            }
            QuoteError::EmptyReport => "Nothing found to export.".to_string(),
            QuoteError::InvalidColorFormat(color) => {
                format!("Material color {color} must be a 6-digit hex value.")
            }
            QuoteError::UnknownMaterial(name) => format!("Material \"{name}\" is not in the catalog."),
            QuoteError::Bridge(BridgeError::Busy) => "Another request is still running.".to_string(),
            QuoteError::Bridge(BridgeError::NoResponse) => {
                "The host application did not respond.".to_string()
            }
            QuoteError::Bridge(_) => "The host application sent an unreadable reply.".to_string(),
            QuoteError::Model(_) => "A selected object no longer exists.".to_string(),
            QuoteError::Export(_) => "The report file could not be written.".to_string(),
        }
    }

    /// User message, followed by the diagnostic detail when `debug` is set.
    pub fn display_message(&self, debug: bool) -> String {
        if debug {
            format!("{} ({self})", self.user_message())
        } else {
            self.user_message()
        }
    }
}
