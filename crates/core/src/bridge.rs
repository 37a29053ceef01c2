//! Request/response channel to the host application.
//!
//! The host evaluates one serialized request at a time and answers with a
//! single string. [`Bridge`] enforces that only one request is outstanding
//! and parses the reply envelope; it never retries.

use crate::annotate::AnnotateRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HostRequest {
    /// Report application and document state.
    Probe,
    /// Annotate the current selection.
    Annotate(AnnotateRequest),
    /// Scan the document and write the quote report.
    Export(ExportRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Directory the CSV file is written to.
    pub output_dir: PathBuf,
}

/// Outer envelope of every host reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Diagnostic detail, only filled when debug messages are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostResponse {
    pub fn ok(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self { success: true, message: message.into(), data, error: None }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self { success: false, message: message.into(), data: None, error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// A request that has been handed to the host and not yet resolved.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    /// Serialized [`HostRequest`]
    pub payload: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("a host request is already in flight")]
    Busy,

    #[error("host returned no response")]
    NoResponse,

    #[error("host response is malformed: {0}")]
    MalformedResponse(String),

    #[error("request {0:?} is not the one in flight")]
    Stale(RequestId),

    #[error("request could not be serialized: {0}")]
    Encode(String),
}

/// Host side of the channel: evaluates a payload, answering with at most one string.
pub trait HostEngine {
    fn evaluate(&mut self, payload: &str) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct Bridge {
    next_id: u64,
    in_flight: Option<RequestId>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Claim the channel for `request`.
    ///
    /// # Errors
    /// Returns [`BridgeError::Busy`] while another request is outstanding.
    pub fn begin(&mut self, request: &HostRequest) -> Result<PendingRequest, BridgeError> {
        if self.in_flight.is_some() {
            return Err(BridgeError::Busy);
        }

        let payload =
            serde_json::to_string(request).map_err(|e| BridgeError::Encode(e.to_string()))?;
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.in_flight = Some(id);

        tracing::debug!(id = id.0, "host request started");
        Ok(PendingRequest { id, payload })
    }

    /// Parse the host's reply to `pending` and free the channel.
    pub fn resolve(
        &mut self,
        pending: PendingRequest,
        raw: Option<&str>,
    ) -> Result<HostResponse, BridgeError> {
        self.release(&pending)?;

        let raw = raw.map(str::trim).filter(|raw| !raw.is_empty()).ok_or(BridgeError::NoResponse)?;
        serde_json::from_str(raw).map_err(|e| {
            tracing::warn!(id = pending.id.0, error = %e, "host reply is not a response envelope");
            BridgeError::MalformedResponse(e.to_string())
        })
    }

    /// Abandon `pending` without a reply.
    pub fn cancel(&mut self, pending: PendingRequest) -> Result<(), BridgeError> {
        self.release(&pending)?;
        tracing::debug!(id = pending.id.0, "host request cancelled");
        Ok(())
    }

    /// Send `request` to `engine` and wait for its reply.
    pub fn call(
        &mut self,
        engine: &mut dyn HostEngine,
        request: &HostRequest,
    ) -> Result<HostResponse, BridgeError> {
        let pending = self.begin(request)?;
        let raw = engine.evaluate(&pending.payload);
        self.resolve(pending, raw.as_deref())
    }

    fn release(&mut self, pending: &PendingRequest) -> Result<(), BridgeError> {
        if self.in_flight != Some(pending.id) {
            return Err(BridgeError::Stale(pending.id));
        }
        self.in_flight = None;
        Ok(())
    }
}
