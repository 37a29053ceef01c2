//! Aggregation of per-object bounds into one envelope and a total area.

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::BoundingBox;
use crate::units;
use serde::{Deserialize, Serialize};

/// Result of aggregating the bounds of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSummary {
    /// Smallest box enclosing every valid input box.
    pub envelope: BoundingBox,
    /// Sum of each box's own area in square meters, not the envelope's area.
    pub total_area_m2: f64,
    /// Number of boxes that contributed.
    pub object_count: usize,
    /// Number of inputs skipped for missing or non-finite geometry.
    pub skipped: usize,
}

impl EnvelopeSummary {
    pub fn width_mm(&self) -> f64 {
        units::units_to_mm(self.envelope.width())
    }

    pub fn height_mm(&self) -> f64 {
        units::units_to_mm(self.envelope.height())
    }
}

/// Combine the bounds of a selection.
///
/// `None` entries stand for objects whose geometry the host could not report;
/// they are skipped rather than failing the whole selection.
///
/// # Errors
/// - [`QuoteError::EmptySelection`] when `boxes` is empty
/// - [`QuoteError::NoValidGeometry`] when every entry was skipped
pub fn aggregate(boxes: &[Option<BoundingBox>]) -> QuoteResult<EnvelopeSummary> {
    if boxes.is_empty() {
        return Err(QuoteError::EmptySelection);
    }

    let mut envelope: Option<BoundingBox> = None;
    let mut total_area_m2 = 0.0;
    let mut object_count = 0;
    let mut skipped = 0;

    for (index, entry) in boxes.iter().enumerate() {
        let bbox = match entry {
            Some(bbox) if bbox.is_finite() => bbox,
            _ => {
                tracing::debug!(index, "skipping object without usable bounds");
                skipped += 1;
                continue;
            }
        };

        total_area_m2 += bbox.area_m2();
        object_count += 1;
        envelope = Some(match envelope {
            Some(current) => current.union(bbox),
            None => *bbox,
        });
    }

    let envelope = envelope.ok_or(QuoteError::NoValidGeometry)?;

    Ok(EnvelopeSummary { envelope, total_area_m2, object_count, skipped })
}
