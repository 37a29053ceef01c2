//! Annotation records persisted as JSON tag values on host objects.
//!
//! Two shapes exist on disk. The current shape carries an ordered `materials`
//! list and a `unitValues` mapping. Older documents carry a single
//! `material` (with optional `unitValue`, `unitPrice`, `totalPrice`). Both are
//! read; only the current shape is ever written.

use crate::error::{QuoteError, QuoteResult};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata describing one applied annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    /// Material names in selection order.
    pub materials: Vec<String>,
    /// Free-form quantity per material name.
    pub unit_values: BTreeMap<String, String>,
    /// Total area in square meters across the annotated selection.
    pub area: f64,
    /// `#RRGGBB` color of the drawn annotation.
    pub color: String,
    pub group_name: String,
    pub text_position: Point,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub object_count: usize,
    pub is_multi_select: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

impl AnnotationRecord {
    pub fn new(materials: Vec<String>, unit_values: BTreeMap<String, String>, area: f64) -> Self {
        Self {
            materials,
            unit_values,
            area,
            color: String::new(),
            group_name: String::new(),
            text_position: Point::default(),
            timestamp: 0,
            object_count: 1,
            is_multi_select: false,
            unit_price: None,
            total_price: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_group_name(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    pub fn with_text_position(mut self, position: Point) -> Self {
        self.text_position = position;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the object count; more than one object marks a multi-selection.
    pub fn with_object_count(mut self, count: usize) -> Self {
        self.object_count = count;
        self.is_multi_select = count > 1;
        self
    }

    /// Attach a unit price; the total price is `area * unit_price`.
    pub fn with_unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = Some(unit_price);
        self.total_price = Some(self.area * unit_price);
        self
    }

    /// Quantity text recorded for `material`, empty when none.
    pub fn quantity(&self, material: &str) -> &str {
        self.unit_values.get(material).map(String::as_str).unwrap_or("")
    }
}

/// Which on-disk shape a record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordShape {
    Current,
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub record: AnnotationRecord,
    pub shape: RecordShape,
}

/// Encode a record as a tag value.
pub fn encode(record: &AnnotationRecord) -> QuoteResult<String> {
    serde_json::to_string(record).map_err(|e| QuoteError::CorruptRecord(e.to_string()))
}

/// Decode a tag value in either shape.
///
/// # Errors
/// - [`QuoteError::CorruptRecord`] if the value is not a JSON object
/// - [`QuoteError::UnrecognizedRecordShape`] if neither `materials` nor `material` is present
pub fn decode(raw: &str) -> QuoteResult<Decoded> {
    let raw: RawRecord =
        serde_json::from_str(raw).map_err(|e| QuoteError::CorruptRecord(e.to_string()))?;

    let text_position = raw.text_position.unwrap_or_default();
    let object_count = raw.object_count.unwrap_or(1);

    let (materials, unit_values, shape) = if let Some(materials) = raw.materials {
        let unit_values = raw
            .unit_values
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name, value.into_text()))
            .collect();
        (materials, unit_values, RecordShape::Current)
    } else if let Some(material) = raw.material {
        let value = raw.unit_value.map(LooseText::into_text).unwrap_or_default();
        let unit_values = BTreeMap::from([(material.clone(), value)]);
        (vec![material], unit_values, RecordShape::Legacy)
    } else {
        return Err(QuoteError::UnrecognizedRecordShape);
    };

    let record = AnnotationRecord {
        materials,
        unit_values,
        area: raw.area.and_then(LooseNumber::value).unwrap_or(0.0),
        color: raw.color.unwrap_or_default(),
        group_name: raw.group_name.unwrap_or_default(),
        text_position,
        timestamp: raw.timestamp.unwrap_or(0),
        object_count,
        is_multi_select: raw.is_multi_select.unwrap_or(object_count > 1),
        unit_price: raw.unit_price.and_then(LooseNumber::value),
        total_price: raw.total_price.and_then(LooseNumber::value),
    };

    Ok(Decoded { record, shape })
}

/// Every field optional so both shapes parse through one type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    materials: Option<Vec<String>>,
    unit_values: Option<BTreeMap<String, LooseText>>,
    material: Option<String>,
    unit_value: Option<LooseText>,
    area: Option<LooseNumber>,
    color: Option<String>,
    group_name: Option<String>,
    text_position: Option<Point>,
    timestamp: Option<i64>,
    object_count: Option<usize>,
    is_multi_select: Option<bool>,
    unit_price: Option<LooseNumber>,
    total_price: Option<LooseNumber>,
}

/// Quantities were written both as strings and as bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseText {
    Text(String),
    Number(serde_json::Number),
}

impl LooseText {
    fn into_text(self) -> String {
        match self {
            LooseText::Text(text) => text,
            LooseText::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn value(self) -> Option<f64> {
        match self {
            LooseNumber::Number(value) => Some(value),
            LooseNumber::Text(text) => text.trim().parse().ok(),
        }
    }
}
