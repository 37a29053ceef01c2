//! Label text shown next to an annotated selection.
//!
//! The label is always three lines:
//!
//! ```text
//! 5 m PVC + Steel
//! 1200 * 600 mm
//! 0.72 m²
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A material as seen by the label: its name and optional unit label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRef {
    pub name: String,
    /// Empty when the catalog entry has no unit.
    #[serde(default)]
    pub unit: String,
}

impl MaterialRef {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self { name: name.into(), unit: unit.into() }
    }
}

/// A material chosen by the user, with the free-form quantity typed next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionValue {
    pub material: String,
    #[serde(default)]
    pub quantity: String,
}

/// Render one material: `"<quantity> <unit> <name>"`, or the bare name when
/// either quantity or unit is missing.
pub fn material_segment(material: &MaterialRef, quantity: &str) -> String {
    let quantity = quantity.trim();
    let unit = material.unit.trim();
    if quantity.is_empty() || unit.is_empty() {
        material.name.clone()
    } else {
        format!("{quantity} {unit} {}", material.name)
    }
}

/// Join all material segments with `" + "`, in the given order.
pub fn materials_text(materials: &[MaterialRef], unit_values: &BTreeMap<String, String>) -> String {
    materials
        .iter()
        .map(|material| {
            let quantity = unit_values.get(&material.name).map(String::as_str).unwrap_or("");
            material_segment(material, quantity)
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Compose the full three-line label.
pub fn compose(
    materials: &[MaterialRef],
    unit_values: &BTreeMap<String, String>,
    width_mm: f64,
    height_mm: f64,
    area_m2: f64,
) -> String {
    format!(
        "{}\n{} * {} mm\n{:.2} m²",
        materials_text(materials, unit_values),
        width_mm.round() as i64,
        height_mm.round() as i64,
        area_m2
    )
}
