//! Planning of a visual annotation for a selection.
//!
//! [`plan_annotation`] is pure: it turns the selection's bounds, the chosen
//! materials and a label position into host primitives plus the record to
//! attach to every selected object. Applying the plan is up to the host.

use crate::color::Color;
use crate::config::AnnotationSettings;
use crate::envelope::{self, EnvelopeSummary};
use crate::error::{QuoteError, QuoteResult};
use crate::geometry::{BoundingBox, Point};
use crate::label::{self, MaterialRef, SelectionValue};
use crate::record::AnnotationRecord;
use crate::routing::{self, Route};
use doc_model::MaterialCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What the user asked to annotate the current selection with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateRequest {
    /// Materials in the order they were picked.
    pub selections: Vec<SelectionValue>,
    /// Top-left corner of the label box.
    pub label_position: Point,
}

/// A drawing primitive the host creates inside the annotation group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Primitive {
    Rectangle { bounds: BoundingBox, stroke: String, stroke_width: f64 },
    Polyline { points: Vec<Point>, stroke: String, stroke_width: f64 },
    Polygon { points: Vec<Point>, fill: String },
    Text { origin: Point, contents: String, font_size: f64, fill: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPlan {
    pub group_name: String,
    /// Frame, leader, arrowhead, then label.
    pub primitives: Vec<Primitive>,
    /// Record stored on every selected object.
    pub record: AnnotationRecord,
    pub label: String,
    pub summary: EnvelopeSummary,
    pub route: Route,
}

/// Plan the annotation of a selection.
///
/// `boxes` holds one entry per selected object; `None` marks an object without
/// usable geometry.
///
/// # Errors
/// - [`QuoteError::EmptySelection`] / [`QuoteError::NoValidGeometry`] from envelope aggregation
/// - [`QuoteError::NoMaterialSelected`] when no material was picked
/// - [`QuoteError::UnknownMaterial`] for a material missing from the catalog
/// - [`QuoteError::InvalidColorFormat`] when the first material's color is not `#RRGGBB`
/// - [`QuoteError::DegenerateGeometry`] for a zero-width or zero-height envelope,
///   unless `settings.allow_degenerate` is set
pub fn plan_annotation(
    boxes: &[Option<BoundingBox>],
    request: &AnnotateRequest,
    catalog: &MaterialCatalog,
    settings: &AnnotationSettings,
    timestamp: i64,
) -> QuoteResult<AnnotationPlan> {
    let summary = envelope::aggregate(boxes)?;

    let mut materials: Vec<MaterialRef> = Vec::new();
    let mut unit_values: BTreeMap<String, String> = BTreeMap::new();
    for selection in &request.selections {
        if unit_values.contains_key(&selection.material) {
            continue;
        }
        let entry = catalog
            .get(&selection.material)
            .ok_or_else(|| QuoteError::UnknownMaterial(selection.material.clone()))?;
        materials.push(MaterialRef::new(
            selection.material.clone(),
            entry.unit.clone().unwrap_or_default(),
        ));
        unit_values.insert(selection.material.clone(), selection.quantity.trim().to_string());
    }

    let first = materials.first().ok_or(QuoteError::NoMaterialSelected)?;
    let first_entry = catalog
        .get(&first.name)
        .ok_or_else(|| QuoteError::UnknownMaterial(first.name.clone()))?;
    let color = Color::from_hex(&first_entry.color)?.to_hex();

    let envelope = summary.envelope;
    if envelope.is_degenerate() && !settings.allow_degenerate {
        return Err(QuoteError::DegenerateGeometry {
            width: envelope.width(),
            height: envelope.height(),
        });
    }

    let route = routing::route(&envelope, request.label_position, &settings.route_params());
    let label = label::compose(
        &materials,
        &unit_values,
        summary.width_mm(),
        summary.height_mm(),
        summary.total_area_m2,
    );

    let group_name = format!("material-annotation-{}", Uuid::new_v4());
    let names = materials.iter().map(|m| m.name.clone()).collect();
    let mut record = AnnotationRecord::new(names, unit_values, summary.total_area_m2)
        .with_color(color.clone())
        .with_group_name(group_name.clone())
        .with_text_position(request.label_position)
        .with_timestamp(timestamp)
        .with_object_count(summary.object_count);
    if let Some(unit_price) = first_entry.unit_price {
        record = record.with_unit_price(unit_price);
    }

    let primitives = vec![
        Primitive::Rectangle {
            bounds: route.frame,
            stroke: color.clone(),
            stroke_width: settings.stroke_width,
        },
        Primitive::Polyline {
            points: route.leader.to_vec(),
            stroke: color.clone(),
            stroke_width: settings.stroke_width,
        },
        Primitive::Polygon { points: route.arrowhead.to_vec(), fill: color.clone() },
        Primitive::Text {
            origin: route.label_origin,
            contents: label.clone(),
            font_size: settings.font_size,
            fill: color,
        },
    ];

    tracing::debug!(
        group = %group_name,
        objects = summary.object_count,
        area_m2 = summary.total_area_m2,
        side = ?route.anchor_side,
        "annotation planned"
    );

    Ok(AnnotationPlan { group_name, primitives, record, label, summary, route })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{decode, encode, RecordShape};
    use crate::routing::AnchorSide;
    use crate::units;
    use doc_model::MaterialEntry;

    fn catalog() -> MaterialCatalog {
        let mut catalog = MaterialCatalog::default();
        catalog.insert(
            "PVC",
            MaterialEntry { color: "#3366ff".to_string(), unit: Some("m".to_string()), unit_price: None },
        );
        catalog.insert(
            "Steel",
            MaterialEntry { color: "#999999".to_string(), unit: None, unit_price: Some(80.0) },
        );
        catalog.insert(
            "Broken",
            MaterialEntry { color: "grey".to_string(), unit: None, unit_price: None },
        );
        catalog
    }

    fn request(materials: &[(&str, &str)]) -> AnnotateRequest {
        AnnotateRequest {
            selections: materials
                .iter()
                .map(|(m, q)| SelectionValue { material: m.to_string(), quantity: q.to_string() })
                .collect(),
            label_position: Point::new(8000.0, 1400.0),
        }
    }

    fn boxes() -> Vec<Option<BoundingBox>> {
        let side = units::mm_to_units(1000.0);
        vec![
            Some(BoundingBox::new(0.0, side, side, 0.0)),
            None,
            Some(BoundingBox::new(side, side / 2.0, 2.0 * side, 0.0)),
        ]
    }

    #[test]
    fn test_plan_builds_record_and_primitives() {
        let settings = AnnotationSettings::default();
        let plan = plan_annotation(
            &boxes(),
            &request(&[("PVC", "5"), ("Steel", "")]),
            &catalog(),
            &settings,
            1_700_000_000_000,
        )
        .unwrap();

        assert!(plan.group_name.starts_with("material-annotation-"));
        assert_eq!(plan.primitives.len(), 4);
        assert_eq!(plan.route.anchor_side, AnchorSide::Right);

        let record = &plan.record;
        assert_eq!(record.materials, vec!["PVC", "Steel"]);
        assert_eq!(record.quantity("PVC"), "5");
        assert_eq!(record.color, "#3366FF");
        assert_eq!(record.object_count, 2);
        assert!(record.is_multi_select);
        assert!((record.area - 1.5).abs() < 1e-9);
        assert_eq!(record.unit_price, None);

        insta::assert_snapshot!(plan.label, @r"
        5 m PVC + Steel
        2000 * 1000 mm
        1.50 m²
        ");

        let decoded = decode(&encode(record).unwrap()).unwrap();
        assert_eq!(decoded.shape, RecordShape::Current);
        assert_eq!(&decoded.record, record);
    }

    #[test]
    fn test_first_material_sets_price() {
        let plan = plan_annotation(
            &boxes(),
            &request(&[("Steel", ""), ("PVC", "2")]),
            &catalog(),
            &AnnotationSettings::default(),
            0,
        )
        .unwrap();
        assert_eq!(plan.record.color, "#999999");
        assert_eq!(plan.record.unit_price, Some(80.0));
        assert!((plan.record.total_price.unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_materials_keep_first() {
        let plan = plan_annotation(
            &boxes(),
            &request(&[("PVC", "5"), ("PVC", "9")]),
            &catalog(),
            &AnnotationSettings::default(),
            0,
        )
        .unwrap();
        assert_eq!(plan.record.materials, vec!["PVC"]);
        assert_eq!(plan.record.quantity("PVC"), "5");
    }

    #[test]
    fn test_errors() {
        let settings = AnnotationSettings::default();
        let catalog = catalog();

        let result = plan_annotation(&[], &request(&[("PVC", "")]), &catalog, &settings, 0);
        assert!(matches!(result, Err(QuoteError::EmptySelection)));

        let result = plan_annotation(&[None], &request(&[("PVC", "")]), &catalog, &settings, 0);
        assert!(matches!(result, Err(QuoteError::NoValidGeometry)));

        let result = plan_annotation(&boxes(), &request(&[]), &catalog, &settings, 0);
        assert!(matches!(result, Err(QuoteError::NoMaterialSelected)));

        let result = plan_annotation(&boxes(), &request(&[("Glass", "")]), &catalog, &settings, 0);
        assert!(matches!(result, Err(QuoteError::UnknownMaterial(name)) if name == "Glass"));

        let result = plan_annotation(&boxes(), &request(&[("Broken", "")]), &catalog, &settings, 0);
        assert!(matches!(result, Err(QuoteError::InvalidColorFormat(_))));
    }

    #[test]
    fn test_degenerate_selection() {
        let line = vec![Some(BoundingBox::new(0.0, 100.0, 0.0, 0.0))];
        let settings = AnnotationSettings::default();

        let result = plan_annotation(&line, &request(&[("PVC", "")]), &catalog(), &settings, 0);
        assert!(matches!(result, Err(QuoteError::DegenerateGeometry { width, .. }) if width == 0.0));

        let settings = settings.with_allow_degenerate(true);
        let plan = plan_annotation(&line, &request(&[("PVC", "")]), &catalog(), &settings, 0).unwrap();
        assert_eq!(plan.record.area, 0.0);
        assert_eq!(plan.route.frame.width(), 14.0);
    }
}
