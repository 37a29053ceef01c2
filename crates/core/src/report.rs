//! Report aggregation over scanned annotation records.

use crate::config::ReportVariant;
use crate::error::{QuoteError, QuoteResult};
use crate::label::{self, MaterialRef};
use crate::scanner::ScannedRecord;
use doc_model::MaterialCatalog;
use serde::Serialize;

/// One report line derived from one annotation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// Display name of the annotated object.
    pub layer_name: String,
    pub materials_text: String,
    /// Square meters
    pub area: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

impl ReportRow {
    fn fields(&self, variant: ReportVariant) -> Vec<String> {
        let mut fields = vec![
            self.layer_name.clone(),
            self.materials_text.clone(),
            format!("{:.3}", self.area),
        ];
        if variant == ReportVariant::UnitPrice {
            fields.push(self.unit_price.map(|p| p.to_string()).unwrap_or_default());
            fields.push(format!("{:.2}", self.total_price.unwrap_or(0.0)));
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportTotals {
    pub item_count: usize,
    /// Sum of total prices; only present in the unit-price variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub variant: ReportVariant,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

impl Report {
    pub fn header(&self) -> Vec<&'static str> {
        match self.variant {
            ReportVariant::Quantity => vec!["layer", "materials", "area(m²)"],
            ReportVariant::UnitPrice => {
                vec!["layer", "material", "area(m²)", "unitPrice", "totalPrice"]
            }
        }
    }

    pub fn row_fields(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| row.fields(self.variant))
    }

    pub fn totals_fields(&self) -> Vec<String> {
        let count = format!("{} items", self.totals.item_count);
        match self.totals.total_amount {
            Some(amount) => vec![
                "Total".to_string(),
                count,
                String::new(),
                String::new(),
                format!("{amount:.2}"),
            ],
            None => vec!["Total".to_string(), count],
        }
    }
}

/// Build a report from scanned records, in scan order.
///
/// The catalog snapshot supplies unit labels for the materials text; materials
/// missing from it are rendered by name only.
///
/// # Errors
/// Returns [`QuoteError::EmptyReport`] when `records` is empty.
pub fn aggregate(
    records: &[ScannedRecord],
    catalog: &MaterialCatalog,
    variant: ReportVariant,
) -> QuoteResult<Report> {
    if records.is_empty() {
        return Err(QuoteError::EmptyReport);
    }

    let rows: Vec<ReportRow> = records
        .iter()
        .map(|scanned| {
            let record = &scanned.record;
            let materials: Vec<MaterialRef> = record
                .materials
                .iter()
                .map(|name| {
                    let unit = catalog.get(name).and_then(|entry| entry.unit.clone());
                    MaterialRef::new(name.clone(), unit.unwrap_or_default())
                })
                .collect();

            let total_price = record
                .total_price
                .or_else(|| record.unit_price.map(|price| price * record.area));

            ReportRow {
                layer_name: scanned.display_name.clone(),
                materials_text: label::materials_text(&materials, &record.unit_values),
                area: record.area,
                unit_price: record.unit_price,
                total_price,
            }
        })
        .collect();

    let total_amount = match variant {
        ReportVariant::Quantity => None,
        ReportVariant::UnitPrice => {
            Some(rows.iter().map(|row| row.total_price.unwrap_or(0.0)).sum())
        }
    };

    Ok(Report {
        variant,
        totals: ReportTotals { item_count: rows.len(), total_amount },
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AnnotationRecord, RecordShape};
    use doc_model::{MaterialEntry, ObjectId};
    use std::collections::BTreeMap;

    fn scanned(id: u64, name: &str, record: AnnotationRecord) -> ScannedRecord {
        ScannedRecord {
            object_id: ObjectId(id),
            layer_name: "Layer 1".to_string(),
            display_name: name.to_string(),
            record,
            shape: RecordShape::Current,
        }
    }

    fn catalog() -> MaterialCatalog {
        let mut catalog = MaterialCatalog::default();
        catalog.insert(
            "PVC",
            MaterialEntry { color: "#3366FF".to_string(), unit: Some("m".to_string()), unit_price: None },
        );
        catalog
    }

    #[test]
    fn test_quantity_report() {
        let record = AnnotationRecord::new(
            vec!["PVC".to_string(), "Steel".to_string()],
            BTreeMap::from([("PVC".to_string(), "5".to_string())]),
            0.72,
        );
        let report =
            aggregate(&[scanned(1, "panel", record)], &catalog(), ReportVariant::Quantity).unwrap();

        assert_eq!(report.rows[0].materials_text, "5 m PVC + Steel");
        assert_eq!(report.row_fields().next().unwrap(), vec!["panel", "5 m PVC + Steel", "0.720"]);
        assert_eq!(report.totals, ReportTotals { item_count: 1, total_amount: None });
        assert_eq!(report.totals_fields(), vec!["Total", "1 items"]);
    }

    #[test]
    fn test_unit_price_report_sums_totals() {
        let priced = AnnotationRecord::new(vec!["Oak".to_string()], BTreeMap::new(), 0.5)
            .with_unit_price(120.0);
        let mut legacy = AnnotationRecord::new(vec!["Pine".to_string()], BTreeMap::new(), 2.0);
        legacy.unit_price = Some(10.0);

        let report = aggregate(
            &[scanned(1, "a", priced), scanned(2, "b", legacy)],
            &MaterialCatalog::default(),
            ReportVariant::UnitPrice,
        )
        .unwrap();

        assert_eq!(report.row_fields().next().unwrap(), vec!["a", "Oak", "0.500", "120", "60.00"]);
        assert_eq!(report.rows[1].total_price, Some(20.0));
        assert_eq!(report.totals.total_amount, Some(80.0));
        assert_eq!(report.totals_fields(), vec!["Total", "2 items", "", "", "80.00"]);
    }

    #[test]
    fn test_empty_report() {
        let result = aggregate(&[], &catalog(), ReportVariant::Quantity);
        assert!(matches!(result, Err(QuoteError::EmptyReport)));
    }
}
