//! Unit conversion from host document units (points) to real-world units.
//!
//! Values are never rounded here; rounding is applied when labels and
//! reports are composed.

/// Millimeters per host unit (one typographic point).
pub const MM_PER_UNIT: f64 = 0.352778;

const MM2_PER_M2: f64 = 1_000_000.0;

/// Convert a length in document units to millimeters.
pub fn units_to_mm(units: f64) -> f64 {
    units * MM_PER_UNIT
}

/// Convert a length in millimeters to document units.
pub fn mm_to_units(mm: f64) -> f64 {
    mm / MM_PER_UNIT
}

/// Area in square meters of a `width x height` rectangle given in document units.
pub fn to_square_meters(width_units: f64, height_units: f64) -> f64 {
    units_to_mm(width_units) * units_to_mm(height_units) / MM2_PER_M2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_to_mm() {
        assert!((units_to_mm(72.0) - 25.400016).abs() < 1e-9);
        assert_eq!(units_to_mm(0.0), 0.0);
    }

    #[test]
    fn test_mm_round_trip() {
        let units = mm_to_units(66.0);
        assert!((units_to_mm(units) - 66.0).abs() < 1e-9);
        assert!((units - 187.086).abs() < 1e-3);
    }

    #[test]
    fn test_square_meters() {
        // 1000 mm x 1000 mm
        let side = mm_to_units(1000.0);
        assert!((to_square_meters(side, side) - 1.0).abs() < 1e-9);

        let area = to_square_meters(100.0, 200.0);
        assert!((area - 35.2778 * 70.5556 / 1_000_000.0).abs() < 1e-12);
    }
}
