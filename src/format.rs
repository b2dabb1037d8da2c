//! Number formatting shared by views and insight text.

/// Format a number with a K/M suffix and two decimals.
///
/// `1_234_567.0` becomes `1.23M`, `1_500.0` becomes `1.50K`, smaller values
/// are printed with two decimals.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.2}K", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0.0), "0.00");
        assert_eq!(format_compact(999.994), "999.99");
        assert_eq!(format_compact(1_500.0), "1.50K");
        assert_eq!(format_compact(1_234_567.0), "1.23M");
        assert_eq!(format_compact(-2_000.0), "-2000.00");
    }
}
