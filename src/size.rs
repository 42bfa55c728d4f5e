//! Human-readable byte formatting.

/// Format a byte count as `"1.5KB"`, `"2.0MB"`, and so on.
///
/// Units step at 1024 with one decimal place and no space before the
/// unit. Values of a TiB or more stay in TB.
pub fn format_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1}TB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_below_one_kib_stay_in_bytes() {
        assert_eq!(format_size(0), "0.0B");
        assert_eq!(format_size(512), "512.0B");
        assert_eq!(format_size(1023), "1023.0B");
    }

    #[test]
    fn units_step_at_1024() {
        assert_eq!(format_size(1024), "1.0KB");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(1024 * 1024), "1.0MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0GB");
    }

    #[test]
    fn terabytes_are_the_ceiling() {
        assert_eq!(format_size(1024_u64.pow(4)), "1.0TB");
        assert_eq!(format_size(2048 * 1024_u64.pow(3)), "2.0TB");
    }
}
