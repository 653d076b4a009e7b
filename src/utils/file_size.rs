pub struct FileSizeUtils;

impl FileSizeUtils {
    const UNITS: [&'static str; 4] = ["B", "KB", "MB", "GB"];

    /// Human readable size using binary multiples, e.g. `10.00 MB`.
    pub fn format_size(bytes: u64) -> String {
        let mut size = bytes as f64;
        let mut unit = 0;

        while size >= 1024.0 && unit < Self::UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        match unit {
            0 => format!("{} {}", bytes, Self::UNITS[0]),
            _ => format!("{:.2} {}", size, Self::UNITS[unit]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileSizeUtils;

    #[test]
    fn formats_bytes_and_megabytes() {
        assert_eq!(FileSizeUtils::format_size(512), "512 B");
        assert_eq!(FileSizeUtils::format_size(1536), "1.50 KB");
        assert_eq!(FileSizeUtils::format_size(10 * 1024 * 1024), "10.00 MB");
    }
}
