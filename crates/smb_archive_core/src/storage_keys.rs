use chrono::{DateTime, Utc};

pub const ARCHIVE_PREFIX: &str = "archives";

/// Date partition used for every key written by one invocation (`YYYYMMDD`).
pub fn run_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

pub fn archive_prefix(run_date: &str) -> String {
    format!("{ARCHIVE_PREFIX}/{run_date}")
}

pub fn archive_object_key(run_date: &str, file_name: &str) -> String {
    format!("{}/{file_name}", archive_prefix(run_date))
}

/// Share-relative path of an entry listed at `root_path`.
pub fn remote_file_path(root_path: &str, file_name: &str) -> String {
    let trimmed = root_path.trim_end_matches('/');
    format!("{trimmed}/{file_name}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn run_date_is_compact_utc_day() {
        let now = Utc.with_ymd_and_hms(2026, 2, 14, 23, 59, 59).unwrap();
        assert_eq!(run_date(now), "20260214");
    }

    #[test]
    fn builds_archive_key_with_date_partition() {
        let key = archive_object_key("20260214", "test1.txt");
        assert_eq!(key, "archives/20260214/test1.txt");
    }

    #[test]
    fn remote_path_at_share_root() {
        assert_eq!(remote_file_path("/", "test1.txt"), "/test1.txt");
    }

    #[test]
    fn remote_path_under_nested_root() {
        assert_eq!(remote_file_path("/inbox/", "a.csv"), "/inbox/a.csv");
        assert_eq!(remote_file_path("/inbox", "a.csv"), "/inbox/a.csv");
    }
}
