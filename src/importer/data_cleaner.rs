// ==========================================
// 学籍管理系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期解析 / 是否标志
// ==========================================

use crate::importer::student_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;

/// 固定日期格式: 日-月-年（如 31-12-2005）
pub const DATE_FORMAT_DMY: &str = "%d-%m-%Y";

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn clean_code(&self, value: Option<&str>) -> Option<String> {
        self.normalize_null(value).map(|v| v.to_uppercase())
    }

    fn parse_date_dmy(&self, value: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT_DMY)
    }

    fn parse_yes_flag(&self, value: Option<&str>) -> bool {
        value
            .map(|v| v.trim().eq_ignore_ascii_case("yes"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  Anjali K  "), "Anjali K");
        assert_eq!(cleaner.clean_text("   "), "");
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  ")), None);
        assert_eq!(cleaner.normalize_null(Some("")), None);
        assert_eq!(cleaner.normalize_null(Some("  value  ")), Some("value".to_string()));
        assert_eq!(cleaner.normalize_null(None), None);
    }

    #[test]
    fn test_clean_code_uppercases() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_code(Some(" cse ")), Some("CSE".to_string()));
        assert_eq!(cleaner.clean_code(Some(" ")), None);
    }

    #[test]
    fn test_parse_date_dmy() {
        let cleaner = DataCleaner;
        assert_eq!(
            cleaner.parse_date_dmy("31-12-2005").unwrap(),
            NaiveDate::from_ymd_opt(2005, 12, 31).unwrap()
        );
        assert_eq!(
            cleaner.parse_date_dmy(" 01-06-2004 ").unwrap(),
            NaiveDate::from_ymd_opt(2004, 6, 1).unwrap()
        );

        // 月份越界 / 非固定格式 一律失败
        assert!(cleaner.parse_date_dmy("31-13-2005").is_err());
        assert!(cleaner.parse_date_dmy("30-02-2005").is_err());
        assert!(cleaner.parse_date_dmy("2005-12-31").is_err());
        assert!(cleaner.parse_date_dmy("31/12/2005").is_err());
    }

    #[test]
    fn test_parse_yes_flag() {
        let cleaner = DataCleaner;
        assert!(cleaner.parse_yes_flag(Some("Yes")));
        assert!(cleaner.parse_yes_flag(Some("  YES ")));
        assert!(cleaner.parse_yes_flag(Some("yes")));
        assert!(!cleaner.parse_yes_flag(Some("No")));
        assert!(!cleaner.parse_yes_flag(Some("Y")));
        assert!(!cleaner.parse_yes_flag(Some("")));
        assert!(!cleaner.parse_yes_flag(None));
    }
}
