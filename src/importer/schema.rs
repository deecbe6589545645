// ==========================================
// 学籍管理系统 - 导入模式注册表
// ==========================================
// 职责: 期望表头/字段/类型/必填的唯一来源
// 约束: 表头严格按顺序匹配（防止整列错位导致的静默数据污染）
// ==========================================

use crate::domain::import::{ColumnSpec, ImportSchema};
use crate::domain::types::FieldKind;
use crate::importer::error::{ImportError, ImportResult};

// 字段名常量（报告中使用）
pub mod fields {
    pub const SERIAL_NUMBER: &str = "serialNumber";
    pub const REGISTRATION_NUMBER: &str = "registrationNumber";
    pub const ADMISSION_NUMBER: &str = "admissionNumber";
    pub const NAME: &str = "name";
    pub const GENDER: &str = "gender";
    pub const DATE_OF_BIRTH: &str = "dateOfBirth";
    pub const DATE_OF_JOIN: &str = "dateOfJoin";
    pub const GUARDIAN: &str = "guardian";
    pub const GUARDIAN_RELATION: &str = "guardianRelation";
    pub const ADDRESS: &str = "address";
    pub const DEPARTMENT_REF: &str = "departmentRef";
    pub const RELIGION: &str = "religion";
    pub const COMMUNITY: &str = "community";
    pub const CATEGORY: &str = "category";
    pub const CE: &str = "ce";
    pub const FEE_CONCESSION: &str = "feeConcession";
    pub const MOBILE: &str = "mobile";
}

const fn column(
    header: &'static str,
    field_name: &'static str,
    required: bool,
    kind: FieldKind,
) -> ColumnSpec {
    ColumnSpec {
        header,
        field_name,
        required,
        kind,
    }
}

/// 学生导入模式（顺序即文件列顺序）
pub fn student_schema() -> ImportSchema {
    use fields::*;
    use FieldKind::*;

    ImportSchema {
        name: "Student",
        columns: vec![
            column("SL NO.", SERIAL_NUMBER, false, Text),
            column("APPN NO", REGISTRATION_NUMBER, false, Text),
            column("Adm No.", ADMISSION_NUMBER, true, Text),
            column("Name", NAME, true, Text),
            column("Gender", GENDER, false, Text),
            column("Date of Birth", DATE_OF_BIRTH, true, Date),
            column("Date ofJoin", DATE_OF_JOIN, false, Date),
            column("guardian", GUARDIAN, false, Text),
            column("Relashionship with guardian", GUARDIAN_RELATION, false, Text),
            column("address", ADDRESS, false, Text),
            column("Branch of Study", DEPARTMENT_REF, false, EnumRef),
            column("Religion", RELIGION, false, Text),
            column("Caste", COMMUNITY, false, Text),
            column("Category", CATEGORY, false, Text),
            column("CE", CE, false, Text),
            column("Whether in receipt of fee concession", FEE_CONCESSION, false, Boolean),
            column("Mobile", MOBILE, false, Text),
        ],
    }
}

/// 期望列定义（有序）
pub fn expected_columns() -> Vec<ColumnSpec> {
    student_schema().columns
}

/// 规范化文件表头: TRIM、去除 UTF-8 BOM、去除尾部空白列
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers: Vec<String> = raw
        .into_iter()
        .map(|h| h.as_ref().trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }

    headers
}

/// 校验表头与模式完全一致（顺序敏感）
///
/// # 返回
/// - Ok(()): 完全一致
/// - Err(EmptyFile): 无表头
/// - Err(HeaderMismatch): 缺列/多列/顺序不同
pub fn validate_headers(schema: &ImportSchema, found: &[String]) -> ImportResult<()> {
    if found.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let expected = schema.headers();
    let matches = expected.len() == found.len()
        && expected.iter().zip(found.iter()).all(|(e, f)| *e == f.as_str());

    if matches {
        Ok(())
    } else {
        Err(ImportError::HeaderMismatch {
            expected: expected.iter().map(|h| h.to_string()).collect(),
            found: found.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn expected_header_strings() -> Vec<String> {
        student_schema()
            .headers()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_field_names_are_unique() {
        let schema = student_schema();
        let fields: HashSet<_> = schema.columns.iter().map(|c| c.field_name).collect();
        let headers: HashSet<_> = schema.columns.iter().map(|c| c.header).collect();

        assert_eq!(fields.len(), schema.columns.len());
        assert_eq!(headers.len(), schema.columns.len());
    }

    #[test]
    fn test_required_fields() {
        let required: Vec<_> = expected_columns()
            .into_iter()
            .filter(|c| c.required)
            .map(|c| c.field_name)
            .collect();

        assert_eq!(
            required,
            vec![fields::ADMISSION_NUMBER, fields::NAME, fields::DATE_OF_BIRTH]
        );
    }

    #[test]
    fn test_exact_headers_pass() {
        let schema = student_schema();
        assert!(validate_headers(&schema, &expected_header_strings()).is_ok());
    }

    #[test]
    fn test_reordered_headers_fail() {
        let schema = student_schema();
        let mut headers = expected_header_strings();
        headers.swap(3, 4);

        let err = validate_headers(&schema, &headers).unwrap_err();
        assert!(matches!(err, ImportError::HeaderMismatch { .. }));
    }

    #[test]
    fn test_missing_header_fails() {
        let schema = student_schema();
        let mut headers = expected_header_strings();
        headers.remove(6);

        assert!(matches!(
            validate_headers(&schema, &headers),
            Err(ImportError::HeaderMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_header_is_empty_file() {
        let schema = student_schema();
        assert!(matches!(
            validate_headers(&schema, &[]),
            Err(ImportError::EmptyFile)
        ));
    }

    #[test]
    fn test_normalize_headers_strips_bom_and_trailing_blanks() {
        let raw = vec!["\u{feff}SL NO.", " APPN NO ", "", "  "];
        assert_eq!(normalize_headers(raw), vec!["SL NO.", "APPN NO"]);
    }
}
