// ==========================================
// 学籍管理系统 - 行规范化器
// ==========================================
// 阶段 2: RawRow → RowOutcome（Accepted | Rejected）
// 规则: 按模式顺序逐字段校验，首个失败字段即终止该行
// ==========================================

use crate::domain::import::{AcceptedRow, ImportSchema, RawRow, RowOutcome, RowRejection};
use crate::domain::student::NormalizedRecord;
use crate::domain::types::{FieldKind, ReasonCode};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::schema::{fields, student_schema};
use crate::importer::student_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// 字段值（校验通过后的中间形态）
#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Date(Option<NaiveDate>),
    Flag(bool),
}

pub struct RowNormalizer {
    schema: ImportSchema,
    cleaner: Box<dyn DataCleanerTrait>,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new(student_schema())
    }
}

impl RowNormalizer {
    pub fn new(schema: ImportSchema) -> Self {
        Self {
            schema,
            cleaner: Box::new(DataCleaner),
        }
    }

    pub fn schema(&self) -> &ImportSchema {
        &self.schema
    }

    /// 规范化单行
    ///
    /// # 返回
    /// - Accepted: department_ref 尚未解析（None），warnings 为空
    /// - Rejected: MissingField / InvalidDate
    pub fn normalize(&self, row: &RawRow) -> RowOutcome {
        match self.normalize_record(row) {
            Ok(record) => RowOutcome::Accepted(AcceptedRow {
                row_number: row.row_number,
                record,
                warnings: Vec::new(),
            }),
            Err(rejection) => RowOutcome::Rejected(rejection),
        }
    }

    fn normalize_record(&self, row: &RawRow) -> Result<NormalizedRecord, RowRejection> {
        let mut values: HashMap<&'static str, FieldValue> = HashMap::new();

        for column in &self.schema.columns {
            let raw = row.get(column.header).unwrap_or("");
            let cleaned = self.cleaner.clean_text(raw);

            if column.required && cleaned.is_empty() {
                return Err(RowRejection {
                    row_number: row.row_number,
                    reason: ReasonCode::MissingField,
                    field: Some(column.field_name.to_string()),
                    value: Some(raw.to_string()),
                    detail: format!("必填字段为空: {}", column.header),
                });
            }

            let value = match column.kind {
                FieldKind::Text | FieldKind::EnumRef => FieldValue::Text(cleaned),
                FieldKind::Boolean => FieldValue::Flag(self.cleaner.parse_yes_flag(Some(raw))),
                FieldKind::Date if cleaned.is_empty() => FieldValue::Date(None),
                FieldKind::Date => match self.cleaner.parse_date_dmy(&cleaned) {
                    Ok(date) => FieldValue::Date(Some(date)),
                    Err(e) => {
                        return Err(RowRejection {
                            row_number: row.row_number,
                            reason: ReasonCode::InvalidDate,
                            field: Some(column.field_name.to_string()),
                            value: Some(raw.to_string()),
                            detail: format!(
                                "日期格式错误（应为 DD-MM-YYYY）: {}={} ({})",
                                column.header, raw, e
                            ),
                        });
                    }
                },
            };

            values.insert(column.field_name, value);
        }

        self.assemble(row.row_number, values)
    }

    fn assemble(
        &self,
        row_number: usize,
        mut values: HashMap<&'static str, FieldValue>,
    ) -> Result<NormalizedRecord, RowRejection> {
        let mut text = |field: &str| match values.remove(field) {
            Some(FieldValue::Text(v)) => v,
            _ => String::new(),
        };

        let admission_number = text(fields::ADMISSION_NUMBER);
        let registration_number = text(fields::REGISTRATION_NUMBER);
        let name = text(fields::NAME);
        let gender = text(fields::GENDER);
        let guardian = text(fields::GUARDIAN);
        let guardian_relation = text(fields::GUARDIAN_RELATION);
        let address = text(fields::ADDRESS);
        let department_text = text(fields::DEPARTMENT_REF);
        let religion = text(fields::RELIGION);
        let community = text(fields::COMMUNITY);
        let category = text(fields::CATEGORY);
        let mobile = text(fields::MOBILE);

        let date_of_birth = match values.remove(fields::DATE_OF_BIRTH) {
            Some(FieldValue::Date(Some(date))) => date,
            _ => {
                return Err(RowRejection {
                    row_number,
                    reason: ReasonCode::MissingField,
                    field: Some(fields::DATE_OF_BIRTH.to_string()),
                    value: None,
                    detail: "必填字段为空: Date of Birth".to_string(),
                });
            }
        };
        let date_of_join = match values.remove(fields::DATE_OF_JOIN) {
            Some(FieldValue::Date(date)) => date,
            _ => None,
        };
        let fee_concession = matches!(
            values.remove(fields::FEE_CONCESSION),
            Some(FieldValue::Flag(true))
        );

        Ok(NormalizedRecord {
            admission_number,
            registration_number,
            name,
            gender,
            date_of_birth,
            date_of_join,
            guardian,
            guardian_relation,
            address,
            department_ref: None,
            department_code: self.cleaner.clean_code(Some(&department_text)),
            religion,
            community,
            category,
            fee_concession,
            mobile,
            active: true,
            data_verified: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(outcome: RowOutcome) -> NormalizedRecord {
        match outcome {
            RowOutcome::Accepted(row) => {
                assert!(row.warnings.is_empty());
                row.record
            }
            RowOutcome::Rejected(r) => panic!("行被拒绝: {:?}", r),
        }
    }

    fn rejected(outcome: RowOutcome) -> RowRejection {
        match outcome {
            RowOutcome::Rejected(r) => r,
            RowOutcome::Accepted(row) => panic!("行被接收: {:?}", row.record),
        }
    }

    fn raw_row(overrides: &[(&str, &str)]) -> RawRow {
        let schema = student_schema();
        let defaults = [
            ("SL NO.", "1"),
            ("APPN NO", "APP-100"),
            ("Adm No.", "A001"),
            ("Name", "Anjali K"),
            ("Gender", "Female"),
            ("Date of Birth", "31-12-2005"),
            ("Date ofJoin", "01-06-2023"),
            ("guardian", "Krishnan"),
            ("Relashionship with guardian", "Father"),
            ("address", "Thrissur"),
            ("Branch of Study", "cse"),
            ("Religion", "Hindu"),
            ("Caste", "Nair"),
            ("Category", "General"),
            ("CE", "12"),
            ("Whether in receipt of fee concession", "No"),
            ("Mobile", "9876543210"),
        ];

        let cells = schema
            .headers()
            .into_iter()
            .map(|h| {
                let value = overrides
                    .iter()
                    .find(|(k, _)| *k == h)
                    .or_else(|| defaults.iter().find(|(k, _)| *k == h))
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default();
                (h.to_string(), value)
            })
            .collect();

        RawRow {
            row_number: 4,
            cells,
        }
    }

    #[test]
    fn test_normalize_valid_row() {
        let normalizer = RowNormalizer::default();
        let record = accepted(normalizer.normalize(&raw_row(&[("Name", "  Anjali K ")])));

        assert_eq!(record.admission_number, "A001");
        assert_eq!(record.name, "Anjali K");
        assert_eq!(record.registration_number, "APP-100");
        assert_eq!(
            record.date_of_birth,
            NaiveDate::from_ymd_opt(2005, 12, 31).unwrap()
        );
        assert_eq!(record.date_of_join, NaiveDate::from_ymd_opt(2023, 6, 1));
        assert_eq!(record.department_code.as_deref(), Some("CSE"));
        assert_eq!(record.department_ref, None);
        assert!(!record.fee_concession);
        assert!(record.active);
        assert!(!record.data_verified);
    }

    #[test]
    fn test_accepted_outcome_keeps_row_number() {
        let normalizer = RowNormalizer::default();
        match normalizer.normalize(&raw_row(&[])) {
            RowOutcome::Accepted(row) => assert_eq!(row.row_number, 4),
            RowOutcome::Rejected(r) => panic!("行被拒绝: {:?}", r),
        }
    }

    #[test]
    fn test_blank_name_is_missing_field() {
        let normalizer = RowNormalizer::default();
        let rejection = rejected(normalizer.normalize(&raw_row(&[("Name", "   ")])));

        assert_eq!(rejection.reason, ReasonCode::MissingField);
        assert_eq!(rejection.field.as_deref(), Some("name"));
        assert_eq!(rejection.row_number, 4);
    }

    #[test]
    fn test_invalid_birth_date() {
        let normalizer = RowNormalizer::default();
        let rejection = rejected(normalizer.normalize(&raw_row(&[("Date of Birth", "31-13-2005")])));

        assert_eq!(rejection.reason, ReasonCode::InvalidDate);
        assert_eq!(rejection.field.as_deref(), Some("dateOfBirth"));
        assert_eq!(rejection.value.as_deref(), Some("31-13-2005"));
    }

    #[test]
    fn test_optional_date_blank_and_invalid() {
        let normalizer = RowNormalizer::default();

        let record = accepted(normalizer.normalize(&raw_row(&[("Date ofJoin", " ")])));
        assert_eq!(record.date_of_join, None);

        let rejection = rejected(normalizer.normalize(&raw_row(&[("Date ofJoin", "2023-06-01")])));
        assert_eq!(rejection.reason, ReasonCode::InvalidDate);
        assert_eq!(rejection.field.as_deref(), Some("dateOfJoin"));
    }

    #[test]
    fn test_fail_fast_in_schema_order() {
        let normalizer = RowNormalizer::default();
        // Adm No. 在 Name 之前，只报告第一个失败字段
        let rejection = rejected(normalizer.normalize(&raw_row(&[
            ("Adm No.", ""),
            ("Name", ""),
            ("Date of Birth", "x"),
        ])));

        assert_eq!(rejection.field.as_deref(), Some("admissionNumber"));
    }

    #[test]
    fn test_fee_concession_flag() {
        let normalizer = RowNormalizer::default();
        for (value, expected) in [("Yes", true), ("  yEs ", true), ("No", false), ("", false), ("1", false)] {
            let record = accepted(
                normalizer.normalize(&raw_row(&[("Whether in receipt of fee concession", value)])),
            );
            assert_eq!(record.fee_concession, expected, "value={value:?}");
        }
    }

    #[test]
    fn test_blank_department_has_no_code() {
        let normalizer = RowNormalizer::default();
        let record = accepted(normalizer.normalize(&raw_row(&[("Branch of Study", "  ")])));
        assert_eq!(record.department_code, None);
    }
}
