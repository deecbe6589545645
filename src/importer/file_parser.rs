// ==========================================
// 学籍管理系统 - 文件解析器实现
// ==========================================
// 阶段 1: 文件字节 → 表头 + 原始数据行
// 支持: CSV (.csv/.txt) / 电子表格 (.xlsx/.xlsm/.xls/.ods)
// 行号: 数据行在文件中的位置（从 1 开始，表头不计）；空白行跳过但占号
// 表头: 读取任何数据行之前即按模式校验
// ==========================================

use crate::domain::import::{ImportSchema, ParsedTable, RawRow};
use crate::domain::types::DeclaredFormat;
use crate::importer::data_cleaner::DATE_FORMAT_DMY;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema::{normalize_headers, validate_headers};
use crate::importer::student_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::io::Cursor;

/// 按表头组装一行（缺失单元格补空串，多余单元格忽略）
fn build_row<I>(row_number: usize, headers: &[String], values: I) -> RawRow
where
    I: IntoIterator<Item = String>,
{
    let mut values = values.into_iter();
    let cells = headers
        .iter()
        .map(|h| (h.clone(), values.next().unwrap_or_default()))
        .collect();

    RawRow { row_number, cells }
}

fn check_row_limit(row_number: usize, max_rows: usize) -> ImportResult<()> {
    if row_number > max_rows {
        return Err(ImportError::FileTooLarge { limit: max_rows });
    }
    Ok(())
}

/// 表头之后的空行替换为单个分隔符
///
/// csv 读取器会静默跳过空行，替换后空行作为空白记录读出并占用行号。
/// 引号内的换行不视为行结束；文件末尾的空行直接丢弃。
fn mark_empty_lines(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.windows(2).any(|w| w == b"\n\n" || w == b"\n\r") {
        return Cow::Borrowed(bytes);
    }

    let mut out = Vec::with_capacity(bytes.len());
    let mut line: Vec<u8> = Vec::new();
    let mut in_quotes = false;
    let mut seen_header = false;
    let mut pending_empty = 0usize;

    let mut flush = |line: &mut Vec<u8>, out: &mut Vec<u8>| {
        let content_len = line
            .iter()
            .rposition(|b| *b != b'\n' && *b != b'\r')
            .map_or(0, |i| i + 1);
        if content_len == 0 {
            if seen_header {
                pending_empty += 1;
            }
        } else {
            for _ in 0..pending_empty {
                out.extend_from_slice(b",\n");
            }
            pending_empty = 0;
            seen_header = true;
            out.extend_from_slice(line.as_slice());
        }
        line.clear();
    };

    for &b in bytes {
        if b == b'"' {
            in_quotes = !in_quotes;
        }
        line.push(b);
        if b == b'\n' && !in_quotes {
            flush(&mut line, &mut out);
        }
    }
    if !line.is_empty() {
        flush(&mut line, &mut out);
    }

    Cow::Owned(out)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_table(
        &self,
        bytes: &[u8],
        schema: &ImportSchema,
        max_rows: usize,
    ) -> ImportResult<ParsedTable> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ImportError::EmptyFile);
        }

        let marked = mark_empty_lines(bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(marked.as_ref());

        let headers = normalize_headers(reader.headers()?.iter());
        validate_headers(schema, &headers)?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = idx + 1;
            check_row_limit(row_number, max_rows)?;

            let row = build_row(row_number, &headers, record.iter().map(String::from));

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(ParsedTable { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 仅读取第一个工作表；日期单元格格式化为 DD-MM-YYYY
pub struct ExcelParser;

/// 单元格 → 文本
pub(crate) fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format(DATE_FORMAT_DMY).to_string())
            .unwrap_or_else(|| cell.to_string()),
        _ => cell.to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse_table(
        &self,
        bytes: &[u8],
        schema: &ImportSchema,
        max_rows: usize,
    ) -> ImportResult<ParsedTable> {
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 读取第一个 sheet
        let sheet_name = match workbook.sheet_names().first() {
            Some(name) => name.clone(),
            None => return Err(ImportError::EmptyFile),
        };
        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut sheet_rows = range.rows();
        let headers = match sheet_rows.next() {
            Some(header_row) => normalize_headers(header_row.iter().map(format_cell)),
            None => return Err(ImportError::EmptyFile),
        };
        validate_headers(schema, &headers)?;

        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let row_number = idx + 1;
            check_row_limit(row_number, max_rows)?;

            let row = build_row(row_number, &headers, data_row.iter().map(format_cell));
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(ParsedTable { headers, rows })
    }
}

// ==========================================
// 通用文件解析器（根据声明格式选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parser_for(format: DeclaredFormat) -> Box<dyn FileParser> {
        match format {
            DeclaredFormat::Csv => Box::new(CsvParser),
            DeclaredFormat::Spreadsheet => Box::new(ExcelParser),
        }
    }

    pub fn parse(
        &self,
        bytes: &[u8],
        format: DeclaredFormat,
        schema: &ImportSchema,
        max_rows: usize,
    ) -> ImportResult<ParsedTable> {
        Self::parser_for(format).parse_table(bytes, schema, max_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::ColumnSpec;
    use crate::domain::types::{FieldKind, ReasonCode};

    fn schema_of(headers: &[&'static str]) -> ImportSchema {
        ImportSchema {
            name: "Test",
            columns: headers
                .iter()
                .map(|&h| ColumnSpec {
                    header: h,
                    field_name: h,
                    required: false,
                    kind: FieldKind::Text,
                })
                .collect(),
        }
    }

    fn two_columns() -> ImportSchema {
        schema_of(&["Adm No.", "Name"])
    }

    fn row_numbers(table: &ParsedTable) -> Vec<usize> {
        table.rows.iter().map(|r| r.row_number).collect()
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let csv = "Adm No.,Name\nA001,Anjali\nA002,Rahul\n";
        let table = CsvParser.parse_table(csv.as_bytes(), &two_columns(), 100).unwrap();

        assert_eq!(table.headers, vec!["Adm No.", "Name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 1);
        assert_eq!(table.rows[1].get("Name"), Some("Rahul"));
    }

    #[test]
    fn test_csv_parser_skips_blank_rows_but_keeps_position() {
        let csv = "Adm No.,Name\nA001,Anjali\n,\nA003,Meera\n";
        let table = CsvParser.parse_table(csv.as_bytes(), &two_columns(), 100).unwrap();

        assert_eq!(row_numbers(&table), vec![1, 3]);
    }

    #[test]
    fn test_csv_parser_empty_lines_keep_position() {
        let schema = two_columns();

        let lf = "Adm No.,Name\nA001,Anjali\n\nA003,Meera\n";
        let table = CsvParser.parse_table(lf.as_bytes(), &schema, 100).unwrap();
        assert_eq!(row_numbers(&table), vec![1, 3]);

        let crlf = "Adm No.,Name\r\nA001,Anjali\r\n\r\n\r\nA004,Meera\r\n";
        let table = CsvParser.parse_table(crlf.as_bytes(), &schema, 100).unwrap();
        assert_eq!(row_numbers(&table), vec![1, 4]);
        assert_eq!(table.rows[1].get("Name"), Some("Meera"));
    }

    #[test]
    fn test_csv_parser_quoted_newlines_are_not_empty_lines() {
        let csv = "Adm No.,Name\nA001,\"Line one\n\nLine three\"\nA002,Rahul\n\n\n";
        let table = CsvParser.parse_table(csv.as_bytes(), &two_columns(), 100).unwrap();

        assert_eq!(row_numbers(&table), vec![1, 2]);
        assert_eq!(table.rows[0].get("Name"), Some("Line one\n\nLine three"));
    }

    #[test]
    fn test_csv_parser_short_row_padded() {
        let csv = "Adm No.,Name,Mobile\nA001,Anjali\n";
        let schema = schema_of(&["Adm No.", "Name", "Mobile"]);
        let table = CsvParser.parse_table(csv.as_bytes(), &schema, 100).unwrap();

        assert_eq!(table.rows[0].get("Mobile"), Some(""));
    }

    #[test]
    fn test_csv_parser_empty_file() {
        assert!(matches!(
            CsvParser.parse_table(b"", &two_columns(), 100),
            Err(ImportError::EmptyFile)
        ));
        assert!(matches!(
            CsvParser.parse_table(b"  \n", &two_columns(), 100),
            Err(ImportError::EmptyFile)
        ));
    }

    #[test]
    fn test_csv_parser_header_only() {
        let table = CsvParser
            .parse_table(b"Adm No.,Name\n", &two_columns(), 100)
            .unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_csv_parser_row_limit() {
        let csv = "Adm No.,Name\nA001,a\nA002,b\nA003,c\n";
        assert!(CsvParser.parse_table(csv.as_bytes(), &two_columns(), 3).is_ok());
        assert!(matches!(
            CsvParser.parse_table(csv.as_bytes(), &two_columns(), 2),
            Err(ImportError::FileTooLarge { limit: 2 })
        ));
    }

    #[test]
    fn test_csv_parser_invalid_utf8_is_malformed() {
        let bytes = b"Adm No.,Name\nA001,\xff\xfe\n";
        assert!(matches!(
            CsvParser.parse_table(bytes, &two_columns(), 100),
            Err(ImportError::MalformedFile(_))
        ));
    }

    #[test]
    fn test_csv_header_checked_before_rows() {
        // 表头错误时不读取任何数据行: 不触发行数上限，也不触发行解码错误
        let too_many = "Name,Adm No.\nx,A001\ny,A002\nz,A003\n";
        let err = CsvParser
            .parse_table(too_many.as_bytes(), &two_columns(), 1)
            .unwrap_err();
        assert_eq!(err.reason_code(), ReasonCode::HeaderMismatch);

        let undecodable = b"Name,Adm No.\n\xff\xfe,A001\n";
        let err = CsvParser
            .parse_table(undecodable, &two_columns(), 100)
            .unwrap_err();
        assert_eq!(err.reason_code(), ReasonCode::HeaderMismatch);
    }

    #[test]
    fn test_excel_parser_rejects_garbage() {
        let result = ExcelParser.parse_table(b"definitely not a workbook", &two_columns(), 100);
        assert!(matches!(result, Err(ImportError::MalformedFile(_))));
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Data::Empty), "");
        assert_eq!(format_cell(&Data::String("Anjali".into())), "Anjali");
        assert_eq!(format_cell(&Data::Float(9876543210.0)), "9876543210");
        assert_eq!(format_cell(&Data::Bool(true)), "true");

        let cell = Data::DateTimeIso("2006-01-01".into());
        assert_eq!(format_cell(&cell), "01-01-2006");
    }

    #[test]
    fn test_universal_parser_dispatch() {
        let parser = UniversalFileParser;
        let schema = two_columns();
        let table = parser
            .parse(b"Adm No.,Name\nA001,x\n", DeclaredFormat::Csv, &schema, 10)
            .unwrap();
        assert_eq!(table.rows.len(), 1);

        assert!(parser
            .parse(b"Adm No.,Name\n", DeclaredFormat::Spreadsheet, &schema, 10)
            .is_err());
    }
}
