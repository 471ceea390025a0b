//! 学生导入服务

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::{error, info};

use super::StudentService;
use super::create::{check_class_vacancy, next_enrollment_number, normalize_create};
use crate::config::AppConfig;
use crate::models::students::entities::StudentStatus;
use crate::models::students::requests::CreateStudentRequest;
use crate::models::students::responses::{ImportRowError, StudentImportResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, invalidate_dashboard};

const REQUIRED_COLUMN: &str = "name";

/// 导入解析错误
#[derive(Debug)]
enum ImportParseError {
    MissingColumn(String),
    ParseFailed(String),
}

impl ImportParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn(_) => ErrorCode::ImportFileMissingColumn,
            Self::ParseFailed(_) => ErrorCode::ImportFileParseFailed,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingColumn(col) => format!("Missing required column: {col}"),
            Self::ParseFailed(msg) => msg.clone(),
        }
    }
}

/// 导入行原始数据，空单元格为 None
#[derive(Debug, Clone, Default)]
struct ImportRow {
    row_num: usize,
    enrollment_number: Option<String>,
    name: String,
    birth_date: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
    address: Option<String>,
    class_id: Option<String>,
    status: Option<String>,
}

impl ImportRow {
    fn row_error(&self, field: Option<&str>, message: impl Into<String>) -> ImportRowError {
        ImportRowError {
            row: self.row_num,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    /// 转为新建请求，数值和枚举列在此解析
    fn into_request(self) -> Result<CreateStudentRequest, ImportRowError> {
        let class_id = match self.class_id.as_deref() {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                self.row_error(Some("class_id"), format!("Invalid class id: '{raw}'"))
            })?),
            None => None,
        };
        let status = match self.status.as_deref() {
            Some(raw) => Some(
                raw.to_lowercase()
                    .parse::<StudentStatus>()
                    .map_err(|msg| self.row_error(Some("status"), msg))?,
            ),
            None => None,
        };
        let row_num = self.row_num;

        normalize_create(CreateStudentRequest {
            enrollment_number: self.enrollment_number,
            name: self.name,
            birth_date: self.birth_date,
            email: self.email,
            phone: self.phone,
            guardian_name: self.guardian_name,
            guardian_phone: self.guardian_phone,
            address: self.address,
            class_id,
            status,
        })
        .map_err(|e| ImportRowError {
            row: row_num,
            field: Some(e.field.to_string()),
            message: e.message,
        })
    }
}

/// 导入学生
///
/// 逐行校验并创建，学号重复的行跳过，其余失败行记录原因。
pub async fn import_students(
    service: &StudentService,
    mut payload: Multipart,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let limits = &AppConfig::get().server.limits;

    let file_bytes = match read_file_from_multipart(&mut payload, limits.max_payload_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(bad_request(
                ErrorCode::FileUploadFailed,
                format!("File upload failed: {e}"),
            ));
        }
    };

    let rows = match parse_csv(&file_bytes) {
        Ok(rows) => rows,
        Err(e) => return Ok(bad_request(e.error_code(), e.message())),
    };

    if rows.is_empty() {
        return Ok(bad_request(
            ErrorCode::ImportFileDataInvalid,
            "The file contains no data rows",
        ));
    }
    if rows.len() > limits.max_import_rows {
        return Ok(bad_request(
            ErrorCode::ImportTooManyRows,
            format!(
                "At most {} rows can be imported at once",
                limits.max_import_rows
            ),
        ));
    }

    let storage = service.get_storage(request);
    let mut report = StudentImportResponse {
        total: rows.len(),
        ..Default::default()
    };
    let mut seen_numbers: HashSet<String> = HashSet::new();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.failed += 1;
                report.errors.push(e);
                continue;
            }
        };
        let row_num = row.row_num;
        let mut student = match row.into_request() {
            Ok(student) => student,
            Err(e) => {
                report.failed += 1;
                report.errors.push(e);
                continue;
            }
        };

        // 学号在文件内或库中已存在时跳过
        match student.enrollment_number.clone() {
            Some(number) => {
                let duplicated = if seen_numbers.insert(number.clone()) {
                    let lookup = storage.get_student_by_enrollment_number(&number).await;
                    match number_taken(row_num, lookup) {
                        Ok(taken) => taken,
                        Err(e) => {
                            error!("Import row {} lookup failed: {}", row_num, e.message);
                            report.failed += 1;
                            report.errors.push(e);
                            continue;
                        }
                    }
                } else {
                    true
                };
                if duplicated {
                    report.skipped += 1;
                    report.errors.push(ImportRowError {
                        row: row_num,
                        field: Some("enrollment_number".to_string()),
                        message: format!("Enrollment number {number} already exists"),
                    });
                    continue;
                }
            }
            None => match next_enrollment_number(&storage).await {
                Ok(number) => {
                    seen_numbers.insert(number.clone());
                    student.enrollment_number = Some(number);
                }
                Err(e) => {
                    report.failed += 1;
                    report.errors.push(ImportRowError {
                        row: row_num,
                        field: Some("enrollment_number".to_string()),
                        message: e.to_string(),
                    });
                    continue;
                }
            },
        }

        let counts_toward_capacity =
            student.status.unwrap_or(StudentStatus::Active) == StudentStatus::Active;
        if let Some(class_id) = student.class_id
            && let Err(e) = check_class_vacancy(&storage, class_id, !counts_toward_capacity).await
        {
            report.failed += 1;
            report.errors.push(ImportRowError {
                row: row_num,
                field: Some("class_id".to_string()),
                message: e.message(),
            });
            continue;
        }

        match storage.create_student(student).await {
            Ok(_) => report.success += 1,
            Err(e) => {
                error!("Import row {} failed: {}", row_num, e);
                report.failed += 1;
                report.errors.push(ImportRowError {
                    row: row_num,
                    field: None,
                    message: format!("Creation failed: {e}"),
                });
            }
        }
    }

    info!(
        "Student import finished: {} total, {} created, {} skipped, {} failed",
        report.total, report.success, report.skipped, report.failed
    );
    if report.success > 0 {
        invalidate_dashboard(request).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Import completed")))
}

/// 学号是否已在库中，查询失败时该行记为失败
fn number_taken<T>(
    row_num: usize,
    lookup: crate::errors::Result<Option<T>>,
) -> Result<bool, ImportRowError> {
    lookup
        .map(|existing| existing.is_some())
        .map_err(|e| ImportRowError {
            row: row_num,
            field: Some("enrollment_number".to_string()),
            message: format!("Failed to check enrollment number: {}", e.message()),
        })
}

async fn read_file_from_multipart(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<Vec<u8>, String> {
    let mut file_bytes = Vec::new();
    let mut found = false;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("failed to read field: {e}"))?;

        if field.name() != Some("file") {
            continue;
        }
        found = true;
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| format!("failed to read data: {e}"))?;
            if file_bytes.len() + data.len() > max_size {
                return Err(format!("file exceeds {max_size} bytes"));
            }
            file_bytes.extend_from_slice(&data);
        }
    }

    if !found {
        return Err("missing 'file' field".to_string());
    }
    if file_bytes.is_empty() {
        return Err("file is empty".to_string());
    }
    Ok(file_bytes)
}

/// 解析 CSV
///
/// 表头缺失或格式损坏时整个文件失败；单元格不是合法 UTF-8 时只有该行失败。
fn parse_csv(data: &[u8]) -> Result<Vec<Result<ImportRow, ImportRowError>>, ImportParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(data));

    let headers = rdr
        .headers()
        .map_err(|e| ImportParseError::ParseFailed(format!("Failed to read header: {e}")))?;
    // Excel 导出的 CSV 可能带 BOM
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim_start_matches('\u{feff}').to_lowercase(), i))
        .collect();

    if !header_map.contains_key(REQUIRED_COLUMN) {
        return Err(ImportParseError::MissingColumn(REQUIRED_COLUMN.to_string()));
    }

    let mut rows = Vec::new();
    for (index, result) in rdr.byte_records().enumerate() {
        // 1-based，跳过表头
        let row_num = index + 2;
        let record = result.map_err(|e| {
            ImportParseError::ParseFailed(format!("Failed to parse row {row_num}: {e}"))
        })?;

        rows.push(decode_row(row_num, &header_map, &record));
    }

    Ok(rows)
}

fn decode_row(
    row_num: usize,
    header_map: &HashMap<String, usize>,
    record: &csv::ByteRecord,
) -> Result<ImportRow, ImportRowError> {
    let cell = |column: &str| -> Result<Option<String>, ImportRowError> {
        let Some(raw) = header_map.get(column).and_then(|i| record.get(*i)) else {
            return Ok(None);
        };
        let value = std::str::from_utf8(raw).map_err(|_| ImportRowError {
            row: row_num,
            field: Some(column.to_string()),
            message: "Cell is not valid UTF-8 text".to_string(),
        })?;
        Ok(Some(value.to_string()).filter(|v| !v.is_empty()))
    };

    Ok(ImportRow {
        row_num,
        enrollment_number: cell("enrollment_number")?,
        name: cell("name")?.unwrap_or_default(),
        birth_date: cell("birth_date")?,
        email: cell("email")?,
        phone: cell("phone")?,
        guardian_name: cell("guardian_name")?,
        guardian_phone: cell("guardian_phone")?,
        address: cell("address")?,
        class_id: cell("class_id")?,
        status: cell("status")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_maps_columns_by_header() {
        let data = "\u{feff}Name,class_id,guardian_name,unused\nAna Souza, 3 ,Maria,x\nBruno,,,\n";
        let rows: Vec<ImportRow> = parse_csv(data.as_bytes())
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_num, 2);
        assert_eq!(rows[0].name, "Ana Souza");
        assert_eq!(rows[0].class_id.as_deref(), Some("3"));
        assert_eq!(rows[0].guardian_name.as_deref(), Some("Maria"));
        assert_eq!(rows[1].row_num, 3);
        assert!(rows[1].class_id.is_none());
        assert!(rows[1].enrollment_number.is_none());
    }

    #[test]
    fn test_parse_csv_requires_name_column() {
        let err = parse_csv(b"enrollment_number,email\n20260001,a@b.com\n").unwrap_err();
        assert!(matches!(err, ImportParseError::MissingColumn(ref c) if c == "name"));
        assert_eq!(err.error_code(), ErrorCode::ImportFileMissingColumn);
    }

    #[test]
    fn test_parse_csv_invalid_utf8_fails_only_that_row() {
        let mut data = b"name,email\nAna,ana@escola.com\n".to_vec();
        data.extend_from_slice(b"Bruno \xff\xfe,bruno@escola.com\n");
        data.extend_from_slice(b"Carla,carla@escola.com\n");

        let rows = parse_csv(&data).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().name, "Ana");
        let err = rows[1].as_ref().unwrap_err();
        assert_eq!(err.row, 3);
        assert_eq!(err.field.as_deref(), Some("name"));
        assert_eq!(rows[2].as_ref().unwrap().name, "Carla");
    }

    #[test]
    fn test_parse_csv_header_only_yields_no_rows() {
        assert!(parse_csv(b"name,email\n").unwrap().is_empty());
    }

    #[test]
    fn test_row_conversion_reports_field() {
        let row = ImportRow {
            row_num: 5,
            name: "Carla".to_string(),
            class_id: Some("abc".to_string()),
            ..Default::default()
        };
        let err = row.into_request().unwrap_err();
        assert_eq!(err.row, 5);
        assert_eq!(err.field.as_deref(), Some("class_id"));

        let row = ImportRow {
            row_num: 6,
            name: "Carla".to_string(),
            status: Some("expelled".to_string()),
            ..Default::default()
        };
        assert_eq!(row.into_request().unwrap_err().field.as_deref(), Some("status"));

        let row = ImportRow {
            row_num: 7,
            name: String::new(),
            ..Default::default()
        };
        assert_eq!(row.into_request().unwrap_err().field.as_deref(), Some("name"));
    }

    #[test]
    fn test_number_lookup_failure_fails_row() {
        assert!(!number_taken::<()>(2, Ok(None)).unwrap());
        assert!(number_taken(2, Ok(Some(()))).unwrap());

        let err = number_taken::<()>(
            4,
            Err(crate::errors::SchoolError::database_operation("connection reset")),
        )
        .unwrap_err();
        assert_eq!(err.row, 4);
        assert_eq!(err.field.as_deref(), Some("enrollment_number"));
        assert!(err.message.contains("connection reset"));
    }

    #[test]
    fn test_row_conversion_accepts_valid_row() {
        let row = ImportRow {
            row_num: 2,
            name: "Diego".to_string(),
            class_id: Some("12".to_string()),
            status: Some("Active".to_string()),
            email: Some("Diego@Example.com".to_string()),
            ..Default::default()
        };
        let req = row.into_request().unwrap();
        assert_eq!(req.class_id, Some(12));
        assert_eq!(req.status, Some(StudentStatus::Active));
        assert_eq!(req.email.as_deref(), Some("diego@example.com"));
    }
}
