//! 学生导出服务

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::StudentService;
use crate::models::ErrorCode;
use crate::models::students::entities::Student;
use crate::models::students::requests::StudentFilter;
use crate::services::storage_error_response;

const EXPORT_HEADERS: [&str; 13] = [
    "id",
    "enrollment_number",
    "name",
    "birth_date",
    "email",
    "phone",
    "guardian_name",
    "guardian_phone",
    "address",
    "class_id",
    "class_name",
    "status",
    "created_at",
];

/// 按列表过滤条件导出 CSV
pub async fn export_students(
    service: &StudentService,
    filter: StudentFilter,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let students = match storage.list_students(filter).await {
        Ok(students) => students,
        Err(e) => {
            return Ok(storage_error_response(
                &e,
                ErrorCode::ExportFailed,
                "Failed to export students",
            ));
        }
    };

    let data = write_csv(&students).map_err(|e| {
        error!("Student CSV generation failed: {}", e);
        actix_web::error::ErrorInternalServerError(format!("CSV generation failed: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", "attachment; filename=\"alunos.csv\""))
        .body(data))
}

pub(super) fn write_csv(students: &[Student]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(EXPORT_HEADERS)?;

    for student in students {
        wtr.write_record([
            student.id.to_string(),
            student.enrollment_number.clone(),
            student.name.clone(),
            student.birth_date.clone().unwrap_or_default(),
            student.email.clone().unwrap_or_default(),
            student.phone.clone().unwrap_or_default(),
            student.guardian_name.clone().unwrap_or_default(),
            student.guardian_phone.clone().unwrap_or_default(),
            student.address.clone().unwrap_or_default(),
            student.class_id.map(|id| id.to_string()).unwrap_or_default(),
            student.class_name.clone().unwrap_or_default(),
            student.status.to_string(),
            student.created_at.to_rfc3339(),
        ])?;
    }

    wtr.into_inner().map_err(|e| e.into_error().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::students::entities::StudentStatus;

    fn student(id: i64, name: &str) -> Student {
        Student {
            id,
            enrollment_number: format!("2026{id:06}"),
            name: name.to_string(),
            birth_date: Some("2015-03-09".to_string()),
            email: None,
            phone: None,
            guardian_name: Some("Maria, mãe".to_string()),
            guardian_phone: None,
            address: None,
            class_id: Some(3),
            class_name: Some("5º Ano A".to_string()),
            status: StudentStatus::Active,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let data = write_csv(&[student(1, "Ana"), student(2, "Bruno")]).unwrap();
        let text = String::from_utf8(data).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], EXPORT_HEADERS.join(","));
        assert!(lines[1].starts_with("1,2026000001,Ana,2015-03-09,"));
        // 含逗号的字段被引号包裹
        assert!(lines[1].contains("\"Maria, mãe\""));
    }

    #[test]
    fn test_csv_round_trips_through_reader() {
        let data = write_csv(&[student(7, "Carla")]).unwrap();
        let mut rdr = csv::Reader::from_reader(data.as_slice());
        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(&record[2], "Carla");
        assert_eq!(&record[9], "3");
        assert_eq!(&record[11], "active");
    }
}
