use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Datelike;
use tracing::info;

use super::StudentService;
use crate::errors::SchoolError;
use crate::models::students::entities::StudentStatus;
use crate::models::students::requests::CreateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, conflict, invalidate_dashboard, storage_error_response};
use crate::storage::Storage;
use crate::utils::dates::{parse_date, today};
use crate::utils::random_code::generate_random_digits;
use crate::utils::validate::{
    normalize_optional, validate_email, validate_enrollment_number, validate_phone,
    validate_required_text,
};

pub(super) const NAME_MAX_CHARS: usize = 120;
const ADDRESS_MAX_CHARS: usize = 255;
const ENROLLMENT_ATTEMPTS: usize = 5;

/// 单个字段的校验错误，导入时按行汇报
#[derive(Debug)]
pub(super) struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub(super) fn into_response(self) -> HttpResponse {
        bad_request(ErrorCode::ValidationFailed, self.message)
    }
}

pub(super) fn check_name(name: &str) -> Result<(), FieldError> {
    validate_required_text("name", name, NAME_MAX_CHARS).map_err(|msg| FieldError::new("name", msg))
}

pub(super) fn check_enrollment_number(value: &str) -> Result<(), FieldError> {
    validate_enrollment_number(value).map_err(|msg| FieldError::new("enrollment_number", msg))
}

/// 可选字段，传入前已 trim
pub(super) fn check_optional_fields(
    birth_date: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    guardian_phone: Option<&str>,
    address: Option<&str>,
) -> Result<(), FieldError> {
    if let Some(birth_date) = birth_date {
        let date = parse_date(birth_date).map_err(|e| FieldError::new("birth_date", e.message()))?;
        if date > today() {
            return Err(FieldError::new("birth_date", "Birth date cannot be in the future"));
        }
    }
    if let Some(email) = email {
        validate_email(email).map_err(|msg| FieldError::new("email", msg))?;
    }
    if let Some(phone) = phone {
        validate_phone(phone).map_err(|msg| FieldError::new("phone", msg))?;
    }
    if let Some(guardian_phone) = guardian_phone {
        validate_phone(guardian_phone).map_err(|msg| FieldError::new("guardian_phone", msg))?;
    }
    if let Some(address) = address
        && address.chars().count() > ADDRESS_MAX_CHARS
    {
        return Err(FieldError::new(
            "address",
            format!("address must be at most {ADDRESS_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

/// 规范化并校验新建请求
pub(super) fn normalize_create(
    mut req: CreateStudentRequest,
) -> Result<CreateStudentRequest, FieldError> {
    check_name(&req.name)?;
    req.name = req.name.trim().to_string();
    req.enrollment_number = normalize_optional(req.enrollment_number);
    if let Some(ref number) = req.enrollment_number {
        check_enrollment_number(number)?;
    }
    req.birth_date = normalize_optional(req.birth_date);
    req.email = normalize_optional(req.email).map(|e| e.to_lowercase());
    req.phone = normalize_optional(req.phone);
    req.guardian_name = normalize_optional(req.guardian_name);
    req.guardian_phone = normalize_optional(req.guardian_phone);
    req.address = normalize_optional(req.address);
    check_optional_fields(
        req.birth_date.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
        req.guardian_phone.as_deref(),
        req.address.as_deref(),
    )?;
    Ok(req)
}

#[derive(Debug)]
pub(super) enum PlacementError {
    ClassNotFound(i64),
    ClassFull { name: String, capacity: i32 },
    Storage(SchoolError),
}

impl PlacementError {
    pub(super) fn message(&self) -> String {
        match self {
            Self::ClassNotFound(id) => format!("Class {id} does not exist"),
            Self::ClassFull { name, capacity } => {
                format!("Class {name} is full (capacity {capacity})")
            }
            Self::Storage(e) => format!("Failed to check class vacancy: {e}"),
        }
    }

    pub(super) fn into_response(self) -> HttpResponse {
        match self {
            Self::ClassNotFound(_) => bad_request(ErrorCode::ClassNotFound, self.message()),
            Self::ClassFull { .. } => conflict(ErrorCode::ClassFull, self.message()),
            Self::Storage(e) => storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to check class vacancy",
            ),
        }
    }
}

/// 检查班级是否还有空位
///
/// 在读学生数达到容量时拒绝；`already_enrolled` 表示该学生已计入此班。
pub(super) async fn check_class_vacancy(
    storage: &Arc<dyn Storage>,
    class_id: i64,
    already_enrolled: bool,
) -> Result<(), PlacementError> {
    let class = match storage.get_class_by_id(class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => return Err(PlacementError::ClassNotFound(class_id)),
        Err(e) => return Err(PlacementError::Storage(e)),
    };
    if already_enrolled {
        return Ok(());
    }

    let enrolled = storage
        .count_active_students_in_class(class_id)
        .await
        .map_err(PlacementError::Storage)?;
    if enrolled >= class.capacity as i64 {
        return Err(PlacementError::ClassFull {
            name: class.name,
            capacity: class.capacity,
        });
    }
    Ok(())
}

/// 生成学号：当前年份 + 6 位随机数字
pub(super) async fn next_enrollment_number(
    storage: &Arc<dyn Storage>,
) -> Result<String, SchoolError> {
    let year = today().year();
    for _ in 0..ENROLLMENT_ATTEMPTS {
        let candidate = format!("{year}{}", generate_random_digits(6));
        if storage
            .get_student_by_enrollment_number(&candidate)
            .await?
            .is_none()
        {
            return Ok(candidate);
        }
    }
    Err(SchoolError::conflict(
        "Unable to allocate a unique enrollment number",
    ))
}

pub async fn create_student(
    service: &StudentService,
    student_data: CreateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let mut student_data = match normalize_create(student_data) {
        Ok(data) => data,
        Err(e) => return Ok(e.into_response()),
    };

    let storage = service.get_storage(request);

    // 非在读学生不占班级名额
    let counts_toward_capacity =
        student_data.status.unwrap_or(StudentStatus::Active) == StudentStatus::Active;
    if let Some(class_id) = student_data.class_id
        && let Err(e) = check_class_vacancy(&storage, class_id, !counts_toward_capacity).await
    {
        return Ok(e.into_response());
    }

    let enrollment_number = match student_data.enrollment_number.take() {
        Some(number) => match storage.get_student_by_enrollment_number(&number).await {
            Ok(None) => number,
            Ok(Some(_)) => {
                return Ok(conflict(
                    ErrorCode::StudentAlreadyExists,
                    format!("Enrollment number {number} already exists"),
                ));
            }
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Failed to check enrollment number",
                ));
            }
        },
        None => match next_enrollment_number(&storage).await {
            Ok(number) => number,
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Failed to generate enrollment number",
                ));
            }
        },
    };
    student_data.enrollment_number = Some(enrollment_number);

    match storage.create_student(student_data).await {
        Ok(student) => {
            info!(
                "Student {} created with enrollment number {}",
                student.id, student.enrollment_number
            );
            invalidate_dashboard(request).await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(student, "Student created successfully")))
        }
        Err(e) => Ok(storage_error_response(
            &e,
            ErrorCode::InternalServerError,
            "Student creation failed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CreateStudentRequest {
        CreateStudentRequest {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        let req = CreateStudentRequest {
            email: Some("  Ana.Souza@Example.COM ".to_string()),
            guardian_name: Some("   ".to_string()),
            enrollment_number: Some(String::new()),
            ..request("  Ana Souza ")
        };
        let req = normalize_create(req).unwrap();
        assert_eq!(req.name, "Ana Souza");
        assert_eq!(req.email.as_deref(), Some("ana.souza@example.com"));
        assert!(req.guardian_name.is_none());
        assert!(req.enrollment_number.is_none());
    }

    #[test]
    fn test_normalize_rejects_blank_name() {
        let err = normalize_create(request("   ")).unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn test_normalize_reports_failing_field() {
        let req = CreateStudentRequest {
            birth_date: Some("2015-13-01".to_string()),
            ..request("Bruno")
        };
        assert_eq!(normalize_create(req).unwrap_err().field, "birth_date");

        let req = CreateStudentRequest {
            guardian_phone: Some("12".to_string()),
            ..request("Bruno")
        };
        assert_eq!(normalize_create(req).unwrap_err().field, "guardian_phone");

        let req = CreateStudentRequest {
            enrollment_number: Some("a b".to_string()),
            ..request("Bruno")
        };
        assert_eq!(normalize_create(req).unwrap_err().field, "enrollment_number");
    }

    #[test]
    fn test_future_birth_date_rejected() {
        let next_year = today().year() + 1;
        let req = CreateStudentRequest {
            birth_date: Some(format!("{next_year}-01-01")),
            ..request("Carla")
        };
        assert_eq!(normalize_create(req).unwrap_err().field, "birth_date");
    }
}
