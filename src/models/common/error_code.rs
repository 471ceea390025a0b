//! 业务错误码
//!
//! 0 表示成功；1xxx 通用，2xxx 认证授权，3xxx 用户，4xxx 教务，5xxx 财务，
//! 6xxx 公告，7xxx 导入导出。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    ValidationFailed = 1001,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证授权
    Unauthorized = 2000,
    AuthFailed = 2001,
    TokenInvalid = 2002,
    Forbidden = 2003,
    AccountDisabled = 2004,

    // 用户
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,
    CanNotDeleteCurrentUser = 3008,

    // 学生
    StudentNotFound = 4000,
    StudentAlreadyExists = 4001,
    StudentHasFinancialRecords = 4002,

    // 班级
    ClassNotFound = 4100,
    ClassAlreadyExists = 4101,
    ClassFull = 4102,
    ClassCapacityBelowEnrollment = 4103,

    // 教师
    TeacherNotFound = 4200,
    TeacherAlreadyExists = 4201,

    // 财务
    TransactionNotFound = 5000,
    TransactionLocked = 5001,
    PaymentNotFound = 5100,
    PaymentInvalidState = 5101,

    // 公告
    AnnouncementNotFound = 6000,

    // 导入导出
    FileUploadFailed = 7000,
    ImportFileParseFailed = 7001,
    ImportFileMissingColumn = 7002,
    ImportFileDataInvalid = 7003,
    ImportTooManyRows = 7004,
    ExportFailed = 7005,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::ClassFull as i32, 4102);
        assert_eq!(ErrorCode::PaymentInvalidState as i32, 5101);
    }
}
