use std::sync::Arc;

use crate::errors::Result;
use crate::models::{
    PaginationQuery,
    announcements::{
        entities::Announcement,
        requests::{AnnouncementListParams, CreateAnnouncementRequest, UpdateAnnouncementRequest},
        responses::AnnouncementListResponse,
    },
    classes::{
        entities::Class,
        requests::{ClassListParams, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    dashboard::responses::DashboardOverview,
    finance::{
        entities::{PaymentRecord, PaymentStatus, Transaction},
        requests::{
            CreatePaymentRequest, NewTransaction, PaymentListParams, PaymentSettlement,
            TransactionFilter, TransactionListParams, UpdatePaymentRequest,
            UpdateTransactionRequest,
        },
        responses::{FinanceSummary, GenerateChargesResponse, PaymentListResponse, TransactionListResponse},
    },
    students::{
        entities::Student,
        requests::{CreateStudentRequest, StudentFilter, StudentListParams, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    teachers::{
        entities::{Teacher, TeacherDetail},
        requests::{CreateTeacherRequest, TeacherListParams, UpdateTeacherRequest},
        responses::TeacherListResponse,
    },
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateUserRequest, UserListParams},
        responses::UserListResponse,
    },
};

pub mod sea_orm_storage;

/// 月度学费批量生成参数，由服务层校验后传入
#[derive(Debug, Clone)]
pub struct MonthlyChargePlan {
    pub reference_month: String,
    pub due_date: String,
    pub amount_cents: i64,
    pub description: String,
    pub class_id: Option<i64>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段已是哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 登录时按用户名或邮箱查找
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    async fn list_users_with_pagination(&self, params: UserListParams) -> Result<UserListResponse>;
    // password 字段已是哈希
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    async fn delete_user(&self, id: i64) -> Result<bool>;
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    async fn count_users(&self) -> Result<u64>;

    /// 教师管理方法
    async fn create_teacher(&self, teacher: CreateTeacherRequest) -> Result<Teacher>;
    async fn get_teacher_by_id(&self, id: i64) -> Result<Option<Teacher>>;
    async fn get_teacher_by_email(&self, email: &str) -> Result<Option<Teacher>>;
    // 教师详情附带其负责的班级
    async fn get_teacher_detail(&self, id: i64) -> Result<Option<TeacherDetail>>;
    async fn list_teachers_with_pagination(
        &self,
        params: TeacherListParams,
    ) -> Result<TeacherListResponse>;
    async fn update_teacher(&self, id: i64, update: UpdateTeacherRequest)
    -> Result<Option<Teacher>>;
    // 删除教师，其负责的班级 teacher_id 置空
    async fn delete_teacher(&self, id: i64) -> Result<bool>;

    /// 班级管理方法
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    async fn get_class_by_id(&self, id: i64) -> Result<Option<Class>>;
    async fn get_class_by_name(&self, name: &str) -> Result<Option<Class>>;
    async fn list_classes_with_pagination(&self, params: ClassListParams)
    -> Result<ClassListResponse>;
    async fn update_class(&self, id: i64, update: UpdateClassRequest) -> Result<Option<Class>>;
    // 删除班级，班内学生 class_id 置空
    async fn delete_class(&self, id: i64) -> Result<bool>;
    async fn list_class_students(
        &self,
        class_id: i64,
        pagination: PaginationQuery,
    ) -> Result<StudentListResponse>;
    // 班级在读（active）学生数
    async fn count_active_students_in_class(&self, class_id: i64) -> Result<i64>;

    /// 学生管理方法
    // enrollment_number 已由服务层确定
    async fn create_student(&self, student: CreateStudentRequest) -> Result<Student>;
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    async fn get_student_by_enrollment_number(&self, number: &str) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        params: StudentListParams,
    ) -> Result<StudentListResponse>;
    // 导出用，不分页
    async fn list_students(&self, filter: StudentFilter) -> Result<Vec<Student>>;
    async fn update_student(&self, id: i64, update: UpdateStudentRequest)
    -> Result<Option<Student>>;
    async fn delete_student(&self, id: i64) -> Result<bool>;
    async fn count_student_payments(&self, student_id: i64) -> Result<u64>;

    /// 财务流水方法
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction>;
    async fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>>;
    async fn list_transactions_with_pagination(
        &self,
        params: TransactionListParams,
    ) -> Result<TransactionListResponse>;
    async fn list_transactions(&self, filter: TransactionFilter) -> Result<Vec<Transaction>>;
    async fn update_transaction(
        &self,
        id: i64,
        update: UpdateTransactionRequest,
    ) -> Result<Option<Transaction>>;
    async fn delete_transaction(&self, id: i64) -> Result<bool>;

    /// 收费记录方法
    async fn create_payment(&self, payment: CreatePaymentRequest) -> Result<PaymentRecord>;
    async fn get_payment_by_id(&self, id: i64) -> Result<Option<PaymentRecord>>;
    async fn list_payments_with_pagination(
        &self,
        params: PaymentListParams,
    ) -> Result<PaymentListResponse>;
    async fn update_payment(
        &self,
        id: i64,
        update: UpdatePaymentRequest,
    ) -> Result<Option<PaymentRecord>>;
    // 将到期日早于 today 的 pending 记录标记为 overdue，返回更新条数
    async fn mark_overdue_payments(&self, today: &str) -> Result<u64>;
    // 同一数据库事务内完成收款并生成收入流水
    async fn settle_payment(
        &self,
        id: i64,
        settlement: PaymentSettlement,
    ) -> Result<Option<(PaymentRecord, Transaction)>>;
    // 仅允许从可迁移状态变更，否则返回 InvalidState
    async fn transition_payment(
        &self,
        id: i64,
        next: PaymentStatus,
    ) -> Result<Option<PaymentRecord>>;
    async fn generate_monthly_charges(
        &self,
        plan: MonthlyChargePlan,
    ) -> Result<GenerateChargesResponse>;

    /// 统计方法
    async fn finance_summary(&self, from: &str, to: &str) -> Result<FinanceSummary>;
    async fn dashboard_overview(&self, month_from: &str, month_to: &str)
    -> Result<DashboardOverview>;

    /// 公告管理方法
    async fn create_announcement(
        &self,
        announcement: CreateAnnouncementRequest,
        author_id: Option<i64>,
    ) -> Result<Announcement>;
    async fn get_announcement_by_id(&self, id: i64) -> Result<Option<Announcement>>;
    async fn list_announcements_with_pagination(
        &self,
        params: AnnouncementListParams,
    ) -> Result<AnnouncementListResponse>;
    async fn update_announcement(
        &self,
        id: i64,
        update: UpdateAnnouncementRequest,
    ) -> Result<Option<Announcement>>;
    async fn delete_announcement(&self, id: i64) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
