//! SeaORM 存储实现
//!
//! 支持 SQLite、PostgreSQL 和 MySQL，数据库类型由 URL 推断。

mod announcements;
mod classes;
mod finance;
mod payments;
mod students;
mod teachers;
mod transactions;
mod users;

use crate::config::AppConfig;
use crate::entity::prelude::{Classes, Students, Teachers, Users};
use crate::entity::classes::Column as ClassColumn;
use crate::entity::students::Column as StudentColumn;
use crate::entity::teachers::Column as TeacherColumn;
use crate::entity::users::Column as UserColumn;
use crate::errors::{Result, SchoolError};
use crate::models::{
    PaginationInfo, PaginationQuery,
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
        responses::{
            FinanceSummary, GenerateChargesResponse, PaymentListResponse, TransactionListResponse,
        },
    },
    students::{
        entities::{Student, StudentStatus},
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
use crate::storage::{MonthlyChargePlan, Storage};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Select,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 使用配置中的数据库地址创建存储
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database.url).await
    }

    /// 连接指定数据库并执行迁移
    pub async fn connect(url: &str) -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(url)?;

        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| SchoolError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| SchoolError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| SchoolError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| SchoolError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 推断数据库类型
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(SchoolError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 执行分页查询，返回当前页模型与分页信息
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    pagination: &PaginationQuery,
    label: &str,
) -> Result<(Vec<E::Model>, PaginationInfo)>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let (page, size) = pagination.normalized();
    let paginator = select.paginate(db, size);

    let total = paginator
        .num_items()
        .await
        .map_err(|e| SchoolError::database_operation(format!("查询{label}总数失败: {e}")))?;

    let pages = paginator
        .num_pages()
        .await
        .map_err(|e| SchoolError::database_operation(format!("查询{label}页数失败: {e}")))?;

    let items = paginator
        .fetch_page(page - 1)
        .await
        .map_err(|e| SchoolError::database_operation(format!("查询{label}列表失败: {e}")))?;

    Ok((items, PaginationInfo::new(page, size, total, pages)))
}

pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// 收集去重后的关联 ID
pub(crate) fn collect_ids<T>(items: &[T], f: impl Fn(&T) -> Option<i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = items.iter().filter_map(f).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

impl SeaOrmStorage {
    /// 批量加载班级名称
    pub(crate) async fn load_class_names(&self, ids: Vec<i64>) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Classes::find()
            .filter(ClassColumn::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询班级名称失败: {e}")))?;
        Ok(rows.into_iter().map(|m| (m.id, m.name)).collect())
    }

    /// 批量加载学生姓名
    pub(crate) async fn load_student_names(&self, ids: Vec<i64>) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Students::find()
            .filter(StudentColumn::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询学生姓名失败: {e}")))?;
        Ok(rows.into_iter().map(|m| (m.id, m.name)).collect())
    }

    /// 批量加载教师姓名
    pub(crate) async fn load_teacher_names(&self, ids: Vec<i64>) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Teachers::find()
            .filter(TeacherColumn::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询教师姓名失败: {e}")))?;
        Ok(rows.into_iter().map(|m| (m.id, m.name)).collect())
    }

    /// 批量加载用户显示名，未设置时使用用户名
    pub(crate) async fn load_user_names(&self, ids: Vec<i64>) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = Users::find()
            .filter(UserColumn::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("查询用户名称失败: {e}")))?;
        Ok(rows
            .into_iter()
            .map(|m| (m.id, m.display_name.unwrap_or(m.username)))
            .collect())
    }

    /// 批量统计班级在读学生数
    pub(crate) async fn load_enrolled_counts(&self, ids: Vec<i64>) -> Result<HashMap<i64, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let class_ids: Vec<Option<i64>> = Students::find()
            .select_only()
            .column(StudentColumn::ClassId)
            .filter(StudentColumn::ClassId.is_in(ids))
            .filter(StudentColumn::Status.eq(StudentStatus::Active.to_string()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| SchoolError::database_operation(format!("统计班级人数失败: {e}")))?;

        let mut counts = HashMap::new();
        for class_id in class_ids.into_iter().flatten() {
            *counts.entry(class_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl Storage for SeaOrmStorage {
    // 用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, params: UserListParams) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(params).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 教师
    async fn create_teacher(&self, teacher: CreateTeacherRequest) -> Result<Teacher> {
        self.create_teacher_impl(teacher).await
    }

    async fn get_teacher_by_id(&self, id: i64) -> Result<Option<Teacher>> {
        self.get_teacher_by_id_impl(id).await
    }

    async fn get_teacher_by_email(&self, email: &str) -> Result<Option<Teacher>> {
        self.get_teacher_by_email_impl(email).await
    }

    async fn get_teacher_detail(&self, id: i64) -> Result<Option<TeacherDetail>> {
        self.get_teacher_detail_impl(id).await
    }

    async fn list_teachers_with_pagination(
        &self,
        params: TeacherListParams,
    ) -> Result<TeacherListResponse> {
        self.list_teachers_with_pagination_impl(params).await
    }

    async fn update_teacher(
        &self,
        id: i64,
        update: UpdateTeacherRequest,
    ) -> Result<Option<Teacher>> {
        self.update_teacher_impl(id, update).await
    }

    async fn delete_teacher(&self, id: i64) -> Result<bool> {
        self.delete_teacher_impl(id).await
    }

    // 班级
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(id).await
    }

    async fn get_class_by_name(&self, name: &str) -> Result<Option<Class>> {
        self.get_class_by_name_impl(name).await
    }

    async fn list_classes_with_pagination(
        &self,
        params: ClassListParams,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(params).await
    }

    async fn update_class(&self, id: i64, update: UpdateClassRequest) -> Result<Option<Class>> {
        self.update_class_impl(id, update).await
    }

    async fn delete_class(&self, id: i64) -> Result<bool> {
        self.delete_class_impl(id).await
    }

    async fn list_class_students(
        &self,
        class_id: i64,
        pagination: PaginationQuery,
    ) -> Result<StudentListResponse> {
        self.list_class_students_impl(class_id, pagination).await
    }

    async fn count_active_students_in_class(&self, class_id: i64) -> Result<i64> {
        self.count_active_students_in_class_impl(class_id).await
    }

    // 学生
    async fn create_student(&self, student: CreateStudentRequest) -> Result<Student> {
        self.create_student_impl(student).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_student_by_enrollment_number(&self, number: &str) -> Result<Option<Student>> {
        self.get_student_by_enrollment_number_impl(number).await
    }

    async fn list_students_with_pagination(
        &self,
        params: StudentListParams,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(params).await
    }

    async fn list_students(&self, filter: StudentFilter) -> Result<Vec<Student>> {
        self.list_students_impl(filter).await
    }

    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        self.update_student_impl(id, update).await
    }

    async fn delete_student(&self, id: i64) -> Result<bool> {
        self.delete_student_impl(id).await
    }

    async fn count_student_payments(&self, student_id: i64) -> Result<u64> {
        self.count_student_payments_impl(student_id).await
    }

    // 流水
    async fn create_transaction(&self, transaction: NewTransaction) -> Result<Transaction> {
        self.create_transaction_impl(transaction).await
    }

    async fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        self.get_transaction_by_id_impl(id).await
    }

    async fn list_transactions_with_pagination(
        &self,
        params: TransactionListParams,
    ) -> Result<TransactionListResponse> {
        self.list_transactions_with_pagination_impl(params).await
    }

    async fn list_transactions(&self, filter: TransactionFilter) -> Result<Vec<Transaction>> {
        self.list_transactions_impl(filter).await
    }

    async fn update_transaction(
        &self,
        id: i64,
        update: UpdateTransactionRequest,
    ) -> Result<Option<Transaction>> {
        self.update_transaction_impl(id, update).await
    }

    async fn delete_transaction(&self, id: i64) -> Result<bool> {
        self.delete_transaction_impl(id).await
    }

    // 收费记录
    async fn create_payment(&self, payment: CreatePaymentRequest) -> Result<PaymentRecord> {
        self.create_payment_impl(payment).await
    }

    async fn get_payment_by_id(&self, id: i64) -> Result<Option<PaymentRecord>> {
        self.get_payment_by_id_impl(id).await
    }

    async fn list_payments_with_pagination(
        &self,
        params: PaymentListParams,
    ) -> Result<PaymentListResponse> {
        self.list_payments_with_pagination_impl(params).await
    }

    async fn update_payment(
        &self,
        id: i64,
        update: UpdatePaymentRequest,
    ) -> Result<Option<PaymentRecord>> {
        self.update_payment_impl(id, update).await
    }

    async fn mark_overdue_payments(&self, today: &str) -> Result<u64> {
        self.mark_overdue_payments_impl(today).await
    }

    async fn settle_payment(
        &self,
        id: i64,
        settlement: PaymentSettlement,
    ) -> Result<Option<(PaymentRecord, Transaction)>> {
        self.settle_payment_impl(id, settlement).await
    }

    async fn transition_payment(
        &self,
        id: i64,
        next: PaymentStatus,
    ) -> Result<Option<PaymentRecord>> {
        self.transition_payment_impl(id, next).await
    }

    async fn generate_monthly_charges(
        &self,
        plan: MonthlyChargePlan,
    ) -> Result<GenerateChargesResponse> {
        self.generate_monthly_charges_impl(plan).await
    }

    // 统计
    async fn finance_summary(&self, from: &str, to: &str) -> Result<FinanceSummary> {
        self.finance_summary_impl(from, to).await
    }

    async fn dashboard_overview(
        &self,
        month_from: &str,
        month_to: &str,
    ) -> Result<DashboardOverview> {
        self.dashboard_overview_impl(month_from, month_to).await
    }

    // 公告
    async fn create_announcement(
        &self,
        announcement: CreateAnnouncementRequest,
        author_id: Option<i64>,
    ) -> Result<Announcement> {
        self.create_announcement_impl(announcement, author_id).await
    }

    async fn get_announcement_by_id(&self, id: i64) -> Result<Option<Announcement>> {
        self.get_announcement_by_id_impl(id).await
    }

    async fn list_announcements_with_pagination(
        &self,
        params: AnnouncementListParams,
    ) -> Result<AnnouncementListResponse> {
        self.list_announcements_with_pagination_impl(params).await
    }

    async fn update_announcement(
        &self,
        id: i64,
        update: UpdateAnnouncementRequest,
    ) -> Result<Option<Announcement>> {
        self.update_announcement_impl(id, update).await
    }

    async fn delete_announcement(&self, id: i64) -> Result<bool> {
        self.delete_announcement_impl(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("school.db").unwrap(),
            "sqlite://school.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/school").unwrap(),
            "postgres://u:p@localhost/school"
        );
        assert!(SeaOrmStorage::build_database_url("ftp://nope").is_err());
    }
}
