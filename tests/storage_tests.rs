use rust_school_manager::errors::SchoolError;
use rust_school_manager::models::PaginationQuery;
use rust_school_manager::models::announcements::entities::Audience;
use rust_school_manager::models::announcements::requests::CreateAnnouncementRequest;
use rust_school_manager::models::classes::entities::Shift;
use rust_school_manager::models::classes::requests::CreateClassRequest;
use rust_school_manager::models::finance::entities::{
    PaymentMethod, PaymentStatus, TUITION_CATEGORY, TransactionKind,
};
use rust_school_manager::models::finance::requests::{
    CreatePaymentRequest, NewTransaction, PaymentSettlement, UpdatePaymentRequest,
};
use rust_school_manager::models::students::entities::StudentStatus;
use rust_school_manager::models::students::requests::{CreateStudentRequest, UpdateStudentRequest};
use rust_school_manager::models::teachers::requests::CreateTeacherRequest;
use rust_school_manager::models::users::entities::UserRole;
use rust_school_manager::models::users::requests::CreateUserRequest;
use rust_school_manager::storage::sea_orm_storage::SeaOrmStorage;
use rust_school_manager::storage::{MonthlyChargePlan, Storage};
use tempfile::TempDir;

async fn open_storage() -> (TempDir, SeaOrmStorage) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("school.db").display());
    let storage = SeaOrmStorage::connect(&url).await.unwrap();
    (dir, storage)
}

fn first_page() -> PaginationQuery {
    PaginationQuery { page: 1, size: 20 }
}

async fn create_class(storage: &SeaOrmStorage, name: &str, capacity: i32) -> i64 {
    storage
        .create_class(CreateClassRequest {
            name: name.to_string(),
            grade_level: "1º ano".to_string(),
            shift: Shift::Morning,
            school_year: 2026,
            capacity,
            teacher_id: None,
            room: None,
        })
        .await
        .unwrap()
        .id
}

async fn create_student(storage: &SeaOrmStorage, number: &str, class_id: Option<i64>) -> i64 {
    storage
        .create_student(CreateStudentRequest {
            enrollment_number: Some(number.to_string()),
            name: format!("Aluno {number}"),
            class_id,
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

async fn create_payment(storage: &SeaOrmStorage, student_id: i64, due_date: &str) -> i64 {
    storage
        .create_payment(CreatePaymentRequest {
            student_id,
            description: "Mensalidade".to_string(),
            reference_month: None,
            amount_cents: 50_000,
            due_date: due_date.to_string(),
            notes: None,
        })
        .await
        .unwrap()
        .id
}

async fn payment_status(storage: &SeaOrmStorage, id: i64) -> PaymentStatus {
    storage.get_payment_by_id(id).await.unwrap().unwrap().status
}

fn settlement(paid_on: &str, amount: i64) -> PaymentSettlement {
    PaymentSettlement {
        payment_method: PaymentMethod::Pix,
        paid_on: paid_on.to_string(),
        paid_amount_cents: amount,
        late_fee_cents: 0,
        interest_cents: 0,
        notes: None,
        settled_by: None,
    }
}

#[tokio::test]
async fn test_class_enrollment_counts_only_active_students() {
    let (_dir, storage) = open_storage().await;
    let class_id = create_class(&storage, "1A", 30).await;

    let first = create_student(&storage, "2026000001", Some(class_id)).await;
    create_student(&storage, "2026000002", Some(class_id)).await;
    assert_eq!(storage.count_active_students_in_class(class_id).await.unwrap(), 2);

    storage
        .update_student(
            first,
            UpdateStudentRequest {
                status: Some(StudentStatus::Transferred),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(storage.count_active_students_in_class(class_id).await.unwrap(), 1);

    let class = storage.get_class_by_id(class_id).await.unwrap().unwrap();
    assert_eq!(class.enrolled_count, 1);

    let members = storage
        .list_class_students(class_id, first_page())
        .await
        .unwrap();
    assert_eq!(members.pagination.total, 2);
}

#[tokio::test]
async fn test_delete_class_detaches_students() {
    let (_dir, storage) = open_storage().await;
    let class_id = create_class(&storage, "2B", 25).await;
    let student_id = create_student(&storage, "2026000010", Some(class_id)).await;

    assert!(storage.delete_class(class_id).await.unwrap());
    assert!(!storage.delete_class(class_id).await.unwrap());

    let student = storage.get_student_by_id(student_id).await.unwrap().unwrap();
    assert_eq!(student.class_id, None);
    assert_eq!(student.class_name, None);
}

#[tokio::test]
async fn test_delete_teacher_unassigns_classes() {
    let (_dir, storage) = open_storage().await;
    let teacher = storage
        .create_teacher(CreateTeacherRequest {
            name: "Maria Souza".to_string(),
            email: "maria@escola.com".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let class = storage
        .create_class(CreateClassRequest {
            name: "3C".to_string(),
            grade_level: "3º ano".to_string(),
            shift: Shift::Afternoon,
            school_year: 2026,
            capacity: 20,
            teacher_id: Some(teacher.id),
            room: Some("12".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(class.teacher_name.as_deref(), Some("Maria Souza"));

    let detail = storage.get_teacher_detail(teacher.id).await.unwrap().unwrap();
    assert_eq!(detail.classes.len(), 1);

    assert!(storage.delete_teacher(teacher.id).await.unwrap());
    let class = storage.get_class_by_id(class.id).await.unwrap().unwrap();
    assert_eq!(class.teacher_id, None);
}

#[tokio::test]
async fn test_mark_overdue_only_touches_past_pending() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000020", None).await;

    let past = create_payment(&storage, student_id, "2026-01-10").await;
    let future = create_payment(&storage, student_id, "2026-03-10").await;
    let due_today = create_payment(&storage, student_id, "2026-02-01").await;

    assert_eq!(storage.mark_overdue_payments("2026-02-01").await.unwrap(), 1);
    // 重复执行不会再次更新
    assert_eq!(storage.mark_overdue_payments("2026-02-01").await.unwrap(), 0);

    assert_eq!(payment_status(&storage, past).await, PaymentStatus::Overdue);
    assert_eq!(payment_status(&storage, future).await, PaymentStatus::Pending);
    assert_eq!(payment_status(&storage, due_today).await, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_settle_payment_records_income() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000030", None).await;
    let payment_id = create_payment(&storage, student_id, "2026-01-10").await;

    let mut settle = settlement("2026-01-15", 51_234);
    settle.late_fee_cents = 1_000;
    settle.interest_cents = 234;

    let (payment, transaction) = storage
        .settle_payment(payment_id, settle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.paid_amount_cents, Some(51_234));
    assert_eq!(payment.late_fee_cents, 1_000);
    assert_eq!(payment.payment_method, Some(PaymentMethod::Pix));
    assert!(payment.paid_at.is_some());

    assert_eq!(transaction.kind, TransactionKind::Income);
    assert_eq!(transaction.category, TUITION_CATEGORY);
    assert_eq!(transaction.amount_cents, 51_234);
    assert_eq!(transaction.occurred_on, "2026-01-15");
    assert_eq!(transaction.payment_id, Some(payment_id));
    assert_eq!(transaction.student_id, Some(student_id));

    // 已收款的记录不能再次收款或修改
    let again = storage
        .settle_payment(payment_id, settlement("2026-01-16", 100))
        .await;
    assert!(again.is_err());
    let update = storage
        .update_payment(
            payment_id,
            UpdatePaymentRequest {
                amount_cents: Some(1),
                ..Default::default()
            },
        )
        .await;
    assert!(update.is_err());

    assert!(storage.settle_payment(9999, settlement("2026-01-15", 1)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_transition_rejects_reopening_cancelled() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000040", None).await;
    let payment_id = create_payment(&storage, student_id, "2026-05-10").await;

    let cancelled = storage
        .transition_payment(payment_id, PaymentStatus::Cancelled)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);

    assert!(
        storage
            .transition_payment(payment_id, PaymentStatus::Pending)
            .await
            .is_err()
    );
    assert!(
        storage
            .settle_payment(payment_id, settlement("2026-05-10", 50_000))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_generate_monthly_charges_skips_existing() {
    let (_dir, storage) = open_storage().await;
    let class_id = create_class(&storage, "4D", 30).await;
    create_student(&storage, "2026000050", Some(class_id)).await;
    create_student(&storage, "2026000051", Some(class_id)).await;
    let other = create_student(&storage, "2026000052", None).await;
    storage
        .update_student(
            other,
            UpdateStudentRequest {
                status: Some(StudentStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let plan = MonthlyChargePlan {
        reference_month: "2026-03".to_string(),
        due_date: "2026-03-10".to_string(),
        amount_cents: 45_000,
        description: "Mensalidade 2026-03".to_string(),
        class_id: None,
    };

    let first = storage.generate_monthly_charges(plan.clone()).await.unwrap();
    assert_eq!(first.created, 2);
    assert_eq!(first.skipped, 0);

    let second = storage.generate_monthly_charges(plan).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2);
}

#[tokio::test]
async fn test_concurrent_settlements_record_one_income() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000070", None).await;
    let payment_id = create_payment(&storage, student_id, "2026-02-10").await;

    let (first, second) = tokio::join!(
        storage.settle_payment(payment_id, settlement("2026-02-10", 50_000)),
        storage.settle_payment(payment_id, settlement("2026-02-11", 50_000)),
    );
    let settled = [first, second]
        .into_iter()
        .filter(|r| matches!(r, Ok(Some(_))))
        .count();
    assert_eq!(settled, 1);

    let income = storage
        .finance_summary("2026-02-01", "2026-02-28")
        .await
        .unwrap()
        .total_income_cents;
    assert_eq!(income, 50_000);
}

#[tokio::test]
async fn test_cancel_after_settle_keeps_paid_status() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000071", None).await;
    let payment_id = create_payment(&storage, student_id, "2026-02-10").await;

    storage
        .settle_payment(payment_id, settlement("2026-02-10", 50_000))
        .await
        .unwrap()
        .unwrap();

    let err = storage
        .transition_payment(payment_id, PaymentStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, SchoolError::InvalidState(_)));
    assert_eq!(payment_status(&storage, payment_id).await, PaymentStatus::Paid);

    assert!(
        storage
            .transition_payment(9999, PaymentStatus::Cancelled)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_update_payment_keeps_unchanged_fields() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000072", None).await;
    let payment_id = create_payment(&storage, student_id, "2026-02-10").await;

    let updated = storage
        .update_payment(
            payment_id,
            UpdatePaymentRequest {
                amount_cents: Some(47_500),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.amount_cents, 47_500);
    assert_eq!(updated.description, "Mensalidade");
    assert_eq!(updated.due_date, "2026-02-10");
    assert_eq!(updated.status, PaymentStatus::Pending);

    assert!(
        storage
            .update_payment(9999, UpdatePaymentRequest::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_one_open_charge_per_student_month() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000080", None).await;

    let monthly = |month: &str| CreatePaymentRequest {
        student_id,
        description: format!("Mensalidade {month}"),
        reference_month: Some(month.to_string()),
        amount_cents: 45_000,
        due_date: format!("{month}-10"),
        notes: None,
    };

    let existing = storage.create_payment(monthly("2026-03")).await.unwrap();
    assert!(storage.create_payment(monthly("2026-03")).await.is_err());

    let plan = MonthlyChargePlan {
        reference_month: "2026-03".to_string(),
        due_date: "2026-03-10".to_string(),
        amount_cents: 45_000,
        description: "Mensalidade 2026-03".to_string(),
        class_id: None,
    };
    let result = storage.generate_monthly_charges(plan.clone()).await.unwrap();
    assert_eq!((result.created, result.skipped), (0, 1));

    // 取消后可以重新生成
    storage
        .transition_payment(existing.id, PaymentStatus::Cancelled)
        .await
        .unwrap()
        .unwrap();
    let result = storage.generate_monthly_charges(plan).await.unwrap();
    assert_eq!((result.created, result.skipped), (1, 0));
    assert_eq!(storage.count_student_payments(student_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_concurrent_generation_creates_one_charge() {
    let (_dir, storage) = open_storage().await;
    create_student(&storage, "2026000090", None).await;

    let plan = MonthlyChargePlan {
        reference_month: "2026-04".to_string(),
        due_date: "2026-04-10".to_string(),
        amount_cents: 45_000,
        description: "Mensalidade 2026-04".to_string(),
        class_id: None,
    };
    let (first, second) = tokio::join!(
        storage.generate_monthly_charges(plan.clone()),
        storage.generate_monthly_charges(plan),
    );
    let created: usize = [first, second]
        .into_iter()
        .filter_map(|r| r.ok())
        .map(|r| r.created)
        .sum();
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_finance_summary_totals() {
    let (_dir, storage) = open_storage().await;

    for (kind, category, amount, day) in [
        (TransactionKind::Income, "tuition", 100_000, "2026-04-05"),
        (TransactionKind::Income, "donation", 5_000, "2026-04-20"),
        (TransactionKind::Expense, "salary", 60_000, "2026-04-30"),
        (TransactionKind::Expense, "salary", 60_000, "2026-05-30"),
    ] {
        storage
            .create_transaction(NewTransaction {
                kind,
                category: category.to_string(),
                description: None,
                amount_cents: amount,
                occurred_on: day.to_string(),
                student_id: None,
                payment_id: None,
                created_by: None,
            })
            .await
            .unwrap();
    }

    let summary = storage
        .finance_summary("2026-04-01", "2026-04-30")
        .await
        .unwrap();
    assert_eq!(summary.total_income_cents, 105_000);
    assert_eq!(summary.total_expense_cents, 60_000);
    assert_eq!(summary.balance_cents, 45_000);
    assert_eq!(summary.by_category.len(), 3);
    assert_eq!(summary.monthly.len(), 1);
    assert_eq!(summary.monthly[0].month, "2026-04");
}

#[tokio::test]
async fn test_student_payment_count() {
    let (_dir, storage) = open_storage().await;
    let student_id = create_student(&storage, "2026000060", None).await;
    assert_eq!(storage.count_student_payments(student_id).await.unwrap(), 0);

    create_payment(&storage, student_id, "2026-06-10").await;
    assert_eq!(storage.count_student_payments(student_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_author_keeps_announcement() {
    let (_dir, storage) = open_storage().await;
    let author = storage
        .create_user(CreateUserRequest {
            username: "coordenacao".to_string(),
            email: "coordenacao@escola.com".to_string(),
            password: "hash".to_string(),
            role: UserRole::Staff,
            display_name: None,
            avatar_url: None,
        })
        .await
        .unwrap();

    let announcement = storage
        .create_announcement(
            CreateAnnouncementRequest {
                title: "Reunião de pais".to_string(),
                body: "Sexta-feira às 19h".to_string(),
                audience: Audience::Guardians,
                published: true,
            },
            Some(author.id),
        )
        .await
        .unwrap();
    assert_eq!(announcement.author_id, Some(author.id));
    assert_eq!(announcement.author_name.as_deref(), Some("coordenacao"));

    assert!(storage.delete_user(author.id).await.unwrap());

    let orphan = storage
        .get_announcement_by_id(announcement.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(orphan.author_id, None);
    assert_eq!(orphan.author_name, None);
    assert_eq!(orphan.title, "Reunião de pais");
}
