use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};
use tempfile::TempDir;

use rust_school_manager::cache::{ObjectCache, create_cache};
use rust_school_manager::config::AppConfig;
use rust_school_manager::models::users::entities::UserRole;
use rust_school_manager::models::users::requests::CreateUserRequest;
use rust_school_manager::routes;
use rust_school_manager::storage::Storage;
use rust_school_manager::storage::sea_orm_storage::SeaOrmStorage;
use rust_school_manager::utils::money::{MAX_AMOUNT_CENTS, compute_late_charges};
use rust_school_manager::utils::password::hash_password;
use rust_school_manager::utils::{json_error_handler, query_error_handler};

const PASSWORD: &str = "Senha!2026segura";

// 登录接口按 IP 限流，每次登录使用不同的来源地址
static NEXT_CLIENT: AtomicU32 = AtomicU32::new(1);

fn client_ip() -> String {
    let n = NEXT_CLIENT.fetch_add(1, Ordering::Relaxed);
    format!("198.51.100.{}", n % 250 + 1)
}

struct TestEnv {
    _dir: TempDir,
    storage: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
}

async fn setup() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::connect(&url).await.unwrap());
    let cache = create_cache().await.unwrap();

    for (username, role) in [
        ("admin", UserRole::Admin),
        ("secretaria", UserRole::Staff),
        ("professor", UserRole::Teacher),
    ] {
        storage
            .create_user(CreateUserRequest {
                username: username.to_string(),
                email: format!("{username}@escola.com"),
                password: hash_password(PASSWORD).unwrap(),
                role,
                display_name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
    }

    TestEnv {
        _dir: dir,
        storage,
        cache,
    }
}

macro_rules! init_app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::Data::new($env.storage.clone()))
                .app_data(web::Data::new($env.cache.clone()))
                .configure(routes::configure_auth_routes)
                .configure(routes::configure_user_routes)
                .configure(routes::configure_teacher_routes)
                .configure(routes::configure_classes_routes)
                .configure(routes::configure_student_routes)
                .configure(routes::configure_finance_routes)
                .configure(routes::configure_announcement_routes)
                .configure(routes::configure_dashboard_routes),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr, $username:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .insert_header(("X-Forwarded-For", client_ip()))
            .set_json(json!({ "username": $username, "password": PASSWORD }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        format!(
            "Bearer {}",
            body["data"]["access_token"].as_str().unwrap()
        )
    }};
}

macro_rules! send {
    ($app:expr, $req:expr, $token:expr) => {{
        let req = $req
            .insert_header(("Authorization", $token.as_str()))
            .to_request();
        test::call_service(&$app, req).await
    }};
}

fn days_from_today(days: i64) -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn multipart_csv(csv: &str) -> (String, Vec<u8>) {
    let boundary = "escola-import-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"alunos.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    (
        format!("multipart/form-data; boundary={boundary}"),
        body.into_bytes(),
    )
}

macro_rules! create_student {
    ($app:expr, $token:expr, $body:expr) => {{
        let resp = send!(
            $app,
            test::TestRequest::post().uri("/api/alunos").set_json($body),
            $token
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["data"]["id"].as_i64().unwrap()
    }};
}

macro_rules! create_payment {
    ($app:expr, $token:expr, $student_id:expr, $amount:expr, $due_date:expr) => {{
        let resp = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/financeiro/pagamentos")
                .set_json(json!({
                    "student_id": $student_id,
                    "description": "Mensalidade",
                    "amount_cents": $amount,
                    "due_date": $due_date
                })),
            $token
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body["data"]["id"].as_i64().unwrap()
    }};
}

#[actix_rt::test]
async fn test_login_and_me() {
    let env = setup().await;
    let app = init_app!(env);

    let token = login!(app, "secretaria");
    let resp = send!(app, test::TestRequest::get().uri("/api/auth/me"), token);
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["username"], "secretaria");
    assert_eq!(body["data"]["user"]["role"], "staff");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("X-Forwarded-For", client_ip()))
        .set_json(json!({ "username": "secretaria", "password": "errada" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_requires_authentication() {
    let env = setup().await;
    let app = init_app!(env);

    let req = test::TestRequest::get().uri("/api/alunos").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_teacher_cannot_write_or_see_finance() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "professor");

    let resp = send!(app, test::TestRequest::get().uri("/api/alunos"), token);
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos")
            .set_json(json!({ "name": "Joana Lima" })),
        token
    );
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send!(
        app,
        test::TestRequest::get().uri("/api/financeiro/resumo"),
        token
    );
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send!(app, test::TestRequest::get().uri("/api/users"), token);
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_full_class_rejects_enrollment() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "secretaria");

    let resp = send!(
        app,
        test::TestRequest::post().uri("/api/turmas").set_json(json!({
            "name": "5A",
            "grade_level": "5º ano",
            "shift": "morning",
            "school_year": 2026,
            "capacity": 1
        })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let class_id = body["data"]["id"].as_i64().unwrap();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos")
            .set_json(json!({ "name": "Ana Costa", "class_id": class_id })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let number = body["data"]["enrollment_number"].as_str().unwrap();
    assert_eq!(number.len(), 10);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos")
            .set_json(json!({ "name": "Bruno Dias", "class_id": class_id })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // 不在读的学生不占名额
    let resp = send!(
        app,
        test::TestRequest::post().uri("/api/alunos").set_json(json!({
            "name": "Bruno Dias",
            "class_id": class_id,
            "status": "inactive"
        })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_rt::test]
async fn test_payment_settlement_flow() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "admin");

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos")
            .set_json(json!({ "name": "Carla Nunes" })),
        token
    );
    let body: Value = test::read_body_json(resp).await;
    let student_id = body["data"]["id"].as_i64().unwrap();

    let due_date = days_from_today(10);
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/financeiro/pagamentos")
            .set_json(json!({
                "student_id": student_id,
                "description": "Mensalidade",
                "amount_cents": 45000,
                "due_date": due_date
            })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let payment_id = body["data"]["id"].as_i64().unwrap();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/financeiro/pagamentos/{payment_id}/pagar"))
            .set_json(json!({ "payment_method": "pix" })),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["payment"]["status"], "paid");
    assert_eq!(body["data"]["transaction"]["amount_cents"], 45000);
    let transaction_id = body["data"]["transaction"]["id"].as_i64().unwrap();

    // 收款生成的流水不可删除
    let resp = send!(
        app,
        test::TestRequest::delete().uri(&format!("/api/financeiro/transacoes/{transaction_id}")),
        token
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/financeiro/transacoes/{transaction_id}"))
            .set_json(json!({ "amount_cents": 1 })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // 已收款的记录不能取消
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/financeiro/pagamentos/{payment_id}/cancelar")),
        token
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // 有收费记录的学生不能删除
    let resp = send!(
        app,
        test::TestRequest::delete().uri(&format!("/api/alunos/{student_id}")),
        token
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_student_export_csv() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "secretaria");

    send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos")
            .set_json(json!({ "name": "Davi Rocha", "email": "davi@escola.com" })),
        token
    );

    let resp = send!(app, test::TestRequest::get().uri("/api/alunos/export"), token);
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().contains("enrollment_number"));
    assert!(lines.next().unwrap().contains("Davi Rocha"));
}

#[actix_rt::test]
async fn test_dashboard_overview() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "admin");

    let resp = send!(app, test::TestRequest::get().uri("/api/dashboard"), token);
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total_students"], 0);
}

#[actix_rt::test]
async fn test_late_payment_adds_fee_and_interest() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "secretaria");

    let student_id = create_student!(app, token, json!({ "name": "Elisa Prado" }));
    let payment_id = create_payment!(app, token, student_id, 45_000, days_from_today(-10));

    // 列表读取时过期记录转为 overdue，日期过滤两端的空白被去掉
    let resp = send!(
        app,
        test::TestRequest::get().uri(&format!(
            "/api/financeiro/pagamentos?from=%20{}%20&to={}%20",
            days_from_today(-30),
            days_from_today(0)
        )),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["items"][0]["status"], "overdue");

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/financeiro/pagamentos/{payment_id}/pagar"))
            .set_json(json!({ "payment_method": "boleto" })),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    let expected = compute_late_charges(45_000, 10, &AppConfig::get().finance);
    let payment = &body["data"]["payment"];
    assert_eq!(payment["status"], "paid");
    assert_eq!(payment["late_fee_cents"], expected.late_fee_cents);
    assert_eq!(payment["interest_cents"], expected.interest_cents);
    assert_eq!(payment["paid_amount_cents"], 45_000 + expected.total());
    assert_eq!(
        body["data"]["transaction"]["amount_cents"],
        45_000 + expected.total()
    );
}

#[actix_rt::test]
async fn test_amount_limits() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "admin");
    let student_id = create_student!(app, token, json!({ "name": "Fábio Reis" }));

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/financeiro/pagamentos")
            .set_json(json!({
                "student_id": student_id,
                "description": "Mensalidade",
                "amount_cents": i64::MAX,
                "due_date": days_from_today(5)
            })),
        token
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/financeiro/transacoes")
            .set_json(json!({
                "kind": "income",
                "category": "donation",
                "amount_cents": MAX_AMOUNT_CENTS + 1,
                "occurred_on": days_from_today(0)
            })),
        token
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // 上限金额逾期一年，罚金和利息累加后仍能正常收款
    let payment_id = create_payment!(
        app,
        token,
        student_id,
        MAX_AMOUNT_CENTS,
        days_from_today(-365)
    );
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/financeiro/pagamentos/{payment_id}/pagar"))
            .set_json(json!({ "payment_method": "transfer" })),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let paid = body["data"]["payment"]["paid_amount_cents"].as_i64().unwrap();
    assert!(paid > MAX_AMOUNT_CENTS);

    let resp = send!(
        app,
        test::TestRequest::get().uri("/api/financeiro/resumo"),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_capacity_cannot_drop_below_enrollment() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "secretaria");

    let resp = send!(
        app,
        test::TestRequest::post().uri("/api/turmas").set_json(json!({
            "name": "6B",
            "grade_level": "6º ano",
            "shift": "afternoon",
            "school_year": 2026,
            "capacity": 3
        })),
        token
    );
    let body: Value = test::read_body_json(resp).await;
    let class_id = body["data"]["id"].as_i64().unwrap();

    for name in ["Gabriel Melo", "Helena Castro"] {
        create_student!(app, token, json!({ "name": name, "class_id": class_id }));
    }

    let resp = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/turmas/{class_id}"))
            .set_json(json!({ "capacity": 1 })),
        token
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/turmas/{class_id}"))
            .set_json(json!({ "capacity": 2 })),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["capacity"], 2);
}

#[actix_rt::test]
async fn test_import_students_report() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "secretaria");

    let csv = "name,enrollment_number,class_id\n\
               Igor Pires,2026100001,\n\
               Joana Prado,2026100001,\n\
               ,2026100002,\n\
               Karina Luz,,abc\n\
               Lucas Brito,,";
    let (content_type, payload) = multipart_csv(csv);
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos/import")
            .insert_header(("Content-Type", content_type))
            .set_payload(payload),
        token
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let report = &body["data"];
    assert_eq!(report["total"], 5);
    assert_eq!(report["success"], 2);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failed"], 2);

    let rows: Vec<i64> = report["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["row"].as_i64().unwrap())
        .collect();
    assert_eq!(rows, vec![3, 4, 5]);

    let resp = send!(
        app,
        test::TestRequest::get().uri("/api/alunos?search=2026100001"),
        token
    );
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["items"][0]["name"], "Igor Pires");
}

#[actix_rt::test]
async fn test_import_rejects_too_many_rows() {
    let env = setup().await;
    let app = init_app!(env);
    let token = login!(app, "secretaria");

    let limit = AppConfig::get().server.limits.max_import_rows;
    let mut csv = String::from("name\n");
    for i in 0..=limit {
        csv.push_str(&format!("Aluno {i}\n"));
    }
    let (content_type, payload) = multipart_csv(&csv);
    let resp = send!(
        app,
        test::TestRequest::post()
            .uri("/api/alunos/import")
            .insert_header(("Content-Type", content_type))
            .set_payload(payload),
        token
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send!(app, test::TestRequest::get().uri("/api/alunos"), token);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[actix_rt::test]
async fn test_teacher_sees_only_published_teacher_announcements() {
    let env = setup().await;
    let app = init_app!(env);
    let admin = login!(app, "admin");

    let mut ids = Vec::new();
    for (title, audience, published) in [
        ("Calendário escolar", "all", true),
        ("Conselho de classe", "teachers", false),
        ("Reunião de pais", "guardians", true),
        ("Escala da secretaria", "staff", true),
    ] {
        let resp = send!(
            app,
            test::TestRequest::post().uri("/api/comunicados").set_json(json!({
                "title": title,
                "body": "Detalhes em breve",
                "audience": audience,
                "published": published
            })),
            admin
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let resp = send!(app, test::TestRequest::get().uri("/api/comunicados"), admin);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 4);

    let teacher = login!(app, "professor");
    let resp = send!(app, test::TestRequest::get().uri("/api/comunicados"), teacher);
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Calendário escolar");

    let resp = send!(
        app,
        test::TestRequest::get().uri(&format!("/api/comunicados/{}", ids[0])),
        teacher
    );
    assert_eq!(resp.status(), StatusCode::OK);
    for hidden in &ids[1..] {
        let resp = send!(
            app,
            test::TestRequest::get().uri(&format!("/api/comunicados/{hidden}")),
            teacher
        );
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
