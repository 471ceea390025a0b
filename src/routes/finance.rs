use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::finance::requests::{
    CreatePaymentRequest, CreateTransactionRequest, GenerateChargesRequest, PayPaymentRequest,
    PaymentListParams, SummaryParams, TransactionFilter, TransactionListParams,
    UpdatePaymentRequest, UpdateTransactionRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::FinanceService;
use crate::utils::SafeIDI64;

// 懒加载的全局 FinanceService 实例
static FINANCE_SERVICE: Lazy<FinanceService> = Lazy::new(FinanceService::new_lazy);

// 流水
pub async fn list_transactions(
    req: HttpRequest,
    query: web::Query<TransactionListParams>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .list_transactions(query.into_inner(), &req)
        .await
}

pub async fn create_transaction(
    req: HttpRequest,
    data: web::Json<CreateTransactionRequest>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .create_transaction(data.into_inner(), &req)
        .await
}

pub async fn export_transactions(
    req: HttpRequest,
    query: web::Query<TransactionFilter>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .export_transactions(query.into_inner(), &req)
        .await
}

pub async fn get_transaction(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.get_transaction(id.0, &req).await
}

pub async fn update_transaction(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<UpdateTransactionRequest>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .update_transaction(id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_transaction(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.delete_transaction(id.0, &req).await
}

// 收费记录
pub async fn list_payments(
    req: HttpRequest,
    query: web::Query<PaymentListParams>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.list_payments(query.into_inner(), &req).await
}

pub async fn create_payment(
    req: HttpRequest,
    data: web::Json<CreatePaymentRequest>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.create_payment(data.into_inner(), &req).await
}

pub async fn generate_charges(
    req: HttpRequest,
    data: web::Json<GenerateChargesRequest>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .generate_charges(data.into_inner(), &req)
        .await
}

pub async fn get_payment(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.get_payment(id.0, &req).await
}

pub async fn update_payment(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<UpdatePaymentRequest>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .update_payment(id.0, data.into_inner(), &req)
        .await
}

pub async fn pay_payment(
    req: HttpRequest,
    id: SafeIDI64,
    data: web::Json<PayPaymentRequest>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE
        .pay_payment(id.0, data.into_inner(), &req)
        .await
}

pub async fn cancel_payment(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.cancel_payment(id.0, &req).await
}

// 汇总
pub async fn summary(
    req: HttpRequest,
    query: web::Query<SummaryParams>,
) -> ActixResult<HttpResponse> {
    FINANCE_SERVICE.summary(query.into_inner(), &req).await
}

// 配置路由，整个财务模块仅教务与管理员可用
pub fn configure_finance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/financeiro")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles()))
                    .route("/transacoes", web::get().to(list_transactions))
                    .route("/transacoes", web::post().to(create_transaction))
                    .route("/transacoes/export", web::get().to(export_transactions))
                    .route("/transacoes/{id}", web::get().to(get_transaction))
                    .route("/transacoes/{id}", web::put().to(update_transaction))
                    .route("/transacoes/{id}", web::delete().to(delete_transaction))
                    .route("/pagamentos", web::get().to(list_payments))
                    .route("/pagamentos", web::post().to(create_payment))
                    .route("/pagamentos/gerar", web::post().to(generate_charges))
                    .route("/pagamentos/{id}", web::get().to(get_payment))
                    .route("/pagamentos/{id}", web::put().to(update_payment))
                    .route("/pagamentos/{id}/pagar", web::post().to(pay_payment))
                    .route("/pagamentos/{id}/cancelar", web::post().to(cancel_payment))
                    .route("/resumo", web::get().to(summary)),
            ),
    );
}
