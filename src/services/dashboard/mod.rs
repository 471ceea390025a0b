//! 首页概览
//!
//! 统计结果缓存 60 秒，业务写操作会主动清除。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheResult, DASHBOARD_CACHE_KEY, DASHBOARD_CACHE_TTL};
use crate::models::dashboard::responses::DashboardOverview;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::finance::refresh_overdue;
use crate::services::{cache_from_request, storage_error_response};
use crate::storage::Storage;
use crate::utils::dates::{current_month_bounds, format_date};

pub struct DashboardService {
    storage: Option<Arc<dyn Storage>>,
}

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::storage_from_request(request),
        }
    }

    pub async fn overview(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let cache = cache_from_request(request);

        if let Some(ref cache) = cache {
            match cache.get::<DashboardOverview>(DASHBOARD_CACHE_KEY).await {
                CacheResult::Found(overview) => {
                    debug!("Dashboard served from cache");
                    return Ok(HttpResponse::Ok().json(ApiResponse::success(
                        overview,
                        "Dashboard retrieved successfully",
                    )));
                }
                CacheResult::ExistsButNoValue => cache.remove(DASHBOARD_CACHE_KEY).await,
                CacheResult::NotFound => {}
            }
        }

        let storage = self.get_storage(request);
        refresh_overdue(&storage).await;

        let (month_start, month_end) = match current_month_bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                return Ok(storage_error_response(
                    &e,
                    ErrorCode::InternalServerError,
                    "Failed to compute current month",
                ));
            }
        };

        match storage
            .dashboard_overview(&format_date(month_start), &format_date(month_end))
            .await
        {
            Ok(overview) => {
                if let Some(cache) = cache {
                    cache
                        .insert(DASHBOARD_CACHE_KEY.to_string(), &overview, DASHBOARD_CACHE_TTL)
                        .await;
                }
                Ok(HttpResponse::Ok().json(ApiResponse::success(
                    overview,
                    "Dashboard retrieved successfully",
                )))
            }
            Err(e) => Ok(storage_error_response(
                &e,
                ErrorCode::InternalServerError,
                "Failed to compute dashboard",
            )),
        }
    }
}
