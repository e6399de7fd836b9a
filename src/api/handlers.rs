use crate::error::{ServiceError, TemplateError};
use crate::models::{Category, Item};
use crate::service::{CategorySync, InvoiceRun, SyncStats};
use crate::template::ItemDescriptionRenderer;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 开票账期
#[derive(Debug, Deserialize)]
pub struct InvoiceRunRequest {
    pub year: i32,
    pub month: u32,
}

/// 分类同步响应
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub stats: Option<SyncStats>,
}

/// 单个分类对账响应
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub category: Option<Category>,
}

/// 开票响应
#[derive(Debug, Serialize)]
pub struct InvoiceRunResponse {
    pub success: bool,
    pub message: String,
    pub invoice_ids: Option<Vec<i64>>,
}

/// 描述渲染响应
#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub success: bool,
    pub message: String,
    pub description: Option<String>,
}

fn error_status(err: &ServiceError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_invalid_input() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 同步全部分类
pub async fn sync_categories(State(sync): State<Arc<CategorySync>>) -> Response {
    match sync.run().await {
        Ok(stats) => {
            let response = SyncResponse {
                success: true,
                message: format!(
                    "Synced {} categories, {} newly linked",
                    stats.total, stats.linked
                ),
                stats: Some(stats),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = SyncResponse {
                success: false,
                message: format!("Error: {}", e),
                stats: None,
            };
            (error_status(&e), Json(response)).into_response()
        }
    }
}

/// 对账单个分类, 返回带 target 的分类 (不写回报表库)
pub async fn reconcile_category(
    State(sync): State<Arc<CategorySync>>,
    Json(category): Json<Category>,
) -> Response {
    match sync.reconciler().reconcile(&category).await {
        Ok(reconciled) => {
            let response = ReconcileResponse {
                success: true,
                message: format!("Reconciled category {}", reconciled.source),
                category: Some(reconciled),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let e = ServiceError::from(e);
            let response = ReconcileResponse {
                success: false,
                message: format!("Error: {}", e),
                category: None,
            };
            (error_status(&e), Json(response)).into_response()
        }
    }
}

/// 按账期批量开票
pub async fn create_invoices(
    State(run): State<Arc<InvoiceRun>>,
    Json(req): Json<InvoiceRunRequest>,
) -> Response {
    match run.run(req.year, req.month).await {
        Ok(ids) => {
            let response = InvoiceRunResponse {
                success: true,
                message: format!(
                    "Created {} invoices for {}-{:02}",
                    ids.len(),
                    req.year,
                    req.month
                ),
                invoice_ids: Some(ids),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = InvoiceRunResponse {
                success: false,
                message: format!("Error: {}", e),
                invoice_ids: None,
            };
            (error_status(&e), Json(response)).into_response()
        }
    }
}

/// 渲染单条明细的描述
pub async fn render_description(
    State(renderer): State<Arc<dyn ItemDescriptionRenderer>>,
    Json(item): Json<Item>,
) -> Response {
    match renderer.render_item_description(&item) {
        Ok(description) => {
            let response = DescriptionResponse {
                success: true,
                message: format!("Rendered description for {}", item.product_ref.source),
                description: Some(description),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let status = match e {
                TemplateError::NotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let response = DescriptionResponse {
                success: false,
                message: format!("Error: {}", e),
                description: None,
            };
            (status, Json(response)).into_response()
        }
    }
}
