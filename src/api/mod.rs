pub mod handlers;

pub use handlers::*;

use crate::service::{CategorySync, InvoiceRun};
use crate::template::ItemDescriptionRenderer;
use axum::{routing::post, Router};
use std::sync::Arc;

/// 分类同步路由
pub fn category_routes(sync: Arc<CategorySync>) -> Router {
    Router::new()
        .route("/api/categories/sync", post(sync_categories))
        .route("/api/categories/reconcile", post(reconcile_category))
        .with_state(sync)
}

/// 开票路由
pub fn invoice_routes(run: Arc<InvoiceRun>) -> Router {
    Router::new()
        .route("/api/invoices", post(create_invoices))
        .with_state(run)
}

/// 描述渲染路由
pub fn description_routes(renderer: Arc<dyn ItemDescriptionRenderer>) -> Router {
    Router::new()
        .route("/api/descriptions/render", post(render_description))
        .with_state(renderer)
}
