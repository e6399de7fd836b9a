use axum::{routing::get, Router};
use odoo_billing_adapter::odoo::{ErpClient, Odoo, OdooClient};
use odoo_billing_adapter::service::{InvoiceDefaults, InvoiceOptions, StaticZoneMapper};
use odoo_billing_adapter::template::{DescriptionRenderer, ItemDescriptionRenderer};
use odoo_billing_adapter::{
    api, create_pool, AppConfig, CategorySync, InvoiceCategoryReconciler, InvoiceCreator,
    InvoiceRun,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置: 可通过第一个参数指定配置文件, 否则查找 adapter.{toml,yaml,json}
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from(Path::new(&path))?,
        None => AppConfig::load()?,
    };
    info!(
        "Starting server on {} (templates: {}, concurrency: {})",
        config.listen_addr(),
        config.invoice.templates_path,
        config.sync.concurrency
    );

    // 创建数据库连接池
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    info!("Database pool created");

    // 登录 Odoo
    let client = OdooClient::new(
        &config.odoo.url,
        Duration::from_secs(config.odoo.timeout_secs),
    )?;
    let session = client.login().await?;
    info!("login succeeded, uid {}", session.session().uid);
    let erp: Arc<dyn ErpClient> = Arc::new(session);
    let odoo = Odoo::new(erp);

    // 描述模板 (加载后只读)
    let renderer = DescriptionRenderer::from_dir(
        &config.invoice.templates_path,
        &config.invoice.template_extension,
    )?;
    let renderer: Arc<dyn ItemDescriptionRenderer> = Arc::new(renderer);

    // 开票选项
    let defaults = InvoiceDefaults::load(config.invoice.defaults_path.as_deref().map(Path::new))?;
    let options = InvoiceOptions {
        title: config.invoice.title.clone(),
        ..InvoiceOptions::default()
    }
    .with_defaults(defaults);

    // 组装服务
    let mut reconciler = InvoiceCategoryReconciler::new(odoo.clone());
    if !config.sync.zone_names.is_empty() {
        let mapper = StaticZoneMapper::new(config.sync.zone_names.clone());
        reconciler = reconciler.with_zone_mapper(Arc::new(mapper));
    }
    let sync = Arc::new(CategorySync::new(
        pool.clone(),
        reconciler,
        config.sync.concurrency,
    ));
    let run = Arc::new(InvoiceRun::new(
        pool,
        InvoiceCreator::new(odoo, renderer.clone()),
        options,
    ));

    // 合并路由
    let app = Router::new()
        .route("/health", get(api::health_check))
        .merge(api::category_routes(sync))
        .merge(api::invoice_routes(run))
        .merge(api::description_routes(renderer))
        .layer(ServiceBuilder::new());

    // 启动服务器
    let addr = config.listen_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/categories/sync       - reconcile all categories");
    info!("  POST /api/categories/reconcile  - reconcile one category");
    info!("  POST /api/invoices              - create invoices for a month");
    info!("  POST /api/descriptions/render   - render an item description");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
