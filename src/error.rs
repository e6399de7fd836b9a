use std::num::ParseIntError;

use thiserror::Error;

use crate::models::InvoiceLine;

/// Odoo 传输层错误
#[derive(Debug, Error)]
pub enum OdooError {
    #[error("sending HTTP request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("expected HTTP status 200 OK, got {0}")]
    Status(reqwest::StatusCode),

    #[error("decoding result: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("error from Odoo: {message} (code {code})")]
    Remote { code: i64, message: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidUrl(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// 描述模板错误
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("reading template {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing template {name}: {source}")]
    Syntax {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to find template for `product_ref.source={key:?}`, defined templates: {defined:?}")]
    NotFound { key: String, defined: Vec<String> },

    #[error("rendering template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// 分类同步错误
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("cannot parse source: {0}: expected format `zone:namespace`")]
    InvalidSource(String),

    #[error("numeric category ID expected, got {value:?}: {source}")]
    InvalidTarget {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("no mapping found for zone {0:?}")]
    UnknownZone(String),

    #[error("category with id {id} ({name}) not found")]
    NotFound { id: i64, name: String },

    #[error("updating invoice category {id}: expected Odoo to return true, got false")]
    UpdateNotConfirmed { id: i64 },

    #[error("{operation}: {source}")]
    Odoo {
        operation: &'static str,
        #[source]
        source: OdooError,
    },
}

/// 开票错误
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("error converting tenant target {value:?} to int: {source}")]
    InvalidPartnerId {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("partner with id \"{0}\" could not be found")]
    PartnerNotFound(i64),

    #[error("error converting category target {value:?} to int: {source}")]
    InvalidCategoryTarget {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("error converting product target {value:?} to int: {source}")]
    InvalidProductTarget {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("error rendering line description: {0}")]
    Description(#[from] TemplateError),

    #[error("{operation}: {source}")]
    Odoo {
        operation: &'static str,
        #[source]
        source: OdooError,
    },

    #[error("error adding line to invoice {invoice_id}: {source}; created until error: {} line(s) {:?}", .created.len(), created_line_ids(.created))]
    LinesPartiallyCreated {
        invoice_id: i64,
        created: Vec<InvoiceLine>,
        #[source]
        source: OdooError,
    },

    #[error("error calculating taxes on invoice {invoice_id}: {source}")]
    Taxes {
        invoice_id: i64,
        #[source]
        source: OdooError,
    },

    #[error("error calculating taxes on invoice {0}: expected Odoo to return true, got false")]
    TaxesNotConfirmed(i64),
}

fn created_line_ids(lines: &[InvoiceLine]) -> Vec<i64> {
    lines.iter().map(|l| l.id).collect()
}

impl InvoiceError {
    /// 已在 Odoo 中创建的发票 ID (如有), 供人工清理
    pub fn invoice_id(&self) -> Option<i64> {
        match self {
            InvoiceError::LinesPartiallyCreated { invoice_id, .. }
            | InvoiceError::Taxes { invoice_id, .. } => Some(*invoice_id),
            InvoiceError::TaxesNotConfirmed(id) => Some(*id),
            _ => None,
        }
    }
}

/// 发票默认值文件错误
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("error reading defaults file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing invoice defaults: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// 服务层错误 (同步/开票批次)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid billing period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },
}

impl ServiceError {
    /// 外部记录缺失 (需人工介入, 不应重试)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::Reconcile(ReconcileError::NotFound { .. })
                | ServiceError::Invoice(InvoiceError::PartnerNotFound(_))
                | ServiceError::Template(TemplateError::NotFound { .. })
                | ServiceError::Invoice(InvoiceError::Description(TemplateError::NotFound { .. }))
        )
    }

    /// 调用方数据错误 (无法解析的 source/target/账期)
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidPeriod { .. }
                | ServiceError::Reconcile(
                    ReconcileError::InvalidSource(_) | ReconcileError::InvalidTarget { .. }
                )
                | ServiceError::Invoice(
                    InvoiceError::InvalidPartnerId { .. }
                        | InvoiceError::InvalidCategoryTarget { .. }
                        | InvoiceError::InvalidProductTarget { .. }
                )
        )
    }
}
