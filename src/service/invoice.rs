use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;

use crate::error::{DefaultsError, InvoiceError};
use crate::models::{BillingInvoice, Invoice, InvoiceLine};
use crate::odoo::{Lookup, Odoo};
use crate::template::ItemDescriptionRenderer;

const EMBEDDED_DEFAULTS: &str = include_str!("../../invoice-defaults.yaml");

/// 发票与发票行的默认字段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvoiceDefaults {
    #[serde(default)]
    pub invoice: Invoice,
    #[serde(default)]
    pub invoice_line: InvoiceLine,
}

impl InvoiceDefaults {
    pub fn from_yaml(raw: &str) -> Result<Self, DefaultsError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// 读取指定文件; 未指定时使用内置默认值
    pub fn load(path: Option<&Path>) -> Result<Self, DefaultsError> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| DefaultsError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_yaml(&raw)
            }
            None => Self::from_yaml(EMBEDDED_DEFAULTS),
        }
    }
}

/// 开票选项
#[derive(Debug, Clone)]
pub struct InvoiceOptions {
    /// 发票名称中的标题部分
    pub title: String,
    /// 为空时使用当天日期
    pub invoice_date: Option<NaiveDate>,
    pub invoice_defaults: Invoice,
    pub line_defaults: InvoiceLine,
}

impl Default for InvoiceOptions {
    fn default() -> Self {
        Self {
            title: "APPUiO Cloud".to_string(),
            invoice_date: None,
            invoice_defaults: Invoice::default(),
            line_defaults: InvoiceLine::default(),
        }
    }
}

impl InvoiceOptions {
    pub fn with_defaults(mut self, defaults: InvoiceDefaults) -> Self {
        self.invoice_defaults = defaults.invoice;
        self.line_defaults = defaults.invoice_line;
        self
    }

    pub fn invoice_date_or_today(&self) -> NaiveDate {
        self.invoice_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// 发票名称: `{抬头} {标题} {月份} {年份}`
pub fn invoice_name(billing_name: &str, title: &str, period_start: NaiveDate) -> String {
    format!(
        "{} {} {} {}",
        billing_name,
        title,
        period_start.format("%B"),
        period_start.year()
    )
}

/// 发票行单价: 金额保留两位小数
pub fn line_price(total: f64) -> f64 {
    (total * 100.0).round() / 100.0
}

fn parse_id(value: &str) -> Result<i64, std::num::ParseIntError> {
    value.parse::<i64>()
}

/// 把报表库账单转换为 Odoo 发票
#[derive(Clone)]
pub struct InvoiceCreator {
    odoo: Odoo,
    renderer: Arc<dyn ItemDescriptionRenderer>,
}

impl InvoiceCreator {
    pub fn new(odoo: Odoo, renderer: Arc<dyn ItemDescriptionRenderer>) -> Self {
        Self { odoo, renderer }
    }

    /// 创建发票及全部发票行, 并触发税额计算; 返回 Odoo 发票 ID
    pub async fn create_invoice(
        &self,
        invoice: &BillingInvoice,
        opts: &InvoiceOptions,
    ) -> Result<i64, InvoiceError> {
        // 1. 查询客户
        let partner_id =
            parse_id(&invoice.tenant.target).map_err(|source| InvoiceError::InvalidPartnerId {
                value: invoice.tenant.target.clone(),
                source,
            })?;
        let partner = match self
            .odoo
            .fetch_partner_by_id(partner_id)
            .await
            .map_err(|source| InvoiceError::Odoo {
                operation: "fetching partner info from Odoo",
                source,
            })? {
            Lookup::Found(partner) => partner,
            Lookup::NotFound => return Err(InvoiceError::PartnerNotFound(partner_id)),
        };

        // 2. 发票头
        let header = Invoice {
            name: invoice_name(partner.billing_name(), &opts.title, invoice.period_start),
            date: Some(opts.invoice_date_or_today()),
            partner_id,
            payment_term_id: partner.payment_term.as_ref().map_or(0, |t| t.id),
            ..opts.invoice_defaults.clone()
        };

        // 3. 发票行 (先全部构造, 任何数据错误都不产生远程写入)
        let mut lines = Vec::new();
        for category in &invoice.categories {
            let category_id = parse_id(&category.target).map_err(|source| {
                InvoiceError::InvalidCategoryTarget {
                    value: category.target.clone(),
                    source,
                }
            })?;
            for item in &category.items {
                let name = self.renderer.render_item_description(item)?;
                let product_id = parse_id(&item.product_ref.target).map_err(|source| {
                    InvoiceError::InvalidProductTarget {
                        value: item.product_ref.target.clone(),
                        source,
                    }
                })?;

                lines.push(InvoiceLine {
                    name,
                    category_id,
                    product_id,
                    price_per_unit: line_price(item.total),
                    quantity: 1.0,
                    discount: 0.0,
                    ..opts.line_defaults.clone()
                });
            }
        }

        self.submit(header, lines).await
    }

    /// 按顺序提交: 发票头 -> 各发票行 -> 税额计算; 出错即停止, 不回滚
    async fn submit(&self, header: Invoice, lines: Vec<InvoiceLine>) -> Result<i64, InvoiceError> {
        let created = self
            .odoo
            .create_invoice(&header)
            .await
            .map_err(|source| InvoiceError::Odoo {
                operation: "creating invoice in Odoo",
                source,
            })?;
        let invoice_id = created.id;
        tracing::info!("创建发票 {} ({}), {} 行", invoice_id, created.name, lines.len());

        let mut created_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.odoo.invoice_add_line(invoice_id, line).await {
                Ok(line) => created_lines.push(line),
                Err(source) => {
                    tracing::error!(
                        "adding line to invoice {} failed after {} line(s)",
                        invoice_id,
                        created_lines.len()
                    );
                    return Err(InvoiceError::LinesPartiallyCreated {
                        invoice_id,
                        created: created_lines,
                        source,
                    });
                }
            }
        }

        let confirmed = self
            .odoo
            .invoice_calculate_taxes(invoice_id)
            .await
            .map_err(|source| InvoiceError::Taxes { invoice_id, source })?;
        if !confirmed {
            return Err(InvoiceError::TaxesNotConfirmed(invoice_id));
        }

        Ok(invoice_id)
    }
}
