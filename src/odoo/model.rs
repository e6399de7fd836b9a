use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::client::ErpClient;
use crate::error::OdooError;
use crate::models::{Invoice, InvoiceCategory, InvoiceLine, Partner};

const INVOICE_CATEGORY_MODEL: &str = "sale_layout.category";
const PARTNER_MODEL: &str = "res.partner";
const INVOICE_MODEL: &str = "account.invoice";
const INVOICE_LINE_MODEL: &str = "account.invoice.line";

const INVOICE_CATEGORY_FIELDS: &[&str] =
    &["id", "name", "sequence", "pagebreak", "separator", "subtotal"];
const PARTNER_FIELDS: &[&str] = &["id", "name", "parent_id", "property_payment_term"];

/// 按 ID 查询的结果: 找到 / 不存在
///
/// 传输失败通过外层 `Result` 的 `Err` 表示, 与 `NotFound` 区分开。
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }
}

/// Odoo 强类型访问层
#[derive(Clone)]
pub struct Odoo {
    client: Arc<dyn ErpClient>,
}

impl Odoo {
    pub fn new(client: Arc<dyn ErpClient>) -> Self {
        Self { client }
    }

    async fn fetch_by_id<T: DeserializeOwned>(
        &self,
        model: &str,
        fields: &[&str],
        id: i64,
    ) -> Result<Lookup<T>, OdooError> {
        let records = self
            .client
            .search(model, &[json!(["id", "in", [id]])], fields)
            .await?;
        match records.into_iter().next() {
            Some(record) => Ok(Lookup::Found(serde_json::from_value(record)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    pub async fn fetch_invoice_category_by_id(
        &self,
        id: i64,
    ) -> Result<Lookup<InvoiceCategory>, OdooError> {
        self.fetch_by_id(INVOICE_CATEGORY_MODEL, INVOICE_CATEGORY_FIELDS, id)
            .await
    }

    /// 按名称模糊查询 (ilike)
    pub async fn search_invoice_categories_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<InvoiceCategory>, OdooError> {
        let records = self
            .client
            .search(
                INVOICE_CATEGORY_MODEL,
                &[json!(["name", "ilike", name])],
                INVOICE_CATEGORY_FIELDS,
            )
            .await?;
        records
            .into_iter()
            .map(|r| serde_json::from_value(r).map_err(OdooError::from))
            .collect()
    }

    /// 创建分类, 返回带新 ID 的副本
    pub async fn create_invoice_category(
        &self,
        category: &InvoiceCategory,
    ) -> Result<InvoiceCategory, OdooError> {
        let data = serde_json::to_value(InvoiceCategory {
            id: 0,
            ..category.clone()
        })?;
        let id = self.client.create(INVOICE_CATEGORY_MODEL, data).await?;
        Ok(InvoiceCategory {
            id,
            ..category.clone()
        })
    }

    /// 以完整的期望状态覆盖远端记录
    pub async fn update_invoice_category(
        &self,
        category: &InvoiceCategory,
    ) -> Result<bool, OdooError> {
        let data = serde_json::to_value(category)?;
        self.client
            .update(INVOICE_CATEGORY_MODEL, category.id, data)
            .await
    }

    pub async fn delete_invoice_category(
        &self,
        category: &InvoiceCategory,
    ) -> Result<bool, OdooError> {
        self.client
            .delete(INVOICE_CATEGORY_MODEL, &[category.id])
            .await
    }

    pub async fn fetch_partner_by_id(&self, id: i64) -> Result<Lookup<Partner>, OdooError> {
        self.fetch_by_id(PARTNER_MODEL, PARTNER_FIELDS, id).await
    }

    /// 创建发票 (不含发票行), 返回带新 ID 的副本
    pub async fn create_invoice(&self, invoice: &Invoice) -> Result<Invoice, OdooError> {
        let data = serde_json::to_value(Invoice {
            id: 0,
            ..invoice.clone()
        })?;
        let id = self.client.create(INVOICE_MODEL, data).await?;
        Ok(Invoice {
            id,
            ..invoice.clone()
        })
    }

    /// 向发票添加一行, 返回带新 ID 和 invoice_id 的行
    pub async fn invoice_add_line(
        &self,
        invoice_id: i64,
        line: &InvoiceLine,
    ) -> Result<InvoiceLine, OdooError> {
        let mut line = InvoiceLine {
            id: 0,
            invoice_id,
            ..line.clone()
        };
        line.id = self
            .client
            .create(INVOICE_LINE_MODEL, serde_json::to_value(&line)?)
            .await?;
        Ok(line)
    }

    /// 触发 Odoo 重新计算税额 (button_reset_taxes), 返回 Odoo 的确认标志
    pub async fn invoice_calculate_taxes(&self, invoice_id: i64) -> Result<bool, OdooError> {
        let result = self
            .client
            .invoke(INVOICE_MODEL, "button_reset_taxes", json!([[invoice_id]]))
            .await?;
        Ok(matches!(result, Value::Bool(true)))
    }
}
