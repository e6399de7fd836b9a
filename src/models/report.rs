use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 报表库聚合出的账单 (每租户每月一张)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingInvoice {
    pub tenant: Tenant,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub categories: Vec<BillingCategory>,
    pub total: f64,
}

/// 租户, target 为 Odoo partner ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub source: String,
    pub target: String,
}

/// 账单内的分类分组, target 为已同步的 Odoo 分类 ID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingCategory {
    pub source: String,
    pub target: String,
    pub items: Vec<Item>,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRef {
    /// 层级产品键, 同时也是描述模板的查找键
    pub source: String,
    pub target: String,
}

/// 账单明细; total 已在上游计算完成
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub description: String,
    pub query_name: String,
    pub product_ref: ProductRef,
    pub quantity: f64,
    pub quantity_min: f64,
    pub quantity_avg: f64,
    pub quantity_max: f64,
    pub unit: String,
    pub price_per_unit: f64,
    pub discount: f64,
    pub total: f64,
    pub sub_items: BTreeMap<String, SubItem>,
}

/// 子查询明细, 以查询名为键挂在 Item 下
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubItem {
    pub description: String,
    pub query_name: String,
    pub quantity: f64,
    pub quantity_min: f64,
    pub quantity_avg: f64,
    pub quantity_max: f64,
    pub unit: String,
}

/// 明细聚合行 (顶层查询)
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceItemRow {
    pub tenant_source: String,
    pub tenant_target: String,
    pub category_source: String,
    pub category_target: String,
    pub product_source: String,
    pub product_target: String,
    pub query_id: String,
    pub query_name: String,
    pub description: String,
    pub unit: String,
    pub price_per_unit: f64,
    pub discount: f64,
    pub quantity: f64,
    pub quantity_min: f64,
    pub quantity_avg: f64,
    pub quantity_max: f64,
}

/// 子查询聚合行, parent_query_id 指向 InvoiceItemRow.query_id
#[derive(Debug, Clone, FromRow)]
pub struct SubItemRow {
    pub tenant_source: String,
    pub category_source: String,
    pub product_source: String,
    pub parent_query_id: String,
    pub query_name: String,
    pub description: String,
    pub unit: String,
    pub quantity: f64,
    pub quantity_min: f64,
    pub quantity_avg: f64,
    pub quantity_max: f64,
}

impl InvoiceItemRow {
    fn into_item(self) -> Item {
        let total = self.quantity * self.price_per_unit * (1.0 - self.discount);
        Item {
            description: self.description,
            query_name: self.query_name,
            product_ref: ProductRef {
                source: self.product_source,
                target: self.product_target,
            },
            quantity: self.quantity,
            quantity_min: self.quantity_min,
            quantity_avg: self.quantity_avg,
            quantity_max: self.quantity_max,
            unit: self.unit,
            price_per_unit: self.price_per_unit,
            discount: self.discount,
            total,
            sub_items: BTreeMap::new(),
        }
    }
}

/// 将聚合行组装为账单: 租户 -> 分类 -> 明细 (保持行顺序)
pub fn assemble_invoices(
    rows: Vec<InvoiceItemRow>,
    sub_rows: Vec<SubItemRow>,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Vec<BillingInvoice> {
    // (tenant, category, product, parent query) -> 子明细
    let mut subs: BTreeMap<(String, String, String, String), BTreeMap<String, SubItem>> =
        BTreeMap::new();
    for s in sub_rows {
        subs.entry((
            s.tenant_source,
            s.category_source,
            s.product_source,
            s.parent_query_id,
        ))
        .or_default()
        .insert(
            s.query_name.clone(),
            SubItem {
                description: s.description,
                query_name: s.query_name,
                quantity: s.quantity,
                quantity_min: s.quantity_min,
                quantity_avg: s.quantity_avg,
                quantity_max: s.quantity_max,
                unit: s.unit,
            },
        );
    }

    let mut invoices: Vec<BillingInvoice> = Vec::new();
    for row in rows {
        let key = (
            row.tenant_source.clone(),
            row.category_source.clone(),
            row.product_source.clone(),
            row.query_id.clone(),
        );

        let found = invoices
            .iter()
            .position(|inv| inv.tenant.source == row.tenant_source);
        let inv_idx = match found {
            Some(idx) => idx,
            None => {
                invoices.push(BillingInvoice {
                    tenant: Tenant {
                        source: row.tenant_source.clone(),
                        target: row.tenant_target.clone(),
                    },
                    period_start,
                    period_end,
                    categories: Vec::new(),
                    total: 0.0,
                });
                invoices.len() - 1
            }
        };
        let invoice = &mut invoices[inv_idx];

        let found = invoice
            .categories
            .iter()
            .position(|c| c.source == row.category_source);
        let cat_idx = match found {
            Some(idx) => idx,
            None => {
                invoice.categories.push(BillingCategory {
                    source: row.category_source.clone(),
                    target: row.category_target.clone(),
                    items: Vec::new(),
                    total: 0.0,
                });
                invoice.categories.len() - 1
            }
        };
        let category = &mut invoice.categories[cat_idx];

        let mut item = row.into_item();
        if let Some(sub_items) = subs.remove(&key) {
            item.sub_items = sub_items;
        }
        let item_total = item.total;
        category.total += item_total;
        category.items.push(item);
        invoice.total += item_total;
    }

    invoices
}
