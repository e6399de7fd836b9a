use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{OdooError, ReconcileError};
use crate::models::{Category, InvoiceCategory};
use crate::odoo::{Lookup, Odoo};

const SEGMENT_SEPARATOR: char = ':';

/// 区域 (zone) 显示名映射
#[async_trait]
pub trait ZoneNameMapper: Send + Sync {
    async fn map_zone_name(&self, zone: &str) -> Result<String, ReconcileError>;
}

/// 基于固定表的区域名映射
#[derive(Debug, Clone, Default)]
pub struct StaticZoneMapper {
    names: HashMap<String, String>,
}

impl StaticZoneMapper {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticZoneMapper {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[async_trait]
impl ZoneNameMapper for StaticZoneMapper {
    async fn map_zone_name(&self, zone: &str) -> Result<String, ReconcileError> {
        self.names
            .get(zone)
            .cloned()
            .ok_or_else(|| ReconcileError::UnknownZone(zone.to_string()))
    }
}

fn odoo_err(operation: &'static str) -> impl FnOnce(OdooError) -> ReconcileError {
    move |source| ReconcileError::Odoo { operation, source }
}

/// 报表库分类与 Odoo 发票分类的对账器
///
/// 报表库是权威数据源: 未关联时创建, 已关联时比对并以期望状态覆盖。
#[derive(Clone)]
pub struct InvoiceCategoryReconciler {
    odoo: Odoo,
    zone_mapper: Option<Arc<dyn ZoneNameMapper>>,
}

impl InvoiceCategoryReconciler {
    pub fn new(odoo: Odoo) -> Self {
        Self {
            odoo,
            zone_mapper: None,
        }
    }

    pub fn with_zone_mapper(mut self, mapper: Arc<dyn ZoneNameMapper>) -> Self {
        self.zone_mapper = Some(mapper);
        self
    }

    /// 对账单个分类, 返回 (可能已写入 target 的) 分类
    pub async fn reconcile(&self, category: &Category) -> Result<Category, ReconcileError> {
        // 1. 先推导期望状态, 数据错误不产生任何远程调用
        let desired = self.desired_invoice_category(category).await?;

        // 2. 未关联: 创建; 只要 target 非空就必须走查询, 即使解析结果为 0
        if category.linked_target().is_none() {
            let created = self
                .odoo
                .create_invoice_category(&desired)
                .await
                .map_err(odoo_err("creating invoice category"))?;
            tracing::info!(
                "created invoice category {} for {} ({})",
                created.id,
                category.source,
                created.name
            );
            return Ok(merge(category, &created));
        }

        // 3. 已关联: 查询并比对
        let existing = self
            .odoo
            .fetch_invoice_category_by_id(desired.id)
            .await
            .map_err(odoo_err("fetching invoice category"))?;
        match existing {
            // 可能已在 Odoo 中被手动删除; 不重建, 避免已开发票引用失效
            Lookup::NotFound => Err(ReconcileError::NotFound {
                id: desired.id,
                name: desired.name,
            }),
            Lookup::Found(existing) if existing.is_same(&desired) => {
                tracing::debug!("invoice category {} up to date", desired.id);
                Ok(category.clone())
            }
            Lookup::Found(existing) => {
                tracing::info!(
                    "resetting drifted invoice category {}: {:?} -> {:?}",
                    desired.id,
                    existing.name,
                    desired.name
                );
                let updated = self
                    .odoo
                    .update_invoice_category(&desired)
                    .await
                    .map_err(odoo_err("updating invoice category"))?;
                if !updated {
                    return Err(ReconcileError::UpdateNotConfirmed { id: desired.id });
                }
                Ok(category.clone())
            }
        }
    }

    /// 由报表库分类推导期望的 Odoo 分类
    pub async fn desired_invoice_category(
        &self,
        category: &Category,
    ) -> Result<InvoiceCategory, ReconcileError> {
        let id = match category.linked_target() {
            Some(target) => target
                .parse::<i64>()
                .map_err(|source| ReconcileError::InvalidTarget {
                    value: target.to_string(),
                    source,
                })?,
            None => 0,
        };

        let mut segments = category.source.split(SEGMENT_SEPARATOR);
        let (zone, namespace) = match (segments.next(), segments.next()) {
            (Some(zone), Some(namespace)) => (zone, namespace),
            _ => return Err(ReconcileError::InvalidSource(category.source.clone())),
        };

        let zone = match &self.zone_mapper {
            Some(mapper) => mapper.map_zone_name(zone).await?,
            None => zone.to_string(),
        };

        Ok(InvoiceCategory {
            id,
            name: format!("Zone: {zone} - Namespace: {namespace}"),
            sequence: 0,
            page_break: false,
            separator: false,
            subtotal: true,
        })
    }
}

/// 把 Odoo 分配的 ID 写回 target, 其余字段保持不变
pub fn merge(current: &Category, created: &InvoiceCategory) -> Category {
    let target = if created.id != 0 {
        Some(created.id.to_string())
    } else {
        current.target.clone()
    };
    Category {
        id: current.id.clone(),
        source: current.source.clone(),
        target,
    }
}
