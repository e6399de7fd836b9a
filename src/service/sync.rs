use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use sqlx::PgPool;

use super::reconciler::InvoiceCategoryReconciler;
use crate::db::queries;
use crate::error::ServiceError;
use crate::models::Category;

/// 同步结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub total: usize,
    /// 新关联 (写回了 target) 的分类数
    pub linked: usize,
    pub unchanged: usize,
}

/// 以有限并发对账一组分类
///
/// 每个新关联的分类在对账成功后立即交给 `write_back`, 遇到第一个错误即中止。
pub async fn reconcile_categories<F, Fut>(
    reconciler: &InvoiceCategoryReconciler,
    categories: Vec<Category>,
    concurrency: usize,
    write_back: F,
) -> Result<SyncStats, ServiceError>
where
    F: Fn(Category) -> Fut,
    Fut: Future<Output = Result<(), ServiceError>>,
{
    let total = categories.len();
    let write_back = &write_back;

    let linked = stream::iter(categories)
        .map(|category| async move {
            let reconciled = reconciler.reconcile(&category).await.map_err(|e| {
                tracing::error!("对账分类 {} 失败: {}", category.source, e);
                ServiceError::from(e)
            })?;
            if reconciled.target == category.target {
                return Ok::<_, ServiceError>(false);
            }
            write_back(reconciled).await?;
            Ok(true)
        })
        .buffer_unordered(concurrency.max(1))
        .try_fold(0usize, |acc, linked| async move {
            Ok(acc + usize::from(linked))
        })
        .await?;

    Ok(SyncStats {
        total,
        linked,
        unchanged: total - linked,
    })
}

/// 报表库分类 -> Odoo 发票分类 同步
#[derive(Clone)]
pub struct CategorySync {
    pool: PgPool,
    reconciler: InvoiceCategoryReconciler,
    concurrency: usize,
}

impl CategorySync {
    pub fn new(pool: PgPool, reconciler: InvoiceCategoryReconciler, concurrency: usize) -> Self {
        Self {
            pool,
            reconciler,
            concurrency,
        }
    }

    pub fn reconciler(&self) -> &InvoiceCategoryReconciler {
        &self.reconciler
    }

    /// 同步全部分类, 新分配的 target 写回报表库
    pub async fn run(&self) -> Result<SyncStats, ServiceError> {
        let categories = queries::list_categories(&self.pool).await?;
        tracing::info!("开始同步 {} 个分类 (并发 {})", categories.len(), self.concurrency);

        let pool = &self.pool;
        let stats = reconcile_categories(
            &self.reconciler,
            categories,
            self.concurrency,
            |category| async move {
                queries::update_category_target(pool, &category).await?;
                tracing::debug!("写回分类 {} target={:?}", category.source, category.target);
                Ok::<(), ServiceError>(())
            },
        )
        .await?;

        tracing::info!(
            "分类同步完成: total={}, linked={}, unchanged={}",
            stats.total,
            stats.linked,
            stats.unchanged
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use crate::odoo::mock::MockErp;
    use crate::odoo::Odoo;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn reconciler(mock: &Arc<MockErp>) -> InvoiceCategoryReconciler {
        InvoiceCategoryReconciler::new(Odoo::new(mock.clone()))
    }

    #[tokio::test]
    async fn new_categories_are_written_back() {
        let mock = Arc::new(MockErp::new());
        let written = Arc::new(Mutex::new(Vec::new()));
        let categories = vec![
            Category::new("zone-a:ns-1"),
            Category::new("zone-a:ns-2"),
            Category::new("zone-b:ns-1"),
        ];

        let stats = reconcile_categories(&reconciler(&mock), categories, 2, |c| {
            let written = written.clone();
            async move {
                written.lock().unwrap().push(c);
                Ok::<(), ServiceError>(())
            }
        })
        .await
        .unwrap();

        assert_eq!(
            stats,
            SyncStats {
                total: 3,
                linked: 3,
                unchanged: 0
            }
        );
        let mut targets: Vec<String> = written
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.target.clone())
            .collect();
        targets.sort();
        assert_eq!(targets, vec!["100", "101", "102"]);
    }

    #[tokio::test]
    async fn linked_categories_are_not_written() {
        let mock = Arc::new(MockErp::new());
        mock.push_search(vec![json!({
            "id": 12, "name": "Zone: zone - Namespace: ns", "sequence": 0,
            "pagebreak": false, "separator": false, "subtotal": true
        })]);
        let written = Arc::new(Mutex::new(0usize));

        let stats = reconcile_categories(
            &reconciler(&mock),
            vec![Category::new("zone:ns").with_target("12")],
            4,
            |_| {
                let written = written.clone();
                async move {
                    *written.lock().unwrap() += 1;
                    Ok::<(), ServiceError>(())
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.linked, 0);
        assert_eq!(*written.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn first_failure_aborts() {
        let mock = Arc::new(MockErp::new());

        let err = reconcile_categories(
            &reconciler(&mock),
            vec![Category::new("missing-namespace")],
            1,
            |_| async { Ok::<(), ServiceError>(()) },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Reconcile(ReconcileError::InvalidSource(_))
        ));
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let mock = Arc::new(MockErp::new());
        let stats = reconcile_categories(&reconciler(&mock), Vec::new(), 0, |_| async { Ok::<(), ServiceError>(()) })
            .await
            .unwrap();
        assert_eq!(stats, SyncStats::default());
        assert!(mock.calls().is_empty());
    }
}
