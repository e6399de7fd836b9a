use crate::models::report::{InvoiceItemRow, SubItemRow};
use crate::models::Category;
use sqlx::PgPool;

/// 查询全部分类
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id::text AS id, source, target
        FROM categories
        ORDER BY source
        "#
    )
    .fetch_all(pool)
    .await
}

/// 写回 Odoo 分类 ID
pub async fn update_category_target(
    pool: &PgPool,
    category: &Category,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE categories
        SET target = $1
        WHERE id = $2::uuid
        "#
    )
    .bind(&category.target)
    .bind(&category.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// 按租户/分类/产品/查询聚合指定月份的顶层明细
pub async fn list_invoice_items(
    pool: &PgPool,
    year: i32,
    month: u32,
) -> Result<Vec<InvoiceItemRow>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceItemRow>(
        r#"
        SELECT t.source AS tenant_source,
               COALESCE(t.target, '') AS tenant_target,
               c.source AS category_source,
               COALESCE(c.target, '') AS category_target,
               p.source AS product_source,
               COALESCE(p.target, '') AS product_target,
               q.id::text AS query_id,
               q.name AS query_name,
               COALESCE(q.description, '') AS description,
               q.unit AS unit,
               p.amount::float8 AS price_per_unit,
               d.discount::float8 AS discount,
               SUM(f.quantity)::float8 AS quantity,
               MIN(f.quantity)::float8 AS quantity_min,
               AVG(f.quantity)::float8 AS quantity_avg,
               MAX(f.quantity)::float8 AS quantity_max
        FROM facts f
        INNER JOIN date_times dt ON dt.id = f.date_time_id
        INNER JOIN tenants t ON t.id = f.tenant_id
        INNER JOIN categories c ON c.id = f.category_id
        INNER JOIN products p ON p.id = f.product_id
        INNER JOIN discounts d ON d.id = f.discount_id
        INNER JOIN queries q ON q.id = f.query_id
        WHERE dt.year = $1
          AND dt.month = $2
          AND q.parent_id IS NULL
        GROUP BY t.source, t.target, c.source, c.target, p.source, p.target,
                 q.id, q.name, q.description, q.unit, p.amount, d.discount
        ORDER BY t.source, c.source, p.source, q.name
        "#
    )
    .bind(year)
    .bind(month as i32)
    .fetch_all(pool)
    .await
}

/// 聚合指定月份的子查询明细
pub async fn list_sub_items(
    pool: &PgPool,
    year: i32,
    month: u32,
) -> Result<Vec<SubItemRow>, sqlx::Error> {
    sqlx::query_as::<_, SubItemRow>(
        r#"
        SELECT t.source AS tenant_source,
               c.source AS category_source,
               p.source AS product_source,
               q.parent_id::text AS parent_query_id,
               q.name AS query_name,
               COALESCE(q.description, '') AS description,
               q.unit AS unit,
               SUM(f.quantity)::float8 AS quantity,
               MIN(f.quantity)::float8 AS quantity_min,
               AVG(f.quantity)::float8 AS quantity_avg,
               MAX(f.quantity)::float8 AS quantity_max
        FROM facts f
        INNER JOIN date_times dt ON dt.id = f.date_time_id
        INNER JOIN tenants t ON t.id = f.tenant_id
        INNER JOIN categories c ON c.id = f.category_id
        INNER JOIN products p ON p.id = f.product_id
        INNER JOIN queries q ON q.id = f.query_id
        WHERE dt.year = $1
          AND dt.month = $2
          AND q.parent_id IS NOT NULL
        GROUP BY t.source, c.source, p.source, q.parent_id, q.name, q.description, q.unit
        ORDER BY t.source, c.source, p.source, q.name
        "#
    )
    .bind(year)
    .bind(month as i32)
    .fetch_all(pool)
    .await
}
