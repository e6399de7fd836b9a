use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;

use super::invoice::{InvoiceCreator, InvoiceOptions};
use crate::db::queries;
use crate::error::ServiceError;
use crate::models::report::assemble_invoices;
use crate::models::BillingInvoice;

/// 账期 (自然月) 的起止日期
pub fn billing_period(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    let invalid = || ServiceError::InvalidPeriod { year, month };
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let end = next.pred_opt().ok_or_else(invalid)?;
    Ok((start, end))
}

/// 按月批量开票
#[derive(Clone)]
pub struct InvoiceRun {
    pool: PgPool,
    creator: InvoiceCreator,
    options: InvoiceOptions,
}

impl InvoiceRun {
    pub fn new(pool: PgPool, creator: InvoiceCreator, options: InvoiceOptions) -> Self {
        Self {
            pool,
            creator,
            options,
        }
    }

    /// 从报表库聚合指定月份的账单
    pub async fn generate(&self, year: i32, month: u32) -> Result<Vec<BillingInvoice>, ServiceError> {
        let (period_start, period_end) = billing_period(year, month)?;

        // 1. 顶层明细
        let rows = queries::list_invoice_items(&self.pool, year, month).await?;
        // 2. 子查询明细
        let sub_rows = queries::list_sub_items(&self.pool, year, month).await?;
        tracing::info!(
            "账期 {}-{:02}: {} 条明细, {} 条子明细",
            period_start.year(),
            period_start.month(),
            rows.len(),
            sub_rows.len()
        );

        // 3. 组装账单
        Ok(assemble_invoices(rows, sub_rows, period_start, period_end))
    }

    /// 生成并逐张创建发票, 返回 Odoo 发票 ID
    pub async fn run(&self, year: i32, month: u32) -> Result<Vec<i64>, ServiceError> {
        let invoices = self.generate(year, month).await?;
        tracing::info!("开始创建 {} 张发票", invoices.len());

        let mut created = Vec::with_capacity(invoices.len());
        for (idx, invoice) in invoices.iter().enumerate() {
            let remaining = invoices.len() - idx - 1;
            match self.creator.create_invoice(invoice, &self.options).await {
                Ok(id) => {
                    tracing::info!(
                        "Created invoice {} for tenant {} 剩余 {}",
                        id,
                        invoice.tenant.source,
                        remaining
                    );
                    created.push(id);
                }
                Err(e) => {
                    tracing::error!(
                        "creating invoice for tenant {} failed (odoo invoice {:?}): {}",
                        invoice.tenant.source,
                        e.invoice_id(),
                        e
                    );
                    return Err(e.into());
                }
            }
        }

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_covers_calendar_month() {
        assert_eq!(
            billing_period(2021, 12).unwrap(),
            (
                NaiveDate::from_ymd_opt(2021, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
            )
        );
        assert_eq!(
            billing_period(2024, 2).unwrap().1,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn invalid_month_is_rejected() {
        for month in [0, 13] {
            assert!(matches!(
                billing_period(2022, month),
                Err(ServiceError::InvalidPeriod { .. })
            ));
        }
    }
}
