//! Read-only reporting queries, scoped to the business day in a configured
//! timezone. These back the assistant tools and the reports endpoints; they
//! never write.

use crate::error::AppError;
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgPool;
use tracing::instrument;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersCountReport {
    pub date: String,
    pub timezone: String,
    pub orders_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub date: String,
    pub timezone: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoffeeSoldReport {
    pub date: String,
    pub timezone: String,
    pub coffees_sold: i64,
}

// Serialized with the raw column names (`is_active`), matching what the
// assistant tools have always fed the model.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub count: usize,
    pub products: Vec<ProductSummary>,
}

/// Source of business-day statistics.
///
/// "Today" means the calendar date in the configured timezone, not UTC.
/// Completed orders are matched by status prefix since historical rows carry
/// both "complete" and "completed".
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn orders_count_today(&self) -> Result<OrdersCountReport, AppError>;
    async fn revenue_today(&self) -> Result<RevenueReport, AppError>;
    async fn coffee_sold_today(&self) -> Result<CoffeeSoldReport, AppError>;
    async fn products_by_category(&self, category: &str) -> Result<CategoryReport, AppError>;
}

/// Postgres-backed reporting.
#[derive(Clone)]
pub struct PgReports {
    pool: PgPool,
    timezone: String,
}

impl PgReports {
    pub fn new(pool: PgPool, timezone: String) -> Self {
        Self { pool, timezone }
    }
}

#[async_trait]
impl ReportSource for PgReports {
    #[instrument(skip(self))]
    async fn orders_count_today(&self) -> Result<OrdersCountReport, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["orders_count_today"])
            .start_timer();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM orders o
            WHERE (o.created_at AT TIME ZONE $1)::date = (NOW() AT TIME ZONE $1)::date
              AND o.status ILIKE 'complete%'
            "#,
        )
        .bind(&self.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count orders: {}", e)))?;

        timer.observe_duration();

        Ok(OrdersCountReport {
            date: "today".to_string(),
            timezone: self.timezone.clone(),
            orders_count: count,
        })
    }

    #[instrument(skip(self))]
    async fn revenue_today(&self) -> Result<RevenueReport, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["revenue_today"])
            .start_timer();

        let revenue = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(o.total_amount), 0)::numeric(10,2)
            FROM orders o
            WHERE (o.created_at AT TIME ZONE $1)::date = (NOW() AT TIME ZONE $1)::date
              AND o.status ILIKE 'complete%'
            "#,
        )
        .bind(&self.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to sum revenue: {}", e)))?;

        timer.observe_duration();

        Ok(RevenueReport {
            date: "today".to_string(),
            timezone: self.timezone.clone(),
            revenue,
        })
    }

    #[instrument(skip(self))]
    async fn coffee_sold_today(&self) -> Result<CoffeeSoldReport, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["coffee_sold_today"])
            .start_timer();

        let sold = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(oi.quantity), 0)::bigint
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE (o.created_at AT TIME ZONE $1)::date = (NOW() AT TIME ZONE $1)::date
              AND o.status ILIKE 'complete%'
              AND p.category ILIKE 'coffee'
            "#,
        )
        .bind(&self.timezone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count coffees sold: {}", e))
        })?;

        timer.observe_duration();

        Ok(CoffeeSoldReport {
            date: "today".to_string(),
            timezone: self.timezone.clone(),
            coffees_sold: sold,
        })
    }

    #[instrument(skip(self), fields(category = %category))]
    async fn products_by_category(&self, category: &str) -> Result<CategoryReport, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["products_by_category"])
            .start_timer();

        let products = sqlx::query_as::<_, ProductSummary>(
            r#"
            SELECT id, name, category, price, is_active
            FROM products
            WHERE category ILIKE $1
            ORDER BY name ASC
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list products by category: {}", e))
        })?;

        timer.observe_duration();

        Ok(CategoryReport {
            category: category.to_string(),
            count: products.len(),
            products,
        })
    }
}
