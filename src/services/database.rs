//! Database service for pos-service.

use crate::error::AppError;
use crate::models::{LineItem, Product};
use crate::services::metrics::{DB_QUERY_DURATION, ORDERS_CREATED_TOTAL};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "pos-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Order Operations
    // =========================================================================

    /// Persist an order header plus its line items in one transaction.
    ///
    /// Validation runs before the first write. Any failure after `begin`
    /// drops the transaction, so readers never observe a header without its
    /// items or a partial item list.
    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn create_order(
        &self,
        items: &[LineItem],
        payment_method: &str,
    ) -> Result<Uuid, AppError> {
        if items.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("No items")));
        }
        if items.iter().any(|line| line.quantity < 1) {
            return Err(AppError::BadRequest(anyhow::anyhow!("Invalid quantity")));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let total_amount = items
            .iter()
            .map(LineItem::line_total)
            .sum::<Decimal>()
            .round_dp(2);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO orders (total_amount, payment_method)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(total_amount)
        .bind(payment_method)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create order: {}", e)))?;

        for line in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create order: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        ORDERS_CREATED_TOTAL
            .with_label_values(&[payment_method])
            .inc();
        info!(
            order_id = %order_id,
            item_count = items.len(),
            total_amount = %total_amount,
            "Order created"
        );

        Ok(order_id)
    }

    // =========================================================================
    // Product Operations
    // =========================================================================

    /// Get a product by ID.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn find_product(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price, cost, is_active, image_url, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// List products, newest first, capped at 500 rows.
    #[instrument(skip(self))]
    pub async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price, cost, is_active, image_url, created_at
            FROM products
            WHERE ($1 = FALSE OR is_active = TRUE)
            ORDER BY created_at DESC
            LIMIT 500
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }
}
