//! PostgreSQL Order Store
//!
//! Connection pooling with deadpool-postgres. One order spans four tables
//! (orders, deliveries, payments, products) and is written in a single
//! transaction; reads rebuild the aggregate with jsonb sub-selects.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use serde_json::Value as JsonValue;
use tokio_postgres::{NoTls, Row};
use tracing::{info, warn};

use crate::config::DbConfig;
use crate::error::{OrderError, Result};
use crate::order::{Delivery, Order, OrderRepository, Payment, Product};

// == Schema ==
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    order_uid          TEXT PRIMARY KEY,
    track_number       TEXT NOT NULL,
    entry              TEXT NOT NULL,
    locale             TEXT NOT NULL,
    internal_signature TEXT NOT NULL DEFAULT '',
    customer_id        TEXT NOT NULL,
    delivery_service   TEXT NOT NULL,
    shardkey           TEXT NOT NULL,
    sm_id              INTEGER NOT NULL,
    date_created       TIMESTAMPTZ NOT NULL,
    oof_shard          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS orders_date_created_idx ON orders (date_created DESC);
CREATE INDEX IF NOT EXISTS orders_track_number_idx ON orders (track_number);

CREATE TABLE IF NOT EXISTS deliveries (
    order_uid TEXT PRIMARY KEY REFERENCES orders (order_uid) ON DELETE CASCADE,
    name      TEXT NOT NULL,
    phone     TEXT NOT NULL,
    zip       TEXT NOT NULL,
    city      TEXT NOT NULL,
    address   TEXT NOT NULL,
    region    TEXT NOT NULL,
    email     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    order_uid     TEXT PRIMARY KEY REFERENCES orders (order_uid) ON DELETE CASCADE,
    transaction   TEXT NOT NULL,
    request_id    TEXT NOT NULL DEFAULT '',
    currency      TEXT NOT NULL,
    provider      TEXT NOT NULL,
    amount        INTEGER NOT NULL,
    payment_dt    BIGINT NOT NULL,
    bank          TEXT NOT NULL,
    delivery_cost INTEGER NOT NULL,
    goods_total   INTEGER NOT NULL,
    custom_fee    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS products (
    id           BIGSERIAL PRIMARY KEY,
    chrt_id      INTEGER NOT NULL,
    track_number TEXT NOT NULL,
    price        INTEGER NOT NULL,
    rid          TEXT NOT NULL,
    name         TEXT NOT NULL,
    sale         INTEGER NOT NULL,
    size         TEXT NOT NULL,
    total_price  INTEGER NOT NULL,
    nm_id        INTEGER NOT NULL,
    brand        TEXT NOT NULL,
    status       INTEGER NOT NULL,
    UNIQUE (track_number, rid)
);
"#;

// == Queries ==
const INSERT_ORDER: &str = "INSERT INTO orders (
        order_uid, track_number, entry, locale, internal_signature, customer_id,
        delivery_service, shardkey, sm_id, date_created, oof_shard
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) ON CONFLICT DO NOTHING";

const INSERT_DELIVERY: &str = "INSERT INTO deliveries (
        order_uid, name, phone, zip, city, address, region, email
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT DO NOTHING";

const INSERT_PAYMENT: &str = "INSERT INTO payments (
        order_uid, transaction, request_id, currency, provider, amount,
        payment_dt, bank, delivery_cost, goods_total, custom_fee
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) ON CONFLICT DO NOTHING";

const INSERT_PRODUCT: &str = "INSERT INTO products (
        chrt_id, track_number, price, rid, name, sale, size, total_price, nm_id, brand, status
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) ON CONFLICT DO NOTHING";

/// Columns shared by the point lookup and the listing query.
const SELECT_AGGREGATE: &str = "SELECT
        o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
        o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
        (SELECT to_jsonb(d) FROM deliveries d WHERE d.order_uid = o.order_uid) AS delivery,
        (SELECT to_jsonb(p) FROM payments p WHERE p.order_uid = o.order_uid) AS payment,
        COALESCE(
            (SELECT jsonb_agg(to_jsonb(pr) ORDER BY pr.id)
               FROM products pr WHERE pr.track_number = o.track_number),
            '[]'::jsonb
        ) AS items
    FROM orders o";

// == Repository ==
/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: Pool,
}

impl PgOrderRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds the pool and waits until a connection succeeds.
    ///
    /// Retries `config.retries` times with linear backoff; this is the only
    /// place connection failures are retried.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let pool = create_pool(config)?;
        let attempts = config.retries.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match pool.get().await {
                Ok(_) => {
                    info!(host = %config.host, db = %config.name, "connected to postgres");
                    return Ok(Self::new(pool));
                }
                Err(err) => {
                    warn!(attempt, attempts, error = %err, "failed to connect to postgres");
                    last_err = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(last_err
            .map(OrderError::from)
            .unwrap_or_else(|| OrderError::Unavailable("no connection attempts made".to_string())))
    }

    /// Creates the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }
}

fn create_pool(config: &DbConfig) -> Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.name.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(config.pool_size));

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| OrderError::Unavailable(format!("failed to create pool: {e}")))
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn save(&self, order: &Order) -> Result<()> {
        let mut client = self.pool.get().await?;
        // Dropping the transaction without commit rolls it back
        let tx = client.transaction().await?;

        tx.execute(
            INSERT_ORDER,
            &[
                &order.order_uid,
                &order.track_number,
                &order.entry,
                &order.locale,
                &order.internal_signature,
                &order.customer_id,
                &order.delivery_service,
                &order.shard_key,
                &order.sm_id,
                &order.date_created,
                &order.oof_shard,
            ],
        )
        .await?;

        let d = &order.delivery;
        tx.execute(
            INSERT_DELIVERY,
            &[
                &order.order_uid,
                &d.name,
                &d.phone,
                &d.zip,
                &d.city,
                &d.address,
                &d.region,
                &d.email,
            ],
        )
        .await?;

        let p = &order.payment;
        tx.execute(
            INSERT_PAYMENT,
            &[
                &order.order_uid,
                &p.transaction,
                &p.request_id,
                &p.currency,
                &p.provider,
                &p.amount,
                &p.payment_dt,
                &p.bank,
                &p.delivery_cost,
                &p.goods_total,
                &p.custom_fee,
            ],
        )
        .await?;

        if !order.products.is_empty() {
            let stmt = tx.prepare(INSERT_PRODUCT).await?;
            for item in &order.products {
                tx.execute(
                    &stmt,
                    &[
                        &item.chrt_id,
                        &item.track_number,
                        &item.price,
                        &item.rid,
                        &item.name,
                        &item.sale,
                        &item.size,
                        &item.total_price,
                        &item.nm_id,
                        &item.brand,
                        &item.status,
                    ],
                )
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, order_uid: &str) -> Result<Order> {
        let client = self.pool.get().await?;
        let query = format!("{SELECT_AGGREGATE} WHERE o.order_uid = $1");

        match client.query_opt(query.as_str(), &[&order_uid]).await? {
            Some(row) => order_from_row(&row),
            None => Err(OrderError::NotFound(order_uid.to_string())),
        }
    }

    async fn get_limit(&self, limit: usize) -> Result<Vec<Order>> {
        let client = self.pool.get().await?;
        let query = format!("{SELECT_AGGREGATE} ORDER BY o.date_created DESC LIMIT $1");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = client.query(query.as_str(), &[&limit]).await?;
        rows.iter().map(order_from_row).collect()
    }
}

// == Row Mapping ==
fn order_from_row(row: &Row) -> Result<Order> {
    let delivery: Option<JsonValue> = row.try_get("delivery")?;
    let payment: Option<JsonValue> = row.try_get("payment")?;
    let items: JsonValue = row.try_get("items")?;

    Ok(Order {
        order_uid: row.try_get("order_uid")?,
        track_number: row.try_get("track_number")?,
        entry: row.try_get("entry")?,
        delivery: decode_json::<Delivery>(delivery)?.unwrap_or_default(),
        payment: decode_json::<Payment>(payment)?.unwrap_or_default(),
        products: serde_json::from_value::<Vec<Product>>(items).map_err(internal)?,
        locale: row.try_get("locale")?,
        internal_signature: row.try_get("internal_signature")?,
        customer_id: row.try_get("customer_id")?,
        delivery_service: row.try_get("delivery_service")?,
        shard_key: row.try_get("shardkey")?,
        sm_id: row.try_get("sm_id")?,
        date_created: row.try_get("date_created")?,
        oof_shard: row.try_get("oof_shard")?,
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(value: Option<JsonValue>) -> Result<Option<T>> {
    value
        .map(serde_json::from_value::<T>)
        .transpose()
        .map_err(internal)
}

/// Stored rows that do not decode are a server-side fault, not bad input.
fn internal(err: serde_json::Error) -> OrderError {
    OrderError::Internal(format!("stored order could not be decoded: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_ignores_extra_columns() {
        let value = serde_json::json!({
            "order_uid": "o1",
            "name": "Test Testov",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "test@gmail.com"
        });

        let delivery: Delivery = decode_json(Some(value)).unwrap().unwrap();
        assert_eq!(delivery.city, "Kiryat Mozkin");
    }

    #[test]
    fn test_decode_json_missing_row() {
        let payment: Option<Payment> = decode_json(None).unwrap();
        assert!(payment.is_none());
    }

    #[test]
    fn test_decode_json_bad_shape_is_internal() {
        let err = decode_json::<Payment>(Some(serde_json::json!({"amount": "lots"}))).unwrap_err();
        assert!(matches!(err, OrderError::Internal(_)));
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() {
        // No server needed: deadpool only connects on first checkout
        let pool = create_pool(&DbConfig::default());
        assert!(pool.is_ok());
    }
}
