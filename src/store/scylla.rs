use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use rust_decimal::Decimal;
use scylla::client::session::Session;
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlValue, Row};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::{CasOutcome, CatalogStore, OrderStore, StoreError};
use crate::domain::catalog::{Availability, Item};
use crate::domain::order::{Order, OrderLine, OrderStatus, PostalAddress};
use crate::health::{ComponentHealth, HealthCheck, HealthStatus};
use crate::utils::{CircuitBreaker, CircuitBreakerError};

// ============================================================================
// ScyllaDB Stores
// ============================================================================
//
// Orders are written exclusively through lightweight transactions so the
// version check and the write happen in one Paxos round. Lines are kept as
// JSON text and money as decimal text.
//
// ============================================================================

const ORDER_COLUMNS: &str =
    "id, user_id, items, status, total_price, postal_address, created_at, version";

const ITEM_COLUMNS: &str = "id, name, description, price, availability";

type OrderRow = (Uuid, Uuid, String, String, String, String, DateTime<Utc>, i64);

type ItemRow = (Uuid, String, Option<String>, String, String);

/// Run a driver call through the breaker. Conversion of the returned rows
/// happens outside, so unreadable data never trips the breaker.
async fn guarded<T, F>(breaker: &CircuitBreaker, operation: &'static str, call: F) -> Result<T, StoreError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match breaker.call(call).await {
        Ok(value) => Ok(value),
        Err(CircuitBreakerError::CircuitOpen) => {
            tracing::warn!(store = breaker.name(), operation, "Rejected by open circuit breaker");
            Err(StoreError::Unavailable { store: breaker.name() })
        }
        Err(CircuitBreakerError::OperationFailed(e)) => {
            tracing::error!(store = breaker.name(), operation, error = %e, "Store call failed");
            Err(StoreError::Backend(e))
        }
    }
}

/// Read the `[applied]` column of a lightweight transaction result
fn was_applied(result: QueryResult) -> anyhow::Result<bool> {
    let rows = result.into_rows_result()?;
    let first = rows.maybe_first_row::<Row>()?;

    let applied = first
        .and_then(|row| row.columns.into_iter().next())
        .flatten();
    Ok(matches!(applied, Some(CqlValue::Boolean(true))))
}

fn cas(applied: bool) -> CasOutcome {
    if applied {
        CasOutcome::Applied
    } else {
        CasOutcome::Conflict
    }
}

fn version_to_cql(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version)
        .map_err(|_| StoreError::Backend(anyhow::anyhow!("Order version {} out of range", version)))
}

fn order_to_row(order: &Order) -> Result<OrderRow, StoreError> {
    let items = serde_json::to_string(&order.items)
        .map_err(|e| StoreError::Backend(anyhow::Error::new(e).context("Serialising order lines")))?;

    Ok((
        order.id,
        order.user_id,
        items,
        order.status.as_str().to_string(),
        order.total_price.to_string(),
        order.postal_address.as_str().to_string(),
        order.created_at,
        version_to_cql(order.version)?,
    ))
}

fn order_from_row(row: OrderRow) -> Result<Order, StoreError> {
    let (id, user_id, items, status, total_price, postal_address, created_at, version) = row;
    let corrupt = |reason: String| StoreError::Corrupt { id, reason };

    let items: Vec<OrderLine> =
        serde_json::from_str(&items).map_err(|e| corrupt(format!("items: {}", e)))?;
    let status = OrderStatus::parse(&status).ok_or_else(|| corrupt(format!("status: {}", status)))?;
    let total_price: Decimal = total_price
        .parse()
        .map_err(|e| corrupt(format!("total_price: {}", e)))?;
    let postal_address =
        PostalAddress::parse(&postal_address).map_err(|_| corrupt("blank postal_address".to_string()))?;
    let version = u64::try_from(version).map_err(|_| corrupt(format!("version: {}", version)))?;

    Ok(Order {
        id,
        user_id,
        items,
        status,
        total_price,
        postal_address,
        created_at,
        version,
    })
}

fn item_to_row(item: &Item) -> ItemRow {
    (
        item.id,
        item.name.clone(),
        item.description.clone(),
        item.price.to_string(),
        item.availability.as_str().to_string(),
    )
}

fn item_from_row(row: ItemRow) -> Result<Item, StoreError> {
    let (id, name, description, price, availability) = row;
    let corrupt = |reason: String| StoreError::Corrupt { id, reason };

    Ok(Item {
        id,
        name,
        description,
        price: price.parse().map_err(|e| corrupt(format!("price: {}", e)))?,
        availability: Availability::parse(&availability)
            .ok_or_else(|| corrupt(format!("availability: {}", availability)))?,
    })
}

// ============================================================================
// Orders
// ============================================================================

pub struct ScyllaOrderStore {
    session: Arc<Session>,
    breaker: CircuitBreaker,
}

impl ScyllaOrderStore {
    pub fn new(session: Arc<Session>, breaker: CircuitBreaker) -> Self {
        Self { session, breaker }
    }
}

#[async_trait]
impl OrderStore for ScyllaOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let row = order_to_row(order)?;
        let query = format!(
            "INSERT INTO orders ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS",
            ORDER_COLUMNS
        );

        let applied = guarded(&self.breaker, "insert", async {
            let result = self.session.query_unpaged(query, row).await?;
            was_applied(result)
        })
        .await?;

        if !applied {
            return Err(StoreError::DuplicateId(order.id));
        }
        tracing::debug!(order_id = %order.id, "Order inserted");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let query = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);

        let row = guarded(&self.breaker, "get", async {
            let result = self.session.query_unpaged(query, (id,)).await?;
            let rows = result.into_rows_result()?;
            Ok::<_, anyhow::Error>(rows.maybe_first_row::<OrderRow>()?)
        })
        .await?;

        row.map(order_from_row).transpose()
    }

    async fn replace(&self, order: &Order, expected_version: u64) -> Result<CasOutcome, StoreError> {
        let (id, user_id, items, status, total_price, postal_address, _, version) = order_to_row(order)?;
        let expected = version_to_cql(expected_version)?;

        let applied = guarded(&self.breaker, "replace", async {
            let result = self
                .session
                .query_unpaged(
                    "UPDATE orders SET user_id = ?, items = ?, status = ?, total_price = ?, \
                     postal_address = ?, version = ? WHERE id = ? IF version = ?",
                    (user_id, items, status, total_price, postal_address, version, id, expected),
                )
                .await?;
            was_applied(result)
        })
        .await?;

        Ok(cas(applied))
    }

    async fn delete_if(&self, id: Uuid, expected_version: u64) -> Result<CasOutcome, StoreError> {
        let expected = version_to_cql(expected_version)?;

        let applied = guarded(&self.breaker, "delete_if", async {
            let result = self
                .session
                .query_unpaged("DELETE FROM orders WHERE id = ? IF version = ?", (id, expected))
                .await?;
            was_applied(result)
        })
        .await?;

        Ok(cas(applied))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        guarded(&self.breaker, "delete", async {
            let result = self
                .session
                .query_unpaged("DELETE FROM orders WHERE id = ? IF EXISTS", (id,))
                .await?;
            was_applied(result)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let query = format!("SELECT {} FROM orders", ORDER_COLUMNS);

        let rows: Vec<OrderRow> = guarded(&self.breaker, "list", async {
            let pager = self.session.query_iter(query, ()).await?;
            let rows: Vec<OrderRow> = pager.rows_stream::<OrderRow>()?.try_collect().await?;
            Ok::<_, anyhow::Error>(rows)
        })
        .await?;

        let mut orders = rows
            .into_iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}

#[async_trait]
impl HealthCheck for ScyllaOrderStore {
    async fn check_health(&self) -> ComponentHealth {
        ComponentHealth::new("orders", HealthStatus::from_circuit(self.breaker.state().await))
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub struct ScyllaCatalogStore {
    session: Arc<Session>,
    breaker: CircuitBreaker,
}

impl ScyllaCatalogStore {
    pub fn new(session: Arc<Session>, breaker: CircuitBreaker) -> Self {
        Self { session, breaker }
    }
}

#[async_trait]
impl CatalogStore for ScyllaCatalogStore {
    async fn get(&self, id: Uuid) -> Result<Option<Item>, StoreError> {
        let query = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);

        let row = guarded(&self.breaker, "get_item", async {
            let result = self.session.query_unpaged(query, (id,)).await?;
            let rows = result.into_rows_result()?;
            Ok::<_, anyhow::Error>(rows.maybe_first_row::<ItemRow>()?)
        })
        .await?;

        row.map(item_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let query = format!("SELECT {} FROM items", ITEM_COLUMNS);

        let rows: Vec<ItemRow> = guarded(&self.breaker, "list_items", async {
            let pager = self.session.query_iter(query, ()).await?;
            let rows: Vec<ItemRow> = pager.rows_stream::<ItemRow>()?.try_collect().await?;
            Ok::<_, anyhow::Error>(rows)
        })
        .await?;

        let mut items = rows
            .into_iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn put(&self, item: &Item) -> Result<(), StoreError> {
        let query = format!("INSERT INTO items ({}) VALUES (?, ?, ?, ?, ?)", ITEM_COLUMNS);
        let row = item_to_row(item);

        guarded(&self.breaker, "put_item", async {
            self.session.query_unpaged(query, row).await?;
            Ok::<_, anyhow::Error>(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        guarded(&self.breaker, "delete_item", async {
            let result = self
                .session
                .query_unpaged("DELETE FROM items WHERE id = ? IF EXISTS", (id,))
                .await?;
            was_applied(result)
        })
        .await
    }
}

#[async_trait]
impl HealthCheck for ScyllaCatalogStore {
    async fn check_health(&self) -> ComponentHealth {
        ComponentHealth::new("catalog", HealthStatus::from_circuit(self.breaker.state().await))
    }
}
