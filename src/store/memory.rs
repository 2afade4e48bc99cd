use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CasOutcome, CatalogStore, OrderStore, StoreError};
use crate::domain::catalog::Item;
use crate::domain::order::Order;
use crate::health::{ComponentHealth, HealthCheck, HealthStatus};

/// Process-local order documents. The write lock makes each CAS atomic.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateId(order.id));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn replace(&self, order: &Order, expected_version: u64) -> Result<CasOutcome, StoreError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = order.clone();
                Ok(CasOutcome::Applied)
            }
            _ => Ok(CasOutcome::Conflict),
        }
    }

    async fn delete_if(&self, id: Uuid, expected_version: u64) -> Result<CasOutcome, StoreError> {
        let mut orders = self.orders.write().await;
        match orders.get(&id) {
            Some(stored) if stored.version == expected_version => {
                orders.remove(&id);
                Ok(CasOutcome::Applied)
            }
            _ => Ok(CasOutcome::Conflict),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}

#[async_trait]
impl HealthCheck for InMemoryOrderStore {
    async fn check_health(&self) -> ComponentHealth {
        ComponentHealth::new("orders", HealthStatus::Healthy)
    }
}

#[derive(Default)]
pub struct InMemoryCatalogStore {
    items: RwLock<HashMap<Uuid, Item>>,
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get(&self, id: Uuid) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Item>, StoreError> {
        let mut items: Vec<Item> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn put(&self, item: &Item) -> Result<(), StoreError> {
        self.items.write().await.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.items.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl HealthCheck for InMemoryCatalogStore {
    async fn check_health(&self) -> ComponentHealth {
        ComponentHealth::new("catalog", HealthStatus::Healthy)
    }
}
