use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::domain::policy::{authorize, is_allowed, Access};
use crate::domain::ErrorKind;
use crate::identity::Principal;
use crate::metrics::Metrics;
use crate::store::{CasOutcome, CatalogStore, OrderStore};
use crate::utils::{retry_on_transient, RetryConfig};

use super::aggregate::{Order, OrderTransition};
use super::commands::{AddItemInput, OrderCommand};
use super::errors::OrderError;
use super::value_objects::{positive_quantity, OrderStatus, PostalAddress};

// ============================================================================
// Order Engine
// ============================================================================
//
// Orchestrates: principal check → catalog pricing → document transition →
// conditional write.
//
// Each attempt re-reads the document and re-checks every precondition before
// writing with `expected_version`. A lost race surfaces as the transient
// `VersionConflict`, which `retry_on_transient` replays.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempts per mutation before a conflict is reported to the caller
    pub conflict_attempts: u32,
    /// Allow `list_all` without an admin principal
    pub public_listing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conflict_attempts: 8,
            public_listing: false,
        }
    }
}

/// Result of removing one unit of a line
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveUnitOutcome {
    Updated(Order),
    /// The order had no lines left and was deleted
    Deleted { order_id: Uuid },
}

pub struct OrderEngine {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    metrics: Arc<Metrics>,
    config: EngineConfig,
}

impl OrderEngine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogStore>,
        metrics: Arc<Metrics>,
        config: EngineConfig,
    ) -> Self {
        Self {
            orders,
            catalog,
            metrics,
            config,
        }
    }

    /// Merge an item into the caller's open draft, or open a new draft.
    pub async fn add_item(&self, principal: &Principal, input: AddItemInput) -> Result<Order, OrderError> {
        self.observe("add_item", self.try_add_item(principal, input)).await
    }

    pub async fn remove_unit(
        &self,
        principal: &Principal,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<RemoveUnitOutcome, OrderError> {
        self.observe("remove_unit", async {
            let unit_price = self
                .catalog
                .get(item_id)
                .await?
                .ok_or(OrderError::CatalogItemMissing(item_id))?
                .price;

            let command = OrderCommand::RemoveUnit { item_id, unit_price };
            self.transition("remove_unit", principal, order_id, Access::Owner, &command)
                .await
        })
        .await
    }

    pub async fn set_postal_address(
        &self,
        principal: &Principal,
        order_id: Uuid,
        postal_address: &str,
    ) -> Result<Order, OrderError> {
        self.observe("set_postal_address", async {
            let command = OrderCommand::SetPostalAddress {
                postal_address: PostalAddress::parse(postal_address)?,
            };
            let outcome = self
                .transition("set_postal_address", principal, order_id, Access::Owner, &command)
                .await?;
            updated(outcome)
        })
        .await
    }

    /// Owner moves an open draft to `PENDING`
    pub async fn confirm(&self, principal: &Principal, order_id: Uuid) -> Result<Order, OrderError> {
        self.observe("confirm", async {
            let outcome = self
                .transition("confirm", principal, order_id, Access::Owner, &OrderCommand::Confirm)
                .await?;
            updated(outcome)
        })
        .await
    }

    /// Admin moves a `PENDING` order to one of its final statuses
    pub async fn advance(
        &self,
        principal: &Principal,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, OrderError> {
        self.observe("advance", async {
            authorize(principal, Access::Admin)?;
            if !target.is_admin_target() {
                return Err(OrderError::InvalidTargetStatus(target));
            }

            let command = OrderCommand::Advance { target };
            let outcome = self
                .transition("advance", principal, order_id, |_| Access::Admin, &command)
                .await?;
            updated(outcome)
        })
        .await
    }

    pub async fn get_by_id(&self, principal: &Principal, order_id: Uuid) -> Result<Order, OrderError> {
        self.observe("get_by_id", async {
            let order = self.load(order_id).await?;
            authorize(principal, Access::OwnerOrAdmin(order.user_id))?;
            Ok::<_, OrderError>(order)
        })
        .await
    }

    /// Owner or admin; status does not matter
    pub async fn delete_order(&self, principal: &Principal, order_id: Uuid) -> Result<(), OrderError> {
        self.observe("delete_order", async {
            let order = self.load(order_id).await?;
            authorize(principal, Access::OwnerOrAdmin(order.user_id))?;

            if !self.orders.delete(order_id).await? {
                return Err(OrderError::OrderNotFound);
            }

            self.metrics.record_deletion("explicit");
            tracing::info!(
                order_id = %order_id,
                user_id = %principal.user_id,
                status = %order.status,
                "Order deleted"
            );
            Ok::<_, OrderError>(())
        })
        .await
    }

    /// Every order. Admin-only unless public listing is enabled.
    pub async fn list_all(&self, principal: Option<&Principal>) -> Result<Vec<Order>, OrderError> {
        self.observe("list_all", async {
            if !self.config.public_listing {
                let principal = principal.ok_or(OrderError::Unauthenticated)?;
                authorize(principal, Access::Admin)?;
            }
            Ok::<_, OrderError>(self.orders.list().await?)
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn try_add_item(&self, principal: &Principal, input: AddItemInput) -> Result<Order, OrderError> {
        let quantity = positive_quantity(input.quantity)?;
        let new_draft_address = || {
            input
                .postal_address
                .as_deref()
                .ok_or(OrderError::MissingPostalAddress)
                .and_then(PostalAddress::parse)
        };
        if input.order_id.is_none() {
            new_draft_address()?;
        }

        let item = self
            .catalog
            .get(input.item_id)
            .await?
            .ok_or(OrderError::UnknownItem(input.item_id))?;
        if !item.is_available() {
            return Err(OrderError::ItemUnavailable(item.id));
        }

        let command = OrderCommand::AddItem {
            item_id: item.id,
            quantity,
            unit_price: item.price,
        };

        if let Some(order_id) = input.order_id {
            if let Some(order) = self.merge_into_draft(principal, order_id, &command).await? {
                tracing::info!(
                    order_id = %order.id,
                    user_id = %principal.user_id,
                    item_id = %item.id,
                    quantity,
                    total = %order.total_price,
                    "Item merged into draft"
                );
                return Ok(order);
            }
        }

        let order = Order::open_draft(
            principal.user_id,
            item.id,
            quantity,
            item.price,
            new_draft_address()?,
        )?;
        self.orders.insert(&order).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %principal.user_id,
            item_id = %item.id,
            quantity,
            total = %order.total_price,
            "Draft order opened"
        );
        Ok(order)
    }

    /// `None` when there is no open draft of the caller's under `order_id`
    async fn merge_into_draft(
        &self,
        principal: &Principal,
        order_id: Uuid,
        command: &OrderCommand,
    ) -> Result<Option<Order>, OrderError> {
        self.with_conflict_retry(|| async move {
            let Some(order) = self.orders.get(order_id).await? else {
                return Ok(None);
            };
            if !is_allowed(principal, Access::Owner(order.user_id)) || !order.is_draft_open() {
                return Ok(None);
            }

            match order.handle_command(command)? {
                OrderTransition::Updated(next) => self.commit("add_item", &order, next).await.map(Some),
                OrderTransition::Drained => Err(OrderError::OrderNotFound),
            }
        })
        .await
    }

    /// Load, check access, apply `command` and write it back under CAS.
    async fn transition(
        &self,
        operation: &'static str,
        principal: &Principal,
        order_id: Uuid,
        access: fn(Uuid) -> Access,
        command: &OrderCommand,
    ) -> Result<RemoveUnitOutcome, OrderError> {
        let outcome = self
            .with_conflict_retry(|| async move {
                let order = self.load(order_id).await?;
                authorize(principal, access(order.user_id))?;

                match order.handle_command(command)? {
                    OrderTransition::Updated(next) => self
                        .commit(operation, &order, next)
                        .await
                        .map(RemoveUnitOutcome::Updated),
                    OrderTransition::Drained => match self.orders.delete_if(order.id, order.version).await? {
                        CasOutcome::Applied => {
                            self.metrics.record_deletion("drained");
                            Ok(RemoveUnitOutcome::Deleted { order_id })
                        }
                        CasOutcome::Conflict => Err(self.conflict(operation, order_id)),
                    },
                }
            })
            .await?;

        match &outcome {
            RemoveUnitOutcome::Updated(order) => tracing::info!(
                order_id = %order_id,
                user_id = %principal.user_id,
                operation,
                status = %order.status,
                total = %order.total_price,
                version = order.version,
                "Order updated"
            ),
            RemoveUnitOutcome::Deleted { .. } => tracing::info!(
                order_id = %order_id,
                user_id = %principal.user_id,
                operation,
                "Last line removed, order deleted"
            ),
        }
        Ok(outcome)
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders.get(order_id).await?.ok_or(OrderError::OrderNotFound)
    }

    async fn commit(&self, operation: &'static str, current: &Order, next: Order) -> Result<Order, OrderError> {
        match self.orders.replace(&next, current.version).await? {
            CasOutcome::Applied => Ok(next),
            CasOutcome::Conflict => Err(self.conflict(operation, current.id)),
        }
    }

    fn conflict(&self, operation: &'static str, order_id: Uuid) -> OrderError {
        self.metrics.record_conflict(operation);
        tracing::warn!(order_id = %order_id, operation, "Order changed underneath, retrying");
        OrderError::VersionConflict(order_id)
    }

    async fn with_conflict_retry<T, F, Fut>(&self, mut attempt: F) -> Result<T, OrderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OrderError>>,
    {
        let config = RetryConfig::for_conflicts(self.config.conflict_attempts);
        retry_on_transient(config, |_| attempt()).await.into_result()
    }

    async fn observe<T, Fut>(&self, operation: &'static str, work: Fut) -> Result<T, OrderError>
    where
        Fut: Future<Output = Result<T, OrderError>>,
    {
        let started = Instant::now();
        let result = work.await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => self.metrics.record_operation(operation, "ok", elapsed),
            Err(e) => {
                self.metrics.record_operation(operation, e.code(), elapsed);
                match e.kind() {
                    ErrorKind::Internal | ErrorKind::Unavailable => {
                        tracing::error!(operation, error = %e, "Order operation failed")
                    }
                    ErrorKind::Conflict => {
                        tracing::warn!(operation, error = %e, "Order operation gave up on conflicts")
                    }
                    _ => tracing::debug!(operation, code = e.code(), "Order operation rejected"),
                }
            }
        }
        result
    }
}

/// Only removal can delete; any other command always yields a document
fn updated(outcome: RemoveUnitOutcome) -> Result<Order, OrderError> {
    match outcome {
        RemoveUnitOutcome::Updated(order) => Ok(order),
        RemoveUnitOutcome::Deleted { .. } => Err(OrderError::OrderNotFound),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
