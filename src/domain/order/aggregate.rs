use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::value_objects::{OrderLine, OrderStatus, PostalAddress};

// ============================================================================
// Order Document - Domain Logic
// ============================================================================
//
// Transitions are pure: they take the current document and a command and
// return the next document (or `Drained` when the last line went away). The
// engine owns loading, pricing and the conditional write.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub user_id: Uuid,

    // Cart
    pub items: Vec<OrderLine>,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub postal_address: PostalAddress,

    // Audit
    pub created_at: DateTime<Utc>,

    /// Concurrency token, bumped by every committed transition
    pub version: u64,
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTransition {
    Updated(Order),
    /// The last unit of the last line was removed
    Drained,
}

impl Order {
    /// A new draft holding a single line
    pub fn open_draft(
        user_id: Uuid,
        item_id: Uuid,
        quantity: u32,
        unit_price: Decimal,
        postal_address: PostalAddress,
    ) -> Result<Self, OrderError> {
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            items: vec![OrderLine { item_id, quantity }],
            status: OrderStatus::None,
            total_price: line_total(unit_price, quantity)?,
            postal_address,
            created_at: Utc::now(),
            version: 1,
        })
    }

    /// Open to cart edits (add, remove, address, confirm)
    pub fn is_draft_open(&self) -> bool {
        self.status == OrderStatus::None
    }

    pub fn line(&self, item_id: Uuid) -> Option<&OrderLine> {
        self.items.iter().find(|line| line.item_id == item_id)
    }

    pub fn handle_command(&self, command: &OrderCommand) -> Result<OrderTransition, OrderError> {
        let mut next = self.clone();

        match command {
            OrderCommand::AddItem { item_id, quantity, unit_price } => {
                self.ensure_draft_open()?;

                match next.items.iter_mut().find(|line| line.item_id == *item_id) {
                    Some(line) => {
                        line.quantity = line
                            .quantity
                            .checked_add(*quantity)
                            .ok_or(OrderError::QuantityTooLarge(*item_id))?;
                    }
                    None => next.items.push(OrderLine {
                        item_id: *item_id,
                        quantity: *quantity,
                    }),
                }
                next.total_price = next
                    .total_price
                    .checked_add(line_total(*unit_price, *quantity)?)
                    .ok_or(OrderError::TotalTooLarge)?;
            }

            OrderCommand::RemoveUnit { item_id, unit_price } => {
                self.ensure_draft_open()?;

                let position = next
                    .items
                    .iter()
                    .position(|line| line.item_id == *item_id)
                    .ok_or(OrderError::LineNotFound(*item_id))?;

                if next.items[position].quantity > 1 {
                    next.items[position].quantity -= 1;
                } else {
                    next.items.remove(position);
                }

                if next.items.is_empty() {
                    return Ok(OrderTransition::Drained);
                }
                next.total_price = (next.total_price - *unit_price).max(Decimal::ZERO);
            }

            OrderCommand::SetPostalAddress { postal_address } => {
                self.ensure_draft_open()?;
                next.postal_address = postal_address.clone();
            }

            OrderCommand::Confirm => {
                self.ensure_draft_open()?;
                next.status = OrderStatus::Pending;
            }

            OrderCommand::Advance { target } => {
                if !target.is_admin_target() {
                    return Err(OrderError::InvalidTargetStatus(*target));
                }
                if self.status != OrderStatus::Pending {
                    return Err(OrderError::NotPending(self.status));
                }
                next.status = *target;
            }
        }

        next.version = self.version + 1;
        Ok(OrderTransition::Updated(next))
    }

    fn ensure_draft_open(&self) -> Result<(), OrderError> {
        if self.is_draft_open() {
            Ok(())
        } else {
            Err(OrderError::NotMutable(self.status))
        }
    }
}

fn line_total(unit_price: Decimal, quantity: u32) -> Result<Decimal, OrderError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(OrderError::TotalTooLarge)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> PostalAddress {
        PostalAddress::parse("12 Rue Haute, Lyon").unwrap()
    }

    fn draft(item_id: Uuid, quantity: u32, price: i64) -> Order {
        Order::open_draft(Uuid::new_v4(), item_id, quantity, Decimal::from(price), address()).unwrap()
    }

    fn updated(transition: OrderTransition) -> Order {
        match transition {
            OrderTransition::Updated(order) => order,
            OrderTransition::Drained => panic!("expected an updated order"),
        }
    }

    fn add(item_id: Uuid, quantity: u32, price: i64) -> OrderCommand {
        OrderCommand::AddItem {
            item_id,
            quantity,
            unit_price: Decimal::from(price),
        }
    }

    fn remove(item_id: Uuid, price: i64) -> OrderCommand {
        OrderCommand::RemoveUnit {
            item_id,
            unit_price: Decimal::from(price),
        }
    }

    #[test]
    fn test_open_draft() {
        let item = Uuid::new_v4();
        let order = draft(item, 2, 10);

        assert_eq!(order.status, OrderStatus::None);
        assert_eq!(order.items, vec![OrderLine { item_id: item, quantity: 2 }]);
        assert_eq!(order.total_price, Decimal::from(20));
        assert_eq!(order.version, 1);
        assert!(order.is_draft_open());
    }

    #[test]
    fn test_add_merges_existing_line() {
        let item = Uuid::new_v4();
        let order = draft(item, 2, 10);

        let order = updated(order.handle_command(&add(item, 1, 10)).unwrap());
        let order = updated(order.handle_command(&add(item, 4, 10)).unwrap());

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.line(item).unwrap().quantity, 7);
        assert_eq!(order.total_price, Decimal::from(70));
        assert_eq!(order.version, 3);
    }

    #[test]
    fn test_add_appends_new_line_in_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let order = draft(first, 1, 10);

        let order = updated(order.handle_command(&add(second, 3, 5)).unwrap());

        assert_eq!(order.items[0].item_id, first);
        assert_eq!(order.items[1], OrderLine { item_id: second, quantity: 3 });
        assert_eq!(order.total_price, Decimal::from(25));
    }

    #[test]
    fn test_totals_keep_price_at_time_of_change() {
        let item = Uuid::new_v4();
        let order = draft(item, 1, 10);

        // price went up between the two additions
        let order = updated(order.handle_command(&add(item, 1, 12)).unwrap());

        assert_eq!(order.total_price, Decimal::from(22));
    }

    #[test]
    fn test_remove_unit_decrements_then_removes_line() {
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        let order = draft(kept, 1, 10);
        let order = updated(order.handle_command(&add(dropped, 2, 5)).unwrap());

        let order = updated(order.handle_command(&remove(dropped, 5)).unwrap());
        assert_eq!(order.line(dropped).unwrap().quantity, 1);
        assert_eq!(order.total_price, Decimal::from(15));

        let order = updated(order.handle_command(&remove(dropped, 5)).unwrap());
        assert!(order.line(dropped).is_none());
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_price, Decimal::from(10));
    }

    #[test]
    fn test_remove_last_unit_drains() {
        let item = Uuid::new_v4();
        let order = draft(item, 1, 10);

        assert_eq!(order.handle_command(&remove(item, 10)).unwrap(), OrderTransition::Drained);
    }

    #[test]
    fn test_remove_clamps_total_at_zero() {
        let cheap = Uuid::new_v4();
        let order = draft(cheap, 2, 1);

        // catalog price rose above what was charged
        let order = updated(order.handle_command(&remove(cheap, 50)).unwrap());

        assert_eq!(order.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_remove_unknown_line() {
        let order = draft(Uuid::new_v4(), 1, 10);
        let missing = Uuid::new_v4();

        let result = order.handle_command(&remove(missing, 10));
        assert!(matches!(result, Err(OrderError::LineNotFound(id)) if id == missing));
    }

    #[test]
    fn test_confirm_closes_draft() {
        let item = Uuid::new_v4();
        let order = updated(draft(item, 1, 10).handle_command(&OrderCommand::Confirm).unwrap());

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_draft_open());

        let address = OrderCommand::SetPostalAddress { postal_address: address() };
        for command in [add(item, 1, 10), remove(item, 10), address, OrderCommand::Confirm] {
            assert!(matches!(
                order.handle_command(&command),
                Err(OrderError::NotMutable(OrderStatus::Pending))
            ));
        }
    }

    #[test]
    fn test_set_postal_address_changes_only_address() {
        let order = draft(Uuid::new_v4(), 1, 10);
        let moved = PostalAddress::parse("9 Elm Road").unwrap();

        let next = updated(
            order
                .handle_command(&OrderCommand::SetPostalAddress { postal_address: moved.clone() })
                .unwrap(),
        );

        assert_eq!(next.postal_address, moved);
        assert_eq!(next.items, order.items);
        assert_eq!(next.total_price, order.total_price);
        assert_eq!(next.status, order.status);
    }

    #[test]
    fn test_advance_requires_pending() {
        let order = draft(Uuid::new_v4(), 1, 10);
        let ship = OrderCommand::Advance { target: OrderStatus::Shipped };

        assert!(matches!(
            order.handle_command(&ship),
            Err(OrderError::NotPending(OrderStatus::None))
        ));

        let pending = updated(order.handle_command(&OrderCommand::Confirm).unwrap());
        let shipped = updated(pending.handle_command(&ship).unwrap());
        assert_eq!(shipped.status, OrderStatus::Shipped);

        // terminal: no further transitions
        let refund = OrderCommand::Advance { target: OrderStatus::Refunded };
        assert!(shipped.handle_command(&refund).is_err());
    }

    #[test]
    fn test_advance_rejects_non_terminal_targets() {
        let pending = updated(
            draft(Uuid::new_v4(), 1, 10)
                .handle_command(&OrderCommand::Confirm)
                .unwrap(),
        );

        for target in [OrderStatus::None, OrderStatus::Pending] {
            assert!(matches!(
                pending.handle_command(&OrderCommand::Advance { target }),
                Err(OrderError::InvalidTargetStatus(_))
            ));
        }
    }

    #[test]
    fn test_rejected_command_leaves_document_untouched() {
        let order = draft(Uuid::new_v4(), 1, 10);
        let before = order.clone();

        let _ = order.handle_command(&remove(Uuid::new_v4(), 10));
        assert_eq!(order, before);
    }

    #[test]
    fn test_merge_beyond_line_limit_is_rejected() {
        let item = Uuid::new_v4();
        let order = draft(item, u32::MAX - 10, 1);

        let result = order.handle_command(&add(item, u32::MAX - 10, 1));
        assert!(matches!(result, Err(OrderError::QuantityTooLarge(id)) if id == item));
        assert_eq!(result.unwrap_err().kind(), crate::domain::ErrorKind::Validation);

        // the largest line that still fits is accepted
        let order = updated(order.handle_command(&add(item, 10, 1)).unwrap());
        assert_eq!(order.line(item).unwrap().quantity, u32::MAX);
        assert_eq!(order.total_price, Decimal::from(u32::MAX));
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let item = Uuid::new_v4();
        let result = Order::open_draft(Uuid::new_v4(), item, 2, Decimal::MAX, address());
        assert!(matches!(result, Err(OrderError::TotalTooLarge)));

        let order = Order::open_draft(Uuid::new_v4(), item, 1, Decimal::MAX, address()).unwrap();
        let before = order.clone();
        let bump = OrderCommand::AddItem {
            item_id: Uuid::new_v4(),
            quantity: 1,
            unit_price: Decimal::ONE,
        };
        assert!(matches!(order.handle_command(&bump), Err(OrderError::TotalTooLarge)));
        assert_eq!(order, before);
    }

    #[test]
    fn test_json_shape() {
        let order = draft(Uuid::new_v4(), 2, 10);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["status"], "NONE");
        assert_eq!(json["totalPrice"], "20");
        assert_eq!(json["postalAddress"], "12 Rue Haute, Lyon");
        assert!(json["userId"].is_string());
        assert!(json["createdAt"].is_string());
        assert_eq!(json["items"][0]["quantity"], 2);
    }
}
