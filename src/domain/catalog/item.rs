use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::CatalogError;

pub const MAX_DESCRIPTION_LEN: usize = 150;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    #[default]
    Available,
    NotAvailable,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Available => "AVAILABLE",
            Availability::NotAvailable => "NOT_AVAILABLE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "AVAILABLE" => Some(Availability::Available),
            "NOT_AVAILABLE" => Some(Availability::NotAvailable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub availability: Availability,
}

impl Item {
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }
}

/// Payload for creating an item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub availability: Availability,
}

impl NewItem {
    pub fn into_item(self) -> Result<Item, CatalogError> {
        let item = Item {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            availability: self.availability,
        };
        validate(&item)?;
        Ok(item)
    }
}

/// Partial update; absent fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub availability: Option<Availability>,
}

impl ItemPatch {
    pub fn apply(self, current: &Item) -> Result<Item, CatalogError> {
        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            next.description = Some(description);
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if let Some(availability) = self.availability {
            next.availability = availability;
        }
        validate(&next)?;
        Ok(next)
    }
}

fn validate(item: &Item) -> Result<(), CatalogError> {
    if item.name.is_empty() {
        return Err(CatalogError::BlankName);
    }
    if let Some(description) = &item.description {
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(CatalogError::DescriptionTooLong(len));
        }
    }
    if item.price < Decimal::ZERO {
        return Err(CatalogError::NegativePrice);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> NewItem {
        NewItem {
            name: "Widget".to_string(),
            description: Some("A widget".to_string()),
            price: Decimal::new(1999, 2),
            availability: Availability::Available,
        }
    }

    #[test]
    fn test_new_item_gets_fresh_id() {
        let a = widget().into_item().unwrap();
        let b = widget().into_item().unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.price, Decimal::new(1999, 2));
    }

    #[test]
    fn test_new_item_validation() {
        let mut blank = widget();
        blank.name = "   ".to_string();
        assert!(matches!(blank.into_item(), Err(CatalogError::BlankName)));

        let mut negative = widget();
        negative.price = Decimal::new(-1, 0);
        assert!(matches!(negative.into_item(), Err(CatalogError::NegativePrice)));

        let mut wordy = widget();
        wordy.description = Some("x".repeat(151));
        assert!(matches!(wordy.into_item(), Err(CatalogError::DescriptionTooLong(151))));
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let item = widget().into_item().unwrap();
        let patched = ItemPatch {
            availability: Some(Availability::NotAvailable),
            ..Default::default()
        }
        .apply(&item)
        .unwrap();

        assert_eq!(patched.id, item.id);
        assert_eq!(patched.name, "Widget");
        assert_eq!(patched.price, item.price);
        assert!(!patched.is_available());
    }

    #[test]
    fn test_availability_wire_format() {
        assert_eq!(
            serde_json::to_string(&Availability::NotAvailable).unwrap(),
            "\"NOT_AVAILABLE\""
        );
        assert_eq!(Availability::parse("AVAILABLE"), Some(Availability::Available));
        assert_eq!(Availability::parse("available"), None);
    }

    #[test]
    fn test_price_accepts_number_or_string() {
        let from_number: NewItem =
            serde_json::from_str(r#"{"name":"A","price":10}"#).unwrap();
        let from_string: NewItem =
            serde_json::from_str(r#"{"name":"A","price":"10.50"}"#).unwrap();

        assert_eq!(from_number.price, Decimal::from(10));
        assert_eq!(from_string.price, Decimal::new(1050, 2));
        assert_eq!(from_number.availability, Availability::Available);
    }
}
