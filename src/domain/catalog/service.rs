use std::sync::Arc;
use uuid::Uuid;

use crate::domain::policy::{authorize, Access};
use crate::identity::Principal;
use crate::store::CatalogStore;

use super::errors::CatalogError;
use super::item::{Item, ItemPatch, NewItem};

/// Admin-maintained catalog. Reads are public, writes need the admin role.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Item, CatalogError> {
        self.store.get(id).await?.ok_or(CatalogError::ItemNotFound(id))
    }

    pub async fn create(&self, principal: &Principal, new_item: NewItem) -> Result<Item, CatalogError> {
        authorize(principal, Access::Admin)?;

        let item = new_item.into_item()?;
        self.store.put(&item).await?;

        tracing::info!(item_id = %item.id, price = %item.price, "Catalog item created");
        Ok(item)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: ItemPatch,
    ) -> Result<Item, CatalogError> {
        authorize(principal, Access::Admin)?;

        let current = self.get(id).await?;
        let next = patch.apply(&current)?;
        self.store.put(&next).await?;

        if next.price != current.price {
            // Open drafts keep the totals they were priced at.
            tracing::info!(
                item_id = %id,
                old_price = %current.price,
                new_price = %next.price,
                "Catalog price changed"
            );
        }
        Ok(next)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), CatalogError> {
        authorize(principal, Access::Admin)?;

        if !self.store.delete(id).await? {
            return Err(CatalogError::ItemNotFound(id));
        }
        tracing::info!(item_id = %id, "Catalog item deleted");
        Ok(())
    }
}
