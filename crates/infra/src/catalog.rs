//! Catalog service: products and suppliers.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use stockbook_catalog::{NewProduct, NewSupplier, Product, ProductPatch, Supplier, SupplierPatch};
use stockbook_core::{DomainError, ProductId, SupplierId};

use crate::engine::LedgerEngine;
use crate::error::ServiceResult;
use crate::read_model::SupplierDetail;
use crate::store::InventoryStore;

/// How many purchases a supplier detail carries.
pub const RECENT_PURCHASES: usize = 10;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn InventoryStore>,
    engine: LedgerEngine,
}

impl CatalogService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            engine: LedgerEngine::new(store.clone()),
            store,
        }
    }

    /// Opening stock, if any, is posted through the ledger.
    pub async fn create_product(&self, request: NewProduct) -> ServiceResult<Product> {
        self.engine.open_product(request).await
    }

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.store.products().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {id}")).into())
    }

    #[instrument(skip(self, patch), err)]
    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> ServiceResult<Product> {
        let mut product = self.get_product(id).await?;
        product.apply(patch, Utc::now())?;
        if !self.store.update_product(&product).await? {
            return Err(DomainError::not_found(format!("product {id}")).into());
        }
        Ok(product)
    }

    #[instrument(skip(self, request), err)]
    pub async fn create_supplier(&self, request: NewSupplier) -> ServiceResult<Supplier> {
        let supplier = request.into_supplier(Utc::now())?;
        self.store.insert_supplier(&supplier).await?;
        info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn list_suppliers(&self) -> ServiceResult<Vec<Supplier>> {
        Ok(self.store.suppliers().await?)
    }

    /// Supplier plus its most recent purchases, newest first.
    pub async fn get_supplier(&self, id: SupplierId) -> ServiceResult<SupplierDetail> {
        let supplier = self.find_supplier(id).await?;
        let purchases = self.store.purchases(Some(id), Some(RECENT_PURCHASES)).await?;
        Ok(SupplierDetail { supplier, purchases })
    }

    /// Contact fields only; the balance is never written here.
    #[instrument(skip(self, patch), err)]
    pub async fn update_supplier(&self, id: SupplierId, patch: SupplierPatch) -> ServiceResult<Supplier> {
        let mut supplier = self.find_supplier(id).await?;
        supplier.apply(patch, Utc::now())?;
        if !self.store.update_supplier(&supplier).await? {
            return Err(DomainError::not_found(format!("supplier {id}")).into());
        }
        Ok(supplier)
    }

    async fn find_supplier(&self, id: SupplierId) -> ServiceResult<Supplier> {
        self.store
            .supplier(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("supplier {id}")).into())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use stockbook_ledger::{LineInput, NewPurchase};

    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, CatalogService) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), CatalogService::new(store))
    }

    #[tokio::test]
    async fn update_product_never_touches_stock() {
        let (_, catalog) = service();
        let product = catalog
            .create_product(NewProduct {
                name: "Arroz".to_string(),
                description: None,
                stock_kilos: Some(Decimal::new(100, 0)),
            })
            .await
            .unwrap();

        let updated = catalog
            .update_product(
                product.id,
                ProductPatch {
                    name: Some("Arroz Premium".to_string()),
                    description: Some("grano largo".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stock_kilos, Decimal::new(100, 0));
        let stored = catalog.get_product(product.id).await.unwrap();
        assert_eq!(stored.name, "Arroz Premium");
        assert_eq!(stored.description.as_deref(), Some("grano largo"));
        assert_eq!(stored.stock_kilos, Decimal::new(100, 0));
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (_, catalog) = service();
        let err = catalog.get_product(ProductId::new()).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
        let err = catalog.get_supplier(SupplierId::new()).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn supplier_detail_carries_ten_most_recent_purchases() {
        let (store, catalog) = service();
        let product = catalog
            .create_product(NewProduct {
                name: "Arroz".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let supplier = catalog
            .create_supplier(NewSupplier {
                name: "Proveedor Central".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let engine = LedgerEngine::new(store);
        let mut recorded = Vec::new();
        for kilos in 1..=12 {
            let purchase = engine
                .record_purchase(NewPurchase {
                    supplier_id: supplier.id,
                    items: vec![LineInput {
                        product_id: product.id,
                        kilos: Decimal::new(kilos, 0),
                        unit_price: Decimal::ONE,
                    }],
                    notes: None,
                })
                .await
                .unwrap();
            recorded.push(purchase.id);
        }

        let detail = catalog.get_supplier(supplier.id).await.unwrap();
        assert_eq!(detail.supplier.balance, Decimal::ZERO);
        let ids: Vec<_> = detail.purchases.iter().map(|p| p.id).collect();
        let expected: Vec<_> = recorded.iter().rev().take(RECENT_PURCHASES).copied().collect();
        assert_eq!(ids, expected);
    }
}
