//! Read paths for transactions and the kardex, joined with their entities.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use stockbook_catalog::{Product, Supplier};
use stockbook_core::{DomainError, ProductId, PurchaseId, SaleId, SupplierId};
use stockbook_ledger::{LedgerFilter, LineItem, Purchase, Sale};

use crate::error::ServiceResult;
use crate::read_model::{LedgerEntryView, LineView, PurchaseView, SaleView};
use crate::store::{InventoryStore, StoreError};

#[derive(Clone)]
pub struct LedgerQuery {
    store: Arc<dyn InventoryStore>,
}

impl LedgerQuery {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Kardex entries matching `filter`, newest first, each with its product.
    pub async fn list_ledger_entries(&self, filter: &LedgerFilter) -> ServiceResult<Vec<LedgerEntryView>> {
        let entries = self.store.ledger_entries(filter).await?;
        let products = self.products(entries.iter().map(|e| e.product_id)).await?;
        entries
            .into_iter()
            .map(|entry| {
                let product = lookup(&products, entry.product_id)?;
                Ok(LedgerEntryView { entry, product })
            })
            .collect()
    }

    pub async fn list_purchases(&self) -> ServiceResult<Vec<PurchaseView>> {
        let purchases = self.store.purchases(None, None).await?;
        let products = self.products(purchases.iter().flat_map(|p| line_products(&p.items))).await?;
        let suppliers = self.suppliers(purchases.iter().map(|p| p.supplier_id)).await?;
        purchases
            .into_iter()
            .map(|p| join_purchase(p, &products, &suppliers))
            .collect()
    }

    pub async fn get_purchase(&self, id: PurchaseId) -> ServiceResult<PurchaseView> {
        let purchase = self
            .store
            .purchase(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("purchase {id}")))?;
        self.purchase_view(purchase).await
    }

    /// Attach supplier and products to a freshly recorded purchase.
    pub async fn purchase_view(&self, purchase: Purchase) -> ServiceResult<PurchaseView> {
        let products = self.products(line_products(&purchase.items)).await?;
        let suppliers = self.suppliers([purchase.supplier_id]).await?;
        join_purchase(purchase, &products, &suppliers)
    }

    pub async fn list_sales(&self) -> ServiceResult<Vec<SaleView>> {
        let sales = self.store.sales().await?;
        let products = self.products(sales.iter().flat_map(|s| line_products(&s.items))).await?;
        sales.into_iter().map(|s| join_sale(s, &products)).collect()
    }

    pub async fn get_sale(&self, id: SaleId) -> ServiceResult<SaleView> {
        let sale = self
            .store
            .sale(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("sale {id}")))?;
        self.sale_view(sale).await
    }

    pub async fn sale_view(&self, sale: Sale) -> ServiceResult<SaleView> {
        let products = self.products(line_products(&sale.items)).await?;
        join_sale(sale, &products)
    }

    /// Only the products referenced by `ids`, fetched in one round trip.
    async fn products(
        &self,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> ServiceResult<HashMap<ProductId, Product>> {
        let ids = distinct(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .store
            .products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }

    async fn suppliers(
        &self,
        ids: impl IntoIterator<Item = SupplierId>,
    ) -> ServiceResult<HashMap<SupplierId, Supplier>> {
        let ids = distinct(ids);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .store
            .suppliers_by_ids(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect())
    }
}

fn line_products(items: &[LineItem]) -> impl Iterator<Item = ProductId> + '_ {
    items.iter().map(|line| line.product_id)
}

fn distinct<K: std::hash::Hash + Eq>(ids: impl IntoIterator<Item = K>) -> Vec<K> {
    ids.into_iter().collect::<HashSet<_>>().into_iter().collect()
}

fn lookup<K, V>(rows: &HashMap<K, V>, key: K) -> ServiceResult<V>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
    V: Clone,
{
    rows.get(&key)
        .cloned()
        .ok_or_else(|| StoreError::CorruptRow(format!("dangling reference {key}")).into())
}

fn join_lines(items: Vec<LineItem>, products: &HashMap<ProductId, Product>) -> ServiceResult<Vec<LineView>> {
    items
        .into_iter()
        .map(|line| {
            let product = lookup(products, line.product_id)?;
            Ok(LineView { line, product })
        })
        .collect()
}

fn join_purchase(
    purchase: Purchase,
    products: &HashMap<ProductId, Product>,
    suppliers: &HashMap<SupplierId, Supplier>,
) -> ServiceResult<PurchaseView> {
    Ok(PurchaseView {
        id: purchase.id,
        supplier_id: purchase.supplier_id,
        supplier: lookup(suppliers, purchase.supplier_id)?,
        total: purchase.total,
        recorded_at: purchase.recorded_at,
        notes: purchase.notes,
        items: join_lines(purchase.items, products)?,
    })
}

fn join_sale(sale: Sale, products: &HashMap<ProductId, Product>) -> ServiceResult<SaleView> {
    Ok(SaleView {
        id: sale.id,
        total: sale.total,
        recorded_at: sale.recorded_at,
        notes: sale.notes,
        items: join_lines(sale.items, products)?,
    })
}
