//! Ledger engine: the only code path that changes stock.
//!
//! Every purchase, sale and opening balance runs the same pipeline:
//!
//! ```text
//! request
//!   ↓
//! 1. Validate + price lines (pure, stockbook-ledger)
//!   ↓
//! 2. Resolve references / check stock (reads, before any write)
//!   ↓
//! 3. Unit of work: header + lines, then per line
//!    conditional stock update → ledger entry with the returned balance
//!   ↓
//! 4. Commit (or drop = roll back everything from this call)
//! ```
//!
//! The stock check in step 2 gives a friendly early error; the conditional
//! update in step 3 is what actually prevents overselling when two sales
//! race past step 2 together.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use stockbook_catalog::{NewProduct, Product};
use stockbook_core::{DomainError, ProductId};
use stockbook_ledger::{
    LedgerEntry, Movement, NewPurchase, NewSale, Purchase, Sale, ensure_available,
    requested_per_product,
};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{InventoryStore, UnitOfWork};

#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<dyn InventoryStore>,
}

impl LedgerEngine {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Record stock coming in from a supplier.
    #[instrument(skip(self, request), fields(supplier_id = %request.supplier_id, lines = request.items.len()), err)]
    pub async fn record_purchase(&self, request: NewPurchase) -> ServiceResult<Purchase> {
        let purchase = request.into_purchase(Utc::now())?;

        if self.store.supplier(purchase.supplier_id).await?.is_none() {
            return Err(DomainError::not_found(format!("supplier {}", purchase.supplier_id)).into());
        }
        for item in &purchase.items {
            self.require_product(item.product_id).await?;
        }

        let mut uow = self.store.begin().await?;
        uow.insert_purchase(&purchase).await?;
        let movement = Movement::Purchase(purchase.id);
        for item in &purchase.items {
            post(uow.as_mut(), movement, item.product_id, item.kilos, purchase.recorded_at).await?;
        }
        uow.commit().await?;

        info!(
            purchase_id = %purchase.id,
            lines = purchase.items.len(),
            total = %purchase.total,
            "purchase recorded"
        );
        Ok(purchase)
    }

    /// Record stock going out. Fails without side effects if any product
    /// lacks the requested quantity.
    #[instrument(skip(self, request), fields(lines = request.items.len()), err)]
    pub async fn record_sale(&self, request: NewSale) -> ServiceResult<Sale> {
        let sale = request.into_sale(Utc::now())?;
        let requested_totals = requested_per_product(&sale.items);

        for &(product_id, requested) in &requested_totals {
            let product = self.require_product(product_id).await?;
            if let Err(err) = ensure_available(&product.name, product.stock_kilos, requested) {
                warn!(%product_id, available = %product.stock_kilos, %requested, "sale rejected: insufficient stock");
                return Err(err.into());
            }
        }

        let mut uow = self.store.begin().await?;
        uow.insert_sale(&sale).await?;
        let movement = Movement::Sale(sale.id);
        // Kilos already taken per product by earlier lines of this sale.
        let mut taken: HashMap<ProductId, Decimal> = HashMap::new();
        for item in &sale.items {
            match post(uow.as_mut(), movement, item.product_id, item.kilos, sale.recorded_at).await {
                Ok(_) => *taken.entry(item.product_id).or_default() += item.kilos,
                Err(ServiceError::Domain(DomainError::InsufficientStock { product, available, .. })) => {
                    // Same figures as the pre-check: stock before this sale, total asked.
                    let available = available + taken.get(&item.product_id).copied().unwrap_or_default();
                    let requested = requested_totals
                        .iter()
                        .find(|(id, _)| *id == item.product_id)
                        .map_or(item.kilos, |&(_, total)| total);
                    warn!(product_id = %item.product_id, %available, %requested, "sale rejected: stock changed concurrently");
                    return Err(DomainError::insufficient_stock(product, available, requested).into());
                }
                Err(err) => return Err(err),
            }
        }
        uow.commit().await?;

        info!(
            sale_id = %sale.id,
            lines = sale.items.len(),
            total = %sale.total,
            "sale recorded"
        );
        Ok(sale)
    }

    /// Create a product, posting any opening stock as an `IN` entry in the
    /// same unit of work.
    #[instrument(skip(self, request), err)]
    pub async fn open_product(&self, request: NewProduct) -> ServiceResult<Product> {
        let (mut product, opening) = request.into_product(Utc::now())?;

        let mut uow = self.store.begin().await?;
        uow.insert_product(&product).await?;
        if opening > Decimal::ZERO {
            let entry = post(
                uow.as_mut(),
                Movement::Opening(product.id),
                product.id,
                opening,
                product.created_at,
            )
            .await?;
            product.stock_kilos = entry.balance_after;
        }
        uow.commit().await?;

        info!(product_id = %product.id, opening = %opening, "product created");
        Ok(product)
    }

    async fn require_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {id}")).into())
    }
}

/// Apply one movement and append its ledger entry with the resulting balance.
async fn post(
    uow: &mut dyn UnitOfWork,
    movement: Movement,
    product_id: ProductId,
    kilos: Decimal,
    at: DateTime<Utc>,
) -> ServiceResult<LedgerEntry> {
    let delta = movement.direction().signed(kilos);
    let Some(balance_after) = uow.adjust_stock(product_id, delta).await? else {
        let err = match uow.product(product_id).await? {
            Some(product) => {
                DomainError::insufficient_stock(product.name, product.stock_kilos, kilos)
            }
            None => DomainError::not_found(format!("product {product_id}")),
        };
        return Err(ServiceError::Domain(err));
    };

    let entry = LedgerEntry::record(movement, product_id, kilos, balance_after, at);
    uow.append_ledger_entry(&entry).await?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use stockbook_auth::User;
    use stockbook_catalog::{NewSupplier, Supplier};
    use stockbook_core::{PurchaseId, SaleId, SupplierId};
    use stockbook_ledger::{Direction, LedgerFilter, LineInput};

    use super::*;
    use crate::store::{InMemoryStore, StoreError, StoreResult};

    fn kg(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn line(product_id: ProductId, kilos: i64, price: i64) -> LineInput {
        LineInput {
            product_id,
            kilos: kg(kilos),
            unit_price: kg(price),
        }
    }

    async fn product(engine: &LedgerEngine, name: &str, stock: i64) -> Product {
        engine
            .open_product(NewProduct {
                name: name.to_string(),
                description: None,
                stock_kilos: Some(kg(stock)),
            })
            .await
            .unwrap()
    }

    async fn supplier(store: &dyn InventoryStore) -> Supplier {
        let supplier = NewSupplier {
            name: "Proveedor Central".to_string(),
            ..Default::default()
        }
        .into_supplier(Utc::now())
        .unwrap();
        store.insert_supplier(&supplier).await.unwrap();
        supplier
    }

    async fn stock(store: &dyn InventoryStore, id: ProductId) -> Decimal {
        store.product(id).await.unwrap().unwrap().stock_kilos
    }

    async fn entries_for(store: &dyn InventoryStore, id: ProductId) -> Vec<LedgerEntry> {
        let filter = LedgerFilter {
            product_id: Some(id),
            ..Default::default()
        };
        store.ledger_entries(&filter).await.unwrap()
    }

    fn setup() -> (Arc<InMemoryStore>, LedgerEngine) {
        let store = Arc::new(InMemoryStore::new());
        let engine = LedgerEngine::new(store.clone());
        (store, engine)
    }

    #[tokio::test]
    async fn sale_of_30kg_from_100kg_leaves_70kg() {
        let (store, engine) = setup();
        let arroz = product(&engine, "Arroz", 100).await;

        let sale = engine
            .record_sale(NewSale {
                items: vec![line(arroz.id, 30, 4000)],
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(sale.total, kg(120_000));
        assert_eq!(stock(store.as_ref(), arroz.id).await, kg(70));

        let entries = entries_for(store.as_ref(), arroz.id).await;
        assert_eq!(entries.len(), 2, "opening + sale");
        let out = &entries[0];
        assert_eq!(out.direction, Direction::Out);
        assert_eq!(out.kilos, kg(30));
        assert_eq!(out.balance_after, kg(70));
        assert_eq!(out.reference, format!("SALE-{}", sale.id));
    }

    #[tokio::test]
    async fn oversell_fails_without_side_effects() {
        let (store, engine) = setup();
        let azucar = product(&engine, "Azúcar", 10).await;

        let err = engine
            .record_sale(NewSale {
                items: vec![line(azucar.id, 15, 3000)],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InsufficientStock { product, available, requested })
                if product == "Azúcar" && *available == kg(10) && *requested == kg(15)
        ));
        assert_eq!(stock(store.as_ref(), azucar.id).await, kg(10));
        assert_eq!(entries_for(store.as_ref(), azucar.id).await.len(), 1);
        assert!(store.sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_lines_are_checked_together() {
        let (store, engine) = setup();
        let frijol = product(&engine, "Frijol", 10).await;

        let err = engine
            .record_sale(NewSale {
                items: vec![line(frijol.id, 6, 1), line(frijol.id, 6, 1)],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InsufficientStock { requested, .. }) if *requested == kg(12)
        ));
        assert_eq!(stock(store.as_ref(), frijol.id).await, kg(10));
    }

    #[tokio::test]
    async fn two_item_purchase_posts_two_in_entries() {
        let (store, engine) = setup();
        let a = product(&engine, "A", 0).await;
        let b = product(&engine, "B", 0).await;
        let s = supplier(store.as_ref()).await;

        let purchase = engine
            .record_purchase(NewPurchase {
                supplier_id: s.id,
                items: vec![line(a.id, 20, 100), line(b.id, 5, 200)],
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(purchase.total, kg(3000));
        assert_eq!(stock(store.as_ref(), a.id).await, kg(20));
        assert_eq!(stock(store.as_ref(), b.id).await, kg(5));

        let reference = format!("PURCHASE-{}", purchase.id);
        for (id, kilos) in [(a.id, 20), (b.id, 5)] {
            let entries = entries_for(store.as_ref(), id).await;
            assert_eq!(entries.len(), 1, "zero opening stock posts nothing");
            assert_eq!(entries[0].direction, Direction::In);
            assert_eq!(entries[0].kilos, kg(kilos));
            assert_eq!(entries[0].reference, reference);
        }
    }

    #[tokio::test]
    async fn same_product_twice_records_the_running_balance() {
        let (store, engine) = setup();
        let a = product(&engine, "A", 1).await;
        let s = supplier(store.as_ref()).await;

        engine
            .record_purchase(NewPurchase {
                supplier_id: s.id,
                items: vec![line(a.id, 2, 1), line(a.id, 3, 1)],
                notes: None,
            })
            .await
            .unwrap();

        let balances: Vec<Decimal> = entries_for(store.as_ref(), a.id)
            .await
            .into_iter()
            .rev()
            .map(|e| e.balance_after)
            .collect();
        assert_eq!(balances, vec![kg(1), kg(3), kg(6)]);
    }

    #[tokio::test]
    async fn purchase_with_unknown_references_is_not_found() {
        let (store, engine) = setup();
        let a = product(&engine, "A", 0).await;

        let err = engine
            .record_purchase(NewPurchase {
                supplier_id: SupplierId::new(),
                items: vec![line(a.id, 1, 1)],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(what)) if what.starts_with("supplier")));

        let s = supplier(store.as_ref()).await;
        let err = engine
            .record_purchase(NewPurchase {
                supplier_id: s.id,
                items: vec![line(a.id, 1, 1), line(ProductId::new(), 1, 1)],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound(what)) if what.starts_with("product")));
        assert_eq!(stock(store.as_ref(), a.id).await, kg(0));
        assert!(store.purchases(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn opening_stock_is_posted_as_in_entry() {
        let (store, engine) = setup();
        let arroz = product(&engine, "Arroz", 100).await;
        assert_eq!(arroz.stock_kilos, kg(100));

        let entries = entries_for(store.as_ref(), arroz.id).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, Direction::In);
        assert_eq!(entries[0].balance_after, kg(100));
        assert_eq!(entries[0].reference, format!("OPENING-{}", arroz.id));
    }

    #[tokio::test]
    async fn concurrent_sales_never_oversell() {
        let (store, engine) = setup();
        let arroz = product(&engine, "Arroz", 10).await;
        let arroz_id = arroz.id;

        let mut tasks = Vec::new();
        for _ in 0..25 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .record_sale(NewSale {
                        items: vec![line(arroz_id, 1, 4000)],
                        notes: None,
                    })
                    .await
            }));
        }

        let mut ok = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(err) => assert!(matches!(
                    err.as_domain(),
                    Some(DomainError::InsufficientStock { .. })
                )),
            }
        }

        assert_eq!(ok, 10);
        assert_eq!(stock(store.as_ref(), arroz.id).await, kg(0));
        let outs = entries_for(store.as_ref(), arroz.id)
            .await
            .into_iter()
            .filter(|e| e.direction == Direction::Out)
            .count();
        assert_eq!(outs, 10);
    }

    /// Delegates to an in-memory store but fails the Nth ledger append
    /// (0 = never) and can report a stale stock level on plain reads.
    struct FailingStore {
        inner: InMemoryStore,
        fail_on_append: usize,
        stale_stock: Option<Decimal>,
    }

    struct FailingUnitOfWork {
        inner: Box<dyn UnitOfWork>,
        appends: usize,
        fail_on_append: usize,
    }

    #[async_trait]
    impl UnitOfWork for FailingUnitOfWork {
        async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
            self.inner.product(id).await
        }
        async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
            self.inner.insert_product(product).await
        }
        async fn insert_purchase(&mut self, purchase: &Purchase) -> StoreResult<()> {
            self.inner.insert_purchase(purchase).await
        }
        async fn insert_sale(&mut self, sale: &Sale) -> StoreResult<()> {
            self.inner.insert_sale(sale).await
        }
        async fn adjust_stock(&mut self, id: ProductId, delta: Decimal) -> StoreResult<Option<Decimal>> {
            self.inner.adjust_stock(id, delta).await
        }
        async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
            self.appends += 1;
            if self.appends == self.fail_on_append {
                return Err(StoreError::CorruptRow("injected failure".to_string()));
            }
            self.inner.append_ledger_entry(entry).await
        }
        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.inner.commit().await
        }
    }

    #[async_trait]
    impl InventoryStore for FailingStore {
        async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
            Ok(Box::new(FailingUnitOfWork {
                inner: self.inner.begin().await?,
                appends: 0,
                fail_on_append: self.fail_on_append,
            }))
        }
        async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
            let product = self.inner.product(id).await?;
            Ok(product.map(|mut p| {
                if let Some(stale) = self.stale_stock {
                    p.stock_kilos = stale;
                }
                p
            }))
        }
        async fn products(&self) -> StoreResult<Vec<Product>> {
            self.inner.products().await
        }
        async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
            self.inner.products_by_ids(ids).await
        }
        async fn update_product(&self, product: &Product) -> StoreResult<bool> {
            self.inner.update_product(product).await
        }
        async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
            self.inner.insert_supplier(supplier).await
        }
        async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool> {
            self.inner.update_supplier(supplier).await
        }
        async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
            self.inner.supplier(id).await
        }
        async fn suppliers(&self) -> StoreResult<Vec<Supplier>> {
            self.inner.suppliers().await
        }
        async fn suppliers_by_ids(&self, ids: &[SupplierId]) -> StoreResult<Vec<Supplier>> {
            self.inner.suppliers_by_ids(ids).await
        }
        async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<Purchase>> {
            self.inner.purchase(id).await
        }
        async fn purchases(
            &self,
            supplier_id: Option<SupplierId>,
            limit: Option<usize>,
        ) -> StoreResult<Vec<Purchase>> {
            self.inner.purchases(supplier_id, limit).await
        }
        async fn sale(&self, id: SaleId) -> StoreResult<Option<Sale>> {
            self.inner.sale(id).await
        }
        async fn sales(&self) -> StoreResult<Vec<Sale>> {
            self.inner.sales().await
        }
        async fn ledger_entries(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>> {
            self.inner.ledger_entries(filter).await
        }
        async fn insert_user(&self, user: &User) -> StoreResult<()> {
            self.inner.insert_user(user).await
        }
        async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
            self.inner.user_by_username(username).await
        }
    }

    #[tokio::test]
    async fn failure_mid_purchase_rolls_back_every_write() {
        let inner = InMemoryStore::new();
        let seeding = LedgerEngine::new(Arc::new(inner.clone()));
        let a = product(&seeding, "A", 5).await;
        let b = product(&seeding, "B", 5).await;
        let s = supplier(&inner).await;

        let store = Arc::new(FailingStore {
            inner: inner.clone(),
            fail_on_append: 2,
            stale_stock: None,
        });
        let engine = LedgerEngine::new(store);

        let err = engine
            .record_purchase(NewPurchase {
                supplier_id: s.id,
                items: vec![line(a.id, 20, 100), line(b.id, 5, 200)],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::CorruptRow(_))));

        assert_eq!(stock(&inner, a.id).await, kg(5), "first increment discarded");
        assert_eq!(stock(&inner, b.id).await, kg(5));
        assert_eq!(entries_for(&inner, a.id).await.len(), 1, "only the opening entry");
        assert!(inner.purchases(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lost_race_reports_the_same_figures_as_the_pre_check() {
        let inner = InMemoryStore::new();
        let seeding = LedgerEngine::new(Arc::new(inner.clone()));
        let frijol = product(&seeding, "Frijol", 10).await;

        // Plain reads claim 100 kg so the pre-check passes; the unit of work sees 10 kg.
        let engine = LedgerEngine::new(Arc::new(FailingStore {
            inner: inner.clone(),
            fail_on_append: 0,
            stale_stock: Some(kg(100)),
        }));

        let err = engine
            .record_sale(NewSale {
                items: vec![line(frijol.id, 6, 1), line(frijol.id, 6, 1)],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_domain(),
            Some(DomainError::InsufficientStock { product, available, requested })
                if product == "Frijol" && *available == kg(10) && *requested == kg(12)
        ));
        assert_eq!(stock(&inner, frijol.id).await, kg(10));
        assert!(inner.sales().await.unwrap().is_empty());
    }
}
