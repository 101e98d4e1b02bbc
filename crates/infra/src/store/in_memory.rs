use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use stockbook_auth::User;
use stockbook_catalog::{Product, Supplier};
use stockbook_core::{ProductId, PurchaseId, SaleId, SupplierId};
use stockbook_ledger::{LedgerEntry, LedgerFilter, Purchase, Sale, apply_delta};

use super::{InventoryStore, StoreError, StoreResult, UnitOfWork};

/// Vectors are kept in insertion order; "newest first" reads walk them backwards.
#[derive(Debug, Default, Clone)]
struct State {
    products: HashMap<ProductId, Product>,
    suppliers: HashMap<SupplierId, Supplier>,
    purchases: Vec<Purchase>,
    sales: Vec<Sale>,
    ledger: Vec<LedgerEntry>,
    users: HashMap<String, User>,
}

/// In-memory store for tests/dev.
///
/// A unit of work holds the write lock until it is committed or dropped,
/// so writers are serialised and readers never see a half-applied change.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_name<T>(mut rows: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    rows.sort_by(|a, b| name(a).cmp(name(b)));
    rows
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, staged }))
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        let rows: Vec<Product> = self.state.read().await.products.values().cloned().collect();
        Ok(by_name(rows, |p| p.name.as_str()))
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.products.get(id).cloned()).collect())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(stored) = state.products.get_mut(&product.id) else {
            return Ok(false);
        };
        stored.name = product.name.clone();
        stored.description = product.description.clone();
        stored.updated_at = product.updated_at;
        Ok(true)
    }

    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.suppliers.contains_key(&supplier.id) {
            return Err(StoreError::Duplicate(format!("supplier {}", supplier.id)));
        }
        state.suppliers.insert(supplier.id, supplier.clone());
        Ok(())
    }

    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(stored) = state.suppliers.get_mut(&supplier.id) else {
            return Ok(false);
        };
        let balance = stored.balance;
        *stored = supplier.clone();
        stored.balance = balance;
        Ok(true)
    }

    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(self.state.read().await.suppliers.get(&id).cloned())
    }

    async fn suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let rows: Vec<Supplier> = self.state.read().await.suppliers.values().cloned().collect();
        Ok(by_name(rows, |s| s.name.as_str()))
    }

    async fn suppliers_by_ids(&self, ids: &[SupplierId]) -> StoreResult<Vec<Supplier>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.suppliers.get(id).cloned()).collect())
    }

    async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<Purchase>> {
        let state = self.state.read().await;
        Ok(state.purchases.iter().find(|p| p.id == id).cloned())
    }

    async fn purchases(
        &self,
        supplier_id: Option<SupplierId>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Purchase>> {
        let state = self.state.read().await;
        let mut rows: Vec<Purchase> = state
            .purchases
            .iter()
            .rev()
            .filter(|p| supplier_id.is_none_or(|id| p.supplier_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn sale(&self, id: SaleId) -> StoreResult<Option<Sale>> {
        let state = self.state.read().await;
        Ok(state.sales.iter().find(|s| s.id == id).cloned())
    }

    async fn sales(&self) -> StoreResult<Vec<Sale>> {
        let state = self.state.read().await;
        let mut rows: Vec<Sale> = state.sales.iter().rev().cloned().collect();
        rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(rows)
    }

    async fn ledger_entries(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        let mut rows: Vec<LedgerEntry> = state
            .ledger
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(rows)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(format!("username '{}'", user.username)));
        }
        state.users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(username).cloned())
    }
}

/// Works on a private copy of the state; commit swaps it in under the lock.
struct InMemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<State>,
    staged: State,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
        if self.staged.products.contains_key(&product.id) {
            return Err(StoreError::Duplicate(format!("product {}", product.id)));
        }
        self.staged.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn insert_purchase(&mut self, purchase: &Purchase) -> StoreResult<()> {
        self.staged.purchases.push(purchase.clone());
        Ok(())
    }

    async fn insert_sale(&mut self, sale: &Sale) -> StoreResult<()> {
        self.staged.sales.push(sale.clone());
        Ok(())
    }

    async fn adjust_stock(&mut self, id: ProductId, delta: Decimal) -> StoreResult<Option<Decimal>> {
        let Some(product) = self.staged.products.get_mut(&id) else {
            return Ok(None);
        };
        let Some(next) = apply_delta(product.stock_kilos, delta) else {
            return Ok(None);
        };
        product.stock_kilos = next;
        product.updated_at = Utc::now();
        Ok(Some(next))
    }

    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        self.staged.ledger.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
