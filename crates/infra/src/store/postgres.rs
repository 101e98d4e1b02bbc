//! Postgres-backed inventory store.
//!
//! Hand-written `sqlx` queries against the schema in `migrations/postgres`.
//! A unit of work is a database transaction; stock changes are a single
//! conditional `UPDATE ... RETURNING`, so concurrent sales serialise on the
//! product row and can never drive stock negative.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | any other | any | `Database { operation, .. }` |

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockbook_auth::{Role, User};
use stockbook_catalog::{Product, Supplier};
use stockbook_core::{ProductId, PurchaseId, SaleId, SupplierId, UserId};
use stockbook_ledger::{Direction, LedgerEntry, LedgerFilter, LineItem, Purchase, Sale};

use super::{InventoryStore, StoreError, StoreResult, UnitOfWork};

const PRODUCT_COLUMNS: &str = "id, name, description, stock_kilos, created_at, updated_at";
const SUPPLIER_COLUMNS: &str =
    "id, name, phone, email, address, balance, created_at, updated_at";
const LEDGER_COLUMNS: &str =
    "id, product_id, direction, kilos, balance_after, reference, notes, recorded_at";

/// Which line table a header's items live in.
#[derive(Debug, Clone, Copy)]
enum Lines {
    Purchase,
    Sale,
}

impl Lines {
    fn select_sql(self) -> &'static str {
        match self {
            Lines::Purchase => {
                "SELECT purchase_id AS header_id, product_id, kilos, unit_price, subtotal
                 FROM purchase_items WHERE purchase_id = ANY($1)
                 ORDER BY purchase_id, position"
            }
            Lines::Sale => {
                "SELECT sale_id AS header_id, product_id, kilos, unit_price, subtotal
                 FROM sale_items WHERE sale_id = ANY($1)
                 ORDER BY sale_id, position"
            }
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            Lines::Purchase => {
                "INSERT INTO purchase_items (purchase_id, position, product_id, kilos, unit_price, subtotal)
                 VALUES ($1, $2, $3, $4, $5, $6)"
            }
            Lines::Sale => {
                "INSERT INTO sale_items (sale_id, position, product_id, kilos, unit_price, subtotal)
                 VALUES ($1, $2, $3, $4, $5, $6)"
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_lines(
        &self,
        lines: Lines,
        header_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, Vec<LineItem>>> {
        let rows = sqlx::query(lines.select_sql())
            .bind(header_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_lines", e))?;

        let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        for row in rows {
            let header_id: Uuid = row.try_get("header_id").map_err(corrupt)?;
            grouped.entry(header_id).or_default().push(line_from_row(&row)?);
        }
        Ok(grouped)
    }

    async fn purchases_with_lines(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Purchase>> {
        let ids = header_ids(&rows)?;
        let mut lines = self.load_lines(Lines::Purchase, &ids).await?;
        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(corrupt)?;
                Ok(Purchase {
                    id: PurchaseId::from_uuid(id),
                    supplier_id: SupplierId::from_uuid(row.try_get("supplier_id").map_err(corrupt)?),
                    total: row.try_get("total").map_err(corrupt)?,
                    recorded_at: row.try_get("recorded_at").map_err(corrupt)?,
                    notes: row.try_get("notes").map_err(corrupt)?,
                    items: lines.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn sales_with_lines(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Sale>> {
        let ids = header_ids(&rows)?;
        let mut lines = self.load_lines(Lines::Sale, &ids).await?;
        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(corrupt)?;
                Ok(Sale {
                    id: SaleId::from_uuid(id),
                    total: row.try_get("total").map_err(corrupt)?,
                    recorded_at: row.try_get("recorded_at").map_err(corrupt)?,
                    notes: row.try_get("notes").map_err(corrupt)?,
                    items: lines.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn products_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("products_by_ids", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn insert_supplier(&self, supplier: &Supplier) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO suppliers ({SUPPLIER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.balance)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(())
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn update_supplier(&self, supplier: &Supplier) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE suppliers SET name = $2, phone = $3, email = $4, address = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_supplier", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("supplier", e))?;
        row.as_ref().map(supplier_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let rows =
            sqlx::query(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name ASC"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("suppliers", e))?;
        rows.iter().map(supplier_from_row).collect()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn suppliers_by_ids(&self, ids: &[SupplierId]) -> StoreResult<Vec<Supplier>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows =
            sqlx::query(&format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("suppliers_by_ids", e))?;
        rows.iter().map(supplier_from_row).collect()
    }

    #[instrument(skip(self), fields(purchase_id = %id), err)]
    async fn purchase(&self, id: PurchaseId) -> StoreResult<Option<Purchase>> {
        let rows = sqlx::query(
            "SELECT id, supplier_id, total, recorded_at, notes FROM purchases WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchase", e))?;
        Ok(self.purchases_with_lines(rows).await?.into_iter().next())
    }

    #[instrument(skip(self), err)]
    async fn purchases(
        &self,
        supplier_id: Option<SupplierId>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Purchase>> {
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = sqlx::query(
            "SELECT id, supplier_id, total, recorded_at, notes FROM purchases
             WHERE ($1::uuid IS NULL OR supplier_id = $1)
             ORDER BY recorded_at DESC, seq DESC
             LIMIT $2",
        )
        .bind(supplier_id.map(|id| *id.as_uuid()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchases", e))?;
        self.purchases_with_lines(rows).await
    }

    #[instrument(skip(self), fields(sale_id = %id), err)]
    async fn sale(&self, id: SaleId) -> StoreResult<Option<Sale>> {
        let rows = sqlx::query("SELECT id, total, recorded_at, notes FROM sales WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("sale", e))?;
        Ok(self.sales_with_lines(rows).await?.into_iter().next())
    }

    #[instrument(skip(self), err)]
    async fn sales(&self) -> StoreResult<Vec<Sale>> {
        let rows = sqlx::query(
            "SELECT id, total, recorded_at, notes FROM sales ORDER BY recorded_at DESC, seq DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sales", e))?;
        self.sales_with_lines(rows).await
    }

    #[instrument(skip(self), err)]
    async fn ledger_entries(&self, filter: &LedgerFilter) -> StoreResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_entries
             WHERE ($1::uuid IS NULL OR product_id = $1)
               AND ($2::timestamptz IS NULL OR recorded_at >= $2)
               AND ($3::timestamptz IS NULL OR recorded_at <= $3)
             ORDER BY recorded_at DESC, seq DESC"
        ))
        .bind(filter.product_id.map(|id| *id.as_uuid()))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("ledger_entries", e))?;
        rows.iter().map(ledger_entry_from_row).collect()
    }

    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id, username, password_hash, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(format!("username '{}'", user.username))
                } else {
                    map_sqlx_error("insert_user", e)
                }
            })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row =
            sqlx::query("SELECT id, username, password_hash, role FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("user_by_username", e))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

/// A unit of work backed by one database transaction. Dropping it rolls back.
struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn insert_lines(&mut self, lines: Lines, header_id: Uuid, items: &[LineItem]) -> StoreResult<()> {
        for (position, item) in items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::CorruptRow("too many line items".to_string()))?;
            sqlx::query(lines.insert_sql())
                .bind(header_id)
                .bind(position)
                .bind(item.product_id.as_uuid())
                .bind(item.kilos)
                .bind(item.unit_price)
                .bind(item.subtotal)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("insert_lines", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("uow_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.stock_kilos)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self, purchase), fields(purchase_id = %purchase.id), err)]
    async fn insert_purchase(&mut self, purchase: &Purchase) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO purchases (id, supplier_id, total, recorded_at, notes)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.supplier_id.as_uuid())
        .bind(purchase.total)
        .bind(purchase.recorded_at)
        .bind(&purchase.notes)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_purchase", e))?;
        self.insert_lines(Lines::Purchase, *purchase.id.as_uuid(), &purchase.items)
            .await
    }

    #[instrument(skip(self, sale), fields(sale_id = %sale.id), err)]
    async fn insert_sale(&mut self, sale: &Sale) -> StoreResult<()> {
        sqlx::query("INSERT INTO sales (id, total, recorded_at, notes) VALUES ($1, $2, $3, $4)")
            .bind(sale.id.as_uuid())
            .bind(sale.total)
            .bind(sale.recorded_at)
            .bind(&sale.notes)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sale", e))?;
        self.insert_lines(Lines::Sale, *sale.id.as_uuid(), &sale.items)
            .await
    }

    #[instrument(skip(self), err)]
    async fn adjust_stock(&mut self, id: ProductId, delta: Decimal) -> StoreResult<Option<Decimal>> {
        let row = sqlx::query(
            "UPDATE products SET stock_kilos = stock_kilos + $2, updated_at = now()
             WHERE id = $1 AND stock_kilos + $2 >= 0
             RETURNING stock_kilos",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("adjust_stock", e))?;
        row.map(|r| r.try_get("stock_kilos").map_err(corrupt))
            .transpose()
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id, product_id = %entry.product_id), err)]
    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO ledger_entries ({LEDGER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(entry.id.as_uuid())
        .bind(entry.product_id.as_uuid())
        .bind(entry.direction.as_str())
        .bind(entry.kilos)
        .bind(entry.balance_after)
        .bind(&entry.reference)
        .bind(&entry.notes)
        .bind(entry.recorded_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_ledger_entry", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::Duplicate(format!("{operation}: {err}"));
    }
    StoreError::Database {
        operation,
        source: err,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn corrupt(err: sqlx::Error) -> StoreError {
    StoreError::CorruptRow(err.to_string())
}

fn header_ids(rows: &[PgRow]) -> StoreResult<Vec<Uuid>> {
    rows.iter()
        .map(|row| row.try_get::<Uuid, _>("id").map_err(corrupt))
        .collect()
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        description: row.try_get("description").map_err(corrupt)?,
        stock_kilos: row.try_get("stock_kilos").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

fn supplier_from_row(row: &PgRow) -> StoreResult<Supplier> {
    Ok(Supplier {
        id: SupplierId::from_uuid(row.try_get("id").map_err(corrupt)?),
        name: row.try_get("name").map_err(corrupt)?,
        phone: row.try_get("phone").map_err(corrupt)?,
        email: row.try_get("email").map_err(corrupt)?,
        address: row.try_get("address").map_err(corrupt)?,
        balance: row.try_get("balance").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
        updated_at: row.try_get("updated_at").map_err(corrupt)?,
    })
}

fn line_from_row(row: &PgRow) -> StoreResult<LineItem> {
    Ok(LineItem {
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(corrupt)?),
        kilos: row.try_get("kilos").map_err(corrupt)?,
        unit_price: row.try_get("unit_price").map_err(corrupt)?,
        subtotal: row.try_get("subtotal").map_err(corrupt)?,
    })
}

fn ledger_entry_from_row(row: &PgRow) -> StoreResult<LedgerEntry> {
    let direction: String = row.try_get("direction").map_err(corrupt)?;
    Ok(LedgerEntry {
        id: row.try_get::<Uuid, _>("id").map_err(corrupt)?.into(),
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(corrupt)?),
        direction: Direction::parse(&direction)
            .ok_or_else(|| StoreError::CorruptRow(format!("unknown direction '{direction}'")))?,
        kilos: row.try_get("kilos").map_err(corrupt)?,
        balance_after: row.try_get("balance_after").map_err(corrupt)?,
        reference: row.try_get("reference").map_err(corrupt)?,
        notes: row.try_get("notes").map_err(corrupt)?,
        recorded_at: row.try_get("recorded_at").map_err(corrupt)?,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(corrupt)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(corrupt)?),
        username: row.try_get("username").map_err(corrupt)?,
        password_hash: row.try_get("password_hash").map_err(corrupt)?,
        role: Role::parse(&role)
            .ok_or_else(|| StoreError::CorruptRow(format!("unknown role '{role}'")))?,
    })
}
