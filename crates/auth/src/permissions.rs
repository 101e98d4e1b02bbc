use serde::Serialize;

/// Capability checked at the operation boundary.
///
/// Handlers name the capability an operation needs; the role → capability
/// mapping lives in [`crate::authorize::capabilities_for`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// List/read products and suppliers.
    ReadCatalog,
    /// Create or update products and suppliers.
    ManageCatalog,
    /// Record purchases and sales, and read them back.
    RecordTransactions,
    /// Query the stock ledger (kardex).
    ReadLedger,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadCatalog => "catalog.read",
            Capability::ManageCatalog => "catalog.manage",
            Capability::RecordTransactions => "transactions.record",
            Capability::ReadLedger => "ledger.read",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
