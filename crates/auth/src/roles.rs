use serde::{Deserialize, Serialize};

/// Role carried by a user account and by every access token.
///
/// The wire form is upper-case (`"ADMIN"`, `"SECRETARIA"`), matching what the
/// frontend stores and the database column holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access, including catalog writes.
    Admin,
    /// Front-desk staff: reads and transaction recording.
    Secretaria,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Secretaria => "SECRETARIA",
        }
    }

    /// Parse the stored/wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "SECRETARIA" => Some(Role::Secretaria),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
