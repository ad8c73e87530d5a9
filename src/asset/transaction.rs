//! Transaction functions
//!
//! Clients invoke the registry by function name with positional string
//! arguments, e.g. `CreateAsset id car brand date location description`.
//! `Transaction` is the typed form of one such invocation.

use crate::error::{LedgerError, Result};

use super::Asset;

/// A parsed registry invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    InitLedger,
    CreateAsset(Asset),
    ReadAsset { id: String },
    UpdateAsset(Asset),
    DeleteAsset { id: String },
    AssetExists { id: String },
    GetAllAssets,
}

impl Transaction {
    /// Parse a function name and its arguments
    ///
    /// Names are matched exactly (`CreateAsset`, not `createasset`).
    pub fn parse<S: AsRef<str>>(function: &str, args: &[S]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        let expected = match function {
            "InitLedger" | "GetAllAssets" => 0,
            "ReadAsset" | "DeleteAsset" | "AssetExists" => 1,
            "CreateAsset" | "UpdateAsset" => 6,
            other => return Err(LedgerError::UnknownTransaction(other.to_string())),
        };

        if args.len() != expected {
            return Err(LedgerError::InvalidArguments {
                function: function.to_string(),
                expected,
                actual: args.len(),
            });
        }

        let tx = match (function, args.as_slice()) {
            ("InitLedger", []) => Transaction::InitLedger,
            ("GetAllAssets", []) => Transaction::GetAllAssets,
            ("ReadAsset", [id]) => Transaction::ReadAsset { id: id.to_string() },
            ("DeleteAsset", [id]) => Transaction::DeleteAsset { id: id.to_string() },
            ("AssetExists", [id]) => Transaction::AssetExists { id: id.to_string() },
            ("CreateAsset", [id, car, brand, date, location, description]) => {
                Transaction::CreateAsset(Asset::new(*id, *car, *brand, *date, *location, *description))
            }
            ("UpdateAsset", [id, car, brand, date, location, description]) => {
                Transaction::UpdateAsset(Asset::new(*id, *car, *brand, *date, *location, *description))
            }
            _ => return Err(LedgerError::UnknownTransaction(function.to_string())),
        };

        Ok(tx)
    }

    /// Function name as clients spell it
    pub fn name(&self) -> &'static str {
        match self {
            Transaction::InitLedger => "InitLedger",
            Transaction::CreateAsset(_) => "CreateAsset",
            Transaction::ReadAsset { .. } => "ReadAsset",
            Transaction::UpdateAsset(_) => "UpdateAsset",
            Transaction::DeleteAsset { .. } => "DeleteAsset",
            Transaction::AssetExists { .. } => "AssetExists",
            Transaction::GetAllAssets => "GetAllAssets",
        }
    }

    /// Evaluations that never change state
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Transaction::ReadAsset { .. } | Transaction::AssetExists { .. } | Transaction::GetAllAssets
        )
    }
}
