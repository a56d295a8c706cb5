//! Document status shared by every ledger document

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a ledger document
///
/// Numeric codes match the `docstatus` column: 0 draft, 1 submitted,
/// 2 cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Editable, does not affect the ledger
    Draft,
    /// Finalized and immutable
    Submitted,
    /// Reversed after submission
    Cancelled,
}

impl DocStatus {
    pub fn code(&self) -> i16 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
            DocStatus::Cancelled => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(DocStatus::Draft),
            1 => Some(DocStatus::Submitted),
            2 => Some(DocStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocStatus::Draft => "Draft",
            DocStatus::Submitted => "Submitted",
            DocStatus::Cancelled => "Cancelled",
        };
        write!(f, "{}", label)
    }
}
