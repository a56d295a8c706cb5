//! Document identifiers
//!
//! Every ledger document and line gets its own UUID newtype. Ids are
//! generated as UUID v7 so they sort by creation time, and display with a
//! short document prefix (`SINV-...`, `CSR-...`) that doubles as the
//! document name shown to users.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! document_id {
    ($(#[$doc:meta])* $name:ident => $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a time-ordered identifier
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Document prefix used in names
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        /// Accepts both the prefixed name and a bare UUID
        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

document_id!(
    /// Customer billed on invoices and returns
    CustomerId => "CUST"
);
document_id!(
    /// Sales invoice, including credit notes
    SalesInvoiceId => "SINV"
);
document_id!(SalesInvoiceItemId => "SINVI");
document_id!(
    /// Delivery note, including delivery note returns
    DeliveryNoteId => "DN"
);
document_id!(DeliveryNoteItemId => "DNI");
document_id!(
    /// Combined sales return
    SalesReturnId => "CSR"
);
document_id!(ReturnLineId => "CSRI");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_carries_prefix() {
        let id = SalesInvoiceId::new_v7();
        assert!(id.to_string().starts_with("SINV-"));
    }

    #[test]
    fn test_prefixed_and_bare_forms_parse() {
        let original = SalesReturnId::new_v7();
        let from_name: SalesReturnId = original.to_string().parse().unwrap();
        let from_uuid: SalesReturnId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(from_name, original);
        assert_eq!(from_uuid, original);
    }

    #[test]
    fn test_wrong_prefix_is_rejected() {
        let invoice = SalesInvoiceId::new_v7().to_string();
        assert!(invoice.parse::<DeliveryNoteId>().is_err());
    }
}
