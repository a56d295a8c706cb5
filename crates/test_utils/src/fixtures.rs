//! Test Fixtures
//!
//! Fixed values shared by tests. Everything is in SAR unless stated.

use chrono::NaiveDate;
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, Money, OperationMetadata};
use domain_sales::{ChargeType, SalesTaxCharge};

/// Money values
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn sar(amount: Decimal) -> Money {
        Money::new(amount, Currency::SAR)
    }

    /// Unit price of the default widget line
    pub fn widget_rate() -> Money {
        Self::sar(dec!(20))
    }

    /// Unit price of the default gadget line
    pub fn gadget_rate() -> Money {
        Self::sar(dec!(35.50))
    }
}

/// Dates
pub struct DateFixtures;

impl DateFixtures {
    /// Posting date of older fixture invoices
    pub fn early_posting() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
    }

    /// Posting date of newer fixture invoices
    pub fn late_posting() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
    }
}

/// Tax schedule rows
pub struct TaxFixtures;

impl TaxFixtures {
    pub const VAT_ACCOUNT: &'static str = "VAT 15% - AK";

    /// 15% VAT on the net total
    pub fn vat_15() -> SalesTaxCharge {
        SalesTaxCharge::new(ChargeType::OnNetTotal, Self::VAT_ACCOUNT, dec!(15), Currency::SAR)
            .with_description("VAT 15%")
    }

    /// 2% levy on the net total, not matching the VAT marker
    pub fn municipal_levy() -> SalesTaxCharge {
        SalesTaxCharge::new(ChargeType::OnNetTotal, "Municipal Levy - AK", dec!(2), Currency::SAR)
    }
}

/// Names and callers
pub struct PartyFixtures;

impl PartyFixtures {
    pub const COMPANY: &'static str = "Acme KSA";
    pub const CLERK: &'static str = "clerk@acme.sa";

    pub fn customer() -> CustomerId {
        CustomerId::new_v7()
    }

    /// A random company name for tests that do not care which
    pub fn random_company() -> String {
        CompanyName().fake()
    }

    /// Metadata of an authenticated caller
    pub fn caller() -> OperationMetadata {
        OperationMetadata::for_caller(Self::CLERK)
    }
}
