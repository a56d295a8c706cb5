//! Delivery note aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, DeliveryNoteId, DeliveryNoteItemId, SalesReturnId};
use crate::error::SalesError;
use crate::status::DocStatus;

/// A delivery note, or a delivery note return when `is_return` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub id: DeliveryNoteId,
    pub company: String,
    pub customer: CustomerId,
    pub posting_date: NaiveDate,
    pub docstatus: DocStatus,
    pub is_return: bool,
    /// Delivery note whose stock movement this return reverses
    pub return_against: Option<DeliveryNoteId>,
    /// Combined sales return that generated this document
    pub combined_sales_return: Option<SalesReturnId>,
    pub items: Vec<DeliveryNoteItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryNote {
    pub fn new(company: impl Into<String>, customer: CustomerId, posting_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: DeliveryNoteId::new_v7(),
            company: company.into(),
            customer,
            posting_date,
            docstatus: DocStatus::Draft,
            is_return: false,
            return_against: None,
            combined_sales_return: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a draft return reversing `original`
    pub fn new_return_against(original: &DeliveryNote, posting_date: NaiveDate) -> Self {
        let mut note = Self::new(original.company.clone(), original.customer, posting_date);
        note.is_return = true;
        note.return_against = Some(original.id);
        note
    }

    pub fn name(&self) -> String {
        self.id.to_string()
    }

    pub fn add_item(&mut self, mut item: DeliveryNoteItem) {
        item.idx = self.items.len() as u32 + 1;
        self.items.push(item);
        self.updated_at = Utc::now();
    }

    pub fn item(&self, id: DeliveryNoteItemId) -> Option<&DeliveryNoteItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn submit(&mut self) -> Result<(), SalesError> {
        if self.items.is_empty() {
            return Err(SalesError::EmptyDocument(self.name()));
        }
        if self.docstatus != DocStatus::Draft {
            return Err(SalesError::InvalidStatusTransition {
                from: self.docstatus.to_string(),
                to: DocStatus::Submitted.to_string(),
            });
        }
        self.docstatus = DocStatus::Submitted;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// An item line on a delivery note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryNoteItem {
    pub id: DeliveryNoteItemId,
    pub idx: u32,
    pub item_code: String,
    /// Quantity moved, positive on returns as well
    pub qty: Decimal,
    pub uom: Option<String>,
    pub warehouse: Option<String>,
    /// Originating delivery note line, set on return items
    pub delivery_note_item: Option<DeliveryNoteItemId>,
}

impl DeliveryNoteItem {
    pub fn new(item_code: impl Into<String>, qty: Decimal) -> Self {
        Self {
            id: DeliveryNoteItemId::new_v7(),
            idx: 0,
            item_code: item_code.into(),
            qty,
            uom: None,
            warehouse: None,
            delivery_note_item: None,
        }
    }

    pub fn with_uom(mut self, uom: Option<String>) -> Self {
        self.uom = uom;
        self
    }

    pub fn with_warehouse(mut self, warehouse: Option<String>) -> Self {
        self.warehouse = warehouse;
        self
    }

    pub fn returning(mut self, delivery_note_item: DeliveryNoteItemId) -> Self {
        self.delivery_note_item = Some(delivery_note_item);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_return_against_and_submit() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut original = DeliveryNote::new("Acme KSA", CustomerId::new_v7(), date);
        original.add_item(DeliveryNoteItem::new("ITEM-A", dec!(5)).with_warehouse(Some("Stores - AK".into())));
        original.submit().unwrap();

        let mut ret = DeliveryNote::new_return_against(&original, date);
        assert!(ret.submit().is_err());

        let source = original.items[0].id;
        ret.add_item(DeliveryNoteItem::new("ITEM-A", dec!(2)).returning(source));
        ret.submit().unwrap();

        assert!(ret.is_return);
        assert_eq!(ret.return_against, Some(original.id));
        assert_eq!(ret.items[0].idx, 1);
        assert!(original.item(source).is_some());
    }
}
