//! Tests for strongly-typed document identifiers

use core_kernel::identifiers::*;
use uuid::Uuid;

mod ordering {
    use super::*;

    #[test]
    fn test_v7_ids_are_time_ordered() {
        let first = SalesInvoiceId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = SalesInvoiceId::new_v7();
        assert_ne!(first, second);
        assert!(first < second);
    }
}

mod wire_format {
    use super::*;

    #[test]
    fn test_json_is_the_bare_uuid() {
        let id = SalesInvoiceId::new_v7();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));

        let back: SalesInvoiceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_invalid_string_fails_to_parse() {
        assert!("SINV-not-a-uuid".parse::<SalesInvoiceId>().is_err());
    }

    #[test]
    fn test_uuid_conversions() {
        let uuid = Uuid::now_v7();
        let customer = CustomerId::from(uuid);
        let back: Uuid = customer.into();
        assert_eq!(back, uuid);
    }
}

mod document_prefixes {
    use super::*;

    #[test]
    fn test_all_prefixes_are_distinct() {
        let prefixes = vec![
            CustomerId::prefix(),
            SalesInvoiceId::prefix(),
            SalesInvoiceItemId::prefix(),
            DeliveryNoteId::prefix(),
            DeliveryNoteItemId::prefix(),
            SalesReturnId::prefix(),
            ReturnLineId::prefix(),
        ];

        let mut unique = prefixes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(prefixes.len(), unique.len());
    }

    #[test]
    fn test_same_uuid_displays_with_each_prefix() {
        let uuid = Uuid::now_v7();
        assert_eq!(DeliveryNoteId::from_uuid(uuid).to_string(), format!("DN-{}", uuid));
        assert_eq!(SalesReturnId::from_uuid(uuid).to_string(), format!("CSR-{}", uuid));
    }

    #[test]
    fn test_nil_uuid() {
        let id = CustomerId::from_uuid(Uuid::nil());
        assert_eq!(id.to_string(), "CUST-00000000-0000-0000-0000-000000000000");
    }
}
