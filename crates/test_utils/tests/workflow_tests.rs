//! End-to-end return workflows against the in-memory ERP

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, SalesReturnId};
use domain_returns::ports::mock::InMemoryErp;
use domain_returns::{
    InvoiceItemsQuery, ReturnChanges, ReturnError, ReturnSettings, ReturnStatus, SalesReturnService,
};
use domain_sales::{DeliveryNote, DocStatus, SalesInvoice};
use test_utils::{
    assert_credit_note_quantities, assert_delivery_return_quantities, assert_money_approx_eq,
    assert_quantity_exceeded, assert_return_status, init_test_tracing, return_line,
    CreditNoteBuilder, DateFixtures, DeliveryNoteBuilder, InvoiceBuilder, MoneyFixtures,
    PartyFixtures, ReturnBuilder,
};

struct Ledger {
    erp: Arc<InMemoryErp>,
    service: SalesReturnService,
    customer: CustomerId,
}

impl Ledger {
    async fn with(customer: CustomerId, invoices: Vec<SalesInvoice>, notes: Vec<DeliveryNote>) -> Self {
        init_test_tracing();
        let erp = Arc::new(InMemoryErp::with_documents(invoices, notes).await);
        let service = SalesReturnService::new(erp.clone(), erp.clone(), ReturnSettings::default());
        Self {
            erp,
            service,
            customer,
        }
    }

    /// One submitted invoice: WIDGET 10 @ 20 SAR with 15% VAT
    async fn widget_invoice() -> (Self, SalesInvoice) {
        let customer = PartyFixtures::customer();
        let invoice = InvoiceBuilder::new(customer)
            .line("WIDGET", dec!(10), MoneyFixtures::widget_rate())
            .with_vat()
            .build();
        (Self::with(customer, vec![invoice.clone()], vec![]).await, invoice)
    }

    async fn submitted_return(&self, builder: ReturnBuilder) -> SalesReturnId {
        let saved = self
            .service
            .create_return(builder.build(), PartyFixtures::caller())
            .await
            .unwrap();
        self.service
            .submit_return(saved.document.id, PartyFixtures::caller())
            .await
            .unwrap();
        saved.document.id
    }
}

#[tokio::test]
async fn test_remaining_quantity_spans_submitted_returns() {
    let (ledger, invoice) = Ledger::widget_invoice().await;

    ledger
        .submitted_return(ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(4)))
        .await;

    let attempt = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(7)).build(),
            PartyFixtures::caller(),
        )
        .await;
    assert_eq!(assert_quantity_exceeded(attempt, 1), dec!(6));

    let stored = ledger
        .service
        .list_returns(ledger.customer, PartyFixtures::caller())
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);

    ledger
        .submitted_return(ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(6)))
        .await;

    let notes = ledger.erp.credit_notes_against(invoice.id).await;
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(SalesInvoice::is_submitted));
}

#[tokio::test]
async fn test_credit_note_mirrors_source_invoice() {
    let (ledger, invoice) = Ledger::widget_invoice().await;

    let id = ledger
        .submitted_return(ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(4)))
        .await;

    let (credit_notes, delivery_returns) = ledger.erp.generated_by(id).await;
    assert!(delivery_returns.is_empty());
    assert_eq!(credit_notes.len(), 1);

    let note = &credit_notes[0];
    assert_credit_note_quantities(note);
    assert_eq!(note.return_against, Some(invoice.id));
    assert_eq!(note.combined_sales_return, Some(id));
    assert!(!note.update_outstanding_for_self);
    assert_eq!(note.items[0].sales_invoice_item, Some(invoice.items[0].id));
    assert_eq!(note.taxes.len(), 1);
    assert_eq!(note.taxes[0].account_head, invoice.taxes[0].account_head);
    assert_money_approx_eq(&note.grand_total, &MoneyFixtures::sar(dec!(-92)), dec!(0));

    let doc = ledger.service.get_return(id, PartyFixtures::caller()).await.unwrap();
    assert_return_status(&doc, ReturnStatus::Submitted);
    assert_eq!(doc.grand_total.amount(), dec!(92));
    assert_eq!(doc.in_words, "SAR Ninety Two only.");
}

#[tokio::test]
async fn test_delivery_note_returns_follow_each_source_note() {
    let customer = PartyFixtures::customer();
    let first_note = DeliveryNoteBuilder::new(customer)
        .item("WIDGET", dec!(5), "Riyadh Stores - AK")
        .build();
    let second_note = DeliveryNoteBuilder::new(customer)
        .item("GADGET", dec!(3), "Jeddah Stores - AK")
        .build();
    let first_invoice = InvoiceBuilder::new(customer)
        .delivered_line(&first_note, 0, MoneyFixtures::widget_rate())
        .line("SERVICE", dec!(1), MoneyFixtures::sar(dec!(50)))
        .with_vat()
        .build();
    let second_invoice = InvoiceBuilder::new(customer)
        .delivered_line(&second_note, 0, MoneyFixtures::gadget_rate())
        .with_vat()
        .build();

    let ledger = Ledger::with(
        customer,
        vec![first_invoice.clone(), second_invoice.clone()],
        vec![first_note.clone(), second_note.clone()],
    )
    .await;

    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(customer)
                .returning(&first_invoice, 0, dec!(2))
                .returning(&first_invoice, 1, dec!(1))
                .returning(&second_invoice, 0, dec!(3))
                .with_delivery_note_returns()
                .build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();
    let outcome = ledger
        .service
        .submit_return(saved.document.id, PartyFixtures::caller())
        .await
        .unwrap();

    assert_eq!(outcome.credit_notes.len(), 2);
    assert_eq!(outcome.delivery_note_returns.len(), 2);
    assert_eq!(outcome.message().lines().count(), 2);

    let (_, delivery_returns) = ledger.erp.generated_by(saved.document.id).await;
    assert_eq!(delivery_returns.len(), 2);
    for returned in &delivery_returns {
        assert_delivery_return_quantities(returned);
        assert_eq!(returned.docstatus, DocStatus::Submitted);

        let source = if returned.return_against == Some(first_note.id) {
            &first_note
        } else {
            &second_note
        };
        assert_eq!(returned.items.len(), 1);
        let item = &returned.items[0];
        assert!(item.delivery_note_item.and_then(|id| source.item(id)).is_some());
        assert_eq!(item.warehouse, source.items[0].warehouse);
    }

    let widget_return = delivery_returns
        .iter()
        .find(|n| n.return_against == Some(first_note.id))
        .unwrap();
    assert_eq!(widget_return.items[0].qty, dec!(2));
}

#[tokio::test]
async fn test_no_delivery_references_means_no_delivery_returns() {
    let (ledger, invoice) = Ledger::widget_invoice().await;

    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer)
                .returning(&invoice, 0, dec!(1))
                .with_delivery_note_returns()
                .build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();
    let outcome = ledger
        .service
        .submit_return(saved.document.id, PartyFixtures::caller())
        .await
        .unwrap();

    assert_eq!(outcome.credit_notes.len(), 1);
    assert!(outcome.delivery_note_returns.is_empty());
}

#[tokio::test]
async fn test_draft_credit_notes_only_raise_a_notice() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    ledger
        .erp
        .insert_invoice(CreditNoteBuilder::against(&invoice).line(0, dec!(8)).draft().build())
        .await;

    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(5)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();

    assert_eq!(saved.notices.len(), 1);
    assert_eq!(saved.notices[0].row, 1);
    assert_eq!(saved.notices[0].draft_qty, dec!(8));
    assert_eq!(saved.document.items[0].draft_returned_qty, dec!(8));
    assert_eq!(saved.document.items[0].already_returned_qty, dec!(0));
}

#[tokio::test]
async fn test_cancelled_credit_notes_free_their_quantity() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let mut cancelled = CreditNoteBuilder::against(&invoice).line(0, dec!(9)).build();
    cancelled.cancel().unwrap();
    ledger.erp.insert_invoice(cancelled).await;

    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(10)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();

    assert!(saved.notices.is_empty());
    assert_eq!(saved.document.items[0].already_returned_qty, dec!(0));
}

#[tokio::test]
async fn test_failed_batch_leaves_return_in_draft() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(4)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();
    let id = saved.document.id;

    ledger.erp.fail_next_batch();
    let result = ledger.service.submit_return(id, PartyFixtures::caller()).await;
    assert!(matches!(result, Err(ReturnError::Port(_))));

    let doc = ledger.service.get_return(id, PartyFixtures::caller()).await.unwrap();
    assert_return_status(&doc, ReturnStatus::Draft);
    let (credit_notes, delivery_returns) = ledger.erp.generated_by(id).await;
    assert!(credit_notes.is_empty());
    assert!(delivery_returns.is_empty());

    let outcome = ledger.service.submit_return(id, PartyFixtures::caller()).await.unwrap();
    assert_return_status(&outcome.document, ReturnStatus::Submitted);
    assert_eq!(ledger.erp.credit_notes_against(invoice.id).await.len(), 1);
}

#[tokio::test]
async fn test_submitted_return_is_frozen() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let id = ledger
        .submitted_return(ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(2)))
        .await;

    let update = ledger
        .service
        .update_return(
            id,
            ReturnChanges {
                create_delivery_note: Some(true),
                ..ReturnChanges::default()
            },
            PartyFixtures::caller(),
        )
        .await;
    assert!(matches!(update, Err(ReturnError::InvalidStateTransition { .. })));

    let resubmit = ledger.service.submit_return(id, PartyFixtures::caller()).await;
    assert!(matches!(resubmit, Err(ReturnError::InvalidStateTransition { .. })));
    assert_eq!(ledger.erp.credit_notes_against(invoice.id).await.len(), 1);
}

#[tokio::test]
async fn test_draft_edit_revalidates_lines() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(2)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();

    let too_many = ReturnBuilder::new(ledger.customer)
        .returning(&invoice, 0, dec!(11))
        .build()
        .lines;
    let update = ledger
        .service
        .update_return(
            saved.document.id,
            ReturnChanges {
                lines: Some(too_many),
                ..ReturnChanges::default()
            },
            PartyFixtures::caller(),
        )
        .await;
    assert_eq!(assert_quantity_exceeded(update, 1), dec!(10));

    let doc = ledger
        .service
        .get_return(saved.document.id, PartyFixtures::caller())
        .await
        .unwrap();
    assert_eq!(doc.items[0].qty, dec!(2));
}

#[tokio::test]
async fn test_credit_notes_on_demand_stay_draft() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(3)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();

    let message = ledger
        .service
        .create_credit_notes(saved.document.id, false, PartyFixtures::caller())
        .await
        .unwrap();
    assert!(message.starts_with(&format!("Credit Note created for {}: ", invoice.name())));

    let notes = ledger.erp.credit_notes_against(invoice.id).await;
    assert_eq!(notes.len(), 1);
    assert!(!notes[0].is_submitted());

    let doc = ledger
        .service
        .get_return(saved.document.id, PartyFixtures::caller())
        .await
        .unwrap();
    assert_return_status(&doc, ReturnStatus::Draft);
}

#[tokio::test]
async fn test_submitted_credit_notes_on_demand_block_a_second_return_of_the_same_goods() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(10)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();
    let id = saved.document.id;

    ledger
        .service
        .create_credit_notes(id, true, PartyFixtures::caller())
        .await
        .unwrap();

    let result = ledger.service.submit_return(id, PartyFixtures::caller()).await;
    assert_eq!(assert_quantity_exceeded(result, 1), dec!(0));

    let notes = ledger.erp.credit_notes_against(invoice.id).await;
    assert_eq!(notes.len(), 1);
    let credited: Decimal = notes
        .iter()
        .filter(|n| n.is_submitted())
        .flat_map(|n| n.items.iter())
        .map(|item| item.qty.abs())
        .sum();
    assert_eq!(credited, dec!(10));

    let doc = ledger.service.get_return(id, PartyFixtures::caller()).await.unwrap();
    assert_return_status(&doc, ReturnStatus::Draft);
}

#[tokio::test]
async fn test_draft_credit_notes_on_demand_do_not_block_submission() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let saved = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer).returning(&invoice, 0, dec!(10)).build(),
            PartyFixtures::caller(),
        )
        .await
        .unwrap();

    ledger
        .service
        .create_credit_notes(saved.document.id, false, PartyFixtures::caller())
        .await
        .unwrap();

    let outcome = ledger
        .service
        .submit_return(saved.document.id, PartyFixtures::caller())
        .await
        .unwrap();
    assert!(outcome.notices.is_empty());
    assert_return_status(&outcome.document, ReturnStatus::Submitted);
}

#[tokio::test]
async fn test_original_quantity_comes_from_the_invoice_line() {
    let (ledger, invoice) = Ledger::widget_invoice().await;
    let mut inflated = return_line(&invoice, 0, dec!(50));
    inflated.original_qty = dec!(1000);

    let result = ledger
        .service
        .create_return(ReturnBuilder::new(ledger.customer).line(inflated).build(), PartyFixtures::caller())
        .await;
    assert_eq!(assert_quantity_exceeded(result, 1), dec!(10));

    let mut understated = return_line(&invoice, 0, dec!(4));
    understated.original_qty = dec!(1);
    let saved = ledger
        .service
        .create_return(ReturnBuilder::new(ledger.customer).line(understated).build(), PartyFixtures::caller())
        .await
        .unwrap();
    assert_eq!(saved.document.items[0].original_qty, dec!(10));
}

#[tokio::test]
async fn test_invoice_line_must_belong_to_referenced_invoice() {
    let customer = PartyFixtures::customer();
    let first = InvoiceBuilder::new(customer)
        .line("WIDGET", dec!(10), MoneyFixtures::widget_rate())
        .build();
    let second = InvoiceBuilder::new(customer)
        .line("WIDGET", dec!(2), MoneyFixtures::widget_rate())
        .build();
    let ledger = Ledger::with(customer, vec![first.clone(), second.clone()], vec![]).await;

    let mut crossed = return_line(&first, 0, dec!(5));
    crossed.linked_invoice = Some(second.id);

    let result = ledger
        .service
        .create_return(ReturnBuilder::new(customer).line(crossed).build(), PartyFixtures::caller())
        .await;
    assert!(matches!(result, Err(ReturnError::LineNotOnInvoice { row: 1, .. })));
    assert!(ledger
        .service
        .list_returns(customer, PartyFixtures::caller())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_rows_on_the_same_invoice_line_share_its_remaining_quantity() {
    let (ledger, invoice) = Ledger::widget_invoice().await;

    let result = ledger
        .service
        .create_return(
            ReturnBuilder::new(ledger.customer)
                .returning(&invoice, 0, dec!(6))
                .returning(&invoice, 0, dec!(6))
                .build(),
            PartyFixtures::caller(),
        )
        .await;
    assert_eq!(assert_quantity_exceeded(result, 2), dec!(4));

    let id = ledger
        .submitted_return(
            ReturnBuilder::new(ledger.customer)
                .returning(&invoice, 0, dec!(6))
                .returning(&invoice, 0, dec!(4)),
        )
        .await;
    let (credit_notes, _) = ledger.erp.generated_by(id).await;
    assert_eq!(credit_notes.len(), 1);
    assert_credit_note_quantities(&credit_notes[0]);
    assert_eq!(credit_notes[0].items.len(), 2);
}

#[tokio::test]
async fn test_item_code_search_spans_invoices_newest_first() {
    let customer = PartyFixtures::customer();
    let older = InvoiceBuilder::new(customer)
        .posted_on(DateFixtures::early_posting())
        .line("WIDGET", dec!(4), MoneyFixtures::widget_rate())
        .line("GADGET", dec!(1), MoneyFixtures::gadget_rate())
        .build();
    let newer = InvoiceBuilder::new(customer)
        .posted_on(DateFixtures::late_posting())
        .line("WIDGET", dec!(6), MoneyFixtures::widget_rate())
        .with_vat()
        .build();
    let draft = InvoiceBuilder::new(customer)
        .line("WIDGET", dec!(9), MoneyFixtures::widget_rate())
        .draft()
        .build();
    let ledger = Ledger::with(customer, vec![older.clone(), newer.clone(), draft], vec![]).await;

    let lines = ledger
        .service
        .get_sales_invoice_items(
            InvoiceItemsQuery {
                customer: Some(customer),
                sales_invoice: Some(older.id),
                select_all: false,
                item_code: Some("WIDGET".to_string()),
            },
            PartyFixtures::caller(),
        )
        .await
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].sales_invoice, newer.id);
    assert_eq!(lines[0].vat_rate_ratio, dec!(0.15));
    assert_eq!(lines[1].sales_invoice, older.id);
    assert_eq!(lines[1].vat_rate_ratio, dec!(0));

    let single = ledger
        .service
        .get_sales_invoice_items(
            InvoiceItemsQuery {
                customer: Some(customer),
                sales_invoice: Some(older.id),
                select_all: false,
                item_code: Some("   ".to_string()),
            },
            PartyFixtures::caller(),
        )
        .await
        .unwrap();
    assert_eq!(single.len(), 2);
    assert!(single.iter().all(|l| l.sales_invoice == older.id));

    let everything = ledger
        .service
        .get_sales_invoice_items(
            InvoiceItemsQuery {
                customer: Some(customer),
                select_all: true,
                ..InvoiceItemsQuery::default()
            },
            PartyFixtures::caller(),
        )
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);
}
