//! Returnable invoice line and amount-in-words handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::{permissions, Claims};
use crate::dto::invoice_items::*;
use crate::{error::ApiError, AppState};

/// Lists invoice lines the customer may return
pub async fn get_sales_invoice_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<InvoiceItemsParams>,
) -> Result<Json<Vec<InvoiceItemResponse>>, ApiError> {
    claims.require(permissions::INVOICE_READ)?;

    let lines = state
        .service
        .get_sales_invoice_items(params.into(), claims.operation_metadata())
        .await?;

    Ok(Json(lines.into_iter().map(InvoiceItemResponse::from).collect()))
}

/// Spells out an amount in the service currency
pub async fn amount_in_words(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<AmountInWordsParams>,
) -> Result<Json<AmountInWordsResponse>, ApiError> {
    let in_words = state
        .service
        .amount_in_words(params.amount, &claims.operation_metadata())?;

    Ok(Json(AmountInWordsResponse {
        amount: params.amount,
        in_words,
    }))
}
