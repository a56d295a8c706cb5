//! Combined sales return handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CustomerId, SalesReturnId};

use crate::auth::{permissions, Claims};
use crate::dto::sales_return::*;
use crate::{error::ApiError, AppState};

/// Creates a validated draft
pub async fn create_return(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateReturnRequest>,
) -> Result<(StatusCode, Json<ReturnResponse>), ApiError> {
    claims.require(permissions::RETURN_WRITE)?;
    request.validate()?;

    let input = request.into_new_return(state.service.settings().currency);
    let saved = state
        .service
        .create_return(input, claims.operation_metadata())
        .await?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// Lists a customer's returns
pub async fn list_returns(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListReturnsParams>,
) -> Result<Json<Vec<ReturnResponse>>, ApiError> {
    claims.require(permissions::RETURN_READ)?;

    let docs = state
        .service
        .list_returns(CustomerId::from_uuid(params.customer), claims.operation_metadata())
        .await?;

    Ok(Json(docs.into_iter().map(ReturnResponse::from).collect()))
}

/// Gets a return by ID
pub async fn get_return(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReturnResponse>, ApiError> {
    claims.require(permissions::RETURN_READ)?;

    let doc = state
        .service
        .get_return(SalesReturnId::from_uuid(id), claims.operation_metadata())
        .await?;

    Ok(Json(doc.into()))
}

/// Updates a draft
pub async fn update_return(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReturnRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    claims.require(permissions::RETURN_WRITE)?;
    request.validate()?;

    let changes = request.into_changes(state.service.settings().currency);
    let saved = state
        .service
        .update_return(SalesReturnId::from_uuid(id), changes, claims.operation_metadata())
        .await?;

    Ok(Json(saved.into()))
}

/// Submits a draft, generating credit notes and delivery note returns
pub async fn submit_return(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    claims.require(permissions::RETURN_SUBMIT)?;

    let outcome = state
        .service
        .submit_return(SalesReturnId::from_uuid(id), claims.operation_metadata())
        .await?;

    Ok(Json(outcome.into()))
}

/// Generates credit notes for a return on demand
pub async fn create_credit_notes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Query(params): Query<CreditNotesParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    claims.require(permissions::CREDIT_NOTE_WRITE)?;

    let message = state
        .service
        .create_credit_notes(
            SalesReturnId::from_uuid(id),
            params.submit_credit_notes,
            claims.operation_metadata(),
        )
        .await?;

    Ok(Json(MessageResponse { message }))
}
