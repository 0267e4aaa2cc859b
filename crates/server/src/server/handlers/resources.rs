use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::session::CurrentUser;
use crate::error::{RequestError, ValidationError};
use crate::models::display::ResourceView;
use crate::models::filter::Visibility;
use crate::models::listing::{ListingForm, ListingQuery, ResourcePage};
use crate::models::resource::{ResourceId, ResourceRow};
use crate::models::upload::file_name_from_key;
use crate::server::constants::FALLBACK_PATH;
use crate::server::state::AppState;

pub async fn list_public(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ResourcePage>, RequestError> {
    let request = query.into_request(Visibility::Public)?;
    Ok(Json(state.db_connection.list_resources(&request).await?))
}

pub async fn load_more_public(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ListingForm>,
) -> Result<Json<ResourcePage>, RequestError> {
    let request = form.query.into_request(Visibility::Public)?;
    Ok(Json(state.db_connection.list_resources(&request).await?))
}

pub async fn view(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Path(resource_id): Path<String>,
) -> Response {
    match find_accessible(&state, user, &resource_id).await {
        Ok(row) => Json(ResourceView::from_row(row, Utc::now())).into_response(),
        Err(e) => fallback(&resource_id, e),
    }
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Path(resource_id): Path<String>,
) -> Response {
    match stream_download(&state, user, &resource_id).await {
        Ok(response) => response,
        Err(e) => fallback(&resource_id, e),
    }
}

fn fallback(resource_id: &str, error: RequestError) -> Response {
    warn!(resource_id, "redirecting failed resource request: {error}");
    Redirect::to(FALLBACK_PATH).into_response()
}

fn parse_resource_id(raw: &str) -> Result<ResourceId, ValidationError> {
    raw.parse()
        .ok()
        .filter(|id: &ResourceId| *id > 0)
        .ok_or(ValidationError::NotFound)
}

/// Private resources are visible to their owner only.
pub fn can_access(row: &ResourceRow, viewer: Option<CurrentUser>) -> bool {
    row.is_public || viewer.is_some_and(|v| v.user_id == row.owner_id)
}

async fn find_accessible(
    state: &AppState,
    user: Option<CurrentUser>,
    raw_id: &str,
) -> Result<ResourceRow, RequestError> {
    let id = parse_resource_id(raw_id)?;
    let row = state
        .db_connection
        .get_resource(id)
        .await?
        .filter(|row| can_access(row, user))
        .ok_or(ValidationError::NotFound)?;
    Ok(row)
}

async fn stream_download(
    state: &AppState,
    user: Option<CurrentUser>,
    raw_id: &str,
) -> Result<Response, RequestError> {
    let row = find_accessible(state, user, raw_id).await?;
    let downloads = state
        .db_connection
        .record_download(row.id)
        .await?
        .ok_or(ValidationError::NotFound)?;
    info!(resource_id = row.id, downloads, "serving download");

    let object = state.storage.fetch(&row.file_path).await?;
    let mime_type = mime_guess::from_path(&row.file_path).first_or_octet_stream();
    let mut headers = vec![
        (CONTENT_TYPE, mime_type.to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name_from_key(&row.file_path)),
        ),
    ];
    if let Some(length) = object.content_length {
        headers.push((CONTENT_LENGTH, length.to_string()));
    }
    Ok((AppendHeaders(headers), object.body).into_response())
}
