use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::session::CurrentUser;
use crate::error::RequestError;
use crate::models::dashboard::{DashboardForm, DashboardIntent};
use crate::models::filter::Visibility;
use crate::models::listing::{ListingQuery, ResourcePage};
use crate::server::handlers::uploads::{confirm_upload, prepare_upload};
use crate::server::state::AppState;

/// The signed-in user's own resources, published or not.
pub async fn list_own(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ResourcePage>, RequestError> {
    let request = query.into_request(Visibility::Owner(user.user_id))?;
    Ok(Json(state.db_connection.list_resources(&request).await?))
}

pub async fn action(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<DashboardForm>,
) -> Result<Response, RequestError> {
    let response = match form.intent {
        DashboardIntent::LoadMore => {
            let request = form
                .listing_query()
                .into_request(Visibility::Owner(user.user_id))?;
            Json(state.db_connection.list_resources(&request).await?).into_response()
        }
        DashboardIntent::GetUploadUrl => {
            let prepared = prepare_upload(&state, user, form.prepare_request()?).await?;
            Json(prepared).into_response()
        }
        DashboardIntent::ConfirmUpload => {
            let view = confirm_upload(&state, user, form.confirm_request()?).await?;
            (StatusCode::CREATED, Json(view)).into_response()
        }
        DashboardIntent::Publish | DashboardIntent::Unpublish => {
            let resource_id = form.resource_id()?;
            let is_public = form.intent == DashboardIntent::Publish;
            state
                .db_connection
                .set_resource_visibility(user.user_id, resource_id, is_public)
                .await?;
            info!(resource_id, is_public, "changed resource visibility");
            Json(json!({ "resourceId": resource_id, "isPublic": is_public })).into_response()
        }
        DashboardIntent::Delete => {
            let resource_id = form.resource_id()?;
            let file_key = state
                .db_connection
                .delete_resource(user.user_id, resource_id)
                .await?;
            info!(resource_id, "deleted resource");
            if let Err(e) = state.storage.delete(&file_key).await {
                warn!(file_key = %file_key, "stored file outlived its resource: {e}");
            }
            Json(json!({ "resourceId": resource_id, "deleted": true })).into_response()
        }
    };
    Ok(response)
}
