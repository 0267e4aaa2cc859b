use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::auth::session::CurrentUser;
use crate::error::{RequestError, ValidationError};
use crate::models::display::ResourceView;
use crate::models::upload::{
    build_storage_key, ConfirmUploadRequest, PrepareUploadRequest, PreparedUpload,
};
use crate::server::state::AppState;

/// First half of an upload: validate the declared file and hand out a signed `PUT` URL.
#[instrument(skip(state, request), fields(user_id = user.user_id))]
pub async fn prepare_upload(
    state: &AppState,
    user: CurrentUser,
    request: PrepareUploadRequest,
) -> Result<PreparedUpload, RequestError> {
    request.validate(state.config.uploads.max_file_size)?;
    let file_key = build_storage_key(user.user_id, Utc::now(), &request.file_name);
    let presigned = state
        .storage
        .presign_upload(
            &file_key,
            request.content_type.trim(),
            request.file_size,
            state.config.storage.presign_expiry(),
        )
        .await?;
    info!(file_key = %file_key, size = request.file_size, "issued upload url");
    Ok(PreparedUpload {
        upload_url: presigned.url,
        file_key,
        expires_at: presigned.expires_at,
    })
}

/// Second half: the browser reports the `PUT` finished, persist the resource.
///
/// The object must already be in the bucket with exactly the declared size.
#[instrument(skip(state, request), fields(user_id = user.user_id))]
pub async fn confirm_upload(
    state: &AppState,
    user: CurrentUser,
    request: ConfirmUploadRequest,
) -> Result<ResourceView, RequestError> {
    let resource = request.into_create_request(user.user_id, state.config.uploads.max_file_size)?;
    match state.storage.object_size(&resource.file_path).await? {
        Some(size) if size == resource.file_size => {}
        Some(size) => {
            warn!(file_key = %resource.file_path, size, "stored size differs from declared size");
            return Err(ValidationError::invalid(
                resource.file_size.to_string(),
                "declared file size does not match the uploaded file",
            )
            .into());
        }
        None => {
            return Err(ValidationError::invalid(
                resource.file_path,
                "file has not been uploaded yet",
            )
            .into());
        }
    }

    let resource_id = state.db_connection.create_resource(&resource).await?;
    let row = state
        .db_connection
        .get_resource(resource_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    Ok(ResourceView::from_row(row, Utc::now()))
}
