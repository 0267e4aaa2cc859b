use sqlx::{Error as SqlxError, PgExecutor, Row};
use tracing::{info, instrument};

use crate::database::connection::DbConnection;
use crate::database::utils::{is_unique_violation, map_not_found_as_none};
use crate::error::{RequestError, ValidationError};
use crate::models::resource::{CreateResourceRequest, ResourceId};
use crate::models::user::{CreateUserRequest, UserId};

impl DbConnection {
    pub async fn register_user(&self, user: &CreateUserRequest) -> Result<UserId, RequestError> {
        create_user(self.pool(), user).await.map_err(|e| {
            if is_unique_violation(&e) {
                ValidationError::AlreadyExists.into()
            } else {
                e.into()
            }
        })
    }

    /// A storage key can back only one resource, a second insert is `AlreadyExists`.
    pub async fn create_resource(
        &self,
        resource: &CreateResourceRequest,
    ) -> Result<ResourceId, RequestError> {
        create_resource(self.pool(), resource).await.map_err(|e| {
            if is_unique_violation(&e) {
                ValidationError::AlreadyExists.into()
            } else {
                e.into()
            }
        })
    }

    /// Fails with `NotFound` unless the resource exists and belongs to `owner_id`.
    pub async fn set_resource_visibility(
        &self,
        owner_id: UserId,
        resource_id: ResourceId,
        is_public: bool,
    ) -> Result<(), RequestError> {
        let updated = update_resource_visibility(self.pool(), owner_id, resource_id, is_public).await?;
        if !updated {
            return Err(ValidationError::NotFound.into());
        }
        Ok(())
    }

    /// Returns the storage key of the removed resource.
    pub async fn delete_resource(
        &self,
        owner_id: UserId,
        resource_id: ResourceId,
    ) -> Result<String, RequestError> {
        delete_owned_resource(self.pool(), owner_id, resource_id)
            .await?
            .ok_or_else(|| ValidationError::NotFound.into())
    }

    pub async fn record_download(&self, resource_id: ResourceId) -> Result<Option<i64>, SqlxError> {
        increment_downloads(self.pool(), resource_id).await
    }
}

#[instrument(skip_all)]
pub async fn create_user<'a, E: PgExecutor<'a>>(
    executor: E,
    user: &CreateUserRequest,
) -> Result<UserId, SqlxError> {
    let result = sqlx::query(
        "
            INSERT INTO users (display_name, email, password_hash, created_at)
            VALUES ($1, $2, $3, current_timestamp) RETURNING id;
        ",
    )
    .bind(&user.display_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .fetch_one(executor)
    .await?
    .try_get("id")?;
    info!("created user with id: {}", result);
    Ok(result)
}

#[instrument(skip_all, fields(owner_id = resource.owner_id))]
pub async fn create_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    resource: &CreateResourceRequest,
) -> Result<ResourceId, SqlxError> {
    let result = sqlx::query(
        "
            INSERT INTO resources
                (title, subject, semester, resource_type, file_path, file_size, owner_id,
                 is_public, downloads, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, clock_timestamp(), clock_timestamp())
            RETURNING id;
        ",
    )
    .bind(&resource.title)
    .bind(&resource.subject)
    .bind(resource.semester)
    .bind(resource.resource_type.to_string())
    .bind(&resource.file_path)
    .bind(resource.file_size)
    .bind(resource.owner_id)
    .bind(resource.is_public)
    .fetch_one(executor)
    .await?
    .try_get("id")?;
    info!("created resource with id: {}", result);
    Ok(result)
}

#[instrument(skip(executor))]
pub async fn update_resource_visibility<'a, E: PgExecutor<'a>>(
    executor: E,
    owner_id: UserId,
    resource_id: ResourceId,
    is_public: bool,
) -> Result<bool, SqlxError> {
    let result = sqlx::query(
        "
            UPDATE resources SET is_public = $1, updated_at = clock_timestamp()
            WHERE id = $2 AND owner_id = $3;
        ",
    )
    .bind(is_public)
    .bind(resource_id)
    .bind(owner_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[instrument(skip(executor))]
pub async fn delete_owned_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    owner_id: UserId,
    resource_id: ResourceId,
) -> Result<Option<String>, SqlxError> {
    let result = sqlx::query(
        "DELETE FROM resources WHERE id = $1 AND owner_id = $2 RETURNING file_path;",
    )
    .bind(resource_id)
    .bind(owner_id)
    .fetch_one(executor)
    .await
    .and_then(|row| row.try_get::<String, _>("file_path"));
    map_not_found_as_none(result)
}

/// Single-statement increment, concurrent downloads never lose a count.
#[instrument(skip(executor))]
pub async fn increment_downloads<'a, E: PgExecutor<'a>>(
    executor: E,
    resource_id: ResourceId,
) -> Result<Option<i64>, SqlxError> {
    let result = sqlx::query(
        "UPDATE resources SET downloads = downloads + 1 WHERE id = $1 RETURNING downloads;",
    )
    .bind(resource_id)
    .fetch_one(executor)
    .await
    .and_then(|row| row.try_get::<i64, _>("downloads"));
    map_not_found_as_none(result)
}
