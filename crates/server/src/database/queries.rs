use chrono::Utc;
use sqlx::{Error as SqlxError, PgExecutor, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use crate::database::connection::DbConnection;
use crate::database::utils::map_not_found_as_none;
use crate::models::filter::ResourceFilter;
use crate::models::listing::{Cursor, ListResourcesRequest, ResourcePage};
use crate::models::resource::{KeysetPosition, ResourceId, ResourceRow};
use crate::models::user::{GetUserCredentialsByEmailResponse, UserId, UserResponse};

const RESOURCE_COLUMNS: &str = "
        r.id, r.title, r.subject, r.semester, r.resource_type, r.file_path, r.file_size,
        r.owner_id, r.is_public, r.downloads, r.created_at, r.updated_at,
        u.display_name AS uploader_name
";

impl DbConnection {
    /// One page of resources in `(created_at DESC, id DESC)` order.
    ///
    /// A cursor whose row is gone yields an empty, final page.
    pub async fn list_resources(
        &self,
        request: &ListResourcesRequest,
    ) -> Result<ResourcePage, SqlxError> {
        let position = match request.cursor {
            Cursor::Start => None,
            Cursor::After(id) => match find_keyset_position(self.pool(), id).await? {
                Some(position) => Some(position),
                None => {
                    debug!(cursor = id, "listing cursor no longer exists");
                    return Ok(ResourcePage::empty());
                }
            },
        };
        let rows = fetch_resource_window(
            self.pool(),
            &request.filter,
            position,
            request.page_size + 1,
        )
        .await?;
        Ok(ResourcePage::assemble(rows, request.page_size, Utc::now()))
    }

    pub async fn get_resource(&self, id: ResourceId) -> Result<Option<ResourceRow>, SqlxError> {
        find_resource(self.pool(), id).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<UserResponse>, SqlxError> {
        find_user(self.pool(), id).await
    }

    pub async fn get_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<GetUserCredentialsByEmailResponse>, SqlxError> {
        find_user_credentials_by_email(self.pool(), email).await
    }
}

#[instrument(skip(executor))]
pub async fn find_keyset_position<'a, E: PgExecutor<'a>>(
    executor: E,
    id: ResourceId,
) -> Result<Option<KeysetPosition>, SqlxError> {
    let result = sqlx::query_as("SELECT created_at, id FROM resources WHERE id = $1;")
        .bind(id)
        .fetch_one(executor)
        .await;
    map_not_found_as_none(result)
}

pub fn build_window_query<'q>(
    filter: &ResourceFilter,
    position: Option<KeysetPosition>,
    limit: i64,
) -> QueryBuilder<'q, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources r JOIN users u ON r.owner_id = u.id WHERE TRUE"
    ));
    filter.push_conditions(&mut builder);
    if let Some(position) = position {
        builder
            .push(" AND (r.created_at, r.id) < (")
            .push_bind(position.created_at)
            .push(", ")
            .push_bind(position.id)
            .push(")");
    }
    builder
        .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
        .push_bind(limit);
    builder
}

#[instrument(skip(executor))]
pub async fn fetch_resource_window<'a, E: PgExecutor<'a>>(
    executor: E,
    filter: &ResourceFilter,
    position: Option<KeysetPosition>,
    limit: i64,
) -> Result<Vec<ResourceRow>, SqlxError> {
    let mut builder = build_window_query(filter, position, limit);
    builder
        .build_query_as::<ResourceRow>()
        .fetch_all(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn find_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    id: ResourceId,
) -> Result<Option<ResourceRow>, SqlxError> {
    let result = sqlx::query_as(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources r JOIN users u ON r.owner_id = u.id WHERE r.id = $1;"
    ))
    .bind(id)
    .fetch_one(executor)
    .await;
    map_not_found_as_none(result)
}

#[instrument(skip(executor))]
pub async fn find_user<'a, E: PgExecutor<'a>>(
    executor: E,
    id: UserId,
) -> Result<Option<UserResponse>, SqlxError> {
    let result = sqlx::query_as(
        "SELECT id, display_name, email, created_at FROM users WHERE id = $1;",
    )
    .bind(id)
    .fetch_one(executor)
    .await;
    map_not_found_as_none(result)
}

#[instrument(skip(executor))]
pub async fn find_user_credentials_by_email<'a, E: PgExecutor<'a>>(
    executor: E,
    email: &str,
) -> Result<Option<GetUserCredentialsByEmailResponse>, SqlxError> {
    let result = sqlx::query_as(
        "SELECT id, display_name, password_hash FROM users WHERE email = $1;",
    )
    .bind(email)
    .fetch_one(executor)
    .await;
    map_not_found_as_none(result)
}
