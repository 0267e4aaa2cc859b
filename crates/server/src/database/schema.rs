use sqlx::{Error as SqlxError, Postgres, Transaction};
use tracing::{info, instrument};

use crate::database::connection::DbConnection;

impl DbConnection {
    /// Idempotent, safe to run on every start.
    pub async fn init_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        create_all_tables(&mut transaction).await?;
        create_all_indexes(&mut transaction).await?;
        transaction.commit().await?;
        info!("database schema is up to date");
        Ok(())
    }

    pub async fn drop_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        drop_all_tables(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn create_all_tables(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            CREATE TABLE IF NOT EXISTS users (
                id              int PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                display_name    VARCHAR(60) NOT NULL,
                email           VARCHAR(255) NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE IF NOT EXISTS resources (
                id              bigint PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                title           VARCHAR(200) NOT NULL,
                subject         VARCHAR(100) NOT NULL,
                semester        SMALLINT NOT NULL CHECK (semester BETWEEN 1 AND 8),
                resource_type   VARCHAR(40) NOT NULL,
                file_path       TEXT NOT NULL,
                file_size       BIGINT NOT NULL CHECK (file_size >= 0),
                owner_id        int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                is_public       BOOLEAN NOT NULL DEFAULT false,
                downloads       BIGINT NOT NULL DEFAULT 0 CHECK (downloads >= 0),
                created_at      TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
                updated_at      TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_all_indexes(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    let statements = [
        "CREATE INDEX IF NOT EXISTS resources_listing_idx ON resources (created_at DESC, id DESC);",
        "CREATE INDEX IF NOT EXISTS resources_owner_listing_idx ON resources (owner_id, created_at DESC, id DESC);",
        // one resource per stored object
        "CREATE UNIQUE INDEX IF NOT EXISTS resources_file_path_key ON resources (file_path);",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_tables(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TABLE IF EXISTS resources;",
        "DROP TABLE IF EXISTS users;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}
