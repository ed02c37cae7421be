use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Create the documents table if it does not exist.
///
/// The check constraint keeps `is_deleted` and `deletion_time` in step at
/// the database level too.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let documents_table = config.documents_table();

    let create_documents = format!(
        "CREATE TABLE IF NOT EXISTS {documents_table} (
            id VARCHAR(26) PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            url TEXT NOT NULL,
            document_type TEXT NOT NULL,
            creation_time TIMESTAMPTZ NOT NULL,
            last_modification_time TIMESTAMPTZ,
            deletion_time TIMESTAMPTZ,
            is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
            CONSTRAINT {prefix}documents_deletion_consistent
                CHECK (is_deleted = (deletion_time IS NOT NULL))
        )",
        prefix = config.table_prefix
    );

    let create_active_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}documents_active_idx ON {documents_table} (id) \
         WHERE is_deleted = FALSE",
        config.table_prefix
    );

    sqlx::query(&create_documents).execute(pool).await?;
    sqlx::query(&create_active_idx).execute(pool).await?;

    Ok(())
}
