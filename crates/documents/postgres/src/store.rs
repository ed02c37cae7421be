use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use vellum_core::{AuditInfo, Document, Identifier, Visibility};
use vellum_documents::{DocumentStore, DocumentStoreError};

use crate::config::PostgresConfig;
use crate::migrations;
use crate::retry::RetryPolicy;

const COLUMNS: &str = "id, title, description, url, document_type, creation_time, \
                       last_modification_time, deletion_time, is_deleted";

/// Build `PgConnectOptions` from a [`PostgresConfig`], applying SSL settings
/// when configured.
pub(crate) fn build_connect_options(
    config: &PostgresConfig,
) -> Result<sqlx::postgres::PgConnectOptions, DocumentStoreError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| DocumentStoreError::Connection(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(DocumentStoreError::Connection(format!(
                    "unknown ssl_mode: {other}"
                )));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }
    if let Some(ref path) = config.ssl_root_cert {
        options = options.ssl_root_cert(path);
    }
    if let Some(ref path) = config.ssl_cert {
        options = options.ssl_client_cert(path);
    }
    if let Some(ref path) = config.ssl_key {
        options = options.ssl_client_key(path);
    }

    Ok(options)
}

fn backend(err: sqlx::Error) -> DocumentStoreError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            DocumentStoreError::Connection(err.to_string())
        }
        other => DocumentStoreError::Backend(other.to_string()),
    }
}

/// PostgreSQL-backed implementation of [`DocumentStore`].
///
/// Every statement runs in autocommit mode, so a returned `Ok` means the
/// write is durable. Visibility is applied as a `WHERE` predicate on reads.
pub struct PostgresDocumentStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl std::fmt::Debug for PostgresDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDocumentStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PostgresDocumentStore {
    /// Connect, create the pool and run migrations.
    pub async fn new(config: PostgresConfig) -> Result<Self, DocumentStoreError> {
        let connect_options = build_connect_options(&config)?;
        let pool = config
            .retry
            .run("connect", || {
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.pool_size)
                    .connect_with(connect_options.clone())
            })
            .await
            .map_err(|e| DocumentStoreError::Connection(e.to_string()))?;

        Self::from_pool(pool, config).await
    }

    /// Wrap an existing pool. Runs migrations.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, DocumentStoreError> {
        config
            .retry
            .run("migrate", || migrations::run_migrations(&pool, &config))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;
        info!(table = %config.documents_table(), "document store ready");

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn retry(&self) -> &RetryPolicy {
        &self.config.retry
    }

    fn select(&self, filter: &str, visibility: Visibility) -> String {
        let table = self.config.documents_table();
        let mut conditions: Vec<&str> = Vec::new();
        if !filter.is_empty() {
            conditions.push(filter);
        }
        if let Some(predicate) = visibility.sql_predicate() {
            conditions.push(predicate);
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        format!("SELECT {COLUMNS} FROM {table}{where_clause}")
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, document: &Document) -> Result<(), DocumentStoreError> {
        let table = self.config.documents_table();
        let query = format!(
            "INSERT INTO {table} ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        let id = document.id().to_string();

        let result = self
            .retry()
            .run("insert", || {
                sqlx::query(&query)
                    .bind(&id)
                    .bind(&document.title)
                    .bind(&document.description)
                    .bind(&document.url)
                    .bind(&document.document_type)
                    .bind(document.creation_time())
                    .bind(document.last_modification_time())
                    .bind(document.deletion_time())
                    .bind(document.is_deleted())
                    .execute(&self.pool)
            })
            .await;

        match result {
            Ok(_) => {
                debug!(document_id = %id, "document row inserted");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DocumentStoreError::Duplicate(document.id()))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn update(&self, document: &Document) -> Result<bool, DocumentStoreError> {
        let table = self.config.documents_table();
        let query = format!(
            "UPDATE {table} \
             SET title = $2, description = $3, url = $4, document_type = $5, \
                 last_modification_time = CASE WHEN $6 IS NULL THEN last_modification_time \
                                               ELSE GREATEST($6, creation_time) END \
             WHERE id = $1 AND is_deleted = FALSE"
        );
        let id = document.id().to_string();

        let result = self
            .retry()
            .run("update", || {
                sqlx::query(&query)
                    .bind(&id)
                    .bind(&document.title)
                    .bind(&document.description)
                    .bind(&document.url)
                    .bind(&document.document_type)
                    .bind(document.last_modification_time())
                    .execute(&self.pool)
            })
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(
        &self,
        id: Identifier,
        visibility: Visibility,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let query = self.select("id = $1", visibility);
        let id = id.to_string();

        let row: Option<DocumentRow> = self
            .retry()
            .run("find", || {
                sqlx::query_as::<_, DocumentRow>(&query)
                    .bind(&id)
                    .fetch_optional(&self.pool)
            })
            .await
            .map_err(backend)?;

        row.map(Document::try_from).transpose()
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Document>, DocumentStoreError> {
        // "C" collation keeps ordering byte-wise, matching identifier order.
        let query = format!("{} ORDER BY id COLLATE \"C\"", self.select("", visibility));

        let rows: Vec<DocumentRow> = self
            .retry()
            .run("list", || {
                sqlx::query_as::<_, DocumentRow>(&query).fetch_all(&self.pool)
            })
            .await
            .map_err(backend)?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn soft_delete(
        &self,
        id: Identifier,
        at: DateTime<Utc>,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let table = self.config.documents_table();
        // COALESCE keeps the first deletion time on repeated calls.
        let query = format!(
            "UPDATE {table} \
             SET deletion_time = COALESCE(deletion_time, GREATEST($2, creation_time)), \
                 is_deleted = TRUE \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let id = id.to_string();

        let row: Option<DocumentRow> = self
            .retry()
            .run("soft_delete", || {
                sqlx::query_as::<_, DocumentRow>(&query)
                    .bind(&id)
                    .bind(at)
                    .fetch_optional(&self.pool)
            })
            .await
            .map_err(backend)?;

        row.map(Document::try_from).transpose()
    }
}

/// Internal row type for mapping database rows to [`Document`].
#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    title: String,
    description: String,
    url: String,
    document_type: String,
    creation_time: DateTime<Utc>,
    last_modification_time: Option<DateTime<Utc>>,
    deletion_time: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DocumentStoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id: Identifier = row.id.parse()?;
        let audit = AuditInfo::from_parts(
            row.creation_time,
            row.last_modification_time,
            row.deletion_time,
            row.is_deleted,
        )?;
        Ok(Document::from_parts(
            id,
            row.title,
            row.description,
            row.url,
            row.document_type,
            audit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn row(is_deleted: bool, deletion_time: Option<DateTime<Utc>>) -> DocumentRow {
        DocumentRow {
            id: Identifier::generate().to_string(),
            title: "t".into(),
            description: String::new(),
            url: "https://b.s3.amazonaws.com/k.pdf".into(),
            document_type: "PDF".into(),
            creation_time: Utc::now(),
            last_modification_time: None,
            deletion_time,
            is_deleted,
        }
    }

    #[test]
    fn row_maps_to_document() {
        let document = Document::try_from(row(false, None)).unwrap();
        assert!(!document.is_deleted());
        assert_eq!(document.description, "");
    }

    #[test]
    fn inconsistent_deletion_columns_are_corrupt() {
        let err = Document::try_from(row(true, None)).unwrap_err();
        assert!(matches!(err, DocumentStoreError::Corrupt(_)));
    }

    #[test]
    fn bad_identifier_is_corrupt() {
        let mut bad = row(false, None);
        bad.id = "not-an-id".into();
        assert!(matches!(
            Document::try_from(bad),
            Err(DocumentStoreError::Corrupt(_))
        ));
    }

    #[test]
    fn modification_before_creation_is_corrupt() {
        let mut bad = row(false, None);
        bad.last_modification_time = Some(bad.creation_time - Duration::seconds(1));
        assert!(Document::try_from(bad).is_err());
    }

    #[test]
    fn connectivity_errors_map_to_connection() {
        assert!(matches!(
            backend(sqlx::Error::PoolTimedOut),
            DocumentStoreError::Connection(_)
        ));
        assert!(matches!(
            backend(sqlx::Error::RowNotFound),
            DocumentStoreError::Backend(_)
        ));
    }

    #[test]
    fn unknown_ssl_mode_is_rejected() {
        let config = PostgresConfig {
            ssl_mode: Some("sometimes".into()),
            ..PostgresConfig::default()
        };
        assert!(build_connect_options(&config).is_err());
    }

    #[test]
    fn tls_settings_are_accepted() {
        let config = PostgresConfig {
            ssl_mode: Some("verify-full".into()),
            ssl_root_cert: Some("/etc/vellum/ca.pem".into()),
            ssl_cert: Some("/etc/vellum/client.pem".into()),
            ssl_key: Some("/etc/vellum/client.key".into()),
            ..PostgresConfig::default()
        };
        assert!(build_connect_options(&config).is_ok());
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> PostgresConfig {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost:5432/vellum_test".to_string());
        PostgresConfig::new(url)
            .with_table_prefix(format!("test_{}_", Identifier::generate().to_string().to_lowercase()))
    }

    #[tokio::test]
    async fn store_conformance() {
        let store = PostgresDocumentStore::new(test_config())
            .await
            .expect("pool creation should succeed");
        vellum_documents::testing::run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }
}
