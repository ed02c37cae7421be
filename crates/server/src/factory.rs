use std::sync::Arc;

use tracing::info;
use vellum_aws::{S3Config, S3ObjectStore};
use vellum_blob::{MemoryObjectStore, ObjectStore, StorageGateway};
use vellum_documents::{DocumentRepository, DocumentStore};
use vellum_documents_memory::MemoryDocumentStore;
use vellum_documents_postgres::{PostgresConfig, PostgresDocumentStore};
use vellum_pipeline::RenderPipeline;
use vellum_render::{GotenbergClient, Renderer};

use crate::api::AppState;
use crate::config::{DocumentsConfig, RendererConfig, StorageConfig, VellumConfig};
use crate::error::ServerError;

/// Create the renderer client.
pub fn create_renderer(config: &RendererConfig) -> Result<Arc<dyn Renderer>, ServerError> {
    let client = GotenbergClient::new(config.render_config())
        .map_err(|e| ServerError::Config(format!("renderer: {e}")))?;
    info!(endpoint = %client.endpoint(), "renderer configured");
    Ok(Arc::new(client))
}

/// Create an object store from the given configuration.
pub async fn create_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, ServerError> {
    let store: Arc<dyn ObjectStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryObjectStore::new()),
        "s3" => {
            let mut s3 = S3Config::new(&config.region, &config.bucket);
            if let Some(endpoint) = &config.endpoint_url {
                s3 = s3.with_endpoint_url(endpoint);
            }
            if let Some(role_arn) = &config.role_arn {
                s3 = s3.with_role_arn(role_arn);
            }
            s3.aws.external_id.clone_from(&config.external_id);
            Arc::new(S3ObjectStore::new(&s3).await)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unknown storage backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, bucket = %config.bucket, "object store initialized");
    Ok(store)
}

/// Create a document store from the given configuration.
///
/// The `postgres` backend runs its migrations before returning.
pub async fn create_document_store(
    config: &DocumentsConfig,
) -> Result<Arc<dyn DocumentStore>, ServerError> {
    let store: Arc<dyn DocumentStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryDocumentStore::new()),
        "postgres" => {
            let store = PostgresDocumentStore::new(postgres_config(config)?)
                .await
                .map_err(|e| ServerError::Backend(format!("documents postgres: {e}")))?;
            Arc::new(store)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unknown documents backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, "document store initialized");
    Ok(store)
}

fn postgres_config(config: &DocumentsConfig) -> Result<PostgresConfig, ServerError> {
    let url = config.url.as_deref().ok_or_else(|| {
        ServerError::Config("documents postgres backend requires [documents] url".into())
    })?;
    let mut pg = PostgresConfig::new(url)
        .with_table_prefix(&config.table_prefix)
        .with_retry(config.retry);
    pg.pool_size = config.pool_size;
    pg.schema.clone_from(&config.schema);
    pg.ssl_mode.clone_from(&config.ssl_mode);
    pg.ssl_root_cert.clone_from(&config.ssl_root_cert);
    pg.ssl_cert.clone_from(&config.ssl_cert);
    pg.ssl_key.clone_from(&config.ssl_key);
    Ok(pg)
}

/// Wire every component into the shared application state.
pub async fn build_state(config: &VellumConfig) -> Result<AppState, ServerError> {
    let renderer = create_renderer(&config.renderer)?;
    let objects = create_object_store(&config.storage).await?;
    let documents = create_document_store(&config.documents).await?;

    let storage = StorageGateway::new(objects, config.storage.reference_format());
    let pipeline = RenderPipeline::new(renderer, storage, DocumentRepository::new(documents));
    Ok(AppState::new(pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_backends_are_rejected() {
        let storage = StorageConfig {
            backend: "gcs".into(),
            ..StorageConfig::default()
        };
        assert!(matches!(
            create_object_store(&storage).await,
            Err(ServerError::Config(_))
        ));

        let documents = DocumentsConfig {
            backend: "sqlite".into(),
            ..DocumentsConfig::default()
        };
        assert!(matches!(
            create_document_store(&documents).await,
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn postgres_requires_url() {
        let documents = DocumentsConfig {
            backend: "postgres".into(),
            ..DocumentsConfig::default()
        };
        assert!(matches!(
            postgres_config(&documents),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn postgres_config_carries_settings() {
        let documents = DocumentsConfig {
            backend: "postgres".into(),
            url: Some("postgres://db/vellum".into()),
            pool_size: 12,
            schema: "docs".into(),
            table_prefix: "t_".into(),
            ssl_mode: Some("verify-full".into()),
            ssl_root_cert: Some("/etc/vellum/ca.pem".into()),
            ssl_cert: Some("/etc/vellum/client.pem".into()),
            ssl_key: Some("/etc/vellum/client.key".into()),
            ..DocumentsConfig::default()
        };
        let pg = postgres_config(&documents).unwrap();
        assert_eq!(pg.url, "postgres://db/vellum");
        assert_eq!(pg.pool_size, 12);
        assert_eq!(pg.schema, "docs");
        assert_eq!(pg.table_prefix, "t_");
        assert_eq!(pg.ssl_mode.as_deref(), Some("verify-full"));
        assert_eq!(pg.ssl_root_cert.as_deref(), Some("/etc/vellum/ca.pem"));
        assert_eq!(pg.ssl_cert.as_deref(), Some("/etc/vellum/client.pem"));
        assert_eq!(pg.ssl_key.as_deref(), Some("/etc/vellum/client.key"));
    }

    #[tokio::test]
    async fn default_config_builds_in_memory_state() {
        let state = build_state(&VellumConfig::default()).await.unwrap();
        let listed = state.pipeline.documents().list().await;
        assert_eq!(listed.into_data().map(|d| d.len()), Some(0));
    }
}
