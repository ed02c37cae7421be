use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use vellum_blob::{BlobError, ObjectStore};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::classify_sdk_error;

/// Configuration for the S3 object store.
#[derive(Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Shared AWS configuration (region, role ARN, endpoint URL).
    #[serde(flatten)]
    pub aws: AwsBaseConfig,

    /// Bucket rendered documents are written to.
    pub bucket: String,

    /// Address buckets by path instead of by subdomain. Required by most
    /// S3-compatible stores behind a custom endpoint.
    #[serde(default)]
    pub force_path_style: bool,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("aws", &self.aws)
            .field("bucket", &self.bucket)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl S3Config {
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            aws: AwsBaseConfig::new(region),
            bucket: bucket.into(),
            force_path_style: false,
        }
    }

    /// Set the endpoint URL override. Custom endpoints are addressed path-style.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.aws.endpoint_url = Some(endpoint_url.into());
        self.force_path_style = true;
        self
    }

    #[must_use]
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.aws.role_arn = Some(role_arn.into());
        self
    }

    #[must_use]
    pub fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }
}

/// [`ObjectStore`] backed by Amazon S3 or an S3-compatible service.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ObjectStore {
    /// Build an S3 client from the given configuration.
    pub async fn new(config: &S3Config) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();
        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
        }
    }

    /// Wrap a pre-built client.
    pub fn with_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, data), fields(provider = "aws-s3", size = data.len()))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), BlobError> {
        debug!("uploading object to S3");
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(ObjectCannedAcl::Private)
            .send()
            .await
            .map_err(|e| {
                let err = classify_sdk_error(&e);
                error!(error = %err, "S3 put_object failed");
                err
            })?;
        info!("S3 object uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws-s3"))]
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, BlobError> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(HeadObjectError::is_not_found) => {
                debug!("S3 object absent");
                Ok(false)
            }
            Err(e) => {
                let err = classify_sdk_error(&e);
                error!(error = %err, "S3 head_object failed");
                Err(err)
            }
        }
    }

    #[instrument(skip(self), fields(provider = "aws-s3"))]
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Bytes>, BlobError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(GetObjectError::is_no_such_key) => {
                return Ok(None);
            }
            Err(e) => {
                let err = classify_sdk_error(&e);
                error!(error = %err, "S3 get_object failed");
                return Err(err);
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Storage(format!("failed to read S3 body: {e}")))?;
        Ok(Some(body.into_bytes()))
    }

    #[instrument(skip(self), fields(provider = "aws-s3"))]
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), BlobError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err = classify_sdk_error(&e);
                error!(error = %err, "S3 delete_object failed");
                err
            })?;
        info!("S3 object deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_sets_region_and_bucket() {
        let config = S3Config::new("us-west-2", "docs");
        assert_eq!(config.aws.region, "us-west-2");
        assert_eq!(config.bucket, "docs");
        assert!(!config.force_path_style);
    }

    #[test]
    fn endpoint_override_implies_path_style() {
        let config = S3Config::new("us-east-1", "docs").with_endpoint_url("http://localhost:9000");
        assert!(config.force_path_style);
        assert_eq!(
            config.aws.endpoint_url.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn config_debug_redacts_role() {
        let config =
            S3Config::new("us-east-1", "docs").with_role_arn("arn:aws:iam::123456789012:role/r");
        let debug = format!("{config:?}");
        assert!(debug.contains("docs"));
        assert!(!debug.contains("123456789012"));
    }

    #[test]
    fn config_deserializes_flattened() {
        let config: S3Config = serde_json::from_str(
            r#"{"region":"eu-central-1","bucket":"docs","endpoint_url":"http://minio:9000"}"#,
        )
        .unwrap();
        assert_eq!(config.aws.region, "eu-central-1");
        assert_eq!(config.bucket, "docs");
        assert_eq!(config.aws.endpoint_url.as_deref(), Some("http://minio:9000"));
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    // Expects an S3-compatible store at VELLUM_S3_ENDPOINT (default
    // http://localhost:4566) with the bucket `vellum-test` already created.

    async fn store() -> S3ObjectStore {
        let endpoint = std::env::var("VELLUM_S3_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_owned());
        S3ObjectStore::new(&S3Config::new("us-east-1", "vellum-test").with_endpoint_url(endpoint))
            .await
    }

    #[tokio::test]
    async fn put_exists_get_delete() {
        let store = store().await;
        let key = "documents/integration/roundtrip.pdf";
        store
            .put("vellum-test", key, Bytes::from_static(b"%PDF-1.7"), "application/pdf")
            .await
            .unwrap();
        assert!(store.exists("vellum-test", key).await.unwrap());
        assert_eq!(
            store.get("vellum-test", key).await.unwrap().unwrap().as_ref(),
            b"%PDF-1.7"
        );
        store.delete("vellum-test", key).await.unwrap();
        assert!(!store.exists("vellum-test", key).await.unwrap());
        assert!(store.get("vellum-test", key).await.unwrap().is_none());
    }
}
