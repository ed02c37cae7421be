use serde::Deserialize;
use vellum_blob::{ReferenceFormat, ReferenceStyle};

/// Object storage backend configuration.
#[derive(Deserialize)]
pub struct StorageConfig {
    /// Which backend to use: `"memory"` or `"s3"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Bucket rendered documents are written to.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override for S3-compatible stores (`MinIO`, `LocalStack`).
    /// References are path-style under this endpoint.
    pub endpoint_url: Option<String>,
    /// Shape of the references handed out for stored objects.
    #[serde(default)]
    pub reference_style: ReferenceStyle,
    /// IAM role to assume before talking to S3.
    pub role_arn: Option<String>,
    /// External ID for the role's trust policy.
    pub external_id: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("reference_style", &self.reference_style)
            .field("role_arn", &self.role_arn.as_ref().map(|_| "[REDACTED]"))
            .field("external_id", &self.external_id.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: None,
            reference_style: ReferenceStyle::default(),
            role_arn: None,
            external_id: None,
        }
    }
}

impl StorageConfig {
    pub fn reference_format(&self) -> ReferenceFormat {
        let format =
            ReferenceFormat::new(&self.bucket, &self.region).with_style(self.reference_style);
        match &self.endpoint_url {
            Some(endpoint) => format.with_endpoint(endpoint),
            None => format,
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_bucket() -> String {
    "vellum-documents".to_owned()
}

fn default_region() -> String {
    "us-east-1".to_owned()
}
