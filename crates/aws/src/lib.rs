//! Amazon S3 backend for the Vellum object storage gateway.
//!
//! [`S3ObjectStore`] implements [`vellum_blob::ObjectStore`] on top of
//! `aws-sdk-s3`. Credentials come from the standard AWS chain, optionally
//! wrapped in an STS assume-role provider (see [`auth::build_sdk_config`]).

pub mod auth;
pub mod config;
pub mod error;
pub mod s3;

pub use config::AwsBaseConfig;
pub use error::classify_sdk_error;
pub use s3::{S3Config, S3ObjectStore};
