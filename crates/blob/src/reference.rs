use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::BlobError;

/// Key prefix under which rendered documents are stored.
pub const DOCUMENT_PREFIX: &str = "documents";

/// Bytes left unescaped in a key segment: the RFC 3986 unreserved set.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Derive the storage key for a file written at `at`:
/// `documents/{yyyy}/{mm}/{dd}/{file_name}` (UTC date).
pub fn object_key(file_name: &str, at: DateTime<Utc>) -> String {
    format!("{DOCUMENT_PREFIX}/{}/{file_name}", at.format("%Y/%m/%d"))
}

/// Shape of the references handed out for stored objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStyle {
    /// `https://{bucket}.s3.amazonaws.com/{key}`
    #[default]
    VirtualHosted,
    /// `https://s3.{region}.amazonaws.com/{bucket}/{key}`
    PathStyle,
}

/// How references are formed and parsed for one bucket.
///
/// When an endpoint override is configured (`MinIO`, `LocalStack`), references
/// are always path-style under that endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFormat {
    bucket: String,
    region: String,
    style: ReferenceStyle,
    endpoint: Option<String>,
}

impl ReferenceFormat {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            style: ReferenceStyle::default(),
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: ReferenceStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_owned());
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The reference under which `key` is retrievable.
    ///
    /// Each `/`-separated segment of the key is percent-encoded, so
    /// [`parse_reference`](Self::parse_reference) recovers the key exactly.
    pub fn reference_for(&self, key: &str) -> String {
        let bucket = &self.bucket;
        let key = encode_key(key);
        if let Some(endpoint) = &self.endpoint {
            return format!("{endpoint}/{bucket}/{key}");
        }
        match self.style {
            ReferenceStyle::VirtualHosted => format!("https://{bucket}.s3.amazonaws.com/{key}"),
            ReferenceStyle::PathStyle => {
                format!("https://s3.{}.amazonaws.com/{bucket}/{key}", self.region)
            }
        }
    }

    /// Extract the storage key from a reference.
    ///
    /// Accepts every shape this format can produce plus the regional
    /// virtual-hosted form `https://{bucket}.s3.{region}.amazonaws.com/{key}`,
    /// regardless of the configured style.
    pub fn parse_reference(&self, reference: &str) -> Result<String, BlobError> {
        let invalid = || BlobError::InvalidReference(reference.to_owned());
        let url = Url::parse(reference).map_err(|_| invalid())?;
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid());
        }
        let host = url.host_str().ok_or_else(invalid)?;
        let path = url.path();

        let encoded_key = if is_aws_host(host, &format!("{}.s3", self.bucket)) {
            path.trim_start_matches('/')
        } else if is_aws_host(host, "s3") || self.is_endpoint_host(&url) {
            let prefix = format!("{}/{}/", self.endpoint_path(), self.bucket);
            path.strip_prefix(&prefix).ok_or_else(invalid)?
        } else {
            return Err(invalid());
        };

        let key = percent_decode_str(encoded_key)
            .decode_utf8()
            .map_err(|_| invalid())?;
        if key.is_empty() {
            return Err(invalid());
        }
        Ok(key.into_owned())
    }

    fn is_endpoint_host(&self, url: &Url) -> bool {
        let Some(endpoint) = self.endpoint.as_deref().and_then(|e| Url::parse(e).ok()) else {
            return false;
        };
        endpoint.host_str() == url.host_str() && endpoint.port_or_known_default() == url.port_or_known_default()
    }

    /// Path component of the endpoint override, without a trailing slash.
    fn endpoint_path(&self) -> String {
        self.endpoint
            .as_deref()
            .and_then(|e| Url::parse(e).ok())
            .map(|u| u.path().trim_end_matches('/').to_owned())
            .unwrap_or_default()
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// `{prefix}.amazonaws.com` or `{prefix}.{region}.amazonaws.com`.
fn is_aws_host(host: &str, prefix: &str) -> bool {
    let Some(middle) = host
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(".amazonaws.com"))
    else {
        return false;
    };
    middle.is_empty()
        || middle
            .strip_prefix('.')
            .is_some_and(|region| !region.is_empty() && !region.contains('.'))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn format() -> ReferenceFormat {
        ReferenceFormat::new("docs-bucket", "eu-west-1")
    }

    #[test]
    fn key_is_date_partitioned() {
        let at = Utc.with_ymd_and_hms(2024, 11, 3, 23, 59, 0).unwrap();
        assert_eq!(
            object_key("01JD.pdf", at),
            "documents/2024/11/03/01JD.pdf"
        );
    }

    #[test]
    fn virtual_hosted_reference() {
        assert_eq!(
            format().reference_for("documents/2024/11/30/a.pdf"),
            "https://docs-bucket.s3.amazonaws.com/documents/2024/11/30/a.pdf"
        );
    }

    #[test]
    fn path_style_reference() {
        let f = format().with_style(ReferenceStyle::PathStyle);
        assert_eq!(
            f.reference_for("documents/2024/11/30/a.pdf"),
            "https://s3.eu-west-1.amazonaws.com/docs-bucket/documents/2024/11/30/a.pdf"
        );
    }

    #[test]
    fn endpoint_reference() {
        let f = format().with_endpoint("http://localhost:9000/");
        assert_eq!(
            f.reference_for("documents/x.pdf"),
            "http://localhost:9000/docs-bucket/documents/x.pdf"
        );
        assert_eq!(
            f.parse_reference("http://localhost:9000/docs-bucket/documents/x.pdf")
                .unwrap(),
            "documents/x.pdf"
        );
    }

    #[test]
    fn parses_all_aws_shapes() {
        let f = format();
        let key = "documents/2024/11/30/file.pdf";
        for reference in [
            "https://docs-bucket.s3.amazonaws.com/documents/2024/11/30/file.pdf",
            "https://docs-bucket.s3.eu-west-1.amazonaws.com/documents/2024/11/30/file.pdf",
            "https://s3.eu-west-1.amazonaws.com/docs-bucket/documents/2024/11/30/file.pdf",
        ] {
            assert_eq!(f.parse_reference(reference).unwrap(), key, "{reference}");
        }
    }

    #[test]
    fn parse_inverts_reference_for() {
        let key = "documents/2025/01/02/report 7.pdf";
        for f in [format(), format().with_style(ReferenceStyle::PathStyle)] {
            assert_eq!(f.parse_reference(&f.reference_for(key)).unwrap(), key);
        }
    }

    #[test]
    fn reserved_characters_survive_the_round_trip() {
        let endpoint = format().with_endpoint("http://localhost:9000");
        for name in ["a.pdf#x", "a.pdf?x", "b%41.pdf", "report 7.pdf", "résumé.pdf"] {
            let key = format!("documents/2025/01/02/{name}");
            for f in [
                format(),
                format().with_style(ReferenceStyle::PathStyle),
                endpoint.clone(),
            ] {
                let reference = f.reference_for(&key);
                assert!(
                    !reference.contains('#') && !reference.contains('?'),
                    "{reference}"
                );
                assert_eq!(f.parse_reference(&reference).unwrap(), key, "{reference}");
            }
        }
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(
            format().reference_for("documents/2025/01/02/a.pdf#x"),
            "https://docs-bucket.s3.amazonaws.com/documents/2025/01/02/a.pdf%23x"
        );
    }

    #[test]
    fn rejects_foreign_or_malformed_references() {
        let f = format();
        for reference in [
            "not a url",
            "https://other-bucket.s3.amazonaws.com/documents/a.pdf",
            "https://s3.eu-west-1.amazonaws.com/other-bucket/documents/a.pdf",
            "https://example.com/docs-bucket/documents/a.pdf",
            "https://docs-bucket.s3.amazonaws.com/",
            "https://s3.eu-west-1.amazonaws.com/docs-bucket/",
            "https://docs-bucket.s3.attacker.example/documents/a.pdf",
            "https://docs-bucket.s3x.amazonaws.com/documents/a.pdf",
            "https://docs-bucket.s3.eu-west-1.attacker.amazonaws.com/documents/a.pdf",
            "https://s3.attacker.example/docs-bucket/documents/a.pdf",
            "https://docs-bucket.s3.amazonaws.com/documents/a.pdf?x",
            "https://docs-bucket.s3.amazonaws.com/documents/a.pdf#x",
        ] {
            assert!(
                matches!(
                    f.parse_reference(reference),
                    Err(BlobError::InvalidReference(_))
                ),
                "{reference}"
            );
        }
    }
}
