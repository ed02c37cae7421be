use thiserror::Error;

/// Errors produced by the rendering client.
///
/// The client does not translate these into envelopes. The pipeline is the
/// single place that turns a render error into a failure result.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer could not be reached or the exchange failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The renderer answered with a non-success status.
    #[error("renderer returned HTTP {status}: {body}")]
    Status {
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_body() {
        let err = RenderError::Status {
            status: 503,
            body: "Chromium is busy".into(),
        };
        assert_eq!(
            err.to_string(),
            "renderer returned HTTP 503: Chromium is busy"
        );
    }
}
