use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use vellum_blob::BlobError;

/// Classify an S3 SDK error into a [`BlobError`].
///
/// Any error that came with an HTTP response is a rejection carrying that
/// response's status. Errors without one (dispatch, timeout, construction)
/// mean the store was never heard from.
pub fn classify_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> BlobError
where
    E: std::error::Error + 'static,
{
    let message = DisplayErrorContext(err).to_string();
    match err.raw_response() {
        Some(raw) => BlobError::Rejected {
            status: raw.status().as_u16(),
            message,
        },
        None => BlobError::Storage(message),
    }
}
