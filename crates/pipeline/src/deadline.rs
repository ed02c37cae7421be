use std::future::Future;

use tokio::time::Instant;
use tokio::time::error::Elapsed;

/// Await `fut`, giving up at `deadline` if one is set.
///
/// On expiry the future is dropped, which cancels any in-flight request it
/// owns.
pub async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Result<F::Output, Elapsed> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await,
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn no_deadline_waits() {
        let out = within(None, async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            1
        })
        .await;
        assert_eq!(out.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn past_deadline_cancels() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let out = within(Some(deadline), tokio::time::sleep(Duration::from_secs(1))).await;
        assert!(out.is_err());
    }
}
