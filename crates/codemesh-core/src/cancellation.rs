//! Thin wrapper over `tokio_util`'s cancellation token, plus a deadline
//! helper so long pipeline stages can be bounded without threading a
//! timeout argument through every call.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Cancellation(CancellationToken);

impl Cancellation {
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    pub fn child(&self) -> Self {
        Self(self.0.child_token())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.0.cancelled().await
    }

    /// Races `fut` against both cancellation and a wall-clock deadline,
    /// returning `None` if either fires first.
    pub async fn run_with_deadline<T>(
        &self,
        deadline: Duration,
        fut: impl std::future::Future<Output = T>,
    ) -> Option<T> {
        tokio::select! {
            result = fut => Some(result),
            _ = self.cancelled() => None,
            _ = tokio::time::sleep(deadline) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_propagates_to_children() {
        let parent = Cancellation::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn deadline_cuts_off_slow_future() {
        let cancellation = Cancellation::new();
        let result = cancellation
            .run_with_deadline(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too slow"
            })
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn fast_future_completes() {
        let cancellation = Cancellation::new();
        let result = cancellation
            .run_with_deadline(Duration::from_secs(5), async { "fast" })
            .await;
        assert_eq!(result, Some("fast"));
    }
}
