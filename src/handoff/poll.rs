use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Re-run `check` until it yields a value or `deadline` has elapsed.
///
/// Between attempts the task sleeps for `interval` (never past the deadline),
/// so other requests keep running on the same workers. No task is spawned:
/// dropping the returned future stops any further checks.
///
/// Returns `None` when the deadline passes without a value.
pub async fn wait_for<T, F, Fut>(mut check: F, deadline: Duration, interval: Duration) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();

    loop {
        if let Some(value) = check().await {
            return Some(value);
        }

        let elapsed = start.elapsed();
        if elapsed >= deadline {
            return None;
        }

        sleep(interval.min(deadline - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::wait_for;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::{Instant, timeout};

    #[tokio::test(start_paused = true)]
    async fn returns_immediately_when_ready() {
        let start = Instant::now();
        let value = wait_for(
            || async { Some(7) },
            Duration::from_secs(10),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(value, Some(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_deadline() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = checks.clone();
        let start = Instant::now();

        let value: Option<()> = wait_for(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { None }
            },
            Duration::from_secs(10),
            Duration::from_millis(300),
        )
        .await;

        let elapsed = start.elapsed();
        assert_eq!(value, None);
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(10) + Duration::from_millis(300));
        // One check at t=0, then one per interval up to the deadline.
        assert!(checks.load(Ordering::SeqCst) >= 30);
    }

    #[tokio::test(start_paused = true)]
    async fn observes_value_within_one_interval() {
        let start = Instant::now();
        let ready_at = Duration::from_secs(2);

        let value = wait_for(
            move || async move { (start.elapsed() >= ready_at).then_some("done") },
            Duration::from_secs(10),
            Duration::from_millis(200),
        )
        .await;

        let elapsed = start.elapsed();
        assert_eq!(value, Some("done"));
        assert!(elapsed >= ready_at);
        assert!(elapsed <= ready_at + Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_future_stops_checks() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = checks.clone();

        let result = timeout(
            Duration::from_secs(1),
            wait_for(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { None::<()> }
                },
                Duration::from_secs(10),
                Duration::from_millis(100),
            ),
        )
        .await;
        assert!(result.is_err());

        let seen = checks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(checks.load(Ordering::SeqCst), seen);
    }
}
