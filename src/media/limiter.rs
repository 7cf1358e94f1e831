//! Bounded per-page fan-out. One task per item, at most `limit` in flight;
//! the whole batch is awaited before the caller moves to the next page.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Run `f` over every item with at most `limit` running concurrently.
/// Returns how many invocations reported success. Each task holds its permit
/// for its entire lifetime; the guard releases it on every exit path.
pub async fn for_each_bounded<T, F, Fut>(items: Vec<T>, limit: usize, f: F) -> usize
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit));
    let f = Arc::new(f);
    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return false,
            };
            f(item).await
        }));
    }
    join_all(handles)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(true)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_the_permit_cap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let items: Vec<usize> = (0..40).collect();

        let done = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            for_each_bounded(items, 3, move |_| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    true
                }
            })
            .await
        };

        assert_eq!(done, 40);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn counts_only_successful_items() {
        let items: Vec<usize> = (0..10).collect();
        let done = for_each_bounded(items, 4, |n| async move { n % 2 == 0 }).await;
        assert_eq!(done, 5);
    }
}
