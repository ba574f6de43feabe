// ABOUTME: Tests for the transport retry discipline.
// ABOUTME: Transient failures retry to the bound; permanent failures never retry.

use cutover::transport::{RetryPolicy, TransportError, with_retry};
use parking_lot::Mutex;
use std::time::Duration;

fn fast_policy(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

#[tokio::test]
async fn transient_failures_retry_then_succeed() {
    let calls = Mutex::new(0u32);

    let result = with_retry(&fast_policy(3), "push", || {
        let attempt = {
            let mut calls = calls.lock();
            *calls += 1;
            *calls
        };
        async move {
            if attempt < 3 {
                Err(TransportError::Connection("connection reset".to_string()))
            } else {
                Ok("pushed")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "pushed");
    assert_eq!(*calls.lock(), 3);
}

#[tokio::test]
async fn transient_failures_stop_at_the_attempt_bound() {
    let calls = Mutex::new(0u32);

    let result: Result<(), _> = with_retry(&fast_policy(3), "push", || {
        *calls.lock() += 1;
        async { Err(TransportError::Connection("connection reset".to_string())) }
    })
    .await;

    assert!(matches!(result, Err(TransportError::Connection(_))));
    assert_eq!(*calls.lock(), 3);
}

#[tokio::test]
async fn permanent_failure_never_retries() {
    let calls = Mutex::new(0u32);

    let result: Result<(), _> = with_retry(&fast_policy(3), "push", || {
        *calls.lock() += 1;
        async { Err(TransportError::AuthRejected("bad token".to_string())) }
    })
    .await;

    assert!(matches!(result, Err(TransportError::AuthRejected(_))));
    assert_eq!(*calls.lock(), 1);
}

#[tokio::test]
async fn not_found_is_permanent() {
    let calls = Mutex::new(0u32);

    let result: Result<(), _> = with_retry(&fast_policy(3), "pull", || {
        *calls.lock() += 1;
        async { Err(TransportError::NotFound("app:v1".to_string())) }
    })
    .await;

    assert!(matches!(result, Err(TransportError::NotFound(_))));
    assert_eq!(*calls.lock(), 1);
}

#[tokio::test]
async fn timeout_is_transient() {
    let calls = Mutex::new(0u32);

    let result: Result<(), _> = with_retry(&fast_policy(2), "pull", || {
        *calls.lock() += 1;
        async { Err(TransportError::Timeout(Duration::from_secs(5))) }
    })
    .await;

    assert!(matches!(result, Err(TransportError::Timeout(_))));
    assert_eq!(*calls.lock(), 2);
}
