// std
use std::{
	sync::atomic::{AtomicU32, Ordering},
	time::Duration as StdDuration,
};
// self
use hmrc_token_broker::{
	CancellationToken,
	error::{Error, UpstreamError, UpstreamFailure},
	policy::{ExecutionPolicy, RetryRule},
};

fn upstream(status: u16) -> Error {
	UpstreamError::new(status, "scripted").into()
}

fn policy() -> ExecutionPolicy {
	ExecutionPolicy::hmrc(StdDuration::from_millis(1))
}

#[tokio::test]
async fn rate_limiting_is_retried_indefinitely() {
	let calls = AtomicU32::new(0);
	let policy = policy();
	let outcome = tokio::time::timeout(
		StdDuration::from_millis(250),
		policy.execute(|| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err::<(), _>(upstream(429)) }
		}),
	)
	.await;

	assert!(outcome.is_err(), "The policy should still be retrying when the timeout fires.");
	assert!(calls.load(Ordering::SeqCst) >= 10);
}

#[tokio::test]
async fn request_timeouts_are_retried_until_cancelled() {
	let calls = AtomicU32::new(0);
	let cancel = CancellationToken::new();
	let policy = policy();
	let err = policy
		.execute_until(&cancel, || {
			if calls.fetch_add(1, Ordering::SeqCst) + 1 == 25 {
				cancel.cancel();
			}

			async { Err::<(), _>(upstream(408)) }
		})
		.await
		.expect_err("Cancellation should end the forever rule.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(calls.load(Ordering::SeqCst), 25);
}

#[tokio::test]
async fn internal_server_errors_are_retried_five_times() {
	let calls = AtomicU32::new(0);
	let err = policy()
		.execute(|| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err::<(), _>(upstream(500)) }
		})
		.await
		.expect_err("A persistent 500 should become fatal.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn service_unavailable_is_retried_five_times() {
	let calls = AtomicU32::new(0);
	let err = policy()
		.execute(|| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err::<(), _>(upstream(503)) }
		})
		.await
		.expect_err("A persistent 503 should become fatal.");

	assert_eq!(err.status(), Some(503));
	assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn not_found_resolves_to_absent_result() {
	let calls = AtomicU32::new(0);
	let result = policy()
		.execute(|| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err::<u32, _>(upstream(404)) }
		})
		.await
		.expect("404 should not be an error.");

	assert_eq!(result, None);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transient_failures_recover_on_success() {
	let calls = AtomicU32::new(0);
	let result = policy()
		.execute(|| {
			let call = calls.fetch_add(1, Ordering::SeqCst);

			async move {
				match call {
					0 => Err(upstream(429)),
					1 => Err(upstream(503)),
					2 => Err(upstream(408)),
					3 => Err(upstream(500)),
					_ => Ok("token"),
				}
			}
		})
		.await
		.expect("Transient failures should be absorbed.");

	assert_eq!(result, Some("token"));
	assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn custom_rules_extend_a_policy() {
	let calls = AtomicU32::new(0);
	let policy = ExecutionPolicy::new("custom").with_rule(RetryRule::times(
		"conflict",
		UpstreamFailure::Other(409),
		2,
		StdDuration::ZERO,
	));
	let err = policy
		.execute(|| {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err::<(), _>(upstream(409)) }
		})
		.await
		.expect_err("The custom rule should give up after two retries.");

	assert_eq!(err.status(), Some(409));
	assert_eq!(calls.load(Ordering::SeqCst), 3);
}
