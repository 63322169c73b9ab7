// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connectivity-gated retry with a fixed delay between attempts.

use std::time::Duration;

use reqwest::{Request, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::connectivity::ConnectivityMonitor;
use crate::error::{AttemptFailure, SendError};
use crate::sender::RequestSender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Retries after the first attempt; the budget is `max_retries + 1` sends.
	pub max_retries: u32,
	/// Constant pause between attempts. There is no backoff growth or jitter.
	pub retry_delay: Duration,
	/// Response statuses treated like transport failures.
	pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 25,
			retry_delay: Duration::from_millis(1000),
			retryable_statuses: vec![StatusCode::BAD_GATEWAY, StatusCode::INTERNAL_SERVER_ERROR],
		}
	}
}

impl RetryPolicy {
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}

	pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
		self.retry_delay = retry_delay;
		self
	}

	pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = StatusCode>) -> Self {
		self.retryable_statuses = statuses.into_iter().collect();
		self
	}

	pub fn total_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	pub fn is_retryable_status(&self, status: StatusCode) -> bool {
		self.retryable_statuses.contains(&status)
	}
}

/// Wraps a [`RequestSender`] with a connectivity gate and bounded retry.
///
/// Every attempt first waits on the shared [`ConnectivityMonitor`], then
/// delegates. Transport errors and statuses listed in the policy are retried
/// after `retry_delay`; any other response is returned as-is. Each call keeps
/// its own attempt counter, so concurrent sends never share retry state.
#[derive(Debug, Clone)]
pub struct RetryingSender<S> {
	inner: S,
	monitor: ConnectivityMonitor,
	policy: RetryPolicy,
}

impl<S: RequestSender> RetryingSender<S> {
	pub fn new(inner: S, monitor: ConnectivityMonitor, policy: RetryPolicy) -> Self {
		Self {
			inner,
			monitor,
			policy,
		}
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	pub fn monitor(&self) -> &ConnectivityMonitor {
		&self.monitor
	}

	/// Sends `request`, returning the first non-retryable response.
	///
	/// Fails with [`SendError::RetriesExhausted`] carrying the last failure
	/// once all attempts are spent, or [`SendError::Cancelled`] as soon as
	/// `cancel` fires during a connectivity wait, a send, or a retry delay.
	pub async fn send(
		&self,
		request: Request,
		cancel: &CancellationToken,
	) -> Result<Response, SendError<S::Error>> {
		let span = info_span!("gated_send", method = %request.method(), url = %request.url());
		self.send_with_retries(request, cancel).instrument(span).await
	}

	async fn send_with_retries(
		&self,
		request: Request,
		cancel: &CancellationToken,
	) -> Result<Response, SendError<S::Error>> {
		let max_retries = self.policy.max_retries;
		if max_retries > 0 && request.try_clone().is_none() {
			return Err(SendError::RequestNotCloneable);
		}

		let mut original = Some(request);
		let mut attempt: u32 = 0;

		loop {
			self.monitor.wait_until_available(cancel).await?;

			let attempt_request = if attempt == max_retries {
				original.take()
			} else {
				original.as_ref().and_then(Request::try_clone)
			}
			.ok_or(SendError::RequestNotCloneable)?;

			let failure = tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(SendError::Cancelled),
				result = self.inner.send(attempt_request) => match result {
					Ok(response) if self.policy.is_retryable_status(response.status()) => {
						AttemptFailure::Status(response.status())
					}
					Ok(response) => {
						debug!(attempt, status = %response.status(), "request completed");
						return Ok(response);
					}
					Err(e) => AttemptFailure::Transport(e),
				},
			};

			warn!(
				attempt,
				max_retries,
				error = %failure,
				"request attempt failed"
			);

			if attempt >= max_retries {
				return Err(exhausted(attempt, failure));
			}

			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(SendError::Cancelled),
				_ = tokio::time::sleep(self.policy.retry_delay) => {}
			}

			attempt += 1;
		}
	}
}

/// Terminal error after the zero-based `final_attempt` failed.
fn exhausted<E: std::error::Error>(final_attempt: u32, last: AttemptFailure<E>) -> SendError<E> {
	let attempts = final_attempt.saturating_add(1);
	warn!(attempts, error = %last, "retry attempts exhausted");
	SendError::RetriesExhausted { attempts, last }
}
