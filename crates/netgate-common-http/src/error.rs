// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use reqwest::StatusCode;
use thiserror::Error;

/// A cancelled wait for connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("wait for network availability was cancelled")]
pub struct WaitCancelled;

/// Why a single attempt was considered a retryable failure.
#[derive(Debug, Error)]
pub enum AttemptFailure<E> {
	/// The inner sender failed before producing a response.
	#[error("transport error: {0}")]
	Transport(#[source] E),

	/// The server answered with a status the policy treats as transient.
	#[error("server responded with {0}")]
	Status(StatusCode),
}

impl<E> AttemptFailure<E> {
	pub fn is_transport(&self) -> bool {
		matches!(self, AttemptFailure::Transport(_))
	}

	/// The status code, when the failure came from a server response.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			AttemptFailure::Status(status) => Some(*status),
			AttemptFailure::Transport(_) => None,
		}
	}
}

/// Terminal outcome of [`crate::RetryingSender::send`] when no usable response
/// was obtained.
#[derive(Debug, Error)]
pub enum SendError<E> {
	#[error("request failed after {attempts} attempts: {last}")]
	RetriesExhausted {
		attempts: u32,
		#[source]
		last: AttemptFailure<E>,
	},

	#[error("request was cancelled")]
	Cancelled,

	#[error("request body cannot be cloned for retry")]
	RequestNotCloneable,
}

impl<E> SendError<E> {
	pub fn is_cancelled(&self) -> bool {
		matches!(self, SendError::Cancelled)
	}

	/// The last underlying failure, when the attempt budget was spent.
	pub fn last_failure(&self) -> Option<&AttemptFailure<E>> {
		match self {
			SendError::RetriesExhausted { last, .. } => Some(last),
			_ => None,
		}
	}
}

impl<E> From<WaitCancelled> for SendError<E> {
	fn from(_: WaitCancelled) -> Self {
		SendError::Cancelled
	}
}
