// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connectivity-gated HTTP sending for Netgate.
//!
//! This crate provides:
//! - A pre-configured HTTP client with consistent User-Agent header
//! - [`ConnectivityMonitor`]: a shared network-availability flag that
//!   callers can wait on, refreshed by reachability probes whenever a
//!   [`NetworkStatusSource`] reports a change
//! - [`RetryingSender`]: waits for connectivity before every attempt and
//!   retries transport failures and transient server statuses with a fixed
//!   delay, up to a bounded attempt budget

mod client;
mod connectivity;
mod error;
mod gated;
mod retry;
mod sender;

pub use client::{
	builder, builder_with_user_agent, new_client, new_client_with_timeout, user_agent,
};
pub use connectivity::{
	status_channel, ChannelStatusSource, ConnectivityMonitor, HttpProbe, IntervalStatusSource,
	NetworkStatusSource, ReachabilityProbe, StatusChange, StatusNotifier, DEFAULT_PROBE_TIMEOUT,
	DEFAULT_PROBE_URL, MAX_POLL_PERIOD,
};
pub use error::{AttemptFailure, SendError, WaitCancelled};
pub use gated::{gated_client, GatedClient, GatedClientOptions};
pub use retry::{RetryPolicy, RetryingSender};
pub use sender::RequestSender;

pub use tokio_util::sync::CancellationToken;
