// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network availability tracking.
//!
//! [`ConnectivityMonitor`] owns a single "network is available" flag. The flag
//! is written only by reachability probes, which run once at construction and
//! again whenever the injected [`NetworkStatusSource`] reports a change.
//! Callers block on [`ConnectivityMonitor::wait_until_available`] until the
//! flag is true.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::AbortHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::WaitCancelled;

/// Well-known endpoint used by [`HttpProbe`] when none is configured.
pub const DEFAULT_PROBE_URL: &str = "http://www.google.com";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const NOTIFY_BUFFER: usize = 16;

/// Best-effort reachability check.
///
/// Implementations never fail: DNS errors, refused connections and timeouts
/// all mean `false`.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
	async fn probe(&self) -> bool;
}

/// Probes by fetching a well-known URL. Only a 2xx response (after redirects)
/// counts as reachable.
#[derive(Debug, Clone)]
pub struct HttpProbe {
	client: Client,
	url: Url,
	timeout: Duration,
}

impl HttpProbe {
	pub fn new(client: Client, url: Url) -> Self {
		Self {
			client,
			url,
			timeout: DEFAULT_PROBE_TIMEOUT,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn url(&self) -> &Url {
		&self.url
	}
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
	async fn probe(&self) -> bool {
		let result = self
			.client
			.get(self.url.clone())
			.timeout(self.timeout)
			.send()
			.await;

		match result {
			Ok(response) if response.status().is_success() => true,
			Ok(response) => {
				debug!(url = %self.url, status = %response.status(), "reachability probe got error status");
				false
			}
			Err(e) => {
				debug!(url = %self.url, error = %e, "reachability probe failed");
				false
			}
		}
	}
}

/// Why the monitor is being asked to re-probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
	/// The platform reported a link-state change.
	LinkChanged,
	/// A polling source ticked.
	Periodic,
}

impl StatusChange {
	pub fn as_str(&self) -> &'static str {
		match self {
			StatusChange::LinkChanged => "link_changed",
			StatusChange::Periodic => "periodic",
		}
	}
}

/// Source of network-status change notifications.
#[async_trait]
pub trait NetworkStatusSource: Send + 'static {
	/// Resolves with the next change; `None` once the source is closed.
	async fn next_change(&mut self) -> Option<StatusChange>;
}

/// Creates a notifier/source pair for bridging platform callbacks.
pub fn status_channel() -> (StatusNotifier, ChannelStatusSource) {
	let (tx, rx) = mpsc::channel(NOTIFY_BUFFER);
	(StatusNotifier { tx }, ChannelStatusSource { rx })
}

/// Sending half of [`status_channel`]. Safe to call from synchronous
/// callbacks.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
	tx: mpsc::Sender<StatusChange>,
}

impl StatusNotifier {
	/// Reports a link-state change. Returns `false` once the listening
	/// monitor is gone.
	pub fn notify(&self) -> bool {
		self.notify_change(StatusChange::LinkChanged)
	}

	pub fn notify_change(&self, change: StatusChange) -> bool {
		match self.tx.try_send(change) {
			Ok(()) => true,
			// A queued event already guarantees a fresh probe.
			Err(mpsc::error::TrySendError::Full(_)) => true,
			Err(mpsc::error::TrySendError::Closed(_)) => false,
		}
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

#[derive(Debug)]
pub struct ChannelStatusSource {
	rx: mpsc::Receiver<StatusChange>,
}

#[async_trait]
impl NetworkStatusSource for ChannelStatusSource {
	async fn next_change(&mut self) -> Option<StatusChange> {
		self.rx.recv().await
	}
}

/// Longest period [`IntervalStatusSource`] will schedule.
pub const MAX_POLL_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Emits [`StatusChange::Periodic`] on a fixed period, for hosts without a
/// link-state notification facility. The first tick fires one period after
/// creation.
///
/// A zero period or one longer than [`MAX_POLL_PERIOD`] yields a source that
/// is closed from the start.
#[derive(Debug)]
pub struct IntervalStatusSource {
	interval: Option<Interval>,
}

impl IntervalStatusSource {
	pub fn new(period: Duration) -> Self {
		let start = Instant::now()
			.checked_add(period)
			.filter(|_| !period.is_zero() && period <= MAX_POLL_PERIOD);

		let interval = match start {
			Some(start) => {
				let mut interval = tokio::time::interval_at(start, period);
				interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
				Some(interval)
			}
			None => {
				warn!(period_secs = period.as_secs(), "poll period out of range, periodic re-probing disabled");
				None
			}
		};
		Self { interval }
	}
}

#[async_trait]
impl NetworkStatusSource for IntervalStatusSource {
	async fn next_change(&mut self) -> Option<StatusChange> {
		let interval = self.interval.as_mut()?;
		interval.tick().await;
		Some(StatusChange::Periodic)
	}
}

/// Shared network-availability flag with a blocking wait.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Clone)]
pub struct ConnectivityMonitor {
	inner: Arc<Inner>,
}

struct Inner {
	probe: Box<dyn ReachabilityProbe>,
	available: watch::Sender<bool>,
	// Serializes probes so an older result never overwrites a newer one.
	refresh: Mutex<()>,
	listener: OnceLock<AbortHandle>,
}

impl Drop for Inner {
	fn drop(&mut self) {
		if let Some(handle) = self.listener.get() {
			handle.abort();
		}
	}
}

impl ConnectivityMonitor {
	/// Creates a monitor whose initial state is the result of an immediate
	/// probe. Without a status source the flag only changes through
	/// [`Self::probe_now`] and [`Self::on_status_changed`].
	pub async fn new(probe: impl ReachabilityProbe + 'static) -> Self {
		let available = probe.probe().await;
		info!(available, "initial connectivity probe");

		let (tx, _rx) = watch::channel(available);
		Self {
			inner: Arc::new(Inner {
				probe: Box::new(probe),
				available: tx,
				refresh: Mutex::new(()),
				listener: OnceLock::new(),
			}),
		}
	}

	/// Creates a monitor and subscribes it to `source`. Every event triggers a
	/// re-probe. Listening stops when the source closes or the last monitor
	/// handle is dropped.
	pub async fn with_status_source<P, S>(probe: P, source: S) -> Self
	where
		P: ReachabilityProbe + 'static,
		S: NetworkStatusSource,
	{
		let monitor = Self::new(probe).await;
		let handle = tokio::spawn(listen(Arc::downgrade(&monitor.inner), source));
		let _ = monitor.inner.listener.set(handle.abort_handle());
		monitor
	}

	/// Re-probes immediately, publishes the result and returns it.
	pub async fn probe_now(&self) -> bool {
		self.refresh("manual").await
	}

	/// Notification callback: re-probes and updates the flag.
	pub async fn on_status_changed(&self, change: StatusChange) {
		self.refresh(change.as_str()).await;
	}

	/// Current snapshot of the flag.
	pub fn is_available(&self) -> bool {
		*self.inner.available.borrow()
	}

	/// Read-only view of availability transitions.
	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.inner.available.subscribe()
	}

	/// Blocks until the network is available or `cancel` fires.
	///
	/// Any number of callers may wait at once; all are released when the flag
	/// becomes true, and each re-checks the flag before returning.
	pub async fn wait_until_available(&self, cancel: &CancellationToken) -> Result<(), WaitCancelled> {
		let mut rx = self.inner.available.subscribe();
		if *rx.borrow_and_update() {
			return Ok(());
		}

		info!("waiting for network to become available");

		tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				debug!("connectivity wait cancelled");
				Err(WaitCancelled)
			}
			changed = rx.wait_for(|available| *available) => match changed {
				Ok(_) => {
					debug!("network available, resuming");
					Ok(())
				}
				// The sender lives in `self`, so it only closes during teardown.
				Err(_) => Err(WaitCancelled),
			},
		}
	}

	async fn refresh(&self, reason: &'static str) -> bool {
		let _guard = self.inner.refresh.lock().await;
		let available = self.inner.probe.probe().await;

		let changed = self.inner.available.send_if_modified(|current| {
			if *current == available {
				false
			} else {
				*current = available;
				true
			}
		});

		if changed {
			info!(available, reason, "network availability changed");
		} else {
			debug!(available, reason, "network availability unchanged");
		}
		available
	}
}

impl fmt::Debug for ConnectivityMonitor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectivityMonitor")
			.field("available", &self.is_available())
			.finish_non_exhaustive()
	}
}

async fn listen<S: NetworkStatusSource>(inner: Weak<Inner>, mut source: S) {
	while let Some(change) = source.next_change().await {
		let Some(inner) = inner.upgrade() else {
			break;
		};
		ConnectivityMonitor { inner }.on_status_changed(change).await;
	}
	debug!("network status listener stopped");
}
