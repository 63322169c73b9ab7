// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};

/// Sends exactly one request and yields one response or a transport error.
///
/// Status codes are not interpreted here; any response the server produced
/// is `Ok`.
#[async_trait]
pub trait RequestSender: Send + Sync {
	type Error: std::error::Error + Send + Sync + 'static;

	async fn send(&self, request: Request) -> Result<Response, Self::Error>;
}

#[async_trait]
impl RequestSender for Client {
	type Error = reqwest::Error;

	async fn send(&self, request: Request) -> Result<Response, Self::Error> {
		self.execute(request).await
	}
}

#[async_trait]
impl<S: RequestSender + ?Sized> RequestSender for Arc<S> {
	type Error = S::Error;

	async fn send(&self, request: Request) -> Result<Response, Self::Error> {
		(**self).send(request).await
	}
}
