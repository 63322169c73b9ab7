// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end behaviour of the gated client against a local HTTP server.

use std::time::Duration;

use netgate_common_http::{
	gated_client, new_client, CancellationToken, GatedClient, GatedClientOptions, HttpProbe,
	ReachabilityProbe, RetryPolicy, SendError,
};
use reqwest::{Method, Request, StatusCode, Url};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Nothing listens on port 1, so connections are refused immediately.
const REFUSED_URL: &str = "http://127.0.0.1:1/";

fn url(server: &MockServer, p: &str) -> Url {
	format!("{}{}", server.uri(), p).parse().unwrap()
}

async fn mount_health(server: &MockServer, status: u16) {
	Mock::given(method("GET"))
		.and(path("/health"))
		.respond_with(ResponseTemplate::new(status))
		.mount(server)
		.await;
}

async fn client_for(probe_url: Url, max_retries: u32) -> GatedClient {
	let options = GatedClientOptions {
		policy: RetryPolicy::default()
			.with_max_retries(max_retries)
			.with_retry_delay(Duration::from_millis(10)),
		probe_url,
		probe_timeout: Duration::from_millis(500),
		poll_interval: None,
	};
	gated_client(new_client().unwrap(), options).await
}

#[tokio::test]
async fn bad_gateway_is_retried_until_success() {
	let server = MockServer::start().await;
	mount_health(&server, 200).await;

	Mock::given(method("GET"))
		.and(path("/flaky"))
		.respond_with(ResponseTemplate::new(502))
		.up_to_n_times(2)
		.expect(2)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/flaky"))
		.respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
		.expect(1)
		.mount(&server)
		.await;

	let client = client_for(url(&server, "/health"), 25).await;
	assert!(client.monitor().is_available());

	let request = Request::new(Method::GET, url(&server, "/flaky"));
	let response = client.send(request, &CancellationToken::new()).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.text().await.unwrap(), "recovered");
}

#[tokio::test]
async fn internal_server_error_exhausts_budget() {
	let server = MockServer::start().await;
	mount_health(&server, 200).await;

	Mock::given(method("POST"))
		.and(path("/broken"))
		.respond_with(ResponseTemplate::new(500))
		.expect(4)
		.mount(&server)
		.await;

	let client = client_for(url(&server, "/health"), 3).await;

	let mut request = Request::new(Method::POST, url(&server, "/broken"));
	*request.body_mut() = Some("payload".into());
	let err = client.send(request, &CancellationToken::new()).await.unwrap_err();

	match err {
		SendError::RetriesExhausted { attempts, last } => {
			assert_eq!(attempts, 4);
			assert_eq!(last.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
		}
		other => panic!("expected exhaustion, got {other:?}"),
	}
}

#[tokio::test]
async fn non_retryable_status_passes_through() {
	let server = MockServer::start().await;
	mount_health(&server, 200).await;

	Mock::given(method("GET"))
		.and(path("/missing"))
		.respond_with(ResponseTemplate::new(404))
		.expect(1)
		.mount(&server)
		.await;

	let client = client_for(url(&server, "/health"), 25).await;
	let request = Request::new(Method::GET, url(&server, "/missing"));
	let response = client.send(request, &CancellationToken::new()).await.unwrap();

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refused_connections_surface_transport_error() {
	let server = MockServer::start().await;
	mount_health(&server, 200).await;

	let client = client_for(url(&server, "/health"), 2).await;
	let request = Request::new(Method::GET, REFUSED_URL.parse().unwrap());
	let err = client.send(request, &CancellationToken::new()).await.unwrap_err();

	match err {
		SendError::RetriesExhausted { attempts, last } => {
			assert_eq!(attempts, 3);
			assert!(last.is_transport());
		}
		other => panic!("expected exhaustion, got {other:?}"),
	}
}

#[tokio::test]
async fn offline_requests_wait_and_honour_cancellation() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/data"))
		.respond_with(ResponseTemplate::new(200))
		.expect(0)
		.mount(&server)
		.await;

	let client = client_for(REFUSED_URL.parse().unwrap(), 25).await;
	assert!(!client.monitor().is_available());

	let cancel = CancellationToken::new();
	let canceller = {
		let cancel = cancel.clone();
		async move {
			tokio::time::sleep(Duration::from_millis(100)).await;
			cancel.cancel();
		}
	};

	let request = Request::new(Method::GET, url(&server, "/data"));
	let (result, ()) = tokio::join!(client.send(request, &cancel), canceller);
	assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn http_probe_requires_success_status() {
	let server = MockServer::start().await;
	mount_health(&server, 503).await;
	Mock::given(method("GET"))
		.and(path("/ok"))
		.respond_with(ResponseTemplate::new(204))
		.mount(&server)
		.await;

	let client = new_client().unwrap();
	assert!(!HttpProbe::new(client.clone(), url(&server, "/health")).probe().await);
	assert!(HttpProbe::new(client.clone(), url(&server, "/ok")).probe().await);
	assert!(!HttpProbe::new(client, REFUSED_URL.parse().unwrap()).probe().await);
}

#[tokio::test]
async fn slow_probe_times_out_as_unavailable() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/slow"))
		.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
		.mount(&server)
		.await;

	let probe = HttpProbe::new(new_client().unwrap(), url(&server, "/slow"))
		.with_timeout(Duration::from_millis(100));
	assert!(!probe.probe().await);
}
