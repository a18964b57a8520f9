// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use x_post_gateway::{
	config::{Config, Endpoints},
	error::Error,
	session::Gateway,
	token::TokenSecret,
};

const TOKEN_BODY: &str = "{\"access_token\":\"access-1\",\"refresh_token\":\"refresh-1\",\"token_type\":\"bearer\",\"expires_in\":7200}";
const ME_BODY: &str = "{\"data\":{\"id\":\"42\",\"username\":\"alice\"}}";
const POST_BODY: &str = "{\"data\":{\"id\":\"1234567890\",\"text\":\"hello\"}}";

fn mock_config(server: &MockServer) -> Config {
	Config {
		client_id: "client-it".into(),
		client_secret: "secret-it".into(),
		redirect_uri: Url::parse("http://127.0.0.1:8420/callback")
			.expect("Redirect fixture should parse."),
		host: "127.0.0.1".into(),
		port: 8420,
		http_timeout: std::time::Duration::from_secs(5),
		rate_limit_reset: None,
		endpoints: Endpoints {
			authorize: Url::parse(&server.url("/authorize"))
				.expect("Mock authorization endpoint should parse."),
			token: Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."),
			api_base: Url::parse(&server.base_url()).expect("Mock API base should parse."),
		},
	}
}

fn build_gateway(server: &MockServer) -> Gateway {
	Gateway::new(&mock_config(server)).expect("Gateway should build against the mock server.")
}

fn state_of(url: &Url) -> String {
	url.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.expect("Authorize URL must carry a state parameter.")
}

fn authenticate(gateway: &Gateway) {
	gateway.store().install_tokens(TokenSecret::new("access-0"), TokenSecret::new("refresh-0"));
}

#[tokio::test]
async fn callback_exchange_installs_exactly_the_issued_tokens() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/2/users/me").header("authorization", "Bearer access-1");
			then.status(200).header("content-type", "application/json").body(ME_BODY);
		})
		.await;
	let gateway = build_gateway(&server);
	let state = state_of(&gateway.authorize_url().await);
	let outcome = gateway
		.complete_callback(&format!("state={state}&code=valid-code"))
		.await
		.expect("Callback exchange should succeed.");

	token_mock.assert_async().await;
	me_mock.assert_async().await;

	assert_eq!(outcome.user.id, "42");
	assert_eq!(outcome.user.username, "alice");
	assert_eq!(outcome.tokens.access.expose(), "access-1");
	assert_eq!(outcome.tokens.refresh.expose(), "refresh-1");

	let cached = gateway.store().access_token().expect("Access token must be cached.");

	assert_eq!(cached.expose(), "access-1");

	let cached = gateway.store().refresh_token().expect("Refresh token must be cached.");

	assert_eq!(cached.expose(), "refresh-1");
}

#[tokio::test]
async fn missing_refresh_token_is_cached_as_the_empty_sentinel() {
	let server = MockServer::start_async().await;
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-1\",\"token_type\":\"bearer\",\"expires_in\":7200}",
			);
		})
		.await;
	let _me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/2/users/me");
			then.status(200).header("content-type", "application/json").body(ME_BODY);
		})
		.await;
	let gateway = build_gateway(&server);
	let state = state_of(&gateway.authorize_url().await);
	let outcome = gateway
		.complete_callback(&format!("state={state}&code=valid-code"))
		.await
		.expect("Callback exchange should succeed without a refresh token.");

	assert!(outcome.tokens.refresh.is_empty());

	let cached = gateway.store().refresh_token().expect("Sentinel must be cached.");

	assert!(cached.is_empty());
}

#[tokio::test]
async fn failed_exchange_leaves_the_store_untouched() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"code already used\"}");
		})
		.await;
	let gateway = build_gateway(&server);
	let state = state_of(&gateway.authorize_url().await);
	let err = gateway
		.complete_callback(&format!("state={state}&code=stale-code"))
		.await
		.expect_err("Stale code must fail the exchange.");

	token_mock.assert_async().await;

	assert!(matches!(err, Error::AuthExchange { .. }));
	assert!(gateway.store().access_token().is_none());
	assert!(gateway.store().refresh_token().is_none());
	assert!(!gateway.store().is_rate_limited());
}

#[tokio::test]
async fn state_mismatch_fails_before_any_network_call() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let gateway = build_gateway(&server);
	let _ = gateway.authorize_url().await;
	let err = gateway
		.complete_callback("state=forged&code=valid-code")
		.await
		.expect_err("Forged state must fail the callback.");

	assert!(matches!(err, Error::AuthExchange { .. }));
	assert!(gateway.store().access_token().is_none());
	assert_eq!(token_mock.hits_async().await, 0);
}

#[tokio::test]
async fn successful_post_returns_the_id_and_leaves_the_store_alone() {
	let server = MockServer::start_async().await;
	let post_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/2/tweets")
				.header("authorization", "Bearer access-0")
				.json_body(serde_json::json!({ "text": "hello" }));
			then.status(201).header("content-type", "application/json").body(POST_BODY);
		})
		.await;
	let gateway = build_gateway(&server);

	authenticate(&gateway);

	let id = gateway.publish("hello").await.expect("Post should succeed.");

	post_mock.assert_async().await;

	assert_eq!(id, "1234567890");
	assert!(!gateway.store().is_rate_limited());

	let cached = gateway.store().access_token().expect("Access token must survive a post.");

	assert_eq!(cached.expose(), "access-0");
}

#[tokio::test]
async fn quota_exhaustion_raises_the_flag_and_fast_fails_afterwards() {
	let server = MockServer::start_async().await;
	let post_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/tweets");
			then.status(429).header("x-user-limit-24hour-remaining", "0").body("{}");
		})
		.await;
	let gateway = build_gateway(&server);

	authenticate(&gateway);

	let err = gateway.publish("first").await.expect_err("Exhausted quota must fail the post.");

	assert!(matches!(err, Error::DailyLimitExceeded));
	assert!(gateway.store().is_rate_limited());

	let err = gateway.publish("second").await.expect_err("Posting must fast-fail while limited.");

	assert!(matches!(err, Error::DailyLimitExceeded));

	// One network call total: the second attempt never left the process.
	assert_eq!(post_mock.hits_async().await, 1);
}

#[tokio::test]
async fn a_429_with_budget_remaining_is_not_a_daily_limit() {
	let server = MockServer::start_async().await;
	let _post_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/tweets");
			then.status(429).header("x-user-limit-24hour-remaining", "17").body("{}");
		})
		.await;
	let gateway = build_gateway(&server);

	authenticate(&gateway);

	let err = gateway.publish("hello").await.expect_err("Generic 429 must still fail.");

	assert!(matches!(err, Error::Api { .. }));
	assert!(!gateway.store().is_rate_limited());
}

#[tokio::test]
async fn refresh_swaps_tokens_and_clears_the_flag() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-0");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let gateway = build_gateway(&server);

	authenticate(&gateway);
	gateway.store().mark_rate_limited();
	assert!(gateway.store().is_rate_limited());

	let tokens = gateway.refresh().await.expect("Refresh should succeed.");

	token_mock.assert_async().await;

	assert_eq!(tokens.access.expose(), "access-1");
	assert_eq!(tokens.refresh.expose(), "refresh-1");
	assert!(!gateway.store().is_rate_limited());

	let cached = gateway.store().access_token().expect("Access token must be cached.");

	assert_eq!(cached.expose(), "access-1");
}

#[tokio::test]
async fn revoked_refresh_token_is_a_distinguished_error() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"token revoked\"}");
		})
		.await;
	let gateway = build_gateway(&server);

	authenticate(&gateway);
	gateway.store().mark_rate_limited();

	let err = gateway.refresh().await.expect_err("Revoked refresh token must fail.");

	token_mock.assert_async().await;

	assert!(matches!(err, Error::InvalidGrant { .. }));
	// A failed refresh clears nothing; the flag still fast-fails posts.
	assert!(gateway.store().is_rate_limited());
}

#[tokio::test]
async fn refresh_without_tokens_requires_full_authorization() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let err = gateway.refresh().await.expect_err("Refresh without tokens must fail.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
}

#[tokio::test]
async fn refresh_with_the_empty_sentinel_requires_full_authorization() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let gateway = build_gateway(&server);

	gateway.store().install_tokens(TokenSecret::new("access-0"), TokenSecret::new(""));

	let err = gateway.refresh().await.expect_err("Sentinel refresh token must fail.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
	assert_eq!(token_mock.hits_async().await, 0);
}

#[tokio::test]
async fn elapsed_reset_window_resumes_posting() {
	let server = MockServer::start_async().await;
	let post_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/tweets");
			then.status(201).header("content-type", "application/json").body(POST_BODY);
		})
		.await;
	let mut config = mock_config(&server);

	config.rate_limit_reset = Some(Duration::ZERO);

	let gateway = Gateway::new(&config).expect("Gateway should build against the mock server.");

	authenticate(&gateway);
	gateway.store().mark_rate_limited();

	let id = gateway.publish("hello").await.expect("Elapsed window should allow posting.");

	post_mock.assert_async().await;

	assert_eq!(id, "1234567890");
	assert!(!gateway.store().is_rate_limited());
}
