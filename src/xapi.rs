//! Minimal X API v2 client for the two calls the gateway makes.

// self
use crate::{_prelude::*, error::ConfigError, token::TokenSecret};

/// Response header carrying the remaining 24-hour post budget.
const DAILY_REMAINING_HEADER: &str = "x-user-limit-24hour-remaining";

const BODY_PREVIEW_LEN: usize = 256;

/// Authenticated user as returned by `GET /2/users/me`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XUser {
	/// Numeric user identifier, as the string the API returns.
	pub id: String,
	/// Handle without the leading `@`.
	pub username: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
	data: T,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
	id: String,
}

/// Client for the subset of the X API v2 the gateway uses.
#[derive(Clone, Debug)]
pub struct XApiClient {
	http_client: ReqwestClient,
	posts_endpoint: Url,
	me_endpoint: Url,
}
impl XApiClient {
	/// Builds the client against the given API base URL.
	pub fn new(http_client: ReqwestClient, api_base: &Url) -> Result<Self, ConfigError> {
		let posts_endpoint = api_base
			.join("/2/tweets")
			.map_err(|source| ConfigError::InvalidUrl { name: "api_base", source })?;
		let me_endpoint = api_base
			.join("/2/users/me")
			.map_err(|source| ConfigError::InvalidUrl { name: "api_base", source })?;

		Ok(Self { http_client, posts_endpoint, me_endpoint })
	}

	/// Creates a text post and returns its identifier.
	///
	/// HTTP 429 with a zero remaining daily budget is reported as
	/// [`Error::DailyLimitExceeded`] so the caller can raise the store's flag;
	/// every other non-success response is a generic API failure.
	pub async fn create_post(&self, access_token: &TokenSecret, text: &str) -> Result<String> {
		let response = self
			.http_client
			.post(self.posts_endpoint.clone())
			.bearer_auth(access_token.expose())
			.json(&serde_json::json!({ "text": text }))
			.send()
			.await
			.map_err(|err| Error::Api { reason: format!("request could not be sent ({err})") })?;
		let status = response.status();

		if status == reqwest::StatusCode::TOO_MANY_REQUESTS
			&& daily_budget_exhausted(response.headers())
		{
			return Err(Error::DailyLimitExceeded);
		}
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(Error::Api {
				reason: format!("status {status}: {}", preview(&body)),
			});
		}

		let envelope: DataEnvelope<CreatedPost> = response
			.json()
			.await
			.map_err(|err| Error::Api { reason: format!("malformed post response ({err})") })?;

		Ok(envelope.data.id)
	}

	/// Fetches the authenticated user behind the access token.
	pub async fn me(&self, access_token: &TokenSecret) -> Result<XUser> {
		let response = self
			.http_client
			.get(self.me_endpoint.clone())
			.bearer_auth(access_token.expose())
			.send()
			.await
			.map_err(|err| Error::Api { reason: format!("request could not be sent ({err})") })?;
		let status = response.status();

		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();

			return Err(Error::Api {
				reason: format!("status {status}: {}", preview(&body)),
			});
		}

		let envelope: DataEnvelope<XUser> = response
			.json()
			.await
			.map_err(|err| Error::Api { reason: format!("malformed user response ({err})") })?;

		Ok(envelope.data)
	}
}

fn daily_budget_exhausted(headers: &reqwest::header::HeaderMap) -> bool {
	headers
		.get(DAILY_REMAINING_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.is_some_and(|value| value == "0")
}

fn preview(body: &str) -> &str {
	match body.char_indices().nth(BODY_PREVIEW_LEN) {
		Some((idx, _)) => &body[..idx],
		None => body,
	}
}
