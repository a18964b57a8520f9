//! Authorization-code + PKCE flow against the X OAuth endpoints.
//!
//! The authorize URL (state + S256 challenge) is built locally; both token
//! exchanges are delegated to the `oauth2` crate over the shared reqwest
//! transport. One authorization may be pending at a time: starting a new
//! handshake replaces the previous one, whose callback will then fail state
//! validation.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse,
	TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	config::Config,
	error::ConfigError,
	token::{TokenPair, TokenSecret},
};

/// Scopes requested from X; `offline.access` makes the provider issue refresh
/// tokens.
pub const SCOPES: [&str; 4] = ["tweet.read", "users.read", "tweet.write", "offline.access"];

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Grant a token-endpoint failure came from; refresh failures classify
/// differently.
#[derive(Clone, Copy, Debug)]
enum Grant {
	AuthorizationCode,
	RefreshToken,
}

/// Handshake awaiting its redirect callback; the verifier never leaves the flow.
struct PendingAuthorization {
	state: String,
	pkce_verifier: String,
}

/// Authorization-code + PKCE flow bound to one X application.
pub struct AuthFlow {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestClient,
	authorize_endpoint: Url,
	redirect_uri: Url,
	client_id: String,
	pending: Option<PendingAuthorization>,
}
impl AuthFlow {
	/// Builds the flow from configuration.
	///
	/// The HTTP client must not follow redirects; token endpoints answer
	/// directly.
	pub fn new(config: &Config, http_client: ReqwestClient) -> Result<Self> {
		let auth_url = AuthUrl::new(config.endpoints.authorize.to_string())
			.map_err(|source| ConfigError::InvalidUrl { name: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidUrl { name: "token", source })?;
		let redirect_url = RedirectUrl::new(config.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidUrl { name: "SERVER_DOMAIN", source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		Ok(Self {
			oauth_client,
			http_client,
			authorize_endpoint: config.endpoints.authorize.clone(),
			redirect_uri: config.redirect_uri.clone(),
			client_id: config.client_id.clone(),
			pending: None,
		})
	}

	/// Starts a handshake and returns the URL to redirect the end-user to.
	///
	/// Replaces any authorization already pending; the replaced attempt's
	/// callback will fail state validation.
	pub fn begin(&mut self) -> Url {
		let state = random_string(STATE_LEN);
		let pkce_verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&pkce_verifier);
		let url = self.build_authorize_url(&state, &challenge);

		self.pending = Some(PendingAuthorization { state, pkce_verifier });

		url
	}

	/// Exchanges the redirect callback's query string for a token pair.
	///
	/// The pending authorization is consumed either way; on failure the session
	/// reverts to unauthenticated and the user must restart at `/auth`.
	pub async fn fetch_token(&mut self, callback_query: &str) -> Result<TokenPair> {
		let pending = self.pending.take().ok_or_else(|| Error::AuthExchange {
			reason: "No authorization is pending; request /auth first".into(),
		})?;
		let mut callback = self.redirect_uri.clone();

		callback.set_query(Some(callback_query));

		let mut code = None;
		let mut state = None;
		let mut provider_error = None;

		for (key, value) in callback.query_pairs() {
			match key.as_ref() {
				"code" => code = Some(value.into_owned()),
				"state" => state = Some(value.into_owned()),
				"error" => provider_error = Some(value.into_owned()),
				_ => {},
			}
		}

		if let Some(error) = provider_error {
			return Err(Error::AuthExchange {
				reason: format!("Provider declined the authorization ({error})"),
			});
		}
		if state.as_deref() != Some(pending.state.as_str()) {
			return Err(Error::AuthExchange { reason: "Authorization state mismatch".into() });
		}

		let code = code.ok_or_else(|| Error::AuthExchange {
			reason: "Callback is missing the authorization code".into(),
		})?;
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code))
			.set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier))
			.request_async(&self.http_client)
			.await
			.map_err(|err| map_exchange_error(Grant::AuthorizationCode, err))?;

		Ok(token_pair(response))
	}

	/// Exchanges a refresh token for a new token pair.
	pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
		let secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&secret)
			.request_async(&self.http_client)
			.await
			.map_err(|err| map_exchange_error(Grant::RefreshToken, err))?;

		Ok(token_pair(response))
	}

	fn build_authorize_url(&self, state: &str, challenge: &str) -> Url {
		let mut url = self.authorize_endpoint.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.client_id);
		pairs.append_pair("redirect_uri", self.redirect_uri.as_str());
		pairs.append_pair("scope", &SCOPES.join(" "));
		pairs.append_pair("state", state);
		pairs.append_pair("code_challenge", challenge);
		pairs.append_pair("code_challenge_method", "S256");

		drop(pairs);

		url
	}
}
impl Debug for AuthFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthFlow")
			.field("client_id", &self.client_id)
			.field("redirect_uri", &self.redirect_uri)
			.field("pending", &self.pending.is_some())
			.finish()
	}
}

fn token_pair(response: BasicTokenResponse) -> TokenPair {
	TokenPair {
		access: TokenSecret::new(response.access_token().secret().clone()),
		refresh: response.refresh_token().map(|token| TokenSecret::new(token.secret().clone())),
	}
}

fn map_exchange_error(
	grant: Grant,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) => map_server_error(grant, response),
		RequestTokenError::Request(error) => Error::AuthExchange {
			reason: format!("Token endpoint is unreachable ({error})"),
		},
		RequestTokenError::Parse(error, _body) => Error::TokenResponseParse { source: error },
		RequestTokenError::Other(message) => Error::AuthExchange {
			reason: format!("Token endpoint returned an unexpected response ({message})"),
		},
	}
}

fn map_server_error(grant: Grant, response: BasicErrorResponse) -> Error {
	let code = response.error().as_ref().to_owned();
	let reason = match response.error_description() {
		Some(description) => format!("{code}: {description}"),
		None => code.clone(),
	};

	match grant {
		Grant::RefreshToken if code == "invalid_grant" => Error::InvalidGrant { reason },
		_ => Error::AuthExchange { reason },
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
