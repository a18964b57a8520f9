//! Gateway orchestration across the auth flow, token cache, and X client.

// crates.io
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	config::Config,
	error::ConfigError,
	flows::AuthFlow,
	store::SessionStore,
	token::TokenSecret,
	xapi::{XApiClient, XUser},
};

/// Pair actually written to the store after an exchange; a missing refresh
/// token in the provider response is recorded as the empty sentinel.
#[derive(Clone, Debug)]
pub struct CachedTokens {
	/// Bearer credential now backing API calls.
	pub access: TokenSecret,
	/// Refresh credential, possibly the empty sentinel.
	pub refresh: TokenSecret,
}

/// Confirmation data rendered after a successful callback exchange.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
	/// Authenticated user resolved via `GET /2/users/me`.
	pub user: XUser,
	/// Freshly cached pair; the confirmation page echoes both values.
	pub tokens: CachedTokens,
}

/// Orchestrates the session lifecycle: start auth, complete the callback, post
/// with the cached token, refresh on demand.
///
/// The flow sits behind an async mutex so callback and refresh requests racing
/// each other cannot interleave their store writes. The store itself is shared
/// read-mostly state for the posting path.
pub struct Gateway {
	store: SessionStore,
	flow: AsyncMutex<AuthFlow>,
	api: XApiClient,
	rate_limit_reset: Option<Duration>,
}
impl Gateway {
	/// Builds the gateway plus the shared HTTP transport from configuration.
	pub fn new(config: &Config) -> Result<Self> {
		// Token endpoints answer directly; redirects stay disabled on the shared client.
		let http_client = ReqwestClient::builder()
			.timeout(config.http_timeout)
			.redirect(Policy::none())
			.build()
			.map_err(|source| ConfigError::HttpClientBuild { source })?;
		let flow = AuthFlow::new(config, http_client.clone())?;
		let api = XApiClient::new(http_client, &config.endpoints.api_base)?;

		Ok(Self {
			store: SessionStore::default(),
			flow: AsyncMutex::new(flow),
			api,
			rate_limit_reset: config.rate_limit_reset,
		})
	}

	/// Read access to the token cache.
	pub fn store(&self) -> &SessionStore {
		&self.store
	}

	/// Starts (or restarts) an authorization handshake and returns the URL the
	/// end-user must be redirected to.
	pub async fn authorize_url(&self) -> Url {
		let url = self.flow.lock().await.begin();

		tracing::info!("Started authorization handshake.");

		url
	}

	/// Completes the redirect callback: exchanges the code, installs both
	/// tokens, and resolves the authenticated user for the confirmation page.
	///
	/// A failed exchange leaves the store untouched. A failed user lookup after
	/// a successful exchange keeps the tokens installed.
	pub async fn complete_callback(&self, callback_query: &str) -> Result<CallbackOutcome> {
		let mut flow = self.flow.lock().await;
		let pair = flow.fetch_token(callback_query).await?;
		let refresh = pair.refresh.unwrap_or_else(|| TokenSecret::new(""));

		self.store.install_tokens(pair.access.clone(), refresh.clone());
		tracing::info!("Authorization exchange succeeded.");

		let user = self.api.me(&pair.access).await?;

		Ok(CallbackOutcome { user, tokens: CachedTokens { access: pair.access, refresh } })
	}

	/// Exchanges the cached refresh token for a new pair and clears the
	/// daily-limit flag.
	pub async fn refresh(&self) -> Result<CachedTokens> {
		let flow = self.flow.lock().await;
		let current = self.store.refresh_token().ok_or_else(|| Error::InvalidGrant {
			reason: "No refresh token is cached; complete the authorization flow first".into(),
		})?;

		if current.is_empty() {
			return Err(Error::InvalidGrant {
				reason: "The provider did not issue a refresh token for this session".into(),
			});
		}

		let pair = flow.refresh(current.expose()).await?;
		let refresh = pair.refresh.unwrap_or_else(|| TokenSecret::new(""));

		self.store.install_tokens(pair.access.clone(), refresh.clone());
		self.store.clear_rate_limit();
		tracing::info!("Access token refreshed; daily-limit flag cleared.");

		Ok(CachedTokens { access: pair.access, refresh })
	}

	/// Publishes a text post and returns its identifier.
	///
	/// While the daily-limit flag is raised the call fails immediately without
	/// touching the network; quota exhaustion reported by the API raises the
	/// flag before propagating.
	pub async fn publish(&self, text: &str) -> Result<String> {
		self.ensure_quota_available()?;

		let access = self.store.access_token().ok_or(Error::Unauthenticated)?;

		match self.api.create_post(&access, text).await {
			Ok(id) => {
				tracing::info!(post_id = %id, "Created post.");

				Ok(id)
			},
			Err(Error::DailyLimitExceeded) => {
				self.store.mark_rate_limited();
				tracing::warn!("Daily post quota exhausted; posting fast-fails until a refresh.");

				Err(Error::DailyLimitExceeded)
			},
			Err(err) => Err(err),
		}
	}

	/// Authenticated user behind the cached access token.
	pub async fn authenticated_user(&self) -> Result<XUser> {
		let access = self.store.access_token().ok_or(Error::Unauthenticated)?;

		self.api.me(&access).await
	}

	fn ensure_quota_available(&self) -> Result<()> {
		let Some(since) = self.store.rate_limited_since() else {
			return Ok(());
		};

		match self.rate_limit_reset {
			Some(window) if OffsetDateTime::now_utc() - since >= window => {
				self.store.clear_rate_limit();
				tracing::info!("Daily-limit reset window elapsed; resuming posts.");

				Ok(())
			},
			_ => Err(Error::DailyLimitExceeded),
		}
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("authenticated", &self.store.access_token().is_some())
			.field("rate_limited", &self.store.is_rate_limited())
			.finish()
	}
}
