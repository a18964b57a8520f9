//! In-process token cache shared by the gateway's request handlers.

// self
use crate::{_prelude::*, token::TokenSecret};

#[derive(Debug, Default)]
struct SessionState {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	rate_limited_since: Option<OffsetDateTime>,
}

/// Thread-safe in-memory cache for the session's tokens and daily-limit flag.
///
/// All state is volatile; a restart tears it down. The daily-limit flag can
/// only be raised while an access token is cached: no post can reach the quota
/// without a token, so an uncredentialed session never observes the limit.
#[derive(Debug, Default)]
pub struct SessionStore(RwLock<SessionState>);
impl SessionStore {
	/// Replaces both cached tokens in a single write.
	pub fn install_tokens(&self, access: TokenSecret, refresh: TokenSecret) {
		let mut state = self.0.write();

		state.access_token = Some(access);
		state.refresh_token = Some(refresh);
	}

	/// Replaces the cached access token.
	pub fn set_access_token(&self, token: TokenSecret) {
		self.0.write().access_token = Some(token);
	}

	/// Returns the cached access token, if any.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.0.read().access_token.clone()
	}

	/// Replaces the cached refresh token. The empty sentinel is a valid value.
	pub fn set_refresh_token(&self, token: TokenSecret) {
		self.0.write().refresh_token = Some(token);
	}

	/// Returns the cached refresh token, if any.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.0.read().refresh_token.clone()
	}

	/// Raises the daily-limit flag, recording the current instant.
	///
	/// Refused (returning `false`) while no access token is cached.
	pub fn mark_rate_limited(&self) -> bool {
		let mut state = self.0.write();

		if state.access_token.is_none() {
			return false;
		}

		state.rate_limited_since = Some(OffsetDateTime::now_utc());

		true
	}

	/// Clears the daily-limit flag.
	pub fn clear_rate_limit(&self) {
		self.0.write().rate_limited_since = None;
	}

	/// Instant the daily-limit flag was raised, if it is currently raised.
	pub fn rate_limited_since(&self) -> Option<OffsetDateTime> {
		self.0.read().rate_limited_since
	}

	/// Whether the daily-limit flag is currently raised.
	pub fn is_rate_limited(&self) -> bool {
		self.0.read().rate_limited_since.is_some()
	}
}
