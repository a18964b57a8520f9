//! Service-level error types shared across flows, the X client, and handlers.

// self
use crate::_prelude::*;

/// Service-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical service error surfaced by gateway operations.
///
/// Every non-configuration variant is recoverable: the HTTP boundary renders it
/// as a textual non-2xx response and the process keeps serving.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal before the listener binds.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authorization-code exchange or callback validation failed; the session
	/// reverts to unauthenticated and the user retries `/auth`.
	#[error("Authorization exchange failed: {reason}.")]
	AuthExchange {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
	/// Provider rejected the refresh token; a full re-authorization is required.
	#[error("Provider rejected the refresh token: {reason}.")]
	InvalidGrant {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
	/// The daily post quota is exhausted; posting fast-fails until a refresh
	/// clears the flag.
	#[error("Daily post quota is exhausted.")]
	DailyLimitExceeded,
	/// The X API returned a non-success response.
	#[error("X API request failed: {reason}.")]
	Api {
		/// HTTP status and body preview, or the transport failure.
		reason: String,
	},
	/// No token is cached yet; the caller must complete the authorization flow.
	#[error("No access token is cached; complete the authorization flow via /auth first.")]
	Unauthenticated,
	/// Tool invocation was malformed or named an unknown tool.
	#[error("Tool call rejected: {reason}.")]
	ToolCall {
		/// What the caller got wrong.
		reason: String,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised before the service starts.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Required environment variable is absent.
	#[error("Environment variable {name} must be set.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable is present but failed to parse.
	#[error("Environment variable {name} is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Parse failure description.
		reason: String,
	},
	/// Configured URL cannot be parsed.
	#[error("URL in {name} is invalid.")]
	InvalidUrl {
		/// Variable or endpoint name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: ReqwestError,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn config_error_converts_into_service_error() {
		let config_error = ConfigError::MissingVar { name: "X_CLIENT_ID" };
		let error: Error = config_error.into();

		assert!(matches!(error, Error::Config(_)));
		assert!(error.to_string().contains("X_CLIENT_ID"));
	}

	#[test]
	fn messages_name_the_follow_up_action() {
		let exchange = Error::AuthExchange { reason: "state mismatch".into() };
		let grant = Error::InvalidGrant { reason: "token revoked".into() };

		assert_eq!(exchange.to_string(), "Authorization exchange failed: state mismatch.");
		assert_eq!(grant.to_string(), "Provider rejected the refresh token: token revoked.");
		assert!(Error::Unauthenticated.to_string().contains("/auth"));
	}
}
