//! Environment-sourced service configuration.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const X_AUTHORIZE_URL: &str = "https://x.com/i/oauth2/authorize";
const X_TOKEN_URL: &str = "https://api.x.com/2/oauth2/token";
const X_API_BASE_URL: &str = "https://api.x.com";

/// X endpoints the gateway talks to.
///
/// Production values are fixed; tests substitute mock-server URLs.
#[derive(Clone, Debug)]
pub struct Endpoints {
	/// OAuth authorization endpoint end-users are redirected to.
	pub authorize: Url,
	/// OAuth token endpoint serving both grants.
	pub token: Url,
	/// Base URL for X API v2 calls.
	pub api_base: Url,
}
impl Endpoints {
	/// Production X endpoint set.
	pub fn x_com() -> Result<Self, ConfigError> {
		Ok(Self {
			authorize: parse_endpoint("authorization", X_AUTHORIZE_URL)?,
			token: parse_endpoint("token", X_TOKEN_URL)?,
			api_base: parse_endpoint("api_base", X_API_BASE_URL)?,
		})
	}
}

/// Runtime configuration resolved from the process environment.
///
/// `X_CLIENT_ID`, `X_CLIENT_SECRET`, `SERVER_DOMAIN`, and `PORT` are required;
/// the service refuses to start without them.
#[derive(Clone, Debug)]
pub struct Config {
	/// OAuth client identifier issued by the X developer portal.
	pub client_id: String,
	/// OAuth client secret paired with the identifier.
	pub client_secret: String,
	/// Redirect URI registered with X: `{SERVER_DOMAIN}/callback`.
	pub redirect_uri: Url,
	/// Interface the listener binds.
	pub host: String,
	/// Port the listener binds.
	pub port: u16,
	/// Timeout applied to every outbound HTTP request.
	pub http_timeout: std::time::Duration,
	/// Optional window after which the daily-limit flag resets on its own.
	/// Absent means the flag only clears on an explicit refresh.
	pub rate_limit_reset: Option<Duration>,
	/// X endpoints the gateway talks to.
	pub endpoints: Endpoints,
}
impl Config {
	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Loads configuration from an arbitrary variable source.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let client_id = require(&lookup, "X_CLIENT_ID")?;
		let client_secret = require(&lookup, "X_CLIENT_SECRET")?;
		let server_domain = require(&lookup, "SERVER_DOMAIN")?;
		let redirect_uri =
			Url::parse(&format!("{}/callback", server_domain.trim_end_matches('/')))
				.map_err(|source| ConfigError::InvalidUrl { name: "SERVER_DOMAIN", source })?;
		let port = require(&lookup, "PORT")?
			.parse()
			.map_err(|err: std::num::ParseIntError| ConfigError::InvalidVar {
				name: "PORT",
				reason: err.to_string(),
			})?;
		let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.into());
		let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
			Some(raw) =>
				raw.parse().map_err(|err: std::num::ParseIntError| ConfigError::InvalidVar {
					name: "HTTP_TIMEOUT_SECS",
					reason: err.to_string(),
				})?,
			None => DEFAULT_HTTP_TIMEOUT_SECS,
		};
		let rate_limit_reset = match lookup("RATE_LIMIT_RESET_SECS") {
			Some(raw) => {
				let secs: i64 =
					raw.parse().map_err(|err: std::num::ParseIntError| ConfigError::InvalidVar {
						name: "RATE_LIMIT_RESET_SECS",
						reason: err.to_string(),
					})?;

				Some(Duration::seconds(secs))
			},
			None => None,
		};

		Ok(Self {
			client_id,
			client_secret,
			redirect_uri,
			host,
			port,
			http_timeout: std::time::Duration::from_secs(http_timeout_secs),
			rate_limit_reset,
			endpoints: Endpoints::x_com()?,
		})
	}
}

fn require(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
) -> Result<String, ConfigError> {
	match lookup(name) {
		Some(value) if !value.is_empty() => Ok(value),
		_ => Err(ConfigError::MissingVar { name }),
	}
}

fn parse_endpoint(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
		entries.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())).collect()
	}

	fn lookup_in(map: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
		move |name| map.get(name).cloned()
	}

	fn minimal_vars() -> HashMap<String, String> {
		vars(&[
			("X_CLIENT_ID", "client-1"),
			("X_CLIENT_SECRET", "secret-1"),
			("SERVER_DOMAIN", "https://gateway.example.com"),
			("PORT", "8420"),
		])
	}

	#[test]
	fn minimal_environment_parses_with_defaults() {
		let map = minimal_vars();
		let config =
			Config::from_lookup(lookup_in(&map)).expect("Minimal environment should parse.");

		assert_eq!(config.client_id, "client-1");
		assert_eq!(config.redirect_uri.as_str(), "https://gateway.example.com/callback");
		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.port, 8420);
		assert_eq!(config.http_timeout, std::time::Duration::from_secs(30));
		assert!(config.rate_limit_reset.is_none());
		assert_eq!(config.endpoints.token.as_str(), "https://api.x.com/2/oauth2/token");
	}

	#[test]
	fn missing_client_credentials_are_fatal() {
		let mut map = minimal_vars();

		map.remove("X_CLIENT_ID");

		let err = Config::from_lookup(lookup_in(&map))
			.expect_err("Missing client identifier must refuse to start.");

		assert!(matches!(err, ConfigError::MissingVar { name: "X_CLIENT_ID" }));

		let mut map = minimal_vars();

		map.insert("X_CLIENT_SECRET".into(), String::new());

		let err = Config::from_lookup(lookup_in(&map))
			.expect_err("Empty client secret must refuse to start.");

		assert!(matches!(err, ConfigError::MissingVar { name: "X_CLIENT_SECRET" }));
	}

	#[test]
	fn invalid_port_is_reported_with_its_name() {
		let mut map = minimal_vars();

		map.insert("PORT".into(), "not-a-port".into());

		let err = Config::from_lookup(lookup_in(&map)).expect_err("Bad port must be rejected.");

		assert!(matches!(err, ConfigError::InvalidVar { name: "PORT", .. }));
	}

	#[test]
	fn trailing_slash_on_server_domain_is_tolerated() {
		let mut map = minimal_vars();

		map.insert("SERVER_DOMAIN".into(), "https://gateway.example.com/".into());

		let config =
			Config::from_lookup(lookup_in(&map)).expect("Trailing slash should be tolerated.");

		assert_eq!(config.redirect_uri.as_str(), "https://gateway.example.com/callback");
	}

	#[test]
	fn optional_rate_limit_reset_window_parses() {
		let mut map = minimal_vars();

		map.insert("RATE_LIMIT_RESET_SECS".into(), "86400".into());

		let config = Config::from_lookup(lookup_in(&map)).expect("Reset window should parse.");

		assert_eq!(config.rate_limit_reset, Some(Duration::seconds(86_400)));
	}
}
