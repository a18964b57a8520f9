//! Redacted token secrets and the pair produced by the two grants.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping credential material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether this is the provider's empty "no refresh token issued" sentinel.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Access/refresh pair returned by the authorization-code and refresh grants.
///
/// `refresh` is `None` when the provider omitted the field; the store records
/// the empty sentinel in that case so "never authorized" stays distinguishable
/// from "authorized without a refresh token".
#[derive(Clone, Debug)]
pub struct TokenPair {
	/// Bearer credential authorizing X API calls.
	pub access: TokenSecret,
	/// Refresh credential, when the provider issued one.
	pub refresh: Option<TokenSecret>,
}
