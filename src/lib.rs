//! HTTP gateway that brokers X (Twitter) OAuth 2.0 authorization-code + PKCE flow,
//! caches the issued tokens in process memory, and exposes posting as agent-callable
//! tools alongside the plain OAuth routes.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod config;
pub mod error;
pub mod flows;
pub mod session;
pub mod store;
pub mod token;
pub mod tools;
pub mod xapi;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
// Server-binary dependencies; the library targets never touch them.
use {color_eyre as _, dotenvy as _, tokio as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tower as _};
