//! Agent-facing tool adapter over the gateway's operations.
//!
//! The catalog deliberately omits `/auth` and `/callback`: those require a
//! human in a browser and cannot be driven by an agent.

// crates.io
use serde_json::{Value, json};
// self
use crate::{_prelude::*, session::Gateway};

/// Tool publishing a text post with the cached access token.
pub const CREATE_POST: &str = "create_post";
/// Tool exchanging the cached refresh token for a new pair.
pub const REFRESH_ACCESS_TOKEN: &str = "refresh_access_token";
/// Tool resolving the authenticated user behind the cached token.
pub const GET_AUTHENTICATED_USER: &str = "get_authenticated_user";

/// One callable tool in the catalog.
#[derive(Clone, Debug, Serialize)]
pub struct ToolDescriptor {
	/// Unique name used in the invocation path.
	pub name: &'static str,
	/// Human-readable summary shown to agents.
	pub description: &'static str,
	/// JSON schema of the expected arguments object.
	pub input_schema: Value,
}

/// Catalog of the tools the gateway exposes.
pub fn catalog() -> Vec<ToolDescriptor> {
	vec![
		ToolDescriptor {
			name: CREATE_POST,
			description: "Publish a text post on X with the cached access token.",
			input_schema: json!({
				"type": "object",
				"properties": {
					"text": { "type": "string", "description": "Body of the post." },
				},
				"required": ["text"],
			}),
		},
		ToolDescriptor {
			name: REFRESH_ACCESS_TOKEN,
			description: "Exchange the cached refresh token for a new access token and clear the daily-limit flag.",
			input_schema: json!({ "type": "object", "properties": {} }),
		},
		ToolDescriptor {
			name: GET_AUTHENTICATED_USER,
			description: "Return the id and username of the authenticated X user.",
			input_schema: json!({ "type": "object", "properties": {} }),
		},
	]
}

/// Invokes a tool by name; unknown names are rejected without touching the
/// gateway.
pub async fn invoke(gateway: &Gateway, name: &str, args: &Value) -> Result<Value> {
	match name {
		CREATE_POST => {
			let text = args.get("text").and_then(Value::as_str).ok_or_else(|| Error::ToolCall {
				reason: format!("{CREATE_POST} requires a string `text` argument"),
			})?;
			let id = gateway.publish(text).await?;

			Ok(json!({ "id": id }))
		},
		REFRESH_ACCESS_TOKEN => {
			let tokens = gateway.refresh().await?;

			Ok(json!({
				"access_token": tokens.access.expose(),
				"refresh_token": tokens.refresh.expose(),
			}))
		},
		GET_AUTHENTICATED_USER => {
			let user = gateway.authenticated_user().await?;

			serde_json::to_value(user)
				.map_err(|err| Error::ToolCall { reason: format!("user is not serializable ({err})") })
		},
		other => Err(Error::ToolCall { reason: format!("unknown tool `{other}`") }),
	}
}
