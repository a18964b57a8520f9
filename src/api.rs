//! HTTP surface: the OAuth routes plus the tool adapter mount.
//!
//! Every gateway failure is converted to a textual non-2xx response here;
//! nothing propagates far enough to take the process down.

// crates.io
use axum::{
	Json, Router,
	extract::{Path, RawQuery, State},
	http::{StatusCode, header},
	response::{Html, IntoResponse, Response},
	routing::{get, post},
};
use serde_json::{Value, json};
// self
use crate::{_prelude::*, session::Gateway, tools};

/// Handler state shared across routes.
pub type SharedGateway = Arc<Gateway>;

/// Builds the service router with every route mounted.
pub fn router(gateway: SharedGateway) -> Router {
	Router::new()
		.route("/auth", get(start_auth))
		.route("/callback", get(callback))
		.route("/refresh", get(refresh))
		.route("/tools", get(list_tools))
		.route("/tools/{name}", post(call_tool))
		.with_state(gateway)
}

async fn start_auth(State(gateway): State<SharedGateway>) -> Response {
	let url = gateway.authorize_url().await;

	(StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

async fn callback(State(gateway): State<SharedGateway>, RawQuery(query): RawQuery) -> Response {
	match gateway.complete_callback(query.as_deref().unwrap_or_default()).await {
		Ok(outcome) => Html(format!(
			"Authentication successful! User ID: {}, Username: {}, access token: {}, refresh token: {}",
			outcome.user.id,
			outcome.user.username,
			outcome.tokens.access.expose(),
			outcome.tokens.refresh.expose(),
		))
		.into_response(),
		Err(err) => {
			tracing::warn!(error = %err, "Callback exchange failed.");

			failure(format!("Authentication failed: {err}"))
		},
	}
}

async fn refresh(State(gateway): State<SharedGateway>) -> Response {
	match gateway.refresh().await {
		Ok(tokens) => Html(format!(
			"refresh token: {}, access token: {}",
			tokens.refresh.expose(),
			tokens.access.expose(),
		))
		.into_response(),
		Err(err) => {
			tracing::warn!(error = %err, "Refresh failed.");

			failure(format!("Refresh access token failed: {err}"))
		},
	}
}

async fn list_tools(State(_gateway): State<SharedGateway>) -> Json<Value> {
	Json(json!({ "tools": tools::catalog() }))
}

async fn call_tool(
	State(gateway): State<SharedGateway>,
	Path(name): Path<String>,
	body: String,
) -> Json<Value> {
	let args = if body.is_empty() {
		json!({})
	} else {
		match serde_json::from_str(&body) {
			Ok(value) => value,
			Err(err) =>
				return Json(json!({ "ok": false, "error": format!("arguments are not valid JSON: {err}") })),
		}
	};

	match tools::invoke(&gateway, &name, &args).await {
		Ok(result) => Json(json!({ "ok": true, "result": result })),
		Err(err) => {
			tracing::warn!(tool = %name, error = %err, "Tool call failed.");

			Json(json!({ "ok": false, "error": err.to_string() }))
		},
	}
}

fn failure(message: String) -> Response {
	(StatusCode::INTERNAL_SERVER_ERROR, Html(message)).into_response()
}
