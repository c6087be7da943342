//! HTTP server for the customer lookup API.
//!
//! This module provides a minimal HTTP server exposing the customer
//! lookup. It serves read-only queries; every staff mutation goes through
//! the CLI.

use axum::{
	extract::{Query, State},
	http::StatusCode,
	response::Json,
	routing::get,
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracker_config::ApiConfig;
use tracker_core::Tracker;
use tracker_types::{ErrorResponse, TrackQuery, TrackResponse};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the tracker engine for processing requests.
	pub tracker: Arc<RwLock<Tracker>>,
}

/// Starts the HTTP server for the lookup API.
pub async fn start_server(
	api_config: ApiConfig,
	tracker: Arc<RwLock<Tracker>>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { tracker };

	// Build the router with /api base path and the track endpoint
	let app = Router::new()
		.nest("/api", Router::new().route("/track", get(handle_track)))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Tracker API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /api/track requests.
///
/// A request that supplies neither a code nor a phone is rejected with
/// 400; a lookup that matches nothing returns 200 with an empty list.
async fn handle_track(
	State(state): State<AppState>,
	Query(query): Query<TrackQuery>,
) -> Result<Json<TrackResponse>, (StatusCode, Json<ErrorResponse>)> {
	let tracker = state.tracker.read().await;
	match crate::apis::track::track_orders(&query, &tracker) {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Track request rejected: {}", e);
			Err(e.into_response_parts())
		}
	}
}
