//! Customer lookup endpoint.
//!
//! Customers query order progress with a tracking code or a phone
//! number. The endpoint distinguishes "no search key supplied" (an error)
//! from "searched and found nothing" (an empty result list), mirroring
//! the two empty states of the lookup itself.

use axum::http::StatusCode;
use axum::response::Json;
use thiserror::Error;
use tracker_core::Tracker;
use tracker_types::{ErrorResponse, TrackQuery, TrackResponse, TrackedOrder};

/// Errors that can occur while handling a track request.
#[derive(Debug, Error)]
pub enum TrackError {
	#[error("supply a tracking code or a phone number")]
	MissingQuery,
}

impl TrackError {
	/// Maps the error to an HTTP status and response body.
	pub fn into_response_parts(self) -> (StatusCode, Json<ErrorResponse>) {
		let message = self.to_string();
		let (status, code) = match self {
			TrackError::MissingQuery => (StatusCode::BAD_REQUEST, "MISSING_QUERY"),
		};
		(
			status,
			Json(ErrorResponse {
				error: code.to_string(),
				message,
			}),
		)
	}
}

/// Runs the customer lookup for a track request.
pub fn track_orders(query: &TrackQuery, tracker: &Tracker) -> Result<TrackResponse, TrackError> {
	let code = query.code.as_deref().unwrap_or("");
	let phone = query.phone.as_deref().unwrap_or("");

	match tracker.lookup(code, phone) {
		Some(orders) => Ok(TrackResponse {
			count: orders.len(),
			orders: orders.iter().map(TrackedOrder::from).collect(),
		}),
		None => Err(TrackError::MissingQuery),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_storage::implementations::memory::MemoryStorage;
	use tracker_storage::StorageService;
	use tracker_types::{OrderDraft, Settings};

	async fn tracker_with_one_order() -> (Tracker, String) {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let mut tracker = Tracker::load(service, Settings::default()).await;
		let order = tracker
			.register(OrderDraft {
				customer_name: "Bat".to_string(),
				phone: "99112233".to_string(),
				..OrderDraft::default()
			})
			.await
			.unwrap();
		(tracker, order.tracking_code)
	}

	#[tokio::test]
	async fn test_missing_query_is_rejected() {
		let (tracker, _) = tracker_with_one_order().await;
		let result = track_orders(&TrackQuery::default(), &tracker);
		assert!(matches!(result, Err(TrackError::MissingQuery)));

		let (status, _) = TrackError::MissingQuery.into_response_parts();
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_code_lookup_returns_progress() {
		let (tracker, code) = tracker_with_one_order().await;
		let query = TrackQuery {
			code: Some(code.to_lowercase()),
			phone: None,
		};

		let response = track_orders(&query, &tracker).unwrap();
		assert_eq!(response.count, 1);
		assert_eq!(response.orders[0].tracking_code, code);
		assert_eq!(response.orders[0].progress_percent, 14);
	}

	#[tokio::test]
	async fn test_zero_matches_is_empty_not_error() {
		let (tracker, _) = tracker_with_one_order().await;
		let query = TrackQuery {
			code: None,
			phone: Some("00000000".to_string()),
		};

		let response = track_orders(&query, &tracker).unwrap();
		assert_eq!(response.count, 0);
		assert!(response.orders.is_empty());
	}
}
