//! Payload types for the HTTP lookup endpoint.

use crate::order::Order;
use crate::status::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters for `GET /api/track`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackQuery {
	#[serde(default)]
	pub code: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
}

/// One order as shown to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
	pub tracking_code: String,
	pub customer_name: String,
	pub status: OrderStatus,
	/// Progress through the pipeline, 0-100.
	pub progress_percent: u8,
	pub paid: bool,
	pub amount: u64,
	pub item_desc: String,
	pub channel: String,
	pub note: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expected_date: Option<NaiveDate>,
	pub created_at: DateTime<Utc>,
}

impl From<&Order> for TrackedOrder {
	fn from(order: &Order) -> Self {
		Self {
			tracking_code: order.tracking_code.clone(),
			customer_name: order.customer_name.clone(),
			status: order.status.clone(),
			progress_percent: order.status.progress_percent(),
			paid: order.paid,
			amount: order.amount,
			item_desc: order.item_desc.clone(),
			channel: order.channel.clone(),
			note: order.note.clone(),
			expected_date: order.expected_date,
			created_at: order.created_at,
		}
	}
}

/// Response body for a performed lookup. A lookup that matched nothing
/// returns `count == 0` with an empty list; a request that supplied no
/// search key at all is rejected before this type is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackResponse {
	pub count: usize,
	pub orders: Vec<TrackedOrder>,
}

/// Error response body for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine-readable error code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
}
