//! The fixed status pipeline for order lifecycle tracking.
//!
//! Orders move through seven named stages from purchase to delivery. The
//! sequence is ordered: it drives both the progress display and the
//! "advance one stage" operation. Two stages mark an order as complete,
//! and completeness is a property of the stage itself, not of its
//! position in the sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of an order.
///
/// The seven pipeline stages are listed in shipping order. `Other` carries
/// any status label that names no pipeline stage (typically from imported
/// data); such labels survive storage and export unchanged but take no
/// part in pipeline operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
	/// Goods are being purchased from the supplier.
	Purchasing,
	/// Shipment has left the supplier.
	InTransit,
	/// Shipment has reached the border transfer hub.
	AtBorderHub,
	/// Shipment has arrived in-country.
	InCountry,
	/// Customer has collected the order (final).
	PickedUp,
	/// Courier is delivering the order.
	OutForDelivery,
	/// Order has been delivered (final).
	Delivered,
	/// A status label outside the pipeline, preserved verbatim.
	Other(String),
}

impl OrderStatus {
	/// The pipeline stages in order. `Other` is not a stage.
	pub const ALL: [OrderStatus; 7] = [
		OrderStatus::Purchasing,
		OrderStatus::InTransit,
		OrderStatus::AtBorderHub,
		OrderStatus::InCountry,
		OrderStatus::PickedUp,
		OrderStatus::OutForDelivery,
		OrderStatus::Delivered,
	];

	/// Returns the ordered pipeline stages.
	pub fn all() -> &'static [OrderStatus] {
		&Self::ALL
	}

	/// Returns the display label for this status.
	pub fn as_str(&self) -> &str {
		match self {
			OrderStatus::Purchasing => "Purchasing",
			OrderStatus::InTransit => "In transit",
			OrderStatus::AtBorderHub => "Arrived at border hub",
			OrderStatus::InCountry => "Arrived in-country",
			OrderStatus::PickedUp => "Picked up",
			OrderStatus::OutForDelivery => "Out for delivery",
			OrderStatus::Delivered => "Delivered",
			OrderStatus::Other(label) => label,
		}
	}

	/// Whether this stage marks the order as complete.
	///
	/// Note that `PickedUp` is final without being the last stage; finality
	/// and pipeline position are independent.
	pub fn is_final(&self) -> bool {
		matches!(self, OrderStatus::PickedUp | OrderStatus::Delivered)
	}

	/// Position of this status in the pipeline, or `None` when the status
	/// names no pipeline stage. Progress display clamps `None` to the
	/// first stage.
	pub fn position(&self) -> Option<usize> {
		Self::ALL.iter().position(|s| s == self)
	}

	/// The stage one position later in the pipeline.
	///
	/// Returns `None` at the last stage and for statuses outside the
	/// pipeline. Final stages that are not last (`PickedUp`) still have a
	/// successor.
	pub fn next(&self) -> Option<OrderStatus> {
		self.position().and_then(|i| Self::ALL.get(i + 1)).cloned()
	}

	/// Progress through the pipeline as a whole percentage.
	///
	/// Unknown statuses count as the first stage.
	pub fn progress_percent(&self) -> u8 {
		let index = self.position().unwrap_or(0);
		(((index + 1) as f64 / Self::ALL.len() as f64) * 100.0).round() as u8
	}

	/// Parses a pipeline stage by its display label, case-insensitively.
	///
	/// Unlike the total `From<String>` conversion used for stored data,
	/// this rejects labels that name no stage. Intended for operator
	/// input, where an arbitrary label would be a typo.
	pub fn parse_stage(label: &str) -> Option<OrderStatus> {
		let label = label.trim();
		Self::ALL
			.iter()
			.find(|s| s.as_str().eq_ignore_ascii_case(label))
			.cloned()
	}
}

impl Default for OrderStatus {
	fn default() -> Self {
		OrderStatus::Purchasing
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl From<&str> for OrderStatus {
	fn from(label: &str) -> Self {
		Self::ALL
			.iter()
			.find(|s| s.as_str() == label)
			.cloned()
			.unwrap_or_else(|| OrderStatus::Other(label.to_string()))
	}
}

impl From<String> for OrderStatus {
	fn from(label: String) -> Self {
		match OrderStatus::from(label.as_str()) {
			OrderStatus::Other(_) => OrderStatus::Other(label),
			stage => stage,
		}
	}
}

impl From<OrderStatus> for String {
	fn from(status: OrderStatus) -> Self {
		match status {
			OrderStatus::Other(label) => label,
			stage => stage.as_str().to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pipeline_order() {
		assert_eq!(OrderStatus::ALL.len(), 7);
		assert_eq!(OrderStatus::ALL[0], OrderStatus::Purchasing);
		assert_eq!(OrderStatus::ALL[6], OrderStatus::Delivered);
	}

	#[test]
	fn test_final_statuses() {
		assert!(OrderStatus::PickedUp.is_final());
		assert!(OrderStatus::Delivered.is_final());
		assert!(!OrderStatus::OutForDelivery.is_final());
		assert!(!OrderStatus::Purchasing.is_final());
		assert!(!OrderStatus::Other("Returned".into()).is_final());
	}

	#[test]
	fn test_next_advances_one_stage() {
		assert_eq!(
			OrderStatus::Purchasing.next(),
			Some(OrderStatus::InTransit)
		);
		// PickedUp is final but not last, so it still has a successor.
		assert_eq!(
			OrderStatus::PickedUp.next(),
			Some(OrderStatus::OutForDelivery)
		);
		assert_eq!(OrderStatus::Delivered.next(), None);
		assert_eq!(OrderStatus::Other("Returned".into()).next(), None);
	}

	#[test]
	fn test_position_unknown_is_none() {
		assert_eq!(OrderStatus::Purchasing.position(), Some(0));
		assert_eq!(OrderStatus::Delivered.position(), Some(6));
		assert_eq!(OrderStatus::Other("???".into()).position(), None);
	}

	#[test]
	fn test_progress_percent() {
		assert_eq!(OrderStatus::Purchasing.progress_percent(), 14);
		assert_eq!(OrderStatus::Delivered.progress_percent(), 100);
		// Unknown statuses clamp to the first stage.
		assert_eq!(OrderStatus::Other("???".into()).progress_percent(), 14);
	}

	#[test]
	fn test_label_round_trip() {
		for stage in OrderStatus::all() {
			assert_eq!(&OrderStatus::from(stage.as_str()), stage);
		}
		let odd = OrderStatus::from("Lost at sea");
		assert_eq!(odd, OrderStatus::Other("Lost at sea".into()));
		assert_eq!(String::from(odd), "Lost at sea");
	}

	#[test]
	fn test_parse_stage_rejects_unknown() {
		assert_eq!(
			OrderStatus::parse_stage("in transit"),
			Some(OrderStatus::InTransit)
		);
		assert_eq!(
			OrderStatus::parse_stage(" Delivered "),
			Some(OrderStatus::Delivered)
		);
		assert_eq!(OrderStatus::parse_stage("Lost at sea"), None);
	}

	#[test]
	fn test_serde_uses_labels() {
		let json = serde_json::to_string(&OrderStatus::InCountry).unwrap();
		assert_eq!(json, "\"Arrived in-country\"");
		let back: OrderStatus = serde_json::from_str(&json).unwrap();
		assert_eq!(back, OrderStatus::InCountry);

		let unknown: OrderStatus = serde_json::from_str("\"Held at customs\"").unwrap();
		assert_eq!(unknown, OrderStatus::Other("Held at customs".into()));
	}
}
