//! The order record and its creation/edit operations.
//!
//! An order is created once through registration, carries an immutable id
//! and tracking code, and is mutated only through [`Order::with_patch`],
//! which owns the one non-trivial invariant of the record: the
//! `statusChangedAt` field tracks the most recent transition into a final
//! status and nothing else.

use crate::settings::DEFAULT_PREFIX;
use crate::status::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when a required order field is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// Customer name is empty after trimming.
	#[error("customer name is required")]
	MissingCustomerName,
	/// Phone is empty after trimming.
	#[error("phone number is required")]
	MissingPhone,
}

/// A registered order.
///
/// Serialized in camelCase so persisted records keep the field names the
/// store has always used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Opaque unique id, assigned at creation.
	pub id: String,
	/// Customer-facing code, `{PREFIX}-{YYYYMMDD}-{XXXX}`. Not guaranteed
	/// globally unique; collisions are accepted as negligible.
	pub tracking_code: String,
	pub customer_name: String,
	pub phone: String,
	#[serde(default)]
	pub item_desc: String,
	#[serde(default)]
	pub note: String,
	#[serde(default)]
	pub channel: String,
	/// Non-negative currency amount.
	#[serde(default)]
	pub amount: u64,
	#[serde(default)]
	pub paid: bool,
	pub status: OrderStatus,
	/// Timestamp of the most recent assignment of a final status. Absent
	/// while the order holds a non-final status. This is not a general
	/// modification time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status_changed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	/// Free-standing delivery estimate, not derived from status.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expected_date: Option<NaiveDate>,
}

/// Input for registering a new order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDraft {
	pub customer_name: String,
	pub phone: String,
	pub item_desc: String,
	pub note: String,
	pub channel: String,
	pub amount: u64,
	pub paid: bool,
	pub status: OrderStatus,
	pub expected_date: Option<NaiveDate>,
}

/// A partial edit of an order. `None` fields are left untouched; the
/// doubled option on `expected_date` distinguishes "leave" from "clear".
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
	pub customer_name: Option<String>,
	pub phone: Option<String>,
	pub item_desc: Option<String>,
	pub note: Option<String>,
	pub channel: Option<String>,
	pub amount: Option<u64>,
	pub paid: Option<bool>,
	pub status: Option<OrderStatus>,
	pub expected_date: Option<Option<NaiveDate>>,
}

impl Order {
	/// Creates a new order from registration input.
	///
	/// Assigns a fresh id and tracking code, stamps `created_at`, and
	/// seeds `status_changed_at` when the initial status is already
	/// final. Fails when the phone or customer name is empty.
	pub fn create(
		draft: OrderDraft,
		prefix: &str,
		now: DateTime<Utc>,
	) -> Result<Self, ValidationError> {
		let phone = draft.phone.trim().to_string();
		if phone.is_empty() {
			return Err(ValidationError::MissingPhone);
		}
		let customer_name = draft.customer_name.trim().to_string();
		if customer_name.is_empty() {
			return Err(ValidationError::MissingCustomerName);
		}

		let status_changed_at = draft.status.is_final().then_some(now);

		Ok(Self {
			id: Uuid::new_v4().to_string(),
			tracking_code: generate_tracking_code(prefix, now),
			customer_name,
			phone,
			item_desc: draft.item_desc,
			note: draft.note,
			channel: draft.channel,
			amount: draft.amount,
			paid: draft.paid,
			status: draft.status,
			status_changed_at,
			created_at: now,
			expected_date: draft.expected_date,
		})
	}

	/// Returns a copy of this order with the patch merged in.
	///
	/// When the patch carries a status different from the current one,
	/// `status_changed_at` is recomputed: stamped with `now` for a final
	/// status, cleared for a non-final one. Assigning the same status
	/// leaves the timestamp untouched. Every status-changing path must go
	/// through here.
	pub fn with_patch(
		&self,
		patch: OrderPatch,
		now: DateTime<Utc>,
	) -> Result<Self, ValidationError> {
		let mut next = self.clone();

		if let Some(name) = patch.customer_name {
			let name = name.trim().to_string();
			if name.is_empty() {
				return Err(ValidationError::MissingCustomerName);
			}
			next.customer_name = name;
		}
		if let Some(phone) = patch.phone {
			let phone = phone.trim().to_string();
			if phone.is_empty() {
				return Err(ValidationError::MissingPhone);
			}
			next.phone = phone;
		}
		if let Some(item_desc) = patch.item_desc {
			next.item_desc = item_desc.trim().to_string();
		}
		if let Some(note) = patch.note {
			next.note = note;
		}
		if let Some(channel) = patch.channel {
			next.channel = channel;
		}
		if let Some(amount) = patch.amount {
			next.amount = amount;
		}
		if let Some(paid) = patch.paid {
			next.paid = paid;
		}
		if let Some(expected_date) = patch.expected_date {
			next.expected_date = expected_date;
		}
		if let Some(status) = patch.status {
			if status != next.status {
				next.status_changed_at = status.is_final().then_some(now);
				next.status = status;
			}
		}

		Ok(next)
	}
}

/// Strips every non-digit character; the result is the match key for
/// phone lookups.
pub fn normalize_phone(raw: &str) -> String {
	raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Alphabet for the random tracking-code suffix (base 36, uppercase).
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a tracking code of the form `{PREFIX}-{YYYYMMDD}-{XXXX}`.
///
/// The suffix comes from a non-cryptographic random source; collisions
/// are possible and not checked. An empty prefix falls back to the
/// default.
pub fn generate_tracking_code(prefix: &str, now: DateTime<Utc>) -> String {
	let prefix = if prefix.is_empty() {
		DEFAULT_PREFIX
	} else {
		prefix
	};
	let mut rng = rand::thread_rng();
	let suffix: String = (0..4)
		.map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
		.collect();
	format!("{}-{}-{}", prefix, now.format("%Y%m%d"), suffix)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn draft(name: &str, phone: &str) -> OrderDraft {
		OrderDraft {
			customer_name: name.to_string(),
			phone: phone.to_string(),
			..OrderDraft::default()
		}
	}

	fn some_time() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_create_assigns_identity_and_timestamps() {
		let now = some_time();
		let order = Order::create(draft("Bat", "9911-2233"), "AB", now).unwrap();

		assert!(!order.id.is_empty());
		assert_eq!(order.created_at, now);
		assert_eq!(order.status, OrderStatus::Purchasing);
		// Non-final initial status leaves the change timestamp absent.
		assert_eq!(order.status_changed_at, None);
	}

	#[test]
	fn test_create_with_final_status_stamps_change_time() {
		let now = some_time();
		let mut input = draft("Bat", "99112233");
		input.status = OrderStatus::Delivered;
		let order = Order::create(input, "AB", now).unwrap();
		assert_eq!(order.status_changed_at, Some(now));
	}

	#[test]
	fn test_create_requires_phone_and_name() {
		let now = some_time();
		assert_eq!(
			Order::create(draft("Bat", "  "), "AB", now),
			Err(ValidationError::MissingPhone)
		);
		assert_eq!(
			Order::create(draft("", "99112233"), "AB", now),
			Err(ValidationError::MissingCustomerName)
		);
	}

	#[test]
	fn test_tracking_code_format() {
		let now = some_time();
		let order = Order::create(draft("Bat", "99112233"), "AB", now).unwrap();
		let parts: Vec<&str> = order.tracking_code.split('-').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "AB");
		assert_eq!(parts[1], "20250101");
		assert_eq!(parts[2].len(), 4);
		assert!(parts[2]
			.chars()
			.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
	}

	#[test]
	fn test_tracking_code_empty_prefix_falls_back() {
		let code = generate_tracking_code("", some_time());
		assert!(code.starts_with("DG-20250101-"));
	}

	#[test]
	fn test_patch_into_final_status_stamps_change_time() {
		let created = some_time();
		let order = Order::create(draft("Bat", "99112233"), "AB", created).unwrap();

		let later = created + chrono::Duration::hours(5);
		let patch = OrderPatch {
			status: Some(OrderStatus::PickedUp),
			..OrderPatch::default()
		};
		let updated = order.with_patch(patch, later).unwrap();
		assert_eq!(updated.status, OrderStatus::PickedUp);
		assert_eq!(updated.status_changed_at, Some(later));
	}

	#[test]
	fn test_patch_back_to_non_final_clears_change_time() {
		let created = some_time();
		let mut input = draft("Bat", "99112233");
		input.status = OrderStatus::Delivered;
		let order = Order::create(input, "AB", created).unwrap();
		assert!(order.status_changed_at.is_some());

		let patch = OrderPatch {
			status: Some(OrderStatus::InTransit),
			..OrderPatch::default()
		};
		let updated = order.with_patch(patch, created).unwrap();
		assert_eq!(updated.status_changed_at, None);
	}

	#[test]
	fn test_patch_same_status_keeps_change_time() {
		let created = some_time();
		let mut input = draft("Bat", "99112233");
		input.status = OrderStatus::PickedUp;
		let order = Order::create(input, "AB", created).unwrap();

		let later = created + chrono::Duration::days(2);
		let patch = OrderPatch {
			status: Some(OrderStatus::PickedUp),
			..OrderPatch::default()
		};
		let updated = order.with_patch(patch, later).unwrap();
		// Re-assigning the current status is not a transition.
		assert_eq!(updated.status_changed_at, Some(created));
	}

	#[test]
	fn test_patch_rejects_emptied_required_fields() {
		let order = Order::create(draft("Bat", "99112233"), "AB", some_time()).unwrap();
		let patch = OrderPatch {
			customer_name: Some("   ".to_string()),
			..OrderPatch::default()
		};
		assert_eq!(
			order.with_patch(patch, some_time()),
			Err(ValidationError::MissingCustomerName)
		);
	}

	#[test]
	fn test_patch_clears_expected_date() {
		let mut input = draft("Bat", "99112233");
		input.expected_date = NaiveDate::from_ymd_opt(2025, 2, 1);
		let order = Order::create(input, "AB", some_time()).unwrap();

		let patch = OrderPatch {
			expected_date: Some(None),
			..OrderPatch::default()
		};
		let updated = order.with_patch(patch, some_time()).unwrap();
		assert_eq!(updated.expected_date, None);
	}

	#[test]
	fn test_normalize_phone() {
		assert_eq!(normalize_phone(" 9911-22 33 "), "99112233");
		assert_eq!(normalize_phone("+976 (99) 11-22-33"), "97699112233");
		assert_eq!(normalize_phone("no digits"), "");
	}

	#[test]
	fn test_order_json_round_trip() {
		let order = Order::create(draft("Bat", "99112233"), "AB", some_time()).unwrap();
		let json = serde_json::to_string(&order).unwrap();
		assert!(json.contains("\"trackingCode\""));
		assert!(json.contains("\"createdAt\""));
		let back: Order = serde_json::from_str(&json).unwrap();
		assert_eq!(back, order);
	}
}
