//! CSV import/export for the order collection.
//!
//! Export writes a fixed column set, one row per order. Import maps cells
//! by header name so column order does not matter, tolerates ragged rows
//! and unknown columns, and synthesizes ids for rows that lack one. A
//! file that cannot be read at all aborts the import with no partial
//! application. Imported rows are never deduplicated against existing
//! orders, by id or by tracking code.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use thiserror::Error;
use tracker_types::{Order, OrderStatus};
use uuid::Uuid;

/// Column set of an export, in order. Import recognizes the same names in
/// any order. `statusChangedAt` is intentionally absent: completion age
/// does not survive an export/import round trip.
pub const COLUMNS: [&str; 12] = [
	"id",
	"trackingCode",
	"customerName",
	"phone",
	"itemDesc",
	"amount",
	"paid",
	"status",
	"expectedDate",
	"channel",
	"note",
	"createdAt",
];

/// Errors that can occur while encoding or decoding CSV.
#[derive(Debug, Error)]
pub enum CsvError {
	/// The import file could not be parsed.
	#[error("CSV parse error: {0}")]
	Parse(String),
	/// The export could not be written.
	#[error("CSV encode error: {0}")]
	Encode(String),
}

/// Encodes the order collection as CSV text.
pub fn encode(orders: &[Order]) -> Result<String, CsvError> {
	let mut writer = csv::Writer::from_writer(Vec::new());

	writer
		.write_record(COLUMNS)
		.map_err(|e| CsvError::Encode(e.to_string()))?;

	for order in orders {
		let amount = order.amount.to_string();
		let expected = order
			.expected_date
			.map(|d| d.to_string())
			.unwrap_or_default();
		let created = order
			.created_at
			.to_rfc3339_opts(SecondsFormat::Millis, true);
		writer
			.write_record([
				order.id.as_str(),
				order.tracking_code.as_str(),
				order.customer_name.as_str(),
				order.phone.as_str(),
				order.item_desc.as_str(),
				amount.as_str(),
				if order.paid { "true" } else { "false" },
				order.status.as_str(),
				expected.as_str(),
				order.channel.as_str(),
				order.note.as_str(),
				created.as_str(),
			])
			.map_err(|e| CsvError::Encode(e.to_string()))?;
	}

	let bytes = writer
		.into_inner()
		.map_err(|e| CsvError::Encode(e.to_string()))?;
	String::from_utf8(bytes).map_err(|e| CsvError::Encode(e.to_string()))
}

/// Decodes CSV text into orders.
///
/// `now` is the fallback creation timestamp for rows whose `createdAt`
/// cell is absent or unparseable.
pub fn decode(text: &str, now: DateTime<Utc>) -> Result<Vec<Order>, CsvError> {
	// Strip UTF-8 BOM if present
	let text = text.trim_start_matches('\u{FEFF}');

	let mut reader = csv::ReaderBuilder::new()
		.has_headers(true)
		.flexible(true)
		.from_reader(text.as_bytes());

	let headers = reader
		.headers()
		.map_err(|e| CsvError::Parse(e.to_string()))?
		.clone();

	let mut orders = Vec::new();
	for result in reader.records() {
		let record = result.map_err(|e| CsvError::Parse(e.to_string()))?;

		// Cells map by header name; a missing cell reads as empty.
		let get = |name: &str| -> &str {
			headers
				.iter()
				.position(|h| h == name)
				.and_then(|i| record.get(i))
				.unwrap_or("")
		};

		let id = match get("id") {
			"" => Uuid::new_v4().to_string(),
			raw => raw.to_string(),
		};
		let created_at = DateTime::parse_from_rfc3339(get("createdAt"))
			.map(|d| d.with_timezone(&Utc))
			.unwrap_or(now);

		orders.push(Order {
			id,
			tracking_code: get("trackingCode").to_string(),
			customer_name: get("customerName").to_string(),
			phone: get("phone").to_string(),
			item_desc: get("itemDesc").to_string(),
			note: get("note").to_string(),
			channel: get("channel").to_string(),
			amount: get("amount").parse().unwrap_or(0),
			paid: get("paid") == "true",
			status: OrderStatus::from(get("status")),
			status_changed_at: None,
			created_at,
			expected_date: NaiveDate::parse_from_str(get("expectedDate"), "%Y-%m-%d").ok(),
		});
	}

	Ok(orders)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use tracker_types::OrderDraft;

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
	}

	fn sample_order() -> Order {
		let draft = OrderDraft {
			customer_name: "Bat".to_string(),
			phone: "99112233".to_string(),
			item_desc: "winter boots".to_string(),
			note: "call first".to_string(),
			channel: "Online".to_string(),
			amount: 125000,
			paid: true,
			status: OrderStatus::InTransit,
			expected_date: NaiveDate::from_ymd_opt(2025, 3, 20),
		};
		Order::create(draft, "DG", now()).unwrap()
	}

	#[test]
	fn test_export_header_and_row() {
		let order = sample_order();
		let text = encode(std::slice::from_ref(&order)).unwrap();
		let mut lines = text.lines();

		assert_eq!(
			lines.next().unwrap(),
			"id,trackingCode,customerName,phone,itemDesc,amount,paid,status,expectedDate,channel,note,createdAt"
		);
		let row = lines.next().unwrap();
		assert!(row.contains(&order.id));
		assert!(row.contains(&order.tracking_code));
		assert!(row.contains(",125000,true,In transit,2025-03-20,"));
	}

	#[test]
	fn test_round_trip_preserves_fields() {
		let order = sample_order();
		let text = encode(std::slice::from_ref(&order)).unwrap();
		let back = decode(&text, now()).unwrap();

		assert_eq!(back.len(), 1);
		let restored = &back[0];
		assert_eq!(restored.id, order.id);
		assert_eq!(restored.tracking_code, order.tracking_code);
		assert_eq!(restored.customer_name, order.customer_name);
		assert_eq!(restored.phone, order.phone);
		assert_eq!(restored.item_desc, order.item_desc);
		assert_eq!(restored.amount, order.amount);
		assert_eq!(restored.paid, order.paid);
		assert_eq!(restored.status, order.status);
		assert_eq!(restored.expected_date, order.expected_date);
		assert_eq!(restored.created_at, order.created_at);
		// Completion age is not carried by the format.
		assert_eq!(restored.status_changed_at, None);
	}

	#[test]
	fn test_import_maps_by_header_name() {
		let text = "phone,customerName,status,id\n99112233,Bat,Delivered,abc-1\n";
		let orders = decode(text, now()).unwrap();

		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].id, "abc-1");
		assert_eq!(orders[0].customer_name, "Bat");
		assert_eq!(orders[0].phone, "99112233");
		assert_eq!(orders[0].status, OrderStatus::Delivered);
	}

	#[test]
	fn test_import_synthesizes_missing_id() {
		let text = "customerName,phone\nBat,99112233\nDulam,88110000\n";
		let orders = decode(text, now()).unwrap();

		assert_eq!(orders.len(), 2);
		assert!(!orders[0].id.is_empty());
		assert!(!orders[1].id.is_empty());
		assert_ne!(orders[0].id, orders[1].id);
	}

	#[test]
	fn test_import_fallbacks() {
		let text = "customerName,amount,paid,createdAt,expectedDate\nBat,not-a-number,TRUE,garbage,also-garbage\n";
		let orders = decode(text, now()).unwrap();

		let order = &orders[0];
		assert_eq!(order.amount, 0);
		// Only the literal lowercase "true" counts.
		assert!(!order.paid);
		assert_eq!(order.created_at, now());
		assert_eq!(order.expected_date, None);
	}

	#[test]
	fn test_import_preserves_unknown_status() {
		let text = "customerName,status\nBat,Held at customs\n";
		let orders = decode(text, now()).unwrap();
		assert_eq!(
			orders[0].status,
			OrderStatus::Other("Held at customs".to_string())
		);
	}

	#[test]
	fn test_import_tolerates_ragged_rows() {
		let text = "customerName,phone,amount\nBat\nDulam,88110000,5000\n";
		let orders = decode(text, now()).unwrap();

		assert_eq!(orders.len(), 2);
		assert_eq!(orders[0].customer_name, "Bat");
		assert_eq!(orders[0].phone, "");
		assert_eq!(orders[0].amount, 0);
		assert_eq!(orders[1].amount, 5000);
	}

	#[test]
	fn test_import_strips_bom() {
		let text = "\u{FEFF}customerName,phone\nBat,99112233\n";
		let orders = decode(text, now()).unwrap();
		assert_eq!(orders[0].customer_name, "Bat");
	}
}
