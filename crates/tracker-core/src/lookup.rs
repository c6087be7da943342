//! Customer-facing lookup and staff-side list filtering.
//!
//! The customer lookup has two mutually exclusive modes selected by which
//! input is non-empty, with the tracking code taking precedence. Phone
//! search exposes a customer's whole order history to whoever holds the
//! number, so completed orders age out of it after a grace period; a
//! tracking code is possessed out-of-band and scopes the answer to one
//! order, so code lookups are never suppressed.

use chrono::{DateTime, Duration, Utc};
use tracker_types::{normalize_phone, Order, OrderStatus};

/// Days a completed order stays visible in phone-mode lookups.
pub const VISIBILITY_WINDOW_DAYS: i64 = 14;

/// Runs the customer lookup against the order collection.
///
/// Returns `None` when neither a code nor a phone was supplied (no search
/// performed — distinct from a search that matched nothing, which returns
/// an empty vector).
///
/// Code mode matches the tracking code case-insensitively and returns at
/// most the first match, unconditionally — age and status never hide it.
/// Phone mode matches on normalized phone equality, drops completed
/// orders older than the visibility window, and sorts the survivors
/// newest-first by creation time.
pub fn customer_lookup(
	orders: &[Order],
	code: &str,
	phone: &str,
	now: DateTime<Utc>,
) -> Option<Vec<Order>> {
	let code = code.trim();
	let phone = normalize_phone(phone);

	if !code.is_empty() {
		let found = orders
			.iter()
			.find(|o| o.tracking_code.eq_ignore_ascii_case(code));
		Some(found.into_iter().cloned().collect())
	} else if !phone.is_empty() {
		let mut matches: Vec<Order> = orders
			.iter()
			.filter(|o| normalize_phone(&o.phone) == phone)
			.filter(|o| visible_to_customer(o, now))
			.cloned()
			.collect();
		matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Some(matches)
	} else {
		None
	}
}

/// Whether an order may appear in phone-mode results.
///
/// Orders in a non-final status are always visible. A completed order is
/// visible only while the time since it entered its final status (falling
/// back to creation time for records that predate the timestamp) is
/// within the visibility window.
pub fn visible_to_customer(order: &Order, now: DateTime<Utc>) -> bool {
	if !order.status.is_final() {
		return true;
	}
	let reference = order.status_changed_at.unwrap_or(order.created_at);
	now.signed_duration_since(reference) <= Duration::days(VISIBILITY_WINDOW_DAYS)
}

/// Staff-side list filter.
///
/// An empty query matches everything; otherwise the query must appear
/// case-insensitively in the order's tracking code, customer name, phone,
/// item description or note. The status filter, when present, requires an
/// exact match.
pub fn filter_orders<'a>(
	orders: &'a [Order],
	query: &str,
	status: Option<&OrderStatus>,
) -> Vec<&'a Order> {
	let needle = query.trim().to_lowercase();
	orders
		.iter()
		.filter(|o| {
			let text_ok = needle.is_empty() || {
				let haystack = format!(
					"{} {} {} {} {}",
					o.tracking_code, o.customer_name, o.phone, o.item_desc, o.note
				)
				.to_lowercase();
				haystack.contains(&needle)
			};
			let status_ok = status.is_none_or(|s| &o.status == s);
			text_ok && status_ok
		})
		.collect()
}

/// The customer name on the newest order registered under this phone
/// number, used to prefill the registration form.
pub fn last_customer_name<'a>(orders: &'a [Order], phone: &str) -> Option<&'a str> {
	let phone = normalize_phone(phone);
	if phone.is_empty() {
		return None;
	}
	orders
		.iter()
		.filter(|o| normalize_phone(&o.phone) == phone)
		.max_by_key(|o| o.created_at)
		.map(|o| o.customer_name.as_str())
}
