//! Core engine for the order tracker.
//!
//! The [`Tracker`] owns the one in-memory copy of the order collection
//! and the settings object, both loaded once at startup from storage.
//! Every command runs to completion against the in-memory state and then
//! persists the affected collection whole (write-through, not
//! transactional: a crash between mutation and persistence loses at most
//! the latest change). Nothing here retries, and no failure is fatal —
//! a failed command leaves state unchanged.

use chrono::Utc;
use thiserror::Error;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{
	Order, OrderDraft, OrderPatch, OrderStatus, Settings, SettingsPatch, ValidationError,
};

pub mod codec;
pub mod lookup;

pub use codec::CsvError;

/// Storage key for the order collection.
pub const ORDERS_KEY: &str = "orders_v1";
/// Storage key for the settings object.
pub const SETTINGS_KEY: &str = "settings_v2";

/// Errors that can occur while running tracker commands.
#[derive(Debug, Error)]
pub enum TrackerError {
	/// A required field is missing; the operation was aborted with no
	/// state change.
	#[error("validation error: {0}")]
	Validation(#[from] ValidationError),
	/// No order with the given id exists.
	#[error("order not found: {0}")]
	NotFound(String),
	/// The storage backend failed to persist a mutation.
	#[error("storage error: {0}")]
	Storage(#[from] StorageError),
	/// A CSV import file could not be parsed; nothing was applied.
	#[error("{0}")]
	Csv(#[from] CsvError),
}

/// The application state container and command surface.
pub struct Tracker {
	storage: StorageService,
	orders: Vec<Order>,
	settings: Settings,
}

impl Tracker {
	/// Loads orders and settings from storage.
	///
	/// An absent or unreadable order collection starts empty; absent or
	/// unreadable settings fall back to `seed` (the configured first-run
	/// values). The seed is not written back until a mutation happens.
	pub async fn load(storage: StorageService, seed: Settings) -> Self {
		let orders: Vec<Order> = storage.retrieve_or_default(ORDERS_KEY).await;
		let settings = match storage.retrieve(SETTINGS_KEY).await {
			Ok(settings) => settings,
			Err(StorageError::NotFound) => seed,
			Err(e) => {
				tracing::warn!("Discarding unreadable settings: {}", e);
				seed
			}
		};
		tracing::info!("Loaded {} orders", orders.len());
		Self {
			storage,
			orders,
			settings,
		}
	}

	/// The current order collection, newest registrations first.
	pub fn orders(&self) -> &[Order] {
		&self.orders
	}

	/// The current settings.
	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	/// Looks up an order by id.
	pub fn get(&self, id: &str) -> Result<&Order, TrackerError> {
		self.orders
			.iter()
			.find(|o| o.id == id)
			.ok_or_else(|| TrackerError::NotFound(id.to_string()))
	}

	/// Compares a supplied PIN against the stored one. Plain equality;
	/// this gates the staff workflow, nothing more.
	pub fn verify_pin(&self, pin: &str) -> bool {
		pin == self.settings.admin_pin
	}

	/// Registers a new order at the front of the collection.
	pub async fn register(&mut self, draft: OrderDraft) -> Result<Order, TrackerError> {
		let order = Order::create(draft, &self.settings.prefix, Utc::now())?;
		self.orders.insert(0, order.clone());
		self.persist_orders().await?;
		tracing::info!("Registered order {}", order.tracking_code);
		Ok(order)
	}

	/// Applies a partial edit to an order.
	pub async fn edit(&mut self, id: &str, patch: OrderPatch) -> Result<Order, TrackerError> {
		let index = self
			.orders
			.iter()
			.position(|o| o.id == id)
			.ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

		let updated = self.orders[index].with_patch(patch, Utc::now())?;
		self.orders[index] = updated.clone();
		self.persist_orders().await?;
		Ok(updated)
	}

	/// Assigns a status directly, regardless of the current one. Backward
	/// jumps are allowed; this is how mistaken assignments get corrected.
	pub async fn set_status(
		&mut self,
		id: &str,
		status: OrderStatus,
	) -> Result<Order, TrackerError> {
		self.edit(
			id,
			OrderPatch {
				status: Some(status),
				..OrderPatch::default()
			},
		)
		.await
	}

	/// Moves an order exactly one pipeline stage forward.
	///
	/// At the last stage, or on a status outside the pipeline, this is a
	/// no-op that returns the order unchanged.
	pub async fn advance(&mut self, id: &str) -> Result<Order, TrackerError> {
		let (next, current) = {
			let order = self.get(id)?;
			(order.status.next(), order.clone())
		};
		match next {
			Some(status) => self.set_status(id, status).await,
			None => {
				tracing::debug!(
					"Order {} cannot advance past '{}'",
					current.tracking_code,
					current.status
				);
				Ok(current)
			}
		}
	}

	/// Deletes an order and returns the removed record.
	pub async fn delete(&mut self, id: &str) -> Result<Order, TrackerError> {
		let index = self
			.orders
			.iter()
			.position(|o| o.id == id)
			.ok_or_else(|| TrackerError::NotFound(id.to_string()))?;

		let removed = self.orders.remove(index);
		self.persist_orders().await?;
		tracing::info!("Deleted order {}", removed.tracking_code);
		Ok(removed)
	}

	/// Removes every stored order.
	pub async fn clear_orders(&mut self) -> Result<usize, TrackerError> {
		let count = self.orders.len();
		self.orders.clear();
		self.persist_orders().await?;
		tracing::info!("Cleared {} orders", count);
		Ok(count)
	}

	/// Customer lookup; see [`lookup::customer_lookup`].
	pub fn lookup(&self, code: &str, phone: &str) -> Option<Vec<Order>> {
		lookup::customer_lookup(&self.orders, code, phone, Utc::now())
	}

	/// Staff list filter; see [`lookup::filter_orders`].
	pub fn filter(&self, query: &str, status: Option<&OrderStatus>) -> Vec<&Order> {
		lookup::filter_orders(&self.orders, query, status)
	}

	/// Name autofill for registration; see [`lookup::last_customer_name`].
	pub fn last_customer_name(&self, phone: &str) -> Option<&str> {
		lookup::last_customer_name(&self.orders, phone)
	}

	/// Imports orders from CSV text, prepending them to the collection.
	/// No dedup against existing orders. A parse failure applies nothing.
	pub async fn import_csv(&mut self, text: &str) -> Result<usize, TrackerError> {
		let mut imported = codec::decode(text, Utc::now())?;
		let count = imported.len();
		imported.append(&mut self.orders);
		self.orders = imported;
		self.persist_orders().await?;
		tracing::info!("Imported {} orders", count);
		Ok(count)
	}

	/// Exports the whole collection as CSV text.
	pub fn export_csv(&self) -> Result<String, TrackerError> {
		Ok(codec::encode(&self.orders)?)
	}

	/// Applies a settings edit and persists it.
	pub async fn update_settings(
		&mut self,
		patch: SettingsPatch,
	) -> Result<Settings, TrackerError> {
		let updated = self.settings.with_patch(patch);
		self.storage.store(SETTINGS_KEY, &updated).await?;
		self.settings = updated.clone();
		Ok(updated)
	}

	async fn persist_orders(&self) -> Result<(), StorageError> {
		self.storage.store(ORDERS_KEY, &self.orders).await
	}
}
