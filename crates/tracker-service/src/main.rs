//! Main entry point for the order tracker service.
//!
//! This binary exposes the staff workflow (register, edit, advance,
//! delete, import/export, settings) as CLI subcommands gated by the
//! stored PIN, the customer lookup both as a subcommand and as an HTTP
//! endpoint, and wires up configuration, logging and the storage backend.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracker_config::Config;
use tracker_core::Tracker;
use tracker_storage::{StorageInterface, StorageService};
use tracker_types::{Order, OrderDraft, OrderPatch, OrderStatus, SettingsPatch};

mod apis;
mod server;

/// Command-line arguments for the tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about = "Order tracking for cross-border retail", long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "tracker.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Look up orders the way a customer would, by code or phone
	Lookup {
		/// Tracking code; takes precedence over the phone
		#[arg(long, default_value = "")]
		code: String,
		/// Phone number; non-digits are ignored
		#[arg(long, default_value = "")]
		phone: String,
	},
	/// Start the HTTP lookup API
	Serve,
	/// Register a new order
	Register {
		#[arg(long)]
		pin: String,
		/// Customer phone (required)
		#[arg(long)]
		phone: String,
		/// Customer name; defaults to the name on their latest order
		#[arg(long)]
		name: Option<String>,
		#[arg(long, default_value = "")]
		item: String,
		#[arg(long, default_value_t = 0)]
		amount: u64,
		#[arg(long)]
		paid: bool,
		/// Initial pipeline status (default: first stage)
		#[arg(long)]
		status: Option<String>,
		/// Expected delivery date, YYYY-MM-DD
		#[arg(long)]
		expected: Option<NaiveDate>,
		#[arg(long, default_value = "")]
		channel: String,
		#[arg(long, default_value = "")]
		note: String,
	},
	/// List orders, with optional text and status filters
	List {
		#[arg(long)]
		pin: String,
		/// Substring matched against code, name, phone, item and note
		#[arg(long, default_value = "")]
		query: String,
		#[arg(long)]
		status: Option<String>,
	},
	/// Edit fields of an order
	Edit {
		#[arg(long)]
		pin: String,
		id: String,
		#[arg(long)]
		name: Option<String>,
		#[arg(long)]
		phone: Option<String>,
		#[arg(long)]
		item: Option<String>,
		#[arg(long)]
		amount: Option<u64>,
		#[arg(long)]
		paid: Option<bool>,
		#[arg(long)]
		channel: Option<String>,
		#[arg(long)]
		note: Option<String>,
		/// Expected delivery date, YYYY-MM-DD; an empty string clears it
		#[arg(long)]
		expected: Option<String>,
	},
	/// Set an order's status directly (any stage, forward or backward)
	SetStatus {
		#[arg(long)]
		pin: String,
		id: String,
		status: String,
	},
	/// Advance an order exactly one pipeline stage
	Advance {
		#[arg(long)]
		pin: String,
		id: String,
	},
	/// Delete an order
	Delete {
		#[arg(long)]
		pin: String,
		id: String,
	},
	/// Remove every stored order
	Clear {
		#[arg(long)]
		pin: String,
	},
	/// Export all orders to a CSV file
	Export {
		#[arg(long)]
		pin: String,
		/// Output path (default: orders-{timestamp}.csv)
		#[arg(long)]
		output: Option<PathBuf>,
	},
	/// Import orders from a CSV file
	Import {
		#[arg(long)]
		pin: String,
		path: PathBuf,
	},
	/// Show or change brand, tracking prefix and PIN
	Settings {
		#[arg(long)]
		pin: String,
		#[arg(long)]
		brand: Option<String>,
		#[arg(long)]
		prefix: Option<String>,
		#[arg(long)]
		new_pin: Option<String>,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	// Load configuration; a missing file means defaults
	let config = if args.config.exists() {
		Config::from_file_async(&args.config).await?
	} else {
		tracing::info!("No config file at {:?}, using defaults", args.config);
		Config::default()
	};

	let storage = StorageService::new(build_storage(&config)?);
	let mut tracker = Tracker::load(storage, config.defaults.seed_settings()).await;

	match args.command {
		Command::Lookup { code, phone } => run_lookup(&tracker, &code, &phone),
		Command::Serve => {
			let api_config = config.api.clone().unwrap_or_default();
			if !api_config.enabled {
				return Err("api.enabled is false in the configuration".into());
			}
			server::start_server(api_config, Arc::new(RwLock::new(tracker))).await?;
		}
		Command::Register {
			pin,
			phone,
			name,
			item,
			amount,
			paid,
			status,
			expected,
			channel,
			note,
		} => {
			require_pin(&tracker, &pin)?;
			// Fall back to the name on the customer's latest order.
			let customer_name = match name {
				Some(name) => name,
				None => tracker
					.last_customer_name(&phone)
					.map(str::to_string)
					.ok_or("no previous order for this phone, supply --name")?,
			};
			let status = match status {
				Some(raw) => parse_status_arg(&raw)?,
				None => OrderStatus::default(),
			};
			let order = tracker
				.register(OrderDraft {
					customer_name,
					phone,
					item_desc: item,
					note,
					channel,
					amount,
					paid,
					status,
					expected_date: expected,
				})
				.await?;
			println!("Registered {} (id {})", order.tracking_code, order.id);
		}
		Command::List { pin, query, status } => {
			require_pin(&tracker, &pin)?;
			let status = status.map(|raw| parse_status_arg(&raw)).transpose()?;
			let rows = tracker.filter(&query, status.as_ref());
			let total = tracker.orders().len();
			for order in &rows {
				print_order(order);
			}
			println!("{} / {} orders", rows.len(), total);
		}
		Command::Edit {
			pin,
			id,
			name,
			phone,
			item,
			amount,
			paid,
			channel,
			note,
			expected,
		} => {
			require_pin(&tracker, &pin)?;
			let expected_date = expected.map(|raw| parse_expected_arg(&raw)).transpose()?;
			let order = tracker
				.edit(
					&id,
					OrderPatch {
						customer_name: name,
						phone,
						item_desc: item,
						amount,
						paid,
						channel,
						note,
						status: None,
						expected_date,
					},
				)
				.await?;
			print_order(&order);
		}
		Command::SetStatus { pin, id, status } => {
			require_pin(&tracker, &pin)?;
			let status = parse_status_arg(&status)?;
			let order = tracker.set_status(&id, status).await?;
			print_order(&order);
		}
		Command::Advance { pin, id } => {
			require_pin(&tracker, &pin)?;
			let before = tracker.get(&id)?.status.clone();
			let order = tracker.advance(&id).await?;
			if order.status == before {
				println!("{} is already at '{}'", order.tracking_code, order.status);
			} else {
				print_order(&order);
			}
		}
		Command::Delete { pin, id } => {
			require_pin(&tracker, &pin)?;
			let removed = tracker.delete(&id).await?;
			println!("Deleted {}", removed.tracking_code);
		}
		Command::Clear { pin } => {
			require_pin(&tracker, &pin)?;
			let count = tracker.clear_orders().await?;
			println!("Removed {} orders", count);
		}
		Command::Export { pin, output } => {
			require_pin(&tracker, &pin)?;
			let path = output.unwrap_or_else(|| {
				PathBuf::from(format!("orders-{}.csv", Utc::now().timestamp_millis()))
			});
			let text = tracker.export_csv()?;
			tokio::fs::write(&path, text).await?;
			println!("Exported {} orders to {}", tracker.orders().len(), path.display());
		}
		Command::Import { pin, path } => {
			require_pin(&tracker, &pin)?;
			let text = tokio::fs::read_to_string(&path).await?;
			let count = tracker.import_csv(&text).await?;
			println!("Imported {} orders", count);
		}
		Command::Settings {
			pin,
			brand,
			prefix,
			new_pin,
		} => {
			require_pin(&tracker, &pin)?;
			let settings = if brand.is_none() && prefix.is_none() && new_pin.is_none() {
				tracker.settings().clone()
			} else {
				tracker
					.update_settings(SettingsPatch {
						brand,
						prefix,
						admin_pin: new_pin,
					})
					.await?
			};
			println!("brand:  {}", settings.brand);
			println!("prefix: {}", settings.prefix);
			println!("pin:    {}", settings.admin_pin);
		}
	}

	Ok(())
}

/// Builds the storage backend named by the configuration.
fn build_storage(config: &Config) -> Result<Box<dyn StorageInterface>, Box<dyn std::error::Error>> {
	let factory = tracker_storage::get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == config.storage.primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("unknown storage backend '{}'", config.storage.primary))?;
	Ok(factory(config.primary_storage_config())?)
}

/// Rejects a command when the supplied PIN does not match the stored one.
fn require_pin(tracker: &Tracker, pin: &str) -> Result<(), Box<dyn std::error::Error>> {
	if tracker.verify_pin(pin) {
		Ok(())
	} else {
		Err("invalid PIN".into())
	}
}

/// Parses a pipeline stage given by an operator, rejecting unknown labels.
fn parse_status_arg(raw: &str) -> Result<OrderStatus, Box<dyn std::error::Error>> {
	OrderStatus::parse_stage(raw).ok_or_else(|| {
		let labels: Vec<&str> = OrderStatus::all().iter().map(|s| s.as_str()).collect();
		format!(
			"unknown status '{}'; expected one of: {}",
			raw,
			labels.join(", ")
		)
		.into()
	})
}

/// Parses the `--expected` edit argument; an empty string clears the date.
fn parse_expected_arg(raw: &str) -> Result<Option<NaiveDate>, Box<dyn std::error::Error>> {
	if raw.is_empty() {
		return Ok(None);
	}
	Ok(Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?))
}

fn print_order(order: &Order) {
	println!(
		"{}  {:<20}  {:<12}  {:<22}  {:>3}%  {:>10}  {}  {}",
		order.tracking_code,
		order.customer_name,
		order.phone,
		order.status.to_string(),
		order.status.progress_percent(),
		order.amount,
		if order.paid { "paid" } else { "unpaid" },
		order.id,
	);
}

fn run_lookup(tracker: &Tracker, code: &str, phone: &str) {
	match tracker.lookup(code, phone) {
		None => println!("Nothing to search for — supply --code or --phone."),
		Some(orders) if orders.is_empty() => println!("No orders matched."),
		Some(orders) => {
			println!("{} result(s):", orders.len());
			for order in &orders {
				print_order(order);
			}
		}
	}
}
