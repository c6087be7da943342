//! Application settings: brand label, tracking-code prefix, admin PIN.
//!
//! The PIN is a plain string compared by equality; it gates the staff
//! workflow, it is not a security control.

use serde::{Deserialize, Serialize};

/// Default brand label shown to customers.
pub const DEFAULT_BRAND: &str = "DELGUUR";
/// Default tracking-code prefix.
pub const DEFAULT_PREFIX: &str = "DG";
/// Default admin PIN.
pub const DEFAULT_PIN: &str = "2468";
/// Maximum length of the tracking-code prefix, in characters.
pub const PREFIX_MAX_LEN: usize = 4;

/// Persisted settings object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	pub brand: String,
	#[serde(rename = "adminPIN")]
	pub admin_pin: String,
	pub prefix: String,
}

/// A partial settings edit; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
	pub brand: Option<String>,
	pub admin_pin: Option<String>,
	pub prefix: Option<String>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			brand: DEFAULT_BRAND.to_string(),
			admin_pin: DEFAULT_PIN.to_string(),
			prefix: DEFAULT_PREFIX.to_string(),
		}
	}
}

impl Settings {
	/// Merges a patch into a copy of these settings. The prefix is
	/// normalized on every write; brand and PIN are free text.
	pub fn with_patch(&self, patch: SettingsPatch) -> Self {
		let mut next = self.clone();
		if let Some(brand) = patch.brand {
			next.brand = brand;
		}
		if let Some(pin) = patch.admin_pin {
			next.admin_pin = pin;
		}
		if let Some(prefix) = patch.prefix {
			next.prefix = normalize_prefix(&prefix);
		}
		next
	}
}

/// Uppercases the prefix and truncates it to [`PREFIX_MAX_LEN`]
/// characters. The only validation the prefix gets.
pub fn normalize_prefix(raw: &str) -> String {
	raw.to_uppercase().chars().take(PREFIX_MAX_LEN).collect()
}
