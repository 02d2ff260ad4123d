//! # Session Configuration
//!
//! Tunables for one shop session: notification timing, management defaults,
//! the new-shop template and fallback message texts.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOP_NOTIFY_DEFAULT_MS=4000                                        │
//! │     SHOP_MAX_DISCOUNT=40                                               │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shop-session/shop.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shop.toml
//! [notifications]
//! default_duration_ms = 5000
//! min_lifetime_ms = 1500
//!
//! [management]
//! default_wage = 250
//! default_manifest_quantity = 10
//! max_discount = 50
//!
//! [template]
//! zone_length = 2.0
//! zone_width = 2.0
//! blip_sprite = 59
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Notification Settings
// =============================================================================

/// How long each kind of toast stays up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Used when a `notify` event carries no duration.
    #[serde(default = "default_duration")]
    pub default_duration_ms: u64,

    /// Floor for every lifetime.
    #[serde(default = "default_min_lifetime")]
    pub min_lifetime_ms: u64,

    #[serde(default = "default_save_failure")]
    pub save_failure_ms: u64,

    #[serde(default = "default_save_success")]
    pub save_success_ms: u64,

    #[serde(default = "default_missing_template")]
    pub missing_template_ms: u64,

    #[serde(default = "default_duplicate_vehicle")]
    pub duplicate_vehicle_ms: u64,
}

fn default_duration() -> u64 {
    5000
}
fn default_min_lifetime() -> u64 {
    1500
}
fn default_save_failure() -> u64 {
    4000
}
fn default_save_success() -> u64 {
    2500
}
fn default_missing_template() -> u64 {
    3000
}
fn default_duplicate_vehicle() -> u64 {
    2500
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            default_duration_ms: default_duration(),
            min_lifetime_ms: default_min_lifetime(),
            save_failure_ms: default_save_failure(),
            save_success_ms: default_save_success(),
            missing_template_ms: default_missing_template(),
            duplicate_vehicle_ms: default_duplicate_vehicle(),
        }
    }
}

// =============================================================================
// Management Settings
// =============================================================================

/// Defaults and bounds for the management panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementSettings {
    /// Prefilled wage in the hire form.
    #[serde(default = "default_wage")]
    pub default_wage: i64,

    /// Prefilled quantity for a new manifest row.
    #[serde(default = "default_manifest_quantity")]
    pub default_manifest_quantity: i64,

    /// Upper bound for shop and item discounts, in percent.
    #[serde(default = "default_max_discount")]
    pub max_discount: i64,
}

fn default_wage() -> i64 {
    250
}
fn default_manifest_quantity() -> i64 {
    10
}
fn default_max_discount() -> i64 {
    50
}

impl Default for ManagementSettings {
    fn default() -> Self {
        ManagementSettings {
            default_wage: default_wage(),
            default_manifest_quantity: default_manifest_quantity(),
            max_discount: default_max_discount(),
        }
    }
}

// =============================================================================
// New-Shop Template
// =============================================================================

/// Values a freshly created shop draft starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSettings {
    #[serde(default = "default_zone_side")]
    pub zone_length: f64,

    #[serde(default = "default_zone_side")]
    pub zone_width: f64,

    /// Half-height of the zone around the shop's z coordinate.
    #[serde(default = "default_zone_half_height")]
    pub zone_half_height: f64,

    #[serde(default = "default_blip_sprite")]
    pub blip_sprite: i64,

    #[serde(default = "default_blip_color")]
    pub blip_color: i64,

    #[serde(default = "default_blip_scale")]
    pub blip_scale: f64,

    #[serde(default = "default_true")]
    pub blip_short_range: bool,

    /// Ped model used when neither snapshot nor creator block names one.
    #[serde(default = "default_ped_model")]
    pub ped_model: String,
}

fn default_zone_side() -> f64 {
    2.0
}
fn default_zone_half_height() -> f64 {
    1.0
}
fn default_blip_sprite() -> i64 {
    59
}
fn default_blip_color() -> i64 {
    1
}
fn default_blip_scale() -> f64 {
    0.8
}
fn default_true() -> bool {
    true
}
fn default_ped_model() -> String {
    "mp_m_shopkeep_01".to_string()
}

impl Default for TemplateSettings {
    fn default() -> Self {
        TemplateSettings {
            zone_length: default_zone_side(),
            zone_width: default_zone_side(),
            zone_half_height: default_zone_half_height(),
            blip_sprite: default_blip_sprite(),
            blip_color: default_blip_color(),
            blip_scale: default_blip_scale(),
            blip_short_range: default_true(),
            ped_model: default_ped_model(),
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Fallback notification texts, used when the server gives no message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSettings {
    #[serde(default = "default_save_failed")]
    pub save_failed: String,

    #[serde(default = "default_save_succeeded")]
    pub save_succeeded: String,

    #[serde(default = "default_template_missing")]
    pub template_missing: String,

    #[serde(default = "default_vehicle_exists")]
    pub vehicle_exists: String,

    #[serde(default = "default_coords_failed")]
    pub coords_failed: String,
}

fn default_save_failed() -> String {
    "Failed to save shop".to_string()
}
fn default_save_succeeded() -> String {
    "Shop saved".to_string()
}
fn default_template_missing() -> String {
    "Vehicle template not found".to_string()
}
fn default_vehicle_exists() -> String {
    "Vehicle already added".to_string()
}
fn default_coords_failed() -> String {
    "Could not read player position".to_string()
}

impl Default for MessageSettings {
    fn default() -> Self {
        MessageSettings {
            save_failed: default_save_failed(),
            save_succeeded: default_save_succeeded(),
            template_missing: default_template_missing(),
            vehicle_exists: default_vehicle_exists(),
            coords_failed: default_coords_failed(),
        }
    }
}

// =============================================================================
// Transport Settings
// =============================================================================

/// Sizing for the channel-backed gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    32
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main Session Configuration
// =============================================================================

/// Complete session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub management: ManagementSettings,

    #[serde(default)]
    pub template: TemplateSettings,

    #[serde(default)]
    pub messages: MessageSettings,

    #[serde(default)]
    pub transport: TransportSettings,
}

impl SessionConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shop.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading session config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load session config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Session config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.notifications.min_lifetime_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "min_lifetime_ms must be greater than 0".into(),
            ));
        }

        if !(0..=shop_core::MAX_DISCOUNT_PERCENT).contains(&self.management.max_discount) {
            return Err(SyncError::InvalidConfig(format!(
                "max_discount must be between 0 and {}, got {}",
                shop_core::MAX_DISCOUNT_PERCENT,
                self.management.max_discount
            )));
        }

        if self.management.default_wage < 0 {
            return Err(SyncError::InvalidConfig(
                "default_wage must not be negative".into(),
            ));
        }

        if self.management.default_manifest_quantity <= 0 {
            return Err(SyncError::InvalidConfig(
                "default_manifest_quantity must be greater than 0".into(),
            ));
        }

        if self.template.zone_length <= 0.0 || self.template.zone_width <= 0.0 {
            return Err(SyncError::InvalidConfig(
                "zone dimensions must be greater than 0".into(),
            ));
        }

        if self.transport.channel_capacity == 0 {
            return Err(SyncError::InvalidConfig(
                "channel_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(ms) = env_parse::<u64>("SHOP_NOTIFY_DEFAULT_MS") {
            debug!(ms, "Overriding default notification duration from environment");
            self.notifications.default_duration_ms = ms;
        }

        if let Some(ms) = env_parse::<u64>("SHOP_NOTIFY_MIN_MS") {
            self.notifications.min_lifetime_ms = ms;
        }

        if let Some(wage) = env_parse::<i64>("SHOP_DEFAULT_WAGE") {
            debug!(wage, "Overriding default wage from environment");
            self.management.default_wage = wage;
        }

        if let Some(quantity) = env_parse::<i64>("SHOP_MANIFEST_QUANTITY") {
            self.management.default_manifest_quantity = quantity;
        }

        if let Some(max) = env_parse::<i64>("SHOP_MAX_DISCOUNT") {
            debug!(max, "Overriding discount ceiling from environment");
            self.management.max_discount = max;
        }

        if let Some(capacity) = env_parse::<usize>("SHOP_CHANNEL_CAPACITY") {
            self.transport.channel_capacity = capacity;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shop", "session")
            .map(|dirs| dirs.config_dir().join("shop.toml"))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}
