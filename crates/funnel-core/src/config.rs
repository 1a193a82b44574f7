//! TOML-based configuration.
//!
//! Holds every timing constant of the page plus the AI and checkout
//! settings. Defaults reproduce the shipped page exactly, so an absent or
//! empty file gives the stock behaviour.
//!
//! Configuration is stored at `~/.config/funnel/config.toml`
//! (`FUNNEL_ENV=dev` switches to `~/.config/funnel-dev/`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checkout::CheckoutLink;
use crate::error::{ConfigError, ValidationError};
use crate::faq::{default_entries, FaqEntry};
use crate::gate::UnlockGate;
use crate::generation::{QueryKind, QueryProfile, DEFAULT_BASE_URL};
use crate::scarcity::{Jitter, ScarcityCounter};
use crate::toast::{default_catalog, SocialProof, ToastTiming};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_initial_secs")]
    pub initial_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_unlock_threshold")]
    pub unlock_threshold_secs: f64,
    #[serde(default = "default_fallback_grace")]
    pub fallback_grace_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScarcityConfig {
    #[serde(default = "default_initial_spots")]
    pub initial_spots: u32,
    #[serde(default = "default_floor")]
    pub floor: u32,
    #[serde(default = "default_scarcity_initial_delay")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_scarcity_min_gap")]
    pub min_gap_secs: u64,
    #[serde(default = "default_scarcity_spread")]
    pub spread_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastConfig {
    #[serde(default = "default_toast_warmup")]
    pub warmup_secs: u64,
    #[serde(default = "default_toast_recheck")]
    pub recheck_secs: u64,
    #[serde(default = "default_toast_display")]
    pub display_secs: u64,
    #[serde(default = "default_toast_min_gap")]
    pub min_gap_secs: u64,
    #[serde(default = "default_toast_spread")]
    pub spread_secs: u64,
    #[serde(default = "default_catalog")]
    pub catalog: Vec<SocialProof>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default = "default_checkout_url")]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqConfig {
    #[serde(default = "default_entries")]
    pub entries: Vec<FaqEntry>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/funnel/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed for the random gaps and toast picks. `None` = fresh entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub scarcity: ScarcityConfig,
    #[serde(default)]
    pub toast: ToastConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub faq: FaqConfig,
}

// Default functions
fn default_initial_secs() -> u64 {
    600
}
fn default_unlock_threshold() -> f64 {
    30.0
}
fn default_fallback_grace() -> f64 {
    15.0
}
fn default_initial_spots() -> u32 {
    10
}
fn default_floor() -> u32 {
    2
}
fn default_scarcity_initial_delay() -> u64 {
    8
}
fn default_scarcity_min_gap() -> u64 {
    5
}
fn default_scarcity_spread() -> u64 {
    10
}
fn default_toast_warmup() -> u64 {
    35
}
fn default_toast_recheck() -> u64 {
    5
}
fn default_toast_display() -> u64 {
    4
}
fn default_toast_min_gap() -> u64 {
    10
}
fn default_toast_spread() -> u64 {
    15
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_checkout_url() -> String {
    "https://example.com".into()
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            initial_secs: default_initial_secs(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            unlock_threshold_secs: default_unlock_threshold(),
            fallback_grace_secs: default_fallback_grace(),
        }
    }
}

impl Default for ScarcityConfig {
    fn default() -> Self {
        Self {
            initial_spots: default_initial_spots(),
            floor: default_floor(),
            initial_delay_secs: default_scarcity_initial_delay(),
            min_gap_secs: default_scarcity_min_gap(),
            spread_secs: default_scarcity_spread(),
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            warmup_secs: default_toast_warmup(),
            recheck_secs: default_toast_recheck(),
            display_secs: default_toast_display(),
            min_gap_secs: default_toast_min_gap(),
            spread_secs: default_toast_spread(),
            catalog: default_catalog(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            url: default_checkout_url(),
        }
    }
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            entries: default_entries(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            countdown: CountdownConfig::default(),
            gate: GateConfig::default(),
            scarcity: ScarcityConfig::default(),
            toast: ToastConfig::default(),
            ai: AiConfig::default(),
            checkout: CheckoutConfig::default(),
            faq: FaqConfig::default(),
        }
    }
}

/// Returns `~/.config/funnel[-dev]/` based on FUNNEL_ENV.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(".config");

    let env = std::env::var("FUNNEL_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("funnel-dev")
    } else {
        base_dir.join("funnel")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn parse_scalar(key: &str, existing: &serde_json::Value, value: &str) -> Result<serde_json::Value, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let parse_number = || -> Result<serde_json::Value, ConfigError> {
            if let Ok(n) = value.parse::<u64>() {
                Ok(serde_json::Value::Number(n.into()))
            } else if let Ok(n) = value.parse::<f64>() {
                serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))
            } else {
                Err(invalid(format!("cannot parse '{value}' as number")))
            }
        };

        match existing {
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|e| invalid(e.to_string())),
            serde_json::Value::Number(_) => parse_number(),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))
            }
            // Unset optionals take whatever the value looks like.
            serde_json::Value::Null => Ok(parse_number()
                .unwrap_or_else(|_| serde_json::Value::String(value.into()))),
            serde_json::Value::String(_) => Ok(serde_json::Value::String(value.into())),
        }
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let new_value = Self::parse_scalar(key, existing, value)?;
                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the loaded values fail validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. On error `self` is unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        let threshold = self.gate.unlock_threshold_secs;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(invalid("gate.unlock_threshold_secs", "must be a positive number"));
        }
        let grace = self.gate.fallback_grace_secs;
        if !grace.is_finite() || grace < 0.0 {
            return Err(invalid("gate.fallback_grace_secs", "must not be negative"));
        }
        if self.scarcity.floor > self.scarcity.initial_spots {
            return Err(invalid("scarcity.floor", "must not exceed scarcity.initial_spots"));
        }
        if self.toast.catalog.is_empty() {
            return Err(invalid("toast.catalog", "must contain at least one entry"));
        }
        if self.toast.display_secs == 0 {
            return Err(invalid("toast.display_secs", "must be positive"));
        }
        if self.toast.recheck_secs == 0 {
            return Err(invalid("toast.recheck_secs", "must be positive"));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(invalid("ai.temperature", "must be within 0.0..=2.0"));
        }
        if self.ai.model.trim().is_empty() {
            return Err(invalid("ai.model", "must not be empty"));
        }
        self.checkout_link().map_err(|e| match e {
            ValidationError::InvalidValue { field, message } => ConfigError::InvalidValue {
                key: field,
                message,
            },
            other => invalid("checkout.url", &other.to_string()),
        })?;
        Ok(())
    }

    // ── Component builders ───────────────────────────────────────────

    pub fn unlock_gate(&self) -> UnlockGate {
        UnlockGate::new(self.gate.unlock_threshold_secs, self.gate.fallback_grace_secs)
    }

    pub fn scarcity_counter(&self) -> ScarcityCounter {
        ScarcityCounter::new(
            self.scarcity.initial_spots,
            self.scarcity.floor,
            Jitter::new(
                secs_to_ms(self.scarcity.min_gap_secs),
                secs_to_ms(self.scarcity.spread_secs),
            ),
        )
    }

    pub fn scarcity_initial_delay_ms(&self) -> u64 {
        secs_to_ms(self.scarcity.initial_delay_secs)
    }

    pub fn toast_timing(&self) -> ToastTiming {
        ToastTiming {
            warmup_ms: secs_to_ms(self.toast.warmup_secs),
            recheck_ms: secs_to_ms(self.toast.recheck_secs),
            display_ms: secs_to_ms(self.toast.display_secs),
            gap: Jitter::new(
                secs_to_ms(self.toast.min_gap_secs),
                secs_to_ms(self.toast.spread_secs),
            ),
        }
    }

    pub fn query_profile(&self, kind: QueryKind) -> QueryProfile {
        QueryProfile::for_kind(kind, self.ai.model.clone(), self.ai.temperature)
    }

    pub fn checkout_link(&self) -> Result<CheckoutLink, ValidationError> {
        CheckoutLink::parse(&self.checkout.url)
    }
}

fn secs_to_ms(secs: u64) -> u64 {
    secs.saturating_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.countdown.initial_secs, 600);
        assert_eq!(parsed.toast.catalog.len(), 4);
        assert_eq!(parsed.faq.entries.len(), 3);
    }

    #[test]
    fn empty_file_means_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.gate.unlock_threshold_secs, 30.0);
        assert_eq!(parsed.gate.fallback_grace_secs, 15.0);
        assert_eq!(parsed.scarcity.initial_spots, 10);
        assert_eq!(parsed.scarcity.floor, 2);
        assert_eq!(parsed.ai.model, "gemini-2.5-flash");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let parsed: Config = toml::from_str("[scarcity]\ninitial_spots = 20\n").unwrap();
        assert_eq!(parsed.scarcity.initial_spots, 20);
        assert_eq!(parsed.scarcity.floor, 2);
        assert_eq!(parsed.toast.warmup_secs, 35);
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "scarcity.initial_spots", "12").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "scarcity.initial_spots").unwrap(),
            &serde_json::Value::Number(12.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "gate.nonexistent_key", "1");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_fills_unset_seed() {
        let mut cfg = Config::default();
        cfg.set("seed", "42").unwrap();
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn set_rejects_invalid_result_and_leaves_config_untouched() {
        let mut cfg = Config::default();
        assert!(cfg.set("scarcity.floor", "50").is_err());
        assert_eq!(cfg.scarcity.floor, 2);
        assert!(cfg.set("checkout.url", "ftp://nope").is_err());
        assert!(cfg.set("countdown.initial_secs", "ten").is_err());
    }

    #[test]
    fn config_get_returns_string_for_all_types() {
        let cfg = Config::default();
        assert_eq!(cfg.get("countdown.initial_secs"), Some("600".to_string()));
        assert_eq!(cfg.get("ai.model"), Some("gemini-2.5-flash".to_string()));
        assert_eq!(cfg.get("seed"), Some("null".to_string()));
        assert_eq!(cfg.get("nope"), None);
    }

    #[test]
    fn builders_convert_to_milliseconds() {
        let cfg = Config::default();
        assert_eq!(cfg.scarcity_initial_delay_ms(), 8_000);
        let timing = cfg.toast_timing();
        assert_eq!(timing.warmup_ms, 35_000);
        assert_eq!(timing.gap, Jitter::new(10_000, 15_000));
        assert_eq!(cfg.unlock_gate().fallback_delay_ms(), 45_000);
    }

    #[test]
    fn validate_rejects_zero_threshold_and_empty_catalog() {
        let mut cfg = Config::default();
        cfg.gate.unlock_threshold_secs = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.toast.catalog.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_toast_recheck() {
        let mut cfg = Config::default();
        let err = cfg.set("toast.recheck_secs", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "toast.recheck_secs"));
        assert_eq!(cfg.toast.recheck_secs, 5);

        cfg.toast.recheck_secs = 0;
        assert!(crate::Session::new(&cfg).is_err());
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut edited = first.clone();
        edited.seed = Some(9);
        edited.countdown.initial_secs = 120;
        edited.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.seed, Some(9));
        assert_eq!(reloaded.countdown.initial_secs, 120);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "countdown = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseFailed(_))
        ));
    }
}
