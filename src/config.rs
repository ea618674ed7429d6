use serde::{Deserialize, Serialize};

use crate::state::DEFAULT_HISTORY_SIZE;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub env: EnvConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    /// Prompt name.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: default_name(),
            history_size: default_history_size(),
            log_level: default_log_level(),
        }
    }
}

fn default_name() -> String {
    "tsh".into()
}

fn default_history_size() -> usize {
    DEFAULT_HISTORY_SIZE
}

fn default_log_level() -> String {
    "info".into()
}

/// Variables exported into every session.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct EnvConfig {
    /// `NAME=VALUE` entries.
    #[serde(default)]
    pub export: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    env: EnvOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    name: Option<String>,
    history_size: Option<usize>,
    log_level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct EnvOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    export: Vec<String>,
    #[serde(default)]
    remove_export: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    ///
    /// Falls back to built-in values if the embedded file fails to parse,
    /// which the tests rule out.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::warn!("embedded default config does not parse: {e}");
            Self::default()
        })
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/tsh/config.toml (if exists)
    ///
    /// Scalars in the overlay override; lists extend. `replace = true` in a
    /// section replaces its defaults, `remove_<field>` subtracts entries.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/tsh/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/tsh/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("tsh: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let s = overlay.settings;
        if let Some(v) = s.name {
            self.settings.name = v;
        }
        if let Some(v) = s.history_size {
            self.settings.history_size = v;
        }
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }

        let e = overlay.env;
        merge_list(&mut self.env.export, e.export, &e.remove_export, e.replace);
    }

    /// `[env] export` entries split into name and value. Entries without `=`
    /// export an empty value; entries with an invalid name are skipped.
    pub fn exports(&self) -> Vec<(&str, &str)> {
        self.env
            .export
            .iter()
            .filter_map(|entry| {
                let (name, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                if crate::builtins::is_valid_name(name) {
                    Some((name, value))
                } else {
                    log::warn!("config: ignoring export {entry:?}: invalid name");
                    None
                }
            })
            .collect()
    }

    /// The merged configuration as TOML, for `--dump-config`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
