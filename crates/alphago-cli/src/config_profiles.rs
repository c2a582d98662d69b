//! Named order-service profiles stored in `<config dir>/alphago/cli-config.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use alphago_core::util::normalize_text_option;
use serde::{Deserialize, Serialize};

pub const PROFILE_ENV_VAR: &str = "ALPHAGO_PROFILE";
const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliProfilesConfig {
    pub active_profile: Option<String>,
    pub profiles: BTreeMap<String, CliProfile>,
}

/// Where one user's orders go. Accessors hide blank values.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliProfile {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub health_url: Option<String>,
    pub session: Option<String>,
}

impl std::fmt::Debug for CliProfile {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CliProfile")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("health_url", &self.health_url)
            .field("session", &self.session)
            .finish()
    }
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("alphago").join("cli-config.json"))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from(&default_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|error| format!("Failed to parse config at {}: {error}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(format!("Failed to read config at {}: {error}", path.display())),
        }
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                format!("Failed to create config directory {}: {error}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {error}", path.display()))
    }

    /// Explicit flag, then `ALPHAGO_PROFILE`, then the active profile, then `default`
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        [
            explicit.map(str::to_string),
            std::env::var(PROFILE_ENV_VAR).ok(),
            self.active_profile.clone(),
        ]
        .into_iter()
        .find_map(normalize_text_option)
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }
}

impl CliProfile {
    pub fn api_base_url(&self) -> Option<String> {
        normalize_text_option(self.api_base_url.clone())
    }

    pub fn api_token(&self) -> Option<String> {
        normalize_text_option(self.api_token.clone())
    }

    /// URL probed for connectivity; the API base URL when no health URL is set
    pub fn probe_url(&self) -> Option<String> {
        normalize_text_option(self.health_url.clone()).or_else(|| self.api_base_url())
    }

    pub fn session(&self) -> Option<String> {
        normalize_text_option(self.session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn saved_profiles_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cli-config.json");

        let mut config = CliProfilesConfig {
            active_profile: Some("courier".to_string()),
            ..CliProfilesConfig::default()
        };
        *config.profile_mut_or_default("courier") = CliProfile {
            api_base_url: Some("https://api.example.com/v1".to_string()),
            health_url: Some("   ".to_string()),
            session: Some("driver-1".to_string()),
            ..CliProfile::default()
        };

        config.save_to(&path).unwrap();
        let loaded = CliProfilesConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let profile = loaded.profile("courier").unwrap();
        assert_eq!(
            profile.probe_url().as_deref(),
            Some("https://api.example.com/v1")
        );
        assert_eq!(profile.session().as_deref(), Some("driver-1"));
        assert_eq!(profile.api_token(), None);
    }

    #[test]
    fn missing_file_loads_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliProfilesConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, CliProfilesConfig::default());
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli-config.json");
        fs::write(&path, r#"{ "profiles": { "courier": { "session": "driver-3" } } }"#).unwrap();

        let config = CliProfilesConfig::load_from(&path).unwrap();
        assert_eq!(config.active_profile, None);
        let profile = config.profile("courier").unwrap();
        assert_eq!(profile.session().as_deref(), Some("driver-3"));
        assert_eq!(profile.api_base_url(), None);
    }

    #[test]
    fn resolve_profile_name_prefers_explicit_then_active() {
        let config = CliProfilesConfig {
            active_profile: Some(" courier ".to_string()),
            ..CliProfilesConfig::default()
        };
        assert_eq!(config.resolve_profile_name(Some(" night-shift ")), "night-shift");
        if std::env::var_os(PROFILE_ENV_VAR).is_none() {
            assert_eq!(config.resolve_profile_name(Some("  ")), "courier");
            assert_eq!(
                CliProfilesConfig::default().resolve_profile_name(None),
                DEFAULT_PROFILE
            );
        }
    }

    #[test]
    fn debug_redacts_api_token() {
        let profile = CliProfile {
            api_token: Some("secret".to_string()),
            ..CliProfile::default()
        };
        let debug = format!("{profile:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
