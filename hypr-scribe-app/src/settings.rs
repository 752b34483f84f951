//! Application settings: TOML file with layered lookup, environment
//! overrides for secrets and provider selection.

use anyhow::{Context, Result};
use hypr_scribe_safety::BackendPolicy;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub security: SecuritySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_turns: usize,
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub native: BackendPolicy,
    pub hyde: BackendPolicy,
    pub omarchy: BackendPolicy,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: hypr_scribe_core::DEFAULT_MAX_TURNS,
            debug: false,
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            native: BackendPolicy {
                allowed_dirs: to_strings(&[".", "./scripts", "./themes"]),
                allowed_files: to_strings(&[
                    "hyprland.conf",
                    "hyprpaper.conf",
                    "hypridle.conf",
                    "hyprlock.conf",
                    "keybindings.conf",
                    "windowrules.conf",
                    "monitors.conf",
                    "workspaces.conf",
                    "animations.conf",
                    "userprefs.conf",
                ]),
            },
            hyde: BackendPolicy {
                allowed_dirs: to_strings(&[
                    ".",
                    "./Configs",
                    "./scripts",
                    "./themes",
                    "./animations",
                    "./shaders",
                    "./hyprlock",
                    "./workflows",
                ]),
                allowed_files: to_strings(&[
                    "hyprland.conf",
                    "hyde.conf",
                    "hypridle.conf",
                    "hyprlock.conf",
                    "keybindings.conf",
                    "windowrules.conf",
                    "monitors.conf",
                    "workspaces.conf",
                    "workflows.conf",
                    "animations.conf",
                    "shaders.conf",
                    "userprefs.conf",
                    "pyprland.toml",
                ]),
            },
            omarchy: BackendPolicy {
                allowed_dirs: to_strings(&[".", "./omarchy", "./scripts", "./themes"]),
                allowed_files: to_strings(&[
                    "hyprland.conf",
                    "keybindings.conf",
                    "windowrules.conf",
                    "monitors.conf",
                    "workspaces.conf",
                ]),
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            agent: AgentSettings::default(),
            security: SecuritySettings::default(),
        }
    }
}

impl Settings {
    /// Load from the first settings file found, falling back to defaults,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = Settings::default();

        for path in candidate_paths() {
            if !path.is_file() {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            settings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            info!(path = %path.display(), "loaded settings");
            break;
        }

        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = key;
            }
        }
        if let Ok(provider) = env::var("LLM_PROVIDER") {
            if !provider.is_empty() {
                self.llm.provider = provider;
            }
        }
        if env::var("DEBUG").as_deref() == Ok("true") {
            self.agent.debug = true;
        }
    }

    pub fn policy_for(&self, kind: hypr_scribe_config::SourceKind) -> &BackendPolicy {
        use hypr_scribe_config::SourceKind;
        match kind {
            SourceKind::Native => &self.security.native,
            SourceKind::Hyde => &self.security.hyde,
            SourceKind::Omarchy => &self.security.omarchy,
        }
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("./config.toml")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join("hypr-scribe").join("config.toml"));
    }
    paths.push(PathBuf::from("/etc/hypr-scribe/config.toml"));
    paths
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.agent.max_turns, 25);
        assert!(!settings.agent.debug);
        assert_eq!(settings.llm.provider, "openai");
        assert!(settings
            .security
            .native
            .allowed_files
            .contains(&"hyprland.conf".to_string()));
        assert!(settings
            .security
            .hyde
            .allowed_dirs
            .contains(&"./Configs".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_default_sections() {
        let settings: Settings = toml::from_str(
            r#"
            [agent]
            max_turns = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.agent.max_turns, 5);
        assert_eq!(settings.llm.provider, "openai");
        assert!(!settings.security.omarchy.allowed_files.is_empty());
    }

    #[test]
    fn test_security_policy_override() {
        let settings: Settings = toml::from_str(
            r#"
            [security.native]
            allowed_dirs = ["."]
            allowed_files = ["hyprland.conf"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.security.native.allowed_files.len(), 1);
        // Untouched variants keep their defaults.
        assert!(settings.security.hyde.allowed_files.len() > 1);
    }
}
