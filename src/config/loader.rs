// Configuration loader
// Loads API keys and pipeline settings from ~/.adforge/config.toml or environment variables

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{CONFIG_DIR, CONFIG_FILE};
use super::settings::{Config, GeminiConfig, SpeechConfig};

/// `~/.adforge/config.toml`, if a home directory can be determined
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from an explicit path, the default config file, or the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let env = |name: &str| std::env::var(name).ok();

    let config = match path {
        Some(path) => Some(load_from_file(path, env)?),
        None => match default_config_path() {
            Some(default) if default.exists() => Some(load_from_file(&default, env)?),
            _ => None,
        },
    };

    if let Some(config) = config {
        config.validate()?;
        return Ok(config);
    }

    if let Some(config) = config_from_env(env) {
        config.validate()?;
        return Ok(config);
    }

    bail!(
        "No configuration found. Create \x1b[1;36m~/.adforge/config.toml\x1b[0m:\n\n\
        [gemini]\n\
        api_key = \"...\"\n\n\
        [speech]\n\
        api_key = \"...\"\n\n\
        Alternatively, set environment variables:\n\
        export GEMINI_API_KEY=\"...\"\n\
        export ELEVENLABS_API_KEY=\"...\""
    );
}

fn load_from_file(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&contents, env)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Parse TOML, filling API keys left blank in the file from the environment.
fn parse_config(contents: &str, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    #[derive(serde::Deserialize)]
    struct TomlConfig {
        #[serde(default)]
        gemini: Option<GeminiConfig>,
        #[serde(default)]
        speech: Option<SpeechConfig>,
        #[serde(default)]
        pipeline: Option<super::settings::PipelineConfig>,
    }

    let toml_config: TomlConfig = toml::from_str(contents)?;

    let mut gemini = toml_config
        .gemini
        .unwrap_or_else(|| GeminiConfig::with_api_key(""));
    if gemini.api_key.is_empty() {
        gemini.api_key = gemini_key_from_env(&env).unwrap_or_default();
    }

    let mut speech = toml_config
        .speech
        .unwrap_or_else(|| SpeechConfig::with_api_key(""));
    if speech.api_key.is_empty() {
        speech.api_key = non_empty(env("ELEVENLABS_API_KEY")).unwrap_or_default();
    }

    let mut config = Config::new(gemini, speech);
    if let Some(pipeline) = toml_config.pipeline {
        config.pipeline = pipeline;
    }
    Ok(config)
}

/// Build a config from environment variables alone, if the Gemini key is present.
fn config_from_env(env: impl Fn(&str) -> Option<String>) -> Option<Config> {
    let gemini_key = gemini_key_from_env(&env)?;
    let speech_key = non_empty(env("ELEVENLABS_API_KEY")).unwrap_or_default();
    Some(Config::new(
        GeminiConfig::with_api_key(gemini_key),
        SpeechConfig::with_api_key(speech_key),
    ))
}

fn gemini_key_from_env(env: &impl Fn(&str) -> Option<String>) -> Option<String> {
    non_empty(env("GEMINI_API_KEY")).or_else(|| non_empty(env("API_KEY")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
