// Project-wide constants
//
// Default values for the config file. Import via `use crate::config::constants::*;`.

/// Gemini REST endpoint (v1beta carries the image and Veo models).
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.elevenlabs.io";

/// ElevenLabs "Rachel" voice.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_SPEECH_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_STABILITY: f32 = 0.5;
pub const DEFAULT_SIMILARITY_BOOST: f32 = 0.75;

/// Hard ceiling on regenerations per asset after the first generation.
pub const MAX_ITERATIONS: u32 = 3;

pub const DEFAULT_MAX_ITERATIONS: u32 = MAX_ITERATIONS;

/// Minimum score gain before a regenerated video is auto-accepted.
pub const DEFAULT_VIDEO_MIN_IMPROVEMENT: f64 = 0.05;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Upper bound on a single video operation, submission to done.
pub const DEFAULT_VIDEO_MAX_WAIT_SECS: u64 = 600;

/// Config directory under the user's home.
pub const CONFIG_DIR: &str = ".adforge";
pub const CONFIG_FILE: &str = "config.toml";
