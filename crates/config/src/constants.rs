//! Centralized constants for the phone agent
//!
//! Single source of truth for the default values used across the crates.
//! Settings fall back to these when neither a config file nor the
//! environment overrides them.

/// Spoken phrases
pub mod phrases {
    /// Filler phrase spoken when the assistant starts a lookup
    pub const TOOL_USE_MESSAGE: &str = "Let me look for that in the system";

    /// Spoken when reasoning produces no usable answer
    pub const FALLBACK_MESSAGE: &str =
        "I'm sorry, I couldn't find anything useful in the system.";
}

/// Filler sound effect defaults
pub mod effect {
    /// Maximum effect playback per tool round (seconds)
    pub const MAX_DURATION_SECS: f64 = 3.0;

    /// Source chunk length (ms)
    pub const CHUNK_MS: u32 = 100;

    /// Rate the effect asset is resampled to at load (Hz)
    pub const TARGET_RATE: u32 = 16000;
}

/// Property search defaults
pub mod search {
    /// Results returned when the tool call does not ask for a count
    pub const DEFAULT_LIMIT: usize = 1;

    /// Upper bound on results per lookup
    pub const MAX_LIMIT: usize = 5;

    /// Name the search tool is exposed under
    pub const TOOL_NAME: &str = "search_property_tool";
}

/// Audio processing defaults
pub mod audio {
    /// Default sample rate (Hz)
    pub const SAMPLE_RATE: u32 = 16000;

    /// Stub synthesis length per character of text (ms)
    pub const STUB_MS_PER_CHAR: u32 = 50;
}

/// Environment configuration
pub mod env {
    /// Prefix for environment overrides
    pub const PREFIX: &str = "PHONE_AGENT";

    /// Nesting separator, e.g. `PHONE_AGENT__AGENT__FALLBACK_MESSAGE`
    pub const SEPARATOR: &str = "__";

    /// Config file looked up when no explicit path is given
    pub const DEFAULT_CONFIG_FILE: &str = "config/default";
}
