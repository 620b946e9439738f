//! Output formatting utilities
//!
//! Human-readable lines or JSON documents, chosen once per invocation from
//! flags and the config file.

mod formatter;

use skycp_core::config::Defaults;

pub use formatter::{Formatter, human_size};

/// Output configuration derived from CLI flags and config defaults
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Fill in what the flags left unset from the `[defaults]` table
    pub fn with_defaults(self, defaults: &Defaults) -> Self {
        Self {
            json: self.json || defaults.output.eq_ignore_ascii_case("json"),
            no_color: self.no_color || defaults.color.eq_ignore_ascii_case("never"),
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let flags = OutputConfig {
            json: true,
            ..Default::default()
        };
        let config = flags.with_defaults(&Defaults::default());
        assert!(config.json);
        assert!(!config.no_color);
    }

    #[test]
    fn test_config_defaults_apply() {
        let defaults = Defaults {
            output: "json".into(),
            color: "never".into(),
        };
        let flags = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        let config = flags.with_defaults(&defaults);
        assert!(config.json);
        assert!(config.no_color);
        assert!(config.quiet);
    }
}
