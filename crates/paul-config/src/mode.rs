//! Development vs. production build settings.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::ConfigError;

/// Environment variable that selects the build mode.
pub const MODE_ENV_VAR: &str = "NODE_ENV";

/// Build mode controlling minification and debug output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum BuildMode {
    /// Readable output, console calls kept.
    #[default]
    Development,
    /// Minified output with console and debugger statements removed.
    Production,
}

impl BuildMode {
    /// Interpret an environment value the way Node tooling does: only
    /// `production` selects production, anything else is development.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Read the mode from `NODE_ENV`, if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(MODE_ENV_VAR)
            .ok()
            .map(|value| Self::from_env_value(&value))
    }

    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!(
                "build.mode must be \"development\" or \"production\", got \"{other}\""
            ))),
        }
    }
}

impl TryFrom<String> for BuildMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_only_production_is_production() {
        assert_eq!(BuildMode::from_env_value("production"), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value("PRODUCTION"), BuildMode::Production);
        assert_eq!(BuildMode::from_env_value("test"), BuildMode::Development);
        assert_eq!(BuildMode::from_env_value(""), BuildMode::Development);
    }

    #[test]
    fn test_parse_is_strict() {
        assert_eq!("prod".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert_eq!("dev".parse::<BuildMode>().unwrap(), BuildMode::Development);

        let err = "staging".parse::<BuildMode>().unwrap_err();
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_display_round_trips() {
        for mode in [BuildMode::Development, BuildMode::Production] {
            assert_eq!(mode.to_string().parse::<BuildMode>().unwrap(), mode);
        }
    }
}
