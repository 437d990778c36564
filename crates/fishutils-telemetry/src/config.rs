//! Logging settings from `fishutils-config`.

use fishutils_config::LoggingConfig;

use crate::error::TelemetryResult;
use crate::logging::{LogConfig, LogFormat};

impl LogConfig {
    /// Logging settings from the `[logging]` config section. Options the
    /// section does not cover keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::ConfigError`](crate::TelemetryError::ConfigError)
    /// if the format is unknown.
    pub fn from_config(config: &LoggingConfig) -> TelemetryResult<Self> {
        let format: LogFormat = config.format.parse()?;
        Ok(config.directives.iter().fold(
            LogConfig::new(config.level.to_ascii_lowercase()).with_format(format),
            |log, directive| log.with_directive(directive.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = LoggingConfig {
            level: "DEBUG".to_owned(),
            format: "json".to_owned(),
            directives: vec!["fishutils_events=trace".to_owned()],
        };

        let log = LogConfig::from_config(&config).unwrap();
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["fishutils_events=trace"]);
        assert!(log.timestamps);
    }

    #[test]
    fn test_from_config_rejects_unknown_format() {
        let config = LoggingConfig {
            format: "xml".to_owned(),
            ..LoggingConfig::default()
        };
        assert!(LogConfig::from_config(&config).is_err());
    }
}
