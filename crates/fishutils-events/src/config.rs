//! Building buses from `fishutils-config` settings.

use fishutils_config::{BusConfig, ErrorPolicy};

use crate::bus::{EventBus, EventBusBuilder};
use crate::cancellable::CancellableEventBus;
use crate::error::ErrorHandler;

impl From<ErrorPolicy> for ErrorHandler {
    fn from(policy: ErrorPolicy) -> Self {
        match policy {
            ErrorPolicy::Abort => Self::abort(),
            ErrorPolicy::Log => Self::log(),
            ErrorPolicy::Ignore => Self::ignore(),
        }
    }
}

impl EventBusBuilder {
    /// A builder preset from `config`. `config.cancellable` is honored by
    /// [`EventBus::from_config`] and ignored here; pick
    /// [`EventBusBuilder::build`] or [`EventBusBuilder::build_cancellable`].
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        let builder = EventBus::builder()
            .with_duplicates(config.process_duplicates)
            .with_error_handler(config.error_policy.into());
        match &config.name {
            Some(name) => builder.with_name(name.clone()),
            None => builder,
        }
    }
}

impl EventBus {
    /// Build a bus from configuration, cancellable if `config.cancellable`.
    ///
    /// A cancellable bus is returned as its plain handle; it still honors
    /// cancellation when reached through [`CancellableEventBus::fire_cancellable`]
    /// on an ancestor.
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        let builder = EventBusBuilder::from_config(config);
        if config.cancellable {
            builder.build_cancellable().into_bus()
        } else {
            builder.build()
        }
    }
}

impl CancellableEventBus {
    /// Build a cancellable bus from configuration.
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        EventBusBuilder::from_config(config).build_cancellable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = BusConfig {
            name: Some("audio".to_owned()),
            process_duplicates: true,
            cancellable: true,
            error_policy: ErrorPolicy::Ignore,
        };

        let bus = EventBus::from_config(&config);
        assert_eq!(bus.name(), Some("audio"));
        assert!(bus.processes_duplicates());
        assert!(bus.is_cancellable());
        assert!(format!("{:?}", bus.error_handler()).contains("ignore"));
    }

    #[test]
    fn test_default_config_matches_new() {
        let bus = EventBus::from_config(&BusConfig::default());
        assert!(!bus.processes_duplicates());
        assert!(!bus.is_cancellable());
        assert!(format!("{:?}", bus.error_handler()).contains("abort"));

        let cancellable = CancellableEventBus::from_config(&BusConfig::default());
        assert!(cancellable.is_cancellable());
    }
}
