//! Integration tests for building buses and logging from configuration files.

use std::collections::HashMap;
use std::sync::Arc;

use fishutils_config::{Config, ConfigError, ConfigLayer, ErrorPolicy};
use fishutils_events::{CancellableEventBus, EventBus, Priority};
use fishutils_telemetry::{LogConfig, LogFormat};
use fishutils_test::{BaseEvent, Diamond, OrderLog, Recorder, test_dir, test_file};

const BUS_TOML: &str = r#"
[bus]
name = "audio"
process_duplicates = true
cancellable = true
error_policy = "log"

[logging]
level = "debug"
format = "compact"
directives = ["fishutils_events=trace"]
"#;

#[test]
fn test_file_builds_configured_bus() {
    let file = test_file(BUS_TOML, "toml");
    let resolved = Config::load_with_env(Some(file.path()), &HashMap::new()).unwrap();

    assert_eq!(resolved.loaded_files.len(), 1);
    assert_eq!(resolved.config.bus.error_policy, ErrorPolicy::Log);

    let bus = EventBus::from_config(&resolved.config.bus);
    assert_eq!(bus.name(), Some("audio"));
    assert!(bus.processes_duplicates());
    assert!(bus.is_cancellable());
    assert_eq!(format!("{:?}", bus.error_handler()), r#"ErrorHandler { policy: "log" }"#);
}

#[test]
fn test_configured_log_policy_keeps_dispatching() {
    let config = Config::from_toml_str(BUS_TOML).unwrap();
    let bus = CancellableEventBus::from_config(&config.bus);

    let log = OrderLog::new();
    bus.subscribe(Arc::new(
        Recorder::new("r", &log)
            .failing::<BaseEvent>("boom", Priority::High)
            .on::<BaseEvent>("after", Priority::Low),
    ))
    .unwrap();

    assert!(!bus.fire_cancellable(&mut BaseEvent::new("x")).unwrap());
    assert_eq!(log.entries(), vec!["r.boom", "r.after"]);
}

#[test]
fn test_configured_duplicates_shape_diamond_delivery() {
    let config = Config::from_toml_str("[bus]\nprocess_duplicates = true\n").unwrap();
    let diamond = Diamond::new(false);
    let bottom = EventBus::from_config(&config.bus);
    bottom.hook(&diamond.left).unwrap();
    bottom.hook(&diamond.right).unwrap();

    let log = OrderLog::new();
    bottom
        .subscribe(Arc::new(
            Recorder::new("bottom", &log).on::<BaseEvent>("seen", Priority::Normal),
        ))
        .unwrap();

    diamond.top.fire(&mut BaseEvent::new("x")).unwrap();
    assert_eq!(log.count("bottom.seen"), 2);
}

#[test]
fn test_missing_file_falls_back_to_defaults_and_env() {
    let dir = test_dir();
    let missing = dir.path().join("absent.toml");
    let env = HashMap::from([
        ("FISHUTILS_PROCESS_DUPLICATES".to_owned(), "yes".to_owned()),
        ("FISHUTILS_LOG_LEVEL".to_owned(), "warn".to_owned()),
    ]);

    let resolved = Config::load_with_env(Some(&missing), &env).unwrap();
    assert!(resolved.loaded_files.is_empty());
    assert!(resolved.config.bus.process_duplicates);
    assert_eq!(resolved.config.logging.level, "warn");
    assert_eq!(
        resolved.source_of("bus.process_duplicates"),
        Some(&ConfigLayer::Environment)
    );
    assert_eq!(
        resolved.source_of("bus.error_policy"),
        Some(&ConfigLayer::Defaults)
    );

    let bus = EventBus::from_config(&resolved.config.bus);
    assert!(bus.processes_duplicates());
    assert!(!bus.is_cancellable());
}

#[test]
fn test_file_value_wins_over_env() {
    let file = test_file("[logging]\nlevel = \"error\"\n", "toml");
    let env = HashMap::from([("FISHUTILS_LOG_LEVEL".to_owned(), "trace".to_owned())]);

    let resolved = Config::load_with_env(Some(file.path()), &env).unwrap();
    assert_eq!(resolved.config.logging.level, "error");
    assert!(matches!(
        resolved.source_of("logging.level"),
        Some(ConfigLayer::File(_))
    ));
}

#[test]
fn test_invalid_file_rejected() {
    let file = test_file("[logging]\nlevel = \"loud\"\n", "toml");
    let err = Config::load_with_env(Some(file.path()), &HashMap::new()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));

    let file = test_file("[bus\nname = ", "toml");
    let err = Config::load_with_env(Some(file.path()), &HashMap::new()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_logging_section_converts() {
    let config = Config::from_toml_str(BUS_TOML).unwrap();
    let log = LogConfig::from_config(&config.logging).unwrap();

    assert_eq!(log.level, "debug");
    assert_eq!(log.format, LogFormat::Compact);
    assert_eq!(log.directives, vec!["fishutils_events=trace"]);
}

#[test]
fn test_defaults_build_plain_aborting_bus() {
    let config = Config::default();
    let bus = EventBus::from_config(&config.bus);

    assert!(bus.name().is_none());
    assert!(!bus.processes_duplicates());
    assert!(!bus.is_cancellable());
    assert_eq!(format!("{:?}", bus.error_handler()), r#"ErrorHandler { policy: "abort" }"#);
}
