//! Common imports for configuration consumers.
//!
//! ```rust
//! use fishutils_config::prelude::*;
//! ```

pub use crate::{
    BusConfig, Config, ConfigError, ConfigResult, ErrorPolicy, LoggingConfig, ResolvedConfig,
};
