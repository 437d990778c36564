//! Test harness helpers.

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};
use tracing_subscriber::EnvFilter;

/// Create a temporary directory for testing.
///
/// The directory is cleaned up when the returned `TempDir` is dropped.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a temporary file with the given content and extension.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_file(content: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Set up test logging with the given filter.
///
/// Output goes through the test writer, so it is only shown for failing
/// tests. Calling it again in the same process is a no-op.
///
/// ```rust,ignore
/// use fishutils_test::setup_test_logging;
///
/// #[test]
/// fn my_test() {
///     setup_test_logging("fishutils_events=trace");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging at the default `warn` level.
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir() {
        let dir = test_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_temp_file() {
        let file = test_file("[bus]\ncancellable = true\n", "toml");
        assert!(file.path().to_string_lossy().ends_with(".toml"));
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "[bus]\ncancellable = true\n");
    }

    #[test]
    fn test_logging_setup_is_idempotent() {
        setup_test_logging("debug");
        setup_test_logging_default();
        tracing::debug!("still fine");
    }
}
