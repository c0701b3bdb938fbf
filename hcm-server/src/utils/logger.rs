//! Logging Infrastructure
//!
//! Console output (pretty or JSON) filtered by `RUST_LOG`, falling back to
//! the given level. With a log directory, two daily rotating files are added:
//! - `app/app.YYYY-MM-DD` - everything except security events
//! - `security/security.YYYY-MM-DD` - `security_log!` events only

use std::fs;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Default filter when neither `RUST_LOG` nor `LOG_LEVEL` is set
pub const DEFAULT_FILTER: &str = "hcm_server=info,tower_http=info,security=info";

/// Build the filter directive for a plain level like `debug`
fn filter_directive(level: Option<&str>) -> String {
    match level {
        Some(level) if !level.contains('=') => {
            format!("hcm_server={level},shared={level},tower_http={level},security=info")
        }
        Some(directive) => directive.to_string(),
        None => DEFAULT_FILTER.to_string(),
    }
}

fn env_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(level)))
}

/// Initialize console logging with defaults
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize logging
///
/// * `level` - a level (`debug`) or a full filter directive
/// * `json` - JSON console output (production)
/// * `log_dir` - optional directory for daily rotating files
///
/// Calling it twice is harmless: the second subscriber is ignored.
pub fn init_logger_with_file(level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let json = json.unwrap_or(false);

    let console_layer = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_thread_ids(false).boxed()
    };

    let file_layers = log_dir.and_then(|dir| match file_layers(Path::new(dir)) {
        Ok(layers) => Some(layers),
        Err(e) => {
            eprintln!("Failed to create log directory {dir}: {e}");
            None
        }
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layers)
        .with(console_layer)
        .try_init();
}

type FilteredRegistry = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

fn file_layers(log_dir: &Path) -> std::io::Result<Vec<BoxedLayer>> {
    let app_dir = log_dir.join("app");
    let security_dir = log_dir.join("security");
    fs::create_dir_all(&app_dir)?;
    fs::create_dir_all(&security_dir)?;

    let app_log = RollingFileAppender::new(Rotation::DAILY, app_dir, "app");
    let app_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(app_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() != "security"
        }))
        .boxed();

    let security_log = RollingFileAppender::new(Rotation::DAILY, security_dir, "security");
    let security_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(security_log))
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == "security"
        }))
        .boxed();

    Ok(vec![app_layer, security_layer])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(None), DEFAULT_FILTER);
        assert_eq!(
            filter_directive(Some("debug")),
            "hcm_server=debug,shared=debug,tower_http=debug,security=info"
        );
        assert_eq!(filter_directive(Some("hcm_server=trace")), "hcm_server=trace");
    }

    #[test]
    fn test_file_layers_create_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layers = file_layers(dir.path()).unwrap();
        assert_eq!(layers.len(), 2);
        assert!(dir.path().join("app").is_dir());
        assert!(dir.path().join("security").is_dir());
    }
}
