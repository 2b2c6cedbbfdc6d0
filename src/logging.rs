use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable naming a log file path.
pub const LOG_FILE_ENV: &str = "STATEFOLD_LOG";

/// Install a global tracing subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). Output goes to stderr,
/// or to a file when `STATEFOLD_LOG` is set. Log files get a unique
/// `{path}.{timestamp}.{pid}` name so concurrent processes never share one.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = std::env::var(LOG_FILE_ENV).ok().and_then(|log_path| {
        let pid = std::process::id();
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let unique_path = format!("{}.{}.{}", log_path, timestamp, pid);
        match std::fs::File::create(&unique_path) {
            Ok(file) => Some(file),
            Err(_) => {
                eprintln!("Warning: Failed to create log file: {}", unique_path);
                None
            }
        }
    });

    let (file_layer, stderr_layer) = match file {
        Some(file) => (
            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true),
            ),
            None,
        ),
        None => (
            None,
            Some(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339()),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok()
}
