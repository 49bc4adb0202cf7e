/// Logger setup for the terminal front end
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` filter syntax, e.g. "sr3d_core=debug".
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    /// Level used when neither `env_filter` nor `RUST_LOG` is set
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Append records to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            log_file: None,
        }
    }
}

/// Log file used by the interactive view when none is given
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("sr3d-terminal.log")
}

static INIT: Once = Once::new();

/// Install the global logger. Later calls do nothing.
///
/// Output goes to `log_file` when set, otherwise stderr. The presenter owns
/// the terminal while the interactive view runs, so that view logs to a file.
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let file = match &config.log_file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(config.default_level);
        }

        match file {
            Some(file) => builder
                .target(env_logger::Target::Pipe(Box::new(file)))
                .write_style(env_logger::WriteStyle::Never),
            None => builder
                .target(env_logger::Target::Stderr)
                .write_style(config.write_style),
        };
        builder.init();

        log::debug!("logging initialized");
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this crate that installs the global logger
    #[test]
    fn test_records_go_to_log_file() {
        let path = std::env::temp_dir().join(format!("sr3d-logging-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&path);

        init_logging(LoggingConfig {
            env_filter: Some("warn".to_string()),
            log_file: Some(path.clone()),
            ..LoggingConfig::default()
        })
        .unwrap();
        log::warn!("surface resized to 0x0");
        log::info!("not at warn level");

        let written = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(written.contains("surface resized to 0x0"));
        assert!(!written.contains("not at warn level"));
        // Plain text, no color escapes
        assert!(!written.contains('\u{1b}'));
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let config = LoggingConfig {
            log_file: Some(PathBuf::from("/nonexistent-dir/sr3d/run.log")),
            ..LoggingConfig::default()
        };
        assert!(init_logging(config).is_err());
    }
}
