pub mod build_info;
pub mod persistence;

use std::{env, path::PathBuf, sync::Once};

use dirs::home_dir;

const DEFAULT_DIR_NAME: &str = ".xfinance";
const DOCUMENTS_DIR: &str = "documents";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_LOG_DIRECTIVE: &str = "xfinance_core=info";

static TRACING_INIT: Once = Once::new();

/// Installs the global fmt subscriber, writing to stderr. `RUST_LOG` wins over `filter`, which
/// wins over the crate default.
pub fn init_tracing(filter: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let fallback = filter.unwrap_or(DEFAULT_LOG_DIRECTIVE);
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Application data directory: `XFINANCE_HOME`, else `~/.xfinance`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("XFINANCE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Root of the JSON document store inside `base`.
pub fn documents_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(DOCUMENTS_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}
