//! Engine configuration
//!
//! # Environment variables
//!
//! Every setting can be overridden through the environment:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | WORK_DIR | /var/lib/tiffin | Working directory (logs, mirror) |
//! | MIRROR_ENABLED | true | Mirror order snapshots to JSON files |
//! | MIRROR_DIR | <WORK_DIR>/mirror | Snapshot output directory |
//! | MIRROR_MAX_RETRIES | 3 | Write attempts before dead-lettering |
//! | MIRROR_SCAN_INTERVAL_SECS | 60 | Pending-queue rescan interval |
//! | LOG_LEVEL | info | tracing level filter |

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for logs and mirror output
    pub work_dir: String,
    /// Whether the mirror worker is started at all
    pub mirror_enabled: bool,
    /// Directory the mirror worker writes order snapshots into
    pub mirror_dir: String,
    /// Write attempts before an order lands in the dead-letter list
    pub mirror_max_retries: u32,
    /// Interval between pending-queue rescans
    pub mirror_scan_interval_secs: u64,
    /// tracing level filter
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/tiffin".into());
        let mirror_dir =
            std::env::var("MIRROR_DIR").unwrap_or_else(|_| format!("{}/mirror", work_dir));
        Self {
            mirror_enabled: std::env::var("MIRROR_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            mirror_dir,
            mirror_max_retries: std::env::var("MIRROR_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            mirror_scan_interval_secs: std::env::var("MIRROR_SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            work_dir,
        }
    }

    /// Override the directories, keeping everything else from the
    /// environment. Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.mirror_dir = format!("{}/mirror", config.work_dir);
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
