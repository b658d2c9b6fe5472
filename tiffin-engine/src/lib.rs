//! Tiffin Engine - restaurant POS core
//!
//! # Architecture overview
//!
//! The engine owns the authoritative in-memory order state and every rule
//! that touches money or item status:
//!
//! - **Orders** (`orders`): order store, item lifecycle, billing, settlement
//! - **Mirror** (`mirror`): asynchronous JSON snapshot outbox
//! - **Reports** (`reports`): range queries and sales summaries
//!
//! # Module structure
//!
//! ```text
//! tiffin-engine/src/
//! ├── config.rs      # Environment-driven configuration
//! ├── logger.rs      # tracing setup
//! ├── orders/        # Store, manager, money
//! ├── mirror/        # Snapshot outbox worker
//! └── reports.rs     # Sales summaries
//! ```
//!
//! # Command flow
//!
//! ```text
//! OrderManager::add_item(...)
//!     ├─ 1. Acquire store write lock
//!     ├─ 2. Validate order exists
//!     ├─ 3. Insert item (status PENDING)
//!     ├─ 4. Recalculate order totals (Decimal, 2dp)
//!     ├─ 5. Release lock
//!     └─ 6. Notify mirror worker (never blocks, never fails the caller)
//! ```

pub mod config;
pub mod logger;
pub mod mirror;
pub mod orders;
pub mod reports;

// Re-export public types
pub use config::Config;
pub use logger::{init_logger, init_logger_with_file};
pub use mirror::{MirrorHandle, MirrorHealth, MirrorWorker};
pub use orders::{OrderManager, OrderStore};
pub use reports::{RangeQuery, SalesSummary};

// Re-export unified error types from shared
pub use shared::{PosError, PosResult};
