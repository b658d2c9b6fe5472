//! Shared types for the Tiffin POS core
//!
//! Common types used across the workspace: domain models, the unified
//! error taxonomy, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{PosError, PosResult};
pub use models::order::{
    ItemStatus, KotTicket, NewOrder, Order, OrderItem, OrderType, OrderUpdate, OrderWithItems,
    PaymentMethod, PaymentStatus, SettleRequest,
};
