//! Order core: store, manager, money
//!
//! The store owns the data, the manager owns the rules, and `money` is
//! the pure billing calculator both lean on.

pub mod manager;
pub mod money;
pub mod store;

pub use manager::OrderManager;
pub use store::OrderStore;

#[cfg(test)]
mod tests;
