//! Command handlers. Each returns the rendered stdout document.

pub mod inventory;
pub mod lookup;
