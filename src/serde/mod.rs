//! Serde helpers.

pub mod decimal_u256;
pub mod chain_map;
