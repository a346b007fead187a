//! # MPC Safe
//!
//! ERC-4337 operations for Safe accounts whose only owner is a key held by a remote MPC signer.
//!
//! [`wallet::SafeWallet`] derives the counterfactual Safe of the signer, turns wallet signing
//! requests into the hash the signer signs, and submits signed operations to a bundler.
//! [`decode`] recovers the intent behind a signing payload.

pub mod account;
pub mod bundler;
pub mod chains;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod gas;
pub mod pimlico;
pub mod provider;
pub mod router;
pub mod safe;
pub mod safe_message;
pub mod serde;
pub mod signers;
pub mod transport;
pub mod types;
pub mod wallet;
