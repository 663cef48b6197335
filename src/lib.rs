//! # Vault Kit
//!
//! Library for reading MetaMorpho vault positions and bundling deposits and withdrawals against a
//! block-anchored simulation snapshot.

pub mod addresses;
pub mod api;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod math;
pub mod position;
pub mod provider;
pub mod serde;
pub mod simulation;
pub mod types;
pub mod wallet;
