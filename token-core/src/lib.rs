//! Token Core
//!
//! Upgradeable, access-controlled fungible-balance ledger.
//!
//! # Architecture
//!
//! - **Delegation Proxy**: A fixed [`TokenProxy`] owns all storage and
//!   forwards every call to a swappable [`LogicUnit`]
//! - **Upgrades**: The owner repoints the delegation slot; storage
//!   never migrates
//! - **Role Registries**: Independent Admin and Autoblocker sets
//! - **List Gates**: Whitelist and blacklist checks on every transfer,
//!   locked by default
//! - **Locked Balances**: Time-locked entries that mature by timestamp
//!   and consolidate into the free balance
//!
//! # Invariants
//!
//! - Supply conservation: total supply equals the sum of all balances
//!   (free and locked) and never exceeds the cap
//! - Atomicity: a failed call leaves storage bit-for-bit unchanged
//! - Deterministic: all identity and time arrive via [`CallContext`]

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod gates;
pub mod ledger;
pub mod logic;
pub mod proxy;
pub mod roles;
pub mod state;
pub mod timelock;
pub mod types;

// Re-exports
pub use config::{deploy, Config};
pub use error::{Error, Result};
pub use logic::{LogicUnit, StandardLogic};
pub use proxy::TokenProxy;
pub use state::TokenState;
pub use types::{AccountId, CallContext, Gate, LockedEntry, LogicId, Role};
