//! Core types for the token ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode, positional field order)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (checked u128 for amounts)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier (principal participating in the ledger)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty identifier; never a valid owner or delegation target
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a deployed logic unit in the proxy's dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicId(Uuid);

impl LogicId {
    /// Mint a fresh logic unit identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LogicId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role registries with owner-bootstrapped, member-self-service growth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Governs the whitelist gate
    Admins,
    /// Governs the blacklist gate; members' outgoing transfers
    /// blacklist the recipient
    Autoblockers,
}

impl Role {
    /// Registry name for logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admins => "admins",
            Role::Autoblockers => "autoblockers",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transfer gates: a membership set plus an "unlocked" override flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    /// Deny-by-default: transfer endpoints must be members while locked
    Whitelist,
    /// Allow-by-default: a member sender is denied while locked
    Blacklist,
}

impl Gate {
    /// Gate name for logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Whitelist => "whitelist",
            Gate::Blacklist => "blacklist",
        }
    }

    /// Role registry allowed to mutate this gate (beyond the owner)
    pub fn governing_role(&self) -> Role {
        match self {
            Gate::Whitelist => Role::Admins,
            Gate::Blacklist => Role::Autoblockers,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A balance fragment that becomes spendable only after `unlock_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedEntry {
    /// Locked amount; always positive
    pub amount: u128,

    /// Instant at which the amount matures into the free balance
    pub unlock_time: DateTime<Utc>,
}

impl LockedEntry {
    /// Whether the entry counts toward the unlocked portion at `now`
    pub fn matured(&self, now: DateTime<Utc>) -> bool {
        self.unlock_time <= now
    }
}

/// Identity and timestamp a call executes under
///
/// The substrate delivers both with every invocation; tests advance time
/// simply by constructing contexts with a later `now`.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Principal issuing the call
    pub caller: AccountId,

    /// Wall-clock instant of the call
    pub now: DateTime<Utc>,
}

impl CallContext {
    /// Context for `caller` at the current wall-clock time
    pub fn new(caller: AccountId) -> Self {
        Self {
            caller,
            now: Utc::now(),
        }
    }

    /// Context for `caller` at an explicit instant
    pub fn at(caller: AccountId, now: DateTime<Utc>) -> Self {
        Self { caller, now }
    }
}
