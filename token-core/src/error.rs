//! Error types for the token ledger

use crate::types::{AccountId, Gate, LogicId, Role};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every variant is returned before the operation's transaction commits,
/// so a failed call leaves all storage exactly as it was.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not the current owner
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// Principal that issued the call
        caller: AccountId,
    },

    /// Caller is neither the owner nor a member of the required registry
    #[error("caller {caller} is not authorized for {role}")]
    NotAuthorized {
        /// Principal that issued the call
        caller: AccountId,
        /// Registry whose membership would have authorized the call
        role: Role,
    },

    /// Duplicate add into a role or gate set
    #[error("account {account} is already a member")]
    AlreadyMember {
        /// Account that was already present
        account: AccountId,
    },

    /// Removal of an account that is not a member
    #[error("account {account} is not a member")]
    NotMember {
        /// Account that was absent
        account: AccountId,
    },

    /// Mint would push total supply above the cap
    #[error("mint would exceed cap of {cap}")]
    CapExceeded {
        /// Immutable supply cap
        cap: u128,
    },

    /// Unlocked balance is insufficient for the requested amount
    #[error("insufficient unlocked balance for account {account}")]
    InsufficientBalance {
        /// Account whose balance fell short
        account: AccountId,
    },

    /// Allowance is insufficient for a spend-on-behalf operation
    #[error("insufficient allowance from {owner} to {spender}")]
    InsufficientAllowance {
        /// Account whose funds would be spent
        owner: AccountId,
        /// Caller spending on behalf of `owner`
        spender: AccountId,
    },

    /// Arithmetic would overflow the amount range
    #[error("amount arithmetic overflow")]
    AmountOverflow,

    /// The empty identifier was supplied where a real principal is required
    #[error("empty account identifier")]
    EmptyAccount,

    /// Transfer denied by a locked gate
    #[error("{gate} denied account {account}")]
    GateDenied {
        /// Gate that rejected the call
        gate: Gate,
        /// Account that failed the membership check
        account: AccountId,
    },

    /// Second initialization attempt
    #[error("ledger is already initialized")]
    AlreadyInitialized,

    /// Mutating operation before initialization
    #[error("ledger is not initialized")]
    NotInitialized,

    /// Call reached a logic unit outside a proxy execution context,
    /// or the proxy has no logic unit bound
    #[error("no logic unit bound to the delegation slot")]
    DelegationUnbound,

    /// Delegation target is not a registered logic unit
    #[error("unknown logic unit {logic}")]
    UnknownLogic {
        /// Identifier that was not found in the dispatch table
        logic: LogicId,
    },

    /// Batch arrays of different lengths
    #[error("batch length mismatch: {amounts} amounts vs {unlock_times} unlock times")]
    LengthMismatch {
        /// Number of amounts supplied
        amounts: usize,
        /// Number of unlock times supplied
        unlock_times: usize,
    },

    /// Locked entries must carry a positive amount
    #[error("locked amount must be positive")]
    ZeroLockAmount,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
