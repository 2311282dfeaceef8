//! Shared storage for the proxy and every logic unit bound to it
//!
//! `TokenState` is the single source of truth the Delegation Proxy owns.
//! Logic units never hold balances of their own; they interpret this
//! struct. Upgrading swaps the interpreting code, never the storage.
//!
//! # Layout contract
//!
//! The serialized layout (bincode is positional) is exactly the declared
//! field order. Fields are append-only: new logic units may add fields at
//! the end, but existing fields must never be reordered, retyped, or
//! removed, or snapshots taken before an upgrade become unreadable after
//! it. The proxy-level fields (`delegation`, `this_addr`, `owner`) come
//! first and before any logic-unit-specific field.

use crate::error::{Error, Result};
use crate::types::{AccountId, CallContext, Gate, LockedEntry, LogicId, Role};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// All persisted ledger state
///
/// Ordered collections throughout, so snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    // -- proxy fields: positions fixed forever --
    /// Active logic unit; every forwarded call executes its code
    pub(crate) delegation: Option<LogicId>,

    /// Logic unit recorded at initialization
    pub(crate) this_addr: Option<LogicId>,

    /// Single privileged principal
    pub(crate) owner: Option<AccountId>,

    // -- logic unit fields: append-only from here --
    /// Whether `initialize` has run
    pub(crate) initialized: bool,

    /// Immutable-after-initialization supply cap
    pub(crate) cap: u128,

    /// Sum of all free balances and locked entry amounts
    pub(crate) total_supply: u128,

    /// Free (immediately spendable) balances
    pub(crate) balances: BTreeMap<AccountId, u128>,

    /// Allowances: funds owner -> spender -> remaining amount
    pub(crate) allowances: BTreeMap<AccountId, BTreeMap<AccountId, u128>>,

    /// Admin registry (governs the whitelist)
    pub(crate) admins: BTreeSet<AccountId>,

    /// Autoblocker registry (governs the blacklist)
    pub(crate) autoblockers: BTreeSet<AccountId>,

    /// Whitelist gate membership
    pub(crate) whitelist: BTreeSet<AccountId>,

    /// When true, the whitelist check is bypassed entirely
    pub(crate) whitelist_unlocked: bool,

    /// Blacklist gate membership
    pub(crate) blacklist: BTreeSet<AccountId>,

    /// When true, the blacklist check is bypassed entirely
    pub(crate) blacklist_unlocked: bool,

    /// Per-account locked entries, in insertion order
    pub(crate) locked_balances: BTreeMap<AccountId, Vec<LockedEntry>>,
}

impl TokenState {
    /// Fresh storage with nothing bound and nothing minted
    ///
    /// This is also the standalone storage a logic unit template carries
    /// outside any proxy: its delegation slot is empty, which is what
    /// makes direct initialization attempts fail.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Serialize the full state (deterministic, positional layout)
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Rebuild state from a snapshot
    pub fn restore(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Current owner, if any
    pub fn owner(&self) -> Option<&AccountId> {
        self.owner.as_ref()
    }

    /// Supply cap
    pub fn cap(&self) -> u128 {
        self.cap
    }

    /// Total supply
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Nominal balance: free portion plus every locked entry
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.free_balance(account)
            + self
                .locked_entries(account)
                .iter()
                .map(|e| e.amount)
                .sum::<u128>()
    }

    /// Remaining allowance from `owner` to `spender`
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|per_spender| per_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Free balance only (excludes locked entries, matured or not)
    pub(crate) fn free_balance(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Locked entries for `account`, empty slice if none
    pub(crate) fn locked_entries(&self, account: &AccountId) -> &[LockedEntry] {
        self.locked_balances
            .get(account)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Add to a free balance, failing on overflow
    pub(crate) fn credit(&mut self, account: &AccountId, amount: u128) -> Result<()> {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(Error::AmountOverflow)?;
        Ok(())
    }

    /// Subtract from a free balance, failing on shortfall
    pub(crate) fn debit(&mut self, account: &AccountId, amount: u128) -> Result<()> {
        let balance = self.free_balance(account);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_else(|| Error::InsufficientBalance {
                account: account.clone(),
            })?;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), remaining);
        }
        Ok(())
    }

    /// Membership set of a role registry
    pub(crate) fn role_set(&self, role: Role) -> &BTreeSet<AccountId> {
        match role {
            Role::Admins => &self.admins,
            Role::Autoblockers => &self.autoblockers,
        }
    }

    /// Mutable membership set of a role registry
    pub(crate) fn role_set_mut(&mut self, role: Role) -> &mut BTreeSet<AccountId> {
        match role {
            Role::Admins => &mut self.admins,
            Role::Autoblockers => &mut self.autoblockers,
        }
    }

    /// Membership set of a gate
    pub(crate) fn gate_set(&self, gate: Gate) -> &BTreeSet<AccountId> {
        match gate {
            Gate::Whitelist => &self.whitelist,
            Gate::Blacklist => &self.blacklist,
        }
    }

    /// Mutable membership set of a gate
    pub(crate) fn gate_set_mut(&mut self, gate: Gate) -> &mut BTreeSet<AccountId> {
        match gate {
            Gate::Whitelist => &mut self.whitelist,
            Gate::Blacklist => &mut self.blacklist,
        }
    }

    /// Whether a gate's check is currently bypassed
    pub(crate) fn gate_unlocked(&self, gate: Gate) -> bool {
        match gate {
            Gate::Whitelist => self.whitelist_unlocked,
            Gate::Blacklist => self.blacklist_unlocked,
        }
    }

    /// Set a gate's bypass flag
    pub(crate) fn set_gate_unlocked(&mut self, gate: Gate, unlocked: bool) {
        match gate {
            Gate::Whitelist => self.whitelist_unlocked = unlocked,
            Gate::Blacklist => self.blacklist_unlocked = unlocked,
        }
    }

    /// Fail unless the context's caller is the current owner
    pub(crate) fn require_owner(&self, ctx: &CallContext) -> Result<()> {
        if self.owner.as_ref() == Some(&ctx.caller) {
            Ok(())
        } else {
            Err(Error::NotOwner {
                caller: ctx.caller.clone(),
            })
        }
    }

    /// Fail unless `initialize` has run
    pub(crate) fn require_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }
}
