//! Delegation Proxy: the fixed entry point owning all storage
//!
//! The proxy holds the single [`TokenState`] plus a dispatch table of
//! registered logic units. Every operation resolves the unit bound to
//! the delegation slot and executes it against a working copy of the
//! state, committing only on success — so every mutating call is
//! all-or-nothing, and a failed call leaves storage bit-for-bit
//! unchanged. Swapping the delegation slot is the upgrade mechanism:
//! the storage never moves, only the interpreting code changes.

use crate::error::{Error, Result};
use crate::logic::LogicUnit;
use crate::state::TokenState;
use crate::types::{AccountId, CallContext, Gate, LogicId, Role};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Fixed-address forwarding shell over a swappable logic unit
pub struct TokenProxy {
    /// All ledger/role/gate storage, shared across upgrades
    state: TokenState,

    /// Deployed logic units, addressable by the delegation slot
    units: BTreeMap<LogicId, Arc<dyn LogicUnit>>,
}

impl std::fmt::Debug for TokenProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProxy")
            .field("state", &self.state)
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TokenProxy {
    /// Deploy a proxy; `deployer` holds ownership until `initialize`
    /// re-records the initializing caller as owner
    pub fn new(deployer: AccountId) -> Self {
        let mut state = TokenState::detached();
        state.owner = Some(deployer);
        Self {
            state,
            units: BTreeMap::new(),
        }
    }

    /// Deploy a logic unit into the dispatch table
    ///
    /// Registration alone changes no behavior; the unit only runs once
    /// the delegation slot points at it.
    pub fn register_logic(&mut self, unit: Arc<dyn LogicUnit>) -> LogicId {
        let logic = LogicId::new();
        self.units.insert(logic, unit);
        info!(%logic, "logic unit registered");
        logic
    }

    /// One-time binding and initialization: points the delegation slot
    /// at `logic` and forwards the initialize call to it
    pub fn initialize(&mut self, ctx: &CallContext, logic: LogicId, cap: u128) -> Result<()> {
        if self.state.initialized {
            return Err(Error::AlreadyInitialized);
        }
        let unit = self.resolve(logic)?;

        let mut working = self.state.clone();
        working.delegation = Some(logic);
        unit.initialize(&mut working, ctx, logic, cap)?;
        self.state = working;
        info!(%logic, cap, "proxy initialized");
        Ok(())
    }

    /// Owner-only atomic swap of the delegation slot
    ///
    /// No stored field migrates; the new unit must interpret existing
    /// storage identically to the old one for any field it keeps using.
    pub fn transfer_delegation(&mut self, ctx: &CallContext, new_logic: LogicId) -> Result<()> {
        self.resolve(new_logic)?;
        self.state.require_owner(ctx)?;

        let previous = self.state.delegation;
        self.state.delegation = Some(new_logic);
        info!(?previous, %new_logic, "delegation transferred");
        Ok(())
    }

    /// Currently bound logic unit
    pub fn delegation(&self) -> Option<LogicId> {
        self.state.delegation
    }

    /// Logic unit recorded at initialization
    pub fn this_addr(&self) -> Option<LogicId> {
        self.state.this_addr
    }

    // -- ownership --

    /// Current owner
    pub fn owner(&self) -> Option<&AccountId> {
        self.state.owner()
    }

    /// Owner-only ownership handover
    pub fn transfer_ownership(&mut self, ctx: &CallContext, new_owner: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.transfer_ownership(state, ctx, new_owner))
    }

    // -- ledger --

    /// Total supply
    pub fn total_supply(&self) -> u128 {
        self.state.total_supply()
    }

    /// Supply cap
    pub fn cap(&self) -> u128 {
        self.state.cap()
    }

    /// Nominal balance: free portion plus every locked entry
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.state.balance_of(account)
    }

    /// Remaining allowance from `owner` to `spender`
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.state.allowance(owner, spender)
    }

    /// Owner-only mint
    pub fn mint(&mut self, ctx: &CallContext, to: &AccountId, amount: u128) -> Result<()> {
        self.execute(|unit, state| unit.mint(state, ctx, to, amount))
    }

    /// Transfer out of the caller's unlocked balance
    pub fn transfer(&mut self, ctx: &CallContext, to: &AccountId, amount: u128) -> Result<()> {
        self.execute(|unit, state| unit.transfer(state, ctx, to, amount))
    }

    /// Allowance grant
    pub fn approve(&mut self, ctx: &CallContext, spender: &AccountId, amount: u128) -> Result<()> {
        self.execute(|unit, state| unit.approve(state, ctx, spender, amount))
    }

    /// Spend-on-behalf transfer
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<()> {
        self.execute(|unit, state| unit.transfer_from(state, ctx, from, to, amount))
    }

    // -- role registries --

    /// Admin registry membership test
    pub fn is_admin(&self, account: &AccountId) -> bool {
        crate::roles::is_member(&self.state, Role::Admins, account)
    }

    /// Autoblocker registry membership test
    pub fn is_autoblocker(&self, account: &AccountId) -> bool {
        crate::roles::is_member(&self.state, Role::Autoblockers, account)
    }

    /// Add one Admin
    pub fn add_to_admins(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.add_to_role(state, ctx, Role::Admins, account))
    }

    /// Add a batch of Admins, all-or-nothing
    pub fn add_list_to_admins(&mut self, ctx: &CallContext, accounts: &[AccountId]) -> Result<()> {
        self.execute(|unit, state| unit.add_list_to_role(state, ctx, Role::Admins, accounts))
    }

    /// Remove one Admin
    pub fn remove_from_admins(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.remove_from_role(state, ctx, Role::Admins, account))
    }

    /// Remove a batch of Admins, all-or-nothing
    pub fn remove_list_from_admins(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| unit.remove_list_from_role(state, ctx, Role::Admins, accounts))
    }

    /// Add one Autoblocker
    pub fn add_to_autoblockers(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.add_to_role(state, ctx, Role::Autoblockers, account))
    }

    /// Add a batch of Autoblockers, all-or-nothing
    pub fn add_list_to_autoblockers(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| unit.add_list_to_role(state, ctx, Role::Autoblockers, accounts))
    }

    /// Remove one Autoblocker
    pub fn remove_from_autoblockers(
        &mut self,
        ctx: &CallContext,
        account: &AccountId,
    ) -> Result<()> {
        self.execute(|unit, state| unit.remove_from_role(state, ctx, Role::Autoblockers, account))
    }

    /// Remove a batch of Autoblockers, all-or-nothing
    pub fn remove_list_from_autoblockers(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| {
            unit.remove_list_from_role(state, ctx, Role::Autoblockers, accounts)
        })
    }

    // -- gates --

    /// Whitelist membership test
    pub fn is_whitelisted(&self, account: &AccountId) -> bool {
        crate::gates::is_member(&self.state, Gate::Whitelist, account)
    }

    /// Blacklist membership test
    pub fn is_blacklisted(&self, account: &AccountId) -> bool {
        crate::gates::is_member(&self.state, Gate::Blacklist, account)
    }

    /// Whether the whitelist check is bypassed
    pub fn whitelist_unlocked(&self) -> bool {
        crate::gates::unlocked(&self.state, Gate::Whitelist)
    }

    /// Whether the blacklist check is bypassed
    pub fn blacklist_unlocked(&self) -> bool {
        crate::gates::unlocked(&self.state, Gate::Blacklist)
    }

    /// Add one account to the whitelist
    pub fn add_to_whitelist(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.add_to_gate(state, ctx, Gate::Whitelist, account))
    }

    /// Add a batch to the whitelist, all-or-nothing
    pub fn add_list_to_whitelist(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| unit.add_list_to_gate(state, ctx, Gate::Whitelist, accounts))
    }

    /// Remove one account from the whitelist
    pub fn remove_from_whitelist(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.remove_from_gate(state, ctx, Gate::Whitelist, account))
    }

    /// Remove a batch from the whitelist, all-or-nothing
    pub fn remove_list_from_whitelist(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| {
            unit.remove_list_from_gate(state, ctx, Gate::Whitelist, accounts)
        })
    }

    /// Add one account to the blacklist
    pub fn add_to_blacklist(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.add_to_gate(state, ctx, Gate::Blacklist, account))
    }

    /// Add a batch to the blacklist, all-or-nothing
    pub fn add_list_to_blacklist(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| unit.add_list_to_gate(state, ctx, Gate::Blacklist, accounts))
    }

    /// Remove one account from the blacklist
    pub fn remove_from_blacklist(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.remove_from_gate(state, ctx, Gate::Blacklist, account))
    }

    /// Remove a batch from the blacklist, all-or-nothing
    pub fn remove_list_from_blacklist(
        &mut self,
        ctx: &CallContext,
        accounts: &[AccountId],
    ) -> Result<()> {
        self.execute(|unit, state| {
            unit.remove_list_from_gate(state, ctx, Gate::Blacklist, accounts)
        })
    }

    /// Flip the whitelist bypass flag (owner or Admin)
    pub fn set_whitelist_unlock(&mut self, ctx: &CallContext, unlocked: bool) -> Result<()> {
        self.execute(|unit, state| unit.set_gate_unlock(state, ctx, Gate::Whitelist, unlocked))
    }

    /// Flip the blacklist bypass flag (owner or Autoblocker)
    pub fn set_blacklist_unlock(&mut self, ctx: &CallContext, unlocked: bool) -> Result<()> {
        self.execute(|unit, state| unit.set_gate_unlock(state, ctx, Gate::Blacklist, unlocked))
    }

    // -- locked balances --

    /// Sum of entries not yet matured at `now`
    pub fn locked_balance_of(&self, account: &AccountId, now: DateTime<Utc>) -> u128 {
        crate::timelock::locked_balance_of(&self.state, account, now)
    }

    /// Free balance plus matured-but-unconsolidated entries
    pub fn unlocked_balance_of(&self, account: &AccountId, now: DateTime<Utc>) -> u128 {
        crate::timelock::unlocked_balance_of(&self.state, account, now)
    }

    /// Number of physically present locked entries
    pub fn locked_balance_length(&self, account: &AccountId) -> usize {
        crate::timelock::locked_balance_length(&self.state, account)
    }

    /// Owner-only mint of a locked entry
    pub fn mint_locked_balance(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        unlock_time: DateTime<Utc>,
    ) -> Result<()> {
        self.execute(|unit, state| unit.mint_locked_balance(state, ctx, to, amount, unlock_time))
    }

    /// Owner-only force-unlock of every entry for `account`
    pub fn unlock_all_funds(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.unlock_all_funds(state, ctx, account))
    }

    /// Fold matured entries into the free balance; open to anyone
    pub fn consolidate_balance(&mut self, ctx: &CallContext, account: &AccountId) -> Result<()> {
        self.execute(|unit, state| unit.consolidate_balance(state, ctx, account))
    }

    /// Move caller funds into one locked entry under `to`
    pub fn transfer_locked_funds(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        unlock_time: DateTime<Utc>,
    ) -> Result<()> {
        self.execute(|unit, state| unit.transfer_locked_funds(state, ctx, to, amount, unlock_time))
    }

    /// Batch variant of [`Self::transfer_locked_funds`]
    pub fn transfer_list_of_locked_funds(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amounts: &[u128],
        unlock_times: &[DateTime<Utc>],
    ) -> Result<()> {
        self.execute(|unit, state| {
            unit.transfer_list_of_locked_funds(state, ctx, to, amounts, unlock_times)
        })
    }

    // -- state access --

    /// Serialize the full state (layout documented on [`TokenState`])
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.state.snapshot()
    }

    /// Borrow the state for inspection
    pub fn state(&self) -> &TokenState {
        &self.state
    }

    /// Forward one call to the bound logic unit within a transaction:
    /// mutate a working copy, commit on success, discard on failure
    fn execute<T>(
        &mut self,
        call: impl FnOnce(&dyn LogicUnit, &mut TokenState) -> Result<T>,
    ) -> Result<T> {
        let logic = self.state.delegation.ok_or(Error::DelegationUnbound)?;
        let unit = self.resolve(logic)?;

        let mut working = self.state.clone();
        let out = call(unit.as_ref(), &mut working)?;
        self.state = working;
        Ok(out)
    }

    fn resolve(&self, logic: LogicId) -> Result<Arc<dyn LogicUnit>> {
        self.units
            .get(&logic)
            .cloned()
            .ok_or(Error::UnknownLogic { logic })
    }
}
