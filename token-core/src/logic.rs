//! Logic units: the swappable behavior behind the Delegation Proxy
//!
//! A logic unit is pure behavior over [`TokenState`]; it owns no storage
//! of its own. The proxy resolves the unit bound to its delegation slot
//! and executes it against the proxy's state, so an upgrade changes which
//! code interprets the storage without touching the storage itself.
//!
//! Implementations must honor the layout contract documented on
//! [`TokenState`]: interpret existing fields identically to their
//! predecessors and only ever append new ones.

use crate::error::Result;
use crate::state::TokenState;
use crate::types::{AccountId, CallContext, Gate, LogicId, Role};
use crate::{gates, ledger, roles, timelock};
use chrono::{DateTime, Utc};

/// Behavioral contract of a logic unit
///
/// Each method mutates the supplied state under the caller's transaction
/// boundary; implementations return early on any rule violation and
/// leave commit-or-discard to the proxy.
pub trait LogicUnit: Send + Sync {
    /// One-time setup: cap, owner, and the recorded logic identity
    fn initialize(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        logic: LogicId,
        cap: u128,
    ) -> Result<()>;

    /// Owner-only ownership handover
    fn transfer_ownership(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        new_owner: &AccountId,
    ) -> Result<()>;

    /// Owner-only mint into the free balance
    fn mint(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<()>;

    /// Allowance grant
    fn approve(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        spender: &AccountId,
        amount: u128,
    ) -> Result<()>;

    /// Transfer out of the caller's unlocked balance
    fn transfer(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<()>;

    /// Spend-on-behalf transfer
    fn transfer_from(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<()>;

    /// Add one member to a role registry
    fn add_to_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        account: &AccountId,
    ) -> Result<()>;

    /// Remove one member from a role registry
    fn remove_from_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        account: &AccountId,
    ) -> Result<()>;

    /// Add a batch of members to a role registry, all-or-nothing
    fn add_list_to_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        accounts: &[AccountId],
    ) -> Result<()>;

    /// Remove a batch of members from a role registry, all-or-nothing
    fn remove_list_from_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        accounts: &[AccountId],
    ) -> Result<()>;

    /// Add one member to a gate set
    fn add_to_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        account: &AccountId,
    ) -> Result<()>;

    /// Remove one member from a gate set
    fn remove_from_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        account: &AccountId,
    ) -> Result<()>;

    /// Add a batch of members to a gate set, all-or-nothing
    fn add_list_to_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        accounts: &[AccountId],
    ) -> Result<()>;

    /// Remove a batch of members from a gate set, all-or-nothing
    fn remove_list_from_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        accounts: &[AccountId],
    ) -> Result<()>;

    /// Flip a gate's bypass flag
    fn set_gate_unlock(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        unlocked: bool,
    ) -> Result<()>;

    /// Owner-only mint of a locked entry
    fn mint_locked_balance(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        unlock_time: DateTime<Utc>,
    ) -> Result<()>;

    /// Owner-only force-unlock of every entry for `account`
    fn unlock_all_funds(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        account: &AccountId,
    ) -> Result<()>;

    /// Fold matured entries into the free balance; open to anyone
    fn consolidate_balance(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        account: &AccountId,
    ) -> Result<()>;

    /// Move caller funds into one locked entry under `to`
    fn transfer_locked_funds(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        unlock_time: DateTime<Utc>,
    ) -> Result<()>;

    /// Batch variant of `transfer_locked_funds`
    fn transfer_list_of_locked_funds(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amounts: &[u128],
        unlock_times: &[DateTime<Utc>],
    ) -> Result<()>;
}

/// The standard logic unit: capped mint, role registries, both gates,
/// and the locked-balance sub-ledger
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardLogic;

impl LogicUnit for StandardLogic {
    fn initialize(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        logic: LogicId,
        cap: u128,
    ) -> Result<()> {
        ledger::initialize(state, ctx, logic, cap)
    }

    fn transfer_ownership(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        new_owner: &AccountId,
    ) -> Result<()> {
        ledger::transfer_ownership(state, ctx, new_owner)
    }

    fn mint(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<()> {
        ledger::mint(state, ctx, to, amount)
    }

    fn approve(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        spender: &AccountId,
        amount: u128,
    ) -> Result<()> {
        ledger::approve(state, ctx, spender, amount)
    }

    fn transfer(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<()> {
        ledger::transfer(state, ctx, to, amount)
    }

    fn transfer_from(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<()> {
        ledger::transfer_from(state, ctx, from, to, amount)
    }

    fn add_to_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        account: &AccountId,
    ) -> Result<()> {
        roles::add(state, ctx, role, account)
    }

    fn remove_from_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        account: &AccountId,
    ) -> Result<()> {
        roles::remove(state, ctx, role, account)
    }

    fn add_list_to_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        accounts: &[AccountId],
    ) -> Result<()> {
        roles::add_many(state, ctx, role, accounts)
    }

    fn remove_list_from_role(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        role: Role,
        accounts: &[AccountId],
    ) -> Result<()> {
        roles::remove_many(state, ctx, role, accounts)
    }

    fn add_to_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        account: &AccountId,
    ) -> Result<()> {
        gates::add(state, ctx, gate, account)
    }

    fn remove_from_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        account: &AccountId,
    ) -> Result<()> {
        gates::remove(state, ctx, gate, account)
    }

    fn add_list_to_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        accounts: &[AccountId],
    ) -> Result<()> {
        gates::add_many(state, ctx, gate, accounts)
    }

    fn remove_list_from_gate(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        accounts: &[AccountId],
    ) -> Result<()> {
        gates::remove_many(state, ctx, gate, accounts)
    }

    fn set_gate_unlock(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        gate: Gate,
        unlocked: bool,
    ) -> Result<()> {
        gates::set_unlock(state, ctx, gate, unlocked)
    }

    fn mint_locked_balance(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        unlock_time: DateTime<Utc>,
    ) -> Result<()> {
        timelock::mint_locked(state, ctx, to, amount, unlock_time)
    }

    fn unlock_all_funds(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        account: &AccountId,
    ) -> Result<()> {
        timelock::unlock_all(state, ctx, account)
    }

    fn consolidate_balance(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        account: &AccountId,
    ) -> Result<()> {
        state.require_initialized()?;
        timelock::consolidate(state, account, ctx.now);
        Ok(())
    }

    fn transfer_locked_funds(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        unlock_time: DateTime<Utc>,
    ) -> Result<()> {
        timelock::transfer_locked(state, ctx, to, amount, unlock_time)
    }

    fn transfer_list_of_locked_funds(
        &self,
        state: &mut TokenState,
        ctx: &CallContext,
        to: &AccountId,
        amounts: &[u128],
        unlock_times: &[DateTime<Utc>],
    ) -> Result<()> {
        timelock::transfer_locked_list(state, ctx, to, amounts, unlock_times)
    }
}
