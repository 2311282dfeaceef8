//! Transfer gates: whitelist and blacklist
//!
//! Each gate is a membership set plus an "unlocked" override flag. Both
//! gates start locked, so the whitelist denies by default and the
//! blacklist enforces its entries from the first transfer on. Gate
//! membership follows the same duplicate/absent rules as the role
//! registries; authorization extends to the gate's governing role.
//!
//! Transfer gating runs in two explicit steps around the balance
//! mutation: `check_transfer` before it, `transfer_side_effects` after
//! (auto-enrollment and auto-blocking). Both steps share the caller's
//! transaction, so a failure anywhere rolls everything back.

use crate::error::{Error, Result};
use crate::roles;
use crate::state::TokenState;
use crate::types::{AccountId, CallContext, Gate, Role};
use tracing::debug;

/// Owner or member of the governing role may mutate the gate
fn authorize(state: &TokenState, gate: Gate, caller: &AccountId) -> Result<()> {
    let role = gate.governing_role();
    if state.owner() == Some(caller) || state.role_set(role).contains(caller) {
        Ok(())
    } else {
        Err(Error::NotAuthorized {
            caller: caller.clone(),
            role,
        })
    }
}

/// Owner or Admin bypasses whitelist checks and triggers auto-enrollment
fn privileged(state: &TokenState, caller: &AccountId) -> bool {
    state.owner() == Some(caller) || state.role_set(Role::Admins).contains(caller)
}

/// Membership test
pub(crate) fn is_member(state: &TokenState, gate: Gate, account: &AccountId) -> bool {
    state.gate_set(gate).contains(account)
}

/// Whether the gate's check is currently bypassed
pub(crate) fn unlocked(state: &TokenState, gate: Gate) -> bool {
    state.gate_unlocked(gate)
}

/// Add one account to a gate set
pub(crate) fn add(
    state: &mut TokenState,
    ctx: &CallContext,
    gate: Gate,
    account: &AccountId,
) -> Result<()> {
    authorize(state, gate, &ctx.caller)?;
    roles::insert_all(state.gate_set_mut(gate), std::slice::from_ref(account))?;
    debug!(gate = gate.as_str(), %account, "gate member added");
    Ok(())
}

/// Remove one account from a gate set
pub(crate) fn remove(
    state: &mut TokenState,
    ctx: &CallContext,
    gate: Gate,
    account: &AccountId,
) -> Result<()> {
    authorize(state, gate, &ctx.caller)?;
    roles::remove_all(state.gate_set_mut(gate), std::slice::from_ref(account))?;
    debug!(gate = gate.as_str(), %account, "gate member removed");
    Ok(())
}

/// Add a batch to a gate set, all-or-nothing
pub(crate) fn add_many(
    state: &mut TokenState,
    ctx: &CallContext,
    gate: Gate,
    accounts: &[AccountId],
) -> Result<()> {
    authorize(state, gate, &ctx.caller)?;
    roles::insert_all(state.gate_set_mut(gate), accounts)?;
    debug!(gate = gate.as_str(), count = accounts.len(), "gate members added");
    Ok(())
}

/// Remove a batch from a gate set, all-or-nothing
pub(crate) fn remove_many(
    state: &mut TokenState,
    ctx: &CallContext,
    gate: Gate,
    accounts: &[AccountId],
) -> Result<()> {
    authorize(state, gate, &ctx.caller)?;
    roles::remove_all(state.gate_set_mut(gate), accounts)?;
    debug!(gate = gate.as_str(), count = accounts.len(), "gate members removed");
    Ok(())
}

/// Flip a gate's bypass flag
pub(crate) fn set_unlock(
    state: &mut TokenState,
    ctx: &CallContext,
    gate: Gate,
    unlocked: bool,
) -> Result<()> {
    authorize(state, gate, &ctx.caller)?;
    state.set_gate_unlocked(gate, unlocked);
    debug!(gate = gate.as_str(), unlocked, "gate unlock flag set");
    Ok(())
}

/// Gate check for a transfer of funds out of `src` to `dst`, initiated
/// by `caller` (`caller == src` for plain transfers)
///
/// Runs before any balance mutation:
/// - a blacklisted sender is denied while the blacklist is locked,
///   regardless of who initiated the call;
/// - the whitelist passes when unlocked or when the caller is privileged
///   (the privileged path enrolls `dst` afterwards, see
///   [`transfer_side_effects`]); otherwise caller, source, and recipient
///   must all already be members.
pub(crate) fn check_transfer(
    state: &TokenState,
    caller: &AccountId,
    src: &AccountId,
    dst: &AccountId,
) -> Result<()> {
    if !state.gate_unlocked(Gate::Blacklist) && state.gate_set(Gate::Blacklist).contains(src) {
        return Err(Error::GateDenied {
            gate: Gate::Blacklist,
            account: src.clone(),
        });
    }

    if state.gate_unlocked(Gate::Whitelist) || privileged(state, caller) {
        return Ok(());
    }

    for account in [caller, src, dst] {
        if !state.gate_set(Gate::Whitelist).contains(account) {
            return Err(Error::GateDenied {
                gate: Gate::Whitelist,
                account: account.clone(),
            });
        }
    }
    Ok(())
}

/// Gate check for an allowance grant from `caller` to `spender`
///
/// No funds move, so the blacklist does not apply; the whitelist rules
/// mirror [`check_transfer`] with the spender as counterparty.
pub(crate) fn check_approval(
    state: &TokenState,
    caller: &AccountId,
    spender: &AccountId,
) -> Result<()> {
    if state.gate_unlocked(Gate::Whitelist) || privileged(state, caller) {
        return Ok(());
    }

    for account in [caller, spender] {
        if !state.gate_set(Gate::Whitelist).contains(account) {
            return Err(Error::GateDenied {
                gate: Gate::Whitelist,
                account: account.clone(),
            });
        }
    }
    Ok(())
}

/// Post-mutation side effects of a successful transfer
///
/// - A privileged caller enrolls the recipient into the whitelist, so
///   receiving funds from the owner or an Admin grants membership.
/// - An Autoblocker sender blacklists the recipient. Enrollment only:
///   nothing is ever removed here, and an already-blacklisted recipient
///   stays as is.
pub(crate) fn transfer_side_effects(
    state: &mut TokenState,
    caller: &AccountId,
    src: &AccountId,
    dst: &AccountId,
) {
    if privileged(state, caller) && !state.gate_set(Gate::Whitelist).contains(dst) {
        state.gate_set_mut(Gate::Whitelist).insert(dst.clone());
        debug!(%dst, "recipient auto-enrolled into whitelist");
    }

    if state.role_set(Role::Autoblockers).contains(src)
        && !state.gate_set(Gate::Blacklist).contains(dst)
    {
        state.gate_set_mut(Gate::Blacklist).insert(dst.clone());
        debug!(%src, %dst, "recipient auto-blocked");
    }
}

/// Post-mutation side effect of a successful approval: a privileged
/// caller enrolls the spender into the whitelist
pub(crate) fn approval_side_effects(
    state: &mut TokenState,
    caller: &AccountId,
    spender: &AccountId,
) {
    if privileged(state, caller) && !state.gate_set(Gate::Whitelist).contains(spender) {
        state.gate_set_mut(Gate::Whitelist).insert(spender.clone());
        debug!(%spender, "spender auto-enrolled into whitelist");
    }
}
