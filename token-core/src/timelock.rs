//! Locked-balance sub-ledger
//!
//! Each account carries an ordered sequence of `(amount, unlock_time)`
//! entries alongside its free balance. An entry counts as unlocked the
//! moment its unlock time passes ("matured"), even while it is still
//! physically present; consolidation folds matured entries into the free
//! balance and removes them. Ordinary transfers consolidate the sender
//! first, so matured funds are spendable without an explicit call, while
//! unmatured funds never are.

use crate::error::{Error, Result};
use crate::gates;
use crate::state::TokenState;
use crate::types::{AccountId, CallContext, LockedEntry};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Sum of entries whose unlock time is still in the future
pub(crate) fn locked_balance_of(
    state: &TokenState,
    account: &AccountId,
    now: DateTime<Utc>,
) -> u128 {
    state
        .locked_entries(account)
        .iter()
        .filter(|e| !e.matured(now))
        .map(|e| e.amount)
        .sum()
}

/// Free balance plus matured-but-unconsolidated entries
pub(crate) fn unlocked_balance_of(
    state: &TokenState,
    account: &AccountId,
    now: DateTime<Utc>,
) -> u128 {
    let matured: u128 = state
        .locked_entries(account)
        .iter()
        .filter(|e| e.matured(now))
        .map(|e| e.amount)
        .sum();
    state.free_balance(account) + matured
}

/// Number of physically present entries, matured or not
pub(crate) fn locked_balance_length(state: &TokenState, account: &AccountId) -> usize {
    state.locked_entries(account).len()
}

/// Owner-only mint of a locked entry; raises total supply under the cap
pub(crate) fn mint_locked(
    state: &mut TokenState,
    ctx: &CallContext,
    to: &AccountId,
    amount: u128,
    unlock_time: DateTime<Utc>,
) -> Result<()> {
    state.require_initialized()?;
    state.require_owner(ctx)?;
    if amount == 0 {
        return Err(Error::ZeroLockAmount);
    }

    let supply = state
        .total_supply()
        .checked_add(amount)
        .ok_or(Error::AmountOverflow)?;
    if supply > state.cap() {
        return Err(Error::CapExceeded { cap: state.cap() });
    }

    push_entry(state, to, amount, unlock_time);
    state.total_supply = supply;
    debug!(%to, amount, %unlock_time, "locked balance minted");
    Ok(())
}

/// Fold matured entries into the free balance; open to anyone and
/// idempotent. Returns the folded amount.
pub(crate) fn consolidate(state: &mut TokenState, account: &AccountId, now: DateTime<Utc>) -> u128 {
    let Some(entries) = state.locked_balances.get_mut(account) else {
        return 0;
    };

    let mut folded = 0u128;
    entries.retain(|entry| {
        if entry.matured(now) {
            folded += entry.amount;
            false
        } else {
            true
        }
    });
    if entries.is_empty() {
        state.locked_balances.remove(account);
    }

    if folded > 0 {
        // cannot overflow: folded amounts were already counted in supply
        let balance = state.free_balance(account) + folded;
        state.balances.insert(account.clone(), balance);
        debug!(%account, folded, "matured entries consolidated");
    }
    folded
}

/// Owner-only: fold every entry regardless of timestamp
pub(crate) fn unlock_all(
    state: &mut TokenState,
    ctx: &CallContext,
    account: &AccountId,
) -> Result<()> {
    state.require_initialized()?;
    state.require_owner(ctx)?;

    let forced: u128 = state
        .locked_entries(account)
        .iter()
        .map(|e| e.amount)
        .sum();
    state.locked_balances.remove(account);
    if forced > 0 {
        let balance = state.free_balance(account) + forced;
        state.balances.insert(account.clone(), balance);
    }
    debug!(%account, forced, "all locked funds force-unlocked");
    Ok(())
}

/// Move funds from the caller's free balance into one locked entry
/// under `to`, subject to ordinary transfer gating
pub(crate) fn transfer_locked(
    state: &mut TokenState,
    ctx: &CallContext,
    to: &AccountId,
    amount: u128,
    unlock_time: DateTime<Utc>,
) -> Result<()> {
    transfer_locked_list(
        state,
        ctx,
        to,
        std::slice::from_ref(&amount),
        std::slice::from_ref(&unlock_time),
    )
}

/// Batch variant of [`transfer_locked`]; fails entirely on length
/// mismatch or any invalid element
pub(crate) fn transfer_locked_list(
    state: &mut TokenState,
    ctx: &CallContext,
    to: &AccountId,
    amounts: &[u128],
    unlock_times: &[DateTime<Utc>],
) -> Result<()> {
    state.require_initialized()?;
    if amounts.len() != unlock_times.len() {
        return Err(Error::LengthMismatch {
            amounts: amounts.len(),
            unlock_times: unlock_times.len(),
        });
    }

    let mut total = 0u128;
    for &amount in amounts {
        if amount == 0 {
            return Err(Error::ZeroLockAmount);
        }
        total = total.checked_add(amount).ok_or(Error::AmountOverflow)?;
    }

    consolidate(state, &ctx.caller, ctx.now);
    gates::check_transfer(state, &ctx.caller, &ctx.caller, to)?;
    state.debit(&ctx.caller, total)?;
    for (&amount, &unlock_time) in amounts.iter().zip(unlock_times) {
        push_entry(state, to, amount, unlock_time);
    }
    gates::transfer_side_effects(state, &ctx.caller, &ctx.caller, to);
    debug!(from = %ctx.caller, %to, total, entries = amounts.len(), "funds transferred into lock");
    Ok(())
}

fn push_entry(state: &mut TokenState, to: &AccountId, amount: u128, unlock_time: DateTime<Utc>) {
    state
        .locked_balances
        .entry(to.clone())
        .or_default()
        .push(LockedEntry {
            amount,
            unlock_time,
        });
}
