//! Ledger core: initialization, ownership, minting, transfers, allowances
//!
//! Operations here mutate `TokenState` directly and assume the caller
//! provides the transaction boundary (the proxy commits a working copy on
//! success and discards it on failure). Every check runs before the first
//! mutation of the path it guards, and all arithmetic is checked.

use crate::error::{Error, Result};
use crate::gates;
use crate::state::TokenState;
use crate::timelock;
use crate::types::{AccountId, CallContext, LogicId};
use tracing::{debug, info};

/// One-time initialization, valid only in a proxy execution context
///
/// A logic unit called directly runs against its own detached storage,
/// whose delegation slot is empty; that is what this check rejects.
pub(crate) fn initialize(
    state: &mut TokenState,
    ctx: &CallContext,
    logic: LogicId,
    cap: u128,
) -> Result<()> {
    if state.delegation.is_none() {
        return Err(Error::DelegationUnbound);
    }
    if state.initialized {
        return Err(Error::AlreadyInitialized);
    }

    state.this_addr = Some(logic);
    state.owner = Some(ctx.caller.clone());
    state.cap = cap;
    state.total_supply = 0;
    state.initialized = true;
    info!(owner = %ctx.caller, cap, %logic, "ledger initialized");
    Ok(())
}

/// Owner-only ownership handover; the empty identifier is rejected so
/// the ledger can never become ownerless
pub(crate) fn transfer_ownership(
    state: &mut TokenState,
    ctx: &CallContext,
    new_owner: &AccountId,
) -> Result<()> {
    state.require_owner(ctx)?;
    if new_owner.is_empty() {
        return Err(Error::EmptyAccount);
    }

    state.owner = Some(new_owner.clone());
    info!(from = %ctx.caller, to = %new_owner, "ownership transferred");
    Ok(())
}

/// Owner-only mint into the free balance, bounded by the cap
pub(crate) fn mint(
    state: &mut TokenState,
    ctx: &CallContext,
    to: &AccountId,
    amount: u128,
) -> Result<()> {
    state.require_initialized()?;
    state.require_owner(ctx)?;

    let supply = state
        .total_supply
        .checked_add(amount)
        .ok_or(Error::AmountOverflow)?;
    if supply > state.cap {
        return Err(Error::CapExceeded { cap: state.cap });
    }

    state.credit(to, amount)?;
    state.total_supply = supply;
    debug!(%to, amount, supply, "minted");
    Ok(())
}

/// Overwrite-style allowance grant, whitelist-gated like a transfer
pub(crate) fn approve(
    state: &mut TokenState,
    ctx: &CallContext,
    spender: &AccountId,
    amount: u128,
) -> Result<()> {
    state.require_initialized()?;
    gates::check_approval(state, &ctx.caller, spender)?;

    state
        .allowances
        .entry(ctx.caller.clone())
        .or_default()
        .insert(spender.clone(), amount);
    gates::approval_side_effects(state, &ctx.caller, spender);
    debug!(owner = %ctx.caller, %spender, amount, "allowance set");
    Ok(())
}

/// Transfer out of the caller's unlocked balance
pub(crate) fn transfer(
    state: &mut TokenState,
    ctx: &CallContext,
    to: &AccountId,
    amount: u128,
) -> Result<()> {
    state.require_initialized()?;
    timelock::consolidate(state, &ctx.caller, ctx.now);
    gates::check_transfer(state, &ctx.caller, &ctx.caller, to)?;

    move_balance(state, &ctx.caller, to, amount)?;
    gates::transfer_side_effects(state, &ctx.caller, &ctx.caller, to);
    debug!(from = %ctx.caller, %to, amount, "transferred");
    Ok(())
}

/// Spend-on-behalf transfer; decrements the caller's allowance from `from`
pub(crate) fn transfer_from(
    state: &mut TokenState,
    ctx: &CallContext,
    from: &AccountId,
    to: &AccountId,
    amount: u128,
) -> Result<()> {
    state.require_initialized()?;
    timelock::consolidate(state, from, ctx.now);
    gates::check_transfer(state, &ctx.caller, from, to)?;

    let remaining = state
        .allowance(from, &ctx.caller)
        .checked_sub(amount)
        .ok_or_else(|| Error::InsufficientAllowance {
            owner: from.clone(),
            spender: ctx.caller.clone(),
        })?;

    move_balance(state, from, to, amount)?;
    state
        .allowances
        .entry(from.clone())
        .or_default()
        .insert(ctx.caller.clone(), remaining);
    gates::transfer_side_effects(state, &ctx.caller, from, to);
    debug!(%from, %to, spender = %ctx.caller, amount, "transferred on behalf");
    Ok(())
}

/// Debit `src`, credit `dst`; the sender has already been consolidated,
/// so the free balance is exactly the unlocked portion
fn move_balance(
    state: &mut TokenState,
    src: &AccountId,
    dst: &AccountId,
    amount: u128,
) -> Result<()> {
    state.debit(src, amount)?;
    state.credit(dst, amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn bound_state() -> TokenState {
        let mut state = TokenState::detached();
        state.delegation = Some(LogicId::new());
        state
    }

    fn initialized(owner: &str, cap: u128) -> (TokenState, CallContext) {
        let mut state = bound_state();
        let ctx = CallContext::new(acct(owner));
        let logic = state.delegation.unwrap();
        initialize(&mut state, &ctx, logic, cap).unwrap();
        (state, ctx)
    }

    #[test]
    fn test_initialize_requires_proxy_context() {
        let mut detached = TokenState::detached();
        let ctx = CallContext::new(acct("alice"));
        assert!(matches!(
            initialize(&mut detached, &ctx, LogicId::new(), 100),
            Err(Error::DelegationUnbound)
        ));
    }

    #[test]
    fn test_initialize_runs_once() {
        let (mut state, ctx) = initialized("alice", 100);
        assert_eq!(state.owner(), Some(&acct("alice")));
        assert_eq!(state.cap(), 100);
        assert_eq!(state.total_supply(), 0);

        let logic = state.delegation.unwrap();
        assert!(matches!(
            initialize(&mut state, &ctx, logic, 200),
            Err(Error::AlreadyInitialized)
        ));
        assert_eq!(state.cap(), 100);
    }

    #[test]
    fn test_mint_respects_cap_and_owner() {
        let (mut state, owner) = initialized("alice", 100);
        let bob = acct("bob");

        mint(&mut state, &owner, &bob, 100).unwrap();
        assert_eq!(state.balance_of(&bob), 100);
        assert_eq!(state.total_supply(), 100);

        assert!(matches!(
            mint(&mut state, &owner, &bob, 1),
            Err(Error::CapExceeded { .. })
        ));
        assert_eq!(state.total_supply(), 100);

        let stranger = CallContext::new(bob.clone());
        assert!(matches!(
            mint(&mut state, &stranger, &bob, 1),
            Err(Error::NotOwner { .. })
        ));
    }

    #[test]
    fn test_ownerless_state_prevented() {
        let (mut state, owner) = initialized("alice", 100);
        assert!(matches!(
            transfer_ownership(&mut state, &owner, &acct("")),
            Err(Error::EmptyAccount)
        ));
        assert_eq!(state.owner(), Some(&acct("alice")));

        transfer_ownership(&mut state, &owner, &acct("bob")).unwrap();
        assert_eq!(state.owner(), Some(&acct("bob")));

        // the former owner lost the privilege
        assert!(matches!(
            transfer_ownership(&mut state, &owner, &acct("carol")),
            Err(Error::NotOwner { .. })
        ));
    }

    #[test]
    fn test_transfer_draws_unlocked_only() {
        let (mut state, owner) = initialized("alice", 1000);
        let now = owner.now;
        mint(&mut state, &owner, &acct("alice"), 50).unwrap();
        timelock::mint_locked(
            &mut state,
            &owner,
            &acct("alice"),
            100,
            now + Duration::hours(1),
        )
        .unwrap();

        // nominal balance 150, but only 50 is spendable
        assert!(matches!(
            transfer(&mut state, &owner, &acct("bob"), 100),
            Err(Error::InsufficientBalance { .. })
        ));

        // past maturity the same transfer succeeds without an explicit
        // consolidation call
        let later = CallContext::at(acct("alice"), now + Duration::hours(2));
        transfer(&mut state, &later, &acct("bob"), 100).unwrap();
        assert_eq!(state.balance_of(&acct("bob")), 100);
        assert_eq!(state.balance_of(&acct("alice")), 50);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (mut state, owner) = initialized("alice", 1000);
        mint(&mut state, &owner, &acct("alice"), 100).unwrap();
        approve(&mut state, &owner, &acct("bob"), 60).unwrap();

        let bob = CallContext::at(acct("bob"), owner.now);
        // bob was auto-enrolled by the owner's approve, but alice and
        // carol are not whitelisted yet
        assert!(matches!(
            transfer_from(&mut state, &bob, &acct("alice"), &acct("carol"), 40),
            Err(Error::GateDenied { .. })
        ));

        state.whitelist_unlocked = true;
        transfer_from(&mut state, &bob, &acct("alice"), &acct("carol"), 40).unwrap();
        assert_eq!(state.allowance(&acct("alice"), &acct("bob")), 20);
        assert_eq!(state.balance_of(&acct("carol")), 40);

        assert!(matches!(
            transfer_from(&mut state, &bob, &acct("alice"), &acct("carol"), 30),
            Err(Error::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_approve_overwrites() {
        let (mut state, owner) = initialized("alice", 1000);
        approve(&mut state, &owner, &acct("bob"), 60).unwrap();
        approve(&mut state, &owner, &acct("bob"), 10).unwrap();
        assert_eq!(state.allowance(&acct("alice"), &acct("bob")), 10);
    }

    #[test]
    fn test_zero_amount_transfer_is_allowed() {
        let (mut state, owner) = initialized("alice", 1000);
        transfer(&mut state, &owner, &acct("bob"), 0).unwrap();
        assert_eq!(state.total_supply(), 0);
    }
}
