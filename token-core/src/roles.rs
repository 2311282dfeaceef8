//! Role registries: Admins and Autoblockers
//!
//! Both registries share one lifecycle: the owner bootstraps the first
//! member, then existing members manage the set themselves. A single
//! capability check serves both registries; the batch helpers are reused
//! by the gate sets, which follow the same duplicate/absent rules.

use crate::error::{Error, Result};
use crate::state::TokenState;
use crate::types::{AccountId, CallContext, Role};
use std::collections::BTreeSet;
use tracing::debug;

/// Owner or existing member may mutate the registry
fn authorize(state: &TokenState, role: Role, caller: &AccountId) -> Result<()> {
    if state.owner() == Some(caller) || state.role_set(role).contains(caller) {
        Ok(())
    } else {
        Err(Error::NotAuthorized {
            caller: caller.clone(),
            role,
        })
    }
}

/// Membership test
pub(crate) fn is_member(state: &TokenState, role: Role, account: &AccountId) -> bool {
    state.role_set(role).contains(account)
}

/// Add one account; fails on duplicates
pub(crate) fn add(
    state: &mut TokenState,
    ctx: &CallContext,
    role: Role,
    account: &AccountId,
) -> Result<()> {
    authorize(state, role, &ctx.caller)?;
    insert_all(state.role_set_mut(role), std::slice::from_ref(account))?;
    debug!(role = role.as_str(), %account, "role member added");
    Ok(())
}

/// Remove one account; fails if absent
pub(crate) fn remove(
    state: &mut TokenState,
    ctx: &CallContext,
    role: Role,
    account: &AccountId,
) -> Result<()> {
    authorize(state, role, &ctx.caller)?;
    remove_all(state.role_set_mut(role), std::slice::from_ref(account))?;
    debug!(role = role.as_str(), %account, "role member removed");
    Ok(())
}

/// Add a batch; the whole batch fails if any element would fail
pub(crate) fn add_many(
    state: &mut TokenState,
    ctx: &CallContext,
    role: Role,
    accounts: &[AccountId],
) -> Result<()> {
    authorize(state, role, &ctx.caller)?;
    insert_all(state.role_set_mut(role), accounts)?;
    debug!(role = role.as_str(), count = accounts.len(), "role members added");
    Ok(())
}

/// Remove a batch; the whole batch fails if any element would fail
pub(crate) fn remove_many(
    state: &mut TokenState,
    ctx: &CallContext,
    role: Role,
    accounts: &[AccountId],
) -> Result<()> {
    authorize(state, role, &ctx.caller)?;
    remove_all(state.role_set_mut(role), accounts)?;
    debug!(role = role.as_str(), count = accounts.len(), "role members removed");
    Ok(())
}

/// Validate-all-then-apply-all insertion into a membership set
///
/// Rejects accounts already present and duplicates within the batch
/// itself, before touching the set.
pub(crate) fn insert_all(set: &mut BTreeSet<AccountId>, accounts: &[AccountId]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for account in accounts {
        if set.contains(account) || !seen.insert(account) {
            return Err(Error::AlreadyMember {
                account: account.clone(),
            });
        }
    }
    for account in accounts {
        set.insert(account.clone());
    }
    Ok(())
}

/// Validate-all-then-apply-all removal from a membership set
pub(crate) fn remove_all(set: &mut BTreeSet<AccountId>, accounts: &[AccountId]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for account in accounts {
        if !set.contains(account) || !seen.insert(account) {
            return Err(Error::NotMember {
                account: account.clone(),
            });
        }
    }
    for account in accounts {
        set.remove(account);
    }
    Ok(())
}
