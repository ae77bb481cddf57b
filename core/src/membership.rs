//! Effective profile resolution.
//!
//! A user's effective profiles are their direct assignments plus the
//! profiles of every group they belong to. Recomputed on every call:
//! assignments can change between two resolutions.

use crate::{error::JournalResult, store::JournalStore, types::ProfileId};
use std::collections::BTreeSet;

/// Union of direct and group-inherited profile ids, deduplicated.
/// Fails with NotFound when the user does not exist.
pub fn effective_profile_ids(store: &JournalStore, user_id: &str) -> JournalResult<Vec<ProfileId>> {
    store.require_user(user_id)?;

    let mut ids: BTreeSet<ProfileId> = store.direct_profile_ids(user_id)?.into_iter().collect();
    ids.extend(store.group_profile_ids_for_user(user_id)?);

    log::debug!("User {user_id} has {} effective profiles", ids.len());
    Ok(ids.into_iter().collect())
}
