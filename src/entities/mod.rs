//! Cross-lingual entity identities and redirect resolution.

pub mod identity;
pub mod redirects;

use std::path::Path;
use log::info;
use crate::error::Result;
use crate::utils::interner::StringInterner;

pub use identity::{EntityIdentityMap, KEY_SEPARATOR};
pub use redirects::{ClosureStats, RedirectResolver};

/// Loads identities and redirects, then folds the redirect closure into the
/// identity map. The interner and redirect table are dropped on return.
pub fn load_resolved_identities<P: AsRef<Path>, Q: AsRef<Path>>(
    identity_path: P,
    redirect_path: Q,
    interner_capacity: usize,
) -> Result<EntityIdentityMap> {
    let mut interner = StringInterner::with_capacity(interner_capacity);
    let mut identities = EntityIdentityMap::load(identity_path, &mut interner)?;
    let redirects = RedirectResolver::load(redirect_path, &mut interner)?;
    info!("Interned {} distinct strings", interner.len());

    let stats = redirects.compute_closure(&mut identities);
    info!(
        "Computed redirect closure: {} of {} redirects resolved, {} cycles, {} mappings total",
        stats.resolved, stats.redirects, stats.cycles, identities.len()
    );
    Ok(identities)
}
