//! Reference resolution with graceful fallback
//!
//! Legacy fixtures reference parents by integer foreign keys that are
//! inconsistently populated across entity kinds. Resolution tries, in order:
//! the identifier registry (verifying the row still exists), a static
//! legacy-key to natural-key alias table, and finally any row of the kind in
//! insertion order. A reference that survives none of these is unresolved;
//! the caller decides whether that skips the record (required edge) or just
//! omits the edge (optional).

use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

use crate::db;
use crate::registry::{EntityKind, IdRegistry};

/// Fallback chain declaration for one reference site.
///
/// Mapped lookup always runs first; `aliases` and `first_available` extend
/// the chain per call site. Declared as consts in the stage modules.
pub struct RefChain {
    pub kind: EntityKind,
    pub aliases: &'static [(i64, &'static str)],
    pub first_available: bool,
}

impl RefChain {
    /// Chain with only the mapped and first-available steps
    pub const fn first_available(kind: EntityKind) -> Self {
        RefChain {
            kind,
            aliases: &[],
            first_available: true,
        }
    }
}

/// Resolves legacy references against the registry and the store
pub struct Resolver<'a> {
    pool: &'a SqlitePool,
    registry: &'a IdRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(pool: &'a SqlitePool, registry: &'a IdRegistry) -> Self {
        Resolver { pool, registry }
    }

    /// Registry lookup, verified against the store.
    ///
    /// A registry hit whose row was deleted out of band is treated as a miss
    /// so the caller can fall back or skip instead of attaching a dangling
    /// reference.
    pub async fn mapped(&self, kind: EntityKind, legacy_key: i64) -> Result<Option<Uuid>> {
        let Some(id) = self.registry.get(kind, legacy_key) else {
            return Ok(None);
        };
        if db::guid_exists(self.pool, kind, id).await? {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    /// Full fallback chain: mapped, then alias table, then first available
    pub async fn resolve(&self, chain: &RefChain, legacy_key: i64) -> Result<Option<Uuid>> {
        if let Some(id) = self.mapped(chain.kind, legacy_key).await? {
            return Ok(Some(id));
        }

        if let Some((_, natural_key)) = chain.aliases.iter().find(|(key, _)| *key == legacy_key) {
            if let Some(id) = db::find_by_natural_key(self.pool, chain.kind, natural_key).await? {
                return Ok(Some(id));
            }
        }

        if chain.first_available {
            if let Some(id) = db::first_id(self.pool, chain.kind).await? {
                return Ok(Some(id));
            }
        }

        Ok(None)
    }
}
