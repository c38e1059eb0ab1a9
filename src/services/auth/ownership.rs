//! Resource ownership lookups.
//!
//! One lookup per resource kind, each answering "which owner holds resource `id`?".
//! `OwnershipService` turns that into a yes/no decision and never lets a failure
//! escape: not found, a foreign owner, a domain violation and a storage error all
//! collapse into "not owned".

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::repos::error::RepoError;

/// The closed set of resource kinds that can be ownership-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Aquarium,
    Inhabitant,
    Accessory,
    Ornament,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aquarium => "AQUARIUM",
            Self::Inhabitant => "INHABITANT",
            Self::Accessory => "ACCESSORY",
            Self::Ornament => "ORNAMENT",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{kind} {id} does not belong to the current owner")]
pub struct OwnershipViolation {
    pub kind: ResourceKind,
    pub id: i64,
}

/// Minimal view of a persisted resource: its id and recorded owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedResource {
    pub kind: ResourceKind,
    pub id: i64,
    // NULL owner: the row belongs to nobody
    pub owner_id: Option<i64>,
}

impl OwnedResource {
    pub fn ensure_owned_by(&self, owner_id: i64) -> Result<(), OwnershipViolation> {
        match self.owner_id {
            Some(recorded) if recorded == owner_id => Ok(()),
            _ => Err(OwnershipViolation {
                kind: self.kind,
                id: self.id,
            }),
        }
    }
}

/// Lookup interface for one resource kind.
///
/// Implementations return `Ok(None)` when the resource does not exist.
#[async_trait]
pub trait ResourceOwnerLookup: Send + Sync {
    async fn find_owned(&self, id: i64) -> Result<Option<OwnedResource>, RepoError>;
}

/// The four lookups, one per [`ResourceKind`].
#[derive(Clone)]
pub struct OwnershipLookups {
    pub aquariums: Arc<dyn ResourceOwnerLookup>,
    pub inhabitants: Arc<dyn ResourceOwnerLookup>,
    pub accessories: Arc<dyn ResourceOwnerLookup>,
    pub ornaments: Arc<dyn ResourceOwnerLookup>,
}

#[derive(Clone)]
pub struct OwnershipService {
    lookups: OwnershipLookups,
}

impl fmt::Debug for OwnershipService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipService").finish_non_exhaustive()
    }
}

impl OwnershipService {
    pub fn new(lookups: OwnershipLookups) -> Self {
        Self { lookups }
    }

    fn lookup(&self, kind: ResourceKind) -> &dyn ResourceOwnerLookup {
        match kind {
            ResourceKind::Aquarium => self.lookups.aquariums.as_ref(),
            ResourceKind::Inhabitant => self.lookups.inhabitants.as_ref(),
            ResourceKind::Accessory => self.lookups.accessories.as_ref(),
            ResourceKind::Ornament => self.lookups.ornaments.as_ref(),
        }
    }

    /// Returns `true` only when the resource exists and its recorded owner is `owner_id`.
    pub async fn is_owned_by(&self, kind: ResourceKind, id: i64, owner_id: i64) -> bool {
        let found = match self.lookup(kind).find_owned(id).await {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    resource_kind = %kind,
                    resource_id = id,
                    error = %err,
                    "ownership lookup failed"
                );
                return false;
            }
        };

        let Some(resource) = found else {
            debug!(resource_kind = %kind, resource_id = id, "resource not found");
            return false;
        };

        match resource.ensure_owned_by(owner_id) {
            Ok(()) => true,
            Err(violation) => {
                debug!(owner_id, error = %violation, "ownership check failed");
                false
            }
        }
    }
}
