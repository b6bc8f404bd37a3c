pub mod codec;

use crate::prefix::{TENANT_PREFIX_SIZE, TenantPrefix};

pub type TenantName = Vec<u8>;
pub type TenantGroupName = Vec<u8>;

/// Reserved identifier meaning "no tenant".
pub const INVALID_TENANT_ID: i64 = -1;

/// Durable record for one tenant.
///
/// The prefix is a pure function of the id and the subspace it was created
/// under, so it is never settable on its own: constructors and
/// [`set_subspace`](TenantEntry::set_subspace) are the only ways to change
/// it, and both recompute it from the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantEntry {
    id: i64,
    prefix: TenantPrefix,
    tenant_group: Option<TenantGroupName>,
}

impl Default for TenantEntry {
    fn default() -> Self {
        Self {
            id: INVALID_TENANT_ID,
            prefix: TenantPrefix::default(),
            tenant_group: None,
        }
    }
}

impl TenantEntry {
    pub fn new(id: i64, subspace: &[u8]) -> Self {
        Self::with_group(id, subspace, None)
    }

    pub fn with_group(id: i64, subspace: &[u8], tenant_group: Option<TenantGroupName>) -> Self {
        assert!(id >= 0, "live tenant entries require a non-negative id");
        Self {
            id,
            prefix: TenantPrefix::from_parts(subspace, id),
            tenant_group,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn prefix(&self) -> &TenantPrefix {
        &self.prefix
    }

    /// The caller-chosen portion of the prefix, without the id suffix.
    pub fn subspace(&self) -> &[u8] {
        self.prefix.subspace()
    }

    pub fn tenant_group(&self) -> Option<&TenantGroupName> {
        self.tenant_group.as_ref()
    }

    /// Recomputes the prefix under a new subspace. Only meaningful for live
    /// entries; the invalid entry keeps its empty prefix.
    pub fn set_subspace(&mut self, subspace: &[u8]) {
        assert!(self.id >= 0, "cannot set a subspace on the invalid tenant");
        self.prefix = TenantPrefix::from_parts(subspace, self.id);
    }

    pub fn set_tenant_group(&mut self, tenant_group: Option<TenantGroupName>) {
        self.tenant_group = tenant_group;
    }

    /// Two entries agree on everything a control-plane update can change:
    /// subspace and tenant group, ignoring the id.
    pub fn matches_configuration(&self, other: &TenantEntry) -> bool {
        self.subspace() == other.subspace() && self.tenant_group == other.tenant_group
    }

    pub(crate) fn prefix_invariant_holds(&self) -> bool {
        self.prefix.len() >= TENANT_PREFIX_SIZE
            || (self.prefix.is_empty() && self.id == INVALID_TENANT_ID)
    }
}
