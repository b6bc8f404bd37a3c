use crate::config::DirectoryConfig;
use crate::entry::{TenantEntry, TenantName};
use crate::error::TenancyError;
use crate::prefix::TenantPrefix;
use crate::versioned_map::{VersionedCounter, VersionedMap};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Versioned directory of tenants: a forward map from name to entry, a
/// reverse index from prefix to name for key routing, and the id
/// allocator, all committed together at monotonically increasing versions.
///
/// Mutations are serialized by a writer lock, so concurrent creators of
/// the same name resolve deterministically: one commits, the other
/// observes `TenantAlreadyExists`. Reads at historical versions never
/// block behind writers once they hold the snapshot.
pub struct TenantDirectory {
    state: RwLock<DirectoryState>,
}

struct DirectoryState {
    config: DirectoryConfig,
    tenants: VersionedMap<TenantName, TenantEntry>,
    prefix_index: VersionedMap<TenantPrefix, TenantName>,
    id_allocator: VersionedCounter,
    commit_version: u64,
}

impl TenantDirectory {
    pub fn new(config: DirectoryConfig) -> Result<Self, TenancyError> {
        config.validate()?;
        let id_allocator = VersionedCounter::new(config.first_tenant_id);
        Ok(Self {
            state: RwLock::new(DirectoryState {
                config,
                tenants: VersionedMap::new(),
                prefix_index: VersionedMap::new(),
                id_allocator,
                commit_version: 0,
            }),
        })
    }

    /// Registers a new tenant and returns its entry. The id is allocated
    /// inside the same critical section as the insert, so a creation that
    /// fails never consumes one.
    pub fn create_tenant(
        &self,
        name: &[u8],
        tenant_group: Option<&[u8]>,
    ) -> Result<TenantEntry, TenancyError> {
        let mut state = self.state.write();
        let head = state.commit_version;
        if state.tenants.get_at(&name.to_vec(), head)?.is_some() {
            return Err(TenancyError::TenantAlreadyExists {
                name: display_name(name),
            });
        }
        let version = head + 1;
        let id = state.id_allocator.allocate(version);
        let entry =
            TenantEntry::with_group(id, &state.config.subspace, tenant_group.map(<[u8]>::to_vec));
        state
            .tenants
            .insert_at(name.to_vec(), entry.clone(), version);
        state
            .prefix_index
            .insert_at(entry.prefix().clone(), name.to_vec(), version);
        state.commit_version = version;
        info!(tenant = %display_name(name), id, version, "created tenant");
        Ok(entry)
    }

    /// Rewrites the tenant's group at a new version. Id and prefix are
    /// immutable for the lifetime of a tenant. An update that leaves the
    /// configuration unchanged commits nothing.
    pub fn update_tenant_group(
        &self,
        name: &[u8],
        tenant_group: Option<&[u8]>,
    ) -> Result<TenantEntry, TenancyError> {
        let mut state = self.state.write();
        let head = state.commit_version;
        let Some(current) = state.tenants.get_at(&name.to_vec(), head)?.cloned() else {
            return Err(TenancyError::TenantNotFound {
                name: display_name(name),
            });
        };
        let mut updated = current.clone();
        updated.set_tenant_group(tenant_group.map(<[u8]>::to_vec));
        if updated.matches_configuration(&current) {
            return Ok(current);
        }
        let version = head + 1;
        state
            .tenants
            .insert_at(name.to_vec(), updated.clone(), version);
        state.commit_version = version;
        debug!(tenant = %display_name(name), version, "updated tenant group");
        Ok(updated)
    }

    /// Removes the tenant as of a new version. Snapshots below that
    /// version still observe it until the GC boundary passes them.
    pub fn delete_tenant(&self, name: &[u8]) -> Result<(), TenancyError> {
        let mut state = self.state.write();
        let head = state.commit_version;
        let Some(entry) = state.tenants.get_at(&name.to_vec(), head)?.cloned() else {
            return Err(TenancyError::TenantNotFound {
                name: display_name(name),
            });
        };
        let version = head + 1;
        state.tenants.erase_at(name.to_vec(), version);
        state.prefix_index.erase_at(entry.prefix().clone(), version);
        state.commit_version = version;
        info!(tenant = %display_name(name), id = entry.id(), version, "deleted tenant");
        Ok(())
    }

    pub fn lookup_by_name(
        &self,
        name: &[u8],
        at_version: u64,
    ) -> Result<Option<TenantEntry>, TenancyError> {
        let state = self.state.read();
        Ok(state.tenants.get_at(&name.to_vec(), at_version)?.cloned())
    }

    /// Maps an arbitrary key back to its owning tenant: the longest
    /// registered prefix that is a prefix of `key`, as of `at_version`.
    pub fn lookup_by_prefix(
        &self,
        key: &[u8],
        at_version: u64,
    ) -> Result<Option<TenantName>, TenancyError> {
        let state = self.state.read();
        let bound = TenantPrefix::from_bytes(key.to_vec());
        // Walk candidates at or below the key in descending order. Every
        // prefix of the key shares its first byte, so the scan can stop
        // once candidates leave that bucket.
        for (prefix, name) in state.prefix_index.range_at(..=bound, at_version)?.rev() {
            if key.starts_with(prefix.as_slice()) {
                return Ok(Some(name.clone()));
            }
            if prefix.as_slice().first() != key.first() {
                break;
            }
        }
        Ok(None)
    }

    /// All live tenants in lexicographic name order, as of `at_version`.
    pub fn list_tenants(
        &self,
        at_version: u64,
    ) -> Result<Vec<(TenantName, TenantEntry)>, TenancyError> {
        let state = self.state.read();
        let result = state
            .tenants
            .iter_at(at_version)?
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        Ok(result)
    }

    /// Version of the newest commit. Freshly constructed directories start
    /// at version 0 with no tenants.
    pub fn read_version(&self) -> u64 {
        self.state.read().commit_version
    }

    pub fn oldest_readable_version(&self) -> u64 {
        self.state.read().tenants.oldest_readable_version()
    }

    /// Advances the GC boundary. History strictly older than `version` may
    /// be discarded; reads below the boundary fail with `VersionTooOld`.
    pub fn advance_oldest_readable_version(&self, version: u64) -> Result<(), TenancyError> {
        let mut state = self.state.write();
        if version > state.commit_version {
            return Err(TenancyError::Validation(format!(
                "cannot advance oldest readable version to {version} past newest commit {}",
                state.commit_version
            )));
        }
        state.tenants.forget_versions_before(version);
        state.prefix_index.forget_versions_before(version);
        state.id_allocator.forget_versions_before(version);
        info!(version, "advanced oldest readable version");
        Ok(())
    }
}

fn display_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}
