use crate::error::TenancyError;
use smallvec::SmallVec;

/// Width of the fixed id suffix at the end of every tenant prefix.
pub const TENANT_PREFIX_SIZE: usize = 8;

/// Encodes a tenant id as the fixed-width tail of its keyspace prefix.
/// Big-endian two's complement; exactly 8 bytes for every id.
pub fn id_to_prefix(id: i64) -> [u8; TENANT_PREFIX_SIZE] {
    id.to_be_bytes()
}

/// Recovers the tenant id from the last 8 bytes of a prefix.
pub fn prefix_to_id(prefix: &[u8]) -> Result<i64, TenancyError> {
    if prefix.len() < TENANT_PREFIX_SIZE {
        return Err(TenancyError::Decode(format!(
            "prefix must carry at least {TENANT_PREFIX_SIZE} bytes, got {}",
            prefix.len()
        )));
    }
    let tail: [u8; TENANT_PREFIX_SIZE] = prefix[prefix.len() - TENANT_PREFIX_SIZE..]
        .try_into()
        .map_err(|_| TenancyError::Decode("prefix id suffix unreadable".into()))?;
    Ok(i64::from_be_bytes(tail))
}

/// Byte prefix owned by one tenant: an arbitrary subspace followed by the
/// 8-byte encoding of the tenant id. Empty for the invalid tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TenantPrefix {
    bytes: SmallVec<[u8; 64]>,
}

impl TenantPrefix {
    pub fn from_parts(subspace: &[u8], id: i64) -> Self {
        let mut bytes = SmallVec::<[u8; 64]>::new();
        bytes.extend_from_slice(subspace);
        bytes.extend_from_slice(&id_to_prefix(id));
        Self { bytes }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The freely-chosen portion preceding the id suffix.
    pub fn subspace(&self) -> &[u8] {
        &self.bytes[..self.bytes.len().saturating_sub(TENANT_PREFIX_SIZE)]
    }

    pub fn tenant_id(&self) -> Result<i64, TenancyError> {
        prefix_to_id(&self.bytes)
    }
}

/// Least key strictly greater than every key under `prefix`, or `None` when
/// the prefix is all 0xFF and no such key exists.
pub fn prefix_successor(prefix: &TenantPrefix) -> Option<TenantPrefix> {
    let mut next = prefix.bytes.clone();
    for i in (0..next.len()).rev() {
        if next[i] != 0xFF {
            next[i] += 1;
            next.truncate(i + 1);
            return Some(TenantPrefix { bytes: next });
        }
    }
    None
}
