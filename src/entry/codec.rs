use crate::entry::TenantEntry;
use crate::error::TenancyError;
use crate::prefix::TenantPrefix;

/// Marker embedded at the front of every durable tenant record. Decoders
/// dispatch on it to pick the field layout written by the producing version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion(u64);

impl ProtocolVersion {
    /// First marker with this record layout: id plus subspace.
    pub const BASE: Self = Self(0x0100);
    /// Adds the optional tenant group field.
    pub const TENANT_GROUPS: Self = Self(0x0200);

    pub const MIN_SUPPORTED: Self = Self::BASE;
    pub const CURRENT: Self = Self::TENANT_GROUPS;

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub fn has_tenant_groups(self) -> bool {
        self >= Self::TENANT_GROUPS
    }
}

/// Serializes an entry under the given protocol version. The id is written
/// once: only the subspace portion of the prefix goes on the wire, and
/// decode reattaches the 8-byte id suffix.
///
/// All integers are big-endian. Layout:
/// `version u64 | id i64 | subspace_len u32 | subspace`
/// and, from [`ProtocolVersion::TENANT_GROUPS`] on,
/// `group_flag u8 [| group_len u32 | group]`.
pub fn encode(entry: &TenantEntry, version: ProtocolVersion) -> Result<Vec<u8>, TenancyError> {
    assert!(
        entry.prefix_invariant_holds(),
        "tenant entry prefix is corrupt: id {} with prefix of {} bytes",
        entry.id(),
        entry.prefix().len()
    );
    if version < ProtocolVersion::MIN_SUPPORTED {
        return Err(TenancyError::Encode(format!(
            "cannot encode under unsupported protocol version 0x{:x}",
            version.raw()
        )));
    }

    let subspace = entry.subspace();
    let subspace_len = u32::try_from(subspace.len())
        .map_err(|_| TenancyError::Encode("subspace exceeds u32 length".into()))?;

    let mut out = Vec::with_capacity(8 + 8 + 4 + subspace.len() + 1);
    out.extend_from_slice(&version.raw().to_be_bytes());
    out.extend_from_slice(&entry.id().to_be_bytes());
    out.extend_from_slice(&subspace_len.to_be_bytes());
    out.extend_from_slice(subspace);

    if version.has_tenant_groups() {
        match entry.tenant_group() {
            Some(group) => {
                let group_len = u32::try_from(group.len())
                    .map_err(|_| TenancyError::Encode("tenant group exceeds u32 length".into()))?;
                out.push(1);
                out.extend_from_slice(&group_len.to_be_bytes());
                out.extend_from_slice(group);
            }
            None => out.push(0),
        }
    }
    Ok(out)
}

/// Deserializes a record written by any supported protocol version. Fields
/// a newer writer appended after the known layout are ignored; fields an
/// older writer never produced default to absent.
pub fn decode(bytes: &[u8]) -> Result<TenantEntry, TenancyError> {
    let mut cursor = Cursor::new(bytes);
    let version = ProtocolVersion::from_raw(cursor.take_u64()?);
    if version < ProtocolVersion::MIN_SUPPORTED {
        return Err(TenancyError::Format(format!(
            "unrecognized protocol version 0x{:x}",
            version.raw()
        )));
    }

    let id = cursor.take_i64()?;
    let subspace_len = cursor.take_u32()? as usize;
    let subspace = cursor.take(subspace_len)?;

    let tenant_group = if version.has_tenant_groups() {
        match cursor.take_u8()? {
            0 => None,
            1 => {
                let group_len = cursor.take_u32()? as usize;
                Some(cursor.take(group_len)?.to_vec())
            }
            flag => {
                return Err(TenancyError::Format(format!(
                    "invalid tenant group flag {flag}"
                )));
            }
        }
    } else {
        None
    };

    let prefix = if id >= 0 {
        TenantPrefix::from_parts(subspace, id)
    } else {
        TenantPrefix::default()
    };
    Ok(TenantEntry {
        id,
        prefix,
        tenant_group,
    })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, at: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], TenancyError> {
        let end = self
            .at
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| TenancyError::Format("truncated tenant record".into()))?;
        let slice = &self.bytes[self.at..end];
        self.at = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, TenancyError> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32, TenancyError> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes(raw.try_into().map_err(|_| {
            TenancyError::Format("truncated tenant record".into())
        })?))
    }

    fn take_u64(&mut self) -> Result<u64, TenancyError> {
        let raw = self.take(8)?;
        Ok(u64::from_be_bytes(raw.try_into().map_err(|_| {
            TenancyError::Format("truncated tenant record".into())
        })?))
    }

    fn take_i64(&mut self) -> Result<i64, TenancyError> {
        let raw = self.take(8)?;
        Ok(i64::from_be_bytes(raw.try_into().map_err(|_| {
            TenancyError::Format("truncated tenant record".into())
        })?))
    }
}
