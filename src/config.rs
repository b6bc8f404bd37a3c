use crate::error::TenancyError;

/// Runtime configuration for a tenant directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Byte prefix under which all tenant prefixes are allocated. Every
    /// tenant prefix is this subspace followed by the 8-byte tenant id.
    pub subspace: Vec<u8>,
    /// First identifier handed out by the allocator.
    pub first_tenant_id: i64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            subspace: Vec::new(),
            first_tenant_id: 0,
        }
    }
}

impl DirectoryConfig {
    pub fn with_subspace(subspace: impl Into<Vec<u8>>) -> Self {
        Self {
            subspace: subspace.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TenancyError> {
        if self.first_tenant_id < 0 {
            return Err(TenancyError::InvalidConfig(format!(
                "first_tenant_id must be non-negative, got {}",
                self.first_tenant_id
            )));
        }
        Ok(())
    }
}
