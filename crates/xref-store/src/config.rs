use std::path::Path;

use serde::{Deserialize, Serialize};
use xref_types::{ByteOrder, MAX_TOKEN_SIZE};

use crate::container::ContainerParams;
use crate::error::{StoreError, StoreResult};

/// Configuration for the in-memory global heap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Capacity of one heap collection in bytes. Payloads larger than this
    /// get a dedicated collection of their own size.
    pub collection_size: usize,
    /// Address of the first collection. Must be non-zero.
    pub base_address: u64,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            collection_size: 4096,
            base_address: 0x800,
        }
    }
}

/// Configuration describing a container's addressing parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container name. External references carry it on the wire.
    pub name: String,
    /// Width of a file address in bytes (1..=8).
    pub address_size: usize,
    /// Width of an object token in bytes. Defaults to the address width.
    pub token_size: Option<usize>,
    /// Byte order of addresses and length fields.
    pub byte_order: ByteOrder,
    /// Global heap settings.
    pub heap: HeapConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "untitled".into(),
            address_size: 8,
            token_size: None,
            byte_order: ByteOrder::Little,
            heap: HeapConfig::default(),
        }
    }
}

impl ContainerConfig {
    /// Default configuration with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Effective object token width.
    pub fn effective_token_size(&self) -> usize {
        self.token_size.unwrap_or(self.address_size)
    }

    /// Addressing parameters derived from this configuration.
    pub fn params(&self) -> ContainerParams {
        ContainerParams {
            address_size: self.address_size,
            token_size: self.effective_token_size(),
            byte_order: self.byte_order,
        }
    }

    /// Largest address representable with `address_size` bytes.
    pub fn max_address(&self) -> u64 {
        if self.address_size >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.address_size * 8)) - 1
        }
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.name.is_empty() {
            return Err(StoreError::InvalidConfig("container name is empty".into()));
        }
        if !(1..=8).contains(&self.address_size) {
            return Err(StoreError::InvalidConfig(format!(
                "address_size must be 1..=8, got {}",
                self.address_size
            )));
        }
        let token_size = self.effective_token_size();
        if !(1..=MAX_TOKEN_SIZE).contains(&token_size) {
            return Err(StoreError::InvalidConfig(format!(
                "token_size must be 1..={MAX_TOKEN_SIZE}, got {token_size}"
            )));
        }
        if self.heap.collection_size == 0 {
            return Err(StoreError::InvalidConfig(
                "heap collection_size must be non-zero".into(),
            ));
        }
        if self.heap.base_address == 0 {
            return Err(StoreError::InvalidConfig(
                "heap base_address 0 is reserved for nil".into(),
            ));
        }
        if self.heap.base_address > self.max_address() {
            return Err(StoreError::InvalidConfig(format!(
                "heap base_address {:#x} does not fit in {} address bytes",
                self.heap.base_address, self.address_size
            )));
        }
        Ok(())
    }
}
