// Copies deployment output into the front-end project's constant files
use log::info;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

use crate::config::FrontEndSettings;
use crate::error::Result;
use crate::idl::Idl;

/// `contractAddresses.json`: chain id to every address deployed on it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressRegistry(BTreeMap<String, Vec<String>>);

impl AddressRegistry {
    /// Reads the registry, treating a missing file as empty
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    /// Records `address` under `chain_id`; returns false when already present
    pub fn insert(&mut self, chain_id: &str, address: &str) -> bool {
        let addresses = self.0.entry(chain_id.to_string()).or_default();
        if addresses.iter().any(|known| known == address) {
            return false;
        }
        addresses.push(address.to_string());
        true
    }

    pub fn addresses(&self, chain_id: &str) -> &[String] {
        self.0.get(chain_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Merge `address` into the registry file for `chain_id`
pub fn update_contract_addresses(path: &Path, chain_id: &str, address: &str) -> Result<()> {
    let mut registry = AddressRegistry::load(path)?;
    if registry.insert(chain_id, address) {
        info!("Added {} for chain {}", address, chain_id);
    }
    registry.write(path)
}

/// Overwrite the interface file with `idl`
pub fn update_abi(path: &Path, idl: &Idl) -> Result<()> {
    write_json(path, idl)
}

/// Runs both updates when the front-end flag is set; returns whether it ran
pub fn sync_front_end(
    settings: &FrontEndSettings,
    chain_id: &str,
    address: &str,
    idl: &Idl,
) -> Result<bool> {
    if !settings.enabled {
        return Ok(false);
    }
    info!("Updating front end...");
    update_contract_addresses(&settings.addresses_file, chain_id, address)?;
    update_abi(&settings.abi_file, idl)?;
    info!("Front end written!");
    Ok(true)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
