// Settings read from the environment (and `.env`, loaded by the binary)
use solana_program::{hash::hash, pubkey::Pubkey};
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use crate::error::{DeployError, Result};

/// Environment flag gating the front-end sync
pub const UPDATE_FRONT_END: &str = "UPDATE_FRONT_END";

const DEFAULT_ADDRESSES_FILE: &str = "../raffle-front-end/constants/contractAddresses.json";
const DEFAULT_ABI_FILE: &str = "../raffle-front-end/constants/abi.json";
const DEFAULT_EVENT_TIMEOUT_SECS: u64 = 300;

/// Cluster the scaffolding talks to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Localnet,
    Devnet,
    Testnet,
    MainnetBeta,
}

impl Network {
    /// Development networks get mock coordinators and run the unit harness
    pub fn is_development(&self) -> bool {
        matches!(self, Network::Localnet)
    }

    pub fn moniker(&self) -> &'static str {
        match self {
            Network::Localnet => "localnet",
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::MainnetBeta => "mainnet-beta",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Localnet => "http://127.0.0.1:8899",
            Network::Devnet => "https://api.devnet.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }

    pub fn default_ws_url(&self) -> &'static str {
        match self {
            Network::Localnet => "ws://127.0.0.1:8900",
            Network::Devnet => "wss://api.devnet.solana.com",
            Network::Testnet => "wss://api.testnet.solana.com",
            Network::MainnetBeta => "wss://api.mainnet-beta.solana.com",
        }
    }
}

impl FromStr for Network {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "localnet" | "localhost" | "local" => Ok(Network::Localnet),
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Network::MainnetBeta),
            other => Err(DeployError::Config(format!("unknown network `{}`", other))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.moniker())
    }
}

/// Arguments the raffle is initialized with on a network
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaffleParams {
    /// Lamports required to enter
    pub entrance_fee: u64,
    /// Oracle lane key hash
    pub gas_lane: [u8; 32],
    pub callback_gas_limit: u32,
    /// Seconds between draws
    pub interval: u64,
}

impl RaffleParams {
    pub fn for_network(network: Network) -> Self {
        let (entrance_fee, interval) = match network {
            Network::Localnet => (10_000_000, 30),
            Network::Devnet | Network::Testnet => (10_000_000, 30),
            Network::MainnetBeta => (100_000_000, 86_400),
        };
        Self {
            entrance_fee,
            gas_lane: hash(format!("{}-gas-lane", network.moniker()).as_bytes()).to_bytes(),
            callback_gas_limit: 500_000,
            interval,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorerSettings {
    pub api_url: String,
    pub api_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontEndSettings {
    pub enabled: bool,
    pub addresses_file: PathBuf,
    pub abi_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub network: Network,
    pub rpc_url: String,
    pub ws_url: String,
    pub keypair_path: PathBuf,
    pub raffle_program_id: Pubkey,
    pub coordinator_program_id: Pubkey,
    /// Coordinator subscription on live networks; development deploys create one
    pub subscription_id: Option<u64>,
    pub raffle: RaffleParams,
    /// Present only when an explorer API key is configured
    pub explorer: Option<ExplorerSettings>,
    pub front_end: FrontEndSettings,
    pub event_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let network = match var("NETWORK") {
            Some(name) => name.parse()?,
            None => Network::Localnet,
        };

        let keypair_path = match var("KEYPAIR_PATH") {
            Some(path) => PathBuf::from(path),
            None => {
                let home = var("HOME").ok_or_else(|| {
                    DeployError::Config("KEYPAIR_PATH is unset and HOME is unknown".to_string())
                })?;
                PathBuf::from(home).join(".config/solana/id.json")
            }
        };

        let mut raffle = RaffleParams::for_network(network);
        if let Some(fee) = var("RAFFLE_ENTRANCE_FEE") {
            raffle.entrance_fee = parse_number("RAFFLE_ENTRANCE_FEE", &fee)?;
        }
        if let Some(interval) = var("RAFFLE_INTERVAL") {
            raffle.interval = parse_number("RAFFLE_INTERVAL", &interval)?;
        }

        let subscription_id = var("RAFFLE_SUBSCRIPTION_ID")
            .map(|id| parse_number("RAFFLE_SUBSCRIPTION_ID", &id))
            .transpose()?;

        let explorer = match (var("EXPLORER_API_URL"), var("EXPLORER_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(ExplorerSettings { api_url, api_key }),
            _ => None,
        };

        let front_end = FrontEndSettings {
            enabled: var(UPDATE_FRONT_END).map(|flag| is_truthy(&flag)).unwrap_or(false),
            addresses_file: var("FRONT_END_ADDRESSES_FILE")
                .unwrap_or_else(|| DEFAULT_ADDRESSES_FILE.to_string())
                .into(),
            abi_file: var("FRONT_END_ABI_FILE")
                .unwrap_or_else(|| DEFAULT_ABI_FILE.to_string())
                .into(),
        };

        let event_timeout = match var("EVENT_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(parse_number("EVENT_TIMEOUT_SECS", &secs)?),
            None => Duration::from_secs(DEFAULT_EVENT_TIMEOUT_SECS),
        };

        Ok(Self {
            network,
            rpc_url: var("RPC_URL").unwrap_or_else(|| network.default_rpc_url().to_string()),
            ws_url: var("WS_URL").unwrap_or_else(|| network.default_ws_url().to_string()),
            keypair_path,
            raffle_program_id: parse_pubkey("RAFFLE_PROGRAM_ID", var("RAFFLE_PROGRAM_ID"))?,
            coordinator_program_id: parse_pubkey(
                "VRF_COORDINATOR_PROGRAM_ID",
                var("VRF_COORDINATOR_PROGRAM_ID"),
            )?,
            subscription_id,
            raffle,
            explorer,
            front_end,
            event_timeout,
        })
    }
}

/// Boolean-like flag values: `true`, `1`, `yes`, `on`
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DeployError::Config(format!("{} must be a number, got `{}`", key, value)))
}

fn parse_pubkey(key: &str, value: Option<String>) -> Result<Pubkey> {
    let value = value.ok_or_else(|| DeployError::Config(format!("{} is not set", key)))?;
    Pubkey::from_str(value.trim())
        .map_err(|_| DeployError::Config(format!("{} is not a valid address: `{}`", key, value)))
}
