// Blocking RPC access to a cluster
use log::debug;
use raffle::state::Raffle;
use solana_client::rpc_client::RpcClient;
use solana_program::{instruction::Instruction, program_pack::Pack, pubkey::Pubkey};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signature::{read_keypair_file, Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::path::Path;

use crate::error::{DeployError, Result};

pub struct ChainClient {
    rpc: RpcClient,
}

impl ChainClient {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
        }
    }

    /// Identifier of the cluster: its genesis hash
    pub fn chain_id(&self) -> Result<String> {
        Ok(self.rpc.get_genesis_hash()?.to_string())
    }

    /// Sign `instructions` with `signers` (the first pays) and wait for confirmation
    pub fn send(&self, instructions: &[Instruction], signers: &[&Keypair]) -> Result<Signature> {
        let payer = signers
            .first()
            .ok_or_else(|| DeployError::Config("a transaction needs a fee payer".to_string()))?;
        let blockhash = self.rpc.get_latest_blockhash()?;
        let signers: Vec<&Keypair> = signers.to_vec();
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            &signers,
            blockhash,
        );
        let signature = self.rpc.send_and_confirm_transaction(&transaction)?;
        debug!("Confirmed {}", signature);
        Ok(signature)
    }

    pub fn raffle(&self, address: &Pubkey) -> Result<Raffle> {
        let data = self.rpc.get_account_data(address)?;
        Ok(Raffle::unpack(&data)?)
    }

    pub fn balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.rpc.get_balance(address)?)
    }

    /// Data of the account at `address`, `None` when it does not exist
    pub fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let account = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())?
            .value;
        Ok(account.map(|account| account.data))
    }
}

pub fn load_keypair(path: &Path) -> Result<Keypair> {
    read_keypair_file(path)
        .map_err(|err| DeployError::Keypair(format!("{}: {}", path.display(), err)))
}
