// Raffle deploy CLI
//
// Deploys the raffle to the configured network, verifies it and keeps the
// front end in sync. Settings come from the environment and `.env`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use raffle::state::find_raffle_address;
use raffle_deploy::{
    chain::{load_keypair, ChainClient},
    config::Settings,
    deploy::deploy,
    front_end::sync_front_end,
    idl::Idl,
    init_logging,
    staging::run_staging,
    verify::{verify, ExplorerClient, VerificationOutcome},
};
use solana_program::pubkey::Pubkey;
use std::path::PathBuf;

/// Raffle deployment, verification and front-end sync
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the raffle, then verify and sync the front end when configured
    Deploy,

    /// Submit a deployed raffle for explorer verification
    Verify {
        /// Raffle account address
        address: String,

        /// Constructor argument, repeat in order
        #[clap(long = "arg")]
        args: Vec<String>,
    },

    /// Write the raffle address and interface into the front end
    SyncFrontEnd {
        /// Raffle account address (defaults to the configured program's)
        #[clap(long)]
        address: Option<Pubkey>,
    },

    /// Enter the live raffle once and wait for the winner
    Staging {
        /// Entrant keypair (defaults to the deployer)
        #[clap(long)]
        player: Option<PathBuf>,
    },
}

fn verify_blocking(settings: &Settings, address: &str, args: &[String]) -> Result<()> {
    let explorer = match &settings.explorer {
        Some(explorer) => explorer,
        None => {
            warn!("EXPLORER_API_URL / EXPLORER_API_KEY not set, skipping verification");
            return Ok(());
        }
    };
    let client = ExplorerClient::new(explorer);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    if let VerificationOutcome::Failed(reason) = runtime.block_on(verify(&client, address, args)) {
        warn!("Continuing without verification: {}", reason);
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to read settings")?;

    match cli.command {
        Commands::Deploy => {
            let chain = ChainClient::new(&settings.rpc_url);
            let payer = load_keypair(&settings.keypair_path)?;
            let deployment = deploy(&chain, &payer, &settings)?;

            if !settings.network.is_development() && deployment.created {
                verify_blocking(
                    &settings,
                    &deployment.raffle_address.to_string(),
                    &deployment.constructor_arguments,
                )?;
            }

            let chain_id = chain.chain_id()?;
            sync_front_end(
                &settings.front_end,
                &chain_id,
                &deployment.raffle_address.to_string(),
                &Idl::raffle(),
            )?;
            info!("----------------------------------------------------");
        }
        Commands::Verify { address, args } => {
            verify_blocking(&settings, &address, &args)?;
        }
        Commands::SyncFrontEnd { address } => {
            if !settings.front_end.enabled {
                info!("UPDATE_FRONT_END is not set, nothing to do");
                return Ok(());
            }
            let address =
                address.unwrap_or_else(|| find_raffle_address(&settings.raffle_program_id).0);
            let chain_id = ChainClient::new(&settings.rpc_url).chain_id()?;
            sync_front_end(&settings.front_end, &chain_id, &address.to_string(), &Idl::raffle())?;
        }
        Commands::Staging { player } => {
            if settings.network.is_development() {
                bail!("staging runs against live networks; set NETWORK");
            }
            let chain = ChainClient::new(&settings.rpc_url);
            let keypair_path = player.as_deref().unwrap_or(settings.keypair_path.as_path());
            let player = load_keypair(keypair_path)?;
            let outcome = run_staging(&chain, &settings, &player)?;
            outcome.check()?;
            info!("Staging round passed, winner {}", outcome.winner);
        }
    }

    Ok(())
}
