// Deploy plans for development and live networks
use log::info;
use raffle::{
    instruction,
    state::{find_raffle_address, Raffle},
    vrf::{self, Coordinator},
};
use solana_program::{instruction::Instruction, program_pack::Pack, pubkey::Pubkey};
use solana_sdk::signature::{Keypair, Signer};

use crate::chain::ChainClient;
use crate::config::{RaffleParams, Settings};
use crate::error::{DeployError, Result};

/// Flat fee of the mock coordinator, in lamports
pub const VRF_BASE_FEE: u64 = 250_000;
/// Per-word fee of the mock coordinator, in lamports
pub const VRF_GAS_PRICE: u64 = 1_000;
/// Balance a development subscription starts with
pub const VRF_SUBSCRIPTION_FUND_AMOUNT: u64 = 1_000_000_000_000;

/// A named group of instructions sent in one transaction
#[derive(Clone, Debug)]
pub struct DeployStep {
    pub name: &'static str,
    pub instructions: Vec<Instruction>,
    /// On-chain state showing the step already ran
    pub done_when: Completion,
}

/// What an earlier run leaves behind once a step has landed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The account was created
    AccountExists(Pubkey),
    /// The coordinator state at `state` holds the subscription
    SubscriptionExists { state: Pubkey, subscription_id: u64 },
    /// The subscription lists `consumer`
    ConsumerAdded {
        state: Pubkey,
        subscription_id: u64,
        consumer: Pubkey,
    },
}

impl Completion {
    /// Account whose data decides the check
    pub fn account(&self) -> &Pubkey {
        match self {
            Self::AccountExists(address) => address,
            Self::SubscriptionExists { state, .. } | Self::ConsumerAdded { state, .. } => state,
        }
    }

    /// Decide from the data of `account()`, `None` when it does not exist
    pub fn is_done(&self, data: Option<&[u8]>) -> Result<bool> {
        let data = match data {
            Some(data) => data,
            None => return Ok(false),
        };
        match self {
            Self::AccountExists(_) => Ok(true),
            Self::SubscriptionExists {
                subscription_id, ..
            } => Ok(Coordinator::load(data)?
                .subscriptions
                .iter()
                .any(|sub| sub.id == *subscription_id)),
            Self::ConsumerAdded {
                subscription_id,
                consumer,
                ..
            } => Ok(Coordinator::load(data)?
                .subscriptions
                .iter()
                .any(|sub| sub.id == *subscription_id && sub.consumers.contains(consumer))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeployPlan {
    pub steps: Vec<DeployStep>,
    pub raffle_address: Pubkey,
    pub coordinator: Pubkey,
    pub subscription_id: u64,
    pub constructor_arguments: Vec<String>,
}

impl DeployPlan {
    /// Mock coordinator, funded subscription, raffle, consumer registration
    pub fn development(
        raffle_program_id: &Pubkey,
        coordinator_program_id: &Pubkey,
        payer: &Pubkey,
        params: &RaffleParams,
    ) -> Self {
        let (raffle_address, _) = find_raffle_address(raffle_program_id);
        let (coordinator_state, _) = vrf::find_coordinator_address(coordinator_program_id);
        let subscription_id = vrf::FIRST_SUBSCRIPTION_ID;

        let steps = vec![
            DeployStep {
                name: "deploy mock coordinator",
                instructions: vec![vrf::initialize(
                    coordinator_program_id,
                    payer,
                    VRF_BASE_FEE,
                    VRF_GAS_PRICE,
                )],
                done_when: Completion::AccountExists(coordinator_state),
            },
            DeployStep {
                name: "create and fund subscription",
                instructions: vec![
                    vrf::create_subscription(coordinator_program_id, payer),
                    vrf::fund_subscription(
                        coordinator_program_id,
                        payer,
                        subscription_id,
                        VRF_SUBSCRIPTION_FUND_AMOUNT,
                    ),
                ],
                done_when: Completion::SubscriptionExists {
                    state: coordinator_state,
                    subscription_id,
                },
            },
            initialize_step(
                raffle_program_id,
                coordinator_program_id,
                payer,
                params,
                subscription_id,
            ),
            DeployStep {
                name: "add raffle as consumer",
                instructions: vec![vrf::add_consumer(
                    coordinator_program_id,
                    payer,
                    subscription_id,
                    &raffle_address,
                )],
                done_when: Completion::ConsumerAdded {
                    state: coordinator_state,
                    subscription_id,
                    consumer: raffle_address,
                },
            },
        ];

        Self {
            steps,
            raffle_address,
            coordinator: *coordinator_program_id,
            subscription_id,
            constructor_arguments: constructor_arguments(
                coordinator_program_id,
                params,
                subscription_id,
            ),
        }
    }

    /// Raffle against an existing coordinator and subscription
    pub fn live(
        raffle_program_id: &Pubkey,
        coordinator_program_id: &Pubkey,
        payer: &Pubkey,
        params: &RaffleParams,
        subscription_id: u64,
    ) -> Self {
        let (raffle_address, _) = find_raffle_address(raffle_program_id);

        Self {
            steps: vec![initialize_step(
                raffle_program_id,
                coordinator_program_id,
                payer,
                params,
                subscription_id,
            )],
            raffle_address,
            coordinator: *coordinator_program_id,
            subscription_id,
            constructor_arguments: constructor_arguments(
                coordinator_program_id,
                params,
                subscription_id,
            ),
        }
    }

    pub fn for_settings(settings: &Settings, payer: &Pubkey) -> Result<Self> {
        if settings.network.is_development() {
            return Ok(Self::development(
                &settings.raffle_program_id,
                &settings.coordinator_program_id,
                payer,
                &settings.raffle,
            ));
        }
        let subscription_id = settings.subscription_id.ok_or_else(|| {
            DeployError::Config(format!(
                "RAFFLE_SUBSCRIPTION_ID is required on {}",
                settings.network
            ))
        })?;
        Ok(Self::live(
            &settings.raffle_program_id,
            &settings.coordinator_program_id,
            payer,
            &settings.raffle,
            subscription_id,
        ))
    }
}

fn initialize_step(
    raffle_program_id: &Pubkey,
    coordinator_program_id: &Pubkey,
    payer: &Pubkey,
    params: &RaffleParams,
    subscription_id: u64,
) -> DeployStep {
    DeployStep {
        name: "initialize raffle",
        instructions: vec![instruction::initialize_raffle(
            raffle_program_id,
            payer,
            coordinator_program_id,
            params.entrance_fee,
            params.gas_lane,
            subscription_id,
            params.callback_gas_limit,
            params.interval,
        )],
        done_when: Completion::AccountExists(find_raffle_address(raffle_program_id).0),
    }
}

/// `InitializeRaffle` arguments in order, as strings
pub fn constructor_arguments(
    coordinator: &Pubkey,
    params: &RaffleParams,
    subscription_id: u64,
) -> Vec<String> {
    vec![
        coordinator.to_string(),
        params.entrance_fee.to_string(),
        hex::encode(params.gas_lane),
        subscription_id.to_string(),
        params.callback_gas_limit.to_string(),
        params.interval.to_string(),
    ]
}

/// Result of a deploy run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub raffle_address: Pubkey,
    pub coordinator: Pubkey,
    pub subscription_id: u64,
    pub constructor_arguments: Vec<String>,
    /// False when the raffle already existed before this run
    pub created: bool,
}

impl Deployment {
    /// Describe a raffle found on chain, with arguments rebuilt from its state
    pub fn existing(raffle_address: Pubkey, raffle: &Raffle) -> Self {
        let params = RaffleParams {
            entrance_fee: raffle.entrance_fee,
            gas_lane: raffle.gas_lane,
            callback_gas_limit: raffle.callback_gas_limit,
            interval: raffle.interval,
        };
        Self {
            raffle_address,
            coordinator: raffle.vrf_coordinator,
            subscription_id: raffle.subscription_id,
            constructor_arguments: constructor_arguments(
                &raffle.vrf_coordinator,
                &params,
                raffle.subscription_id,
            ),
            created: false,
        }
    }
}

/// Run the plan for `settings`, skipping steps an earlier run already landed
pub fn deploy(chain: &ChainClient, payer: &Keypair, settings: &Settings) -> Result<Deployment> {
    info!("Deploying raffle to {}...", settings.network);
    let plan = DeployPlan::for_settings(settings, &payer.pubkey())?;
    let existing = chain.account_data(&plan.raffle_address)?;

    for step in &plan.steps {
        let data = chain.account_data(step.done_when.account())?;
        if step.done_when.is_done(data.as_deref())? {
            info!("{}: already done", step.name);
            continue;
        }
        let signature = chain.send(&step.instructions, &[payer])?;
        info!("{}: {}", step.name, signature);
    }

    match existing {
        Some(data) => {
            info!("Raffle already deployed at {}", plan.raffle_address);
            let raffle = Raffle::unpack(&data)?;
            Ok(Deployment::existing(plan.raffle_address, &raffle))
        }
        None => {
            info!("Raffle deployed at {}", plan.raffle_address);
            Ok(Deployment {
                raffle_address: plan.raffle_address,
                coordinator: plan.coordinator,
                subscription_id: plan.subscription_id,
                constructor_arguments: plan.constructor_arguments,
                created: true,
            })
        }
    }
}
