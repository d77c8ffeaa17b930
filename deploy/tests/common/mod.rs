#![allow(dead_code)]

use raffle::{events::RaffleEvent, state::Raffle};
use raffle_deploy::{
    config::{Network, RaffleParams},
    deploy::{Completion, DeployPlan},
};
use solana_program::{instruction::InstructionError, program_pack::Pack, pubkey::Pubkey};
use solana_program_test::*;
use solana_sdk::{
    instruction::Instruction,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::clock::Clock,
    transaction::{Transaction, TransactionError},
};

/// Lamports each test player starts with
pub const PLAYER_FUNDS: u64 = 1_000_000_000;

/// Players funded by one transfer transaction
const FUNDING_BATCH: usize = 8;

/// Fresh simulated chain with the development deploy plan applied
pub struct Fixture {
    pub context: ProgramTestContext,
    pub raffle_program: Pubkey,
    pub coordinator_program: Pubkey,
    pub raffle: Pubkey,
    pub subscription_id: u64,
    pub params: RaffleParams,
}

impl Fixture {
    pub async fn deploy() -> Self {
        let raffle_program = Pubkey::new_unique();
        let coordinator_program = Pubkey::new_unique();

        let mut program_test = ProgramTest::new(
            "raffle",
            raffle_program,
            processor!(raffle::process_instruction),
        );
        program_test.add_program(
            "vrf_coordinator",
            coordinator_program,
            processor!(raffle::vrf::process_instruction),
        );
        let context = program_test.start_with_context().await;

        let params = RaffleParams::for_network(Network::Localnet);
        let plan = DeployPlan::development(
            &raffle_program,
            &coordinator_program,
            &context.payer.pubkey(),
            &params,
        );

        let mut fixture = Self {
            context,
            raffle_program,
            coordinator_program,
            raffle: plan.raffle_address,
            subscription_id: plan.subscription_id,
            params,
        };
        for step in &plan.steps {
            fixture
                .send(&step.instructions, &[])
                .await
                .unwrap_or_else(|err| panic!("{} failed: {:?}", step.name, err));
        }
        fixture
    }

    /// Send `instructions` paid by the context payer; returns the log messages
    pub async fn send(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Vec<String>, TransactionError> {
        let blockhash = self
            .context
            .get_new_latest_blockhash()
            .await
            .expect("new blockhash");

        let mut all_signers: Vec<&Keypair> = vec![&self.context.payer];
        all_signers.extend_from_slice(signers);
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.context.payer.pubkey()),
            &all_signers,
            blockhash,
        );

        let outcome = self
            .context
            .banks_client
            .process_transaction_with_metadata(transaction)
            .await
            .expect("banks client");
        outcome.result?;
        Ok(outcome
            .metadata
            .map(|metadata| metadata.log_messages)
            .unwrap_or_default())
    }

    /// Send and parse the raffle events out of the logs
    pub async fn send_for_events(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<Vec<RaffleEvent>, TransactionError> {
        let logs = self.send(instructions, signers).await?;
        Ok(RaffleEvent::from_logs(&logs))
    }

    pub async fn raffle_state(&mut self) -> Raffle {
        let account = self
            .context
            .banks_client
            .get_account(self.raffle)
            .await
            .expect("banks client")
            .expect("raffle account");
        Raffle::unpack(&account.data).expect("raffle data")
    }

    pub async fn balance(&mut self, address: Pubkey) -> u64 {
        self.context
            .banks_client
            .get_balance(address)
            .await
            .expect("banks client")
    }

    pub async fn clock(&mut self) -> Clock {
        self.context
            .banks_client
            .get_sysvar::<Clock>()
            .await
            .expect("clock")
    }

    /// Move the cluster clock forward by `seconds`
    pub async fn advance_clock(&mut self, seconds: i64) {
        let mut clock = self.clock().await;
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    /// A new keypair funded with `PLAYER_FUNDS` lamports
    pub async fn funded_player(&mut self) -> Keypair {
        let player = Keypair::new();
        let transfer = system_instruction::transfer(
            &self.context.payer.pubkey(),
            &player.pubkey(),
            PLAYER_FUNDS,
        );
        self.send(&[transfer], &[]).await.expect("fund player");
        player
    }

    /// `count` new keypairs funded with `PLAYER_FUNDS` lamports each
    pub async fn funded_players(&mut self, count: usize) -> Vec<Keypair> {
        let players: Vec<Keypair> = (0..count).map(|_| Keypair::new()).collect();
        for batch in players.chunks(FUNDING_BATCH) {
            let transfers: Vec<Instruction> = batch
                .iter()
                .map(|player| {
                    system_instruction::transfer(
                        &self.context.payer.pubkey(),
                        &player.pubkey(),
                        PLAYER_FUNDS,
                    )
                })
                .collect();
            self.send(&transfers, &[]).await.expect("fund players");
        }
        players
    }

    /// Data of the account at `address`, if it exists
    pub async fn account_data(&mut self, address: Pubkey) -> Option<Vec<u8>> {
        self.context
            .banks_client
            .get_account(address)
            .await
            .expect("banks client")
            .map(|account| account.data)
    }

    /// Whether the chain shows a deploy step as landed
    pub async fn step_done(&mut self, done_when: &Completion) -> bool {
        let data = self.account_data(*done_when.account()).await;
        done_when.is_done(data.as_deref()).expect("deploy step check")
    }

    pub fn enter(&self, player: &Pubkey, amount: u64) -> Instruction {
        raffle::instruction::enter_raffle(&self.raffle_program, player, amount)
    }

    pub fn perform_upkeep(&self) -> Instruction {
        raffle::instruction::perform_upkeep(
            &self.raffle_program,
            &self.context.payer.pubkey(),
            &self.coordinator_program,
        )
    }

    pub fn check_upkeep(&self) -> Instruction {
        raffle::instruction::check_upkeep(&self.raffle_program)
    }

    /// Mock coordinator fulfilment of `request_id` paying `winner`
    pub fn fulfill(&self, request_id: u64, winner: &Pubkey) -> Instruction {
        raffle::vrf::fulfill_random_words(
            &self.coordinator_program,
            &self.context.payer.pubkey(),
            request_id,
            &self.raffle_program,
            &self.raffle,
            &[*winner],
        )
    }

    /// Player the mock coordinator's word for `request_id` will select
    pub async fn drawn_winner(&mut self, request_id: u64) -> Pubkey {
        let word = raffle::vrf::random_words(request_id, 1)[0];
        *self
            .raffle_state()
            .await
            .winner_for(word)
            .expect("players entered")
    }

    /// Request id carried by the `RequestedRaffleWinner` event of an upkeep
    pub async fn request_winner(&mut self) -> u64 {
        let upkeep = self.perform_upkeep();
        self.send_for_events(&[upkeep], &[])
            .await
            .expect("perform upkeep")
            .iter()
            .find_map(|event| match event {
                RaffleEvent::RequestedRaffleWinner { request_id } => Some(*request_id),
                _ => None,
            })
            .expect("RequestedRaffleWinner event")
    }

    /// Result of the eligibility check, read from the `UpkeepChecked` event
    pub async fn upkeep_needed(&mut self) -> bool {
        let check = self.check_upkeep();
        let events = self.send_for_events(&[check], &[]).await.expect("check upkeep");
        events
            .iter()
            .find_map(|event| match event {
                RaffleEvent::UpkeepChecked { upkeep_needed } => Some(*upkeep_needed),
                _ => None,
            })
            .expect("UpkeepChecked event")
    }

    /// Enter `player` with the entrance fee
    pub async fn enter_with_fee(&mut self, player: &Keypair) {
        let enter = self.enter(&player.pubkey(), self.params.entrance_fee);
        self.send(&[enter], &[player]).await.expect("enter raffle");
    }

    /// Enter one player and let the interval pass
    pub async fn make_eligible(&mut self) -> Keypair {
        let player = self.funded_player().await;
        self.enter_with_fee(&player).await;
        self.advance_clock(self.params.interval as i64 + 1).await;
        player
    }
}

/// Custom program error code carried by a failed transaction
pub fn custom_error(err: &TransactionError) -> Option<u32> {
    match err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

/// The unit suite runs only against development networks
pub fn on_development_network() -> bool {
    match std::env::var("NETWORK") {
        Ok(name) => name
            .parse::<Network>()
            .map(|network| network.is_development())
            .unwrap_or(false),
        Err(_) => true,
    }
}
