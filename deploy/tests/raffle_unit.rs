// Raffle lifecycle against a simulated chain with the mock coordinator
mod common;

use common::{custom_error, on_development_network, Fixture};
use raffle::{
    error::RaffleError,
    events::RaffleEvent,
    state::{RaffleState, MAX_PLAYERS},
    vrf::VrfCoordinatorError,
};
use raffle_deploy::deploy::DeployPlan;
use solana_sdk::signature::{Keypair, Signer};

macro_rules! development_only {
    () => {
        if !on_development_network() {
            return;
        }
    };
}

// Construction

#[tokio::test]
async fn test_initializes_raffle_correctly() {
    development_only!();
    let mut fixture = Fixture::deploy().await;

    let raffle = fixture.raffle_state().await;
    assert!(raffle.is_initialized);
    assert_eq!(raffle.state, RaffleState::Open);
    assert_eq!(raffle.interval, fixture.params.interval);
    assert_eq!(raffle.entrance_fee, fixture.params.entrance_fee);
    assert_eq!(raffle.vrf_coordinator, fixture.coordinator_program);
    assert_eq!(raffle.subscription_id, fixture.subscription_id);
    assert_eq!(raffle.number_of_players(), 0);
}

// Entering

#[tokio::test]
async fn test_reverts_when_you_dont_pay_enough() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let player = fixture.funded_player().await;

    let enter = fixture.enter(&player.pubkey(), fixture.params.entrance_fee - 1);
    let err = fixture.send(&[enter], &[&player]).await.unwrap_err();

    assert_eq!(custom_error(&err), Some(RaffleError::NotEnoughEntered as u32));
    assert_eq!(fixture.raffle_state().await.number_of_players(), 0);
}

#[tokio::test]
async fn test_records_player_when_they_enter() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let player = fixture.funded_player().await;

    let enter = fixture.enter(&player.pubkey(), fixture.params.entrance_fee);
    let events = fixture.send_for_events(&[enter], &[&player]).await.unwrap();

    assert_eq!(
        events,
        vec![RaffleEvent::RaffleEnter {
            player: player.pubkey()
        }]
    );
    let raffle = fixture.raffle_state().await;
    assert_eq!(raffle.number_of_players(), 1);
    assert_eq!(raffle.player(0), Some(&player.pubkey()));
    assert_eq!(raffle.pot, fixture.params.entrance_fee);
}

#[tokio::test]
async fn test_accepts_payment_above_fee() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let player = fixture.funded_player().await;

    let enter = fixture.enter(&player.pubkey(), fixture.params.entrance_fee * 2);
    fixture.send(&[enter], &[&player]).await.unwrap();

    assert_eq!(fixture.raffle_state().await.number_of_players(), 1);
}

#[tokio::test]
async fn test_doesnt_allow_entrance_when_calculating() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    fixture.make_eligible().await;

    let upkeep = fixture.perform_upkeep();
    fixture.send(&[upkeep], &[]).await.unwrap();

    let late = fixture.funded_player().await;
    let enter = fixture.enter(&late.pubkey(), fixture.params.entrance_fee);
    let err = fixture.send(&[enter], &[&late]).await.unwrap_err();
    assert_eq!(custom_error(&err), Some(RaffleError::NotOpen as u32));
}

// Upkeep eligibility

#[tokio::test]
async fn test_check_upkeep_false_without_entries() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    fixture.advance_clock(fixture.params.interval as i64 + 1).await;

    assert!(!fixture.upkeep_needed().await);
}

#[tokio::test]
async fn test_check_upkeep_false_when_not_open() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    fixture.make_eligible().await;

    let upkeep = fixture.perform_upkeep();
    fixture.send(&[upkeep], &[]).await.unwrap();

    assert_eq!(fixture.raffle_state().await.state, RaffleState::Calculating);
    assert!(!fixture.upkeep_needed().await);
}

#[tokio::test]
async fn test_check_upkeep_false_before_interval() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let player = fixture.funded_player().await;
    fixture.enter_with_fee(&player).await;
    fixture.advance_clock(fixture.params.interval as i64 - 1).await;

    assert!(!fixture.upkeep_needed().await);
}

#[tokio::test]
async fn test_check_upkeep_true_when_everything_holds() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    fixture.make_eligible().await;

    assert!(fixture.upkeep_needed().await);
}

// Performing upkeep

#[tokio::test]
async fn test_perform_upkeep_reverts_when_not_needed() {
    development_only!();
    let mut fixture = Fixture::deploy().await;

    let upkeep = fixture.perform_upkeep();
    let err = fixture.send(&[upkeep], &[]).await.unwrap_err();

    assert_eq!(custom_error(&err), Some(RaffleError::UpkeepNotNeeded as u32));
    assert_eq!(fixture.raffle_state().await.state, RaffleState::Open);
}

#[tokio::test]
async fn test_perform_upkeep_requests_winner() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    fixture.make_eligible().await;

    let upkeep = fixture.perform_upkeep();
    let events = fixture.send_for_events(&[upkeep], &[]).await.unwrap();

    let request_id = events
        .iter()
        .find_map(|event| match event {
            RaffleEvent::RequestedRaffleWinner { request_id } => Some(*request_id),
            _ => None,
        })
        .expect("RequestedRaffleWinner event");
    assert!(request_id > 0);

    let raffle = fixture.raffle_state().await;
    assert_eq!(raffle.state, RaffleState::Calculating);
    assert_eq!(raffle.last_request_id, request_id);
}

// Fulfilling randomness

#[tokio::test]
async fn test_fulfill_only_after_perform_upkeep() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let player = fixture.make_eligible().await;

    for request_id in [0, 1] {
        let fulfill = fixture.fulfill(request_id, &player.pubkey());
        let err = fixture.send(&[fulfill], &[]).await.unwrap_err();
        assert_eq!(
            custom_error(&err),
            Some(VrfCoordinatorError::NonexistentRequest as u32)
        );
    }
}

#[tokio::test]
async fn test_picks_winner_resets_and_sends_money() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let entrance_fee = fixture.params.entrance_fee;

    let players = fixture.funded_players(4).await;
    for player in &players {
        fixture.enter_with_fee(player).await;
    }
    let starting_timestamp = fixture.raffle_state().await.last_timestamp;
    fixture.advance_clock(fixture.params.interval as i64 + 1).await;

    let request_id = fixture.request_winner().await;
    let expected = fixture.drawn_winner(request_id).await;
    assert!(players.iter().any(|player| player.pubkey() == expected));
    let starting_balance = fixture.balance(expected).await;

    let fulfill = fixture.fulfill(request_id, &expected);
    let events = fixture.send_for_events(&[fulfill], &[]).await.unwrap();

    assert!(events.contains(&RaffleEvent::WinnerPicked { winner: expected }));

    let raffle = fixture.raffle_state().await;
    assert_eq!(raffle.recent_winner, expected);
    assert_eq!(raffle.state, RaffleState::Open);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.pot, 0);
    assert!(raffle.last_timestamp > starting_timestamp);

    assert_eq!(
        fixture.balance(expected).await,
        starting_balance + entrance_fee * players.len() as u64
    );
}

#[tokio::test]
async fn test_rejects_fulfillment_for_wrong_winner() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let players = fixture.funded_players(2).await;
    for player in &players {
        fixture.enter_with_fee(player).await;
    }
    fixture.advance_clock(fixture.params.interval as i64 + 1).await;

    let request_id = fixture.request_winner().await;
    let expected = fixture.drawn_winner(request_id).await;
    let loser = players
        .iter()
        .map(|player| player.pubkey())
        .find(|key| *key != expected)
        .expect("a second player");

    let fulfill = fixture.fulfill(request_id, &loser);
    let err = fixture.send(&[fulfill], &[]).await.unwrap_err();
    assert_eq!(custom_error(&err), Some(RaffleError::WinnerAccountMissing as u32));

    // The round stays pending until the right account is supplied
    assert_eq!(fixture.raffle_state().await.state, RaffleState::Calculating);
    let fulfill = fixture.fulfill(request_id, &expected);
    fixture.send(&[fulfill], &[]).await.unwrap();
    assert_eq!(fixture.raffle_state().await.state, RaffleState::Open);
}

#[tokio::test]
async fn test_full_round_fulfills_in_one_transaction() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let entrance_fee = fixture.params.entrance_fee;

    let players = fixture.funded_players(MAX_PLAYERS).await;
    for batch in players.chunks(4) {
        let entries: Vec<_> = batch
            .iter()
            .map(|player| fixture.enter(&player.pubkey(), entrance_fee))
            .collect();
        let signers: Vec<&Keypair> = batch.iter().collect();
        fixture.send(&entries, &signers).await.unwrap();
    }

    let late = fixture.funded_player().await;
    let enter = fixture.enter(&late.pubkey(), entrance_fee);
    let err = fixture.send(&[enter], &[&late]).await.unwrap_err();
    assert_eq!(custom_error(&err), Some(RaffleError::RaffleFull as u32));

    fixture.advance_clock(fixture.params.interval as i64 + 1).await;
    let request_id = fixture.request_winner().await;
    let winner = fixture.drawn_winner(request_id).await;
    let starting_balance = fixture.balance(winner).await;

    let fulfill = fixture.fulfill(request_id, &winner);
    fixture.send(&[fulfill], &[]).await.unwrap();

    let raffle = fixture.raffle_state().await;
    assert_eq!(raffle.state, RaffleState::Open);
    assert_eq!(raffle.recent_winner, winner);
    assert_eq!(
        fixture.balance(winner).await,
        starting_balance + entrance_fee * MAX_PLAYERS as u64
    );
}

// Deploying

#[tokio::test]
async fn test_rerun_skips_landed_deploy_steps() {
    development_only!();
    let mut fixture = Fixture::deploy().await;
    let plan = DeployPlan::development(
        &fixture.raffle_program,
        &fixture.coordinator_program,
        &fixture.context.payer.pubkey(),
        &fixture.params,
    );

    for step in &plan.steps {
        assert!(fixture.step_done(&step.done_when).await, "{} not landed", step.name);
    }
}
