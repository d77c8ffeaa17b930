// Staging round against a live deployment; skipped on development networks
mod common;

use common::on_development_network;
use raffle_deploy::{
    chain::{load_keypair, ChainClient},
    config::Settings,
    staging::run_staging,
};

#[test]
fn test_works_with_live_upkeep_and_vrf() {
    dotenv::dotenv().ok();
    if on_development_network() {
        return;
    }
    // A live NETWORK with broken settings must fail, not pass silently
    let settings = Settings::from_env().expect("staging settings");

    let chain = ChainClient::new(&settings.rpc_url);
    let player = load_keypair(&settings.keypair_path).expect("staging keypair");

    let outcome = run_staging(&chain, &settings, &player).unwrap();
    outcome.check().unwrap();
}

#[test]
fn test_live_network_without_program_ids_is_an_error() {
    let lookup = |key: &str| match key {
        "NETWORK" => Some("devnet".to_string()),
        "HOME" => Some("/home/raffle".to_string()),
        _ => None,
    };
    let err = Settings::from_lookup(lookup).unwrap_err();
    assert!(err.to_string().contains("RAFFLE_PROGRAM_ID"));
}
