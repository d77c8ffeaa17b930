// Interface description written to the front end's `abi.json`
use raffle::{error::RaffleError, events, state::Raffle};
use serde::Serialize;
use solana_program::program_pack::Pack;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlField {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlAccountItem {
    pub name: &'static str,
    pub is_mut: bool,
    pub is_signer: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlInstruction {
    pub name: &'static str,
    pub discriminant: u8,
    pub accounts: Vec<IdlAccountItem>,
    pub args: Vec<IdlField>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdlAccount {
    pub name: &'static str,
    pub seeds: Vec<&'static str>,
    pub size: usize,
    pub fields: Vec<IdlField>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdlEvent {
    pub name: &'static str,
    pub fields: Vec<IdlField>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdlError {
    pub code: u32,
    pub name: &'static str,
    pub msg: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Idl {
    pub version: &'static str,
    pub name: &'static str,
    pub instructions: Vec<IdlInstruction>,
    pub accounts: Vec<IdlAccount>,
    pub events: Vec<IdlEvent>,
    pub errors: Vec<IdlError>,
}

fn field(name: &'static str, ty: &'static str) -> IdlField {
    IdlField { name, ty }
}

fn account(name: &'static str, is_mut: bool, is_signer: bool) -> IdlAccountItem {
    IdlAccountItem {
        name,
        is_mut,
        is_signer,
    }
}

impl Idl {
    /// Description of the raffle program's public surface
    pub fn raffle() -> Self {
        let instructions = vec![
            IdlInstruction {
                name: "initializeRaffle",
                discriminant: 0,
                accounts: vec![
                    account("authority", true, true),
                    account("raffle", true, false),
                    account("vrfCoordinator", false, false),
                    account("systemProgram", false, false),
                ],
                args: vec![
                    field("entranceFee", "u64"),
                    field("gasLane", "[u8; 32]"),
                    field("subscriptionId", "u64"),
                    field("callbackGasLimit", "u32"),
                    field("interval", "u64"),
                ],
            },
            IdlInstruction {
                name: "enterRaffle",
                discriminant: 1,
                accounts: vec![
                    account("player", true, true),
                    account("raffle", true, false),
                    account("systemProgram", false, false),
                ],
                args: vec![field("amount", "u64")],
            },
            IdlInstruction {
                name: "checkUpkeep",
                discriminant: 2,
                accounts: vec![account("raffle", false, false)],
                args: vec![],
            },
            IdlInstruction {
                name: "performUpkeep",
                discriminant: 3,
                accounts: vec![
                    account("caller", false, true),
                    account("raffle", true, false),
                    account("vrfCoordinator", false, false),
                    account("coordinatorState", true, false),
                ],
                args: vec![],
            },
            IdlInstruction {
                name: "fulfillRandomWords",
                discriminant: 4,
                accounts: vec![
                    account("coordinatorState", false, true),
                    account("raffle", true, false),
                    account("winner", true, false),
                ],
                args: vec![field("requestId", "u64"), field("randomWords", "Vec<u64>")],
            },
        ];

        let accounts = vec![IdlAccount {
            name: "Raffle",
            seeds: vec!["raffle"],
            size: Raffle::LEN,
            fields: vec![
                field("isInitialized", "bool"),
                field("authority", "publicKey"),
                field("vrfCoordinator", "publicKey"),
                field("entranceFee", "u64"),
                field("gasLane", "[u8; 32]"),
                field("subscriptionId", "u64"),
                field("callbackGasLimit", "u32"),
                field("interval", "u64"),
                field("state", "u8"),
                field("lastTimestamp", "i64"),
                field("recentWinner", "publicKey"),
                field("pot", "u64"),
                field("lastRequestId", "u64"),
                field("bump", "u8"),
                field("playerCount", "u8"),
                field("players", "[publicKey; 32]"),
            ],
        }];

        let events = vec![
            IdlEvent {
                name: events::RAFFLE_ENTER,
                fields: vec![field("player", "publicKey")],
            },
            IdlEvent {
                name: events::REQUESTED_RAFFLE_WINNER,
                fields: vec![field("request_id", "u64")],
            },
            IdlEvent {
                name: events::WINNER_PICKED,
                fields: vec![field("winner", "publicKey")],
            },
            IdlEvent {
                name: events::UPKEEP_CHECKED,
                fields: vec![field("upkeep_needed", "bool")],
            },
        ];

        let errors = RaffleError::ALL
            .iter()
            .map(|error| IdlError {
                code: *error as u32,
                name: error.name(),
                msg: error.to_string(),
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION"),
            name: "raffle",
            instructions,
            accounts,
            events,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_error_code() {
        let idl = Idl::raffle();
        assert_eq!(idl.errors.len(), RaffleError::ALL.len());
        assert_eq!(idl.errors[1].name, "NotEnoughEntered");
        assert_eq!(idl.errors[1].code, 1);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Idl::raffle()).unwrap();
        assert_eq!(json["instructions"][1]["name"], "enterRaffle");
        assert_eq!(json["instructions"][1]["accounts"][0]["isSigner"], true);
        assert_eq!(json["accounts"][0]["fields"][1]["type"], "publicKey");
        assert_eq!(json["events"][2]["name"], "WinnerPicked");
    }
}
