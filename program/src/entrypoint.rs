// Program entrypoint, excluded when the crate is used as a library
use solana_program::entrypoint;

#[cfg(not(feature = "mock-coordinator"))]
use crate::process_instruction;

#[cfg(feature = "mock-coordinator")]
use crate::vrf::process_instruction;

entrypoint!(process_instruction);
