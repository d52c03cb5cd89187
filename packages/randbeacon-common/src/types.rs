use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, HexBinary, Uint128};
use sha3::{Digest, Keccak256};

use crate::hash::update_prefixed;

/// Number of beacons that contribute to every request.
pub const BEACONS_PER_REQUEST: usize = 3;

/// Lifecycle of a randomness request.
#[cw_serde]
pub enum RequestStatus {
    /// Waiting for the slot-0 beacon.
    AwaitingFirst,
    /// Slot 0 submitted, waiting for slot 1.
    AwaitingSecond,
    /// Slots 0 and 1 submitted, final beacon selected.
    AwaitingFinal,
    /// Verified mode: result computed and delivered.
    Fulfilled,
    /// Optimistic mode: all three commitments present, dispute window running.
    Committed,
    /// Optimistic mode: window passed without a successful dispute.
    Completed,
    /// Optimistic mode: a fraud proof succeeded.
    Disputed,
}

impl RequestStatus {
    /// The slot whose submission is expected next, if any.
    pub fn awaiting_slot(&self) -> Option<usize> {
        match self {
            RequestStatus::AwaitingFirst => Some(0),
            RequestStatus::AwaitingSecond => Some(1),
            RequestStatus::AwaitingFinal => Some(2),
            _ => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting_slot().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::AwaitingFirst => "awaiting_first",
            RequestStatus::AwaitingSecond => "awaiting_second",
            RequestStatus::AwaitingFinal => "awaiting_final",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Committed => "committed",
            RequestStatus::Completed => "completed",
            RequestStatus::Disputed => "disputed",
        }
    }
}

/// The committed part of a request. Beacons and renewers echo it back on
/// every call, and the coordinator checks it against the stored commitment,
/// so an actor working from stale data (e.g. after a renewal) is rejected.
#[cw_serde]
pub struct RequestData {
    pub id: u64,
    pub client: Addr,
    /// Slots 0 and 1 are fixed at creation; slot 2 stays `None` until the
    /// slot-1 submission selects it.
    pub beacons: [Option<Addr>; BEACONS_PER_REQUEST],
    pub seed: HexBinary,
    /// Deposit reserved from the client when the request was made.
    pub reserved: Uint128,
    pub beacon_fee: Uint128,
    pub height: u64,
    pub timestamp: u64,
    pub expiration_blocks: u64,
    pub expiration_seconds: u64,
    pub callback_gas_limit: u64,
    pub min_confirmations: u64,
    pub optimistic: bool,
}

impl RequestData {
    /// keccak256 over a canonical, length-prefixed encoding of every field.
    pub fn commitment(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(self.id.to_be_bytes());
        update_prefixed(&mut hasher, self.client.as_bytes());
        for slot in &self.beacons {
            match slot {
                Some(beacon) => {
                    hasher.update([1u8]);
                    update_prefixed(&mut hasher, beacon.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        update_prefixed(&mut hasher, self.seed.as_slice());
        hasher.update(self.reserved.u128().to_be_bytes());
        hasher.update(self.beacon_fee.u128().to_be_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.update(self.expiration_blocks.to_be_bytes());
        hasher.update(self.expiration_seconds.to_be_bytes());
        hasher.update(self.callback_gas_limit.to_be_bytes());
        hasher.update(self.min_confirmations.to_be_bytes());
        hasher.update([self.optimistic as u8]);
        hasher.finalize().into()
    }

    pub fn beacon(&self, slot: usize) -> Option<&Addr> {
        self.beacons.get(slot).and_then(|b| b.as_ref())
    }

    /// Slot held by `addr` on this request, if any.
    pub fn slot_of(&self, addr: &Addr) -> Option<usize> {
        self.beacons
            .iter()
            .position(|b| b.as_ref() == Some(addr))
    }
}

/// Message delivered to the client contract once randomness is final.
#[cw_serde]
pub enum ClientCallbackMsg {
    RandomnessCallback { id: u64, randomness: HexBinary },
}
