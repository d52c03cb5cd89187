use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, HexBinary, Storage, Uint128};
use cw_storage_plus::{Item, Map};
use randbeacon_common::{RequestData, RequestStatus, VrfPublicKey, BEACONS_PER_REQUEST};

use crate::error::ContractError;
use crate::windows::{BlockPoint, Span};

pub const CONFIG: Item<Config> = Item::new("config");
pub const BEACONS: Map<&Addr, Beacon> = Map::new("beacons");
/// Registry index -> beacon address. Dense over `0..BEACON_COUNT`.
pub const BEACON_ADDRESSES: Map<u32, Addr> = Map::new("beacon_addresses");
pub const BEACON_COUNT: Item<u32> = Item::new("beacon_count");
pub const CLIENT_ACCOUNTS: Map<&Addr, ClientAccount> = Map::new("client_accounts");
pub const REQUESTS: Map<u64, Request> = Map::new("requests");
pub const REQUEST_COUNT: Item<u64> = Item::new("request_count");

#[cw_serde]
pub struct Config {
    pub owner: Addr,
    /// Relays signed submissions and takes the second renewal phase.
    pub sequencer: Addr,
    /// Absorbs charge shortfalls when a client runs dry.
    pub treasury: Addr,
    /// Contract answering `VrfQueryMsg`.
    pub vrf_verifier: Addr,
    pub denom: String,
    pub min_stake: Uint128,
    pub max_strikes: u32,
    pub max_consecutive_submissions: u32,
    pub min_confirmations: u64,
    pub max_confirmations: u64,
    pub max_callback_gas_limit: u64,
    pub gas_price: Uint128,
    pub gas: GasEstimates,
    pub beacon_fee: Uint128,
    pub expiration: Span,
    pub dispute_window: Span,
    /// Step between optimistic completion phases.
    pub completion_phase: Span,
    pub sequencer_grace: Span,
}

impl Config {
    /// Price of `gas` units at the configured gas price.
    pub fn gas_cost(&self, gas: u64) -> Uint128 {
        self.gas_price * Uint128::from(gas)
    }
}

/// Gas estimates used to reimburse the actor that pays for each operation.
#[cw_serde]
pub struct GasEstimates {
    pub submit: u64,
    pub finalize: u64,
    pub renew: u64,
    pub dispute: u64,
    pub complete: u64,
}

#[cw_serde]
pub struct Beacon {
    pub address: Addr,
    pub vrf_public_key: Option<VrfPublicKey>,
    /// Uncompressed secp256k1 key authorizing sequencer relays.
    pub signer_pubkey: Option<HexBinary>,
    pub staked: Uint128,
    /// Requests still referencing this beacon.
    pub pending: u64,
    /// Position in the registry, `None` while unregistered.
    pub index: Option<u32>,
    pub strikes: u32,
    pub consecutive_submissions: u32,
}

impl Beacon {
    pub fn new(address: Addr) -> Self {
        Self {
            address,
            vrf_public_key: None,
            signer_pubkey: None,
            staked: Uint128::zero(),
            pending: 0,
            index: None,
            strikes: 0,
            consecutive_submissions: 0,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.index.is_some()
    }
}

#[cw_serde]
#[derive(Default)]
pub struct ClientAccount {
    pub balance: Uint128,
    /// Portion of `balance` locked by in-flight requests.
    pub reserved: Uint128,
}

impl ClientAccount {
    pub fn available(&self) -> Uint128 {
        self.balance.saturating_sub(self.reserved)
    }
}

#[cw_serde]
pub struct Request {
    pub data: RequestData,
    pub commitment: HexBinary,
    pub status: RequestStatus,
    /// `hash_of(proof)` per slot, write-once.
    pub vrf_hashes: [Option<HexBinary>; BEACONS_PER_REQUEST],
    /// `proof_digest(proof)` per slot, optimistic mode only.
    pub proof_hashes: [Option<HexBinary>; BEACONS_PER_REQUEST],
    pub result: Option<HexBinary>,
    /// Part of `data.reserved` not yet charged or released.
    pub reserved_remaining: Uint128,
    pub last_activity: BlockPoint,
    pub dispute_window_start: Option<BlockPoint>,
    pub renewals: u32,
}

impl Request {
    pub fn new(data: RequestData, last_activity: BlockPoint) -> Self {
        let commitment = HexBinary::from(data.commitment());
        let reserved_remaining = data.reserved;
        Self {
            data,
            commitment,
            status: RequestStatus::AwaitingFirst,
            vrf_hashes: Default::default(),
            proof_hashes: Default::default(),
            result: None,
            reserved_remaining,
            last_activity,
            dispute_window_start: None,
            renewals: 0,
        }
    }

    /// Recompute the stored commitment after `data` changed.
    pub fn recommit(&mut self) {
        self.commitment = HexBinary::from(self.data.commitment());
    }

    /// Check echoed request data against the stored commitment.
    pub fn check_commitment(&self, data: &RequestData) -> Result<(), ContractError> {
        if self.commitment.as_slice() != data.commitment().as_slice() {
            return Err(ContractError::RequestDataMismatch { id: data.id });
        }
        Ok(())
    }

    pub fn has_submitted(&self, slot: usize) -> bool {
        self.vrf_hashes[slot].is_some()
    }

    /// True while a committed optimistic request can still be disputed.
    pub fn in_dispute_window(&self, config: &Config, now: &BlockPoint) -> bool {
        match (&self.status, &self.dispute_window_start) {
            (RequestStatus::Committed, Some(start)) => {
                !now.reached(&start.plus(config.dispute_window))
            }
            _ => false,
        }
    }
}

pub fn load_request(storage: &dyn Storage, id: u64) -> Result<Request, ContractError> {
    REQUESTS
        .may_load(storage, id)?
        .ok_or(ContractError::RequestNotFound { id })
}

/// Load the request `data` refers to and check the echoed data against the
/// stored commitment.
pub fn load_committed_request(
    storage: &dyn Storage,
    data: &RequestData,
) -> Result<Request, ContractError> {
    let request = load_request(storage, data.id)?;
    request.check_commitment(data)?;
    Ok(request)
}

pub fn load_beacon(storage: &dyn Storage, address: &Addr) -> Result<Beacon, ContractError> {
    BEACONS
        .may_load(storage, address)?
        .ok_or_else(|| ContractError::BeaconNotFound {
            address: address.to_string(),
        })
}
