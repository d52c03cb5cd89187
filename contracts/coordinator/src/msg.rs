use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{HexBinary, Uint128};
use randbeacon_common::{FastVerifyParams, RequestData, RequestStatus, VrfProof, VrfPublicKey};

use crate::state::{Beacon, ClientAccount, Config, GasEstimates, Request};
use crate::windows::Span;

#[cw_serde]
pub struct InstantiateMsg {
    pub sequencer: String,
    pub treasury: String,
    pub vrf_verifier: String,
    /// Native denom used for stakes, deposits and fees
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
    pub completion_phase: Span,
    pub sequencer_grace: Span,
}

/// Secp256k1 signature by the beacon's signer key over the relay digest.
#[cw_serde]
pub struct RelaySignature {
    /// 64-byte `r || s`
    pub signature: HexBinary,
    pub recovery_param: u8,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Add stake for `beacon`. Send the denom in info.funds.
    StakeBeacon { beacon: String },
    /// Withdraw stake. Sender is the beacon.
    UnstakeBeacon { amount: Uint128 },
    /// Add a staked beacon to the registry. Owner only.
    RegisterBeacon {
        beacon: String,
        vrf_public_key: VrfPublicKey,
        signer_pubkey: HexBinary,
    },
    /// Remove a beacon and refund its stake. Owner or the beacon itself.
    UnregisterBeacon { beacon: String },
    /// Fund a client account, the sender's own by default.
    Deposit { client: Option<String> },
    /// Withdraw unreserved client balance.
    Withdraw { amount: Uint128 },
    /// Ask for randomness, delivered through `ClientCallbackMsg`.
    Request {
        callback_gas_limit: u64,
        min_confirmations: u64,
        optimistic: bool,
    },
    /// Verified submission. `signature` is required when the sequencer relays.
    SubmitRandom {
        beacon_index: u8,
        request: RequestData,
        proof: VrfProof,
        params: FastVerifyParams,
        signature: Option<RelaySignature>,
    },
    /// Optimistic submission, committed without verification.
    SubmitOptimistic {
        beacon_index: u8,
        request: RequestData,
        proof: VrfProof,
        signature: Option<RelaySignature>,
    },
    /// Re-assign the silent beacons of an expired request.
    Renew { request: RequestData },
    /// Prove an optimistic commitment fraudulent.
    Dispute {
        beacon_index: u8,
        request: RequestData,
        proof: VrfProof,
    },
    /// Finalize a committed optimistic request after its dispute window.
    CompleteOptimistic { request: RequestData },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(Beacon)]
    Beacon { address: String },
    /// Registered beacons by registry index.
    #[returns(BeaconsResponse)]
    Beacons {
        start_after: Option<u32>,
        limit: Option<u32>,
    },
    #[returns(u32)]
    BeaconCount {},
    #[returns(ClientAccount)]
    ClientAccount { address: String },
    #[returns(Request)]
    Request { id: u64 },
    #[returns(ResultResponse)]
    Result { id: u64 },
    #[returns(RequestsResponse)]
    Requests {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
}

#[cw_serde]
pub struct BeaconsResponse {
    pub beacons: Vec<Beacon>,
}

#[cw_serde]
pub struct ResultResponse {
    pub id: u64,
    pub status: RequestStatus,
    /// Set once the request is `Fulfilled` or `Completed`.
    pub result: Option<HexBinary>,
}

#[cw_serde]
pub struct RequestsResponse {
    pub requests: Vec<Request>,
}

#[cw_serde]
pub struct MigrateMsg {}

/// A beacon submission, verified or optimistic.
pub struct SubmitParams {
    pub beacon_index: u8,
    pub request: RequestData,
    pub proof: VrfProof,
    /// `None` for optimistic submissions.
    pub params: Option<FastVerifyParams>,
    pub signature: Option<RelaySignature>,
}
