use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // ── Validation ──
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("no funds sent")]
    NoFundsSent,

    #[error("must send exactly one coin of {expected}, got {denom}")]
    WrongDenom { expected: String, denom: String },

    #[error("request {id} not found")]
    RequestNotFound { id: u64 },

    #[error("request {id} is not pending")]
    RequestNotPending { id: u64 },

    #[error("request data does not match the commitment stored for request {id}")]
    RequestDataMismatch { id: u64 },

    #[error("confirmations {requested} out of bounds [{min}, {max}]")]
    ConfirmationsOOB { requested: u64, min: u64, max: u64 },

    #[error("callback gas limit {requested} out of bounds (1..={max})")]
    CallbackGasLimitOOB { requested: u64, max: u64 },

    #[error("expected a submission for slot {expected}, got slot {got}")]
    UnexpectedSlot { expected: usize, got: usize },

    #[error("request expects {} submissions", if *.optimistic { "optimistic" } else { "verified" })]
    WrongSubmissionMode { optimistic: bool },

    #[error("VRF proof failed verification")]
    InvalidVrfProof,

    #[error("proof does not match the optimistic commitment")]
    ProofMismatch,

    #[error("signer pubkey must be a 65-byte uncompressed secp256k1 key, got {len} bytes")]
    InvalidSignerPubkey { len: usize },

    // ── Authorization ──
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("sender is neither the owner nor the beacon")]
    NotOwnerOrBeacon,

    #[error("sender is neither the slot beacon nor the sequencer")]
    SenderNotBeaconOrSequencer,

    // ── Timing ──
    #[error("min height not yet reached: current {current}, required {required}")]
    MinHeightNotYetReached { current: u64, required: u64 },

    #[error("request {id} is not yet renewable by sender")]
    NotYetRenewable { id: u64 },

    #[error("sequencer submission too early: current height {current}, allowed from {allowed_from}")]
    SequencerSubmissionTooEarly { current: u64, allowed_from: u64 },

    #[error("request {id} cannot be renewed during its dispute window")]
    CantRenewDuringDisputeWindow { id: u64 },

    #[error("request {id} is not yet completable by sender")]
    NotYetCompletableBySender { id: u64 },

    #[error("request {id} is not completeable")]
    NotCompleteable { id: u64 },

    #[error("dispute window of request {id} is closed")]
    DisputeWindowClosed { id: u64 },

    // ── Resource ──
    #[error("not enough beacons available: {available} eligible, {required} required")]
    NotEnoughBeaconsAvailable { available: u32, required: u32 },

    #[error("beacon {address} not found")]
    BeaconNotFound { address: String },

    #[error("beacon {address} is already registered")]
    BeaconAlreadyRegistered { address: String },

    #[error("beacon {address} has {pending} pending requests")]
    BeaconHasPending { address: String, pending: u64 },

    #[error("beacon stake too low: {actual} staked, {required} required")]
    BeaconStakeTooLow { actual: Uint128, required: Uint128 },

    #[error("deposit too low: {available} available, {required} required")]
    DepositTooLow { available: Uint128, required: Uint128 },

    #[error("withdrawing too much: requested {requested}, available {available}")]
    WithdrawingTooMuch { requested: Uint128, available: Uint128 },

    #[error("failed to send {amount}: contract holds {balance}")]
    FailedToSend { amount: Uint128, balance: Uint128 },

    // ── Fraud ──
    #[error("slot {slot} of request {id} holds no disputable commitment")]
    NotDisputable { id: u64, slot: usize },

    #[error("proof is valid, dispute rejected")]
    ProofNotInvalid,

    #[error("unknown reply id {id}")]
    UnknownReplyId { id: u64 },
}
