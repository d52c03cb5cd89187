//! Test harness: contract setup, a deterministic mock VRF verifier and
//! k256-backed relay signatures.

use cosmwasm_std::testing::{
    message_info, mock_dependencies, mock_env, MockApi, MockQuerier, MockStorage,
};
use cosmwasm_std::{
    coin, from_json, to_json_binary, Addr, ContractResult, Deps, DepsMut, Env, HexBinary,
    OwnedDeps, QuerierResult, Response, SystemError, SystemResult, Uint128, WasmQuery,
};
use k256::ecdsa::SigningKey;
use randbeacon_common::{
    keccak256, keccak_concat, FastVerifyParams, RequestData, VrfProof, VrfPublicKey, VrfQueryMsg,
};

use crate::contract::{execute, instantiate};
use crate::error::ContractError;
use crate::msg::{ExecuteMsg, InstantiateMsg, RelaySignature};
use crate::sequencer::relay_digest;
use crate::state::{Config, GasEstimates, REQUESTS};
use crate::windows::Span;

pub type MockDeps = OwnedDeps<MockStorage, MockApi, MockQuerier>;

pub const DENOM: &str = "ucoin";
pub const MIN_STAKE: u128 = 10_000_000;
pub const CALLBACK_GAS: u64 = 100_000;

// ─── Setup ───

pub fn default_instantiate_msg(api: &MockApi) -> InstantiateMsg {
    InstantiateMsg {
        sequencer: api.addr_make("sequencer").to_string(),
        treasury: api.addr_make("treasury").to_string(),
        vrf_verifier: api.addr_make("vrf_verifier").to_string(),
        denom: DENOM.to_string(),
        min_stake: Uint128::new(MIN_STAKE),
        max_strikes: 3,
        max_consecutive_submissions: 100,
        min_confirmations: 1,
        max_confirmations: 100,
        max_callback_gas_limit: 1_000_000,
        gas_price: Uint128::new(10),
        gas: GasEstimates {
            submit: 100_000,
            finalize: 50_000,
            renew: 80_000,
            dispute: 120_000,
            complete: 60_000,
        },
        beacon_fee: Uint128::new(50_000),
        expiration: Span::new(20, 900),
        dispute_window: Span::new(10, 600),
        completion_phase: Span::new(5, 300),
        sequencer_grace: Span::new(5, 30),
    }
}

pub fn default_config(api: &MockApi) -> Config {
    let msg = default_instantiate_msg(api);
    Config {
        owner: api.addr_make("owner"),
        sequencer: api.addr_make("sequencer"),
        treasury: api.addr_make("treasury"),
        vrf_verifier: api.addr_make("vrf_verifier"),
        denom: msg.denom,
        min_stake: msg.min_stake,
        max_strikes: msg.max_strikes,
        max_consecutive_submissions: msg.max_consecutive_submissions,
        min_confirmations: msg.min_confirmations,
        max_confirmations: msg.max_confirmations,
        max_callback_gas_limit: msg.max_callback_gas_limit,
        gas_price: msg.gas_price,
        gas: msg.gas,
        beacon_fee: msg.beacon_fee,
        expiration: msg.expiration,
        dispute_window: msg.dispute_window,
        completion_phase: msg.completion_phase,
        sequencer_grace: msg.sequencer_grace,
    }
}

pub fn setup_contract(deps: DepsMut) {
    let api = MockApi::default();
    let owner = api.addr_make("owner");
    let msg = default_instantiate_msg(&api);
    instantiate(deps, mock_env(), message_info(&owner, &[]), msg).unwrap();
}

/// Dependencies with the mock VRF verifier installed and a funded contract.
pub fn mock_deps() -> MockDeps {
    let mut deps = mock_dependencies();
    deps.querier.update_wasm(mock_vrf_querier);
    fund_contract(&mut deps, 1_000_000_000_000);
    deps
}

/// Set the contract's bank balance, which bounds every payout.
pub fn fund_contract(deps: &mut MockDeps, amount: u128) {
    deps.querier
        .bank
        .update_balance(mock_env().contract.address, vec![coin(amount, DENOM)]);
}

pub fn env_after(blocks: u64, seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.height += blocks;
    env.block.time = env.block.time.plus_seconds(seconds);
    env
}

// ─── Beacons ───

pub fn stake(deps: DepsMut, beacon: &Addr, amount: u128) {
    execute(
        deps,
        mock_env(),
        message_info(beacon, &[coin(amount, DENOM)]),
        ExecuteMsg::StakeBeacon {
            beacon: beacon.to_string(),
        },
    )
    .unwrap();
}

/// Stake the minimum and register `beacon`.
pub fn register(mut deps: DepsMut, beacon: &Addr) {
    stake(deps.branch(), beacon, MIN_STAKE);
    let owner = MockApi::default().addr_make("owner");
    execute(
        deps,
        mock_env(),
        message_info(&owner, &[]),
        ExecuteMsg::RegisterBeacon {
            beacon: beacon.to_string(),
            vrf_public_key: vrf_public_key(beacon),
            signer_pubkey: signer_pubkey(beacon),
        },
    )
    .unwrap();
}

pub fn register_beacons(mut deps: DepsMut, count: usize) -> Vec<Addr> {
    let api = MockApi::default();
    (0..count)
        .map(|i| {
            let beacon = api.addr_make(&format!("beacon{i}"));
            register(deps.branch(), &beacon);
            beacon
        })
        .collect()
}

// ─── Mock VRF ───
//
// Keyed by beacon address. Not a real VRF: it only has to tell an honest
// proof from a tampered one.

fn vrf_secret(beacon: &Addr) -> [u8; 32] {
    keccak_concat(&[b"mock-vrf-secret", beacon.as_bytes()])
}

pub fn vrf_public_key(beacon: &Addr) -> VrfPublicKey {
    let x = keccak256(&vrf_secret(beacon));
    VrfPublicKey {
        x: HexBinary::from(x),
        y: HexBinary::from(keccak256(&x)),
    }
}

pub fn prove(beacon: &Addr, message: &[u8]) -> VrfProof {
    let public_key = vrf_public_key(beacon);
    let gamma_x = keccak_concat(&[&vrf_secret(beacon), message]);
    let c = keccak_concat(&[public_key.x.as_slice(), message, &gamma_x]);
    VrfProof {
        gamma_x: HexBinary::from(gamma_x),
        gamma_y: HexBinary::from(keccak256(&gamma_x)),
        c: HexBinary::from(c),
        s: HexBinary::from(keccak256(&c)),
    }
}

/// Same shape as an honest proof but with a foreign gamma.
pub fn tamper(proof: &VrfProof) -> VrfProof {
    let gamma_x = keccak256(proof.gamma_x.as_slice());
    VrfProof {
        gamma_x: HexBinary::from(gamma_x),
        gamma_y: HexBinary::from(keccak256(&gamma_x)),
        c: proof.c.clone(),
        s: proof.s.clone(),
    }
}

pub fn mock_verify(public_key: &VrfPublicKey, proof: &VrfProof, message: &[u8]) -> bool {
    let c = keccak_concat(&[public_key.x.as_slice(), message, proof.gamma_x.as_slice()]);
    proof.gamma_y.as_slice() == keccak256(proof.gamma_x.as_slice()).as_slice()
        && proof.c.as_slice() == c.as_slice()
        && proof.s.as_slice() == keccak256(&c).as_slice()
}

pub fn fast_verify_params(proof: &VrfProof) -> FastVerifyParams {
    FastVerifyParams {
        u_point: vec![HexBinary::from(keccak_concat(&[proof.c.as_slice(), b"u"]))],
        v_components: vec![HexBinary::from(keccak_concat(&[proof.s.as_slice(), b"v"]))],
    }
}

fn mock_vrf_querier(query: &WasmQuery) -> QuerierResult {
    let WasmQuery::Smart { msg, .. } = query else {
        return SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "only smart queries are mocked".to_string(),
        });
    };
    let response = match from_json::<VrfQueryMsg>(msg) {
        Ok(VrfQueryMsg::Verify {
            public_key,
            proof,
            message,
        }) => to_json_binary(&mock_verify(&public_key, &proof, message.as_slice())),
        Ok(VrfQueryMsg::ComputeFastVerifyParams { proof, .. }) => {
            to_json_binary(&fast_verify_params(&proof))
        }
        Ok(VrfQueryMsg::FastVerify {
            public_key,
            proof,
            message,
            params,
        }) => to_json_binary(
            &(mock_verify(&public_key, &proof, message.as_slice())
                && params == fast_verify_params(&proof)),
        ),
        Err(err) => return SystemResult::Ok(ContractResult::Err(err.to_string())),
    };
    SystemResult::Ok(ContractResult::from(response))
}

// ─── Relay signatures ───

fn signing_key(beacon: &Addr) -> SigningKey {
    SigningKey::from_slice(&keccak_concat(&[b"mock-relay-signer", beacon.as_bytes()])).unwrap()
}

pub fn signer_pubkey(beacon: &Addr) -> HexBinary {
    let point = signing_key(beacon).verifying_key().to_encoded_point(false);
    HexBinary::from(point.as_bytes())
}

pub fn sign_relay(beacon: &Addr, digest: &[u8; 32]) -> RelaySignature {
    let (signature, recovery_id) = signing_key(beacon)
        .sign_prehash_recoverable(digest)
        .unwrap();
    RelaySignature {
        signature: HexBinary::from(signature.to_bytes().as_slice()),
        recovery_param: recovery_id.to_byte(),
    }
}

/// Signature by the slot beacon over a verified submission of its honest proof.
pub fn sign_relay_for(deps: Deps, env: &Env, id: u64, slot: usize) -> RelaySignature {
    let data = load_data(deps, id);
    let beacon = data.beacons[slot].clone().unwrap();
    let proof = prove(&beacon, data.seed.as_slice());
    let params = fast_verify_params(&proof);
    let digest = relay_digest(
        &env.contract.address,
        &data,
        slot,
        &proof,
        Some(&params),
        &env.block.chain_id,
    );
    sign_relay(&beacon, &digest)
}

// ─── Clients and requests ───

pub fn deposit(deps: DepsMut, client: &Addr, amount: u128) {
    execute(
        deps,
        mock_env(),
        message_info(client, &[coin(amount, DENOM)]),
        ExecuteMsg::Deposit { client: None },
    )
    .unwrap();
}

/// Open a request at `mock_env()` with one confirmation.
pub fn make_request(deps: DepsMut, client: &Addr, optimistic: bool) -> u64 {
    let res = execute(
        deps,
        mock_env(),
        message_info(client, &[]),
        ExecuteMsg::Request {
            callback_gas_limit: CALLBACK_GAS,
            min_confirmations: 1,
            optimistic,
        },
    )
    .unwrap();
    res.attributes
        .iter()
        .find(|a| a.key == "id")
        .unwrap()
        .value
        .parse()
        .unwrap()
}

pub fn load_data(deps: Deps, id: u64) -> RequestData {
    REQUESTS.load(deps.storage, id).unwrap().data
}

pub fn sample_request_data(client: Addr) -> RequestData {
    RequestData {
        id: 1,
        client,
        beacons: [
            Some(Addr::unchecked("beacon0")),
            Some(Addr::unchecked("beacon1")),
            None,
        ],
        seed: HexBinary::from(vec![7u8; 32]),
        reserved: Uint128::new(1_000),
        beacon_fee: Uint128::new(10),
        height: 12_345,
        timestamp: 1_571_797_419,
        expiration_blocks: 20,
        expiration_seconds: 900,
        callback_gas_limit: CALLBACK_GAS,
        min_confirmations: 1,
        optimistic: false,
    }
}

// ─── Submissions ───

pub fn optimistic_proof(data: &RequestData, slot: usize, tampered: bool) -> VrfProof {
    let beacon = data.beacons[slot].clone().unwrap();
    let proof = prove(&beacon, data.seed.as_slice());
    if tampered {
        tamper(&proof)
    } else {
        proof
    }
}

#[allow(clippy::too_many_arguments)]
fn send_submission(
    deps: DepsMut,
    env: Env,
    data: &RequestData,
    slot: usize,
    sender: &Addr,
    signature: Option<RelaySignature>,
    optimistic: bool,
    tampered: bool,
) -> Result<Response, ContractError> {
    let proof = optimistic_proof(data, slot, tampered);
    let msg = if optimistic {
        ExecuteMsg::SubmitOptimistic {
            beacon_index: slot as u8,
            request: data.clone(),
            proof,
            signature,
        }
    } else {
        ExecuteMsg::SubmitRandom {
            beacon_index: slot as u8,
            request: data.clone(),
            params: fast_verify_params(&proof),
            proof,
            signature,
        }
    };
    execute(deps, env, message_info(sender, &[]), msg)
}

pub fn submit_data(
    deps: DepsMut,
    env: Env,
    data: &RequestData,
    slot: usize,
    sender: &Addr,
    signature: Option<RelaySignature>,
    optimistic: bool,
) -> Result<Response, ContractError> {
    send_submission(deps, env, data, slot, sender, signature, optimistic, false)
}

pub fn submit_as(
    deps: DepsMut,
    env: Env,
    id: u64,
    slot: usize,
    sender: &Addr,
    signature: Option<RelaySignature>,
) -> Result<Response, ContractError> {
    let data = load_data(deps.as_ref(), id);
    send_submission(deps, env, &data, slot, sender, signature, false, false)
}

/// Verified submission by the slot beacon itself.
pub fn submit(deps: DepsMut, env: Env, id: u64, slot: usize) -> Result<Response, ContractError> {
    let data = load_data(deps.as_ref(), id);
    let beacon = data.beacons[slot].clone().unwrap();
    send_submission(deps, env, &data, slot, &beacon, None, false, false)
}

pub fn submit_tampered(
    deps: DepsMut,
    env: Env,
    id: u64,
    slot: usize,
) -> Result<Response, ContractError> {
    let data = load_data(deps.as_ref(), id);
    let beacon = data.beacons[slot].clone().unwrap();
    send_submission(deps, env, &data, slot, &beacon, None, false, true)
}

pub fn submit_optimistic(
    deps: DepsMut,
    env: Env,
    id: u64,
    slot: usize,
) -> Result<Response, ContractError> {
    let data = load_data(deps.as_ref(), id);
    let beacon = data.beacons[slot].clone().unwrap();
    send_submission(deps, env, &data, slot, &beacon, None, true, false)
}

pub fn submit_optimistic_tampered(
    deps: DepsMut,
    env: Env,
    id: u64,
    slot: usize,
) -> Result<Response, ContractError> {
    let data = load_data(deps.as_ref(), id);
    let beacon = data.beacons[slot].clone().unwrap();
    send_submission(deps, env, &data, slot, &beacon, None, true, true)
}

// ─── Renewal, dispute, completion ───

pub fn renew_data(
    deps: DepsMut,
    env: Env,
    data: &RequestData,
    sender: &Addr,
) -> Result<Response, ContractError> {
    execute(
        deps,
        env,
        message_info(sender, &[]),
        ExecuteMsg::Renew {
            request: data.clone(),
        },
    )
}

pub fn renew_as(
    deps: DepsMut,
    env: Env,
    id: u64,
    sender: &Addr,
) -> Result<Response, ContractError> {
    let data = load_data(deps.as_ref(), id);
    renew_data(deps, env, &data, sender)
}

pub fn dispute_as(
    deps: DepsMut,
    env: Env,
    data: &RequestData,
    slot: usize,
    proof: VrfProof,
    sender: &Addr,
) -> Result<Response, ContractError> {
    execute(
        deps,
        env,
        message_info(sender, &[]),
        ExecuteMsg::Dispute {
            beacon_index: slot as u8,
            request: data.clone(),
            proof,
        },
    )
}

pub fn complete_as(
    deps: DepsMut,
    env: Env,
    data: &RequestData,
    sender: &Addr,
) -> Result<Response, ContractError> {
    execute(
        deps,
        env,
        message_info(sender, &[]),
        ExecuteMsg::CompleteOptimistic {
            request: data.clone(),
        },
    )
}
