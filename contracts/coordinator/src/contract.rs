use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Reply, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::dispute;
use crate::error::ContractError;
use crate::fees;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, SubmitParams};
use crate::query;
use crate::registry;
use crate::renewal;
use crate::request;
use crate::state::{Config, BEACON_COUNT, CONFIG, REQUEST_COUNT};
use crate::submit::{self, CALLBACK_REPLY_ID};

const CONTRACT_NAME: &str = "crates.io:randbeacon-coordinator";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        owner: info.sender.clone(),
        sequencer: deps.api.addr_validate(&msg.sequencer)?,
        treasury: deps.api.addr_validate(&msg.treasury)?,
        vrf_verifier: deps.api.addr_validate(&msg.vrf_verifier)?,
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
    };
    validate_config(&config)?;

    CONFIG.save(deps.storage, &config)?;
    BEACON_COUNT.save(deps.storage, &0u32)?;
    REQUEST_COUNT.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "randbeacon-coordinator")
        .add_attribute("owner", info.sender.to_string())
        .add_attribute("sequencer", config.sequencer.to_string())
        .add_attribute("denom", config.denom))
}

fn validate_config(config: &Config) -> Result<(), ContractError> {
    if config.denom.is_empty() {
        return Err(ContractError::InvalidConfig {
            reason: "denom must not be empty".to_string(),
        });
    }
    if config.min_confirmations > config.max_confirmations {
        return Err(ContractError::InvalidConfig {
            reason: "min_confirmations exceeds max_confirmations".to_string(),
        });
    }
    if config.expiration.is_zero() {
        return Err(ContractError::InvalidConfig {
            reason: "expiration must be non-zero".to_string(),
        });
    }
    if config.max_strikes == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "max_strikes must be non-zero".to_string(),
        });
    }
    if config.max_callback_gas_limit == 0 {
        return Err(ContractError::InvalidConfig {
            reason: "max_callback_gas_limit must be non-zero".to_string(),
        });
    }
    Ok(())
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::StakeBeacon { beacon } => registry::stake_beacon(deps, info, beacon),
        ExecuteMsg::UnstakeBeacon { amount } => {
            registry::unstake_beacon(deps, env, info, amount)
        }
        ExecuteMsg::RegisterBeacon {
            beacon,
            vrf_public_key,
            signer_pubkey,
        } => registry::register_beacon(deps, info, beacon, vrf_public_key, signer_pubkey),
        ExecuteMsg::UnregisterBeacon { beacon } => {
            registry::unregister_beacon(deps, env, info, beacon)
        }
        ExecuteMsg::Deposit { client } => fees::deposit(deps, info, client),
        ExecuteMsg::Withdraw { amount } => fees::withdraw(deps, env, info, amount),
        ExecuteMsg::Request {
            callback_gas_limit,
            min_confirmations,
            optimistic,
        } => request::request_randomness(
            deps,
            env,
            info,
            callback_gas_limit,
            min_confirmations,
            optimistic,
        ),
        ExecuteMsg::SubmitRandom {
            beacon_index,
            request,
            proof,
            params,
            signature,
        } => submit::submit_random(
            deps,
            env,
            info,
            SubmitParams {
                beacon_index,
                request,
                proof,
                params: Some(params),
                signature,
            },
        ),
        ExecuteMsg::SubmitOptimistic {
            beacon_index,
            request,
            proof,
            signature,
        } => submit::submit_random(
            deps,
            env,
            info,
            SubmitParams {
                beacon_index,
                request,
                proof,
                params: None,
                signature,
            },
        ),
        ExecuteMsg::Renew { request } => renewal::renew_request(deps, env, info, request),
        ExecuteMsg::Dispute {
            beacon_index,
            request,
            proof,
        } => dispute::dispute(deps, env, info, beacon_index, request, proof),
        ExecuteMsg::CompleteOptimistic { request } => {
            dispute::complete_optimistic(deps, env, info, request)
        }
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Beacon { address } => query::query_beacon(deps, address),
        QueryMsg::Beacons { start_after, limit } => {
            query::query_beacons(deps, start_after, limit)
        }
        QueryMsg::BeaconCount {} => query::query_beacon_count(deps),
        QueryMsg::ClientAccount { address } => query::query_client_account(deps, address),
        QueryMsg::Request { id } => query::query_request(deps, id),
        QueryMsg::Result { id } => query::query_result(deps, id),
        QueryMsg::Requests { start_after, limit } => {
            query::query_requests(deps, start_after, limit)
        }
    }
}

#[entry_point]
pub fn reply(_deps: DepsMut, _env: Env, msg: Reply) -> Result<Response, ContractError> {
    match msg.id {
        CALLBACK_REPLY_ID => submit::handle_callback_reply(msg),
        id => Err(ContractError::UnknownReplyId { id }),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
