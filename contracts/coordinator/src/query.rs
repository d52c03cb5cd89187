use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdError, StdResult};
use cw_storage_plus::Bound;

use crate::msg::{BeaconsResponse, RequestsResponse, ResultResponse};
use crate::state::{
    Beacon, BEACONS, BEACON_ADDRESSES, BEACON_COUNT, CLIENT_ACCOUNTS, CONFIG, REQUESTS,
};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_beacon(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let beacon = BEACONS.load(deps.storage, &addr)?;
    to_json_binary(&beacon)
}

/// Registered beacons in registry-index order.
pub fn query_beacons(
    deps: Deps,
    start_after: Option<u32>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let beacons = BEACON_ADDRESSES
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|entry| {
            let (_, addr) = entry?;
            BEACONS.load(deps.storage, &addr)
        })
        .collect::<StdResult<Vec<Beacon>>>()?;

    to_json_binary(&BeaconsResponse { beacons })
}

pub fn query_beacon_count(deps: Deps) -> StdResult<Binary> {
    let count = BEACON_COUNT.may_load(deps.storage)?.unwrap_or_default();
    to_json_binary(&count)
}

pub fn query_client_account(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let account = CLIENT_ACCOUNTS
        .may_load(deps.storage, &addr)?
        .unwrap_or_default();
    to_json_binary(&account)
}

pub fn query_request(deps: Deps, id: u64) -> StdResult<Binary> {
    let request = REQUESTS
        .may_load(deps.storage, id)?
        .ok_or_else(|| StdError::not_found(format!("request {id}")))?;
    to_json_binary(&request)
}

pub fn query_result(deps: Deps, id: u64) -> StdResult<Binary> {
    let request = REQUESTS
        .may_load(deps.storage, id)?
        .ok_or_else(|| StdError::not_found(format!("request {id}")))?;
    to_json_binary(&ResultResponse {
        id,
        status: request.status,
        result: request.result,
    })
}

pub fn query_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(20).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let requests = REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|entry| entry.map(|(_, request)| request))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&RequestsResponse { requests })
}
