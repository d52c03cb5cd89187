use cosmwasm_std::{to_json_string, DepsMut, Env, Event, HexBinary, MessageInfo, Response};
use randbeacon_common::{RequestData, BEACONS_PER_REQUEST};

use crate::error::ContractError;
use crate::fees::{reservation, reserve};
use crate::registry::{add_pending, registered_count};
use crate::selection::{request_seed, select_initial_pair};
use crate::state::{Request, CONFIG, REQUESTS, REQUEST_COUNT};
use crate::windows::BlockPoint;

/// Open a randomness request for the sender.
pub fn request_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    callback_gas_limit: u64,
    min_confirmations: u64,
    optimistic: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if min_confirmations < config.min_confirmations || min_confirmations > config.max_confirmations
    {
        return Err(ContractError::ConfirmationsOOB {
            requested: min_confirmations,
            min: config.min_confirmations,
            max: config.max_confirmations,
        });
    }
    if callback_gas_limit == 0 || callback_gas_limit > config.max_callback_gas_limit {
        return Err(ContractError::CallbackGasLimitOOB {
            requested: callback_gas_limit,
            max: config.max_callback_gas_limit,
        });
    }

    // Finishing needs three distinct beacons, not just the initial pair.
    let available = registered_count(deps.storage)?;
    let required = BEACONS_PER_REQUEST as u32;
    if available < required {
        return Err(ContractError::NotEnoughBeaconsAvailable {
            available,
            required,
        });
    }

    let client = info.sender;
    let reserved = reservation(&config, callback_gas_limit, optimistic);
    reserve(deps.storage, &client, reserved)?;

    let id = REQUEST_COUNT.may_load(deps.storage)?.unwrap_or_default() + 1;
    REQUEST_COUNT.save(deps.storage, &id)?;

    let seed = request_seed(&env, &client, id);
    let (first, second) = select_initial_pair(deps.storage, &seed, &[])?;
    add_pending(deps.storage, &first)?;
    add_pending(deps.storage, &second)?;

    let data = RequestData {
        id,
        client: client.clone(),
        beacons: [Some(first), Some(second), None],
        seed: HexBinary::from(seed),
        reserved,
        beacon_fee: config.beacon_fee,
        height: env.block.height,
        timestamp: env.block.time.seconds(),
        expiration_blocks: config.expiration.blocks,
        expiration_seconds: config.expiration.seconds,
        callback_gas_limit,
        min_confirmations,
        optimistic,
    };
    let request = Request::new(data, BlockPoint::now(&env));
    REQUESTS.save(deps.storage, id, &request)?;

    Ok(Response::new()
        .add_attribute("action", "request")
        .add_attribute("id", id.to_string())
        .add_attribute("client", client.to_string())
        .add_event(
            Event::new("randbeacon_request")
                .add_attribute("id", id.to_string())
                .add_attribute("request", to_json_string(&request.data)?),
        ))
}
