use cosmwasm_std::{
    to_json_string, Addr, DepsMut, Env, Event, MessageInfo, Response, Uint128,
};
use randbeacon_common::{keccak_concat, RequestData, BEACONS_PER_REQUEST};

use crate::error::ContractError;
use crate::fees::{bank_send, credit, credit_client};
use crate::registry::{add_pending, remove_from_registry, unregister_event};
use crate::selection::{block_entropy, pick};
use crate::state::{load_beacon, load_committed_request, BEACONS, CONFIG, REQUESTS};
use crate::windows::{Access, BlockPoint, Role, Span, WindowTable};

/// Split a removed beacon's collateral between the renewer and the client.
///
/// Returns `(to_renewer, to_client)`.
pub(crate) fn split_collateral(
    collateral: Uint128,
    renewer_owed: Uint128,
    client_owed: Uint128,
) -> (Uint128, Uint128) {
    if collateral.is_zero() {
        (Uint128::zero(), Uint128::zero())
    } else if collateral >= renewer_owed + client_owed {
        (renewer_owed, client_owed)
    } else if collateral <= renewer_owed {
        (collateral, Uint128::zero())
    } else {
        (renewer_owed, collateral - renewer_owed)
    }
}

/// Re-assign the silent beacons of an expired request, striking them.
pub fn renew_request(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    data: RequestData,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let id = data.id;
    let mut request = load_committed_request(deps.storage, &data)?;
    let now = BlockPoint::now(&env);

    let Some(first_silent) = request.status.awaiting_slot() else {
        if request.in_dispute_window(&config, &now) {
            return Err(ContractError::CantRenewDuringDisputeWindow { id });
        }
        return Err(ContractError::RequestNotPending { id });
    };

    // ── Renewal phases ──
    let origin = BlockPoint {
        height: request.data.height,
        time: request.data.timestamp,
    };
    let expiry = Span::new(request.data.expiration_blocks, request.data.expiration_seconds);
    let first_beacon = request
        .data
        .beacon(0)
        .cloned()
        .ok_or(ContractError::RequestNotPending { id })?;
    let access = WindowTable::new(&config.sequencer)
        .open(
            Role::Account(first_beacon),
            origin.plus(expiry),
            Some(origin.plus(expiry.scaled(3, 2))),
        )
        .open(
            Role::Sequencer,
            origin.plus(expiry.scaled(3, 2)),
            Some(origin.plus(expiry.scaled(2, 1))),
        )
        .open(Role::Anyone, origin.plus(expiry.scaled(2, 1)), None)
        .evaluate(&now, &info.sender);
    if access != Access::Granted {
        return Err(ContractError::NotYetRenewable { id });
    }

    // ── Strikes and collateral ──
    let silent: Vec<usize> = (first_silent..BEACONS_PER_REQUEST)
        .filter(|slot| request.data.beacon(*slot).is_some() && !request.has_submitted(*slot))
        .collect();

    let mut renewer_owed = config.gas_cost(config.gas.renew);
    let client_owed = config.gas_cost(config.gas.submit) + request.data.beacon_fee;
    let mut to_renewer = Uint128::zero();
    let mut to_client = Uint128::zero();
    let mut events = vec![];
    let mut messages = vec![];

    for slot in &silent {
        let address = request.data.beacons[*slot]
            .clone()
            .ok_or(ContractError::RequestNotPending { id })?;
        let mut beacon = load_beacon(deps.storage, &address)?;
        beacon.strikes += 1;
        beacon.consecutive_submissions = 0;
        beacon.pending = beacon.pending.saturating_sub(1);
        events.push(
            Event::new("randbeacon_strike_beacon")
                .add_attribute("beacon", address.to_string())
                .add_attribute("id", id.to_string())
                .add_attribute("strikes", beacon.strikes.to_string()),
        );

        let over_limit = beacon.strikes > config.max_strikes || beacon.staked < config.min_stake;
        if !(beacon.is_registered() && over_limit) {
            BEACONS.save(deps.storage, &address, &beacon)?;
            continue;
        }

        remove_from_registry(deps.storage, &mut beacon)?;
        let collateral = beacon.staked;
        beacon.staked = Uint128::zero();
        BEACONS.save(deps.storage, &address, &beacon)?;

        // A beacon renewing its own request earns nothing from its own collateral.
        let owed = if address == info.sender {
            Uint128::zero()
        } else {
            renewer_owed
        };
        let (renewer_share, client_share) = split_collateral(collateral, owed, client_owed);
        renewer_owed -= renewer_share;
        to_renewer += renewer_share;
        to_client += client_share;
        credit(deps.storage, &info.sender, renewer_share)?;
        credit_client(deps.storage, &request.data.client, client_share)?;

        let leftover = collateral - renewer_share - client_share;
        if !leftover.is_zero() {
            messages.push(bank_send(deps.querier, &env, &config, &address, leftover)?);
        }
        events.push(unregister_event(&address, "strikes", leftover));
    }

    // ── Replacement ──
    let mut excluded: Vec<Addr> = request.data.beacons.iter().flatten().cloned().collect();
    let entropy = block_entropy(&env);
    let base_seed = keccak_concat(&[
        request.data.seed.as_slice(),
        &entropy,
        &request.renewals.to_be_bytes(),
    ]);
    for slot in &silent {
        let replacement = pick(
            deps.storage,
            keccak_concat(&[&base_seed, &[*slot as u8]]),
            &excluded,
        )?;
        add_pending(deps.storage, &replacement)?;
        excluded.push(replacement.clone());
        request.data.beacons[*slot] = Some(replacement);
    }

    request.data.height = now.height;
    request.data.timestamp = now.time;
    request.last_activity = now;
    request.renewals += 1;
    request.recommit();
    REQUESTS.save(deps.storage, id, &request)?;

    Ok(Response::new()
        .add_attribute("action", "renew")
        .add_attribute("id", id.to_string())
        .add_attribute("renewer", info.sender.to_string())
        .add_attribute("struck", silent.len().to_string())
        .add_events(events)
        .add_event(
            Event::new("randbeacon_retry")
                .add_attribute("id", id.to_string())
                .add_attribute("request", to_json_string(&request.data)?)
                .add_attribute("to_renewer", to_renewer.to_string())
                .add_attribute("to_client", to_client.to_string()),
        )
        .add_messages(messages))
}
