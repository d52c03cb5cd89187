use cosmwasm_std::{DepsMut, Env, Event, MessageInfo, Response, Uint128};
use randbeacon_common::{proof_digest, RequestData, RequestStatus, VrfContract, VrfProof, VrfVerifier};

use crate::error::ContractError;
use crate::fees::{charge, credit, credit_client, release_reservation};
use crate::registry::{remove_from_registry, unregister_event};
use crate::state::{load_beacon, load_committed_request, BEACONS, CONFIG, REQUESTS};
use crate::submit::{finalize, release_all_pending};
use crate::windows::{Access, BlockPoint, Role, WindowTable};

/// Split a slashed stake: the disputer is reimbursed first, the rest is
/// halved with the floor half going to the client.
///
/// Returns `(to_disputer, to_client)`; the two always sum to `stake`.
pub(crate) fn split_slash(stake: Uint128, dispute_cost: Uint128) -> (Uint128, Uint128) {
    let reimbursed = stake.min(dispute_cost);
    let to_client = (stake - reimbursed).multiply_ratio(1u128, 2u128);
    (stake - to_client, to_client)
}

/// Prove an optimistic commitment fraudulent and slash its beacon.
pub fn dispute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    beacon_index: u8,
    data: RequestData,
    proof: VrfProof,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let id = data.id;
    let slot = usize::from(beacon_index);
    let mut request = load_committed_request(deps.storage, &data)?;
    let now = BlockPoint::now(&env);

    let committed = request
        .proof_hashes
        .get(slot)
        .cloned()
        .flatten()
        .ok_or(ContractError::NotDisputable { id, slot })?;

    match request.status {
        RequestStatus::AwaitingFirst
        | RequestStatus::AwaitingSecond
        | RequestStatus::AwaitingFinal => {}
        RequestStatus::Committed if request.in_dispute_window(&config, &now) => {}
        RequestStatus::Disputed => return Err(ContractError::RequestNotPending { id }),
        _ => return Err(ContractError::DisputeWindowClosed { id }),
    }

    if committed.as_slice() != proof_digest(&proof).as_slice() {
        return Err(ContractError::ProofMismatch);
    }

    let address = request
        .data
        .beacon(slot)
        .cloned()
        .ok_or(ContractError::NotDisputable { id, slot })?;
    if info.sender == address {
        return Err(ContractError::Unauthorized {
            reason: "a beacon cannot dispute its own proof".to_string(),
        });
    }
    let mut beacon = load_beacon(deps.storage, &address)?;
    let public_key = beacon
        .vrf_public_key
        .clone()
        .ok_or_else(|| ContractError::BeaconNotFound {
            address: address.to_string(),
        })?;

    let verifier = VrfContract::new(deps.querier, &config.vrf_verifier);
    if verifier.verify(&public_key, &proof, request.data.seed.as_slice())? {
        return Err(ContractError::ProofNotInvalid);
    }

    // ── Slash ──
    let stake = beacon.staked;
    let (to_disputer, to_client) = split_slash(stake, config.gas_cost(config.gas.dispute));
    beacon.staked = Uint128::zero();
    remove_from_registry(deps.storage, &mut beacon)?;
    BEACONS.save(deps.storage, &address, &beacon)?;
    credit(deps.storage, &info.sender, to_disputer)?;
    credit_client(deps.storage, &request.data.client, to_client)?;

    // ── Terminate the request ──
    request.status = RequestStatus::Disputed;
    request.last_activity = now;
    release_reservation(deps.storage, &mut request)?;
    release_all_pending(deps.storage, &request)?;
    REQUESTS.save(deps.storage, id, &request)?;

    Ok(Response::new()
        .add_attribute("action", "dispute")
        .add_attribute("id", id.to_string())
        .add_attribute("beacon", address.to_string())
        .add_attribute("disputer", info.sender.to_string())
        .add_event(
            Event::new("randbeacon_dispute")
                .add_attribute("id", id.to_string())
                .add_attribute("beacon", address.to_string())
                .add_attribute("to_disputer", to_disputer.to_string())
                .add_attribute("to_client", to_client.to_string()),
        )
        .add_event(unregister_event(&address, "fraud", Uint128::zero())))
}

/// Finalize a committed optimistic request once its dispute window passed.
///
/// Completion rights open in phases after the window: the three request
/// beacons in slot order, then the sequencer, then anyone.
pub fn complete_optimistic(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    data: RequestData,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let id = data.id;
    let mut request = load_committed_request(deps.storage, &data)?;

    let window_start = match (&request.status, request.dispute_window_start) {
        (RequestStatus::Committed, Some(start)) => start,
        _ => return Err(ContractError::NotCompleteable { id }),
    };

    let now = BlockPoint::now(&env);
    let step = config.completion_phase;
    let base = window_start.plus(config.dispute_window);
    let mut table = WindowTable::new(&config.sequencer);
    let mut opens = base;
    for beacon in request.data.beacons.iter().flatten() {
        table = table.open(Role::Account(beacon.clone()), opens, None);
        opens = opens.plus(step);
    }
    let table = table
        .open(Role::Sequencer, opens, None)
        .open(Role::Anyone, opens.plus(step), None);
    if table.evaluate(&now, &info.sender) != Access::Granted {
        return Err(ContractError::NotYetCompletableBySender { id });
    }

    let mut events = charge(
        deps.storage,
        &config,
        &mut request,
        &info.sender,
        config.gas_cost(config.gas.complete),
    )?;
    let callback = finalize(deps.storage, &mut request, RequestStatus::Completed)?;
    release_all_pending(deps.storage, &request)?;
    request.last_activity = now;
    REQUESTS.save(deps.storage, id, &request)?;

    events.push(
        Event::new("randbeacon_complete")
            .add_attribute("id", id.to_string())
            .add_attribute("completer", info.sender.to_string())
            .add_attribute(
                "result",
                request.result.as_ref().map(|r| r.to_hex()).unwrap_or_default(),
            ),
    );

    Ok(Response::new()
        .add_attribute("action", "complete_optimistic")
        .add_attribute("id", id.to_string())
        .add_events(events)
        .add_submessage(callback))
}
