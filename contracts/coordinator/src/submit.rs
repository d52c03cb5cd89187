use cosmwasm_std::{
    from_json, to_json_binary, to_json_string, DepsMut, Env, Event, HexBinary, MessageInfo, Reply,
    Response, Storage, SubMsg, SubMsgResult, WasmMsg,
};
use randbeacon_common::{
    hash_of, keccak_concat, proof_digest, ClientCallbackMsg, RequestStatus, VrfContract,
    VrfVerifier, BEACONS_PER_REQUEST,
};

use crate::error::ContractError;
use crate::fees::{charge, release_reservation};
use crate::msg::SubmitParams;
use crate::registry::{add_pending, release_pending};
use crate::selection::{block_entropy, select_final};
use crate::sequencer::{relay_digest, verify_relay};
use crate::state::{load_beacon, load_request, Request, BEACONS, CONFIG, REQUESTS};
use crate::windows::{Access, BlockPoint, Role, WindowTable};

/// Reply id of the client callback submessage.
pub const CALLBACK_REPLY_ID: u64 = 1;

/// Accept a beacon's proof for the slot the request is waiting on.
pub fn submit_random(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    submission: SubmitParams,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let SubmitParams {
        beacon_index,
        request: data,
        proof,
        params,
        signature,
    } = submission;
    let id = data.id;
    let slot = usize::from(beacon_index);
    // Verified submissions carry fast-verify params, optimistic ones do not.
    let optimistic = params.is_none();

    let mut request = load_request(deps.storage, id)?;
    let expected = request
        .status
        .awaiting_slot()
        .ok_or(ContractError::RequestNotPending { id })?;
    if slot != expected {
        return Err(ContractError::UnexpectedSlot {
            expected,
            got: slot,
        });
    }
    if request.data.optimistic != optimistic {
        return Err(ContractError::WrongSubmissionMode {
            optimistic: request.data.optimistic,
        });
    }
    request.check_commitment(&data)?;

    let beacon = request
        .data
        .beacon(slot)
        .cloned()
        .ok_or(ContractError::UnexpectedSlot {
            expected,
            got: slot,
        })?;

    // ── Authorization and confirmations ──
    let now = BlockPoint::now(&env);
    let confirmed_at = BlockPoint {
        height: request.data.height + request.data.min_confirmations,
        time: request.data.timestamp,
    };
    let relay_at = confirmed_at.max_each(&request.last_activity.plus(config.sequencer_grace));
    let access = WindowTable::new(&config.sequencer)
        .open(Role::Account(beacon.clone()), confirmed_at, None)
        .open(Role::Sequencer, relay_at, None)
        .evaluate(&now, &info.sender);
    match access {
        Access::Granted => {}
        Access::NotYet { opens_at } if info.sender == beacon => {
            return Err(ContractError::MinHeightNotYetReached {
                current: now.height,
                required: opens_at.height,
            })
        }
        Access::NotYet { opens_at } => {
            return Err(ContractError::SequencerSubmissionTooEarly {
                current: now.height,
                allowed_from: opens_at.height,
            })
        }
        Access::Denied => return Err(ContractError::SenderNotBeaconOrSequencer),
    }

    let mut beacon_record = load_beacon(deps.storage, &beacon)?;
    let relayed = info.sender != beacon;
    if relayed {
        let digest = relay_digest(
            &env.contract.address,
            &request.data,
            slot,
            &proof,
            params.as_ref(),
            &env.block.chain_id,
        );
        verify_relay(deps.api, &digest, signature.as_ref(), &beacon_record)?;
    }

    // ── Verification ──
    if let Some(params) = &params {
        let public_key = beacon_record
            .vrf_public_key
            .as_ref()
            .ok_or_else(|| ContractError::BeaconNotFound {
                address: beacon.to_string(),
            })?;
        let verifier = VrfContract::new(deps.querier, &config.vrf_verifier);
        if !verifier.fast_verify(public_key, &proof, request.data.seed.as_slice(), params)? {
            return Err(ContractError::InvalidVrfProof);
        }
    }

    let vrf_hash = HexBinary::from(hash_of(&proof));
    request.vrf_hashes[slot] = Some(vrf_hash.clone());
    if optimistic {
        request.proof_hashes[slot] = Some(HexBinary::from(proof_digest(&proof)));
    }

    // ── Beacon bookkeeping (saved before any credit touches the record) ──
    if beacon_record.consecutive_submissions + 1 > config.max_consecutive_submissions {
        beacon_record.strikes = 0;
        beacon_record.consecutive_submissions = 0;
    } else {
        beacon_record.consecutive_submissions += 1;
    }
    if !optimistic {
        beacon_record.pending = beacon_record.pending.saturating_sub(1);
    }
    BEACONS.save(deps.storage, &beacon, &beacon_record)?;

    // ── Fees ──
    let submit_cost = config.gas_cost(config.gas.submit);
    let beacon_fee = request.data.beacon_fee;
    let mut events = if relayed {
        let mut events = charge(deps.storage, &config, &mut request, &info.sender, submit_cost)?;
        events.extend(charge(
            deps.storage,
            &config,
            &mut request,
            &beacon,
            beacon_fee,
        )?);
        events
    } else {
        charge(
            deps.storage,
            &config,
            &mut request,
            &beacon,
            submit_cost + beacon_fee,
        )?
    };

    let mut response = Response::new()
        .add_attribute("action", if optimistic { "submit_optimistic" } else { "submit_random" })
        .add_attribute("id", id.to_string())
        .add_attribute("beacon", beacon.to_string())
        .add_attribute("slot", slot.to_string())
        .add_attribute("relayed", relayed.to_string());

    if optimistic {
        response = response.add_event(
            Event::new("randbeacon_submit_optimistic")
                .add_attribute("id", id.to_string())
                .add_attribute("beacon", beacon.to_string())
                .add_attribute("proof", to_json_string(&proof)?),
        );
    } else {
        response = response.add_event(
            Event::new("randbeacon_submit_random")
                .add_attribute("id", id.to_string())
                .add_attribute("beacon", beacon.to_string())
                .add_attribute("vrf_hash", vrf_hash.to_hex()),
        );
    }

    // ── Transition ──
    let mut callback = None;
    match slot {
        0 => request.status = RequestStatus::AwaitingSecond,
        1 => {
            let h0 = request.vrf_hashes[0].clone().unwrap_or_default();
            let excluded: Vec<_> = request.data.beacons.iter().flatten().cloned().collect();
            let entropy = block_entropy(&env);
            let chosen = select_final(deps.storage, &h0, &vrf_hash, &entropy, &excluded)?;
            add_pending(deps.storage, &chosen)?;
            request.data.beacons[2] = Some(chosen.clone());
            request.status = RequestStatus::AwaitingFinal;
            response = response.add_event(
                Event::new("randbeacon_request_beacon")
                    .add_attribute("id", id.to_string())
                    .add_attribute("beacon", chosen.to_string())
                    .add_attribute("seed", request.data.seed.to_hex())
                    .add_attribute("timestamp", request.data.timestamp.to_string())
                    .add_attribute("height", request.data.height.to_string()),
            );
        }
        _ if optimistic => {
            request.status = RequestStatus::Committed;
            request.dispute_window_start = Some(now);
        }
        _ => {
            let finalize_cost =
                config.gas_cost(config.gas.finalize + request.data.callback_gas_limit);
            events.extend(charge(
                deps.storage,
                &config,
                &mut request,
                &info.sender,
                finalize_cost,
            )?);
            callback = Some(finalize(deps.storage, &mut request, RequestStatus::Fulfilled)?);
        }
    }

    request.last_activity = now;
    request.recommit();
    REQUESTS.save(deps.storage, id, &request)?;

    response = response.add_events(events);
    if let Some(callback) = callback {
        response = response.add_submessage(callback);
    }
    Ok(response)
}

/// Compute the result, release the reservation and build the client callback.
///
/// The caller saves `request` before the callback runs.
pub(crate) fn finalize(
    storage: &mut dyn Storage,
    request: &mut Request,
    status: RequestStatus,
) -> Result<SubMsg, ContractError> {
    let mut hashes: Vec<&[u8]> = Vec::with_capacity(BEACONS_PER_REQUEST);
    for (slot, hash) in request.vrf_hashes.iter().enumerate() {
        let hash = hash.as_ref().ok_or(ContractError::UnexpectedSlot {
            expected: slot,
            got: BEACONS_PER_REQUEST,
        })?;
        hashes.push(hash.as_slice());
    }
    let randomness = HexBinary::from(keccak_concat(&hashes));

    request.result = Some(randomness.clone());
    request.status = status;
    release_reservation(storage, request)?;

    let id = request.data.id;
    let msg = WasmMsg::Execute {
        contract_addr: request.data.client.to_string(),
        msg: to_json_binary(&ClientCallbackMsg::RandomnessCallback { id, randomness })?,
        funds: vec![],
    };
    Ok(SubMsg::reply_on_error(msg, CALLBACK_REPLY_ID)
        .with_gas_limit(request.data.callback_gas_limit)
        .with_payload(to_json_binary(&id)?))
}

/// Release `pending` on every beacon assigned to the request.
pub(crate) fn release_all_pending(
    storage: &mut dyn Storage,
    request: &Request,
) -> Result<(), ContractError> {
    for beacon in request.data.beacons.iter().flatten() {
        release_pending(storage, beacon)?;
    }
    Ok(())
}

/// A failed client callback never reverts finalization; it is reported.
pub fn handle_callback_reply(msg: Reply) -> Result<Response, ContractError> {
    let id: u64 = from_json(&msg.payload)?;
    match msg.result {
        SubMsgResult::Err(error) => Ok(Response::new()
            .add_attribute("action", "callback_failed")
            .add_attribute("id", id.to_string())
            .add_event(
                Event::new("randbeacon_callback_failed")
                    .add_attribute("id", id.to_string())
                    .add_attribute("error", error),
            )),
        SubMsgResult::Ok(_) => Ok(Response::new()),
    }
}
