use cosmwasm_std::{
    Addr, DepsMut, Env, Event, HexBinary, MessageInfo, Response, StdError, StdResult, Storage,
    Uint128,
};
use randbeacon_common::VrfPublicKey;

use crate::error::ContractError;
use crate::fees::{bank_send, must_pay};
use crate::state::{load_beacon, Beacon, BEACONS, BEACON_ADDRESSES, BEACON_COUNT, CONFIG};

/// Length of an uncompressed SEC1 secp256k1 public key.
const UNCOMPRESSED_PUBKEY_LEN: usize = 65;

/// Add stake for a beacon, creating its record on first stake.
pub fn stake_beacon(
    deps: DepsMut,
    info: MessageInfo,
    beacon: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let amount = must_pay(&info, &config.denom)?;
    let beacon = deps.api.addr_validate(&beacon)?;

    let mut record = BEACONS
        .may_load(deps.storage, &beacon)?
        .unwrap_or_else(|| Beacon::new(beacon.clone()));
    record.staked += amount;
    BEACONS.save(deps.storage, &beacon, &record)?;

    Ok(Response::new()
        .add_attribute("action", "stake_beacon")
        .add_attribute("beacon", beacon.to_string())
        .add_attribute("amount", amount.to_string())
        .add_attribute("staked", record.staked.to_string()))
}

/// Withdraw stake. Registered beacons must stay at or above the minimum.
pub fn unstake_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut record = load_beacon(deps.storage, &info.sender)?;

    let remaining = record
        .staked
        .checked_sub(amount)
        .map_err(|_| ContractError::BeaconStakeTooLow {
            actual: record.staked,
            required: amount,
        })?;

    if remaining < config.min_stake {
        if record.is_registered() {
            return Err(ContractError::BeaconStakeTooLow {
                actual: remaining,
                required: config.min_stake,
            });
        }
        if record.pending > 0 {
            return Err(ContractError::BeaconHasPending {
                address: record.address.to_string(),
                pending: record.pending,
            });
        }
    }

    record.staked = remaining;
    BEACONS.save(deps.storage, &info.sender, &record)?;

    let send_msg = bank_send(deps.querier, &env, &config, &info.sender, amount)?;

    Ok(Response::new()
        .add_message(send_msg)
        .add_attribute("action", "unstake_beacon")
        .add_attribute("beacon", info.sender.to_string())
        .add_attribute("amount", amount.to_string())
        .add_attribute("staked", remaining.to_string()))
}

/// Append a sufficiently staked beacon to the registry. Owner only.
pub fn register_beacon(
    deps: DepsMut,
    info: MessageInfo,
    beacon: String,
    vrf_public_key: VrfPublicKey,
    signer_pubkey: HexBinary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {
            reason: "only owner can register beacons".to_string(),
        });
    }

    let beacon = deps.api.addr_validate(&beacon)?;
    let mut record = BEACONS
        .may_load(deps.storage, &beacon)?
        .unwrap_or_else(|| Beacon::new(beacon.clone()));
    if record.is_registered() {
        return Err(ContractError::BeaconAlreadyRegistered {
            address: beacon.to_string(),
        });
    }
    if record.staked < config.min_stake {
        return Err(ContractError::BeaconStakeTooLow {
            actual: record.staked,
            required: config.min_stake,
        });
    }
    if signer_pubkey.len() != UNCOMPRESSED_PUBKEY_LEN || signer_pubkey[0] != 0x04 {
        return Err(ContractError::InvalidSignerPubkey {
            len: signer_pubkey.len(),
        });
    }

    let index = BEACON_COUNT.may_load(deps.storage)?.unwrap_or_default();
    BEACON_ADDRESSES.save(deps.storage, index, &beacon)?;
    BEACON_COUNT.save(deps.storage, &(index + 1))?;

    record.index = Some(index);
    record.vrf_public_key = Some(vrf_public_key);
    record.signer_pubkey = Some(signer_pubkey);
    BEACONS.save(deps.storage, &beacon, &record)?;

    Ok(Response::new()
        .add_attribute("action", "register_beacon")
        .add_event(
            Event::new("randbeacon_register_beacon")
                .add_attribute("beacon", beacon.to_string())
                .add_attribute("index", index.to_string())
                .add_attribute("staked", record.staked.to_string()),
        ))
}

/// Voluntary removal. Refunds the whole stake.
pub fn unregister_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    beacon: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let beacon = deps.api.addr_validate(&beacon)?;

    if info.sender != config.owner && info.sender != beacon {
        return Err(ContractError::NotOwnerOrBeacon);
    }

    let mut record = load_beacon(deps.storage, &beacon)?;
    if !record.is_registered() {
        return Err(ContractError::BeaconNotFound {
            address: beacon.to_string(),
        });
    }
    if record.pending > 0 {
        return Err(ContractError::BeaconHasPending {
            address: beacon.to_string(),
            pending: record.pending,
        });
    }

    remove_from_registry(deps.storage, &mut record)?;
    let refund = record.staked;
    record.staked = Uint128::zero();
    BEACONS.save(deps.storage, &beacon, &record)?;

    let mut response = Response::new()
        .add_attribute("action", "unregister_beacon")
        .add_event(unregister_event(&beacon, "voluntary", refund));
    if !refund.is_zero() {
        response = response.add_message(bank_send(deps.querier, &env, &config, &beacon, refund)?);
    }
    Ok(response)
}

// ─── Helpers ───

/// Swap-remove `beacon` from the registry: the tail entry takes its index.
///
/// The caller saves `beacon`; the moved tail beacon is saved here.
pub(crate) fn remove_from_registry(storage: &mut dyn Storage, beacon: &mut Beacon) -> StdResult<()> {
    let Some(index) = beacon.index else {
        return Ok(());
    };
    let count = BEACON_COUNT.load(storage)?;
    let last = count
        .checked_sub(1)
        .ok_or_else(|| StdError::generic_err("registry is empty"))?;

    if index != last {
        let moved = BEACON_ADDRESSES.load(storage, last)?;
        BEACON_ADDRESSES.save(storage, index, &moved)?;
        BEACONS.update(storage, &moved, |record| -> StdResult<_> {
            let mut record = record.ok_or_else(|| StdError::not_found("beacon"))?;
            record.index = Some(index);
            Ok(record)
        })?;
    }
    BEACON_ADDRESSES.remove(storage, last);
    BEACON_COUNT.save(storage, &last)?;

    beacon.index = None;
    Ok(())
}

pub(crate) fn registered_count(storage: &dyn Storage) -> StdResult<u32> {
    Ok(BEACON_COUNT.may_load(storage)?.unwrap_or_default())
}

pub(crate) fn beacon_at(storage: &dyn Storage, index: u32) -> StdResult<Addr> {
    BEACON_ADDRESSES.load(storage, index)
}

pub(crate) fn unregister_event(beacon: &Addr, reason: &str, amount: Uint128) -> Event {
    Event::new("randbeacon_unregister_beacon")
        .add_attribute("beacon", beacon.to_string())
        .add_attribute("reason", reason)
        .add_attribute("amount", amount.to_string())
}

/// Adjust a beacon's pending count by loading it fresh from storage.
pub(crate) fn add_pending(storage: &mut dyn Storage, beacon: &Addr) -> Result<(), ContractError> {
    let mut record = load_beacon(storage, beacon)?;
    record.pending += 1;
    BEACONS.save(storage, beacon, &record)?;
    Ok(())
}

pub(crate) fn release_pending(storage: &mut dyn Storage, beacon: &Addr) -> Result<(), ContractError> {
    let mut record = load_beacon(storage, beacon)?;
    record.pending = record.pending.saturating_sub(1);
    BEACONS.save(storage, beacon, &record)?;
    Ok(())
}
