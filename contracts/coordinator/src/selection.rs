//! Pseudo-random beacon assignment.
//!
//! Every pick reduces a 256-bit hash modulo the registry size. An excluded
//! hit rerolls with `keccak256(h)`; after `n` misses a linear scan from the
//! last index guarantees termination.

use cosmwasm_std::{Addr, Env, Storage};
use randbeacon_common::{keccak256, keccak_concat};

use crate::error::ContractError;
use crate::registry::{beacon_at, registered_count};
use crate::state::BEACONS;

/// Per-block entropy: height, time, chain id and transaction index.
pub fn block_entropy(env: &Env) -> [u8; 32] {
    let tx_index = env.transaction.as_ref().map(|tx| tx.index).unwrap_or_default();
    keccak_concat(&[
        &env.block.height.to_be_bytes(),
        &env.block.time.nanos().to_be_bytes(),
        env.block.chain_id.as_bytes(),
        &tx_index.to_be_bytes(),
    ])
}

/// Seed of a new request; also the VRF message every beacon proves over.
pub fn request_seed(env: &Env, client: &Addr, id: u64) -> [u8; 32] {
    keccak_concat(&[
        env.contract.address.as_bytes(),
        client.as_bytes(),
        &id.to_be_bytes(),
        &block_entropy(env),
    ])
}

/// `U256(hash) mod n`, big-endian, without leaving u64.
fn index_from_hash(hash: &[u8; 32], n: u32) -> u32 {
    let n = u64::from(n);
    hash.iter()
        .fold(0u64, |acc, byte| (acc * 256 + u64::from(*byte)) % n) as u32
}

/// Registered beacons not in `excluded`.
fn eligible_count(storage: &dyn Storage, n: u32, excluded: &[Addr]) -> Result<u32, ContractError> {
    let mut excluded_registered = 0u32;
    for (i, addr) in excluded.iter().enumerate() {
        if excluded[..i].contains(addr) {
            continue;
        }
        if let Some(beacon) = BEACONS.may_load(storage, addr)? {
            if beacon.is_registered() {
                excluded_registered += 1;
            }
        }
    }
    Ok(n.saturating_sub(excluded_registered))
}

/// Pick one registered beacon outside `excluded`.
pub fn pick(storage: &dyn Storage, seed: [u8; 32], excluded: &[Addr]) -> Result<Addr, ContractError> {
    let n = registered_count(storage)?;
    let available = eligible_count(storage, n, excluded)?;
    if available == 0 {
        return Err(ContractError::NotEnoughBeaconsAvailable {
            available,
            required: 1,
        });
    }

    let mut hash = seed;
    let mut index = 0;
    for _ in 0..n {
        index = index_from_hash(&hash, n);
        let candidate = beacon_at(storage, index)?;
        if !excluded.contains(&candidate) {
            return Ok(candidate);
        }
        hash = keccak256(&hash);
    }

    for step in 1..=n {
        let candidate = beacon_at(storage, (index + step) % n)?;
        if !excluded.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ContractError::NotEnoughBeaconsAvailable {
        available: 0,
        required: 1,
    })
}

/// The two beacons fixed at request time.
pub fn select_initial_pair(
    storage: &dyn Storage,
    seed: &[u8],
    excluded: &[Addr],
) -> Result<(Addr, Addr), ContractError> {
    let n = registered_count(storage)?;
    let available = eligible_count(storage, n, excluded)?;
    if available < 2 {
        return Err(ContractError::NotEnoughBeaconsAvailable {
            available,
            required: 2,
        });
    }

    let first = pick(storage, keccak_concat(&[seed, &[0u8]]), excluded)?;
    let mut excluded = excluded.to_vec();
    excluded.push(first.clone());
    let second = pick(storage, keccak_concat(&[seed, &[1u8]]), &excluded)?;
    Ok((first, second))
}

/// The final beacon, chosen only after the first two VRF outputs exist so
/// that nobody can know it at request time.
pub fn select_final(
    storage: &dyn Storage,
    hash0: &[u8],
    hash1: &[u8],
    entropy: &[u8; 32],
    excluded: &[Addr],
) -> Result<Addr, ContractError> {
    pick(storage, keccak_concat(&[hash0, hash1, entropy]), excluded)
}
