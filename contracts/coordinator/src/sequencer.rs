//! Sequencer relay: the sequencer may submit on a beacon's behalf when it
//! carries a signature by the beacon's registered signer key.

use cosmwasm_std::{Addr, Api};
use randbeacon_common::{FastVerifyParams, RequestData, VrfProof};
use sha2::{Digest, Sha256};

use crate::error::ContractError;
use crate::msg::RelaySignature;
use crate::state::Beacon;

const RELAY_DOMAIN: &[u8] = b"randbeacon.relay.v1";

fn update_prefixed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
}

/// Digest a beacon signs to authorize a relayed submission.
pub fn relay_digest(
    contract: &Addr,
    data: &RequestData,
    slot: usize,
    proof: &VrfProof,
    params: Option<&FastVerifyParams>,
    chain_id: &str,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(RELAY_DOMAIN);
    update_prefixed(&mut hasher, contract.as_bytes());
    update_prefixed(&mut hasher, data.client.as_bytes());
    update_prefixed(&mut hasher, data.seed.as_slice());
    hasher.update(data.id.to_be_bytes());
    hasher.update([slot as u8]);
    update_prefixed(&mut hasher, &proof.to_bytes());
    match params {
        Some(params) => update_prefixed(&mut hasher, &params.to_bytes()),
        None => update_prefixed(&mut hasher, &[]),
    }
    update_prefixed(&mut hasher, chain_id.as_bytes());
    hasher.finalize().into()
}

/// Check that `signature` recovers to the beacon's signer key.
pub fn verify_relay(
    api: &dyn Api,
    digest: &[u8; 32],
    signature: Option<&RelaySignature>,
    beacon: &Beacon,
) -> Result<(), ContractError> {
    let signature = signature.ok_or_else(|| ContractError::Unauthorized {
        reason: "relayed submission requires a beacon signature".to_string(),
    })?;
    let expected = beacon
        .signer_pubkey
        .as_ref()
        .ok_or_else(|| ContractError::Unauthorized {
            reason: format!("beacon {} has no signer key", beacon.address),
        })?;

    let recovered = api
        .secp256k1_recover_pubkey(digest, signature.signature.as_slice(), signature.recovery_param)
        .map_err(|err| ContractError::Unauthorized {
            reason: format!("invalid relay signature: {err}"),
        })?;

    if recovered.as_slice() != expected.as_slice() {
        return Err(ContractError::Unauthorized {
            reason: "relay signature is not from the slot beacon".to_string(),
        });
    }
    Ok(())
}
