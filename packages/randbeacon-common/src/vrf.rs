//! VRF capability consumed by the coordinator.
//!
//! The elliptic-curve VRF itself lives outside this workspace: proofs are
//! produced off-chain by beacon software and verified by a dedicated verifier
//! contract. The coordinator only needs the wire types, the query interface
//! and the commitment hash of a proof.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, HexBinary, QuerierWrapper, StdResult};
use sha3::{Digest, Keccak256};

use crate::hash::update_prefixed;

/// Beacon VRF public key as affine coordinates.
#[cw_serde]
pub struct VrfPublicKey {
    pub x: HexBinary,
    pub y: HexBinary,
}

/// ECVRF proof: gamma point plus the (c, s) Schnorr-style pair.
#[cw_serde]
pub struct VrfProof {
    pub gamma_x: HexBinary,
    pub gamma_y: HexBinary,
    pub c: HexBinary,
    pub s: HexBinary,
}

impl VrfProof {
    /// Canonical byte encoding, used for relay signatures.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for field in [&self.gamma_x, &self.gamma_y, &self.c, &self.s] {
            out.extend_from_slice(&(field.len() as u32).to_be_bytes());
            out.extend_from_slice(field.as_slice());
        }
        out
    }
}

/// Precomputed curve points that let the verifier skip the expensive
/// scalar multiplications (`uPoint` and `vComponents`).
#[cw_serde]
pub struct FastVerifyParams {
    pub u_point: Vec<HexBinary>,
    pub v_components: Vec<HexBinary>,
}

impl FastVerifyParams {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for field in self.u_point.iter().chain(self.v_components.iter()) {
            out.extend_from_slice(&(field.len() as u32).to_be_bytes());
            out.extend_from_slice(field.as_slice());
        }
        out
    }
}

/// Query interface of the external VRF verifier contract.
#[cw_serde]
#[derive(QueryResponses)]
pub enum VrfQueryMsg {
    #[returns(bool)]
    Verify {
        public_key: VrfPublicKey,
        proof: VrfProof,
        message: HexBinary,
    },
    #[returns(FastVerifyParams)]
    ComputeFastVerifyParams {
        public_key: VrfPublicKey,
        proof: VrfProof,
        message: HexBinary,
    },
    #[returns(bool)]
    FastVerify {
        public_key: VrfPublicKey,
        proof: VrfProof,
        message: HexBinary,
        params: FastVerifyParams,
    },
}

/// Commitment of a proof: the VRF output hash, `keccak256(gamma_x || gamma_y)`.
///
/// Anyone can recompute it from a published proof, so an accepted
/// submission's stored commitment must round-trip through this function.
pub fn hash_of(proof: &VrfProof) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(proof.gamma_x.as_slice());
    hasher.update(proof.gamma_y.as_slice());
    hasher.finalize().into()
}

/// Digest of the whole proof. Optimistic submissions store it so a disputer
/// has to present exactly the proof the beacon published.
pub fn proof_digest(proof: &VrfProof) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    update_prefixed(&mut hasher, proof.gamma_x.as_slice());
    update_prefixed(&mut hasher, proof.gamma_y.as_slice());
    update_prefixed(&mut hasher, proof.c.as_slice());
    update_prefixed(&mut hasher, proof.s.as_slice());
    hasher.finalize().into()
}

/// Verification side of the VRF capability.
pub trait VrfVerifier {
    fn verify(&self, public_key: &VrfPublicKey, proof: &VrfProof, message: &[u8])
        -> StdResult<bool>;

    fn compute_fast_verify_params(
        &self,
        public_key: &VrfPublicKey,
        proof: &VrfProof,
        message: &[u8],
    ) -> StdResult<FastVerifyParams>;

    fn fast_verify(
        &self,
        public_key: &VrfPublicKey,
        proof: &VrfProof,
        message: &[u8],
        params: &FastVerifyParams,
    ) -> StdResult<bool>;
}

/// [`VrfVerifier`] backed by smart queries to a verifier contract.
pub struct VrfContract<'a> {
    querier: QuerierWrapper<'a>,
    address: &'a Addr,
}

impl<'a> VrfContract<'a> {
    pub fn new(querier: QuerierWrapper<'a>, address: &'a Addr) -> Self {
        Self { querier, address }
    }
}

impl VrfVerifier for VrfContract<'_> {
    fn verify(
        &self,
        public_key: &VrfPublicKey,
        proof: &VrfProof,
        message: &[u8],
    ) -> StdResult<bool> {
        self.querier.query_wasm_smart(
            self.address,
            &VrfQueryMsg::Verify {
                public_key: public_key.clone(),
                proof: proof.clone(),
                message: HexBinary::from(message),
            },
        )
    }

    fn compute_fast_verify_params(
        &self,
        public_key: &VrfPublicKey,
        proof: &VrfProof,
        message: &[u8],
    ) -> StdResult<FastVerifyParams> {
        self.querier.query_wasm_smart(
            self.address,
            &VrfQueryMsg::ComputeFastVerifyParams {
                public_key: public_key.clone(),
                proof: proof.clone(),
                message: HexBinary::from(message),
            },
        )
    }

    fn fast_verify(
        &self,
        public_key: &VrfPublicKey,
        proof: &VrfProof,
        message: &[u8],
        params: &FastVerifyParams,
    ) -> StdResult<bool> {
        self.querier.query_wasm_smart(
            self.address,
            &VrfQueryMsg::FastVerify {
                public_key: public_key.clone(),
                proof: proof.clone(),
                message: HexBinary::from(message),
                params: params.clone(),
            },
        )
    }
}
