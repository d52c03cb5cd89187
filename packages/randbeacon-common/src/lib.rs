pub mod hash;
pub mod types;
pub mod vrf;

pub use hash::{keccak256, keccak_concat};
pub use types::{ClientCallbackMsg, RequestData, RequestStatus, BEACONS_PER_REQUEST};
pub use vrf::{
    hash_of, proof_digest, FastVerifyParams, VrfContract, VrfProof, VrfPublicKey, VrfQueryMsg,
    VrfVerifier,
};
