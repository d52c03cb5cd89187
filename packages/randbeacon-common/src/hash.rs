use sha3::{Digest, Keccak256};

/// `keccak256(data)`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// `keccak256(parts[0] || parts[1] || ...)` without intermediate allocation.
pub fn keccak_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Feed a variable-length field as `len_u32_be || bytes` so adjacent fields
/// cannot be shifted into each other.
pub(crate) fn update_prefixed(hasher: &mut Keccak256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
}
