//! Legacy password fingerprinting.
//!
//! Passwords are never stored or transmitted in plaintext by the manifest;
//! instead each role carries a fingerprint produced by [`digest`], and a
//! submitted password is fingerprinted and compared against the stored
//! values.
//!
//! This is **not** a cryptographic hash. The output space is 32 bits, there
//! is no salt, and preimages are trivially brute-forceable. It provides
//! obfuscation of the manifest document only, never confidentiality or
//! collision resistance. It is kept in this exact form because deployed
//! manifests already contain fingerprints in this format, and changing the
//! accumulation order or bit width would invalidate all of them.

/// Fingerprint a string.
///
/// Iterates the input's UTF-16 code units in order, folding each into a
/// 32-bit accumulator with a shift-and-subtract mixing step (`h = (h << 7) -
/// h + unit`, wrapping). The result is the lowercase hexadecimal rendering of
/// the accumulator's absolute value.
///
/// Pure, deterministic, and total: identical inputs always yield identical
/// output, and no input can fail.
pub fn digest(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_shl(7).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    format!("{:x}", hash.unsigned_abs())
}
