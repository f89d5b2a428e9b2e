//! Deterministic string hashing used to place text features in vector slots.

/// Hash `text` into a non-negative integer.
///
/// Walks the UTF-16 code units of `text` computing `h = (h << 5) - h + unit`
/// in a wrapping 32-bit signed accumulator and returns `|h|`. There is no
/// seed and no global state, so values are stable across processes.
/// Collisions are expected; callers probe several slots per feature.
pub fn hash_text(text: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in text.encode_utf16() {
        h = (h << 5).wrapping_sub(h).wrapping_add(i32::from(unit));
    }
    h.unsigned_abs()
}

/// Map a hash (optionally scaled by `multiplier`) onto one of `dimensions` slots.
pub fn slot(hash: u32, multiplier: u64, dimensions: usize) -> usize {
    ((u64::from(hash) * multiplier) % dimensions as u64) as usize
}
