const HASHSTART: u32 = 0x1505;

/// Feed one byte into a running hash value.
pub fn add(h: u32, c: u8) -> u32 {
    //(h + (h << 5)) ^ (c as u32)
    h.wrapping_shl(5).wrapping_add(h) ^ (c as u32)
}

/// The cdb hash of `buf`.
pub fn hash(buf: &[u8]) -> u32 {
    buf.iter().fold(HASHSTART, |h, c| add(h, *c))
}

/// Index of the sub-table holding slots for `h`.
pub fn table_index(h: u32) -> usize {
    (h & 0xff) as usize
}

/// Ideal slot within a sub-table of `slots` entries.
pub fn slot_index(h: u32, slots: u32) -> u32 {
    (h >> 8) % slots
}
