//! On-disk layout of a cdb file.
//!
//! ```text
//! [0, 2048)   header: 256 x (table position, table size), u32 LE each
//! [2048, R)   records: (key length, value length) u32 LE, key, value
//! [R, end)    slot tables in header order: (hash, record position) u32 LE
//! ```
//!
//! `R` is the table position of header entry 0.

/// Number of hash sub-tables.
pub const TABLE_COUNT: usize = 256;

/// Size of one header entry, record length prefix, or slot.
pub const PAIR_SIZE: u32 = 8;

/// Size of the header, and so the position of the first record.
pub const HEADER_SIZE: u32 = TABLE_COUNT as u32 * PAIR_SIZE;

/// Record position marking an unused slot. No record can live at 0 since the
/// header is always there.
pub const EMPTY_SLOT: u32 = 0;
