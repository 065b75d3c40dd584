// Every header occupies this many bytes directly in front of its payload.
pub const HEADER_SIZE: usize = 16;

pub const STATUS_FREE: u8 = b'F';
pub const STATUS_USED: u8 = b'U';

// Header field offsets, relative to the start of the header.
pub const STATUS_OFFSET: usize = 0;
pub const LENGTH_OFFSET: usize = 4;
pub const NEXT_OFFSET: usize = 8;

// Encoded in the `next` field of the last header in the chain.
pub const NO_NEXT: u64 = u64::MAX;

pub const MIN_CAPACITY: usize = HEADER_SIZE + 1;
pub const MAX_CAPACITY: usize = u32::MAX as usize;
