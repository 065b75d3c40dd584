use super::constants::{
    HEADER_SIZE, LENGTH_OFFSET, NEXT_OFFSET, NO_NEXT, STATUS_FREE, STATUS_OFFSET, STATUS_USED,
};
use std::fmt;

#[repr(u8)]
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Status {
    Free = STATUS_FREE,
    Used = STATUS_USED,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        match value {
            STATUS_FREE => Status::Free,
            STATUS_USED => Status::Used,
            _ => panic!("Corrupt block header: bad status byte {value:#04x}"),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8 as char)
    }
}

/// The metadata stored in front of every payload.
///
/// Headers are not kept as Rust values inside the arena; they are encoded
/// into `HEADER_SIZE` arena bytes and decoded again on every visit:
///
/// ```text
///   0      1        4          8                 16
///   ┌──────┬────────┬──────────┬─────────────────┐
///   │status│reserved│length u32│next offset u64  │
///   └──────┴────────┴──────────┴─────────────────┘
/// ```
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Header {
    pub status: Status,
    // payload bytes, excludes the header itself
    pub length: usize,
    pub next: Option<usize>,
}

impl Header {
    pub fn new(status: Status, length: usize, next: Option<usize>) -> Self {
        Self {
            status,
            length,
            next,
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == Status::Free
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        debug_assert!(self.length <= u32::MAX as usize);

        let mut bytes = [0u8; HEADER_SIZE];
        let next = self.next.map_or(NO_NEXT, |offset| offset as u64);

        bytes[STATUS_OFFSET] = self.status as u8;
        bytes[LENGTH_OFFSET..NEXT_OFFSET].copy_from_slice(&(self.length as u32).to_le_bytes());
        bytes[NEXT_OFFSET..HEADER_SIZE].copy_from_slice(&next.to_le_bytes());

        bytes
    }

    pub fn decode(bytes: [u8; HEADER_SIZE]) -> Self {
        let mut length = [0u8; 4];
        let mut next = [0u8; 8];

        length.copy_from_slice(&bytes[LENGTH_OFFSET..NEXT_OFFSET]);
        next.copy_from_slice(&bytes[NEXT_OFFSET..HEADER_SIZE]);

        let next = match u64::from_le_bytes(next) {
            NO_NEXT => None,
            offset => Some(offset as usize),
        };

        Self {
            status: Status::from(bytes[STATUS_OFFSET]),
            length: u32::from_le_bytes(length) as usize,
            next,
        }
    }
}
