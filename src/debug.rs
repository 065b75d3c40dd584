//! Read-only views of a heap's block chain and raw bytes.

use super::chain::BlockChain;
use super::constants::HEADER_SIZE;
use super::header::Status;
use std::fmt;

/// One node of the block chain as seen by [`crate::Heap::dump_chain`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    /// Position of the node in traversal order.
    pub index: usize,
    /// Arena offset of the node's header.
    pub offset: usize,
    pub status: Status,
    /// Payload length, excluding the header.
    pub length: usize,
    /// Arena offset of the following header, if any.
    pub next: Option<usize>,
}

impl ChainEntry {
    pub fn is_free(&self) -> bool {
        self.status == Status::Free
    }

    pub fn payload_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }
}

pub(crate) fn dump_chain(chain: &BlockChain) -> Vec<ChainEntry> {
    chain
        .iter()
        .enumerate()
        .map(|(index, (offset, header))| ChainEntry {
            index,
            offset,
            status: header.status,
            length: header.length,
            next: header.next,
        })
        .collect()
}

/// Renders the block chain one section per header.
pub struct ChainReport {
    entries: Vec<ChainEntry>,
}

impl ChainReport {
    pub(crate) fn new(chain: &BlockChain) -> Self {
        Self {
            entries: dump_chain(chain),
        }
    }
}

const RULE: &str = "---------------------------------------";

impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Header size: {HEADER_SIZE}")?;

        if self.entries.is_empty() {
            writeln!(f, "Empty block chain")?;
        }

        for entry in &self.entries {
            writeln!(f, "{RULE}")?;
            writeln!(f, "Header #{} at offset: {}", entry.index, entry.offset)?;
            writeln!(f, "Status: {}", entry.status)?;
            writeln!(f, "Length: {}", entry.length)?;

            match entry.next {
                Some(next) => writeln!(f, "Next header: {next}")?,
                None => writeln!(f, "Next header: none")?,
            }
        }

        Ok(())
    }
}

/// Renders every arena byte as `i: <index>, <value>`.
pub struct MemoryReport<'a> {
    bytes: &'a [u8],
}

impl<'a> MemoryReport<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl fmt::Display for MemoryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.bytes.iter().enumerate() {
            writeln!(f, "i: {index}, {byte}")?;
        }

        Ok(())
    }
}
