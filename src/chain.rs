use super::arena::Arena;
use super::constants::HEADER_SIZE;
use super::header::{Header, Status};

/// Where a request of a given size can be placed.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Fit {
    /// The free block at this offset has exactly the requested length.
    Exact(usize),
    /// The free block at this offset is large enough to be split.
    Split(usize),
}

/// The intrusive list of block headers overlaid on an [`Arena`].
///
/// Nodes are named by the arena offset of their header. The list always
/// starts at offset 0 and, once initialized, partitions the arena exactly:
/// every node's `next` is the offset directly past its own payload, and the
/// last node's payload ends at the arena's capacity.
pub struct BlockChain {
    arena: Arena,
    head: Option<usize>,
}

impl BlockChain {
    pub fn new(arena: Arena) -> Self {
        Self { arena, head: None }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    pub fn is_initialized(&self) -> bool {
        self.head.is_some()
    }

    /// Lays down a single free node spanning the whole arena. Does nothing if
    /// the chain already exists.
    pub fn init(&mut self) {
        if self.is_initialized() {
            return;
        }

        let head = Header::new(Status::Free, self.capacity() - HEADER_SIZE, None);

        self.set_header(0, &head);
        self.head = Some(0);
    }

    pub fn header(&self, offset: usize) -> Header {
        Header::decode(self.arena.read(offset))
    }

    fn set_header(&mut self, offset: usize, header: &Header) {
        self.arena.write(offset, &header.encode());
    }

    pub fn set_status(&mut self, offset: usize, status: Status) {
        let mut header = self.header(offset);

        header.status = status;
        self.set_header(offset, &header);
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            chain: self,
            next: self.head,
        }
    }

    /// Merges every run of adjacent free nodes into its first node, returning
    /// how many nodes were absorbed.
    pub fn coalesce(&mut self) -> usize {
        let mut merged = 0;
        let mut current = self.head;

        while let Some(offset) = current {
            let mut header = self.header(offset);

            let Some(next_offset) = header.next else {
                break;
            };

            let next = self.header(next_offset);

            if header.is_free() && next.is_free() {
                header.length += HEADER_SIZE + next.length;
                header.next = next.next;
                self.set_header(offset, &header);
                merged += 1;
                // stay on this node, it may absorb its new neighbor too
            } else {
                current = Some(next_offset);
            }
        }

        merged
    }

    /// First free node, in address order, that can hold `size` bytes.
    pub fn find_fit(&self, size: usize) -> Option<Fit> {
        self.iter()
            .filter(|(_, header)| header.is_free())
            .find_map(|(offset, header)| {
                if header.length == size {
                    Some(Fit::Exact(offset))
                } else if header.length >= size + HEADER_SIZE {
                    Some(Fit::Split(offset))
                } else {
                    None
                }
            })
    }

    /// Carves `size` bytes off the front of the free node at `offset`, marking
    /// that part used and leaving the rest behind a new free header. Returns
    /// the offset of the new header.
    pub fn split(&mut self, offset: usize, size: usize) -> usize {
        let mut header = self.header(offset);

        debug_assert!(header.is_free());
        debug_assert!(header.length >= size + HEADER_SIZE);

        let remainder_offset = offset + HEADER_SIZE + size;
        let remainder = Header::new(
            Status::Free,
            header.length - size - HEADER_SIZE,
            header.next,
        );

        header.status = Status::Used;
        header.length = size;
        header.next = Some(remainder_offset);

        self.set_header(remainder_offset, &remainder);
        self.set_header(offset, &header);

        remainder_offset
    }

    /// The node whose payload starts exactly at `payload_offset`.
    pub fn find_payload(&self, payload_offset: usize) -> Option<(usize, Header)> {
        self.iter()
            .find(|(offset, _)| offset + HEADER_SIZE == payload_offset)
    }
}

/// Walks a [`BlockChain`] in address order, yielding each header's offset
/// along with its decoded contents.
pub struct Iter<'a> {
    chain: &'a BlockChain,
    next: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = (usize, Header);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next?;
        let header = self.chain.header(offset);

        self.next = header.next;

        Some((offset, header))
    }
}
