use thiserror::Error;

/// Reasons an allocation request can be refused.
///
/// Sizes are `usize`, so a negative request cannot be expressed and has no
/// variant here.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// A request for zero bytes.
    #[error("attempted to allocate 0 bytes")]
    InvalidSize,

    /// The request can never be satisfied by a heap of this capacity.
    #[error("attempted to allocate {requested} bytes from a heap of {capacity} bytes")]
    TooLarge { requested: usize, capacity: usize },

    /// No free block, after coalescing, is large enough.
    #[error("no free block can hold {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// Reasons a pointer can be rejected by [`crate::Heap::free`].
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FreeError {
    /// The pointer is not the payload start of any block, or nothing has been
    /// allocated yet.
    #[error("attempted to free an invalid pointer")]
    InvalidPointer,

    #[error("attempted to free a pointer outside of the heap")]
    OutOfBounds,

    #[error("attempted to free a block that is already free")]
    DoubleFree,
}

/// Reasons a [`crate::Heap`] cannot be constructed.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("a capacity of {capacity} bytes cannot hold a single block header and payload")]
    CapacityTooSmall { capacity: usize },

    #[error("a capacity of {capacity} bytes does not fit in a block header")]
    CapacityTooLarge { capacity: usize },

    #[error("the system refused to provide {capacity} bytes for the heap")]
    OutOfMemory { capacity: usize },
}
