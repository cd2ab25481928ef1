//! Bump allocator backing level storage
//!
//! Allocations come out of chained fixed-size blocks and are never freed
//! individually; dropping the arena releases the whole chain at once. The
//! level model allocates all of its tables here, so a level teardown is a
//! single drop with no per-object lifetime tracking.
//!
//! Slices are addressed by [`ArenaSlice`] handles rather than references so
//! a `Level` can own the arena and the tables inside it without becoming
//! self-referential. Blocks are `u64`-backed, which keeps every allocation
//! 8-aligned and lets `bytemuck` view them as any Pod element type.

use std::marker::PhantomData;

use bytemuck::Pod;

/// Handle to a slice allocated inside an [`Arena`].
///
/// Plain data (block index, byte offset, element count), so structures
/// stored *in* the arena can themselves hold handles to other allocations.
#[derive(Debug)]
#[repr(C)]
pub struct ArenaSlice<T> {
    block: u32,
    offset: u32,
    len: u32,
    _marker: PhantomData<T>,
}

// Manual impls: handles are copyable indices whatever the element type.
impl<T> Clone for ArenaSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaSlice<T> {}

impl<T> ArenaSlice<T> {
    /// Number of elements the handle addresses.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Handles are 12 bytes of indices; PhantomData is zero-sized, so there is
// no padding and any bit pattern is a (bounds-checked) handle.
unsafe impl<T: 'static> bytemuck::Zeroable for ArenaSlice<T> {}
unsafe impl<T: 'static> bytemuck::Pod for ArenaSlice<T> {}

/// Bump allocator with chained fixed-size blocks.
#[derive(Debug)]
pub struct Arena {
    /// Block size in bytes; fixed for the arena's lifetime.
    block_size: usize,
    blocks: Vec<Box<[u64]>>,
    /// Bytes used in the last block.
    used: usize,
}

impl Arena {
    /// Create an arena whose blocks are `block_size` bytes each.
    ///
    /// Panics if `block_size` is not a positive multiple of 8.
    pub fn new(block_size: usize) -> Self {
        assert!(
            block_size >= 8 && block_size % 8 == 0,
            "arena block size must be a positive multiple of 8"
        );
        Arena {
            block_size,
            blocks: vec![Self::new_block(block_size)],
            used: 0,
        }
    }

    fn new_block(block_size: usize) -> Box<[u64]> {
        vec![0u64; block_size / 8].into_boxed_slice()
    }

    /// Allocate a zeroed slice of `len` elements.
    ///
    /// A single allocation must fit in one block; asking for more than the
    /// block size is a contract violation and panics.
    pub fn alloc<T: Pod>(&mut self, len: usize) -> ArenaSlice<T> {
        let align = std::mem::align_of::<T>();
        assert!(align <= 8, "arena supports alignments up to 8");
        let size = std::mem::size_of::<T>() * len;
        assert!(
            size <= self.block_size,
            "allocation of {} bytes does not fit in a {} byte arena block",
            size,
            self.block_size
        );

        let mut offset = (self.used + align - 1) & !(align - 1);
        if offset + size > self.block_size {
            self.blocks.push(Self::new_block(self.block_size));
            offset = 0;
        }
        self.used = offset + size;

        ArenaSlice {
            block: (self.blocks.len() - 1) as u32,
            offset: offset as u32,
            len: len as u32,
            _marker: PhantomData,
        }
    }

    pub fn get<T: Pod>(&self, slice: ArenaSlice<T>) -> &[T] {
        let bytes: &[u8] = bytemuck::cast_slice(&self.blocks[slice.block as usize]);
        let start = slice.offset as usize;
        let end = start + slice.len as usize * std::mem::size_of::<T>();
        bytemuck::cast_slice(&bytes[start..end])
    }

    pub fn get_mut<T: Pod>(&mut self, slice: ArenaSlice<T>) -> &mut [T] {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.blocks[slice.block as usize]);
        let start = slice.offset as usize;
        let end = start + slice.len as usize * std::mem::size_of::<T>();
        bytemuck::cast_slice_mut(&mut bytes[start..end])
    }

    /// Total bytes reserved across all blocks.
    pub fn reserved_bytes(&self) -> usize {
        self.blocks.len() * self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_write_read() {
        let mut arena = Arena::new(64);
        let s = arena.alloc::<u32>(4);
        arena.get_mut(s).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(arena.get(s), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_allocations_are_zeroed() {
        let mut arena = Arena::new(64);
        let s = arena.alloc::<f32>(8);
        assert!(arena.get(s).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_allocations_do_not_overlap() {
        let mut arena = Arena::new(64);
        let a = arena.alloc::<u32>(4);
        let b = arena.alloc::<u32>(4);
        arena.get_mut(a).copy_from_slice(&[7; 4]);
        arena.get_mut(b).copy_from_slice(&[9; 4]);
        assert_eq!(arena.get(a), &[7; 4]);
        assert_eq!(arena.get(b), &[9; 4]);
    }

    #[test]
    fn test_chains_new_block_when_full() {
        let mut arena = Arena::new(64);
        let a = arena.alloc::<u8>(40);
        let b = arena.alloc::<u8>(40);
        assert_eq!(arena.reserved_bytes(), 128);
        arena.get_mut(a).fill(1);
        arena.get_mut(b).fill(2);
        assert!(arena.get(a).iter().all(|&v| v == 1));
        assert!(arena.get(b).iter().all(|&v| v == 2));
    }

    #[test]
    fn test_alignment_after_odd_allocation() {
        let mut arena = Arena::new(64);
        let _ = arena.alloc::<u8>(3);
        let s = arena.alloc::<u32>(2);
        // cast_slice would panic on a misaligned view
        arena.get_mut(s).copy_from_slice(&[5, 6]);
        assert_eq!(arena.get(s), &[5, 6]);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_oversize_allocation_panics() {
        let mut arena = Arena::new(64);
        let _ = arena.alloc::<u8>(65);
    }

    #[test]
    fn test_empty_slice() {
        let mut arena = Arena::new(64);
        let s = arena.alloc::<u32>(0);
        assert!(s.is_empty());
        assert!(arena.get(s).is_empty());
    }
}
