//! Process-wide allocation accounting.
//!
//! [`CountingAllocator`] wraps the system allocator and keeps a running total
//! of bytes ever allocated. The binary installs it as the global allocator;
//! the orchestrator samples [`total_allocated`] before and after a run to
//! report the memory delta. Without the allocator installed the counter stays
//! at zero and the delta is zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED: AtomicU64 = AtomicU64::new(0);

/// System allocator wrapper counting cumulative allocated bytes.
///
/// Every allocation, zeroed allocation and reallocation adds its full size;
/// frees never subtract.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            ALLOCATED.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            ALLOCATED.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        // A reallocation counts as a fresh block of `new_size` bytes
        if !new_ptr.is_null() {
            ALLOCATED.fetch_add(new_size as u64, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Cumulative bytes allocated through [`CountingAllocator`].
pub fn total_allocated() -> u64 {
    ALLOCATED.load(Ordering::Relaxed)
}

/// Snapshot used to compute an allocation delta.
#[derive(Debug, Clone, Copy)]
pub struct AllocationSample(u64);

impl AllocationSample {
    pub fn now() -> Self {
        Self(total_allocated())
    }

    /// Bytes allocated since this sample was taken.
    pub fn delta(&self) -> u64 {
        total_allocated().saturating_sub(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_allocator_tracks_growth() {
        let allocator = CountingAllocator;
        let before = AllocationSample::now();

        unsafe {
            let layout = Layout::from_size_align(64, 8).unwrap();
            let ptr = allocator.alloc(layout);
            assert!(!ptr.is_null());
            let grown = allocator.realloc(ptr, layout, 256);
            assert!(!grown.is_null());
            allocator.dealloc(grown, Layout::from_size_align(256, 8).unwrap());
        }

        assert!(before.delta() >= 64 + 256);
    }

    #[test]
    fn test_shrinking_realloc_counts_new_block() {
        let allocator = CountingAllocator;
        let before = AllocationSample::now();

        unsafe {
            let layout = Layout::from_size_align(512, 8).unwrap();
            let ptr = allocator.alloc(layout);
            assert!(!ptr.is_null());
            let shrunk = allocator.realloc(ptr, layout, 128);
            assert!(!shrunk.is_null());
            allocator.dealloc(shrunk, Layout::from_size_align(128, 8).unwrap());
        }

        assert!(before.delta() >= 512 + 128);
    }

    #[test]
    fn test_dealloc_does_not_decrease_total() {
        let allocator = CountingAllocator;
        unsafe {
            let layout = Layout::from_size_align(32, 8).unwrap();
            let ptr = allocator.alloc_zeroed(layout);
            let after_alloc = total_allocated();
            allocator.dealloc(ptr, layout);
            assert!(total_allocated() >= after_alloc);
        }
    }
}
