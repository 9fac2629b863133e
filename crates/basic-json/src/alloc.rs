//! Allocation strategies for heap-held payloads.
//!
//! A strategy is anything implementing `allocator_api2`'s allocator trait
//! that can be cloned into every payload it serves. It supplies the storage
//! for each string, array and object node, and for the buffers those
//! containers grow into, so swapping the strategy changes where the whole
//! tree lives without touching the value model.
//!
//! Three strategies ship with the crate:
//!
//! - [`Global`]: the system heap, no bookkeeping. The default for [`Value`](crate::Value).
//! - [`Tracked`]: the system heap behind a ledger that counts allocations and
//!   live bytes, optionally refusing anything past a byte budget. Clones share
//!   one ledger.
//! - [`Arena`]: a `bumpalo` bump arena. Releasing storage is nearly free and
//!   the whole arena is reclaimed when its last handle goes away.
//!
//! `&bumpalo::Bump` also qualifies directly, for trees that borrow an arena
//! owned elsewhere.

use allocator_api2::alloc::Allocator as RawAllocator;
use allocator_api2::vec::Vec;
use bumpalo::Bump;
use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::mem;
use std::ptr::NonNull;
use std::rc::Rc;
use thiserror::Error;

pub use allocator_api2::alloc::Global;

/// A strategy refused to provide storage.
///
/// Allocation failure is fatal to the operation that requested it; nothing in
/// this crate retries.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot allocate {requested} bytes")]
pub struct AllocError {
    pub requested: usize,
}

/// Storage strategy used by [`lifecycle`](crate::lifecycle) and by every
/// container inside a value.
///
/// Implemented for every cloneable `allocator_api2` allocator.
pub trait Allocator: RawAllocator + Clone {}

impl<T: RawAllocator + Clone> Allocator for T {}

/// Reserve room for `additional` more items, reporting refusal as [`AllocError`].
pub(crate) fn reserve<T, A: Allocator>(vec: &mut Vec<T, A>, additional: usize) -> Result<(), AllocError> {
    vec.try_reserve(additional).map_err(|_| AllocError {
        requested: additional.saturating_mul(mem::size_of::<T>()),
    })
}

/// Snapshot of a [`Tracked`] ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    pub allocs: u64,
    pub frees: u64,
    pub refused: u64,
    pub live_bytes: usize,
    pub peak_bytes: usize,
}

impl AllocStats {
    /// Allocations not yet returned.
    pub fn live(&self) -> u64 {
        self.allocs.saturating_sub(self.frees)
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocs: {}  frees: {}  refused: {}  live: {} ({} bytes, peak {})",
            self.allocs,
            self.frees,
            self.refused,
            self.live(),
            self.live_bytes,
            self.peak_bytes
        )
    }
}

#[derive(Debug, Default)]
struct Ledger {
    limit: Cell<Option<usize>>,
    allocs: Cell<u64>,
    frees: Cell<u64>,
    refused: Cell<u64>,
    live_bytes: Cell<usize>,
    peak_bytes: Cell<usize>,
}

/// Counting strategy over the system heap with an optional byte budget.
///
/// Single-threaded: the ledger lives behind an `Rc`, so values using this
/// strategy cannot cross threads.
#[derive(Debug, Clone, Default)]
pub struct Tracked {
    ledger: Rc<Ledger>,
}

impl Tracked {
    /// Unlimited ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that refuses any allocation that would push live bytes past `bytes`.
    pub fn with_limit(bytes: usize) -> Self {
        let tracked = Self::default();
        tracked.set_limit(Some(bytes));
        tracked
    }

    /// Change the budget. Storage already handed out is never reclaimed.
    pub fn set_limit(&self, bytes: Option<usize>) {
        self.ledger.limit.set(bytes);
    }

    pub fn limit(&self) -> Option<usize> {
        self.ledger.limit.get()
    }

    pub fn stats(&self) -> AllocStats {
        let ledger = &self.ledger;
        AllocStats {
            allocs: ledger.allocs.get(),
            frees: ledger.frees.get(),
            refused: ledger.refused.get(),
            live_bytes: ledger.live_bytes.get(),
            peak_bytes: ledger.peak_bytes.get(),
        }
    }

    /// True when both handles report into the same ledger.
    pub fn shares_ledger(&self, other: &Tracked) -> bool {
        Rc::ptr_eq(&self.ledger, &other.ledger)
    }

    fn admit(&self, layout: Layout) -> Result<(), allocator_api2::alloc::AllocError> {
        let ledger = &self.ledger;
        let live = ledger.live_bytes.get();
        let requested = layout.size();

        if let Some(limit) = ledger.limit.get() {
            let remaining = limit.saturating_sub(live);
            if requested > remaining {
                ledger.refused.set(ledger.refused.get() + 1);
                log::warn!("allocation budget exhausted: requested {requested} bytes, {remaining} of {limit} remain");
                return Err(allocator_api2::alloc::AllocError);
            }
        }
        Ok(())
    }

    fn record(&self, layout: Layout) {
        let ledger = &self.ledger;
        let live = ledger.live_bytes.get() + layout.size();
        ledger.live_bytes.set(live);
        ledger.peak_bytes.set(ledger.peak_bytes.get().max(live));
        ledger.allocs.set(ledger.allocs.get() + 1);
        log::trace!("tracked allocate {} bytes (live {live})", layout.size());
    }
}

// SAFETY: every block comes from `Global` and goes back to it unchanged; the
// ledger only observes the traffic.
unsafe impl RawAllocator for Tracked {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, allocator_api2::alloc::AllocError> {
        self.admit(layout)?;
        let block = Global.allocate(layout)?;
        self.record(layout);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller upholds the contract for a block we got from `Global`.
        unsafe { Global.deallocate(ptr, layout) };

        let ledger = &self.ledger;
        let live = ledger.live_bytes.get().saturating_sub(layout.size());
        ledger.live_bytes.set(live);
        ledger.frees.set(ledger.frees.get() + 1);
        log::trace!("tracked release {} bytes (live {live})", layout.size());
    }
}

/// Bump-arena strategy backed by `bumpalo`.
///
/// Clones share one arena. Released blocks are only reclaimed when they were
/// the most recent allocation; everything else is freed together when the
/// last clone (and the last value built from it) is dropped.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    bump: Rc<Bump>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena whose first chunk holds at least `bytes`.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Rc::new(Bump::with_capacity(bytes)),
        }
    }

    /// Bytes reserved by the arena's chunks so far.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// True when `ptr` points into one of the arena's chunks.
    pub fn contains<T: ?Sized>(&self, ptr: *const T) -> bool {
        let addr = ptr.cast::<u8>() as usize;
        // SAFETY: nothing allocates from the arena while the chunks are walked.
        unsafe { self.bump.iter_allocated_chunks_raw() }
            .any(|(start, len)| (start as usize..start as usize + len).contains(&addr))
    }

    /// True when both handles allocate from the same arena.
    pub fn shares_arena(&self, other: &Arena) -> bool {
        Rc::ptr_eq(&self.bump, &other.bump)
    }

    fn bump(&self) -> &Bump {
        &self.bump
    }
}

// SAFETY: pure delegation to `&Bump`, which upholds the allocator contract
// for as long as the arena is alive; every block keeps the arena alive
// through the clone stored next to it.
unsafe impl RawAllocator for Arena {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, allocator_api2::alloc::AllocError> {
        RawAllocator::allocate(&self.bump(), layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { RawAllocator::deallocate(&self.bump(), ptr, layout) }
    }

    unsafe fn grow(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, allocator_api2::alloc::AllocError> {
        // SAFETY: forwarded caller contract.
        unsafe { RawAllocator::grow(&self.bump(), ptr, old_layout, new_layout) }
    }

    unsafe fn shrink(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, allocator_api2::alloc::AllocError> {
        // SAFETY: forwarded caller contract.
        unsafe { RawAllocator::shrink(&self.bump(), ptr, old_layout, new_layout) }
    }
}
