//! Construction and destruction of heap-held payloads through an [`Allocator`].
//!
//! [`create`] and [`create_with`] obtain storage for one `T` from the
//! strategy, construct the payload into it, and hand back an [`Owned`]
//! handle. If the constructor fails (or unwinds) the storage goes back to the
//! strategy before the failure reaches the caller. Dropping the handle
//! destroys the payload in place and returns its storage.

use crate::alloc::{AllocError, Allocator};
use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

/// Exclusively-owned payload living in storage obtained from strategy `A`.
pub struct Owned<T, A: Allocator> {
    ptr: NonNull<T>,
    alloc: A,
    _owns: PhantomData<T>,
}

// SAFETY: `Owned` is a unique owner, like `Box<T, A>`.
unsafe impl<T: Send, A: Allocator + Send> Send for Owned<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Owned<T, A> {}

impl<T, A: Allocator> Owned<T, A> {
    /// The strategy this payload's storage came from.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Address of the payload inside the strategy's storage.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

impl<T, A: Allocator> Deref for Owned<T, A> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `ptr` holds an initialized `T` for the handle's lifetime.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T, A: Allocator> DerefMut for Owned<T, A> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as above, and `&mut self` makes the access unique.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T, A: Allocator> Drop for Owned<T, A> {
    fn drop(&mut self) {
        // SAFETY: the payload is initialized and dropped exactly once here;
        // the block came from `alloc` with this layout.
        unsafe {
            ptr::drop_in_place(self.ptr.as_ptr());
            self.alloc.deallocate(self.ptr.cast(), Layout::new::<T>());
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Owned<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        T::fmt(self, f)
    }
}

/// Storage obtained from a strategy but not yet holding a payload.
struct Reservation<'a, A: Allocator> {
    alloc: &'a A,
    ptr: NonNull<u8>,
    layout: Layout,
    armed: bool,
}

impl<'a, A: Allocator> Reservation<'a, A> {
    fn obtain(alloc: &'a A, layout: Layout) -> Result<Self, AllocError> {
        let block = alloc.allocate(layout).map_err(|_| AllocError {
            requested: layout.size(),
        })?;
        Ok(Self {
            alloc,
            ptr: block.cast(),
            layout,
            armed: true,
        })
    }

    fn commit(mut self) -> NonNull<u8> {
        self.armed = false;
        self.ptr
    }
}

impl<A: Allocator> Drop for Reservation<'_, A> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("construction failed, returning {} bytes", self.layout.size());
            // SAFETY: the block came from `alloc` with `layout` and holds nothing.
            unsafe { self.alloc.deallocate(self.ptr, self.layout) };
        }
    }
}

/// Obtain storage for `value` from `alloc` and move it in.
pub fn create<T, A: Allocator>(alloc: &A, value: T) -> Result<Owned<T, A>, AllocError> {
    create_with(alloc, || Ok::<T, AllocError>(value))
}

/// Obtain storage from `alloc`, then run `init` to construct the payload.
///
/// The storage is obtained before `init` runs. If `init` returns an error or
/// panics, the storage is returned to `alloc` and the error (or panic)
/// propagates.
pub fn create_with<T, A, E, F>(alloc: &A, init: F) -> Result<Owned<T, A>, E>
where
    A: Allocator,
    E: From<AllocError>,
    F: FnOnce() -> Result<T, E>,
{
    let reservation = Reservation::obtain(alloc, Layout::new::<T>())?;
    let value = init()?;
    let ptr = reservation.commit().cast::<T>();
    // SAFETY: the block is sized and aligned for `T` and uninitialized.
    unsafe { ptr.as_ptr().write(value) };
    Ok(Owned {
        ptr,
        alloc: alloc.clone(),
        _owns: PhantomData,
    })
}

/// Destroy the payload and return its storage to the strategy.
///
/// Equivalent to dropping the handle; spelled out for call sites that want the
/// release to be visible.
pub fn destroy<T, A: Allocator>(owned: Owned<T, A>) {
    drop(owned);
}

/// Fatal path for infallible entry points (`Clone`, `From`, `Map::insert`)
/// whose strategy refused storage.
#[cold]
pub(crate) fn alloc_failed(err: AllocError) -> ! {
    log::error!("fatal allocation failure: {err}");
    panic!("fatal allocation failure: {err}");
}
