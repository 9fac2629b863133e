//! Stack-safe teardown of nested arrays and objects.
//!
//! Letting each container drop its children would recurse once per nesting
//! level, and a document nested a few hundred thousand levels deep would
//! overflow the call stack. Instead, [`Value`]'s `Drop` hands the value to
//! [`release_descendants`], which flattens the whole subtree onto a heap
//! worklist:
//!
//! 1. Move the root's immediate children onto the worklist, emptying the root.
//! 2. Pop a value; if it is an array or object, move its children onto the
//!    worklist too. The popped value is now childless and is released on the
//!    spot.
//! 3. Once the worklist is empty, the root's own (empty) container is released
//!    by the normal field drop that follows.
//!
//! Every value dropped from the loop has already lost its children, so its own
//! `Drop` finds nothing to detach and returns immediately. Call-stack use is
//! constant; the worklist holds at most the number of pending descendants.

use crate::alloc::Allocator;
use crate::value::{Repr, Value};

/// Teardowns that release at least this many descendants are logged.
const LOG_THRESHOLD: usize = 4096;

/// Release every descendant of `root`, leaving `root` with an empty container.
pub(crate) fn release_descendants<A: Allocator>(root: &mut Value<A>) {
    let mut worklist = Vec::new();
    if !detach_children(root, &mut worklist) {
        return;
    }

    let mut released = 0usize;
    let mut high_water = worklist.len();
    while let Some(mut item) = worklist.pop() {
        detach_children(&mut item, &mut worklist);
        high_water = high_water.max(worklist.len());
        released += 1;
    }

    if released >= LOG_THRESHOLD {
        log::debug!("released {released} descendants (worklist peak {high_water})");
    }
}

/// Move the immediate children of an array or object into `out`.
///
/// Returns `false` when there was nothing to move: scalars, strings and
/// empty containers.
fn detach_children<A: Allocator>(value: &mut Value<A>, out: &mut Vec<Value<A>>) -> bool {
    match &mut value.repr {
        Repr::Array(items) if !items.is_empty() => {
            out.extend(items.drain(..));
            true
        }
        Repr::Object(entries) if !entries.is_empty() => {
            entries.drain_values(out);
            true
        }
        _ => false,
    }
}
