#![cfg_attr(not(test), no_std)]

use core::ptr::NonNull;

pub mod fallback;
pub mod segregate;
pub mod slab;
pub mod stack;


pub use fallback::FallbackAllocator;
pub use segregate::Segregator;
pub use slab::{
  SlabAllocator,
  SlabError,
  SlabResult,
};
pub use stack::StackAllocator;

/// The uniform contract every allocation strategy satisfies, so that
/// strategies nest into larger ones.
///
/// `dealloc` carries the allocation-time size because the small-object
/// layer is header-free and re-derives its size class from it; strategies
/// that do not need the size ignore it.
pub trait Strategy {
  /// A block of at least `size` bytes, or `None` when this strategy has
  /// no memory left. Exhaustion is a value, never a panic.
  fn alloc(&mut self, size: usize) -> Option<NonNull<u8>>;

  /// Takes back a block. `ptr` must have come from `alloc` on this
  /// strategy together with the same `size`; anything else is a caller
  /// bug and panics.
  fn dealloc(&mut self, ptr: NonNull<u8>, size: usize);

  /// Whether `ptr` lies in memory this strategy hands out.
  fn owns_ptr(&self, ptr: NonNull<u8>) -> bool;
}
