use core::ptr::NonNull;

use getset::{
  Getters,
  MutGetters,
};

use crate::Strategy;

/// Tries the primary strategy, falling back only on its definitive
/// failure. Ownership is exclusive, so deallocation routes by asking the
/// primary first.
#[derive(Debug, Getters, MutGetters)]
pub struct FallbackAllocator<P, F>
where
  P: Strategy,
  F: Strategy,
{
  #[getset(get = "pub", get_mut = "pub")]
  primary: P,
  #[getset(get = "pub", get_mut = "pub")]
  fallback: F,
}

impl<P, F> FallbackAllocator<P, F>
where
  P: Strategy,
  F: Strategy,
{
  pub const fn new(primary: P, fallback: F) -> Self {
    Self { primary, fallback }
  }
}

impl<P, F> Strategy for FallbackAllocator<P, F>
where
  P: Strategy,
  F: Strategy,
{
  fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
    if let Some(ptr) = self.primary.alloc(size) {
      return Some(ptr);
    }
    self.fallback.alloc(size)
  }

  fn dealloc(&mut self, ptr: NonNull<u8>, size: usize) {
    if self.primary.owns_ptr(ptr) {
      self.primary.dealloc(ptr, size);
    } else {
      assert!(
        self.fallback.owns_ptr(ptr),
        "pointer owned by neither strategy"
      );
      self.fallback.dealloc(ptr, size);
    }
  }

  fn owns_ptr(&self, ptr: NonNull<u8>) -> bool {
    self.primary.owns_ptr(ptr) || self.fallback.owns_ptr(ptr)
  }
}
