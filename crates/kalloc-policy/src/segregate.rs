use core::ptr::NonNull;

use getset::{
  Getters,
  MutGetters,
};

use crate::Strategy;

/// Routes purely by request size: at most `THRESHOLD` bytes goes to the
/// small side, everything above to the large side. The threshold
/// partitions the size domain into two disjoint, exhaustive ranges, so
/// allocation needs no ownership check.
#[derive(Debug, Getters, MutGetters)]
pub struct Segregator<const THRESHOLD: usize, S, L>
where
  S: Strategy,
  L: Strategy,
{
  #[getset(get = "pub", get_mut = "pub")]
  small: S,
  #[getset(get = "pub", get_mut = "pub")]
  large: L,
}

impl<const THRESHOLD: usize, S, L> Segregator<THRESHOLD, S, L>
where
  S: Strategy,
  L: Strategy,
{
  pub const fn new(small: S, large: L) -> Self {
    Self { small, large }
  }
}

impl<const THRESHOLD: usize, S, L> Strategy for Segregator<THRESHOLD, S, L>
where
  S: Strategy,
  L: Strategy,
{
  fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
    if size <= THRESHOLD {
      self.small.alloc(size)
    } else {
      self.large.alloc(size)
    }
  }

  fn dealloc(&mut self, ptr: NonNull<u8>, size: usize) {
    if self.small.owns_ptr(ptr) {
      self.small.dealloc(ptr, size);
    } else {
      assert!(
        self.large.owns_ptr(ptr),
        "pointer owned by neither strategy"
      );
      self.large.dealloc(ptr, size);
    }
  }

  fn owns_ptr(&self, ptr: NonNull<u8>) -> bool {
    self.small.owns_ptr(ptr) || self.large.owns_ptr(ptr)
  }
}
