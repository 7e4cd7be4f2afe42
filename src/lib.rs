#![cfg_attr(not(test), no_std)]

//! Kernel-facing allocator facade.
//!
//! One statically placed, zero-initialized allocator instance serves the
//! whole kernel: small requests go to the size-classed small-object
//! allocator, everything above [`MAX_SMALL`](kalloc_small::MAX_SMALL)
//! to the boundary-tag heap, with the split expressed as a
//! [`Segregator`](kalloc_policy::Segregator) behind an interrupt-masking
//! spinlock. The instance holds no memory until the boot sequence calls
//! [`initialize`]: two-phase bring-up instead of static-constructor
//! ordering.

use core::{
  alloc::{
    GlobalAlloc,
    Layout,
  },
  ptr::NonNull,
};

use kalloc_heap::KernelHeap;
use kalloc_policy::{
  Segregator,
  Strategy,
};
use kalloc_small::{
  MAX_SMALL,
  SmallAllocator,
};
use kalloc_sync::IrqLock;
use kalloc_sys::page::BootPageSource;
use spin::Once;


pub mod prelude {
  pub use kalloc_heap::KernelHeap;
  pub use kalloc_policy::{
    FallbackAllocator,
    Segregator,
    SlabAllocator,
    StackAllocator,
    Strategy,
  };
  pub use kalloc_small::{
    MAX_SMALL,
    SmallAllocator,
  };
  pub use kalloc_sync::{
    IrqLock,
    SpinLock,
  };
  pub use kalloc_sys::page::{
    BootPageSource,
    PAGE_SIZE,
    PageRange,
    PageSource,
  };
}

type KernelAllocator =
  Segregator<{ MAX_SMALL }, SmallAllocator<BootPageSource>, KernelHeap>;

static ALLOCATOR: IrqLock<KernelAllocator> = IrqLock::new(Segregator::new(
  SmallAllocator::new(BootPageSource::new()),
  KernelHeap::new(),
));

static INIT: Once = Once::new();

/// One-shot bring-up: hands the page pool to the small-object side and
/// the heap region to the boundary-tag side. Must run before the first
/// [`allocate`]; there is no reinitialization path.
pub fn initialize(page_region: &'static mut [u8], heap_region: &'static mut [u8]) {
  assert!(!INIT.is_completed(), "allocator initialized twice");

  INIT.call_once(|| {
    let mut allocator = ALLOCATOR.lock();
    allocator.small_mut().pages_mut().install(page_region);
    allocator.large_mut().initialize(heap_region);
  });
}

pub fn is_initialized() -> bool {
  INIT.is_completed()
}

/// At least `size` bytes, word-aligned, or `None` once the backing
/// memory is exhausted. Exhaustion is the only non-fatal failure; a
/// zero-size request is a caller bug.
pub fn allocate(size: usize) -> Option<NonNull<u8>> {
  ALLOCATOR.lock().alloc(size)
}

/// Returns a block. `size` must map to the same size class as the
/// allocating request did (sized deallocation).
pub fn deallocate(ptr: NonNull<u8>, size: usize) {
  ALLOCATOR.lock().dealloc(ptr, size);
}

/// `GlobalAlloc` adapter so the kernel installs the allocator with
/// `#[global_allocator]`. Alignment above pointer-size is out of scope
/// and yields null.
pub struct Kalloc {}

unsafe impl GlobalAlloc for Kalloc {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    if layout.align() > core::mem::size_of::<usize>() {
      return core::ptr::null_mut();
    }

    match allocate(layout.size()) {
      Some(ptr) => ptr.as_ptr(),
      None => core::ptr::null_mut(),
    }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
    if let Some(ptr) = NonNull::new(ptr) {
      deallocate(ptr, layout.size());
    }
  }
}
