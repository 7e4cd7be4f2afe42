use core::ptr::NonNull;

use kalloc_list::{
  BinList,
  HasLink,
  Link,
};
use kalloc_policy::Strategy;
use kalloc_sys::math::{
  align_up,
  log2_floor,
};

use crate::block::{
  BlockHeader,
  BlockTag,
  MIN_ALIGN,
};

pub const NUM_BINS: usize = 32;

const LOG2_MIN_ALIGN: usize = MIN_ALIGN.trailing_zeros() as usize;

/// Free-block node, embedded in the payload of every free heap block.
/// MIN_ALIGN is two words, so even the smallest block holds one.
struct BinNode {
  link: Link<BinNode>,
}

impl HasLink for BinNode {
  fn link(&self) -> &Link<Self> {
    &self.link
  }

  fn link_mut(&mut self) -> &mut Link<Self> {
    &mut self.link
  }
}

/// The bin holding free blocks of `size`, clamped to the last bin for
/// everything above the largest explicit one.
fn bin_index(size: usize) -> usize {
  let log = match log2_floor(size) {
    Some(log) => log,
    None => panic!("free blocks are never zero-sized"),
  };

  let index = log - LOG2_MIN_ALIGN;
  if index >= NUM_BINS {
    NUM_BINS - 1
  } else {
    index
  }
}

/// Boundary-tag heap over one contiguous region.
///
/// Every block is either Used (used bit set, member of nothing) or Free
/// (in exactly the bin of its size). The region is bracketed so traversal
/// never escapes it: the first header's prev tag reads used, and a
/// zero-size used sentinel header closes the far end.
pub struct KernelHeap {
  bins: [BinList<BinNode>; NUM_BINS],
  base: usize,
  len: usize,
}

impl KernelHeap {
  pub const fn new() -> Self {
    Self {
      bins: [const { BinList::new() }; NUM_BINS],
      base: 0,
      len: 0,
    }
  }

  /// Adopts `region` as the heap's one and only backing span, trimmed to
  /// MIN_ALIGN and carved into a single free block plus the end sentinel.
  pub fn initialize(&mut self, region: &'static mut [u8]) {
    assert!(self.len == 0, "heap initialized twice");

    let raw = region.as_mut_ptr() as usize;
    // MIN_ALIGN is a power of two
    let base = (raw + MIN_ALIGN - 1) & !(MIN_ALIGN - 1);
    let end = (raw + region.len()) & !(MIN_ALIGN - 1);
    assert!(
      end > base && end - base >= 2 * BlockHeader::SIZE + MIN_ALIGN,
      "heap region too small"
    );

    self.base = base;
    self.len = end - base;

    let first_size = self.len - 2 * BlockHeader::SIZE;
    let first = match NonNull::new(base as *mut BlockHeader) {
      Some(first) => first,
      None => panic!("heap region at the null page"),
    };

    unsafe {
      first.as_ptr().write(BlockHeader {
        prev: BlockTag::new(0, true),
        this: BlockTag::new(first_size, false),
      });
    }

    let sentinel = (end - BlockHeader::SIZE) as *mut BlockHeader;
    unsafe {
      sentinel.write(BlockHeader {
        prev: BlockTag::new(first_size, false),
        this: BlockTag::new(0, true),
      });
    }

    self.bin_push(first);
  }

  pub fn contains(&self, addr: usize) -> bool {
    addr >= self.base && addr < self.base + self.len
  }

  fn node_header(node: NonNull<BinNode>) -> NonNull<BlockHeader> {
    unsafe { BlockHeader::from_payload(node.cast()) }
  }

  fn bin_push(&mut self, header: NonNull<BlockHeader>) {
    let size = unsafe { header.as_ref() }.this.size();
    let node = BlockHeader::payload(header).cast::<BinNode>();
    unsafe { node.as_ptr().write(BinNode { link: Link::new() }) };
    self.bins[bin_index(size)].push_front(node);
  }

  fn bin_remove(&mut self, header: NonNull<BlockHeader>) {
    let size = unsafe { header.as_ref() }.this.size();
    let node = BlockHeader::payload(header).cast::<BinNode>();
    self.bins[bin_index(size)].remove(node);
  }

  /// Mirrors `header`'s own tag into its successor's prev tag.
  fn sync_next(&self, header: NonNull<BlockHeader>) {
    let tag = unsafe { header.as_ref() }.this;
    let mut next = unsafe { BlockHeader::next(header) };
    unsafe { next.as_mut() }.prev = tag;
  }

  /// First fit in the matching bin, then ascending escalation through
  /// the larger bins.
  fn find_fit(&self, size: usize) -> Option<NonNull<BlockHeader>> {
    for bin in bin_index(size)..NUM_BINS {
      for node in self.bins[bin].iter() {
        let header = Self::node_header(node);
        if unsafe { header.as_ref() }.this.size() >= size {
          return Some(header);
        }
      }
    }
    None
  }

  /// Carves `size` bytes off the front of `header`, reinserting any
  /// viable remainder into its bin. Too-small remainders stay attached
  /// as slack.
  fn split(&mut self, mut header: NonNull<BlockHeader>, size: usize) {
    let total = unsafe { header.as_ref() }.this.size();
    let excess = total - size;
    if excess < BlockHeader::SIZE + MIN_ALIGN {
      return;
    }

    {
      let block = unsafe { header.as_mut() };
      block.this = block.this.with_size(size);
    }

    let rest = unsafe { BlockHeader::next(header) };
    unsafe {
      rest.as_ptr().write(BlockHeader {
        prev: header.as_ref().this,
        this: BlockTag::new(excess - BlockHeader::SIZE, false),
      });
    }
    self.sync_next(rest);
    self.bin_push(rest);
  }

  /// A block of at least `size` bytes, or `None` on exhaustion.
  pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
    if self.len == 0 {
      return None;
    }
    let size = Self::round_request(size)?;

    let mut found = self.find_fit(size)?;
    self.bin_remove(found);

    {
      let block = unsafe { found.as_mut() };
      block.this = block.this.with_used(true);
    }
    self.split(found, size);
    self.sync_next(found);

    Some(BlockHeader::payload(found))
  }

  /// Frees the block behind `ptr`, coalescing with free neighbors in
  /// both directions before the result goes back into a bin.
  pub fn deallocate(&mut self, ptr: NonNull<u8>) {
    assert!(
      self.contains(ptr.as_ptr() as usize),
      "pointer outside the heap region"
    );

    let mut header = unsafe { BlockHeader::from_payload(ptr) };
    {
      let block = unsafe { header.as_mut() };
      assert!(block.this.used(), "heap block freed twice");
      block.this = block.this.with_used(false);
    }

    // absorb a free successor
    let next = unsafe { BlockHeader::next(header) };
    let next_tag = unsafe { next.as_ref() }.this;
    if !next_tag.used() {
      self.bin_remove(next);
      let merged =
        unsafe { header.as_ref() }.this.size() + BlockHeader::SIZE + next_tag.size();
      let block = unsafe { header.as_mut() };
      block.this = block.this.with_size(merged);
    }

    // let a free predecessor absorb the result
    let prev_tag = unsafe { header.as_ref() }.prev;
    if !prev_tag.used() {
      let mut prev = unsafe { BlockHeader::prev(header) };
      self.bin_remove(prev);
      let merged =
        prev_tag.size() + BlockHeader::SIZE + unsafe { header.as_ref() }.this.size();
      let block = unsafe { prev.as_mut() };
      block.this = block.this.with_size(merged);
      header = prev;
    }

    self.sync_next(header);
    self.bin_push(header);
  }

  fn round_request(size: usize) -> Option<usize> {
    let size = if size < MIN_ALIGN { MIN_ALIGN } else { size };
    align_up(size, MIN_ALIGN)
  }
}

impl Default for KernelHeap {
  fn default() -> Self {
    Self::new()
  }
}

// the heap exclusively owns its region; the embedded node pointers never
// alias another owner
unsafe impl Send for KernelHeap {}

impl Strategy for KernelHeap {
  fn alloc(&mut self, size: usize) -> Option<NonNull<u8>> {
    self.allocate(size)
  }

  fn dealloc(&mut self, ptr: NonNull<u8>, _size: usize) {
    self.deallocate(ptr);
  }

  fn owns_ptr(&self, ptr: NonNull<u8>) -> bool {
    self.contains(ptr.as_ptr() as usize)
  }
}
