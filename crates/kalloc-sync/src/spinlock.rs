use core::{
  cell::UnsafeCell,
  hint,
  ops::{
    Deref,
    DerefMut,
  },
  sync::atomic::{
    AtomicBool,
    Ordering,
  },
};

use crate::interrupt::InterruptDisabler;

/// Test-and-test-and-set lock: spin on a relaxed load until the flag
/// reads free, then attempt the acquiring compare-exchange, retrying the
/// whole sequence on failure.
///
/// Acquire/release on the flag is the only memory-ordering contract the
/// allocator relies on. Acquisition is unbounded; a deadlock is a bug,
/// not a recoverable condition.
#[derive(Debug)]
pub struct SpinLock {
  locked: AtomicBool,
}

impl SpinLock {
  pub const fn new() -> Self {
    Self {
      locked: AtomicBool::new(false),
    }
  }

  pub fn lock(&self) {
    loop {
      while self.locked.load(Ordering::Relaxed) {
        hint::spin_loop();
      }

      if self
        .locked
        .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
        .is_ok()
      {
        return;
      }
    }
  }

  pub fn try_lock(&self) -> bool {
    self
      .locked
      .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
      .is_ok()
  }

  pub fn unlock(&self) {
    assert!(self.is_locked(), "unlock of a lock nobody holds");
    self.locked.store(false, Ordering::Release);
  }

  #[inline(always)]
  pub fn is_locked(&self) -> bool {
    self.locked.load(Ordering::Relaxed)
  }
}

impl Default for SpinLock {
  fn default() -> Self {
    Self::new()
  }
}

/// Spinlock plus interrupt mask around a value: the wrapper that makes
/// the allocator entry points safe to call from anything an interrupt
/// handler could also call them from.
///
/// The disabler is acquired before the lock and released after it, so an
/// interrupt handler can never run, and so never re-enter the allocator,
/// while the lock is held on this CPU.
pub struct IrqLock<T> {
  lock: SpinLock,
  data: UnsafeCell<T>,
}

unsafe impl<T> Send for IrqLock<T> where T: Send {}
unsafe impl<T> Sync for IrqLock<T> where T: Send {}

impl<T> IrqLock<T> {
  pub const fn new(data: T) -> Self {
    Self {
      lock: SpinLock::new(),
      data: UnsafeCell::new(data),
    }
  }

  pub fn lock(&self) -> IrqGuard<'_, T> {
    let disabler = InterruptDisabler::new();
    self.lock.lock();

    IrqGuard {
      owner: self,
      _disabler: disabler,
    }
  }

  #[inline(always)]
  pub fn is_locked(&self) -> bool {
    self.lock.is_locked()
  }
}

pub struct IrqGuard<'lock, T> {
  owner: &'lock IrqLock<T>,
  _disabler: InterruptDisabler,
}

impl<T> Drop for IrqGuard<'_, T> {
  fn drop(&mut self) {
    // release the lock here; the disabler field drops afterwards and
    // restores the interrupt state
    self.owner.lock.unlock();
  }
}

impl<T> Deref for IrqGuard<'_, T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    unsafe { &*self.owner.data.get() }
  }
}

impl<T> DerefMut for IrqGuard<'_, T> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    unsafe { &mut *self.owner.data.get() }
  }
}
