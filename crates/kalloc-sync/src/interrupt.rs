use core::marker::PhantomData;

/// Scoped interrupt mask: records whether interrupts were enabled, masks
/// them, and restores the recorded state on drop. Not `Send`, since the
/// saved state belongs to the acquiring CPU context.
#[derive(Debug)]
pub struct InterruptDisabler {
  was_enabled: bool,
  _not_send: PhantomData<*mut ()>,
}

impl InterruptDisabler {
  pub fn new() -> Self {
    Self {
      was_enabled: imp::read_and_disable(),
      _not_send: PhantomData,
    }
  }

  #[inline(always)]
  pub const fn was_enabled(&self) -> bool {
    self.was_enabled
  }
}

impl Default for InterruptDisabler {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for InterruptDisabler {
  fn drop(&mut self) {
    if self.was_enabled {
      imp::enable();
    }
  }
}

pub fn interrupts_enabled() -> bool {
  imp::is_enabled()
}

/// Puts the flag back to enabled between tests: with several hosted
/// threads sharing the one emulated flag, a contended run can leave it
/// masked.
#[cfg(test)]
pub(crate) fn reset_for_test() {
  imp::enable();
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod imp {
  use core::arch::asm;

  const IF_BIT: u64 = 1 << 9;

  pub fn read_and_disable() -> bool {
    let flags: u64;
    unsafe {
      asm!("pushfq", "pop {}", "cli", out(reg) flags);
    }
    flags & IF_BIT != 0
  }

  pub fn enable() {
    unsafe {
      asm!("sti", options(nomem, nostack));
    }
  }

  pub fn is_enabled() -> bool {
    let flags: u64;
    unsafe {
      asm!("pushfq", "pop {}", out(reg) flags);
    }
    flags & IF_BIT != 0
  }
}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
mod imp {
  //! Hosted stand-in: one emulated flag takes the place of the boot
  //! CPU's interrupt-enable bit so the guard protocol runs under tests.

  use core::sync::atomic::{
    AtomicBool,
    Ordering,
  };

  static ENABLED: AtomicBool = AtomicBool::new(true);

  pub fn read_and_disable() -> bool {
    ENABLED.swap(false, Ordering::AcqRel)
  }

  pub fn enable() {
    ENABLED.store(true, Ordering::Release);
  }

  pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Acquire)
  }
}
