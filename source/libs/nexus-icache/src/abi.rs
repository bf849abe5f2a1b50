// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Numeric contract for the privileged icache flush request
//! OWNERS: @runtime
//! PUBLIC API: SYSCALL_FLUSH_ICACHE, FlushFlags, flush_icache_raw
//! DEPENDS_ON: riscv ecall asm (OS), core atomics (host stand-in)
//! INVARIANTS: Operand assignment is bit-exact per the platform ABI; an empty flag word requests a global flush
//!
//! The request is issued with the operation identifier in `a7` and three
//! operands: `a0 = start`, `a1 = end`, `a2 = flags`. Any deviation from this
//! table silently flushes the wrong range or the wrong scope, so callers go
//! through [`flush_icache_raw`] and never spell the convention themselves.

use bitflags::bitflags;

/// Operation identifier for the privileged instruction-cache flush request.
pub const SYSCALL_FLUSH_ICACHE: usize = 259;

bitflags! {
    /// Scope selector for a flush request.
    ///
    /// The empty word requests a global flush: the kernel propagates the
    /// invalidation to every hart concurrently able to fetch from the range
    /// and completes it before returning.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FlushFlags: usize {
        /// Restrict the flush to the issuing hart.
        const LOCAL = 1 << 0;
    }
}

/// Issues the privileged flush request for `[start, end)` and returns the
/// platform's raw result. Negative values report a platform-level failure;
/// the caller decides how hard to fail (in this crate: fatally).
///
/// The request is synchronous: it does not return until the invalidation is
/// acknowledged as complete.
pub fn flush_icache_raw(start: usize, end: usize, flags: FlushFlags) -> isize {
    #[cfg(all(target_arch = "riscv64", target_os = "none"))]
    {
        unsafe { ecall3(SYSCALL_FLUSH_ICACHE, start, end, flags.bits()) as isize }
    }
    #[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
    {
        host::record(start, end, flags.bits());
        0
    }
}

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
#[allow(unused_assignments)]
#[inline(always)]
unsafe fn ecall3(n: usize, a0: usize, a1: usize, a2: usize) -> usize {
    let mut r0 = a0;
    let mut r1 = a1;
    let mut r2 = a2;
    let mut r7 = n;
    core::arch::asm!(
        "ecall",
        inout("a0") r0,
        inout("a1") r1,
        inout("a2") r2,
        inout("a7") r7,
        clobber_abi("C"),
        options(nostack)
    );
    r0
}

/// Host-build stand-in for the privileged request.
///
/// Records each request into process-wide atomics and reports success, so
/// host builds and tests can exercise the full flush path. The counter is
/// exact under concurrency; the last-request fields are only meaningful
/// while a single thread is flushing.
#[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
pub mod host {
    use core::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);
    static LAST_START: AtomicUsize = AtomicUsize::new(0);
    static LAST_END: AtomicUsize = AtomicUsize::new(0);
    static LAST_FLAGS: AtomicUsize = AtomicUsize::new(0);

    pub(super) fn record(start: usize, end: usize, flags: usize) {
        LAST_START.store(start, Ordering::Relaxed);
        LAST_END.store(end, Ordering::Relaxed);
        LAST_FLAGS.store(flags, Ordering::Relaxed);
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of flush requests issued by this process so far.
    pub fn request_count() -> usize {
        CALLS.load(Ordering::SeqCst)
    }

    /// The most recent request as `(start, end, flags)`, if any was issued.
    pub fn last_request() -> Option<(usize, usize, usize)> {
        if CALLS.load(Ordering::SeqCst) == 0 {
            return None;
        }
        Some((
            LAST_START.load(Ordering::Relaxed),
            LAST_END.load(Ordering::Relaxed),
            LAST_FLAGS.load(Ordering::Relaxed),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{flush_icache_raw, host, FlushFlags, SYSCALL_FLUSH_ICACHE};

    #[test]
    fn contract_golden() {
        // Pinned platform contract; a change here is a wire-level break.
        assert_eq!(SYSCALL_FLUSH_ICACHE, 259);
        assert_eq!(FlushFlags::empty().bits(), 0);
        assert_eq!(FlushFlags::LOCAL.bits(), 1);
    }

    #[test]
    fn host_stub_records_and_succeeds() {
        let before = host::request_count();
        let rc = flush_icache_raw(0x9000, 0x9040, FlushFlags::empty());
        assert_eq!(rc, 0);
        assert_eq!(host::request_count(), before + 1);
        let (start, end, flags) = host::last_request().unwrap();
        assert_eq!((start, end, flags), (0x9000, 0x9040, 0));
    }
}
