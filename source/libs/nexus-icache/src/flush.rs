// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The flush primitive: data fence, then a global privileged invalidation.

use crate::abi::{self, FlushFlags};
use crate::diag;

/// Makes the instruction bytes in `[start, end)` visible to instruction
/// fetch on every hart.
///
/// Caller contract: `end > start` for non-empty spans and both bounds line
/// aligned; the routine does not re-validate emission bounds.
///
/// A platform-level failure of the privileged request is fatal. A runtime
/// that cannot guarantee instruction coherence must not keep executing
/// generated code, so there is no error return.
pub fn flush_icache_range(start: usize, end: usize) {
    debug_assert!(end >= start);

    // The privileged request is not specified to imply data ordering, so a
    // full fence must retire the code-byte stores before the invalidation
    // is requested.
    fence_rw_rw();

    let rc = abi::flush_icache_raw(start, end, FlushFlags::empty());
    if rc < 0 {
        diag::fatal(format_args!(
            "global icache flush failed: rc={rc} range=[{start:#x}, {end:#x})"
        ));
    }
}

/// Stub-shaped entry point installed as the process-wide flush handle.
///
/// Returns the caller-supplied opaque token unchanged; the installer checks
/// the round-trip on every delegated flush as a self-test that the handle
/// executed and returned correctly.
pub fn flush_icache_stub(start: usize, end: usize, token: u64) -> u64 {
    flush_icache_range(start, end);
    token
}

#[inline(always)]
fn fence_rw_rw() {
    #[cfg(all(target_arch = "riscv64", target_os = "none"))]
    unsafe {
        core::arch::asm!("fence rw, rw", options(nostack, preserves_flags));
    }
    #[cfg(not(all(target_arch = "riscv64", target_os = "none")))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}
