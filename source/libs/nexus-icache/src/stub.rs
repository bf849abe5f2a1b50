// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Flush-handle installation and the bootstrap ordering guard
//! OWNERS: @runtime
//! PUBLIC API: install, invalidate_range, invalidate_word, handle, bootstrapped, FlushStub
//! DEPENDS_ON: flush::flush_icache_stub, spin::Once
//! INVARIANTS: Handle is written once and read-only afterwards; bootstrap flag transitions false->true exactly once
//!
//! `install()` must complete before any other component asks for an
//! invalidation; the embedding runtime guarantees that ordering (single
//! threaded startup). Once installed, `invalidate_range` is safe to call
//! from any number of threads without extra locking: the fence-then-flush
//! sequence inside the handle is the only synchronization required.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Once;

use crate::diag;
use crate::flush;
use crate::range::{AddressRange, LINE_SIZE};

/// Signature of the installed flush handle: `(start, end, token) -> token`.
///
/// The token is an opaque pass-through used to confirm the handle executed
/// and returned; it carries no business data.
pub type FlushStub = fn(usize, usize, u64) -> u64;

/// Token threaded through every delegated flush and checked on return.
const STUB_TOKEN: u64 = 0x1CED_C0DE;

static FLUSH_STUB: Once<FlushStub> = Once::new();
static BOOTSTRAPPED: AtomicBool = AtomicBool::new(false);

/// Installs the process-wide flush handle.
///
/// Called exactly once, early in process lifetime, before any code-cache
/// component requests an invalidation. The handle is a direct pointer to
/// the compiled flush routine; the first invalidation in the process is
/// issued here against that routine's own address with a zero-length
/// marker, which is what the bootstrap guard in [`invalidate_range`]
/// insists on seeing first.
pub fn install() {
    let stub = *FLUSH_STUB.call_once(|| flush::flush_icache_stub as FlushStub);
    if BOOTSTRAPPED.load(Ordering::Acquire) {
        return;
    }
    invalidate_range(stub as usize, 0);
    crate::log_info!(target: "icache", "flush handle installed at {:#x}", stub as usize);
}

/// Makes `lines` cache lines of freshly written code starting at `start`
/// visible to instruction fetch on every hart.
///
/// `start` must be line aligned and the range must stay within the caller's
/// emission bounds; both are caller preconditions, not runtime checks.
/// Zero-length requests are a no-op once bootstrap is complete.
pub fn invalidate_range(start: usize, lines: usize) {
    let Some(stub) = FLUSH_STUB.get() else {
        diag::fatal(format_args!(
            "icache invalidation before install: start={start:#x} lines={lines}"
        ));
    };

    if !BOOTSTRAPPED.load(Ordering::Acquire) {
        // The very first invalidation in the process must be the installer's
        // zero-length probe of the flush routine itself. Anything else means
        // the installer was bypassed.
        if start != *stub as usize || lines != 0 {
            diag::fatal(format_args!(
                "first icache invalidation did not target the flush handle: \
                 start={start:#x} lines={lines} handle={:#x}",
                *stub as usize
            ));
        }
        BOOTSTRAPPED.store(true, Ordering::Release);
        return;
    }

    if lines == 0 {
        return;
    }

    let range = AddressRange::new(start, lines);
    debug_assert!(range.is_line_aligned());
    let token = stub(range.start, range.end(), STUB_TOKEN);
    if token != STUB_TOKEN {
        diag::fatal(format_args!(
            "flush handle returned a corrupted token: {token:#x}"
        ));
    }
}

/// Invalidates the single cache line containing `addr`.
///
/// Convenience for callers that patch one word of already published code.
pub fn invalidate_word(addr: usize) {
    invalidate_range(addr & !(LINE_SIZE - 1), 1);
}

/// Returns the installed flush handle, if [`install`] has run.
pub fn handle() -> Option<FlushStub> {
    FLUSH_STUB.get().copied()
}

/// Returns true once the bootstrap self-invalidation has been performed.
pub fn bootstrapped() -> bool {
    BOOTSTRAPPED.load(Ordering::Acquire)
}
