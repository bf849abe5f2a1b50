// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Full bootstrap-then-steady-state flow against the host flush recorder.
//!
//! Bootstrap state is process-wide, so the whole flow runs as one ordered
//! test; the fatal-guard path lives in its own integration binary.

use nexus_icache::{
    abi::host, bootstrapped, handle, install, invalidate_range, invalidate_word, LINE_SIZE,
};

#[test]
fn install_then_steady_state_flushes() {
    assert!(!bootstrapped());
    install();
    assert!(bootstrapped());
    let stub = handle().expect("handle installed");

    // The installer's zero-length self-probe is an ordering assertion, not a
    // real flush; nothing may have reached the platform yet.
    assert_eq!(host::request_count(), 0);

    // Freshly emitted four-line method stub.
    let q = 0x4_0000;
    invalidate_range(q, 4);
    assert_eq!(host::request_count(), 1);
    assert_eq!(host::last_request(), Some((q, q + 4 * LINE_SIZE, 0)));

    // Idempotence: flushing the same range again issues the identical
    // request and changes nothing else.
    invalidate_range(q, 4);
    assert_eq!(host::request_count(), 2);
    assert_eq!(host::last_request(), Some((q, q + 4 * LINE_SIZE, 0)));

    // Zero-length requests after bootstrap are a no-op.
    invalidate_range(q, 0);
    assert_eq!(host::request_count(), 2);

    // The handle returns the caller-supplied token unchanged.
    assert_eq!(stub(q, q + LINE_SIZE, 0xDEAD_BEEF), 0xDEAD_BEEF);
    assert_eq!(host::request_count(), 3);

    // Single-word patches flush exactly the containing line.
    invalidate_word(q + 12);
    assert_eq!(host::request_count(), 4);
    assert_eq!(host::last_request(), Some((q + 8, q + 16, 0)));

    // A second install is a no-op.
    install();
    assert!(bootstrapped());
    assert_eq!(host::request_count(), 4);
}
