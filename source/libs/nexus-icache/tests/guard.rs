// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bypassing the installer is a fatal ordering violation.

#[test]
#[should_panic(expected = "before install")]
fn invalidation_before_install_is_fatal() {
    nexus_icache::invalidate_range(0x8000, 1);
}
