// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Instruction-cache coherence for freshly generated code
//! OWNERS: @runtime
//! PUBLIC API: install, invalidate_range, invalidate_word, flush_icache_range, FlushStub, AddressRange, FlushFlags
//! DEPENDS_ON: riscv ecall asm (OS), spin, bitflags, static_assertions
//! INVARIANTS: First invalidation in the process targets the flush routine itself; every delegated flush is global (all harts)
//!
//! On RISC-V the data path and the instruction-fetch path are not coherent:
//! after a JIT or stub generator writes instruction bytes into executable
//! memory, a hart may keep fetching a stale copy until the instruction cache
//! is explicitly invalidated. `fence.i` only orders fetches on the issuing
//! hart, so the kernel exposes a flush request that is propagated to every
//! hart. This crate wraps that request behind a write-once flush handle and
//! enforces the bootstrap ordering the code cache depends on: the very first
//! invalidation in the process must cover the flush routine's own code.
//!
//! Typical use from the code-generation side:
//!
//! ```
//! nexus_icache::install();
//! // ... emit code into `[addr, addr + 4 * LINE_SIZE)` ...
//! # let addr = 0x1000;
//! nexus_icache::invalidate_range(addr, 4);
//! // the emitted code is now safe to execute on any hart
//! ```
//!
//! Host builds (anything that is not `riscv64`/`target_os = "none"`) route
//! the privileged request into a recording stub so the high-level logic
//! stays exercisable in tests.

pub mod abi;
pub mod diag;
mod flush;
mod range;
mod stub;

pub use abi::{FlushFlags, SYSCALL_FLUSH_ICACHE};
pub use flush::{flush_icache_range, flush_icache_stub};
pub use range::{AddressRange, LINE_SIZE, LOG2_LINE_SIZE};
pub use stub::{bootstrapped, handle, install, invalidate_range, invalidate_word, FlushStub};
