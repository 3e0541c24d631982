// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! monoco-adapters: boundaries to the outside world
//!
//! Engine adapters assemble the argv/env for each supported agent CLI;
//! subprocess and process helpers wrap spawning, timeouts, and graceful
//! kills; the debouncer and fs-watch helpers back the daemon's watchers.

pub mod debounce;
pub mod engine;
pub mod fswatch;
pub mod process;
pub mod subprocess;

pub use debounce::Debouncer;
pub use engine::{CommandSpec, EngineAdapter, EngineError, EngineRegistry};
pub use fswatch::ChangeStream;
pub use process::{pid_alive, terminate_graceful};
pub use subprocess::run_with_timeout;

#[cfg(any(test, feature = "test-support"))]
pub use engine::FakeEngineAdapter;
