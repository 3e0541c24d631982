// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! monoco-engine: the orchestration engine proper
//!
//! The scheduler turns tasks into supervised agent processes; the router
//! binds bus events to actions; the transition core walks issues through
//! start/submit/close with hook interception and the scoped merge; the
//! mailbox implements the debounced, retryable message transport.

pub mod actions;
pub mod git;
pub mod mailbox;
pub mod router;
pub mod scheduler;
pub mod transition;

pub use actions::{default_bindings, RunCommandAction, SpawnAgentAction};
pub use mailbox::{Mailbox, MailboxError, OutboundDispatcher, ProviderAdapter, ProviderRegistry};
pub use router::{Action, ActionResult, Binding, Condition, Router};
pub use scheduler::{AgentScheduler, SchedulerConfig, SchedulerError, SchedulerStats};
pub use transition::{StartMode, TransitionCore, TransitionError};
