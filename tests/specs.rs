//! Behavioral specifications for the Monoco orchestration engine.
//!
//! These tests drive the library components end-to-end in a temp project:
//! real watchers, the real bus, router, and scheduler, with the fake engine
//! standing in for the agent CLI. See tests/specs/prelude.rs for the
//! fixture.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/memo_to_architect.rs"]
mod memo_to_architect;

#[path = "specs/engineer_on_stage.rs"]
mod engineer_on_stage;

#[path = "specs/agent_quota.rs"]
mod agent_quota;

#[path = "specs/inbound_debounce.rs"]
mod inbound_debounce;

#[path = "specs/daemon_restart.rs"]
mod daemon_restart;
