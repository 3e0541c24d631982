// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit-code mapping
//!
//! 0 is success; non-zero encodes the error category so scripts can branch
//! without parsing stderr.

use monoco_core::error::{Classified, ErrorClass};

pub fn class_code(class: ErrorClass) -> i32 {
    match class {
        ErrorClass::Validation => 2,
        ErrorClass::Precondition => 3,
        ErrorClass::HookDenied => 4,
        ErrorClass::QuotaExhausted => 5,
        ErrorClass::AgentFailed => 6,
        ErrorClass::MergeConflict => 7,
        ErrorClass::TransientIo => 8,
        ErrorClass::Fatal => 9,
    }
}

/// Walk the anyhow chain looking for a classified error.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<monoco_engine::TransitionError>() {
            return class_code(e.class());
        }
        if let Some(e) = cause.downcast_ref::<monoco_engine::MailboxError>() {
            return class_code(e.class());
        }
        if let Some(e) = cause.downcast_ref::<monoco_ticket::TicketError>() {
            return class_code(e.class());
        }
    }
    1
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
