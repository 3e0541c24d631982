// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `monoco hook` verbs
//!
//! `run` is the shell-back entry point: git stubs and agent-provider hook
//! bridges invoke it with the event name (native names are translated at
//! the ACL), a JSON payload on stdin, and get the unified decision back:
//! JSON on stdout, exit 0 for allow, 2 for deny.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use monoco_core::Verdict;
use monoco_hooks::{install_git_hooks, to_native_decision, to_unified_event, HookSite, HookType};
use std::io::Read;

#[derive(Args)]
pub struct HookArgs {
    #[command(subcommand)]
    verb: HookVerb,
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeArg {
    Git,
    Ide,
    Agent,
    Issue,
}

impl From<TypeArg> for HookType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::Git => HookType::Git,
            TypeArg::Ide => HookType::Ide,
            TypeArg::Agent => HookType::Agent,
            TypeArg::Issue => HookType::Issue,
        }
    }
}

#[derive(Subcommand)]
enum HookVerb {
    /// Write the git hook stubs into .git/hooks/
    Install,
    /// Dispatch one interception point and report the decision
    Run {
        #[arg(value_enum)]
        r#type: TypeArg,
        /// Event name; provider-native names are accepted with --provider
        event: String,
        /// Agent provider (claude-code, gemini-cli, ...)
        #[arg(long)]
        provider: Option<String>,
        /// Tool name for matcher filtering
        #[arg(long)]
        tool: Option<String>,
        /// Emit the provider's native decision schema instead of the
        /// unified one
        #[arg(long)]
        native: bool,
    },
}

fn read_stdin_payload() -> serde_json::Value {
    let mut raw = String::new();
    if std::io::stdin().read_to_string(&mut raw).is_err() || raw.trim().is_empty() {
        return serde_json::Value::Object(Default::default());
    }
    serde_json::from_str(&raw).unwrap_or(serde_json::Value::Object(Default::default()))
}

pub async fn run(args: HookArgs) -> Result<()> {
    match args.verb {
        HookVerb::Install => {
            let (paths, _) = super::project()?;
            let installed = install_git_hooks(paths.root())?;
            for hook in installed {
                println!("installed {hook}");
            }
        }
        HookVerb::Run {
            r#type,
            event,
            provider,
            tool,
            native,
        } => {
            // Accept native spellings from provider bridges
            let unified = provider
                .as_deref()
                .and_then(|p| to_unified_event(p, &event))
                .map(String::from)
                .unwrap_or(event);

            let hook_type: HookType = r#type.into();
            let site = HookSite {
                hook_type,
                event: unified,
                provider: provider.clone(),
                tool,
            };

            let engine = super::hook_engine()?;
            let payload = read_stdin_payload();
            let decision = engine.dispatch(&site, &payload).await;

            let out = match (&provider, native) {
                (Some(provider), true) => to_native_decision(provider, &decision),
                _ => serde_json::to_value(&decision)?,
            };
            println!("{out}");

            if decision.decision == Verdict::Deny {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}
