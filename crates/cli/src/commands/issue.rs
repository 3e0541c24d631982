// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `monoco issue` verbs

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand, ValueEnum};
use monoco_core::IssueId;
use monoco_engine::StartMode;
use monoco_ticket::{scan_issues, IssueType, Solution, Status};

#[derive(Args)]
pub struct IssueArgs {
    #[command(subcommand)]
    verb: IssueVerb,
}

#[derive(Clone, Copy, ValueEnum)]
enum TypeArg {
    Epic,
    Feature,
    Fix,
    Chore,
}

impl From<TypeArg> for IssueType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::Epic => IssueType::Epic,
            TypeArg::Feature => IssueType::Feature,
            TypeArg::Fix => IssueType::Fix,
            TypeArg::Chore => IssueType::Chore,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Direct,
    Branch,
    Worktree,
}

impl From<ModeArg> for StartMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Direct => StartMode::Direct,
            ModeArg::Branch => StartMode::Branch,
            ModeArg::Worktree => StartMode::Worktree,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SolutionArg {
    Implemented,
    Cancelled,
    Wontfix,
    Duplicate,
}

impl From<SolutionArg> for Solution {
    fn from(value: SolutionArg) -> Self {
        match value {
            SolutionArg::Implemented => Solution::Implemented,
            SolutionArg::Cancelled => Solution::Cancelled,
            SolutionArg::Wontfix => Solution::Wontfix,
            SolutionArg::Duplicate => Solution::Duplicate,
        }
    }
}

#[derive(Subcommand)]
enum IssueVerb {
    /// Create a draft issue in open/
    Create {
        #[arg(long, value_enum)]
        r#type: TypeArg,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Begin work: create isolation and move to stage doing
    Start {
        id: String,
        #[arg(long, value_enum, default_value = "worktree")]
        mode: ModeArg,
    },
    /// Sync files, lint, and move to stage review
    Submit { id: String },
    /// Scoped merge onto trunk and move to closed/
    Close {
        id: String,
        #[arg(long, value_enum)]
        solution: SolutionArg,
        /// Keep the branch/worktree after closing
        #[arg(long)]
        no_prune: bool,
    },
    /// Refresh the files list from the branch diff
    Sync { id: String },
    /// Report lint violations
    Lint { id: String },
    /// List issues (archived excluded)
    List,
}

fn parse_id(raw: &str) -> Result<IssueId> {
    IssueId::parse(raw).ok_or_else(|| anyhow!("not an issue id: {raw}"))
}

pub async fn run(args: IssueArgs) -> Result<()> {
    match args.verb {
        IssueVerb::Create { r#type, title, body } => {
            let core = super::transition_core()?;
            let issue = core.create(r#type.into(), &title, &body).await?;
            println!("{} created ({})", issue.id, issue.title);
        }
        IssueVerb::Start { id, mode } => {
            let core = super::transition_core()?;
            let issue = core.start(&parse_id(&id)?, mode.into()).await?;
            match &issue.isolation {
                Some(isolation) => println!(
                    "{} doing on {} ({:?})",
                    issue.id, isolation.ref_name, isolation.isolation_type
                ),
                None => println!("{} doing (direct)", issue.id),
            }
        }
        IssueVerb::Submit { id } => {
            let core = super::transition_core()?;
            let issue = core.submit(&parse_id(&id)?).await?;
            println!("{} in review, files: {}", issue.id, issue.files.join(", "));
        }
        IssueVerb::Close { id, solution, no_prune } => {
            let core = super::transition_core()?;
            let issue = core.close(&parse_id(&id)?, solution.into(), !no_prune).await?;
            println!("{} closed ({:?})", issue.id, issue.solution);
        }
        IssueVerb::Sync { id } => {
            let core = super::transition_core()?;
            let files = core.sync_files(&parse_id(&id)?).await?;
            for file in files {
                println!("{file}");
            }
        }
        IssueVerb::Lint { id } => {
            let core = super::transition_core()?;
            let violations = core.lint(&parse_id(&id)?)?;
            if violations.is_empty() {
                println!("clean");
            } else {
                for violation in &violations {
                    eprintln!("{violation}");
                }
                return Err(monoco_engine::TransitionError::Lint(violations).into());
            }
        }
        IssueVerb::List => {
            let (paths, _) = super::project()?;
            for (_, issue) in scan_issues(&paths.issues_root()) {
                if issue.status == Status::Archived {
                    continue;
                }
                println!(
                    "{}  {:8} {:7} {}",
                    issue.id, issue.status, issue.stage, issue.title
                );
            }
        }
    }
    Ok(())
}
