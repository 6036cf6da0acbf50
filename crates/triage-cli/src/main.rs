#![forbid(unsafe_code)]

//! Demo binary: triage a JSON project snapshot with a built-in rule set.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use triage_core::app::{Collaborators, Triager, TriagerBuilder, TriagerConfig, parse_offset};
use triage_core::domain::{Action, RunReport, parse_duration};
use triage_core::impls::InMemoryProject;
use triage_core::ports::{Clock, FixedClock, SystemClock};
use triage_core::predicates::{
    AlwaysTrue, Assigned, DueWithin, HasUnsetEnum, IsComplete, Overdue, PredicateExt, Unassigned,
    Untriaged,
};
use triage_core::rules::StaticActions;
use triage_core::sorters::{DueDateSorter, EnumCustomFieldSorter, SorterExt};
use triage_core::workflow::{Workflow, WorkflowStage};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "triage: rule-driven triage of a project snapshot",
    long_about = None
)]
struct Cli {
    /// Project snapshot to load into the in-memory service.
    #[arg(long, env = "TRIAGE_SNAPSHOT")]
    snapshot: PathBuf,

    /// Project name or gid.
    #[arg(long, env = "TRIAGE_PROJECT", default_value = "Bugs")]
    project: String,

    /// Offset for date-only comparisons, e.g. +09:00.
    #[arg(long, env = "TRIAGE_TZ_OFFSET", default_value = "Z")]
    tz: String,

    /// Evaluate as of this instant (RFC 3339) instead of now.
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Record what would be sent without sending it.
    #[arg(long, env = "TRIAGE_DRY_RUN")]
    dry_run: bool,

    /// Include completed items.
    #[arg(long)]
    all_items: bool,

    /// Which passes to run.
    #[arg(long, value_enum, default_value_t = Pass::Both)]
    pass: Pass,

    /// Print the snapshot after the run instead of the reports.
    #[arg(long)]
    show_state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pass {
    Triage,
    Sort,
    Both,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRIAGE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "triage=debug,info"
        } else {
            "triage=info,warn"
        })
    });

    let format = env::var("TRIAGE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Rules, the bug workflow and the Inbox order used by the demo.
fn register(builder: TriagerBuilder) -> Result<TriagerBuilder> {
    let two_days = parse_duration("2d")?;

    let workflow = Workflow::sections(
        "Bugs",
        vec![
            WorkflowStage::new("Inbox", AlwaysTrue),
            WorkflowStage::new("Doing", Assigned::new())
                .on_enter([Action::add_comment("Picked up; moved to Doing.")]),
            WorkflowStage::new("Done", IsComplete),
        ],
    )?;

    Ok(builder
        .when(
            Overdue.and(Unassigned),
            StaticActions::from(Action::add_comment("Overdue and nobody owns it.")),
        )
        .when(
            HasUnsetEnum::new("Priority").and(Untriaged::for_at_least(two_days)),
            StaticActions::new([
                Action::set_enum_field("Priority", "Medium"),
                Action::add_comment("No priority after two days; defaulted to Medium."),
            ]),
        )
        .when(
            DueWithin::new(two_days).and(Unassigned),
            StaticActions::new([
                Action::add_comment("Due within two days and unassigned."),
                Action::add_follower("lead@example.com"),
            ]),
        )
        .apply(workflow)
        .order(
            "Inbox",
            EnumCustomFieldSorter::new("Priority", ["High", "Medium", "Low"])
                .and_then(DueDateSorter::new()),
        ))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let json = fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("reading snapshot {}", cli.snapshot.display()))?;
    let project = Arc::new(
        InMemoryProject::from_json(&json)
            .with_context(|| format!("parsing snapshot {}", cli.snapshot.display()))?,
    );

    let config = TriagerConfig::new(&cli.project)
        .with_timezone_offset(parse_offset(&cli.tz)?)
        .with_dry_run(cli.dry_run)
        .with_only_incomplete(!cli.all_items);
    let clock: Arc<dyn Clock> = match cli.now {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => Arc::new(SystemClock),
    };

    let builder = Triager::builder(config, Collaborators::from_shared(project.clone()), clock);
    let triager = register(builder)?
        .build()
        .await
        .context("building triager")?;
    info!(
        project = %cli.project,
        rules = triager.rule_labels().count(),
        actor = %triager.actor().name,
        "triager ready"
    );

    let mut reports: Vec<RunReport> = Vec::new();
    if matches!(cli.pass, Pass::Triage | Pass::Both) {
        reports.push(triager.triage().await?);
    }
    if matches!(cli.pass, Pass::Sort | Pass::Both) {
        reports.push(triager.sort().await?);
    }

    if cli.show_state {
        print_json(&project.snapshot().await)
    } else {
        print_json(&reports)
    }
}
