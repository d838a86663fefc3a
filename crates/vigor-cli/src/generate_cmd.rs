//! `vigor generate` command: build a weekly plan for a profile.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use vigor_core::completion::CompletionTracker;
use vigor_core::generate::{Generated, ScheduleGenerator};
use vigor_core::profile::ProfileDraft;
use vigor_core::progress::{ProjectedPoint, weekly_completion};
use vigor_core::session::Session;

use crate::config::{Overrides, VigorConfig};
use crate::render;

/// Everything `generate` reports, in JSON or text form.
#[derive(Debug, Serialize)]
pub struct GenerateReport {
    #[serde(flatten)]
    pub generated: Generated,
    pub selected_day: usize,
    /// Item indices marked done on the selected day.
    pub completed: Vec<usize>,
    /// Completion percentage of the selected day.
    pub completion: u8,
    pub weekly_completion: Vec<u8>,
    pub projection: Vec<ProjectedPoint>,
    #[serde(skip)]
    pub completions: CompletionTracker,
}

/// Generate a schedule through a session, then apply the day selection and
/// completion marks.
pub async fn build_report(
    draft: &ProfileDraft,
    generator: &ScheduleGenerator,
    day: usize,
    done: &[usize],
    cancel: &CancellationToken,
) -> Result<GenerateReport> {
    let mut session = Session::new();
    session.generate(draft, generator, cancel).await?;
    session.select_day(day)?;

    let item_count = session.selected_day_schedule()?.item_count();
    let done: BTreeSet<usize> = done.iter().copied().collect();
    for &item in &done {
        if item >= item_count {
            bail!("item {item} is out of range (day {day} has {item_count} items)");
        }
        session.toggle(day, item)?;
    }

    let completions = session.completions().clone();
    let generated = session.generated()?.clone();
    Ok(GenerateReport {
        weekly_completion: weekly_completion(&generated.schedule, &completions),
        completion: session.progress()?,
        projection: session.projection(),
        completed: completions
            .completed_keys()
            .into_iter()
            .filter(|key| key.day == day)
            .map(|key| key.item)
            .collect(),
        selected_day: session.selected_day(),
        generated,
        completions,
    })
}

/// Run the generate command.
pub async fn run_generate(
    draft: &ProfileDraft,
    day: usize,
    done: &[usize],
    json: bool,
    overrides: &Overrides,
) -> Result<()> {
    let config = VigorConfig::resolve(overrides)?;
    let generator = config.schedule_generator()?;
    if !generator.is_configured() {
        warn!(
            "No AI backend configured; using the built-in plan. Run `vigor init --api-key <KEY>` to enable AI generation."
        );
    }

    // First signal cancels generation, second force-exits.
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let got_first_signal = Arc::new(AtomicBool::new(false));
    let got_first_clone = Arc::clone(&got_first_signal);
    let signal_task = tokio::spawn(async move {
        loop {
            tokio::signal::ctrl_c().await.ok();
            if got_first_clone.swap(true, Ordering::SeqCst) {
                eprintln!("\nForce exit.");
                std::process::exit(130);
            }
            eprintln!("\nCancelling generation (Ctrl+C again to force)...");
            warn!("generation cancelled by signal");
            cancel_clone.cancel();
        }
    });

    let report = build_report(draft, &generator, day, done, &cancel).await;
    signal_task.abort();
    let report = report?;

    if json {
        let out =
            serde_json::to_string_pretty(&report).context("failed to serialize schedule")?;
        println!("{out}");
        return Ok(());
    }

    let schedule = &report.generated.schedule;
    let completions = &report.completions;

    println!("{}", render::source_line(&report.generated));
    println!();
    print!("{}", render::format_week(schedule, completions));
    println!();
    if let Some(day) = schedule.day(report.selected_day) {
        print!("{}", render::format_day(day, report.selected_day, completions));
    }
    println!();
    println!("Projected levels:");
    print!("{}", render::format_projection(&report.projection));

    Ok(())
}
