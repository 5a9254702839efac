//! # Validate and Windows Subcommands
//!
//! ```bash
//! # Check the marks against a 12-week, 36-day policy with US holidays:
//! presence validate --config presence.yaml --marks marks.yaml --country US
//!
//! # Show every window, compliant or not:
//! presence windows --marks marks.yaml --window-weeks 4 --min-days 12
//! ```
//!
//! `validate` exits 0 when compliant and 1 when a window falls short.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use presence_compliance::{scan_windows, ComplianceMonitor, ComplianceStatus, ComplianceWindow};
use presence_core::{CalendarDate, DateRange};
use presence_store::Statistics;

use crate::session::{prepare, Session};
use crate::settings::{Settings, SettingsArgs};

/// Arguments shared by `validate` and `windows`.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// YAML file mapping `YYYY-MM-DD` to `working`, `oof` or `holiday`.
    #[arg(long)]
    pub marks: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    range: DateRange,
    statistics: Statistics,
    holidays: usize,
    #[serde(flatten)]
    status: &'a ComplianceStatus,
}

#[derive(Debug, Serialize)]
struct WindowsReport<'a> {
    range: DateRange,
    window_weeks: u32,
    min_compliant_days: u32,
    windows: &'a [ComplianceWindow],
}

async fn open_session(args: &ValidateArgs, config: Option<&Path>, today: CalendarDate) -> Result<Session> {
    let mut settings = Settings::load(config)?;
    args.settings.apply(&mut settings, today)?;
    prepare(&settings, args.marks.as_deref(), today).await
}

/// Execute `validate`.
pub async fn run_validate(args: &ValidateArgs, config: Option<&Path>, today: CalendarDate) -> Result<u8> {
    let session = open_session(args, config, today).await?;
    let monitor = ComplianceMonitor::new(session.policy);
    let status = monitor.run(&session.store, &session.exclusions);
    let statistics = session.store.statistics();

    if args.json {
        let report = ValidationReport {
            range: session.store.range(),
            statistics,
            holidays: session.exclusions.len(),
            status: &status,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Range:       {}", session.store.range());
        println!(
            "Policy:      {} in-office days per {}-week window",
            session.policy.min_compliant_days(),
            session.policy.window_weeks()
        );
        println!("Holidays:    {}", session.exclusions.len());
        println!(
            "Marked:      {} working, {} oof, {} holiday ({} total)",
            statistics.working_days, statistics.oof_days, statistics.holiday_days, statistics.total_marked_days
        );
        println!();
        let verdict = if status.result.is_valid { "PASS" } else { "FAIL" };
        println!("{verdict}  {}", status.result.message);
    }

    Ok(if status.result.is_valid { 0 } else { 1 })
}

/// Execute `windows`.
pub async fn run_windows(args: &ValidateArgs, config: Option<&Path>, today: CalendarDate) -> Result<u8> {
    let session = open_session(args, config, today).await?;
    let snapshot = session.store.snapshot();
    let windows = scan_windows(&snapshot.states, &snapshot.range, &session.exclusions, &session.policy);

    if args.json {
        let report = WindowsReport {
            range: snapshot.range,
            window_weeks: session.policy.window_weeks(),
            min_compliant_days: session.policy.min_compliant_days(),
            windows: &windows,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    if windows.is_empty() {
        println!(
            "No complete {}-week window fits in {}",
            session.policy.window_weeks(),
            snapshot.range
        );
        return Ok(0);
    }

    println!("  {:<10}  {:<10}  {:>8}  {:>9}  status", "start", "end", "weekdays", "in-office");
    for w in &windows {
        println!(
            "  {:<10}  {:<10}  {:>8}  {:>9}  {}",
            w.start_date.to_iso(),
            w.end_date.to_iso(),
            w.weekdays_in_window,
            w.compliant_days,
            if w.is_compliant { "ok" } else { "SHORT" }
        );
    }
    let short = windows.iter().filter(|w| !w.is_compliant).count();
    println!();
    println!("{} windows, {short} below {} in-office days", windows.len(), session.policy.min_compliant_days());
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn args_for(marks: &Path) -> ValidateArgs {
        ValidateArgs {
            marks: Some(marks.to_path_buf()),
            json: true,
            settings: SettingsArgs {
                window_weeks: Some(1),
                min_compliant_days: Some(3),
                start: Some(d("2026-02-01")),
                end: Some(d("2026-02-28")),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn validate_exits_one_on_violation() {
        let dir = tempfile::tempdir().unwrap();
        let marks = dir.path().join("marks.yaml");
        std::fs::write(&marks, "2026-02-02: working\n2026-02-03: working\n2026-02-04: working\n").unwrap();

        let code = run_validate(&args_for(&marks), None, d("2026-02-10")).await.unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn validate_exits_zero_when_every_window_passes() {
        let dir = tempfile::tempdir().unwrap();
        let marks = dir.path().join("marks.yaml");
        let lines: String = DateRange::new(d("2026-02-01"), d("2026-02-28"))
            .unwrap()
            .days()
            .filter(|day| presence_core::is_weekday(*day))
            .map(|day| format!("{day}: working\n"))
            .collect();
        std::fs::write(&marks, lines).unwrap();

        let mut args = args_for(&marks);
        args.json = false;
        assert_eq!(run_validate(&args, None, d("2026-02-10")).await.unwrap(), 0);
        assert_eq!(run_windows(&args, None, d("2026-02-10")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_marks_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_validate(&args_for(&dir.path().join("absent.yaml")), None, d("2026-02-10")).await;
        assert!(result.is_err());
    }
}
