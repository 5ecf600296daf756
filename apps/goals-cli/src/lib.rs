//! Goals CLI library
//!
//! Argument definitions, command execution and output formatting for the
//! `goals` binary. Commands write to any [`Write`] so they can be tested
//! without a terminal.

pub mod logging;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use goals_common::{format_date, format_datetime, progress_bar, truncate_string, PROGRESS_BAR_WIDTH};
use goals_core::{
    apply_time_spec, build_report, infer_time_spec, parse_time_spec_input, validate_goal_input,
    CreateGoalRequest, Goal, GoalStore, GoalsError, KeyValueStore, Result, StatsReport, TimeSpec,
    UpdateGoalRequest, WeekComparison,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::instrument;

const LIST_TITLE_WIDTH: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "goals")]
#[command(about = "Track personal goals, deadlines and weekly progress")]
#[command(version)]
pub struct Cli {
    /// Directory holding the goal data (defaults to ~/.goals)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Additional configuration file (JSON or YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create a goal
    Add {
        /// Goal title
        title: String,
        /// Goal description
        description: String,
        /// Time unit for the deadline (days, weeks, months, years)
        #[arg(long, requires = "amount")]
        unit: Option<String>,
        /// Number of units until the deadline
        #[arg(long, requires = "unit")]
        amount: Option<String>,
        /// Sub-goal title (repeatable)
        #[arg(long = "sub-goal")]
        sub_goals: Vec<String>,
    },
    /// List all goals
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one goal
    Show {
        id: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Change a goal
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// New time unit; the deadline is recomputed from now
        #[arg(long, requires = "amount")]
        unit: Option<String>,
        /// New number of units; the deadline is recomputed from now
        #[arg(long, requires = "unit")]
        amount: Option<String>,
        /// Remove the deadline and its time specification
        #[arg(long, conflicts_with_all = ["unit", "amount"])]
        clear_deadline: bool,
        /// Sub-goal title to add (repeatable)
        #[arg(long = "add-sub-goal")]
        add_sub_goals: Vec<String>,
        /// Sub-goal id to remove (repeatable)
        #[arg(long = "remove-sub-goal")]
        remove_sub_goals: Vec<i64>,
        /// Set or clear completion
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a goal completed now
    Complete { id: i64 },
    /// Delete a goal
    Remove { id: i64 },
    /// Overall completion statistics
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Week-over-week completion comparison
    Weekly {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Run one command against the store, writing user-facing output to `writer`
///
/// # Errors
/// Returns an error for invalid input, unknown goal ids, storage failures or
/// if writing fails
#[instrument(skip(store, writer))]
pub async fn execute<S: KeyValueStore, W: Write>(
    command: Commands,
    store: &GoalStore<S>,
    writer: &mut W,
) -> Result<()> {
    match command {
        Commands::Add {
            title,
            description,
            unit,
            amount,
            sub_goals,
        } => {
            validate_goal_input(&title, &description)?;
            let spec = parse_time_spec_input(unit.as_deref(), amount.as_deref())?;

            let request = sub_goals.into_iter().fold(
                CreateGoalRequest::new(title.trim(), description.trim())
                    .with_time_spec(spec)
                    .with_deadline(deadline_from_now(spec)),
                CreateGoalRequest::with_sub_goal,
            );
            let goal = store.try_create(request).await?;
            writeln!(writer, "Created goal {} ({})", goal.title, goal.id)?;
        }
        Commands::List { json } => {
            let goals = store.try_list_all().await?;
            if json {
                print_json(&goals, writer)?;
            } else {
                print_goals(&goals, writer)?;
            }
        }
        Commands::Show { id, json } => {
            let goal = find_goal(store, id).await?;
            if json {
                print_json(&goal, writer)?;
            } else {
                print_goal_details(&goal, Utc::now(), writer)?;
            }
        }
        Commands::Edit {
            id,
            title,
            description,
            unit,
            amount,
            clear_deadline,
            add_sub_goals,
            remove_sub_goals,
            completed,
        } => {
            let mut goal = find_goal(store, id).await?;
            if let Some(title) = title {
                goal.title = title.trim().to_string();
            }
            if let Some(description) = description {
                goal.description = description.trim().to_string();
            }
            validate_goal_input(&goal.title, &goal.description)?;

            if clear_deadline {
                goal.deadline = None;
                goal.time_unit = None;
                goal.time_amount = None;
            } else if let Some(spec) = parse_time_spec_input(unit.as_deref(), amount.as_deref())? {
                goal.deadline = deadline_from_now(Some(spec));
                goal.time_unit = Some(spec.unit);
                goal.time_amount = Some(spec.amount);
            }

            for sub_goal_id in remove_sub_goals {
                if !goal.remove_sub_goal(sub_goal_id) {
                    writeln!(writer, "No sub-goal {sub_goal_id} on this goal")?;
                }
            }
            for sub_goal in add_sub_goals {
                goal.add_sub_goal(sub_goal);
            }

            let mut request = UpdateGoalRequest::from(&goal);
            request.is_completed = completed;
            store
                .try_update(id, request)
                .await?
                .ok_or(GoalsError::GoalNotFound { id })?;
            writeln!(writer, "Updated goal {id}")?;
        }
        Commands::Complete { id } => {
            let goal = store
                .try_mark_completed(id)
                .await?
                .ok_or(GoalsError::GoalNotFound { id })?;
            writeln!(writer, "Completed goal {} ({})", goal.title, goal.id)?;
        }
        Commands::Remove { id } => {
            if !store.try_remove(id).await? {
                return Err(GoalsError::GoalNotFound { id });
            }
            writeln!(writer, "Removed goal {id}")?;
        }
        Commands::Stats { json } => {
            let report = build_report(&store.try_list_all().await?);
            if json {
                print_json(&report.summary, writer)?;
            } else {
                print_stats(&report, writer)?;
            }
        }
        Commands::Weekly { json } => {
            let report = build_report(&store.try_list_all().await?);
            if json {
                print_json(&report.weeks, writer)?;
            } else {
                print_weeks(&report.weeks, writer)?;
            }
        }
    }
    Ok(())
}

/// Deadline for a specification measured from the local current time
#[must_use]
pub fn deadline_from_now(spec: Option<TimeSpec>) -> Option<DateTime<Utc>> {
    apply_time_spec(Local::now(), spec?).map(|deadline| deadline.with_timezone(&Utc))
}

async fn find_goal<S: KeyValueStore>(store: &GoalStore<S>, id: i64) -> Result<Goal> {
    store
        .try_find_by_id(id)
        .await?
        .ok_or(GoalsError::GoalNotFound { id })
}

/// Print goals to the given writer
///
/// # Errors
/// Returns an error if writing fails
pub fn print_goals<W: Write>(goals: &[Goal], writer: &mut W) -> Result<()> {
    if goals.is_empty() {
        writeln!(writer, "No goals found")?;
        return Ok(());
    }

    let now = Utc::now();
    writeln!(writer, "Found {} goals:", goals.len())?;
    for goal in goals {
        let mark = if goal.is_completed { "x" } else { " " };
        writeln!(
            writer,
            "  [{mark}] {} ({})",
            truncate_string(&goal.title, LIST_TITLE_WIDTH),
            goal.id
        )?;
        if let Some(deadline) = &goal.deadline {
            let overdue = if goal.is_overdue(now) { " (overdue)" } else { "" };
            writeln!(
                writer,
                "      Deadline: {}{overdue}",
                format_date(&deadline.with_timezone(&Local).date_naive())
            )?;
        }
        if !goal.sub_goals.is_empty() {
            writeln!(writer, "      Sub-goals: {}", goal.sub_goals.len())?;
        }
    }
    Ok(())
}

/// Print every field of one goal
///
/// # Errors
/// Returns an error if writing fails
pub fn print_goal_details<W: Write>(goal: &Goal, now: DateTime<Utc>, writer: &mut W) -> Result<()> {
    writeln!(writer, "{} ({})", goal.title, goal.id)?;
    writeln!(writer, "  {}", goal.description)?;

    if let Some(deadline) = &goal.deadline {
        writeln!(
            writer,
            "  Deadline: {}",
            format_datetime(&deadline.with_timezone(&Local))
        )?;
    }
    match (goal.time_spec(), goal.deadline) {
        (Some(spec), _) => writeln!(writer, "  Time frame: {spec}")?,
        (None, Some(deadline)) => {
            if let Some(spec) = infer_time_spec(&deadline, &now) {
                writeln!(writer, "  Time left: about {spec}")?;
            }
        }
        (None, None) => {}
    }

    if goal.is_completed {
        match &goal.completed_date {
            Some(date) => writeln!(
                writer,
                "  Completed: {}",
                format_datetime(&date.with_timezone(&Local))
            )?,
            None => writeln!(writer, "  Completed")?,
        }
    } else if goal.is_overdue(now) {
        writeln!(writer, "  Overdue")?;
    }

    if !goal.sub_goals.is_empty() {
        writeln!(writer, "  Sub-goals:")?;
        for sub_goal in &goal.sub_goals {
            writeln!(writer, "    - {} ({})", sub_goal.title, sub_goal.id)?;
        }
    }
    Ok(())
}

/// Print the completion summary with a progress bar
///
/// # Errors
/// Returns an error if writing fails
pub fn print_stats<W: Write>(report: &StatsReport, writer: &mut W) -> Result<()> {
    let summary = &report.summary;
    writeln!(writer, "Total goals: {}", summary.total)?;
    writeln!(writer, "Completed: {}", summary.completed)?;
    writeln!(writer, "Progress: {:.2}%", summary.percentage())?;
    writeln!(
        writer,
        "{}",
        progress_bar(summary.completion_rate(), PROGRESS_BAR_WIDTH)
    )?;
    Ok(())
}

/// Print week-over-week comparison rows
///
/// # Errors
/// Returns an error if writing fails
pub fn print_weeks<W: Write>(weeks: &[WeekComparison], writer: &mut W) -> Result<()> {
    if weeks.is_empty() {
        writeln!(writer, "Not enough completed goals for a weekly comparison")?;
        return Ok(());
    }

    for row in weeks {
        writeln!(
            writer,
            "Week of {}: {} completed ({:+.2}% vs {})",
            format_date(&row.week),
            row.current,
            row.percent_difference,
            row.previous
        )?;
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized, W: Write>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use goals_core::{GoalSummary, SubGoal, TimeUnit};

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "goals", "add", "Run", "5k", "--unit", "weeks", "--amount", "3", "--sub-goal", "Shoes",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Add {
                title: "Run".to_string(),
                description: "5k".to_string(),
                unit: Some("weeks".to_string()),
                amount: Some("3".to_string()),
                sub_goals: vec!["Shoes".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_requires_unit_and_amount_together() {
        assert!(Cli::try_parse_from(["goals", "add", "t", "d", "--unit", "days"]).is_err());
        assert!(Cli::try_parse_from(["goals", "edit", "1", "--amount", "2"]).is_err());
        assert!(Cli::try_parse_from([
            "goals", "edit", "1", "--clear-deadline", "--unit", "days", "--amount", "2"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["goals", "list", "--data-dir", "/tmp/g", "--verbose"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/g")));
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::List { json: false });
    }

    #[test]
    fn test_print_goals_empty() {
        assert_eq!(render(|w| print_goals(&[], w)), "No goals found\n");
    }

    #[test]
    fn test_print_goals_marks_completion() {
        let mut done = Goal::new(1, "Done", "d");
        done.is_completed = true;
        let open = Goal::new(2, "Open", "d");

        let output = render(|w| print_goals(&[done, open], w));
        assert!(output.starts_with("Found 2 goals:"));
        assert!(output.contains("[x] Done (1)"));
        assert!(output.contains("[ ] Open (2)"));
    }

    #[test]
    fn test_print_goal_details_infers_time_left() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut goal = Goal::new(5, "Read", "Two books");
        goal.deadline = Some(now + chrono::Duration::days(14));
        goal.sub_goals.push(SubGoal::new(9, "Book one"));

        let output = render(|w| print_goal_details(&goal, now, w));
        assert!(output.contains("Time left: about 2 weeks"));
        assert!(output.contains("- Book one (9)"));

        goal.time_unit = Some(TimeUnit::Days);
        goal.time_amount = Some(14);
        let output = render(|w| print_goal_details(&goal, now, w));
        assert!(output.contains("Time frame: 14 days"));
    }

    #[test]
    fn test_print_stats() {
        let report = StatsReport {
            summary: GoalSummary {
                total: 4,
                completed: 1,
            },
            weeks: Vec::new(),
        };
        let output = render(|w| print_stats(&report, w));
        assert!(output.contains("Total goals: 4"));
        assert!(output.contains("Progress: 25.00%"));
        assert!(output.contains('['));
    }

    #[test]
    fn test_print_weeks() {
        let rows = vec![WeekComparison {
            week: NaiveDate::from_ymd_opt(2024, 1, 21).unwrap(),
            current: 2,
            previous: 4,
            percent_difference: -50.0,
        }];
        let output = render(|w| print_weeks(&rows, w));
        assert_eq!(output, "Week of 2024-01-21: 2 completed (-50.00% vs 4)\n");

        let output = render(|w| print_weeks(&[], w));
        assert!(output.starts_with("Not enough"));
    }

    #[test]
    fn test_deadline_from_now() {
        assert!(deadline_from_now(None).is_none());
        let deadline = deadline_from_now(TimeSpec::new(TimeUnit::Days, 2)).unwrap();
        assert!(deadline > Utc::now() + chrono::Duration::days(1));
    }
}
