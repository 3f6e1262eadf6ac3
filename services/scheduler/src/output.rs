//! Output formatting for the CLI.

use colored::Colorize;
use hostsched_filters::{FilterDescriptor, HostVerdict};
use hostsched_scheduler::driver::{SchedulerError, Selection};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow::anyhow!(
                "unknown output format '{other}' (expected table or json)"
            )),
        }
    }
}

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "HOST")]
    host: String,
    #[tabled(rename = "RESULT")]
    result: String,
    #[tabled(rename = "REJECTED BY")]
    rejected_by: String,
}

#[derive(Serialize, Tabled)]
struct FilterRow {
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(rename = "FILTER")]
    name: &'static str,
}

#[derive(Serialize)]
struct ScheduleReport<'a> {
    verdicts: &'a [HostVerdict],
    selection: Option<&'a Selection>,
}

fn to_json<T: Serialize>(data: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| fallback.to_string())
}

/// Print the registered filters of a namespace.
pub fn print_filters(namespace: &str, descriptors: &[FilterDescriptor], format: OutputFormat) {
    let rows: Vec<FilterRow> = descriptors
        .iter()
        .map(|d| FilterRow {
            namespace: namespace.to_string(),
            name: d.name,
        })
        .collect();

    match format {
        OutputFormat::Table if rows.is_empty() => println!("{}", "No filters registered.".dimmed()),
        OutputFormat::Table => println!("{}", Table::new(&rows)),
        OutputFormat::Json => println!("{}", to_json(&rows, "[]")),
    }
}

/// JSON report of a scheduling run.
fn schedule_value(verdicts: &[HostVerdict], selection: Option<&Selection>) -> serde_json::Value {
    serde_json::to_value(ScheduleReport { verdicts, selection }).unwrap_or_default()
}

/// Print per-host verdicts and the selected host, if any.
pub fn print_schedule(
    verdicts: &[HostVerdict],
    selection: Option<&Selection>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<VerdictRow> = verdicts
                .iter()
                .map(|v| VerdictRow {
                    host: v.host.to_string(),
                    result: if v.passed {
                        "pass".green().to_string()
                    } else {
                        "fail".red().to_string()
                    },
                    rejected_by: v.rejected_by.unwrap_or("-").to_string(),
                })
                .collect();
            if rows.is_empty() {
                println!("{}", "No candidate hosts.".dimmed());
            } else {
                println!("{}", Table::new(&rows));
            }
            if let Some(selection) = selection {
                println!("{} {}", "Selected:".green().bold(), selection.host);
            }
        }
        OutputFormat::Json => {
            let value = schedule_value(verdicts, selection);
            println!("{}", to_json(&value, "{}"));
        }
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(sched_err) = err.downcast_ref::<SchedulerError>() {
        match sched_err {
            SchedulerError::Configuration(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check HOSTSCHED_FILTERS against `hostsched filters`.".yellow()
                );
            }
            SchedulerError::NoValidHost(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Run `hostsched schedule` with --format json to see why each host failed."
                        .yellow()
                );
            }
            SchedulerError::InvalidRequest(_) => {}
        }
    }
}
