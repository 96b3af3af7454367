mod config_cmd;
mod entry;
mod note;

use chrono::{Local, NaiveDate};
use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use entry::{AddArgs, MoveArgs, RemoveArgs, ReorderArgs, ShowArgs};
pub use note::NoteArgs;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a `YYYY-MM-DD` date, defaulting to today.
pub fn parse_date(date: Option<&str>) -> Result<NaiveDate, String> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", d)),
        None => Ok(Local::now().date_naive()),
    }
}
