//! Output formatting utilities

use crate::error::CliResult;
use colored::*;
use journey_engine::{Notification, NotificationLevel, Notifier};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&data)?),
    }
    Ok(())
}

/// Print a single item in the specified format
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?)
        }
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Print a titled section header (table output only)
pub fn print_heading(title: &str, format: OutputFormat) {
    if format == OutputFormat::Table {
        println!("{}", title.bold());
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message);
}

/// Shows engine notifications on stderr.
///
/// Errors are left to the command's result so they print once.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => print_success(&notification.message),
            NotificationLevel::Info => print_info(&notification.message),
            NotificationLevel::Warning => print_warning(&notification.message),
            NotificationLevel::Error => {
                tracing::debug!(message = %notification.message, "Failure notification")
            }
        }
    }
}

/// Render an optional value as a table cell
pub fn cell<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert!(matches!(format, OutputFormat::Table));
    }

    #[test]
    fn test_cell_placeholder() {
        assert_eq!(cell(Some(3)), "3");
        assert_eq!(cell::<u8>(None), "-");
    }
}
