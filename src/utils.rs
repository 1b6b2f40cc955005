use chrono::{NaiveDate, NaiveTime};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

/// Get the configuration directory path for qplan
/// If profile is Dev, uses "qplan-dev" instead of "qplan"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "qplan-dev",
        Profile::Prod => "qplan",
    };
    ProjectDirs::from("com", "qplan", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for qplan
/// If profile is Dev, uses "qplan-dev" instead of "qplan"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "qplan-dev",
        Profile::Prod => "qplan",
    };
    ProjectDirs::from("com", "qplan", app_name).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Parse a time-of-day string in HH:MM format
pub fn parse_time(time_str: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(time_str, "%H:%M")
}

/// Today's date on the local wall clock
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Format accrued timer seconds as HH:MM:SS
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
