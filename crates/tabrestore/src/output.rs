use std::io::{self, Write};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tabrestore_navigation::UpdateTabNavigation;

/// Timestamp layout used by the plain text output.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Title, timestamp twice and URL, one value per line.
    Pretty,
    /// One JSON object per line.
    Json,
    /// A table printed once the whole log is decoded.
    Table,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a> {
    Navigation(NavigationOutput<'a>),
    UnknownCommand { id: u8 },
}

#[derive(Serialize)]
struct NavigationOutput<'a> {
    tab_id: i32,
    index: i32,
    title: &'a str,
    virtual_url: &'a str,
    timestamp: String,
    transition: String,
    has_post_data: bool,
    referrer_url: Option<&'a str>,
    referrer_policy: Option<String>,
    original_request_url: &'a str,
    is_overriding_user_agent: bool,
    revision: String,
}

impl<'a> NavigationOutput<'a> {
    fn new(update: &'a UpdateTabNavigation) -> Self {
        let nav = &update.navigation;
        Self {
            tab_id: update.tab_id,
            index: nav.index,
            title: &nav.title,
            virtual_url: &nav.virtual_url,
            timestamp: DateTime::<Local>::from(nav.timestamp).to_rfc3339(),
            transition: nav.transition_type.to_string(),
            has_post_data: nav.has_post_data,
            referrer_url: nav.referrer.as_ref().map(|r| r.url.as_str()),
            referrer_policy: nav.referrer.as_ref().map(|r| r.policy.to_string()),
            original_request_url: &nav.original_request_url,
            is_overriding_user_agent: nav.is_overriding_user_agent,
            revision: format!("{:?}", nav.revision),
        }
    }
}

/// Writes decoded commands in the selected format.
pub struct Printer<W> {
    out: W,
    format: OutputFormat,
    table: Option<Table>,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        let table = (format == OutputFormat::Table).then(|| {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TAB", "INDEX", "TITLE", "URL", "TRANSITION", "REFERRER"]);
            table
        });
        Self { out, format, table }
    }

    pub fn navigation(&mut self, update: &UpdateTabNavigation) -> io::Result<()> {
        let nav = &update.navigation;
        match self.format {
            OutputFormat::Pretty => {
                let timestamp = format_timestamp(nav.timestamp);
                writeln!(self.out, "{}", nav.title)?;
                writeln!(self.out, "{timestamp}")?;
                writeln!(self.out, "{timestamp}")?;
                writeln!(self.out, "{}", nav.virtual_url)
            }
            OutputFormat::Json => {
                self.json_line(&Record::Navigation(NavigationOutput::new(update)))
            }
            OutputFormat::Table => {
                if let Some(table) = self.table.as_mut() {
                    table.add_row(vec![
                        update.tab_id.to_string(),
                        nav.index.to_string(),
                        nav.title.clone(),
                        nav.virtual_url.clone(),
                        nav.transition_type.to_string(),
                        nav.referrer
                            .as_ref()
                            .map(|r| r.url.clone())
                            .unwrap_or_default(),
                    ]);
                }
                Ok(())
            }
        }
    }

    pub fn unknown_command(&mut self, id: u8) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.json_line(&Record::UnknownCommand { id }),
            OutputFormat::Pretty | OutputFormat::Table => {
                writeln!(self.out, "Unknown command {id}")
            }
        }
    }

    /// Flush buffered output, printing the table if one was collected.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(table) = self.table.take() {
            writeln!(self.out, "{table}")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn json_line<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        writeln!(self.out)
    }
}

pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use tabrestore_navigation::{NavigationRecord, Referrer, ReferrerPolicy};

    use super::*;

    fn update() -> UpdateTabNavigation {
        UpdateTabNavigation::new(
            9,
            NavigationRecord {
                index: 2,
                title: "Docs".to_string(),
                virtual_url: "https://docs.rs/".to_string(),
                referrer: Some(Referrer::new("https://crates.io/", ReferrerPolicy::Default)),
                ..NavigationRecord::default()
            },
        )
    }

    fn render(format: OutputFormat) -> String {
        let mut printer = Printer::new(Vec::new(), format);
        printer.navigation(&update()).unwrap();
        printer.unknown_command(42).unwrap();
        String::from_utf8(printer.finish().unwrap()).unwrap()
    }

    #[test]
    fn pretty_prints_title_timestamps_and_url() {
        let out = render(OutputFormat::Pretty);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Docs");
        assert_eq!(lines[1], lines[2]);
        assert_eq!(lines[3], "https://docs.rs/");
        assert_eq!(lines[4], "Unknown command 42");
    }

    #[test]
    fn json_is_one_object_per_line() {
        let out = render(OutputFormat::Json);
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "navigation");
        assert_eq!(lines[0]["tab_id"], 9);
        assert_eq!(lines[0]["referrer_url"], "https://crates.io/");
        assert_eq!(lines[1]["kind"], "unknown_command");
        assert_eq!(lines[1]["id"], 42);
    }

    #[test]
    fn table_is_printed_on_finish() {
        let out = render(OutputFormat::Table);
        assert!(out.starts_with("Unknown command 42"));
        assert!(out.contains("https://docs.rs/"));
        assert!(out.contains("TITLE"));
    }

    #[test]
    fn timestamp_has_microseconds() {
        let formatted = format_timestamp(SystemTime::UNIX_EPOCH);
        let (_, fraction) = formatted.rsplit_once('.').unwrap();
        assert_eq!(fraction.len(), 6);
    }
}
