use std::io::{self, Write};

use serde::Serialize;

use crate::app::{FetchAction, FetchItemResult, FetchResult};
use crate::domain::{MANIFEST, ManifestEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_item(item: &FetchItemResult) -> io::Result<()> {
        Self::print_json(item)
    }

    pub fn print_manifest() -> io::Result<()> {
        Self::print_json(&MANIFEST)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(
            stdout,
            "{} of {} datasets downloaded",
            result.downloaded(),
            result.items.len()
        )?;
        for item in &result.items {
            stdout.write_all(render_item(item).as_bytes())?;
        }
        Ok(())
    }

    pub fn print_item(item: &FetchItemResult) -> io::Result<()> {
        io::stdout().write_all(render_item(item).as_bytes())
    }

    pub fn print_manifest() -> io::Result<()> {
        let mut stdout = io::stdout();
        for entry in &MANIFEST {
            stdout.write_all(render_entry(entry).as_bytes())?;
        }
        Ok(())
    }
}

pub fn render_item(item: &FetchItemResult) -> String {
    match (item.action, item.bytes) {
        (FetchAction::Downloaded, Some(bytes)) => {
            format!("  downloaded {:<13} {} ({bytes} bytes)\n", item.dataset, item.path)
        }
        (FetchAction::Downloaded, None) => {
            format!("  downloaded {:<13} {}\n", item.dataset, item.path)
        }
        (FetchAction::Skipped, _) => {
            format!("  present    {:<13} {}\n", item.dataset, item.path)
        }
    }
}

pub fn render_entry(entry: &ManifestEntry) -> String {
    format!(
        "{:<13} {:<6} {:<28} {}\n",
        entry.dataset,
        entry.transport,
        entry.file_name,
        entry.source_url()
    )
}
