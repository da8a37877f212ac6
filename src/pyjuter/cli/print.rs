use colored::Colorize;
use pyjuter::api::{CmdMessage, MessageLevel, VerifyReport};
use pyjuter::config::PyjuterConfig;
use unicode_width::UnicodeWidthStr;

const PRIMARY_LABEL: &str = "(main)";

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => eprintln!("{}", message.content.yellow()),
            MessageLevel::Error => eprintln!("{}", message.content.red()),
        }
    }
}

/// One line per module: name padded to the widest name, then its chunk count.
fn format_report(report: &VerifyReport) -> Vec<String> {
    let rows: Vec<(&str, usize)> = std::iter::once((PRIMARY_LABEL, report.primary_chunks))
        .chain(report.modules.iter().map(|(n, c)| (n.as_str(), *c)))
        .collect();
    let width = rows.iter().map(|(n, _)| n.width()).max().unwrap_or(0);

    rows.iter()
        .map(|(name, count)| {
            let padding = width.saturating_sub(name.width());
            let noun = if *count == 1 { "chunk" } else { "chunks" };
            format!("  {}{}  {} {}", name, " ".repeat(padding), count, noun)
        })
        .collect()
}

pub fn print_report(report: &VerifyReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
    if report.skipped_cells > 0 {
        println!(
            "{}",
            format!("  {} non-code cell(s) ignored", report.skipped_cells).dimmed()
        );
    }
}

pub fn print_config(config: &PyjuterConfig) {
    for key in PyjuterConfig::KEYS {
        if let Some(value) = config.get(key) {
            println!("{} = {}", key.bold(), value);
        }
    }
}
