use colored::*;
use humansize::{format_size, BINARY};

use crate::core::system_monitor::{ProcessRecord, ProcessSummary};

/// Format a byte count in human-readable binary units (KiB, MiB, ...)
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// Colour a percentage by load: green below 50, yellow below 80, red above
pub fn colorize_pct(pct: f64) -> ColoredString {
    let text = format!("{:>5.1}", pct);
    if pct >= 80.0 {
        text.red().bold()
    } else if pct >= 50.0 {
        text.yellow()
    } else {
        text.green()
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn format_row(process: &ProcessRecord) -> String {
    format!(
        "{:>7} {:<10} {} {} {:>10} {:>9} {:>3} {:<2} {}",
        process.pid,
        truncate(&process.user, 10),
        colorize_pct(process.cpu),
        colorize_pct(process.mem),
        format_bytes(process.rss_mb * 1024 * 1024),
        process.etime,
        process.ni,
        process.state,
        process.command.bold()
    )
}

/// Print a process summary as an aligned table
pub fn print_process_table(summary: &ProcessSummary) {
    println!(
        "{}",
        format!(
            "{:>7} {:<10} {:>5} {:>5} {:>10} {:>9} {:>3} {:<2} {}",
            "PID", "USER", "CPU%", "MEM%", "RSS", "ELAPSED", "NI", "S", "COMMAND"
        )
        .bold()
        .underline()
    );

    for process in &summary.list {
        println!("{}", format_row(process));
    }

    println!(
        "\n{}",
        format!("{} of {} matching processes", summary.list.len(), summary.total).dimmed()
    );
}
