//! Progress display functionality for file transfers

use std::io::{self, Write};

use crate::transfer::TransferProgress;

const BAR_WIDTH: usize = 50;

/// Render one progress line for `filename`, overwriting the previous one
pub fn render_progress(filename: &str, progress: &TransferProgress) -> String {
    match progress.percentage() {
        Some(percentage) => {
            let filled = ((percentage / 100.0) * BAR_WIDTH as f64) as usize;
            let filled = filled.min(BAR_WIDTH);
            let bar = "#".repeat(filled) + &" ".repeat(BAR_WIDTH - filled);
            format!(
                "\r{}: [{}] {:.1}% ({}) {}",
                filename,
                bar,
                percentage,
                format_bytes(progress.transferred_bytes()),
                format_speed(progress.speed_bps())
            )
        }
        None => format!(
            "\r{}: {} {}",
            filename,
            format_bytes(progress.transferred_bytes()),
            format_speed(progress.speed_bps())
        ),
    }
}

/// Display transfer progress bar
pub fn display_progress(filename: &str, progress: &TransferProgress) {
    print!("{}", render_progress(filename, progress));

    if let Err(e) = io::stdout().flush() {
        eprintln!("\nError flushing stdout: {}", e);
    }
}

/// Clear the progress line and move to next line
pub fn finish_progress() {
    println!();
}

/// Format bytes as human readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format speed as human readable string
pub fn format_speed(bps: f64) -> String {
    format!("{}/s", format_bytes(bps as u64))
}
