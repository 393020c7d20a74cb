//! Log formatting helpers shared by the core.
//!
//! The core only writes through the `log` facade; the binary decides where
//! records go. These helpers keep bag and phase boundaries easy to spot in
//! a long run log.

use log::{debug, info};

/// Section heading around one bag.
pub fn log_section(title: &str) {
    info!("");
    info!("{}", "=".repeat(50));
    info!("{}", title);
    info!("{}", "=".repeat(50));
}

/// Heading for one validation or repair phase.
pub fn log_subsection(title: &str) {
    debug!("{}", "-".repeat(40));
    debug!("{}", title);
    debug!("{}", "-".repeat(40));
}

/// One-line status with an icon, e.g. a bag verdict.
pub fn log_status(status: &str, message: &str) {
    let icon = match status.to_lowercase().as_str() {
        "passed" | "verified" | "done" => "✅",
        "failed" | "error" => "❌",
        "warning" | "repaired" => "⚠️ ",
        "skipped" | "cancelled" => "⏭️ ",
        _ => "•",
    };
    info!("{} {} {}", icon, status, message);
}
