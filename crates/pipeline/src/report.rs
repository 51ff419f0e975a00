//! Human-readable recommendation report.
//!
//! One line per user:
//! `User <id>: (Item: <item>, Rating: <rating>), (Item: ..., Rating: ...)`
//! with ratings printed to four decimal places.

use recommender::UserRecommendations;
use std::io::{self, Write};

/// Header printed before the per-user lines
pub const REPORT_HEADER: &str = "--- Final Clipped Recommendations ---";

/// Note printed under the header
pub const REPORT_NOTE: &str = "(Note: User/Item IDs are hashed integers. Ratings are clipped to [1,5])";

/// Format one user's recommendations as a summary line
pub fn format_user_line(row: &UserRecommendations) -> String {
    let entries: Vec<String> = row
        .recommendations
        .iter()
        .map(|r| format!("(Item: {}, Rating: {:.4})", r.item_id, r.rating))
        .collect();
    format!("User {}: {}", row.user_id, entries.join(", "))
}

/// Format every row; nothing is written until all lines exist
pub fn format_report(rows: &[UserRecommendations]) -> Vec<String> {
    rows.iter().map(format_user_line).collect()
}

/// Write the header, note and summary lines to `out`
pub fn write_report<W: Write>(out: &mut W, lines: &[String]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{REPORT_HEADER}")?;
    writeln!(out, "{REPORT_NOTE}")?;
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
