// Colored terminal output for ranked signals and cluster summaries.
//
// This module handles all terminal-specific formatting: colors, tables,
// priority markers. The main.rs display paths delegate here.

use colored::Colorize;

use crate::signal::{ClusterStats, ClusterSummary};

/// Display the ranked signals table in the terminal.
pub fn display_signal_table(stats: &[ClusterStats]) {
    if stats.is_empty() {
        println!("No clusters found. Upload and process a dataset first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Safety Signals ({} clusters) ===", stats.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:>8} {:>8}  {:>9}  {:>7}  {:>11}",
        "Rank".dimmed(),
        "Cluster".dimmed(),
        "Reports".dimmed(),
        "Severity".dimmed(),
        "Growth".dimmed(),
        "Score".dimmed(),
    );
    println!("  {}", "-".repeat(58).dimmed());

    for (i, entry) in stats.iter().enumerate() {
        let score = format!("{:>11.2}", entry.signal_score);
        let colored_score = if entry.signal_score > 50.0 {
            score.red().bold()
        } else if entry.signal_score > 20.0 {
            score.yellow()
        } else {
            score.normal()
        };

        println!(
            "  {:>4}. {:>8} {:>8}  {:>9.2}  {:>6.2}x  {}",
            i + 1,
            entry.cluster,
            entry.frequency,
            entry.severity,
            entry.growth_rate,
            colored_score,
        );
    }

    println!();

    let priority = stats.iter().filter(|s| s.signal_score > 50.0).count();
    let monitor = stats
        .iter()
        .filter(|s| s.signal_score > 20.0 && s.signal_score <= 50.0)
        .count();

    if priority > 0 {
        println!("  {} {} priority signals (score > 50)", "!!".red().bold(), priority);
    }
    if monitor > 0 {
        println!("  {} {} signals to monitor (score > 20)", "~".yellow(), monitor);
    }
}

/// Display the narrative summaries for the top clusters.
pub fn display_summaries(summaries: &[ClusterSummary]) {
    if summaries.is_empty() {
        return;
    }

    println!("\n{}", "=== Cluster Summaries ===".bold());

    for summary in summaries {
        println!(
            "\n{}",
            format!("--- Cluster {} ---", summary.cluster).bold()
        );
        println!("\n{}\n", summary.summary);
        println!("  Key metrics:");
        println!("    Reports: {}", summary.frequency);
        println!("    Average severity: {:.2}", summary.severity);
        println!("    Growth rate: {:.2}x", summary.growth_rate);
        println!("    Signal score: {:.2}", summary.signal_score);
        if !summary.top_adverse_events.is_empty() {
            let events = summary.top_adverse_events.join(", ");
            println!(
                "    Top adverse events: {}",
                super::truncate_chars(&events, 100).dimmed()
            );
        }
    }
    println!();
}
