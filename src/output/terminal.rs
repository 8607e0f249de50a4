// Colored terminal output for topic sets, chunk tables and evaluation reports.
//
// main.rs delegates all display formatting here.

use colored::Colorize;

use super::{format_score, truncate_chars};
use crate::chunking::select::SelectionReport;
use crate::chunking::table::DensityTable;
use crate::eval::EvalReport;
use crate::rag::qa::QaPair;
use crate::rag::RagAnswer;
use crate::topics::topic::TopicSet;

/// Display each topic with its terms.
pub fn display_topics(topics: &TopicSet) {
    println!("\n{}", format!("=== Topics ({}) ===", topics.len()).bold());
    for topic in topics {
        let marker = if topic.vector.is_some() {
            "*".green()
        } else {
            " ".normal()
        };
        println!(
            "  {} {:<28} {}",
            marker,
            topic.name.bold(),
            truncate_chars(&topic.terms.join(", "), 80).dimmed()
        );
    }
    if topics.has_vectors() {
        println!("  {}", "* topic vector attached".dimmed());
    }
}

/// Summarize a density table: one line per candidate with its best topic.
pub fn display_density_table(table: &DensityTable, max_rows: usize) {
    println!(
        "\n{}",
        format!("=== Density chunks ({} candidates) ===", table.len()).bold()
    );
    if table.is_empty() {
        println!("  No document was longer than the minimum window.");
        return;
    }

    println!(
        "  {:<10} {:>6} {:>6} {:>8}  {}",
        "Doc".dimmed(),
        "Start".dimmed(),
        "End".dimmed(),
        "L2".dimmed(),
        "Top topic".dimmed(),
    );
    println!("  {}", "-".repeat(60).dimmed());

    for row in table.rows().iter().take(max_rows) {
        let top = row
            .densities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .filter(|(_, d)| **d > 0.0)
            .map(|(i, d)| format!("{} ({d:.2})", table.topic_names()[i]))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:<10} {:>6} {:>6} {:>8.4}  {}",
            truncate_chars(&row.doc_id, 8),
            row.substring_start,
            row.substring_end,
            row.l2_norm,
            top
        );
    }
    if table.len() > max_rows {
        println!("  {}", format!("... {} more", table.len() - max_rows).dimmed());
    }
}

/// Display the selected chunk sequence and any coverage gaps.
pub fn display_selection(report: &SelectionReport) {
    println!(
        "\n{}",
        format!("=== Selected chunks ({}) ===", report.chunks.len()).bold()
    );

    let mut current_doc: Option<&str> = None;
    for chunk in &report.chunks {
        if current_doc != Some(chunk.doc_id.as_str()) {
            println!("\n  {}", format!("Document {}", chunk.doc_id).cyan());
            current_doc = Some(chunk.doc_id.as_str());
        }
        println!(
            "    [{:>3}..{:<3}) {:<24} {:>6.3}  {}",
            chunk.start,
            chunk.end,
            chunk.max_topic.bold(),
            chunk.max_metric,
            truncate_chars(&chunk.text, 60).dimmed()
        );
    }

    if report.is_complete() {
        println!("\n  {} every document covered", "ok".green().bold());
    } else {
        println!();
        for gap in &report.gaps {
            println!(
                "  {} {} truncated at {} of {} (no chunk starts at {})",
                "!".yellow().bold(),
                gap.doc_id,
                gap.covered_to,
                gap.max_end,
                gap.expected_start
            );
        }
    }
}

pub fn display_qa_pairs(pairs: &[QaPair], max_pairs: usize) {
    println!("\n{}", format!("=== QA pairs ({}) ===", pairs.len()).bold());
    for (i, pair) in pairs.iter().take(max_pairs).enumerate() {
        println!("  {}. {}", i + 1, truncate_chars(&pair.question, 100).bold());
        println!("     {}", truncate_chars(&pair.answer, 100).dimmed());
    }
    if pairs.len() > max_pairs {
        println!("  {}", format!("... {} more", pairs.len() - max_pairs).dimmed());
    }
}

pub fn display_answer(question: &str, answer: &RagAnswer) {
    println!("\n{} {}", "Q:".bold(), question);
    println!("{} {}", "A:".green().bold(), answer.answer.trim());
    println!("\n{}", format!("Context ({} chunks):", answer.contexts.len()).dimmed());
    for (i, context) in answer.contexts.iter().enumerate() {
        println!("  {}. {}", i + 1, truncate_chars(context, 100).dimmed());
    }
}

/// Display per-metric means, then per-record scores.
pub fn display_eval_report(report: &EvalReport) {
    println!(
        "\n{}",
        format!("=== Evaluation ({} records) ===", report.records.len()).bold()
    );

    for (name, mean) in report.metrics.iter().zip(&report.means) {
        println!("  {:<20} {}", name, format_score(*mean).bold());
    }

    println!();
    let header: Vec<String> = report.metrics.iter().map(|m| format!("{m:>18}")).collect();
    println!("  {:<50}{}", "Question".dimmed(), header.join("").dimmed());
    for record in &report.records {
        let scores: Vec<String> = record
            .scores
            .iter()
            .map(|s| format!("{:>18}", format_score(*s)))
            .collect();
        println!(
            "  {:<50}{}",
            truncate_chars(&record.question, 46),
            scores.join("")
        );
    }

    let missing: usize = report
        .records
        .iter()
        .map(|r| r.scores.iter().filter(|s| s.is_none()).count())
        .sum();
    if missing > 0 {
        println!("\n  {} {} scores missing (metric failed)", "!".yellow(), missing);
    }
}
