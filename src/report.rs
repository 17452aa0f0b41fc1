//! Console and JSON rendering of batch results.

use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

use crate::classify::{Criterion, Vote};
use crate::config::Thresholds;
use crate::error::SiftError;
use crate::pipeline::{BatchSummary, FileReport, FileResult};

fn mark(passed: bool) -> &'static str {
    if passed {
        "[V]"
    } else {
        "[X]"
    }
}

/// One human-readable line per vote.
pub fn describe_vote(vote: &Vote) -> String {
    let Vote {
        criterion,
        value,
        cutoff,
        passed,
    } = *vote;
    let (pass_cmp, fail_cmp) = match criterion {
        Criterion::SpectralFlatness => ("<=", ">"),
        _ => (">=", "<"),
    };
    let cmp = if passed { pass_cmp } else { fail_cmp };

    let text = match (criterion, passed) {
        (Criterion::SpectralFlatness, true) => {
            format!("Spectrum is tonal (flatness={:.3} {} {})", value, cmp, cutoff)
        }
        (Criterion::SpectralFlatness, false) => {
            format!("Spectrum is noise-like (flatness={:.3} {} {})", value, cmp, cutoff)
        }
        (Criterion::OnsetRate, true) => {
            format!("Rhythm detected ({:.2} onsets/sec {} {})", value, cmp, cutoff)
        }
        (Criterion::OnsetRate, false) => {
            format!("No rhythm detected ({:.2} onsets/sec {} {})", value, cmp, cutoff)
        }
        (Criterion::VoicedRatio, true) => format!(
            "Tonal components found ({:.1}% {} {:.0}%)",
            value * 100.0,
            cmp,
            cutoff * 100.0
        ),
        (Criterion::VoicedRatio, false) => format!(
            "Signal is atonal ({:.1}% {} {:.0}%)",
            value * 100.0,
            cmp,
            cutoff * 100.0
        ),
        (Criterion::ChromaStd, true) => {
            format!("Harmonic development found (chroma_std={:.3} {} {})", value, cmp, cutoff)
        }
        (Criterion::ChromaStd, false) => {
            format!("No harmonic development (chroma_std={:.3} {} {})", value, cmp, cutoff)
        }
    };
    format!("{} {}", mark(passed), text)
}

pub fn render_thresholds(thresholds: &Thresholds) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Using the following thresholds (requires {} matches):",
        thresholds.decision_score_min
    );
    for criterion in Criterion::ALL {
        let _ = writeln!(
            out,
            "  {}: {}",
            criterion.threshold_key(),
            criterion.cutoff(thresholds)
        );
    }
    out
}

pub fn render_report(report: &FileReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({:.1}s)", display_name(&report.path), report.analysis.duration_secs);
    let _ = writeln!(out, "  Detailed Analysis:");
    for vote in &report.verdict.votes {
        let _ = writeln!(out, "    {}", describe_vote(vote));
    }
    let _ = writeln!(
        out,
        "  Final Score: {} out of {}",
        report.verdict.score,
        report.verdict.votes.len()
    );
    let _ = writeln!(out, "  >> Verdict: {}", report.verdict.label());
    out
}

pub fn render_error(path: &Path, err: &SiftError) -> String {
    format!("{}\n  Failed: {}\n", display_name(path), err)
}

pub fn render_result(result: &FileResult) -> String {
    match &result.outcome {
        Ok(report) => render_report(report),
        Err(err) => render_error(&result.path, err),
    }
}

pub fn render_summary(summary: &BatchSummary) -> String {
    format!(
        "{} files: {} likely music, {} likely static, {} failed\n",
        summary.results.len(),
        summary.music(),
        summary.static_only(),
        summary.failed()
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonEntry<'a> {
    Report(&'a FileReport),
    Failure { path: &'a Path, error: String },
}

pub fn to_json(summary: &BatchSummary) -> serde_json::Result<String> {
    let entries: Vec<JsonEntry<'_>> = summary
        .results
        .iter()
        .map(|r| match &r.outcome {
            Ok(report) => JsonEntry::Report(report),
            Err(err) => JsonEntry::Failure {
                path: &r.path,
                error: err.to_string(),
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}
