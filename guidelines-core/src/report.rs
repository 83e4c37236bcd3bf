//! Report rendering for dataset evaluations

use serde_json::{json, Value};
use std::path::Path;

use crate::engine::DatasetEvaluation;

/// Closing line with the applicable count and aggregate score
pub fn summary_line(evaluation: &DatasetEvaluation) -> String {
    match evaluation.score_percent() {
        Some(score) => format!(
            "{} applicable guidelines, dataset score: {} %",
            evaluation.evaluated_count, score
        ),
        None => format!(
            "{} applicable guidelines, dataset score: not applicable",
            evaluation.evaluated_count
        ),
    }
}

/// Plain-text report
pub fn render_text(dataset: &Path, evaluation: &DatasetEvaluation) -> String {
    let mut out = Vec::new();

    out.push(format!(
        "Using {} guidelines to check BIDS dataset: {}",
        evaluation.standard,
        dataset.display()
    ));

    for line in evaluation.report_lines() {
        out.push(line.to_string());
    }

    for (id, message) in &evaluation.errors {
        out.push(format!("{id}: evaluation error: {message}"));
    }

    out.push(summary_line(evaluation));
    out.push(format!(
        "Finished using {} guidelines to check BIDS dataset: {}",
        evaluation.standard,
        dataset.display()
    ));

    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// Machine-readable report
pub fn render_json(dataset: &Path, evaluation: &DatasetEvaluation) -> Value {
    json!({
        "dataset": dataset.display().to_string(),
        "standard": evaluation.standard.name(),
        "evaluated_count": evaluation.evaluated_count,
        "score": evaluation.score,
        "score_percent": evaluation.score_percent(),
        "rules": evaluation.applicable().map(|(id, result)| {
            json!({
                "id": id,
                "tally": result.tally(),
                "total": result.total(),
                "status": result.status(),
                "success_rate": result.success_rate(),
                "percent": result.percent(),
                "label": evaluation.label(id),
            })
        }).collect::<Vec<_>>(),
        "not_applicable": evaluation.not_applicable(),
        "errors": evaluation.errors.iter().map(|(id, message)| {
            json!({ "id": id, "message": message })
        }).collect::<Vec<_>>(),
    })
}
