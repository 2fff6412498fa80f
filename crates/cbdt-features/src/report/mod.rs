//! Evaluation reports: LaTeX table rows and a standalone HTML page.
use std::fs;
use std::path::Path;

use maud::{html, Markup, DOCTYPE};

use crate::error::Result;
use crate::stats::Evaluation;

/// One `<measure> & <value> \\` row per measure, values rounded to 3 decimals.
pub fn render_latex(evaluation: &Evaluation) -> String {
    evaluation
        .measures
        .iter()
        .map(|(name, value)| format!("{} & {:.3} \\\\\n", name, value))
        .collect()
}

fn measures_table(evaluation: &Evaluation) -> Markup {
    html! {
        table {
            thead {
                tr { th { "Measure" } th { "Value" } }
            }
            tbody {
                @for (name, value) in &evaluation.measures {
                    tr {
                        td { (name) }
                        td { (format!("{:.3}", value)) }
                    }
                }
            }
        }
    }
}

/// Full HTML page for one evaluation.
pub fn render_html(evaluation: &Evaluation, title: &str, n_features: usize) -> String {
    let page = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style {
                    "body { font-family: sans-serif; margin: 2em; }"
                    "table { border-collapse: collapse; }"
                    "td, th { border: 1px solid #ccc; padding: 0.3em 0.8em; text-align: left; }"
                }
            }
            body {
                h1 { (title) }
                section {
                    h2 { "Setup" }
                    p {
                        "Task: " (evaluation.task.to_string()) ". "
                        (evaluation.n_train) " training and "
                        (evaluation.n_test) " test instances, "
                        (n_features) " features."
                    }
                }
                section {
                    h2 { "Test set measures" }
                    (measures_table(evaluation))
                }
            }
        }
    };
    page.into_string()
}

pub fn save_html<P: AsRef<Path>>(path: P, evaluation: &Evaluation, title: &str, n_features: usize) -> Result<()> {
    fs::write(path, render_html(evaluation, title, n_features))?;
    Ok(())
}
