//! Terminal rendering of recorded runs.

use perturbench_core::RunResult;
use std::fmt::Write;

/// One line per run in recording order, legend label first.
pub fn format_table(runs: &[RunResult]) -> String {
    let legends: Vec<String> = runs.iter().map(RunResult::display_label).collect();
    let width = legends
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("run".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<width$}  {:>7}  {}",
        "#", "run", "samples", "axis"
    );
    for (i, (run, legend)) in runs.iter().zip(&legends).enumerate() {
        let axis = if run.invert_display { "inverted" } else { "normal" };
        let _ = writeln!(
            out,
            "{:>3}  {:<width$}  {:>7}  {}",
            i,
            legend,
            run.sample_count(),
            axis
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(label: &str, aucs: Vec<f64>, invert_display: bool) -> RunResult {
        RunResult {
            label: label.into(),
            curves: aucs.iter().map(|_| vec![0.0, 1.0]).collect(),
            aucs,
            invert_display,
        }
    }

    #[test]
    fn test_format_table() {
        let table = format_table(&[
            run("shap", vec![0.5, 0.25], false),
            run("random", vec![0.1], true),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "  #  run                samples  axis");
        assert_eq!(lines[1], "  0  shap AUC 0.3750          2  normal");
        assert_eq!(lines[2], "  1  random AUC 0.1000        1  inverted");
    }

    #[test]
    fn test_empty_table_has_header_only() {
        assert_eq!(format_table(&[]).lines().count(), 1);
    }
}
