/*************************
 * Recommendation report *
 *************************/

use crate::model::{ModelError, Recommendation, TrainedModel, format_confidence, predict};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub const REPORT_FILE: &str = "ml_recommendation_report.txt";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to write the report: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub cpu: f64,
    pub memory_gb: f64,
    pub workload_type: &'static str,
    pub budget_sensitive: &'static str,
}

pub const SCENARIOS: [Scenario; 3] = [
    Scenario {
        name: "High-Traffic Web Server",
        cpu: 8.0,
        memory_gb: 4.0,
        workload_type: "Web",
        budget_sensitive: "No",
    },
    Scenario {
        name: "Production MySQL DB",
        cpu: 5.0,
        memory_gb: 8.0,
        workload_type: "DB",
        budget_sensitive: "No",
    },
    Scenario {
        name: "Student Dev Environment",
        cpu: 2.0,
        memory_gb: 2.0,
        workload_type: "Dev",
        budget_sensitive: "Yes",
    },
];

impl Scenario {
    pub fn input(&self) -> String {
        format!(
            "CPU={}, Mem={}GB, Type={}, Budget={}",
            self.cpu, self.memory_gb, self.workload_type, self.budget_sensitive
        )
    }

    /// The raw parameter list, as written to the report file.
    pub fn parameters(&self) -> String {
        format!(
            "[{}, {}, '{}', '{}']",
            self.cpu, self.memory_gb, self.workload_type, self.budget_sensitive
        )
    }

    pub fn recommend(&self, model: &TrainedModel) -> Recommendation {
        predict(model, self.cpu, self.memory_gb, self.workload_type, self.budget_sensitive)
    }
}

/// The report file: every scenario with its recommendation and confidence,
/// then the decision rules.
pub fn write_out_report(
    model: &TrainedModel,
    scenarios: &[Scenario],
    mut out: impl Write,
) -> Result<(), ReportError> {
    writeln!(out, "Instance Recommendation Report")?;
    writeln!(out, "==============================\n")?;
    for scenario in scenarios {
        let recommendation = scenario.recommend(model);
        writeln!(out, "Scenario: {}", scenario.name)?;
        writeln!(out, "  Input: {}", scenario.parameters())?;
        writeln!(out, "  Recommendation: {}", recommendation)?;
        writeln!(out, "  Confidence: {}\n", format_confidence(&recommendation))?;
    }
    writeln!(out, "Decision Tree Logic:")?;
    write!(out, "{}", model.export_text()?)?;
    Ok(())
}

/// The console version of the report.
pub fn write_out_summary(
    model: &TrainedModel,
    scenarios: &[Scenario],
    mut out: impl Write,
) -> Result<(), ReportError> {
    for scenario in scenarios {
        writeln!(out, "Scenario: {}", scenario.name)?;
        writeln!(out, "  Input: {}", scenario.input())?;
        writeln!(out, "  >>> Recommendation: {}", scenario.recommend(model))?;
        writeln!(out, "{}", "-".repeat(40))?;
    }
    writeln!(out, "\n[Internal Decision Logic]")?;
    write!(out, "{}", model.export_text()?)?;
    Ok(())
}

/// Writes the report to `path`, creating its directory if needed.
pub fn write_report_file(
    model: &TrainedModel,
    scenarios: &[Scenario],
    path: impl AsRef<Path>,
) -> Result<(), ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    write_out_report(model, scenarios, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::train;

    #[test]
    fn report_sections() {
        let model = train().unwrap();
        let mut out = Vec::new();
        write_out_report(&model, &SCENARIOS, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Instance Recommendation Report\n==============================\n\n"));
        assert!(text.contains(
            "Scenario: High-Traffic Web Server\n  Input: [8, 4, 'Web', 'No']\n  Recommendation: c5.large\n"
        ));
        assert!(!text.contains("CPU=8"));
        assert!(text.contains("Scenario: Production MySQL DB\n  Input: [5, 8, 'DB', 'No']\n"));
        assert!(text.contains("  Recommendation: m5.large\n"));
        assert!(text.contains("Scenario: Student Dev Environment\n"));
        assert!(text.contains("  Recommendation: t3.medium\n"));
        assert!(text.contains("  Confidence: c5.large=1.00, m5.large=0.00, t3.medium=0.00\n"));
        let logic = text.find("Decision Tree Logic:\n").unwrap();
        assert!(logic > text.find("Student Dev Environment").unwrap());
        assert!(text[logic..].contains("|--- "));
    }

    #[test]
    fn unknown_scenario_is_reported() {
        let model = train().unwrap();
        let gaming = Scenario {
            name: "Game Server",
            cpu: 9.0,
            memory_gb: 16.0,
            workload_type: "Gaming",
            budget_sensitive: "No",
        };
        let mut out = Vec::new();
        write_out_summary(&model, &[gaming], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  Input: CPU=9, Mem=16GB, Type=Gaming, Budget=No\n"));
        assert!(text.contains("  >>> Recommendation: Unknown Input\n"));
        assert!(text.contains("[Internal Decision Logic]"));
    }

    #[test]
    fn report_file_creates_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis_charts").join(REPORT_FILE);
        write_report_file(&train().unwrap(), &SCENARIOS, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Decision Tree Logic:"));
    }
}
