//! Trajectory export to CSV and JSON.

use crate::error::{NotebookError, NotebookResult};
use crate::lorenz::{LorenzParams, Trajectory, TrajectorySummary};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }
}

/// Format from the file extension (case-insensitive).
pub fn detect_format<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| match ext.to_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            _ => None,
        })
}

/// JSON document written by [`export_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryDocument {
    pub params: LorenzParams,
    pub summary: TrajectorySummary,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// `[t, u, v, w]` rows.
    pub samples: Vec<[f64; 4]>,
}

impl TrajectoryDocument {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        Self {
            params: trajectory.params,
            summary: trajectory.summary(),
            generated_at: chrono::Utc::now(),
            samples: trajectory.rows().collect(),
        }
    }
}

pub fn export_csv<P: AsRef<Path>>(trajectory: &Trajectory, path: P) -> NotebookResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "time,u,v,w")?;
    for [t, u, v, w] in trajectory.rows() {
        writeln!(writer, "{t},{u},{v},{w}")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_json<P: AsRef<Path>>(trajectory: &Trajectory, path: P) -> NotebookResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &TrajectoryDocument::from_trajectory(trajectory))?;
    Ok(())
}

pub fn export_auto<P: AsRef<Path>>(trajectory: &Trajectory, path: P) -> NotebookResult<()> {
    match detect_format(&path) {
        Some(FileFormat::Csv) => export_csv(trajectory, path),
        Some(FileFormat::Json) => export_json(trajectory, path),
        None => Err(NotebookError::UnsupportedFormat(path.as_ref().to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::Solution;
    use nalgebra::Vector3;
    use tempfile::tempdir;

    fn trajectory() -> Trajectory {
        Trajectory::new(
            LorenzParams::chaotic(),
            Solution {
                times: vec![0.0, 0.5],
                states: vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.5, 2.25, -0.5)],
                steps: 12,
            },
        )
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format("traj.csv"), Some(FileFormat::Csv));
        assert_eq!(detect_format("traj.JSON"), Some(FileFormat::Json));
        assert_eq!(detect_format("traj.npy"), None);
        assert_eq!(detect_format("traj"), None);
    }

    #[test]
    fn test_csv_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("traj.csv");
        export_auto(&trajectory(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["time,u,v,w", "0,1,0,0", "0.5,1.5,2.25,-0.5"]);
    }

    #[test]
    fn test_json_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("traj.json");
        export_auto(&trajectory(), &path).unwrap();
        let doc: TrajectoryDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc.params, LorenzParams::chaotic());
        assert_eq!(doc.samples.len(), 2);
        assert_eq!(doc.samples[1], [0.5, 1.5, 2.25, -0.5]);
        assert_eq!(doc.summary.abs_max, 2.25);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let err = export_auto(&trajectory(), dir.path().join("traj.mat")).unwrap_err();
        assert!(matches!(err, NotebookError::UnsupportedFormat(_)));
    }
}
