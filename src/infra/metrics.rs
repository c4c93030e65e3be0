// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Writes per-epoch adversarial losses to a CSV file.
//
// Output file: <run dir>/metrics.csv
//
//   epoch,d_loss,g_loss
//   0,1.386512,0.693011
//   1,1.379904,0.701377
//   ...
//
// Reading the curves:
//   - d_loss near 2·ln 2 ≈ 1.386 means D cannot tell real from fake
//   - d_loss → 0 with g_loss climbing means D has won and G gets
//     little signal; lower lr_discriminator
//   - both oscillating around a level is normal GAN behaviour

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::trainer::EpochLosses;

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `dir` if needed and start a fresh metrics.csv there.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics dir '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,d_loss,g_loss")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one row.
    pub fn log(&self, m: &EpochLosses) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.d_loss, m.g_loss)?;
        Ok(())
    }

    pub fn log_all(&self, epochs: &[EpochLosses]) -> Result<()> {
        epochs.iter().try_for_each(|m| self.log(m))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("run")).unwrap();
        logger
            .log_all(&[
                EpochLosses { epoch: 0, d_loss: 1.3865, g_loss: 0.6931 },
                EpochLosses { epoch: 1, d_loss: 1.2, g_loss: 0.75 },
            ])
            .unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["epoch,d_loss,g_loss", "0,1.386500,0.693100", "1,1.200000,0.750000"]);
    }

    #[test]
    fn test_new_run_truncates_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = MetricsLogger::new(dir.path()).unwrap();
        first.log(&EpochLosses { epoch: 0, d_loss: 1.0, g_loss: 1.0 }).unwrap();

        let second = MetricsLogger::new(dir.path()).unwrap();
        let text = fs::read_to_string(second.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
