use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};
use crate::core::config::LtrConfig;
use crate::core::error::{Error, ErrorKind, Result};

/// Drives the external SVM-rank learner and classifier binaries.
#[derive(Debug, Clone)]
pub struct SvmRankTrainer {
    learn_path: PathBuf,
    classify_path: PathBuf,
    c: f64,
}

impl SvmRankTrainer {
    pub fn new(learn_path: impl Into<PathBuf>, classify_path: impl Into<PathBuf>, c: f64) -> Self {
        SvmRankTrainer {
            learn_path: learn_path.into(),
            classify_path: classify_path.into(),
            c,
        }
    }

    pub fn from_config(config: &LtrConfig) -> Self {
        SvmRankTrainer::new(&config.svm_rank_learn_path, &config.svm_rank_classify_path, config.svm_rank_c)
    }

    /// `svm_rank_learn -c C train_file model_file`
    pub fn train(&self, train_file: &Path, model_file: &Path) -> Result<()> {
        info!(train = %train_file.display(), model = %model_file.display(), "training ranker");
        let c = self.c.to_string();
        run_command(&self.learn_path, &[
            OsStr::new("-c"),
            OsStr::new(&c),
            train_file.as_os_str(),
            model_file.as_os_str(),
        ])
    }

    /// `svm_rank_classify test_file model_file predictions_file`
    pub fn classify(&self, test_file: &Path, model_file: &Path, predictions_file: &Path) -> Result<()> {
        info!(test = %test_file.display(), predictions = %predictions_file.display(), "classifying");
        run_command(&self.classify_path, &[
            test_file.as_os_str(),
            model_file.as_os_str(),
            predictions_file.as_os_str(),
        ])
    }
}

fn run_command(program: &Path, args: &[&OsStr]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::new(
            ErrorKind::ExternalProcess,
            format!("failed to launch {}: {}", program.display(), e),
        ))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(program = %program.display(), "{}", line);
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        debug!(program = %program.display(), stream = "stderr", "{}", line);
    }

    if !output.status.success() {
        return Err(Error::new(
            ErrorKind::ExternalProcess,
            format!("{} exited with {}", program.display(), output.status),
        ));
    }
    Ok(())
}
