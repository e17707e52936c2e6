//! Office format conversion: DOCX → PDF through a headless office suite.

use crate::error::Doc2MdError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Converts an office document into a PDF.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    /// Convert `source` into a PDF inside `out_dir` and return its path.
    ///
    /// With a `timeout`, the conversion is abandoned (and the child process
    /// killed) once it runs that long.
    async fn convert(
        &self,
        source: &Path,
        out_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<PathBuf, Doc2MdError>;
}

/// [`FormatConverter`] that shells out to LibreOffice:
/// `soffice --headless --convert-to pdf <source> --outdir <dir>`.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: String,
}

impl SofficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

#[async_trait]
impl FormatConverter for SofficeConverter {
    async fn convert(
        &self,
        source: &Path,
        out_dir: &Path,
        timeout: Option<Duration>,
    ) -> Result<PathBuf, Doc2MdError> {
        let start = Instant::now();
        let fail = |detail: String| Doc2MdError::ConversionFailed {
            path: source.to_path_buf(),
            detail,
        };

        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| fail(format!("cannot create '{}': {e}", out_dir.display())))?;

        let mut child = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(source)
            .arg("--outdir")
            .arg(out_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fail(format!("failed to start '{}': {e}", self.program)))?;

        let waited = match timeout {
            Some(limit) => {
                let result = tokio::time::timeout(limit, child.wait()).await;
                match result {
                    Ok(status) => status,
                    Err(_) => {
                        let _ = child.kill().await;
                        return Err(Doc2MdError::ConversionTimeout {
                            path: source.to_path_buf(),
                            secs: limit.as_secs(),
                        });
                    }
                }
            }
            None => child.wait().await,
        };
        let status = waited.map_err(|e| fail(e.to_string()))?;

        if !status.success() {
            return Err(fail(format!("'{}' exited with {status}", self.program)));
        }

        let pdf = converted_path(source, out_dir);
        if !pdf.is_file() {
            return Err(fail(format!("no PDF produced at '{}'", pdf.display())));
        }

        debug!(
            "Converted {} → {} in {:?}",
            source.display(),
            pdf.display(),
            start.elapsed()
        );
        Ok(pdf)
    }
}

/// LibreOffice replaces the last extension with `.pdf`.
fn converted_path(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out_dir.join(format!("{stem}.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_path_replaces_last_extension() {
        assert_eq!(
            converted_path(Path::new("/in/report.v2.docx"), Path::new("/tmp/x")),
            PathBuf::from("/tmp/x/report.v2.pdf")
        );
    }

    #[tokio::test]
    async fn missing_program_is_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let converter = SofficeConverter::new("docintel2md-no-such-office-binary");
        let err = converter
            .convert(&dir.path().join("a.docx"), dir.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::ConversionFailed { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let converter = SofficeConverter::new("false");
        let err = converter
            .convert(&dir.path().join("a.docx"), dir.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2MdError::ConversionFailed { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn success_without_output_is_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let converter = SofficeConverter::new("true");
        let err = converter
            .convert(&dir.path().join("a.docx"), dir.path(), None)
            .await
            .unwrap_err();
        match err {
            Doc2MdError::ConversionFailed { detail, .. } => assert!(detail.contains("no PDF")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
