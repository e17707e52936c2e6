//! Input handling: find the eligible documents in a source directory and
//! turn each into a PDF the analyser and the figure renderer can both read.
//!
//! pdfium needs a file-system path, so DOCX input is converted into the
//! batch's scratch directory first. Every PDF is checked for the `%PDF`
//! magic bytes before it is sent anywhere, so a mislabelled file fails with
//! a clear error rather than a service rejection.

use crate::converter::FormatConverter;
use crate::error::Doc2MdError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Document formats the batch accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Docx,
}

impl InputKind {
    /// Classify by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "docx" => Some(InputKind::Docx),
            _ => None,
        }
    }
}

/// File name up to its first `.`: `report.v2.pdf` → `report`.
///
/// Falls back to the plain file stem for names that start with a dot.
pub fn base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split('.').next() {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name),
    }
}

/// `{output_dir}/{base_name}.md`.
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    output_dir.join(format!("{}.md", base_name(input)))
}

/// List the PDF and DOCX files directly inside `source_dir`, sorted.
///
/// Fails when the directory is missing or holds no regular file at all.
/// Other files are ignored.
pub fn eligible_files(source_dir: &Path) -> Result<Vec<PathBuf>, Doc2MdError> {
    if !source_dir.is_dir() {
        return Err(Doc2MdError::SourceDirNotFound {
            path: source_dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(source_dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Doc2MdError::PermissionDenied {
            path: source_dir.to_path_buf(),
        },
        _ => Doc2MdError::SourceDirNotFound {
            path: source_dir.to_path_buf(),
        },
    })?;

    let files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        return Err(Doc2MdError::SourceDirEmpty {
            path: source_dir.to_path_buf(),
        });
    }

    let mut eligible: Vec<PathBuf> = files
        .into_iter()
        .filter(|p| InputKind::from_path(p).is_some())
        .collect();
    eligible.sort();

    info!(
        "Found {} eligible document(s) in {}",
        eligible.len(),
        source_dir.display()
    );
    Ok(eligible)
}

/// Validate that `path` is a readable PDF.
pub fn check_pdf(path: &Path) -> Result<(), Doc2MdError> {
    if !path.exists() {
        return Err(Doc2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let access_error = |e: std::io::Error| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Doc2MdError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Doc2MdError::FileNotFound {
                path: path.to_path_buf(),
            }
        }
    };

    let file = std::fs::File::open(path).map_err(access_error)?;
    let mut head = Vec::with_capacity(4);
    file.take(4).read_to_end(&mut head).map_err(access_error)?;

    // Files shorter than the magic compare zero-padded.
    let mut magic = [0u8; 4];
    magic[..head.len()].copy_from_slice(&head);
    if &magic != b"%PDF" {
        return Err(Doc2MdError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Resolve `path` to a PDF on disk, converting DOCX into `scratch_dir`.
pub async fn prepare_pdf(
    path: &Path,
    converter: &dyn FormatConverter,
    scratch_dir: &Path,
    timeout: Option<Duration>,
) -> Result<PathBuf, Doc2MdError> {
    let kind = InputKind::from_path(path).ok_or_else(|| Doc2MdError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let pdf = match kind {
        InputKind::Pdf => path.to_path_buf(),
        InputKind::Docx => {
            if !path.is_file() {
                return Err(Doc2MdError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            converter.convert(path, scratch_dir, timeout).await?
        }
    };

    check_pdf(&pdf)?;
    debug!("Resolved {} → {}", path.display(), pdf.display());
    Ok(pdf)
}
