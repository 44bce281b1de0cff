//! Document upload for grounded questions.
//!
//! Files are checked locally before anything is sent: they must be a
//! non-empty PDF or DOCX of at most [`MAX_UPLOAD_BYTES`].

use std::future::Future;
use std::path::Path;

use tracing::info;

use crate::client::ChatClient;
use crate::error::CompareError;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const EMPTY_FILE_MESSAGE: &str = "Please select a file to upload.";
pub const INVALID_TYPE_MESSAGE: &str = "Invalid file type. Only PDF and DOCX files are allowed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Infer the kind from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A validated file, read into memory and ready to send.
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

/// Server acknowledgement of an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub file_name: String,
    pub status: String,
}

/// Validate and read `path`.
pub fn prepare_upload(path: &Path) -> Result<PreparedUpload, CompareError> {
    if path.as_os_str().is_empty() {
        return Err(CompareError::Validation(EMPTY_FILE_MESSAGE.to_string()));
    }
    let io_err = |source| CompareError::Io {
        path: path.display().to_string(),
        source,
    };

    let meta = std::fs::metadata(path).map_err(io_err)?;
    if !meta.is_file() || meta.len() == 0 {
        return Err(CompareError::Validation(EMPTY_FILE_MESSAGE.to_string()));
    }

    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| CompareError::Validation(INVALID_TYPE_MESSAGE.to_string()))?;

    if meta.len() > MAX_UPLOAD_BYTES {
        return Err(CompareError::Validation(format!(
            "File exceeds maximum size limit of {}MB.",
            MAX_UPLOAD_BYTES / 1024 / 1024
        )));
    }

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CompareError::Validation(EMPTY_FILE_MESSAGE.to_string()))?
        .to_string();
    let bytes = std::fs::read(path).map_err(io_err)?;

    Ok(PreparedUpload { file_name, kind, bytes })
}

/// Validate `path` and upload it.
pub async fn upload_document(client: &ChatClient, path: &Path) -> Result<UploadReceipt, CompareError> {
    let prepared = prepare_upload(path)?;
    let size = prepared.bytes.len();
    let status = client
        .upload_document(&prepared.file_name, prepared.kind.content_type(), prepared.bytes)
        .await?;
    info!(file = %prepared.file_name, size, status = %status, "document uploaded");
    Ok(UploadReceipt {
        file_name: prepared.file_name,
        status,
    })
}

/// Anything that can take a document for grounded questions.
pub trait DocumentUploader {
    fn upload(&self, path: &Path) -> impl Future<Output = Result<UploadReceipt, CompareError>> + Send;
}

impl DocumentUploader for ChatClient {
    async fn upload(&self, path: &Path) -> Result<UploadReceipt, CompareError> {
        upload_document(self, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).expect("create");
        f.write_all(bytes).expect("write");
        path
    }

    #[rstest]
    #[case("a.pdf", Some(DocumentKind::Pdf))]
    #[case("A.PDF", Some(DocumentKind::Pdf))]
    #[case("notes.docx", Some(DocumentKind::Docx))]
    #[case("notes.doc", None)]
    #[case("image.png", None)]
    #[case("README", None)]
    fn kind_from_extension(#[case] name: &str, #[case] expected: Option<DocumentKind>) {
        assert_eq!(DocumentKind::from_path(Path::new(name)), expected);
    }

    #[test]
    fn content_types() {
        assert_eq!(DocumentKind::Pdf.content_type(), "application/pdf");
        assert!(DocumentKind::Docx.content_type().ends_with("wordprocessingml.document"));
    }

    #[test]
    fn prepare_reads_valid_pdf() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "report.pdf", b"%PDF-1.4 test");
        let prepared = prepare_upload(&path).expect("valid");
        assert_eq!(prepared.file_name, "report.pdf");
        assert_eq!(prepared.kind, DocumentKind::Pdf);
        assert_eq!(prepared.bytes, b"%PDF-1.4 test");
    }

    #[test]
    fn prepare_rejects_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "empty.pdf", b"");
        let err = prepare_upload(&path).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_FILE_MESSAGE);
    }

    #[test]
    fn prepare_rejects_wrong_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "notes.txt", b"plain text");
        let err = prepare_upload(&path).unwrap_err();
        assert_eq!(err.to_string(), INVALID_TYPE_MESSAGE);
    }

    #[test]
    fn prepare_rejects_oversized_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.pdf");
        let f = std::fs::File::create(&path).expect("create");
        f.set_len(MAX_UPLOAD_BYTES + 1).expect("set_len");
        let err = prepare_upload(&path).unwrap_err();
        assert_eq!(err.to_string(), "File exceeds maximum size limit of 10MB.");
    }

    #[test]
    fn prepare_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = prepare_upload(&dir.path().join("absent.pdf")).unwrap_err();
        assert!(matches!(err, CompareError::Io { .. }));
    }

    #[test]
    fn prepare_rejects_missing_path_argument() {
        let err = prepare_upload(Path::new("")).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_FILE_MESSAGE);
    }

    #[test]
    fn prepare_rejects_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sub = dir.path().join("folder.pdf");
        std::fs::create_dir(&sub).expect("mkdir");
        assert!(prepare_upload(&sub).unwrap_err().is_validation());
    }
}
