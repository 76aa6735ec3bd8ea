// src/attachment.rs
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

use crate::types::Attachment;
use crate::utils::format_file_size;

const MB: u64 = 1024 * 1024;

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const PDF_SIGNATURE: &[u8] = b"%PDF";

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const PDF_TYPES: &[&str] = &["application/pdf"];
const WORD_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
const TEXT_TYPES: &[&str] = &["text/plain"];

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AttachmentError {
    pub file_name: String,
    pub kind: AttachmentErrorKind,
    pub message: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentErrorKind {
    EmptyFile,
    TooLarge,
    DisallowedType,
    ContentMismatch,
    Unreadable,
}

impl AttachmentErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyFile => "ATTACHMENT_EMPTY",
            Self::TooLarge => "ATTACHMENT_TOO_LARGE",
            Self::DisallowedType => "ATTACHMENT_WRONG_TYPE",
            Self::ContentMismatch => "ATTACHMENT_CORRUPTED",
            Self::Unreadable => "ATTACHMENT_UNREADABLE",
        }
    }
}

/// Size and type limits for one upload context
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub name: &'static str,
    pub max_bytes: u64,
    pub allowed_types: Vec<&'static str>,
}

impl AttachmentPolicy {
    /// Files sent inside a conversation
    pub fn messaging() -> Self {
        Self {
            name: "message attachment",
            max_bytes: 10 * MB,
            allowed_types: [IMAGE_TYPES, PDF_TYPES, WORD_TYPES, TEXT_TYPES].concat(),
        }
    }

    pub fn validate(&self, attachment: &Attachment) -> Result<(), AttachmentError> {
        let reject = |kind, message: String, suggestion: &str| AttachmentError {
            file_name: attachment.file_name.clone(),
            kind,
            message,
            suggestion: suggestion.to_string(),
        };

        if attachment.size() == 0 {
            return Err(reject(
                AttachmentErrorKind::EmptyFile,
                format!("{} is empty.", attachment.file_name),
                "Please choose a file with content.",
            ));
        }

        if attachment.size() > self.max_bytes {
            return Err(reject(
                AttachmentErrorKind::TooLarge,
                format!(
                    "{} is too large: {} (max {} for a {}).",
                    attachment.file_name,
                    format_file_size(attachment.size()),
                    format_file_size(self.max_bytes),
                    self.name
                ),
                "Please compress the file or choose a smaller one.",
            ));
        }

        let mime = effective_mime(attachment);
        if !self.allowed_types.contains(&mime.as_str()) {
            return Err(reject(
                AttachmentErrorKind::DisallowedType,
                format!(
                    "{} has an unsupported file type ({}) for a {}.",
                    attachment.file_name, mime, self.name
                ),
                "Please use one of the supported file types.",
            ));
        }

        check_signature(&mime, &attachment.bytes).map_err(|message| {
            reject(
                AttachmentErrorKind::ContentMismatch,
                format!("{}: {}", attachment.file_name, message),
                "Please re-export the file or choose another one.",
            )
        })
    }
}

/// Declared MIME type, falling back to the file extension when the picker gave nothing useful
fn effective_mime(attachment: &Attachment) -> String {
    let declared = attachment.mime_type.trim().to_lowercase();
    if declared.is_empty() || declared == "application/octet-stream" {
        mime_guess::from_path(&attachment.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    } else {
        declared
    }
}

fn check_signature(mime: &str, bytes: &[u8]) -> Result<(), String> {
    match mime {
        "image/png" if !bytes.starts_with(PNG_SIGNATURE) => {
            if bytes.starts_with(JPEG_SIGNATURE) {
                Err("file is JPEG but declared as PNG".to_string())
            } else {
                Err("invalid PNG file, corrupted or wrong format".to_string())
            }
        }
        "image/jpeg" if !bytes.starts_with(JPEG_SIGNATURE) => {
            if bytes.starts_with(PNG_SIGNATURE) {
                Err("file is PNG but declared as JPEG".to_string())
            } else {
                Err("invalid JPEG file, corrupted or wrong format".to_string())
            }
        }
        "application/pdf" if !bytes.starts_with(PDF_SIGNATURE) => {
            Err("invalid PDF file, corrupted or wrong format".to_string())
        }
        _ => Ok(()),
    }
}

/// Read a file from disk and validate it against `policy`
pub async fn load_attachment(
    path: &Path,
    policy: &AttachmentPolicy,
) -> Result<Attachment, AttachmentError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();

    let bytes = tokio::fs::read(path).await.map_err(|e| AttachmentError {
        file_name: file_name.clone(),
        kind: AttachmentErrorKind::Unreadable,
        message: format!("Cannot read {}: {}", path.display(), e),
        suggestion: "Check file permissions or choose another file.".to_string(),
    })?;

    let attachment = Attachment::from_bytes(file_name, bytes);
    match policy.validate(&attachment) {
        Ok(()) => {
            info!(
                "Attachment validation passed: {} ({})",
                attachment.file_name,
                format_file_size(attachment.size())
            );
            Ok(attachment)
        }
        Err(e) => {
            error!("Attachment validation failed: {}", e.message);
            Err(e)
        }
    }
}
