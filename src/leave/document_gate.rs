use crate::leave::error::{LeaveError, Result};
use crate::model::document::{
    Document, DocumentKind, MAX_DOCUMENT_BYTES, MAX_DOCUMENT_NAME_CHARS, MAX_MIME_TYPE_CHARS,
};
use crate::model::leave_request::LeaveCategory;

/// Only medical leave needs supporting documents.
pub fn requires_document(category: LeaveCategory) -> bool {
    matches!(category, LeaveCategory::Medical)
}

/// Name, type and size check for one document, before or after upload.
pub fn check_document(name: &str, mime_type: &str, size_bytes: u64) -> Result<()> {
    let chars = name.chars().count();
    if name.trim().is_empty() || chars > MAX_DOCUMENT_NAME_CHARS {
        return Err(LeaveError::InvalidDocumentName {
            chars,
            limit: MAX_DOCUMENT_NAME_CHARS,
        });
    }
    if mime_type.chars().count() > MAX_MIME_TYPE_CHARS || DocumentKind::from_mime(mime_type).is_none() {
        return Err(LeaveError::UnsupportedDocument {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
        });
    }
    if size_bytes > MAX_DOCUMENT_BYTES {
        return Err(LeaveError::DocumentTooLarge {
            name: name.to_string(),
            size_bytes,
            limit_bytes: MAX_DOCUMENT_BYTES,
        });
    }
    Ok(())
}

/// Every offending document, in attachment order.
pub fn violations(documents: &[Document]) -> Vec<LeaveError> {
    documents
        .iter()
        .filter_map(|doc| check_document(&doc.original_name, &doc.mime_type, doc.size_bytes).err())
        .collect()
}

/// Fails on the first unmet rule: missing document, then per-entry checks.
pub fn validate(category: LeaveCategory, documents: &[Document]) -> Result<()> {
    if requires_document(category) && documents.is_empty() {
        return Err(LeaveError::MissingDocument);
    }
    match violations(documents).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
