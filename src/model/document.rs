use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Hard cap on a single supporting document.
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Column widths of `leave_documents`.
pub const MAX_DOCUMENT_NAME_CHARS: usize = 255;
pub const MAX_MIME_TYPE_CHARS: usize = 128;

/// Opaque handle returned by the document storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRef(pub String);

/// A supporting document attached to a leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "original_name": "certificat.pdf",
    "mime_type": "application/pdf",
    "size_bytes": 48213,
    "storage_ref": "7a1c1f0e-2f53-4a3c-9e43-0c7f6f9a2b11.pdf"
}))]
pub struct Document {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[schema(value_type = String)]
    pub storage_ref: StorageRef,
}

/// Accepted families of supporting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
    Word,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        // drop parameters such as "; charset=binary"
        let essence = mime.split(';').next().unwrap_or_default().trim();

        match essence {
            "application/pdf" => Some(DocumentKind::Pdf),
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(DocumentKind::Word)
            }
            m if m.starts_with("image/") && m.len() > "image/".len() => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

/// Metadata the client supplies alongside document bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl DocumentMeta {
    pub fn into_document(self, storage_ref: StorageRef) -> Document {
        Document {
            original_name: self.original_name,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            storage_ref,
        }
    }
}
