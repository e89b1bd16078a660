//! Multipart request assembly for `/extract` and `/extract/async`.
//!
//! The file to upload is a [`FileInput`]: a path on disk, an in-memory buffer,
//! or an async reader. Scalar options are folded into a single JSON `options`
//! field, which is left out entirely when nothing is set.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::error::{AutofillerError, Result};

/// A document to upload.
pub enum FileInput {
    /// File on disk. The filename defaults to the path's last segment.
    Path {
        path: PathBuf,
        filename: Option<String>,
    },

    /// In-memory document. A filename is required.
    Bytes {
        data: Bytes,
        filename: Option<String>,
    },

    /// Async reader (socket, decompressor, ...). A filename is required.
    Stream {
        reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
        filename: Option<String>,
    },
}

impl FileInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path {
            path: path.into(),
            filename: None,
        }
    }

    pub fn bytes(data: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self::Bytes {
            data: data.into(),
            filename: Some(filename.into()),
        }
    }

    pub fn stream(
        reader: impl AsyncRead + Send + Sync + Unpin + 'static,
        filename: impl Into<String>,
    ) -> Self {
        Self::Stream {
            reader: Box::new(reader),
            filename: Some(filename.into()),
        }
    }

    /// Override the filename sent to the server.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Self::Path { filename, .. }
            | Self::Bytes { filename, .. }
            | Self::Stream { filename, .. } => *filename = Some(name.into()),
        }
        self
    }

    /// Short label for logs. Never includes file contents.
    pub fn describe(&self) -> String {
        match self {
            Self::Path { path, .. } => path.display().to_string(),
            Self::Bytes { data, filename } => format!(
                "{} ({} bytes)",
                filename.as_deref().unwrap_or("<unnamed>"),
                data.len()
            ),
            Self::Stream { filename, .. } => {
                format!("{} (stream)", filename.as_deref().unwrap_or("<unnamed>"))
            }
        }
    }
}

impl fmt::Debug for FileInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { path, filename } => f
                .debug_struct("Path")
                .field("path", path)
                .field("filename", filename)
                .finish(),
            Self::Bytes { data, filename } => f
                .debug_struct("Bytes")
                .field("len", &data.len())
                .field("filename", filename)
                .finish(),
            Self::Stream { filename, .. } => f
                .debug_struct("Stream")
                .field("filename", filename)
                .finish_non_exhaustive(),
        }
    }
}

/// Options for an extraction request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Domain pack to use. If omitted, the server auto-routes.
    pub domain_pack: Option<String>,

    /// Include per-field confidence scores
    pub include_confidence: Option<bool>,

    /// Include per-field bounding boxes
    pub include_bounding_boxes: Option<bool>,

    /// Document language hint (ISO 639-1)
    pub language: Option<String>,

    /// URL the server POSTs to when an async job finishes. Ignored by sync extraction.
    pub webhook_url: Option<String>,
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain_pack(mut self, pack: impl Into<String>) -> Self {
        self.domain_pack = Some(pack.into());
        self
    }

    pub fn with_confidence(mut self, include: bool) -> Self {
        self.include_confidence = Some(include);
        self
    }

    pub fn with_bounding_boxes(mut self, include: bool) -> Self {
        self.include_bounding_boxes = Some(include);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }
}

/// Which endpoint the upload is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UploadKind {
    Sync,
    Async,
}

#[derive(Serialize)]
struct WireOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    include_confidence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_bounding_boxes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

impl WireOptions<'_> {
    fn is_empty(&self) -> bool {
        self.include_confidence.is_none()
            && self.include_bounding_boxes.is_none()
            && self.language.is_none()
    }
}

enum FileSource {
    File { file: tokio::fs::File, len: u64 },
    Bytes(Bytes),
    Stream(Box<dyn AsyncRead + Send + Sync + Unpin>),
}

/// A validated upload, ready to become a multipart form.
///
/// Holds the open file handle (if any); dropping the upload closes it.
pub(crate) struct Upload {
    filename: String,
    mime: String,
    source: FileSource,
    fields: Vec<(&'static str, String)>,
}

impl Upload {
    /// Validate inputs and open the file. No network I/O happens here.
    pub(crate) async fn prepare(
        input: FileInput,
        options: &ExtractOptions,
        kind: UploadKind,
    ) -> Result<Self> {
        let (filename, source) = match input {
            FileInput::Path { path, filename } => {
                let filename = filename
                    .map(|name| require_filename(Some(name), "a path"))
                    .transpose()?;

                let absolute = tokio::fs::canonicalize(&path).await.map_err(|e| {
                    AutofillerError::validation(format!(
                        "Cannot read file {}: {}",
                        path.display(),
                        e
                    ))
                })?;

                let filename = match filename {
                    Some(name) => name,
                    None => absolute
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            AutofillerError::validation(format!(
                                "Cannot derive a filename from {}",
                                absolute.display()
                            ))
                        })?,
                };

                let file = tokio::fs::File::open(&absolute).await.map_err(|e| {
                    AutofillerError::validation(format!(
                        "Cannot open file {}: {}",
                        absolute.display(),
                        e
                    ))
                })?;
                let len = file
                    .metadata()
                    .await
                    .map_err(|e| {
                        AutofillerError::validation(format!(
                            "Cannot stat file {}: {}",
                            absolute.display(),
                            e
                        ))
                    })?
                    .len();

                (filename, FileSource::File { file, len })
            }
            FileInput::Bytes { data, filename } => {
                let filename = require_filename(filename, "bytes")?;
                (filename, FileSource::Bytes(data))
            }
            FileInput::Stream { reader, filename } => {
                let filename = require_filename(filename, "a stream")?;
                (filename, FileSource::Stream(reader))
            }
        };

        let mime = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let mut fields = Vec::new();

        if let Some(pack) = &options.domain_pack {
            fields.push(("domain_pack", pack.clone()));
        }

        let wire_options = WireOptions {
            include_confidence: options.include_confidence,
            include_bounding_boxes: options.include_bounding_boxes,
            language: options.language.as_deref(),
        };
        if !wire_options.is_empty() {
            let encoded = serde_json::to_string(&wire_options).map_err(|e| {
                AutofillerError::validation(format!("Cannot encode options: {}", e))
            })?;
            fields.push(("options", encoded));
        }

        if kind == UploadKind::Async {
            if let Some(url) = &options.webhook_url {
                fields.push(("webhook_url", url.clone()));
            }
        }

        Ok(Self {
            filename,
            mime,
            source,
            fields,
        })
    }

    pub(crate) fn filename(&self) -> &str {
        &self.filename
    }

    /// Text field value, if present.
    #[cfg(test)]
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Consume the upload into a multipart form.
    pub(crate) fn into_form(self) -> Result<Form> {
        let part = match self.source {
            FileSource::File { file, len } => {
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), len)
            }
            FileSource::Bytes(data) => {
                let len = data.len() as u64;
                Part::stream_with_length(Body::from(data), len)
            }
            FileSource::Stream(reader) => Part::stream(Body::wrap_stream(ReaderStream::new(reader))),
        };

        let part = part
            .file_name(self.filename)
            .mime_str(&self.mime)
            .map_err(|e| AutofillerError::validation(format!("Invalid content type: {}", e)))?;

        let mut form = Form::new().part("file", part);
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        Ok(form)
    }
}

fn require_filename(filename: Option<String>, what: &str) -> Result<String> {
    match filename {
        Some(name) if !name.trim().is_empty() => Ok(name),
        Some(_) => Err(AutofillerError::validation(format!(
            "filename for {} must not be blank",
            what
        ))),
        None => Err(AutofillerError::validation(format!(
            "filename is required when file is {}",
            what
        ))),
    }
}
