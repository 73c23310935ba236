//! Content that can be uploaded to an AsterDB server
//!
//! A [`Content`] describes a byte source plus its declared content type,
//! optional compression encoding, and logical name. The byte source is
//! acquired only for the duration of one upload: [`Content::open`] returns
//! a reader whose drop releases the file handle or HTTP stream.

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::content_types::{
    guess_import_format, guess_mapping_format, guess_rdf_format, ImportFormat,
};
use crate::error::AsterResult;

fn file_name_of(path: &str) -> Option<String> {
    path.rsplit(['/', '\\']).next().map(str::to_string)
}

/// A byte source for upload operations.
///
/// `Raw` wraps an in-memory payload and never fails to open. `File` opens
/// the path for the scope of one operation. `Url` performs a streaming GET
/// and yields the live response body; the connection is closed when the
/// reader is dropped.
#[derive(Debug, Clone)]
pub enum Content {
    Raw {
        data: Bytes,
        content_type: Option<String>,
        content_encoding: Option<String>,
        name: Option<String>,
    },
    File {
        path: PathBuf,
        content_type: Option<String>,
        content_encoding: Option<String>,
        name: Option<String>,
    },
    Url {
        url: String,
        content_type: Option<String>,
        content_encoding: Option<String>,
        name: Option<String>,
    },
}

impl Content {
    /// In-memory content with an explicit content type.
    ///
    /// # Example
    /// ```
    /// # use asterdb_sdk::{Content, content_types};
    /// let data = Content::raw(":luke a :Human .", content_types::TURTLE);
    /// ```
    pub fn raw(data: impl Into<Bytes>, content_type: &str) -> Content {
        Content::Raw {
            data: data.into(),
            content_type: Some(content_type.to_string()),
            content_encoding: None,
            name: None,
        }
    }

    /// File content; type, encoding and name are derived from the filename.
    ///
    /// Fails if the filename carries no extension at all.
    pub fn file(path: impl AsRef<Path>) -> AsterResult<Content> {
        let path = path.as_ref().to_path_buf();
        let fname = path.to_string_lossy().into_owned();
        let (encoding, content_type) = guess_rdf_format(&fname)?;
        Ok(Content::File {
            name: file_name_of(&fname),
            content_type: content_type.map(str::to_string),
            content_encoding: encoding.map(str::to_string),
            path,
        })
    }

    /// Remote content fetched lazily with a streaming GET.
    ///
    /// Type, encoding and name are derived from the URL path the same way
    /// as for files.
    pub fn url(url: impl Into<String>) -> AsterResult<Content> {
        let url = url.into();
        let (encoding, content_type) = guess_rdf_format(&url)?;
        Ok(Content::Url {
            name: file_name_of(&url),
            content_type: content_type.map(str::to_string),
            content_encoding: encoding.map(str::to_string),
            url,
        })
    }

    /// Override the logical name.
    pub fn with_name(mut self, name: impl Into<String>) -> Content {
        *self.name_mut() = Some(name.into());
        self
    }

    /// Override the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Content {
        *self.content_type_mut() = Some(content_type.into());
        self
    }

    /// Override the content encoding (compression).
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Content {
        *self.encoding_mut() = Some(encoding.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            Content::Raw { content_type, .. }
            | Content::File { content_type, .. }
            | Content::Url { content_type, .. } => content_type.as_deref(),
        }
    }

    pub fn content_encoding(&self) -> Option<&str> {
        match self {
            Content::Raw {
                content_encoding, ..
            }
            | Content::File {
                content_encoding, ..
            }
            | Content::Url {
                content_encoding, ..
            } => content_encoding.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Content::Raw { name, .. }
            | Content::File { name, .. }
            | Content::Url { name, .. } => name.as_deref(),
        }
    }

    /// Acquire the byte source for the scope of one operation.
    ///
    /// File and network failures propagate unchanged in kind. Dropping the
    /// returned reader releases the underlying handle.
    pub fn open(&self) -> AsterResult<Box<dyn Read + Send>> {
        match self {
            Content::Raw { data, .. } => Ok(Box::new(Cursor::new(data.clone()))),
            Content::File { path, .. } => Ok(Box::new(fs::File::open(path)?)),
            Content::Url { url, .. } => {
                let resp = reqwest::blocking::get(url)?.error_for_status()?;
                Ok(Box::new(resp))
            }
        }
    }

    /// Read the whole byte source into memory.
    pub(crate) fn read_bytes(&self) -> AsterResult<Bytes> {
        let mut buf = Vec::new();
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf.into())
    }

    fn name_mut(&mut self) -> &mut Option<String> {
        match self {
            Content::Raw { name, .. }
            | Content::File { name, .. }
            | Content::Url { name, .. } => name,
        }
    }

    fn content_type_mut(&mut self) -> &mut Option<String> {
        match self {
            Content::Raw { content_type, .. }
            | Content::File { content_type, .. }
            | Content::Url { content_type, .. } => content_type,
        }
    }

    fn encoding_mut(&mut self) -> &mut Option<String> {
        match self {
            Content::Raw {
                content_encoding, ..
            }
            | Content::File {
                content_encoding, ..
            }
            | Content::Url {
                content_encoding, ..
            } => content_encoding,
        }
    }
}

/// A CSV/TSV/JSON payload for the tabular import endpoint.
#[derive(Debug, Clone)]
pub enum ImportData {
    File {
        path: PathBuf,
        format: ImportFormat,
        content_encoding: Option<String>,
        name: String,
        separator: Option<String>,
    },
    Raw {
        data: Bytes,
        format: ImportFormat,
        name: String,
        separator: Option<String>,
    },
}

impl ImportData {
    /// Import file; format and separator are derived from the extension.
    pub fn file(path: impl AsRef<Path>) -> AsterResult<ImportData> {
        let path = path.as_ref().to_path_buf();
        let fname = path.to_string_lossy().into_owned();
        let (encoding, format) = guess_import_format(&fname)?;
        let format = format.ok_or_else(|| {
            crate::error::AsterError::UnknownFormat(fname.clone())
        })?;
        Ok(ImportData::File {
            name: file_name_of(&fname).unwrap_or(fname),
            separator: format.separator().map(str::to_string),
            content_encoding: encoding.map(str::to_string),
            format,
            path,
        })
    }

    /// In-memory import payload with an explicit format.
    pub fn raw(data: impl Into<Bytes>, format: ImportFormat, name: impl Into<String>) -> ImportData {
        ImportData::Raw {
            data: data.into(),
            separator: format.separator().map(str::to_string),
            format,
            name: name.into(),
        }
    }

    /// Override the field separator (delimited formats only).
    pub fn with_separator(mut self, sep: impl Into<String>) -> ImportData {
        match &mut self {
            ImportData::File { separator, .. } | ImportData::Raw { separator, .. } => {
                *separator = Some(sep.into());
            }
        }
        self
    }

    pub fn format(&self) -> ImportFormat {
        match self {
            ImportData::File { format, .. } | ImportData::Raw { format, .. } => *format,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ImportData::File { name, .. } | ImportData::Raw { name, .. } => name,
        }
    }

    pub fn separator(&self) -> Option<&str> {
        match self {
            ImportData::File { separator, .. } | ImportData::Raw { separator, .. } => {
                separator.as_deref()
            }
        }
    }

    pub fn content_encoding(&self) -> Option<&str> {
        match self {
            ImportData::File {
                content_encoding, ..
            } => content_encoding.as_deref(),
            ImportData::Raw { .. } => None,
        }
    }

    pub(crate) fn read_bytes(&self) -> AsterResult<Bytes> {
        match self {
            ImportData::File { path, .. } => Ok(fs::read(path)?.into()),
            ImportData::Raw { data, .. } => Ok(data.clone()),
        }
    }
}

/// Virtual graph mapping text plus its syntax tag.
#[derive(Debug, Clone)]
pub enum Mappings {
    File { path: PathBuf, syntax: Option<String> },
    Raw { text: String, syntax: Option<String> },
}

impl Mappings {
    /// Mapping file; the syntax is derived from the extension
    /// (`.sms`/`.sms2`/`.rq` are SMS2, `.r2rml` is R2RML).
    pub fn file(path: impl AsRef<Path>) -> AsterResult<Mappings> {
        let path = path.as_ref().to_path_buf();
        let fname = path.to_string_lossy().into_owned();
        let syntax = guess_mapping_format(&fname)?;
        Ok(Mappings::File {
            syntax: syntax.map(str::to_string),
            path,
        })
    }

    /// In-memory mapping text with an optional explicit syntax.
    pub fn raw(text: impl Into<String>, syntax: Option<&str>) -> Mappings {
        Mappings::Raw {
            text: text.into(),
            syntax: syntax.map(str::to_string),
        }
    }

    pub fn syntax(&self) -> Option<&str> {
        match self {
            Mappings::File { syntax, .. } | Mappings::Raw { syntax, .. } => syntax.as_deref(),
        }
    }

    /// The mapping text itself.
    pub fn read(&self) -> AsterResult<String> {
        match self {
            Mappings::File { path, .. } => Ok(fs::read_to_string(path)?),
            Mappings::Raw { text, .. } => Ok(text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::content_types::{self, TURTLE};
    use crate::error::AsterError;

    #[test]
    fn raw_content_is_always_openable() {
        let content = Content::raw(":a :b :c .", TURTLE).with_name("data.ttl");
        assert_eq!(content.content_type(), Some(TURTLE));
        assert_eq!(content.name(), Some("data.ttl"));
        let mut out = String::new();
        content.open().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, ":a :b :c .");
    }

    #[test]
    fn file_content_guesses_from_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.ttl.gz");
        fs::File::create(&path)
            .unwrap()
            .write_all(b"compressed bytes")
            .unwrap();

        let content = Content::file(&path).unwrap();
        assert_eq!(content.content_type(), Some(TURTLE));
        assert_eq!(content.content_encoding(), Some("gzip"));
        assert_eq!(content.name(), Some("data.ttl.gz"));
        assert_eq!(&content.read_bytes().unwrap()[..], b"compressed bytes");
    }

    #[test]
    fn file_without_extension_is_rejected() {
        assert!(matches!(
            Content::file("/tmp/noextension"),
            Err(AsterError::UnknownFormat(_))
        ));
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let content = Content::file("/definitely/not/here.ttl").unwrap();
        assert!(matches!(content.open(), Err(AsterError::Io(_))));
    }

    #[test]
    fn explicit_overrides_win_over_guesses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.doc");
        fs::File::create(&path).unwrap();

        let content = Content::file(&path)
            .unwrap()
            .with_content_type("application/msword");
        assert_eq!(content.content_type(), Some("application/msword"));
    }

    #[test]
    fn url_content_derives_name_from_path() {
        let content = Content::url("http://example.com/dumps/data.nq").unwrap();
        assert_eq!(content.content_type(), Some(content_types::NQUADS));
        assert_eq!(content.name(), Some("data.nq"));
    }

    #[test]
    fn import_file_carries_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.tsv");
        fs::File::create(&path).unwrap();

        let import = ImportData::file(&path).unwrap();
        assert_eq!(import.format(), ImportFormat::Tsv);
        assert_eq!(import.separator(), Some("\t"));
        assert_eq!(import.name(), "table.tsv");

        let import = import.with_separator("|");
        assert_eq!(import.separator(), Some("|"));
    }

    #[test]
    fn mapping_syntax_guessed_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.sms2");
        fs::File::create(&path)
            .unwrap()
            .write_all(b"MAPPING FROM SQL")
            .unwrap();

        let mappings = Mappings::file(&path).unwrap();
        assert_eq!(mappings.syntax(), Some(content_types::SMS2));
        assert_eq!(mappings.read().unwrap(), "MAPPING FROM SQL");

        let raw = Mappings::raw("...", None);
        assert_eq!(raw.syntax(), None);
    }
}
