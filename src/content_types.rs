//! Content types and filename-based format guessing
//!
//! The constants here are the exact strings sent in `Accept` and
//! `Content-Type` headers; the guessers derive them from filename
//! extensions, stripping one trailing compression extension first.

use crate::error::{AsterError, AsterResult};

// RDF serializations
pub const TURTLE: &str = "text/turtle";
pub const RDF_XML: &str = "application/rdf+xml";
pub const NTRIPLES: &str = "application/n-triples";
pub const NQUADS: &str = "application/n-quads";
pub const TRIG: &str = "application/trig";
pub const N3: &str = "text/n3";
pub const TRIX: &str = "application/trix";
pub const LD_JSON: &str = "application/ld+json";

// Query results
pub const SPARQL_JSON: &str = "application/sparql-results+json";
pub const SPARQL_XML: &str = "application/sparql-results+xml";
pub const BINARY_RDF: &str = "application/x-binary-rdf-results-table";
pub const BOOLEAN: &str = "text/boolean";
pub const CSV: &str = "text/csv";
pub const TSV: &str = "text/tab-separated-values";

// Imports
pub const JSON: &str = "application/json";

// Virtual graph mapping syntaxes
pub const SMS2: &str = "SMS2";
pub const R2RML: &str = "R2RML";

/// Format of a delimited or JSON import file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Tsv,
    Json,
}

impl ImportFormat {
    /// Content type sent when uploading a file of this format.
    pub fn content_type(self) -> &'static str {
        match self {
            ImportFormat::Csv => CSV,
            ImportFormat::Tsv => TSV,
            ImportFormat::Json => JSON,
        }
    }

    /// Input type tag expected by the import endpoint.
    pub fn input_type(self) -> &'static str {
        match self {
            ImportFormat::Csv | ImportFormat::Tsv => "DELIMITED",
            ImportFormat::Json => "JSON",
        }
    }

    /// Default field separator, if the format is delimited.
    pub fn separator(self) -> Option<&'static str> {
        match self {
            ImportFormat::Csv => Some(","),
            ImportFormat::Tsv => Some("\t"),
            ImportFormat::Json => None,
        }
    }
}

fn compression_for(ext: &str) -> Option<&'static str> {
    match ext {
        "gz" => Some("gzip"),
        "zip" => Some("zip"),
        "bz2" => Some("bzip2"),
        _ => None,
    }
}

fn rdf_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "ttl" => Some(TURTLE),
        "rdf" | "rdfs" | "owl" | "xml" => Some(RDF_XML),
        "nt" => Some(NTRIPLES),
        "n3" => Some(N3),
        "nq" | "nquads" => Some(NQUADS),
        "trig" => Some(TRIG),
        "trix" => Some(TRIX),
        "json" | "jsonld" => Some(LD_JSON),
        _ => None,
    }
}

/// Split `name` into (stem, content-encoding, format-extension).
///
/// A trailing compression extension sets the encoding and the extension
/// before it is used for the format lookup. A name without any `.` is a
/// hard error rather than a silent unknown.
fn split_extensions(name: &str) -> AsterResult<(Option<&'static str>, Option<&str>)> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let mut parts = base.rsplit('.');
    let last = parts.next().filter(|ext| ext.len() < base.len());
    let last = match last {
        Some(ext) => ext,
        None => return Err(AsterError::UnknownFormat(name.to_string())),
    };

    if let Some(encoding) = compression_for(&last.to_ascii_lowercase()) {
        // the extension before the compression one names the format
        let inner = parts.next().filter(|s| !s.is_empty());
        Ok((Some(encoding), inner))
    } else {
        Ok((None, Some(last)))
    }
}

/// Guess (content-encoding, RDF content type) from a filename.
///
/// An unrecognized extension yields `(encoding, None)`; a filename without
/// any extension is an error.
pub fn guess_rdf_format(name: &str) -> AsterResult<(Option<&'static str>, Option<&'static str>)> {
    let (encoding, ext) = split_extensions(name)?;
    let content_type = ext.and_then(|e| rdf_type_for(&e.to_ascii_lowercase()));
    Ok((encoding, content_type))
}

/// Guess (content-encoding, import format) from a filename.
pub fn guess_import_format(name: &str) -> AsterResult<(Option<&'static str>, Option<ImportFormat>)> {
    let (encoding, ext) = split_extensions(name)?;
    let format = ext.and_then(|e| match e.to_ascii_lowercase().as_str() {
        "csv" => Some(ImportFormat::Csv),
        "tsv" => Some(ImportFormat::Tsv),
        "json" => Some(ImportFormat::Json),
        _ => None,
    });
    Ok((encoding, format))
}

/// Guess a virtual graph mapping syntax from a filename.
pub fn guess_mapping_format(name: &str) -> AsterResult<Option<&'static str>> {
    let (_, ext) = split_extensions(name)?;
    Ok(ext.and_then(|e| match e.to_ascii_lowercase().as_str() {
        "rq" | "sms" | "sms2" => Some(SMS2),
        "r2rml" => Some(R2RML),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_plain_rdf_extensions() {
        assert_eq!(guess_rdf_format("data.ttl").unwrap(), (None, Some(TURTLE)));
        assert_eq!(guess_rdf_format("schema.owl").unwrap(), (None, Some(RDF_XML)));
        assert_eq!(guess_rdf_format("dump.nq").unwrap(), (None, Some(NQUADS)));
        assert_eq!(guess_rdf_format("data.jsonld").unwrap(), (None, Some(LD_JSON)));
    }

    #[test]
    fn strips_compression_extension() {
        assert_eq!(
            guess_rdf_format("data.ttl.gz").unwrap(),
            (Some("gzip"), Some(TURTLE))
        );
        assert_eq!(
            guess_rdf_format("data.rdf.zip").unwrap(),
            (Some("zip"), Some(RDF_XML))
        );
        assert_eq!(
            guess_rdf_format("data.nt.bz2").unwrap(),
            (Some("bzip2"), Some(NTRIPLES))
        );
    }

    #[test]
    fn unknown_extension_is_not_an_error() {
        assert_eq!(guess_rdf_format("data.unknownext").unwrap(), (None, None));
    }

    #[test]
    fn compressed_with_no_inner_extension() {
        assert_eq!(guess_rdf_format("data.gz").unwrap(), (Some("gzip"), None));
    }

    #[test]
    fn no_extension_is_an_error() {
        assert!(matches!(
            guess_rdf_format("noextension"),
            Err(AsterError::UnknownFormat(_))
        ));
    }

    #[test]
    fn ignores_directories_in_the_path() {
        assert_eq!(
            guess_rdf_format("/tmp/some.dir/data.ttl").unwrap(),
            (None, Some(TURTLE))
        );
        assert_eq!(
            guess_rdf_format("http://example.com/data.ttl.gz").unwrap(),
            (Some("gzip"), Some(TURTLE))
        );
    }

    #[test]
    fn guesses_import_formats() {
        let (enc, fmt) = guess_import_format("table.csv").unwrap();
        assert_eq!(enc, None);
        assert_eq!(fmt, Some(ImportFormat::Csv));
        assert_eq!(fmt.unwrap().separator(), Some(","));
        assert_eq!(fmt.unwrap().input_type(), "DELIMITED");

        let (_, fmt) = guess_import_format("table.tsv.gz").unwrap();
        assert_eq!(fmt, Some(ImportFormat::Tsv));
        assert_eq!(fmt.unwrap().separator(), Some("\t"));

        let (_, fmt) = guess_import_format("doc.json").unwrap();
        assert_eq!(fmt.unwrap().input_type(), "JSON");
        assert_eq!(fmt.unwrap().separator(), None);
    }

    #[test]
    fn guesses_mapping_syntax() {
        assert_eq!(guess_mapping_format("m.sms").unwrap(), Some(SMS2));
        assert_eq!(guess_mapping_format("m.sms2").unwrap(), Some(SMS2));
        assert_eq!(guess_mapping_format("m.rq").unwrap(), Some(SMS2));
        assert_eq!(guess_mapping_format("m.r2rml").unwrap(), Some(R2RML));
        assert_eq!(guess_mapping_format("m.ttl").unwrap(), None);
    }
}
