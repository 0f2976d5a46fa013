//! `multipart/form-data` body construction.
//!
//! # Design
//! The whole body is encoded into memory before a request exists, so a file
//! that cannot be read aborts the upload without anything reaching the wire.
//! Parts are written file first, then text fields in insertion order.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Text fields plus at most one file to upload.
#[derive(Debug, Clone, Default)]
pub struct Form {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

#[derive(Debug, Clone)]
struct FilePart {
    field: String,
    path: PathBuf,
}

/// An encoded form, ready to send.
#[derive(Debug)]
pub struct EncodedForm {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from `(name, value)` pairs.
    pub fn with_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            file: None,
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Attach the file at `path` under form field `field`. A second call
    /// replaces the first. An empty field name or path attaches nothing.
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let field = field.into();
        let path = path.into();
        if !field.is_empty() && !path.as_os_str().is_empty() {
            self.file = Some(FilePart { field, path });
        }
        self
    }

    /// Encode with a fresh random boundary.
    pub fn encode(&self) -> Result<EncodedForm> {
        self.encode_with_boundary(&format!("httpcli-{}", Uuid::new_v4().simple()))
    }

    fn encode_with_boundary(&self, boundary: &str) -> Result<EncodedForm> {
        let mut body = Vec::new();

        if let Some(part) = &self.file {
            let filename = part
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    escape_quotes(&part.field),
                    escape_quotes(&filename)
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            copy_file(&part.path, &mut body)?;
            body.extend_from_slice(b"\r\n");
        }

        for (name, value) in &self.fields {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_quotes(name)
                )
                .as_bytes(),
            );
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(EncodedForm {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            body,
        })
    }
}

fn copy_file(path: &Path, out: &mut Vec<u8>) -> Result<()> {
    let io_err = |source: io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    file.read_to_end(out).map_err(io_err)?;
    Ok(())
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn encodes_fields_only() {
        let form = Form::new().text("a", "1").text("b", "ASD");
        let encoded = form.encode_with_boundary("XYZ").unwrap();
        assert_eq!(encoded.content_type, "multipart/form-data; boundary=XYZ");
        assert_eq!(
            String::from_utf8(encoded.body).unwrap(),
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n\
             --XYZ\r\n\
             Content-Disposition: form-data; name=\"b\"\r\n\r\nASD\r\n\
             --XYZ--\r\n"
        );
    }

    #[test]
    fn file_part_comes_first_with_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        File::create(&path)
            .unwrap()
            .write_all(b"I am a nice file")
            .unwrap();

        let form = Form::with_fields([("a", "1")]).file("file", &path);
        let body = String::from_utf8(form.encode_with_boundary("B").unwrap().body).unwrap();

        assert!(body.starts_with(
            "--B\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"file.txt\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             I am a nice file\r\n"
        ));
        assert!(body.contains("name=\"a\"\r\n\r\n1\r\n"));
        assert!(body.ends_with("--B--\r\n"));
    }

    #[test]
    fn missing_file_aborts_encoding() {
        let form = Form::new().text("a", "1").file("file", "/definitely/not/here.txt");
        let err = form.encode().unwrap_err();
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.txt"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_field_or_path_attaches_nothing() {
        let form = Form::new().text("a", "1").file("", "/some/file.txt");
        let body = String::from_utf8(form.encode_with_boundary("B").unwrap().body).unwrap();
        assert_eq!(body, "--B\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n--B--\r\n");

        let form = Form::new().file("file", "");
        let body = String::from_utf8(form.encode_with_boundary("B").unwrap().body).unwrap();
        assert_eq!(body, "--B--\r\n");
    }

    #[test]
    fn random_boundaries_differ() {
        let form = Form::new().text("k", "v");
        let a = form.encode().unwrap().content_type;
        let b = form.encode().unwrap().content_type;
        assert_ne!(a, b);
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let form = Form::new().text("we\"ird", "v");
        let body = String::from_utf8(form.encode_with_boundary("B").unwrap().body).unwrap();
        assert!(body.contains("name=\"we\\\"ird\""));
    }
}
