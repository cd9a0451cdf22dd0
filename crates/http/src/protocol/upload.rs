//! Uploaded file descriptors and the raw specs they are normalized from.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

/// A tree of uploaded files keyed by form field name, in the order the client sent them.
pub type UploadedFiles = IndexMap<String, UploadedFileTree>;

/// A raw, `$_FILES`-shaped upload description keyed by form field name, in input order.
pub type FileSpecMap = IndexMap<String, FileSpec>;

/// One node of an [`UploadedFiles`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadedFileTree {
    File(UploadedFile),
    Map(UploadedFiles),
}

impl UploadedFileTree {
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            UploadedFileTree::File(file) => Some(file),
            UploadedFileTree::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&UploadedFiles> {
        match self {
            UploadedFileTree::File(_) => None,
            UploadedFileTree::Map(map) => Some(map),
        }
    }

    /// Looks up a child node when this node is a map.
    pub fn get(&self, key: &str) -> Option<&UploadedFileTree> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<UploadedFile> for UploadedFileTree {
    fn from(file: UploadedFile) -> Self {
        Self::File(file)
    }
}

/// Transport metadata for one uploaded file.
///
/// The file content itself is never read here, `path` points at the temporary
/// file the transport already wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    path: PathBuf,
    size: u64,
    error: UploadError,
    client_filename: Option<String>,
    client_media_type: Option<String>,
}

impl UploadedFile {
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        error: UploadError,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self { path: path.into(), size, error, client_filename, client_media_type }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    /// Returns true when the transport reported no upload error.
    pub fn is_ok(&self) -> bool {
        self.error == UploadError::Ok
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }
}

/// Upload status codes as reported by the transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UploadError {
    Ok,
    /// Exceeds the server side size limit
    IniSize,
    /// Exceeds the size limit declared by the form
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    /// Stopped by a server extension
    Extension,
    Unknown(i64),
}

impl UploadError {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => UploadError::Ok,
            1 => UploadError::IniSize,
            2 => UploadError::FormSize,
            3 => UploadError::Partial,
            4 => UploadError::NoFile,
            6 => UploadError::NoTmpDir,
            7 => UploadError::CantWrite,
            8 => UploadError::Extension,
            code => UploadError::Unknown(code),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            UploadError::Ok => 0,
            UploadError::IniSize => 1,
            UploadError::FormSize => 2,
            UploadError::Partial => 3,
            UploadError::NoFile => 4,
            UploadError::NoTmpDir => 6,
            UploadError::CantWrite => 7,
            UploadError::Extension => 8,
            UploadError::Unknown(code) => code,
        }
    }
}

/// A node of a raw upload description.
///
/// Foreign upload data usually arrives as loosely typed json, [`From<Value>`] converts it:
/// objects become [`FileSpec::Map`], arrays become maps keyed by index, everything else is a
/// [`FileSpec::Scalar`]. Already built descriptors can be mixed in as [`FileSpec::Uploaded`].
#[derive(Debug, Clone, PartialEq)]
pub enum FileSpec {
    Uploaded(UploadedFile),
    Map(FileSpecMap),
    Scalar(Value),
}

impl FileSpec {
    pub fn as_map(&self) -> Option<&FileSpecMap> {
        match self {
            FileSpec::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, FileSpec::Map(_))
    }
}

impl From<Value> for FileSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => FileSpec::Map(object.into_iter().map(|(k, v)| (k, FileSpec::from(v))).collect()),
            Value::Array(array) => {
                FileSpec::Map(array.into_iter().enumerate().map(|(i, v)| (i.to_string(), FileSpec::from(v))).collect())
            }
            scalar => FileSpec::Scalar(scalar),
        }
    }
}

impl From<UploadedFile> for FileSpec {
    fn from(file: UploadedFile) -> Self {
        FileSpec::Uploaded(file)
    }
}

impl From<FileSpecMap> for FileSpec {
    fn from(map: FileSpecMap) -> Self {
        FileSpec::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_codes() {
        for code in [0, 1, 2, 3, 4, 6, 7, 8, 5, 42] {
            assert_eq!(UploadError::from_code(code).code(), code);
        }
        assert_eq!(UploadError::from_code(5), UploadError::Unknown(5));
        assert_eq!(UploadError::from_code(4), UploadError::NoFile);
    }

    #[test]
    fn spec_from_json() {
        let spec = FileSpec::from(json!({"avatar": {"tmp_name": "/tmp/a", "size": 3}, "docs": ["x", null]}));

        let map = spec.as_map().unwrap();
        let avatar = map["avatar"].as_map().unwrap();
        assert_eq!(avatar["tmp_name"], FileSpec::Scalar(json!("/tmp/a")));
        assert_eq!(avatar["size"], FileSpec::Scalar(json!(3)));

        let docs = map["docs"].as_map().unwrap();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["0", "1"]);
        assert_eq!(docs["1"], FileSpec::Scalar(Value::Null));
    }

    #[test]
    fn spec_keeps_input_order() {
        let ids = (0..12).collect::<Vec<u32>>();
        let spec = FileSpec::from(json!({"zeta": 1, "alpha": 2, "mid": ids}));

        let map = spec.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let expected = (0..12).map(|i| i.to_string()).collect::<Vec<_>>();
        assert_eq!(map["mid"].as_map().unwrap().keys().cloned().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn tree_lookup() {
        let file = UploadedFile::new("/tmp/a", 1, UploadError::Ok, None, None);
        let tree = UploadedFileTree::Map(UploadedFiles::from([("a".to_string(), UploadedFileTree::from(file.clone()))]));

        assert_eq!(tree.get("a").and_then(UploadedFileTree::as_file), Some(&file));
        assert!(tree.get("b").is_none());
        assert!(tree.as_file().is_none());
        assert!(file.is_ok());
    }
}
