//! Normalization of `$_FILES`-shaped upload descriptions.
//!
//! A raw description comes in three shapes, which may nest under arbitrary grouping keys:
//!
//! ```text
//! flat:      {tmp_name: "/tmp/a", size: 3, error: 0, name: "a.txt", type: "text/plain"}
//! parallel:  {tmp_name: {x: "/tmp/a", y: "/tmp/b"}, size: {x: 3, y: 4}, error: {...}, name: {...}, type: {...}}
//! grouping:  {avatar: <flat>, docs: <parallel>}
//! ```
//!
//! [`normalize_files`] turns all of them into one [`UploadedFiles`] tree with the same keys at
//! every level and an [`UploadedFile`] at every leaf. A parallel spec is split per key of its
//! `tmp_name` map, so `{tmp_name: {x, y}, ...}` becomes `{x: file, y: file}`.

use comet_http::protocol::{FileSpec, FileSpecMap, UploadError, UploadedFile, UploadedFileTree, UploadedFiles};
use serde_json::Value;

use crate::RequestError;

const TMP_NAME: &str = "tmp_name";

/// The fields every flat file spec must carry, in the order they are read.
const FILE_FIELDS: [&str; 5] = [TMP_NAME, "size", "error", "name", "type"];

/// Normalizes every entry of a raw upload description.
///
/// # Errors
///
/// Returns [`RequestError::InvalidUploadSpec`] when an entry is a scalar, or a file spec misses
/// one of its five fields.
pub fn normalize_files(spec: FileSpecMap) -> Result<UploadedFiles, RequestError> {
    spec.into_iter().map(|(key, value)| normalize_spec(value).map(|tree| (key, tree))).collect()
}

/// Normalizes a single node of a raw upload description.
///
/// # Errors
///
/// See [`normalize_files`].
pub fn normalize_spec(spec: FileSpec) -> Result<UploadedFileTree, RequestError> {
    match spec {
        FileSpec::Uploaded(file) => Ok(UploadedFileTree::File(file)),
        FileSpec::Map(map) if is_file_spec(&map) => from_file_spec(map),
        FileSpec::Map(map) => normalize_files(map).map(UploadedFileTree::Map),
        FileSpec::Scalar(value) => {
            Err(RequestError::invalid_upload_spec(format!("expected a file spec or a map, found `{value}`")))
        }
    }
}

/// A map is a file spec when it has a set `tmp_name`, a null `tmp_name` counts as unset.
fn is_file_spec(map: &FileSpecMap) -> bool {
    match map.get(TMP_NAME) {
        Some(FileSpec::Scalar(Value::Null)) | None => false,
        Some(_) => true,
    }
}

fn from_file_spec(spec: FileSpecMap) -> Result<UploadedFileTree, RequestError> {
    if spec.get(TMP_NAME).is_some_and(FileSpec::is_map) {
        return normalize_parallel(spec).map(UploadedFileTree::Map);
    }
    create_uploaded_file(spec).map(UploadedFileTree::File)
}

/// Splits a parallel spec into one flat spec per key of its `tmp_name` map.
fn normalize_parallel(mut spec: FileSpecMap) -> Result<UploadedFiles, RequestError> {
    let mut columns = Vec::with_capacity(FILE_FIELDS.len());
    for field in FILE_FIELDS {
        match spec.shift_remove(field) {
            Some(FileSpec::Map(column)) => columns.push(column),
            Some(_) => return Err(RequestError::invalid_upload_spec(format!("`{field}` must be keyed like `{TMP_NAME}`"))),
            None => return Err(RequestError::invalid_upload_spec(format!("missing `{field}` field"))),
        }
    }

    let keys = columns[0].keys().cloned().collect::<Vec<_>>();
    let mut normalized = UploadedFiles::new();
    for key in keys {
        let mut entry = FileSpecMap::new();
        for (field, column) in FILE_FIELDS.iter().zip(columns.iter_mut()) {
            let value = column
                .shift_remove(&key)
                .ok_or_else(|| RequestError::invalid_upload_spec(format!("missing `{field}` for file `{key}`")))?;
            entry.insert((*field).to_string(), value);
        }
        let tree = from_file_spec(entry)?;
        normalized.insert(key, tree);
    }

    Ok(normalized)
}

fn create_uploaded_file(mut spec: FileSpecMap) -> Result<UploadedFile, RequestError> {
    let path = match take_scalar(&mut spec, TMP_NAME)? {
        Value::String(path) => path,
        Value::Null => return Err(RequestError::invalid_upload_spec("`tmp_name` must not be null")),
        other => other.to_string(),
    };
    let size = coerce_int(&take_scalar(&mut spec, "size")?);
    let error = coerce_int(&take_scalar(&mut spec, "error")?);
    let client_filename = optional_string(take_scalar(&mut spec, "name")?);
    let client_media_type = optional_string(take_scalar(&mut spec, "type")?);

    Ok(UploadedFile::new(
        path,
        u64::try_from(size).unwrap_or_default(),
        UploadError::from_code(error),
        client_filename,
        client_media_type,
    ))
}

fn take_scalar(spec: &mut FileSpecMap, field: &str) -> Result<Value, RequestError> {
    match spec.shift_remove(field) {
        Some(FileSpec::Scalar(value)) => Ok(value),
        Some(_) => Err(RequestError::invalid_upload_spec(format!("`{field}` must be a scalar"))),
        None => Err(RequestError::invalid_upload_spec(format!("missing `{field}` field"))),
    }
}

fn optional_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Integer coercion with the loose rules upload metadata is usually produced under:
/// numeric strings use their leading integer, anything unparsable is 0, floats truncate.
fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(truncate)).unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(truncate)).unwrap_or_else(|| leading_int(s))
        }
    }
}

#[allow(clippy::cast_possible_truncation, reason = "saturating float to integer conversion is the intent")]
fn truncate(f: f64) -> i64 {
    f as i64
}

fn leading_int(s: &str) -> i64 {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().map_or(0, |n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> FileSpecMap {
        match FileSpec::from(value) {
            FileSpec::Map(map) => map,
            other => panic!("not a map: {other:?}"),
        }
    }

    fn file(path: &str, size: u64, error: UploadError, name: &str, media_type: &str) -> UploadedFile {
        UploadedFile::new(path, size, error, Some(name.to_string()), Some(media_type.to_string()))
    }

    #[test]
    fn flat_spec() {
        let files = normalize_files(spec(json!({
            "avatar": {"tmp_name": "/tmp/php1", "size": "1024", "error": "0", "name": "me.png", "type": "image/png"}
        })))
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files["avatar"], UploadedFileTree::File(file("/tmp/php1", 1024, UploadError::Ok, "me.png", "image/png")));
    }

    #[test]
    fn parallel_spec() {
        let files = normalize_files(spec(json!({
            "docs": {
                "tmp_name": {"x": "/tmp/a", "y": "/tmp/b"},
                "size": {"x": 1, "y": 2},
                "error": {"x": 0, "y": 4},
                "name": {"x": "a.txt", "y": "b.txt"},
                "type": {"x": "text/plain", "y": "text/csv"}
            }
        })))
        .unwrap();

        let docs = files["docs"].as_map().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs["x"], UploadedFileTree::File(file("/tmp/a", 1, UploadError::Ok, "a.txt", "text/plain")));
        assert_eq!(docs["y"], UploadedFileTree::File(file("/tmp/b", 2, UploadError::NoFile, "b.txt", "text/csv")));
    }

    #[test]
    fn deeply_parallel_spec() {
        let files = normalize_files(spec(json!({
            "gallery": {
                "tmp_name": {"photos": ["/tmp/a", "/tmp/b"]},
                "size": {"photos": [1, 2]},
                "error": {"photos": [0, 0]},
                "name": {"photos": ["a.jpg", "b.jpg"]},
                "type": {"photos": ["image/jpeg", "image/jpeg"]}
            }
        })))
        .unwrap();

        let photos = files["gallery"].get("photos").and_then(UploadedFileTree::as_map).unwrap();
        assert_eq!(photos.keys().collect::<Vec<_>>(), vec!["0", "1"]);
        assert_eq!(photos["1"].as_file().map(UploadedFile::size), Some(2));
    }

    #[test]
    fn keeps_client_order() {
        let paths = (0..12).map(|i| format!("/tmp/php{i}")).collect::<Vec<_>>();
        let names = (0..12).map(|i| format!("page{i}.pdf")).collect::<Vec<_>>();
        let files = normalize_files(spec(json!({
            "zeta": {"tmp_name": "/tmp/z", "size": 1, "error": 0, "name": "z", "type": "t"},
            "scans": {
                "tmp_name": paths,
                "size": vec![1; 12],
                "error": vec![0; 12],
                "name": names,
                "type": vec!["application/pdf"; 12]
            },
            "alpha": {"tmp_name": "/tmp/a", "size": 1, "error": 0, "name": "a", "type": "t"}
        })))
        .unwrap();

        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["zeta", "scans", "alpha"]);

        let scans = files["scans"].as_map().unwrap();
        let expected = (0..12).map(|i| i.to_string()).collect::<Vec<_>>();
        assert_eq!(scans.keys().cloned().collect::<Vec<_>>(), expected);
        assert_eq!(scans["10"].as_file().and_then(UploadedFile::client_filename), Some("page10.pdf"));
    }

    #[test]
    fn grouping_keys_are_kept() {
        let files = normalize_files(spec(json!({
            "profile": {
                "avatar": {"tmp_name": "/tmp/a", "size": 1, "error": 0, "name": "a.png", "type": "image/png"},
                "extra": {
                    "cv": {"tmp_name": "/tmp/b", "size": 2, "error": 0, "name": null, "type": null}
                }
            }
        })))
        .unwrap();

        let profile = &files["profile"];
        assert!(profile.get("avatar").and_then(UploadedFileTree::as_file).is_some());

        let cv = profile.get("extra").and_then(|e| e.get("cv")).and_then(UploadedFileTree::as_file).unwrap();
        assert_eq!(cv.path().to_str(), Some("/tmp/b"));
        assert_eq!(cv.client_filename(), None);
        assert_eq!(cv.client_media_type(), None);
    }

    #[test]
    fn uploaded_files_are_kept() {
        let uploaded = file("/tmp/a", 1, UploadError::Ok, "a", "text/plain");
        let mut raw = FileSpecMap::new();
        raw.insert("ready".to_string(), FileSpec::from(uploaded.clone()));

        let files = normalize_files(raw).unwrap();
        assert_eq!(files["ready"], UploadedFileTree::File(uploaded));
    }

    #[test]
    fn scalar_is_rejected() {
        let result = normalize_files(spec(json!({"avatar": "not a file"})));
        assert!(matches!(result, Err(RequestError::InvalidUploadSpec { .. })));

        let result = normalize_spec(FileSpec::Scalar(json!(42)));
        assert!(matches!(result, Err(RequestError::InvalidUploadSpec { .. })));
    }

    #[test]
    fn null_tmp_name_is_not_a_file() {
        let result = normalize_files(spec(json!({"avatar": {"tmp_name": null, "size": 1}})));
        assert!(matches!(result, Err(RequestError::InvalidUploadSpec { .. })));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let flat = normalize_files(spec(json!({"a": {"tmp_name": "/tmp/a", "size": 1, "error": 0, "name": "a"}})));
        assert!(matches!(flat, Err(RequestError::InvalidUploadSpec { reason }) if reason.contains("type")));

        let parallel = normalize_files(spec(json!({
            "a": {
                "tmp_name": {"x": "/tmp/a", "y": "/tmp/b"},
                "size": {"x": 1},
                "error": {"x": 0, "y": 0},
                "name": {"x": "a", "y": "b"},
                "type": {"x": "t", "y": "t"}
            }
        })));
        assert!(matches!(parallel, Err(RequestError::InvalidUploadSpec { reason }) if reason.contains("`y`")));
    }

    #[test]
    fn single_spec_entry_point() {
        let tree = normalize_spec(FileSpec::from(json!({
            "tmp_name": "/tmp/a", "size": 7, "error": 0, "name": "a", "type": "b"
        })))
        .unwrap();

        assert_eq!(tree, UploadedFileTree::File(file("/tmp/a", 7, UploadError::Ok, "a", "b")));
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(coerce_int(&json!("42")), 42);
        assert_eq!(coerce_int(&json!(" 12kb")), 12);
        assert_eq!(coerce_int(&json!("-3x")), -3);
        assert_eq!(coerce_int(&json!("1e3")), 1000);
        assert_eq!(coerce_int(&json!("abc")), 0);
        assert_eq!(coerce_int(&json!(7.9)), 7);
        assert_eq!(coerce_int(&json!(true)), 1);
        assert_eq!(coerce_int(&Value::Null), 0);
    }

    #[test]
    fn negative_size_is_zero() {
        let tree = normalize_spec(FileSpec::from(json!({
            "tmp_name": "/tmp/a", "size": -1, "error": 99, "name": "a", "type": "b"
        })))
        .unwrap();

        let file = tree.as_file().unwrap();
        assert_eq!(file.size(), 0);
        assert_eq!(file.error(), UploadError::Unknown(99));
        assert!(!file.is_ok());
    }
}
