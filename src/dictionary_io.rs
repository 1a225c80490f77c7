use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failures reading a data dictionary or writing the upgraded one
#[derive(Debug, Error)]
pub enum DictionaryIoError {
    #[error("Could not read data dictionary {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error(
        "Data dictionary must have UTF-8 encoding: {path}. Tip: Need help converting your file? \
         Try a tool like iconv (http://linux.die.net/man/1/iconv)."
    )]
    Encoding { path: PathBuf },

    #[error("Data dictionary is not valid JSON: {path} ({source})")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("Output file {path} already exists. Use --overwrite or -f to overwrite it.")]
    OutputExists { path: PathBuf },

    #[error("Could not write output file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Could not serialize the upgraded data dictionary: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Read and parse a UTF-8 JSON data dictionary
pub fn load_dictionary(path: &Path) -> Result<Value, DictionaryIoError> {
    let bytes = fs::read(path).map_err(|source| DictionaryIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| DictionaryIoError::Encoding {
        path: path.to_path_buf(),
    })?;
    let dictionary = serde_json::from_str(&text).map_err(|source| DictionaryIoError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Loaded data dictionary from {}", path.display());
    Ok(dictionary)
}

/// Write `dictionary` as 4-space indented JSON. An existing file is only
/// replaced when `overwrite` is set.
pub fn save_dictionary(dictionary: &Value, path: &Path, overwrite: bool) -> Result<(), DictionaryIoError> {
    if path.exists() && !overwrite {
        return Err(DictionaryIoError::OutputExists {
            path: path.to_path_buf(),
        });
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    dictionary
        .serialize(&mut serializer)
        .map_err(DictionaryIoError::Serialize)?;
    buffer.push(b'\n');

    fs::write(path, buffer).map_err(|source| DictionaryIoError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_load_dictionary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dictionary.json");
        fs::write(&path, r#"{"age": {"Description": "Âge en années"}}"#).unwrap();

        let dictionary = load_dictionary(&path).unwrap();
        assert_eq!(dictionary["age"]["Description"], json!("Âge en années"));
    }

    #[test]
    fn test_load_rejects_non_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.json");
        // "Âge" in Latin-1
        fs::write(&path, b"{\"age\": {\"Description\": \"\xC2ge\"}}").unwrap();

        let err = load_dictionary(&path).unwrap_err();
        assert!(matches!(err, DictionaryIoError::Encoding { .. }));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"age\": ").unwrap();

        let err = load_dictionary(&path).unwrap_err();
        assert!(matches!(err, DictionaryIoError::Parse { .. }));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_dictionary(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, DictionaryIoError::Read { .. }));
    }

    #[test]
    fn test_save_uses_four_space_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        save_dictionary(&json!({"age": {"Description": "Age"}}), &path, false).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n    \"age\": {\n        \"Description\": \"Age\"\n    }\n}\n");
    }

    #[test]
    fn test_save_respects_overwrite_policy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "previous").unwrap();

        let err = save_dictionary(&json!({}), &path, false).unwrap_err();
        assert!(matches!(err, DictionaryIoError::OutputExists { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");

        save_dictionary(&json!({}), &path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
