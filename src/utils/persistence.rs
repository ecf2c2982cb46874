use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::errors::Result;

const TMP_SUFFIX: &str = "tmp";

/// Writes `value` as pretty JSON by staging to a sibling temp file and
/// renaming it over `path`.
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a JSON document, `None` when the file does not exist.
pub fn read_json(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_json_atomic(&path, &json!({"target": 10})).unwrap();
        assert_eq!(read_json(&path).unwrap(), Some(json!({"target": 10})));
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        assert_eq!(read_json(&dir.path().join("absent.json")).unwrap(), None);
    }

    #[test]
    fn failed_write_preserves_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &json!({"v": 1})).unwrap();
        fs::create_dir_all(tmp_path(&path)).unwrap();
        assert!(write_json_atomic(&path, &json!({"v": 2})).is_err());
        assert_eq!(read_json(&path).unwrap(), Some(json!({"v": 1})));
    }
}
