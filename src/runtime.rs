// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: runtime  -  installed compiler runtime lookup
//
//  The IDE keeps an index next to its program data:
//
//      runtime.json = { "active": "runtime-2.2.5.378",
//                       "runtime-2.2.5.378": "C:\\...\\runtime-2.2.5.378&<meta>" }
//
//  Everything from the first '&' onward is metadata and gets dropped.
//  The index is read fresh on every call.
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};

use crate::error::{Result, RubberError};

pub const RUNTIME_INDEX: &str = "runtime.json";
const ACTIVE_KEY: &str = "active";
const META_DELIMITER: char = '&';

pub fn index_path(data_dir: &Path) -> PathBuf {
    data_dir.join(RUNTIME_INDEX)
}

/// Pick the runtime location.
///
/// `explicit` wins and is used verbatim. Otherwise `named` is looked up in the
/// index, or the `active` entry when `named` is `None`.
pub fn resolve(index: &Path, explicit: Option<&str>, named: Option<&str>) -> Result<String> {
    if let Some(location) = explicit {
        debug!("runtime location overridden: {location}");
        return Ok(location.to_owned());
    }

    if !index.is_file() {
        return Err(RubberError::InstallationNotFound(index.to_path_buf()));
    }

    let corrupt = |reason: String| RubberError::RuntimeIndexCorrupt {
        path: index.to_path_buf(),
        reason,
    };

    let text = std::fs::read_to_string(index)?;
    let runtimes: Map<String, Value> =
        serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;

    let name = match named {
        Some(n) => n.to_owned(),
        None => runtimes.get(ACTIVE_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| RubberError::NoActiveRuntime(index.to_path_buf()))?,
    };

    let entry = runtimes.get(&name)
        .ok_or_else(|| RubberError::RuntimeNotFound { name: name.clone(), path: index.to_path_buf() })?;
    let raw = entry.as_str()
        .ok_or_else(|| corrupt(format!("entry '{name}' is not a string")))?;

    let location = strip_metadata(raw).to_owned();
    debug!("runtime '{name}' at {location}");
    Ok(location)
}

fn strip_metadata(raw: &str) -> &str {
    match raw.find(META_DELIMITER) {
        Some(i) => &raw[..i],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn index(json: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let p = index_path(dir.path());
        fs::write(&p, json).unwrap();
        (dir, p)
    }

    const INDEX: &str = r#"{"active": "A", "A": "C:\\runtimes\\A&meta"}"#;

    #[test]
    fn active_runtime_with_suffix_stripped() {
        let (_d, p) = index(INDEX);
        assert_eq!(resolve(&p, None, None).unwrap(), r"C:\runtimes\A");
    }

    #[test]
    fn named_runtime_missing() {
        let (_d, p) = index(INDEX);
        assert!(matches!(
            resolve(&p, None, Some("B")),
            Err(RubberError::RuntimeNotFound { name, .. }) if name == "B"
        ));
    }

    #[test]
    fn named_runtime_found() {
        let (_d, p) = index(r#"{"active": "A", "A": "a&x", "B": "C:\\b&y&z"}"#);
        assert_eq!(resolve(&p, None, Some("B")).unwrap(), r"C:\b");
    }

    #[test]
    fn explicit_override_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(resolve(&missing, Some("X:\\rt&keep"), None).unwrap(), "X:\\rt&keep");
    }

    #[test]
    fn no_active_entry() {
        let (_d, p) = index(r#"{"A": "a&x"}"#);
        assert!(matches!(resolve(&p, None, None), Err(RubberError::NoActiveRuntime(_))));
    }

    #[test]
    fn unparsable_index() {
        let (_d, p) = index("{ broken");
        assert!(matches!(resolve(&p, None, None), Err(RubberError::RuntimeIndexCorrupt { .. })));
    }

    #[test]
    fn missing_index_is_installation_error() {
        let dir = TempDir::new().unwrap();
        let p = index_path(dir.path());
        assert!(matches!(resolve(&p, None, None), Err(RubberError::InstallationNotFound(_))));
    }

    #[test]
    fn entry_without_delimiter_is_kept_whole() {
        assert_eq!(strip_metadata(r"C:\rt"), r"C:\rt");
    }
}
