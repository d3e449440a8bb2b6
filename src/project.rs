// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: project  -  project descriptor lookup and identity
//
//  A project is a `.yyp` descriptor plus, next to it,
//  options/main/inherited/options_main.inherited.yy which carries the
//  stable game GUID. The GUID keys the scratch build area.
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Result, RubberError};

/// Model tag every valid descriptor carries.
pub const PROJECT_MODEL: &str = "GMProject";

/// Path of the inherited main options file, relative to the project dir.
pub fn inherited_options_path(project_dir: &Path) -> PathBuf {
    project_dir
        .join("options")
        .join("main")
        .join("inherited")
        .join("options_main.inherited.yy")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// `option_gameguid` from the inherited main options.
    MainOptions,
    /// `id` of the descriptor itself. Not guaranteed to match the primary path.
    Descriptor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    pub guid:   String,
    pub source: IdentitySource,
}

fn guid_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""option_gameguid": "(.*?)""#).expect("static pattern")
    })
}

/// A GUID becomes a directory name under the tool's temp root, so it must be
/// a single plain path component.
fn usable_guid(guid: &str) -> bool {
    !guid.is_empty()
        && guid != "."
        && guid != ".."
        && guid.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Resolve the identity of the project whose descriptor is `project_file`.
pub fn locate(project_file: &Path) -> Result<ProjectIdentity> {
    let project_dir = project_file.parent().unwrap_or_else(|| Path::new("."));
    let options = inherited_options_path(project_dir);

    if !options.is_file() {
        return Err(RubberError::ProjectStructure(project_dir.to_path_buf()));
    }

    let text = std::fs::read_to_string(&options)?;
    let captured = guid_pattern().captures(&text).and_then(|c| c.get(1));
    if let Some(bad) = captured.filter(|g| !usable_guid(g.as_str())) {
        warn!("ignoring unusable option_gameguid {:?} in {}", bad.as_str(), options.display());
    }
    if let Some(guid) = captured.filter(|g| usable_guid(g.as_str())) {
        debug!("project guid {} from {}", guid.as_str(), options.display());
        return Ok(ProjectIdentity {
            guid:   guid.as_str().to_owned(),
            source: IdentitySource::MainOptions,
        });
    }

    let id = std::fs::read_to_string(project_file)
        .ok()
        .and_then(|s| serde_json::from_str::<serde_json::Value>(&s).ok())
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_owned))
        .filter(|id| usable_guid(id));

    match id {
        Some(guid) => {
            warn!(
                "{} has no option_gameguid; using the project id {} as cache key",
                options.display(), guid,
            );
            Ok(ProjectIdentity { guid, source: IdentitySource::Descriptor })
        }
        None => Err(RubberError::ProjectIdentity(project_file.to_path_buf())),
    }
}

/// True if `path` parses as a project descriptor. Never fails.
pub fn validate(path: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(path) else { return false };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else { return false };
    let Some(obj) = value.as_object() else { return false };

    ["id", "mvc", "resources"].iter().all(|k| obj.contains_key(*k))
        && obj.get("modelName").and_then(|m| m.as_str()) == Some(PROJECT_MODEL)
}

/// Resolve a user-supplied project path. Directories are searched
/// (non-recursively, by file name) for the first valid descriptor.
pub fn find_project(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return validate(path).then(|| path.to_path_buf());
    }

    WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .find(|p| validate(p))
}

/// File stem of the descriptor, used as the project name.
pub fn project_name(project_file: &Path) -> String {
    project_file.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"{"id":"d0a5","mvc":"1.0","IsDnDProject":false,"resources":[],"modelName":"GMProject"}"#;

    fn project(options: Option<&str>) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let yyp = dir.path().join("game.yyp");
        fs::write(&yyp, DESCRIPTOR).unwrap();
        if let Some(text) = options {
            let opt = inherited_options_path(dir.path());
            fs::create_dir_all(opt.parent().unwrap()).unwrap();
            fs::write(opt, text).unwrap();
        }
        (dir, yyp)
    }

    #[test]
    fn guid_from_inherited_options() {
        let (_dir, yyp) = project(Some("1.0.0←x|{\n    \"option_gameguid\": \"abc-123\"\n}"));
        let id = locate(&yyp).unwrap();
        assert_eq!(id.guid, "abc-123");
        assert_eq!(id.source, IdentitySource::MainOptions);
    }

    #[test]
    fn falls_back_to_descriptor_id() {
        let (_dir, yyp) = project(Some("1.0.0←nothing here"));
        let id = locate(&yyp).unwrap();
        assert_eq!(id.guid, "d0a5");
        assert_eq!(id.source, IdentitySource::Descriptor);
    }

    #[test]
    fn empty_guid_falls_back_to_descriptor_id() {
        let (_dir, yyp) = project(Some("{\n    \"option_gameguid\": \"\"\n}"));
        let id = locate(&yyp).unwrap();
        assert_eq!(id.guid, "d0a5");
        assert_eq!(id.source, IdentitySource::Descriptor);
    }

    #[test]
    fn path_like_guids_are_rejected() {
        for guid in ["..", "../../etc", "a/b", r"a\b", "x y", "$(id)"] {
            let (_dir, yyp) = project(Some(&format!("{{\n    \"option_gameguid\": \"{guid}\"\n}}")));
            fs::write(&yyp, format!(r#"{{"id":"{guid}","modelName":"GMProject"}}"#).replace('\\', "\\\\")).unwrap();
            assert!(matches!(locate(&yyp), Err(RubberError::ProjectIdentity(_))), "{guid}");
        }
    }

    #[test]
    fn missing_options_is_structure_error() {
        let (_dir, yyp) = project(None);
        assert!(matches!(locate(&yyp), Err(RubberError::ProjectStructure(_))));
    }

    #[test]
    fn no_guid_anywhere_is_identity_error() {
        let (dir, yyp) = project(Some("no guid"));
        fs::write(&yyp, r#"{"modelName":"GMProject"}"#).unwrap();
        assert!(matches!(locate(&yyp), Err(RubberError::ProjectIdentity(_))));
        drop(dir);
    }

    #[test]
    fn validate_requires_model_tag() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("a.yyp");
        fs::write(&p, r#"{"id":"x","mvc":"1.0","resources":[]}"#).unwrap();
        assert!(!validate(&p));
        fs::write(&p, r#"{"id":"x","mvc":"1.0","resources":[],"modelName":"GMFolder"}"#).unwrap();
        assert!(!validate(&p));
        fs::write(&p, DESCRIPTOR).unwrap();
        assert!(validate(&p));
    }

    #[test]
    fn validate_is_false_for_garbage() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("a.yyp");
        fs::write(&p, "{ not json").unwrap();
        assert!(!validate(&p));
        assert!(!validate(&dir.path().join("missing.yyp")));
        assert!(!validate(dir.path()));
    }

    #[test]
    fn find_project_searches_directory() {
        let (dir, yyp) = project(None);
        fs::write(dir.path().join("README.md"), "hello").unwrap();
        assert_eq!(find_project(dir.path()), Some(yyp.clone()));
        assert_eq!(find_project(&yyp), Some(yyp));
        assert_eq!(project_name(&dir.path().join("game.yyp")), "game");
    }
}
