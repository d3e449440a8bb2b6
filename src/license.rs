// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: license  -  build module entitlement check
//
//  licence.plist is owned by the IDE and not guaranteed to be well-formed
//  XML, so the component list is pulled out with a pattern instead of a
//  plist parser:
//
//      <key>components</key>
//      <string>Windows.build_module;Mac.build_module;...</string>
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::{Result, RubberError};

pub const LICENCE_FILE: &str = "licence.plist";

pub fn licence_path(user_dir: &Path) -> PathBuf {
    user_dir.join(LICENCE_FILE)
}

fn components_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<key>components</key>.*?\n.*?<string>(.*?)</string>").expect("static pattern")
    })
}

/// Permitted component keys listed in a licence record.
pub fn permitted_components(text: &str) -> Option<Vec<String>> {
    let caps = components_pattern().captures(text)?;
    Some(
        caps[1].split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
    )
}

/// True if the licence at `licence` permits `build_module`.
pub fn check(licence: &Path, build_module: &str) -> Result<bool> {
    let text = std::fs::read_to_string(licence)
        .map_err(|_| RubberError::LicenseUnreadable(licence.to_path_buf()))?;

    let components = permitted_components(&text)
        .ok_or_else(|| RubberError::LicenseUnreadable(licence.to_path_buf()))?;

    debug!("licence {} permits {:?}", licence.display(), components);
    Ok(components.iter().any(|c| c == build_module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PLIST: &str = "<plist>\n<dict>\n\t<key>components</key>\n\t<string>Windows.build_module;Mac.build_module;ios.build_module</string>\n</dict>\n</plist>\n";

    #[test]
    fn extracts_component_list() {
        let list = permitted_components(PLIST).unwrap();
        assert_eq!(list, vec!["Windows.build_module", "Mac.build_module", "ios.build_module"]);
    }

    #[test]
    fn absent_key_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let p = licence_path(dir.path());
        fs::write(&p, PLIST).unwrap();
        assert!(check(&p, "Windows.build_module").unwrap());
        assert!(!check(&p, "android.build_module").unwrap());
    }

    #[test]
    fn missing_marker_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let p = licence_path(dir.path());
        fs::write(&p, "<plist><dict></dict></plist>").unwrap();
        assert!(matches!(check(&p, "Windows.build_module"), Err(RubberError::LicenseUnreadable(_))));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let p = licence_path(dir.path());
        assert!(matches!(check(&p, "Windows.build_module"), Err(RubberError::LicenseUnreadable(_))));
    }
}
