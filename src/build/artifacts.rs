// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: build :: artifacts  -  files the compiler reads from the scratch dir
//
//  <scratch>/
//    GMCache/  GMTemp/  Output/
//    build.bff            build meta, passed via -options=
//    macros.json          macro table
//    targetoptions.json   runtime flavour + remote device fields
//    steam_options.yy     desktop/Steam platform options
// ─────────────────────────────────────────────────────────────────────────────

use std::path::Path;

use log::info;
use serde::Serialize;

use crate::device::DeviceRecord;
use crate::error::Result;
use super::macros::MacroTable;

pub const CACHE_DIR:  &str = "GMCache";
pub const TEMP_DIR:   &str = "GMTemp";
pub const OUTPUT_DIR: &str = "Output";

pub const BUILD_META_FILE:     &str = "build.bff";
pub const MACROS_FILE:         &str = "macros.json";
pub const TARGET_OPTIONS_FILE: &str = "targetoptions.json";
pub const STEAM_OPTIONS_FILE:  &str = "steam_options.yy";
pub const PREFERENCES_FILE:    &str = "preferences.json";

pub const DEFAULT_DEBUGGER_PORT: u16 = 6509;
pub const HELP_PORT:   &str = "51290";
pub const TARGET_MASK: &str = "64";

/// build.bff. Field names and the "True"/"False" strings are the compiler's.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMeta {
    pub application_path: String,
    pub asset_compiler:   String,
    #[serde(rename = "compile_output_file_name")]
    pub compile_output_file_name: String,
    pub config:           String,
    pub debug:            String,
    pub debugger_port:    String,
    pub help_port:        String,
    pub macros:           String,
    pub output_folder:    String,
    pub preferences:      String,
    pub project_dir:      String,
    pub project_name:     String,
    pub project_path:     String,
    pub runtime_location: String,
    pub steam_options:    String,
    pub target_file:      String,
    pub target_mask:      String,
    pub target_options:   String,
    pub temp_folder:      String,
    pub use_shaders:      String,
    pub user_dir:         String,
    pub verbose:          String,
}

/// targetoptions.json
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetOptions {
    /// "YYC" or "VM"
    pub runtime: String,
    #[serde(flatten)]
    pub device:  DeviceRecord,
}

/// steam_options.yy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteamOptions {
    pub steamsdk_path: String,
}

pub fn flag(b: bool) -> String {
    if b { "True".into() } else { "False".into() }
}

/// Create the three work dirs and write the four records. Idempotent.
pub fn write_all(
    scratch: &Path,
    meta: &BuildMeta,
    macros: &MacroTable,
    target: &TargetOptions,
    steam: &SteamOptions,
) -> Result<()> {
    for dir in [CACHE_DIR, TEMP_DIR, OUTPUT_DIR] {
        std::fs::create_dir_all(scratch.join(dir))?;
    }

    std::fs::write(scratch.join(BUILD_META_FILE), serde_json::to_string(meta)?)?;
    std::fs::write(scratch.join(MACROS_FILE), serde_json::to_string(macros)?)?;
    std::fs::write(scratch.join(TARGET_OPTIONS_FILE), serde_json::to_string(target)?)?;
    std::fs::write(scratch.join(STEAM_OPTIONS_FILE), serde_json::to_string(steam)?)?;

    info!("build config written to {}", scratch.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn target_options_are_flat() {
        let t = TargetOptions {
            runtime: "VM".into(),
            device: DeviceRecord { product_type: "iPhone".into(), device_ip: "1.2.3.4".into(), ..Default::default() },
        };
        let v: Value = serde_json::to_value(&t).unwrap();
        assert_eq!(v["runtime"], "VM");
        assert_eq!(v["productType"], "iPhone");
        assert_eq!(v["deviceIP"], "1.2.3.4");
        assert_eq!(v["type"], "");
        assert_eq!(v.as_object().unwrap().len(), 14);
    }

    #[test]
    fn build_meta_field_names() {
        let meta = BuildMeta {
            application_path: "a".into(), asset_compiler: String::new(),
            compile_output_file_name: "o.win".into(), config: "default".into(),
            debug: flag(false), debugger_port: "6509".into(), help_port: HELP_PORT.into(),
            macros: "m".into(), output_folder: "out".into(), preferences: "p".into(),
            project_dir: "d".into(), project_name: "n".into(), project_path: "pp".into(),
            runtime_location: "r".into(), steam_options: "s".into(), target_file: String::new(),
            target_mask: TARGET_MASK.into(), target_options: "t".into(), temp_folder: "tmp".into(),
            use_shaders: flag(true), user_dir: "u".into(), verbose: flag(false),
        };
        let v: Value = serde_json::to_value(&meta).unwrap();
        for key in ["applicationPath", "compile_output_file_name", "debuggerPort", "helpPort",
                    "outputFolder", "runtimeLocation", "targetMask", "useShaders", "userDir"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
        assert_eq!(v["debug"], "False");
        assert_eq!(v["useShaders"], "True");
    }
}
