// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: build :: macros  -  macros.json
//
//  The compiler resolves `${name}` references itself. All this side owes it
//  is a table in which every referenced name exists.
// ─────────────────────────────────────────────────────────────────────────────

use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;

pub type MacroTable = BTreeMap<String, String>;

/// Values that vary per build; everything else in the table is fixed.
#[derive(Debug, Clone)]
pub struct MacroInputs<'a> {
    pub project_name:     &'a str,
    pub project_dir:      &'a str,
    pub user_name:        &'a str,
    pub scratch_dir:      &'a str,
    pub runtime_location: &'a str,
    pub early_access:     bool,
}

pub fn macro_table(inp: &MacroInputs<'_>) -> MacroTable {
    let (gms_name, exe_path) = if inp.early_access {
        ("GameMakerStudio2-EA", r"${ProgramFiles}\GameMaker Studio 2-EA")
    } else {
        ("GameMakerStudio2", r"${ProgramFiles}\GameMaker Studio 2")
    };

    let entries: &[(&str, &str)] = &[
        // per-build inputs
        ("project_name",     inp.project_name),
        ("project_dir",      inp.project_dir),
        ("UserProfileName",  inp.user_name),
        ("custom.tempdir",   inp.scratch_dir),
        ("runtimeLocation",  inp.runtime_location),
        ("GMS_name",         gms_name),
        ("exe_path",         exe_path),

        // scratch area
        ("custom.gm_cache",  r"${custom.tempdir}\GMCache"),
        ("custom.gm_temp",   r"${custom.tempdir}\GMTemp"),
        ("custom.output",    r"${custom.tempdir}\Output"),
        ("project_cache_directory_name",   "GMCache"),
        ("asset_compiler_cache_directory", "${custom.tempdir}"),
        ("temp_directory",   "${custom.gm_temp}"),

        // project
        ("project_full_filename", r"${project_dir}\${project_name}.yyp"),
        ("options_dir",           r"${project_dir}\options"),

        // base project shipped with the runtime
        ("project_dir_inherited_BaseProject",  r"${runtimeLocation}\BaseProject"),
        ("project_full_inherited_BaseProject", r"${runtimeLocation}\BaseProject\BaseProject.yyp"),
        ("base_project",                       r"${runtimeLocation}\BaseProject\BaseProject.yyp"),
        ("base_options_dir",                   r"${runtimeLocation}\BaseProject\options"),

        // IDE data dirs
        ("local_directory",        r"${ApplicationData}\${program_dir_name}"),
        ("local_cache_directory",  r"${local_directory}\Cache"),
        ("system_directory",       r"${CommonApplicationData}\${program_dir_name}"),
        ("system_cache_directory", r"${system_directory}\Cache"),
        ("runtimeBaseLocation",    r"${system_cache_directory}\runtimes"),

        // runtime tools
        ("igor_path",              r"${runtimeLocation}\bin\Igor.exe"),
        ("asset_compiler_path",    r"${runtimeLocation}\bin\GMAssetCompiler.exe"),
        ("lib_compatibility_path", r"${runtimeLocation}\lib\compatibility.zip"),
        ("runner_path",            r"${runtimeLocation}\windows\Runner.exe"),
        ("webserver_path",         r"${runtimeLocation}\bin\GMWebServer.exe"),
        ("html5_runner_path",      r"${runtimeLocation}\html5\scripts.html5.zip"),
        ("adb_exe_path",           r"platform-tools\adb.exe"),
        ("java_exe_path",          r"bin\java.exe"),
        ("keytool_exe_path",       r"bin\keytool.exe"),
        ("openssl_exe_path",       r"bin\openssl.exe"),
        ("licenses_path",          r"${exe_path}\Licenses"),

        // branding
        ("program_dir_name",    "${GMS_name}"),
        ("program_name",        "${GMS_name}"),
        ("program_name_pretty", "${GMS_name}"),
        ("default_font",        "Open Sans"),
        ("default_style",       "Regular"),
        ("default_font_size",   "9"),

        // Windows shell folders as seen inside the prefix
        ("ApplicationData",       r"${UserProfile}\AppData\Roaming"),
        ("CommonApplicationData", r"C:\ProgramData"),
        ("ProgramFiles",          r"C:\Program Files"),
        ("ProgramFilesX86",       r"C:\Program Files (x86)"),
        ("CommonProgramFiles",    r"C:\Program Files\Common Files"),
        ("CommonProgramFilesX86", r"C:\Program Files (x86)\Common Files"),
        ("UserProfile",           r"C:\Users\${UserProfileName}"),
        ("TempPath",              r"${UserProfile}\AppData\Local"),
    ];

    let table: MacroTable = entries.iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();

    let missing = dangling_references(&table);
    if !missing.is_empty() {
        warn!("macros.json references undefined names: {}", missing.join(", "));
    }
    table
}

fn reference_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"))
}

/// Names referenced by `value` through `${name}`.
pub fn references(value: &str) -> Vec<&str> {
    reference_pattern()
        .captures_iter(value)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Referenced names with no entry in the table, sorted and deduplicated.
pub fn dangling_references(table: &MacroTable) -> Vec<String> {
    let mut missing: Vec<String> = table.values()
        .flat_map(|v| references(v))
        .filter(|name| !table.contains_key(*name))
        .map(str::to_owned)
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(early_access: bool) -> MacroInputs<'static> {
        MacroInputs {
            project_name:     "game",
            project_dir:      "/home/dev/game",
            user_name:        "dev",
            scratch_dir:      "/tmp/gamemaker-rubber/abc",
            runtime_location: r"C:\runtimes\A",
            early_access,
        }
    }

    #[test]
    fn every_reference_resolves() {
        for ea in [false, true] {
            let table = macro_table(&inputs(ea));
            assert!(dangling_references(&table).is_empty(), "{:?}", dangling_references(&table));
        }
    }

    #[test]
    fn references_are_left_unexpanded() {
        let table = macro_table(&inputs(false));
        assert_eq!(table["igor_path"], r"${runtimeLocation}\bin\Igor.exe");
        assert_eq!(table["custom.tempdir"], "/tmp/gamemaker-rubber/abc");
    }

    #[test]
    fn early_access_branding() {
        assert_eq!(macro_table(&inputs(true))["GMS_name"], "GameMakerStudio2-EA");
        assert_eq!(macro_table(&inputs(false))["GMS_name"], "GameMakerStudio2");
        assert!(macro_table(&inputs(true))["exe_path"].ends_with("2-EA"));
    }

    #[test]
    fn dangling_reference_is_reported() {
        let mut table = MacroTable::new();
        table.insert("a".into(), "${b}\\${c}".into());
        table.insert("b".into(), "x".into());
        assert_eq!(dangling_references(&table), vec!["c".to_string()]);
        assert_eq!(references("${a}${b}"), vec!["a", "b"]);
    }

    #[test]
    fn odd_user_values_still_produce_a_table() {
        let mut inp = inputs(false);
        inp.project_dir = "/home/dev/${weird}";
        let table = macro_table(&inp);
        assert_eq!(dangling_references(&table), vec!["weird".to_string()]);
        assert_eq!(table["project_dir"], "/home/dev/${weird}");
    }
}
