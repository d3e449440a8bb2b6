// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: config  -  settings file, environment context, install layout
//
//  Settings come from, highest priority first:
//
//  1. RUBBER_* environment variables
//  2. $RUBBER_CONFIG, or <config home>/rubber/config.toml
//  3. built-in defaults
//
//  The IDE itself lives inside a wine prefix; every Windows path below is
//  rooted at <wine_prefix>/drive_c.
// ─────────────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{Result, RubberError};
use crate::license::LICENCE_FILE;

/// Name used for the scratch area under the temp root.
pub const TOOL_NAME: &str = "gamemaker-rubber";

/// User-editable settings. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub wine_prefix:    Option<PathBuf>,
    pub temp_root:      Option<PathBuf>,
    pub user_dir:       Option<PathBuf>,
    pub steam_sdk_path: Option<String>,
}

impl Settings {
    /// Load the settings file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match settings_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(v) = std::env::var("RUBBER_WINE_PREFIX") { settings.wine_prefix = Some(v.into()); }
        if let Ok(v) = std::env::var("RUBBER_TEMP_ROOT")   { settings.temp_root   = Some(v.into()); }
        if let Ok(v) = std::env::var("RUBBER_USER_DIR")    { settings.user_dir    = Some(v.into()); }
        if let Ok(v) = std::env::var("RUBBER_STEAM_SDK")   { settings.steam_sdk_path = Some(v); }

        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&text).map_err(|e| RubberError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("settings loaded from {}", path.display());
        Ok(settings)
    }
}

fn settings_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("RUBBER_CONFIG") {
        return Some(PathBuf::from(explicit));
    }
    let base = std::env::var("XDG_CONFIG_HOME").ok().map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".config")))?;
    Some(base.join("rubber").join("config.toml"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

// ─────────────────────────────────────────────────────────────────────────────
//  Environment context
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the assembler would otherwise read from process state.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildEnvironment {
    pub home_dir:       Option<PathBuf>,
    pub user_name:      Option<String>,
    pub temp_root:      PathBuf,
    pub wine_prefix:    PathBuf,
    pub user_dir:       Option<PathBuf>,
    pub steam_sdk_path: String,
}

impl BuildEnvironment {
    pub fn from_process(settings: &Settings) -> Self {
        let home_dir = home_dir();
        let wine_prefix = settings.wine_prefix.clone()
            .or_else(|| home_dir.as_ref().map(|h| h.join(".wine")))
            .unwrap_or_else(|| PathBuf::from(".wine"));

        BuildEnvironment {
            home_dir,
            user_name:      std::env::var("USER").ok(),
            temp_root:      settings.temp_root.clone().unwrap_or_else(|| PathBuf::from("/tmp")),
            wine_prefix,
            user_dir:       settings.user_dir.clone(),
            steam_sdk_path: settings.steam_sdk_path.clone().unwrap_or_default(),
        }
    }

    pub fn c_drive(&self) -> PathBuf {
        self.wine_prefix.join("drive_c")
    }

    /// `<temp_root>/gamemaker-rubber/<guid>`
    pub fn scratch_dir(&self, guid: &str) -> PathBuf {
        self.temp_root.join(TOOL_NAME).join(guid)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Installation layout
// ─────────────────────────────────────────────────────────────────────────────

/// Where the IDE's program, program data and per-user data live.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallLayout {
    /// Program Files dir holding GameMakerStudio.exe
    pub install_dir: PathBuf,
    /// ProgramData dir holding runtime.json
    pub data_dir:    PathBuf,
    /// Per-user dir holding licence.plist and devices.json
    pub user_dir:    PathBuf,
}

impl InstallLayout {
    /// Resolve the layout, using explicit dirs where given.
    pub fn resolve(
        env: &BuildEnvironment,
        early_access: bool,
        install_dir: Option<&Path>,
        data_dir: Option<&Path>,
    ) -> Result<Self> {
        let suffix = if early_access { "-EA" } else { "" };
        let c = env.c_drive();

        let install_dir = match install_dir {
            Some(dir) if !dir.exists() => {
                return Err(RubberError::InstallationNotFound(dir.to_path_buf()))
            }
            Some(dir) => dir.to_path_buf(),
            None => c.join("Program Files").join(format!("GameMaker Studio 2{suffix}")),
        };

        let data_dir = data_dir.map(Path::to_path_buf)
            .unwrap_or_else(|| c.join("ProgramData").join(format!("GameMakerStudio2{suffix}")));

        let user_dir = match &env.user_dir {
            Some(dir) => dir.clone(),
            None => discover_user_dir(env, suffix)?,
        };

        debug!("install {} / data {} / user {}", install_dir.display(), data_dir.display(), user_dir.display());
        Ok(InstallLayout { install_dir, data_dir, user_dir })
    }

    pub fn application_path(&self, early_access: bool) -> PathBuf {
        let exe = if early_access { "GameMakerStudio-EA.exe" } else { "GameMakerStudio.exe" };
        self.install_dir.join(exe)
    }
}

/// The IDE keeps one folder per login under AppData/Roaming; pick the first
/// one (by name) that holds a licence.
fn discover_user_dir(env: &BuildEnvironment, suffix: &str) -> Result<PathBuf> {
    let user = env.user_name.as_deref().ok_or(RubberError::MissingEnvironment("USER"))?;
    let roaming = env.c_drive()
        .join("users").join(user)
        .join("AppData").join("Roaming")
        .join(format!("GameMakerStudio2{suffix}"));

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(&roaming)
        .map_err(|_| RubberError::InstallationNotFound(roaming.clone()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.join(LICENCE_FILE).is_file())
        .collect();
    candidates.sort();

    candidates.into_iter().next()
        .ok_or(RubberError::InstallationNotFound(roaming))
}
