// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: error
// ─────────────────────────────────────────────────────────────────────────────

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RubberError {
    #[error("Cannot compile to unsupported platform '{0}'")]
    UnsupportedPlatform(String),

    #[error("Platform '{platform}' cannot produce a {kind} build: {reason}")]
    CapabilityMismatch { platform: String, kind: String, reason: &'static str },

    #[error("The ${0} variable is missing in the environment")]
    MissingEnvironment(&'static str),

    #[error("Missing options_main.inherited.yy under {0}\n  Hint: this happens with a partial project, or a different parent project structure")]
    ProjectStructure(PathBuf),

    #[error("Cannot identify project {0}: no option_gameguid in options_main.inherited.yy and no id in the project file")]
    ProjectIdentity(PathBuf),

    #[error("GameMaker installation not found: {0}\n  Hint: pass --gms-dir / --gms-data-dir, or set RUBBER_WINE_PREFIX")]
    InstallationNotFound(PathBuf),

    #[error("Invalid runtime index {path}: {reason}\n  Hint: reinstall GameMaker")]
    RuntimeIndexCorrupt { path: PathBuf, reason: String },

    #[error("GameMaker has no active runtime in {0}\n  Hint: start GameMaker and compile a project once")]
    NoActiveRuntime(PathBuf),

    #[error("Runtime '{name}' not found in {path}\n  Hint: check the name, and make sure the runtime is downloaded")]
    RuntimeNotFound { name: String, path: PathBuf },

    #[error("Platform '{platform}' requires a target device config file ({path})\n  Hint: pass --device-config-dir")]
    MissingDeviceConfig { platform: String, path: String },

    #[error("Invalid target device config file {path}: {reason}")]
    DeviceConfigUnreadable { path: PathBuf, reason: String },

    #[error("Target device '{device}' not found in the '{platform}' section of {path}")]
    UnknownDevice { platform: String, device: String, path: PathBuf },

    #[error("Device '{device}' needs host Mac '{hostmac}', which is missing from the 'mac' section of {path}")]
    MissingHostMac { device: String, hostmac: String, path: PathBuf },

    #[error("Cannot read the component list from licence {0}")]
    LicenseUnreadable(PathBuf),

    #[error("You don't have permission to build for '{platform}' ({module} is not licensed)\n  Hint: you may be logged in as someone else, or the module was not purchased")]
    EntitlementDenied { platform: String, module: String },

    #[error("Compiler exited with {0}")]
    CompilerFailed(std::process::ExitStatus),

    #[error("Invalid settings file {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RubberError>;
