// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: build  -  build request → build plan
//
//  Gates, in order, each fatal:
//
//    1. platform supported          5. project identity
//    2. package-only → zip only     6. runtime
//    3. installer → Windows only    7. target device (remote platforms)
//    4. $HOME / $USER present       8. licence entitlement
//
//  Nothing touches disk until `BuildPlan::materialize`, so a rejected
//  request leaves no scratch dir behind. Two builds of the same project
//  share one scratch dir and must not overlap.
// ─────────────────────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod launch;
pub mod macros;

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::{BuildEnvironment, InstallLayout};
use crate::device::{self, DeviceRecord, DEVICES_FILE};
use crate::error::{Result, RubberError};
use crate::license;
use crate::platform::Platform;
use crate::project::{self, ProjectIdentity};
use crate::runtime;

use artifacts::{BuildMeta, SteamOptions, TargetOptions};
use launch::Invocation;
use macros::{MacroInputs, MacroTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildKind {
    /// Compile and run
    Test,
    /// Package archive
    Zip,
    /// Windows installer
    Installer,
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildKind::Test      => "test",
            BuildKind::Zip       => "zip",
            BuildKind::Installer => "installer",
        })
    }
}

/// What the compiler is asked to do with the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    Run,
    Package,
    PackageZip,
    PackageNsis,
    Clean,
}

impl ExportAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportAction::Run         => "Run",
            ExportAction::Package     => "Package",
            ExportAction::PackageZip  => "PackageZip",
            ExportAction::PackageNsis => "PackageNsis",
            ExportAction::Clean       => "Clean",
        }
    }

    fn for_request(kind: BuildKind, package_key: &str, clean: bool) -> Self {
        if clean {
            return ExportAction::Clean;
        }
        match kind {
            BuildKind::Test => ExportAction::Run,
            BuildKind::Zip if package_key == "PackageZip" => ExportAction::PackageZip,
            BuildKind::Zip => ExportAction::Package,
            BuildKind::Installer => ExportAction::PackageNsis,
        }
    }
}

impl fmt::Display for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build, as asked for by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    /// The `.yyp` descriptor.
    pub project_path:     PathBuf,
    pub platform:         Platform,
    pub kind:             BuildKind,
    /// Where the package goes; empty for test runs.
    pub output_path:      String,
    /// YoYo Compiler instead of the VM.
    pub yyc:              bool,
    /// Enables the debugger on this port.
    pub debug_port:       Option<u16>,
    pub verbose:          bool,
    /// Use the early-access IDE and runtimes.
    pub early_access:     bool,
    /// IDE configuration name ("default" when unset).
    pub config:           Option<String>,
    /// Runtime name from runtime.json; the active one when unset.
    pub runtime:          Option<String>,
    /// Runtime directory, bypassing runtime.json.
    pub runtime_location: Option<String>,
    pub install_dir:      Option<PathBuf>,
    pub data_dir:         Option<PathBuf>,
    pub device_config:    Option<PathBuf>,
    pub target_device:    Option<String>,
    /// Ask the compiler to clean the remote client's cache instead of building.
    pub clean_remote:     bool,
}

impl BuildRequest {
    pub fn new(project_path: impl Into<PathBuf>, platform: Platform, kind: BuildKind) -> Self {
        BuildRequest {
            project_path: project_path.into(),
            platform,
            kind,
            output_path:      String::new(),
            yyc:              false,
            debug_port:       None,
            verbose:          false,
            early_access:     false,
            config:           None,
            runtime:          None,
            runtime_location: None,
            install_dir:      None,
            data_dir:         None,
            device_config:    None,
            target_device:    None,
            clean_remote:     false,
        }
    }
}

/// Everything resolved for one build, ready to be written and launched.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    pub identity:         ProjectIdentity,
    pub scratch_dir:      PathBuf,
    pub runtime_location: String,
    pub component:        &'static str,
    pub action:           ExportAction,
    /// Name of the remote target device, if the platform needs one.
    pub device:           Option<String>,
    pub macros:           MacroTable,
    pub build_meta:       BuildMeta,
    pub target_options:   TargetOptions,
    pub steam_options:    SteamOptions,
    pub invocation:       Invocation,
}

impl BuildPlan {
    /// Create the scratch dirs and write the compiler's config files.
    pub fn materialize(&self) -> Result<()> {
        artifacts::write_all(
            &self.scratch_dir,
            &self.build_meta,
            &self.macros,
            &self.target_options,
            &self.steam_options,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Assembler
// ─────────────────────────────────────────────────────────────────────────────

/// Validate `req` and resolve every input the compiler needs. Read-only.
pub fn assemble(req: &BuildRequest, env: &BuildEnvironment) -> Result<BuildPlan> {
    let platform = req.platform;
    let cap = platform.capability();

    // ── 1-3. capability ────────────────────────────────────────────────────
    if !cap.is_supported() {
        return Err(RubberError::UnsupportedPlatform(platform.to_string()));
    }
    if cap.package_only && req.kind != BuildKind::Zip {
        return Err(RubberError::CapabilityMismatch {
            platform: platform.to_string(),
            kind: req.kind.to_string(),
            reason: "only packages can be built; finish the build in the vendor toolchain",
        });
    }
    if req.kind == BuildKind::Installer && cap.component != "Windows" {
        return Err(RubberError::CapabilityMismatch {
            platform: platform.to_string(),
            kind: req.kind.to_string(),
            reason: "only Windows can build an installer",
        });
    }

    // ── 4. environment ─────────────────────────────────────────────────────
    if env.home_dir.is_none() {
        return Err(RubberError::MissingEnvironment("HOME"));
    }
    let user_name = env.user_name.as_deref().ok_or(RubberError::MissingEnvironment("USER"))?;

    let layout = InstallLayout::resolve(
        env,
        req.early_access,
        req.install_dir.as_deref(),
        req.data_dir.as_deref(),
    )?;

    // ── 5. project ─────────────────────────────────────────────────────────
    let project_file = absolute(&req.project_path)?;
    let identity = project::locate(&project_file)?;
    let project_dir = project_file.parent().unwrap_or_else(|| Path::new("/")).to_path_buf();
    let project_name = project::project_name(&project_file);

    // ── 6 + 7. runtime and device (independent reads) ─────────────────────
    let index = runtime::index_path(&layout.data_dir);
    let device_config = req.device_config.clone()
        .unwrap_or_else(|| layout.user_dir.join(DEVICES_FILE));

    let (runtime_location, device) = rayon::join(
        || runtime::resolve(&index, req.runtime_location.as_deref(), req.runtime.as_deref()),
        || device::resolve(Some(&device_config), platform, req.target_device.as_deref()),
    );
    let runtime_location = runtime_location?;
    let device = device?;

    // ── 8. licence ─────────────────────────────────────────────────────────
    let licence = license::licence_path(&layout.user_dir);
    if !license::check(&licence, cap.build_module)? {
        return Err(RubberError::EntitlementDenied {
            platform: platform.to_string(),
            module: cap.build_module.to_owned(),
        });
    }

    // ── derive ─────────────────────────────────────────────────────────────
    let scratch_dir = env.scratch_dir(&identity.guid);
    let action = ExportAction::for_request(req.kind, cap.package_key, req.clean_remote);
    let s = |p: &Path| p.display().to_string();

    let macros = macros::macro_table(&MacroInputs {
        project_name:     &project_name,
        project_dir:      &s(&project_dir),
        user_name,
        scratch_dir:      &s(&scratch_dir),
        runtime_location: &runtime_location,
        early_access:     req.early_access,
    });

    let output = scratch_dir.join(artifacts::OUTPUT_DIR);
    let build_meta = BuildMeta {
        application_path: s(&layout.application_path(req.early_access)),
        asset_compiler:   String::new(),
        compile_output_file_name: s(&output.join(format!("{project_name}.win"))),
        config:           req.config.clone().unwrap_or_else(|| "default".into()),
        debug:            artifacts::flag(req.debug_port.is_some()),
        debugger_port:    req.debug_port.unwrap_or(artifacts::DEFAULT_DEBUGGER_PORT).to_string(),
        help_port:        artifacts::HELP_PORT.into(),
        macros:           s(&scratch_dir.join(artifacts::MACROS_FILE)),
        output_folder:    s(&output),
        preferences:      s(&scratch_dir.join(artifacts::PREFERENCES_FILE)),
        project_dir:      s(&project_dir),
        project_name:     project_name.clone(),
        project_path:     s(&project_file),
        runtime_location: runtime_location.clone(),
        steam_options:    s(&scratch_dir.join(artifacts::STEAM_OPTIONS_FILE)),
        target_file:      req.output_path.clone(),
        target_mask:      artifacts::TARGET_MASK.into(),
        target_options:   s(&scratch_dir.join(artifacts::TARGET_OPTIONS_FILE)),
        temp_folder:      s(&scratch_dir.join(artifacts::TEMP_DIR)),
        use_shaders:      artifacts::flag(true),
        user_dir:         s(&layout.user_dir),
        verbose:          artifacts::flag(req.verbose),
    };

    let target_options = TargetOptions {
        runtime: if req.yyc { "YYC" } else { "VM" }.into(),
        device:  device.as_ref().map(|d| d.effective()).unwrap_or_else(DeviceRecord::default),
    };

    let steam_options = SteamOptions { steamsdk_path: env.steam_sdk_path.clone() };

    let compiler_args = launch::compiler_args(
        &scratch_dir.join(artifacts::BUILD_META_FILE),
        cap.component,
        action.as_str(),
    );
    let invocation = Invocation::through_wine(&env.wine_prefix, &runtime_location, &compiler_args, req.verbose);

    debug!("{platform}/{}: {} → {}", req.kind, action, scratch_dir.display());

    Ok(BuildPlan {
        identity,
        scratch_dir,
        runtime_location,
        component: cap.component,
        action,
        device: device.map(|d| d.name),
        macros,
        build_meta,
        target_options,
        steam_options,
        invocation,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> BuildEnvironment {
        BuildEnvironment {
            home_dir:       Some(PathBuf::from("/home/dev")),
            user_name:      Some("dev".into()),
            temp_root:      PathBuf::from("/nonexistent-tmp"),
            wine_prefix:    PathBuf::from("/nonexistent-wine"),
            user_dir:       Some(PathBuf::from("/nonexistent-user")),
            steam_sdk_path: String::new(),
        }
    }

    #[test]
    fn unsupported_platforms_fail_first() {
        for p in [Platform::Ps4, Platform::XboxOne, Platform::Html5, Platform::Uwp] {
            let req = BuildRequest::new("/nowhere/game.yyp", p, BuildKind::Test);
            assert!(matches!(assemble(&req, &env()), Err(RubberError::UnsupportedPlatform(id)) if id == p.id()));
        }
    }

    #[test]
    fn ios_only_packages() {
        let req = BuildRequest::new("/nowhere/game.yyp", Platform::Ios, BuildKind::Test);
        assert!(matches!(assemble(&req, &env()), Err(RubberError::CapabilityMismatch { .. })));

        // a zip build gets past the capability gates and fails later on
        let req = BuildRequest::new("/nowhere/game.yyp", Platform::Ios, BuildKind::Zip);
        assert!(!matches!(assemble(&req, &env()), Err(RubberError::CapabilityMismatch { .. })));
    }

    #[test]
    fn installer_is_windows_only() {
        for p in [Platform::Mac, Platform::Linux, Platform::Android, Platform::Switch] {
            let req = BuildRequest::new("/nowhere/game.yyp", p, BuildKind::Installer);
            assert!(matches!(assemble(&req, &env()), Err(RubberError::CapabilityMismatch { .. })), "{p}");
        }
    }

    #[test]
    fn missing_environment() {
        let req = BuildRequest::new("/nowhere/game.yyp", Platform::Windows, BuildKind::Test);
        let mut e = env();
        e.user_name = None;
        assert!(matches!(assemble(&req, &e), Err(RubberError::MissingEnvironment("USER"))));
        e.home_dir = None;
        assert!(matches!(assemble(&req, &e), Err(RubberError::MissingEnvironment("HOME"))));
    }

    #[test]
    fn export_actions() {
        use ExportAction::*;
        assert_eq!(ExportAction::for_request(BuildKind::Test, "PackageZip", false), Run);
        assert_eq!(ExportAction::for_request(BuildKind::Zip, "PackageZip", false), PackageZip);
        assert_eq!(ExportAction::for_request(BuildKind::Zip, "Package", false), Package);
        assert_eq!(ExportAction::for_request(BuildKind::Installer, "PackageZip", false), PackageNsis);
        assert_eq!(ExportAction::for_request(BuildKind::Zip, "Package", true), Clean);
    }
}
