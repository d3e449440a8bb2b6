// ─────────────────────────────────────────────────────────────────────────────
//  rubber  -  public library API
//
//  Resolves everything GameMaker's command-line compiler (Igor) needs for a
//  build, writes its config files into a per-project scratch dir and
//  launches it under wine.
// ─────────────────────────────────────────────────────────────────────────────

pub mod build;
pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod license;
pub mod platform;
pub mod project;
pub mod runtime;
pub mod scaffold;

pub use build::{assemble, BuildKind, BuildPlan, BuildRequest, ExportAction};
pub use config::{BuildEnvironment, Settings};
pub use error::{Result, RubberError};
pub use platform::{Platform, PlatformCapability};
pub use project::ProjectIdentity;

/// Assemble, write the config files and start the compiler.
///
/// The returned child is not awaited; see [`build::launch::wait_for`].
///
/// ```no_run
/// use rubber::{build_and_launch, BuildEnvironment, BuildKind, BuildRequest, Platform, Settings};
///
/// let env = BuildEnvironment::from_process(&Settings::load()?);
/// let req = BuildRequest::new("game/game.yyp", Platform::Windows, BuildKind::Test);
/// let (plan, child) = build_and_launch(&req, &env)?;
/// rubber::build::launch::wait_for(child)?;
/// println!("built in {}", plan.scratch_dir.display());
/// # Ok::<(), rubber::RubberError>(())
/// ```
pub fn build_and_launch(req: &BuildRequest, env: &BuildEnvironment) -> Result<(BuildPlan, std::process::Child)> {
    let plan = assemble(req, env)?;
    plan.materialize()?;
    let child = build::launch::launch(&plan.invocation)?;
    Ok((plan, child))
}
