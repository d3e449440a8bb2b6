// ─────────────────────────────────────────────────────────────────────────────
//  rubber :: build :: launch  -  compiler invocation through wine
//
//  Equivalent shell command (no shell is involved):
//
//    [WINEDEBUG=-all] WINEPREFIX=<prefix> WINEARCH=win64 wine64
//        <runtime>/bin/Igor.exe -options=<scratch>/build.bff -- <Component> <Action>
// ─────────────────────────────────────────────────────────────────────────────

use std::fmt;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::{debug, info};

use crate::error::{Result, RubberError};

/// Path of the compiler inside a runtime, as wine wants it (forward slashes).
pub fn compiler_path(runtime_location: &str) -> String {
    format!(r"{runtime_location}\bin\Igor.exe").replace('\\', "/")
}

/// Arguments handed to the compiler itself.
pub fn compiler_args(build_meta: &Path, component: &str, action: &str) -> Vec<String> {
    vec![
        format!("-options={}", build_meta.display()),
        "--".into(),
        component.to_owned(),
        action.to_owned(),
    ]
}

/// A fully built process launch. Arguments and environment are passed to
/// the process as-is, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args:    Vec<String>,
    pub env:     Vec<(String, String)>,
}

impl Invocation {
    /// Run the compiler under wine64 in `wine_prefix`.
    pub fn through_wine(
        wine_prefix: &Path,
        runtime_location: &str,
        compiler_args: &[String],
        verbose: bool,
    ) -> Self {
        let mut env = Vec::new();
        if !verbose {
            env.push(("WINEDEBUG".into(), "-all".into()));
        }
        env.push(("WINEPREFIX".into(), wine_prefix.display().to_string()));
        env.push(("WINEARCH".into(), "win64".into()));

        let mut args = vec![compiler_path(runtime_location)];
        args.extend(compiler_args.iter().cloned());

        Invocation { program: "wine64".into(), args, env }
    }
}

/// Start `inv` with inherited stdio. Does not wait.
pub fn launch(inv: &Invocation) -> Result<Child> {
    debug!("launching {inv}");
    let child = Command::new(&inv.program)
        .args(&inv.args)
        .envs(inv.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;
    info!("compiler started (pid {})", child.id());
    Ok(child)
}

/// Single-quote `word` for display when it would not survive a shell as-is.
fn quoted(word: &str) -> String {
    let plain = !word.is_empty()
        && word.chars().all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_owned()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.env {
            write!(f, "{k}={} ", quoted(v))?;
        }
        write!(f, "{}", quoted(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quoted(arg))?;
        }
        Ok(())
    }
}

/// Block until the compiler exits; a non-zero status becomes an error.
pub fn wait_for(mut child: Child) -> Result<()> {
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(RubberError::CompilerFailed(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compiler_path_uses_forward_slashes() {
        assert_eq!(compiler_path(r"C:\runtimes\A"), "C:/runtimes/A/bin/Igor.exe");
    }

    #[test]
    fn wine_invocation_layout() {
        let args = compiler_args(Path::new("/tmp/x/build.bff"), "Windows", "Run");
        let inv = Invocation::through_wine(Path::new("/home/dev/.wine"), r"C:\rt", &args, false);
        assert_eq!(inv.program, "wine64");
        assert_eq!(inv.args, vec!["C:/rt/bin/Igor.exe", "-options=/tmp/x/build.bff", "--", "Windows", "Run"]);
        assert_eq!(inv.env, vec![
            ("WINEDEBUG".to_string(), "-all".to_string()),
            ("WINEPREFIX".to_string(), "/home/dev/.wine".to_string()),
            ("WINEARCH".to_string(), "win64".to_string()),
        ]);
        assert_eq!(
            inv.to_string(),
            "WINEDEBUG=-all WINEPREFIX=/home/dev/.wine WINEARCH=win64 wine64 C:/rt/bin/Igor.exe -options=/tmp/x/build.bff -- Windows Run"
        );
    }

    #[test]
    fn verbose_keeps_wine_debug_output() {
        let inv = Invocation::through_wine(Path::new("/w"), "C:", &[], true);
        assert!(inv.env.iter().all(|(k, _)| k != "WINEDEBUG"));
    }

    #[test]
    fn spaced_paths_stay_one_argument() {
        let args = compiler_args(Path::new("/tmp/my tmp/build.bff"), "Linux", "Run");
        let inv = Invocation::through_wine(Path::new("/home/dev/wine prefix"), r"C:\rt", &args, false);
        assert_eq!(inv.args[1], "-options=/tmp/my tmp/build.bff");
        assert!(inv.env.contains(&("WINEPREFIX".to_string(), "/home/dev/wine prefix".to_string())));
        assert!(inv.to_string().contains("'-options=/tmp/my tmp/build.bff'"));
    }

    fn sh(script: &str, extra: &[&str], env: &[(&str, &str)]) -> Invocation {
        let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
        args.extend(extra.iter().map(|a| a.to_string()));
        Invocation {
            program: "sh".into(),
            args,
            env: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn arguments_and_env_reach_the_process_intact() {
        let inv = sh(
            r#"[ "$#" = 1 ] && [ "$1" = '-options=/my tmp/$(x);b.bff' ] && [ "$WINEPREFIX" = '/a b' ]"#,
            &["-options=/my tmp/$(x);b.bff"],
            &[("WINEPREFIX", "/a b")],
        );
        assert!(wait_for(launch(&inv).unwrap()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn wait_surfaces_exit_code() {
        assert!(wait_for(launch(&sh("exit 0", &[], &[])).unwrap()).is_ok());
        let bad = launch(&sh("exit 3", &[], &[])).unwrap();
        assert!(matches!(wait_for(bad), Err(RubberError::CompilerFailed(s)) if s.code() == Some(3)));
    }
}
