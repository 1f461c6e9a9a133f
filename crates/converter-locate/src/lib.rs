//! # converter-locate
//!
//! Find the pieces an external PDF converter needs before it can be run:
//! the runtime program (usually `node`) and the entry-point script it
//! executes. Optionally installs the script's Node dependencies the first
//! time it is used.
//!
//! ## How it works
//!
//! Resolution happens once, when the caller builds its configuration:
//!
//! 1. [`resolve_runtime`] turns `"node"` into an absolute path via `PATH`,
//!    or checks that an explicit path exists.
//! 2. [`locate_entry_point`] walks a fixed search order (see below) and
//!    returns the first script that exists.
//! 3. [`ensure_dependencies`] runs `npm install` next to the script when it
//!    ships a `package.json` but no `node_modules` yet.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use converter_locate::{ensure_dependencies, locate_entry_point, resolve_runtime};
//!
//! let node = resolve_runtime("node").expect("node not installed");
//! let script = locate_entry_point(None).expect("converter script missing");
//! ensure_dependencies(&script, "npm").expect("npm install failed");
//! println!("{} {}", node.display(), script.display());
//! ```
//!
//! ## Search order for the entry point
//!
//! | # | Location |
//! |---|----------|
//! | 1 | explicit path passed by the caller |
//! | 2 | `PDF2MD_CONVERTER_SCRIPT` environment variable |
//! | 3 | `./js/pdf-to-md.js` |
//! | 4 | `<exe dir>/js/pdf-to-md.js` |
//! | 5 | `<exe dir>/../share/pdf2md/js/pdf-to-md.js` |
//! | 6 | `<user data dir>/pdf2md/js/pdf-to-md.js` |

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Runtime used when the caller does not name one.
pub const DEFAULT_RUNTIME: &str = "node";

/// Package manager used by [`ensure_dependencies`] when the caller does not name one.
pub const DEFAULT_INSTALLER: &str = "npm";

/// File name of the converter entry point.
pub const ENTRY_POINT_FILE: &str = "pdf-to-md.js";

/// Environment variable that overrides the entry-point search.
pub const ENTRY_POINT_ENV: &str = "PDF2MD_CONVERTER_SCRIPT";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by converter-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The runtime program was neither an existing path nor found on `PATH`.
    #[error("Runtime '{program}' not found: {reason}")]
    RuntimeNotFound { program: String, reason: String },

    /// An explicitly given entry point does not exist.
    #[error("Converter script '{path}' does not exist")]
    EntryPointMissing { path: PathBuf },

    /// No candidate location held the entry point.
    #[error("Converter script 'pdf-to-md.js' not found; searched: {}", display_paths(.searched))]
    EntryPointNotFound { searched: Vec<PathBuf> },

    /// A relative path could not be made absolute (the working directory is
    /// unreadable).
    #[error("Cannot make '{path}' absolute: {source}")]
    Absolutize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dependency installer could not be started.
    #[error("Failed to launch '{program}': {source}")]
    InstallerLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The dependency installer ran but reported failure.
    #[error("'{program} install' failed in '{dir}' (exit code {code:?}): {stderr}")]
    InstallFailed {
        program: String,
        dir: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Data directory resolution ────────────────────────────────────────────────

/// Returns the per-user directory an installed converter lives under.
///
/// Default locations:
/// - **macOS**: `~/Library/Application Support/pdf2md/js/`
/// - **Linux**: `~/.local/share/pdf2md/js/`
/// - **Windows**: `%APPDATA%\pdf2md\js\`
pub fn converter_data_dir() -> PathBuf {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdf2md").join("js")
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the runtime program to an absolute, existing path.
///
/// Values containing a path separator are taken literally and must exist.
/// Bare names such as `"node"` are looked up on `PATH`.
pub fn resolve_runtime(program: &str) -> Result<PathBuf, LocateError> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        if candidate.exists() {
            return absolutize(candidate);
        }
        return Err(LocateError::RuntimeNotFound {
            program: program.to_string(),
            reason: "path does not exist".to_string(),
        });
    }

    which::which(program).map_err(|e| LocateError::RuntimeNotFound {
        program: program.to_string(),
        reason: e.to_string(),
    })
}

/// Find the converter entry point, returned as an absolute path.
///
/// An explicit path short-circuits the search and must exist. Otherwise the
/// candidates listed in the crate docs are tried in order.
pub fn locate_entry_point(explicit: Option<&Path>) -> Result<PathBuf, LocateError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return absolutize(path);
        }
        return Err(LocateError::EntryPointMissing {
            path: path.to_path_buf(),
        });
    }

    let searched = candidate_entry_points();
    for candidate in &searched {
        if candidate.is_file() {
            return absolutize(candidate);
        }
    }

    Err(LocateError::EntryPointNotFound { searched })
}

/// Anchor a relative path to the current working directory, so later
/// `chdir` calls cannot change what it refers to.
fn absolutize(path: &Path) -> Result<PathBuf, LocateError> {
    std::path::absolute(path).map_err(|source| LocateError::Absolutize {
        path: path.to_path_buf(),
        source,
    })
}

/// The ordered list of places [`locate_entry_point`] looks when no explicit
/// path is given.
pub fn candidate_entry_points() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(env_path) = std::env::var(ENTRY_POINT_ENV) {
        if !env_path.is_empty() {
            candidates.push(PathBuf::from(env_path));
        }
    }

    candidates.push(PathBuf::from("js").join(ENTRY_POINT_FILE));

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join("js").join(ENTRY_POINT_FILE));
        candidates.push(
            exe_dir
                .join("..")
                .join("share")
                .join("pdf2md")
                .join("js")
                .join(ENTRY_POINT_FILE),
        );
    }

    candidates.push(converter_data_dir().join(ENTRY_POINT_FILE));
    candidates
}

/// Install the converter's Node dependencies if they are missing.
///
/// Runs `<installer> install` in the entry point's directory when that
/// directory contains a `package.json` and no `node_modules`. Returns
/// `true` when an install was performed.
///
/// This blocks until the installer exits; call it from a blocking context.
pub fn ensure_dependencies(entry_point: &Path, installer: &str) -> Result<bool, LocateError> {
    let dir = match entry_point.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !dir.join("package.json").is_file() || dir.join("node_modules").exists() {
        return Ok(false);
    }

    let program = resolve_runtime(installer)?;
    let output = Command::new(&program)
        .arg("install")
        .current_dir(&dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| LocateError::InstallerLaunch {
            program: installer.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(LocateError::InstallFailed {
            program: installer.to_string(),
            dir,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(true)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_entry_point_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("convert.js");
        std::fs::write(&script, "// stub").unwrap();

        let found = locate_entry_point(Some(&script)).unwrap();
        assert_eq!(found, script);
    }

    #[test]
    fn relative_entry_point_is_made_absolute() {
        // Tests run from the crate root, where src/lib.rs exists.
        let found = locate_entry_point(Some(Path::new("src/lib.rs"))).unwrap();
        assert!(found.is_absolute(), "got: {}", found.display());
        assert!(found.ends_with("src/lib.rs"));
        assert!(found.is_file());
    }

    #[test]
    fn relative_runtime_path_is_made_absolute() {
        let found = resolve_runtime("./src/lib.rs").unwrap();
        assert!(found.is_absolute(), "got: {}", found.display());
        assert!(found.is_file());
    }

    #[test]
    fn explicit_entry_point_missing_is_an_error() {
        let err = locate_entry_point(Some(Path::new("/no/such/convert.js"))).unwrap_err();
        assert!(matches!(err, LocateError::EntryPointMissing { .. }));
        assert!(err.to_string().contains("/no/such/convert.js"));
    }

    #[test]
    fn candidates_end_with_data_dir() {
        let candidates = candidate_entry_points();
        assert!(candidates.len() >= 2);
        assert_eq!(
            candidates.last().unwrap(),
            &converter_data_dir().join(ENTRY_POINT_FILE)
        );
        assert!(candidates.contains(&PathBuf::from("js").join(ENTRY_POINT_FILE)));
    }

    #[test]
    fn not_found_lists_searched_paths() {
        let err = LocateError::EntryPointNotFound {
            searched: vec![PathBuf::from("/a/pdf-to-md.js"), PathBuf::from("/b/pdf-to-md.js")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/pdf-to-md.js, /b/pdf-to-md.js"), "got: {msg}");
    }

    #[test]
    fn data_dir_mentions_pdf2md() {
        let d = converter_data_dir();
        assert!(d.to_str().unwrap().contains("pdf2md"));
        assert!(d.ends_with("js"));
    }

    #[test]
    fn runtime_path_must_exist() {
        let err = resolve_runtime("/definitely/not/node").unwrap_err();
        assert!(matches!(err, LocateError::RuntimeNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn bare_runtime_found_on_path() {
        let sh = resolve_runtime("sh").expect("sh should be on PATH");
        assert!(sh.is_absolute());
    }

    #[test]
    fn dependencies_skipped_without_package_json() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join(ENTRY_POINT_FILE);
        std::fs::write(&script, "// stub").unwrap();

        // The installer name is never resolved when there is nothing to install.
        let installed = ensure_dependencies(&script, "no-such-installer").unwrap();
        assert!(!installed);
    }

    #[test]
    fn dependencies_skipped_when_node_modules_present() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join(ENTRY_POINT_FILE);
        std::fs::write(&script, "// stub").unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();

        let installed = ensure_dependencies(&script, "no-such-installer").unwrap();
        assert!(!installed);
    }

    #[test]
    fn missing_installer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join(ENTRY_POINT_FILE);
        std::fs::write(&script, "// stub").unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();

        let err = ensure_dependencies(&script, "definitely-not-an-installer-xyz").unwrap_err();
        assert!(matches!(err, LocateError::RuntimeNotFound { .. }));
    }
}
