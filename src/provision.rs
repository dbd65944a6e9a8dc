//! Provisioning of the opa binary.
//!
//! `ensure_opa` is an idempotent "make sure the evaluator exists" step: if
//! the binary is already at the cache path nothing is written, otherwise a
//! platform-matching prebuilt release is downloaded to a temp file, made
//! executable, and renamed into place. Every failure mode (unsupported
//! platform, network error, bad status, partial download) surfaces as
//! `EvaluatorUnavailable`, which aborts the whole run.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::RegoTestError;

/// Version-pinned release; the cache path is shared across runs.
const OPA_VERSION: &str = "v1.13.1";

/// Well-known cache location for the downloaded binary.
pub fn opa_cache_path() -> PathBuf {
    env::temp_dir().join("opa")
}

/// Download URL for the current platform, or None if there is no prebuilt
/// binary for it.
fn release_url() -> Option<String> {
    let artifact = match (env::consts::OS, env::consts::ARCH) {
        ("macos", "x86_64") => "opa_darwin_amd64_static",
        ("macos", "aarch64") => "opa_darwin_arm64_static",
        ("linux", "x86_64") => "opa_linux_amd64_static",
        ("linux", "aarch64") => "opa_linux_arm64_static",
        _ => return None,
    };
    Some(format!(
        "https://github.com/open-policy-agent/opa/releases/download/{}/{}",
        OPA_VERSION, artifact
    ))
}

/// Ensure the opa binary exists at `dest`, downloading it if absent.
/// Safe to call redundantly; the presence check precedes any write.
pub fn ensure_opa(dest: &Path) -> Result<(), RegoTestError> {
    if dest.exists() {
        return Ok(());
    }

    let url = release_url().ok_or_else(|| RegoTestError::EvaluatorUnavailable {
        reason: format!(
            "no prebuilt opa binary for {}-{}",
            env::consts::OS,
            env::consts::ARCH
        ),
        source: None,
    })?;

    println!("💡 downloading opa binary from {}", url);
    println!("   writing binary in {}", dest.display());

    download(&url, dest).map_err(|e| RegoTestError::EvaluatorUnavailable {
        reason: format!("download of {} failed", url),
        source: Some(e),
    })
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fetch `url` into `dest` via a temp file renamed into place, so a partial
/// download never masquerades as a working binary.
fn download(url: &str, dest: &Path) -> Result<(), BoxError> {
    let tmp = dest.with_extension("tmp");
    let result = fetch_to_file(url, &tmp);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
        return result;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o755))?;
    }

    fs::rename(&tmp, dest)?;
    Ok(())
}

fn fetch_to_file(url: &str, tmp: &Path) -> Result<(), BoxError> {
    let mut response = reqwest::blocking::get(url)?.error_for_status()?;
    let mut file = fs::File::create(tmp)?;
    std::io::copy(&mut response, &mut file)?;
    Ok(())
}
