use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::setup::InstallPaths;

/// How the host CLI reached this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMethod {
    SystemPackage,
    ScriptInstall,
    NpmGlobal,
    BunGlobal,
    #[default]
    Unknown,
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallMethod::SystemPackage => "System package",
            InstallMethod::ScriptInstall => "Official install script",
            InstallMethod::NpmGlobal => "npm global",
            InstallMethod::BunGlobal => "bun global",
            InstallMethod::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Snapshot of the host CLI installation, taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct HostInstallInfo {
    pub installed: bool,
    pub version: String,
    pub binary_path: PathBuf,
    pub install_method: InstallMethod,
    pub config_dir: PathBuf,
    pub plugin_dir: PathBuf,
    pub node_modules_dir: PathBuf,
}

pub fn detect_host_install(binary: &str, paths: &InstallPaths) -> HostInstallInfo {
    let home = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf());
    detect_host_install_in(
        binary,
        std::env::var_os("PATH"),
        home.as_deref(),
        paths,
        installed_via_system_package,
    )
}

pub fn detect_host_install_in(
    binary: &str,
    search_path: Option<OsString>,
    home: Option<&Path>,
    paths: &InstallPaths,
    package_query: impl FnOnce(&str, &Path) -> bool,
) -> HostInstallInfo {
    let mut info = HostInstallInfo {
        config_dir: paths.host_dir.clone(),
        plugin_dir: paths.plugin_dir.clone(),
        node_modules_dir: paths.node_modules.clone(),
        ..Default::default()
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    let binary_path = match which::which_in(binary, search_path, cwd) {
        Ok(path) => path,
        Err(err) => {
            tracing::info!("{binary} not found on PATH: {err}");
            return info;
        }
    };

    info.installed = true;
    info.version = read_version(&binary_path).unwrap_or_default();

    let real_path = std::fs::canonicalize(&binary_path).unwrap_or_else(|err| {
        tracing::debug!("cannot resolve {}: {err}", binary_path.display());
        binary_path.clone()
    });
    info.install_method = classify_install_method(&real_path, home, binary, || {
        package_query(binary, &real_path)
    });
    info.binary_path = binary_path;

    tracing::info!(
        "host {binary} {} at {} via {}",
        info.version,
        info.binary_path.display(),
        info.install_method
    );
    info
}

pub fn classify_install_method(
    real_path: &Path,
    home: Option<&Path>,
    binary: &str,
    package_query: impl FnOnce() -> bool,
) -> InstallMethod {
    let text = real_path.to_string_lossy();

    if real_path.starts_with("/usr/bin") || real_path.starts_with("/usr/local/bin") {
        return if package_query() {
            InstallMethod::SystemPackage
        } else {
            InstallMethod::Unknown
        };
    }

    if home.is_some_and(|home| real_path.starts_with(home.join(format!(".{binary}")))) {
        return InstallMethod::ScriptInstall;
    }

    if text.contains("node_modules") {
        return if text.contains(".bun") {
            InstallMethod::BunGlobal
        } else {
            InstallMethod::NpmGlobal
        };
    }

    InstallMethod::Unknown
}

fn read_version(binary_path: &Path) -> Option<String> {
    let output = Command::new(binary_path)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|err| tracing::warn!("{} --version: {err}", binary_path.display()))
        .ok()?;

    if !output.status.success() {
        tracing::warn!("{} --version exited with {}", binary_path.display(), output.status);
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Best-effort package database lookup; any failure means "not packaged".
fn installed_via_system_package(binary: &str, real_path: &Path) -> bool {
    let path = real_path.to_string_lossy().into_owned();
    let queries: [(&str, [&str; 2]); 3] = [
        ("pacman", ["-Qs", binary]),
        ("dpkg", ["-S", path.as_str()]),
        ("rpm", ["-qf", path.as_str()]),
    ];

    queries.iter().any(|(program, args)| {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    })
}
