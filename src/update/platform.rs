//! Host platform identification in release-asset vocabulary.
//!
//! Release pipelines name assets `{binary}_{os}_{arch}` using the GOOS/GOARCH
//! style (`linux_amd64`, `darwin_arm64`), which differs from Rust's
//! `std::env::consts` values. The pair is always read from the running
//! process; there is no way to configure it.

use std::fmt;

/// Operating system and CPU architecture of the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
}

impl Platform {
    /// The platform this process is running on.
    pub fn current() -> Self {
        Self {
            os: asset_os(std::env::consts::OS),
            arch: asset_arch(std::env::consts::ARCH, cfg!(target_endian = "little")),
        }
    }

    /// Operating system name (e.g. `linux`, `darwin`, `windows`).
    pub fn os(&self) -> &str {
        self.os
    }

    /// Architecture name (e.g. `amd64`, `arm64`).
    pub fn arch(&self) -> &str {
        self.arch
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// Map a `std::env::consts::OS` value to its asset name.
fn asset_os(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Map a `std::env::consts::ARCH` value to its asset name.
///
/// `ARCH` does not encode byte order, but the asset vocabulary does for the
/// bi-endian families.
fn asset_arch(arch: &'static str, little_endian: bool) -> &'static str {
    match (arch, little_endian) {
        ("x86_64", _) => "amd64",
        ("aarch64", _) => "arm64",
        ("x86", _) => "386",
        ("loongarch64", _) => "loong64",
        ("powerpc64", true) => "ppc64le",
        ("powerpc64", false) => "ppc64",
        ("mips64", true) => "mips64le",
        ("mips", true) => "mipsle",
        (other, _) => other,
    }
}
