//! Host platform introspection

use std::fmt;

/// OS family the keychain backend supports
pub const SUPPORTED_OS: &str = "macos";

/// Source of host OS family and CPU architecture identifiers.
///
/// Queried by the backend selector on first use only.
pub trait PlatformProbe: Send + Sync {
    /// OS family identifier (e.g. `macos`, `linux`)
    fn os_family(&self) -> String;

    /// CPU architecture identifier (e.g. `aarch64`, `x86_64`)
    fn architecture(&self) -> String;
}

/// Probe reporting the platform this binary was compiled for
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl PlatformProbe for HostProbe {
    fn os_family(&self) -> String {
        std::env::consts::OS.to_string()
    }

    fn architecture(&self) -> String {
        std::env::consts::ARCH.to_string()
    }
}

/// Architecture-specific backend slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendSlot {
    /// 64-bit ARM (Apple silicon)
    Arm64,
    /// 64-bit x86
    X86_64,
}

impl BackendSlot {
    /// Map an architecture identifier to its slot.
    ///
    /// Accepts both Rust (`aarch64`) and Node-style (`arm64`, `x64`) names.
    pub fn from_arch(arch: &str) -> Option<Self> {
        match arch {
            "aarch64" | "arm64" => Some(Self::Arm64),
            "x86_64" | "x64" => Some(Self::X86_64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for BackendSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
