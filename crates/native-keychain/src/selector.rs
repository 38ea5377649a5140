//! Backend selection for the host platform

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::backends::KeychainBackend;
use crate::error::{BackendFault, PlatformError};
use crate::platform::{BackendSlot, HostProbe, PlatformProbe, SUPPORTED_OS};

/// Default service namespace used by the native backend
pub const DEFAULT_NAMESPACE: &str = "native-keychain";

/// Loads the backend for a resolved architecture slot
pub trait BackendLoader: Send + Sync {
    fn load(&self, slot: BackendSlot) -> Result<Arc<dyn KeychainBackend>, BackendFault>;
}

/// Loader for the OS keychain backend
#[derive(Debug, Clone)]
pub struct NativeLoader {
    namespace: String,
}

impl NativeLoader {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Default for NativeLoader {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl BackendLoader for NativeLoader {
    #[cfg(feature = "keychain")]
    fn load(&self, slot: BackendSlot) -> Result<Arc<dyn KeychainBackend>, BackendFault> {
        tracing::debug!(%slot, namespace = %self.namespace, "Loading keyring backend");
        Ok(Arc::new(crate::backends::keychain::KeyringBackend::new(
            self.namespace.clone(),
        )))
    }

    #[cfg(not(feature = "keychain"))]
    fn load(&self, _slot: BackendSlot) -> Result<Arc<dyn KeychainBackend>, BackendFault> {
        Err(BackendFault::new(
            "keychain backend not compiled in (enable the `keychain` feature)",
        ))
    }
}

/// Resolves the keychain backend once and caches it.
///
/// The platform is only inspected until a resolution succeeds; afterwards the
/// cached handle is returned as is. Failed resolutions are not cached.
pub struct BackendSelector {
    probe: Box<dyn PlatformProbe>,
    loader: Box<dyn BackendLoader>,
    handle: OnceLock<Arc<dyn KeychainBackend>>,
    init: Mutex<()>,
}

impl BackendSelector {
    /// Selector for the host platform and the OS keychain backend
    pub fn new() -> Self {
        Self::with_parts(HostProbe, NativeLoader::default())
    }

    pub fn with_parts(
        probe: impl PlatformProbe + 'static,
        loader: impl BackendLoader + 'static,
    ) -> Self {
        Self {
            probe: Box::new(probe),
            loader: Box::new(loader),
            handle: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Selector already bound to `backend`; the platform is never inspected
    pub fn with_backend(backend: Arc<dyn KeychainBackend>) -> Self {
        let selector = Self::with_parts(HostProbe, NativeLoader::default());
        let _ = selector.handle.set(backend);
        selector
    }

    pub fn is_resolved(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Return the cached backend, resolving it on first use
    pub fn resolve(&self) -> Result<&Arc<dyn KeychainBackend>, PlatformError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        // Serialize first use so only one resolution can succeed
        let _guard = self.init.lock();
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        let backend = self.select().inspect_err(|e| {
            tracing::error!(error = %e, "Keychain backend resolution failed");
        })?;

        Ok(self.handle.get_or_init(|| backend))
    }

    fn select(&self) -> Result<Arc<dyn KeychainBackend>, PlatformError> {
        let os = self.probe.os_family();
        if os != SUPPORTED_OS {
            return Err(PlatformError::UnsupportedOs {
                os,
                expected: SUPPORTED_OS,
            });
        }

        let arch = self.probe.architecture();
        let slot =
            BackendSlot::from_arch(&arch).ok_or(PlatformError::UnsupportedArch { arch })?;

        let backend = self
            .loader
            .load(slot)
            .map_err(|source| PlatformError::BackendLoad { slot, source })?;

        tracing::info!(%os, %slot, "Keychain backend resolved");
        Ok(backend)
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSelector")
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryBackend;

    struct FixedProbe {
        os: &'static str,
        arch: &'static str,
    }

    impl PlatformProbe for FixedProbe {
        fn os_family(&self) -> String {
            self.os.to_string()
        }

        fn architecture(&self) -> String {
            self.arch.to_string()
        }
    }

    struct MemoryLoader;

    impl BackendLoader for MemoryLoader {
        fn load(&self, _slot: BackendSlot) -> Result<Arc<dyn KeychainBackend>, BackendFault> {
            Ok(Arc::new(MemoryBackend::new()))
        }
    }

    struct BrokenLoader;

    impl BackendLoader for BrokenLoader {
        fn load(&self, _slot: BackendSlot) -> Result<Arc<dyn KeychainBackend>, BackendFault> {
            Err(BackendFault::new("malformed backend"))
        }
    }

    #[test]
    fn test_rejects_unsupported_os() {
        let selector = BackendSelector::with_parts(
            FixedProbe {
                os: "linux",
                arch: "x86_64",
            },
            MemoryLoader,
        );
        let err = selector.resolve().unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedOs { ref os, .. } if os == "linux"));
        assert!(!selector.is_resolved());
    }

    #[test]
    fn test_rejects_unsupported_arch() {
        let selector = BackendSelector::with_parts(
            FixedProbe {
                os: "macos",
                arch: "powerpc",
            },
            MemoryLoader,
        );
        let err = selector.resolve().unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedArch { ref arch } if arch == "powerpc"));
    }

    #[test]
    fn test_surfaces_load_failure() {
        let selector = BackendSelector::with_parts(
            FixedProbe {
                os: "macos",
                arch: "aarch64",
            },
            BrokenLoader,
        );
        match selector.resolve() {
            Err(PlatformError::BackendLoad { slot, source }) => {
                assert_eq!(slot, BackendSlot::Arm64);
                assert_eq!(source.message, "malformed backend");
            }
            other => panic!("expected BackendLoad, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_resolve_returns_same_handle() {
        let selector = BackendSelector::with_parts(
            FixedProbe {
                os: "macos",
                arch: "x86_64",
            },
            MemoryLoader,
        );
        let first = Arc::clone(selector.resolve().unwrap());
        let second = Arc::clone(selector.resolve().unwrap());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(selector.is_resolved());
    }

    #[test]
    fn test_with_backend_is_pre_resolved() {
        let backend: Arc<dyn KeychainBackend> = Arc::new(MemoryBackend::new());
        let selector = BackendSelector::with_backend(Arc::clone(&backend));
        assert!(selector.is_resolved());
        assert!(Arc::ptr_eq(selector.resolve().unwrap(), &backend));
    }

    #[test]
    #[cfg(not(feature = "keychain"))]
    fn test_native_loader_without_keychain_feature() {
        let err = NativeLoader::default().load(BackendSlot::Arm64).err().unwrap();
        assert!(err.message.contains("keychain"));
    }
}
