//! Credential operation facade

use std::sync::{Arc, LazyLock};

use crate::backends::KeychainBackend;
use crate::error::{BackendFault, PlatformError};
use crate::platform::HostProbe;
use crate::selector::{BackendSelector, NativeLoader};
use crate::types::{
    ActionPerformed, CredentialId, GetParams, GetResult, UpdateParams, UpdateResult,
};

static SHARED: LazyLock<NativeKeychain> = LazyLock::new(NativeKeychain::new);

/// Typed set/get/remove contract over a keychain backend.
///
/// Operation outcomes (`NotFound`, `System`) are always returned inside the
/// result. Only [`PlatformError`] aborts a call, and only until the backend
/// has been resolved successfully.
#[derive(Debug, Default)]
pub struct NativeKeychain {
    selector: BackendSelector,
}

impl NativeKeychain {
    /// Facade over the OS keychain of the host platform
    pub fn new() -> Self {
        Self::with_selector(BackendSelector::new())
    }

    /// Like [`new`](Self::new), using `namespace` for requests without a service
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self::with_selector(BackendSelector::with_parts(
            HostProbe,
            NativeLoader::new(namespace),
        ))
    }

    pub fn with_selector(selector: BackendSelector) -> Self {
        Self { selector }
    }

    /// Facade bound to an explicit backend, skipping platform selection
    pub fn with_backend(backend: Arc<dyn KeychainBackend>) -> Self {
        Self::with_selector(BackendSelector::with_backend(backend))
    }

    /// Process-wide facade over the host OS keychain
    pub fn shared() -> &'static NativeKeychain {
        &SHARED
    }

    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    /// Upsert the item when `params.value` is present, remove it otherwise
    pub fn set_or_remove(&self, params: &UpdateParams) -> Result<UpdateResult, PlatformError> {
        let backend = self.selector.resolve()?;
        let key = params.id.key();
        let service = params.id.service();
        let action = params.action();

        tracing::debug!(key, service, action = action.as_str(), "Keychain update");

        let outcome = match &params.value {
            Some(value) => backend.set(key, value, service),
            None => backend.remove(key, service),
        };

        Ok(update_result(action, key, outcome))
    }

    /// Read the item's secret
    pub fn get(&self, params: &GetParams) -> Result<GetResult, PlatformError> {
        let backend = self.selector.resolve()?;
        let key = params.id.key();
        let service = params.id.service();

        tracing::debug!(key, service, "Keychain lookup");

        let result = match backend.get(key, service) {
            Ok(Some(value)) => GetResult::found(value),
            Ok(None) => GetResult::not_found(),
            Err(fault) => {
                log_fault("get", key, &fault);
                GetResult::system(fault)
            }
        };

        Ok(result)
    }

    /// Shorthand for an upsert
    pub fn set(
        &self,
        id: &CredentialId,
        value: impl Into<String>,
    ) -> Result<UpdateResult, PlatformError> {
        self.set_or_remove(&UpdateParams::upsert(id.clone(), value))
    }

    /// Shorthand for a removal
    pub fn remove(&self, id: &CredentialId) -> Result<UpdateResult, PlatformError> {
        self.set_or_remove(&UpdateParams::remove(id.clone()))
    }
}

fn update_result(
    action: ActionPerformed,
    key: &str,
    outcome: Result<bool, BackendFault>,
) -> UpdateResult {
    match outcome {
        Ok(true) => UpdateResult::succeeded(action),
        Ok(false) => UpdateResult::not_found(action),
        Err(fault) => {
            log_fault(action.as_str(), key, &fault);
            UpdateResult::system(action, fault)
        }
    }
}

fn log_fault(operation: &str, key: &str, fault: &BackendFault) {
    tracing::warn!(operation, key, code = fault.code, error = %fault, "Keychain system fault");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{BackendCall, MemoryBackend};
    use crate::types::ErrorKind;

    fn facade() -> (Arc<MemoryBackend>, NativeKeychain) {
        let backend = Arc::new(MemoryBackend::new());
        let keychain = NativeKeychain::with_backend(backend.clone());
        (backend, keychain)
    }

    #[test]
    fn test_upsert_success() {
        let (backend, keychain) = facade();
        let result = keychain
            .set_or_remove(&UpdateParams::upsert(CredentialId::new("token"), "abc"))
            .unwrap();

        assert_eq!(result.action_performed(), ActionPerformed::Updated);
        assert!(result.is_success());
        assert_eq!(result.error_kind(), None);
        assert_eq!(result.error(), None);
        assert!(backend.contains("token", None));
    }

    #[test]
    fn test_rejected_write_is_not_found() {
        let (backend, keychain) = facade();
        backend.reject_writes(true);

        let result = keychain.set(&CredentialId::new("token"), "abc").unwrap();
        assert_eq!(result.action_performed(), ActionPerformed::Updated);
        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
        assert_eq!(result.error(), None);
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let (_backend, keychain) = facade();
        let result = keychain.remove(&CredentialId::new("token")).unwrap();

        assert_eq!(result.action_performed(), ActionPerformed::Removed);
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_fault_is_preserved() {
        let (backend, keychain) = facade();
        let fault = BackendFault::with_code("Lookup error (-25300)", -25300);
        backend.fail_with(fault.clone());

        let result = keychain.remove(&CredentialId::new("token")).unwrap();
        assert_eq!(result.action_performed(), ActionPerformed::Removed);
        assert_eq!(result.error_kind(), Some(ErrorKind::System));
        assert_eq!(result.error(), Some(&fault));

        let result = keychain.get(&CredentialId::new("token").into()).unwrap();
        assert_eq!(result.error(), Some(&fault));
    }

    #[test]
    fn test_get_empty_string_is_found() {
        let (_backend, keychain) = facade();
        keychain.set(&CredentialId::new("blank"), "").unwrap();

        let result = keychain.get(&CredentialId::new("blank").into()).unwrap();
        assert!(result.is_success());
        assert_eq!(result.value(), Some(""));
    }

    #[test]
    fn test_shared_is_one_instance() {
        assert!(std::ptr::eq(NativeKeychain::shared(), NativeKeychain::shared()));
    }

    #[test]
    fn test_empty_service_is_omitted() {
        let (backend, keychain) = facade();
        let id = CredentialId::new("token").with_service("");
        keychain.get(&GetParams::new(id)).unwrap();

        assert_eq!(
            backend.calls(),
            vec![BackendCall::Get {
                account: "token".to_string(),
                service: None,
            }]
        );
    }
}
