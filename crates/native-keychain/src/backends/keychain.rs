//! OS Keychain backend
//!
//! Backed by the `keyring` crate:
//! - macOS Keychain (generic password items)
//! - Windows Credential Manager
//! - Linux Secret Service (via libsecret)

use keyring::Entry;

use super::KeychainBackend;
use crate::error::BackendFault;

/// Generic-password store of the host OS
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    /// Service used when a request carries none
    namespace: String,
}

impl KeyringBackend {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn entry(&self, account: &str, service: Option<&str>) -> keyring::Result<Entry> {
        Entry::new(service.unwrap_or(&self.namespace), account)
    }
}

impl KeychainBackend for KeyringBackend {
    fn set(
        &self,
        account: &str,
        secret: &str,
        service: Option<&str>,
    ) -> Result<bool, BackendFault> {
        let result = self
            .entry(account, service)
            .and_then(|entry| entry.set_password(secret));

        match result {
            Ok(()) => Ok(true),
            Err(e) if is_rejected_item(&e) => {
                tracing::debug!(account, error = %e, "Keychain rejected item spec");
                Ok(false)
            }
            Err(e) => Err(fault(&e)),
        }
    }

    fn get(&self, account: &str, service: Option<&str>) -> Result<Option<String>, BackendFault> {
        let result = self
            .entry(account, service)
            .and_then(|entry| entry.get_password());

        lookup(account, result)
    }

    fn remove(&self, account: &str, service: Option<&str>) -> Result<bool, BackendFault> {
        let result = self
            .entry(account, service)
            .and_then(|entry| entry.delete_credential());

        match result {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) if is_rejected_item(&e) => Ok(false),
            Err(e) => Err(fault(&e)),
        }
    }
}

/// Map a password lookup onto the backend contract.
///
/// A refused item spec finds nothing, the same as on set and remove. Stored
/// bytes that are not UTF-8 are decoded lossily instead of faulting.
fn lookup(
    account: &str,
    result: keyring::Result<String>,
) -> Result<Option<String>, BackendFault> {
    match result {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(keyring::Error::BadEncoding(bytes)) => {
            tracing::debug!(account, "Keychain secret is not UTF-8, decoding lossily");
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Err(e) if is_rejected_item(&e) => {
            tracing::debug!(account, error = %e, "Keychain rejected item spec");
            Ok(None)
        }
        Err(e) => Err(fault(&e)),
    }
}

/// Item spec the store refuses outright (bad or oversized attributes)
fn is_rejected_item(error: &keyring::Error) -> bool {
    matches!(
        error,
        keyring::Error::Invalid(..) | keyring::Error::TooLong(..)
    )
}

/// Convert a keyring error into a backend fault
fn fault(error: &keyring::Error) -> BackendFault {
    let message = error.to_string();
    let code = match error {
        keyring::Error::PlatformFailure(inner) | keyring::Error::NoStorageAccess(inner) => {
            os_status(&inner.to_string())
        }
        _ => None,
    };

    BackendFault { message, code }
}

/// Extract an OSStatus-style code (negative integer) from platform error text
fn os_status(text: &str) -> Option<i32> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter_map(|token| token.parse::<i32>().ok())
        .find(|code| *code < 0)
}
