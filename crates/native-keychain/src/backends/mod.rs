//! Keychain backend implementations

use std::fmt;

use crate::error::BackendFault;

#[cfg(feature = "keychain")]
pub mod keychain;

pub mod memory;

/// Native secure-storage capability for generic-password items.
///
/// Items are addressed by `account` and an optional `service` namespace.
/// `None` means "use the backend's default namespace" and is never the same
/// as `Some("")`.
///
/// Benign outcomes (item absent, write rejected) are reported through the
/// `Ok` value; `Err` is reserved for system-level faults.
pub trait KeychainBackend: fmt::Debug + Send + Sync {
    /// Create or update an item. Returns whether the write was accepted.
    fn set(&self, account: &str, secret: &str, service: Option<&str>)
        -> Result<bool, BackendFault>;

    /// Read an item's secret, `None` if it does not exist.
    fn get(&self, account: &str, service: Option<&str>) -> Result<Option<String>, BackendFault>;

    /// Delete an item. Returns whether an item was removed.
    fn remove(&self, account: &str, service: Option<&str>) -> Result<bool, BackendFault>;
}
