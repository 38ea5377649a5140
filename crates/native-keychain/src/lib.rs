//! Typed facade over the OS keychain generic-password store
//!
//! A single secret is addressed by a key (the keychain account) and an
//! optional service namespace. The facade offers two operations:
//!
//! - [`NativeKeychain::set_or_remove`]: upsert when a value is given, remove
//!   the item when it is not
//! - [`NativeKeychain::get`]: read the item's secret
//!
//! Both return a structured result instead of raising. A benign absence (or a
//! write the store refused) is reported as [`ErrorKind::NotFound`]; a fault
//! raised by the store is reported as [`ErrorKind::System`] with the original
//! [`BackendFault`] attached.
//!
//! The backend is selected lazily on first use from the host OS family and CPU
//! architecture. An unsupported platform is the only condition returned as an
//! `Err` ([`PlatformError`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use native_keychain::{CredentialId, GetParams, NativeKeychain, UpdateParams};
//!
//! let keychain = NativeKeychain::new();
//! let id = CredentialId::new("api-token").with_service("my-app");
//!
//! let result = keychain.set_or_remove(&UpdateParams::upsert(id.clone(), "s3cr3t"))?;
//! assert!(result.is_success());
//!
//! let result = keychain.get(&GetParams::new(id))?;
//! assert_eq!(result.value(), Some("s3cr3t"));
//! ```
//!
//! # Features
//!
//! - `keychain` (default): OS keychain backend via the `keyring` crate
//! - `keychain-tests`: enable tests that write to the real OS keychain

mod backends;
mod error;
mod facade;
mod platform;
mod selector;
mod types;

pub use backends::memory::{BackendCall, MemoryBackend};
pub use backends::KeychainBackend;
pub use error::{BackendFault, PlatformError};
pub use facade::NativeKeychain;
pub use platform::{BackendSlot, HostProbe, PlatformProbe, SUPPORTED_OS};
pub use selector::{BackendLoader, BackendSelector, NativeLoader, DEFAULT_NAMESPACE};
pub use types::{
    ActionPerformed, CredentialId, ErrorKind, GetParams, GetResult, UpdateParams, UpdateResult,
};

#[cfg(feature = "keychain")]
pub use backends::keychain::KeyringBackend;
