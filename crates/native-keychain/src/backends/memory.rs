//! In-memory backend
//!
//! Keeps items in a process-local map and records every call it receives.
//! Useful for tests and for running without an OS keychain.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use super::KeychainBackend;
use crate::error::BackendFault;

/// A call received by [`MemoryBackend`], with arguments exactly as passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Set {
        account: String,
        secret: String,
        service: Option<String>,
    },
    Get {
        account: String,
        service: Option<String>,
    },
    Remove {
        account: String,
        service: Option<String>,
    },
}

type ItemKey = (Option<String>, String);

#[derive(Default)]
struct State {
    items: HashMap<ItemKey, String>,
    calls: Vec<BackendCall>,
    fault: Option<BackendFault>,
    reject_writes: bool,
}

/// Process-local keychain with call recording and scripted failures
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `fault` from every subsequent call until [`clear_fault`](Self::clear_fault)
    pub fn fail_with(&self, fault: BackendFault) {
        self.state.lock().fault = Some(fault);
    }

    pub fn clear_fault(&self) {
        self.state.lock().fault = None;
    }

    /// Refuse writes without raising (set returns `false`)
    pub fn reject_writes(&self, reject: bool) {
        self.state.lock().reject_writes = reject;
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, account: &str, service: Option<&str>) -> bool {
        self.state
            .lock()
            .items
            .contains_key(&item_key(account, service))
    }
}

fn item_key(account: &str, service: Option<&str>) -> ItemKey {
    (service.map(str::to_string), account.to_string())
}

impl KeychainBackend for MemoryBackend {
    fn set(
        &self,
        account: &str,
        secret: &str,
        service: Option<&str>,
    ) -> Result<bool, BackendFault> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Set {
            account: account.to_string(),
            secret: secret.to_string(),
            service: service.map(str::to_string),
        });

        if let Some(fault) = &state.fault {
            return Err(fault.clone());
        }
        if state.reject_writes {
            return Ok(false);
        }

        state
            .items
            .insert(item_key(account, service), secret.to_string());
        Ok(true)
    }

    fn get(&self, account: &str, service: Option<&str>) -> Result<Option<String>, BackendFault> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Get {
            account: account.to_string(),
            service: service.map(str::to_string),
        });

        if let Some(fault) = &state.fault {
            return Err(fault.clone());
        }

        Ok(state.items.get(&item_key(account, service)).cloned())
    }

    fn remove(&self, account: &str, service: Option<&str>) -> Result<bool, BackendFault> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Remove {
            account: account.to_string(),
            service: service.map(str::to_string),
        });

        if let Some(fault) = &state.fault {
            return Err(fault.clone());
        }

        Ok(state.items.remove(&item_key(account, service)).is_some())
    }
}

// Never print stored secrets
impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryBackend")
            .field("items", &state.items.len())
            .field("calls", &state.calls.len())
            .field("fault", &state.fault)
            .field("reject_writes", &state.reject_writes)
            .finish()
    }
}
