//! Request and result models
//!
//! Results serialize with the tag values callers of the keychain facade
//! already rely on: `"updated"`/`"removed"` and `"system"`/`"not_found"`.

use serde::{Deserialize, Serialize};

use crate::error::BackendFault;

/// Identity of a generic-password item: account key plus optional service.
///
/// Fields are read through [`key`](Self::key) and [`service`](Self::service),
/// which report exactly what the backend receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId {
    /// The key (keychain account attribute)
    key: String,

    /// The service/client namespace; `None` uses the backend default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<String>,
}

impl CredentialId {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            service: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Service to hand to the backend. An empty service counts as absent.
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref().filter(|s| !s.is_empty())
    }
}

/// Set-or-remove request: a present value upserts, an absent one removes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateParams {
    #[serde(flatten)]
    pub id: CredentialId,

    /// The secret; `null` or missing removes the item
    #[serde(default)]
    pub value: Option<String>,
}

impl UpdateParams {
    pub fn upsert(id: CredentialId, value: impl Into<String>) -> Self {
        Self {
            id,
            value: Some(value.into()),
        }
    }

    pub fn remove(id: CredentialId) -> Self {
        Self { id, value: None }
    }

    pub fn action(&self) -> ActionPerformed {
        if self.value.is_some() {
            ActionPerformed::Updated
        } else {
            ActionPerformed::Removed
        }
    }
}

/// Get request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetParams {
    #[serde(flatten)]
    pub id: CredentialId,
}

impl GetParams {
    pub fn new(id: CredentialId) -> Self {
        Self { id }
    }
}

impl From<CredentialId> for GetParams {
    fn from(id: CredentialId) -> Self {
        Self::new(id)
    }
}

/// The action taken or attempted by a set-or-remove call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPerformed {
    Updated,
    Removed,
}

impl ActionPerformed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Removed => "removed",
        }
    }
}

/// Why an operation did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend raised a system-level fault
    System,
    /// The item is absent, or the backend refused the write without a fault
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::NotFound => "not_found",
        }
    }
}

/// Outcome of a set-or-remove call.
///
/// `error_kind` is set iff the call failed; `error` only for
/// [`ErrorKind::System`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    action_performed: ActionPerformed,
    success: bool,
    #[serde(rename = "errorType", skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BackendFault>,
}

impl UpdateResult {
    pub(crate) fn succeeded(action: ActionPerformed) -> Self {
        Self {
            action_performed: action,
            success: true,
            error_kind: None,
            error: None,
        }
    }

    pub(crate) fn not_found(action: ActionPerformed) -> Self {
        Self {
            action_performed: action,
            success: false,
            error_kind: Some(ErrorKind::NotFound),
            error: None,
        }
    }

    pub(crate) fn system(action: ActionPerformed, fault: BackendFault) -> Self {
        Self {
            action_performed: action,
            success: false,
            error_kind: Some(ErrorKind::System),
            error: Some(fault),
        }
    }

    pub fn action_performed(&self) -> ActionPerformed {
        self.action_performed
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn error(&self) -> Option<&BackendFault> {
        self.error.as_ref()
    }
}

/// Outcome of a get call. `success` iff a value is present.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    success: bool,
    #[serde(rename = "errorType", skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BackendFault>,
}

impl GetResult {
    pub(crate) fn found(value: String) -> Self {
        Self {
            value: Some(value),
            success: true,
            error_kind: None,
            error: None,
        }
    }

    pub(crate) fn not_found() -> Self {
        Self {
            value: None,
            success: false,
            error_kind: Some(ErrorKind::NotFound),
            error: None,
        }
    }

    pub(crate) fn system(fault: BackendFault) -> Self {
        Self {
            value: None,
            success: false,
            error_kind: Some(ErrorKind::System),
            error: Some(fault),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn into_value(self) -> Option<String> {
        self.value
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn error(&self) -> Option<&BackendFault> {
        self.error.as_ref()
    }
}

// Keep secrets out of logs and panic messages
impl std::fmt::Debug for GetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetResult")
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("success", &self.success)
            .field("error_kind", &self.error_kind)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialized_empty_service_reads_as_absent() {
        let id: CredentialId =
            serde_json::from_str(r#"{"key":"token","service":""}"#).unwrap();
        assert_eq!(id.key(), "token");
        assert_eq!(id.service(), None);

        let id: CredentialId =
            serde_json::from_str(r#"{"key":"token","service":"my-app"}"#).unwrap();
        assert_eq!(id.service(), Some("my-app"));
    }

    #[test]
    fn test_empty_service_counts_as_absent() {
        assert_eq!(CredentialId::new("token").service(), None);
        assert_eq!(CredentialId::new("token").with_service("").service(), None);
        assert_eq!(
            CredentialId::new("token").with_service("app").service(),
            Some("app")
        );
    }

    #[test]
    fn test_null_and_missing_value_both_remove() {
        let explicit: UpdateParams =
            serde_json::from_value(json!({ "key": "token", "value": null })).unwrap();
        let omitted: UpdateParams = serde_json::from_value(json!({ "key": "token" })).unwrap();

        assert_eq!(explicit, omitted);
        assert_eq!(explicit.action(), ActionPerformed::Removed);
    }

    #[test]
    fn test_update_params_with_service() {
        let params: UpdateParams =
            serde_json::from_value(json!({ "key": "token", "service": "app", "value": "abc" }))
                .unwrap();
        assert_eq!(params.id.service(), Some("app"));
        assert_eq!(params.action(), ActionPerformed::Updated);
    }

    #[test]
    fn test_update_result_serialization() {
        let ok = serde_json::to_value(UpdateResult::succeeded(ActionPerformed::Updated)).unwrap();
        assert_eq!(ok, json!({ "actionPerformed": "updated", "success": true }));

        let missing = serde_json::to_value(UpdateResult::not_found(ActionPerformed::Removed)).unwrap();
        assert_eq!(
            missing,
            json!({ "actionPerformed": "removed", "success": false, "errorType": "not_found" })
        );

        let failed = serde_json::to_value(UpdateResult::system(
            ActionPerformed::Updated,
            BackendFault::with_code("Update Error", -25299),
        ))
        .unwrap();
        assert_eq!(failed["errorType"], "system");
        assert_eq!(failed["error"]["code"], -25299);
    }

    #[test]
    fn test_get_result_invariants() {
        let found = GetResult::found(String::new());
        assert!(found.is_success());
        assert_eq!(found.value(), Some(""));
        assert_eq!(found.error_kind(), None);

        let missing = GetResult::not_found();
        assert!(!missing.is_success());
        assert_eq!(missing.value(), None);
        assert_eq!(missing.error(), None);

        let failed = GetResult::system(BackendFault::new("boom"));
        assert_eq!(failed.error_kind(), Some(ErrorKind::System));
        assert_eq!(failed.error().map(|f| f.message.as_str()), Some("boom"));
    }

    #[test]
    fn test_get_result_debug_redacts_value() {
        let debug = format!("{:?}", GetResult::found("hunter2".to_string()));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
