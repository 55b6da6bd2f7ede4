//! In-memory `PolicyService` used to exercise command handlers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use uuid::Uuid;

use crate::client::AppContext;
use crate::management::{Policy, PolicyService, RemoteError, RemoteResult};

pub(crate) const CREATED_ID: &str = "0f6c3b2e-5d1a-4e8f-9a7b-3c2d1e0f9a8b";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create {
        scheme: String,
        rules: Vec<u8>,
        name: Option<String>,
    },
    Get {
        scheme: String,
        id: Uuid,
    },
    GetActive {
        scheme: String,
    },
    List {
        scheme: String,
        name: Option<String>,
    },
    Activate {
        scheme: String,
        id: Uuid,
    },
    DeactivateAll {
        scheme: String,
    },
    Schemes,
}

/// Records every call and answers from canned data.
pub(crate) struct RecordingService {
    endpoint: Url,
    calls: Mutex<Vec<Call>>,
    pub(crate) policies: Vec<Policy>,
    pub(crate) schemes: Vec<String>,
    pub(crate) reject_activation: bool,
}

impl RecordingService {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: "https://veraison.example:8443/management/v1"
                .parse()
                .expect("static endpoint"),
            calls: Mutex::new(Vec::new()),
            policies: Vec::new(),
            schemes: Vec::new(),
            reject_activation: false,
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn context(self: &Arc<Self>) -> AppContext {
        AppContext {
            service: Arc::clone(self) as Arc<dyn PolicyService>,
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

pub(crate) fn policy(id: &str, name: &str, rules: &str, active: bool) -> Policy {
    Policy {
        uuid: id.parse().expect("valid uuid"),
        ctime: None,
        name: name.to_string(),
        policy_type: "opa".to_string(),
        rules: rules.to_string(),
        active,
    }
}

fn not_found(operation: &'static str, message: &str) -> RemoteError {
    RemoteError::Status {
        operation,
        status: StatusCode::NOT_FOUND,
        message: message.to_string(),
    }
}

#[async_trait]
impl PolicyService for RecordingService {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn create_policy(
        &self,
        scheme: &str,
        rules: Vec<u8>,
        name: Option<&str>,
    ) -> RemoteResult<Policy> {
        let created = policy(
            CREATED_ID,
            name.unwrap_or_default(),
            &String::from_utf8_lossy(&rules),
            false,
        );
        self.record(Call::Create {
            scheme: scheme.to_string(),
            rules,
            name: name.map(str::to_string),
        });
        Ok(created)
    }

    async fn get_policy(&self, scheme: &str, id: Uuid) -> RemoteResult<Policy> {
        self.record(Call::Get {
            scheme: scheme.to_string(),
            id,
        });
        self.policies
            .iter()
            .find(|policy| policy.uuid == id)
            .cloned()
            .ok_or_else(|| not_found("get policy", "policy not found"))
    }

    async fn get_active_policy(&self, scheme: &str) -> RemoteResult<Policy> {
        self.record(Call::GetActive {
            scheme: scheme.to_string(),
        });
        self.policies
            .iter()
            .find(|policy| policy.active)
            .cloned()
            .ok_or_else(|| not_found("get active policy", "no active policy"))
    }

    async fn get_policies(&self, scheme: &str, name: Option<&str>) -> RemoteResult<Vec<Policy>> {
        self.record(Call::List {
            scheme: scheme.to_string(),
            name: name.map(str::to_string),
        });
        Ok(self
            .policies
            .iter()
            .filter(|policy| name.is_none_or(|name| policy.name == name))
            .cloned()
            .collect())
    }

    async fn activate_policy(&self, scheme: &str, id: Uuid) -> RemoteResult<()> {
        self.record(Call::Activate {
            scheme: scheme.to_string(),
            id,
        });
        if self.reject_activation {
            Err(not_found("activate policy", "policy not found"))
        } else {
            Ok(())
        }
    }

    async fn deactivate_all_policies(&self, scheme: &str) -> RemoteResult<()> {
        self.record(Call::DeactivateAll {
            scheme: scheme.to_string(),
        });
        Ok(())
    }

    async fn get_supported_schemes(&self) -> RemoteResult<Vec<String>> {
        self.record(Call::Schemes);
        Ok(self.schemes.clone())
    }
}
