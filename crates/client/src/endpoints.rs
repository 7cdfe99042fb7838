//! Typed endpoint wrappers
//!
//! A representative slice of the remote catalog. Each wrapper only assembles
//! an operation path and a body from typed parameters and hands off to
//! [`GrazeClient::invoke`]; nothing here touches auth, transport, or
//! classification.

use serde_json::{json, Value};

use crate::client::GrazeClient;
use crate::error::GrazeError;

/// A user referenced either by numeric id or by name, for the assignment
/// operations that accept both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// Numeric user id.
    Id(u64),
    /// Login name.
    Name(String),
}

impl UserRef {
    fn apply(&self, body: &mut Value) {
        match self {
            Self::Id(id) => body["user_id"] = json!(id),
            Self::Name(name) => body["username"] = json!(name),
        }
    }
}

impl GrazeClient {
    /// Fetch the processing state of every component.
    pub async fn get_system_status(&self) -> Result<Value, GrazeError> {
        self.get("/getSystemStatus").await
    }

    /// Fetch a summary of current alert and situation counts.
    pub async fn get_system_summary(&self) -> Result<Value, GrazeError> {
        self.get("/getSystemSummary").await
    }

    /// Fetch the full detail record for an alert.
    pub async fn get_alert_details(&self, alert_id: u64) -> Result<Value, GrazeError> {
        self.get(&format!("/getAlertDetails?alert_id={alert_id}")).await
    }

    /// Fetch the full detail record for a situation.
    pub async fn get_situation_details(&self, sitn_id: u64) -> Result<Value, GrazeError> {
        self.get(&format!("/getSituationDetails?sitn_id={sitn_id}")).await
    }

    /// Ids of every situation that is not closed.
    pub async fn get_active_situation_ids(&self) -> Result<Value, GrazeError> {
        self.get("/getActiveSituationIds").await
    }

    /// Alert ids attached to a situation.
    pub async fn get_situation_alert_ids(
        &self,
        sitn_id: u64,
        for_unique_alerts: bool,
    ) -> Result<Value, GrazeError> {
        self.get(&format!(
            "/getSituationAlertIds?sitn_id={sitn_id}&for_unique_alerts={for_unique_alerts}"
        ))
        .await
    }

    /// Entries of a named collaboration thread on a situation.
    pub async fn get_thread_entries(
        &self,
        sitn_id: u64,
        thread_name: &str,
    ) -> Result<Value, GrazeError> {
        // thread names are free text, so the query must be encoded
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("sitn_id", &sitn_id.to_string())
            .append_pair("thread_name", thread_name)
            .finish();
        self.get(&format!("/getThreadEntries?{query}")).await
    }

    /// Close an alert.
    pub async fn close_alert(&self, alert_id: u64) -> Result<Value, GrazeError> {
        self.post("/closeAlert", &json!({ "alert_id": alert_id })).await
    }

    /// Close a situation with a resolution code.
    pub async fn close_situation(&self, sitn_id: u64, resolution: &str) -> Result<Value, GrazeError> {
        self.post("/closeSituation", &json!({ "sitn_id": sitn_id, "resolution": resolution }))
            .await
    }

    /// Mark a situation resolved.
    pub async fn resolve_situation(&self, sitn_id: u64) -> Result<Value, GrazeError> {
        self.post("/resolveSituation", &json!({ "sitn_id": sitn_id })).await
    }

    /// Create a situation with a description; returns its id.
    pub async fn create_situation(&self, description: &str) -> Result<Value, GrazeError> {
        self.post("/createSituation", &json!({ "description": description })).await
    }

    /// Create a named collaboration thread on a situation.
    pub async fn create_thread(&self, sitn_id: u64, thread_name: &str) -> Result<Value, GrazeError> {
        self.post("/createThread", &json!({ "sitn_id": sitn_id, "thread_name": thread_name }))
            .await
    }

    /// Append an entry to a situation thread.
    pub async fn add_thread_entry(
        &self,
        sitn_id: u64,
        thread_name: &str,
        entry: &str,
    ) -> Result<Value, GrazeError> {
        self.post(
            "/addThreadEntry",
            &json!({ "sitn_id": sitn_id, "thread_name": thread_name, "entry": entry }),
        )
        .await
    }

    /// Attach an alert to a situation.
    pub async fn add_alert_to_situation(
        &self,
        alert_id: u64,
        sitn_id: u64,
    ) -> Result<Value, GrazeError> {
        self.post("/addAlertToSituation", &json!({ "alert_id": alert_id, "sitn_id": sitn_id }))
            .await
    }

    /// Detach an alert from a situation.
    pub async fn remove_alert_from_situation(
        &self,
        alert_id: u64,
        sitn_id: u64,
    ) -> Result<Value, GrazeError> {
        self.post(
            "/removeAlertFromSituation",
            &json!({ "alert_id": alert_id, "sitn_id": sitn_id }),
        )
        .await
    }

    /// Merge situations into a new one, optionally keeping the originals.
    pub async fn merge_situations(
        &self,
        sitn_ids: &[u64],
        keep_originals: bool,
    ) -> Result<Value, GrazeError> {
        self.post(
            "/mergeSituations",
            &json!({ "situations": sitn_ids, "keep_originals": keep_originals }),
        )
        .await
    }

    /// Set an alert's severity (0 = clear .. 5 = critical).
    pub async fn set_alert_severity(&self, alert_id: u64, severity: u8) -> Result<Value, GrazeError> {
        self.post("/setAlertSeverity", &json!({ "alert_id": alert_id, "severity": severity }))
            .await
    }

    /// Replace a situation's description.
    pub async fn set_situation_description(
        &self,
        sitn_id: u64,
        description: &str,
    ) -> Result<Value, GrazeError> {
        self.post(
            "/setSituationDescription",
            &json!({ "sitn_id": sitn_id, "description": description }),
        )
        .await
    }

    /// Merge custom-info fields into an alert.
    pub async fn add_alert_custom_info(
        &self,
        alert_id: u64,
        custom_info: &Value,
    ) -> Result<Value, GrazeError> {
        self.post("/addAlertCustomInfo", &json!({ "alert_id": alert_id, "custom_info": custom_info }))
            .await
    }

    /// Assign an alert to a user by id or name.
    pub async fn assign_alert(&self, alert_id: u64, user: &UserRef) -> Result<Value, GrazeError> {
        let mut body = json!({ "alert_id": alert_id });
        user.apply(&mut body);
        self.post("/assignAlert", &body).await
    }

    /// Assign a situation to a user by id or name.
    pub async fn assign_situation(
        &self,
        sitn_id: u64,
        user: &UserRef,
    ) -> Result<Value, GrazeError> {
        let mut body = json!({ "sitn_id": sitn_id });
        user.apply(&mut body);
        self.post("/assignSituation", &body).await
    }
}
