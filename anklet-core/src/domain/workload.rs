//! Workload domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Desired-state descriptor of a single workload
///
/// Only the agent assignment is interpreted. Every other field of the
/// descriptor (runtime, runtimeConfig, tags, restartPolicy, ...) is carried
/// through untouched so the workload can be resubmitted as it was read.
///
/// An empty agent means the orchestrator will not schedule the workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Name is the key of the descriptor in `desiredState.workloads`,
    /// it is not part of the descriptor body.
    #[serde(skip)]
    name: String,

    #[serde(default)]
    agent: String,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Workload {
    /// Creates an unscheduled workload with no extra descriptor fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: String::new(),
            fields: Map::new(),
        }
    }

    /// Sets the workload name (the key it is stored under)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Assigned agent, `None` while the workload is unscheduled
    pub fn agent(&self) -> Option<&str> {
        if self.agent.is_empty() {
            None
        } else {
            Some(&self.agent)
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.agent().is_some()
    }

    /// Assigns the workload to an agent
    ///
    /// Only the local copy changes; the orchestrator sees the assignment once
    /// the workload is applied.
    pub fn update_agent_name(&mut self, agent: impl Into<String>) {
        self.agent = agent.into();
    }

    /// Looks up a descriptor field other than `agent`
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The descriptor body as the orchestrator expects it
    pub fn to_descriptor(&self) -> Value {
        let mut body = self.fields.clone();
        body.insert("agent".to_string(), Value::String(self.agent.clone()));
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unscheduled_workload_has_no_agent() {
        let workload: Workload = serde_json::from_value(json!({
            "agent": "",
            "runtime": "podman",
            "restartPolicy": "NEVER"
        }))
        .unwrap();

        assert_eq!(workload.agent(), None);
        assert!(!workload.is_scheduled());
    }

    #[test]
    fn test_missing_agent_field_is_unscheduled() {
        let workload: Workload = serde_json::from_value(json!({ "runtime": "podman" })).unwrap();
        assert!(!workload.is_scheduled());
    }

    #[test]
    fn test_update_agent_keeps_other_fields() {
        let mut workload = serde_json::from_value::<Workload>(json!({
            "agent": "",
            "runtime": "podman",
            "runtimeConfig": "image: ghcr.io/eclipse-symphony/symphony-api\n",
            "tags": [{ "key": "owner", "value": "fleet" }]
        }))
        .unwrap()
        .with_name("symphony");

        workload.update_agent_name("agent_A");

        assert_eq!(workload.name(), "symphony");
        assert_eq!(workload.agent(), Some("agent_A"));

        let descriptor = workload.to_descriptor();
        assert_eq!(descriptor["agent"], "agent_A");
        assert_eq!(descriptor["runtime"], "podman");
        assert_eq!(
            descriptor["runtimeConfig"],
            "image: ghcr.io/eclipse-symphony/symphony-api\n"
        );
        assert_eq!(descriptor["tags"][0]["key"], "owner");
        assert!(descriptor.get("name").is_none());
    }

    #[test]
    fn test_new_workload() {
        let workload = Workload::new("nginx");
        assert_eq!(workload.name(), "nginx");
        assert!(!workload.is_scheduled());
        assert_eq!(workload.field("agent"), None);
        assert_eq!(workload.to_descriptor(), json!({ "agent": "" }));
    }
}
