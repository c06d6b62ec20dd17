//! Terraform State Snapshot
//!
//! Decodes `terraform show -json` output into a flat, string-valued view of
//! each resource, matching how the plugin SDK exposes attributes to checks
//! (`port = "80"`, `backend.# = "1"`, `backend.0.port = "80"`).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AccResult;

/// Local state of one managed or data resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    pub type_name: String,
    pub name: String,
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), id.clone());
        Self {
            type_name: type_name.into(),
            name: name.into(),
            id,
            attributes,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// `<type>.<name>`
    pub fn address(&self) -> String {
        format!("{}.{}", self.type_name, self.name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Snapshot of every resource in the configuration, keyed by address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub resources: BTreeMap<String, ResourceState>,
}

#[derive(Deserialize)]
struct ShowOutput {
    values: Option<ShowValues>,
}

#[derive(Deserialize)]
struct ShowValues {
    root_module: Option<ShowModule>,
}

#[derive(Deserialize)]
struct ShowModule {
    #[serde(default)]
    resources: Vec<ShowResource>,
    #[serde(default)]
    child_modules: Vec<ShowModule>,
}

#[derive(Deserialize)]
struct ShowResource {
    address: String,
    #[serde(rename = "type")]
    type_name: String,
    name: String,
    #[serde(default)]
    values: Map<String, Value>,
}

impl State {
    /// Parse the output of `terraform show -json`. A document without
    /// `values` (nothing applied yet, or everything destroyed) is empty.
    pub fn from_show_json(data: &[u8]) -> AccResult<Self> {
        let trimmed = data.iter().filter(|b| !b.is_ascii_whitespace()).count();
        if trimmed == 0 {
            return Ok(Self::default());
        }

        let output: ShowOutput = serde_json::from_slice(data)?;
        let mut state = Self::default();

        if let Some(root) = output.values.and_then(|v| v.root_module) {
            state.collect_module(root);
        }

        Ok(state)
    }

    fn collect_module(&mut self, module: ShowModule) {
        for resource in module.resources {
            let mut attributes = BTreeMap::new();
            flatten_fields(&mut attributes, "", &resource.values);

            let id = attributes.get("id").cloned().unwrap_or_default();
            self.resources.insert(
                resource.address,
                ResourceState {
                    type_name: resource.type_name,
                    name: resource.name,
                    id,
                    attributes,
                },
            );
        }

        for child in module.child_modules {
            self.collect_module(child);
        }
    }

    pub fn insert(&mut self, resource: ResourceState) {
        self.resources.insert(resource.address(), resource);
    }

    pub fn with_resource(mut self, resource: ResourceState) -> Self {
        self.insert(resource);
        self
    }

    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn resources_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a ResourceState> + 'a {
        self.resources
            .values()
            .filter(move |r| r.type_name == type_name)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn flatten_fields(out: &mut BTreeMap<String, String>, prefix: &str, fields: &Map<String, Value>) {
    for (key, value) in fields {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        flatten_value(out, key, value);
    }
}

fn flatten_value(out: &mut BTreeMap<String, String>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(key, b.to_string());
        }
        Value::Number(n) => {
            out.insert(key, n.to_string());
        }
        Value::String(s) => {
            out.insert(key, s.clone());
        }
        Value::Array(items) => {
            out.insert(format!("{}.#", key), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                let item_key = format!("{}.{}", key, i);
                match item {
                    // Nested blocks carry no count of their own
                    Value::Object(fields) => flatten_fields(out, &item_key, fields),
                    other => flatten_value(out, item_key, other),
                }
            }
        }
        Value::Object(fields) => {
            out.insert(format!("{}.%", key), fields.len().to_string());
            flatten_fields(out, &key, fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_JSON: &str = r#"{
        "format_version": "1.0",
        "terraform_version": "1.7.5",
        "values": {
            "root_module": {
                "resources": [
                    {
                        "address": "civo_instance.vm",
                        "mode": "managed",
                        "type": "civo_instance",
                        "name": "vm",
                        "provider_name": "registry.terraform.io/civo/civo",
                        "values": {"id": "i-123", "hostname": "instance-abcdefghij", "tags": null}
                    },
                    {
                        "address": "civo_loadbalancer.foobar",
                        "mode": "managed",
                        "type": "civo_loadbalancer",
                        "name": "foobar",
                        "provider_name": "registry.terraform.io/civo/civo",
                        "values": {
                            "id": "lb-456",
                            "hostname": "abcdefghij",
                            "protocol": "http",
                            "port": 80,
                            "ignore_invalid_backend_tls": false,
                            "backend": [
                                {"instance_id": "i-123", "protocol": "http", "port": 80}
                            ],
                            "labels": {"env": "test"}
                        }
                    }
                ],
                "child_modules": [
                    {
                        "address": "module.extra",
                        "resources": [
                            {
                                "address": "module.extra.civo_instance.other",
                                "type": "civo_instance",
                                "name": "other",
                                "values": {"id": "i-789"}
                            }
                        ]
                    }
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_show_json() {
        let state = State::from_show_json(SHOW_JSON.as_bytes()).unwrap();
        assert_eq!(state.resources.len(), 3);

        let lb = state.resource("civo_loadbalancer.foobar").unwrap();
        assert_eq!(lb.id, "lb-456");
        assert_eq!(lb.type_name, "civo_loadbalancer");
        assert_eq!(lb.attr("protocol"), Some("http"));
        assert_eq!(lb.attr("port"), Some("80"));
        assert_eq!(lb.attr("ignore_invalid_backend_tls"), Some("false"));
    }

    #[test]
    fn test_nested_blocks_and_maps_flatten() {
        let state = State::from_show_json(SHOW_JSON.as_bytes()).unwrap();
        let lb = state.resource("civo_loadbalancer.foobar").unwrap();

        assert_eq!(lb.attr("backend.#"), Some("1"));
        assert_eq!(lb.attr("backend.0.instance_id"), Some("i-123"));
        assert_eq!(lb.attr("backend.0.port"), Some("80"));
        assert_eq!(lb.attr("backend.0.%"), None);
        assert_eq!(lb.attr("labels.%"), Some("1"));
        assert_eq!(lb.attr("labels.env"), Some("test"));
    }

    #[test]
    fn test_nulls_are_omitted_and_children_collected() {
        let state = State::from_show_json(SHOW_JSON.as_bytes()).unwrap();
        let vm = state.resource("civo_instance.vm").unwrap();
        assert_eq!(vm.attr("tags"), None);

        assert!(state.resource("module.extra.civo_instance.other").is_some());
        assert_eq!(state.resources_of_type("civo_instance").count(), 2);
    }

    #[test]
    fn test_empty_documents() {
        assert!(State::from_show_json(b"").unwrap().is_empty());
        assert!(State::from_show_json(b"  \n").unwrap().is_empty());
        assert!(State::from_show_json(br#"{"format_version":"1.0"}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_builder_sets_id_attribute() {
        let state = State::default().with_resource(
            ResourceState::new("civo_loadbalancer", "foobar", "lb-1").with_attr("port", "80"),
        );
        let lb = state.resource("civo_loadbalancer.foobar").unwrap();
        assert_eq!(lb.attr("id"), Some("lb-1"));
        assert_eq!(lb.attr("port"), Some("80"));
    }
}
