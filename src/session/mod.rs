pub mod ssh;

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::{Datastore, InterfaceName};

pub use ssh::SshSession;

/// SessionError covers everything that can go wrong talking to the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Could not reach or authenticate to the device
    Connect(String),
    /// The configuration query ran but failed
    Query {
        datastore: Datastore,
        path: String,
        reason: String,
    },
    /// The device answered with data we cannot read
    Malformed(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Connect(reason) => write!(f, "device connection failed: {}", reason),
            SessionError::Query { datastore, path, reason } => {
                write!(f, "{} query for {} failed: {}", datastore, path, reason)
            }
            SessionError::Malformed(reason) => write!(f, "malformed configuration data: {}", reason),
        }
    }
}

impl std::error::Error for SessionError {}

/// Interfaces of one router context, keyed by interface name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterConfig {
    pub interfaces: BTreeMap<InterfaceName, Value>,
}

impl RouterConfig {
    /// Parse device JSON output
    pub fn from_json_str(text: &str) -> Result<Self, SessionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SessionError::Malformed(format!("invalid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    /// Build from a JSON value. Accepts either a map keyed by interface name or
    /// a YANG list of entries carrying "interface-name". Module prefixes such as
    /// "nokia-conf:" are ignored and single-entry wrappers are descended into.
    pub fn from_json(value: &Value) -> Result<Self, SessionError> {
        if !value.is_object() && !value.is_array() {
            return Err(SessionError::Malformed(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            )));
        }

        let entries = match find_interfaces(value) {
            Some(entries) => entries,
            None => return Ok(Self::default()),
        };

        let mut interfaces = BTreeMap::new();
        match entries {
            Value::Object(map) => {
                for (name, meta) in map {
                    interfaces.insert(name.clone(), meta.clone());
                }
            }
            Value::Array(list) => {
                for entry in list {
                    let name = list_entry_name(entry).ok_or_else(|| {
                        SessionError::Malformed("interface entry without a name".to_string())
                    })?;
                    interfaces.insert(name, entry.clone());
                }
            }
            Value::Null => {}
            other => {
                return Err(SessionError::Malformed(format!(
                    "interface entries must be an object or list, got {}",
                    json_kind(other)
                )))
            }
        }

        Ok(Self { interfaces })
    }
}

fn strip_module(key: &str) -> &str {
    key.rsplit_once(':').map(|(_, local)| local).unwrap_or(key)
}

fn find_interfaces(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if let Some((_, v)) = map.iter().find(|(k, _)| strip_module(k) == "interface") {
                return Some(v);
            }
            single_value(map).and_then(find_interfaces)
        }
        Value::Array(list) if list.len() == 1 => find_interfaces(&list[0]),
        _ => None,
    }
}

fn single_value(map: &Map<String, Value>) -> Option<&Value> {
    if map.len() == 1 {
        map.values().next()
    } else {
        None
    }
}

fn list_entry_name(entry: &Value) -> Option<String> {
    let map = entry.as_object()?;
    map.iter()
        .find(|(k, _)| matches!(strip_module(k), "interface-name" | "name"))
        .and_then(|(_, v)| v.as_str())
        .map(str::to_string)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// DeviceSession is a live management session to one device
#[async_trait::async_trait]
pub trait DeviceSession: Send + Sync {
    /// Fetch the router configuration at `path` from a datastore
    async fn get(&self, datastore: Datastore, path: &str) -> Result<RouterConfig, SessionError>;

    async fn running(&self, path: &str) -> Result<RouterConfig, SessionError> {
        self.get(Datastore::Running, path).await
    }

    async fn candidate(&self, path: &str) -> Result<RouterConfig, SessionError> {
        self.get(Datastore::Candidate, path).await
    }
}

/// StaticSession serves fixed JSON per datastore, for running checks without a device
#[cfg(test)]
pub struct StaticSession {
    data: std::collections::HashMap<Datastore, Value>,
    error: Option<SessionError>,
    queries: std::sync::Mutex<Vec<(Datastore, String)>>,
}

#[cfg(test)]
impl StaticSession {
    pub fn new() -> Self {
        Self {
            data: std::collections::HashMap::new(),
            error: None,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, datastore: Datastore, value: Value) -> Self {
        self.data.insert(datastore, value);
        self
    }

    pub fn failing(error: SessionError) -> Self {
        Self {
            error: Some(error),
            ..Self::new()
        }
    }

    pub fn queries(&self) -> Vec<(Datastore, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl DeviceSession for StaticSession {
    async fn get(&self, datastore: Datastore, path: &str) -> Result<RouterConfig, SessionError> {
        self.queries.lock().unwrap().push((datastore, path.to_string()));
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        match self.data.get(&datastore) {
            Some(value) => RouterConfig::from_json(value),
            None => Ok(RouterConfig::default()),
        }
    }
}
