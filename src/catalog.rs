//! Catalog records - devices, places, zones and extension phrases
//!
//! The host owns these records; the vocabulary builder only reads them. JSON
//! documents are parsed record by record so one malformed entry is skipped
//! instead of failing the whole reload.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::command::GroupFilter;
use crate::error::VocabError;

/// A controllable device as the catalog reports it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(deserialize_with = "id")]
    pub dn: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "opt_id")]
    pub zone: Option<String>,
    #[serde(default)]
    pub zone_name: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub place: Option<String>,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "id_or_empty")]
    pub type_code: String,
    #[serde(default, alias = "subs")]
    pub subsystem: Option<String>,
}

impl Device {
    pub fn new(dn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            name: name.into(),
            zone: None,
            zone_name: None,
            place: None,
            place_name: None,
            type_code: String::new(),
            subsystem: None,
        }
    }

    pub fn in_place(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.place = Some(id.into());
        self.place_name = Some(name.into());
        self
    }

    pub fn in_zone(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.zone = Some(id.into());
        self.zone_name = Some(name.into());
        self
    }

    pub fn with_type(mut self, code: impl Into<String>) -> Self {
        self.type_code = code.into();
        self
    }

    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    /// Place and zone names joined for reply text, e.g. `Floor 2 Bedroom`
    pub fn placement(&self) -> String {
        [self.place_name.as_deref(), self.zone_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A level of the building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub id: String,
    pub name: String,
}

/// A room; `longname` when its bare name repeats in another place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub place: Option<String>,
    pub place_name: Option<String>,
    pub longname: bool,
}

impl Zone {
    /// Name used for keyword generation
    pub fn spoken_name(&self) -> String {
        match (&self.place_name, self.longname) {
            (Some(place), true) => format!("{} {}", place, self.name),
            _ => self.name.clone(),
        }
    }
}

/// What an extension phrase triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtensionKind {
    Scene,
    #[serde(alias = "device")]
    DeviceCommand,
    Group,
}

/// User-authored phrase bound to a scene, a device command or a group command
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    #[serde(default, deserialize_with = "opt_id")]
    pub id: Option<String>,
    pub phrase: String,
    pub kind: ExtensionKind,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default, alias = "groupSelectors")]
    pub filter: Option<GroupFilter>,
    #[serde(default)]
    pub reply: Option<String>,
}

impl Extension {
    pub fn scene(id: impl Into<String>, phrase: impl Into<String>) -> Self {
        let target = id.into();
        Self {
            id: Some(target.clone()),
            phrase: phrase.into(),
            kind: ExtensionKind::Scene,
            target,
            operation: None,
            value: None,
            filter: None,
            reply: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(d).map(|raw| raw.map(String::from).filter(|s| !s.is_empty()))
}

fn id_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    opt_id(d).map(Option::unwrap_or_default)
}

/// Parse a JSON array, skipping entries that do not fit `T`
pub fn parse_records<T: DeserializeOwned>(text: &str, what: &str) -> Result<Vec<T>, VocabError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| VocabError::Catalog(format!("{}: {}", what, e)))?;
    let serde_json::Value::Array(items) = value else {
        return Err(VocabError::Catalog(format!("{}: expected a JSON array", what)));
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping {} entry #{}: {}", what, i, e),
        }
    }
    Ok(records)
}

/// Read the device catalog from a JSON file
pub fn load_devices(path: &Path) -> anyhow::Result<Vec<Device>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading device catalog {}", path.display()))?;
    let devices: Vec<Device> = parse_records(&text, "device")?;
    Ok(devices.into_iter().filter(|d| !d.dn.is_empty()).collect())
}

/// Read extension phrases from a JSON file
pub fn load_extensions(path: &Path) -> anyhow::Result<Vec<Extension>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading extensions {}", path.display()))?;
    Ok(parse_records(&text, "extension")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_device_from_json() {
        let text = r#"[
            {"dn": "LAMP1", "name": "бра", "zone": 101, "zoneName": "Холл",
             "place": "1", "placeName": "1 этаж", "type": "510"}
        ]"#;
        let devices: Vec<Device> = parse_records(text, "device").unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].zone.as_deref(), Some("101"));
        assert_eq!(devices[0].type_code, "510");
        assert_eq!(devices[0].placement(), "1 этаж Холл");
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let text = r#"[
            {"dn": "LAMP1", "name": "sconce"},
            {"name": "no id"},
            42,
            {"dn": 7, "name": "lamp", "subs": "lighting"}
        ]"#;
        let devices: Vec<Device> = parse_records(text, "device").unwrap();
        let dns: Vec<&str> = devices.iter().map(|d| d.dn.as_str()).collect();
        assert_eq!(dns, vec!["LAMP1", "7"]);
        assert_eq!(devices[1].subsystem.as_deref(), Some("lighting"));
    }

    #[test]
    fn test_not_an_array() {
        let result: Result<Vec<Device>, _> = parse_records(r#"{"dn": "x"}"#, "device");
        assert!(matches!(result, Err(VocabError::Catalog(_))));
    }

    #[test]
    fn test_extension_kinds() {
        let text = r#"[
            {"phrase": "party time", "kind": "scene", "target": "party"},
            {"phrase": "open gate", "kind": "device", "target": "GATE", "operation": "on"},
            {"phrase": "all off", "kind": "group", "operation": "off",
             "groupSelectors": {"place": "1", "types": ["510"]}}
        ]"#;
        let exts: Vec<Extension> = parse_records(text, "extension").unwrap();
        assert_eq!(exts[0].kind, ExtensionKind::Scene);
        assert_eq!(exts[1].kind, ExtensionKind::DeviceCommand);
        assert_eq!(exts[2].filter.as_ref().unwrap().place.as_deref(), Some("1"));
    }

    #[test]
    fn test_load_devices_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"dn": "LAMP1", "name": "sconce"}}, {{"dn": "", "name": "x"}}]"#).unwrap();
        let devices = load_devices(file.path()).unwrap();
        assert_eq!(devices.len(), 1);
    }

    #[test]
    fn test_zone_spoken_name() {
        let mut zone = Zone {
            id: "103".into(),
            name: "Санузел".into(),
            place: Some("1".into()),
            place_name: Some("1 этаж".into()),
            longname: false,
        };
        assert_eq!(zone.spoken_name(), "Санузел");
        zone.longname = true;
        assert_eq!(zone.spoken_name(), "1 этаж Санузел");
    }
}
