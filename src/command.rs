//! Command types - what a phrase resolves to and how it is stored
//!
//! Action identifiers keep the host's string shapes: `LAMP1.on` for a device,
//! `ALL.off` for a group broadcast, a bare id for a scene.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use crate::catalog::Device;

/// Device selector of a group command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, alias = "room", skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, alias = "type", deserialize_with = "type_list")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
}

impl GroupFilter {
    /// Does the broadcast reach this device
    pub fn covers(&self, device: &Device) -> bool {
        let place_ok = self.place.is_none() || self.place == device.place;
        let zone_ok = self.zone.is_none() || self.zone == device.zone;
        let type_ok = self.types.is_empty() || self.types.iter().any(|t| *t == device.type_code);
        let subsystem_ok = self.subsystem.is_none() || self.subsystem == device.subsystem;
        place_ok && zone_ok && type_ok && subsystem_ok
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeList {
    Joined(String),
    List(Vec<String>),
}

/// Accepts `"510,520"` as well as `["510", "520"]`
fn type_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match TypeList::deserialize(d)? {
        TypeList::Joined(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        TypeList::List(list) => list,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Device,
    Group,
    Scene,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Device => "device",
            ActionKind::Group => "group",
            ActionKind::Scene => "scene",
        })
    }
}

/// Target and operation a command triggers
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Device {
        dn: String,
        op: String,
        value: Option<serde_json::Value>,
    },
    Group {
        filter: GroupFilter,
        op: String,
        value: Option<serde_json::Value>,
    },
    Scene {
        id: String,
    },
}

/// Dn of a group broadcast in action identifiers
pub const GROUP_DN: &str = "ALL";

/// Split `dn.verb` or `dn:verb`
pub fn split_dn_action(action: &str) -> Option<(&str, &str)> {
    if action.chars().count() < 4 {
        return None;
    }
    let delim = match action.find('.') {
        Some(pos) if pos > 0 => '.',
        _ => ':',
    };
    let mut parts = action.split(delim);
    let (dn, verb) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let (dn, verb) = (dn.trim(), verb.trim());
    if dn.is_empty() || verb.is_empty() {
        return None;
    }
    Some((dn, verb))
}

impl Action {
    pub fn device(dn: impl Into<String>, op: impl Into<String>) -> Self {
        Action::Device {
            dn: dn.into(),
            op: op.into(),
            value: None,
        }
    }

    pub fn group(filter: GroupFilter, op: impl Into<String>) -> Self {
        Action::Group {
            filter,
            op: op.into(),
            value: None,
        }
    }

    pub fn scene(id: impl Into<String>) -> Self {
        Action::Scene { id: id.into() }
    }

    /// Read an action identifier; anything not shaped `dn.verb` is a scene id
    pub fn parse(action: &str) -> Self {
        match split_dn_action(action) {
            Some((GROUP_DN, op)) => Action::group(GroupFilter::default(), op),
            Some((dn, op)) => Action::device(dn, op),
            None => Action::scene(action.trim()),
        }
    }

    pub fn with_value(mut self, v: Option<serde_json::Value>) -> Self {
        match &mut self {
            Action::Device { value, .. } | Action::Group { value, .. } => *value = v,
            Action::Scene { .. } => {}
        }
        self
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Device { .. } => ActionKind::Device,
            Action::Group { .. } => ActionKind::Group,
            Action::Scene { .. } => ActionKind::Scene,
        }
    }

    pub fn dn(&self) -> Option<&str> {
        match self {
            Action::Device { dn, .. } => Some(dn),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<&str> {
        match self {
            Action::Device { op, .. } | Action::Group { op, .. } => Some(op),
            Action::Scene { .. } => None,
        }
    }

    pub fn filter(&self) -> Option<&GroupFilter> {
        match self {
            Action::Group { filter, .. } => Some(filter),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Action::Device { value, .. } | Action::Group { value, .. } => value.as_ref(),
            Action::Scene { .. } => None,
        }
    }

    /// Empty identifiers are never registered
    pub fn is_empty(&self) -> bool {
        match self {
            Action::Device { dn, op, .. } => dn.is_empty() || op.is_empty(),
            Action::Group { op, .. } => op.is_empty(),
            Action::Scene { id } => id.is_empty(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Device { dn, op, .. } => write!(f, "{}.{}", dn, op),
            Action::Group { op, .. } => write!(f, "{}.{}", GROUP_DN, op),
            Action::Scene { id } => f.write_str(id),
        }
    }
}

/// Who authored a command; bulk removal targets these classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    GeneratedDevice,
    GeneratedGroup,
    External,
}

impl Origin {
    pub fn is_generated(&self) -> bool {
        !matches!(self, Origin::External)
    }
}

/// A command waiting for the uniqueness check
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Host record id for extension phrases
    pub id: Option<String>,
    pub action: Action,
    pub keywords: String,
    pub reply: String,
    pub origin: Origin,
}

impl Candidate {
    pub fn new(action: Action, keywords: impl Into<String>, reply: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: None,
            action,
            keywords: keywords.into(),
            reply: reply.into(),
            origin,
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }
}

/// A registered command
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: Option<String>,
    pub action: Action,
    pub keywords: String,
    /// Keyword tokens, rarest first at the time of insertion
    pub ordered_words: Vec<String>,
    pub reply: String,
    pub origin: Origin,
}

impl Command {
    pub fn first_word(&self) -> &str {
        self.ordered_words.first().map(String::as_str).unwrap_or("")
    }

    pub fn dn(&self) -> Option<&str> {
        self.action.dn()
    }

    pub fn filter(&self) -> Option<&GroupFilter> {
        self.action.filter()
    }
}

/// Candidate dropped by [`crate::registry::Registry::add`]
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub candidate: Candidate,
    /// Action whose keywords the candidate duplicated
    pub existing: String,
}

/// Successful match of an utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub action: Action,
    pub reply: String,
    /// Position of the winning command in the registry
    pub index: usize,
}

impl Resolution {
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn filter(&self) -> Option<&GroupFilter> {
        self.action.filter()
    }

    /// Host-facing record: kind, target or filter, operation, value, reply
    pub fn to_json(&self) -> serde_json::Value {
        let target = match &self.action {
            Action::Device { dn, .. } => Some(dn.as_str()),
            Action::Scene { id } => Some(id.as_str()),
            Action::Group { .. } => None,
        };
        json!({
            "actionKind": self.kind(),
            "action": self.action.to_string(),
            "target": target,
            "filter": self.filter(),
            "operation": self.action.operation(),
            "value": self.action.value(),
            "replyText": self.reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_dn_action() {
        assert_eq!(split_dn_action("LAMP1.on"), Some(("LAMP1", "on")));
        assert_eq!(split_dn_action("LAMP1:off"), Some(("LAMP1", "off")));
        assert_eq!(split_dn_action("party"), None);
        assert_eq!(split_dn_action("a.b"), None);
        assert_eq!(split_dn_action("a.b.c"), None);
        assert_eq!(split_dn_action(".hidden"), None);
    }

    #[test]
    fn test_parse_and_display() {
        let action = Action::parse("LAMP1.on");
        assert_eq!(action, Action::device("LAMP1", "on"));
        assert_eq!(action.to_string(), "LAMP1.on");

        let action = Action::parse("ALL:off");
        assert_eq!(action.kind(), ActionKind::Group);
        assert_eq!(action.to_string(), "ALL.off");

        let action = Action::parse("evening");
        assert_eq!(action, Action::scene("evening"));
        assert_eq!(action.operation(), None);
    }

    #[test]
    fn test_filter_types_from_csv() {
        let filter: GroupFilter =
            serde_json::from_str(r#"{"room": "201", "type": "510,520"}"#).unwrap();
        assert_eq!(filter.zone.as_deref(), Some("201"));
        assert_eq!(filter.types, vec!["510", "520"]);
    }

    #[test]
    fn test_filter_covers() {
        let filter = GroupFilter {
            place: Some("1".into()),
            zone: None,
            types: vec!["510".into()],
            subsystem: None,
        };
        let lamp = Device::new("LAMP1", "бра").in_place("1", "1 этаж").with_type("510");
        let upstairs = Device::new("LAMP2", "бра").in_place("2", "2 этаж").with_type("510");
        let pump = Device::new("PUMP", "насос").in_place("1", "1 этаж").with_type("600");
        assert!(filter.covers(&lamp));
        assert!(!filter.covers(&upstairs));
        assert!(!filter.covers(&pump));
    }

    #[test]
    fn test_empty_action() {
        assert!(Action::scene("").is_empty());
        assert!(Action::device("", "on").is_empty());
        assert!(!Action::group(GroupFilter::default(), "on").is_empty());
    }

    #[test]
    fn test_resolution_json() {
        let res = Resolution {
            action: Action::device("LAMP1", "on"),
            reply: "1 этаж Холл. Бра включен".into(),
            index: 3,
        };
        let value = res.to_json();
        assert_eq!(value["actionKind"], "device");
        assert_eq!(value["target"], "LAMP1");
        assert_eq!(value["operation"], "on");
        assert!(value["filter"].is_null());
        assert_eq!(value["replyText"], "1 этаж Холл. Бра включен");
        assert!(value.get("reply").is_none());
    }
}
