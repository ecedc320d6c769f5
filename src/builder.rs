//! Vocabulary builder - generates device and group phrasing from the catalog
//!
//! One rebuild replaces everything: location keyword maps, the device-name
//! frequency map and the candidate list handed to the registry. The builder
//! also judges whether a matched generated command fits the location words
//! left over in the utterance.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::{Device, Extension, ExtensionKind, Place, Zone};
use crate::command::{Action, Candidate, Command, GroupFilter, Origin, split_dn_action};
use crate::fuzzy::{contains_keywords, remove_keywords};
use crate::grammar::{KeywordOptions, act_result_verb, expand_keywords};
use crate::lang::{Act, Lang};
use crate::registry::LocationFit;

/// Type codes the default group word covers
const DEFAULT_GROUP_TYPES: [&str; 3] = ["510", "520", "530"];

/// A word naming a class of devices for group commands, e.g. `light`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupType {
    pub word: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub subsystem: Option<String>,
}

impl GroupType {
    pub fn defaults(lang: Lang) -> Vec<GroupType> {
        vec![GroupType {
            word: lang.default_group_word().to_string(),
            types: DEFAULT_GROUP_TYPES.iter().map(|t| t.to_string()).collect(),
            subsystem: None,
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub gen_device_commands: bool,
    pub gen_group_commands: bool,
    /// Subsystems that get generated phrasing; empty means all
    pub subsystems: Vec<String>,
    pub group_types: Vec<GroupType>,
}

impl BuildOptions {
    pub fn new(lang: Lang) -> Self {
        Self {
            gen_device_commands: true,
            gen_group_commands: true,
            subsystems: Vec::new(),
            group_types: GroupType::defaults(lang),
        }
    }

    fn allows(&self, subsystem: Option<&str>) -> bool {
        match subsystem {
            _ if self.subsystems.is_empty() => true,
            Some(s) => self.subsystems.iter().any(|allowed| allowed == s),
            None => false,
        }
    }
}

/// A generated device phrase published to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub action: String,
    pub dn: String,
    pub keywords: String,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn join_words(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyword sets per location id, in catalog order
type LocationWords = Vec<(String, Vec<String>)>;

fn location_words<'a>(map: &'a LocationWords, id: Option<&str>) -> Option<&'a [String]> {
    let id = id?;
    map.iter()
        .find(|(key, sets)| key == id && !sets.is_empty())
        .map(|(_, sets)| sets.as_slice())
}

fn find_location<'a>(map: &'a LocationWords, leftover: &[String], tolerance: usize) -> Option<&'a str> {
    map.iter().find_map(|(id, sets)| {
        sets.iter()
            .any(|set| {
                let tokens: Vec<&str> = set.split_whitespace().collect();
                contains_keywords(&tokens, leftover, tolerance)
            })
            .then_some(id.as_str())
    })
}

#[derive(Default)]
pub struct VocabularyBuilder {
    lang: Lang,
    devices: HashMap<String, Device>,
    places: Vec<Place>,
    zones: Vec<Zone>,
    place_words: LocationWords,
    zone_words: LocationWords,
    name_counts: HashMap<String, usize>,
    channels: Vec<Channel>,
}

impl VocabularyBuilder {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            ..Default::default()
        }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    fn clear(&mut self) {
        self.devices.clear();
        self.places.clear();
        self.zones.clear();
        self.place_words.clear();
        self.zone_words.clear();
        self.name_counts.clear();
        self.channels.clear();
    }

    /// Regenerate candidates for a fresh catalog
    #[hotpath::measure]
    pub fn rebuild(&mut self, devices: &[Device], opts: &BuildOptions) -> Vec<Candidate> {
        self.clear();
        self.collect_locations(devices);
        self.mark_longnames();

        let lang = self.lang;
        self.place_words = self
            .places
            .iter()
            .map(|p| (p.id.clone(), expand_keywords(&p.name, lang, KeywordOptions::FLUENT)))
            .collect();
        self.zone_words = self
            .zones
            .iter()
            .map(|z| (z.id.clone(), expand_keywords(&z.spoken_name(), lang, KeywordOptions::FLUENT)))
            .collect();

        for device in devices {
            for name in expand_keywords(&device.name, lang, KeywordOptions::PLAIN) {
                *self.name_counts.entry(name).or_insert(0) += 1;
            }
        }

        // device phrases go first so they win over identical group phrases
        let mut candidates = Vec::new();
        if opts.gen_device_commands {
            for device in devices {
                if device.dn.is_empty() || !opts.allows(device.subsystem.as_deref()) {
                    continue;
                }
                let generated = self.form_dn_commands(device);
                self.channels.extend(generated.iter().map(|c| Channel {
                    action: c.action.to_string(),
                    dn: device.dn.clone(),
                    keywords: c.keywords.clone(),
                }));
                candidates.extend(generated);
            }
        }
        if opts.gen_group_commands {
            for group in &opts.group_types {
                if group.subsystem.is_some() && !opts.allows(group.subsystem.as_deref()) {
                    continue;
                }
                candidates.extend(self.group_commands(group));
            }
        }

        info!(
            "Vocabulary rebuilt: {} devices, {} places, {} zones, {} candidates",
            self.devices.len(),
            self.places.len(),
            self.zones.len(),
            candidates.len()
        );
        candidates
    }

    fn collect_locations(&mut self, devices: &[Device]) {
        for device in devices {
            if device.dn.is_empty() {
                warn!("Skipping device without id: {:?}", device.name);
                continue;
            }
            self.devices.insert(device.dn.clone(), device.clone());

            if let (Some(id), Some(name)) = (&device.place, &device.place_name) {
                if !name.trim().is_empty() && !self.places.iter().any(|p| p.id == *id) {
                    self.places.push(Place {
                        id: id.clone(),
                        name: name.clone(),
                    });
                }
            }
            if let (Some(id), Some(name)) = (&device.zone, &device.zone_name) {
                if !name.trim().is_empty() && !self.zones.iter().any(|z| z.id == *id) {
                    self.zones.push(Zone {
                        id: id.clone(),
                        name: name.clone(),
                        place: device.place.clone(),
                        place_name: device.place_name.clone(),
                        longname: false,
                    });
                }
            }
        }
    }

    /// Zones sharing a bare name are spoken with their place prepended
    fn mark_longnames(&mut self) {
        let names: Vec<String> = self.zones.iter().map(|z| z.name.trim().to_lowercase()).collect();
        for (i, zone) in self.zones.iter_mut().enumerate() {
            zone.longname = names
                .iter()
                .enumerate()
                .any(|(j, name)| j != i && *name == names[i]);
        }
    }

    fn group_commands(&self, group: &GroupType) -> Vec<Candidate> {
        let words = expand_keywords(&group.word, self.lang, KeywordOptions::PLAIN);
        let mut out = Vec::new();

        for (place_id, sets) in &self.place_words {
            let filter = GroupFilter {
                place: Some(place_id.clone()),
                zone: None,
                types: group.types.clone(),
                subsystem: group.subsystem.clone(),
            };
            let placement = self
                .places
                .iter()
                .find(|p| p.id == *place_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            out.extend(self.group_variants(group, &words, sets, &filter, &placement));
        }

        for (zone_id, sets) in &self.zone_words {
            let Some(zone) = self.zones.iter().find(|z| z.id == *zone_id) else {
                continue;
            };
            let filter = GroupFilter {
                place: zone.place.clone(),
                zone: Some(zone_id.clone()),
                types: group.types.clone(),
                subsystem: group.subsystem.clone(),
            };
            let placement = join_words(&[zone.place_name.as_deref().unwrap_or(""), &zone.name]);
            out.extend(self.group_variants(group, &words, sets, &filter, &placement));
        }
        out
    }

    fn group_variants(
        &self,
        group: &GroupType,
        words: &[String],
        locations: &[String],
        filter: &GroupFilter,
        placement: &str,
    ) -> Vec<Candidate> {
        let mut out = Vec::new();
        for word in words {
            for location in locations {
                for act in Act::ALL {
                    out.push(Candidate::new(
                        Action::group(filter.clone(), act.as_str()),
                        join_words(&[self.lang.act_verb(act), word, location]),
                        self.reply(placement, &group.word, act),
                        Origin::GeneratedGroup,
                    ));
                }
            }
        }
        out
    }

    /// On and off commands for one device
    ///
    /// A name shared with another device gets every location keyword form of
    /// the device's zone, or of its place when it has no zone.
    pub fn form_dn_commands(&self, device: &Device) -> Vec<Candidate> {
        let names = expand_keywords(&device.name, self.lang, KeywordOptions::FLUENT);
        let shared = names
            .iter()
            .any(|n| self.name_counts.get(n).copied().unwrap_or(0) > 1);

        let no_location = [String::new()];
        let locations: &[String] = if shared {
            match location_words(&self.zone_words, device.zone.as_deref())
                .or_else(|| location_words(&self.place_words, device.place.as_deref()))
            {
                Some(sets) => sets,
                None => {
                    warn!("Device {} shares its name '{}' but has no location", device.dn, device.name);
                    &no_location
                }
            }
        } else {
            &no_location
        };

        let placement = device.placement();
        let mut out = Vec::with_capacity(names.len() * locations.len() * 2);
        for name in &names {
            for location in locations {
                for act in Act::ALL {
                    out.push(Candidate::new(
                        Action::device(&device.dn, act.as_str()),
                        join_words(&[self.lang.act_verb(act), name, location]),
                        self.reply(&placement, &device.name, act),
                        Origin::GeneratedDevice,
                    ));
                }
            }
        }
        out
    }

    /// `<place> <zone>. <Name> <result verb>`
    fn reply(&self, placement: &str, name: &str, act: Act) -> String {
        let name = name.trim();
        let verb = act_result_verb(act, self.lang, Some(name));
        if placement.trim().is_empty() {
            format!("{} {}", capitalize(name), verb)
        } else {
            format!("{}. {} {}", placement.trim(), capitalize(name), verb)
        }
    }

    /// Generated device phrases from the last rebuild
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn device(&self, dn: &str) -> Option<&Device> {
        self.devices.get(dn)
    }

    pub fn place_keywords(&self, id: &str) -> Option<&[String]> {
        location_words(&self.place_words, Some(id))
    }

    pub fn zone_keywords(&self, id: &str) -> Option<&[String]> {
        location_words(&self.zone_words, Some(id))
    }

    /// A leftover zone fits only the command's own zone
    fn zone_fits(&self, command: &Command, zone_id: &str) -> bool {
        let zone = match (command.filter(), command.dn()) {
            (Some(filter), _) => filter.zone.as_deref(),
            (None, Some(dn)) => match self.devices.get(dn) {
                Some(device) => device.zone.as_deref(),
                None => return false,
            },
            (None, None) => return true,
        };
        zone == Some(zone_id)
    }

    fn place_fits(&self, command: &Command, place_id: &str) -> bool {
        match (command.filter(), command.dn()) {
            (Some(filter), _) => filter.place.as_deref() == Some(place_id),
            (None, Some(dn)) => self
                .devices
                .get(dn)
                .is_some_and(|d| d.place.as_deref() == Some(place_id)),
            (None, None) => true,
        }
    }
}

impl LocationFit for VocabularyBuilder {
    fn fit_location(&self, command: &Command, words: &[String], tolerance: usize) -> bool {
        if !command.origin.is_generated() {
            return true;
        }
        let leftover = remove_keywords(&command.ordered_words, words, tolerance);
        if leftover.is_empty() {
            return true;
        }
        if let Some(zone_id) = find_location(&self.zone_words, &leftover, tolerance) {
            let fits = self.zone_fits(command, zone_id);
            debug!("Leftover {:?} names zone {}, fits {}: {}", leftover, zone_id, command.action, fits);
            return fits;
        }
        if let Some(place_id) = find_location(&self.place_words, &leftover, tolerance) {
            let fits = self.place_fits(command, place_id);
            debug!("Leftover {:?} names place {}, fits {}: {}", leftover, place_id, command.action, fits);
            return fits;
        }
        debug!("Leftover {:?} names no location", leftover);
        true
    }
}

/// Candidates for user-authored phrases, one per keyword form
pub fn expand_extensions(extensions: &[Extension], lang: Lang) -> Vec<Candidate> {
    let mut out = Vec::new();
    for ext in extensions {
        let Some(action) = extension_action(ext) else {
            warn!("Skipping extension '{}': no usable target", ext.phrase);
            continue;
        };
        let reply = match &ext.reply {
            Some(reply) if !reply.trim().is_empty() => reply.clone(),
            _ => lang.scene_reply(ext.phrase.trim()),
        };
        for keywords in expand_keywords(&ext.phrase, lang, KeywordOptions::INFINITIVE) {
            out.push(
                Candidate::new(action.clone(), keywords, reply.clone(), Origin::External)
                    .with_id(ext.id.clone()),
            );
        }
    }
    out
}

fn extension_action(ext: &Extension) -> Option<Action> {
    let target = ext.target.trim();
    let op = ext.operation.as_deref().map(str::trim).filter(|o| !o.is_empty());
    let action = match ext.kind {
        ExtensionKind::Scene => {
            let id = if target.is_empty() { ext.id.as_deref()? } else { target };
            Action::scene(id)
        }
        ExtensionKind::DeviceCommand => {
            let (dn, verb) = match split_dn_action(target) {
                Some((dn, verb)) => (dn, op.unwrap_or(verb)),
                None if !target.is_empty() => (target, op?),
                None => return None,
            };
            Action::device(dn, verb)
        }
        ExtensionKind::Group => Action::group(ext.filter.clone().unwrap_or_default(), op?),
    };
    Some(action.with_value(ext.value.clone()))
}
