//! End-to-end resolution over Russian catalogs loaded from JSON

use verbal::catalog::parse_records;
use verbal::{ActionKind, Config, Device, Resolution, SessionManager};

const SET1: &str = r#"[
  {"dn": "LAMP1", "zone": "101", "name": "бра", "type": "510", "place": "1", "placeName": "1 этаж", "zoneName": "Холл"},
  {"dn": "LAMP2", "zone": "201", "name": "Верхний свет", "type": "520", "place": "2", "placeName": "2 этаж", "zoneName": "Спальня"},
  {"dn": "LAMP3", "name": "Верхний свет", "type": "510", "place": "1", "placeName": "1 этаж"},
  {"dn": "SLAMP1", "zone": "103", "name": "Светильник", "type": "510", "place": "1", "placeName": "1 этаж", "zoneName": "Санузел"}
]"#;

// two bathrooms and two staircases, one per floor
const SET2: &str = r#"[
  {"dn": "LAMP1", "zone": "107", "name": "бра", "type": "510", "place": "1", "placeName": "1 этаж", "zoneName": "Лестница"},
  {"dn": "SLAMP1", "zone": "103", "name": "Светильник", "type": "510", "place": "1", "placeName": "1 этаж", "zoneName": "Санузел"},
  {"dn": "SLAMP2", "zone": "203", "name": "Светильник", "type": "510", "place": "2", "placeName": "2 этаж", "zoneName": "Санузел"},
  {"dn": "TPOL", "zone": "203", "name": "Теплый пол", "type": "510", "place": "2", "placeName": "2 этаж", "zoneName": "Санузел"},
  {"dn": "LAMP2", "zone": "207", "name": "Торшер", "type": "510", "place": "2", "placeName": "2 этаж", "zoneName": "Лестница"}
]"#;

fn session(catalog: &str) -> SessionManager {
    let devices: Vec<Device> = parse_records(catalog, "device").unwrap();
    let mut session = SessionManager::new(&Config::default());
    let report = session.reload_devices(&devices);
    assert_eq!(report.duplicates, 0);
    session
}

fn resolve(session: &mut SessionManager, text: &str) -> Option<Resolution> {
    session.resolve(text).unwrap()
}

fn action(session: &mut SessionManager, text: &str) -> Option<String> {
    resolve(session, text).map(|r| r.action.to_string())
}

#[test]
fn set1_unique_device() {
    let mut session = session(SET1);
    let res = resolve(&mut session, "включи бра").unwrap();
    assert_eq!(res.action.to_string(), "LAMP1.on");
    assert_eq!(res.reply, "1 этаж Холл. Бра включен");
}

#[test]
fn set1_shared_name_on_floor() {
    let mut session = session(SET1);
    assert_eq!(
        action(&mut session, "включи верхний свет на первом этаже").as_deref(),
        Some("LAMP3.on")
    );
    let res = resolve(&mut session, "выключи верхний свет в спальне").unwrap();
    assert_eq!(res.action.to_string(), "LAMP2.off");
    assert_eq!(res.reply, "2 этаж Спальня. Верхний свет выключен");
}

#[test]
fn set1_filler_and_word_order() {
    let mut session = session(SET1);
    assert_eq!(
        action(&mut session, "ну ка быстро бра в холле включи").as_deref(),
        Some("LAMP1.on")
    );
}

#[test]
fn set1_redundant_location_is_accepted() {
    let mut session = session(SET1);
    assert_eq!(
        action(&mut session, "включи светильник в санузле первого этажа").as_deref(),
        Some("SLAMP1.on")
    );
    assert_eq!(action(&mut session, "включи светильник в спальне"), None);
}

#[test]
fn set1_group_in_zone() {
    let mut session = session(SET1);
    let res = resolve(&mut session, "включи свет в спальне").unwrap();
    assert_eq!(res.kind(), ActionKind::Group);
    assert_eq!(res.action.to_string(), "ALL.on");
    assert_eq!(res.filter().unwrap().zone.as_deref(), Some("201"));
    assert_eq!(res.reply, "2 этаж Спальня. Свет включен");
}

#[test]
fn set1_zone_names_only_zoned_commands() {
    let mut session = session(SET1);
    let res = resolve(&mut session, "включи свет на первом этаже").unwrap();
    assert_eq!(res.action.to_string(), "ALL.on");
    assert_eq!(res.filter().unwrap().place.as_deref(), Some("1"));
    assert_eq!(res.filter().unwrap().zone, None);

    assert!(resolve(&mut session, "включи свет на первом этаже в холле").is_none());
    assert!(resolve(&mut session, "включи верхний свет на первом этаже в холле").is_none());
}

#[test]
fn set1_no_match() {
    let mut session = session(SET1);
    assert!(resolve(&mut session, "ну ка быстро свет на балконе выключи").is_none());
    assert!(resolve(&mut session, "свет выключи").is_none());
}

#[test]
fn set2_repeated_zone_names_carry_the_floor() {
    let mut session = session(SET2);
    let zones = session.builder().zones();
    assert!(zones.iter().all(|z| z.longname));

    assert_eq!(
        action(&mut session, "включи светильник в санузле первого этажа").as_deref(),
        Some("SLAMP1.on")
    );
    assert_eq!(
        action(&mut session, "выключи светильник в санузле на втором этаже").as_deref(),
        Some("SLAMP2.off")
    );
}

#[test]
fn set2_groups_in_repeated_zones() {
    let mut session = session(SET2);
    let res = resolve(&mut session, "включи свет в санузле первого этажа").unwrap();
    assert_eq!(res.action.to_string(), "ALL.on");
    assert_eq!(res.filter().unwrap().zone.as_deref(), Some("103"));
    assert_eq!(res.reply, "1 этаж Санузел. Свет включен");

    let res = resolve(&mut session, "включи свет на лестнице первого этажа").unwrap();
    assert_eq!(res.action.to_string(), "ALL.on");
    assert_eq!(res.filter().unwrap().zone.as_deref(), Some("107"));
}

#[test]
fn set2_leftover_zone_must_match_device() {
    let mut session = session(SET2);
    let res = resolve(&mut session, "включи тёплый пол в санузле второго этажа").unwrap();
    assert_eq!(res.action.to_string(), "TPOL.on");
    assert_eq!(res.reply, "2 этаж Санузел. Теплый пол включен");

    assert!(resolve(&mut session, "включи теплый пол в санузле первого этажа").is_none());
}

#[test]
fn set2_channels_list_device_phrases() {
    let session = session(SET2);
    let channels = session.builder().channels();
    assert!(channels.iter().any(|c| c.action == "LAMP2.on" && c.keywords == "включ торшр"));
    assert!(
        channels
            .iter()
            .any(|c| c.action == "SLAMP2.off" && c.keywords == "выключ светильник второ этаж санузел")
    );
    assert!(channels.iter().all(|c| !c.action.starts_with("ALL")));
}
