// ── Area entity view ──
//
// Derives the set of fan-like entities a device exposes from its latest
// snapshot, and diffs that set between snapshots so consumers can add or
// retract entities explicitly.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::mapping::{AreaState, Preset, is_inactive};
use crate::model::{AreaId, AreaRecord, DeviceId, DeviceSnapshot};

pub const MANUFACTURER: &str = "SEC";

/// Metadata shared by every entity of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: DeviceId,
    pub manufacturer: &'static str,
    pub name: String,
}

impl DeviceInfo {
    pub fn for_device(device_id: &DeviceId) -> Self {
        Self {
            identifier: device_id.clone(),
            manufacturer: MANUFACTURER,
            name: format!("SEC Smart {device_id}"),
        }
    }
}

/// One exposed area, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaEntity {
    /// `{device}_area{N}`, stable across restarts.
    pub unique_id: String,
    pub device_id: DeviceId,
    pub area_id: AreaId,
    pub name: String,
    /// Trimmed mode text as last reported.
    pub mode: String,
    pub percentage: Option<u8>,
    pub preset: Option<Preset>,
    pub is_on: Option<bool>,
    pub preset_modes: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timers: Option<Value>,
    pub device_info: DeviceInfo,
}

impl AreaEntity {
    /// Build the entity for an area, or `None` if the area is inactive.
    pub fn from_record(device_id: &DeviceId, area_id: AreaId, record: &AreaRecord) -> Option<Self> {
        if is_inactive(&record.mode) {
            return None;
        }

        let state = AreaState::from_mode(&record.mode);
        let percentage = state.display_percentage();
        let is_on = match (percentage, state.preset) {
            (Some(p), _) => Some(p > 0),
            (None, Some(_)) => Some(true),
            (None, None) => None,
        };

        Some(Self {
            unique_id: unique_id(device_id, area_id),
            device_id: device_id.clone(),
            area_id,
            name: display_name(area_id, record.label.as_deref()),
            mode: record.mode.clone(),
            percentage,
            preset: state.preset,
            is_on,
            preset_modes: Preset::selectable_names(),
            timers: record.timers.clone().filter(|t| !is_blank(t)),
            device_info: DeviceInfo::for_device(device_id),
        })
    }

    /// Manual level a UI would highlight, `0` when off or unknown.
    pub fn level(&self) -> u8 {
        AreaState {
            percentage: self.percentage,
            preset: None,
        }
        .level()
    }
}

/// Every entity the snapshot exposes, in area order.
///
/// Absent areas and inactive areas are left out entirely.
pub fn exposed_entities(device_id: &DeviceId, snapshot: &DeviceSnapshot) -> Vec<AreaEntity> {
    snapshot
        .areas
        .iter()
        .filter_map(|(&id, record)| AreaEntity::from_record(device_id, id, record))
        .collect()
}

/// Area ids the snapshot exposes.
pub fn exposed_ids(snapshot: &DeviceSnapshot) -> BTreeSet<AreaId> {
    snapshot
        .areas
        .iter()
        .filter(|(_, record)| !is_inactive(&record.mode))
        .map(|(&id, _)| id)
        .collect()
}

pub fn unique_id(device_id: &DeviceId, area_id: AreaId) -> String {
    format!("{device_id}_{}", area_id.key())
}

/// Trimmed label, falling back to `Area N` when missing or blank.
pub fn display_name(area_id: AreaId, label: Option<&str>) -> String {
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(|| format!("Area {area_id}"), str::to_owned)
}

/// `null`, `""`, `[]` and `{}` carry no schedule.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// ── Membership reconciliation ────────────────────────────────────

/// Change to the exposed entity set of one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MembershipEvent {
    Added(AreaEntity),
    Removed { unique_id: String, area_id: AreaId },
}

/// Tracks which areas of one device are currently exposed.
#[derive(Debug)]
pub struct EntityReconciler {
    device_id: DeviceId,
    exposed: BTreeSet<AreaId>,
}

impl EntityReconciler {
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            exposed: BTreeSet::new(),
        }
    }

    pub fn exposed(&self) -> &BTreeSet<AreaId> {
        &self.exposed
    }

    /// Diff the previously exposed set against `snapshot`.
    ///
    /// Removals are reported before additions, each in area order.
    pub fn reconcile(&mut self, snapshot: &DeviceSnapshot) -> Vec<MembershipEvent> {
        let next = exposed_ids(snapshot);

        let removed = self.exposed.difference(&next).map(|&id| MembershipEvent::Removed {
            unique_id: unique_id(&self.device_id, id),
            area_id: id,
        });
        let added = next.difference(&self.exposed).filter_map(|&id| {
            let record = snapshot.area(id)?;
            AreaEntity::from_record(&self.device_id, id, record).map(MembershipEvent::Added)
        });
        let events: Vec<_> = removed.chain(added).collect();

        if !events.is_empty() {
            info!(
                device = %self.device_id,
                before = self.exposed.len(),
                after = next.len(),
                "exposed areas changed"
            );
        }
        self.exposed = next;
        events
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn area(n: u8) -> AreaId {
        AreaId::try_from(n).unwrap()
    }

    fn record(mode: &str, label: Option<&str>) -> AreaRecord {
        AreaRecord {
            mode: mode.into(),
            label: label.map(str::to_owned),
            timers: None,
        }
    }

    fn snapshot(areas: &[(u8, &str)]) -> DeviceSnapshot {
        DeviceSnapshot {
            areas: areas
                .iter()
                .map(|&(n, mode)| (area(n), record(mode, None)))
                .collect::<BTreeMap<_, _>>(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn entity_fields() {
        let device = DeviceId::from("D42");
        let entity =
            AreaEntity::from_record(&device, area(2), &record("Manual 3", Some(" Kitchen ")))
                .unwrap();

        assert_eq!(entity.unique_id, "D42_area2");
        assert_eq!(entity.name, "Kitchen");
        assert_eq!(entity.percentage, Some(50));
        assert_eq!(entity.preset, None);
        assert_eq!(entity.is_on, Some(true));
        assert_eq!(entity.level(), 3);
        assert_eq!(entity.device_info.manufacturer, "SEC");
        assert_eq!(entity.device_info.name, "SEC Smart D42");
        assert_eq!(entity.preset_modes, vec!["boost", "humidity", "co2", "schedule", "sleep"]);
    }

    #[test]
    fn name_falls_back_to_area_number() {
        assert_eq!(display_name(area(4), None), "Area 4");
        assert_eq!(display_name(area(4), Some("   ")), "Area 4");
        assert_eq!(display_name(area(4), Some("Bath")), "Bath");
    }

    #[test]
    fn boost_shows_full_speed_with_preset() {
        let device = DeviceId::from("D");
        let entity =
            AreaEntity::from_record(&device, area(1), &record("Boost ventilation", None)).unwrap();
        assert_eq!(entity.percentage, Some(100));
        assert_eq!(entity.preset, Some(Preset::Boost));
    }

    #[test]
    fn off_and_unknown_modes() {
        let device = DeviceId::from("D");
        let off = AreaEntity::from_record(&device, area(1), &record("Fans off", None)).unwrap();
        assert_eq!(off.percentage, Some(0));
        assert_eq!(off.is_on, Some(false));
        assert_eq!(off.level(), 0);

        let odd = AreaEntity::from_record(&device, area(1), &record("Service", None)).unwrap();
        assert_eq!((odd.percentage, odd.preset, odd.is_on), (None, None, None));
    }

    #[test]
    fn inactive_and_absent_areas_are_not_exposed() {
        let device = DeviceId::from("D");
        let snap = snapshot(&[(1, "Manual 2"), (3, "INACTIVE"), (5, "inactive since 2023")]);

        let ids: Vec<u8> = exposed_entities(&device, &snap)
            .iter()
            .map(|e| e.area_id.get())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn blank_timers_are_hidden() {
        let device = DeviceId::from("D");
        for blank in [json!(""), json!([]), json!({})] {
            let mut rec = record("Timed program", None);
            rec.timers = Some(blank);
            let entity = AreaEntity::from_record(&device, area(1), &rec).unwrap();
            assert_eq!(entity.timers, None);
        }

        let mut rec = record("Timed program", None);
        rec.timers = Some(json!({ "mon": ["06:00-08:00"] }));
        let entity = AreaEntity::from_record(&device, area(1), &rec).unwrap();
        assert_eq!(entity.timers, Some(json!({ "mon": ["06:00-08:00"] })));
    }

    #[test]
    fn reconcile_emits_removals_then_adds() {
        let mut reconciler = EntityReconciler::new(DeviceId::from("D"));

        let first = reconciler.reconcile(&snapshot(&[(1, "Manual 1"), (2, "Snooze")]));
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|e| matches!(e, MembershipEvent::Added(_))));

        // Nothing changed: no events.
        assert!(reconciler.reconcile(&snapshot(&[(1, "Manual 4"), (2, "Snooze")])).is_empty());

        let next =
            reconciler.reconcile(&snapshot(&[(1, "Manual 4"), (2, "INACTIVE "), (3, "Fans off")]));
        assert_eq!(next.len(), 2);
        assert!(matches!(
            &next[0],
            MembershipEvent::Removed { unique_id, .. } if unique_id == "D_area2"
        ));
        assert!(matches!(&next[1], MembershipEvent::Added(e) if e.area_id == area(3)));

        let ids: Vec<u8> = reconciler.exposed().iter().map(|id| id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn reactivated_area_is_added_again() {
        let mut reconciler = EntityReconciler::new(DeviceId::from("D"));
        reconciler.reconcile(&snapshot(&[(4, "Manual 2")]));
        reconciler.reconcile(&snapshot(&[(4, "INACTIVE")]));
        let events = reconciler.reconcile(&snapshot(&[(4, "Humidity regulation")]));
        assert!(matches!(
            &events[..],
            [MembershipEvent::Added(e)] if e.preset == Some(Preset::Humidity)
        ));
    }
}
