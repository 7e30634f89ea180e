// ── Domain model ──
//
// Canonical types for devices, areas and cached snapshots.

pub mod area;

pub use area::{AreaId, AreaRecord, DeviceId, DeviceSnapshot};
