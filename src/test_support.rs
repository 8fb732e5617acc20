use crate::config::Config;
use crate::context::StoreContext;
use crate::locations::{Location, LocationKind, Registry};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

/// Create a store with a small warehouse tree:
///
/// ```text
/// MAIN            building
/// └── Z-A         zone
///     ├── R-11    rack
///     └── R-12    rack
///         └── R-12-S1  shelf
/// ```
pub(crate) fn create_test_store() -> (TempDir, StoreContext) {
    let temp_dir = TempDir::new().unwrap();
    let ctx = StoreContext::at(temp_dir.path());
    std::fs::create_dir_all(&ctx.store_dir).unwrap();

    let mut registry = Registry::default();
    registry
        .add(Location::new("MAIN", "Main warehouse", LocationKind::Building))
        .unwrap();
    registry
        .add(Location::new("Z-A", "Zone A", LocationKind::Zone).with_parent("MAIN"))
        .unwrap();
    registry
        .add(
            Location::new("R-11", "Rack 11", LocationKind::Rack)
                .with_code("A-R11")
                .with_parent("Z-A"),
        )
        .unwrap();
    registry
        .add(
            Location::new("R-12", "Rack 12", LocationKind::Rack)
                .with_code("A-R12")
                .with_parent("Z-A"),
        )
        .unwrap();
    registry
        .add(Location::new("R-12-S1", "Rack 12 shelf 1", LocationKind::Shelf).with_parent("R-12"))
        .unwrap();
    registry.save(&ctx).unwrap();

    (temp_dir, ctx)
}

/// Config with the given lease and a short mutex wait so contention tests stay fast.
pub(crate) fn test_config(lease_minutes: u32) -> Config {
    Config {
        lease_minutes,
        store_mutex_wait_ms: 2_000,
        ..Config::default()
    }
}

/// A fixed instant on the test day.
pub(crate) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
}
