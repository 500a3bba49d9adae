//! Accessory registry and the per-cycle reconciliation.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use serde::Serialize;

use crate::accessory::Accessory;
use crate::config::BridgeConfig;
use crate::identity::AccessoryIdentity;
use crate::kind::DeviceKind;
use crate::snapshot::{DeviceList, DeviceSnapshot};
use crate::surface::{Characteristic, ControlSurface, UpdateValue};
use crate::throttle::UpdateThrottle;

/// Outcome of one reconciliation cycle. Identifier lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Newly registered accessories.
    pub added: Vec<String>,
    /// Accessories unregistered because their device disappeared.
    pub removed: Vec<String>,
    /// Accessories whose snapshot was applied.
    pub updated: Vec<String>,
    /// Accessories whose snapshot the throttle held back.
    pub suppressed: Vec<String>,
    /// Unsupported or ignored devices.
    pub skipped: Vec<String>,
}

impl ReconcileReport {
    fn sort(&mut self) {
        for list in [
            &mut self.added,
            &mut self.removed,
            &mut self.updated,
            &mut self.suppressed,
            &mut self.skipped,
        ] {
            list.sort();
        }
    }
}

/// Follow-up work of a cycle that needs the cloud client.
#[derive(Debug, Default)]
pub(crate) struct ReconcilePlan {
    pub report: ReconcileReport,
    /// `(device_id, topic)` pairs to subscribe.
    pub subscribe: Vec<(String, String)>,
    pub unsubscribe: Vec<String>,
    /// Accessories left in the applying state, to be closed by `finish`.
    pub applying: Vec<String>,
    pub timestamp: u64,
}

/// All accessories the bridge currently exposes, keyed by device identifier.
#[derive(Debug)]
pub struct Registry {
    accessories: HashMap<String, Accessory>,
    throttle: UpdateThrottle,
}

impl Registry {
    pub fn new(throttle: UpdateThrottle) -> Self {
        Registry {
            accessories: HashMap::new(),
            throttle,
        }
    }

    pub fn len(&self) -> usize {
        self.accessories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessories.is_empty()
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.accessories.contains_key(device_id)
    }

    pub fn get(&self, device_id: &str) -> Option<&Accessory> {
        self.accessories.get(device_id)
    }

    pub fn get_mut(&mut self, device_id: &str) -> Option<&mut Accessory> {
        self.accessories.get_mut(device_id)
    }

    /// Device identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.accessories.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Take back an accessory the host persisted.
    ///
    /// Returns `true` when a record was created. Identities that no longer
    /// classify are unregistered from the host.
    pub fn restore<S: ControlSurface>(
        &mut self,
        identity: AccessoryIdentity,
        config: &BridgeConfig,
        surface: &S,
    ) -> bool {
        if self.contains(identity.device_id()) {
            debug!("accessory {} already known", identity.device_id());
            return false;
        }
        let Some(kind) = DeviceKind::classify(identity.type_code(), identity.product_code()) else {
            info!(
                "dropping restored accessory {} ({}/{})",
                identity.device_id(),
                identity.type_code(),
                identity.product_code()
            );
            surface.unregister_accessory(&identity);
            return false;
        };

        info!("restored {kind} {} ({})", identity.device_id(), identity.name());
        let device_id = identity.device_id().to_string();
        self.accessories
            .insert(device_id, Accessory::new(identity, kind, config.pair_timeout));
        true
    }

    /// Reconcile the registry against one poll cycle.
    ///
    /// Runs without awaiting: registrations, removals and characteristic
    /// updates happen here, subscriptions are returned in the plan.
    pub(crate) fn reconcile<S: ControlSurface>(
        &mut self,
        list: &DeviceList,
        config: &BridgeConfig,
        surface: &S,
    ) -> ReconcilePlan {
        let mut plan = ReconcilePlan {
            timestamp: list.ts,
            ..ReconcilePlan::default()
        };
        let mut seen = HashSet::new();

        for snapshot in list.devices() {
            let device_id = snapshot.device_id();
            let attrs = &snapshot.attributes;

            if config.is_ignored(snapshot) {
                info!("ignoring {device_id} ({}) by configuration", attrs.type_code);
                plan.report.skipped.push(device_id.to_string());
                continue;
            }
            let Some(kind) = DeviceKind::classify(&attrs.type_code, &attrs.product_code) else {
                info!(
                    "unsupported device {device_id} ({}/{})",
                    attrs.type_code, attrs.product_code
                );
                plan.report.skipped.push(device_id.to_string());
                continue;
            };
            if !seen.insert(device_id.to_string()) {
                warn!("device {device_id} listed twice, keeping the first entry");
                continue;
            }

            match self.matching_mut(snapshot) {
                Some(existing) => {
                    if existing.identity_mut().refresh(snapshot) {
                        info!("{device_id} renamed to {}", attrs.name);
                        surface.update_characteristic(
                            existing.uuid(),
                            Characteristic::Name,
                            UpdateValue::value(attrs.name.as_str()),
                        );
                    }
                }
                None => {
                    let identity = AccessoryIdentity::from_snapshot(snapshot);
                    info!("adding {kind} {device_id} ({})", identity.name());
                    surface.register_accessory(&identity, &kind.characteristics());
                    plan.report.added.push(device_id.to_string());
                    self.accessories.insert(
                        device_id.to_string(),
                        Accessory::new(identity, kind, config.pair_timeout),
                    );
                }
            }
            let Some(accessory) = self
                .accessories
                .get_mut(snapshot.device_id())
                .filter(|accessory| accessory.identity().matches(snapshot))
            else {
                continue;
            };

            if !self.throttle.should_apply(&accessory.sync, list.ts) {
                debug!("throttled snapshot of {device_id} at {}", list.ts);
                plan.report.suppressed.push(device_id.to_string());
                continue;
            }
            self.throttle.begin(&mut accessory.sync);

            if !snapshot.is_online() {
                warn!("{device_id} is offline");
            }
            let uuid = accessory.uuid();
            for (characteristic, value) in accessory.apply_snapshot(snapshot) {
                debug!("{device_id}: {characteristic} <- {value:?}");
                surface.update_characteristic(uuid, characteristic, value);
            }

            if snapshot.is_online() && !accessory.subscribed {
                if let Some(topic) = accessory.push_topic() {
                    plan.subscribe.push((device_id.to_string(), topic));
                }
            }
            plan.applying.push(device_id.to_string());
            plan.report.updated.push(device_id.to_string());
        }

        let stale: Vec<String> = self
            .accessories
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for device_id in stale {
            let Some(accessory) = self.accessories.remove(&device_id) else {
                continue;
            };
            info!("removing {device_id} ({})", accessory.identity().name());
            surface.unregister_accessory(accessory.identity());
            if accessory.subscribed {
                if let Some(topic) = accessory.push_topic() {
                    plan.unsubscribe.push(topic);
                }
            }
            plan.report.removed.push(device_id);
        }

        plan.report.sort();
        plan
    }

    /// Record matched by `snapshot`'s identity.
    fn matching_mut(&mut self, snapshot: &DeviceSnapshot) -> Option<&mut Accessory> {
        self.accessories
            .get_mut(snapshot.device_id())
            .filter(|accessory| accessory.identity().matches(snapshot))
    }

    /// Reopen accessories whose cycle was dropped before `finish`.
    ///
    /// The last applied timestamp is left as it was.
    pub(crate) fn abandon(&mut self, device_ids: &[String]) {
        for device_id in device_ids {
            if let Some(accessory) = self.accessories.get_mut(device_id) {
                debug!("releasing {device_id} from an unfinished cycle");
                self.throttle.abandon(&mut accessory.sync);
            }
        }
    }

    /// Close the applies opened by `reconcile`.
    pub(crate) fn finish(&mut self, applying: &[String], subscribed: &[String], timestamp: u64) {
        for device_id in applying {
            // removed by an overlapping cycle in the meantime
            let Some(accessory) = self.accessories.get_mut(device_id) else {
                continue;
            };
            if subscribed.contains(device_id) {
                accessory.subscribed = true;
            }
            self.throttle.finish(&mut accessory.sync, timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{RecordingSurface, SurfaceEvent};

    fn white(id: &str) -> DeviceSnapshot {
        DeviceSnapshot::new(id, id, "light", "E11-G13").with_power(true)
    }

    fn color(id: &str) -> DeviceSnapshot {
        DeviceSnapshot::new(id, id, "wifielement", "W21-N13").with_power(true)
    }

    fn cycle(
        registry: &mut Registry,
        surface: &RecordingSurface,
        ts: u64,
        devices: Vec<DeviceSnapshot>,
    ) -> ReconcilePlan {
        let plan = registry.reconcile(&DeviceList::new(ts, devices), &BridgeConfig::new(), surface);
        let subscribed: Vec<String> = plan.subscribe.iter().map(|(id, _)| id.clone()).collect();
        registry.finish(&plan.applying, &subscribed, plan.timestamp);
        plan
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();

        let first = cycle(&mut registry, &surface, 10_000, vec![white("A"), color("B")]);
        assert_eq!(first.report.added, vec!["A", "B"]);
        assert_eq!(first.subscribe, vec![("B".to_string(), "wifielement/B/status".to_string())]);

        surface.take();
        let second = cycle(&mut registry, &surface, 20_000, vec![white("A"), color("B")]);
        assert!(second.report.added.is_empty());
        assert!(second.report.removed.is_empty());
        assert!(second.subscribe.is_empty());
        assert!(surface.registered().is_empty());
        assert!(surface.unregistered().is_empty());
        assert_eq!(registry.ids(), vec!["A", "B"]);
    }

    #[test]
    fn test_vanished_devices_are_removed_once() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();

        cycle(&mut registry, &surface, 10_000, vec![white("A"), color("B")]);
        let plan = cycle(&mut registry, &surface, 20_000, vec![white("A"), white("C")]);
        assert_eq!(plan.report.removed, vec!["B"]);
        assert_eq!(plan.unsubscribe, vec!["wifielement/B/status"]);

        cycle(&mut registry, &surface, 30_000, vec![white("A"), white("C")]);
        assert_eq!(surface.unregistered(), vec!["B"]);
        assert_eq!(registry.ids(), vec!["A", "C"]);
    }

    #[test]
    fn test_unsupported_and_ignored_are_skipped() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        let config = BridgeConfig::new().ignore_device("IGN");

        let gateway = DeviceSnapshot::new("GW", "Hub", "S1Gateway", "E39-G8");
        let list = DeviceList::new(1, vec![gateway.clone(), white("IGN"), white("A")]);
        let plan = registry.reconcile(&list, &config, &surface);
        assert_eq!(plan.report.skipped, vec!["GW", "IGN"]);
        assert_eq!(surface.registered(), vec!["A"]);

        let plan = registry.reconcile(&DeviceList::new(5_000, vec![gateway]), &config, &surface);
        assert_eq!(plan.report.removed, vec!["A"]);
        assert_eq!(surface.unregistered(), vec!["A"]);
    }

    #[test]
    fn test_throttle_and_applying_guard() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        cycle(&mut registry, &surface, 10_000, vec![white("A")]);

        let plan = cycle(&mut registry, &surface, 10_999, vec![white("A")]);
        assert_eq!(plan.report.suppressed, vec!["A"]);

        // an unfinished apply blocks the next cycle for that record
        let open = registry.reconcile(
            &DeviceList::new(20_000, vec![white("A")]),
            &BridgeConfig::new(),
            &surface,
        );
        assert_eq!(open.report.updated, vec!["A"]);
        let overlapping = registry.reconcile(
            &DeviceList::new(30_000, vec![white("A")]),
            &BridgeConfig::new(),
            &surface,
        );
        assert_eq!(overlapping.report.suppressed, vec!["A"]);

        registry.finish(&open.applying, &[], open.timestamp);
        assert_eq!(registry.get("A").unwrap().sync_state().last_timestamp(), Some(20_000));
    }

    #[test]
    fn test_abandoned_cycle_releases_records() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        cycle(&mut registry, &surface, 10_000, vec![white("A")]);

        let dropped = registry.reconcile(
            &DeviceList::new(20_000, vec![white("A")]),
            &BridgeConfig::new(),
            &surface,
        );
        assert!(registry.get("A").unwrap().sync_state().is_applying());

        registry.abandon(&dropped.applying);
        let sync = registry.get("A").unwrap().sync_state();
        assert!(!sync.is_applying());
        assert_eq!(sync.last_timestamp(), Some(10_000));

        let plan = cycle(&mut registry, &surface, 30_000, vec![white("A")]);
        assert_eq!(plan.report.updated, vec!["A"]);
    }

    #[test]
    fn test_offline_cycle_updates() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        cycle(&mut registry, &surface, 10_000, vec![white("A")]);
        surface.take();

        let plan = cycle(
            &mut registry,
            &surface,
            20_000,
            vec![white("A").with_online(false).with_brightness(10.0)],
        );
        assert!(plan.subscribe.is_empty());
        assert_eq!(surface.updates(), vec![(Characteristic::On, UpdateValue::NoResponse)]);
    }

    #[test]
    fn test_offline_color_light_is_not_subscribed() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();

        let plan = cycle(&mut registry, &surface, 10_000, vec![color("B").with_online(false)]);
        assert!(plan.subscribe.is_empty());
        assert!(!registry.get("B").unwrap().is_subscribed());

        let plan = cycle(&mut registry, &surface, 20_000, vec![color("B")]);
        assert_eq!(plan.subscribe.len(), 1);
        assert!(registry.get("B").unwrap().is_subscribed());
    }

    #[test]
    fn test_rename_updates_name() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        cycle(&mut registry, &surface, 10_000, vec![white("A")]);
        surface.take();

        let renamed = DeviceSnapshot::new("A", "Porch", "light", "E11-G13");
        cycle(&mut registry, &surface, 10_500, vec![renamed]);

        let events = surface.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SurfaceEvent::Updated { characteristic: Characteristic::Name, value, .. }
                if *value == UpdateValue::value("Porch")
        ));
        assert_eq!(registry.get("A").unwrap().identity().name(), "Porch");
    }

    #[test]
    fn test_model_change_keeps_the_record() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        cycle(&mut registry, &surface, 10_000, vec![white("A")]);
        let uuid = registry.get("A").unwrap().uuid();
        surface.take();

        let swapped = DeviceSnapshot::new("A", "A", "light", "Z01-A19NAE26").with_power(true);
        let plan = cycle(&mut registry, &surface, 20_000, vec![swapped]);
        assert!(plan.report.added.is_empty());
        assert!(plan.report.removed.is_empty());
        assert!(surface.registered().is_empty());

        let accessory = registry.get("A").unwrap();
        assert_eq!(accessory.uuid(), uuid);
        assert_eq!(accessory.identity().product_code(), "Z01-A19NAE26");
    }

    #[test]
    fn test_duplicate_listing_creates_one_record() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        let plan = cycle(&mut registry, &surface, 10_000, vec![white("A"), white("A")]);
        assert_eq!(plan.report.added, vec!["A"]);
        assert_eq!(surface.registered(), vec!["A"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_restore() {
        let mut registry = Registry::new(UpdateThrottle::default());
        let surface = RecordingSurface::default();
        let config = BridgeConfig::new();

        let known = AccessoryIdentity::new("A", "light", "E11-G13", "Hall");
        assert!(registry.restore(known.clone(), &config, &surface));
        assert!(!registry.restore(known, &config, &surface));
        assert!(!registry.restore(AccessoryIdentity::new("GW", "S1Gateway", "E39-G8", "Hub"), &config, &surface));
        assert_eq!(surface.unregistered(), vec!["GW"]);
        assert!(surface.registered().is_empty());

        // a restored accessory is matched, not re-registered
        let plan = cycle(&mut registry, &surface, 10_000, vec![white("A")]);
        assert!(plan.report.added.is_empty());
        assert_eq!(plan.report.updated, vec!["A"]);
    }
}
