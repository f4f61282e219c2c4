//! # Mount registry
//!
//! Named attachment sites on the vehicle body, each holding at most one
//! part. Sensors use their site's [`LocalFrame`] to find their world pose.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::loc::{LocalFrame, Pose};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Definition of a mount site.
#[derive(Debug, Clone, Deserialize)]
pub struct MountSiteDef {
    pub name: String,

    #[serde(default)]
    pub frame: LocalFrame,
}

#[derive(Debug, Clone)]
struct MountSite<P> {
    frame: LocalFrame,
    part: Option<P>,
}

/// Registry of mount sites and the parts mounted on them.
#[derive(Debug, Clone)]
pub struct MountRegistry<P> {
    sites: BTreeMap<String, MountSite<P>>,

    /// Maximum number of parts mounted at once.
    capacity: usize,

    num_mounted: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of a mount or unmount request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum MountResult {
    Success,
    FailedInvalidSite,
    FailedAlreadyOccupied,
    FailedCapacityExceeded,
    UnmountSuccess,
    UnmountFailedNoPart,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P> MountRegistry<P> {
    pub fn new<I>(sites: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = MountSiteDef>,
    {
        let sites = sites
            .into_iter()
            .map(|d| {
                (
                    d.name,
                    MountSite {
                        frame: d.frame,
                        part: None,
                    },
                )
            })
            .collect();

        Self {
            sites,
            capacity,
            num_mounted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_mounted(&self) -> usize {
        self.num_mounted
    }

    pub fn site_names(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self, site: &str) -> Option<bool> {
        self.sites.get(site).map(|s| s.part.is_none())
    }

    pub fn get(&self, site: &str) -> Option<&P> {
        self.sites.get(site).and_then(|s| s.part.as_ref())
    }

    pub fn get_mut(&mut self, site: &str) -> Option<&mut P> {
        self.sites.get_mut(site).and_then(|s| s.part.as_mut())
    }

    /// Mount a part on a site.
    ///
    /// On failure the part is handed back alongside the reason.
    pub fn mount(&mut self, site: &str, part: P) -> Result<MountResult, (MountResult, P)> {
        let capacity = self.capacity;
        let num_mounted = self.num_mounted;

        let entry = match self.sites.get_mut(site) {
            Some(s) => s,
            None => return Err((MountResult::FailedInvalidSite, part)),
        };

        if entry.part.is_some() {
            return Err((MountResult::FailedAlreadyOccupied, part));
        }
        if num_mounted >= capacity {
            return Err((MountResult::FailedCapacityExceeded, part));
        }

        entry.part = Some(part);
        self.num_mounted += 1;
        debug!("Mounted part on {}", site);

        Ok(MountResult::Success)
    }

    /// Remove the part from a site, returning it on success.
    pub fn unmount(&mut self, site: &str) -> (MountResult, Option<P>) {
        let entry = match self.sites.get_mut(site) {
            Some(s) => s,
            None => return (MountResult::FailedInvalidSite, None),
        };

        match entry.part.take() {
            Some(part) => {
                self.num_mounted = self.num_mounted.saturating_sub(1);
                debug!("Unmounted part from {}", site);
                (MountResult::UnmountSuccess, Some(part))
            }
            None => (MountResult::UnmountFailedNoPart, None),
        }
    }

    pub fn frame(&self, site: &str) -> Option<&LocalFrame> {
        self.sites.get(site).map(|s| &s.frame)
    }

    /// World pose of a site given the vehicle pose.
    pub fn world_pose(&self, site: &str, vehicle: &Pose) -> Option<Pose> {
        self.frame(site).map(|f| f.world_pose(vehicle))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn registry(capacity: usize) -> MountRegistry<&'static str> {
        MountRegistry::new(
            vec![
                MountSiteDef {
                    name: "front".into(),
                    frame: LocalFrame::new(1.0, 0.0, 0.0),
                },
                MountSiteDef {
                    name: "left".into(),
                    frame: LocalFrame::new(0.0, 0.5, FRAC_PI_2),
                },
            ],
            capacity,
        )
    }

    #[test]
    fn test_mount_results() {
        let mut reg = registry(1);

        assert_eq!(reg.mount("front", "lidar"), Ok(MountResult::Success));
        assert_eq!(
            reg.mount("front", "radar"),
            Err((MountResult::FailedAlreadyOccupied, "radar"))
        );
        assert_eq!(
            reg.mount("rear", "radar"),
            Err((MountResult::FailedInvalidSite, "radar"))
        );
        assert_eq!(
            reg.mount("left", "radar"),
            Err((MountResult::FailedCapacityExceeded, "radar"))
        );
        assert_eq!(reg.get("front"), Some(&"lidar"));

        assert_eq!(
            reg.unmount("front"),
            (MountResult::UnmountSuccess, Some("lidar"))
        );
        assert_eq!(reg.unmount("front"), (MountResult::UnmountFailedNoPart, None));
        assert_eq!(reg.unmount("rear"), (MountResult::FailedInvalidSite, None));
        assert_eq!(reg.num_mounted(), 0);
    }

    #[test]
    fn test_world_pose() {
        let reg = registry(2);
        let vehicle = Pose::new(2.0, 3.0, FRAC_PI_2);

        let front = reg.world_pose("front", &vehicle).unwrap();
        assert!((front.x() - 2.0).abs() < 1e-12);
        assert!((front.y() - 4.0).abs() < 1e-12);

        let left = reg.world_pose("left", &vehicle).unwrap();
        assert!((left.x() - 1.5).abs() < 1e-12);
        assert!((left.y() - 3.0).abs() < 1e-12);
        assert!((left.heading().abs() - std::f64::consts::PI).abs() < 1e-12);

        assert!(reg.world_pose("rear", &vehicle).is_none());
    }
}
