//! Reference driver: the single-threaded, synchronous scheduler that wires
//! together a [`Mapper`](mapper::Mapper) and a `TcaffManager` per neighbor
//! for each robot in a run, honoring independent mapping and alignment
//! cadences. It owns no background tasks — `step(t)` does all the work for
//! one logical clock tick and returns.

pub mod config;

pub use config::{Config, Error, RunConfig};

use std::collections::BTreeMap;

use nalgebra::Isometry3;

use align_core::{Detection, DetectionSource, MapProvider, MapSnapshot, PoseLookupError, PoseSource, Se2, Time};
use mapper::Mapper;
use tcaff::{TcaffManager, TreeState};

struct RobotState {
    mapper: Mapper,
    neighbors: BTreeMap<String, TcaffManager>,
    last_map_tick: Option<Time>,
    last_align_tick: Option<Time>,
    snapshot: MapSnapshot,
    outputs: BTreeMap<String, Option<Se2>>,
}

/// Exposes every robot's latest snapshot by name, routed through the
/// `MapProvider` interface rather than direct field access: the neighbor
/// exchange this driver does in-process is the same lookup an out-of-process
/// driver would do over a network, just without the latency.
struct RobotMapProvider<'a> {
    robots: &'a BTreeMap<String, RobotState>,
}

impl MapProvider for RobotMapProvider<'_> {
    fn snapshot(&self, name: &str) -> Option<MapSnapshot> {
        self.robots.get(name).map(|r| r.snapshot.clone())
    }
}

/// Owns every robot's mapper and per-neighbor TCAFF filters, plus the
/// pose/detection sources that feed them. Implements the neighbor map
/// exchange internally: each robot's latest snapshot is visible to every
/// other robot's registration step, one `ts_align` period stale at worst.
pub struct Driver {
    config: Config,
    robots: BTreeMap<String, RobotState>,
    pose_sources: BTreeMap<String, Box<dyn PoseSource>>,
    detection_sources: BTreeMap<String, Box<dyn DetectionSource>>,
    t: Time,
}

impl Driver {
    pub fn new(
        config: Config,
        pose_sources: BTreeMap<String, Box<dyn PoseSource>>,
        detection_sources: BTreeMap<String, Box<dyn DetectionSource>>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let mut robots = BTreeMap::new();
        for name in &config.run.robots {
            let mapper = Mapper::new(config.mapping).map_err(|e| match e {
                mapper::Error::Config(c) => Error::Mapping(c),
            })?;
            let mut neighbors = BTreeMap::new();
            for other in &config.run.robots {
                if other != name {
                    let tcaff_manager = TcaffManager::new(config.tcaff)?;
                    neighbors.insert(other.clone(), tcaff_manager);
                }
            }
            robots.insert(
                name.clone(),
                RobotState {
                    mapper,
                    neighbors,
                    last_map_tick: None,
                    last_align_tick: None,
                    snapshot: MapSnapshot { t: config.run.t_start, landmarks: Vec::new() },
                    outputs: BTreeMap::new(),
                },
            );
        }

        Ok(Self { config, robots, pose_sources, detection_sources, t: config.run.t_start })
    }

    pub fn t(&self) -> Time {
        self.t
    }

    /// Advance every robot by one logical clock tick: interpolate poses,
    /// ingest detections at `ts_map` cadence, then at `ts_align` cadence
    /// snapshot, register against every neighbor, and feed TCAFF.
    pub fn step(&mut self, t: Time) {
        self.t = t;
        let ts_map = self.config.mapping.ts_map;
        let ts_align = self.config.tcaff.ts_align;

        let names: Vec<String> = self.robots.keys().cloned().collect();

        for name in &names {
            let due = match self.robots[name].last_map_tick {
                None => true,
                Some(last) => t - last >= ts_map,
            };
            if !due {
                continue;
            }
            let pose = match self.pose_sources.get(name).map(|s| s.pose(t)) {
                Some(Ok(pose)) => pose,
                Some(Err(PoseLookupError { query_t })) => {
                    tracing::warn!(robot = name.as_str(), query_t, "no pose at this tick, skipping ingest");
                    continue;
                }
                None => Isometry3::identity(),
            };
            let detections: Vec<Detection> =
                self.detection_sources.get(name).map(|s| s.detections(t)).unwrap_or_default();
            let t_bc = self.config.run.t_bc_for(name);

            let robot = self.robots.get_mut(name).unwrap();
            robot.mapper.ingest(t, &(pose * t_bc), &detections);
            robot.last_map_tick = Some(t);
            robot.snapshot = robot.mapper.snapshot(t);
        }

        for name in &names {
            let due = match self.robots[name].last_align_tick {
                None => true,
                Some(last) => t - last >= ts_align,
            };
            if !due {
                continue;
            }
            let own_snapshot = self.robots[name].snapshot.clone();
            let neighbor_names: Vec<String> = self.robots[name].neighbors.keys().cloned().collect();

            for neighbor in &neighbor_names {
                let neighbor_snapshot = RobotMapProvider { robots: &self.robots }
                    .snapshot(neighbor)
                    .unwrap_or_else(|| MapSnapshot { t, landmarks: Vec::new() });
                let candidates =
                    registration::register(&own_snapshot.landmarks, &neighbor_snapshot.landmarks, &self.config.registration);
                let robot = self.robots.get_mut(name).unwrap();
                let output = robot.neighbors.get_mut(neighbor).unwrap().tick(&candidates);
                robot.outputs.insert(neighbor.clone(), output);
            }
            self.robots.get_mut(name).unwrap().last_align_tick = Some(t);
        }
    }

    pub fn transform(&self, robot: &str, neighbor: &str) -> Option<Se2> {
        self.robots.get(robot)?.outputs.get(neighbor).copied().flatten()
    }

    pub fn tree_state(&self, robot: &str, neighbor: &str) -> Option<TreeState> {
        Some(self.robots.get(robot)?.neighbors.get(neighbor)?.tree_state())
    }

    pub fn snapshot(&self, robot: &str) -> Option<&MapSnapshot> {
        self.robots.get(robot).map(|r| &r.snapshot)
    }
}
