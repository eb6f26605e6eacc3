//! Kinematic contact world backend
//!
//! Each link gets a persistent box body sized once from its proxy bound,
//! shrunk by the configured margin with a floor for thin parts. Bodies never
//! simulate dynamics; every scan writes the live link poses into them and the
//! world advances on a fixed timestep, re-evaluating contacts with a
//! sweep-and-prune broad phase and an oriented-box separating-axis narrow
//! test. Contacts persist between steps, so a pair reads as touching until a
//! step actually observes it apart.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::collision::adjacency::AdjacencyGraph;
use crate::collision::pair::{DetectionMethod, PairKey, PairReading};
use crate::collision::proxy::{scaled_half_extents, ProxySet};
use crate::foundation::math::{decompose_world, transform_point, Mat3, Vec3};
use crate::foundation::time::FixedStep;
use crate::scene::{KinematicModel, LinkId};

use super::DetectionBackend;

/// Contact world step rate: 60 Hz, at most 3 catch-up substeps per scan.
const STEP: Duration = Duration::from_nanos(16_666_667);
const MAX_SUBSTEPS: u32 = 3;

/// Axis projections this close to equal count as touching, matching the
/// contact slop of a discrete collision world.
const SAT_SLOP: f32 = 1e-6;

/// One persistent box body mirroring a link's pose.
#[derive(Debug)]
struct ProxyBody {
    /// Sized at creation from the link's local bound; never rebuilt.
    base_half: Vec3,
    /// Local-space offset of the bound center from the link origin.
    local_center: Vec3,
    position: Vec3,
    rotation: Mat3,
    half: Vec3,
}

impl ProxyBody {
    fn new(base_half: Vec3, local_center: Vec3) -> Self {
        Self {
            base_half,
            local_center,
            position: Vec3::zeros(),
            rotation: Mat3::identity(),
            half: base_half,
        }
    }

    /// Copy the link's current world pose into the body.
    fn track(&mut self, world: &crate::foundation::math::Mat4) {
        let (_, rotation, scale) = decompose_world(world);
        self.position = transform_point(world, self.local_center);
        self.rotation = rotation;
        self.half = self.base_half.component_mul(&scale);
    }

    /// World-axis-aligned half widths of the oriented box.
    fn aabb_half(&self) -> Vec3 {
        self.rotation.abs() * self.half
    }
}

/// Radius of an oriented box projected onto a world-space axis.
fn projected_radius(body: &ProxyBody, axis: &Vec3) -> f32 {
    (0..3)
        .map(|i| (body.rotation.column(i).dot(axis) * body.half[i]).abs())
        .sum()
}

/// Oriented-box overlap via the 15-axis separating-axis test.
fn boxes_touch(a: &ProxyBody, b: &ProxyBody) -> bool {
    let delta = b.position - a.position;
    let a_axes: [Vec3; 3] = std::array::from_fn(|i| a.rotation.column(i).into_owned());
    let b_axes: [Vec3; 3] = std::array::from_fn(|i| b.rotation.column(i).into_owned());

    let separated_on = |axis: Vec3| {
        delta.dot(&axis).abs() > projected_radius(a, &axis) + projected_radius(b, &axis) + SAT_SLOP
    };

    for axis in a_axes {
        if separated_on(axis) {
            return false;
        }
    }
    for axis in b_axes {
        if separated_on(axis) {
            return false;
        }
    }
    for ai in a_axes {
        for bi in b_axes {
            let cross = ai.cross(&bi);
            // Near-parallel edge pairs yield a degenerate axis already
            // covered by the face axes.
            if cross.norm_squared() > 1e-10 && separated_on(cross.normalize()) {
                return false;
            }
        }
    }
    true
}

/// Persistent pose-driven contact world.
pub struct KinematicWorldBackend {
    margin: f32,
    min_half_extent: f32,
    bodies: BTreeMap<LinkId, ProxyBody>,
    contacts: BTreeSet<PairKey>,
    stepper: FixedStep,
}

impl KinematicWorldBackend {
    /// Create a world whose bodies are shrunk by `margin` with half-extents
    /// floored at `min_half_extent`.
    pub fn new(margin: f32, min_half_extent: f32) -> Self {
        Self {
            margin,
            min_half_extent,
            bodies: BTreeMap::new(),
            contacts: BTreeSet::new(),
            stepper: FixedStep::new(STEP, MAX_SUBSTEPS),
        }
    }

    /// Create bodies for new proxies, drop bodies whose proxy is gone, and
    /// write the live poses into all of them.
    fn sync_bodies(&mut self, model: &KinematicModel, proxies: &ProxySet) {
        self.bodies.retain(|link, _| proxies.get(*link).is_some());
        for proxy in proxies.iter() {
            let link = proxy.link();
            let body = self.bodies.entry(link).or_insert_with(|| {
                ProxyBody::new(
                    scaled_half_extents(proxy, self.margin, self.min_half_extent),
                    proxy.local_bounds().center(),
                )
            });
            body.track(model.world_transform(link));
        }
    }

    /// One contact re-evaluation against the current body poses.
    fn evaluate_contacts(&mut self, model: &KinematicModel, adjacency: &AdjacencyGraph) {
        // Sweep and prune along x: sort by interval start, only test pairs
        // whose x intervals actually overlap.
        let mut intervals: Vec<(LinkId, Vec3, Vec3)> = self
            .bodies
            .iter()
            .map(|(&link, body)| {
                let half = body.aabb_half();
                (link, body.position - half, body.position + half)
            })
            .collect();
        intervals.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

        let mut current = BTreeSet::new();
        for (i, &(a, a_min, a_max)) in intervals.iter().enumerate() {
            for &(b, b_min, b_max) in &intervals[i + 1..] {
                if b_min.x > a_max.x {
                    break;
                }
                if a_min.y > b_max.y
                    || b_min.y > a_max.y
                    || a_min.z > b_max.z
                    || b_min.z > a_max.z
                {
                    continue;
                }
                if adjacency.is_excluded(a, b) {
                    continue;
                }
                if boxes_touch(&self.bodies[&a], &self.bodies[&b]) {
                    current.insert(PairKey::new(a, b));
                }
            }
        }

        for &key in current.difference(&self.contacts) {
            let (a, b) = key.links();
            log::debug!(
                "kinematic world: contact begin {} / {}",
                model.link_name(a),
                model.link_name(b)
            );
        }
        for &key in self.contacts.difference(&current) {
            let (a, b) = key.links();
            log::debug!(
                "kinematic world: contact end {} / {}",
                model.link_name(a),
                model.link_name(b)
            );
        }
        self.contacts = current;
    }
}

impl std::fmt::Debug for KinematicWorldBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KinematicWorldBackend")
            .field("bodies", &self.bodies.len())
            .field("contacts", &self.contacts.len())
            .finish_non_exhaustive()
    }
}

impl DetectionBackend for KinematicWorldBackend {
    fn scan(
        &mut self,
        model: &KinematicModel,
        proxies: &ProxySet,
        adjacency: &AdjacencyGraph,
        now: Instant,
    ) -> Vec<PairReading> {
        self.sync_bodies(model, proxies);

        // Contacts change only on a step; between steps the previous set
        // stands. Substeps beyond the first see identical poses, so a single
        // re-evaluation per scan suffices.
        if self.stepper.advance(now) > 0 {
            self.evaluate_contacts(model, adjacency);
        }

        self.contacts
            .iter()
            .map(|&key| PairReading {
                key,
                distance: 0.0,
                touching: true,
                method: DetectionMethod::KinematicWorld,
            })
            .collect()
    }

    fn reset(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.stepper.reset();
    }

    fn method(&self) -> DetectionMethod {
        DetectionMethod::KinematicWorld
    }
}
