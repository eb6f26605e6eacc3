//! Bounding-hierarchy backend
//!
//! Broad phase: world-space bound distance for every non-adjacent proxy
//! pair, forwarding candidates within the report radius. Narrow phase: when
//! bounds touch, a triangle-sampled refinement decides whether the meshes
//! actually intersect and measures the separation when they do not. The
//! precise result is authoritative; the bound check is a reject-only
//! pre-filter, and a failed refinement falls back to the coarse result for
//! that pair alone.

use std::collections::HashMap;
use std::time::Instant;

use crate::collision::adjacency::AdjacencyGraph;
use crate::collision::pair::{DetectionMethod, PairKey, PairReading};
use crate::collision::primitives::{Aabb, Triangle};
use crate::collision::proxy::ProxySet;
use crate::scene::{KinematicModel, LinkId};

use super::DetectionBackend;

/// Triangle sampling budget per link for the precise pass.
const NARROW_SAMPLE_BUDGET: usize = 50;

/// Bound-overlap detection with sampled mesh refinement.
#[derive(Debug)]
pub struct BoundsBackend {
    report_distance: f32,
}

impl BoundsBackend {
    /// Create a backend that forwards pairs separated by at most
    /// `report_distance` (normally the largest configured warning ring).
    pub fn new(report_distance: f32) -> Self {
        Self {
            report_distance: report_distance.max(0.0),
        }
    }

    /// Triangle-accurate refinement for a pair whose bounds overlap.
    ///
    /// Returns `(distance, touching)`. Errors when either side contributes
    /// no sampled triangles; callers fall back to the coarse verdict.
    fn refine(
        tris_a: &[Triangle],
        tris_b: &[Triangle],
    ) -> Result<(f32, bool), RefineError> {
        if tris_a.is_empty() || tris_b.is_empty() {
            return Err(RefineError::NoGeometry);
        }

        for ta in tris_a {
            for tb in tris_b {
                if ta.intersects(tb) {
                    return Ok((0.0, true));
                }
            }
        }

        // No crossing: measure the closest approach between the samples.
        let mut best = f32::INFINITY;
        for ta in tris_a {
            for tb in tris_b {
                for v in [ta.a, ta.b, ta.c] {
                    best = best.min((tb.closest_point(v) - v).norm());
                }
                for v in [tb.a, tb.b, tb.c] {
                    best = best.min((ta.closest_point(v) - v).norm());
                }
            }
        }
        if best.is_finite() {
            Ok((best, false))
        } else {
            Err(RefineError::NoGeometry)
        }
    }
}

#[derive(Debug)]
enum RefineError {
    NoGeometry,
}

/// One-shot precise measurement of a single pair, ignoring adjacency and the
/// report radius. Returns None when either link has no proxy or no usable
/// sampled geometry.
pub fn measure_pair(
    model: &KinematicModel,
    proxies: &ProxySet,
    a: LinkId,
    b: LinkId,
) -> Option<PairReading> {
    let pa = proxies.get(a)?;
    let pb = proxies.get(b)?;
    let world_a = model.world_transform(a);
    let world_b = model.world_transform(b);
    let key = PairKey::new(a, b);

    let coarse = pa.world_bounds(world_a).distance_to(&pb.world_bounds(world_b));
    if coarse > 0.0 {
        return Some(PairReading {
            key,
            distance: coarse,
            touching: false,
            method: DetectionMethod::Bounds,
        });
    }

    let tris_a = pa.sampled_world_triangles(world_a, NARROW_SAMPLE_BUDGET);
    let tris_b = pb.sampled_world_triangles(world_b, NARROW_SAMPLE_BUDGET);
    let (distance, touching) = BoundsBackend::refine(&tris_a, &tris_b).ok()?;
    Some(PairReading {
        key,
        distance,
        touching,
        method: DetectionMethod::Mesh,
    })
}

impl DetectionBackend for BoundsBackend {
    fn scan(
        &mut self,
        model: &KinematicModel,
        proxies: &ProxySet,
        adjacency: &AdjacencyGraph,
        _now: Instant,
    ) -> Vec<PairReading> {
        // One transform per link per tick; the local structures are never
        // rebuilt here.
        let world_bounds: HashMap<LinkId, Aabb> = proxies
            .iter()
            .map(|proxy| {
                let world = model.world_transform(proxy.link());
                (proxy.link(), proxy.world_bounds(world))
            })
            .collect();

        let links: Vec<LinkId> = proxies.iter().map(|p| p.link()).collect();
        let mut readings = Vec::new();

        for (i, &a) in links.iter().enumerate() {
            for &b in &links[i + 1..] {
                if adjacency.is_excluded(a, b) {
                    continue;
                }
                let coarse_distance = world_bounds[&a].distance_to(&world_bounds[&b]);
                if coarse_distance > self.report_distance {
                    continue;
                }

                let key = PairKey::new(a, b);
                if coarse_distance > 0.0 {
                    // Bounds apart: the gap is a usable lower bound, no
                    // precise work needed.
                    readings.push(PairReading {
                        key,
                        distance: coarse_distance,
                        touching: false,
                        method: DetectionMethod::Bounds,
                    });
                    continue;
                }

                let tris_a = proxies.get(a).map_or_else(Vec::new, |p| {
                    p.sampled_world_triangles(model.world_transform(a), NARROW_SAMPLE_BUDGET)
                });
                let tris_b = proxies.get(b).map_or_else(Vec::new, |p| {
                    p.sampled_world_triangles(model.world_transform(b), NARROW_SAMPLE_BUDGET)
                });

                match Self::refine(&tris_a, &tris_b) {
                    Ok((distance, touching)) => readings.push(PairReading {
                        key,
                        distance,
                        touching,
                        method: DetectionMethod::Mesh,
                    }),
                    Err(_) => {
                        // Precise pass unusable for this pair; keep the
                        // coarse verdict and carry on with the others.
                        log::debug!(
                            "narrow refinement unavailable for {} / {}, using bound overlap",
                            model.link_name(a),
                            model.link_name(b)
                        );
                        readings.push(PairReading {
                            key,
                            distance: 0.0,
                            touching: true,
                            method: DetectionMethod::Bounds,
                        });
                    }
                }
            }
        }

        readings
    }

    fn reset(&mut self) {
        // Stateless between scans.
    }

    fn method(&self) -> DetectionMethod {
        DetectionMethod::Bounds
    }
}
