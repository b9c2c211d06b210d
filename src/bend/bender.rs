use std::collections::HashMap;

use bevy::{
    mesh::{Indices, Mesh, PrimitiveTopology},
    prelude::*,
};

use crate::error::{BendError, BendResult};
use crate::spline::{CurveSample, Spline};

use super::source::SourceMesh;

/// How the template's finite span fills the target interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Default)]
pub enum FillMode {
    /// One copy, bent from the interval start.
    #[default]
    Once,
    /// As many whole copies as fit the interval, laid end to end.
    Repeat,
    /// One copy, scaled along the bend axis to span the whole interval.
    Stretch,
}

/// How texture coordinates react to the filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Default)]
pub enum UvMode {
    /// Template UVs pass through unchanged per copy.
    #[default]
    Repeat,
    /// U grows with world distance, so chained benders share one
    /// continuous texture space through their U offsets.
    Extend,
    /// U is normalized so the texture exactly fits the interval.
    Stretch,
}

/// What part of the spline a bender deforms onto.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum BendTarget {
    /// A single curve of the spline.
    Curve {
        /// Index of the curve in the spline's chain.
        index: usize,
    },
    /// A distance range along the whole spline.
    Interval {
        /// Start distance from the spline start.
        start: f32,
        /// End distance; zero means "to the spline end".
        end: f32,
    },
}

impl Default for BendTarget {
    fn default() -> Self {
        Self::Interval {
            start: 0.0,
            end: 0.0,
        }
    }
}

/// Output buffers of one bend pass.
///
/// Colors are only written for [`FillMode::Once`], where they carry the
/// world-space sample location each vertex was bent onto.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BentMesh {
    /// Bent vertex positions.
    pub positions: Vec<Vec3>,
    /// Bent vertex normals.
    pub normals: Vec<Vec3>,
    /// Vertex texture coordinates after the UV policy.
    pub uvs: Vec<Vec2>,
    /// Per-vertex sample locations, or empty when not produced.
    pub colors: Vec<[f32; 4]>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl BentMesh {
    /// Number of vertices in the buffers.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in the index list.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Upload the buffers into a renderable mesh.
    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs.clone());
        if !self.colors.is_empty() {
            mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors.clone());
        }
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

/// The deformation driver.
///
/// Holds the template, the target, and the fill/UV configuration, and turns
/// them into bent buffers on demand. Setters only record changes; nothing is
/// recomputed until [`compute_if_needed`](Self::compute_if_needed), so any
/// number of edits between two checkpoints costs one rebuild. Samples are
/// cached per distinct bend distance within a pass, which collapses the many
/// vertices sharing an X coordinate in typical templates into one spline
/// lookup each.
#[derive(Debug, Clone, Default)]
pub struct MeshBender {
    source: Option<SourceMesh>,
    target: BendTarget,
    fill_mode: FillMode,
    uv_mode: UvMode,
    u_offset: f32,
    dirty: bool,
    last_revision: Option<u64>,
    sample_cache: HashMap<u32, CurveSample>,
}

impl MeshBender {
    /// Create an unconfigured bender.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current template, if one is assigned.
    pub fn source(&self) -> Option<&SourceMesh> {
        self.source.as_ref()
    }

    /// Assign the template mesh.
    pub fn set_source(&mut self, source: SourceMesh) {
        if self.source.as_ref() == Some(&source) {
            return;
        }
        self.source = Some(source);
        self.dirty = true;
    }

    /// The current target.
    pub fn target(&self) -> BendTarget {
        self.target
    }

    /// Aim the bender at a curve or an interval, replacing the previous
    /// target.
    pub fn set_target(&mut self, target: BendTarget) {
        if self.target == target {
            return;
        }
        self.target = target;
        self.dirty = true;
    }

    /// The current fill mode.
    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    /// Change the fill mode.
    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        if self.fill_mode == fill_mode {
            return;
        }
        self.fill_mode = fill_mode;
        self.dirty = true;
    }

    /// The current UV mode.
    pub fn uv_mode(&self) -> UvMode {
        self.uv_mode
    }

    /// Change the UV mode.
    pub fn set_uv_mode(&mut self, uv_mode: UvMode) {
        if self.uv_mode == uv_mode {
            return;
        }
        self.uv_mode = uv_mode;
        self.dirty = true;
    }

    /// The current U offset.
    pub fn u_offset(&self) -> f32 {
        self.u_offset
    }

    /// Change the U offset chaining this bender's UVs after another's.
    pub fn set_u_offset(&mut self, u_offset: f32) {
        if self.u_offset == u_offset {
            return;
        }
        self.u_offset = u_offset;
        self.dirty = true;
    }

    /// Force a rebuild at the next checkpoint, e.g. after retargeting to a
    /// different spline whose revision counter is unrelated.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the next checkpoint will rebuild regardless of the spline.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The per-tick checkpoint: rebuild if any setter changed state or the
    /// spline's revision moved since the last rebuild, otherwise do nothing.
    pub fn compute_if_needed(&mut self, spline: &Spline) -> BendResult<Option<BentMesh>> {
        if !self.dirty && self.last_revision == Some(spline.revision()) {
            return Ok(None);
        }
        let bent = self.compute(spline)?;
        self.dirty = false;
        self.last_revision = Some(spline.revision());
        Ok(Some(bent))
    }

    /// Unconditionally bend the template onto the spline.
    pub fn compute(&mut self, spline: &Spline) -> BendResult<BentMesh> {
        let source = self.source.as_ref().ok_or(BendError::NoSource)?;
        let (curve_index, interval_start, interval_length) = resolve_target(self.target, spline)?;

        self.sample_cache.clear();
        let mut sampler = Sampler {
            spline,
            curve_index,
            interval_start,
            cache: &mut self.sample_cache,
        };
        let uv_policy = UvPolicy {
            uv_mode: self.uv_mode,
            fill_mode: self.fill_mode,
            u_offset: self.u_offset,
            interval_length,
            source_length: source.length(),
        };

        let mut bent = BentMesh::default();
        match self.fill_mode {
            FillMode::Once => {
                bent.indices = source.triangles().to_vec();
                for vertex in source.vertices() {
                    let distance = vertex.position.x - source.min_x();
                    let sample = sampler.sample(distance)?;
                    let (position, normal) = if sample.tangent == Vec3::ZERO {
                        // Pathological handle configuration: leave the
                        // vertex where the template put it.
                        (vertex.position, vertex.normal)
                    } else {
                        sample.bend_vertex(vertex.position, vertex.normal)
                    };
                    bent.positions.push(position);
                    bent.normals.push(normal);
                    bent.uvs.push(uv_policy.apply(vertex.uv, 0, 1));
                    bent.colors.push([
                        sample.location.x,
                        sample.location.y,
                        sample.location.z,
                        1.0,
                    ]);
                }
            }
            FillMode::Repeat => {
                if source.length() <= 0.0 {
                    return Err(BendError::ZeroLengthSource);
                }
                let repetitions = (interval_length / source.length()).floor() as usize;
                let vertex_count = source.vertices().len() as u32;
                for repetition in 0..repetitions {
                    let offset = repetition as f32 * source.length();
                    for vertex in source.vertices() {
                        let distance = vertex.position.x - source.min_x() + offset;
                        let sample = sampler.sample(distance)?;
                        let (position, normal) =
                            sample.bend_vertex(vertex.position, vertex.normal);
                        bent.positions.push(position);
                        bent.normals.push(normal);
                        bent.uvs.push(uv_policy.apply(vertex.uv, repetition, repetitions));
                    }
                    let base = repetition as u32 * vertex_count;
                    bent.indices
                        .extend(source.triangles().iter().map(|&index| index + base));
                }
            }
            FillMode::Stretch => {
                bent.indices = source.triangles().to_vec();
                for vertex in source.vertices() {
                    let rate = if source.length() > 0.0 {
                        (vertex.position.x - source.min_x()) / source.length()
                    } else {
                        0.0
                    };
                    let sample = sampler.sample(rate * interval_length)?;
                    let (position, normal) = sample.bend_vertex(vertex.position, vertex.normal);
                    bent.positions.push(position);
                    bent.normals.push(normal);
                    bent.uvs.push(uv_policy.apply(vertex.uv, 0, 1));
                }
            }
        }

        Ok(bent)
    }
}

/// The UV policy of one bend pass.
struct UvPolicy {
    uv_mode: UvMode,
    fill_mode: FillMode,
    u_offset: f32,
    interval_length: f32,
    source_length: f32,
}

impl UvPolicy {
    fn apply(&self, uv: Vec2, repetition: usize, repetition_count: usize) -> Vec2 {
        let u = match (self.uv_mode, self.fill_mode) {
            (UvMode::Repeat, _) => uv.x,
            (UvMode::Extend, FillMode::Repeat) => uv.x + repetition as f32 + self.u_offset,
            (UvMode::Extend, _) => uv.x * self.interval_length + self.u_offset,
            (UvMode::Stretch, FillMode::Repeat) => {
                (uv.x + repetition as f32) / repetition_count.max(1) as f32
            }
            (UvMode::Stretch, FillMode::Once) => {
                if self.interval_length > 0.0 {
                    uv.x * self.source_length / self.interval_length
                } else {
                    uv.x
                }
            }
            (UvMode::Stretch, FillMode::Stretch) => uv.x,
        };
        Vec2::new(u, uv.y)
    }
}

/// Check the target against the spline and reduce it to a sampling origin
/// and an interval length.
fn resolve_target(
    target: BendTarget,
    spline: &Spline,
) -> BendResult<(Option<usize>, f32, f32)> {
    match target {
        BendTarget::Curve { index } => {
            let curve = spline
                .curves()
                .get(index)
                .ok_or(BendError::CurveIndexOutOfBounds {
                    index,
                    count: spline.curve_count(),
                })?;
            Ok((Some(index), 0.0, curve.length()))
        }
        BendTarget::Interval { start, end } => {
            let spline_length = spline.length();
            let resolved_end = if end == 0.0 { spline_length } else { end };
            if start < 0.0 || start >= resolved_end || resolved_end > spline_length {
                return Err(BendError::InvalidInterval {
                    start,
                    end,
                    spline_length,
                });
            }
            Ok((None, start, resolved_end - start))
        }
    }
}

/// Distance-keyed sampling of one bend pass.
///
/// Out-of-range distances wrap modulo the spline length on loops and clamp
/// to it otherwise, the same rule for every fill mode.
struct Sampler<'a> {
    spline: &'a Spline,
    curve_index: Option<usize>,
    interval_start: f32,
    cache: &'a mut HashMap<u32, CurveSample>,
}

impl Sampler<'_> {
    fn sample(&mut self, distance: f32) -> BendResult<CurveSample> {
        let key = distance.to_bits();
        if let Some(sample) = self.cache.get(&key) {
            return Ok(*sample);
        }
        let sample = match self.curve_index {
            Some(index) => {
                let curve = &self.spline.curves()[index];
                curve.sample_at_distance(distance.clamp(0.0, curve.length()))?
            }
            None => {
                let length = self.spline.length();
                let mut global = self.interval_start + distance;
                if global > length {
                    if self.spline.is_loop() && length > 0.0 {
                        global %= length;
                    } else {
                        global = length;
                    }
                }
                self.spline.sample_at_distance(global.max(0.0))?
            }
        };
        self.cache.insert(key, sample);
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bend::source::MeshVertex;
    use crate::spline::{SplineNode, SplineType};
    use approx::assert_relative_eq;

    /// A straight spline along +X through the given node X coordinates.
    fn straight_spline(xs: &[f32]) -> Spline {
        let nodes = xs
            .iter()
            .map(|&x| SplineNode::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0)))
            .collect();
        Spline::from_nodes(SplineType::Linear, nodes).unwrap()
    }

    /// A flat quad spanning X in [0, length], one unit wide in Z.
    fn quad_source(length: f32) -> SourceMesh {
        SourceMesh::build(
            vec![
                MeshVertex::new(Vec3::new(0.0, 0.0, 0.0), Vec3::Y, Vec2::new(0.0, 0.0)),
                MeshVertex::new(Vec3::new(length, 0.0, 0.0), Vec3::Y, Vec2::new(1.0, 0.0)),
                MeshVertex::new(Vec3::new(length, 0.0, 1.0), Vec3::Y, Vec2::new(1.0, 1.0)),
                MeshVertex::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Y, Vec2::new(0.0, 1.0)),
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
        .finish()
        .unwrap()
    }

    fn bender_with(source: SourceMesh, fill_mode: FillMode) -> MeshBender {
        let mut bender = MeshBender::new();
        bender.set_source(source);
        bender.set_fill_mode(fill_mode);
        bender
    }

    #[test]
    fn test_compute_without_source_fails() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = MeshBender::new();
        assert!(matches!(bender.compute(&spline), Err(BendError::NoSource)));
    }

    #[test]
    fn test_once_follows_a_straight_spline() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        let bent = bender.compute(&spline).unwrap();

        assert_eq!(bent.vertex_count(), 4);
        assert_eq!(bent.triangle_count(), 2);
        // On the identity-frame spline a template vertex at X lands at X.
        assert!((bent.positions[1] - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-4);
        assert!((bent.positions[2] - Vec3::new(4.0, 0.0, 1.0)).length() < 1e-4);
        assert!((bent.normals[1] - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_once_colors_carry_sample_locations() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        let bent = bender.compute(&spline).unwrap();

        assert_eq!(bent.colors.len(), 4);
        let color = bent.colors[1];
        assert_relative_eq!(color[0], 4.0, epsilon = 1e-4);
        assert_relative_eq!(color[3], 1.0);
    }

    #[test]
    fn test_repeat_count_floors() {
        // Interval of 10, template of 3: exactly three copies, never four.
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(3.0), FillMode::Repeat);
        let bent = bender.compute(&spline).unwrap();

        assert_eq!(bent.vertex_count(), 12);
        assert_eq!(bent.triangle_count(), 6);
        // Copies are offset in the index list by the template vertex count.
        assert_eq!(&bent.indices[6..12], &[4, 5, 6, 4, 6, 7]);
        // The third copy ends at 9, not at the interval end.
        let max_x = bent
            .positions
            .iter()
            .map(|p| p.x)
            .fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(max_x, 9.0, epsilon = 1e-4);
    }

    #[test]
    fn test_repeat_zero_fits_gives_empty_buffers() {
        let spline = straight_spline(&[0.0, 2.0]);
        let mut bender = bender_with(quad_source(3.0), FillMode::Repeat);
        let bent = bender.compute(&spline).unwrap();
        assert_eq!(bent.vertex_count(), 0);
        assert_eq!(bent.triangle_count(), 0);
    }

    #[test]
    fn test_repeat_rejects_zero_length_source() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(0.0), FillMode::Repeat);
        assert!(matches!(
            bender.compute(&spline),
            Err(BendError::ZeroLengthSource)
        ));
    }

    #[test]
    fn test_stretch_pins_template_ends_to_interval_ends() {
        // A template spanning [0, 5] stretched over a length-10 spline.
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(5.0), FillMode::Stretch);
        let bent = bender.compute(&spline).unwrap();

        assert_relative_eq!(bent.positions[0].x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(bent.positions[1].x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_curve_target_stays_within_its_curve() {
        let spline = straight_spline(&[0.0, 4.0, 10.0]);
        let mut bender = bender_with(quad_source(5.0), FillMode::Once);
        bender.set_target(BendTarget::Curve { index: 0 });
        let bent = bender.compute(&spline).unwrap();

        // The template is longer than the curve, so distances clamp to the
        // curve end rather than running into the next curve.
        assert_relative_eq!(bent.positions[1].x, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_curve_target_out_of_bounds() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(2.0), FillMode::Once);
        bender.set_target(BendTarget::Curve { index: 1 });
        assert!(matches!(
            bender.compute(&spline),
            Err(BendError::CurveIndexOutOfBounds { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_interval_validation() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(2.0), FillMode::Once);

        bender.set_target(BendTarget::Interval {
            start: 5.0,
            end: 3.0,
        });
        assert!(matches!(
            bender.compute(&spline),
            Err(BendError::InvalidInterval { .. })
        ));

        bender.set_target(BendTarget::Interval {
            start: 0.0,
            end: 11.0,
        });
        assert!(matches!(
            bender.compute(&spline),
            Err(BendError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_overflow_clamps_on_open_splines() {
        // Interval starting at 8 on a length-10 spline: the template runs
        // past the end and piles up at the final sample.
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        bender.set_target(BendTarget::Interval {
            start: 8.0,
            end: 0.0,
        });
        let bent = bender.compute(&spline).unwrap();
        assert_relative_eq!(bent.positions[1].x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_overflow_wraps_on_loops() {
        // An out-and-back loop of length 20; a vertex 2 units past the end
        // wraps around to distance 2.
        let mut spline = straight_spline(&[0.0, 10.0, 0.0]);
        spline.set_loop(true);
        assert_relative_eq!(spline.length(), 20.0);

        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        bender.set_target(BendTarget::Interval {
            start: 18.0,
            end: 0.0,
        });
        let bent = bender.compute(&spline).unwrap();
        assert_relative_eq!(bent.positions[1].x, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_uv_modes() {
        let spline = straight_spline(&[0.0, 10.0]);

        // Extend in Once: U scales by the interval length plus the offset.
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        bender.set_uv_mode(UvMode::Extend);
        bender.set_u_offset(3.0);
        let bent = bender.compute(&spline).unwrap();
        assert_relative_eq!(bent.uvs[1].x, 13.0, epsilon = 1e-4);
        assert_relative_eq!(bent.uvs[1].y, 0.0);

        // Extend in Repeat: U shifts by one per copy.
        let mut bender = bender_with(quad_source(3.0), FillMode::Repeat);
        bender.set_uv_mode(UvMode::Extend);
        let bent = bender.compute(&spline).unwrap();
        assert_relative_eq!(bent.uvs[4].x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(bent.uvs[9].x, 3.0, epsilon = 1e-4);

        // Stretch in Repeat: each copy covers 1/n of the texture.
        let mut bender = bender_with(quad_source(3.0), FillMode::Repeat);
        bender.set_uv_mode(UvMode::Stretch);
        let bent = bender.compute(&spline).unwrap();
        assert_relative_eq!(bent.uvs[1].x, 1.0 / 3.0, epsilon = 1e-4);
        assert_relative_eq!(bent.uvs[10].x, 1.0, epsilon = 1e-4);

        // Stretch in Once: U shrinks to the template's share of the interval.
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        bender.set_uv_mode(UvMode::Stretch);
        let bent = bender.compute(&spline).unwrap();
        assert_relative_eq!(bent.uvs[1].x, 0.4, epsilon = 1e-4);
    }

    #[test]
    fn test_compute_if_needed_coalesces() {
        let mut spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);

        assert!(bender.compute_if_needed(&spline).unwrap().is_some());
        // Nothing changed: the checkpoint is a no-op.
        assert!(bender.compute_if_needed(&spline).unwrap().is_none());

        // Several edits between checkpoints cost one rebuild.
        spline.set_node_position(1, Vec3::new(12.0, 0.0, 0.0)).unwrap();
        spline.set_node_up(0, Vec3::Y).unwrap();
        assert!(bender.compute_if_needed(&spline).unwrap().is_some());
        assert!(bender.compute_if_needed(&spline).unwrap().is_none());

        // Retargeting to an unrelated spline forces a rebuild by hand.
        bender.mark_dirty();
        assert!(bender.compute_if_needed(&spline).unwrap().is_some());
    }

    #[test]
    fn test_unchanged_setters_do_not_dirty() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        bender.compute_if_needed(&spline).unwrap();

        bender.set_fill_mode(FillMode::Once);
        bender.set_uv_mode(UvMode::Repeat);
        bender.set_u_offset(0.0);
        bender.set_target(BendTarget::default());
        assert!(!bender.is_dirty());
        assert!(bender.compute_if_needed(&spline).unwrap().is_none());
    }

    #[test]
    fn test_to_mesh_round_trips_buffers() {
        let spline = straight_spline(&[0.0, 10.0]);
        let mut bender = bender_with(quad_source(4.0), FillMode::Once);
        let bent = bender.compute(&spline).unwrap();
        let mesh = bent.to_mesh();

        assert_eq!(mesh.count_vertices(), 4);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());

        // Repeat output carries no color channel.
        bender.set_fill_mode(FillMode::Repeat);
        let bent = bender.compute(&spline).unwrap();
        assert!(bent.to_mesh().attribute(Mesh::ATTRIBUTE_COLOR).is_none());
    }
}
