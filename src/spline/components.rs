use bevy::prelude::*;

use crate::error::{SplineError, SplineResult};

use super::curve::{Curve, DEFAULT_STEP_COUNT};
use super::node::SplineNode;
use super::sample::CurveSample;
use super::types::SplineType;

/// Distances this close to a curve boundary snap to the boundary, so float
/// drift at curve seams cannot push a query out of range.
const BOUNDARY_EPSILON: f32 = 1e-4;

/// A chain of curves through an ordered list of nodes.
///
/// The node list is the source of truth; the curve chain, with
/// `curves[i]` connecting nodes `i` and `i + 1`, is derived state kept in
/// sync by every mutating method. A revision counter is bumped on each
/// mutation so consumers can coalesce any number of edits into one rebuild.
///
/// Serializable with Bevy's scene system; the derived chain is rebuilt by
/// [`refresh_curves`](Self::refresh_curves) after deserialization.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Spline {
    spline_type: SplineType,
    nodes: Vec<SplineNode>,
    is_loop: bool,
    steps_per_curve: usize,
    #[reflect(ignore)]
    curves: Vec<Curve>,
    #[reflect(ignore)]
    length: f32,
    #[reflect(ignore)]
    revision: u64,
}

impl Default for Spline {
    fn default() -> Self {
        Self::new(
            SplineType::CubicBezier,
            SplineNode::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
            SplineNode::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)),
        )
    }
}

impl Spline {
    /// Create a spline from its first two nodes.
    pub fn new(spline_type: SplineType, first: SplineNode, second: SplineNode) -> Self {
        let mut spline = Self {
            spline_type,
            nodes: vec![first, second],
            is_loop: false,
            steps_per_curve: DEFAULT_STEP_COUNT,
            curves: Vec::new(),
            length: 0.0,
            revision: 0,
        };
        spline.refresh_curves();
        spline
    }

    /// Create a spline from a node list, which must hold at least two nodes.
    pub fn from_nodes(spline_type: SplineType, nodes: Vec<SplineNode>) -> SplineResult<Self> {
        if nodes.len() < 2 {
            return Err(SplineError::NotEnoughNodes {
                required: 2,
                actual: nodes.len(),
            });
        }
        let mut spline = Self {
            spline_type,
            nodes,
            is_loop: false,
            steps_per_curve: DEFAULT_STEP_COUNT,
            curves: Vec::new(),
            length: 0.0,
            revision: 0,
        };
        spline.refresh_curves();
        Ok(spline)
    }

    /// The interpolation used by every curve.
    pub fn spline_type(&self) -> SplineType {
        self.spline_type
    }

    /// Switch the interpolation, rebuilding every curve.
    pub fn set_spline_type(&mut self, spline_type: SplineType) {
        if self.spline_type == spline_type {
            return;
        }
        self.spline_type = spline_type;
        self.refresh_curves();
    }

    /// The control nodes.
    pub fn nodes(&self) -> &[SplineNode] {
        &self.nodes
    }

    /// The node at `index`.
    pub fn node(&self, index: usize) -> SplineResult<&SplineNode> {
        self.nodes.get(index).ok_or(SplineError::NodeIndexOutOfBounds {
            index,
            count: self.nodes.len(),
        })
    }

    /// Number of control nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The derived curve chain.
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Number of curves, always one less than the node count.
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Total length, the sum of all curve lengths.
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Whether the first and last node mirror each other.
    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    /// Segments per Bézier curve sample table.
    pub fn steps_per_curve(&self) -> usize {
        self.steps_per_curve
    }

    /// Monotonic mutation counter. Consumers compare against the last value
    /// they observed to decide whether to rebuild.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the spline satisfies its structural invariants.
    ///
    /// Scene files can restore arbitrary node lists, so systems check this
    /// before sampling.
    pub fn is_valid(&self) -> bool {
        self.nodes.len() >= 2 && self.curves.len() == self.nodes.len() - 1
    }

    /// Append a node, extending the chain with one more curve.
    pub fn add_node(&mut self, node: SplineNode) {
        self.nodes.push(node);
        self.apply_loop_mirror();
        self.refresh_curves();
    }

    /// Insert a node between existing ones.
    ///
    /// Index 0 would break the chain start and the index after the last node
    /// is an append, so valid indices are `1..node_count`.
    pub fn insert_node(&mut self, index: usize, node: SplineNode) -> SplineResult<()> {
        if index == 0 || index >= self.nodes.len() {
            return Err(SplineError::InvalidInsertIndex(index));
        }
        self.nodes.insert(index, node);
        self.apply_loop_mirror();
        self.refresh_curves();
        Ok(())
    }

    /// Remove and return a node. A spline keeps at least two nodes.
    pub fn remove_node(&mut self, index: usize) -> SplineResult<SplineNode> {
        if index >= self.nodes.len() {
            return Err(SplineError::NodeIndexOutOfBounds {
                index,
                count: self.nodes.len(),
            });
        }
        if self.nodes.len() <= 2 {
            return Err(SplineError::NodeFloor(self.nodes.len()));
        }
        let node = self.nodes.remove(index);
        self.apply_loop_mirror();
        self.refresh_curves();
        Ok(node)
    }

    /// Replace a node wholesale.
    pub fn set_node(&mut self, index: usize, node: SplineNode) -> SplineResult<()> {
        if index >= self.nodes.len() {
            return Err(SplineError::NodeIndexOutOfBounds {
                index,
                count: self.nodes.len(),
            });
        }
        self.nodes[index] = node;
        self.refresh_node_curves(index);
        if let Some(mirror) = self.mirror_index(index) {
            self.nodes[mirror] = node;
            self.refresh_node_curves(mirror);
        }
        self.touch();
        Ok(())
    }

    /// Move a node, keeping its direction handle where it is.
    pub fn set_node_position(&mut self, index: usize, position: Vec3) -> SplineResult<()> {
        let mut node = *self.node(index)?;
        node.position = position;
        self.set_node(index, node)
    }

    /// Move a node's absolute direction handle.
    pub fn set_node_direction(&mut self, index: usize, direction: Vec3) -> SplineResult<()> {
        let mut node = *self.node(index)?;
        node.direction = direction;
        self.set_node(index, node)
    }

    /// Change a node's up vector.
    pub fn set_node_up(&mut self, index: usize, up: Vec3) -> SplineResult<()> {
        let mut node = *self.node(index)?;
        node.up = up;
        self.set_node(index, node)
    }

    /// Change a node's cross-section scale.
    pub fn set_node_scale(&mut self, index: usize, scale: Vec2) -> SplineResult<()> {
        let mut node = *self.node(index)?;
        node.scale = scale;
        self.set_node(index, node)
    }

    /// Enable or disable loop binding.
    ///
    /// While enabled, edits to the first or last node are mirrored to the
    /// other. Enabling copies the first node's state onto the last
    /// immediately.
    pub fn set_loop(&mut self, is_loop: bool) {
        if self.is_loop == is_loop {
            return;
        }
        self.is_loop = is_loop;
        if is_loop {
            self.apply_loop_mirror();
            if !self.nodes.is_empty() {
                self.refresh_node_curves(self.nodes.len() - 1);
            }
        }
        self.touch();
    }

    /// Change the Bézier sample resolution, rebuilding every curve.
    pub fn set_steps_per_curve(&mut self, steps: usize) {
        let steps = steps.max(1);
        if self.steps_per_curve == steps {
            return;
        }
        self.steps_per_curve = steps;
        self.refresh_curves();
    }

    /// Rebuild the whole curve chain from the node list.
    ///
    /// Needed after scene deserialization, which restores nodes but not the
    /// derived chain.
    pub fn refresh_curves(&mut self) {
        self.curves.clear();
        let steps = self.steps_per_curve.max(1);
        for i in 0..self.nodes.len().saturating_sub(1) {
            self.curves.push(Curve::new(
                self.spline_type,
                i,
                i + 1,
                self.nodes[i],
                self.nodes[i + 1],
                steps,
            ));
        }
        self.touch();
    }

    /// Sample at a global time in `[0, curve_count]`, where the integer part
    /// selects the curve and the fraction the time within it. The final
    /// boundary clamps into the last curve.
    pub fn sample_at_time(&self, t: f32) -> SplineResult<CurveSample> {
        let (index, local) = self.split_time(t)?;
        self.curves[index].sample_at_time(local)
    }

    /// The curve index a global time falls in.
    pub fn curve_index_at_time(&self, t: f32) -> SplineResult<usize> {
        Ok(self.split_time(t)?.0)
    }

    /// Sample at a distance in `[0, length]` from the spline start.
    ///
    /// Walks the chain subtracting curve lengths; a query within
    /// [`BOUNDARY_EPSILON`] past a curve end snaps to that end.
    pub fn sample_at_distance(&self, distance: f32) -> SplineResult<CurveSample> {
        if distance < 0.0 || distance > self.length {
            return Err(SplineError::DistanceOutOfRange {
                distance,
                length: self.length,
            });
        }
        let mut remaining = distance;
        for curve in &self.curves {
            if remaining <= curve.length() + BOUNDARY_EPSILON {
                return curve.sample_at_distance(remaining.min(curve.length()));
            }
            remaining -= curve.length();
        }
        // Accumulated float drift walked past the final curve: clamp to it.
        match self.curves.last() {
            Some(curve) => curve.sample_at_distance(curve.length()),
            None => Err(SplineError::NotEnoughNodes {
                required: 2,
                actual: self.nodes.len(),
            }),
        }
    }

    /// The closest sample to `point` across all curves. Equidistant
    /// candidates resolve to the lowest curve index.
    pub fn projection_sample(&self, point: Vec3) -> SplineResult<CurveSample> {
        let mut best: Option<CurveSample> = None;
        let mut best_distance = f32::MAX;
        for curve in &self.curves {
            let candidate = curve.projection_sample(point);
            let d = candidate.location.distance_squared(point);
            if d < best_distance {
                best_distance = d;
                best = Some(candidate);
            }
        }
        best.ok_or(SplineError::NotEnoughNodes {
            required: 2,
            actual: self.nodes.len(),
        })
    }

    /// Range-check a global time and split it into curve index and local time.
    fn split_time(&self, t: f32) -> SplineResult<(usize, f32)> {
        let max = self.curves.len() as f32;
        if t < 0.0 || t > max || self.curves.is_empty() {
            return Err(SplineError::TimeOutOfRange { time: t, max });
        }
        if t >= max {
            Ok((self.curves.len() - 1, 1.0))
        } else {
            Ok((t.floor() as usize, t.fract()))
        }
    }

    /// Recompute total length and bump the revision.
    fn touch(&mut self) {
        self.length = self.curves.iter().map(Curve::length).sum();
        self.revision += 1;
    }

    /// Rebuild the curves touching node `index` from the current node data.
    fn refresh_node_curves(&mut self, index: usize) {
        if index > 0 {
            if let Some(curve) = self.curves.get_mut(index - 1) {
                curve.set_nodes(self.nodes[index - 1], self.nodes[index]);
            }
        }
        if index + 1 < self.nodes.len() {
            if let Some(curve) = self.curves.get_mut(index) {
                curve.set_nodes(self.nodes[index], self.nodes[index + 1]);
            }
        }
    }

    /// The loop partner of `index`, if the loop binding applies to it.
    fn mirror_index(&self, index: usize) -> Option<usize> {
        if !self.is_loop || self.nodes.len() < 2 {
            return None;
        }
        let last = self.nodes.len() - 1;
        if index == 0 {
            Some(last)
        } else if index == last {
            Some(0)
        } else {
            None
        }
    }

    /// Copy the first node's state onto the last while the loop is on.
    fn apply_loop_mirror(&mut self) {
        if !self.is_loop {
            return;
        }
        if let Some(first) = self.nodes.first().copied() {
            if let Some(last) = self.nodes.last_mut() {
                *last = first;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight_nodes(xs: &[f32]) -> Vec<SplineNode> {
        xs.iter()
            .map(|&x| SplineNode::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 0.0, 0.0)))
            .collect()
    }

    fn linear_spline(xs: &[f32]) -> Spline {
        Spline::from_nodes(SplineType::Linear, straight_nodes(xs)).unwrap()
    }

    #[test]
    fn test_curve_count_tracks_node_count() {
        let mut spline = linear_spline(&[0.0, 1.0]);
        assert_eq!(spline.curve_count(), 1);

        spline.add_node(SplineNode::new(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO));
        assert_eq!(spline.node_count(), 3);
        assert_eq!(spline.curve_count(), 2);

        spline
            .insert_node(1, SplineNode::new(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO))
            .unwrap();
        assert_eq!(spline.node_count(), 4);
        assert_eq!(spline.curve_count(), 3);
    }

    #[test]
    fn test_from_nodes_needs_two() {
        let result = Spline::from_nodes(SplineType::Linear, straight_nodes(&[0.0]));
        assert!(matches!(result, Err(SplineError::NotEnoughNodes { .. })));
    }

    #[test]
    fn test_remove_node_floor() {
        let mut spline = linear_spline(&[0.0, 1.0]);
        assert!(matches!(
            spline.remove_node(0),
            Err(SplineError::NodeFloor(2))
        ));

        let mut spline = linear_spline(&[0.0, 1.0, 2.0]);
        assert!(spline.remove_node(1).is_ok());
        assert_eq!(spline.node_count(), 2);
        assert_eq!(spline.curve_count(), 1);

        let mut spline = linear_spline(&[0.0, 1.0, 2.0, 3.0]);
        assert!(spline.remove_node(3).is_ok());
        assert_eq!(spline.node_count(), 3);
        assert_eq!(spline.curve_count(), 2);
    }

    #[test]
    fn test_insert_at_ends_rejected() {
        let mut spline = linear_spline(&[0.0, 1.0]);
        let node = SplineNode::new(Vec3::ZERO, Vec3::ZERO);
        assert!(matches!(
            spline.insert_node(0, node),
            Err(SplineError::InvalidInsertIndex(0))
        ));
        assert!(matches!(
            spline.insert_node(2, node),
            Err(SplineError::InvalidInsertIndex(2))
        ));
    }

    #[test]
    fn test_global_time_selects_curve() {
        let spline = linear_spline(&[0.0, 1.0, 3.0]);
        let sample = spline.sample_at_time(1.5).unwrap();
        assert_eq!(sample.curve_index, 1);
        assert_relative_eq!(sample.time_in_curve, 0.5);
        assert!((sample.location - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);

        // The final boundary clamps into the last curve.
        let end = spline.sample_at_time(2.0).unwrap();
        assert_eq!(end.curve_index, 1);
        assert_relative_eq!(end.time_in_curve, 1.0);
    }

    #[test]
    fn test_distance_walk_crosses_curves() {
        let spline = linear_spline(&[0.0, 3.0, 7.0]);
        assert_relative_eq!(spline.length(), 7.0);

        let sample = spline.sample_at_distance(5.0).unwrap();
        assert_eq!(sample.curve_index, 1);
        assert_relative_eq!(sample.distance_in_curve, 2.0, epsilon = 1e-5);

        // Just past a curve seam snaps back to the seam.
        let seam = spline.sample_at_distance(3.00005).unwrap();
        assert_eq!(seam.curve_index, 0);
        assert_relative_eq!(seam.distance_in_curve, 3.0, epsilon = 1e-5);

        // The full length resolves to the end of the last curve.
        let end = spline.sample_at_distance(7.0).unwrap();
        assert_eq!(end.curve_index, 1);
        assert_relative_eq!(end.time_in_curve, 1.0);
    }

    #[test]
    fn test_projection_breaks_ties_to_lowest_curve() {
        let spline = linear_spline(&[0.0, 2.0, 4.0]);
        // The shared node is equidistant from both curves.
        let sample = spline.projection_sample(Vec3::new(2.0, 1.0, 0.0)).unwrap();
        assert_eq!(sample.curve_index, 0);
        assert_relative_eq!(sample.time_in_curve, 1.0);
    }

    #[test]
    fn test_loop_mirrors_first_and_last() {
        let mut spline = linear_spline(&[0.0, 2.0, 4.0]);
        spline.set_loop(true);
        // Enabling copies the first node onto the last.
        assert_eq!(spline.nodes()[2], spline.nodes()[0]);

        let moved = Vec3::new(0.0, 5.0, 0.0);
        spline.set_node_position(0, moved).unwrap();
        assert_eq!(spline.nodes()[2].position, moved);

        spline
            .set_node_position(2, Vec3::new(1.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(spline.nodes()[0].position, Vec3::new(1.0, 1.0, 1.0));

        spline.set_loop(false);
        spline.set_node_position(0, Vec3::ZERO).unwrap();
        assert_eq!(spline.nodes()[2].position, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_revision_bumps_on_every_mutation() {
        let mut spline = linear_spline(&[0.0, 1.0]);
        let initial = spline.revision();

        spline.set_node_position(0, Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let after_move = spline.revision();
        assert!(after_move > initial);

        spline.add_node(SplineNode::new(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO));
        assert!(spline.revision() > after_move);
    }

    #[test]
    fn test_node_edits_refresh_lengths() {
        let mut spline = linear_spline(&[0.0, 1.0]);
        assert_relative_eq!(spline.length(), 1.0);

        spline
            .set_node_position(1, Vec3::new(5.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(spline.length(), 5.0);
    }

    #[test]
    fn test_steps_per_curve_floors_at_one() {
        let mut spline = Spline::default();
        spline.set_steps_per_curve(0);
        assert_eq!(spline.steps_per_curve(), 1);
    }
}
