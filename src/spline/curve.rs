use bevy::prelude::*;

use crate::error::{SplineError, SplineResult};

use super::node::SplineNode;
use super::sample::CurveSample;
use super::types::{cubic_bezier, cubic_bezier_derivative, SplineType};

/// Default number of segments in a Bézier curve's sample table.
pub const DEFAULT_STEP_COUNT: usize = 5;

/// One segment of a spline, connecting two consecutive nodes.
///
/// The curve keeps a snapshot of its endpoint nodes plus their indices in
/// the owning spline. Bézier curves precompute a table of `steps + 1`
/// samples at uniform times carrying cumulative chord-length distances;
/// linear curves sample exactly and carry no table. The table is rebuilt in
/// full whenever an endpoint changes.
#[derive(Debug, Clone)]
pub struct Curve {
    /// Index of the start node in the owning spline.
    pub start: usize,
    /// Index of the end node in the owning spline.
    pub end: usize,
    kind: SplineType,
    n1: SplineNode,
    n2: SplineNode,
    steps: usize,
    length: f32,
    samples: Vec<CurveSample>,
}

impl Curve {
    /// Build a curve between two nodes.
    pub fn new(
        kind: SplineType,
        start: usize,
        end: usize,
        n1: SplineNode,
        n2: SplineNode,
        steps: usize,
    ) -> Self {
        let mut curve = Self {
            start,
            end,
            kind,
            n1,
            n2,
            steps: steps.max(1),
            length: 0.0,
            samples: Vec::new(),
        };
        curve.refresh();
        curve
    }

    /// Replace the endpoint nodes and recompute the sample table.
    pub fn set_nodes(&mut self, n1: SplineNode, n2: SplineNode) {
        self.n1 = n1;
        self.n2 = n2;
        self.refresh();
    }

    /// Chord-length approximation of the curve length.
    pub fn length(&self) -> f32 {
        self.length
    }

    /// The interpolation kind of this curve.
    pub fn kind(&self) -> SplineType {
        self.kind
    }

    /// Sample at a time in `[0, 1]`.
    pub fn sample_at_time(&self, t: f32) -> SplineResult<CurveSample> {
        if !(0.0..=1.0).contains(&t) {
            return Err(SplineError::TimeOutOfRange { time: t, max: 1.0 });
        }
        match self.kind {
            SplineType::Linear => Ok(self.linear_sample(t)),
            SplineType::CubicBezier => {
                let mut previous = self.samples[0];
                for &current in &self.samples[1..] {
                    if current.time_in_curve >= t {
                        return Ok(Self::lerp_bracket(
                            &previous,
                            &current,
                            t,
                            previous.time_in_curve,
                            current.time_in_curve,
                        ));
                    }
                    previous = current;
                }
                Ok(previous)
            }
        }
    }

    /// Sample at a distance in `[0, length]` from the curve start.
    pub fn sample_at_distance(&self, distance: f32) -> SplineResult<CurveSample> {
        if distance < 0.0 || distance > self.length {
            return Err(SplineError::DistanceOutOfRange {
                distance,
                length: self.length,
            });
        }
        match self.kind {
            SplineType::Linear => {
                let t = if self.length > 0.0 {
                    distance / self.length
                } else {
                    0.0
                };
                Ok(self.linear_sample(t))
            }
            SplineType::CubicBezier => {
                let mut previous = self.samples[0];
                for &current in &self.samples[1..] {
                    if current.distance_in_curve >= distance {
                        return Ok(Self::lerp_bracket(
                            &previous,
                            &current,
                            distance,
                            previous.distance_in_curve,
                            current.distance_in_curve,
                        ));
                    }
                    previous = current;
                }
                Ok(previous)
            }
        }
    }

    /// The sample closest to `point`.
    ///
    /// Picks the nearest precomputed sample, then refines by projecting onto
    /// the chord towards whichever neighbor is closer.
    pub fn projection_sample(&self, point: Vec3) -> CurveSample {
        match self.kind {
            SplineType::Linear => {
                let segment = self.n2.position - self.n1.position;
                let length_squared = segment.length_squared();
                let t = if length_squared > 0.0 {
                    ((point - self.n1.position).dot(segment) / length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                self.linear_sample(t)
            }
            SplineType::CubicBezier => {
                let mut nearest = 0;
                let mut nearest_distance = f32::MAX;
                for (i, sample) in self.samples.iter().enumerate() {
                    let d = sample.location.distance_squared(point);
                    if d < nearest_distance {
                        nearest_distance = d;
                        nearest = i;
                    }
                }

                let (a, b) = if nearest == 0 {
                    (self.samples[0], self.samples[1])
                } else if nearest == self.samples.len() - 1 {
                    (self.samples[nearest - 1], self.samples[nearest])
                } else {
                    let before = self.samples[nearest - 1];
                    let after = self.samples[nearest + 1];
                    if before.location.distance_squared(point)
                        <= after.location.distance_squared(point)
                    {
                        (before, self.samples[nearest])
                    } else {
                        (self.samples[nearest], after)
                    }
                };

                let chord = b.location - a.location;
                let length_squared = chord.length_squared();
                let rate = if length_squared > 0.0 {
                    ((point - a.location).dot(chord) / length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                CurveSample::lerp(&a, &b, rate)
            }
        }
    }

    /// Rebuild length and, for Bézier curves, the sample table.
    fn refresh(&mut self) {
        self.samples.clear();
        match self.kind {
            SplineType::Linear => {
                self.length = (self.n2.position - self.n1.position).length();
            }
            SplineType::CubicBezier => {
                self.samples.reserve(self.steps + 1);
                let mut distance = 0.0;
                let mut previous = self.n1.position;
                for i in 0..=self.steps {
                    let t = i as f32 / self.steps as f32;
                    let location = self.bezier_position(t);
                    distance += (location - previous).length();
                    previous = location;
                    self.samples.push(CurveSample {
                        location,
                        tangent: self.bezier_tangent(t),
                        up: self.n1.up.lerp(self.n2.up, t),
                        scale: self.n1.scale.lerp(self.n2.scale, t),
                        distance_in_curve: distance,
                        time_in_curve: t,
                        curve_index: self.start,
                    });
                }
                self.length = distance;
            }
        }
    }

    /// Exact sample of a linear curve at time `t`.
    fn linear_sample(&self, t: f32) -> CurveSample {
        CurveSample {
            location: self.n1.position.lerp(self.n2.position, t),
            tangent: (self.n2.position - self.n1.position).normalize_or_zero(),
            up: self.n1.up.lerp(self.n2.up, t),
            scale: self.n1.scale.lerp(self.n2.scale, t),
            distance_in_curve: t * self.length,
            time_in_curve: t,
            curve_index: self.start,
        }
    }

    /// Bézier control points derived from the endpoint nodes.
    fn control_points(&self) -> (Vec3, Vec3, Vec3, Vec3) {
        (
            self.n1.position,
            self.n1.direction,
            self.n2.inverse_direction(),
            self.n2.position,
        )
    }

    fn bezier_position(&self, t: f32) -> Vec3 {
        let (p0, p1, p2, p3) = self.control_points();
        cubic_bezier(p0, p1, p2, p3, t)
    }

    fn bezier_tangent(&self, t: f32) -> Vec3 {
        let (p0, p1, p2, p3) = self.control_points();
        cubic_bezier_derivative(p0, p1, p2, p3, t).normalize_or_zero()
    }

    /// Interpolate between two bracketing samples at `value` along the axis
    /// spanning `from` to `to`.
    fn lerp_bracket(
        previous: &CurveSample,
        current: &CurveSample,
        value: f32,
        from: f32,
        to: f32,
    ) -> CurveSample {
        let span = to - from;
        let rate = if span > 0.0 { (value - from) / span } else { 0.0 };
        CurveSample::lerp(previous, current, rate)
    }
}
