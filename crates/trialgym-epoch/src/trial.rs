//! Per-trial state: timeline, fields, and the two output buffers.

use trialgym_core::TrialId;

use crate::fields::TrialFields;
use crate::layout::ObservationLayout;
use crate::timeline::Timeline;

/// One episode instance.
///
/// Holds the [`Timeline`], task-declared [`TrialFields`], a row-major
/// observation buffer of shape `(N, width)` initialized to zero, and a
/// ground-truth buffer of length `N` initialized to the task's
/// "no target" label. Task code fills the buffers through the methods in
/// [`assemble`](crate::assemble) while building the trial; afterwards the
/// step driver only reads them.
#[derive(Clone, Debug)]
pub struct Trial {
    id: TrialId,
    timeline: Timeline,
    layout: ObservationLayout,
    fields: TrialFields,
    pub(crate) observations: Vec<f32>,
    pub(crate) ground_truth: Vec<usize>,
    no_target: usize,
}

impl Trial {
    /// Allocate zeroed buffers for `timeline` under `layout`.
    pub fn new(
        id: TrialId,
        timeline: Timeline,
        layout: &ObservationLayout,
        no_target: usize,
    ) -> Self {
        let len = timeline.len();
        Self {
            id,
            observations: vec![0.0; len * layout.width()],
            ground_truth: vec![no_target; len],
            timeline,
            layout: layout.clone(),
            fields: TrialFields::new(),
            no_target,
        }
    }

    /// Sequential trial ID.
    pub fn id(&self) -> TrialId {
        self.id
    }

    /// The trial's timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Observation channel layout.
    pub fn layout(&self) -> &ObservationLayout {
        &self.layout
    }

    /// Number of timesteps `N`.
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    /// Always false; timelines are never empty.
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Observation width.
    pub fn width(&self) -> usize {
        self.layout.width()
    }

    /// Task-declared fields.
    pub fn fields(&self) -> &TrialFields {
        &self.fields
    }

    /// Mutable task-declared fields.
    pub fn fields_mut(&mut self) -> &mut TrialFields {
        &mut self.fields
    }

    /// Label used for timesteps with no ground truth set.
    pub fn no_target(&self) -> usize {
        self.no_target
    }

    /// Observation row at timestep `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    pub fn observation(&self, t: usize) -> &[f32] {
        self.check(t);
        let w = self.width();
        &self.observations[t * w..(t + 1) * w]
    }

    /// The whole observation buffer, row-major `(N, width)`.
    pub fn observations(&self) -> &[f32] {
        &self.observations
    }

    /// Ground-truth label at timestep `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= len()`.
    pub fn ground_truth(&self, t: usize) -> usize {
        self.check(t);
        self.ground_truth[t]
    }

    /// The whole ground-truth buffer.
    pub fn ground_truths(&self) -> &[usize] {
        &self.ground_truth
    }

    pub(crate) fn check(&self, t: usize) {
        assert!(
            t < self.len(),
            "timestep {t} outside trial {} of length {}",
            self.id,
            self.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineBuilder;

    fn trial() -> Trial {
        let tl = TimelineBuilder::new(100.0)
            .unwrap()
            .periods(&[("fixation", 300.0), ("decision", 200.0)])
            .build()
            .unwrap();
        let layout = ObservationLayout::new().group("fixation", 1).group("stimulus", 2);
        Trial::new(TrialId(4), tl, &layout, 0)
    }

    #[test]
    fn buffers_are_shaped_and_zeroed() {
        let t = trial();
        assert_eq!(t.len(), 5);
        assert_eq!(t.width(), 3);
        assert_eq!(t.observations().len(), 15);
        assert!(t.observations().iter().all(|&v| v == 0.0));
        assert!(t.ground_truths().iter().all(|&g| g == 0));
    }

    #[test]
    fn observation_row_slices_width() {
        let t = trial();
        assert_eq!(t.observation(4).len(), 3);
    }

    #[test]
    #[should_panic(expected = "outside trial 4")]
    fn row_past_end_panics() {
        let t = trial();
        let _ = t.observation(5);
    }

    #[test]
    fn fields_start_empty() {
        let mut t = trial();
        assert!(t.fields().is_empty());
        t.fields_mut().set("coh", 25.6);
        assert_eq!(t.fields().float("coh").unwrap(), 25.6);
    }
}
