//! Epoch timelines, trial state and observation assembly.
//!
//! A trial's duration is partitioned into named periods by a
//! [`TimelineBuilder`]. The resulting [`Timeline`] carries a per-timestep
//! owner table, so "which period is active at t" is a single index. A
//! [`Trial`] bundles the timeline with task-declared [`TrialFields`] and
//! the observation and ground-truth buffers, which task code fills with
//! the period-scoped write API (`add_value`, `add_noise`,
//! `set_ground_truth`).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod fields;
pub mod layout;
pub mod timeline;
pub mod trial;

pub use assemble::{Periods, Stimulus};
pub use fields::{FieldValue, TrialFields};
pub use layout::{ChannelSelector, ObservationLayout};
pub use timeline::{Anchor, Period, Timeline, TimelineBuilder};
pub use trial::Trial;
