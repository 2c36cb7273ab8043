//! Observation channel layout and channel selection.

use std::ops::Range;

use indexmap::IndexMap;
use smallvec::SmallVec;
use trialgym_core::ConfigError;

/// Resolved channel indices for one write.
pub type Channels = SmallVec<[usize; 8]>;

/// Named groups of contiguous observation channels.
///
/// Groups are appended in order, so the observation width is the sum of
/// the group sizes. A perceptual task might declare
/// `fixation` (1 channel) followed by `stimulus` (2 channels).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservationLayout {
    width: usize,
    groups: IndexMap<String, Range<usize>>,
}

impl ObservationLayout {
    /// An empty layout of width zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group of `size` channels.
    ///
    /// Re-declaring a name replaces its range but still widens the layout.
    pub fn group(mut self, name: &str, size: usize) -> Self {
        let start = self.width;
        self.width += size;
        self.groups.insert(name.to_string(), start..self.width);
        self
    }

    /// Total number of channels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Channel range of a named group.
    pub fn range(&self, name: &str) -> Option<Range<usize>> {
        self.groups.get(name).cloned()
    }

    /// Group names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

/// Which observation channels a write touches.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelSelector {
    /// Every channel.
    All,
    /// One channel.
    Index(usize),
    /// A contiguous range.
    Range(Range<usize>),
    /// An explicit list, in write order.
    List(SmallVec<[usize; 8]>),
    /// A named group of the layout.
    Named(String),
}

impl ChannelSelector {
    /// Resolve to concrete channel indices, validating against the layout.
    pub fn resolve(&self, layout: &ObservationLayout) -> Result<Channels, ConfigError> {
        let width = layout.width();
        let channels: Channels = match self {
            Self::All => (0..width).collect(),
            Self::Index(c) => std::iter::once(*c).collect(),
            Self::Range(r) => r.clone().collect(),
            Self::List(list) => list.clone(),
            Self::Named(name) => layout
                .range(name)
                .ok_or_else(|| ConfigError::UnknownChannelGroup { name: name.clone() })?
                .collect(),
        };
        if let Some(&channel) = channels.iter().find(|&&c| c >= width) {
            return Err(ConfigError::ChannelOutOfRange { channel, width });
        }
        Ok(channels)
    }
}

impl From<usize> for ChannelSelector {
    fn from(c: usize) -> Self {
        Self::Index(c)
    }
}

impl From<Range<usize>> for ChannelSelector {
    fn from(r: Range<usize>) -> Self {
        Self::Range(r)
    }
}

impl From<&str> for ChannelSelector {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<&[usize]> for ChannelSelector {
    fn from(list: &[usize]) -> Self {
        Self::List(list.iter().copied().collect())
    }
}
