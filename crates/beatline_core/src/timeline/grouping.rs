//! Partitioning of the beat list into voice-over and spill-over groups.

use std::ops::Range;

use super::classify::{classify, BeatKind};
use crate::models::{Beat, MediaProbe};

/// How a contiguous run of beats is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// A movie beat followed by voice-over beats riding its timeline.
    VoiceOver,
    /// An audio beat followed by silent beats sharing its clip.
    SpillOver,
    /// An ordinary beat timed on its own.
    Single,
}

/// Contiguous run of beat indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub kind: GroupKind,
    pub range: Range<usize>,
}

impl Group {
    fn new(kind: GroupKind, range: Range<usize>) -> Self {
        Self { kind, range }
    }

    /// Number of beats in the group.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the group is empty (never produced by the resolver).
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// First beat of the group.
    pub fn first(&self) -> usize {
        self.range.start
    }

    /// Last beat of the group.
    pub fn last(&self) -> usize {
        self.range.end - 1
    }
}

/// Partition beats into non-overlapping groups covering every index.
///
/// At each start index the voice-over rule is evaluated before the
/// spill-over rule, so a beat with both a movie and its own audio opens a
/// voice-over group when voice-over beats follow it. Candidate groups of a
/// single beat fall through to [`GroupKind::Single`].
pub fn resolve_groups(beats: &[Beat], probes: &[MediaProbe]) -> Vec<Group> {
    debug_assert_eq!(beats.len(), probes.len());

    let kinds: Vec<BeatKind> = beats.iter().map(classify).collect();
    let n = beats.len();
    let mut groups = Vec::new();
    let mut i = 0;

    while i < n {
        if probes[i].movie_duration > 0.0 {
            let end = extend_while(i, n, |j| kinds[j].is_voice_over());
            if end - i > 1 {
                groups.push(Group::new(GroupKind::VoiceOver, i..end));
                i = end;
                continue;
            }
        }

        if probes[i].audio_duration > 0.0 {
            let end = extend_while(i, n, |j| !probes[j].has_media());
            if end - i > 1 {
                groups.push(Group::new(GroupKind::SpillOver, i..end));
                i = end;
                continue;
            }
        }

        groups.push(Group::new(GroupKind::Single, i..i + 1));
        i += 1;
    }

    groups
}

/// End (exclusive) of the run starting at `start` whose followers satisfy `pred`.
fn extend_while(start: usize, n: usize, pred: impl Fn(usize) -> bool) -> usize {
    let mut end = start + 1;
    while end < n && pred(end) {
        end += 1;
    }
    end
}
