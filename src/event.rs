//! The decoded event model handed to playback consumers

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tempo in effect before the first [`EventKind::TempoSet`], in microseconds
/// per quarter note (the MIDI default of 120 beats per minute)
pub const DEFAULT_TEMPO_MICROS: u32 = 500_000;

/// A single decoded event relevant to the piano part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventKind {
    /// A key was struck. Carries the MIDI note number (0-127)
    NoteOn(u8),
    /// A key was released. Carries the MIDI note number (0-127)
    NoteOff(u8),
    /// The tempo changed. Carries microseconds per quarter note (24 bits)
    TempoSet(u32),
}

/// An event stamped with its absolute position on its track's tick timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickedEvent {
    /// What happened
    pub kind: EventKind,
    /// Cumulative delta-time sum since the start of the owning track
    pub tick: u64,
}

/// An event carrying its musical-time distance from the preceding event.
///
/// For metrical files `delta_time` is a fraction of a quarter note and has
/// to be scaled by the tempo currently in effect; for timecode files it is
/// already in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimedEvent {
    /// What happened
    pub kind: EventKind,
    /// Distance from the previous event in the sorted sequence
    pub delta_time: f64,
}
