//! # pianola
//!
//! A minimal dependency Standard MIDI File (SMF) decoder that extracts the
//! piano part of a song as a single time-ordered event stream, ready to be
//! fed to a playback or visualization layer.
//!
//! ## Overview
//!
//! MIDI files are structured as a series of chunks. Each chunk carries a
//! 4-character ASCII type identifier and a 32-bit length specifying how many
//! bytes of data follow. `pianola` walks these chunks with a bounds-checked
//! cursor, validates the `MThd` header, decodes every `MTrk` event stream
//! (including running-status messages, meta and system-exclusive events),
//! and keeps only the note events of the channel that carries a General MIDI
//! piano program.
//!
//! - **Single inferred piano channel**: program changes to programs 0-7
//!   claim a channel for the piano part; note events on every other channel
//!   are skipped over without being emitted.
//! - **Musical time out, wall time later**: the returned events carry
//!   delta-times in quarter-note fractions (metrical files) or milliseconds
//!   (SMPTE timecode files). Tempo events are part of the stream, so a
//!   playback consumer can apply tempo changes as it walks the list.
//! - **No silent corruption**: every read is validated against the buffer
//!   length, so truncated or malformed files surface as typed errors rather
//!   than garbage events.
//!
//! ## Example Usage
//!
//! ```rust
//! use pianola::decoder::decode;
//!
//! // A one-track format 0 file: program change to piano on channel 0,
//! // one note struck and released a quarter note later.
//! let bytes = [
//!     0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, // "MThd", length 6
//!     0x00, 0x00, 0x00, 0x01, 0x00, 0x60,             // format 0, 1 track, 96 tpqn
//!     0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x0B, // "MTrk", length 11
//!     0x00, 0xC0, 0x00,                               // program change: acoustic grand
//!     0x00, 0x90, 0x3C, 0x40,                         // note on, middle C
//!     0x60, 0x80, 0x3C, 0x00,                         // note off, 96 ticks later
//! ];
//!
//! let events = decode(&bytes).expect("well-formed file");
//! assert_eq!(events.len(), 2);
//! ```
//!
//! ## Library Structure
//!
//! - **[`reader`]**: The bounds-checked [`reader::ByteReader`] cursor plus
//!   the variable-length-quantity codec and the [`reader::MidiReadable`]
//!   helper for loading file images.
//! - **[`chunk`]**: Chunk tag constants, the chunk scanner, and `MThd`
//!   header parsing and validation.
//! - **[`event`]**: The decoded event model returned to callers.
//! - **[`decoder`]**: The decode pipeline tying the above together, from
//!   raw bytes to the sorted, time-translated event list.

pub mod chunk;
pub mod decoder;
pub mod event;
pub mod reader;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a raw MIDI Chunk.
/// A MIDI Chunk consists of a 4-byte ASCII type identifier and a 32-bit unsigned integer specifying the length of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    /// 4 byte ASCII chunk type
    pub tag: [u8; 4],
    /// Length of the data that follows
    length: u32,
}

impl Chunk {
    /// Creates a chunk from its tag and declared data length
    pub fn new(tag: [u8; 4], length: u32) -> Self {
        Self { tag, length }
    }

    /// Gets the length of the chunk as a usize
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Returns if the chunk has no attributed data
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[cfg(test)]
mod tests {
    use crate::Chunk;

    #[test]
    fn chunk_reports_length_and_emptiness() {
        let chunk = Chunk::new(*b"MTrk", 10);

        assert_eq!(chunk.len(), 10);
        assert!(!chunk.is_empty());

        let empty = Chunk::new(*b"MTrk", 0);
        assert!(empty.is_empty())
    }
}
