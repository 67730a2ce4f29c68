//! The decode pipeline: track scanning, the per-track event state machine,
//! piano-channel inference, and tick-to-musical-time translation

use log::debug;
use thiserror::Error;

use crate::{
    chunk::{
        self,
        header::{Division, FileHeader, Format, HeaderError},
        TRACK_DATA_CHUNK,
    },
    event::{EventKind, TickedEvent, TimedEvent},
    reader::{BufferOverrun, ByteReader},
};

/// Prefix byte of a meta event
const META_PREFIX: u8 = 0xFF;
/// Prefix bytes of a system exclusive event
const SYSEX_PREFIXES: [u8; 2] = [0xF0, 0xF7];
/// Meta event type carrying microseconds per quarter note
const META_TEMPO: u8 = 0x51;

/// Note off channel message, top nibble
const NOTE_OFF: u8 = 0x80;
/// Note on channel message, top nibble
const NOTE_ON: u8 = 0x90;
/// Polyphonic aftertouch channel message, top nibble
const NOTE_AFTERTOUCH: u8 = 0xA0;
/// Controller change channel message, top nibble
const CONTROLLER: u8 = 0xB0;
/// Program change channel message, top nibble
const PROGRAM_CHANGE: u8 = 0xC0;
/// Channel aftertouch message, top nibble
const CHANNEL_AFTERTOUCH: u8 = 0xD0;
/// Pitch bend channel message, top nibble
const PITCH_BEND: u8 = 0xE0;

/// Highest program number in the General MIDI piano family
const LAST_PIANO_PROGRAM: u8 = 7;

/// Errors that abort a decode
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The file header chunk failed validation
    #[error("invalid file header: {0}")]
    Header(#[from] HeaderError),
    /// A channel message whose opcode has no known data length
    #[error("unsupported channel message status {status:#04x} at byte {offset}")]
    UnexpectedMidiEvent {
        /// The offending status byte
        status: u8,
        /// Offset of the message within the input buffer
        offset: usize,
    },
    /// A track's event stream did not end exactly on its declared length
    #[error("track events ran past the declared chunk end, cursor at byte {0}")]
    TrackLength(usize),
    /// A read passed the end of the supplied buffer
    #[error(transparent)]
    BufferOverrun(#[from] BufferOverrun),
}

/// Tracks which channel carries the piano part.
///
/// A program change to one of the General MIDI piano programs (0-7) claims
/// its channel; when several channels claim, the lowest channel number wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PianoChannel {
    /// Lowest channel seen carrying a piano program, if any
    channel: Option<u8>,
}

impl PianoChannel {
    /// Records a program change, claiming `channel` if the program is a piano
    fn observe(&mut self, channel: u8, program: u8) {
        if program <= LAST_PIANO_PROGRAM {
            self.channel = Some(match self.channel {
                Some(current) => current.min(channel),
                None => channel,
            });
        }
    }

    /// True once any channel has been claimed
    fn found(&self) -> bool {
        self.channel.is_some()
    }

    /// True if `channel` is the claimed piano channel
    fn matches(&self, channel: u8) -> bool {
        self.channel == Some(channel)
    }

    /// Forgets the claimed channel
    fn reset(&mut self) {
        self.channel = None;
    }
}

/// Decodes a complete Standard MIDI File image into the piano part's
/// time-ordered event sequence.
///
/// The returned events are sorted non-decreasingly by their position on the
/// tick timeline; events falling on the same tick keep the order in which
/// they were decoded (tracks in file order, events in track order). Each
/// event carries the musical-time distance from its predecessor, per the
/// header's division mode.
pub fn decode(data: &[u8]) -> Result<Vec<TimedEvent>, DecodeError> {
    let mut reader = ByteReader::new(data);
    let header = FileHeader::read(&mut reader)?;

    let mut events = Vec::new();
    let mut tick: u64 = 0;
    let mut piano = PianoChannel::default();

    for _ in 0..header.ntracks() {
        match header.format() {
            // A single track owns the whole timeline
            Format::Zero => {}
            // Simultaneous tracks each restart the clock at song start.
            // Once one track yielded the piano part the rest are hopped over
            Format::One => {
                tick = 0;
                if piano.found() {
                    let track_chunk = chunk::seek(&mut reader, TRACK_DATA_CHUNK)?;
                    reader.skip(track_chunk.len())?;
                    debug!(
                        "piano part already found, skipping {} byte track",
                        track_chunk.len()
                    );
                    continue;
                }
            }
            // Independent patterns: nothing carries over between tracks
            Format::Two => {
                tick = 0;
                piano.reset();
            }
        }

        decode_track(&mut reader, &mut events, &mut tick, &mut piano)?;
    }

    // Stable sort, so simultaneous events keep their decode order
    events.sort_by_key(|event| event.tick);

    Ok(translate_time(&events, header.division()))
}

/// Decodes one `MTrk` chunk's event stream, appending the piano part's
/// events stamped with their absolute tick position.
fn decode_track(
    reader: &mut ByteReader<'_>,
    events: &mut Vec<TickedEvent>,
    tick: &mut u64,
    piano: &mut PianoChannel,
) -> Result<(), DecodeError> {
    let track_chunk = chunk::seek(reader, TRACK_DATA_CHUNK)?;
    let end = reader.position() + track_chunk.len();

    let mut running_status: u8 = 0;
    while reader.position() < end {
        let delta = reader.read_var_len()?;
        *tick += delta;

        let offset = reader.position();
        let mut status = reader.read_u8()?;
        if status & 0x80 == 0 {
            // Running status: the byte just read is the first data byte of
            // the previous message, so hand it back to the reader
            status = running_status;
            reader.rewind_one();
        } else {
            running_status = status;
        }

        if status == META_PREFIX {
            decode_meta(reader, events, *tick)?;
            continue;
        }

        if SYSEX_PREFIXES.contains(&status) {
            let length = reader.read_var_len()?;
            reader.skip(length as usize)?;
            continue;
        }

        decode_channel_message(reader, events, *tick, piano, status, offset)?;
    }

    if reader.position() != end {
        return Err(DecodeError::TrackLength(reader.position()));
    }

    Ok(())
}

/// Decodes one meta event, emitting tempo changes and skipping everything
/// else by its declared length
fn decode_meta(
    reader: &mut ByteReader<'_>,
    events: &mut Vec<TickedEvent>,
    tick: u64,
) -> Result<(), BufferOverrun> {
    let meta_type = reader.read_u8()?;
    let length = reader.read_var_len()?;

    if meta_type == META_TEMPO {
        let tempo = reader.read_u24()?;
        events.push(TickedEvent {
            kind: EventKind::TempoSet(tempo),
            tick,
        });
    } else {
        reader.skip(length as usize)?;
    }

    Ok(())
}

/// Decodes one channel voice/mode message, emitting note events on the
/// piano channel and hopping over everything else
fn decode_channel_message(
    reader: &mut ByteReader<'_>,
    events: &mut Vec<TickedEvent>,
    tick: u64,
    piano: &mut PianoChannel,
    status: u8,
    offset: usize,
) -> Result<(), DecodeError> {
    let message = status & 0xF0;
    let channel = status & 0x0F;

    // Program changes feed channel inference and are never emitted
    if message == PROGRAM_CHANGE {
        let program = reader.read_u8()?;
        piano.observe(channel, program);
        return Ok(());
    }

    let is_note = message == NOTE_ON || message == NOTE_OFF;
    if !piano.matches(channel) || !is_note {
        // Not part of the piano part: hop over the fixed data bytes
        let data_bytes = match message {
            NOTE_OFF | NOTE_ON | NOTE_AFTERTOUCH | CONTROLLER | PITCH_BEND => 2,
            CHANNEL_AFTERTOUCH => 1,
            _ => return Err(DecodeError::UnexpectedMidiEvent { status, offset }),
        };
        reader.skip(data_bytes)?;
        return Ok(());
    }

    let note = reader.read_u8()?;
    let velocity = reader.read_u8()?;

    // A note-on at zero velocity is the conventional note-off spelling
    let kind = if message == NOTE_OFF || velocity == 0 {
        EventKind::NoteOff(note)
    } else {
        EventKind::NoteOn(note)
    };
    events.push(TickedEvent { kind, tick });

    Ok(())
}

/// Converts absolute tick positions into per-event musical-time deltas
fn translate_time(events: &[TickedEvent], division: Division) -> Vec<TimedEvent> {
    let mut last_tick = 0;
    events
        .iter()
        .map(|event| {
            let delta_ticks = event.tick - last_tick;
            last_tick = event.tick;

            let delta_time = match division {
                // Fraction of a quarter note; the playback consumer scales
                // it by the tempo currently in effect
                Division::Metrical(tpqn) => delta_ticks as f64 / f64::from(tpqn),
                // Milliseconds; timecode timing is tempo independent
                Division::TimeCodeBased(smpte) => {
                    let ticks_per_second = u32::from(smpte.frames_per_second())
                        * u32::from(smpte.sub_frame_resolution());
                    1000.0 * delta_ticks as f64 / f64::from(ticks_per_second)
                }
            };

            TimedEvent {
                kind: event.kind,
                delta_time,
            }
        })
        .collect()
}
