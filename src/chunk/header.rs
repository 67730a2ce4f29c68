//! Header chunk parsing and validation

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{self, HEADER_CHUNK},
    decoder::DecodeError,
    reader::ByteReader,
};

/// Errors from validating the `MThd` header chunk
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// The header chunk's declared length was not the fixed six bytes
    #[error("header chunk declares {0} bytes of data, expected 6")]
    Length(u32),
    /// Format word outside the three defined file formats
    #[error("unknown file format {0}")]
    Format(u16),
    /// A single-track (format 0) file declaring more than one track
    #[error("format 0 file declares {0} tracks, expected exactly 1")]
    TrackCount(u16),
}

/// Header chunk data: file format, track count and time division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileHeader {
    /// The MIDI format
    format: Format,
    /// Number of track chunks that follow the header
    ntracks: u16,
    /// The meaning of event delta-times
    division: Division,
}

impl FileHeader {
    /// Locates the `MThd` chunk and parses its fixed six-byte body.
    ///
    /// Chunks with foreign tags ahead of the header are skipped by their
    /// declared length. The declared header length must be exactly 6, the
    /// format must be 0, 1 or 2, and a format 0 file must declare a single
    /// track.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let header_chunk = chunk::seek(reader, HEADER_CHUNK)?;
        if header_chunk.len() != 6 {
            return Err(HeaderError::Length(header_chunk.len() as u32).into());
        }

        let format = Format::try_from(reader.read_u16()?)?;

        let ntracks = reader.read_u16()?;
        if format == Format::Zero && ntracks != 1 {
            return Err(HeaderError::TrackCount(ntracks).into());
        }

        let division = Division::from(reader.read_u16()?);

        Ok(Self {
            format,
            ntracks,
            division,
        })
    }

    /// The file's chunk layout semantics
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of track chunks the file declares
    pub fn ntracks(&self) -> u16 {
        self.ntracks
    }

    /// How delta-times translate into musical time
    pub fn division(&self) -> Division {
        self.division
    }
}

/// The overall organization of the MIDI file. Only three values are valid,
/// making most of the 16 bits irrelevant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// The file contains a single multi-channel track
    Zero,
    /// The file contains one or more simultaneous tracks of a sequence
    One,
    /// The file contains one or more sequentially independent single-track patterns
    Two,
}

impl TryFrom<u16> for Format {
    type Error = HeaderError;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Zero),
            1 => Ok(Format::One),
            2 => Ok(Format::Two),
            _ => Err(HeaderError::Format(value)),
        }
    }
}

/// The meaning of the delta-times in the MIDI sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Division {
    /// When bit 15 is a 0, bits 14-0 represent ticks per quarter note
    Metrical(u16),
    /// When bit 15 is 1, bits 15-8 hold the negative SMPTE frame rate and
    /// bits 7-0 the sub-frame resolution
    TimeCodeBased(SmpteTicks),
}

/// Division defined by time-code-based time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmpteTicks {
    /// Frame rate byte, a two's-complement negative per the SMPTE
    /// convention (0xE8 is 24 fps)
    smpte: i8,
    /// Number of sub-divisions of a single frame
    tpf: u8,
}

impl SmpteTicks {
    /// The frame rate as a positive count: 24, 25, 29 or 30
    pub fn frames_per_second(&self) -> u8 {
        self.smpte.unsigned_abs()
    }

    /// Number of sub-divisions of a single frame
    pub fn sub_frame_resolution(&self) -> u8 {
        self.tpf
    }
}

impl From<u16> for Division {
    fn from(value: u16) -> Self {
        if value & 0x8000 == 0 {
            Division::Metrical(value & 0x7FFF)
        } else {
            // The whole high byte is the frame rate; bit 15 doubles as the
            // sign bit of its two's-complement representation
            Division::TimeCodeBased(SmpteTicks {
                smpte: (value >> 8) as u8 as i8,
                tpf: value as u8,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Division, FileHeader, Format, HeaderError};
    use crate::{decoder::DecodeError, reader::ByteReader};

    /// A raw header chunk with the given body words
    fn header_bytes(length: u32, format: u16, ntracks: u16, division: u16) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend(length.to_be_bytes());
        bytes.extend(format.to_be_bytes());
        bytes.extend(ntracks.to_be_bytes());
        bytes.extend(division.to_be_bytes());
        bytes
    }

    #[test]
    fn parsing_division_to_metrical_works() {
        let test: Division = (0x000Au16).into();
        let expected = Division::Metrical(10);

        assert_eq!(test, expected)
    }

    #[test]
    fn parsing_division_to_timecode_works() {
        // 25 fps at 40 sub-frames: one tick per millisecond
        let Division::TimeCodeBased(ticks) = Division::from(0xE728u16) else {
            panic!("expected timecode division");
        };

        assert_eq!(ticks.frames_per_second(), 25);
        assert_eq!(ticks.sub_frame_resolution(), 40);
    }

    #[test]
    fn all_smpte_frame_rates_recover_positive() {
        for (word, fps) in [
            (0xE802u16, 24u8),
            (0xE728, 25),
            (0xE304, 29),
            (0xE250, 30),
        ] {
            let Division::TimeCodeBased(ticks) = Division::from(word) else {
                panic!("expected timecode division");
            };
            assert_eq!(ticks.frames_per_second(), fps);
        }
    }

    #[test]
    fn header_chunk_reads_properly() {
        let bytes = header_bytes(6, 1, 10, 384);
        let mut reader = ByteReader::new(&bytes);

        let header = FileHeader::read(&mut reader).unwrap();

        assert_eq!(header.format(), Format::One);
        assert_eq!(header.ntracks(), 10);
        assert_eq!(header.division(), Division::Metrical(384));
    }

    #[test]
    fn header_length_other_than_six_is_rejected() {
        let bytes = header_bytes(8, 0, 1, 96);
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(
            FileHeader::read(&mut reader),
            Err(DecodeError::Header(HeaderError::Length(8)))
        );
    }

    #[test]
    fn unknown_format_is_rejected() {
        let bytes = header_bytes(6, 3, 1, 96);
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(
            FileHeader::read(&mut reader),
            Err(DecodeError::Header(HeaderError::Format(3)))
        );
    }

    #[test]
    fn format_zero_requires_a_single_track() {
        let bytes = header_bytes(6, 0, 2, 96);
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(
            FileHeader::read(&mut reader),
            Err(DecodeError::Header(HeaderError::TrackCount(2)))
        );
    }
}
