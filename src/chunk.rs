//! Chunk scanning over the raw byte stream

use log::debug;

use crate::{
    reader::{BufferOverrun, ByteReader},
    Chunk,
};

pub mod header;

/// Tag of the file header chunk
pub const HEADER_CHUNK: [u8; 4] = *b"MThd";
/// Tag of a track data chunk
pub const TRACK_DATA_CHUNK: [u8; 4] = *b"MTrk";

/// Advances the reader to the next chunk carrying `tag`.
///
/// Chunks with any other tag are hopped over using their own declared
/// length. On success the cursor sits at the first byte of the matching
/// chunk's data. Running off the end of the buffer before a match is found
/// is a [`BufferOverrun`].
pub fn seek(reader: &mut ByteReader<'_>, tag: [u8; 4]) -> Result<Chunk, BufferOverrun> {
    loop {
        let found = reader.read_tag()?;
        let length = reader.read_u32()?;

        if found == tag {
            return Ok(Chunk::new(found, length));
        }

        debug!(
            "skipping {} byte \"{}\" chunk",
            length,
            String::from_utf8_lossy(&found)
        );
        reader.skip(length as usize)?;
    }
}

#[cfg(test)]
mod tests {
    use super::{seek, HEADER_CHUNK, TRACK_DATA_CHUNK};
    use crate::reader::{BufferOverrun, ByteReader};

    #[test]
    fn matching_chunk_is_found_at_the_cursor() {
        let mut data = b"MThd".to_vec();
        data.extend(6u32.to_be_bytes());

        let mut reader = ByteReader::new(&data);
        let chunk = seek(&mut reader, HEADER_CHUNK).unwrap();

        assert_eq!(chunk.tag, HEADER_CHUNK);
        assert_eq!(chunk.len(), 6);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn foreign_chunks_are_skipped_by_declared_length() {
        let mut data = b"XFIR".to_vec();
        data.extend(3u32.to_be_bytes());
        data.extend([0xAA, 0xBB, 0xCC]);
        data.extend(b"MTrk");
        data.extend(4u32.to_be_bytes());

        let mut reader = ByteReader::new(&data);
        let chunk = seek(&mut reader, TRACK_DATA_CHUNK).unwrap();

        assert_eq!(chunk.tag, TRACK_DATA_CHUNK);
        assert_eq!(chunk.len(), 4);
    }

    #[test]
    fn missing_chunk_reports_an_overrun() {
        let mut data = b"XFIR".to_vec();
        data.extend(0u32.to_be_bytes());

        let mut reader = ByteReader::new(&data);
        let result = seek(&mut reader, TRACK_DATA_CHUNK);

        assert_eq!(result, Err(BufferOverrun { offset: 8 }));
    }
}
