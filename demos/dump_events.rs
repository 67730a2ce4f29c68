//! Example program that decodes a MIDI file and prints the piano part's
//! event list with its musical-time deltas

use pianola::{decoder::decode, reader::MidiReadable};

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("usage: dump_events <file.mid>");

    let data = path.get_midi_bytes().expect("Read the MIDI file bytes");
    let events = decode(&data).expect("Decode the MIDI file");

    for event in events {
        println!("{event:?}");
    }
}
