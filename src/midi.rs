// MIDI output for decoded melodies.
//
// Writes a single-track Standard MIDI File: a tempo event, then a note-on /
// note-off pair per note. Rests become silent time folded into the delta of
// the next event.

use crate::event::Event;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;
use thiserror::Error;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Largest microseconds-per-quarter a tempo meta event can carry (24 bits).
const MAX_TEMPO_MICROSECONDS: u32 = 0xFF_FFFF;

const CHANNEL: u8 = 0;
const VELOCITY: u8 = 80;

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render events to MIDI and write them to `path`.
pub fn write_midi(events: &[Event], path: &Path, tempo_bpm: u32) -> Result<(), MidiError> {
    let smf = events_to_smf(events, tempo_bpm);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &buf)?;
    log::info!("Wrote {} events to {}", events.len(), path.display());
    Ok(())
}

/// Convert quarter-length events to an in-memory SMF.
pub fn events_to_smf(events: &[Event], tempo_bpm: u32) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(crate::APP_NAME.as_bytes())),
    });
    let tempo = tempo_microseconds(tempo_bpm);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo))),
    });

    let mut pending_delta: u32 = 0;
    for event in events {
        let ticks = quarter_length_to_ticks(event.duration());
        match *event {
            Event::Note { pitch, .. } => {
                let key = u7::new(pitch.min(127));
                track.push(TrackEvent {
                    delta: u28::new(pending_delta),
                    kind: TrackEventKind::Midi {
                        channel: u4::new(CHANNEL),
                        message: MidiMessage::NoteOn {
                            key,
                            vel: u7::new(VELOCITY),
                        },
                    },
                });
                track.push(TrackEvent {
                    delta: u28::new(ticks),
                    kind: TrackEventKind::Midi {
                        channel: u4::new(CHANNEL),
                        message: MidiMessage::NoteOff {
                            key,
                            vel: u7::new(0),
                        },
                    },
                });
                pending_delta = 0;
            }
            Event::Rest { .. } => pending_delta += ticks,
        }
    }

    track.push(TrackEvent {
        delta: u28::new(pending_delta),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    smf
}

/// Below 4 bpm the tempo no longer fits in 24 bits; clamp to the slowest
/// representable one.
fn tempo_microseconds(tempo_bpm: u32) -> u32 {
    (60_000_000 / tempo_bpm.max(1)).min(MAX_TEMPO_MICROSECONDS)
}

fn quarter_length_to_ticks(quarter_length: f64) -> u32 {
    (quarter_length * TICKS_PER_QUARTER as f64).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_ons(smf: &Smf) -> Vec<u8> {
        smf.tracks[0]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some(key.as_int()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_events_to_smf_basic() {
        let events = vec![
            Event::Note { pitch: 60, duration: 0.75 },
            Event::Rest { duration: 0.25 },
            Event::Note { pitch: 62, duration: 1.0 },
        ];
        let smf = events_to_smf(&events, 120);
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(note_ons(&smf), vec![60, 62]);

        let total_ticks: u32 = smf.tracks[0].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(total_ticks, 2 * TICKS_PER_QUARTER as u32);
    }

    #[test]
    fn test_rest_delays_next_note() {
        let events = vec![Event::Rest { duration: 0.5 }, Event::Note { pitch: 64, duration: 0.25 }];
        let smf = events_to_smf(&events, 90);
        let note_on = smf.tracks[0]
            .iter()
            .find(|e| matches!(e.kind, TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }))
            .unwrap();
        assert_eq!(note_on.delta.as_int(), 240);
    }

    #[test]
    fn test_write_midi_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("mel.mid");
        write_midi(&[Event::Note { pitch: 67, duration: 1.0 }], &path, 120).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(note_ons(&smf), vec![67]);
    }

    fn tempo_of(smf: &Smf) -> u32 {
        smf.tracks[0]
            .iter()
            .find_map(|e| match e.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_slow_tempo_is_clamped() {
        let events = [Event::Note { pitch: 60, duration: 1.0 }];
        assert_eq!(tempo_of(&events_to_smf(&events, 120)), 500_000);
        assert_eq!(tempo_of(&events_to_smf(&events, 4)), 15_000_000);
        assert_eq!(tempo_of(&events_to_smf(&events, 3)), MAX_TEMPO_MICROSECONDS);
        assert_eq!(tempo_of(&events_to_smf(&events, 0)), MAX_TEMPO_MICROSECONDS);
    }
}
