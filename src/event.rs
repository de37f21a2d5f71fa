use serde::{Deserialize, Serialize};

/// A single monophonic note or rest, duration in quarter lengths.
///
/// Songs arrive from the notation service as JSON arrays of these, e.g.
/// `[{"kind": "note", "pitch": 60, "duration": 1.0}, {"kind": "rest", "duration": 0.5}]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    Note { pitch: u8, duration: f64 },
    Rest { duration: f64 },
}

impl Event {
    pub fn duration(&self) -> f64 {
        match *self {
            Event::Note { duration, .. } | Event::Rest { duration } => duration,
        }
    }

    pub fn pitch(&self) -> Option<u8> {
        match *self {
            Event::Note { pitch, .. } => Some(pitch),
            Event::Rest { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let events: Vec<Event> = serde_json::from_str(
            r#"[{"kind":"note","pitch":60,"duration":1.0},{"kind":"rest","duration":0.5}]"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                Event::Note { pitch: 60, duration: 1.0 },
                Event::Rest { duration: 0.5 },
            ]
        );
        assert_eq!(events[0].pitch(), Some(60));
        assert_eq!(events[1].pitch(), None);
        assert_eq!(events[1].duration(), 0.5);
    }
}
