use crate::event::Event;

/// Check that every note/rest duration is one of `acceptable` (exact value match).
/// An empty song passes.
pub fn has_acceptable_durations(events: &[Event], acceptable: &[f64]) -> bool {
    first_unacceptable_duration(events, acceptable).is_none()
}

/// The first duration not in `acceptable`, if any. Used for skip logging.
pub fn first_unacceptable_duration(events: &[Event], acceptable: &[f64]) -> Option<f64> {
    events
        .iter()
        .map(Event::duration)
        .find(|d| !acceptable.contains(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ACCEPTABLE_DURATIONS;

    fn note(duration: f64) -> Event {
        Event::Note { pitch: 60, duration }
    }

    #[test]
    fn test_all_acceptable() {
        let events = vec![note(1.0), Event::Rest { duration: 0.5 }, note(0.75), note(4.0)];
        assert!(has_acceptable_durations(&events, ACCEPTABLE_DURATIONS));
    }

    #[test]
    fn test_rejects_triplet() {
        let events = vec![note(1.0), note(1.0 / 3.0), note(2.0)];
        assert!(!has_acceptable_durations(&events, ACCEPTABLE_DURATIONS));
        assert_eq!(
            first_unacceptable_duration(&events, ACCEPTABLE_DURATIONS),
            Some(1.0 / 3.0)
        );
    }

    #[test]
    fn test_rejects_unacceptable_rest() {
        let events = vec![note(1.0), Event::Rest { duration: 0.125 }];
        assert!(!has_acceptable_durations(&events, ACCEPTABLE_DURATIONS));
    }

    #[test]
    fn test_empty_song_passes() {
        assert!(has_acceptable_durations(&[], ACCEPTABLE_DURATIONS));
        assert!(has_acceptable_durations(&[], &[]));
    }

    #[test]
    fn test_matches_all_membership() {
        let acceptable = [0.5, 1.0];
        let songs = [
            vec![note(0.5), note(1.0)],
            vec![note(0.5), note(0.25)],
            vec![note(3.0)],
        ];
        for song in &songs {
            let expected = song.iter().all(|e| acceptable.contains(&e.duration()));
            assert_eq!(has_acceptable_durations(song, &acceptable), expected);
        }
    }
}
