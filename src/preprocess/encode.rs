use crate::event::Event;
use crate::token::Token;

/// Encode a song as fixed-step tokens.
///
/// Each event contributes `floor(duration / time_step)` tokens: its symbol
/// followed by continuation markers. `[Note(60, 1.0)]` at 0.25 becomes
/// `60 _ _ _`. Durations that are not a multiple of `time_step` are truncated
/// to whole steps, and an event shorter than one step vanishes.
pub fn encode_song(events: &[Event], time_step: f64) -> Vec<Token> {
    let mut encoded = Vec::new();
    for event in events {
        let symbol = match event.pitch() {
            Some(pitch) => Token::Pitch(pitch),
            None => Token::Rest,
        };

        let steps = (event.duration() / time_step) as usize;
        for step in 0..steps {
            if step == 0 {
                encoded.push(symbol);
            } else {
                encoded.push(Token::Continuation);
            }
        }
    }
    encoded
}
