use overworld_engine::sim::{AUDIO_ENCOUNTER, AUDIO_OVERWORLD, SCREEN_COLLECTION, SCREEN_TITLE};
use tracing::info;

const MENU_TRACK: &str = "menu";

const SCREEN_TRACKS: [(&str, &str); 10] = [
    (SCREEN_TITLE, "title"),
    (AUDIO_OVERWORLD, "overworld"),
    (AUDIO_ENCOUNTER, "encounter"),
    (SCREEN_COLLECTION, MENU_TRACK),
    ("skills", MENU_TRACK),
    ("projects", MENU_TRACK),
    ("experience", MENU_TRACK),
    ("about", MENU_TRACK),
    ("contact", MENU_TRACK),
    ("intro", "intro"),
];

/// Screen and audio-context routing to music tracks. A context with no track
/// stops the music.
#[derive(Debug, Default)]
pub(crate) struct AudioRouter {
    current: Option<&'static str>,
}

impl AudioRouter {
    pub(crate) fn track_for(context: &str) -> Option<&'static str> {
        SCREEN_TRACKS
            .iter()
            .find(|(name, _)| *name == context)
            .map(|(_, track)| *track)
    }

    pub(crate) fn current(&self) -> Option<&'static str> {
        self.current
    }

    /// Returns `true` when the playing track changed.
    pub(crate) fn switch_to(&mut self, context: &str) -> bool {
        let track = Self::track_for(context);
        if self.current == track {
            return false;
        }
        match track {
            Some(track) => info!(context, track, "audio_track_changed"),
            None => info!(context, "audio_stopped"),
        }
        self.current = track;
        true
    }
}
