use std::path::PathBuf;

use overworld_engine::sim::{GridPos, IdSet, OverworldSession, SessionEvent, SCREEN_TITLE};
use overworld_engine::{
    ActionQueue, ActionStates, Canvas, InputDispatcher, InputError, Scene, SceneCommand,
    SubscriptionId,
};
use tracing::{debug, info, warn};

use super::persistence::{read_save, write_save, SaveGame};

mod audio;
#[cfg(test)]
mod fixtures;
mod painter;

use audio::AudioRouter;

/// The overworld screen. Owns the session and bridges it to input, audio
/// routing and the save file.
pub(crate) struct OverworldScene {
    session: OverworldSession,
    queue: ActionQueue,
    subscription: Option<SubscriptionId>,
    save_path: PathBuf,
    audio: AudioRouter,
    restore_pending: bool,
    quit_requested: bool,
}

impl OverworldScene {
    pub(crate) fn new(session: OverworldSession, save_path: PathBuf) -> Self {
        Self {
            session,
            queue: ActionQueue::new(),
            subscription: None,
            save_path,
            audio: AudioRouter::default(),
            restore_pending: true,
            quit_requested: false,
        }
    }

    fn restore_saved_position(&mut self) {
        match read_save(&self.save_path) {
            Ok(Some(save)) => {
                if self.session.restore_actor(save.position, save.direction) {
                    info!(x = save.position.x, y = save.position.y, "progress_restored");
                } else {
                    warn!(x = save.position.x, y = save.position.y, "save_position_rejected");
                }
            }
            Ok(None) => {}
            Err(error) => warn!(error = %error, "save_read_failed"),
        }
    }

    fn save(&self) {
        let actor = self.session.actor();
        let save = SaveGame {
            position: actor.position(),
            direction: actor.direction(),
        };
        if let Err(error) = write_save(&self.save_path, &save) {
            warn!(error = %error, "save_failed");
        }
    }

    fn handle_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::AudioContext(context) => {
                    self.audio.switch_to(context);
                }
                SessionEvent::SaveRequested => self.save(),
                SessionEvent::ScreenRequest { screen, return_to } => {
                    self.open_screen(&screen, return_to)
                }
                SessionEvent::EncounterStarted { entity_id } => {
                    debug!(entity_id = %entity_id, "encounter_flash_started");
                }
                SessionEvent::EncounterEnded { entity_id, outcome } => {
                    info!(
                        entity_id = %entity_id,
                        outcome = ?outcome,
                        seen = self.session.seen().len(),
                        caught = self.session.caught().len(),
                        "encounter_finished"
                    );
                }
            }
        }
    }

    /// Only the overworld is playable; every other screen hands control
    /// straight back at the recorded return tile. The title screen quits.
    fn open_screen(&mut self, screen: &str, return_to: GridPos) {
        if screen == SCREEN_TITLE {
            info!("title_requested");
            self.quit_requested = true;
            return;
        }
        self.audio.switch_to(screen);
        info!(
            screen,
            return_x = return_to.x,
            return_y = return_to.y,
            "screen_unavailable"
        );
        let events = self.session.enter();
        self.handle_events(events);
    }
}

impl Scene for OverworldScene {
    fn load(&mut self, input: &mut InputDispatcher) -> Result<(), InputError> {
        if self.subscription.is_none() {
            self.subscription = Some(input.subscribe(self.queue.handler())?);
        }
        if std::mem::take(&mut self.restore_pending) {
            self.restore_saved_position();
        }
        let events = self.session.enter();
        self.handle_events(events);
        Ok(())
    }

    fn update(&mut self, _fixed_dt_seconds: f32, held: &ActionStates) -> SceneCommand {
        let edges = self.queue.drain();
        let events = self.session.tick(&edges, held);
        self.handle_events(events);
        if self.quit_requested {
            SceneCommand::Quit
        } else {
            SceneCommand::None
        }
    }

    fn render(&self, canvas: &mut Canvas<'_>) {
        painter::paint(&self.session, canvas);
    }

    fn unload(&mut self, input: &mut InputDispatcher) {
        if let Some(id) = self.subscription.take() {
            if let Err(error) = input.unsubscribe(id) {
                warn!(error = %error, "input_unsubscribe_failed");
            }
        }
        self.queue.clear();
    }

    fn debug_title(&self) -> Option<String> {
        let position = self.session.actor().position();
        Some(format!(
            "{} | ({}, {}) | {:?}",
            self.session.world().name,
            position.x,
            position.y,
            self.session.focus()
        ))
    }
}
