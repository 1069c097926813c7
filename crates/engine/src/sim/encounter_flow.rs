use std::time::Duration;

use tracing::{debug, info};

use crate::app::{ActionEdge, InputAction, KeyEdge};

use super::dialog::{DialogConfig, DialogSession, DialogStep};
use super::encounter::{EncounterEntity, EncounterError};
use super::ids::IdSet;
use super::timers::{millis_to_ticks, Liveness, TimerQueue};

const HIDE_ENTITY_MS: u64 = 600;
const WOBBLE_MS: u64 = 800;
const SETTLE_MS: u64 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterPhase {
    Triggered,
    MenuShown,
    Inspecting,
    CatchMenu,
    Animating,
    Resolved,
}

impl EncounterPhase {
    pub fn label(self) -> &'static str {
        match self {
            EncounterPhase::Triggered => "triggered",
            EncounterPhase::MenuShown => "menu_shown",
            EncounterPhase::Inspecting => "inspecting",
            EncounterPhase::CatchMenu => "catch_menu",
            EncounterPhase::Animating => "animating",
            EncounterPhase::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterCue {
    HideEntity,
    Wobble,
    Settle,
}

impl EncounterCue {
    fn label(self) -> &'static str {
        match self {
            EncounterCue::HideEntity => "hide_entity",
            EncounterCue::Wobble => "wobble",
            EncounterCue::Settle => "settle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterOutcome {
    Ran,
    Released,
    Caught { first_time: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchAnimation {
    pub entity_visible: bool,
    pub wobbling: bool,
    pub captured: bool,
}

impl Default for CatchAnimation {
    fn default() -> Self {
        Self {
            entity_visible: true,
            wobbling: false,
            captured: false,
        }
    }
}

pub const MAIN_MENU: [&str; 2] = ["INSPECT", "RUN"];
pub const CATCH_MENU: [&str; 2] = ["CATCH", "RELEASE"];

/// Collaborators the flow touches while handling input or cues.
pub struct EncounterContext<'a> {
    pub caught: &'a mut dyn IdSet,
    pub timers: &'a mut TimerQueue<EncounterCue>,
}

/// One encounter from trigger to resolution. Dropping it invalidates every
/// timer it scheduled.
#[derive(Debug)]
pub struct EncounterSession {
    entity: EncounterEntity,
    phase: EncounterPhase,
    menu_cursor: usize,
    catch_cursor: usize,
    dialog: Option<DialogSession>,
    dialog_config: DialogConfig,
    ticks_per_second: u32,
    animation: CatchAnimation,
    outcome: Option<EncounterOutcome>,
    finished: bool,
    liveness: Liveness,
}

impl EncounterSession {
    pub fn new(entity: EncounterEntity) -> Self {
        Self {
            entity,
            phase: EncounterPhase::Triggered,
            menu_cursor: 0,
            catch_cursor: 0,
            dialog: None,
            dialog_config: DialogConfig::default(),
            ticks_per_second: 60,
            animation: CatchAnimation::default(),
            outcome: None,
            finished: false,
            liveness: Liveness::new(),
        }
    }

    /// Opens the intro dialog. Input is ignored until this runs.
    pub fn begin(&mut self, dialog_config: &DialogConfig, ticks_per_second: u32) {
        if self.phase != EncounterPhase::Triggered || self.dialog.is_some() {
            return;
        }
        self.dialog_config = dialog_config.clone();
        self.ticks_per_second = ticks_per_second.max(1);
        let intro = format!("A wild {} appeared!", self.entity.name);
        self.open_dialog(vec![intro]);
    }

    pub fn entity(&self) -> &EncounterEntity {
        &self.entity
    }

    pub fn phase(&self) -> EncounterPhase {
        self.phase
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    pub fn catch_cursor(&self) -> usize {
        self.catch_cursor
    }

    pub fn dialog(&self) -> Option<&DialogSession> {
        self.dialog.as_ref()
    }

    pub fn animation(&self) -> CatchAnimation {
        self.animation
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn tick(&mut self, dt: Duration) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        if dialog.tick(dt) == Some(DialogStep::Completed) || dialog.is_complete() {
            self.on_dialog_complete();
        }
    }

    pub fn handle_edge(&mut self, edge: ActionEdge, ctx: &mut EncounterContext<'_>) {
        if edge.edge != KeyEdge::Down || self.finished {
            return;
        }
        if let Some(dialog) = self.dialog.as_mut() {
            let step = match edge.action {
                InputAction::A => dialog.advance(),
                InputAction::B => dialog.force_close(),
                _ => DialogStep::Ignored,
            };
            if step == DialogStep::Completed {
                self.on_dialog_complete();
            }
            return;
        }

        match (self.phase, edge.action) {
            (EncounterPhase::MenuShown, InputAction::Up) => self.menu_cursor = 0,
            (EncounterPhase::MenuShown, InputAction::Down) => self.menu_cursor = 1,
            (EncounterPhase::MenuShown, InputAction::A) => {
                if self.menu_cursor == 0 {
                    self.inspect();
                } else {
                    self.run();
                }
            }
            (EncounterPhase::MenuShown, InputAction::B) => self.run(),
            (EncounterPhase::CatchMenu, InputAction::Up) => self.catch_cursor = 0,
            (EncounterPhase::CatchMenu, InputAction::Down) => self.catch_cursor = 1,
            (EncounterPhase::CatchMenu, InputAction::A) => {
                if self.catch_cursor == 0 {
                    self.start_catch(ctx.timers);
                } else {
                    self.release();
                }
            }
            (EncounterPhase::CatchMenu, InputAction::B) => {
                self.phase = EncounterPhase::MenuShown;
                self.menu_cursor = 0;
            }
            _ => {}
        }
    }

    /// Applies a fired animation cue. Cues only make sense while animating.
    pub fn on_cue(
        &mut self,
        cue: EncounterCue,
        ctx: &mut EncounterContext<'_>,
    ) -> Result<(), EncounterError> {
        if self.phase != EncounterPhase::Animating {
            return Err(EncounterError::UnexpectedCue {
                cue: cue.label(),
                phase: self.phase.label(),
            });
        }
        match cue {
            EncounterCue::HideEntity => self.animation.entity_visible = false,
            EncounterCue::Wobble => self.animation.wobbling = true,
            EncounterCue::Settle => {
                self.animation.wobbling = false;
                self.animation.captured = true;
                let first_time = ctx.caught.add(&self.entity.id);
                self.outcome = Some(EncounterOutcome::Caught { first_time });
                self.phase = EncounterPhase::Resolved;
                info!(entity = %self.entity.id, first_time, "encounter_caught");
                let lines = if first_time {
                    vec![
                        format!("{} was caught!", self.entity.name),
                        "It has been added to your PROFILE.".to_string(),
                    ]
                } else {
                    vec![
                        format!("You already know about {}.", self.entity.name),
                        "But it's good to be reminded.".to_string(),
                    ]
                };
                self.open_dialog(lines);
            }
        }
        Ok(())
    }

    fn inspect(&mut self) {
        self.phase = EncounterPhase::Inspecting;
        self.open_dialog(vec![self.entity.description.clone()]);
    }

    fn run(&mut self) {
        self.resolve(EncounterOutcome::Ran, vec!["Got away safely!".to_string()]);
    }

    fn release(&mut self) {
        self.resolve(
            EncounterOutcome::Released,
            vec![
                format!("{} was released.", self.entity.name),
                "You let it go freely.".to_string(),
            ],
        );
    }

    fn resolve(&mut self, outcome: EncounterOutcome, lines: Vec<String>) {
        self.outcome = Some(outcome);
        self.phase = EncounterPhase::Resolved;
        info!(entity = %self.entity.id, ?outcome, "encounter_resolved");
        self.open_dialog(lines);
    }

    fn start_catch(&mut self, timers: &mut TimerQueue<EncounterCue>) {
        self.phase = EncounterPhase::Animating;
        self.animation = CatchAnimation::default();
        let tps = self.ticks_per_second;
        for (millis, cue) in [
            (HIDE_ENTITY_MS, EncounterCue::HideEntity),
            (WOBBLE_MS, EncounterCue::Wobble),
            (SETTLE_MS, EncounterCue::Settle),
        ] {
            timers.schedule(millis_to_ticks(millis, tps), self.liveness.token(), cue);
        }
        debug!(entity = %self.entity.id, "encounter_catch_started");
    }

    fn open_dialog(&mut self, lines: Vec<String>) {
        self.dialog = Some(DialogSession::new(lines, &self.dialog_config));
    }

    fn on_dialog_complete(&mut self) {
        self.dialog = None;
        match self.phase {
            EncounterPhase::Triggered => {
                self.phase = EncounterPhase::MenuShown;
                self.menu_cursor = 0;
            }
            EncounterPhase::Inspecting => {
                if self.entity.catchable {
                    self.phase = EncounterPhase::CatchMenu;
                    self.catch_cursor = 0;
                } else {
                    self.phase = EncounterPhase::MenuShown;
                }
            }
            EncounterPhase::Resolved => self.finished = true,
            EncounterPhase::MenuShown | EncounterPhase::CatchMenu | EncounterPhase::Animating => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::encounter::Rarity;
    use crate::sim::ids::MemoryIdSet;

    fn entity(catchable: bool) -> EncounterEntity {
        EncounterEntity {
            id: "react_001".to_string(),
            name: "REACTMON".to_string(),
            pool: "skills".to_string(),
            rarity: Rarity::Common,
            catchable,
            kind: "SKILL".to_string(),
            level: "90".to_string(),
            element: "FIRE".to_string(),
            description: "A component beast.".to_string(),
        }
    }

    struct Harness {
        caught: MemoryIdSet,
        timers: TimerQueue<EncounterCue>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                caught: MemoryIdSet::new(),
                timers: TimerQueue::new(),
            }
        }

        fn press(&mut self, session: &mut EncounterSession, action: InputAction) {
            let mut ctx = EncounterContext {
                caught: &mut self.caught,
                timers: &mut self.timers,
            };
            session.handle_edge(ActionEdge::down(action), &mut ctx);
        }

        fn run_timers(&mut self, session: &mut EncounterSession, ticks: u32) {
            for _ in 0..ticks {
                for cue in self.timers.advance() {
                    let mut ctx = EncounterContext {
                        caught: &mut self.caught,
                        timers: &mut self.timers,
                    };
                    session.on_cue(cue, &mut ctx).expect("cue while animating");
                }
            }
        }
    }

    fn started(catchable: bool) -> EncounterSession {
        let mut session = EncounterSession::new(entity(catchable));
        session.begin(&DialogConfig::default(), 60);
        session
    }

    fn finish_dialog(harness: &mut Harness, session: &mut EncounterSession) {
        let mut guard = 0;
        while session.dialog().is_some() {
            harness.press(session, InputAction::A);
            guard += 1;
            assert!(guard < 16);
        }
    }

    #[test]
    fn intro_dialog_leads_to_menu() {
        let mut harness = Harness::new();
        let mut session = started(true);
        assert_eq!(session.phase(), EncounterPhase::Triggered);
        assert_eq!(
            session.dialog().map(|dialog| dialog.current_message()),
            Some("A wild REACTMON appeared!")
        );
        finish_dialog(&mut harness, &mut session);
        assert_eq!(session.phase(), EncounterPhase::MenuShown);
    }

    #[test]
    fn input_before_begin_is_ignored() {
        let mut harness = Harness::new();
        let mut session = EncounterSession::new(entity(true));
        harness.press(&mut session, InputAction::A);
        assert_eq!(session.phase(), EncounterPhase::Triggered);
        assert!(session.dialog().is_none());
    }

    #[test]
    fn inspect_catchable_goes_to_catch_menu() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        assert_eq!(session.phase(), EncounterPhase::Inspecting);
        finish_dialog(&mut harness, &mut session);
        assert_eq!(session.phase(), EncounterPhase::CatchMenu);
    }

    #[test]
    fn inspect_uncatchable_returns_to_menu() {
        let mut harness = Harness::new();
        let mut session = started(false);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        finish_dialog(&mut harness, &mut session);
        assert_eq!(session.phase(), EncounterPhase::MenuShown);
    }

    #[test]
    fn run_resolves_without_catch() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::Down);
        harness.press(&mut session, InputAction::A);
        assert_eq!(session.phase(), EncounterPhase::Resolved);
        assert_eq!(session.outcome(), Some(EncounterOutcome::Ran));
        finish_dialog(&mut harness, &mut session);
        assert!(session.is_finished());
        assert!(harness.caught.is_empty());
    }

    #[test]
    fn b_in_menu_runs() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::B);
        assert_eq!(session.outcome(), Some(EncounterOutcome::Ran));
    }

    #[test]
    fn release_resolves_without_catch() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::Down);
        harness.press(&mut session, InputAction::A);
        assert_eq!(session.outcome(), Some(EncounterOutcome::Released));
        assert_eq!(session.phase(), EncounterPhase::Resolved);
        assert!(harness.timers.pending_len() == 0);
        assert!(harness.caught.is_empty());
    }

    #[test]
    fn catch_animates_then_records_caught_once() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        assert_eq!(session.phase(), EncounterPhase::Animating);

        harness.press(&mut session, InputAction::B);
        assert_eq!(session.phase(), EncounterPhase::Animating);

        harness.run_timers(&mut session, 36);
        assert!(!session.animation().entity_visible);
        harness.run_timers(&mut session, 12);
        assert!(session.animation().wobbling);
        harness.run_timers(&mut session, 60);
        assert_eq!(session.phase(), EncounterPhase::Resolved);
        assert_eq!(
            session.outcome(),
            Some(EncounterOutcome::Caught { first_time: true })
        );
        assert!(harness.caught.contains("react_001"));
        assert_eq!(
            session.dialog().map(|dialog| dialog.current_message()),
            Some("REACTMON was caught!")
        );
        finish_dialog(&mut harness, &mut session);
        assert!(session.is_finished());
    }

    #[test]
    fn catching_known_entity_reports_reminder() {
        let mut harness = Harness::new();
        harness.caught.add("react_001");
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        harness.run_timers(&mut session, 108);
        assert_eq!(
            session.outcome(),
            Some(EncounterOutcome::Caught { first_time: false })
        );
        assert_eq!(harness.caught.len(), 1);
    }

    #[test]
    fn cue_outside_animation_is_a_precondition_error() {
        let mut harness = Harness::new();
        let mut session = started(true);
        let mut ctx = EncounterContext {
            caught: &mut harness.caught,
            timers: &mut harness.timers,
        };
        assert!(matches!(
            session.on_cue(EncounterCue::Settle, &mut ctx),
            Err(EncounterError::UnexpectedCue { .. })
        ));
    }

    #[test]
    fn dropped_session_timers_are_no_ops() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        assert_eq!(harness.timers.pending_len(), 3);
        drop(session);

        let mut fired = 0;
        for _ in 0..200 {
            fired += harness.timers.advance().len();
        }
        assert_eq!(fired, 0);
        assert!(harness.caught.is_empty());
    }

    #[test]
    fn catch_menu_b_returns_to_main_menu() {
        let mut harness = Harness::new();
        let mut session = started(true);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::A);
        finish_dialog(&mut harness, &mut session);
        harness.press(&mut session, InputAction::B);
        assert_eq!(session.phase(), EncounterPhase::MenuShown);
        assert_eq!(session.menu_cursor(), 0);
    }
}
