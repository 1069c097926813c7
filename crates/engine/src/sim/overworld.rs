use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::app::{ActionEdge, ActionStates, InputAction, KeyEdge};

use super::camera::{CameraController, Vec2, Viewport};
use super::config::SimConfig;
use super::dialog::{DialogSession, DialogState, DialogStep};
use super::encounter::{EncounterEngine, EncounterError};
use super::encounter_flow::{EncounterContext, EncounterCue, EncounterOutcome, EncounterSession};
use super::ids::IdSet;
use super::movement::{ActorState, BlockerKind, Blockers, Direction, MoveOutcome, MovementEngine};
use super::pause::{PauseAction, PauseItem, PauseMenu};
use super::tilemap::GridPos;
use super::timers::TimerQueue;
use super::world::WorldDefs;

pub const AUDIO_OVERWORLD: &str = "overworld";
pub const AUDIO_ENCOUNTER: &str = "encounter";
pub const SCREEN_COLLECTION: &str = "collection";
pub const SCREEN_TITLE: &str = "title";

/// Which component consumes action edges this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Movement,
    PauseMenu,
    Dialog,
    Transition,
    Encounter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ScreenRequest { screen: String, return_to: GridPos },
    SaveRequested,
    AudioContext(&'static str),
    EncounterStarted { entity_id: String },
    EncounterEnded { entity_id: String, outcome: EncounterOutcome },
}

/// External seen/caught collaborators.
pub struct ProgressStores {
    pub seen: Box<dyn IdSet>,
    pub caught: Box<dyn IdSet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogPurpose {
    Talk,
    Door { screen: String },
}

#[derive(Debug)]
struct OverworldDialog {
    session: DialogSession,
    purpose: DialogPurpose,
}

#[derive(Debug)]
struct PendingEncounter {
    session: EncounterSession,
    flash_remaining: u32,
}

/// Per-tick orchestrator for the overworld. Owns the actor and every session
/// that can hold focus; exactly one of them consumes input on a given tick.
pub struct OverworldSession {
    config: SimConfig,
    world: Arc<WorldDefs>,
    blockers: Blockers,
    actor: ActorState,
    movement: MovementEngine,
    encounters: EncounterEngine,
    stores: ProgressStores,
    rng: StdRng,
    dialog: Option<OverworldDialog>,
    pause: PauseMenu,
    pending_encounter: Option<PendingEncounter>,
    encounter: Option<EncounterSession>,
    encounter_timers: TimerQueue<EncounterCue>,
    interact_cooldown: u32,
    banner_remaining: u32,
    return_position: Option<GridPos>,
    tick_count: u64,
}

impl OverworldSession {
    pub fn new(
        config: SimConfig,
        world: Arc<WorldDefs>,
        stores: ProgressStores,
        rng: StdRng,
    ) -> Result<Self, EncounterError> {
        let encounters = EncounterEngine::new(config.encounter.clone())?;
        let movement = MovementEngine::new(config.walk_ticks);
        let blockers = world.blockers();
        let actor = ActorState::new(world.start, Direction::Down);
        Ok(Self {
            config,
            blockers,
            actor,
            movement,
            encounters,
            stores,
            rng,
            dialog: None,
            pause: PauseMenu::default(),
            pending_encounter: None,
            encounter: None,
            encounter_timers: TimerQueue::new(),
            interact_cooldown: 0,
            banner_remaining: 0,
            return_position: None,
            tick_count: 0,
            world,
        })
    }

    /// Called when the overworld becomes the active screen, at startup or on
    /// return from a screen request.
    pub fn enter(&mut self) -> Vec<SessionEvent> {
        if let Some(position) = self.return_position.take() {
            self.actor.place(position, Direction::Down);
        }
        self.banner_remaining = self.config.banner_ticks;
        info!(
            x = self.actor.position().x,
            y = self.actor.position().y,
            "overworld_entered"
        );
        vec![SessionEvent::AudioContext(AUDIO_OVERWORLD)]
    }

    pub fn focus(&self) -> Focus {
        if self.encounter.is_some() {
            Focus::Encounter
        } else if self.pending_encounter.is_some() {
            Focus::Transition
        } else if self.dialog.is_some() {
            Focus::Dialog
        } else if self.pause.is_open() {
            Focus::PauseMenu
        } else {
            Focus::Movement
        }
    }

    pub fn tick(&mut self, edges: &[ActionEdge], held: &ActionStates) -> Vec<SessionEvent> {
        self.tick_count = self.tick_count.saturating_add(1);
        let dt = self.tick_duration();
        let focus = self.focus();
        let mut events = Vec::new();
        let mut interact_requested = false;

        for edge in edges.iter().copied() {
            if edge.edge != KeyEdge::Down {
                continue;
            }
            match focus {
                Focus::Encounter => self.route_encounter_edge(edge),
                Focus::Dialog => self.route_dialog_edge(edge, &mut events),
                Focus::PauseMenu => self.route_pause_edge(edge, &mut events),
                Focus::Movement => {
                    if self.modal_open() {
                        continue;
                    }
                    match edge.action {
                        InputAction::A => interact_requested = true,
                        InputAction::Start | InputAction::B if self.actor.is_idle() => {
                            self.pause.open();
                            debug!("pause_opened");
                        }
                        _ => {}
                    }
                }
                Focus::Transition => {}
            }
        }

        self.tick_encounter(dt, &mut events);
        self.tick_dialog(dt, &mut events);
        self.banner_remaining = self.banner_remaining.saturating_sub(1);
        self.interact_cooldown = self.interact_cooldown.saturating_sub(1);

        if interact_requested {
            self.try_interact();
        }

        let movement_input = (!self.modal_open()).then_some(held);
        let outcome = self
            .movement
            .tick(&mut self.actor, &self.world.map, &self.blockers, movement_input);
        if let MoveOutcome::Arrived(arrival) = outcome {
            if let Some(session) = self.encounters.on_arrival(
                arrival,
                &self.world.encounters,
                &mut self.rng,
                self.stores.seen.as_mut(),
            ) {
                events.push(SessionEvent::EncounterStarted {
                    entity_id: session.entity().id.clone(),
                });
                self.pending_encounter = Some(PendingEncounter {
                    session,
                    flash_remaining: self.config.encounter_flash_ticks,
                });
            }
            self.resolve_door(arrival.position);
        }

        events
    }

    pub fn actor(&self) -> &ActorState {
        &self.actor
    }

    pub fn world(&self) -> &WorldDefs {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn pause_menu(&self) -> &PauseMenu {
        &self.pause
    }

    pub fn encounter(&self) -> Option<&EncounterSession> {
        self.encounter.as_ref()
    }

    pub fn is_flashing(&self) -> bool {
        self.pending_encounter.is_some()
    }

    pub fn banner(&self) -> Option<&str> {
        (self.banner_remaining > 0).then_some(self.world.name.as_str())
    }

    pub fn seen(&self) -> &dyn IdSet {
        self.stores.seen.as_ref()
    }

    pub fn caught(&self) -> &dyn IdSet {
        self.stores.caught.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Overworld dialog text with the player name applied, and whether it is
    /// waiting for an advance.
    pub fn dialog_text(&self) -> Option<(String, bool)> {
        let dialog = self.dialog.as_ref()?;
        Some((
            dialog.session.display_text(&self.config.player_name),
            dialog.session.state() == DialogState::Waiting,
        ))
    }

    pub fn actor_render_position(&self) -> Vec2 {
        self.actor.render_position(self.config.tile_px)
    }

    pub fn camera_offset(&self, viewport: Viewport) -> Vec2 {
        CameraController::new(&self.world.map, self.config.tile_px, viewport)
            .offset(self.actor_render_position())
    }

    /// Places the actor from saved progress. Rejected while anything holds focus
    /// or when the tile can't be entered.
    pub fn restore_actor(&mut self, position: GridPos, direction: Direction) -> bool {
        if self.focus() != Focus::Movement || !self.actor.is_idle() {
            return false;
        }
        if !MovementEngine::can_enter(&self.world.map, &self.blockers, position) {
            warn!(x = position.x, y = position.y, "restore_position_blocked");
            return false;
        }
        self.actor.place(position, direction);
        true
    }

    fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.config.ticks_per_second.max(1)))
    }

    fn modal_open(&self) -> bool {
        self.focus() != Focus::Movement
    }

    fn route_encounter_edge(&mut self, edge: ActionEdge) {
        let Some(session) = self.encounter.as_mut() else {
            return;
        };
        let mut ctx = EncounterContext {
            caught: self.stores.caught.as_mut(),
            timers: &mut self.encounter_timers,
        };
        session.handle_edge(edge, &mut ctx);
    }

    fn route_dialog_edge(&mut self, edge: ActionEdge, events: &mut Vec<SessionEvent>) {
        let Some(active) = self.dialog.as_mut() else {
            return;
        };
        let step = match edge.action {
            InputAction::A => active.session.advance(),
            InputAction::B => active.session.force_close(),
            _ => DialogStep::Ignored,
        };
        if step == DialogStep::Completed {
            self.finish_dialog(events);
        }
    }

    fn route_pause_edge(&mut self, edge: ActionEdge, events: &mut Vec<SessionEvent>) {
        let Some(action) = self.pause.handle_edge(edge) else {
            return;
        };
        let return_to = self.actor.position();
        match action {
            PauseAction::Closed | PauseAction::Selected(PauseItem::Resume) => {}
            PauseAction::Selected(PauseItem::Collection) => {
                self.return_position = Some(return_to);
                events.push(SessionEvent::ScreenRequest {
                    screen: SCREEN_COLLECTION.to_string(),
                    return_to,
                });
            }
            PauseAction::Selected(PauseItem::Save) => events.push(SessionEvent::SaveRequested),
            PauseAction::Selected(PauseItem::Exit) => events.push(SessionEvent::ScreenRequest {
                screen: SCREEN_TITLE.to_string(),
                return_to,
            }),
        }
        debug!(?action, "pause_action");
    }

    fn tick_dialog(&mut self, dt: Duration, events: &mut Vec<SessionEvent>) {
        let Some(active) = self.dialog.as_mut() else {
            return;
        };
        if active.session.tick(dt) == Some(DialogStep::Completed) {
            self.finish_dialog(events);
        }
    }

    fn finish_dialog(&mut self, events: &mut Vec<SessionEvent>) {
        let Some(active) = self.dialog.take() else {
            return;
        };
        self.interact_cooldown = self.config.interact_cooldown_ticks;
        if let DialogPurpose::Door { screen } = active.purpose {
            let return_to = self.actor.position();
            self.return_position = Some(return_to);
            info!(screen = %screen, "door_entered");
            events.push(SessionEvent::ScreenRequest { screen, return_to });
        }
    }

    fn tick_encounter(&mut self, dt: Duration, events: &mut Vec<SessionEvent>) {
        if let Some(pending) = self.pending_encounter.as_mut() {
            pending.flash_remaining = pending.flash_remaining.saturating_sub(1);
            if pending.flash_remaining == 0 {
                if let Some(PendingEncounter { mut session, .. }) = self.pending_encounter.take() {
                    session.begin(&self.config.dialog, self.config.ticks_per_second);
                    self.encounter = Some(session);
                    events.push(SessionEvent::AudioContext(AUDIO_ENCOUNTER));
                }
            }
            return;
        }

        for cue in self.encounter_timers.advance() {
            let Some(session) = self.encounter.as_mut() else {
                continue;
            };
            let mut ctx = EncounterContext {
                caught: self.stores.caught.as_mut(),
                timers: &mut self.encounter_timers,
            };
            if let Err(error) = session.on_cue(cue, &mut ctx) {
                warn!(error = %error, "encounter_cue_rejected");
            }
        }

        let Some(session) = self.encounter.as_mut() else {
            return;
        };
        session.tick(dt);
        if !session.is_finished() {
            return;
        }
        if let Some(session) = self.encounter.take() {
            let outcome = session.outcome().unwrap_or(EncounterOutcome::Ran);
            events.push(SessionEvent::EncounterEnded {
                entity_id: session.entity().id.clone(),
                outcome,
            });
            events.push(SessionEvent::AudioContext(AUDIO_OVERWORLD));
            self.encounter_timers.cancel_all();
            self.interact_cooldown = self.config.interact_cooldown_ticks;
        }
    }

    fn try_interact(&mut self) {
        if self.interact_cooldown > 0 || !self.actor.is_idle() || self.modal_open() {
            return;
        }
        let facing = self.actor.facing_tile();
        let lines = match self.blockers.at(facing) {
            Some(BlockerKind::Npc(index)) => self.world.npcs.get(index).map(|npc| {
                debug!(npc = %npc.id, "npc_interaction");
                npc.dialog.clone()
            }),
            Some(BlockerKind::Sign(index)) => {
                self.world.signs.get(index).map(|sign| sign.lines.clone())
            }
            None => None,
        };
        if let Some(lines) = lines {
            self.open_dialog(lines, DialogPurpose::Talk);
        }
    }

    fn resolve_door(&mut self, position: GridPos) {
        if self.pending_encounter.is_some() {
            return;
        }
        let Some(door) = self.world.door_at(position) else {
            return;
        };
        let lines = door.dialog.clone();
        let purpose = DialogPurpose::Door {
            screen: door.screen.clone(),
        };
        debug!(door = %door.id, "door_reached");
        self.open_dialog(lines, purpose);
    }

    fn open_dialog(&mut self, lines: Vec<String>, purpose: DialogPurpose) {
        self.dialog = Some(OverworldDialog {
            session: DialogSession::new(lines, &self.config.dialog),
            purpose,
        });
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::sim::encounter::{EncounterConfig, EncounterEntity, EncounterTable, Rarity};
    use crate::sim::encounter_flow::EncounterPhase;
    use crate::sim::ids::MemoryIdSet;
    use crate::sim::tilemap::{TileMap, TILE_GRASS, TILE_HOUSE_DOOR, TILE_TALL_GRASS, TILE_WATER};
    use crate::sim::world::{DoorDef, NpcDef, SignDef};

    const W: u32 = 8;
    const H: u32 = 6;

    // Row 0 water, door at (6,1), tall grass strip at y=4.
    fn test_world() -> WorldDefs {
        let mut tiles = vec![TILE_GRASS; (W * H) as usize];
        for x in 0..W as usize {
            tiles[x] = TILE_WATER;
            tiles[4 * W as usize + x] = TILE_TALL_GRASS;
        }
        tiles[W as usize + 6] = TILE_HOUSE_DOOR;
        WorldDefs {
            name: "TEST TOWN".to_string(),
            map: TileMap::new(W, H, tiles, [TILE_WATER]).expect("tilemap"),
            start: GridPos::new(2, 2),
            doors: vec![DoorDef {
                id: "lab".to_string(),
                screen: "projects".to_string(),
                label: "LAB".to_string(),
                position: GridPos::new(6, 1),
                dialog: vec!["Entering LAB...".to_string()],
            }],
            npcs: vec![NpcDef {
                id: "npc_a".to_string(),
                position: GridPos::new(2, 3),
                variant: 0,
                dialog: vec!["Hello [PLAYER_NAME]!".to_string(), "Bye.".to_string()],
            }],
            signs: vec![SignDef {
                position: GridPos::new(1, 2),
                lines: vec!["TEST TOWN".to_string()],
            }],
            encounters: EncounterTable::new(
                vec![EncounterEntity {
                    id: "react_001".to_string(),
                    name: "REACTMON".to_string(),
                    pool: "skills".to_string(),
                    rarity: Rarity::Common,
                    catchable: true,
                    kind: "SKILL".to_string(),
                    level: "90".to_string(),
                    element: "FIRE".to_string(),
                    description: "A component beast.".to_string(),
                }],
                Vec::new(),
                "skills",
            ),
        }
    }

    fn session_with(config: SimConfig) -> OverworldSession {
        OverworldSession::new(
            config,
            Arc::new(test_world()),
            ProgressStores {
                seen: Box::new(MemoryIdSet::new()),
                caught: Box::new(MemoryIdSet::new()),
            },
            StdRng::seed_from_u64(7),
        )
        .expect("session")
    }

    fn session() -> OverworldSession {
        session_with(SimConfig::default())
    }

    fn always_encounter() -> SimConfig {
        SimConfig {
            encounter: EncounterConfig {
                trigger_chance: 1.0,
                ..EncounterConfig::default()
            },
            ..SimConfig::default()
        }
    }

    fn press(session: &mut OverworldSession, action: InputAction) -> Vec<SessionEvent> {
        session.tick(&[ActionEdge::down(action)], &ActionStates::default())
    }

    fn idle(session: &mut OverworldSession, ticks: u32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(session.tick(&[], &ActionStates::default()));
        }
        events
    }

    fn walk(session: &mut OverworldSession, action: InputAction) -> Vec<SessionEvent> {
        let held = ActionStates::default().with_down(action);
        let mut events = session.tick(&[], &held);
        let ticks = session.config().walk_ticks;
        events.extend(idle(session, ticks));
        events
    }

    fn face(session: &mut OverworldSession, action: InputAction) {
        let held = ActionStates::default().with_down(action);
        session.tick(&[], &held);
        assert!(session.actor().is_idle());
    }

    #[test]
    fn enter_announces_overworld_audio_and_banner() {
        let mut session = session();
        assert_eq!(
            session.enter(),
            vec![SessionEvent::AudioContext(AUDIO_OVERWORLD)]
        );
        assert_eq!(session.banner(), Some("TEST TOWN"));
        let ticks = session.config().banner_ticks;
        idle(&mut session, ticks);
        assert_eq!(session.banner(), None);
    }

    #[test]
    fn talking_to_npc_opens_dialog_and_suspends_movement() {
        let mut session = session();
        press(&mut session, InputAction::A);
        assert_eq!(session.focus(), Focus::Dialog);

        let held = ActionStates::default().with_down(InputAction::Right);
        session.tick(&[], &held);
        assert!(session.actor().is_idle());
        assert_eq!(session.actor().position(), GridPos::new(2, 2));

        press(&mut session, InputAction::A);
        let (text, waiting) = session.dialog_text().expect("dialog");
        assert_eq!(text, "Hello HEYTT!");
        assert!(waiting);
    }

    #[test]
    fn interaction_cooldown_blocks_immediate_reopen() {
        let mut session = session();
        press(&mut session, InputAction::A);
        press(&mut session, InputAction::B);
        assert_eq!(session.focus(), Focus::Movement);

        press(&mut session, InputAction::A);
        assert_eq!(session.focus(), Focus::Movement);

        let ticks = session.config().interact_cooldown_ticks;
        idle(&mut session, ticks);
        press(&mut session, InputAction::A);
        assert_eq!(session.focus(), Focus::Dialog);
    }

    #[test]
    fn closing_edge_is_not_reused_by_movement_in_same_tick() {
        let mut session = session();
        press(&mut session, InputAction::A);
        session.tick(
            &[
                ActionEdge::down(InputAction::B),
                ActionEdge::down(InputAction::A),
                ActionEdge::down(InputAction::Start),
            ],
            &ActionStates::default(),
        );
        assert_eq!(session.focus(), Focus::Movement);
        assert!(!session.pause_menu().is_open());
    }

    #[test]
    fn sign_is_read_when_faced() {
        let mut session = session();
        face(&mut session, InputAction::Left);
        press(&mut session, InputAction::A);
        press(&mut session, InputAction::A);
        assert_eq!(
            session.dialog_text().map(|(text, _)| text),
            Some("TEST TOWN".to_string())
        );
    }

    #[test]
    fn door_dialog_completion_requests_screen() {
        let mut session = session();
        walk(&mut session, InputAction::Right);
        walk(&mut session, InputAction::Right);
        walk(&mut session, InputAction::Right);
        walk(&mut session, InputAction::Right);
        let events = walk(&mut session, InputAction::Up);
        assert!(events.is_empty());
        assert_eq!(session.actor().position(), GridPos::new(6, 1));
        assert_eq!(session.focus(), Focus::Dialog);

        press(&mut session, InputAction::A);
        let events = press(&mut session, InputAction::A);
        assert_eq!(
            events,
            vec![SessionEvent::ScreenRequest {
                screen: "projects".to_string(),
                return_to: GridPos::new(6, 1),
            }]
        );
    }

    #[test]
    fn pause_menu_save_and_exit() {
        let mut session = session();
        press(&mut session, InputAction::Start);
        assert_eq!(session.focus(), Focus::PauseMenu);
        press(&mut session, InputAction::Down);
        press(&mut session, InputAction::Down);
        assert_eq!(press(&mut session, InputAction::A), vec![SessionEvent::SaveRequested]);
        assert_eq!(session.focus(), Focus::Movement);

        press(&mut session, InputAction::B);
        for _ in 0..3 {
            press(&mut session, InputAction::Down);
        }
        let events = press(&mut session, InputAction::A);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::ScreenRequest { screen, .. }] if screen == SCREEN_TITLE
        ));
    }

    #[test]
    fn collection_request_restores_position_on_enter() {
        let mut session = session();
        walk(&mut session, InputAction::Right);
        press(&mut session, InputAction::Start);
        press(&mut session, InputAction::Down);
        press(&mut session, InputAction::A);
        session.enter();
        assert_eq!(session.actor().position(), GridPos::new(3, 2));
        assert_eq!(session.actor().direction(), Direction::Down);
    }

    #[test]
    fn pause_blocks_movement() {
        let mut session = session();
        press(&mut session, InputAction::Start);
        walk(&mut session, InputAction::Right);
        assert_eq!(session.actor().position(), GridPos::new(2, 2));
    }

    #[test]
    fn start_mid_step_does_not_stack_pause_over_encounter() {
        let mut session = session_with(always_encounter());
        walk(&mut session, InputAction::Right);
        walk(&mut session, InputAction::Down);

        let held = ActionStates::default().with_down(InputAction::Down);
        session.tick(&[], &held);
        assert!(!session.actor().is_idle());
        press(&mut session, InputAction::Start);
        assert!(!session.pause_menu().is_open());
        assert_eq!(session.focus(), Focus::Movement);

        let ticks = session.config().walk_ticks;
        idle(&mut session, ticks);
        assert_eq!(session.actor().position(), GridPos::new(3, 4));
        assert_eq!(session.focus(), Focus::Transition);
        assert!(!session.pause_menu().is_open());

        let ticks = session.config().encounter_flash_ticks;
        idle(&mut session, ticks);
        assert_eq!(session.focus(), Focus::Encounter);
        assert!(!session.pause_menu().is_open());
    }

    #[test]
    fn start_mid_step_toward_door_leaves_only_the_door_dialog() {
        let mut session = session();
        for _ in 0..4 {
            walk(&mut session, InputAction::Right);
        }
        let held = ActionStates::default().with_down(InputAction::Up);
        session.tick(&[], &held);
        press(&mut session, InputAction::Start);
        let ticks = session.config().walk_ticks;
        idle(&mut session, ticks);
        assert_eq!(session.actor().position(), GridPos::new(6, 1));
        assert_eq!(session.focus(), Focus::Dialog);

        press(&mut session, InputAction::B);
        assert_eq!(session.focus(), Focus::Movement);
        assert!(!session.pause_menu().is_open());
    }

    #[test]
    fn grass_encounter_runs_full_flow() {
        let mut session = session_with(always_encounter());
        walk(&mut session, InputAction::Right);
        walk(&mut session, InputAction::Down);
        let events = walk(&mut session, InputAction::Down);
        assert_eq!(session.actor().position(), GridPos::new(3, 4));
        assert_eq!(
            events,
            vec![SessionEvent::EncounterStarted {
                entity_id: "react_001".to_string()
            }]
        );
        assert!(session.seen().contains("react_001"));
        assert_eq!(session.focus(), Focus::Transition);

        let ticks = session.config().encounter_flash_ticks;
        let events = idle(&mut session, ticks);
        assert_eq!(events, vec![SessionEvent::AudioContext(AUDIO_ENCOUNTER)]);
        assert_eq!(session.focus(), Focus::Encounter);

        press(&mut session, InputAction::A);
        press(&mut session, InputAction::A);
        assert_eq!(
            session.encounter().map(EncounterSession::phase),
            Some(EncounterPhase::MenuShown)
        );

        press(&mut session, InputAction::A);
        press(&mut session, InputAction::A);
        press(&mut session, InputAction::A);
        assert_eq!(
            session.encounter().map(EncounterSession::phase),
            Some(EncounterPhase::CatchMenu)
        );
        press(&mut session, InputAction::A);
        idle(&mut session, 108);
        assert!(session.caught().contains("react_001"));

        let mut events = Vec::new();
        for _ in 0..4 {
            events.extend(press(&mut session, InputAction::A));
        }
        assert_eq!(
            events,
            vec![
                SessionEvent::EncounterEnded {
                    entity_id: "react_001".to_string(),
                    outcome: EncounterOutcome::Caught { first_time: true },
                },
                SessionEvent::AudioContext(AUDIO_OVERWORLD),
            ]
        );
        assert_eq!(session.focus(), Focus::Movement);
        assert_eq!(session.encounter_timers.pending_len(), 0);
    }

    #[test]
    fn movement_input_is_ignored_during_encounter_flash() {
        let mut session = session_with(always_encounter());
        walk(&mut session, InputAction::Right);
        walk(&mut session, InputAction::Down);
        walk(&mut session, InputAction::Down);
        walk(&mut session, InputAction::Right);
        assert_eq!(session.actor().position(), GridPos::new(3, 4));
    }

    #[test]
    fn restore_actor_rejects_blocked_tiles() {
        let mut session = session();
        assert!(!session.restore_actor(GridPos::new(2, 3), Direction::Up));
        assert!(!session.restore_actor(GridPos::new(0, 0), Direction::Up));
        assert!(session.restore_actor(GridPos::new(5, 3), Direction::Left));
        assert_eq!(session.actor().position(), GridPos::new(5, 3));
    }

    #[test]
    fn camera_follows_actor_within_map() {
        let session = session();
        let offset = session.camera_offset(Viewport {
            width: 64,
            height: 48,
        });
        assert_eq!(offset, Vec2::new(8.0, 16.0));
    }
}
