use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::app::{ActionStates, InputAction};

use super::camera::Vec2;
use super::tilemap::{GridPos, TileId, TileMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Sampling order when several directions are held.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn action(self) -> InputAction {
        match self {
            Direction::Up => InputAction::Up,
            Direction::Down => InputAction::Down,
            Direction::Left => InputAction::Left,
            Direction::Right => InputAction::Right,
        }
    }

    pub fn from_held(held: &ActionStates) -> Option<Direction> {
        Self::PRIORITY
            .into_iter()
            .find(|direction| held.is_down(direction.action()))
    }
}

const PHASE_CYCLE: [u8; 4] = [0, 1, 2, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Transitioning {
        from: GridPos,
        to: GridPos,
        elapsed_ticks: u32,
        total_ticks: u32,
    },
}

/// The player's authoritative grid state. `position` only changes on the tick a
/// transition completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorState {
    position: GridPos,
    direction: Direction,
    phase_step: usize,
    motion: Motion,
}

impl ActorState {
    pub fn new(position: GridPos, direction: Direction) -> Self {
        Self {
            position,
            direction,
            phase_step: 0,
            motion: Motion::Idle,
        }
    }

    pub fn position(&self) -> GridPos {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn animation_phase(&self) -> u8 {
        PHASE_CYCLE[self.phase_step % PHASE_CYCLE.len()]
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_idle(&self) -> bool {
        self.motion == Motion::Idle
    }

    pub fn facing_tile(&self) -> GridPos {
        let (dx, dy) = self.direction.delta();
        self.position.offset(dx, dy)
    }

    /// Continuous position of the tile origin in pixels.
    pub fn render_position(&self, tile_px: u32) -> Vec2 {
        let tile = tile_px as f32;
        match self.motion {
            Motion::Idle => Vec2::new(
                self.position.x as f32 * tile,
                self.position.y as f32 * tile,
            ),
            Motion::Transitioning {
                from,
                to,
                elapsed_ticks,
                total_ticks,
            } => {
                let t = if total_ticks == 0 {
                    1.0
                } else {
                    elapsed_ticks as f32 / total_ticks as f32
                };
                Vec2::new(
                    (from.x as f32 + (to.x - from.x) as f32 * t) * tile,
                    (from.y as f32 + (to.y - from.y) as f32 * t) * tile,
                )
            }
        }
    }

    /// Teleport while idle, e.g. when returning through a door.
    pub fn place(&mut self, position: GridPos, direction: Direction) {
        self.position = position;
        self.direction = direction;
        self.motion = Motion::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerKind {
    Npc(usize),
    Sign(usize),
}

/// Occupancy index for NPCs and signs. Built once per world and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blockers {
    by_position: HashMap<GridPos, BlockerKind>,
}

impl Blockers {
    pub fn new(entries: impl IntoIterator<Item = (GridPos, BlockerKind)>) -> Self {
        Self {
            by_position: entries.into_iter().collect(),
        }
    }

    pub fn at(&self, pos: GridPos) -> Option<BlockerKind> {
        self.by_position.get(&pos).copied()
    }

    pub fn is_blocked(&self, pos: GridPos) -> bool {
        self.by_position.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileArrival {
    pub position: GridPos,
    pub tile: TileId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Idle,
    Turned(Direction),
    Started { to: GridPos },
    InProgress,
    Arrived(TileArrival),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementEngine {
    walk_ticks: u32,
}

impl MovementEngine {
    pub fn new(walk_ticks: u32) -> Self {
        Self {
            walk_ticks: walk_ticks.max(1),
        }
    }

    pub fn can_enter(map: &TileMap, blockers: &Blockers, pos: GridPos) -> bool {
        map.is_passable(pos) && !blockers.is_blocked(pos)
    }

    /// Advances the actor one tick. `held` is `None` while a modal focus holder
    /// owns input; an in-flight transition still completes.
    pub fn tick(
        &self,
        actor: &mut ActorState,
        map: &TileMap,
        blockers: &Blockers,
        held: Option<&ActionStates>,
    ) -> MoveOutcome {
        if let Motion::Transitioning {
            from,
            to,
            elapsed_ticks,
            total_ticks,
        } = actor.motion
        {
            let elapsed_ticks = elapsed_ticks.saturating_add(1);
            if elapsed_ticks < total_ticks {
                actor.motion = Motion::Transitioning {
                    from,
                    to,
                    elapsed_ticks,
                    total_ticks,
                };
                return MoveOutcome::InProgress;
            }
            actor.position = to;
            actor.motion = Motion::Idle;
            return MoveOutcome::Arrived(TileArrival {
                position: to,
                tile: map.tile_at(to).unwrap_or_default(),
            });
        }

        let Some(direction) = held.and_then(Direction::from_held) else {
            return MoveOutcome::Idle;
        };
        actor.direction = direction;
        let (dx, dy) = direction.delta();
        let target = actor.position.offset(dx, dy);
        if !Self::can_enter(map, blockers, target) {
            return MoveOutcome::Turned(direction);
        }
        actor.motion = Motion::Transitioning {
            from: actor.position,
            to: target,
            elapsed_ticks: 0,
            total_ticks: self.walk_ticks,
        };
        actor.phase_step = (actor.phase_step + 1) % PHASE_CYCLE.len();
        MoveOutcome::Started { to: target }
    }
}
