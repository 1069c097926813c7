use std::path::Path;
use std::sync::Arc;

use overworld_engine::sim::{MemoryIdSet, OverworldSession, ProgressStores, SimConfig, WorldDefs};
use overworld_engine::{compile_world_str, ActionStates};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub(super) const TEST_WORLD: &str = r#"<World name="TEST TOWN" width="8" height="6" startX="2" startY="2">
  <Tiles>
    3,3,3,3,3,3,3,3
    0,0,0,0,0,0,10,0
    0,17,0,0,0,0,0,0
    0,0,0,0,0,0,0,0
    19,19,19,19,19,19,19,19
    0,0,0,0,0,0,0,0
  </Tiles>
  <Solid>3</Solid>
  <Door id="lab" screen="projects" label="LAB" x="6" y="1">
    <Line>Entering LAB...</Line>
  </Door>
  <Npc id="npc_a" x="2" y="3" variant="1">
    <Line>Hello [PLAYER_NAME]!</Line>
  </Npc>
  <Sign x="1" y="2"><Line>TEST TOWN</Line></Sign>
  <GrassZone x1="0" y1="4" x2="7" y2="4" pool="skills"/>
  <DefaultPool>facts</DefaultPool>
  <Entity id="react_001" name="REACTMON" pool="skills" rarity="COMMON" catchable="true" kind="SKILL" level="90" type="FIRE">
    <Description>A component beast.</Description>
  </Entity>
</World>"#;

pub(super) fn world() -> Arc<WorldDefs> {
    Arc::new(compile_world_str(Path::new("test_world.xml"), TEST_WORLD).expect("test world"))
}

pub(super) fn session() -> OverworldSession {
    OverworldSession::new(
        SimConfig::default(),
        world(),
        ProgressStores {
            seen: Box::new(MemoryIdSet::new()),
            caught: Box::new(MemoryIdSet::new()),
        },
        StdRng::seed_from_u64(7),
    )
    .expect("session")
}

pub(super) fn tick_idle(session: &mut OverworldSession, ticks: u32) {
    for _ in 0..ticks {
        session.tick(&[], &ActionStates::default());
    }
}
