use super::encounter::EncounterTable;
use super::movement::{BlockerKind, Blockers};
use super::tilemap::{GridPos, TileMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorDef {
    pub id: String,
    pub screen: String,
    pub label: String,
    pub position: GridPos,
    pub dialog: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcDef {
    pub id: String,
    pub position: GridPos,
    pub variant: u8,
    pub dialog: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignDef {
    pub position: GridPos,
    pub lines: Vec<String>,
}

/// Read-only world content shared by every session component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldDefs {
    pub name: String,
    pub map: TileMap,
    pub start: GridPos,
    pub doors: Vec<DoorDef>,
    pub npcs: Vec<NpcDef>,
    pub signs: Vec<SignDef>,
    pub encounters: EncounterTable,
}

impl WorldDefs {
    pub fn blockers(&self) -> Blockers {
        let npcs = self
            .npcs
            .iter()
            .enumerate()
            .map(|(index, npc)| (npc.position, BlockerKind::Npc(index)));
        let signs = self
            .signs
            .iter()
            .enumerate()
            .map(|(index, sign)| (sign.position, BlockerKind::Sign(index)));
        Blockers::new(npcs.chain(signs))
    }

    pub fn door_at(&self, pos: GridPos) -> Option<&DoorDef> {
        self.doors.iter().find(|door| door.position == pos)
    }
}
