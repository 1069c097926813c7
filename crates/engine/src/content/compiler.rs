use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::info;

use crate::sim::{
    DoorDef, EncounterEntity, EncounterTable, GrassZone, GridPos, NpcDef, Rarity, SignDef, TileId,
    TileMap, TilemapError, WorldDefs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    DuplicateElement,
    MissingField,
    InvalidValue,
    TileCountMismatch,
    OutOfBounds,
    OverlappingBlocker,
    DuplicateId,
}

#[derive(Debug, Clone)]
pub struct WorldCompileError {
    pub code: WorldErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for WorldCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for WorldCompileError {}

pub fn compile_world_file(path: &Path) -> Result<WorldDefs, WorldCompileError> {
    let raw = fs::read_to_string(path).map_err(|source| WorldCompileError {
        code: WorldErrorCode::ReadFile,
        message: format!("failed to read world file: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    let world = compile_world_str(path, &raw)?;
    info!(
        file = %path.display(),
        width = world.map.width(),
        height = world.map.height(),
        doors = world.doors.len(),
        npcs = world.npcs.len(),
        signs = world.signs.len(),
        entities = world.encounters.entities().len(),
        "world_compiled"
    );
    Ok(world)
}

/// Compiles world XML already in memory. `file_path` is only used for error
/// reporting.
pub fn compile_world_str(file_path: &Path, raw: &str) -> Result<WorldDefs, WorldCompileError> {
    let doc = Document::parse(raw).map_err(|error| WorldCompileError {
        code: WorldErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = CompileCtx {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "World" {
        return Err(ctx.error(
            WorldErrorCode::InvalidRoot,
            "root element must be <World>".to_string(),
            root,
        ));
    }
    ctx.check_attributes(root, &["name", "width", "height", "startX", "startY"])?;
    let name = ctx.required_attr(root, "name")?.to_string();
    let width: u32 = ctx.parse_attr(root, "width")?;
    let height: u32 = ctx.parse_attr(root, "height")?;
    let start = GridPos::new(ctx.parse_attr(root, "startX")?, ctx.parse_attr(root, "startY")?);

    let mut tiles: Option<(Vec<TileId>, Node<'_, '_>)> = None;
    let mut solid: Option<Vec<TileId>> = None;
    let mut default_pool: Option<String> = None;
    let mut doors = Vec::<DoorDef>::new();
    let mut npcs = Vec::<NpcDef>::new();
    let mut signs = Vec::<(SignDef, Node<'_, '_>)>::new();
    let mut zones = Vec::<GrassZone>::new();
    let mut entities = Vec::<EncounterEntity>::new();
    let mut npc_nodes = Vec::<Node<'_, '_>>::new();
    let mut door_nodes = Vec::<Node<'_, '_>>::new();
    let mut entity_nodes = Vec::<Node<'_, '_>>::new();

    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "Tiles" => {
                if tiles.is_some() {
                    return Err(ctx.duplicate(child));
                }
                tiles = Some((ctx.parse_id_list(child)?, child));
            }
            "Solid" => {
                if solid.is_some() {
                    return Err(ctx.duplicate(child));
                }
                solid = Some(ctx.parse_id_list(child)?);
            }
            "DefaultPool" => {
                if default_pool.is_some() {
                    return Err(ctx.duplicate(child));
                }
                default_pool = Some(ctx.required_text(child)?);
            }
            "Door" => {
                doors.push(ctx.parse_door(child)?);
                door_nodes.push(child);
            }
            "Npc" => {
                npcs.push(ctx.parse_npc(child)?);
                npc_nodes.push(child);
            }
            "Sign" => signs.push((ctx.parse_sign(child)?, child)),
            "GrassZone" => zones.push(ctx.parse_zone(child)?),
            "Entity" => {
                entities.push(ctx.parse_entity(child)?);
                entity_nodes.push(child);
            }
            other => {
                return Err(ctx.error(
                    WorldErrorCode::UnknownElement,
                    format!("unknown element <{other}> in <World>"),
                    child,
                ))
            }
        }
    }

    let Some((tiles, tiles_node)) = tiles else {
        return Err(ctx.missing("<Tiles>", root));
    };
    let Some(default_pool) = default_pool else {
        return Err(ctx.missing("<DefaultPool>", root));
    };
    let map = TileMap::new(width, height, tiles, solid.unwrap_or_default()).map_err(|error| {
        let code = match error {
            TilemapError::TileCountMismatch { .. } => WorldErrorCode::TileCountMismatch,
            TilemapError::EmptyDimensions { .. } => WorldErrorCode::InvalidValue,
        };
        ctx.error(code, error.to_string(), tiles_node)
    })?;

    if !map.is_passable(start) {
        return Err(ctx.error(
            WorldErrorCode::InvalidValue,
            format!("start ({}, {}) is not a passable tile", start.x, start.y),
            root,
        ));
    }

    let mut occupied = HashSet::<GridPos>::new();
    let npc_blockers = npcs.iter().zip(&npc_nodes).map(|(npc, node)| (npc.position, *node));
    let sign_blockers = signs.iter().map(|(sign, node)| (sign.position, *node));
    for (position, node) in npc_blockers.chain(sign_blockers) {
        if !map.in_bounds(position) {
            return Err(ctx.out_of_bounds(position, node));
        }
        if position == start || !occupied.insert(position) {
            return Err(ctx.error(
                WorldErrorCode::OverlappingBlocker,
                format!("blocker at ({}, {}) overlaps another occupant", position.x, position.y),
                node,
            ));
        }
    }
    for (door, node) in doors.iter().zip(&door_nodes) {
        if !map.in_bounds(door.position) {
            return Err(ctx.out_of_bounds(door.position, *node));
        }
    }

    ctx.check_unique_ids(&labelled_nodes(npcs.iter().map(|npc| npc.id.as_str()), &npc_nodes))?;
    ctx.check_unique_ids(&labelled_nodes(doors.iter().map(|door| door.id.as_str()), &door_nodes))?;
    ctx.check_unique_ids(&labelled_nodes(
        entities.iter().map(|entity| entity.id.as_str()),
        &entity_nodes,
    ))?;

    Ok(WorldDefs {
        name,
        map,
        start,
        doors,
        npcs,
        signs: signs.into_iter().map(|(sign, _)| sign).collect(),
        encounters: EncounterTable::new(entities, zones, default_pool),
    })
}

fn labelled_nodes<'s, 'a, 'input>(
    ids: impl Iterator<Item = &'s str>,
    nodes: &[Node<'a, 'input>],
) -> Vec<(&'s str, Node<'a, 'input>)> {
    ids.zip(nodes.iter().copied()).collect()
}

struct CompileCtx<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl CompileCtx<'_, '_> {
    fn parse_door(&self, node: Node<'_, '_>) -> Result<DoorDef, WorldCompileError> {
        self.check_attributes(node, &["id", "screen", "label", "x", "y"])?;
        Ok(DoorDef {
            id: self.required_attr(node, "id")?.to_string(),
            screen: self.required_attr(node, "screen")?.to_string(),
            label: self.required_attr(node, "label")?.to_string(),
            position: self.parse_position(node, "x", "y")?,
            dialog: self.parse_lines(node)?,
        })
    }

    fn parse_npc(&self, node: Node<'_, '_>) -> Result<NpcDef, WorldCompileError> {
        self.check_attributes(node, &["id", "x", "y", "variant"])?;
        let variant = match node.attribute("variant") {
            Some(_) => self.parse_attr(node, "variant")?,
            None => 0,
        };
        Ok(NpcDef {
            id: self.required_attr(node, "id")?.to_string(),
            position: self.parse_position(node, "x", "y")?,
            variant,
            dialog: self.parse_lines(node)?,
        })
    }

    fn parse_sign(&self, node: Node<'_, '_>) -> Result<SignDef, WorldCompileError> {
        self.check_attributes(node, &["x", "y"])?;
        Ok(SignDef {
            position: self.parse_position(node, "x", "y")?,
            lines: self.parse_lines(node)?,
        })
    }

    fn parse_zone(&self, node: Node<'_, '_>) -> Result<GrassZone, WorldCompileError> {
        self.check_attributes(node, &["x1", "y1", "x2", "y2", "pool"])?;
        let min = self.parse_position(node, "x1", "y1")?;
        let max = self.parse_position(node, "x2", "y2")?;
        if min.x > max.x || min.y > max.y {
            return Err(self.error(
                WorldErrorCode::InvalidValue,
                "grass zone corners must satisfy x1 <= x2 and y1 <= y2".to_string(),
                node,
            ));
        }
        Ok(GrassZone {
            min,
            max,
            pool: self.required_attr(node, "pool")?.to_string(),
        })
    }

    fn parse_entity(&self, node: Node<'_, '_>) -> Result<EncounterEntity, WorldCompileError> {
        self.check_attributes(
            node,
            &["id", "name", "pool", "rarity", "catchable", "kind", "level", "type"],
        )?;
        let raw_rarity = self.required_attr(node, "rarity")?;
        let rarity = Rarity::parse(raw_rarity).ok_or_else(|| {
            self.error(
                WorldErrorCode::InvalidValue,
                format!(
                    "invalid rarity '{raw_rarity}'; allowed values: COMMON, UNCOMMON, RARE"
                ),
                node,
            )
        })?;
        let catchable = self.parse_attr::<bool>(node, "catchable")?;

        let mut description: Option<String> = None;
        for child in node.children().filter(|child| child.is_element()) {
            match child.tag_name().name() {
                "Description" if description.is_none() => {
                    description = Some(self.required_text(child)?);
                }
                "Description" => return Err(self.duplicate(child)),
                other => {
                    return Err(self.error(
                        WorldErrorCode::UnknownElement,
                        format!("unknown element <{other}> in <Entity>"),
                        child,
                    ))
                }
            }
        }
        let Some(description) = description else {
            return Err(self.missing("<Description>", node));
        };

        Ok(EncounterEntity {
            id: self.required_attr(node, "id")?.to_string(),
            name: self.required_attr(node, "name")?.to_string(),
            pool: self.required_attr(node, "pool")?.to_string(),
            rarity,
            catchable,
            kind: self.required_attr(node, "kind")?.to_string(),
            level: self.required_attr(node, "level")?.to_string(),
            element: self.required_attr(node, "type")?.to_string(),
            description,
        })
    }

    /// `<Line>` children in order. A literal `\n` in the text becomes a line break.
    fn parse_lines(&self, node: Node<'_, '_>) -> Result<Vec<String>, WorldCompileError> {
        let mut lines = Vec::new();
        for child in node.children().filter(|child| child.is_element()) {
            if child.tag_name().name() != "Line" {
                return Err(self.error(
                    WorldErrorCode::UnknownElement,
                    format!(
                        "unknown element <{}> in <{}>; expected <Line>",
                        child.tag_name().name(),
                        node.tag_name().name()
                    ),
                    child,
                ));
            }
            lines.push(self.required_text(child)?.replace("\\n", "\n"));
        }
        if lines.is_empty() {
            return Err(self.missing("<Line>", node));
        }
        Ok(lines)
    }

    fn parse_id_list(&self, node: Node<'_, '_>) -> Result<Vec<TileId>, WorldCompileError> {
        node.text()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<TileId>().map_err(|_| {
                    self.error(
                        WorldErrorCode::InvalidValue,
                        format!("'{token}' is not a valid tile id"),
                        node,
                    )
                })
            })
            .collect()
    }

    fn parse_position(
        &self,
        node: Node<'_, '_>,
        x_attr: &str,
        y_attr: &str,
    ) -> Result<GridPos, WorldCompileError> {
        Ok(GridPos::new(
            self.parse_attr(node, x_attr)?,
            self.parse_attr(node, y_attr)?,
        ))
    }

    fn parse_attr<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, WorldCompileError> {
        let value = self.required_attr(node, name)?;
        value.trim().parse::<T>().map_err(|_| {
            self.error(
                WorldErrorCode::InvalidValue,
                format!(
                    "attribute {name}='{value}' on <{}> is not valid",
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    fn required_attr<'n>(
        &self,
        node: Node<'n, '_>,
        name: &str,
    ) -> Result<&'n str, WorldCompileError> {
        match node.attribute(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(self.missing(&format!("attribute '{name}'"), node)),
        }
    }

    fn required_text(&self, node: Node<'_, '_>) -> Result<String, WorldCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error(
                WorldErrorCode::MissingField,
                format!("<{}> must not be empty", node.tag_name().name()),
                node,
            ));
        }
        Ok(value)
    }

    fn check_attributes(&self, node: Node<'_, '_>, allowed: &[&str]) -> Result<(), WorldCompileError> {
        match node
            .attributes()
            .find(|attr| !allowed.contains(&attr.name()))
        {
            Some(attr) => Err(self.error(
                WorldErrorCode::UnknownAttribute,
                format!(
                    "unknown attribute '{}' on <{}>",
                    attr.name(),
                    node.tag_name().name()
                ),
                node,
            )),
            None => Ok(()),
        }
    }

    fn check_unique_ids(&self, entries: &[(&str, Node<'_, '_>)]) -> Result<(), WorldCompileError> {
        let mut seen = HashSet::<&str>::new();
        for &(id, node) in entries {
            if !seen.insert(id) {
                return Err(self.error(
                    WorldErrorCode::DuplicateId,
                    format!("duplicate id '{id}' on <{}>", node.tag_name().name()),
                    node,
                ));
            }
        }
        Ok(())
    }

    fn duplicate(&self, node: Node<'_, '_>) -> WorldCompileError {
        self.error(
            WorldErrorCode::DuplicateElement,
            format!("duplicate element <{}>", node.tag_name().name()),
            node,
        )
    }

    fn missing(&self, what: &str, node: Node<'_, '_>) -> WorldCompileError {
        self.error(
            WorldErrorCode::MissingField,
            format!("missing required {what} in <{}>", node.tag_name().name()),
            node,
        )
    }

    fn out_of_bounds(&self, position: GridPos, node: Node<'_, '_>) -> WorldCompileError {
        self.error(
            WorldErrorCode::OutOfBounds,
            format!("({}, {}) lies outside the map", position.x, position.y),
            node,
        )
    }

    fn error(&self, code: WorldErrorCode, message: String, node: Node<'_, '_>) -> WorldCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        WorldCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}
