use overworld_engine::sim::{
    DialogState, EncounterPhase, EncounterSession, GridPos, IdSet, OverworldSession, PauseItem,
    Rarity, TileId, Viewport, CATCH_MENU, MAIN_MENU, TILE_CAVE_ENTRANCE, TILE_CAVE_TOP, TILE_FENCE,
    TILE_FLOWERS, TILE_GRASS, TILE_HOUSE_DOOR, TILE_HOUSE_WALL, TILE_HOUSE_WALL_WINDOW, TILE_LEDGE,
    TILE_PATH, TILE_PC_DOOR, TILE_PC_ROOF, TILE_PC_WALL, TILE_ROAD, TILE_ROOF_BLUE_L,
    TILE_ROOF_BLUE_R, TILE_ROOF_GREEN_L, TILE_ROOF_GREEN_R, TILE_ROOF_RED_L, TILE_ROOF_RED_R,
    TILE_SIGN_POST, TILE_TALL_GRASS, TILE_TREE_BOTTOM, TILE_TREE_TOP, TILE_WATER,
};
use overworld_engine::{text_height, text_width, wrap_text, Canvas, Rgba};

pub(crate) const BACKGROUND: Rgba = [16, 16, 24, 255];
pub(crate) const PLAYER: Rgba = [208, 56, 56, 255];
pub(crate) const FLASH: Rgba = [248, 248, 248, 255];
const PANEL: Rgba = [248, 248, 240, 255];
const PANEL_BORDER: Rgba = [40, 40, 56, 255];
const TEXT: Rgba = [32, 32, 40, 255];
const PLAYER_FACE: Rgba = [248, 208, 160, 255];
const PLAYER_FEET: Rgba = [48, 40, 56, 255];
const SIGN: Rgba = [136, 96, 48, 255];
const NPC_COLORS: [Rgba; 4] = [
    [56, 104, 200, 255],
    [64, 160, 88, 255],
    [176, 88, 176, 255],
    [216, 160, 48, 255],
];
const ENCOUNTER_BACKDROP: Rgba = [200, 232, 192, 255];

const TEXT_SCALE: u32 = 1;
const DIALOG_HEIGHT: u32 = 40;
const DIALOG_TEXT_X: i32 = 8;
// Left inset plus the room kept for the waiting indicator.
const DIALOG_TEXT_MARGIN: u32 = 24;
const MENU_ROW: i32 = 10;
const FLASH_PERIOD_TICKS: u64 = 4;

pub(crate) fn tile_color(tile: TileId) -> Rgba {
    match tile {
        TILE_GRASS => [120, 200, 96, 255],
        TILE_PATH => [216, 192, 136, 255],
        TILE_ROAD => [168, 160, 152, 255],
        TILE_WATER => [64, 128, 216, 255],
        TILE_TREE_TOP => [32, 112, 56, 255],
        TILE_TREE_BOTTOM => [96, 72, 40, 255],
        TILE_ROOF_RED_L | TILE_ROOF_RED_R => [184, 64, 56, 255],
        TILE_ROOF_BLUE_L | TILE_ROOF_BLUE_R => [64, 88, 176, 255],
        TILE_ROOF_GREEN_L | TILE_ROOF_GREEN_R => [56, 144, 96, 255],
        TILE_HOUSE_WALL => [232, 224, 200, 255],
        TILE_HOUSE_WALL_WINDOW => [168, 208, 232, 255],
        TILE_HOUSE_DOOR | TILE_PC_DOOR => [112, 72, 40, 255],
        TILE_PC_ROOF => [224, 88, 96, 255],
        TILE_PC_WALL => [240, 240, 240, 255],
        TILE_CAVE_TOP => [112, 104, 96, 255],
        TILE_CAVE_ENTRANCE => [24, 24, 24, 255],
        TILE_FENCE => [200, 176, 128, 255],
        TILE_SIGN_POST => [160, 120, 72, 255],
        TILE_FLOWERS => [232, 120, 160, 255],
        TILE_TALL_GRASS => [56, 152, 64, 255],
        TILE_LEDGE => [96, 168, 80, 255],
        _ => [255, 0, 255, 255],
    }
}

/// Draws one frame of the session into the canvas.
pub(crate) fn paint(session: &OverworldSession, canvas: &mut Canvas<'_>) {
    canvas.clear(BACKGROUND);

    if let Some(encounter) = session.encounter() {
        paint_encounter(session, encounter, canvas);
        return;
    }

    paint_world(session, canvas);

    if session.is_flashing() && (session.tick_count() / FLASH_PERIOD_TICKS) % 2 == 0 {
        canvas.clear(FLASH);
        return;
    }

    if let Some(name) = session.banner() {
        let width = text_width(name, TEXT_SCALE) + 8;
        let height = text_height(name, TEXT_SCALE) + 8;
        panel(canvas, 2, 2, width, height);
        canvas.draw_text(6, 6, name, TEXT_SCALE, TEXT);
    }
    if let Some((text, waiting)) = session.dialog_text() {
        dialog_box(canvas, &text, waiting);
    }
    if session.pause_menu().is_open() {
        paint_pause(session, canvas);
    }
}

fn paint_world(session: &OverworldSession, canvas: &mut Canvas<'_>) {
    let world = session.world();
    let tile_px = session.config().tile_px.max(1);
    let viewport = Viewport {
        width: canvas.width(),
        height: canvas.height(),
    };
    let offset = session.camera_offset(viewport);
    let (offset_x, offset_y) = (offset.x.round() as i32, offset.y.round() as i32);
    let tile = tile_px as i32;

    let first_x = offset_x.div_euclid(tile);
    let first_y = offset_y.div_euclid(tile);
    let columns = viewport.width as i32 / tile + 2;
    let rows = viewport.height as i32 / tile + 2;
    for y in first_y..first_y + rows {
        for x in first_x..first_x + columns {
            let Some(id) = world.map.tile_at(GridPos::new(x, y)) else {
                continue;
            };
            let screen_x = x * tile - offset_x;
            let screen_y = y * tile - offset_y;
            canvas.fill_rect(screen_x, screen_y, tile_px, tile_px, tile_color(id));
            if id == TILE_TALL_GRASS {
                let blade = [32, 120, 48, 255];
                canvas.fill_rect(screen_x + 3, screen_y + 4, 2, 6, blade);
                canvas.fill_rect(screen_x + 10, screen_y + 7, 2, 6, blade);
            }
        }
    }

    let to_screen = |pos: GridPos| (pos.x * tile - offset_x, pos.y * tile - offset_y);
    for sign in &world.signs {
        let (x, y) = to_screen(sign.position);
        canvas.fill_rect(x + 2, y + 3, tile_px.saturating_sub(4), 7, SIGN);
        canvas.fill_rect(x + tile / 2 - 1, y + 10, 2, tile_px.saturating_sub(10), SIGN);
    }
    for npc in &world.npcs {
        let (x, y) = to_screen(npc.position);
        let color = NPC_COLORS[usize::from(npc.variant) % NPC_COLORS.len()];
        body(canvas, x, y, tile_px, color);
    }

    let actor = session.actor_render_position();
    let (x, y) = (
        actor.x.round() as i32 - offset_x,
        actor.y.round() as i32 - offset_y,
    );
    body(canvas, x, y, tile_px, PLAYER);
    feet(canvas, x, y, tile, session.actor().animation_phase());
    let (dx, dy) = session.actor().direction().delta();
    let center = tile / 2;
    canvas.fill_rect(
        x + center - 1 + dx * 4,
        y + center - 1 + dy * 4,
        2,
        2,
        PLAYER_FACE,
    );
}

fn body(canvas: &mut Canvas<'_>, x: i32, y: i32, tile_px: u32, color: Rgba) {
    canvas.fill_rect(x + 3, y + 2, tile_px.saturating_sub(6), tile_px.saturating_sub(3), color);
}

/// Walk cycle: phase 0 stands, 1 and 2 lift the left and right foot.
fn feet(canvas: &mut Canvas<'_>, x: i32, y: i32, tile: i32, phase: u8) {
    let (left_lift, right_lift) = match phase {
        0 => (0, 0),
        1 => (1, 0),
        _ => (0, 1),
    };
    canvas.fill_rect(x + 4, y + tile - 2 - left_lift, 3, 2, PLAYER_FEET);
    canvas.fill_rect(x + tile - 7, y + tile - 2 - right_lift, 3, 2, PLAYER_FEET);
}

fn panel(canvas: &mut Canvas<'_>, x: i32, y: i32, width: u32, height: u32) {
    canvas.fill_rect(x, y, width, height, PANEL);
    canvas.stroke_rect(x, y, width, height, PANEL_BORDER);
}

fn dialog_box(canvas: &mut Canvas<'_>, text: &str, waiting: bool) {
    let width = canvas.width().saturating_sub(4);
    let top = canvas.height().saturating_sub(DIALOG_HEIGHT + 2) as i32;
    panel(canvas, 2, top, width, DIALOG_HEIGHT);
    let wrapped = wrap_text(text, dialog_text_width(canvas.width()), TEXT_SCALE);
    canvas.draw_text(DIALOG_TEXT_X, top + 6, &wrapped, TEXT_SCALE, TEXT);
    if waiting {
        let x = canvas.width() as i32 - 12;
        let y = top + DIALOG_HEIGHT as i32 - 9;
        canvas.fill_rect(x, y, 5, 1, TEXT);
        canvas.fill_rect(x + 1, y + 1, 3, 1, TEXT);
        canvas.fill_rect(x + 2, y + 2, 1, 1, TEXT);
    }
}

fn dialog_text_width(canvas_width: u32) -> u32 {
    canvas_width.saturating_sub(DIALOG_TEXT_MARGIN)
}

fn menu(canvas: &mut Canvas<'_>, x: i32, y: i32, items: &[&str], cursor: usize) {
    for (index, label) in items.iter().enumerate() {
        let row_y = y + 6 + index as i32 * MENU_ROW;
        if index == cursor {
            canvas.draw_text(x + 5, row_y, ">", TEXT_SCALE, TEXT);
        }
        canvas.draw_text(x + 12, row_y, label, TEXT_SCALE, TEXT);
    }
}

fn paint_pause(session: &OverworldSession, canvas: &mut Canvas<'_>) {
    let labels = PauseItem::ALL.map(PauseItem::label);
    let width = 64;
    let height = labels.len() as u32 * MENU_ROW as u32 + 8;
    let x = canvas.width() as i32 - width as i32 - 2;
    panel(canvas, x, 2, width, height);
    menu(canvas, x, 2, &labels, session.pause_menu().cursor());
}

fn rarity_color(rarity: Rarity) -> Rgba {
    match rarity {
        Rarity::Common => [120, 120, 128, 255],
        Rarity::Uncommon => [56, 120, 216, 255],
        Rarity::Rare => [216, 168, 32, 255],
    }
}

fn paint_encounter(
    session: &OverworldSession,
    encounter: &EncounterSession,
    canvas: &mut Canvas<'_>,
) {
    canvas.clear(ENCOUNTER_BACKDROP);
    let entity = encounter.entity();
    let animation = encounter.animation();

    panel(canvas, 4, 4, 120, 30);
    canvas.draw_text(10, 9, &entity.name, TEXT_SCALE, TEXT);
    let detail = format!("LV {}  {}", entity.level, entity.rarity.label());
    canvas.draw_text(10, 19, &detail, TEXT_SCALE, TEXT);
    if session.caught().contains(&entity.id) {
        canvas.fill_rect(114, 8, 5, 5, [208, 56, 56, 255]);
    }

    let sprite_x = canvas.width() as i32 - 72;
    if animation.entity_visible {
        canvas.fill_rect(sprite_x, 16, 48, 48, rarity_color(entity.rarity));
        canvas.stroke_rect(sprite_x, 16, 48, 48, PANEL_BORDER);
    } else {
        let wobble = if animation.wobbling {
            if (session.tick_count() / 8) % 2 == 0 {
                -2
            } else {
                2
            }
        } else {
            0
        };
        let ball_x = sprite_x + 18 + wobble;
        canvas.fill_rect(ball_x, 44, 12, 6, [208, 56, 56, 255]);
        canvas.fill_rect(ball_x, 50, 12, 6, PANEL);
        canvas.stroke_rect(ball_x, 44, 12, 12, PANEL_BORDER);
        if animation.captured {
            canvas.fill_rect(ball_x + 5, 49, 2, 2, [248, 216, 64, 255]);
        }
    }

    if let Some(dialog) = encounter.dialog() {
        let text = dialog.display_text(&session.config().player_name);
        dialog_box(canvas, &text, dialog.state() == DialogState::Waiting);
        return;
    }

    let (items, cursor): (&[&str], usize) = match encounter.phase() {
        EncounterPhase::MenuShown => (MAIN_MENU.as_slice(), encounter.menu_cursor()),
        EncounterPhase::CatchMenu => (CATCH_MENU.as_slice(), encounter.catch_cursor()),
        _ => return,
    };
    let top = canvas.height().saturating_sub(DIALOG_HEIGHT + 2) as i32;
    let width = canvas.width().saturating_sub(4);
    panel(canvas, 2, top, width, DIALOG_HEIGHT);
    menu(canvas, 2, top, items, cursor);
}
