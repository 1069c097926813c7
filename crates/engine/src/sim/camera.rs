use super::tilemap::TileMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Camera as a pure projection of the actor's render position.
///
/// The only state is the clamp range, derived from map and viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    tile_px: u32,
    map_px: Vec2,
    viewport: Viewport,
}

impl CameraController {
    pub fn new(map: &TileMap, tile_px: u32, viewport: Viewport) -> Self {
        let (map_w, map_h) = map.pixel_size(tile_px);
        Self {
            tile_px,
            map_px: Vec2::new(map_w as f32, map_h as f32),
            viewport,
        }
    }

    /// Top-left of the visible region in map pixels. `actor_px` is the actor's
    /// interpolated tile origin; the camera centers on the middle of that tile.
    pub fn offset(&self, actor_px: Vec2) -> Vec2 {
        let half_tile = self.tile_px as f32 * 0.5;
        let view_w = self.viewport.width as f32;
        let view_h = self.viewport.height as f32;
        Vec2 {
            x: clamp_axis(actor_px.x + half_tile - view_w * 0.5, self.map_px.x - view_w),
            y: clamp_axis(actor_px.y + half_tile - view_h * 0.5, self.map_px.y - view_h),
        }
    }
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    value.min(max.max(0.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tilemap::TILE_GRASS;

    fn camera(map_w: u32, map_h: u32, view_w: u32, view_h: u32) -> CameraController {
        let map = TileMap::new(
            map_w,
            map_h,
            vec![TILE_GRASS; map_w as usize * map_h as usize],
            [],
        )
        .expect("tilemap");
        CameraController::new(
            &map,
            16,
            Viewport {
                width: view_w,
                height: view_h,
            },
        )
    }

    #[test]
    fn centers_on_actor_tile_in_open_space() {
        let cam = camera(30, 25, 160, 144);
        let offset = cam.offset(Vec2::new(15.0 * 16.0, 12.0 * 16.0));
        assert_eq!(offset, Vec2::new(248.0 - 80.0, 200.0 - 72.0));
    }

    #[test]
    fn clamps_at_top_left_corner() {
        let cam = camera(30, 25, 160, 144);
        assert_eq!(cam.offset(Vec2::new(0.0, 0.0)), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn clamps_at_bottom_right_corner() {
        let cam = camera(30, 25, 160, 144);
        let offset = cam.offset(Vec2::new(29.0 * 16.0, 24.0 * 16.0));
        assert_eq!(offset, Vec2::new(480.0 - 160.0, 400.0 - 144.0));
    }

    #[test]
    fn map_smaller_than_viewport_pins_to_origin() {
        let cam = camera(4, 4, 160, 144);
        assert_eq!(cam.offset(Vec2::new(48.0, 48.0)), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn axes_clamp_independently() {
        let cam = camera(30, 25, 160, 144);
        let offset = cam.offset(Vec2::new(15.0 * 16.0, 0.0));
        assert_eq!(offset.y, 0.0);
        assert!(offset.x > 0.0);
    }
}
