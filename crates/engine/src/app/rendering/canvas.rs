use super::font::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH, LINE_ADVANCE};

pub type Rgba = [u8; 4];

/// Immediate-mode painter over an RGBA8 frame. Every primitive clips to the
/// frame, so callers can pass coordinates that hang off any edge.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.offset(x, y)?;
        let bytes = self.frame.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba) {
        let x0 = i64::from(x).max(0);
        let y0 = i64::from(y).max(0);
        let x1 = (i64::from(x) + i64::from(w)).min(i64::from(self.width));
        let y1 = (i64::from(y) + i64::from(h)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let stride = self.width as usize * 4;
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize * 4;
            let end = row * stride + x1 as usize * 4;
            let Some(span) = self.frame.get_mut(start..end) else {
                return;
            };
            for chunk in span.chunks_exact_mut(4) {
                chunk.copy_from_slice(&color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba) {
        if w == 0 || h == 0 {
            return;
        }
        let right = x.saturating_add(w as i32 - 1);
        let bottom = y.saturating_add(h as i32 - 1);
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, bottom, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(right, y, 1, h, color);
    }

    /// Draws `text` with its top-left at (x, y); `\n` starts a new line.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, scale: u32, color: Rgba) {
        let scale = scale.max(1);
        let mut pen_x = x;
        let mut pen_y = y;
        for c in text.chars() {
            if c == '\n' {
                pen_x = x;
                pen_y = pen_y.saturating_add((LINE_ADVANCE * scale) as i32);
                continue;
            }
            if let Some(rows) = glyph(c) {
                self.draw_glyph(pen_x, pen_y, rows, scale, color);
            }
            pen_x = pen_x.saturating_add((GLYPH_ADVANCE * scale) as i32);
        }
    }

    fn draw_glyph(&mut self, x: i32, y: i32, rows: [u8; 5], scale: u32, color: Rgba) {
        for (row_index, row) in rows.iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if row & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                    continue;
                }
                self.fill_rect(
                    x + (column * scale) as i32,
                    y + (row_index as u32 * scale) as i32,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

/// Pixel width of the widest line of `text`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.split('\n')
        .map(|line| {
            let count = line.chars().count() as u32;
            if count == 0 {
                0
            } else {
                (count * GLYPH_ADVANCE - 1) * scale.max(1)
            }
        })
        .max()
        .unwrap_or(0)
}

/// Greedy word wrap so that no line of the result is wider than `max_width`.
/// Existing line breaks are kept; a word longer than a whole line is split.
pub fn wrap_text(text: &str, max_width: u32, scale: u32) -> String {
    let scale = scale.max(1);
    let max_chars = ((max_width / scale + 1) / GLYPH_ADVANCE).max(1) as usize;
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_chars = 0usize;
        for word in paragraph.split(' ').filter(|word| !word.is_empty()) {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > max_chars {
                if line_chars > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_chars = 0;
                }
                let rest = chars.split_off(max_chars);
                lines.push(chars.into_iter().collect());
                chars = rest;
            }
            if line_chars > 0 && line_chars + 1 + chars.len() > max_chars {
                lines.push(std::mem::take(&mut line));
                line_chars = 0;
            }
            if line_chars > 0 {
                line.push(' ');
                line_chars += 1;
            }
            line_chars += chars.len();
            line.extend(chars);
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn text_height(text: &str, scale: u32) -> u32 {
    let lines = text.split('\n').count() as u32;
    ((lines - 1) * LINE_ADVANCE + GLYPH_HEIGHT) * scale.max(1)
}
