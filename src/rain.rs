// Copyright (c) 2026 rezky_nightky

use rand::Rng;

use crate::atlas::GlyphAtlas;
use crate::config::Settings;
use crate::surface::Surface;
use crate::util::{rand_int, rand_range};

pub const MIN_COLUMNS: usize = 8;
pub const COLUMN_FILL: f32 = 0.7;

pub const FADE_PER_FRAME: f32 = 0.12;
pub const RECYCLE_MARGIN: f32 = 2.0;

const SPEED_CELLS: (f32, f32) = (6.0, 16.0);
const LENGTH: (i64, i64) = (8, 27);
const DRIFT_CELLS: (f32, f32) = (-0.15, 0.15);
const RESPAWN_HEAD_CELLS: (f32, f32) = (-12.0, 0.0);
const GLITCH_CHANCE: f64 = 0.03;

const SNIPPET_CHANCE: f64 = 0.012;
const SNIPPET_ALPHA: f32 = 0.55;
const SNIPPETS: &[&str] = &[
    "fn trace(id: &str) -> Risk {",
    "SELECT * FROM profiles WHERE risk > 80;",
    "let score = base + mood.offset();",
    "if income < 40_000 { flag(id) }",
    "for col in columns.iter_mut() {",
    "0xDEADBEEF 0xCAFEBABE 0x5F3759DF",
    "match mood { Burnout => alert(), _ => {} }",
    "sudo tcpdump -i eth0 port 443",
    "git push --force origin main",
    "while true; do harvest; done",
];

pub fn desired_columns(width: f32, cell_size: f32, density: f32) -> usize {
    let cells = width / cell_size.max(f32::EPSILON);
    let n = (cells * COLUMN_FILL * density).floor();
    (n.max(0.0) as usize).max(MIN_COLUMNS)
}

// One falling stream. `glyphs[0]` is at the head, the last entry at the
// tail. Positions are in surface units.
#[derive(Clone, Debug)]
pub struct Column {
    pub x: f32,
    pub head_y: f32,
    pub speed: f32,
    pub length: usize,
    pub glyphs: Vec<u16>,
    pub drift: f32,
}

impl Column {
    fn spawn<R: Rng + ?Sized>(rng: &mut R, atlas: &GlyphAtlas, width: f32, head_y: f32) -> Self {
        let length = rand_int(rng, LENGTH.0, LENGTH.1) as usize;
        let glyphs = (0..length)
            .map(|_| rng.random_range(0..atlas.len() as u16))
            .collect();
        Self {
            x: rand_range(rng, 0.0, width),
            head_y,
            speed: rand_range(rng, SPEED_CELLS.0, SPEED_CELLS.1),
            length,
            glyphs,
            drift: rand_range(rng, DRIFT_CELLS.0, DRIFT_CELLS.1),
        }
    }

    pub fn tail_y(&self, cell: f32) -> f32 {
        self.head_y - self.length as f32 * cell
    }
}

pub struct RainField {
    atlas: GlyphAtlas,
    columns: Vec<Column>,
    width: u16,
    height: u16,
}

impl RainField {
    pub fn new(atlas: GlyphAtlas) -> Self {
        Self {
            atlas,
            columns: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn desired(&self, density: f32) -> usize {
        desired_columns(self.width as f32, self.atlas.cell_size, density)
    }

    pub fn resize<R: Rng + ?Sized>(&mut self, width: u16, height: u16, density: f32, rng: &mut R) {
        self.width = width;
        self.height = height;
        let count = self.desired(density);
        let w = width as f32;
        let h = height as f32;

        self.columns.clear();
        self.columns.reserve(count);
        for _ in 0..count {
            let head = rand_range(rng, -h.max(1.0), 0.0);
            let col = Column::spawn(rng, &self.atlas, w, head);
            self.columns.push(col);
        }
        log::debug!("rain rebuilt: {}x{} -> {} columns", width, height, count);
    }

    // Moves every column by `dt` seconds. Returns `true` when the column
    // count no longer matched the density and the field was rebuilt
    // instead.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, settings: &Settings, rng: &mut R) -> bool {
        if self.desired(settings.density) != self.columns.len() {
            self.resize(self.width, self.height, settings.density, rng);
            return true;
        }

        let cell = self.atlas.cell_size;
        let w = (self.width as f32).max(cell);
        let bottom = self.height as f32 + RECYCLE_MARGIN * cell;
        let glyph_count = self.atlas.len() as u16;

        for col in &mut self.columns {
            col.head_y += col.speed * cell * settings.speed * dt;
            col.x = (col.x + col.drift * cell * dt).rem_euclid(w);

            if !col.glyphs.is_empty() && rng.random_bool(GLITCH_CHANCE) {
                let at = rng.random_range(0..col.glyphs.len());
                col.glyphs[at] = rng.random_range(0..glyph_count);
            }

            if col.tail_y(cell) > bottom {
                let head = rand_range(rng, RESPAWN_HEAD_CELLS.0, RESPAWN_HEAD_CELLS.1) * cell;
                *col = Column::spawn(rng, &self.atlas, self.width as f32, head);
            }
        }
        false
    }

    pub fn render<R: Rng + ?Sized>(&self, surface: &mut Surface, settings: &Settings, rng: &mut R) {
        surface.fade(FADE_PER_FRAME);

        let cell = self.atlas.cell_size;
        for col in &self.columns {
            let cx = (col.x / cell).floor() as i32;
            let head_row = (col.head_y / cell).floor() as i32;
            let len = col.length.max(1) as f32;

            for k in (0..col.length).rev() {
                let alpha = 1.0 - (k as f32 / len);
                let glow = if k == 0 {
                    settings.glow
                } else {
                    settings.glow * alpha * 0.5
                };
                let ch = self.atlas.glyph(col.glyphs[k]);
                surface.plot(cx, head_row - k as i32, ch, alpha, glow);
            }
        }

        if settings.show_code && rng.random_bool(SNIPPET_CHANCE) {
            let snippet = SNIPPETS[rng.random_range(0..SNIPPETS.len())];
            let max_x = (surface.width as i64 - snippet.len() as i64).max(0);
            let x = rand_int(rng, 0, max_x) as i32;
            let y = rand_int(rng, 0, (surface.height as i64 - 1).max(0)) as i32;
            surface.text(x, y, snippet, SNIPPET_ALPHA);
        }
    }
}
