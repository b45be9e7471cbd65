// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Debug)]
pub struct GlyphAtlas {
    pub glyphs: Vec<char>,
    pub cells_per_row: usize,
    pub cell_size: f32,
}

pub const CELLS_PER_ROW: usize = 16;
pub const TERMINAL_CELL_SIZE: f32 = 1.0;

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

fn alphabet() -> Vec<char> {
    let mut out = Vec::with_capacity(180);
    push_range(&mut out, 0x41, 0x5A);
    push_range(&mut out, 0x61, 0x7A);
    push_range(&mut out, 0x30, 0x39);
    push_range(&mut out, 0x21, 0x2F);
    push_range(&mut out, 0x3A, 0x40);
    push_range(&mut out, 0x5B, 0x60);
    push_range(&mut out, 0x7B, 0x7E);
    // half-width katakana, single terminal cell each
    push_range(&mut out, 0xFF66, 0xFF9D);
    out
}

impl GlyphAtlas {
    pub fn build() -> Self {
        Self {
            glyphs: alphabet(),
            cells_per_row: CELLS_PER_ROW,
            cell_size: TERMINAL_CELL_SIZE,
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn cell_of(&self, index: u16) -> (usize, usize) {
        let i = index as usize % self.glyphs.len().max(1);
        (i % self.cells_per_row, i / self.cells_per_row)
    }

    pub fn glyph(&self, index: u16) -> char {
        let (col, row) = self.cell_of(index);
        self.glyphs
            .get(row * self.cells_per_row + col)
            .copied()
            .unwrap_or('0')
    }
}
