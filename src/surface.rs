// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceCell {
    pub ch: char,
    pub alpha: f32,
    pub glow: f32,
}

impl SurfaceCell {
    const DARK: SurfaceCell = SurfaceCell {
        ch: ' ',
        alpha: 0.0,
        glow: 0.0,
    };
}

// Intensity buffer the rain paints onto. It is never cleared between
// frames; `fade` dims everything so old glyphs leave trails.
#[derive(Clone, Debug)]
pub struct Surface {
    pub width: u16,
    pub height: u16,
    cells: Vec<SurfaceCell>,
}

pub const ALPHA_FLOOR: f32 = 0.02;

impl Surface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![SurfaceCell::DARK; width as usize * height as usize],
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Surface::new(width, height);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    #[cfg(test)]
    pub fn get(&self, x: u16, y: u16) -> Option<&SurfaceCell> {
        self.index(x as i32, y as i32).map(|i| &self.cells[i])
    }

    pub fn fade(&mut self, amount: f32) {
        let keep = (1.0 - amount).clamp(0.0, 1.0);
        for c in &mut self.cells {
            c.alpha *= keep;
            c.glow *= keep;
            if c.alpha < ALPHA_FLOOR {
                *c = SurfaceCell::DARK;
            }
        }
    }

    pub fn plot(&mut self, x: i32, y: i32, ch: char, alpha: f32, glow: f32) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let alpha = alpha.clamp(0.0, 1.0);
        let cell = &mut self.cells[i];
        if alpha >= cell.alpha {
            cell.ch = ch;
        }
        cell.alpha = alpha + cell.alpha * (1.0 - alpha);
        cell.glow = cell.glow.max(glow.clamp(0.0, 1.0));
    }

    pub fn text(&mut self, x: i32, y: i32, s: &str, alpha: f32) {
        for (i, ch) in s.chars().enumerate() {
            if ch != ' ' {
                self.plot(x + i as i32, y, ch, alpha, 0.0);
            }
        }
    }

    pub fn cells(&self) -> &[SurfaceCell] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(SurfaceCell::DARK);
    }
}
