// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, Theme};

pub const LEVELS: usize = 10;

#[derive(Clone, Debug)]
pub struct Palette {
    pub levels: Vec<Color>,
    pub glow: Color,
    pub bg: Option<Color>,
}

impl Palette {
    pub fn level(&self, t: f32) -> Option<Color> {
        if self.levels.is_empty() {
            return None;
        }
        let last = self.levels.len() - 1;
        let i = (t.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.levels.get(i.min(last)).copied()
    }
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(
        r,
        g,
        b,
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = match avg {
        0..=7 => 16,
        239..=255 => 231,
        _ => 232 + ((avg - 8) / 10).min(23),
    };
    let gray_v = match gray_idx {
        16 => 0,
        231 => 255,
        i => 8 + 10 * (i - 232),
    };
    let gray_dist = dist2(r, g, b, gray_v, gray_v, gray_v);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 8] = [
        (Color::Black, (0, 0, 0)),
        (Color::White, (255, 255, 255)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, (cr, cg, cb)) in TABLE {
        let d = dist2(r, g, b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn convert(mode: ColorMode, (r, g, b): (u8, u8, u8)) -> Color {
    match mode {
        ColorMode::Mono => Color::White,
        ColorMode::TrueColor => Color::Rgb { r, g, b },
        ColorMode::Color256 => Color::AnsiValue(rgb_to_ansi256(r, g, b)),
        ColorMode::Color16 => rgb_to_color16(r, g, b),
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn gradient(stops: &[(u8, u8, u8)], steps: usize) -> Vec<(u8, u8, u8)> {
    if steps == 0 || stops.is_empty() {
        return Vec::new();
    }
    if stops.len() == 1 || steps == 1 {
        return vec![stops[0]; steps];
    }

    let segs = stops.len() - 1;
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        let pos = (i as f32) / ((steps - 1) as f32) * (segs as f32);
        let seg = (pos.floor() as usize).min(segs - 1);
        let lt = pos - (seg as f32);
        let (r0, g0, b0) = stops[seg];
        let (r1, g1, b1) = stops[seg + 1];
        out.push((lerp_u8(r0, r1, lt), lerp_u8(g0, g1, lt), lerp_u8(b0, b1, lt)));
    }
    out
}

fn theme_stops(theme: Theme) -> ([(u8, u8, u8); 3], (u8, u8, u8)) {
    match theme {
        Theme::Green => ([(0, 40, 10), (0, 160, 60), (80, 255, 140)], (220, 255, 230)),
        Theme::Cyan => ([(0, 30, 45), (0, 150, 190), (90, 240, 255)], (220, 250, 255)),
        Theme::Magenta => ([(45, 0, 40), (180, 20, 160), (255, 110, 240)], (255, 225, 250)),
    }
}

pub fn build_palette(theme: Theme, mode: ColorMode, default_background: bool) -> Palette {
    let bg = if default_background {
        None
    } else {
        Some(match mode {
            ColorMode::Color16 => Color::Black,
            ColorMode::TrueColor => Color::Rgb { r: 0, g: 0, b: 0 },
            _ => Color::AnsiValue(16),
        })
    };

    if mode == ColorMode::Mono {
        return Palette {
            levels: vec![Color::White],
            glow: Color::White,
            bg: None,
        };
    }

    let (stops, glow) = theme_stops(theme);
    let levels = gradient(&stops, LEVELS)
        .into_iter()
        .map(|rgb| convert(mode, rgb))
        .collect();

    Palette {
        levels,
        glow: convert(mode, glow),
        bg,
    }
}
