// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use rand::rngs::StdRng;

use crate::atlas::GlyphAtlas;
use crate::capsule::{CapsuleManager, Panel};
use crate::config::Settings;
use crate::frame::{Cell, Frame};
use crate::palette::Palette;
use crate::rain::RainField;
use crate::surface::{Surface, ALPHA_FLOOR};

pub const MAX_DT: f32 = 0.1;
pub const FPS_WINDOW: Duration = Duration::from_millis(500);

const GLOW_LIFT: f32 = 0.35;
const HEAD_ALPHA: f32 = 0.95;
const HEAD_GLOW: f32 = 0.5;
const MIN_PANEL_OPACITY: f32 = 0.08;
const CURSOR: char = '█';

#[derive(Debug, Default)]
pub struct FrameTimer {
    last: Option<Duration>,
}

impl FrameTimer {
    pub fn tick(&mut self, now: Duration) -> f32 {
        let dt = match self.last {
            Some(prev) => now.saturating_sub(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        dt.min(MAX_DT)
    }
}

#[derive(Debug, Default)]
pub struct FpsMeter {
    window_start: Option<Duration>,
    frames: u32,
    estimate: f32,
}

impl FpsMeter {
    pub fn frame(&mut self, now: Duration) {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.saturating_sub(start);
        if elapsed >= FPS_WINDOW {
            self.estimate = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = Some(now);
        }
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }
}

// Everything that moves: the rain, its surface and the capsules. Capsule
// timers run on simulated time, so pausing freezes them too.
pub struct Scene {
    rain: RainField,
    surface: Surface,
    capsules: CapsuleManager,
    timer: FrameTimer,
    fps: FpsMeter,
    rng: StdRng,
    paused: bool,
    sim_time: Duration,
}

impl Scene {
    pub fn new(width: u16, height: u16, settings: &Settings, mut rng: StdRng) -> Self {
        let mut rain = RainField::new(GlyphAtlas::build());
        rain.resize(width, height, settings.density, &mut rng);
        let capsules = CapsuleManager::new(&mut rng);
        Self {
            rain,
            surface: Surface::new(width, height),
            capsules,
            timer: FrameTimer::default(),
            fps: FpsMeter::default(),
            rng,
            paused: false,
            sim_time: Duration::ZERO,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.surface.width, self.surface.height)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn live_capsules(&self) -> usize {
        self.capsules.live()
    }

    pub fn capsule_slots(&self) -> usize {
        self.capsules.allocated()
    }

    pub fn resize(&mut self, width: u16, height: u16, settings: &Settings) {
        self.surface.resize(width, height);
        self.rain.resize(width, height, settings.density, &mut self.rng);
    }

    pub fn reset(&mut self, settings: &Settings) {
        let (w, h) = self.size();
        self.surface.clear();
        self.rain.resize(w, h, settings.density, &mut self.rng);
        self.capsules.clear();
    }

    pub fn step(&mut self, now: Duration, settings: &Settings) {
        let dt = self.timer.tick(now);
        self.fps.frame(now);
        if self.paused {
            return;
        }
        self.sim_time += Duration::from_secs_f32(dt);

        self.rain.advance(dt, settings, &mut self.rng);
        self.rain.render(&mut self.surface, settings, &mut self.rng);

        let viewport = self.size();
        self.capsules
            .tick(dt, self.sim_time, settings, viewport, &mut self.rng);
        self.capsules.run_timers(self.sim_time, &mut self.rng);
    }

    pub fn compose(&self, frame: &mut Frame, palette: &Palette, settings: &Settings) {
        let bg = palette.bg;
        let w = self.surface.width.min(frame.width) as usize;
        let h = self.surface.height.min(frame.height) as usize;
        let cells = self.surface.cells();
        let stride = self.surface.width as usize;

        for y in 0..h {
            for x in 0..w {
                let c = cells[y * stride + x];
                let out = if c.alpha < ALPHA_FLOOR {
                    Cell::blank(bg)
                } else if c.alpha >= HEAD_ALPHA && c.glow >= HEAD_GLOW {
                    Cell::glyph(c.ch, Some(palette.glow), bg, true)
                } else {
                    Cell::glyph(c.ch, palette.level(c.alpha + c.glow * GLOW_LIFT), bg, false)
                };
                frame.set(x as i32, y as i32, out);
            }
        }

        for panel in self.capsules.panels() {
            draw_panel(frame, panel, palette);
        }

        let mut status = String::new();
        if settings.show_fps {
            status = format!(" {:.1} fps | {} capsules ", self.fps.estimate(), self.live_capsules());
        }
        if self.paused {
            status.push_str(" paused ");
        }
        if !status.is_empty() {
            frame.put_str(0, 0, &status, Some(palette.glow), bg, true);
        }
    }
}

fn draw_panel(frame: &mut Frame, panel: &Panel, palette: &Palette) {
    if panel.opacity < MIN_PANEL_OPACITY {
        return;
    }
    let bg = palette.bg;
    let x = panel.x + panel.jitter.0;
    let y = panel.y + panel.jitter.1;
    let (bw, bh) = panel.box_size();
    let (bw, bh) = (bw as i32, bh as i32);

    let border = palette.level(panel.opacity);
    let (text_fg, bold) = if panel.pulse {
        (Some(palette.glow), true)
    } else {
        (border, false)
    };

    for row in 0..bh {
        for col in 0..bw {
            let edge_y = row == 0 || row == bh - 1;
            let edge_x = col == 0 || col == bw - 1;
            let cell = match (edge_x, edge_y) {
                (true, true) => Cell::glyph('+', border, bg, false),
                (false, true) => Cell::glyph('-', border, bg, false),
                (true, false) => Cell::glyph('|', border, bg, false),
                (false, false) => Cell::blank(bg),
            };
            frame.set(x + col, y + row, cell);
        }
    }
    frame.put_str(x + 2, y, &format!(" {} ", panel.mode.label()), border, bg, false);

    let mut last = (0, 0);
    for (i, line) in panel.revealed_text().split('\n').enumerate() {
        frame.put_str(x + 2, y + 1 + i as i32, line, text_fg, bg, bold);
        last = (i as i32, line.chars().count() as i32);
    }

    if !panel.is_typed() {
        frame.set(
            x + 2 + last.1,
            y + 1 + last.0,
            Cell::glyph(CURSOR, text_fg, bg, bold),
        );
    } else if let Some(spark) = &panel.sparkline {
        frame.put_str(x + 2, y + bh - 2, &format!("risk {}", spark), text_fg, bg, bold);
    }
}
