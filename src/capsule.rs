// Copyright (c) 2026 rezky_nightky

use std::fmt::Write as _;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::config::Settings;
use crate::pool::{Handle, Pool, Reset};
use crate::profile::{self, Profile};
use crate::scheduler::Scheduler;
use crate::util::{clamp, format_money_usd, rand_int, rand_range};

pub const BASE_RATE: f32 = 0.85;
pub const THRESHOLD_RANGE: (f32, f32) = (0.6, 1.4);

pub const CHAR_REVEAL: Duration = Duration::from_millis(6);
pub const TYPE_STEP: Duration = Duration::from_millis(30);
pub const PULSE: Duration = Duration::from_millis(160);
pub const HOLD_MS: (i64, i64) = (2000, 4000);
pub const DISSOLVE: Duration = Duration::from_millis(500);
pub const DISSOLVE_STEP: Duration = Duration::from_millis(40);

const SPARKLINE_CHANCE: f64 = 0.5;
const SPARKLINE_POINTS: usize = 10;
const SPARKLINE_JITTER: i64 = 12;
const SPARK_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const HEX_BYTES_PER_LINE: usize = 16;

pub const PANEL_CHROME_W: u16 = 4;
pub const PANEL_CHROME_H: u16 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Structured,
    Inline,
    Hex,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Structured => "json",
            Mode::Inline => "kv",
            Mode::Hex => "hex",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Typing,
    Holding,
    Dissolving,
}

pub fn inline_line(p: &Profile) -> String {
    format!(
        "id={} | age={} | job={} | emotional={} | income={} | risk={}",
        p.id,
        p.age,
        p.job_title,
        p.emotional_state,
        format_money_usd(p.income_usd),
        p.risk_score
    )
}

pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, chunk) in bytes.chunks(HEX_BYTES_PER_LINE).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (j, b) in chunk.iter().enumerate() {
            if j > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{:02x}", b);
        }
    }
    out
}

pub fn serialize(p: &Profile, mode: Mode) -> String {
    match mode {
        Mode::Structured => serde_json::to_string_pretty(p).unwrap_or_default(),
        Mode::Inline => inline_line(p),
        Mode::Hex => hex_dump(&serde_json::to_vec(p).unwrap_or_default()),
    }
}

pub fn sparkline<R: Rng + ?Sized>(rng: &mut R, risk: u8) -> String {
    (0..SPARKLINE_POINTS)
        .map(|_| {
            let v = clamp(
                risk as i64 + rand_int(rng, -SPARKLINE_JITTER, SPARKLINE_JITTER),
                0,
                100,
            );
            let i = (v as usize * (SPARK_BLOCKS.len() - 1) + 50) / 100;
            SPARK_BLOCKS[i]
        })
        .collect()
}

pub fn chars_per_step() -> usize {
    let per_char = CHAR_REVEAL.as_millis().max(1);
    ((TYPE_STEP.as_millis() / per_char) as usize).max(1)
}

#[derive(Clone, Debug, Default)]
pub struct Panel {
    pub mode: Mode,
    pub profile: Option<Profile>,
    pub text: String,
    pub total_chars: usize,
    pub revealed: usize,
    pub text_width: u16,
    pub text_height: u16,
    pub sparkline: Option<String>,
    pub opacity: f32,
    pub pulse: bool,
    pub phase: Phase,
    pub x: i32,
    pub y: i32,
    pub jitter: (i32, i32),
    pub dissolve_from: Duration,
    typed: bool,
}

impl Reset for Panel {
    fn reset(&mut self) {
        *self = Panel::default();
    }
}

impl Panel {
    fn load(&mut self, profile: Profile, mode: Mode, sparkline: Option<String>) {
        self.text = serialize(&profile, mode);
        self.total_chars = self.text.chars().count();
        self.text_width = self
            .text
            .lines()
            .map(|l| l.chars().count())
            .chain(sparkline.iter().map(|s| s.chars().count() + 5))
            .max()
            .unwrap_or(0) as u16;
        self.text_height = self.text.lines().count().max(1) as u16 + u16::from(sparkline.is_some());
        self.mode = mode;
        self.profile = Some(profile);
        self.sparkline = sparkline;
        self.opacity = 1.0;
        self.phase = Phase::Typing;
    }

    pub fn box_size(&self) -> (u16, u16) {
        (
            self.text_width.saturating_add(PANEL_CHROME_W),
            self.text_height.saturating_add(PANEL_CHROME_H),
        )
    }

    // Shows up to `n` more characters. Returns `true` only on the call
    // that reveals the last one.
    pub fn reveal(&mut self, n: usize) -> bool {
        if self.typed {
            return false;
        }
        self.revealed = (self.revealed + n).min(self.total_chars);
        if self.revealed == self.total_chars {
            self.typed = true;
            return true;
        }
        false
    }

    pub fn is_typed(&self) -> bool {
        self.typed
    }

    pub fn revealed_text(&self) -> &str {
        match self.text.char_indices().nth(self.revealed) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timer {
    Type(Handle),
    PulseOff(Handle),
    Dissolve(Handle),
    DissolveTick(Handle),
}

pub struct CapsuleManager {
    pool: Pool<Panel>,
    active: Vec<Handle>,
    timers: Scheduler<Timer>,
    acc: f32,
    threshold: f32,
}

impl CapsuleManager {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            pool: Pool::new(),
            active: Vec::new(),
            timers: Scheduler::new(),
            acc: 0.0,
            threshold: rand_range(rng, THRESHOLD_RANGE.0, THRESHOLD_RANGE.1),
        }
    }

    pub fn live(&self) -> usize {
        self.pool.live()
    }

    pub fn allocated(&self) -> usize {
        self.pool.allocated()
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.active.iter().filter_map(|h| self.pool.get(*h))
    }

    #[cfg(test)]
    pub fn panel(&self, h: Handle) -> Option<&Panel> {
        self.pool.get(h)
    }

    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        now: Duration,
        settings: &Settings,
        viewport: (u16, u16),
        rng: &mut R,
    ) -> Option<Handle> {
        self.acc += dt * BASE_RATE * settings.capsule_rate;
        if self.acc < self.threshold {
            return None;
        }
        self.acc = 0.0;
        self.threshold = rand_range(rng, THRESHOLD_RANGE.0, THRESHOLD_RANGE.1);

        if self.live() >= settings.max_capsules {
            return None;
        }
        Some(self.spawn(now, settings, viewport, rng))
    }

    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        settings: &Settings,
        viewport: (u16, u16),
        rng: &mut R,
    ) -> Handle {
        let profile = profile::generate(rng, Utc::now());
        let modes: &[Mode] = if settings.allow_hex {
            &[Mode::Structured, Mode::Inline, Mode::Hex]
        } else {
            &[Mode::Structured, Mode::Inline]
        };
        let mode = modes[rng.random_range(0..modes.len())];
        let spark = rng
            .random_bool(SPARKLINE_CHANCE)
            .then(|| sparkline(rng, profile.risk_score));
        self.spawn_with(profile, mode, spark, now, viewport, rng)
    }

    pub fn spawn_with<R: Rng + ?Sized>(
        &mut self,
        profile: Profile,
        mode: Mode,
        spark: Option<String>,
        now: Duration,
        (vw, vh): (u16, u16),
        rng: &mut R,
    ) -> Handle {
        let h = self.pool.acquire();
        let id = profile.id.clone();
        let Some(panel) = self.pool.get_mut(h) else {
            return h;
        };
        panel.load(profile, mode, spark);

        let (bw, bh) = panel.box_size();
        let max_x = vw.saturating_sub(bw) as i64;
        let max_y = vh.saturating_sub(bh) as i64;
        panel.x = rand_int(rng, 0, max_x) as i32;
        panel.y = rand_int(rng, 0, max_y) as i32;

        log::debug!(
            "capsule {} spawned as {} at {},{} (slot {})",
            id,
            mode.label(),
            panel.x,
            panel.y,
            h.index
        );

        self.active.push(h);
        self.timers.schedule_in(now, TYPE_STEP, Timer::Type(h));
        h
    }

    pub fn run_timers<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) {
        while let Some((due, timer)) = self.timers.pop_due(now) {
            match timer {
                Timer::Type(h) => self.on_type(h, due, rng),
                Timer::PulseOff(h) => {
                    if let Some(p) = self.pool.get_mut(h) {
                        p.pulse = false;
                    }
                }
                Timer::Dissolve(h) => {
                    if let Some(p) = self.pool.get_mut(h) {
                        p.phase = Phase::Dissolving;
                        p.dissolve_from = due;
                        self.timers
                            .schedule_in(due, DISSOLVE_STEP, Timer::DissolveTick(h));
                    }
                }
                Timer::DissolveTick(h) => self.on_dissolve_tick(h, due, rng),
            }
        }
    }

    fn on_type<R: Rng + ?Sized>(&mut self, h: Handle, due: Duration, rng: &mut R) {
        let Some(p) = self.pool.get_mut(h) else {
            return;
        };
        if !p.reveal(chars_per_step()) {
            self.timers.schedule_in(due, TYPE_STEP, Timer::Type(h));
            return;
        }

        p.pulse = true;
        p.phase = Phase::Holding;
        p.opacity = 1.0;
        self.timers.schedule_in(due, PULSE, Timer::PulseOff(h));
        let hold = Duration::from_millis(rand_int(rng, HOLD_MS.0, HOLD_MS.1) as u64);
        self.timers.schedule_in(due, hold, Timer::Dissolve(h));
    }

    fn on_dissolve_tick<R: Rng + ?Sized>(&mut self, h: Handle, due: Duration, rng: &mut R) {
        let Some(p) = self.pool.get_mut(h) else {
            return;
        };
        let elapsed = due.saturating_sub(p.dissolve_from);
        if elapsed >= DISSOLVE {
            p.opacity = 0.0;
            let id = p.profile.as_ref().map(|pr| pr.id.clone()).unwrap_or_default();
            self.active.retain(|a| *a != h);
            self.pool.release(h);
            log::debug!("capsule {} dissolved (slot {})", id, h.index);
            return;
        }

        p.opacity = 1.0 - elapsed.as_secs_f32() / DISSOLVE.as_secs_f32();
        p.jitter = (rng.random_range(-1..=1), rng.random_range(-1..=1));
        let end = p.dissolve_from + DISSOLVE;
        let next = (due + DISSOLVE_STEP).min(end);
        self.timers.schedule(next, Timer::DissolveTick(h));
    }

    pub fn clear(&mut self) {
        for h in self.active.drain(..) {
            self.pool.release(h);
        }
        self.timers.clear();
        self.acc = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    const VIEW: (u16, u16) = (200, 60);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn scenario_profile() -> Profile {
        Profile {
            id: "x1-abcd".to_string(),
            name: "Ada Novak".to_string(),
            age: 30,
            gender: "female".to_string(),
            job_title: "Engineer".to_string(),
            industry: "Software".to_string(),
            income_usd: 95_000,
            education: "master".to_string(),
            city: "Prague".to_string(),
            relationship_status: "single".to_string(),
            emotional_state: "calm".to_string(),
            activity: "idle".to_string(),
            interests: vec!["chess".to_string(), "tea".to_string()],
            risk_score: 40,
            last_active: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn run(mgr: &mut CapsuleManager, from: Duration, until: Duration, rng: &mut StdRng) {
        let mut t = from;
        while t <= until {
            mgr.run_timers(t, rng);
            t += ms(10);
        }
    }

    #[test]
    fn inline_scenario_renders_exactly() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut mgr = CapsuleManager::new(&mut rng);
        let h = mgr.spawn_with(scenario_profile(), Mode::Inline, None, ms(0), VIEW, &mut rng);
        run(&mut mgr, ms(0), ms(1000), &mut rng);

        let p = mgr.panel(h).unwrap();
        assert!(p.is_typed());
        assert_eq!(
            p.revealed_text(),
            "id=x1-abcd | age=30 | job=Engineer | emotional=calm | income=$95,000 | risk=40"
        );
    }

    #[test]
    fn hex_mode_encodes_every_json_byte() {
        let p = scenario_profile();
        let json = serde_json::to_vec(&p).unwrap();
        let hex = serialize(&p, Mode::Hex);
        let bytes: Vec<u8> = hex
            .split_whitespace()
            .map(|pair| {
                assert_eq!(pair.len(), 2);
                u8::from_str_radix(pair, 16).unwrap()
            })
            .collect();
        assert_eq!(bytes, json);
        assert!(hex.lines().all(|l| l.split(' ').count() <= HEX_BYTES_PER_LINE));
        assert!(hex.starts_with("7b 22 69 64"));
    }

    #[test]
    fn structured_mode_is_pretty_json() {
        let text = serialize(&scenario_profile(), Mode::Structured);
        assert!(text.starts_with("{\n  \"id\": \"x1-abcd\""));
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["risk_score"], 40);
    }

    #[test]
    fn sparkline_has_ten_blocks() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = sparkline(&mut rng, 100);
        assert_eq!(s.chars().count(), 10);
        assert!(s.chars().all(|c| SPARK_BLOCKS.contains(&c)));
        assert!(sparkline(&mut rng, 0).chars().all(|c| c <= '▂'));
    }

    #[test]
    fn typewriter_reveals_monotonically_and_completes_once() {
        let mut panel = Panel::default();
        panel.load(scenario_profile(), Mode::Structured, None);
        let mut last = 0;
        let mut completions = 0;
        for _ in 0..(panel.total_chars + 10) {
            if panel.reveal(chars_per_step()) {
                completions += 1;
            }
            assert!(panel.revealed >= last);
            last = panel.revealed;
        }
        assert_eq!(completions, 1);
        assert_eq!(panel.revealed, panel.total_chars);
        assert_eq!(panel.revealed_text(), panel.text);
    }

    #[test]
    fn panel_lifecycle_types_holds_then_dissolves() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut mgr = CapsuleManager::new(&mut rng);
        let h = mgr.spawn_with(scenario_profile(), Mode::Inline, None, ms(0), VIEW, &mut rng);
        let steps = mgr.panel(h).unwrap().total_chars.div_ceil(chars_per_step()) as u64;
        let typed_at = ms(30 * steps);

        run(&mut mgr, ms(0), typed_at - ms(10), &mut rng);
        assert_eq!(mgr.panel(h).unwrap().phase, Phase::Typing);

        mgr.run_timers(typed_at, &mut rng);
        let p = mgr.panel(h).unwrap();
        assert_eq!(p.phase, Phase::Holding);
        assert!(p.pulse);

        mgr.run_timers(typed_at + PULSE, &mut rng);
        assert!(!mgr.panel(h).unwrap().pulse);

        // hold is at most 4 s, dissolve 500 ms
        run(&mut mgr, typed_at + PULSE, typed_at + ms(4000 + 500), &mut rng);
        assert_eq!(mgr.live(), 0);
        assert!(mgr.panel(h).is_none());
    }

    #[test]
    fn hold_lasts_at_least_two_seconds_and_jitter_stays_small() {
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut mgr = CapsuleManager::new(&mut rng);
            let h = mgr.spawn_with(scenario_profile(), Mode::Inline, None, ms(0), VIEW, &mut rng);

            let mut t = ms(0);
            while mgr.panel(h).unwrap().phase == Phase::Typing {
                t += ms(10);
                mgr.run_timers(t, &mut rng);
            }
            let typed_at = t;
            run(&mut mgr, typed_at, typed_at + ms(HOLD_MS.0 as u64 - 10), &mut rng);
            assert_eq!(mgr.panel(h).unwrap().phase, Phase::Holding, "seed {seed}");

            t = typed_at + ms(HOLD_MS.0 as u64 - 10);
            while let Some(p) = mgr.panel(h) {
                assert!((-1..=1).contains(&p.jitter.0) && (-1..=1).contains(&p.jitter.1));
                assert!(t <= typed_at + ms(HOLD_MS.1 as u64) + DISSOLVE + ms(10));
                t += ms(10);
                mgr.run_timers(t, &mut rng);
            }
        }
    }

    #[test]
    fn dissolve_fades_to_zero_within_window_and_slot_is_reused() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut mgr = CapsuleManager::new(&mut rng);
        let h = mgr.spawn_with(scenario_profile(), Mode::Inline, None, ms(0), VIEW, &mut rng);
        run(&mut mgr, ms(0), ms(600), &mut rng);

        let mut t = ms(600);
        let mut dissolve_start = None;
        let mut last_opacity = 1.0;
        while mgr.live() > 0 {
            t += ms(10);
            mgr.run_timers(t, &mut rng);
            if let Some(p) = mgr.panel(h) {
                if p.phase == Phase::Dissolving {
                    dissolve_start.get_or_insert(p.dissolve_from);
                    assert!(p.opacity <= last_opacity);
                    last_opacity = p.opacity;
                }
            }
            assert!(t < ms(6000), "panel never dissolved");
        }
        let start = dissolve_start.unwrap();
        assert!(t - start <= DISSOLVE + ms(10));

        let again = mgr.spawn_with(scenario_profile(), Mode::Hex, None, t, VIEW, &mut rng);
        assert_eq!(again.index, h.index);
        assert_eq!(mgr.allocated(), 1);
        let p = mgr.panel(again).unwrap();
        assert_eq!(p.revealed, 0);
        assert_eq!(p.opacity, 1.0);
        assert_eq!(p.jitter, (0, 0));
        assert!(!p.pulse);
        assert_eq!(p.mode, Mode::Hex);
    }

    #[test]
    fn spawn_gate_fires_on_threshold_and_respects_cap() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut mgr = CapsuleManager::new(&mut rng);
        let settings = Settings {
            max_capsules: 2,
            ..Settings::default()
        };

        let mut attempts = 0;
        for i in 0..2000u64 {
            if mgr.acc + 0.1 * BASE_RATE * settings.capsule_rate >= mgr.threshold {
                attempts += 1;
            }
            mgr.tick(0.1, ms(i * 100), &settings, VIEW, &mut rng);
            assert!(mgr.live() <= settings.max_capsules);
        }
        assert!(attempts > 10);
        assert_eq!(mgr.live(), 2);
    }

    #[test]
    fn lowering_cap_does_not_evict() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut mgr = CapsuleManager::new(&mut rng);
        let mut settings = Settings::default();
        for _ in 0..4 {
            mgr.spawn(ms(0), &settings, VIEW, &mut rng);
        }
        settings.max_capsules = 1;
        assert!(mgr.tick(10.0, ms(0), &settings, VIEW, &mut rng).is_none());
        assert_eq!(mgr.live(), 4);
    }

    #[test]
    fn hex_disabled_never_spawns_hex() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut mgr = CapsuleManager::new(&mut rng);
        let settings = Settings {
            allow_hex: false,
            max_capsules: 24,
            ..Settings::default()
        };
        for _ in 0..24 {
            mgr.spawn(ms(0), &settings, VIEW, &mut rng);
        }
        assert!(mgr.panels().all(|p| p.mode != Mode::Hex));
    }

    #[test]
    fn panels_are_placed_inside_viewport() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut mgr = CapsuleManager::new(&mut rng);
        for _ in 0..20 {
            let h = mgr.spawn_with(scenario_profile(), Mode::Inline, None, ms(0), (120, 30), &mut rng);
            let p = mgr.panel(h).unwrap();
            let (bw, bh) = p.box_size();
            assert!(p.x >= 0 && p.x + bw as i32 <= 120);
            assert!(p.y >= 0 && p.y + bh as i32 <= 30);
        }
    }

    #[test]
    fn clear_releases_everything() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut mgr = CapsuleManager::new(&mut rng);
        let settings = Settings::default();
        for _ in 0..3 {
            mgr.spawn(ms(0), &settings, VIEW, &mut rng);
        }
        mgr.clear();
        assert_eq!(mgr.live(), 0);
        assert_eq!(mgr.allocated(), 3);
        assert!(mgr.timers.is_empty());
    }

    proptest! {
        #[test]
        fn prop_live_never_exceeds_cap(
            seed in any::<u64>(),
            cap in 1usize..8,
            rate in 0.3f32..2.0,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut mgr = CapsuleManager::new(&mut rng);
            let settings = Settings { max_capsules: cap, capsule_rate: rate, ..Settings::default() };
            let mut now = Duration::ZERO;
            for _ in 0..600 {
                now += ms(50);
                mgr.tick(0.05, now, &settings, VIEW, &mut rng);
                prop_assert!(mgr.live() <= cap);
                mgr.run_timers(now, &mut rng);
            }
        }
    }
}
