// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::AppError;
use crate::runtime::Theme;
use crate::util::clamp;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  dossier-rain --theme green --density 1 --speed 1 --capsule-rate 1 --glow 0.6 --max-capsules 6 --fps 60";

pub const DENSITY_RANGE: (f32, f32) = (0.2, 2.0);
pub const SPEED_RANGE: (f32, f32) = (0.5, 3.0);
pub const CAPSULE_RATE_RANGE: (f32, f32) = (0.3, 2.0);
pub const GLOW_RANGE: (f32, f32) = (0.0, 1.0);
pub const MAX_CAPSULES_RANGE: (usize, usize) = (1, 24);

pub const FPS_RANGE: (f64, f64) = (1.0, 240.0);
pub const DURATION_RANGE: (f64, f64) = (0.1, 86400.0);

const DENSE_PRESET: f32 = 1.6;
const FAST_PRESET: f32 = 2.0;

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub fn default_params_usage_for_help() -> String {
    if !color_enabled_stdout() {
        return DEFAULT_PARAMS_USAGE.to_string();
    }
    let mut out = String::with_capacity(DEFAULT_PARAMS_USAGE.len() + 32);
    for (i, line) in DEFAULT_PARAMS_USAGE.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match line.strip_prefix("  dossier-rain") {
            Some(rest) => {
                out.push_str("  \x1b[1;34mdossier-rain\x1b[0m");
                out.push_str(rest);
            }
            None => {
                out.push_str("\x1b[1;36m");
                out.push_str(line);
                out.push_str("\x1b[0m");
            }
        }
    }
    out
}

#[derive(Parser, Debug, Clone)]
#[command(name = "dossier-rain", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'd',
        long = "density",
        default_value_t = 1.0,
        help_heading = "RAIN",
        help = "Column density (min 0.2 max 2.0)"
    )]
    pub density: f32,

    #[arg(
        short = 'S',
        long = "speed",
        default_value_t = 1.0,
        help_heading = "RAIN",
        help = "Fall speed multiplier (min 0.5 max 3.0)"
    )]
    pub speed: f32,

    #[arg(
        short = 'g',
        long = "glow",
        default_value_t = 0.6,
        help_heading = "RAIN",
        help = "Glow intensity (min 0 max 1)"
    )]
    pub glow: f32,

    #[arg(
        long = "no-code",
        help_heading = "RAIN",
        help = "Never overlay source code snippets"
    )]
    pub no_code: bool,

    #[arg(
        short = 'r',
        long = "capsule-rate",
        default_value_t = 1.0,
        help_heading = "CAPSULES",
        help = "Capsule spawn rate multiplier (min 0.3 max 2.0)"
    )]
    pub capsule_rate: f32,

    #[arg(
        short = 'm',
        long = "max-capsules",
        default_value_t = 6,
        help_heading = "CAPSULES",
        help = "Max capsules on screen at once (min 1 max 24)"
    )]
    pub max_capsules: usize,

    #[arg(
        long = "no-hex",
        help_heading = "CAPSULES",
        help = "Disable hex-encoded capsules"
    )]
    pub no_hex: bool,

    #[arg(
        short = 'c',
        long = "theme",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme: green, cyan, magenta"
    )]
    pub theme: Theme,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,256,24). Default: detected from COLORTERM/TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "default-background",
        help_heading = "APPEARANCE",
        help = "Keep the terminal's own background instead of painting it black"
    )]
    pub default_background: bool,

    #[arg(
        long = "show-fps",
        help_heading = "APPEARANCE",
        help = "Show the frame rate estimate"
    )]
    pub show_fps: bool,

    #[arg(
        long = "dense",
        help_heading = "PRESETS",
        help = "Start with density 1.6"
    )]
    pub dense: bool,

    #[arg(long = "fast", help_heading = "PRESETS", help = "Start with speed 2.0")]
    pub fast: bool,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "GENERAL",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "snapshot-dir",
        default_value = ".",
        help_heading = "GENERAL",
        help = "Directory for snapshots taken with 's'"
    )]
    pub snapshot_dir: PathBuf,

    #[arg(
        long = "log-file",
        help_heading = "GENERAL",
        help = "Write logs to this file (level from RUST_LOG, default info)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

fn require_range<T>(flag: &'static str, v: T, (min, max): (T, T)) -> Result<T, AppError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if v < min || v > max {
        return Err(AppError::InvalidArg {
            flag,
            value: v.to_string(),
            reason: format!("min {} max {}", min, max),
        });
    }
    Ok(v)
}

fn require_finite(flag: &'static str, v: f32, range: (f32, f32)) -> Result<f32, AppError> {
    if !v.is_finite() {
        return Err(AppError::InvalidArg {
            flag,
            value: v.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    require_range(flag, v, range)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pacing {
    pub frame_period: Duration,
    pub duration: Option<Duration>,
}

impl Pacing {
    pub fn from_args(args: &Args) -> Result<Self, AppError> {
        let fps = require_finite_f64("--fps", args.fps, FPS_RANGE)?;
        let duration = match args.duration {
            Some(s) if !s.is_finite() || s > 0.0 => Some(Duration::from_secs_f64(
                require_finite_f64("--duration", s, DURATION_RANGE)?,
            )),
            _ => None,
        };
        Ok(Self {
            frame_period: Duration::from_secs_f64(1.0 / fps),
            duration,
        })
    }
}

fn require_finite_f64(flag: &'static str, v: f64, range: (f64, f64)) -> Result<f64, AppError> {
    if !v.is_finite() {
        return Err(AppError::InvalidArg {
            flag,
            value: v.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    require_range(flag, v, range)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub density: f32,
    pub speed: f32,
    pub capsule_rate: f32,
    pub glow: f32,
    pub show_code: bool,
    pub allow_hex: bool,
    pub max_capsules: usize,
    pub theme: Theme,
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            density: 1.0,
            speed: 1.0,
            capsule_rate: 1.0,
            glow: 0.6,
            show_code: true,
            allow_hex: true,
            max_capsules: 6,
            theme: Theme::Green,
            show_fps: false,
        }
    }
}

impl Settings {
    pub fn from_args(args: &Args) -> Result<Self, AppError> {
        let mut density = require_finite("--density", args.density, DENSITY_RANGE)?;
        let mut speed = require_finite("--speed", args.speed, SPEED_RANGE)?;
        if args.dense {
            density = density.max(DENSE_PRESET);
        }
        if args.fast {
            speed = speed.max(FAST_PRESET);
        }

        Ok(Self {
            density,
            speed,
            capsule_rate: require_finite("--capsule-rate", args.capsule_rate, CAPSULE_RATE_RANGE)?,
            glow: require_finite("--glow", args.glow, GLOW_RANGE)?,
            show_code: !args.no_code,
            allow_hex: !args.no_hex,
            max_capsules: require_range("--max-capsules", args.max_capsules, MAX_CAPSULES_RANGE)?,
            theme: args.theme,
            show_fps: args.show_fps,
        })
    }

    pub fn nudge_density(&mut self, delta: f32) {
        self.density = clamp(self.density + delta, DENSITY_RANGE.0, DENSITY_RANGE.1);
    }

    pub fn nudge_speed(&mut self, delta: f32) {
        self.speed = clamp(self.speed + delta, SPEED_RANGE.0, SPEED_RANGE.1);
    }

    pub fn nudge_capsule_rate(&mut self, delta: f32) {
        self.capsule_rate = clamp(
            self.capsule_rate + delta,
            CAPSULE_RATE_RANGE.0,
            CAPSULE_RATE_RANGE.1,
        );
    }

    pub fn nudge_glow(&mut self, delta: f32) {
        self.glow = clamp(self.glow + delta, GLOW_RANGE.0, GLOW_RANGE.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["dossier-rain"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_match_settings_default() {
        let s = Settings::from_args(&parse(&[])).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn presets_raise_density_and_speed() {
        let s = Settings::from_args(&parse(&["--dense", "--fast"])).unwrap();
        assert_eq!(s.density, 1.6);
        assert_eq!(s.speed, 2.0);

        let s = Settings::from_args(&parse(&["--dense", "-d", "1.9"])).unwrap();
        assert_eq!(s.density, 1.9);
    }

    #[test]
    fn out_of_range_flag_is_rejected() {
        let err = Settings::from_args(&parse(&["--glow", "1.5"])).unwrap_err();
        assert_eq!(err.to_string(), "failed to apply --glow 1.5 (min 0 max 1)");

        let err = Settings::from_args(&parse(&["--max-capsules", "0"])).unwrap_err();
        assert!(matches!(err, AppError::InvalidArg { flag: "--max-capsules", .. }));
    }

    #[test]
    fn theme_flag_accepts_aliases() {
        let s = Settings::from_args(&parse(&["--theme", "pink", "--no-hex"])).unwrap();
        assert_eq!(s.theme, Theme::Magenta);
        assert!(!s.allow_hex);
    }

    #[test]
    fn pacing_validates_fps_and_duration() {
        let p = Pacing::from_args(&parse(&["--fps", "50", "--duration", "2.5"])).unwrap();
        assert_eq!(p.frame_period, Duration::from_millis(20));
        assert_eq!(p.duration, Some(Duration::from_millis(2500)));

        let p = Pacing::from_args(&parse(&["--duration", "0"])).unwrap();
        assert_eq!(p.duration, None);

        let err = Pacing::from_args(&parse(&["--fps", "500"])).unwrap_err();
        assert_eq!(err.to_string(), "failed to apply --fps 500 (min 1 max 240)");
        assert!(Pacing::from_args(&parse(&["--duration", "0.01"])).is_err());
    }

    #[test]
    fn nudges_clamp_to_control_ranges() {
        let mut s = Settings::default();
        for _ in 0..50 {
            s.nudge_speed(0.25);
            s.nudge_density(-0.1);
            s.nudge_glow(0.1);
            s.nudge_capsule_rate(-0.1);
        }
        assert_eq!(s.speed, 3.0);
        assert_eq!(s.density, 0.2);
        assert_eq!(s.glow, 1.0);
        assert_eq!(s.capsule_rate, 0.3);
    }
}
