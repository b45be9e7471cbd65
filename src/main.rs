// Copyright (c) 2026 rezky_nightky

mod atlas;
mod capsule;
mod config;
mod driver;
mod error;
mod export;
mod frame;
mod palette;
mod pool;
mod profile;
mod rain;
mod runtime;
mod scheduler;
mod surface;
mod terminal;
mod util;

use std::env;
use std::fs::File;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use chrono::Utc;
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{color_enabled_stdout, default_params_usage_for_help, Args, Pacing, Settings};
use crate::driver::Scene;
use crate::error::AppError;
use crate::frame::Frame;
use crate::palette::build_palette;
use crate::runtime::{ColorMode, Theme};
use crate::scheduler::{Clock, MonotonicClock};
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

const SPEED_STEP: f32 = 0.25;
const DENSITY_STEP: f32 = 0.1;
const RATE_STEP: f32 = 0.1;
const GLOW_STEP: f32 = 0.1;

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn detect_color_mode(args: &Args) -> Result<ColorMode, AppError> {
    if let Some(m) = args.colormode {
        return match m {
            0 => Ok(ColorMode::Mono),
            16 => Ok(ColorMode::Color16),
            256 => Ok(ColorMode::Color256),
            24 => Ok(ColorMode::TrueColor),
            _ => Err(AppError::InvalidArg {
                flag: "--colormode",
                value: m.to_string(),
                reason: "allowed: 0,16,256,24".to_string(),
            }),
        };
    }

    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return Ok(ColorMode::TrueColor);
    }
    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return Ok(ColorMode::Mono);
    }
    Ok(ColorMode::Color256)
}

fn init_logging(args: &Args) -> Result<(), AppError> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path).map_err(|source| AppError::LogFile {
        path: path.clone(),
        source,
    })?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn unix_ms() -> u128 {
    Utc::now().timestamp_millis().max(0) as u128
}

fn install_exit_handlers() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

fn parse_args() -> Args {
    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches();
    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

enum Action {
    None,
    Quit,
    Rebuild,
    Pause,
    Snapshot,
    Repaint,
}

fn handle_key(code: KeyCode, mods: KeyModifiers, settings: &mut Settings) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('c') if mods.contains(KeyModifiers::CONTROL) => return Action::Quit,
        KeyCode::Char(' ') => return Action::Rebuild,
        KeyCode::Char('p') => return Action::Pause,
        KeyCode::Char('s') => return Action::Snapshot,
        KeyCode::Up => settings.nudge_speed(SPEED_STEP),
        KeyCode::Down => settings.nudge_speed(-SPEED_STEP),
        KeyCode::Char('+') | KeyCode::Char('=') => settings.nudge_density(DENSITY_STEP),
        KeyCode::Char('-') => settings.nudge_density(-DENSITY_STEP),
        KeyCode::Char(']') => settings.nudge_capsule_rate(RATE_STEP),
        KeyCode::Char('[') => settings.nudge_capsule_rate(-RATE_STEP),
        KeyCode::Char('g') => settings.nudge_glow(-GLOW_STEP),
        KeyCode::Char('G') => settings.nudge_glow(GLOW_STEP),
        KeyCode::Char('c') => settings.show_code = !settings.show_code,
        KeyCode::Char('h') => settings.allow_hex = !settings.allow_hex,
        KeyCode::Char('f') => {
            settings.show_fps = !settings.show_fps;
            return Action::Repaint;
        }
        KeyCode::Char('t') => {
            settings.theme = settings.theme.next();
            return Action::Repaint;
        }
        KeyCode::Char(d @ '1'..='3') => {
            let i = d as usize - '1' as usize;
            settings.theme = Theme::ALL[i];
            return Action::Repaint;
        }
        _ => return Action::None,
    }
    log::info!(
        "settings: density {:.2} speed {:.2} rate {:.2} glow {:.2} code {} hex {}",
        settings.density,
        settings.speed,
        settings.capsule_rate,
        settings.glow,
        settings.show_code,
        settings.allow_hex
    );
    Action::None
}

fn run() -> Result<(), AppError> {
    install_exit_handlers();
    let args = parse_args();

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", env!("DOSSIER_RAIN_BUILD"));
        println!("Commit: {}", env!("DOSSIER_RAIN_GIT_SHA"));
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let mut settings = Settings::from_args(&args)?;
    let pacing = Pacing::from_args(&args)?;
    let color_mode = detect_color_mode(&args)?;
    init_logging(&args)?;

    let mut term = Terminal::new()?;
    let (w, h) = term.size()?;
    log::info!(
        "starting {}x{} theme {} color {:?} fps {:.1}",
        w,
        h,
        settings.theme,
        color_mode,
        1.0 / pacing.frame_period.as_secs_f64()
    );

    let clock = MonotonicClock::new();
    let mut palette = build_palette(settings.theme, color_mode, args.default_background);
    let mut scene = Scene::new(w, h, &settings, StdRng::from_os_rng());
    let mut frame = Frame::new(w, h, palette.bg);

    let end_time = pacing.duration.map(|d| Instant::now() + d);
    let mut next_frame = Instant::now();
    let mut running = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        match handle_key(k.code, k.modifiers, &mut settings) {
                            Action::None => {}
                            Action::Quit => running = false,
                            Action::Rebuild => {
                                scene.reset(&settings);
                                frame.mark_all_dirty();
                                log::info!("rebuilt scene");
                            }
                            Action::Pause => {
                                let paused = scene.toggle_pause();
                                log::info!("{}", if paused { "paused" } else { "resumed" });
                            }
                            Action::Snapshot => {
                                match export::write_snapshot(&args.snapshot_dir, &frame, unix_ms()) {
                                    Ok(path) => log::info!("snapshot written to {}", path.display()),
                                    Err(e) => log::warn!("{}", e),
                                }
                            }
                            Action::Repaint => {
                                palette = build_palette(
                                    settings.theme,
                                    color_mode,
                                    args.default_background,
                                );
                                frame.mark_all_dirty();
                                log::info!(
                                    "theme {} fps overlay {}",
                                    settings.theme,
                                    settings.show_fps
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }
            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            scene.resize(nw, nh, &settings);
            frame = Frame::new(nw, nh, palette.bg);
            log::info!("resized to {}x{}", nw, nh);
        }

        scene.step(clock.now(), &settings);
        scene.compose(&mut frame, &palette, &settings);
        if frame.has_changes() {
            term.draw(&mut frame)?;
        }

        next_frame += pacing.frame_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    log::info!(
        "exiting with {} capsules live in {} slots, paused {}",
        scene.live_capsules(),
        scene.capsule_slots(),
        scene.is_paused()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        restore_terminal_best_effort();
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn press(code: KeyCode, settings: &mut Settings) -> Action {
        handle_key(code, KeyModifiers::NONE, settings)
    }

    #[test]
    fn keys_nudge_settings_within_ranges() {
        let mut s = Settings::default();
        press(KeyCode::Up, &mut s);
        assert_eq!(s.speed, 1.25);
        press(KeyCode::Char('-'), &mut s);
        assert!((s.density - 0.9).abs() < 1e-6);
        press(KeyCode::Char(']'), &mut s);
        assert!((s.capsule_rate - 1.1).abs() < 1e-6);
        press(KeyCode::Char('G'), &mut s);
        assert!((s.glow - 0.7).abs() < 1e-6);
        for _ in 0..20 {
            press(KeyCode::Char('g'), &mut s);
        }
        assert_eq!(s.glow, 0.0);
    }

    #[test]
    fn toggles_and_theme_keys() {
        let mut s = Settings::default();
        press(KeyCode::Char('c'), &mut s);
        press(KeyCode::Char('h'), &mut s);
        assert!(!s.show_code && !s.allow_hex);

        assert!(matches!(press(KeyCode::Char('t'), &mut s), Action::Repaint));
        assert_eq!(s.theme, Theme::Cyan);
        press(KeyCode::Char('3'), &mut s);
        assert_eq!(s.theme, Theme::Magenta);
        assert!(matches!(press(KeyCode::Char('f'), &mut s), Action::Repaint));
        assert!(s.show_fps);
    }

    #[test]
    fn quit_and_control_keys() {
        let mut s = Settings::default();
        assert!(matches!(press(KeyCode::Esc, &mut s), Action::Quit));
        assert!(matches!(
            handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL, &mut s),
            Action::Quit
        ));
        assert!(s.show_code);
        assert!(matches!(press(KeyCode::Char(' '), &mut s), Action::Rebuild));
        assert!(matches!(press(KeyCode::Char('s'), &mut s), Action::Snapshot));
        assert!(matches!(press(KeyCode::Char('p'), &mut s), Action::Pause));
        assert!(matches!(press(KeyCode::Char('x'), &mut s), Action::None));
    }

    #[test]
    fn colormode_flag_is_validated() {
        let args = Args::try_parse_from(["dossier-rain", "--colormode", "8"]).unwrap();
        assert!(matches!(
            detect_color_mode(&args),
            Err(AppError::InvalidArg { flag: "--colormode", .. })
        ));
        let args = Args::try_parse_from(["dossier-rain", "--colormode", "16"]).unwrap();
        assert_eq!(detect_color_mode(&args).unwrap(), ColorMode::Color16);
    }
}
