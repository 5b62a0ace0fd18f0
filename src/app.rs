use crate::audio::{RodioMediaElement, SimulatedMediaElement, local_path};
use crate::catalog::Catalog;
use crate::config::{self, FileStore};
use crate::core::{DEFAULT_STAGGER, LuminexCore, Section};
use crate::media::MediaElement;
use crate::model::{Theme, VideoQuality};
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::Rect;
use std::io::stdout;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AppStartupOptions {
    pub catalog: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let root = match options.config_dir {
        Some(dir) => dir,
        None => config::config_root()?,
    };
    config::ensure_dir(&root)?;

    let catalog = match &options.catalog {
        Some(path) => Catalog::load_or_builtin(path, true)?,
        None => Catalog::load_or_builtin(&config::catalog_path(&root), false)?,
    };
    let music = music_element(&catalog);
    let mut core = LuminexCore::new(
        catalog,
        Box::new(SimulatedMediaElement::new(None)),
        music,
        Rc::new(FileStore::new(root)),
    );

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_draw = Instant::now();
    let mut screen = Rect::default();

    let result: Result<()> = loop {
        core.tick(Instant::now());

        if core.dirty || last_draw.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                screen = frame.area();
                crate::ui::draw(frame, &core, &command_buffer, command_mode)
            })?;
            core.dirty = false;
            last_draw = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let event = event::read()?;
        if let Event::Mouse(mouse) = event {
            handle_mouse(&mut core, mouse, screen);
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(&mut core, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Char('q') => break Ok(()),
            KeyCode::Tab => core.next_section(),
            KeyCode::BackTab => core.prev_section(),
            KeyCode::Char('1') => core.set_section(Section::Videos),
            KeyCode::Char('2') => core.set_section(Section::Music),
            KeyCode::Char('3') => core.set_section(Section::Favorites),
            KeyCode::Char('j') => core.select_next(),
            KeyCode::Char('k') => core.select_prev(),
            KeyCode::Enter => core.activate_selected(),
            KeyCode::Char(' ') => core.toggle_play(),
            KeyCode::Left => core.seek_backward(),
            KeyCode::Right => core.seek_forward(),
            KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => core.volume_up(),
            KeyCode::Down | KeyCode::Char('-') => core.volume_down(),
            KeyCode::Char('m') => core.toggle_mute(),
            KeyCode::Char('n') => core.next(),
            KeyCode::Char('p') => core.previous(),
            KeyCode::Char('s') => core.toggle_shuffle(),
            KeyCode::Char('r') => core.toggle_repeat(),
            KeyCode::Char('x') => core.cycle_speed(),
            KeyCode::Char('f') => core.toggle_favorite_selected(),
            KeyCode::Char('t') => core.toggle_theme(),
            KeyCode::Esc => core.clear_search(),
            KeyCode::Char('/') => {
                command_mode = true;
                command_buffer = String::from("search ");
                core.dirty = true;
            }
            KeyCode::Char(':') => {
                command_mode = true;
                core.dirty = true;
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    info!("session closed");
    result
}

/// Local tracks go through the sound card; a catalog of remote or missing
/// sources, or a machine without output, gets the simulated element.
fn music_element(catalog: &Catalog) -> Box<dyn MediaElement> {
    let has_local = catalog
        .tracks
        .iter()
        .filter_map(|track| local_path(&track.source))
        .any(|path| path.exists());
    if !has_local {
        info!("no local tracks in catalog, using simulated music player");
        return Box::new(SimulatedMediaElement::new(None));
    }

    match RodioMediaElement::new() {
        Ok(element) => {
            info!(output = element.output_name(), "audio output opened");
            Box::new(element)
        }
        Err(err) => {
            let error = format!("{err:#}");
            warn!(%error, "audio output unavailable, using simulated music player");
            Box::new(SimulatedMediaElement::new(None))
        }
    }
}

fn handle_mouse(core: &mut LuminexCore, mouse: MouseEvent, screen: Rect) {
    let list = crate::ui::list_rect(screen);
    let track = crate::ui::progress_track(screen);
    match mouse.kind {
        MouseEventKind::ScrollDown if point_in_rect(mouse.column, mouse.row, list) => {
            core.select_next()
        }
        MouseEventKind::ScrollUp if point_in_rect(mouse.column, mouse.row, list) => {
            core.select_prev()
        }
        MouseEventKind::Down(MouseButton::Left) if mouse.row == track.y => {
            let kind = core.active_kind();
            core.controller_mut(kind).seek_from_pointer(
                f64::from(mouse.column),
                f64::from(track.x),
                f64::from(track.width),
            );
            core.dirty = true;
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn usage(core: &mut LuminexCore, message: &str) {
    core.status = message.to_string();
    core.dirty = true;
}

fn run_command(core: &mut LuminexCore, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        usage(core, "No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => usage(
            core,
            "Commands: search <text> | theme <dark|light> | autoplay <on|off> | volume <0-100> | quality <auto|1080p|720p|480p> | animations <on|off> | visualizer <on|off> | reset | clear-favorites | play-all [ms] | stop-all",
        ),
        "search" => core.search(rest),
        "theme" => match rest {
            "dark" => core.set_theme(Theme::Dark),
            "light" => core.set_theme(Theme::Light),
            "" => core.toggle_theme(),
            _ => usage(core, "Usage: theme <dark|light>"),
        },
        "autoplay" => match parse_switch(rest) {
            Some(enabled) => core.set_autoplay(enabled),
            None => usage(core, "Usage: autoplay <on|off>"),
        },
        "animations" => match parse_switch(rest) {
            Some(enabled) => core.set_animations(enabled),
            None => usage(core, "Usage: animations <on|off>"),
        },
        "visualizer" => match parse_switch(rest) {
            Some(enabled) => core.set_visualizer(enabled),
            None => usage(core, "Usage: visualizer <on|off>"),
        },
        "volume" => match rest.trim_end_matches('%').parse::<u8>() {
            Ok(percent) if percent <= 100 => core.set_volume_percent(percent),
            _ => usage(core, "Usage: volume <0-100>"),
        },
        "quality" => match VideoQuality::parse(rest) {
            Some(quality) => core.set_quality(quality),
            None => usage(core, "Usage: quality <auto|1080p|720p|480p>"),
        },
        "reset" => core.reset_settings(),
        "clear-favorites" => core.clear_favorites(),
        "play-all" => {
            let delay = if rest.is_empty() {
                Ok(DEFAULT_STAGGER)
            } else {
                rest.parse::<u64>().map(Duration::from_millis)
            };
            match delay {
                Ok(delay) => core.play_all(delay, Instant::now()),
                Err(_) => usage(core, "Usage: play-all [delay-ms]"),
            }
        }
        "stop-all" => core.stop_all(),
        _ => usage(core, "Unknown command. Use :help"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::model::MediaKind;

    fn core() -> LuminexCore {
        LuminexCore::seeded(
            Catalog::builtin(),
            Box::new(SimulatedMediaElement::new(None)),
            Box::new(SimulatedMediaElement::new(None)),
            Rc::new(MemoryStore::new()),
            5,
        )
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut core = core();
        run_command(&mut core, "wat");
        assert!(core.status.contains("Unknown command"));
    }

    #[test]
    fn settings_commands_update_the_store() {
        let mut core = core();
        run_command(&mut core, "theme light");
        run_command(&mut core, "autoplay off");
        run_command(&mut core, "volume 35%");
        run_command(&mut core, "quality 720p");

        let settings = core.settings();
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.autoplay);
        assert_eq!(settings.volume, 35);
        assert_eq!(settings.quality, VideoQuality::P720);
    }

    #[test]
    fn malformed_arguments_show_usage() {
        let mut core = core();
        run_command(&mut core, "volume 300");
        assert_eq!(core.status, "Usage: volume <0-100>");
        run_command(&mut core, "autoplay maybe");
        assert_eq!(core.status, "Usage: autoplay <on|off>");
        assert_eq!(core.settings().volume, 80);
    }

    #[test]
    fn search_command_accepts_spaces() {
        let mut core = core();
        run_command(&mut core, "search  buck bunny ");
        assert_eq!(core.search_query(), Some("buck bunny"));
        assert_eq!(core.visible_indices(MediaKind::Video), vec![0]);
    }

    #[test]
    fn play_all_then_stop_all_leaves_nothing_pending() {
        let mut core = core();
        run_command(&mut core, "play-all 250");
        assert_eq!(core.pending_starts(), 2);
        run_command(&mut core, "stop-all");
        assert_eq!(core.pending_starts(), 0);
        assert_eq!(core.status, "Stopped all players");
    }

    #[test]
    fn clicking_the_timeline_seeks_the_active_player() {
        let mut core = core();
        core.activate_selected();
        core.tick(Instant::now());

        let screen = Rect::new(0, 0, 100, 40);
        let track = crate::ui::progress_track(screen);
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: track.x + track.width / 2,
            row: track.y,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut core, click, screen);

        let binding = core.controller(MediaKind::Video).binding();
        let total = binding.total().expect("length known");
        assert!((binding.position() / total - 0.5).abs() < 0.05);
    }

    #[test]
    fn switches_parse_common_spellings() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("0"), Some(false));
        assert_eq!(parse_switch("sometimes"), None);
    }
}
