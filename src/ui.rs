use crate::controller::PlaybackState;
use crate::core::{DynController, LuminexCore, Section};
use crate::model::{MediaKind, Theme};
use crate::time_format::format_time;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

const APP_TITLE: &str = "Luminex  ";

#[derive(Clone, Copy)]
struct ThemePalette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    favorite: Color,
    selected_bg: Color,
    selected_fg: Color,
    popup_bg: Color,
}

fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Dark => ThemePalette {
            bg: Color::Rgb(10, 15, 24),
            panel_bg: Color::Rgb(19, 29, 43),
            panel_alt_bg: Color::Rgb(24, 38, 58),
            border: Color::Rgb(69, 121, 176),
            text: Color::Rgb(214, 228, 248),
            muted: Color::Rgb(149, 173, 204),
            accent: Color::Rgb(100, 203, 184),
            alert: Color::Rgb(249, 174, 88),
            favorite: Color::Rgb(255, 122, 165),
            selected_bg: Color::Rgb(34, 55, 82),
            selected_fg: Color::White,
            popup_bg: Color::Rgb(22, 33, 51),
        },
        Theme::Light => ThemePalette {
            bg: Color::Rgb(242, 244, 248),
            panel_bg: Color::Rgb(252, 252, 254),
            panel_alt_bg: Color::Rgb(236, 240, 247),
            border: Color::Rgb(120, 144, 186),
            text: Color::Rgb(28, 34, 48),
            muted: Color::Rgb(96, 108, 130),
            accent: Color::Rgb(16, 132, 116),
            alert: Color::Rgb(196, 110, 20),
            favorite: Color::Rgb(214, 51, 108),
            selected_bg: Color::Rgb(205, 220, 242),
            selected_fg: Color::Black,
            popup_bg: Color::Rgb(230, 236, 246),
        },
    }
}

struct Areas {
    header: Rect,
    list: Rect,
    info: Rect,
    timeline: Rect,
    footer: Rect,
}

fn split(area: Rect) -> Areas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(vertical[1]);

    Areas {
        header: vertical[0],
        list: body[0],
        info: body[1],
        timeline: vertical[2],
        footer: vertical[3],
    }
}

pub fn list_rect(area: Rect) -> Rect {
    split(area).list
}

/// Cells between the brackets of the progress bar, for mapping clicks.
pub fn progress_track(area: Rect) -> Rect {
    let timeline = split(area).timeline;
    let inner = timeline.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    Rect {
        x: inner.x.saturating_add(1),
        y: inner.y,
        width: inner.width.saturating_sub(2),
        height: 1,
    }
}

pub fn draw(frame: &mut Frame, core: &LuminexCore, command_buffer: &str, command_mode: bool) {
    let colors = palette(core.settings().theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );
    let areas = split(frame.area());

    draw_header(frame, core, &colors, areas.header);
    draw_list(frame, core, &colors, areas.list);
    draw_info(frame, core, &colors, areas.info);
    draw_timeline(frame, core.controller(core.active_kind()), &colors, areas.timeline);
    draw_footer(frame, core, &colors, areas.footer, command_buffer, command_mode);

    if let Some(notice) = core.notice() {
        draw_toast(frame, &notice.message, &colors);
    }
}

fn draw_header(frame: &mut Frame, core: &LuminexCore, colors: &ThemePalette, area: Rect) {
    frame.render_widget(
        panel_block("Luminex", colors.panel_bg, colors.text, colors.border),
        area,
    );
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(inner);

    let mut left = vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Favorites {}", core.favorites().len()),
            Style::default().fg(colors.favorite),
        ),
    ];
    if let Some(query) = core.search_query() {
        left.push(Span::styled("  |  ", Style::default().fg(colors.muted)));
        left.push(Span::styled(
            format!("Search \"{query}\""),
            Style::default().fg(colors.alert),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(left)), halves[0]);

    let mut tabs = Vec::new();
    for (idx, section) in Section::ALL.into_iter().enumerate() {
        if idx > 0 {
            tabs.push(Span::styled(" -- ", Style::default().fg(colors.muted)));
        }
        let mut style = Style::default().fg(colors.accent);
        if section == core.section() {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        tabs.push(Span::styled(section.label(), style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(tabs)).alignment(Alignment::Right),
        halves[1],
    );
}

fn draw_list(frame: &mut Frame, core: &LuminexCore, colors: &ThemePalette, area: Rect) {
    let rows: Vec<ListItem> = match core.section() {
        Section::Videos | Section::Music => {
            let kind = if core.section() == Section::Music {
                MediaKind::Track
            } else {
                MediaKind::Video
            };
            let playing = core.controller(kind).current_index();
            core.visible_indices(kind)
                .into_iter()
                .filter_map(|index| {
                    let item = core.catalog.item(kind, index)?;
                    Some(media_row(
                        &item.title,
                        &item.secondary_label,
                        &item.duration_label,
                        playing == Some(index),
                        core.is_favorite(kind, index),
                        colors,
                    ))
                })
                .collect()
        }
        Section::Favorites => core
            .favorites()
            .iter()
            .map(|record| {
                let secondary = match record.kind {
                    MediaKind::Video => "Video",
                    MediaKind::Track => record.item.secondary_label.as_str(),
                };
                media_row(
                    &record.item.title,
                    secondary,
                    &record.item.duration_label,
                    false,
                    true,
                    colors,
                )
            })
            .collect(),
    };

    let empty = rows.is_empty();
    let title = match core.section() {
        Section::Favorites if empty => "Favorites (none yet, press f on an item)",
        Section::Favorites => "Favorites",
        Section::Videos => "Videos",
        Section::Music => "Music",
    };

    let mut state = ListState::default();
    state.select((!empty).then_some(core.cursor()));

    let list = List::new(rows)
        .block(panel_block(title, colors.panel_bg, colors.text, colors.border))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(colors.selected_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn media_row<'a>(
    title: &'a str,
    secondary: &'a str,
    duration: &'a str,
    playing: bool,
    favorite: bool,
    colors: &ThemePalette,
) -> ListItem<'a> {
    let marker = if playing { "  > " } else { "    " };
    let heart = if favorite { "* " } else { "  " };
    ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(colors.accent)),
        Span::styled(heart, Style::default().fg(colors.favorite)),
        Span::styled(title, Style::default().fg(colors.text)),
        Span::styled(format!("  {duration}"), Style::default().fg(colors.alert)),
        Span::styled(format!("  {secondary}"), Style::default().fg(colors.muted)),
    ]))
}

fn controller_lines<'a>(
    heading: &'a str,
    controller: &'a DynController,
    colors: &ThemePalette,
) -> Vec<Line<'a>> {
    let title = controller
        .current_item()
        .map(|item| item.title.as_str())
        .unwrap_or("-");
    let state_color = match controller.state() {
        PlaybackState::Playing => colors.accent,
        PlaybackState::Loading => colors.alert,
        _ => colors.muted,
    };
    let binding = controller.binding();
    let volume = if binding.muted() {
        String::from("muted")
    } else {
        format!("{:.0}%", binding.volume() * 100.0)
    };
    let queue = controller.queue();
    let position = controller
        .current_index()
        .map(|idx| format!("{}/{}", idx + 1, queue.len()))
        .unwrap_or_else(|| format!("-/{}", queue.len()));

    vec![
        Line::from(vec![
            Span::styled(
                heading,
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {title}"), Style::default().fg(colors.text)),
        ]),
        Line::from(vec![
            Span::styled(
                format!("{:<8}", controller.state().label()),
                Style::default().fg(state_color),
            ),
            Span::styled(
                format!(
                    "Queue {position}  Vol {volume}  Speed {}x",
                    controller.speed()
                ),
                Style::default().fg(colors.muted),
            ),
        ]),
        Line::from(Span::styled(
            format!(
                "Shuffle {}  Repeat {}",
                on_off(queue.shuffle()),
                on_off(queue.repeat())
            ),
            Style::default().fg(colors.muted),
        )),
    ]
}

fn draw_info(frame: &mut Frame, core: &LuminexCore, colors: &ThemePalette, area: Rect) {
    let settings = core.settings();
    let mut lines = controller_lines("Video", core.controller(MediaKind::Video), colors);
    lines.push(Line::from(""));
    lines.extend(controller_lines(
        "Music",
        core.controller(MediaKind::Track),
        colors,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Settings",
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "Theme {}  Autoplay {}  Volume {}%",
            settings.theme.label(),
            on_off(settings.autoplay),
            settings.volume
        ),
        Style::default().fg(colors.muted),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "Quality {}  Animations {}  Visualizer {}",
            settings.quality.label(),
            on_off(settings.animations),
            on_off(settings.visualizer)
        ),
        Style::default().fg(colors.muted),
    )));

    let info = Paragraph::new(lines)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, area);
}

fn draw_timeline(frame: &mut Frame, controller: &DynController, colors: &ThemePalette, area: Rect) {
    let inner_width = usize::from(area.width.saturating_sub(2));
    let binding = controller.binding();
    let total = binding
        .total()
        .map(format_time)
        .unwrap_or_else(|| String::from("--:--"));
    let lines = vec![
        Line::from(Span::styled(
            progress_bar(binding.progress(), inner_width),
            Style::default().fg(colors.accent),
        )),
        Line::from(Span::styled(
            format!(
                "{} / {}  |  click the bar or use Left/Right to seek",
                format_time(binding.position()),
                total
            ),
            Style::default().fg(colors.muted),
        )),
    ];
    let title = match controller.kind() {
        MediaKind::Video => "Timeline / Video",
        MediaKind::Track => "Timeline / Music",
    };
    frame.render_widget(
        Paragraph::new(lines).block(panel_block(
            title,
            colors.panel_bg,
            colors.text,
            colors.border,
        )),
        area,
    );
}

fn draw_footer(
    frame: &mut Frame,
    core: &LuminexCore,
    colors: &ThemePalette,
    area: Rect,
    command_buffer: &str,
    command_mode: bool,
) {
    let line = if command_mode {
        Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(command_buffer, Style::default().fg(colors.text)),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                "Tab section, Enter play, Space pause, n/p next/prev, f favorite, s shuffle, r repeat, x speed, m mute, : command, q quit",
                Style::default().fg(colors.muted),
            ),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
        ])
    };
    let title = if command_mode { "Command" } else { "Message" };
    frame.render_widget(
        Paragraph::new(line).block(panel_block(
            title,
            colors.panel_bg,
            colors.text,
            colors.border,
        )),
        area,
    );
}

fn draw_toast(frame: &mut Frame, message: &str, colors: &ThemePalette) {
    let area = frame.area();
    let width = u16::try_from(message.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(4)
        .min(area.width);
    let toast = Rect {
        x: area.x + area.width.saturating_sub(width).saturating_sub(1),
        y: area.y + area.height.saturating_sub(7),
        width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, toast);
    frame.render_widget(
        Paragraph::new(Span::styled(message, Style::default().fg(colors.text))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.accent))
                .style(Style::default().bg(colors.popup_bg)),
        ),
        toast,
    );
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let inner = width.saturating_sub(2);
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * inner as f64).round() as usize;
    let mut bar = String::with_capacity(width);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(inner.saturating_sub(filled)));
    bar.push(']');
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(Some(0.5), 12), "[#####-----]");
        assert_eq!(progress_bar(None, 6), "[----]");
        assert_eq!(progress_bar(Some(4.0), 6), "[####]");
    }

    #[test]
    fn progress_track_sits_inside_the_timeline_border() {
        let area = Rect::new(0, 0, 100, 40);
        let track = progress_track(area);
        let timeline = split(area).timeline;
        assert_eq!(track.y, timeline.y + 1);
        assert_eq!(track.x, timeline.x + 2);
        assert_eq!(track.width, timeline.width - 4);
    }
}
