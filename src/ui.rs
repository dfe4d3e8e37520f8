use crate::app::{App, InputMode};
use crate::editor::EditorField;
use crate::models::{Section, Task};
use crate::store::TaskStore;
use crate::timefmt::format_date;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

// Free-form color tags; anything unknown renders white
fn tag_color(tag: &str) -> Color {
    match tag.to_lowercase().as_str() {
        "green" | "success" => Color::Green,
        "red" | "danger" => Color::Red,
        "yellow" | "warning" => Color::Yellow,
        "blue" | "info" => Color::Blue,
        "purple" | "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        _ => Color::White,
    }
}

fn key_hint(key: &'static str, action: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!(" {} ", key), Style::default().fg(Color::Red)),
        Span::raw(format!(": {} ", action)),
    ]
}

fn get_legend(input_mode: InputMode) -> Text<'static> {
    let hints: &[(&'static str, &'static str)] = match input_mode {
        InputMode::Normal => &[
            ("q", "Quit"),
            ("j/k", "Move"),
            ("h/l", "Section"),
            ("Space", "Toggle Done"),
            ("a", "Add"),
            ("Enter", "Edit"),
            ("/", "Search"),
            ("f", "Filter"),
            ("r", "Reload"),
        ],
        InputMode::Search => &[("Enter", "Apply"), ("Esc", "Back")],
        InputMode::Editor => &[
            ("Tab", "Next Field"),
            ("Enter", "Save"),
            ("Ctrl-d", "Delete"),
            ("Esc", "Cancel"),
        ],
        InputMode::ConfirmDelete => &[("y", "Delete"), ("n", "Keep")],
    };
    let spans: Vec<Span<'static>> = hints
        .iter()
        .flat_map(|&(key, action)| key_hint(key, action))
        .collect();
    Text::from(Line::from(spans))
}

fn task_line(task: &Task) -> Line<'static> {
    let check = if task.completed { "[x] " } else { "[ ] " };
    let title_style = if task.completed {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled("● ", Style::default().fg(tag_color(&task.color))),
        Span::raw(check),
        Span::styled(task.title.clone(), title_style),
    ];

    let when: Vec<String> = [
        task.date.as_deref().map(format_date).unwrap_or_default(),
        task.time.clone().unwrap_or_default(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    if !when.is_empty() {
        spans.push(Span::styled(
            format!("  {}", when.join(", ")),
            Style::default().fg(Color::Cyan),
        ));
    }
    if let Some(category) = task.category.as_deref().filter(|c| !c.is_empty()) {
        spans.push(Span::styled(
            format!("  #{}", category),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

fn render_header<S: TaskStore + 'static>(f: &mut Frame, app: &App<S>, area: Rect) {
    let dashboard = &app.dashboard;
    let mut spans = vec![
        Span::styled("Today ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "{}/{} done",
            dashboard.completed_today_count(),
            dashboard.today_tasks_count()
        )),
        Span::raw("   Filter: "),
        Span::styled(dashboard.filter.label(), Style::default().fg(Color::Green)),
        Span::raw("   Search: "),
    ];
    let search = if dashboard.search_term.is_empty() && app.input_mode != InputMode::Search {
        Span::styled("(none)", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(
            dashboard.search_term.clone(),
            Style::default().fg(Color::Yellow),
        )
    };
    spans.push(search);
    if app.input_mode == InputMode::Search {
        spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Task Dashboard"));
    f.render_widget(header, area);
}

fn render_section<S: TaskStore + 'static>(
    f: &mut Frame,
    app: &mut App<S>,
    section: Section,
    area: Rect,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let focused = app.focus == section;
    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let percent = app.dashboard.progress_percent(&section);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(section.label().to_string()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(percent));
    f.render_widget(gauge, chunks[0]);

    let items: Vec<ListItem> = app
        .dashboard
        .filtered_section_tasks(&section)
        .into_iter()
        .map(|task| ListItem::new(task_line(task)))
        .collect();
    let block = Block::default().borders(Borders::ALL).border_style(border_style);

    if items.is_empty() {
        let empty = List::new(vec![ListItem::new("No tasks")]).block(block);
        f.render_widget(empty, chunks[1]);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    if focused {
        f.render_stateful_widget(list, chunks[1], &mut app.state);
    } else {
        f.render_stateful_widget(list, chunks[1], &mut ListState::default());
    }
}

fn render_editor<S: TaskStore + 'static>(f: &mut Frame, app: &App<S>, area: Rect) {
    let editor = &app.dashboard.editor;
    let title = if editor.is_edit_mode() {
        "Edit Task"
    } else {
        "New Task"
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    for field in EditorField::ALL {
        let active = field == app.active_field();
        let label_style = if active {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}:", if active { "> " } else { "  " }, field.label()),
            label_style,
        )));
        let mut value = editor.field_value(field);
        if active && field != EditorField::Section {
            value.push('_');
        }
        lines.push(Line::from(Span::raw(format!("    {}", value))));
    }

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(Color::White)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(panel, area);
}

fn render_confirm_delete<S: TaskStore + 'static>(f: &mut Frame, app: &App<S>, area: Rect) {
    let text = format!("Delete \"{}\"? (y/n)", app.dashboard.editor.draft().title);
    let width = (text.chars().count() as u16 + 4).min(area.width);
    let popup_area = centered_rect_absolute(width, 3, area);
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .style(Style::default().fg(Color::Red)),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}

fn render_status<S: TaskStore + 'static>(f: &mut Frame, app: &App<S>, area: Rect) {
    let line = match (&app.status, app.latest_stats) {
        (Some(message), _) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        (None, Some(stats)) => Line::from(Span::raw(format!(
            "Completed today: {}  Total tasks: {}",
            stats.completed_today, stats.total_tasks
        ))),
        (None, None) => Line::from(""),
    };
    f.render_widget(Paragraph::new(line), area);
}

pub fn draw<S: TaskStore + 'static>(f: &mut Frame, app: &mut App<S>) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    render_header(f, app, chunks[0]);

    let body = if app.dashboard.editor.is_open() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
            .split(chunks[1]);
        render_editor(f, app, split[1]);
        split[0]
    } else {
        chunks[1]
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(body);
    for (section, area) in Section::ALL.into_iter().zip(columns.iter()) {
        render_section(f, app, section, *area);
    }

    if app.input_mode == InputMode::ConfirmDelete {
        render_confirm_delete(f, app, chunks[1]);
    }

    render_status(f, app, chunks[2]);

    let legend = Paragraph::new(get_legend(app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[3]);
}

pub async fn run_app<B: Backend, S: TaskStore + 'static>(
    terminal: &mut Terminal<B>,
    mut app: App<S>,
) -> io::Result<()> {
    loop {
        app.poll_background();
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = app.handle_input(key).await?;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::FakeStore;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_draw_dashboard_and_editor() {
        let store = Arc::new(FakeStore::with_tasks(vec![Task {
            id: 1,
            title: "Water the plants".to_string(),
            time: Some("2:00 PM".to_string()),
            ..Task::default()
        }]));
        let mut app = App::new(store);
        app.refresh_tasks().await;

        let mut terminal = Terminal::new(TestBackend::new(160, 30)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        let screen = buffer_text(&terminal);
        assert!(screen.contains("Water the plants"));
        assert!(screen.contains("This Week"));
        assert!(screen.contains("Task Dashboard"));

        app.dashboard.editor.open_create();
        terminal.draw(|f| draw(f, &mut app)).unwrap();
        assert!(buffer_text(&terminal).contains("New Task"));
    }

    #[test]
    fn test_tag_color() {
        assert_eq!(tag_color("Green"), Color::Green);
        assert_eq!(tag_color("danger"), Color::Red);
        assert_eq!(tag_color("chartreuse"), Color::White);
    }
}
