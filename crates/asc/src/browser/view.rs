use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use super::state::{BrowserState, Mode};

const HELP_LINES: [&str; 6] = [
    "Keybindings:",
    "  v/enter: View conversation",
    "  V: View raw conversation with less",
    "  e: Edit message and ask again",
    "  d: Delete conversation",
    "  q/esc: Quit",
];

const BORDER: Color = Color::Indexed(240);
const SELECTED_FG: Color = Color::Indexed(229);
const SELECTED_BG: Color = Color::Indexed(57);

pub fn draw(frame: &mut Frame<'_>, state: &BrowserState) {
    let help_height = HELP_LINES.len() as u16 + 2 + u16::from(state.status().is_some());
    let [table_area, help_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(help_height)]).areas(frame.area());

    draw_table(frame, table_area, state);
    draw_help(frame, help_area, state);

    if state.mode() == Mode::ConfirmDelete {
        draw_confirm(frame, state);
    }
}

fn draw_table(frame: &mut Frame<'_>, area: Rect, state: &BrowserState) {
    let widths = state.column_widths();
    let header = Row::new(["ID", "Date", "Message"]).style(Style::new().add_modifier(Modifier::BOLD));
    let rows = state
        .rows()
        .into_iter()
        .map(|cells| Row::new(cells.into_iter().map(Cell::from)));

    let table = Table::new(
        rows,
        [
            Constraint::Length(widths.id as u16),
            Constraint::Length(widths.date as u16),
            Constraint::Length(widths.message as u16),
        ],
    )
    .header(header)
    .block(
        Block::new()
            .borders(Borders::ALL)
            .border_style(Style::new().fg(BORDER)),
    )
    .row_highlight_style(Style::new().fg(SELECTED_FG).bg(SELECTED_BG));

    let mut table_state = TableState::default().with_selected(state.selected_index());
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn draw_help(frame: &mut Frame<'_>, area: Rect, state: &BrowserState) {
    let mut lines: Vec<Line<'_>> = HELP_LINES.iter().map(|line| Line::raw(*line)).collect();
    if let Some(status) = state.status() {
        lines.push(Line::styled(status.to_string(), Style::new().fg(Color::Yellow)));
    }
    let help = Paragraph::new(lines).block(
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(BORDER)),
    );
    frame.render_widget(help, area);
}

fn draw_confirm(frame: &mut Frame<'_>, state: &BrowserState) {
    let id = state.selected().map(|c| c.id.as_str()).unwrap_or_default();
    let text = vec![
        Line::raw(format!("Delete conversation {id}?")),
        Line::raw(""),
        Line::raw("Press Enter to confirm, 'n' to cancel"),
    ];
    let area = centered(frame.area(), 48, 5);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::new().fg(BORDER)),
        ),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}
