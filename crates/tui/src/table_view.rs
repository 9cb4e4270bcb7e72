//! Projection of the server table onto terminal lines.

use qvalve_core::{
    render::{Align, PlayerTable, PLAYER_COLUMNS},
    table::{PlayersRow, ServerRow, ServerTable, TableRow},
};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

#[derive(Debug, Clone)]
pub(crate) struct Theme {
    pub(crate) primary_fg: Color,
    pub(crate) accent: Color,
    pub(crate) muted: Color,
    pub(crate) selection_bg: Color,
    pub(crate) selection_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
        }
    }
}

struct Column {
    title: &'static str,
    width: usize,
    align: Align,
}

const fn col(title: &'static str, width: usize, align: Align) -> Column {
    Column {
        title,
        width,
        align,
    }
}

/// Server table columns; the last one takes whatever width is left.
const COLUMNS: [Column; 14] = [
    col("Region", 6, Align::Left),
    col("Appid", 5, Align::Left),
    col("ST", 2, Align::Left),
    col("Vac", 3, Align::Left),
    col("Vis", 3, Align::Left),
    col("Imp", 3, Align::Right),
    col("Host", 15, Align::Left),
    col("Port", 5, Align::Left),
    col("Ping", 4, Align::Right),
    col("Players", 7, Align::Right),
    col("Max", 3, Align::Right),
    col("Bots", 4, Align::Right),
    col("Map", 20, Align::Left),
    col("Name", 0, Align::Left),
];

const MARKER_WIDTH: usize = 2;
const CONNECTED_MARKER: &str = "▶ ";
const SEPARATOR: &str = " ";
const PLAYER_NUMBER_WIDTH: usize = 3;
const PLAYER_TIME_WIDTH: usize = 8;
const PLAYER_SCORE_WIDTH: usize = 5;

/// Rendered lines plus, for each line, the index of the table row it draws.
#[derive(Debug, Default)]
pub(crate) struct TableView {
    pub(crate) lines: Vec<Line<'static>>,
    pub(crate) owners: Vec<usize>,
}

impl TableView {
    /// First line drawn for a table row.
    pub(crate) fn first_line_of(&self, row: usize) -> Option<usize> {
        self.owners.iter().position(|owner| *owner == row)
    }

    /// Last line drawn for a table row.
    pub(crate) fn last_line_of(&self, row: usize) -> Option<usize> {
        self.owners.iter().rposition(|owner| *owner == row)
    }

    /// Table row drawn on a line.
    pub(crate) fn row_at(&self, line: usize) -> Option<usize> {
        self.owners.get(line).copied()
    }
}

pub(crate) fn header_line(theme: &Theme) -> Line<'static> {
    let titles: Vec<String> = COLUMNS.iter().map(|c| c.title.to_string()).collect();
    Line::from(Span::styled(
        format!("{}{}", " ".repeat(MARKER_WIDTH), join_cells(&titles)),
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

pub(crate) fn build_view(table: &ServerTable, selected: usize, theme: &Theme) -> TableView {
    let mut view = TableView::default();
    for (idx, row) in table.rows().iter().enumerate() {
        let mut style = match row {
            TableRow::Server(server) if server.is_connected() => Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
            TableRow::Server(_) => Style::default().fg(theme.primary_fg),
            TableRow::Players(_) => Style::default().fg(theme.muted),
        };
        if idx == selected {
            style = style.bg(theme.selection_bg).fg(theme.selection_fg);
        }
        let texts = match row {
            TableRow::Server(server) => vec![server_line(server)],
            TableRow::Players(players) => players_lines(players),
        };
        for text in texts {
            view.lines.push(Line::from(Span::styled(text, style)));
            view.owners.push(idx);
        }
    }
    view
}

fn server_line(row: &ServerRow) -> String {
    let marker = if row.is_connected() {
        CONNECTED_MARKER
    } else {
        "  "
    };
    format!("{marker}{}", join_cells(row.cells()))
}

fn players_lines(row: &PlayersRow) -> Vec<String> {
    let spacer = " ".repeat(spacer_width(row.spacer_span()));
    match row.players() {
        Some(table) if !table.is_empty() => player_table_lines(table)
            .into_iter()
            .map(|line| format!("{spacer}{line}"))
            .collect(),
        _ => vec![spacer],
    }
}

fn player_table_lines(table: &PlayerTable) -> Vec<String> {
    let attributes_width = table
        .rows()
        .iter()
        .map(|line| line.attributes.chars().count())
        .max()
        .unwrap_or(0);
    let widths = [
        PLAYER_NUMBER_WIDTH,
        PLAYER_TIME_WIDTH,
        PLAYER_SCORE_WIDTH,
        attributes_width,
        0,
    ];
    table
        .rows()
        .iter()
        .map(|line| {
            let cells = line.cells();
            let parts: Vec<String> = cells
                .iter()
                .zip(widths)
                .zip(PLAYER_COLUMNS)
                .map(|((cell, width), align)| fit(cell, width, align))
                .collect();
            parts.join(SEPARATOR)
        })
        .collect()
}

fn spacer_width(span: usize) -> usize {
    MARKER_WIDTH
        + COLUMNS
            .iter()
            .take(span)
            .map(|column| column.width + SEPARATOR.len())
            .sum::<usize>()
}

fn join_cells(cells: &[String]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| match COLUMNS.get(idx) {
            Some(column) => fit(cell, column.width, column.align),
            None => cell.clone(),
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Pad or truncate to `width` characters; a width of zero leaves the text as is.
fn fit(text: &str, width: usize, align: Align) -> String {
    if width == 0 {
        return text.to_string();
    }
    let clipped: String = text.chars().take(width).collect();
    match align {
        Align::Left => format!("{clipped:<width$}"),
        Align::Right => format!("{clipped:>width$}"),
    }
}
