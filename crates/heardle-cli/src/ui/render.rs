//! Ratatui layout. All strings come pre-built from `view_model`.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::ui::app::App;
use crate::ui::view_model::{GameView, PickerView, ScreenView, UiModal, UiView};

pub(crate) fn draw(f: &mut Frame, app: &App) {
    let view = UiView::from_app(app);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(Paragraph::new(view.header_lines.join("\n")), chunks[0]);

    match &view.screen {
        ScreenView::Picker(picker) => draw_picker(f, chunks[1], picker),
        ScreenView::Game(game) => draw_game(f, chunks[1], game),
    }

    f.render_widget(Paragraph::new(view.player_line.as_str()), chunks[2]);
    f.render_widget(Paragraph::new(view.status_line.as_str()), chunks[3]);
    f.render_widget(
        Paragraph::new(view.keys_line.as_str()).style(Style::default().add_modifier(Modifier::DIM)),
        chunks[4],
    );

    if let Some(modal) = &view.active_modal {
        draw_modal(f, app, modal);
    }
}

fn draw_picker(f: &mut Frame, area: Rect, picker: &PickerView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    if let Some(error) = &picker.error {
        f.render_widget(
            Paragraph::new(error.as_str())
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Playlists")),
            chunks[0],
        );
        return;
    }

    if picker.loading && picker.labels.is_empty() {
        f.render_widget(
            Paragraph::new("Loading playlists...")
                .block(Block::default().borders(Borders::ALL).title("Playlists")),
            chunks[0],
        );
        return;
    }

    let items: Vec<ListItem> = picker
        .labels
        .iter()
        .map(|label| ListItem::new(label.as_str()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Playlists"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(picker.selected);
    f.render_stateful_widget(list, chunks[0], &mut state);

    f.render_widget(Paragraph::new(picker.start_line.as_str()), chunks[1]);
}

fn draw_game(f: &mut Frame, area: Rect, game: &GameView) {
    if let Some(failed) = &game.failed {
        f.render_widget(
            Paragraph::new(failed.as_str())
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Game")),
            area,
        );
        return;
    }

    if game.loading {
        f.render_widget(
            Paragraph::new("Starting game...")
                .block(Block::default().borders(Borders::ALL).title("Game")),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(area);

    f.render_widget(Paragraph::new(game.stats_line.as_str()), chunks[0]);
    f.render_widget(Paragraph::new(game.play_line.as_str()), chunks[1]);
    f.render_widget(Paragraph::new(game.input_line.as_str()), chunks[2]);

    if game.results_open {
        let items: Vec<ListItem> = game
            .result_rows
            .iter()
            .map(|row| ListItem::new(row.as_str()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Results"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        state.select(game.result_selected);
        f.render_stateful_widget(list, chunks[3], &mut state);
    }

    f.render_widget(Paragraph::new(game.controls_line.as_str()), chunks[4]);

    let guesses: Vec<ListItem> = game
        .guess_rows
        .iter()
        .map(|row| ListItem::new(row.as_str()))
        .collect();
    f.render_widget(
        List::new(guesses).block(Block::default().borders(Borders::ALL).title("Guesses")),
        chunks[5],
    );
}

fn draw_modal(f: &mut Frame, app: &App, modal: &UiModal) {
    match modal {
        UiModal::Result {
            title,
            body,
            layout,
        }
        | UiModal::ConfirmSkip {
            title,
            body,
            layout,
        } => {
            let area = centered_rect(layout.width_pct, layout.height_pct, f.area());
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(body.as_str())
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title(title.as_str())),
                area,
            );
        }
        UiModal::Logs {
            title,
            empty,
            layout,
        } => {
            let area = centered_rect(layout.width_pct, layout.height_pct, f.area());
            f.render_widget(Clear, area);
            let block = Block::default().borders(Borders::ALL).title(title.as_str());
            if *empty {
                f.render_widget(Paragraph::new("(no log lines yet)").block(block), area);
                return;
            }
            let inner_height = area.height.saturating_sub(2) as usize;
            let total = app.logs.len();
            let end = total.saturating_sub(app.logs_scroll);
            let start = end.saturating_sub(inner_height);
            let items: Vec<ListItem> = app
                .logs
                .iter()
                .skip(start)
                .take(end - start)
                .map(|line| ListItem::new(line.as_str()))
                .collect();
            f.render_widget(List::new(items).block(block), area);
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
