// ============================================================================
// Écran DayDetail
// ============================================================================
// Clôtures d'un jour pour toutes les devises. Le snapshot se remplit au fil
// des réponses : chaque devise est affichée avec son état (prix, en attente,
// pas de donnée, échec).
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::HistoricalSnapshot;
use crate::ui::dashboard::{create_layout, quit_confirmation_line};

pub fn render_day_detail(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    let title = match &app.day_detail {
        Some(snapshot) => format!(" Clôtures du {} ", snapshot.date.format("%Y-%m-%d")),
        None => " Clôtures ".to_string(),
    };
    let header = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
        .title_alignment(Alignment::Center);

    let progress = app
        .day_detail
        .as_ref()
        .map(progress_line)
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(vec![Line::from(progress)])
            .block(header)
            .alignment(Alignment::Center),
        chunks[0],
    );

    render_currencies(frame, app, chunks[1]);

    let footer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let line = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else {
        Line::from(vec![
            Span::styled("[Esc]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Retour  "),
            Span::styled("[q]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit"),
        ])
    };
    frame.render_widget(
        Paragraph::new(vec![line])
            .block(footer)
            .alignment(Alignment::Center),
        chunks[2],
    );
}

/// "3/5 devises" ou "terminé"
fn progress_line(snapshot: &HistoricalSnapshot) -> String {
    let expected = snapshot.settled() + snapshot.pending.len();
    if snapshot.is_complete() {
        format!("{} devises, terminé", expected)
    } else {
        format!("{}/{} devises...", snapshot.settled(), expected)
    }
}

fn render_currencies(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Devises ");

    let Some(snapshot) = &app.day_detail else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    // Tri par code, tous états confondus
    let mut entries: Vec<(String, String, Style)> = Vec::new();
    for (code, price) in &snapshot.prices {
        entries.push((
            code.to_string(),
            format!("{} {:.4}", app.day_symbol(code), price),
            Style::default().fg(Color::Green),
        ));
    }
    for code in &snapshot.pending {
        entries.push((code.to_string(), "...".to_string(), Style::default().fg(Color::Gray)));
    }
    for code in &snapshot.missing {
        entries.push((code.to_string(), "pas de donnée".to_string(), Style::default().fg(Color::Yellow)));
    }
    for code in &snapshot.failed {
        entries.push((code.to_string(), "échec".to_string(), Style::default().fg(Color::Red)));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let items: Vec<ListItem> = entries
        .into_iter()
        .map(|(code, value, style)| ListItem::new(format!(" {:<6} {:>20}", code, value)).style(style))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
