// ============================================================================
// Dashboard - Rendu de la liste des prix
// ============================================================================
// Dessine l'écran principal à partir de App :
// - header : devise sélectionnée, cadence, spinner
// - contenu : ligne "dernier prix" puis clôtures historiques
// - footer : erreur éventuelle, confirmation de quit ou raccourcis
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Widgets : Block, Paragraph, List
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::day_detail;

/// Dessine l'interface complète selon l'écran courant
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::PriceList => render_price_list(frame, app),
        Screen::DayDetail => day_detail::render_day_detail(frame, app),
    }
}

fn render_price_list(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    let content = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(chunks[1]);
    render_latest(frame, app, content[0]);
    render_historical(frame, app, content[1]);

    render_footer(frame, app, chunks[2]);
}

/// Layout principal (header, contenu, footer)
pub(crate) fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Contenu
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" BPI Watch ")
        .title_alignment(Alignment::Center);

    let line = Line::from(vec![
        Span::styled(
            format!("{} ", app.selected_currency()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.selected_currency_name().to_string(), Style::default().fg(Color::Gray)),
        Span::raw("   refresh: "),
        Span::styled(app.refresh_label(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(app.spinner(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ]);

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Contenu
// ============================================================================

/// Section "dernier prix", séparée de l'historique
fn render_latest(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Dernier prix ");

    let line = match &app.rows.latest {
        Some(latest) => Line::from(vec![
            Span::styled(
                format!(" {} {}", latest.symbol, latest.rate),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("   {}", latest.updated_at.format("%Y-%m-%d %H:%M:%S UTC")),
                Style::default().fg(Color::Gray),
            ),
        ]),
        None => Line::from(Span::styled(" En attente de cotation...", Style::default().fg(Color::Gray))),
    };

    frame.render_widget(Paragraph::new(vec![line]).block(block), area);
}

/// Clôtures historiques, la plus récente en haut
fn render_historical(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Clôtures ");

    if app.rows.historical.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("Pas encore d'historique", Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    // Fenêtre glissante pour garder la sélection visible
    let visible = area.height.saturating_sub(2) as usize;
    let offset = (app.selected_row + 1).saturating_sub(visible);

    let items: Vec<ListItem> = app
        .rows
        .historical
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible.max(1))
        .map(|(index, row)| {
            let line = format!(" {}   {} {:>14}", row.date.format("%Y-%m-%d"), row.symbol, row.price);
            let style = if index == app.selected_row {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(line).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// ============================================================================
// Footer
// ============================================================================

pub(crate) fn quit_confirmation_line() -> Line<'static> {
    Line::from(vec![
        Span::styled("⚠  Appuyez sur ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(
            "[q]",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::styled(
            " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let line = if app.is_awaiting_quit_confirmation() {
        quit_confirmation_line()
    } else if let Some(error) = &app.last_error {
        // Les dernières valeurs restent affichées : l'erreur est un simple
        // indicateur de données périmées
        Line::from(Span::styled(format!("⚠ {} (données périmées)", error), Style::default().fg(Color::Red)))
    } else {
        Line::from(vec![
            Span::styled("[q]", key),
            Span::raw(" Quit  "),
            Span::styled("[r]", key),
            Span::raw(" Refresh  "),
            Span::styled("[ [ ] ]", key),
            Span::raw(" Devise  "),
            Span::styled("[+ -]", key),
            Span::raw(" Cadence  "),
            Span::styled("[↑↓]", key),
            Span::raw(" Navigate  "),
            Span::styled("[Enter]", key),
            Span::raw(" Jour"),
        ])
    };

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
