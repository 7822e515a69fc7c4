use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::theme::Theme;
use crate::view::{Dialog, Tier};

// Loaded once at startup from the configured theme file
static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme; only the first call has an effect
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn header() -> Color { theme().header }
fn tier_color(tier: Tier) -> Color { theme().tier_color(tier) }

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Length(3), // Usage bar
            Constraint::Min(4),    // Account box
            Constraint::Length(3), // Triggers
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_info_line(f, app, chunks[0]);
    draw_usage_bar(f, app, chunks[1]);
    draw_account_box(f, app, chunks[2]);
    draw_triggers(f, app, chunks[3]);
    draw_footer(f, chunks[4]);

    // Dialogs stack in the order they were opened
    for dialog in app.page.open_dialogs() {
        draw_dialog(f, dialog);
    }

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(tier_color(Tier::Warning))))
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_usage_bar(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Usage ", Style::default().fg(header()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let Some(bar) = app.page.usage_bar() else {
        f.render_widget(block, area);
        return;
    };

    let label = format!(
        "{}/{} credits used ({:.0}%)",
        app.usage.current, app.usage.total, bar.width_percent
    );
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(tier_color(bar.tier)).bg(Color::Reset))
        .ratio(bar.ratio().clamp(0.0, 1.0))
        .label(Span::styled(label, Style::default().fg(text()).add_modifier(Modifier::BOLD)));

    f.render_widget(gauge, area);
}

fn draw_account_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Account ", Style::default().fg(header())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let tier = app.page.usage_bar().map(|b| b.tier).unwrap_or_default();
    let field = |name: &'static str, value: String, color: Color| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", name), Style::default().fg(text_dim())),
            Span::styled(value, Style::default().fg(color)),
        ])
    };

    let mut lines = Vec::new();
    match &app.account {
        Some(account) => {
            lines.push(field("Name", account.display_name().to_string(), text()));
            let plan = account
                .plan()
                .map(|p| format!("{} ({} videos, £{:.2})", p.name, p.videos, p.price))
                .or_else(|| account.plan_name.clone())
                .unwrap_or_else(|| "No plan".to_string());
            lines.push(field("Plan", plan, text()));
            if account.is_expired() {
                let since = account.plan_expiry.as_deref().unwrap_or("");
                lines.push(field("Status", format!("Expired {}", since).trim_end().to_string(), tier_color(Tier::Critical)));
            } else if account.cancelled {
                let until = account.plan_expiry.as_deref().unwrap_or("end of period");
                lines.push(field("Status", format!("Cancelled, active until {}", until), tier_color(Tier::Critical)));
            } else if account.has_paid {
                lines.push(field("Status", "Active".to_string(), tier_color(Tier::Safe)));
            } else {
                lines.push(field("Status", "Unpaid".to_string(), text_dim()));
            }
        }
        None => lines.push(field("Source", "Fixed values".to_string(), text_dim())),
    }
    lines.push(field("Remaining", app.usage.remaining().to_string(), tier_color(tier)));
    lines.push(field("Tier", tier.to_string(), tier_color(tier)));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_triggers(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for trigger in &app.page.triggers {
        let style = if trigger.on_activate.is_some() {
            Style::default().fg(accent())
        } else {
            Style::default().fg(inactive())
        };
        spans.push(Span::styled(format!("[{}] ", trigger.key), style.add_modifier(Modifier::BOLD)));
        spans.push(Span::styled(format!("{}   ", trigger.label), Style::default().fg(text())));
    }
    spans.push(Span::styled("[t] ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)));
    spans.push(Span::styled("Terms", Style::default().fg(text())));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let footer = Line::from(vec![
        Span::styled("R", Style::default().fg(accent())),
        Span::styled(" refresh  ", Style::default().fg(text_dim())),
        Span::styled("?", Style::default().fg(accent())),
        Span::styled(" help  ", Style::default().fg(text_dim())),
        Span::styled("q", Style::default().fg(accent())),
        Span::styled(" quit", Style::default().fg(text_dim())),
    ]);
    f.render_widget(Paragraph::new(footer).alignment(Alignment::Center), area);
}

fn draw_dialog(f: &mut Frame, dialog: &Dialog) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 90 } else { 60 },
        if area.height < 30 { 70 } else { 40 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = vec![Line::from("")];
    lines.extend(
        dialog
            .body
            .iter()
            .map(|l| Line::from(Span::styled(format!(" {}", l), Style::default().fg(text())))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" Esc", Style::default().fg(accent())),
        Span::styled(" close", Style::default().fg(text_dim())),
    ]));

    let content = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", dialog.title),
                    Style::default().fg(accent()).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(content, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let row = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", keys), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("═══ Dialogs ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        row("l", "Log in"),
        row("s", "Sign up"),
        row("t", "Terms of Service"),
        row("Esc", "Close the top dialog"),
        Line::from(""),
        Line::from(Span::styled("═══ Usage ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        row("R", "Reload the accounts file"),
        Line::from(vec![
            Span::styled("  ", Style::default()),
            Span::styled("< 30%", Style::default().fg(tier_color(Tier::Safe))),
            Span::raw("  "),
            Span::styled("30-70%", Style::default().fg(tier_color(Tier::Warning))),
            Span::raw("  "),
            Span::styled(">= 70%", Style::default().fg(tier_color(Tier::Critical))),
        ]),
        Line::from(""),
        Line::from(Span::styled("═══ Command line ═══", Style::default().fg(header()).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("  quotabar --status    JSON for status bars", Style::default().fg(text_dim()))),
        Line::from(Span::styled("  quotabar --daemon    Notify when usage escalates", Style::default().fg(text_dim()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" quotabar Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
