// 🎨 Rendering - drawing for every screen
//
// Nothing here mutates finance state; the only
// `&mut App` need is the table selection state.

use super::{App, Confirm, GoalEditor, GoalField, GoalOverlay, Screen, SettingsItem, TxField};
use chrono::{Local, Timelike};
use fintrackr::analytics::{DeadlineStatus, GoalReport, ProgressTier};
use fintrackr::format::{format_date, format_deadline, greeting, initial, truncate};
use fintrackr::forms::categories_for;
use fintrackr::{FormErrors, KeyValueStore, TransactionKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        BarChart, Block, Borders, Cell, Clear, Gauge, List, ListItem, ListState, Paragraph, Row,
        Table, Wrap,
    },
    Frame,
};

const TOP_CATEGORIES: usize = 5;
const GOAL_CARD_HEIGHT: u16 = 4;

pub fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current() {
        Screen::Login => render_login(f, chunks[1], app),
        Screen::Dashboard => render_dashboard(f, chunks[1], app),
        Screen::Transactions => render_transactions(f, chunks[1], app),
        Screen::AddTransaction => render_transaction_form(f, chunks[1], app),
        Screen::Goals => render_goals(f, chunks[1], app),
        Screen::Settings => render_settings(f, chunks[1], app),
        Screen::Notifications => render_notifications(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(confirm) = &app.confirm {
        render_confirm(f, confirm);
    }
}

fn key_hint(key: &str) -> Span<'static> {
    Span::styled(key.to_string(), Style::default().fg(Color::Yellow))
}

fn error_line(errors: &FormErrors, field: &str) -> Option<Line<'static>> {
    errors.get(field).map(|err| {
        Line::from(Span::styled(
            format!("    {}", err),
            Style::default().fg(Color::Red),
        ))
    })
}

fn focus_marker(focused: bool) -> Span<'static> {
    if focused {
        Span::styled("▶ ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("  ")
    }
}

/// Area in the middle of `r`, sized as a percentage of it
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

fn money_color(value: f64) -> Color {
    if value > 0.0 {
        Color::Green
    } else if value < 0.0 {
        Color::Red
    } else {
        Color::White
    }
}

// ============================================================================
// CHROME
// ============================================================================

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut spans = vec![
        Span::styled(
            " 💰 FinTrackr ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            app.current().title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(user) = app.store.user() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("[{}] {}", initial(Some(&user.name)), user.name),
            Style::default().fg(Color::Green),
        ));
    }

    let unread = app.scheduler.unread();
    if unread > 0 {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("🔔 {}", unread),
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let hints: &[(&str, &str)] = match app.current() {
        Screen::Login => &[("Enter", "Continue"), ("Esc", "Quit")],
        Screen::Dashboard => &[
            ("t", "Transactions"),
            ("a", "Add"),
            ("g", "Goals"),
            ("s", "Settings"),
            ("n", "Inbox"),
            ("q", "Quit"),
        ],
        Screen::Transactions if app.searching => &[("Enter/Esc", "Done")],
        Screen::Transactions => &[
            ("/", "Search"),
            ("t", "Type"),
            ("c", "Category"),
            ("x", "Clear"),
            ("e", "Edit"),
            ("d", "Delete"),
            ("Esc", "Back"),
        ],
        Screen::AddTransaction => &[("↑/↓", "Field"), ("←/→", "Choose"), ("Enter", "Save"), ("Esc", "Cancel")],
        Screen::Goals if app.goal_overlay.is_some() => &[("Enter", "Save"), ("Esc", "Cancel")],
        Screen::Goals => &[
            ("a", "Add"),
            ("e", "Edit"),
            ("c", "Contribute"),
            ("d", "Delete"),
            ("Esc", "Back"),
        ],
        Screen::Settings => &[("↑/↓", "Move"), ("Enter", "Select"), ("Esc", "Back")],
        Screen::Notifications => &[("x", "Clear"), ("Esc", "Back")],
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" | "));
        }
        spans.push(key_hint(key));
        spans.push(Span::raw(format!(" {}", label)));
    }

    if let Some(status) = &app.status {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Cyan)));
    }

    let status_bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn render_confirm(f: &mut Frame, confirm: &Confirm) {
    let area = centered_rect(50, 25, f.size());
    let danger = matches!(confirm, Confirm::ClearData | Confirm::DeleteGoal(_) | Confirm::DeleteTransaction(_));

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            confirm.message().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![key_hint("y"), Span::raw(" Yes    "), key_hint("n"), Span::raw(" No")]),
    ];

    let dialog = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if danger { Color::Red } else { Color::Yellow }))
                .title(" Confirm "),
        );

    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

// ============================================================================
// LOGIN
// ============================================================================

fn render_login<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let area = centered_rect(60, 60, area);

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "💰 FinTrackr",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Take control of your money",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from("What should we call you?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(app.login.name.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
    ];

    if let Some(err) = &app.login_error {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    }

    let login = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Welcome "),
        );
    f.render_widget(login, area);
}

// ============================================================================
// DASHBOARD
// ============================================================================

fn render_dashboard<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let now = Local::now();
    let summary = app.store.dashboard(&now);
    let money = &app.config.currency;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Greeting
            Constraint::Length(4), // Totals
            Constraint::Min(0),    // Breakdown
        ])
        .split(area);

    let name = app.store.user().map(|u| u.name.clone()).unwrap_or_default();
    let greeting_line = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" [{}] ", initial(Some(&name))),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(format!(" {}, ", greeting(now.hour()))),
        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
    ]));
    f.render_widget(greeting_line, rows[0]);

    let totals = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[1]);

    let cards = [
        ("Balance", summary.balance, money_color(summary.balance)),
        ("Income this month", summary.monthly_income, Color::Green),
        ("Expenses this month", summary.monthly_expenses, Color::Red),
    ];
    for (i, (label, value, color)) in cards.iter().enumerate() {
        let card = Paragraph::new(Line::from(Span::styled(
            money.format(*value),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", label)));
        f.render_widget(card, totals[i]);
    }

    let breakdown = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[2]);

    let top = summary.top_categories(TOP_CATEGORIES);
    if top.is_empty() {
        let empty = Paragraph::new("No expenses yet. Press 'a' to add one.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" Expenses by category "));
        f.render_widget(empty, rows[2]);
        return;
    }

    let labels: Vec<String> = top.iter().map(|c| truncate(&c.category, 9)).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(top)
        .map(|(label, c)| (label.as_str(), c.amount.round().max(0.0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Expenses by category "))
        .data(bars.as_slice())
        .bar_width(9)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
    f.render_widget(chart, breakdown[0]);

    let items: Vec<ListItem> = top
        .iter()
        .map(|c| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<14}", truncate(&c.category, 14))),
                Span::styled(
                    format!("{:>14}", money.format(c.amount)),
                    Style::default().fg(Color::Red),
                ),
                Span::styled(
                    format!(" {:>5.1}%", c.percentage),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Top categories "));
    f.render_widget(list, breakdown[1]);
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

fn render_transactions<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let kind_label = app.filter.kind.map(|k| k.label()).unwrap_or("All");
    let category_label = app.filter.category.clone().unwrap_or_else(|| "All".to_string());
    let search = Paragraph::new(Line::from(vec![
        Span::raw(" 🔍 "),
        Span::raw(app.filter.query.clone()),
        Span::styled(
            if app.searching { "▏" } else { "" },
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("   "),
        Span::styled(format!("Type: {}", kind_label), Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(format!("Category: {}", category_label), Style::default().fg(Color::Green)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if app.searching { Color::Yellow } else { Color::White }))
            .title(" Search "),
    );
    f.render_widget(search, chunks[0]);

    let money = app.config.currency.clone();
    let visible = app.visible_transactions();
    let total = app.store.transactions().len();
    let title = format!(" Transactions ({}/{}) ", visible.len(), total);

    if visible.is_empty() {
        let message = if app.filter.is_active() {
            "No transactions match the current filters."
        } else {
            "No transactions yet. Press 'a' to add one."
        };
        let empty = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let header_cells = ["Date", "Title", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = visible
        .iter()
        .map(|tx| {
            let color = match tx.kind {
                TransactionKind::Income => Color::Green,
                TransactionKind::Expense => Color::Red,
            };
            Row::new(vec![
                Cell::from(format_date(&tx.date.with_timezone(&Local))),
                Cell::from(truncate(&tx.title, 30)),
                Cell::from(truncate(&tx.category, 16)),
                Cell::from(format!("{:>16}", money.format_signed(tx.kind, tx.amount)))
                    .style(Style::default().fg(color)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.tx_state);
}

fn render_transaction_form<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let editor = &app.tx_editor;
    let form = &editor.form;
    let label_style = Style::default().fg(Color::DarkGray);

    let kind_span = |kind: TransactionKind| {
        let selected = form.kind == kind;
        let color = match kind {
            TransactionKind::Income => Color::Green,
            TransactionKind::Expense => Color::Red,
        };
        let style = if selected {
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        Span::styled(format!(" {} ", kind.label()), style)
    };

    let mut lines = vec![
        Line::from(vec![
            focus_marker(editor.focus == TxField::Kind),
            Span::styled("Type         ", label_style),
            kind_span(TransactionKind::Expense),
            Span::raw(" "),
            kind_span(TransactionKind::Income),
        ]),
        Line::from(""),
        Line::from(vec![
            focus_marker(editor.focus == TxField::Title),
            Span::styled("Title        ", label_style),
            Span::raw(form.title.clone()),
        ]),
    ];
    lines.extend(error_line(&editor.errors, "title"));

    lines.push(Line::from(vec![
        focus_marker(editor.focus == TxField::Amount),
        Span::styled("Amount       ", label_style),
        Span::styled(
            app.config.currency.format(form.amount()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.extend(error_line(&editor.errors, "amount"));

    let choices: Vec<Span> = categories_for(form.kind)
        .iter()
        .map(|c| {
            if form.category.as_deref() == Some(*c) {
                Span::styled(
                    format!("[{}] ", c),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(format!("{} ", c), Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    let mut category_line = vec![
        focus_marker(editor.focus == TxField::Category),
        Span::styled("Category     ", label_style),
    ];
    category_line.extend(choices);
    lines.push(Line::from(category_line));
    lines.extend(error_line(&editor.errors, "category"));

    lines.push(Line::from(vec![
        focus_marker(editor.focus == TxField::Description),
        Span::styled("Description  ", label_style),
        Span::raw(form.description.clone()),
    ]));

    let title = if editor.editing.is_some() {
        " Edit transaction "
    } else {
        " New transaction "
    };
    let save_style = if form.is_submittable() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  [ Enter: Save ]", save_style)));

    let panel = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );
    f.render_widget(panel, area);
}

// ============================================================================
// GOALS
// ============================================================================

fn tier_color(tier: ProgressTier) -> Color {
    match tier {
        ProgressTier::Completed => Color::Green,
        ProgressTier::Close => Color::LightRed,
        ProgressTier::InProgress => Color::Blue,
    }
}

fn deadline_span(report: &GoalReport) -> Span<'static> {
    match (report.days_left, report.deadline_status) {
        (Some(_), Some(DeadlineStatus::Overdue)) => {
            Span::styled("overdue", Style::default().fg(Color::Red))
        }
        (Some(days), Some(DeadlineStatus::Approaching)) => {
            Span::styled(format!("{} days left", days), Style::default().fg(Color::LightRed))
        }
        (Some(days), _) => Span::styled(format!("{} days left", days), Style::default().fg(Color::DarkGray)),
        _ => Span::raw(""),
    }
}

fn render_goals<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let goals = app.store.goals();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Goals ({}) ", goals.len()));

    if goals.is_empty() {
        let empty = Paragraph::new("No goals yet. Press 'a' to create one.")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
    } else {
        let inner = block.inner(area);
        f.render_widget(block, area);

        let visible = ((inner.height / GOAL_CARD_HEIGHT) as usize).max(1);
        let offset = app.goal_selected.saturating_sub(visible - 1);
        let today = Local::now().date_naive();
        let money = &app.config.currency;

        let slots = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(GOAL_CARD_HEIGHT); visible])
            .split(inner);

        for (slot, (index, goal)) in slots.iter().zip(goals.iter().enumerate().skip(offset)) {
            let report = GoalReport::for_goal(goal, today);
            let selected = index == app.goal_selected;

            let mut title = vec![Span::styled(
                format!(" {} ", goal.title),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if goal.is_achieved() {
                title.push(Span::styled("✓ achieved ", Style::default().fg(Color::Green)));
            }

            let card = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(if selected { Color::Yellow } else { Color::DarkGray }))
                .title(Line::from(title));
            let card_inner = card.inner(*slot);
            f.render_widget(card, *slot);

            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Length(1)])
                .split(card_inner);

            let info = Paragraph::new(Line::from(vec![
                Span::raw(format!(
                    "{} of {}",
                    money.format(goal.current_amount),
                    money.format(goal.target_amount)
                )),
                Span::styled(
                    format!("  ·  {}  ", format_deadline(&goal.deadline)),
                    Style::default().fg(Color::DarkGray),
                ),
                deadline_span(&report),
            ]));
            f.render_widget(info, parts[0]);

            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(tier_color(report.tier)).bg(Color::Black))
                .ratio(report.progress)
                .label(format!("{:.0}%", report.progress * 100.0));
            f.render_widget(gauge, parts[1]);
        }
    }

    match &app.goal_overlay {
        Some(GoalOverlay::Form(editor)) => render_goal_form(f, editor),
        Some(GoalOverlay::Contribute(prompt)) => {
            let goal_title = app
                .store
                .find_goal(&prompt.goal_id)
                .map(|g| g.title.clone())
                .unwrap_or_default();
            let mut lines = vec![
                Line::from(""),
                Line::from(format!("How much are you adding to \"{}\"?", goal_title)),
                Line::from(""),
                Line::from(vec![
                    Span::styled("> ", Style::default().fg(Color::Yellow)),
                    Span::raw(prompt.input.clone()),
                    Span::styled("▏", Style::default().fg(Color::Yellow)),
                ]),
            ];
            if let Some(err) = &prompt.error {
                lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
            }

            let area = centered_rect(50, 30, f.size());
            let dialog = Paragraph::new(lines).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Contribute "),
            );
            f.render_widget(Clear, area);
            f.render_widget(dialog, area);
        }
        None => {}
    }
}

fn render_goal_form(f: &mut Frame, editor: &GoalEditor) {
    let label_style = Style::default().fg(Color::DarkGray);
    let fields = [
        (GoalField::Title, "Title        ", &editor.form.title, "title"),
        (GoalField::Target, "Target       ", &editor.form.target_input, "target"),
        (GoalField::Deadline, "Deadline     ", &editor.form.deadline, "deadline"),
        (GoalField::Description, "Description  ", &editor.form.description, "description"),
    ];

    let mut lines = vec![Line::from("")];
    for (field, label, value, key) in fields {
        let placeholder = if field == GoalField::Deadline && value.is_empty() {
            Span::styled("YYYY-MM-DD", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(value.clone())
        };
        lines.push(Line::from(vec![
            focus_marker(editor.focus == field),
            Span::styled(label, label_style),
            placeholder,
        ]));
        lines.extend(error_line(&editor.errors, key));
    }

    let title = if editor.editing.is_some() { " Edit goal " } else { " New goal " };
    let area = centered_rect(60, 50, f.size());
    let dialog = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

// ============================================================================
// SETTINGS
// ============================================================================

fn render_settings<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let stats = app.store.stats();
    let money = &app.config.currency;
    let name = app.store.user().map(|u| u.name.clone()).unwrap_or_default();

    let profile = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!(" [{}] ", initial(Some(&name))),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ),
            Span::styled(format!(" {}", name), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(format!(
            " Transactions: {}   Goals: {}   Total: {}",
            stats.transaction_count,
            stats.goal_count,
            money.format(stats.total_value)
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Profile "));
    f.render_widget(profile, chunks[0]);

    let toggle = |on: bool| {
        if on {
            Span::styled("[on] ", Style::default().fg(Color::Green))
        } else {
            Span::styled("[off]", Style::default().fg(Color::DarkGray))
        }
    };

    let items: Vec<ListItem> = SettingsItem::ALL
        .iter()
        .map(|item| {
            let mut spans = vec![];
            match item {
                SettingsItem::Notifications => spans.push(toggle(app.scheduler.is_enabled())),
                SettingsItem::DailyReminder => {
                    spans.push(toggle(app.scheduler.daily_reminder_enabled()))
                }
                _ => spans.push(Span::raw("     ")),
            }
            let style = match item {
                SettingsItem::ClearData | SettingsItem::Logout => Style::default().fg(Color::Red),
                _ => Style::default(),
            };
            spans.push(Span::styled(format!(" {}", item.label()), style));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Preferences "))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");
    let mut state = ListState::default().with_selected(Some(app.settings_selected));
    f.render_stateful_widget(list, chunks[1], &mut state);
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

fn render_notifications<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Inbox ({}) ", app.scheduler.inbox_len()));

    if app.scheduler.inbox_len() == 0 {
        let empty = Paragraph::new("No notifications yet.")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .scheduler
        .inbox()
        .map(|delivered| {
            let n = &delivered.notification;
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        delivered.at.format("%d/%m %H:%M ").to_string(),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(format!("{} ", n.kind.icon())),
                    Span::styled(n.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(format!("             {}", n.body)),
            ])
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
