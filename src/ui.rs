use crate::{
    application::{
        ApplicationAction,
        ApplicationStep,
        Field,
        GroupApplication,
    },
    fixtures::{
        IMPACT_STATS,
        INTERVIEW_CREDIT_SCORE,
        PLATFORM_STATS,
        StatCard,
        USER_TEAM,
    },
    notify::Severity,
    router::{
        Screen,
        View,
    },
    session::Role,
    state::AppState,
    wallet::WalletProvider,
};
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::{
    io::{
        self,
        Stdout,
        stdout,
    },
    thread,
};
use tokio::sync::mpsc;
use tracing::debug;

pub type InputEventReceiver = mpsc::UnboundedReceiver<io::Result<Event>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Connect,
    Navigate(View),
    SelectRole(Role),
    Application(ApplicationAction),
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    focus: usize,
}

/// Terminal input is read on a plain thread, since crossterm's reader
/// blocks, and handed to the async loop over a channel.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        loop {
            let event = event::read();
            let failed = event.is_err();
            if tx.send(event).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout());
    state.terminal = Some(Terminal::new(backend)?);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw<W: WalletProvider>(state: &mut UiState, app: &AppState<W>) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let res = term.draw(|f| render(f, state, app)).map(|_| ());
        state.terminal = Some(term);
        res?;
    }
    Ok(())
}

fn in_wizard<W: WalletProvider>(app: &AppState<W>) -> bool {
    app.screen() == Screen::Application
        && app.application.step == ApplicationStep::GroupApplication
}

fn focused_field(state: &UiState, application: &GroupApplication) -> Field {
    let fields = application.fields();
    let idx = state.focus.min(fields.len().saturating_sub(1));
    fields.get(idx).copied().unwrap_or(Field::LoanAmount)
}

/// Maps a terminal event to a user intent. Focus movement is handled here
/// and never reaches the state container.
pub fn interpret_event<W: WalletProvider>(
    state: &mut UiState,
    app: &AppState<W>,
    event: Event,
) -> Option<UserEvent> {
    let Event::Key(key) = event else {
        return Some(UserEvent::Redraw);
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if in_wizard(app) {
        return interpret_wizard_key(state, &app.application, key);
    }
    state.focus = 0;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(UserEvent::Quit)
        }
        KeyCode::Char('c') => Some(UserEvent::Connect),
        KeyCode::Char('a') => Some(UserEvent::Navigate(View::Application)),
        KeyCode::Char('d') => Some(UserEvent::Navigate(View::Dashboard)),
        KeyCode::Char('l') => Some(UserEvent::Navigate(View::Landing)),
        KeyCode::Char('u') => Some(UserEvent::SelectRole(Role::User)),
        KeyCode::Char('m') => Some(UserEvent::SelectRole(Role::Admin)),
        other => {
            debug!(?other, "unmapped key");
            None
        }
    }
}

fn interpret_wizard_key(
    state: &mut UiState,
    application: &GroupApplication,
    key: KeyEvent,
) -> Option<UserEvent> {
    let field_count = application.fields().len();
    let field = focused_field(state, application);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Esc => {
            state.focus = 0;
            return Some(UserEvent::Navigate(View::Landing));
        }
        KeyCode::Tab => {
            state.focus = (state.focus.min(field_count - 1) + 1) % field_count;
            return Some(UserEvent::Redraw);
        }
        KeyCode::BackTab => {
            state.focus = (state.focus.min(field_count - 1) + field_count - 1) % field_count;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('n') if ctrl => ApplicationAction::AddMember,
        KeyCode::Char('d') if ctrl => {
            let Field::Member(index, _) = field else {
                return None;
            };
            ApplicationAction::RemoveMember(index)
        }
        KeyCode::Char('c') if ctrl => return Some(UserEvent::Quit),
        KeyCode::Enter => ApplicationAction::Submit,
        KeyCode::Backspace => {
            let mut value = application.value(field).unwrap_or_default().to_string();
            value.pop();
            ApplicationAction::Edit { field, value }
        }
        KeyCode::Char(c) if !ctrl => {
            let mut value = application.value(field).unwrap_or_default().to_string();
            value.push(c);
            ApplicationAction::Edit { field, value }
        }
        _ => return None,
    };
    Some(UserEvent::Application(action))
}

fn render<W: WalletProvider>(f: &mut Frame, state: &UiState, app: &AppState<W>) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(8),
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);
    match app.screen() {
        Screen::Disconnected => draw_disconnected(f, chunks[1]),
        Screen::Landing => draw_landing(f, chunks[1]),
        Screen::Application => draw_application(f, chunks[1], state, &app.application),
        Screen::UserDashboard => draw_user_dashboard(f, chunks[1]),
        Screen::AdminDashboard => draw_admin_dashboard(f, chunks[1]),
    }
    draw_footer(f, chunks[2], app);
}

fn connect_label<W: WalletProvider>(app: &AppState<W>) -> String {
    if app.is_connecting() {
        return "Connecting...".to_string();
    }
    match app.account() {
        Some(account) => format!("Connected: {}", account.short()),
        None => "Connect wallet".to_string(),
    }
}

fn draw_header<W: WalletProvider>(f: &mut Frame, area: Rect, app: &AppState<W>) {
    let required = app.required_network();
    let network = match app.chain_id.as_deref() {
        Some(id) if required.matches(id) => required.chain_name.to_string(),
        Some(id) => format!("{id} (wrong network)"),
        None => "unknown".to_string(),
    };
    let price = match &app.price {
        Some(sample) => format!(
            "{sample} (at {})",
            sample.fetched_at.format("%H:%M:%S UTC")
        ),
        None => "--".to_string(),
    };
    let role = match app.role() {
        Some(Role::Admin) => "Admin",
        Some(Role::User) => "User",
        None => "-",
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("[ {} ]", connect_label(app)),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  Role: {role}  Network: {network}")),
        ]),
        Line::from(format!("ETH/USDT: {price}")),
    ];
    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Microcredit · inclusive finance"),
    );
    f.render_widget(header, area);
}

fn draw_disconnected(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from("Group microloans for small entrepreneurs, scored by AI and approved by the community."),
        Line::from(""),
        Line::from("Press c to connect your wallet."),
    ];
    let body = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Welcome"));
    f.render_widget(body, area);
}

fn draw_landing(f: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from("How it works"),
        Line::from(""),
    ];
    for step in ApplicationStep::ALL {
        lines.push(Line::from(format!(
            "{}. {}: {}",
            step.index() + 1,
            step.title(),
            step.description()
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("a: start an application   d: open your dashboard"));
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Home"));
    f.render_widget(body, area);
}

fn draw_application(
    f: &mut Frame,
    area: Rect,
    state: &UiState,
    application: &GroupApplication,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);
    let tabs = Tabs::new(ApplicationStep::ALL.iter().map(|s| s.title()))
        .select(application.step.index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Application"));
    f.render_widget(tabs, chunks[0]);

    match application.step {
        ApplicationStep::GroupApplication => {
            draw_application_form(f, chunks[1], state, application)
        }
        ApplicationStep::AiInterview => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(ApplicationStep::AiInterview.description()),
                )
                .gauge_style(Style::default().fg(Color::Green))
                .percent(u16::from(INTERVIEW_CREDIT_SCORE))
                .label(format!("Credit score {INTERVIEW_CREDIT_SCORE}/100"));
            f.render_widget(gauge, chunks[1]);
        }
        step => {
            let body = Paragraph::new(step.description())
                .block(Block::default().borders(Borders::ALL).title(step.title()));
            f.render_widget(body, chunks[1]);
        }
    }
}

fn draw_application_form(
    f: &mut Frame,
    area: Rect,
    state: &UiState,
    application: &GroupApplication,
) {
    let focused = focused_field(state, application);
    let row = |label: String, field: Field| {
        let value = application.value(field).unwrap_or_default();
        let style = if field == focused {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{label:<22}")),
            Span::styled(format!("{value}_"), style),
        ])
    };
    let mut lines = vec![
        row("Loan amount (USDT)".to_string(), Field::LoanAmount),
        row("Purpose".to_string(), Field::Purpose),
        Line::from(""),
    ];
    for (i, _) in application.members.iter().enumerate() {
        lines.push(Line::from(format!("Member {}", i + 1)));
        for field in application.fields() {
            if let Field::Member(idx, member_field) = field
                && idx == i
            {
                lines.push(row(format!("  {}", member_field.label()), field));
            }
        }
    }
    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(ApplicationStep::GroupApplication.description()),
    );
    f.render_widget(form, area);
}

fn draw_user_dashboard(f: &mut Frame, area: Rect) {
    let team = &USER_TEAM;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(area);

    let summary = Paragraph::new(vec![
        Line::from(format!("Team: {}  Members: {}", team.team_name, team.members)),
        Line::from(format!(
            "Credit score: {}  Repayment rate: {}%",
            team.credit_score, team.repayment_rate
        )),
        Line::from(format!("Next payment: {}", team.next_payment)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Team overview"));
    f.render_widget(summary, chunks[0]);

    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Repayment progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(team.repaid_percent())
        .label(format!("{} / {} USDT", team.repaid_loans, team.total_loans));
    f.render_widget(progress, chunks[1]);

    let rows = team.loan_history.iter().map(|loan| {
        Row::new(vec![
            loan.date.to_string(),
            format!("{} USDT", loan.amount),
            loan.status.to_string(),
        ])
    });
    let history = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Min(10),
        ],
    )
    .header(Row::new(vec!["Date", "Amount", "Status"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL).title("Loan history"));
    f.render_widget(history, chunks[2]);
}

fn draw_stat_row(f: &mut Frame, area: Rect, title: &str, cards: &[StatCard]) {
    let outer = Block::default().borders(Borders::ALL).title(title.to_string());
    let inner = outer.inner(area);
    f.render_widget(outer, area);
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(inner);
    for (card, cell) in cards.iter().zip(cells.iter()) {
        let widget = Paragraph::new(vec![
            Line::from(Span::styled(
                card.value,
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(card.help),
        ])
        .block(Block::default().borders(Borders::ALL).title(card.title));
        f.render_widget(widget, *cell);
    }
}

fn draw_admin_dashboard(f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(6), Constraint::Min(0)])
        .split(area);
    draw_stat_row(f, chunks[0], "Platform", &PLATFORM_STATS);
    draw_stat_row(f, chunks[1], "Social impact", &IMPACT_STATS);
}

fn severity_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::Success => Color::Green,
        Severity::Info => Color::Cyan,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    Style::default().fg(color)
}

fn draw_footer<W: WalletProvider>(f: &mut Frame, area: Rect, app: &AppState<W>) {
    let mut lines: Vec<Line> = app
        .notifications
        .iter()
        .map(|n| {
            let text = if n.body.is_empty() {
                n.title.clone()
            } else {
                format!("{}: {}", n.title, n.body)
            };
            Line::from(Span::styled(text, severity_style(n.severity)))
        })
        .collect();
    let help = if in_wizard(app) {
        "Tab/Shift-Tab focus | Ctrl-N add member | Ctrl-D remove member | Enter submit | Esc back"
    } else {
        "c connect | a apply | d dashboard | l home | u user | m admin | q quit"
    };
    lines.push(Line::from(Span::styled(
        help,
        Style::default().fg(Color::DarkGray),
    )));
    let footer = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Messages"));
    f.render_widget(footer, area);
}
