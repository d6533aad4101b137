// 🖥️ Terminal UI - screens, navigation stack and key handling
//
// `App` owns the store and the notification scheduler. Key handling is a
// plain state transition (`handle_key`), drawing lives in `render`.

mod render;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::TableState, Terminal};
use std::io;
use std::time::Duration;
use tracing::{error, info, warn};

use fintrackr::forms::{all_categories, parse_amount};
use fintrackr::{
    export_json, AppConfig, FinanceStore, FormErrors, Goal, GoalForm, KeyValueStore, LoginForm,
    NotificationScheduler, Transaction, TransactionFilter, TransactionForm, TransactionKind,
};

pub use render::ui;

const TICK_RATE: Duration = Duration::from_millis(250);

// ============================================================================
// SCREENS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    Transactions,
    AddTransaction,
    Goals,
    Settings,
    Notifications,
}

impl Screen {
    pub fn title(&self) -> &str {
        match self {
            Screen::Login => "Welcome",
            Screen::Dashboard => "Dashboard",
            Screen::Transactions => "Transactions",
            Screen::AddTransaction => "Transaction",
            Screen::Goals => "Goals",
            Screen::Settings => "Settings",
            Screen::Notifications => "Notifications",
        }
    }
}

/// Step through `order` from `current`, wrapping at both ends
fn cycle<T: Copy + PartialEq>(order: &[T], current: T, forward: bool) -> T {
    let len = order.len();
    let i = order.iter().position(|x| *x == current).unwrap_or(0);
    if forward {
        order[(i + 1) % len]
    } else {
        order[(i + len - 1) % len]
    }
}

/// Plain typing into a text field. Returns whether the key was consumed.
fn edit_text(buf: &mut String, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buf.push(c);
            true
        }
        KeyCode::Backspace => {
            buf.pop();
            true
        }
        _ => false,
    }
}

// ============================================================================
// FORM STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxField {
    Kind,
    Title,
    Amount,
    Category,
    Description,
}

impl TxField {
    pub const ORDER: [TxField; 5] = [
        TxField::Kind,
        TxField::Title,
        TxField::Amount,
        TxField::Category,
        TxField::Description,
    ];
}

#[derive(Debug, Clone)]
pub struct TransactionEditor {
    pub form: TransactionForm,
    /// Id of the transaction being edited; `None` when adding
    pub editing: Option<String>,
    pub focus: TxField,
    pub errors: FormErrors,
}

impl TransactionEditor {
    pub fn new() -> Self {
        TransactionEditor {
            form: TransactionForm::default(),
            editing: None,
            focus: TxField::Title,
            errors: FormErrors::default(),
        }
    }

    pub fn edit(tx: &Transaction) -> Self {
        TransactionEditor {
            form: TransactionForm::from_transaction(tx),
            editing: Some(tx.id.clone()),
            ..Self::new()
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = cycle(&TxField::ORDER, self.focus, true),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = cycle(&TxField::ORDER, self.focus, false)
            }
            _ => match self.focus {
                TxField::Kind => {
                    if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                        self.form.toggle_kind();
                    }
                }
                TxField::Title => {
                    edit_text(&mut self.form.title, key);
                }
                TxField::Amount => match key.code {
                    KeyCode::Char(c) => {
                        self.form.push_digit(c);
                    }
                    KeyCode::Backspace => self.form.pop_digit(),
                    _ => {}
                },
                TxField::Category => match key.code {
                    KeyCode::Right | KeyCode::Char(' ') => self.form.cycle_category(true),
                    KeyCode::Left => self.form.cycle_category(false),
                    _ => {}
                },
                TxField::Description => {
                    edit_text(&mut self.form.description, key);
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalField {
    Title,
    Target,
    Deadline,
    Description,
}

impl GoalField {
    pub const ORDER: [GoalField; 4] = [
        GoalField::Title,
        GoalField::Target,
        GoalField::Deadline,
        GoalField::Description,
    ];
}

#[derive(Debug, Clone)]
pub struct GoalEditor {
    pub form: GoalForm,
    pub editing: Option<String>,
    pub focus: GoalField,
    pub errors: FormErrors,
}

impl GoalEditor {
    pub fn new() -> Self {
        GoalEditor {
            form: GoalForm::default(),
            editing: None,
            focus: GoalField::Title,
            errors: FormErrors::default(),
        }
    }

    pub fn edit(goal: &Goal) -> Self {
        GoalEditor {
            form: GoalForm::from_goal(goal),
            editing: Some(goal.id.clone()),
            ..Self::new()
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = cycle(&GoalField::ORDER, self.focus, true)
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = cycle(&GoalField::ORDER, self.focus, false)
            }
            _ => {
                let buf = match self.focus {
                    GoalField::Title => &mut self.form.title,
                    GoalField::Target => &mut self.form.target_input,
                    GoalField::Deadline => &mut self.form.deadline,
                    GoalField::Description => &mut self.form.description,
                };
                edit_text(buf, key);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContributionPrompt {
    pub goal_id: String,
    pub input: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum GoalOverlay {
    Form(GoalEditor),
    Contribute(ContributionPrompt),
}

/// Destructive actions waiting for a yes/no
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteTransaction(String),
    DeleteGoal(String),
    ClearData,
    Logout,
}

impl Confirm {
    pub fn message(&self) -> &str {
        match self {
            Confirm::DeleteTransaction(_) => "Delete this transaction?",
            Confirm::DeleteGoal(_) => "Delete this goal?",
            Confirm::ClearData => "Erase all data? This cannot be undone.",
            Confirm::Logout => "Log out?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    Notifications,
    DailyReminder,
    Export,
    ClearData,
    Logout,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 5] = [
        SettingsItem::Notifications,
        SettingsItem::DailyReminder,
        SettingsItem::Export,
        SettingsItem::ClearData,
        SettingsItem::Logout,
    ];

    pub fn label(&self) -> &str {
        match self {
            SettingsItem::Notifications => "Notifications",
            SettingsItem::DailyReminder => "Daily reminder",
            SettingsItem::Export => "Export data (JSON)",
            SettingsItem::ClearData => "Clear all data",
            SettingsItem::Logout => "Log out",
        }
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App<S: KeyValueStore> {
    pub store: FinanceStore<S>,
    pub scheduler: NotificationScheduler,
    pub config: AppConfig,
    pub stack: Vec<Screen>,

    pub login: LoginForm,
    pub login_error: Option<String>,

    pub tx_editor: TransactionEditor,
    pub filter: TransactionFilter,
    pub searching: bool,
    pub tx_state: TableState,

    pub goal_selected: usize,
    pub goal_overlay: Option<GoalOverlay>,

    pub settings_selected: usize,
    pub confirm: Option<Confirm>,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: FinanceStore<S>, config: AppConfig) -> Self {
        let mut scheduler = NotificationScheduler::new(&config);
        scheduler.request_permission();
        scheduler.schedule_daily_reminder();
        scheduler.schedule_weekly_report();
        let today = Local::now().date_naive();
        scheduler.check_goal_deadlines(store.goals(), today);
        scheduler.check_budget_alert(store.monthly_expenses(), today);

        let start = if store.user().is_some() {
            Screen::Dashboard
        } else {
            Screen::Login
        };

        let mut tx_state = TableState::default();
        tx_state.select(Some(0));

        App {
            store,
            scheduler,
            config,
            stack: vec![start],
            login: LoginForm::default(),
            login_error: None,
            tx_editor: TransactionEditor::new(),
            filter: TransactionFilter::default(),
            searching: false,
            tx_state,
            goal_selected: 0,
            goal_overlay: None,
            settings_selected: 0,
            confirm: None,
            status: None,
            should_quit: false,
        }
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or(Screen::Login)
    }

    pub fn push(&mut self, screen: Screen) {
        if screen == Screen::Notifications {
            self.scheduler.mark_read();
        }
        self.stack.push(screen);
    }

    /// Back one screen; at the root this quits
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            self.should_quit = true;
        }
    }

    /// Replace the whole stack (login, logout, clear data)
    pub fn reset_to(&mut self, screen: Screen) {
        self.stack = vec![screen];
        self.confirm = None;
        self.goal_overlay = None;
    }

    fn open_new_transaction(&mut self) {
        self.tx_editor = TransactionEditor::new();
        self.push(Screen::AddTransaction);
    }

    pub fn tick(&mut self) {
        self.tick_at(Local::now().naive_local());
    }

    pub fn tick_at(&mut self, now: NaiveDateTime) {
        let delivered = self.scheduler.tick(now);
        if let Some(latest) = delivered.last() {
            self.status = Some(format!(
                "{} {}",
                latest.notification.kind.icon(),
                latest.notification.title
            ));
        }
        // Already on screen
        if self.current() == Screen::Notifications {
            self.scheduler.mark_read();
        }
    }

    // ------------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return;
        }

        match self.current() {
            Screen::Login => self.handle_login_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Transactions => self.handle_transactions_key(key),
            Screen::AddTransaction => self.handle_add_transaction_key(key),
            Screen::Goals => self.handle_goals_key(key),
            Screen::Settings => self.handle_settings_key(key),
            Screen::Notifications => self.handle_notifications_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let confirmed = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => false,
            _ => return,
        };

        let action = match self.confirm.take() {
            Some(action) => action,
            None => return,
        };
        if !confirmed {
            return;
        }

        match action {
            Confirm::DeleteTransaction(id) => {
                if self.store.delete_transaction(&id) {
                    self.status = Some("Transaction deleted".to_string());
                }
                self.clamp_transaction_selection();
            }
            Confirm::DeleteGoal(id) => {
                if self.store.delete_goal(&id) {
                    self.status = Some("Goal deleted".to_string());
                }
                self.goal_selected = self
                    .goal_selected
                    .min(self.store.goals().len().saturating_sub(1));
            }
            Confirm::ClearData => {
                self.store.clear_all();
                self.scheduler.clear_inbox();
                self.login = LoginForm::default();
                self.reset_to(Screen::Login);
                self.status = Some("All data cleared".to_string());
            }
            Confirm::Logout => {
                self.store.set_user(None);
                self.login = LoginForm::default();
                self.reset_to(Screen::Login);
                info!("User logged out");
            }
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => match self.login.validate() {
                Ok(user) => {
                    let name = user.name.clone();
                    self.store.set_user(Some(user));
                    self.scheduler.notify_welcome(&name);
                    self.login_error = None;
                    self.reset_to(Screen::Dashboard);
                    info!("User logged in");
                }
                Err(errors) => {
                    self.login_error = errors.iter().next().map(|(_, e)| e.to_string());
                }
            },
            _ => {
                edit_text(&mut self.login.name, key);
            }
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.pop(),
            KeyCode::Char('t') => self.push(Screen::Transactions),
            KeyCode::Char('a') => self.open_new_transaction(),
            KeyCode::Char('g') => self.push(Screen::Goals),
            KeyCode::Char('s') => self.push(Screen::Settings),
            KeyCode::Char('n') => self.push(Screen::Notifications),
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------------

    pub fn visible_transactions(&self) -> Vec<&Transaction> {
        self.filter.apply(self.store.transactions())
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        let visible = self.visible_transactions();
        self.tx_state.selected().and_then(|i| visible.get(i).copied())
    }

    fn clamp_transaction_selection(&mut self) {
        let len = self.visible_transactions().len();
        let selected = match self.tx_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.tx_state.select(selected);
    }

    fn move_transaction_selection(&mut self, forward: bool) {
        let len = self.visible_transactions().len();
        if len == 0 {
            return;
        }
        let i = match self.tx_state.selected() {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.tx_state.select(Some(i));
    }

    fn cycle_kind_filter(&mut self) {
        self.filter.kind = match self.filter.kind {
            None => Some(TransactionKind::Income),
            Some(TransactionKind::Income) => Some(TransactionKind::Expense),
            Some(TransactionKind::Expense) => None,
        };
        self.clamp_transaction_selection();
    }

    fn cycle_category_filter(&mut self) {
        let categories = all_categories();
        let next = match &self.filter.category {
            None => categories.first().copied(),
            Some(current) => categories
                .iter()
                .position(|c| c == current)
                .and_then(|i| categories.get(i + 1))
                .copied(),
        };
        self.filter.category = next.map(str::to_string);
        self.clamp_transaction_selection();
    }

    fn handle_transactions_key(&mut self, key: KeyEvent) {
        if self.searching {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.searching = false,
                _ => {
                    if edit_text(&mut self.filter.query, key) {
                        self.clamp_transaction_selection();
                    }
                }
            }
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.pop(),
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('t') => self.cycle_kind_filter(),
            KeyCode::Char('c') => self.cycle_category_filter(),
            KeyCode::Char('x') => {
                self.filter = TransactionFilter::default();
                self.clamp_transaction_selection();
            }
            KeyCode::Char('a') => self.open_new_transaction(),
            KeyCode::Down | KeyCode::Char('j') => self.move_transaction_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_transaction_selection(false),
            KeyCode::Home => self.clamp_transaction_selection_to(0),
            KeyCode::End => {
                let len = self.visible_transactions().len();
                self.clamp_transaction_selection_to(len.saturating_sub(1));
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(tx) = self.selected_transaction() {
                    self.tx_editor = TransactionEditor::edit(tx);
                    self.push(Screen::AddTransaction);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(tx) = self.selected_transaction() {
                    self.confirm = Some(Confirm::DeleteTransaction(tx.id.clone()));
                }
            }
            _ => {}
        }
    }

    fn clamp_transaction_selection_to(&mut self, index: usize) {
        self.tx_state.select(Some(index));
        self.clamp_transaction_selection();
    }

    fn handle_add_transaction_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.pop(),
            KeyCode::Enter => self.submit_transaction(),
            _ => self.tx_editor.handle_key(key),
        }
    }

    fn submit_transaction(&mut self) {
        match self.tx_editor.editing.clone() {
            Some(id) => match self.tx_editor.form.validate_patch() {
                Ok(patch) => {
                    if self.store.update_transaction(&id, patch) {
                        if let Some(tx) = self.store.find_transaction(&id).cloned() {
                            self.run_transaction_checks(&tx);
                        }
                        self.status = Some("Transaction updated".to_string());
                    } else {
                        warn!(id = %id, "Edited transaction no longer exists");
                    }
                    self.pop();
                }
                Err(errors) => self.tx_editor.errors = errors,
            },
            None => match self.tx_editor.form.validate() {
                Ok(draft) => {
                    let tx = self.store.add_transaction(draft);
                    self.run_transaction_checks(&tx);
                    self.status = Some(format!("Saved \"{}\"", tx.title));
                    self.clamp_transaction_selection();
                    self.pop();
                }
                Err(errors) => self.tx_editor.errors = errors,
            },
        }
    }

    /// Large-transaction and budget notifications after an add or edit
    fn run_transaction_checks(&mut self, tx: &Transaction) {
        self.scheduler.notify_large_transaction(tx);
        if tx.is_expense() {
            let spent = self.store.monthly_expenses();
            self.scheduler.check_budget_alert(spent, Local::now().date_naive());
        }
    }

    // ------------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------------

    pub fn selected_goal(&self) -> Option<&Goal> {
        self.store.goals().get(self.goal_selected)
    }

    fn handle_goals_key(&mut self, key: KeyEvent) {
        if let Some(overlay) = self.goal_overlay.take() {
            self.goal_overlay = self.handle_goal_overlay_key(overlay, key);
            return;
        }

        let count = self.store.goals().len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.pop(),
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                self.goal_selected = (self.goal_selected + 1) % count;
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                self.goal_selected = (self.goal_selected + count - 1) % count;
            }
            KeyCode::Home => self.goal_selected = 0,
            KeyCode::End => self.goal_selected = count.saturating_sub(1),
            KeyCode::Char('a') => self.goal_overlay = Some(GoalOverlay::Form(GoalEditor::new())),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(goal) = self.selected_goal() {
                    self.goal_overlay = Some(GoalOverlay::Form(GoalEditor::edit(goal)));
                }
            }
            KeyCode::Char('c') | KeyCode::Char('+') => {
                if let Some(goal) = self.selected_goal() {
                    self.goal_overlay = Some(GoalOverlay::Contribute(ContributionPrompt {
                        goal_id: goal.id.clone(),
                        input: String::new(),
                        error: None,
                    }));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(goal) = self.selected_goal() {
                    self.confirm = Some(Confirm::DeleteGoal(goal.id.clone()));
                }
            }
            _ => {}
        }
    }

    /// Returns the overlay to keep open, or `None` to close it
    fn handle_goal_overlay_key(&mut self, overlay: GoalOverlay, key: KeyEvent) -> Option<GoalOverlay> {
        match overlay {
            GoalOverlay::Form(mut editor) => match key.code {
                KeyCode::Esc => None,
                KeyCode::Enter => self.submit_goal(editor),
                _ => {
                    editor.handle_key(key);
                    Some(GoalOverlay::Form(editor))
                }
            },
            GoalOverlay::Contribute(mut prompt) => match key.code {
                KeyCode::Esc => None,
                KeyCode::Enter => self.submit_contribution(prompt),
                _ => {
                    edit_text(&mut prompt.input, key);
                    Some(GoalOverlay::Contribute(prompt))
                }
            },
        }
    }

    fn submit_goal(&mut self, mut editor: GoalEditor) -> Option<GoalOverlay> {
        let result = match editor.editing.clone() {
            Some(id) => editor.form.validate_patch().map(|patch| {
                self.store.update_goal(&id, patch);
                "Goal updated".to_string()
            }),
            None => editor.form.validate().map(|draft| {
                let goal = self.store.add_goal(draft);
                self.goal_selected = self.store.goals().len().saturating_sub(1);
                format!("Goal \"{}\" created", goal.title)
            }),
        };

        match result {
            Ok(message) => {
                self.status = Some(message);
                None
            }
            Err(errors) => {
                editor.errors = errors;
                Some(GoalOverlay::Form(editor))
            }
        }
    }

    fn submit_contribution(&mut self, mut prompt: ContributionPrompt) -> Option<GoalOverlay> {
        let amount = match parse_amount(&prompt.input, "Amount") {
            Ok(amount) => amount,
            Err(err) => {
                prompt.error = Some(err.to_string());
                return Some(GoalOverlay::Contribute(prompt));
            }
        };

        match self.store.contribute_to_goal(&prompt.goal_id, amount) {
            Some(contribution) => {
                if contribution.newly_achieved {
                    self.scheduler.notify_goal_achieved(&contribution.goal);
                }
                self.status = Some(format!(
                    "Added {} to \"{}\"",
                    self.config.currency.format(amount),
                    contribution.goal.title
                ));
            }
            None => warn!(goal_id = %prompt.goal_id, "Contribution to missing goal"),
        }
        None
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn selected_setting(&self) -> SettingsItem {
        SettingsItem::ALL[self.settings_selected.min(SettingsItem::ALL.len() - 1)]
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let count = SettingsItem::ALL.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.pop(),
            KeyCode::Down | KeyCode::Char('j') => {
                self.settings_selected = (self.settings_selected + 1) % count
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.settings_selected = (self.settings_selected + count - 1) % count
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_setting(self.selected_setting()),
            _ => {}
        }
    }

    fn activate_setting(&mut self, item: SettingsItem) {
        match item {
            SettingsItem::Notifications => {
                let enabled = !self.scheduler.is_enabled();
                self.scheduler.set_enabled(enabled);
                if enabled {
                    self.scheduler.schedule_daily_reminder();
                    self.scheduler.schedule_weekly_report();
                }
            }
            SettingsItem::DailyReminder => {
                let enabled = !self.scheduler.daily_reminder_enabled();
                self.scheduler.set_daily_reminder(enabled);
            }
            SettingsItem::Export => self.export_data(),
            SettingsItem::ClearData => self.confirm = Some(Confirm::ClearData),
            SettingsItem::Logout => self.confirm = Some(Confirm::Logout),
        }
    }

    fn export_data(&mut self) {
        let file_name = format!("fintrackr-export-{}.json", Local::now().format("%Y%m%d-%H%M%S"));
        let path = self.config.data_dir.join(file_name);

        self.status = Some(match export_json(self.store.state(), &path) {
            Ok(()) => format!("Exported to {}", path.display()),
            Err(err) => {
                error!("Export failed: {:#}", err);
                "Export failed, see log".to_string()
            }
        });
    }

    fn handle_notifications_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.pop(),
            KeyCode::Char('x') => self.scheduler.clear_inbox(),
            _ => {}
        }
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("UI loop failed: {:?}", err);
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fintrackr::{MemoryStorage, NotificationKind, TransactionDraft, User};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode) {
        app.handle_key(key(code));
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    pub(super) fn create_test_app() -> App<MemoryStorage> {
        let mut config = AppConfig::default();
        config.data_dir = std::env::temp_dir().join(format!("fintrackr-ui-{}", std::process::id()));
        let store = FinanceStore::open(MemoryStorage::new());
        App::new(store, config)
    }

    pub(super) fn create_logged_in_app() -> App<MemoryStorage> {
        let mut app = create_test_app();
        type_text(&mut app, "Ana");
        press(&mut app, KeyCode::Enter);
        app
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_starts_on_login_without_user() {
        let app = create_test_app();
        assert_eq!(app.current(), Screen::Login);
        assert_eq!(app.store.transactions().len(), 5);
    }

    #[test]
    fn test_login_requires_name() {
        let mut app = create_test_app();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current(), Screen::Login);
        assert_eq!(app.login_error.as_deref(), Some("Name is required"));
        assert!(app.store.user().is_none());
    }

    #[test]
    fn test_login_sets_user_and_welcomes() {
        let mut app = create_test_app();
        type_text(&mut app, "  Ana ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.stack, vec![Screen::Dashboard]);
        assert_eq!(app.store.user().map(|u| u.name.as_str()), Some("Ana"));

        app.tick_at(noon());
        assert!(app
            .scheduler
            .inbox()
            .any(|d| d.notification.kind == NotificationKind::Welcome));
        assert!(app.status.is_some());
    }

    #[test]
    fn test_navigation_stack() {
        let mut app = create_logged_in_app();

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.current(), Screen::Transactions);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.current(), Screen::Dashboard);

        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.stack, vec![Screen::Dashboard, Screen::Settings]);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_add_transaction_from_keys() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.current(), Screen::AddTransaction);

        type_text(&mut app, "Laptop");
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "150000");
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current(), Screen::Dashboard);
        let tx = &app.store.transactions()[0];
        assert_eq!(tx.title, "Laptop");
        assert_eq!(tx.amount, 1500.0);
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.category, "Food");
        assert!(app
            .scheduler
            .pending()
            .any(|n| n.kind == NotificationKind::LargeTransaction));
    }

    fn budget_alerts(app: &App<MemoryStorage>) -> usize {
        let pending = app
            .scheduler
            .pending()
            .filter(|n| n.kind == NotificationKind::BudgetAlert)
            .count();
        let delivered = app
            .scheduler
            .inbox()
            .filter(|d| d.notification.kind == NotificationKind::BudgetAlert)
            .count();
        pending + delivered
    }

    fn add_expense(app: &mut App<MemoryStorage>, title: &str, digits: &str) {
        press(app, KeyCode::Char('a'));
        type_text(app, title);
        press(app, KeyCode::Down);
        type_text(app, digits);
        press(app, KeyCode::Down);
        press(app, KeyCode::Right);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_budget_alert_checked_at_startup() {
        let mut store = FinanceStore::open(MemoryStorage::new());
        store.set_user(Some(User::new("Ana")));
        store.add_transaction(TransactionDraft {
            title: "Rent".to_string(),
            amount: 1900.0,
            kind: TransactionKind::Expense,
            category: "Housing".to_string(),
            description: None,
        });

        let mut app = App::new(store, AppConfig::default());
        app.tick();

        assert_eq!(budget_alerts(&app), 1);
    }

    #[test]
    fn test_budget_alert_raised_once_while_over_budget() {
        let mut app = create_logged_in_app();
        assert_eq!(budget_alerts(&app), 0);

        add_expense(&mut app, "Laptop", "170000");
        assert_eq!(budget_alerts(&app), 1);

        for _ in 0..3 {
            add_expense(&mut app, "Gum", "5");
        }
        assert_eq!(app.store.transactions().len(), 9);
        assert_eq!(budget_alerts(&app), 1);
    }

    #[test]
    fn test_edit_runs_large_and_budget_checks() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('t'));
        let salary = app.selected_transaction().unwrap().clone();
        assert_eq!(salary.kind, TransactionKind::Income);
        press(&mut app, KeyCode::Char('e'));

        // Kind, then amount, then a category the new kind offers
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        for _ in 0..10 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "500000");
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current(), Screen::Transactions);
        let edited = app.store.find_transaction(&salary.id).unwrap();
        assert_eq!(edited.kind, TransactionKind::Expense);
        assert_eq!(edited.amount, 5000.0);
        assert!(app
            .scheduler
            .pending()
            .any(|n| n.kind == NotificationKind::LargeTransaction));
        assert_eq!(budget_alerts(&app), 1);
    }

    #[test]
    fn test_invalid_transaction_stays_open() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current(), Screen::AddTransaction);
        assert_eq!(app.tx_editor.errors.len(), 3);
        assert_eq!(app.store.transactions().len(), 5);
    }

    #[test]
    fn test_edit_transaction() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('e'));

        assert_eq!(app.current(), Screen::AddTransaction);
        let id = app.tx_editor.editing.clone().unwrap();
        for _ in 0..20 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Paycheck");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current(), Screen::Transactions);
        assert_eq!(app.store.transactions().len(), 5);
        assert_eq!(app.store.find_transaction(&id).unwrap().title, "Paycheck");
    }

    #[test]
    fn test_delete_transaction_needs_confirmation() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('t'));

        press(&mut app, KeyCode::Char('d'));
        assert!(app.confirm.is_some());
        press(&mut app, KeyCode::Char('n'));
        assert!(app.confirm.is_none());
        assert_eq!(app.store.transactions().len(), 5);

        press(&mut app, KeyCode::Down);
        let doomed = app.selected_transaction().unwrap().id.clone();
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.store.transactions().len(), 4);
        assert!(app.store.find_transaction(&doomed).is_none());
    }

    #[test]
    fn test_search_and_filters() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('t'));

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "NET");
        press(&mut app, KeyCode::Enter);
        assert!(!app.searching);
        let titles: Vec<_> = app.visible_transactions().iter().map(|t| t.title.clone()).collect();
        assert_eq!(titles, vec!["Netflix"]);

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.filter.kind, Some(TransactionKind::Income));
        assert_eq!(app.visible_transactions().len(), 2);

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.filter.category.as_deref(), Some("Food"));
        assert_eq!(app.visible_transactions().len(), 1);
    }

    #[test]
    fn test_add_goal_and_contribute_to_target() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('g'));

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Bike");
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "1000");
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "2030-01-01");
        press(&mut app, KeyCode::Enter);

        assert!(app.goal_overlay.is_none());
        assert_eq!(app.store.goals().len(), 3);
        assert_eq!(app.selected_goal().unwrap().title, "Bike");

        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "1000");
        press(&mut app, KeyCode::Enter);

        let goal = app.selected_goal().unwrap();
        assert_eq!(goal.current_amount, 1000.0);
        assert!(goal.is_achieved());
        assert!(app
            .scheduler
            .pending()
            .any(|n| n.kind == NotificationKind::GoalAchieved));
    }

    #[test]
    fn test_goal_form_errors_keep_overlay() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);

        match &app.goal_overlay {
            Some(GoalOverlay::Form(editor)) => assert_eq!(editor.errors.len(), 3),
            other => panic!("expected goal form, got {:?}", other),
        }
        press(&mut app, KeyCode::Esc);
        assert!(app.goal_overlay.is_none());
        assert_eq!(app.current(), Screen::Goals);
    }

    #[test]
    fn test_bad_contribution_shows_error() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "abc");
        press(&mut app, KeyCode::Enter);

        match &app.goal_overlay {
            Some(GoalOverlay::Contribute(prompt)) => {
                assert_eq!(prompt.error.as_deref(), Some("Amount must be a number"))
            }
            other => panic!("expected contribution prompt, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_goal() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.store.goals().len(), 1);
        assert_eq!(app.goal_selected, 0);
    }

    #[test]
    fn test_settings_toggles() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('s'));

        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_setting(), SettingsItem::DailyReminder);
        press(&mut app, KeyCode::Enter);
        assert!(!app.scheduler.daily_reminder_enabled());
        assert!(!app
            .scheduler
            .pending()
            .any(|n| n.kind == NotificationKind::DailyReminder));

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert!(!app.scheduler.is_enabled());
        assert_eq!(app.scheduler.pending().count(), 0);
    }

    #[test]
    fn test_logout_returns_to_login() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_setting(), SettingsItem::Logout);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.confirm, Some(Confirm::Logout));
        press(&mut app, KeyCode::Char('y'));

        assert_eq!(app.stack, vec![Screen::Login]);
        assert!(app.store.user().is_none());
        assert_eq!(app.store.transactions().len(), 5);
    }

    #[test]
    fn test_clear_data_wipes_everything() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_setting(), SettingsItem::ClearData);

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.stack, vec![Screen::Login]);
        assert!(app.store.user().is_none());
        assert!(app.store.transactions().is_empty());
        assert!(app.store.goals().is_empty());
    }

    #[test]
    fn test_notifications_screen_marks_read() {
        let mut app = create_logged_in_app();
        app.tick_at(noon());
        assert!(app.scheduler.unread() > 0);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.current(), Screen::Notifications);
        assert_eq!(app.scheduler.unread(), 0);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.scheduler.inbox_len(), 0);
    }

    #[test]
    fn test_delivery_while_viewing_notifications_is_read() {
        let mut app = create_logged_in_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.current(), Screen::Notifications);

        app.tick_at(noon());
        assert!(app.scheduler.inbox_len() > 0);
        assert_eq!(app.scheduler.unread(), 0);
    }

    #[test]
    fn test_ctrl_c_quits_from_text_input() {
        let mut app = create_test_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.login.name.is_empty());
    }
}
