// ABOUTME: Terminal application state for MSSQL Manager
// ABOUTME: Tabs, focus, key handling, and applying worker replies to what is shown

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::commands;
use crate::config::{ConfigError, Language, Settings, Theme};
use crate::error::ActionError;
use crate::forms::InsertForm;
use crate::i18n::{self, fill, Strings};
use crate::render::ResultView;
use crate::sql::{self, ColumnDefinition, TableDesign, ValidationError, DESIGNER_TYPES};
use crate::ActionResponse;

use super::draw;
use super::input::{edit_text, TextInput};
use super::worker::{DbEvent, DbRequest, ResultSource, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Connection,
    Tables,
    Insert,
    View,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Connection,
        Tab::Tables,
        Tab::Insert,
        Tab::View,
        Tab::Settings,
    ];

    pub fn index(self) -> usize {
        match self {
            Tab::Connection => 0,
            Tab::Tables => 1,
            Tab::Insert => 2,
            Tab::View => 3,
            Tab::Settings => 4,
        }
    }

    pub fn title(self, s: &Strings) -> &'static str {
        match self {
            Tab::Connection => s.connection,
            Tab::Tables => s.table_management,
            Tab::Insert => s.insert_data,
            Tab::View => s.view_data,
            Tab::Settings => s.settings,
        }
    }
}

/// Everything on screen that can take focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Server,
    Database,
    Connect,
    CreateDatabase,
    Disconnect,

    TableName,
    ColumnName(usize),
    ColumnType(usize),
    PrimaryKey(usize),
    NotNull(usize),
    RemoveColumn(usize),
    AddColumn,
    CreateTable,
    DeleteTable,
    RefreshTables,
    TableList,

    InsertTable,
    Field(usize),
    InsertRow,
    RefreshInsert,

    ViewTableSelect,
    ViewTable,
    RefreshView,
    Query,
    Execute,
    Results,

    Theme,
    Language,
    SaveSettings,
}

/// Status label on the connection tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    NotConnected,
    Connected,
    Disconnected,
    Failed,
    DatabaseCreated(String),
    CreationFailed,
}

impl ConnectionStatus {
    pub fn label(&self, s: &Strings) -> String {
        match self {
            ConnectionStatus::NotConnected => s.not_connected.to_string(),
            ConnectionStatus::Connected => s.connected.to_string(),
            ConnectionStatus::Disconnected => s.disconnected.to_string(),
            ConnectionStatus::Failed => s.connection_failed.to_string(),
            ConnectionStatus::DatabaseCreated(name) => fill(s.database_created, &[name]),
            ConnectionStatus::CreationFailed => s.creation_failed.to_string(),
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connected | ConnectionStatus::DatabaseCreated(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// Modal message; blocks other input until dismissed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// One column row of the table designer
#[derive(Debug, Clone, Default)]
pub struct DesignRow {
    pub name: TextInput,
    pub type_index: usize,
    pub primary_key: bool,
    pub not_null: bool,
}

impl DesignRow {
    pub fn data_type(&self) -> &'static str {
        DESIGNER_TYPES[self.type_index % DESIGNER_TYPES.len()]
    }

    fn to_definition(&self) -> ColumnDefinition {
        ColumnDefinition {
            name: self.name.value.clone(),
            data_type: self.data_type().to_string(),
            primary_key: self.primary_key,
            not_null: self.not_null,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectionTab {
    pub server: TextInput,
    pub database: TextInput,
}

#[derive(Debug)]
pub struct TablesTab {
    pub name: TextInput,
    pub rows: Vec<DesignRow>,
    pub list: ListState,
}

impl Default for TablesTab {
    fn default() -> Self {
        Self {
            name: TextInput::default(),
            rows: vec![DesignRow::default()],
            list: ListState::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InsertTab {
    pub table: Option<String>,
    pub form: Option<InsertForm>,
    /// Cursor per form field, parallel to `form.fields`
    pub cursors: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct ViewTab {
    pub table: Option<String>,
    pub query: TextInput,
    pub result: Option<ResultView>,
    pub message: Option<String>,
}

pub struct App {
    pub settings: Settings,
    /// `None` when no config directory exists; changes then live only in memory
    settings_path: Option<PathBuf>,
    pub identity: String,

    pub tab: Tab,
    focus: [usize; 5],

    pub connected: bool,
    pub status: ConnectionStatus,
    pub tables: Vec<String>,

    pub connection: ConnectionTab,
    pub designer: TablesTab,
    pub insert: InsertTab,
    pub view: ViewTab,

    pub notice: Option<Notice>,
    /// Last notice, kept for the status bar after the popup is dismissed
    pub last_notice: Option<Notice>,
    pub confirm_drop: Option<String>,
    pub server_version: Option<String>,

    requests: mpsc::UnboundedSender<(Ticket, DbRequest)>,
    events: mpsc::UnboundedReceiver<(Ticket, DbEvent)>,
    next_ticket: Ticket,
    pub in_flight: usize,
    form_ticket: Option<Ticket>,
    /// Pending insert and the table it was submitted for
    insert_ticket: Option<(Ticket, String)>,
    result_ticket: Option<Ticket>,
    tables_ticket: Ticket,
}

impl App {
    pub fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        requests: mpsc::UnboundedSender<(Ticket, DbRequest)>,
        events: mpsc::UnboundedReceiver<(Ticket, DbEvent)>,
    ) -> Self {
        Self {
            settings,
            settings_path,
            identity: commands::current_identity(),
            tab: Tab::Connection,
            focus: [0; 5],
            connected: false,
            status: ConnectionStatus::NotConnected,
            tables: Vec::new(),
            connection: ConnectionTab::default(),
            designer: TablesTab::default(),
            insert: InsertTab::default(),
            view: ViewTab::default(),
            notice: None,
            last_notice: None,
            confirm_drop: None,
            server_version: None,
            requests,
            events,
            next_ticket: 0,
            in_flight: 0,
            form_ticket: None,
            insert_ticket: None,
            result_ticket: None,
            tables_ticket: 0,
        }
    }

    pub fn strings(&self) -> &'static Strings {
        i18n::strings(self.settings.language)
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.drain_db_events();

            terminal.draw(|frame| draw::draw(frame, self))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.on_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn submit(&mut self, request: DbRequest) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        if self.requests.send((ticket, request)).is_err() {
            log::error!("Database worker is gone; request {} dropped", ticket);
            self.show(NoticeKind::Error, "Database worker stopped".to_string());
        } else {
            self.in_flight += 1;
        }
        ticket
    }

    fn show(&mut self, kind: NoticeKind, message: String) {
        let notice = Notice { kind, message };
        self.last_notice = Some(notice.clone());
        self.notice = Some(notice);
    }

    fn show_failure<T>(&mut self, response: &ActionResponse<T>) {
        if let Some(message) = response.error_message() {
            self.show(NoticeKind::Error, message);
        }
    }

    // Focus

    pub fn targets(&self) -> Vec<Target> {
        match self.tab {
            Tab::Connection => vec![
                Target::Server,
                Target::Database,
                Target::Connect,
                Target::CreateDatabase,
                Target::Disconnect,
            ],
            Tab::Tables => {
                let mut targets = vec![Target::TableName];
                for i in 0..self.designer.rows.len() {
                    targets.extend([
                        Target::ColumnName(i),
                        Target::ColumnType(i),
                        Target::PrimaryKey(i),
                        Target::NotNull(i),
                        Target::RemoveColumn(i),
                    ]);
                }
                targets.extend([
                    Target::AddColumn,
                    Target::CreateTable,
                    Target::DeleteTable,
                    Target::RefreshTables,
                    Target::TableList,
                ]);
                targets
            }
            Tab::Insert => {
                let fields = self.insert.form.as_ref().map_or(0, |f| f.fields.len());
                let mut targets = vec![Target::InsertTable];
                targets.extend((0..fields).map(Target::Field));
                targets.extend([Target::InsertRow, Target::RefreshInsert]);
                targets
            }
            Tab::View => vec![
                Target::ViewTableSelect,
                Target::ViewTable,
                Target::RefreshView,
                Target::Query,
                Target::Execute,
                Target::Results,
            ],
            Tab::Settings => vec![Target::Theme, Target::Language, Target::SaveSettings],
        }
    }

    pub fn focused(&self) -> Target {
        let targets = self.targets();
        let index = self.focus[self.tab.index()].min(targets.len() - 1);
        targets[index]
    }

    fn move_focus(&mut self, delta: isize) {
        let count = self.targets().len() as isize;
        let slot = &mut self.focus[self.tab.index()];
        let current = (*slot as isize).min(count - 1);
        *slot = (current + delta).rem_euclid(count) as usize;
    }

    fn focus_on(&mut self, target: Target) {
        if let Some(index) = self.targets().iter().position(|t| *t == target) {
            self.focus[self.tab.index()] = index;
        }
    }

    // Keys

    /// Handle one key press; returns true when the app should quit
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
            return true;
        }

        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return false;
        }

        if let Some(table) = self.confirm_drop.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_drop = None;
                    self.tables_ticket = self.submit(DbRequest::DropTable {
                        table,
                        confirmed: true,
                    });
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_drop = None;
                }
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::F(n @ 1..=5) => {
                self.tab = Tab::ALL[usize::from(n) - 1];
                return false;
            }
            KeyCode::Char('r') if ctrl => {
                if self.tab == Tab::View {
                    self.execute_query();
                }
                return false;
            }
            KeyCode::Tab => {
                self.move_focus(1);
                return false;
            }
            KeyCode::BackTab => {
                self.move_focus(-1);
                return false;
            }
            _ => {}
        }

        let target = self.focused();
        self.on_target_key(target, key);
        false
    }

    fn on_target_key(&mut self, target: Target, key: KeyEvent) {
        match target {
            Target::Server => self.on_text_key(key, |app| &mut app.connection.server),
            Target::Database => self.on_text_key(key, |app| &mut app.connection.database),
            Target::TableName => self.on_text_key(key, |app| &mut app.designer.name),
            Target::ColumnName(i) => self.on_text_key(key, move |app| &mut app.designer.rows[i].name),

            Target::ColumnType(i) => match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                    let row = &mut self.designer.rows[i];
                    let n = DESIGNER_TYPES.len();
                    row.type_index = if key.code == KeyCode::Left {
                        (row.type_index + n - 1) % n
                    } else {
                        (row.type_index + 1) % n
                    };
                }
                _ => self.on_nav_key(key),
            },
            Target::PrimaryKey(i) | Target::NotNull(i) => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    let row = &mut self.designer.rows[i];
                    if matches!(target, Target::PrimaryKey(_)) {
                        row.primary_key = !row.primary_key;
                    } else {
                        row.not_null = !row.not_null;
                    }
                }
                _ => self.on_nav_key(key),
            },

            Target::TableList => match key.code {
                KeyCode::Up => self.designer.list.select_previous(),
                KeyCode::Down => {
                    if self.designer.list.selected().map_or(true, |i| i + 1 < self.tables.len()) {
                        self.designer.list.select_next();
                    }
                }
                KeyCode::Enter => {
                    let picked = self
                        .designer
                        .list
                        .selected()
                        .and_then(|i| self.tables.get(i))
                        .cloned();
                    if let Some(name) = picked {
                        self.designer.name = TextInput::new(&name);
                    }
                }
                _ => {}
            },

            Target::InsertTable | Target::ViewTableSelect => match key.code {
                KeyCode::Left | KeyCode::Right => {
                    let forward = key.code == KeyCode::Right;
                    if target == Target::InsertTable {
                        let next = cycle(&self.tables, self.insert.table.as_deref(), forward);
                        if let Some(name) = next {
                            self.select_insert_table(name);
                        }
                    } else {
                        self.view.table =
                            cycle(&self.tables, self.view.table.as_deref(), forward);
                    }
                }
                KeyCode::Enter if target == Target::ViewTableSelect => self.view_table(),
                _ => self.on_nav_key(key),
            },

            Target::Field(i) => self.on_field_key(i, key),

            Target::Query => match key.code {
                KeyCode::Up | KeyCode::Down => self.on_nav_key(key),
                _ => {
                    self.view.query.handle_key_multiline(key);
                }
            },

            Target::Results => {
                if let Some(result) = self.view.result.as_mut() {
                    result.handle_key(key);
                }
            }

            Target::Theme | Target::Language => match key.code {
                KeyCode::Left | KeyCode::Right => {
                    let forward = key.code == KeyCode::Right;
                    if target == Target::Theme {
                        self.settings.theme = step(&Theme::ALL, self.settings.theme, forward);
                    } else {
                        self.settings.language =
                            step(&Language::ALL, self.settings.language, forward);
                    }
                    self.persist_settings();
                }
                _ => self.on_nav_key(key),
            },

            // Buttons
            _ => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.activate(target),
                _ => self.on_nav_key(key),
            },
        }
    }

    fn on_nav_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down => self.move_focus(1),
            KeyCode::Up => self.move_focus(-1),
            _ => {}
        }
    }

    fn on_text_key(&mut self, key: KeyEvent, input: impl FnOnce(&mut App) -> &mut TextInput) {
        match key.code {
            KeyCode::Enter | KeyCode::Down => self.move_focus(1),
            KeyCode::Up => self.move_focus(-1),
            _ => {
                input(self).handle_key(key);
            }
        }
    }

    fn on_field_key(&mut self, index: usize, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Down => return self.move_focus(1),
            KeyCode::Up => return self.move_focus(-1),
            _ => {}
        }

        let Some(field) = self
            .insert
            .form
            .as_mut()
            .and_then(|form| form.fields.get_mut(index))
        else {
            return;
        };

        if field.input.text().is_none() {
            if key.code == KeyCode::Char(' ') {
                field.input.toggle();
            }
            return;
        }
        if let (Some(text), Some(cursor)) =
            (field.input.text_mut(), self.insert.cursors.get_mut(index))
        {
            edit_text(text, cursor, key, false);
        }
    }

    // Actions

    fn activate(&mut self, target: Target) {
        match target {
            Target::Connect => self.connect(),
            Target::CreateDatabase => {
                self.submit(DbRequest::CreateDatabase {
                    server: self.connection.server.value.clone(),
                    database: self.connection.database.value.clone(),
                });
            }
            Target::Disconnect => {
                if self.connected {
                    self.submit(DbRequest::Disconnect);
                } else {
                    self.show(NoticeKind::Info, self.strings().not_connected_info.to_string());
                }
            }
            Target::RemoveColumn(i) => {
                if i < self.designer.rows.len() {
                    self.designer.rows.remove(i);
                }
            }
            Target::AddColumn => {
                self.designer.rows.push(DesignRow::default());
                let last = self.designer.rows.len() - 1;
                self.focus_on(Target::ColumnName(last));
            }
            Target::CreateTable => self.create_table(),
            Target::DeleteTable => self.request_drop(),
            Target::RefreshTables | Target::RefreshInsert | Target::RefreshView => {
                self.tables_ticket = self.submit(DbRequest::ListTables);
            }
            Target::InsertRow => self.insert_row(),
            Target::ViewTable => self.view_table(),
            Target::Execute => self.execute_query(),
            Target::SaveSettings => {
                if self.persist_settings() {
                    self.show(NoticeKind::Success, self.strings().settings_saved.to_string());
                }
            }
            _ => {}
        }
    }

    fn connect(&mut self) {
        if self.connected {
            self.show(NoticeKind::Error, ValidationError::AlreadyConnected.to_string());
            return;
        }
        self.tables_ticket = self.submit(DbRequest::Connect {
            server: self.connection.server.value.clone(),
            database: self.connection.database.value.clone(),
        });
    }

    fn create_table(&mut self) {
        let design = TableDesign {
            name: self.designer.name.value.clone(),
            columns: self.designer.rows.iter().map(DesignRow::to_definition).collect(),
        };
        self.tables_ticket = self.submit(DbRequest::CreateTable(design));
    }

    fn request_drop(&mut self) {
        if !self.connected {
            self.show(NoticeKind::Error, ActionError::NotConnected.to_string());
            return;
        }
        let name = self.designer.name.value.trim().to_string();
        match sql::drop_table_sql(&name) {
            Ok(_) => self.confirm_drop = Some(name),
            Err(e) => self.show(NoticeKind::Error, e.to_string()),
        }
    }

    fn select_insert_table(&mut self, name: String) {
        self.insert.form = None;
        self.insert.cursors.clear();
        self.insert.table = Some(name.clone());
        self.form_ticket = Some(self.submit(DbRequest::LoadForm(name)));
    }

    /// Save settings, showing the error on failure; the in-memory copy is kept either way
    fn persist_settings(&mut self) -> bool {
        let response = match self.settings_path.as_deref() {
            Some(path) => commands::save_settings(path, self.settings),
            None => ActionResponse::error(format!(
                "Failed to save settings: {}",
                ConfigError::NoDirFound
            )),
        };
        self.show_failure(&response);
        response.success
    }

    fn insert_row(&mut self) {
        match self.insert.form.clone() {
            Some(form) => {
                let table = form.table.clone();
                let ticket = self.submit(DbRequest::Insert(form));
                self.insert_ticket = Some((ticket, table));
            }
            None => self.show(NoticeKind::Error, self.strings().no_table_selected.to_string()),
        }
    }

    fn view_table(&mut self) {
        match self.view.table.clone() {
            Some(table) => self.result_ticket = Some(self.submit(DbRequest::ViewTable(table))),
            None => self.show(NoticeKind::Error, self.strings().no_table_selected.to_string()),
        }
    }

    fn execute_query(&mut self) {
        let query = self.view.query.value.clone();
        self.result_ticket = Some(self.submit(DbRequest::RunQuery(query)));
    }

    // Worker replies

    pub fn drain_db_events(&mut self) {
        while let Ok((ticket, event)) = self.events.try_recv() {
            self.apply_db_event(ticket, event);
        }
    }

    fn apply_db_event(&mut self, ticket: Ticket, event: DbEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let s = self.strings();

        match event {
            DbEvent::Connected(response) => match response.data {
                Some(info) => {
                    self.connected = true;
                    self.status = ConnectionStatus::Connected;
                    let mut message = fill(s.connected_to, &[&info.database, &info.server]);
                    for warning in &response.messages.warning {
                        message.push('\n');
                        message.push_str(warning);
                    }
                    log::info!(
                        "Connected to {} on {} ({})",
                        info.database,
                        info.server,
                        info.sql_server_version
                    );
                    self.server_version = Some(info.sql_server_version);
                    self.apply_tables(ticket, info.tables);
                    self.show(NoticeKind::Success, message);
                }
                None => {
                    if !self.connected {
                        self.status = ConnectionStatus::Failed;
                    }
                    self.show_failure(&response);
                }
            },
            DbEvent::Disconnected(response) => {
                // The worker holds no connection after a disconnect, whatever the reply
                self.connected = false;
                self.clear_connection_state();
                if response.success {
                    self.status = ConnectionStatus::Disconnected;
                    self.show(NoticeKind::Info, s.disconnected.to_string());
                } else {
                    self.status = ConnectionStatus::NotConnected;
                    self.show(NoticeKind::Info, s.not_connected_info.to_string());
                }
            }
            DbEvent::DatabaseCreated(response) => match response.data {
                Some(name) => {
                    self.show(NoticeKind::Success, fill(s.database_created, &[&name]));
                    self.status = ConnectionStatus::DatabaseCreated(name);
                }
                None => {
                    self.status = ConnectionStatus::CreationFailed;
                    self.show_failure(&response);
                }
            },
            DbEvent::TablesListed(response) => match response.data {
                Some(tables) => self.apply_tables(ticket, tables),
                None => self.show_failure(&response),
            },
            DbEvent::TableCreated(response) => match response.data {
                Some(change) => {
                    self.show(NoticeKind::Success, fill(s.table_created, &[&change.table]));
                    self.designer.name.clear();
                    self.designer.rows = vec![DesignRow::default()];
                    self.apply_tables(ticket, change.tables);
                }
                None => self.show_failure(&response),
            },
            DbEvent::TableDropped(response) => match response.data {
                Some(change) => {
                    self.show(NoticeKind::Success, fill(s.table_deleted, &[&change.table]));
                    self.designer.name.clear();
                    self.apply_tables(ticket, change.tables);
                }
                None => self.show_failure(&response),
            },
            DbEvent::FormLoaded(response) => {
                if self.form_ticket != Some(ticket) {
                    log::debug!("Discarding stale form for request {}", ticket);
                    return;
                }
                self.form_ticket = None;
                match response.data {
                    Some(form) if self.insert.table.as_deref() == Some(form.table.as_str()) => {
                        self.insert.cursors = vec![0; form.fields.len()];
                        self.insert.form = Some(form);
                    }
                    Some(_) => {}
                    None => self.show_failure(&response),
                }
            }
            DbEvent::Inserted(response) => {
                let submitted = match self.insert_ticket.take() {
                    Some((pending, table)) if pending == ticket => Some(table),
                    other => {
                        self.insert_ticket = other;
                        None
                    }
                };
                if response.success {
                    match self.insert.form.as_mut() {
                        Some(form) if submitted.as_deref() == Some(form.table.as_str()) => {
                            form.clear();
                            self.insert.cursors.iter_mut().for_each(|c| *c = 0);
                        }
                        _ => log::debug!("Keeping form; insert {} was for another table", ticket),
                    }
                    self.show(NoticeKind::Success, s.data_inserted.to_string());
                } else {
                    self.show_failure(&response);
                }
            }
            DbEvent::ResultLoaded { source, response } => {
                if self.result_ticket != Some(ticket) {
                    log::debug!("Discarding stale result for request {}", ticket);
                    return;
                }
                self.result_ticket = None;
                match response.data {
                    Some(result) => {
                        let count = result.row_count();
                        self.view.message = Some(match source {
                            ResultSource::Table(table) => fill(s.displaying_rows, &[&count, &table]),
                            ResultSource::Query => fill(s.query_executed, &[&count]),
                        });
                        self.view.result = Some(ResultView::new(result));
                    }
                    None => {
                        self.view.message = None;
                        self.show(
                            NoticeKind::Error,
                            response.error_message().unwrap_or_default(),
                        );
                    }
                }
            }
        }
    }

    /// Replace the table list unless a newer list is already shown
    fn apply_tables(&mut self, ticket: Ticket, tables: Vec<String>) {
        if ticket < self.tables_ticket {
            log::debug!("Discarding stale table list for request {}", ticket);
            return;
        }
        self.tables_ticket = ticket;
        self.tables = tables;

        if let Some(name) = self.insert.table.as_deref() {
            if !self.tables.iter().any(|t| t == name) {
                self.insert.table = None;
                self.insert.form = None;
                self.insert.cursors.clear();
                self.form_ticket = None;
            }
        }
        if let Some(name) = self.view.table.as_deref() {
            if !self.tables.iter().any(|t| t == name) {
                self.view.table = None;
            }
        }
        match self.designer.list.selected() {
            Some(_) if self.tables.is_empty() => self.designer.list.select(None),
            Some(i) if i >= self.tables.len() => {
                self.designer.list.select(Some(self.tables.len() - 1))
            }
            _ => {}
        }
    }

    fn clear_connection_state(&mut self) {
        self.server_version = None;
        self.tables.clear();
        self.designer.list.select(None);
        self.insert = InsertTab::default();
        self.form_ticket = None;
        self.insert_ticket = None;
        self.view.table = None;
        self.view.result = None;
        self.view.message = None;
        self.result_ticket = None;
    }
}

/// Next or previous entry after `current`; starts at the first entry when nothing is selected
fn cycle(items: &[String], current: Option<&str>, forward: bool) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let n = items.len();
    let index = match current.and_then(|c| items.iter().position(|i| i == c)) {
        Some(i) if forward => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
        None => 0,
    };
    Some(items[index].clone())
}

fn step<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let n = all.len();
    let i = all.iter().position(|v| *v == current).unwrap_or(0);
    if forward {
        all[(i + 1) % n]
    } else {
        all[(i + n - 1) % n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ConnectionInfo, TableChange};
    use crate::forms::FieldInput;
    use crate::models::{ColumnDescriptor, ResultColumn, ResultSet};
    use tempfile::{tempdir, TempDir};

    struct Harness {
        app: App,
        requests: mpsc::UnboundedReceiver<(Ticket, DbRequest)>,
        events: mpsc::UnboundedSender<(Ticket, DbEvent)>,
        _dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let (req_tx, req_rx) = mpsc::unbounded_channel();
            let (ev_tx, ev_rx) = mpsc::unbounded_channel();
            let app = App::new(
                Settings::default(),
                Some(dir.path().join("settings.json")),
                req_tx,
                ev_rx,
            );
            Self {
                app,
                requests: req_rx,
                events: ev_tx,
                _dir: dir,
            }
        }

        fn press(&mut self, code: KeyCode) {
            self.app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        fn next_request(&mut self) -> (Ticket, DbRequest) {
            self.requests.try_recv().expect("a request was sent")
        }

        fn reply(&mut self, ticket: Ticket, event: DbEvent) {
            self.events.send((ticket, event)).unwrap();
            self.app.drain_db_events();
        }

        fn connect(&mut self, tables: &[&str]) {
            self.app.connection.server = TextInput::new("localhost");
            self.app.connection.database = TextInput::new("Shop");
            self.app.activate(Target::Connect);
            let (ticket, _) = self.next_request();
            let info = ConnectionInfo {
                server: "localhost".into(),
                database: "Shop".into(),
                sql_server_version: "16.0".into(),
                tables: tables.iter().map(|t| t.to_string()).collect(),
            };
            self.reply(ticket, DbEvent::Connected(ActionResponse::success(info)));
            self.app.notice = None;
        }
    }

    fn users_form(table: &str) -> InsertForm {
        InsertForm::new(
            table,
            vec![
                ColumnDescriptor {
                    name: "Id".into(),
                    sql_type: "int".into(),
                    nullable: false,
                    ordinal_position: 1,
                },
                ColumnDescriptor {
                    name: "Active".into(),
                    sql_type: "bit".into(),
                    nullable: true,
                    ordinal_position: 2,
                },
            ],
        )
    }

    fn one_row_result() -> ResultSet {
        ResultSet {
            columns: vec![ResultColumn {
                name: "x".into(),
                sql_type: None,
            }],
            rows: vec![vec![Some("1".into())]],
        }
    }

    #[test]
    fn test_function_keys_switch_tabs() {
        let mut h = Harness::new();
        h.press(KeyCode::F(4));
        assert_eq!(h.app.tab, Tab::View);
        h.press(KeyCode::F(1));
        assert_eq!(h.app.tab, Tab::Connection);
    }

    #[test]
    fn test_tab_cycles_focus_and_wraps() {
        let mut h = Harness::new();
        assert_eq!(h.app.focused(), Target::Server);
        h.press(KeyCode::Tab);
        assert_eq!(h.app.focused(), Target::Database);
        h.press(KeyCode::BackTab);
        h.press(KeyCode::BackTab);
        assert_eq!(h.app.focused(), Target::Disconnect);
    }

    #[test]
    fn test_connect_success_shows_tables() {
        let mut h = Harness::new();
        h.type_text("localhost");
        h.press(KeyCode::Tab);
        h.type_text("Shop");
        h.app.activate(Target::Connect);

        let (ticket, request) = h.next_request();
        match request {
            DbRequest::Connect { server, database } => {
                assert_eq!(server, "localhost");
                assert_eq!(database, "Shop");
            }
            other => panic!("unexpected request {:?}", other),
        }
        assert_eq!(h.app.in_flight, 1);

        let info = ConnectionInfo {
            server: "localhost".into(),
            database: "Shop".into(),
            sql_server_version: "16.0".into(),
            tables: vec!["Orders".into(), "Users".into()],
        };
        h.reply(ticket, DbEvent::Connected(ActionResponse::success(info)));

        assert!(h.app.connected);
        assert_eq!(h.app.status, ConnectionStatus::Connected);
        assert_eq!(h.app.tables, vec!["Orders", "Users"]);
        assert_eq!(h.app.in_flight, 0);
        let notice = h.app.notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.message, "Successfully connected to Shop on localhost!");
    }

    #[test]
    fn test_connect_failure_sets_status() {
        let mut h = Harness::new();
        h.app.activate(Target::Connect);
        let (ticket, _) = h.next_request();
        h.reply(
            ticket,
            DbEvent::Connected(ActionResponse::error("Failed to connect: refused".into())),
        );
        assert!(!h.app.connected);
        assert_eq!(h.app.status, ConnectionStatus::Failed);
        assert_eq!(h.app.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_notice_blocks_input_until_dismissed() {
        let mut h = Harness::new();
        h.app.activate(Target::Disconnect);
        assert!(h.requests.try_recv().is_err());
        assert_eq!(h.app.notice.as_ref().unwrap().kind, NoticeKind::Info);

        h.press(KeyCode::F(3));
        assert_eq!(h.app.tab, Tab::Connection);
        h.press(KeyCode::Enter);
        assert!(h.app.notice.is_none());
    }

    #[test]
    fn test_stale_form_reply_is_discarded() {
        let mut h = Harness::new();
        h.connect(&["Orders", "Users"]);
        h.press(KeyCode::F(3));
        assert_eq!(h.app.focused(), Target::InsertTable);

        h.press(KeyCode::Right);
        let (first, _) = h.next_request();
        h.press(KeyCode::Right);
        let (second, request) = h.next_request();
        assert!(matches!(request, DbRequest::LoadForm(ref t) if t == "Users"));

        h.reply(first, DbEvent::FormLoaded(ActionResponse::success(users_form("Orders"))));
        assert!(h.app.insert.form.is_none());

        h.reply(second, DbEvent::FormLoaded(ActionResponse::success(users_form("Users"))));
        let form = h.app.insert.form.as_ref().unwrap();
        assert_eq!(form.table, "Users");
        assert_eq!(h.app.insert.cursors.len(), 2);
    }

    #[test]
    fn test_editing_form_fields() {
        let mut h = Harness::new();
        h.connect(&["Users"]);
        h.press(KeyCode::F(3));
        h.press(KeyCode::Right);
        let (ticket, _) = h.next_request();
        h.reply(ticket, DbEvent::FormLoaded(ActionResponse::success(users_form("Users"))));

        h.press(KeyCode::Tab);
        assert_eq!(h.app.focused(), Target::Field(0));
        h.type_text("42");
        h.press(KeyCode::Tab);
        h.press(KeyCode::Char(' '));

        let form = h.app.insert.form.as_ref().unwrap();
        assert_eq!(form.fields[0].input, FieldInput::Number("42".into()));
        assert_eq!(form.fields[1].input, FieldInput::Boolean(true));

        h.press(KeyCode::Tab);
        assert_eq!(h.app.focused(), Target::InsertRow);
        h.press(KeyCode::Enter);
        let (ticket, request) = h.next_request();
        assert!(matches!(request, DbRequest::Insert(_)));

        h.reply(ticket, DbEvent::Inserted(ActionResponse::success(1)));
        let form = h.app.insert.form.as_ref().unwrap();
        assert_eq!(form.fields[0].input, FieldInput::Number(String::new()));
        assert_eq!(form.fields[1].input, FieldInput::Boolean(false));
        assert_eq!(h.app.notice.as_ref().unwrap().message, "Data inserted successfully!");
    }

    #[test]
    fn test_insert_without_table() {
        let mut h = Harness::new();
        h.app.tab = Tab::Insert;
        h.app.activate(Target::InsertRow);
        assert!(h.requests.try_recv().is_err());
        assert_eq!(h.app.notice.as_ref().unwrap().message, "Please select a table!");
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut h = Harness::new();
        h.connect(&["Users"]);
        h.app.tab = Tab::View;
        h.app.view.query = TextInput::new("SELECT 1 AS x");

        h.app.activate(Target::Execute);
        let (first, _) = h.next_request();
        h.app.activate(Target::Execute);
        let (second, _) = h.next_request();

        h.reply(
            first,
            DbEvent::ResultLoaded {
                source: ResultSource::Query,
                response: ActionResponse::success(ResultSet::default()),
            },
        );
        assert!(h.app.view.result.is_none());

        h.reply(
            second,
            DbEvent::ResultLoaded {
                source: ResultSource::Query,
                response: ActionResponse::success(one_row_result()),
            },
        );
        let view = h.app.view.result.as_ref().unwrap();
        assert_eq!(view.headers, vec!["x"]);
        assert_eq!(
            h.app.view.message.as_deref(),
            Some("Query executed successfully. 1 rows returned.")
        );
    }

    #[test]
    fn test_ctrl_r_runs_query_on_view_tab() {
        let mut h = Harness::new();
        h.app.tab = Tab::View;
        h.app.on_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        let (_, request) = h.next_request();
        assert!(matches!(request, DbRequest::RunQuery(_)));
    }

    #[test]
    fn test_drop_requires_confirmation() {
        let mut h = Harness::new();
        h.connect(&["Users"]);
        h.app.tab = Tab::Tables;
        h.app.designer.name = TextInput::new("Users");

        h.app.activate(Target::DeleteTable);
        assert_eq!(h.app.confirm_drop.as_deref(), Some("Users"));
        h.press(KeyCode::Char('n'));
        assert!(h.app.confirm_drop.is_none());
        assert!(h.requests.try_recv().is_err());

        h.app.activate(Target::DeleteTable);
        h.press(KeyCode::Char('y'));
        let (ticket, request) = h.next_request();
        match request {
            DbRequest::DropTable { table, confirmed } => {
                assert_eq!(table, "Users");
                assert!(confirmed);
            }
            other => panic!("unexpected request {:?}", other),
        }

        let change = TableChange {
            table: "Users".into(),
            tables: vec![],
        };
        h.reply(ticket, DbEvent::TableDropped(ActionResponse::success(change)));
        assert!(h.app.tables.is_empty());
        assert_eq!(
            h.app.notice.as_ref().unwrap().message,
            "Table Users deleted successfully!"
        );
    }

    #[test]
    fn test_drop_with_empty_name_is_rejected() {
        let mut h = Harness::new();
        h.connect(&[]);
        h.app.activate(Target::DeleteTable);
        assert!(h.app.confirm_drop.is_none());
        assert_eq!(h.app.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_designer_builds_table_design() {
        let mut h = Harness::new();
        h.app.tab = Tab::Tables;
        h.type_text("Users");
        h.press(KeyCode::Tab);
        h.type_text("Id");
        h.press(KeyCode::Tab);
        assert_eq!(h.app.focused(), Target::ColumnType(0));
        h.press(KeyCode::Tab);
        h.press(KeyCode::Char(' '));

        h.app.activate(Target::AddColumn);
        assert_eq!(h.app.focused(), Target::ColumnName(1));
        h.type_text("Name");
        h.press(KeyCode::Tab);
        h.press(KeyCode::Right);
        assert_eq!(h.app.designer.rows[1].data_type(), "VARCHAR(50)");

        h.app.activate(Target::CreateTable);
        let (_, request) = h.next_request();
        let DbRequest::CreateTable(design) = request else {
            panic!("expected a create table request");
        };
        assert_eq!(
            design.to_sql().unwrap(),
            "CREATE TABLE [Users] ([Id] INT PRIMARY KEY, [Name] VARCHAR(50))"
        );
    }

    #[test]
    fn test_disconnect_clears_table_state() {
        let mut h = Harness::new();
        h.connect(&["Users"]);
        h.app.insert.table = Some("Users".into());
        h.app.insert.form = Some(users_form("Users"));
        h.app.view.table = Some("Users".into());

        h.app.activate(Target::Disconnect);
        let (ticket, request) = h.next_request();
        assert!(matches!(request, DbRequest::Disconnect));
        h.reply(ticket, DbEvent::Disconnected(ActionResponse::success(())));

        assert!(!h.app.connected);
        assert_eq!(h.app.status, ConnectionStatus::Disconnected);
        assert!(h.app.tables.is_empty());
        assert!(h.app.insert.form.is_none());
        assert!(h.app.insert.table.is_none());
        assert!(h.app.view.table.is_none());
    }

    #[test]
    fn test_table_list_drops_missing_selection() {
        let mut h = Harness::new();
        h.connect(&["Orders", "Users"]);
        h.app.view.table = Some("Orders".into());
        h.app.activate(Target::RefreshView);
        let (ticket, _) = h.next_request();
        h.reply(
            ticket,
            DbEvent::TablesListed(ActionResponse::success(vec!["Users".into()])),
        );
        assert_eq!(h.app.tables, vec!["Users"]);
        assert!(h.app.view.table.is_none());
    }

    #[test]
    fn test_theme_change_is_saved_immediately() {
        let mut h = Harness::new();
        h.app.tab = Tab::Settings;
        h.press(KeyCode::Right);
        assert_eq!(h.app.settings.theme, Theme::Light);

        let saved = Settings::load_from(h.app.settings_path.as_ref().unwrap()).unwrap();
        assert_eq!(saved.theme, Theme::Light);

        h.press(KeyCode::Tab);
        h.press(KeyCode::Right);
        assert_eq!(h.app.settings.language, Language::Tr);
        assert_eq!(h.app.strings().settings, "Ayarlar");
    }

    #[test]
    fn test_cycle_helpers() {
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cycle(&items, None, true).as_deref(), Some("a"));
        assert_eq!(cycle(&items, Some("b"), true).as_deref(), Some("a"));
        assert_eq!(cycle(&items, Some("a"), false).as_deref(), Some("b"));
        assert_eq!(cycle(&[], None, true), None);
        assert_eq!(step(&Theme::ALL, Theme::System, false), Theme::Dark);
    }

    #[test]
    fn test_failed_disconnect_still_allows_reconnect() {
        let mut h = Harness::new();
        h.connect(&["Users"]);

        h.app.activate(Target::Disconnect);
        let (ticket, _) = h.next_request();
        h.reply(
            ticket,
            DbEvent::Disconnected(ActionResponse::error("broken pipe".into())),
        );
        assert!(!h.app.connected);
        assert!(h.app.tables.is_empty());
        h.app.notice = None;

        h.app.activate(Target::Connect);
        let (_, request) = h.next_request();
        assert!(matches!(request, DbRequest::Connect { .. }));
        assert!(h.app.notice.is_none());
    }

    #[test]
    fn test_late_insert_reply_keeps_other_table_form() {
        let mut h = Harness::new();
        h.connect(&["Orders", "Users"]);
        h.app.tab = Tab::Insert;

        h.app.select_insert_table("Users".into());
        let (ticket, _) = h.next_request();
        h.reply(ticket, DbEvent::FormLoaded(ActionResponse::success(users_form("Users"))));
        h.app.activate(Target::InsertRow);
        let (insert_ticket, _) = h.next_request();

        h.app.select_insert_table("Orders".into());
        let (ticket, _) = h.next_request();
        h.reply(ticket, DbEvent::FormLoaded(ActionResponse::success(users_form("Orders"))));
        let form = h.app.insert.form.as_mut().unwrap();
        *form.fields[0].input.text_mut().unwrap() = "77".into();

        h.reply(insert_ticket, DbEvent::Inserted(ActionResponse::success(1)));
        let form = h.app.insert.form.as_ref().unwrap();
        assert_eq!(form.table, "Orders");
        assert_eq!(form.fields[0].input, FieldInput::Number("77".into()));
        assert_eq!(h.app.notice.as_ref().unwrap().message, "Data inserted successfully!");
    }

    #[test]
    fn test_settings_without_config_dir_stay_in_memory() {
        let (req_tx, _req_rx) = mpsc::unbounded_channel();
        let (_ev_tx, ev_rx) = mpsc::unbounded_channel();
        let mut app = App::new(Settings::default(), None, req_tx, ev_rx);
        app.tab = Tab::Settings;

        app.on_key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE));
        assert_eq!(app.settings.theme, Theme::Light);
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("Config directory not found"));
    }
}
