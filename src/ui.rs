use crate::dates;
use crate::model::{Category, Direction as Move, ListId, TaskId, TaskStore, TASK_PLACEHOLDER};
use crate::session::Session;
use crate::storage::StoreLocation;
use crate::view::{self, DayStatus, DayView, ListStatus};
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use serde::{Deserialize, Serialize};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

pub const THEME_KEY: &str = "theme";

const GROUP_CAPTION_PLACEHOLDER: &str = "Add task group caption";
const LIST_CAPTION_PLACEHOLDER: &str = "Add caption";

pub fn run(session: Session, location: StoreLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(session, location);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

struct Palette {
    text: Color,
    muted: Color,
    accent: Color,
    edited: Color,
    warn: Color,
    done: Color,
    selected_bg: Color,
}

impl Theme {
    fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    fn palette(&self) -> Palette {
        match self {
            Theme::Dark => Palette {
                text: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                edited: Color::Rgb(129, 140, 248),
                warn: Color::LightYellow,
                done: Color::LightGreen,
                selected_bg: Color::Rgb(40, 44, 58),
            },
            Theme::Light => Palette {
                text: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                edited: Color::Rgb(79, 70, 229),
                warn: Color::Rgb(180, 83, 9),
                done: Color::Green,
                selected_bg: Color::Rgb(226, 232, 240),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Row {
    Day(String),
    List(ListId),
    Task(ListId, TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EditTarget {
    TaskContent(ListId, TaskId),
    TaskDue(ListId, TaskId),
    ListCaption(ListId),
    GroupCaption(String),
}

enum Mode {
    Normal,
    Editing { target: EditTarget, field: FieldValue },
    Picking { list_id: ListId, idx: usize },
    ConfirmDelete { date: String },
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl EditTarget {
    fn title(&self) -> &'static str {
        match self {
            EditTarget::TaskContent(..) => "Task",
            EditTarget::TaskDue(..) => "Due date (YYYY-MM-DD, empty clears)",
            EditTarget::ListCaption(_) => "List caption",
            EditTarget::GroupCaption(_) => "Task group caption",
        }
    }
}

struct App {
    session: Session,
    location: StoreLocation,
    rows: Vec<Row>,
    list_state: ListState,
    last_save: Instant,
    status: String,
    mode: Mode,
    theme: Theme,
}

impl App {
    fn new(session: Session, location: StoreLocation) -> Self {
        let status = format!("Loaded tasks from {}", location.path.display());
        let theme = session.kv().load(THEME_KEY, Theme::Dark);
        let rows = build_rows(session.store());
        let mut list_state = ListState::default();
        if !rows.is_empty() {
            list_state.select(Some(0));
        }
        App {
            session,
            location,
            rows,
            list_state,
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
            theme,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Editing { .. } => self.handle_edit_key(key),
            Mode::Picking { .. } => self.handle_picker_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Down | KeyCode::Char('j') => self.select_offset(1),
            KeyCode::Up | KeyCode::Char('k') => self.select_offset(-1),
            KeyCode::Char('n') => {
                self.mutate("Added task group for today", |s| s.create_task_group());
                self.select_first_day();
            }
            KeyCode::Char('l') => match self.current_date() {
                Some(date) => {
                    let id = self.mutate(format!("Added list under {}", date), |s| {
                        s.create_list(&date)
                    });
                    self.select_row(&Row::List(id));
                }
                None => self.status = "Select a task group first".into(),
            },
            KeyCode::Char('a') => match self.current_list() {
                Some(list_id) => {
                    if let Some(task_id) =
                        self.mutate("Added task", |s| s.create_task(list_id))
                    {
                        self.select_row(&Row::Task(list_id, task_id));
                        self.begin_edit(EditTarget::TaskContent(list_id, task_id));
                    }
                }
                None => self.status = "Select a list to add tasks".into(),
            },
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some((list_id, task_id)) = self.current_task() {
                    let checked = self
                        .session
                        .store()
                        .task(list_id, task_id)
                        .map(|t| t.checked)
                        .unwrap_or(false);
                    let message = if checked { "Reopened task" } else { "Completed task" };
                    self.mutate(message, |s| s.update_task_checked(list_id, task_id, !checked));
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => match self.current_row().cloned() {
                Some(Row::Task(list_id, task_id)) => {
                    self.begin_edit(EditTarget::TaskContent(list_id, task_id))
                }
                Some(Row::List(list_id)) => self.begin_edit(EditTarget::ListCaption(list_id)),
                Some(Row::Day(date)) => self.begin_edit(EditTarget::GroupCaption(date)),
                None => {}
            },
            KeyCode::Char('c') => match self.current_row().cloned() {
                Some(Row::Day(date)) => self.begin_edit(EditTarget::GroupCaption(date)),
                Some(Row::List(list_id)) | Some(Row::Task(list_id, _)) => {
                    self.begin_edit(EditTarget::ListCaption(list_id))
                }
                None => {}
            },
            KeyCode::Char('d') => {
                if let Some((list_id, task_id)) = self.current_task() {
                    self.begin_edit(EditTarget::TaskDue(list_id, task_id));
                }
            }
            KeyCode::Char('g') => {
                if let Some(list_id) = self.current_list() {
                    self.session.apply(|s| s.toggle_category_picker(list_id));
                    let idx = self
                        .session
                        .store()
                        .list(list_id)
                        .and_then(|l| l.category)
                        .and_then(|c| Category::ALL.iter().position(|x| *x == c))
                        .unwrap_or(0);
                    self.mode = Mode::Picking { list_id, idx };
                    self.status = "Pick a category (Enter select, Esc cancel)".into();
                }
            }
            KeyCode::Char('K') => self.move_current(Move::Up),
            KeyCode::Char('J') => self.move_current(Move::Down),
            KeyCode::Delete | KeyCode::Char('D') => match self.current_row().cloned() {
                Some(Row::Task(list_id, task_id)) => {
                    self.mutate("Deleted task", |s| s.delete_task(list_id, task_id));
                    if self.session.store().list(list_id).is_none() {
                        self.status = "Deleted task; empty list removed".into();
                    }
                }
                Some(Row::Day(date)) => {
                    self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", date);
                    self.mode = Mode::ConfirmDelete { date };
                }
                Some(Row::List(_)) => {
                    self.status = "Lists disappear once their last task is deleted".into()
                }
                None => {}
            },
            KeyCode::Char('z') => {
                if let Some(date) = self.current_date() {
                    self.mutate(format!("Toggled lists under {}", date), |s| {
                        s.toggle_group_expansion(&date)
                    });
                }
            }
            KeyCode::Char('h') => {
                if let Some(list_id) = self.current_list() {
                    self.mutate("Toggled tasks", |s| s.toggle_list_tasks_expansion(list_id));
                }
            }
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                self.session.kv().save(THEME_KEY, &self.theme);
                self.status = format!("Switched to {} theme", self.theme.label());
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<bool> {
        let (target, mut field) = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Editing { target, field } => (target, field),
            other => {
                self.mode = other;
                return Ok(false);
            }
        };
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return Ok(false);
            }
            KeyCode::Enter => {
                if let Err(message) = self.commit_edit(&target, &field.value) {
                    self.status = message;
                } else {
                    return Ok(false);
                }
            }
            KeyCode::Left => field.move_left(),
            KeyCode::Right => field.move_right(),
            KeyCode::Backspace => field.backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    field.insert_char(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Editing { target, field };
        Ok(false)
    }

    fn handle_picker_key(&mut self, key: KeyEvent) -> Result<bool> {
        let (list_id, idx) = match self.mode {
            Mode::Picking { list_id, idx } => (list_id, idx),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.mode = Mode::Picking {
                    list_id,
                    idx: idx.saturating_sub(1),
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.mode = Mode::Picking {
                    list_id,
                    idx: (idx + 1).min(Category::ALL.len() - 1),
                };
            }
            KeyCode::Enter => {
                let category = Category::ALL[idx];
                self.mutate(format!("Category set to {}", category), |s| {
                    s.set_category(list_id, category)
                });
                self.mode = Mode::Normal;
            }
            KeyCode::Esc | KeyCode::Char('g') => {
                self.session.apply(|s| s.toggle_category_picker(list_id));
                self.status = "Canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let date = match &self.mode {
            Mode::ConfirmDelete { date } => date.clone(),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mutate(format!("Deleted task group {}", date), |s| {
                    s.delete_task_group(&date)
                });
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn begin_edit(&mut self, target: EditTarget) {
        let store = self.session.store();
        let initial = match &target {
            EditTarget::TaskContent(list_id, task_id) => store
                .task(*list_id, *task_id)
                .map(|t| t.content.as_str())
                .filter(|c| *c != TASK_PLACEHOLDER)
                .unwrap_or(""),
            EditTarget::TaskDue(list_id, task_id) => store
                .task(*list_id, *task_id)
                .map(|t| t.due_date.as_str())
                .unwrap_or(""),
            EditTarget::ListCaption(list_id) => store
                .list(*list_id)
                .and_then(|l| l.caption.text.as_deref())
                .unwrap_or(""),
            EditTarget::GroupCaption(date) => store
                .group_caption(date)
                .and_then(|c| c.text.as_deref())
                .unwrap_or(""),
        };
        let field = FieldValue::new(initial);
        self.status = format!("Editing {} (Enter save, Esc cancel)", target.title().to_lowercase());
        self.mode = Mode::Editing { target, field };
    }

    fn commit_edit(&mut self, target: &EditTarget, value: &str) -> std::result::Result<(), String> {
        match target.clone() {
            EditTarget::TaskContent(list_id, task_id) => {
                let text = value.trim();
                let text = if text.is_empty() { TASK_PLACEHOLDER } else { text };
                self.mutate("Updated task", |s| {
                    s.update_task_content(list_id, task_id, text)
                });
            }
            EditTarget::TaskDue(list_id, task_id) => {
                let raw = value.trim();
                if !raw.is_empty() && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
                    return Err(format!("Invalid due date (use YYYY-MM-DD): {}", raw));
                }
                self.mutate("Updated due date", |s| {
                    s.update_task_due_date(list_id, task_id, raw)
                });
            }
            EditTarget::ListCaption(list_id) => {
                self.mutate("Updated caption", |s| s.set_list_caption(list_id, value));
            }
            EditTarget::GroupCaption(date) => {
                self.mutate("Updated caption", |s| s.set_task_group_caption(&date, value));
            }
        }
        Ok(())
    }

    fn move_current(&mut self, direction: Move) {
        let Some((list_id, task_id)) = self.current_task() else {
            return;
        };
        if self.mutate("Moved task", |s| s.move_task(list_id, task_id, direction)) {
            self.select_row(&Row::Task(list_id, task_id));
        } else {
            self.status = "Task is already at the edge".into();
        }
    }

    fn mutate<R, F>(&mut self, message: impl Into<String>, f: F) -> R
    where
        F: FnOnce(&mut TaskStore) -> R,
    {
        let result = self.session.apply(f);
        self.last_save = Instant::now();
        self.status = message.into();
        self.refresh_rows();
        result
    }

    fn refresh_rows(&mut self) {
        let current = self.current_row().cloned();
        self.rows = build_rows(self.session.store());
        let keep = current.and_then(|row| self.rows.iter().position(|r| *r == row));
        let idx = keep.unwrap_or_else(|| {
            self.list_state
                .selected()
                .unwrap_or(0)
                .min(self.rows.len().saturating_sub(1))
        });
        self.list_state
            .select(if self.rows.is_empty() { None } else { Some(idx) });
    }

    fn select_offset(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.rows.len() as isize - 1);
        self.list_state.select(Some(next as usize));
    }

    fn select_row(&mut self, row: &Row) {
        if let Some(idx) = self.rows.iter().position(|r| r == row) {
            self.list_state.select(Some(idx));
        }
    }

    fn select_first_day(&mut self) {
        if !self.rows.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.list_state.selected()?)
    }

    fn current_date(&self) -> Option<String> {
        match self.current_row()? {
            Row::Day(date) => Some(date.clone()),
            Row::List(list_id) | Row::Task(list_id, _) => self
                .session
                .store()
                .date_of_list(*list_id)
                .map(str::to_string),
        }
    }

    fn current_list(&self) -> Option<ListId> {
        match self.current_row()? {
            Row::List(list_id) | Row::Task(list_id, _) => Some(*list_id),
            Row::Day(_) => None,
        }
    }

    fn current_task(&self) -> Option<(ListId, TaskId)> {
        match self.current_row()? {
            Row::Task(list_id, task_id) => Some((*list_id, *task_id)),
            _ => None,
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_tree(f, layout[1]);
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Editing { target, field } => self.draw_editor(f, target, field),
            Mode::Picking { idx, .. } => self.draw_picker(f, *idx),
            Mode::ConfirmDelete { date } => self.draw_confirm(f, date),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let palette = self.theme.palette();
        let title = Line::from(vec![
            Span::styled(
                "daylist ",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.location.scope.label(), Style::default().fg(palette.done)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.path.display()),
                Style::default().fg(palette.muted),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(palette.muted),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("theme {}", self.theme.label()),
                Style::default().fg(palette.edited),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(palette.muted));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_tree(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let palette = self.theme.palette();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.muted))
            .title(Span::styled(
                "Task groups",
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ));
        if self.rows.is_empty() {
            let msg = Paragraph::new("No task groups yet. Press n to add one for today.")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(msg, area);
            return;
        }

        let store = self.session.store();
        let days = view::days(store);
        let items: Vec<ListItem<'static>> = self
            .rows
            .iter()
            .map(|row| row_item(store, &days, row, &palette))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(palette.selected_bg)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("› ");
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let palette = self.theme.palette();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let key = |k: &'static str| Span::styled(k, Style::default().fg(palette.accent));
        let help = Line::from(vec![
            key("j/k"),
            Span::raw(" move  "),
            key("n"),
            Span::raw(" group  "),
            key("l"),
            Span::raw(" list  "),
            key("a"),
            Span::raw(" task  "),
            key("space"),
            Span::raw(" done  "),
            key("e"),
            Span::raw(" edit  "),
            key("c"),
            Span::raw(" caption  "),
            key("d"),
            Span::raw(" due  "),
            key("g"),
            Span::raw(" category  "),
            key("K/J"),
            Span::raw(" reorder  "),
            key("z/h"),
            Span::raw(" fold  "),
            key("D"),
            Span::raw(" delete  "),
            key("t"),
            Span::raw(" theme  "),
            key("q"),
            Span::raw(" quit"),
        ]);
        let help_bar = Paragraph::new(help).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(palette.muted)),
        );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(palette.text))
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(palette.muted)),
            );
        f.render_widget(status, rows[1]);
    }

    fn draw_editor(&self, f: &mut ratatui::Frame<'_>, target: &EditTarget, field: &FieldValue) {
        let palette = self.theme.palette();
        let area = centered_rect(60, 20, f.size());
        let body = vec![
            Line::from(Span::styled(
                field.with_caret(),
                Style::default().fg(palette.accent),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(palette.muted),
            )),
        ];
        let dialog = Paragraph::new(body)
            .block(
                Block::default()
                    .title(Span::styled(
                        target.title(),
                        Style::default()
                            .fg(palette.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_picker(&self, f: &mut ratatui::Frame<'_>, idx: usize) {
        let palette = self.theme.palette();
        let area = centered_rect(30, 40, f.size());
        let items: Vec<ListItem<'static>> = Category::ALL
            .iter()
            .map(|c| ListItem::new(c.to_string()))
            .collect();
        let mut state = ListState::default();
        state.select(Some(idx));
        let list = List::new(items)
            .block(
                Block::default()
                    .title("Category")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            )
            .highlight_style(
                Style::default()
                    .bg(palette.selected_bg)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, date: &str) {
        let area = centered_rect(50, 30, f.size());
        let body = vec![
            Line::from(Span::styled(
                format!(
                    "Delete task group {} and all of its lists?",
                    dates::format_for_display(date)
                ),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

/// Flattens the display tree; collapsed lists and hidden task containers drop out.
fn build_rows(store: &TaskStore) -> Vec<Row> {
    let mut rows = Vec::new();
    for day in view::days(store) {
        rows.push(Row::Day(day.date.to_string()));
        for list in day.lists.iter().filter(|l| l.expanded) {
            rows.push(Row::List(list.id));
            if list.tasks_expanded {
                rows.extend(list.tasks.iter().map(|t| Row::Task(list.id, t.id)));
            }
        }
    }
    rows
}

fn row_item(store: &TaskStore, days: &[DayView<'_>], row: &Row, palette: &Palette) -> ListItem<'static> {
    match row {
        Row::Day(date) => {
            let Some(day) = days.iter().find(|d| d.date == date.as_str()) else {
                return ListItem::new(date.clone());
            };
            let chevron = if day.all_expanded { "▴" } else { "▾" };
            let caption = store.group_caption(date);
            let edited = caption.map(|c| c.edited).unwrap_or(false);
            let text = caption
                .and_then(|c| c.text.clone())
                .unwrap_or_else(|| GROUP_CAPTION_PLACEHOLDER.to_string());
            let mut spans = vec![
                Span::styled(
                    format!("{} {}", chevron, dates::format_for_display(date)),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    text,
                    Style::default().fg(if edited { palette.edited } else { palette.muted }),
                ),
            ];
            if day.groups.len() > 1 {
                spans.push(Span::styled(
                    format!("  ({} groups)", day.groups.len()),
                    Style::default().fg(palette.muted),
                ));
            }
            match day.status() {
                DayStatus::Incomplete(n) => spans.push(Span::styled(
                    format!("  ⚠ Total incomplete: {}", view::plural(n, "task")),
                    Style::default().fg(palette.warn),
                )),
                DayStatus::AllComplete => spans.push(Span::styled(
                    "  ✔",
                    Style::default().fg(palette.done),
                )),
                DayStatus::Nothing => {}
            }
            ListItem::new(Line::from(spans))
        }
        Row::List(list_id) => {
            let Some(list) = store.list(*list_id) else {
                return ListItem::new(format!("  list {}", list_id));
            };
            let chevron = if list.tasks_expanded { "▴" } else { "▾" };
            let caption_style = Style::default().fg(if list.caption.edited {
                palette.edited
            } else {
                palette.muted
            });
            let mut spans = vec![
                Span::raw(format!("  {} ", chevron)),
                Span::styled(
                    list.category_label(),
                    Style::default()
                        .fg(palette.text)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    list.caption
                        .text
                        .clone()
                        .unwrap_or_else(|| LIST_CAPTION_PLACEHOLDER.to_string()),
                    caption_style,
                ),
            ];
            match view::list_status(list) {
                ListStatus::Incomplete(n) => spans.push(Span::styled(
                    format!("  ⚠ You have {} incomplete", view::plural(n, "task")),
                    Style::default().fg(palette.warn),
                )),
                ListStatus::AllComplete => spans.push(Span::styled(
                    "  All tasks completed!",
                    Style::default().fg(palette.done),
                )),
                ListStatus::Empty => {}
            }
            ListItem::new(Line::from(spans))
        }
        Row::Task(list_id, task_id) => {
            let Some(task) = store.task(*list_id, *task_id) else {
                return ListItem::new(String::new());
            };
            let mark = if task.checked { "[x]" } else { "[ ]" };
            let mut content_style = Style::default().fg(if task.content == TASK_PLACEHOLDER {
                palette.muted
            } else {
                palette.text
            });
            if task.checked {
                content_style = content_style.add_modifier(Modifier::CROSSED_OUT);
            }
            let mut spans = vec![
                Span::raw(format!("      {} ", mark)),
                Span::styled(task.content.clone(), content_style),
            ];
            if !task.due_date.is_empty() {
                spans.push(Span::styled(
                    format!("  Due by: {}", task.due_date),
                    Style::default().fg(palette.warn),
                ));
            }
            spans.push(Span::styled(
                format!("  {}", task.time),
                Style::default().fg(palette.muted),
            ));
            let edited = store
                .date_of_list(*list_id)
                .and_then(|date| view::edited_after(task, date));
            if let Some(edited) = edited {
                spans.push(Span::styled(
                    format!("  Edited on {}", edited),
                    Style::default().fg(palette.edited),
                ));
            }
            ListItem::new(Line::from(spans))
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
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

fn prev_char(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
