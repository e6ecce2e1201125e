use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use log::{info, warn};
use ratatui::{prelude::*, widgets::*};
use std::{
    io,
    time::{Duration, Instant},
};

use crate::app::capture::{CameraState, CaptureProvider};
use crate::app::models::Coordinates;
use crate::app::storage::KeyValueStore;
use crate::app::task_input::{get_task_input_ui, TaskInputState};
use crate::app::task_list::{get_instructions_ui, get_list_items_ui, Mutation, TaskList};

// How long a press on a list row must be held to delete it
pub const LONG_PRESS: Duration = Duration::from_millis(500);

const NO_CAMERA_PERMISSION: &str = "No camera permission";

// Screen regions from the last draw, used to route mouse events
#[derive(Default, Clone, Copy)]
struct ScreenLayout {
    list: Rect,
    add_button: Rect,
    camera_button: Rect,
}

// A left press that started on a list row
struct Press {
    row: usize,
    started: Instant,
    fired: bool,
}

pub struct App<'a> {
    pub items: TaskList<'a>,
    pub input: TaskInputState,
    pub location: Option<Coordinates>,
    pub camera: CameraState,
    capture: Box<dyn CaptureProvider>,
    // Blocking notice, dismissed by any key
    pub notice: Option<String>,
    pub status: Option<String>,
    press: Option<Press>,
    layout: ScreenLayout,
}

impl<'a> App<'a> {
    pub fn new(
        storage: &'a dyn KeyValueStore,
        location: Option<Coordinates>,
        camera: CameraState,
        capture: Box<dyn CaptureProvider>,
    ) -> App<'a> {
        App::with_items(TaskList::initialize(storage), location, camera, capture)
    }

    pub fn with_items(
        items: TaskList<'a>,
        location: Option<Coordinates>,
        camera: CameraState,
        capture: Box<dyn CaptureProvider>,
    ) -> App<'a> {
        let status = items
            .load_error()
            .map(|err| format!("Starting with an empty list: {err}"));
        App {
            items,
            input: TaskInputState::default(),
            location,
            camera,
            capture,
            notice: None,
            status,
            press: None,
            layout: ScreenLayout::default(),
        }
    }

    // Add the typed task; the input is cleared only when a task was added
    pub fn submit(&mut self) {
        let outcome = self.items.add(self.input.content());
        if outcome.changed() {
            self.input.clear();
        }
        self.report(outcome);
    }

    pub fn delete_selected(&mut self) {
        let outcome = self.items.remove_selected();
        self.report(outcome);
    }

    fn report(&mut self, outcome: Mutation) {
        match outcome {
            Mutation::Unchanged => {}
            Mutation::Persisted => self.status = None,
            Mutation::NotPersisted(err) => self.status = Some(format!("Not saved: {err}")),
        }
    }

    pub fn toggle_camera(&mut self) {
        if self.camera.is_capturing() {
            self.camera.close();
        } else if self.camera.open().is_err() {
            self.notice = Some(NO_CAMERA_PERMISSION.to_string());
        }
    }

    pub fn snap(&mut self) {
        match self.camera.snap(self.capture.as_mut()) {
            Ok(photo) => {
                info!("event=photo_attached module=ui status=ok");
                self.status = Some(format!("Photo saved: {}", photo.uri));
            }
            Err(err) => {
                warn!("event=photo_attached module=ui status=error error={err}");
                self.status = Some(format!("Capture failed: {err}"));
            }
        }
    }

    // Last chance to mirror the list before the process goes away
    pub fn on_quit(&mut self) {
        if let Mutation::NotPersisted(err) = self.items.retry_sync() {
            warn!("event=app_quit module=ui status=unsynced error={err}");
        }
    }

    // Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.notice.is_some() {
            self.notice = None;
            return false;
        }

        if self.camera.is_capturing() {
            // Capture overlay
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.snap(),
                KeyCode::Esc | KeyCode::F(2) => self.camera.close(),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => self.submit(),
            KeyCode::Char('d') if ctrl => self.delete_selected(),
            KeyCode::Char('u') if ctrl => self.items.unselect(),
            KeyCode::F(2) => self.toggle_camera(),
            KeyCode::Down => self.items.next(),
            KeyCode::Up => self.items.previous(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Home => self.input.move_cursor_home(),
            KeyCode::End => self.input.move_cursor_end(),
            KeyCode::Backspace => self.input.delete_char(),
            KeyCode::Delete => self.input.delete_forward(),
            KeyCode::Char(to_insert) if !ctrl => self.input.input(to_insert),
            _ => {}
        }
        false
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if self.notice.is_some() {
            if let MouseEventKind::Down(_) = mouse.kind {
                self.notice = None;
            }
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if contains(self.layout.add_button, mouse.column, mouse.row) {
                    self.submit();
                } else if contains(self.layout.camera_button, mouse.column, mouse.row) {
                    self.toggle_camera();
                } else {
                    self.press = self.list_row(mouse.column, mouse.row).map(|row| Press {
                        row,
                        started: now,
                        fired: false,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(press) = &self.press {
                    if self.list_row(mouse.column, mouse.row) != Some(press.row) {
                        self.press = None;
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let press = match self.press.take() {
                    Some(press) => press,
                    None => return,
                };
                if press.fired || self.list_row(mouse.column, mouse.row) != Some(press.row) {
                    return;
                }
                if now.duration_since(press.started) >= LONG_PRESS {
                    self.long_press(press.row);
                } else {
                    // Short click selects
                    let index = self.items.state.offset() + press.row;
                    if index < self.items.len() {
                        self.items.state.select(Some(index));
                    }
                }
            }
            _ => {}
        }
    }

    // Fire a long press while the button is still held
    pub fn on_tick(&mut self, now: Instant) {
        let row = match &mut self.press {
            Some(press) if !press.fired && now.duration_since(press.started) >= LONG_PRESS => {
                press.fired = true;
                press.row
            }
            _ => return,
        };
        self.long_press(row);
    }

    fn long_press(&mut self, row: usize) {
        if let Some(id) = self.items.id_at_row(row) {
            let outcome = self.items.remove(&id);
            self.report(outcome);
        }
    }

    // Row inside the list widget under a screen position
    fn list_row(&self, column: u16, row: u16) -> Option<usize> {
        let inner = self.layout.list.inner(&Margin {
            horizontal: 1,
            vertical: 1,
        });
        if contains(inner, column, row) {
            Some((row - inner.y) as usize)
        } else {
            None
        }
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| draw_ui(f, &mut app))?;
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if crossterm::event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key) {
                        app.on_quit();
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse, Instant::now()),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick(Instant::now());
            last_tick = Instant::now();
        }
    }
}

// Draws the whole user interface
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    // App screen on the left, commands and status on the right
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(f.size());

    draw_screen(f, app, chunks[0]);

    let right_side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let instructions = Paragraph::new(get_instructions_ui())
        .block(Block::new().title("Commands").borders(Borders::ALL))
        .style(Style::new().white());
    f.render_widget(instructions, right_side[0]);

    let status = Paragraph::new(get_status_ui(app))
        .block(Block::new().title("Status").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
        .style(Style::new().white());
    f.render_widget(status, right_side[1]);

    if let Some(notice) = &app.notice {
        let area = centered_rect(f.size(), 40, 5);
        let popup = Paragraph::new(vec![
            Line::from(notice.as_str()),
            Line::from(""),
            Line::from(Span::styled("Press any key", Style::new().gray())),
        ])
        .alignment(Alignment::Center)
        .block(Block::new().title("Notice").borders(Borders::ALL))
        .style(Style::new().white().on_black());
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}

fn draw_screen(f: &mut Frame, app: &mut App, area: Rect) {
    let coords_height = if app.location.is_some() { 1 } else { 0 };
    let camera_height = if app.camera.is_capturing() { 6 } else { 3 };
    let photo_height = if app.camera.photo().is_some() { 1 } else { 0 };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(coords_height),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(camera_height),
            Constraint::Length(photo_height),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new("Todo++ (location + camera)").style(Style::new().bold()),
        rows[0],
    );

    if let Some(coordinates) = &app.location {
        f.render_widget(
            Paragraph::new(coordinates.to_string()).style(Style::new().gray()),
            rows[1],
        );
    }

    // Input row with its add button
    let input_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(5)])
        .split(rows[2]);
    f.render_widget(
        Paragraph::new(get_task_input_ui(&app.input)).block(Block::new().borders(Borders::ALL)),
        input_row[0],
    );
    f.render_widget(
        Paragraph::new("+")
            .alignment(Alignment::Center)
            .block(Block::new().borders(Borders::ALL))
            .style(Style::new().white().on_blue()),
        input_row[1],
    );

    // Create a List from all tasks and highlight the currently selected one
    let (tasks, state) = app.items.view();
    let task_list = List::new(get_list_items_ui(tasks))
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    f.render_stateful_widget(task_list, rows[3], state);

    if app.camera.is_capturing() {
        let overlay = Paragraph::new(vec![
            Line::from("Camera is on"),
            Line::from(""),
            Line::from(Span::styled("Enter/Space - snap, Esc - close", Style::new().gray())),
        ])
        .alignment(Alignment::Center)
        .block(Block::new().title("Camera").borders(Borders::ALL));
        f.render_widget(overlay, rows[4]);
    } else {
        let button = Paragraph::new("Open camera (F2)")
            .alignment(Alignment::Center)
            .block(Block::new().borders(Borders::ALL))
            .style(Style::new().white().on_blue());
        f.render_widget(button, rows[4]);
    }

    if let Some(photo) = app.camera.photo() {
        f.render_widget(
            Paragraph::new(format!("Photo: {}", photo.uri)).style(Style::new().gray()),
            rows[5],
        );
    }

    app.layout = ScreenLayout {
        list: rows[3],
        add_button: input_row[1],
        camera_button: if app.camera.is_capturing() {
            Rect::default()
        } else {
            rows[4]
        },
    };
}

// Build the UI (lines) for the status infobox
fn get_status_ui<'b>(app: &'b App) -> Vec<Line<'b>> {
    let mut lines = vec![Line::from(format!("Total tasks: {}", app.items.len()))];
    if app.items.pending_sync() {
        lines.push(Line::from(Span::styled("Unsaved changes", Style::new().red())));
    }
    if let Some(status) = &app.status {
        lines.push(Line::from(Span::styled(status.as_str(), Style::new().yellow())));
    }
    lines
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
