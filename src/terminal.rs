// SPDX-License-Identifier: GPL-3.0-only

//! Terminal UI
//!
//! Generate and Scan modes in the terminal. The symbol preview uses Unicode
//! half-block characters, so each cell shows two modules stacked vertically.

use crate::app::{
    AppModel, CameraSessionState, Message, Mode, NotificationLevel, Runtime, Services,
};
use crate::backends::camera::V4l2Driver;
use crate::backends::clipboard::SystemClipboard;
use crate::config::Config;
use crate::constants::{app_info, export, timing};
use crate::symbol::{Color as SymbolColor, QrEncoder, RenderedSymbol};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::{info, warn};

/// Light border drawn around the preview so it scans off the screen
const PREVIEW_QUIET_ZONE: usize = 2;

/// How long a notification replaces the key help
const NOTIFICATION_DISPLAY_SECS: i64 = 5;

/// Run the terminal UI
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let model = AppModel::new(config, Arc::new(QrEncoder));
    let services = Services {
        driver: Arc::new(V4l2Driver::new()),
        clipboard: Arc::new(SystemClipboard::new()),
    };
    let mut runtime = Runtime::new(model, services);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // The camera is released whether or not the UI loop failed
    if !rt.block_on(runtime.shutdown(timing::SHUTDOWN_TIMEOUT)) {
        warn!("Exiting before the camera was released");
    }

    result
}

enum KeyAction {
    None,
    Send(Message),
    Quit,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Terminal UI started");

    loop {
        // Apply completions that arrived since the last frame
        runtime.drain();

        terminal.draw(|f| {
            let area = f.area();
            let model = runtime.model();

            let header_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.min(1),
            };
            let body_area = Rect {
                x: area.x,
                y: area.y + 1,
                width: area.width,
                height: area.height.saturating_sub(2),
            };
            let status_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(1),
                width: area.width,
                height: area.height.min(1),
            };

            f.render_widget(ModeTabs { model }, header_area);
            match model.current_mode() {
                Mode::Generate => f.render_widget(GenerateView { model }, body_area),
                Mode::Scan => f.render_widget(ScanView { model }, body_area),
            }
            f.render_widget(StatusBar::for_model(model), status_area);
        })?;

        // Handle input with timeout so completions keep flowing
        if event::poll(timing::TERMINAL_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match handle_key(runtime.model(), key) {
                KeyAction::Quit => break,
                KeyAction::Send(message) => runtime.dispatch(message),
                KeyAction::None => {}
            }
        }
    }

    info!("Terminal UI closed");
    Ok(())
}

fn handle_key(model: &AppModel, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Tab | KeyCode::BackTab => {
            // Toggle relative to where the UI is heading, so a second Tab
            // abandons a switch still waiting for the camera
            let target = model.mode.pending().unwrap_or(model.current_mode());
            let next = match target {
                Mode::Generate => Mode::Scan,
                Mode::Scan => Mode::Generate,
            };
            return KeyAction::Send(Message::SelectMode(next));
        }
        _ => {}
    }

    match model.current_mode() {
        Mode::Generate => generate_key(model, key.code, ctrl),
        Mode::Scan => scan_key(model, key.code),
    }
}

fn generate_key(model: &AppModel, code: KeyCode, ctrl: bool) -> KeyAction {
    let payload = model.generate.payload();

    let message = match code {
        KeyCode::Enter => Message::ExportImage,
        KeyCode::Char('s') if ctrl => Message::ExportImage,
        KeyCode::Char('e') if ctrl => Message::ExportVector,
        KeyCode::Char('y') if ctrl => Message::CopyPayload,
        KeyCode::Char('u') if ctrl => Message::PayloadChanged(String::new()),
        KeyCode::Backspace => {
            let mut text = payload.to_string();
            if text.pop().is_none() {
                return KeyAction::None;
            }
            Message::PayloadChanged(text)
        }
        KeyCode::Char(c) if !ctrl => {
            let mut text = payload.to_string();
            text.push(c);
            Message::PayloadChanged(text)
        }
        _ => return KeyAction::None,
    };
    KeyAction::Send(message)
}

fn scan_key(model: &AppModel, code: KeyCode) -> KeyAction {
    let message = match code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('s') | KeyCode::Enter | KeyCode::Char(' ') => {
            match model.scan.session.state() {
                CameraSessionState::Idle | CameraSessionState::Error => Message::StartScan,
                _ => Message::StopScan,
            }
        }
        KeyCode::Char('c') => Message::CopyResult,
        KeyCode::Char('o') => Message::OpenLink,
        KeyCode::Char('r') => Message::ScanAnother,
        _ => return KeyAction::None,
    };
    KeyAction::Send(message)
}

fn term_color(color: SymbolColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn theme_background() -> Color {
    SymbolColor::from_hex(export::BACKGROUND)
        .map(term_color)
        .unwrap_or(Color::Black)
}

/// Write one line of text into `area`, clipped to its width
fn put_line(buf: &mut Buffer, area: Rect, row: u16, text: &str, style: Style) {
    if row >= area.height {
        return;
    }
    let clipped: String = text.chars().take(area.width as usize).collect();
    buf.set_string(area.x, area.y + row, clipped, style);
}

/// Header with the mode tabs
struct ModeTabs<'a> {
    model: &'a AppModel,
}

impl Widget for ModeTabs<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let title = format!(" QR Studio {} ", app_info::version());
        put_line(buf, area, 0, &title, Style::default().add_modifier(Modifier::BOLD));

        let mut x = area.x + title.chars().count() as u16;
        for mode in [Mode::Generate, Mode::Scan] {
            let label = if self.model.mode.pending() == Some(mode) {
                format!(" {}… ", mode)
            } else {
                format!(" {} ", mode)
            };
            let style = if mode == self.model.current_mode() {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            if x >= area.x + area.width {
                break;
            }
            let room = (area.x + area.width - x) as usize;
            let clipped: String = label.chars().take(room).collect();
            buf.set_string(x, area.y, &clipped, style);
            x += clipped.chars().count() as u16 + 1;
        }
    }
}

/// Generate mode: text field, feedback and preview
struct GenerateView<'a> {
    model: &'a AppModel,
}

impl Widget for GenerateView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let flow = &self.model.generate;

        // Keep the end of long payloads visible next to the cursor
        let label = "Text: ";
        let room = (area.width as usize).saturating_sub(label.len() + 1);
        let chars = flow.payload().chars().count();
        let visible: String = flow.payload().chars().skip(chars.saturating_sub(room)).collect();
        put_line(buf, area, 1, &format!("{}{}█", label, visible), Style::default());

        let mut flags = Vec::new();
        if flow.download.is_active() {
            flags.push("✓ Downloaded");
        }
        if flow.copied.is_active() {
            flags.push("✓ Copied");
        }
        put_line(
            buf,
            area,
            2,
            &flags.join("  "),
            Style::default().fg(Color::Green),
        );

        if let Some(e) = flow.encode_error() {
            put_line(buf, area, 3, &e.to_string(), Style::default().fg(Color::Red));
        }

        let preview_area = Rect {
            x: area.x,
            y: area.y + area.height.min(4),
            width: area.width,
            height: area.height.saturating_sub(4),
        };
        match flow.symbol() {
            Some(symbol) => SymbolWidget { symbol }.render(preview_area, buf),
            None if flow.payload().is_empty() => put_centered(
                buf,
                preview_area,
                "Type text to generate a QR code",
                Style::default().fg(Color::DarkGray),
            ),
            None => {}
        }
    }
}

/// Scan mode: session state and result actions
struct ScanView<'a> {
    model: &'a AppModel,
}

impl Widget for ScanView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let flow = &self.model.scan;
        let session = &flow.session;

        let state_line = match session.device_path() {
            Some(path) => format!("Camera: {} ({})", session.state(), path),
            None => format!("Camera: {}", session.state()),
        };
        put_line(buf, area, 1, &state_line, Style::default());

        if let Some(result) = session.result() {
            put_line(
                buf,
                area,
                3,
                &format!("Result: {}", result.text),
                Style::default().add_modifier(Modifier::BOLD),
            );
            let kind = if result.is_link() { "link" } else { "text" };
            put_line(
                buf,
                area,
                4,
                &format!("Scanned {} at {}", kind, result.scanned_at.format("%H:%M:%S")),
                Style::default().fg(Color::Gray),
            );
            if flow.copied.is_active() {
                put_line(buf, area, 5, "✓ Copied", Style::default().fg(Color::Green));
            }
            let actions = if flow.can_open_link() {
                "c copy | o open link | r scan another"
            } else {
                "c copy | r scan another"
            };
            put_line(buf, area, 7, actions, Style::default().fg(Color::Cyan));
            return;
        }

        match session.state() {
            CameraSessionState::Idle => {
                put_line(buf, area, 3, "Press s to start scanning", Style::default())
            }
            CameraSessionState::Starting => {
                put_line(buf, area, 3, "Opening camera...", Style::default())
            }
            CameraSessionState::Active => put_line(
                buf,
                area,
                3,
                "Point the camera at a QR code",
                Style::default(),
            ),
            CameraSessionState::Stopping => {
                put_line(buf, area, 3, "Releasing camera...", Style::default())
            }
            CameraSessionState::Error => put_line(
                buf,
                area,
                3,
                &format!("Error: {}", session.error_message().unwrap_or("unknown")),
                Style::default().fg(Color::Red),
            ),
        }
    }
}

fn put_centered(buf: &mut Buffer, area: Rect, text: &str, style: Style) {
    if area.height == 0 {
        return;
    }
    let len = text.chars().count() as u16;
    let x = area.x + area.width.saturating_sub(len) / 2;
    let y = area.y + area.height / 2;
    let inner = Rect {
        x,
        y,
        width: area.width.saturating_sub(x - area.x),
        height: 1,
    };
    put_line(buf, inner, 0, text, style);
}

/// Widget that renders a symbol using half-block characters
struct SymbolWidget<'a> {
    symbol: &'a RenderedSymbol,
}

impl SymbolWidget<'_> {
    /// Dark test with the preview quiet zone around the symbol
    fn is_dark(&self, mx: usize, my: usize) -> bool {
        let total = self.symbol.total_modules();
        match (mx.checked_sub(PREVIEW_QUIET_ZONE), my.checked_sub(PREVIEW_QUIET_ZONE)) {
            (Some(x), Some(y)) if x < total && y < total => self.symbol.is_dark_at(x, y),
            _ => false,
        }
    }
}

impl Widget for SymbolWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let modules = self.symbol.total_modules() + 2 * PREVIEW_QUIET_ZONE;

        // Integer scale so every module keeps the same size
        let scale = (area.width as usize / modules).min(area.height as usize * 2 / modules);
        if scale == 0 {
            put_centered(
                buf,
                area,
                "Enlarge the terminal to show the QR code",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let pixels = modules * scale;
        let cell_rows = pixels.div_ceil(2);
        let x_offset = area.x + ((area.width as usize - pixels) / 2) as u16;
        let y_offset = area.y + ((area.height as usize).saturating_sub(cell_rows) / 2) as u16;

        let params = self.symbol.params();
        let dark = term_color(params.foreground);
        let light = if params.background.is_opaque() {
            term_color(params.background)
        } else {
            theme_background()
        };

        // Each terminal cell represents 2 vertical pixels:
        // - Upper half (▀) colored with fg
        // - Lower half colored with bg
        for ty in 0..cell_rows {
            for tx in 0..pixels {
                let mx = tx / scale;
                let top = self.is_dark(mx, (ty * 2) / scale);
                let bottom = ty * 2 + 1 < pixels && self.is_dark(mx, (ty * 2 + 1) / scale);

                let position = (x_offset + tx as u16, y_offset + ty as u16);
                if let Some(cell) = buf.cell_mut(position) {
                    cell.set_char('▀');
                    cell.set_fg(if top { dark } else { light });
                    cell.set_bg(if bottom { dark } else { light });
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar {
    message: String,
    level: Option<NotificationLevel>,
}

impl StatusBar {
    /// Recent notification, or the key help for the current mode
    fn for_model(model: &AppModel) -> Self {
        let recent = model.latest_notification().filter(|n| {
            (chrono::Local::now() - n.at).num_seconds() < NOTIFICATION_DISPLAY_SECS
        });
        if let Some(notification) = recent {
            return Self {
                message: notification.message.clone(),
                level: Some(notification.level),
            };
        }

        let help = match model.current_mode() {
            Mode::Generate => {
                "Enter/^S export PNG | ^E export SVG | ^Y copy | ^U clear | Tab scan | Esc quit"
            }
            Mode::Scan => "s start/stop | c copy | o open | r scan another | Tab generate | q quit",
        };
        Self {
            message: help.to_string(),
            level: None,
        }
    }
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let bg = match self.level {
            Some(NotificationLevel::Error) => Color::Red,
            Some(NotificationLevel::Success) => Color::Green,
            Some(NotificationLevel::Info) | None => Color::DarkGray,
        };

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        put_line(
            buf,
            area,
            0,
            &self.message,
            Style::default().fg(Color::White).bg(bg),
        );
    }
}
