//! Interactive terminal viewer using ratatui
//!
//! Shows the scrolling scene full-screen and turns key presses into camera
//! direction changes. Arrow keys scroll, space stops, P saves a snapshot.

use std::error::Error;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    widgets::Paragraph,
};

use crate::driver::FrameDriver;
use crate::render::OutputGrid;
use crate::session::{ScrollDirection, Session};
use crate::snapshot::{export_png, export_text, FrameInfo};

struct Viewer {
    driver: FrameDriver,
    session: Session,
    seed: u64,
    frame: OutputGrid,
    /// Status message, cleared on the next key press
    message: Option<String>,
    snapshots: usize,
}

impl Viewer {
    fn new(mut driver: FrameDriver, mut session: Session, seed: u64) -> Self {
        let frame = driver.render_frame(session.camera().offset);
        let message = session.take_notice();
        Self {
            driver,
            session,
            seed,
            frame,
            message,
            snapshots: 0,
        }
    }

    /// Advance the camera and re-render.
    fn step(&mut self) {
        self.session.advance();
        if let Some(notice) = self.session.take_notice() {
            self.message = Some(notice);
        }
        self.frame = self.driver.render_frame(self.session.camera().offset);
    }

    /// Apply a key press. Returns false when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        self.message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => {
                self.session.set_direction(ScrollDirection::Left)
            }
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => {
                self.session.set_direction(ScrollDirection::Right)
            }
            KeyCode::Char(' ') => self.session.set_direction(ScrollDirection::Stop),
            KeyCode::Char('p') | KeyCode::Char('P') => self.save_snapshot(),
            _ => {}
        }
        true
    }

    fn frame_info(&self) -> FrameInfo {
        let offset = self.session.camera().offset;
        FrameInfo {
            seed: self.seed,
            offset,
            biome: self.driver.biome(offset),
            temperature: self.driver.temperature(offset),
        }
    }

    fn save_snapshot(&mut self) {
        self.snapshots += 1;
        let stem = format!("glyphscape_{}_{}", self.session.camera().offset, self.snapshots);
        let png = PathBuf::from(format!("{stem}.png"));
        let txt = PathBuf::from(format!("{stem}.txt"));
        let result = export_png(&self.frame, self.driver.geometry().cell, &png).and_then(|_| export_text(&self.frame, &self.frame_info(), &txt));
        self.message = Some(match result {
            Ok(()) => format!("Saved {}", png.display()),
            Err(e) => format!("Snapshot failed: {e}"),
        });
    }

    fn status_line(&self) -> String {
        let info = self.frame_info();
        let camera = self.session.camera();
        let msg = self.message.as_ref().map(|m| format!(" | {m}")).unwrap_or_default();
        format!(
            " x={} | {} | {} {:.1}C | {}{} | <-/->:Scroll  Space:Stop  P:Snapshot  Q:Quit",
            info.offset,
            camera.direction,
            info.biome,
            info.temperature,
            self.driver.cache_stats().summary(),
            msg,
        )
    }

    fn render_frame(&self, area: Rect, buf: &mut Buffer) {
        let rows = (area.height as usize).min(self.frame.height());
        let cols = (area.width as usize).min(self.frame.width());
        // keep the ground in view: show the bottom of the frame when it does not fit
        let first_row = self.frame.height() - rows;
        for dy in 0..rows {
            let line = self.frame.row(first_row + dy);
            for (dx, &c) in line.iter().take(cols).enumerate() {
                buf.get_mut(area.x + dx as u16, area.y + dy as u16)
                    .set_char(c)
                    .set_style(Style::default().fg(Color::Gray));
            }
        }
    }
}

/// Run the viewer until the user quits. `tick` is the time between scroll steps.
pub fn run_viewer(driver: FrameDriver, session: Session, seed: u64, tick: Duration) -> Result<(), Box<dyn Error>> {
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut viewer = Viewer::new(driver, session, seed);
    let mut last_step = Instant::now();

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .split(f.area());

            viewer.render_frame(chunks[0], f.buffer_mut());
            let status = Paragraph::new(viewer.status_line())
                .style(Style::default().bg(Color::DarkGray).fg(Color::White));
            f.render_widget(status, chunks[1]);
        })?;

        let timeout = tick.saturating_sub(last_step.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !viewer.handle_key(key.code) {
                    break;
                }
            }
        }
        if last_step.elapsed() >= tick {
            viewer.step();
            last_step = Instant::now();
        }
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
