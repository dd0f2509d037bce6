//! Per-run session state owned by the frame driver.
//!
//! Holds the camera (offset and scroll direction) and the interaction mode.
//! Nothing here is global: a driver creates one `Session` and threads it
//! through every tick.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Left,
    Right,
    #[default]
    Stop,
}

impl ScrollDirection {
    /// Column delta per step.
    pub fn sign(self) -> i64 {
        match self {
            ScrollDirection::Left => -1,
            ScrollDirection::Right => 1,
            ScrollDirection::Stop => 0,
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
            ScrollDirection::Stop => "stop",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ScrollDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(ScrollDirection::Left),
            "right" => Ok(ScrollDirection::Right),
            "stop" => Ok(ScrollDirection::Stop),
            other => Err(format!("unknown scroll direction '{other}' (expected left, right or stop)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Camera {
    pub offset: i64,
    pub direction: ScrollDirection,
}

// =============================================================================
// INTERACTION MODES
// =============================================================================

/// Which backend free text is routed to. Modes are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Chat,
    ImageGen,
}

/// A classified utterance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    EnterChat,
    ExitChat,
    EnterImageGen,
    ExitImageGen,
    Text(String),
}

/// Where an utterance ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    ModeChanged(InteractionMode),
    Chat(String),
    ImageGen(String),
    /// No active mode, or a command that does not apply to the current one
    Ignored,
}

/// Classify a recognised utterance. Mode phrases match case-insensitively
/// with or without a trailing period.
pub fn classify_command(utterance: &str) -> Command {
    let normalized = utterance.trim().to_lowercase();
    match normalized.trim_end_matches('.') {
        "chat mode" => Command::EnterChat,
        "exit chat mode" => Command::ExitChat,
        "picture generation mode" => Command::EnterImageGen,
        "exit picture generation mode" => Command::ExitImageGen,
        _ => Command::Text(utterance.trim().to_string()),
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    camera: Camera,
    mode: InteractionMode,
    scroll_step: i64,
    runaway_bound: i64,
    /// Runaway notice not yet delivered to a sink
    notice: Option<String>,
}

impl Session {
    /// Start a session at the configured offset. A start offset past the
    /// runaway bound is clamped and leaves a pending notice.
    pub fn new(config: &WorldConfig) -> Self {
        let mut session = Self {
            camera: Camera {
                offset: 0,
                direction: ScrollDirection::Stop,
            },
            mode: InteractionMode::Idle,
            scroll_step: config.scroll_step,
            runaway_bound: config.runaway_bound.saturating_abs(),
            notice: None,
        };
        session.set_offset(config.start_offset);
        session
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_direction(&mut self, direction: ScrollDirection) {
        self.camera.direction = direction;
    }

    /// Jump to an absolute offset. Returns a notice if the jump left the bound.
    pub fn set_offset(&mut self, offset: i64) -> Option<String> {
        self.camera.offset = offset;
        self.check_runaway()
    }

    /// Move one scroll step. Returns a notice if the camera ran past the
    /// bound and was turned around.
    pub fn advance(&mut self) -> Option<String> {
        let delta = self.camera.direction.sign().saturating_mul(self.scroll_step);
        self.camera.offset = self.camera.offset.saturating_add(delta);
        self.check_runaway()
    }

    /// The most recent runaway notice that no sink has accepted yet.
    pub fn pending_notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Take the pending notice, marking it delivered.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn check_runaway(&mut self) -> Option<String> {
        let offset = self.camera.offset;
        if offset.unsigned_abs() <= self.runaway_bound.unsigned_abs() {
            return None;
        }
        self.camera.offset = offset.clamp(-self.runaway_bound, self.runaway_bound);
        self.camera.direction = if offset > 0 {
            ScrollDirection::Left
        } else {
            ScrollDirection::Right
        };
        log::warn!("camera reached offset {offset}, turning {}", self.camera.direction);
        let notice = format!(
            "The land grows thin and frozen beyond this point. You turn back {}.",
            self.camera.direction
        );
        self.notice = Some(notice.clone());
        Some(notice)
    }

    /// Apply a recognised utterance to the mode machine.
    pub fn handle_utterance(&mut self, utterance: &str) -> Route {
        let next = match (classify_command(utterance), self.mode) {
            (Command::EnterChat, _) => InteractionMode::Chat,
            (Command::EnterImageGen, _) => InteractionMode::ImageGen,
            (Command::ExitChat, InteractionMode::Chat) => InteractionMode::Idle,
            (Command::ExitImageGen, InteractionMode::ImageGen) => InteractionMode::Idle,
            (Command::ExitChat | Command::ExitImageGen, _) => return Route::Ignored,
            (Command::Text(text), InteractionMode::Chat) => return Route::Chat(text),
            (Command::Text(text), InteractionMode::ImageGen) => return Route::ImageGen(text),
            (Command::Text(_), InteractionMode::Idle) => return Route::Ignored,
        };
        log::info!("interaction mode {:?} -> {:?}", self.mode, next);
        self.mode = next;
        Route::ModeChanged(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&WorldConfig {
            runaway_bound: 500,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn test_classify_voice_phrases() {
        assert_eq!(classify_command("Chat mode."), Command::EnterChat);
        assert_eq!(classify_command("exit chat mode"), Command::ExitChat);
        assert_eq!(classify_command("Picture generation mode."), Command::EnterImageGen);
        assert_eq!(classify_command("exit picture generation mode."), Command::ExitImageGen);
        assert_eq!(classify_command(" a red fox "), Command::Text("a red fox".to_string()));
    }

    #[test]
    fn test_modes_are_exclusive() {
        let mut s = session();
        assert_eq!(s.handle_utterance("hello"), Route::Ignored);
        assert_eq!(s.handle_utterance("chat mode."), Route::ModeChanged(InteractionMode::Chat));
        assert_eq!(s.handle_utterance("hello"), Route::Chat("hello".to_string()));
        assert_eq!(
            s.handle_utterance("picture generation mode."),
            Route::ModeChanged(InteractionMode::ImageGen)
        );
        assert_eq!(s.handle_utterance("exit chat mode."), Route::Ignored);
        assert_eq!(s.handle_utterance("a castle"), Route::ImageGen("a castle".to_string()));
        assert_eq!(
            s.handle_utterance("exit picture generation mode."),
            Route::ModeChanged(InteractionMode::Idle)
        );
    }

    #[test]
    fn test_camera_scrolls_by_step() {
        let mut s = session();
        s.set_direction(ScrollDirection::Left);
        assert!(s.advance().is_none());
        assert_eq!(s.camera().offset, 90);
        s.set_direction(ScrollDirection::Stop);
        s.advance();
        assert_eq!(s.camera().offset, 90);
    }

    #[test]
    fn test_runaway_camera_turns_back() {
        let mut s = session();
        assert!(s.set_offset(495).is_none());
        s.set_direction(ScrollDirection::Right);
        let notice = s.advance();
        assert!(notice.is_some());
        assert_eq!(s.camera().offset, 500);
        assert_eq!(s.camera().direction, ScrollDirection::Left);

        assert!(s.set_offset(-4000).is_some());
        assert_eq!(s.camera().direction, ScrollDirection::Right);
    }

    #[test]
    fn test_start_offset_past_bound_is_clamped() {
        let s = Session::new(&WorldConfig {
            start_offset: 250_000,
            runaway_bound: 100_000,
            ..WorldConfig::default()
        });
        assert_eq!(s.camera().offset, 100_000);
        assert_eq!(s.camera().direction, ScrollDirection::Left);
        assert!(s.pending_notice().is_some());

        let s = Session::new(&WorldConfig {
            start_offset: i64::MIN,
            ..WorldConfig::default()
        });
        assert_eq!(s.camera().offset, -100_000);
        assert_eq!(s.camera().direction, ScrollDirection::Right);
    }

    #[test]
    fn test_notice_waits_until_taken() {
        let mut s = session();
        assert!(s.pending_notice().is_none());
        s.set_offset(900);
        let notice = s.pending_notice().map(str::to_owned);
        assert!(notice.is_some());
        s.advance();
        assert_eq!(s.pending_notice().map(str::to_owned), notice);
        assert_eq!(s.take_notice(), notice);
        assert!(s.pending_notice().is_none());
    }

    #[test]
    fn test_direction_parses() {
        assert_eq!("Left".parse::<ScrollDirection>(), Ok(ScrollDirection::Left));
        assert!("up".parse::<ScrollDirection>().is_err());
    }
}
