use std::sync::Arc;

use lifgpt_core::{ChatSession, InferenceClient};
use tokio::sync::mpsc;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Chat state
    pub session: ChatSession,
    pub input_cursor: usize, // cursor position in session.input(), in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_lines: u16,  // Wrapped line count from the last render
    pub follow_bottom: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub client: Arc<dyn InferenceClient>,
    pub api_route: String,
    pub events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        session: ChatSession,
        client: Arc<dyn InferenceClient>,
        api_route: String,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            session,
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_lines: 0,
            follow_bottom: true,

            animation_frame: 0,

            client,
            api_route,
            events,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Keep the cursor inside the input after the buffer changes underneath it.
    pub fn clamp_cursor(&mut self) {
        let char_count = self.session.input().chars().count();
        self.input_cursor = self.input_cursor.min(char_count);
    }

    fn max_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_bottom = self.max_scroll() == 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_bottom = true;
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Record the wrapped size of the chat from the last render and pin the
    /// view to the bottom while following.
    pub fn update_chat_metrics(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_lines = total_lines;
        self.chat_height = visible_height;
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_scroll());
        }
    }
}
