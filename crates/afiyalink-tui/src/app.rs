use std::sync::Arc;
use std::time::Duration;

use afiyalink_core::{
    languages, Config, HttpTransport, Message, RequestCoordinator, RequestShape, Transport,
    Translator, CHAT_PATH, TRANSLATE_PATH,
};
use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Translate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Input box shared by both screens
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Conversations
    pub chat: RequestCoordinator,
    pub translator: Translator,

    // Log view
    pub log_scroll: u16,
    pub log_height: u16, // inner height of the log area for scroll calculations
    pub log_width: u16,  // inner width of the log area for wrap calculations
    pub log_area: Option<Rect>,

    pub animation_frame: u8,
    pub status: Option<String>,
    pub persist_languages: bool,
}

impl App {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let chat = http_transport(config, CHAT_PATH)?;
        let translate = http_transport(config, TRANSLATE_PATH)?;
        let mut app = Self::with_transports(chat, translate, config);
        app.persist_languages = true;
        Ok(app)
    }

    pub fn with_transports(
        chat_transport: Arc<dyn Transport>,
        translate_transport: Arc<dyn Transport>,
        config: &Config,
    ) -> Self {
        let shape = RequestShape::chat(&config.user_id, &config.chat_language);

        Self {
            should_quit: false,
            screen: Screen::Chat,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            chat: RequestCoordinator::new(chat_transport, shape),
            translator: Translator::new(
                translate_transport,
                &config.source_language,
                &config.target_language,
            ),

            log_scroll: 0,
            log_height: 0,
            log_width: 0,
            log_area: None,

            animation_frame: 0,
            status: None,
            persist_languages: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        match self.screen {
            Screen::Chat => self.chat.messages(),
            Screen::Translate => self.translator.messages(),
        }
    }

    pub fn is_loading(&self) -> bool {
        match self.screen {
            Screen::Chat => self.chat.is_pending(),
            Screen::Translate => self.translator.coordinator().is_pending(),
        }
    }

    /// Send the input box contents on the current screen. The input is only
    /// cleared when the request was accepted.
    pub fn submit_input(&mut self) -> bool {
        let accepted = match self.screen {
            Screen::Chat => self.chat.dispatch(&self.input),
            Screen::Translate => self.translator.dispatch(&self.input),
        };
        if accepted {
            self.input.clear();
            self.cursor = 0;
            self.status = None;
            self.scroll_to_bottom();
        }
        accepted
    }

    /// Pick up finished requests on both screens
    pub async fn poll_requests(&mut self) {
        let chat_settled = self.chat.poll_settled().await;
        let translation_settled = self.translator.coordinator_mut().poll_settled().await;
        if chat_settled || translation_settled {
            self.scroll_to_bottom();
        }
    }

    pub fn switch_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Chat => Screen::Translate,
            Screen::Translate => Screen::Chat,
        };
        self.status = None;
        self.scroll_to_bottom();
    }

    pub fn new_conversation(&mut self) {
        let reset = match self.screen {
            Screen::Chat => self.chat.reset(),
            Screen::Translate => self.translator.coordinator_mut().reset(),
        };
        if reset {
            self.log_scroll = 0;
            self.status = None;
        } else {
            self.status = Some("Wait for the current request to finish".to_string());
        }
    }

    /// Swap the language pair and move the last translation into the input
    pub fn swap_languages(&mut self) {
        match self.translator.swap_languages() {
            Some(prefill) => {
                if !prefill.is_empty() {
                    self.cursor = prefill.chars().count();
                    self.input = prefill;
                }
                self.languages_changed();
            }
            None => {
                self.status = Some("Wait for the current translation to finish".to_string());
            }
        }
    }

    pub fn cycle_source(&mut self, forward: bool) {
        let current = self.translator.source().code;
        let next = if forward { languages::next(current) } else { languages::prev(current) };
        if self.translator.set_source(next.code) {
            self.languages_changed();
        }
    }

    pub fn cycle_target(&mut self, forward: bool) {
        let current = self.translator.target().code;
        let next = if forward { languages::next(current) } else { languages::prev(current) };
        if self.translator.set_target(next.code) {
            self.languages_changed();
        }
    }

    fn languages_changed(&mut self) {
        if !self.persist_languages {
            return;
        }
        let (source, target) = (self.translator.source().code, self.translator.target().code);
        if let Err(e) = Config::save_languages(source, target) {
            tracing::warn!(error = %e, "could not save language choice");
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.log_scroll = self.log_scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.log_scroll = self.log_scroll.saturating_sub(lines);
    }

    /// Scroll the log so the newest entry (or "Thinking...") is visible
    pub fn scroll_to_bottom(&mut self) {
        // Use actual log width for wrap calculation, default to 50 if not set
        let wrap_width = if self.log_width > 0 {
            self.log_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.messages() {
            total_lines = total_lines.saturating_add(1); // "You:" / "AfiyaLink:"
            for line in msg.text().lines() {
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add((char_count / wrap_width + 1) as u16);
            }
            total_lines = total_lines.saturating_add(1); // blank line after message
        }
        if self.is_loading() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.log_height > 0 { self.log_height } else { 20 };
        self.log_scroll = total_lines.saturating_sub(visible_height);
    }
}

pub(crate) fn http_transport(config: &Config, path: &str) -> anyhow::Result<Arc<dyn Transport>> {
    let mut transport = HttpTransport::with_base(&config.api_base_url, path);
    if let Some(secs) = config.request_timeout_secs {
        transport = transport.timeout(Duration::from_secs(secs))?;
    }
    Ok(Arc::new(transport))
}
