use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use crate::chat::{ReplyUnavailable, Transport};
use crate::clipboard;
use crate::state::{Conversation, COPIED_INDICATOR_DURATION};
use crate::tui::AppEvent;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub conversation: Conversation,
    pub endpoint: String,

    // Selection (for copying)
    pub selected_message: Option<usize>,
    pub reveal_selected: bool,

    // Chat pane scrolling (dimensions updated during render)
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16,
    pub total_chat_lines: u16,

    pub animation_frame: u8, // 0-2 for ellipsis animation

    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<AppEvent>,
    reply_task: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(
        transport: Arc<dyn Transport>,
        events: mpsc::UnboundedSender<AppEvent>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),
            endpoint: endpoint.into(),

            selected_message: None,
            reveal_selected: false,

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,
            total_chat_lines: 0,

            animation_frame: 0,

            transport,
            events,
            reply_task: None,
        }
    }

    /// Submit the draft and start the exchange in the background.
    ///
    /// The settled result comes back as [`AppEvent::ReplySettled`].
    pub fn submit_draft(&mut self) {
        let Some(text) = self.conversation.submit_draft() else {
            return;
        };

        debug!(chars = text.chars().count(), "dispatching chat request");
        self.selected_message = None;
        self.follow_bottom = true;
        self.animation_frame = 0;

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        self.reply_task = Some(tokio::spawn(async move {
            let result = transport.send(&text).await;
            if events.send(AppEvent::ReplySettled(result)).is_err() {
                debug!("chat reply arrived after shutdown; dropped");
            }
        }));
    }

    pub fn apply_reply(&mut self, result: Result<String, ReplyUnavailable>) {
        self.reply_task = None;
        let applied = match result {
            Ok(reply) => {
                debug!(chars = reply.chars().count(), "chat reply received");
                self.conversation.on_reply_received(reply)
            }
            Err(err) => {
                warn!("{}", err);
                self.conversation.on_reply_failed()
            }
        };

        if applied {
            self.follow_bottom = true;
        }
    }

    /// Copy the selected message, or the newest one if none is selected.
    pub fn copy_selected(&mut self) {
        let Some(index) = self.copy_target() else {
            return;
        };
        let Some(message) = self.conversation.messages().get(index) else {
            return;
        };

        match clipboard::copy_to_clipboard(&message.text) {
            Ok(()) => self.mark_copied(index),
            Err(err) => {
                warn!("clipboard copy failed: {:#}", err);
                self.mark_copy_failed(index);
            }
        }
    }

    pub fn copy_target(&self) -> Option<usize> {
        self.selected_message
            .or_else(|| self.conversation.messages().len().checked_sub(1))
    }

    /// Show the copied indicator and schedule its reset.
    pub fn mark_copied(&mut self, index: usize) {
        let generation = self.conversation.mark_copied(index);
        self.schedule_copy_reset(generation);
    }

    /// Show a failed-copy marker for the same duration as the copied indicator.
    pub fn mark_copy_failed(&mut self, index: usize) {
        let generation = self.conversation.mark_copy_failed(index);
        self.schedule_copy_reset(generation);
    }

    fn schedule_copy_reset(&self, generation: Option<u64>) {
        let Some(generation) = generation else {
            return;
        };

        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPIED_INDICATOR_DURATION).await;
            let _ = events.send(AppEvent::CopiedExpired(generation));
        });
    }

    pub fn expire_copied(&mut self, generation: u64) {
        self.conversation.clear_copied(generation);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn select_prev_message(&mut self) {
        let count = self.conversation.messages().len();
        if count == 0 {
            return;
        }
        self.selected_message = Some(match self.selected_message {
            Some(i) => i.saturating_sub(1),
            None => count - 1,
        });
        self.reveal_selected = true;
    }

    pub fn select_next_message(&mut self) {
        let count = self.conversation.messages().len();
        match self.selected_message {
            Some(i) if i + 1 < count => {
                self.selected_message = Some(i + 1);
                self.reveal_selected = true;
            }
            // Moving past the last message drops the selection
            Some(_) => {
                self.selected_message = None;
                self.follow_bottom = true;
            }
            None => {}
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_message = None;
    }

    fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.follow_bottom {
            self.chat_scroll = self.max_scroll();
        }
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_scroll());
        self.follow_bottom = self.chat_scroll >= self.max_scroll();
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    /// Stop any in-flight exchange and leave the loop.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.reply_task.take() {
            debug!("aborting in-flight chat request");
            task.abort();
        }
        self.should_quit = true;
    }
}
