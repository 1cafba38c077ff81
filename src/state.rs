//! Conversation state store
//!
//! Holds the message list, the draft input, the awaiting-reply flag and the
//! transient "copied" indicator. Every mutation goes through the methods
//! below; the store performs no I/O and never fails. Dispatching the request
//! and scheduling the indicator reset are left to the caller (see `app`).

use std::time::Duration;

/// Assistant text shown in place of a reply when the exchange fails.
pub const REPLY_ERROR_TEXT: &str = "⚠️ Server error. Please try again.";

/// How long the copied indicator stays visible.
pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_millis(1200);

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CopiedIndicator {
    index: usize,
    generation: u64,
    outcome: CopyOutcome,
}

/// Result of a copy action, shown next to the message label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Failed,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    draft_input: String,
    draft_cursor: usize, // in chars, not bytes
    awaiting_reply: bool,
    copied: Option<CopiedIndicator>,
    copy_generation: u64,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    pub fn draft_cursor(&self) -> usize {
        self.draft_cursor
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Index of the message currently showing the copied indicator.
    pub fn copied_index(&self) -> Option<usize> {
        self.copied
            .filter(|c| c.outcome == CopyOutcome::Copied)
            .map(|c| c.index)
    }

    /// Message index and outcome of the most recent copy, while it is shown.
    pub fn copy_indicator(&self) -> Option<(usize, CopyOutcome)> {
        self.copied.map(|c| (c.index, c.outcome))
    }

    /// Commit the draft as a user message.
    ///
    /// Returns the text to send, or `None` (leaving the store untouched) if
    /// the draft is blank or a reply is still outstanding. The message keeps
    /// the draft exactly as typed; trimming is only used for the emptiness
    /// check.
    pub fn submit_draft(&mut self) -> Option<String> {
        if self.awaiting_reply || self.draft_input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.draft_input);
        self.draft_cursor = 0;
        self.messages.push(ChatMessage::user(text.clone()));
        self.awaiting_reply = true;
        Some(text)
    }

    /// Append the assistant reply and release the awaiting flag.
    ///
    /// Ignored (returns false) when no request is outstanding, so a request
    /// settles at most once.
    pub fn on_reply_received(&mut self, text: impl Into<String>) -> bool {
        self.settle(ChatMessage::assistant(text))
    }

    /// Append the fixed error reply and release the awaiting flag.
    pub fn on_reply_failed(&mut self) -> bool {
        self.settle(ChatMessage::assistant(REPLY_ERROR_TEXT))
    }

    fn settle(&mut self, message: ChatMessage) -> bool {
        if !self.awaiting_reply {
            return false;
        }
        self.messages.push(message);
        self.awaiting_reply = false;
        true
    }

    /// Replace the draft. Ignored while awaiting a reply.
    pub fn set_draft_input(&mut self, text: impl Into<String>) {
        if self.awaiting_reply {
            return;
        }
        self.draft_input = text.into();
        self.draft_cursor = self.draft_input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        if self.awaiting_reply {
            return;
        }
        let byte_pos = char_to_byte_index(&self.draft_input, self.draft_cursor);
        self.draft_input.insert(byte_pos, c);
        self.draft_cursor += 1;
    }

    /// Insert pasted text at the cursor. Line breaks become spaces since the
    /// draft is a single line.
    pub fn insert_str(&mut self, text: &str) {
        if self.awaiting_reply {
            return;
        }
        let single_line = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
        let byte_pos = char_to_byte_index(&self.draft_input, self.draft_cursor);
        self.draft_input.insert_str(byte_pos, &single_line);
        self.draft_cursor += single_line.chars().count();
    }

    /// Backspace
    pub fn delete_before_cursor(&mut self) {
        if self.awaiting_reply || self.draft_cursor == 0 {
            return;
        }
        self.draft_cursor -= 1;
        let byte_pos = char_to_byte_index(&self.draft_input, self.draft_cursor);
        self.draft_input.remove(byte_pos);
    }

    /// Delete
    pub fn delete_at_cursor(&mut self) {
        if self.awaiting_reply {
            return;
        }
        if self.draft_cursor < self.draft_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft_input, self.draft_cursor);
            self.draft_input.remove(byte_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if !self.awaiting_reply {
            self.draft_cursor = self.draft_cursor.saturating_sub(1);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if !self.awaiting_reply {
            let char_count = self.draft_input.chars().count();
            self.draft_cursor = (self.draft_cursor + 1).min(char_count);
        }
    }

    pub fn move_cursor_home(&mut self) {
        if !self.awaiting_reply {
            self.draft_cursor = 0;
        }
    }

    pub fn move_cursor_end(&mut self) {
        if !self.awaiting_reply {
            self.draft_cursor = self.draft_input.chars().count();
        }
    }

    /// Show the copied indicator on `index`.
    ///
    /// Returns the generation the caller must hand back to
    /// [`Conversation::clear_copied`] once [`COPIED_INDICATOR_DURATION`] has
    /// elapsed. Out-of-range indices are ignored.
    pub fn mark_copied(&mut self, index: usize) -> Option<u64> {
        self.show_copy_outcome(index, CopyOutcome::Copied)
    }

    /// Like [`Conversation::mark_copied`], for a copy that did not reach the clipboard.
    pub fn mark_copy_failed(&mut self, index: usize) -> Option<u64> {
        self.show_copy_outcome(index, CopyOutcome::Failed)
    }

    fn show_copy_outcome(&mut self, index: usize, outcome: CopyOutcome) -> Option<u64> {
        if index >= self.messages.len() {
            return None;
        }
        self.copy_generation += 1;
        self.copied = Some(CopiedIndicator {
            index,
            generation: self.copy_generation,
            outcome,
        });
        Some(self.copy_generation)
    }

    /// Clear the copied indicator if `generation` is still the latest one.
    pub fn clear_copied(&mut self, generation: u64) -> bool {
        match self.copied {
            Some(indicator) if indicator.generation == generation => {
                self.copied = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation_with_draft(text: &str) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.set_draft_input(text);
        conversation
    }

    #[test]
    fn test_submit_appends_user_message_and_awaits() {
        let mut conversation = conversation_with_draft("Hello");

        let sent = conversation.submit_draft();

        assert_eq!(sent.as_deref(), Some("Hello"));
        assert_eq!(conversation.messages(), &[ChatMessage::user("Hello")]);
        assert!(conversation.is_awaiting_reply());
        assert_eq!(conversation.draft_input(), "");
        assert_eq!(conversation.draft_cursor(), 0);
    }

    #[test]
    fn test_submit_keeps_untrimmed_text() {
        let mut conversation = conversation_with_draft("  spaced out ");

        assert_eq!(conversation.submit_draft().as_deref(), Some("  spaced out "));
        assert_eq!(conversation.messages()[0].text, "  spaced out ");
    }

    #[test]
    fn test_submit_blank_draft_is_noop() {
        for draft in ["", "   ", "\t\n "] {
            let mut conversation = conversation_with_draft(draft);

            assert!(conversation.submit_draft().is_none());
            assert!(conversation.messages().is_empty());
            assert_eq!(conversation.draft_input(), draft);
            assert!(!conversation.is_awaiting_reply());
        }
    }

    #[test]
    fn test_submit_while_awaiting_is_noop() {
        let mut conversation = conversation_with_draft("first");
        conversation.submit_draft();

        // The draft cannot be edited while awaiting, so it stays empty.
        conversation.set_draft_input("second");
        assert!(conversation.submit_draft().is_none());
        assert_eq!(conversation.messages().len(), 1);
        assert!(conversation.is_awaiting_reply());
    }

    #[test]
    fn test_reply_received_appends_assistant_message() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        assert!(conversation.on_reply_received("Hi there"));

        assert_eq!(
            conversation.messages(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there")]
        );
        assert!(!conversation.is_awaiting_reply());
    }

    #[test]
    fn test_reply_failed_appends_error_message() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        assert!(conversation.on_reply_failed());

        assert_eq!(
            conversation.messages(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant(REPLY_ERROR_TEXT)]
        );
        assert!(!conversation.is_awaiting_reply());
    }

    #[test]
    fn test_request_settles_only_once() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        assert!(conversation.on_reply_received("Hi"));
        assert!(!conversation.on_reply_failed());
        assert!(!conversation.on_reply_received("again"));

        assert_eq!(conversation.messages().len(), 2);
    }

    #[test]
    fn test_settle_without_request_is_ignored() {
        let mut conversation = Conversation::new();

        assert!(!conversation.on_reply_received("stray"));
        assert!(!conversation.on_reply_failed());
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn test_retry_after_failure() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();
        conversation.on_reply_failed();

        conversation.set_draft_input("Hello");
        assert_eq!(conversation.submit_draft().as_deref(), Some("Hello"));
        assert_eq!(conversation.messages().len(), 3);
    }

    #[test]
    fn test_draft_editing_is_utf8_safe() {
        let mut conversation = Conversation::new();
        for c in "héllo".chars() {
            conversation.insert_char(c);
        }
        conversation.move_cursor_left();
        conversation.move_cursor_left();
        conversation.delete_before_cursor();
        assert_eq!(conversation.draft_input(), "hélo");

        conversation.move_cursor_home();
        conversation.delete_at_cursor();
        assert_eq!(conversation.draft_input(), "élo");

        conversation.move_cursor_end();
        conversation.insert_char('!');
        assert_eq!(conversation.draft_input(), "élo!");
        assert_eq!(conversation.draft_cursor(), 4);
    }

    #[test]
    fn test_draft_locked_while_awaiting() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        conversation.set_draft_input("typed");
        conversation.insert_char('x');
        conversation.delete_before_cursor();

        assert_eq!(conversation.draft_input(), "");
        assert_eq!(conversation.draft_cursor(), 0);
    }

    #[test]
    fn test_mark_copied_rejects_invalid_index() {
        let mut conversation = Conversation::new();

        assert_eq!(conversation.mark_copied(0), None);
        assert_eq!(conversation.copied_index(), None);
    }

    #[test]
    fn test_copied_indicator_clears_with_its_generation() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        let generation = conversation.mark_copied(0).unwrap();
        assert_eq!(conversation.copied_index(), Some(0));

        assert!(conversation.clear_copied(generation));
        assert_eq!(conversation.copied_index(), None);
    }

    #[test]
    fn test_stale_copied_reset_does_not_clear_newer_indicator() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();
        conversation.on_reply_received("Hi");

        let first = conversation.mark_copied(0).unwrap();
        let second = conversation.mark_copied(1).unwrap();

        assert!(!conversation.clear_copied(first));
        assert_eq!(conversation.copied_index(), Some(1));

        assert!(conversation.clear_copied(second));
        assert_eq!(conversation.copied_index(), None);
    }

    #[test]
    fn test_remarking_same_index_extends_indicator() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        let first = conversation.mark_copied(0).unwrap();
        let second = conversation.mark_copied(0).unwrap();

        assert_ne!(first, second);
        assert!(!conversation.clear_copied(first));
        assert_eq!(conversation.copied_index(), Some(0));
    }

    #[test]
    fn test_failed_copy_is_shown_and_expires() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        let generation = conversation.mark_copy_failed(0).unwrap();
        assert_eq!(conversation.copy_indicator(), Some((0, CopyOutcome::Failed)));
        assert_eq!(conversation.copied_index(), None);

        assert!(conversation.clear_copied(generation));
        assert_eq!(conversation.copy_indicator(), None);
    }

    #[test]
    fn test_successful_copy_replaces_failed_marker() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        let failed = conversation.mark_copy_failed(0).unwrap();
        conversation.mark_copied(0).unwrap();

        assert!(!conversation.clear_copied(failed));
        assert_eq!(conversation.copy_indicator(), Some((0, CopyOutcome::Copied)));
    }

    #[test]
    fn test_pasted_line_breaks_become_spaces() {
        let mut conversation = conversation_with_draft("say: ");

        conversation.insert_str("first\nsecond\r\nthird");

        assert_eq!(conversation.draft_input(), "say: first second third");
        assert_eq!(conversation.draft_cursor(), conversation.draft_input().chars().count());
        assert!(conversation.messages().is_empty());
    }

    #[test]
    fn test_paste_inserts_at_cursor() {
        let mut conversation = conversation_with_draft("héllo");
        conversation.move_cursor_home();
        conversation.move_cursor_right();

        conversation.insert_str("ÿ");

        assert_eq!(conversation.draft_input(), "hÿéllo");
        assert_eq!(conversation.draft_cursor(), 2);
    }

    #[test]
    fn test_paste_ignored_while_awaiting() {
        let mut conversation = conversation_with_draft("Hello");
        conversation.submit_draft();

        conversation.insert_str("late paste");

        assert_eq!(conversation.draft_input(), "");
    }
}
