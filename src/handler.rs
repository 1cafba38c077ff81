use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::App;
use crate::tui::AppEvent;

const MOUSE_SCROLL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Paste(text) => app.conversation.insert_str(&text),
        AppEvent::ReplySettled(result) => app.apply_reply(result),
        AppEvent::CopiedExpired(generation) => app.expire_copied(generation),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.shutdown(),
            KeyCode::Char('u') => app.conversation.set_draft_input(String::new()),
            KeyCode::Char('y') => app.copy_selected(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_draft(),
        KeyCode::Esc => {
            if app.selected_message.is_some() {
                app.clear_selection();
            } else if app.conversation.draft_input().is_empty() {
                app.shutdown();
            }
        }

        // Message selection
        KeyCode::Up => app.select_prev_message(),
        KeyCode::Down => app.select_next_message(),

        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),

        // Draft editing (the store ignores these while a reply is pending)
        KeyCode::Backspace => app.conversation.delete_before_cursor(),
        KeyCode::Delete => app.conversation.delete_at_cursor(),
        KeyCode::Left => app.conversation.move_cursor_left(),
        KeyCode::Right => app.conversation.move_cursor_right(),
        KeyCode::Home => app.conversation.move_cursor_home(),
        KeyCode::End => app.conversation.move_cursor_end(),
        KeyCode::Char(c) => app.conversation.insert_char(c),

        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => app.scroll_down(MOUSE_SCROLL_LINES),
        _ => {}
    }
}
