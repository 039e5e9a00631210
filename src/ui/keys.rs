use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Volume change per key press, in percent.
pub const VOLUME_STEP: u8 = 5;

/// Auto-stop choices in minutes; `0` is off.
pub const TIMER_PRESETS: [u32; 6] = [0, 15, 30, 60, 90, 120];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePlay,
    ToggleMute,
    VolumeUp,
    VolumeDown,
    NextSound,
    PreviousSound,
    CycleTimer,
    Quit,
}

pub fn map_key(event: &KeyEvent) -> Option<KeyAction> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(event.code, KeyCode::Char('c')).then_some(KeyAction::Quit);
    }
    match event.code {
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Enter => Some(KeyAction::TogglePlay),
        KeyCode::Char('m') => Some(KeyAction::ToggleMute),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => Some(KeyAction::VolumeUp),
        KeyCode::Char('-') | KeyCode::Down => Some(KeyAction::VolumeDown),
        KeyCode::Char('n') | KeyCode::Right => Some(KeyAction::NextSound),
        KeyCode::Char('b') | KeyCode::Left => Some(KeyAction::PreviousSound),
        KeyCode::Char('t') => Some(KeyAction::CycleTimer),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

pub fn volume_up(percent: u8) -> u8 {
    percent.saturating_add(VOLUME_STEP).min(100)
}

pub fn volume_down(percent: u8) -> u8 {
    percent.saturating_sub(VOLUME_STEP)
}

/// Next preset after `current`, wrapping to off.
pub fn next_timer_preset(current: u32) -> u32 {
    TIMER_PRESETS.iter().copied().find(|&preset| preset > current).unwrap_or(0)
}
