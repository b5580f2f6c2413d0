//! Workstation keys and their local effect
//!
//! Keys either edit the display locally or raise an attention identifier
//! that the session turns into an inbound record.

use super::display::{Display, TypeOutcome};
use super::encoder::AidKey;
use crate::error::ValidationError;

/// A key press after keyboard-layout translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Aid(AidKey),
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    NewLine,
    Backspace,
    Delete,
    Insert,
    EraseEof,
    FieldExit,
    FieldPlus,
    FieldMinus,
    Dup,
    Reset,
}

/// Modifier state accompanying a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };
}

/// What a key did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEffect {
    /// Display changed locally, nothing to send
    Local,
    /// The host must be told; encode this attention key
    Aid(AidKey),
}

/// Fold modifiers into the key they select
///
/// Shift+Tab is Back Tab and Shift+F1..F12 are F13..F24.
pub fn resolve(key: Key, modifiers: Modifiers) -> Key {
    if !modifiers.shift {
        return key;
    }
    match key {
        Key::Tab => Key::BackTab,
        Key::Aid(AidKey::F(n)) if n <= 12 => Key::Aid(AidKey::F(n + 12)),
        other => other,
    }
}

/// Keys still accepted while the keyboard is locked
fn allowed_while_locked(key: Key) -> bool {
    matches!(
        key,
        Key::Reset | Key::Aid(AidKey::SysReq) | Key::Aid(AidKey::Attention)
    )
}

/// Apply a key to the display
pub fn apply_key(display: &mut Display, key: Key, modifiers: Modifiers) -> Result<KeyEffect, ValidationError> {
    let key = resolve(key, modifiers);
    if display.oia().is_keyboard_locked() && !allowed_while_locked(key) {
        return Err(ValidationError::KeyboardLocked);
    }

    match key {
        Key::Char(ch) => {
            if display.type_char(ch)? == TypeOutcome::AutoEnter {
                return Ok(KeyEffect::Aid(AidKey::Enter));
            }
        }
        Key::Aid(aid) => return Ok(KeyEffect::Aid(aid)),
        Key::Tab => display.tab(),
        Key::BackTab => display.backtab(),
        Key::Up => display.move_cursor(-1, 0),
        Key::Down => display.move_cursor(1, 0),
        Key::Left => display.move_cursor(0, -1),
        Key::Right => display.move_cursor(0, 1),
        Key::Home => display.set_cursor_home(),
        Key::NewLine => display.newline(),
        Key::Backspace => display.backspace()?,
        Key::Delete => display.delete_char()?,
        Key::Insert => display.toggle_insert(),
        Key::EraseEof => display.erase_eof()?,
        Key::FieldExit | Key::FieldPlus => display.field_exit(false)?,
        Key::FieldMinus => display.field_exit(true)?,
        Key::Dup => display.dup()?,
        Key::Reset => display.reset(),
    }
    Ok(KeyEffect::Local)
}

fn mnemonic(name: &str) -> Option<Key> {
    let key = match name {
        "enter" => Key::Aid(AidKey::Enter),
        "tab" => Key::Tab,
        "backtab" => Key::BackTab,
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        "home" => Key::Home,
        "pgup" | "pageup" | "rolldown" => Key::Aid(AidKey::RollDown),
        "pgdown" | "pagedown" | "rollup" => Key::Aid(AidKey::RollUp),
        "clear" => Key::Aid(AidKey::Clear),
        "help" => Key::Aid(AidKey::Help),
        "print" | "hostprint" => Key::Aid(AidKey::Print),
        "recbksp" => Key::Aid(AidKey::RecordBackspace),
        "sysreq" => Key::Aid(AidKey::SysReq),
        "attn" => Key::Aid(AidKey::Attention),
        "reset" => Key::Reset,
        "field+" => Key::FieldPlus,
        "field-" => Key::FieldMinus,
        "fldext" | "fieldexit" => Key::FieldExit,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "insert" => Key::Insert,
        "newline" => Key::NewLine,
        "eof" | "eraseeof" => Key::EraseEof,
        "dup" => Key::Dup,
        other => {
            let number = other
                .strip_prefix("pf")
                .or_else(|| other.strip_prefix('f'))?
                .parse::<u8>()
                .ok()?;
            Key::Aid(AidKey::function(number)?)
        }
    };
    Some(key)
}

/// Parse a key script such as `"USER1[tab]SECRET[enter]"`
///
/// Bracketed names are case-insensitive; `[[` is a literal `[`.
pub fn parse_keys(input: &str) -> Result<Vec<Key>, ValidationError> {
    let mut keys = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '[' {
            keys.push(Key::Char(ch));
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            keys.push(Key::Char('['));
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == ']' {
                closed = true;
                break;
            }
            name.push(c);
        }
        if !closed {
            return Err(ValidationError::UnknownKey(format!("[{name}")));
        }
        let key = mnemonic(&name.to_ascii_lowercase())
            .ok_or_else(|| ValidationError::UnknownKey(name.clone()))?;
        keys.push(key);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib5250::field::{Field, FieldFormat, FFW1_ID, FFW2_AUTO_ENTER};

    fn unlocked_display(ffw2: u8) -> Display {
        let mut display = Display::default();
        let (screen, fields) = display.screen_and_fields_mut();
        fields
            .define(Field::input(81, 3, 0x20, FieldFormat::new(FFW1_ID, ffw2), vec![]), screen)
            .unwrap();
        fields
            .define(Field::input(161, 5, 0x20, FieldFormat::new(FFW1_ID, 0x00), vec![]), screen)
            .unwrap();
        display.oia_mut().unlock_keyboard();
        display.set_cursor(81);
        display
    }

    #[test]
    fn test_parse_key_script() {
        let keys = parse_keys("AB[tab]C[ENTER][pf3][[").unwrap();
        assert_eq!(
            keys,
            vec![
                Key::Char('A'),
                Key::Char('B'),
                Key::Tab,
                Key::Char('C'),
                Key::Aid(AidKey::Enter),
                Key::Aid(AidKey::F(3)),
                Key::Char('['),
            ]
        );
        assert_eq!(parse_keys("[f24]").unwrap(), vec![Key::Aid(AidKey::F(24))]);
        assert_eq!(parse_keys("[pgdown]").unwrap(), vec![Key::Aid(AidKey::RollUp)]);
    }

    #[test]
    fn test_parse_rejects_unknown_mnemonics() {
        assert_eq!(parse_keys("[bogus]"), Err(ValidationError::UnknownKey("bogus".to_string())));
        assert_eq!(parse_keys("[f25]"), Err(ValidationError::UnknownKey("f25".to_string())));
        assert!(matches!(parse_keys("abc[enter"), Err(ValidationError::UnknownKey(_))));
    }

    #[test]
    fn test_shift_modifiers() {
        assert_eq!(resolve(Key::Tab, Modifiers::SHIFT), Key::BackTab);
        assert_eq!(resolve(Key::Aid(AidKey::F(1)), Modifiers::SHIFT), Key::Aid(AidKey::F(13)));
        assert_eq!(resolve(Key::Aid(AidKey::F(13)), Modifiers::SHIFT), Key::Aid(AidKey::F(13)));
        assert_eq!(resolve(Key::Tab, Modifiers::NONE), Key::Tab);
    }

    #[test]
    fn test_locked_keyboard_only_allows_reset_and_interrupts() {
        let mut display = unlocked_display(0x00);
        display.oia_mut().lock_keyboard();
        assert_eq!(
            apply_key(&mut display, Key::Char('A'), Modifiers::NONE),
            Err(ValidationError::KeyboardLocked)
        );
        assert_eq!(
            apply_key(&mut display, Key::Aid(AidKey::Enter), Modifiers::NONE),
            Err(ValidationError::KeyboardLocked)
        );
        assert_eq!(
            apply_key(&mut display, Key::Aid(AidKey::SysReq), Modifiers::NONE),
            Ok(KeyEffect::Aid(AidKey::SysReq))
        );
        assert_eq!(apply_key(&mut display, Key::Reset, Modifiers::NONE), Ok(KeyEffect::Local));
    }

    #[test]
    fn test_typing_and_tab() {
        let mut display = unlocked_display(0x00);
        for key in parse_keys("ab[tab]").unwrap() {
            assert_eq!(apply_key(&mut display, key, Modifiers::NONE), Ok(KeyEffect::Local));
        }
        assert_eq!(display.fields().text(display.screen(), 0), "ab");
        assert_eq!(display.cursor(), 161);
        apply_key(&mut display, Key::Tab, Modifiers::SHIFT).unwrap();
        assert_eq!(display.cursor(), 81);
    }

    #[test]
    fn test_auto_enter_raises_enter() {
        let mut display = unlocked_display(FFW2_AUTO_ENTER);
        apply_key(&mut display, Key::Char('x'), Modifiers::NONE).unwrap();
        apply_key(&mut display, Key::Char('y'), Modifiers::NONE).unwrap();
        assert_eq!(
            apply_key(&mut display, Key::Char('z'), Modifiers::NONE),
            Ok(KeyEffect::Aid(AidKey::Enter))
        );
    }
}
