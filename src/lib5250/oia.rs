//! Operator Information Area
//!
//! The status line below the screen: keyboard lock, insert mode, message
//! waiting light and why input is currently inhibited.

/// Why the operator cannot type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InhibitReason {
    #[default]
    NotInhibited,
    /// Waiting for the host to answer
    SystemWait,
    CommCheck,
    ProgCheck,
    MachineCheck,
    /// Operator error, usually raised by Write Error Code
    Other,
}

impl InhibitReason {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotInhibited),
            1 => Some(Self::SystemWait),
            2 => Some(Self::CommCheck),
            3 => Some(Self::ProgCheck),
            4 => Some(Self::MachineCheck),
            5 => Some(Self::Other),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::NotInhibited => 0,
            Self::SystemWait => 1,
            Self::CommCheck => 2,
            Self::ProgCheck => 3,
            Self::MachineCheck => 4,
            Self::Other => 5,
        }
    }
}

/// Status indicators of one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Oia {
    keyboard_locked: bool,
    insert_mode: bool,
    message_light: bool,
    inhibit: InhibitReason,
    /// Check code shown next to CommCheck, ProgCheck or MachineCheck
    inhibit_code: u16,
    inhibit_message: Option<String>,
    alarms: u32,
}

impl Oia {
    /// Fresh OIA: locked in system wait until the host grants input
    pub fn new() -> Self {
        Self {
            keyboard_locked: true,
            inhibit: InhibitReason::SystemWait,
            ..Self::default()
        }
    }

    pub fn is_keyboard_locked(&self) -> bool {
        self.keyboard_locked
    }

    pub fn is_insert_mode(&self) -> bool {
        self.insert_mode
    }

    pub fn is_message_light_on(&self) -> bool {
        self.message_light
    }

    pub fn inhibit_reason(&self) -> InhibitReason {
        self.inhibit
    }

    pub fn inhibit_code(&self) -> u16 {
        self.inhibit_code
    }

    pub fn inhibit_message(&self) -> Option<&str> {
        self.inhibit_message.as_deref()
    }

    /// Alarms sounded since the OIA was created
    pub fn alarm_count(&self) -> u32 {
        self.alarms
    }

    /// Lock for a host round trip
    pub fn lock_keyboard(&mut self) {
        self.keyboard_locked = true;
        if self.inhibit == InhibitReason::NotInhibited {
            self.inhibit = InhibitReason::SystemWait;
        }
    }

    /// Grant input; any inhibit condition is cleared
    pub fn unlock_keyboard(&mut self) {
        self.keyboard_locked = false;
        self.inhibit = InhibitReason::NotInhibited;
        self.inhibit_code = 0;
        self.inhibit_message = None;
    }

    /// Inhibit input for `reason`; the keyboard stays locked until unlocked
    pub fn set_inhibited(&mut self, reason: InhibitReason, code: u16, message: Option<String>) {
        if reason == InhibitReason::NotInhibited {
            self.unlock_keyboard();
            return;
        }
        self.keyboard_locked = true;
        self.inhibit = reason;
        self.inhibit_code = code;
        self.inhibit_message = message;
    }

    pub fn set_insert_mode(&mut self, insert: bool) {
        self.insert_mode = insert;
    }

    pub fn set_message_light(&mut self, on: bool) {
        self.message_light = on;
    }

    pub fn sound_alarm(&mut self) {
        self.alarms = self.alarms.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_oia_waits_for_host() {
        let oia = Oia::new();
        assert!(oia.is_keyboard_locked());
        assert_eq!(oia.inhibit_reason(), InhibitReason::SystemWait);
    }

    #[test]
    fn test_unlock_clears_inhibit() {
        let mut oia = Oia::new();
        oia.set_inhibited(InhibitReason::ProgCheck, 0x0022, Some("bad address".to_string()));
        assert!(oia.is_keyboard_locked());
        assert_eq!(oia.inhibit_code(), 0x0022);
        oia.unlock_keyboard();
        assert!(!oia.is_keyboard_locked());
        assert_eq!(oia.inhibit_reason(), InhibitReason::NotInhibited);
        assert_eq!(oia.inhibit_message(), None);
    }

    #[test]
    fn test_lock_keeps_existing_reason() {
        let mut oia = Oia::new();
        oia.set_inhibited(InhibitReason::Other, 0, None);
        oia.lock_keyboard();
        assert_eq!(oia.inhibit_reason(), InhibitReason::Other);
    }

    #[test]
    fn test_inhibit_reason_codes() {
        for code in 0..=5 {
            assert_eq!(InhibitReason::from_u8(code).map(InhibitReason::to_u8), Some(code));
        }
        assert_eq!(InhibitReason::from_u8(6), None);
    }
}
