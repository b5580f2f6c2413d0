/// Telnet negotiation and record framing for TN5250
///
/// The host drives option negotiation (RFC 854/855); the workstation must
/// end up with BINARY and END-OF-RECORD agreed in both directions before
/// 5250 records flow. TERMINAL-TYPE and NEW-ENVIRON answer the host's
/// questions about the device (RFC 1091, RFC 1572, RFC 4777).

use std::collections::{BTreeMap, HashMap};

use log::{debug, trace, warn};

use crate::config::{ScreenGeometry, SessionConfig, MAX_DEVICE_NAME_LEN};
use crate::error::{NegotiationError, ProtocolError, TelnetError};

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;
pub const EOR: u8 = 239;

/// TERMINAL-TYPE and NEW-ENVIRON subcommands
pub const TELQUAL_IS: u8 = 0;
pub const TELQUAL_SEND: u8 = 1;
pub const TELQUAL_INFO: u8 = 2;

/// NEW-ENVIRON type bytes
pub const ENV_VAR: u8 = 0;
pub const ENV_VALUE: u8 = 1;
pub const ENV_ESC: u8 = 2;
pub const ENV_USERVAR: u8 = 3;

/// Terminal types announced during negotiation
pub const TERMINAL_TYPE_STANDARD: &str = "IBM-3179-2";
pub const TERMINAL_TYPE_WIDE: &str = "IBM-3477-FC";
pub const TERMINAL_TYPE_DBCS: &str = "IBM-5555-C01";

/// Well-known variables sent as VAR rather than USERVAR
const WELL_KNOWN_VARS: &[&str] = &["USER", "JOB", "ACCT", "PRINTER", "SYSTEMTYPE", "DISPLAY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    Binary = 0,
    SuppressGoAhead = 3,
    TimingMark = 6,
    TerminalType = 24,
    EndOfRecord = 25,
    NewEnviron = 39,
}

impl TelnetOption {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TelnetOption::Binary),
            3 => Some(TelnetOption::SuppressGoAhead),
            6 => Some(TelnetOption::TimingMark),
            24 => Some(TelnetOption::TerminalType),
            25 => Some(TelnetOption::EndOfRecord),
            39 => Some(TelnetOption::NewEnviron),
            _ => None,
        }
    }

    /// Options this workstation agrees to in either direction
    fn is_supported(self) -> bool {
        matches!(
            self,
            TelnetOption::Binary
                | TelnetOption::EndOfRecord
                | TelnetOption::SuppressGoAhead
                | TelnetOption::TerminalType
                | TelnetOption::NewEnviron
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    NotNegotiated,
    Enabled,
    Disabled,
}

/// Lifecycle of the negotiator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegotiatorState {
    Init,
    Negotiating,
    Ready,
    Closed,
    Failed,
}

/// Terminal type for a geometry and codec
pub fn terminal_type_for(geometry: ScreenGeometry, double_byte: bool) -> &'static str {
    if double_byte {
        TERMINAL_TYPE_DBCS
    } else if geometry == ScreenGeometry::Wide {
        TERMINAL_TYPE_WIDE
    } else {
        TERMINAL_TYPE_STANDARD
    }
}

/// Character set id paired with a code page in CHARSET
fn charset_for(codepage: &str) -> &'static str {
    match codepage {
        "939" | "930" => "1172",
        _ => "697",
    }
}

/// What the device tells the host about itself, plus the framing limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub terminal_type: String,
    pub device_name: Option<String>,
    pub keyboard_type: String,
    pub codepage: String,
    pub charset: String,
    pub environment: BTreeMap<String, String>,
    /// Longest record accepted between IAC EOR markers
    pub max_record_len: usize,
}

impl DeviceSettings {
    pub fn from_config(config: &SessionConfig, double_byte: bool) -> Self {
        Self {
            terminal_type: config
                .terminal_type
                .clone()
                .unwrap_or_else(|| terminal_type_for(config.geometry, double_byte).to_string()),
            device_name: config.device_name.clone(),
            keyboard_type: config.keyboard_type.clone(),
            codepage: config.codepage.clone(),
            charset: charset_for(&config.codepage).to_string(),
            environment: config.environment.clone(),
            max_record_len: config.max_record_len,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default(), false)
    }
}

/// Output of feeding inbound bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Received {
    /// Complete 5250 records, telnet framing removed, in arrival order
    pub records: Vec<Vec<u8>>,
    /// Negotiation replies to write back
    pub reply: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parse {
    Data,
    Iac,
    Command(u8),
    SbOption,
    SbData,
    SbIac,
}

/// Telnet state machine for one connection
#[derive(Debug, Clone)]
pub struct Negotiator {
    state: NegotiatorState,
    /// Options we perform (WILL)
    local: HashMap<TelnetOption, OptionState>,
    /// Options the host performs (DO)
    remote: HashMap<TelnetOption, OptionState>,
    device: DeviceSettings,
    parse: Parse,
    sb_option: u8,
    sb_data: Vec<u8>,
    record: Vec<u8>,
    mark_outstanding: bool,
    error: Option<TelnetError>,
}

impl Negotiator {
    pub fn new(device: DeviceSettings) -> Result<Self, NegotiationError> {
        if let Some(name) = &device.device_name {
            if name.len() > MAX_DEVICE_NAME_LEN {
                return Err(NegotiationError::DeviceNameTooLong(name.len()));
            }
        }
        Ok(Self {
            state: NegotiatorState::Init,
            local: HashMap::new(),
            remote: HashMap::new(),
            device,
            parse: Parse::Data,
            sb_option: 0,
            sb_data: Vec::new(),
            record: Vec::new(),
            mark_outstanding: false,
            error: None,
        })
    }

    pub fn state(&self) -> NegotiatorState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == NegotiatorState::Ready
    }

    pub fn error(&self) -> Option<&TelnetError> {
        self.error.as_ref()
    }

    pub fn device(&self) -> &DeviceSettings {
        &self.device
    }

    pub fn local_state(&self, option: TelnetOption) -> OptionState {
        self.local.get(&option).copied().unwrap_or(OptionState::NotNegotiated)
    }

    pub fn remote_state(&self, option: TelnetOption) -> OptionState {
        self.remote.get(&option).copied().unwrap_or(OptionState::NotNegotiated)
    }

    /// Connection established; the host speaks first
    pub fn start(&mut self) {
        if self.state == NegotiatorState::Init {
            self.state = NegotiatorState::Negotiating;
        }
    }

    pub fn close(&mut self) {
        if self.state != NegotiatorState::Failed {
            self.state = NegotiatorState::Closed;
        }
    }

    /// Feed bytes read from the transport
    pub fn receive(&mut self, data: &[u8]) -> Result<Received, TelnetError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.state == NegotiatorState::Closed {
            return Ok(Received::default());
        }
        self.start();

        let mut received = Received::default();
        for &byte in data {
            self.parse = match (self.parse, byte) {
                (Parse::Data, IAC) => Parse::Iac,
                (Parse::Data, _) => {
                    self.push_record_byte(byte)?;
                    Parse::Data
                }
                (Parse::Iac, IAC) => {
                    self.push_record_byte(IAC)?;
                    Parse::Data
                }
                (Parse::Iac, EOR) => {
                    let record = std::mem::take(&mut self.record);
                    trace!("record of {} bytes complete", record.len());
                    received.records.push(record);
                    Parse::Data
                }
                (Parse::Iac, WILL | WONT | DO | DONT) => Parse::Command(byte),
                (Parse::Iac, SB) => Parse::SbOption,
                (Parse::Iac, other) => {
                    trace!("ignoring telnet command {other}");
                    Parse::Data
                }
                (Parse::Command(command), option) => {
                    self.process_command(command, option, &mut received.reply)?;
                    Parse::Data
                }
                (Parse::SbOption, option) => {
                    self.sb_option = option;
                    self.sb_data.clear();
                    Parse::SbData
                }
                (Parse::SbData, IAC) => Parse::SbIac,
                (Parse::SbData, _) => {
                    self.sb_data.push(byte);
                    Parse::SbData
                }
                (Parse::SbIac, IAC) => {
                    self.sb_data.push(IAC);
                    Parse::SbData
                }
                (Parse::SbIac, SE) => {
                    let data = std::mem::take(&mut self.sb_data);
                    self.process_subnegotiation(self.sb_option, &data, &mut received.reply)?;
                    Parse::Data
                }
                (Parse::SbIac, _) => {
                    return Err(self.fail(NegotiationError::MalformedSubnegotiation {
                        option: self.sb_option,
                    })
                    .into());
                }
            };
        }
        self.update_ready();
        Ok(received)
    }

    fn fail<E>(&mut self, error: E) -> E
    where
        E: Into<TelnetError> + Clone + std::fmt::Display,
    {
        warn!("telnet stream failed: {error}");
        self.state = NegotiatorState::Failed;
        self.error = Some(error.clone().into());
        error
    }

    fn push_record_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        let max = self.device.max_record_len;
        if self.record.len() >= max {
            let length = self.record.len() + 1;
            self.record = Vec::new();
            return Err(self.fail(ProtocolError::RecordTooLong { length, max }));
        }
        self.record.push(byte);
        Ok(())
    }

    fn update_ready(&mut self) {
        if self.state != NegotiatorState::Negotiating {
            return;
        }
        let agreed = [TelnetOption::Binary, TelnetOption::EndOfRecord].iter().all(|&opt| {
            self.local_state(opt) == OptionState::Enabled && self.remote_state(opt) == OptionState::Enabled
        });
        if agreed {
            debug!("telnet negotiation complete, terminal type {}", self.device.terminal_type);
            self.state = NegotiatorState::Ready;
        }
    }

    fn refusal_error(option: TelnetOption) -> Option<NegotiationError> {
        match option {
            TelnetOption::Binary => Some(NegotiationError::BinaryRequired),
            TelnetOption::EndOfRecord => Some(NegotiationError::EndOfRecordRequired),
            _ => None,
        }
    }

    /// Handle WILL/WONT/DO/DONT from the host
    fn process_command(&mut self, command: u8, option: u8, reply: &mut Vec<u8>) -> Result<(), NegotiationError> {
        trace!("telnet command {command} option {option}");
        let Some(telnet_option) = TelnetOption::from_u8(option) else {
            // Unknown options are always refused
            match command {
                WILL => reply.extend_from_slice(&[IAC, DONT, option]),
                DO => reply.extend_from_slice(&[IAC, WONT, option]),
                _ => {}
            }
            return Ok(());
        };

        if telnet_option == TelnetOption::TimingMark {
            match command {
                WILL | WONT => self.mark_outstanding = false,
                DO => reply.extend_from_slice(&[IAC, WILL, option]),
                _ => {}
            }
            return Ok(());
        }

        match command {
            WILL => {
                if telnet_option.is_supported() {
                    if self.remote_state(telnet_option) != OptionState::Enabled {
                        self.remote.insert(telnet_option, OptionState::Enabled);
                        reply.extend_from_slice(&[IAC, DO, option]);
                    }
                } else {
                    self.remote.insert(telnet_option, OptionState::Disabled);
                    reply.extend_from_slice(&[IAC, DONT, option]);
                }
            }
            WONT => {
                let previous = self.remote.insert(telnet_option, OptionState::Disabled);
                if let Some(error) = Self::refusal_error(telnet_option) {
                    return Err(self.fail(error));
                }
                if previous == Some(OptionState::Enabled) {
                    reply.extend_from_slice(&[IAC, DONT, option]);
                }
            }
            DO => {
                if telnet_option.is_supported() {
                    if self.local_state(telnet_option) != OptionState::Enabled {
                        self.local.insert(telnet_option, OptionState::Enabled);
                        reply.extend_from_slice(&[IAC, WILL, option]);
                    }
                } else {
                    self.local.insert(telnet_option, OptionState::Disabled);
                    reply.extend_from_slice(&[IAC, WONT, option]);
                }
            }
            DONT => {
                let previous = self.local.insert(telnet_option, OptionState::Disabled);
                if let Some(error) = Self::refusal_error(telnet_option) {
                    return Err(self.fail(error));
                }
                if previous == Some(OptionState::Enabled) {
                    reply.extend_from_slice(&[IAC, WONT, option]);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle IAC SB ... IAC SE
    fn process_subnegotiation(&mut self, option: u8, data: &[u8], reply: &mut Vec<u8>) -> Result<(), NegotiationError> {
        match TelnetOption::from_u8(option) {
            Some(TelnetOption::TerminalType) => match data.first() {
                Some(&TELQUAL_SEND) => {
                    debug!("sending terminal type {}", self.device.terminal_type);
                    let mut payload = vec![TELQUAL_IS];
                    payload.extend_from_slice(self.device.terminal_type.as_bytes());
                    append_subnegotiation(reply, option, &payload);
                    Ok(())
                }
                Some(_) => Ok(()),
                None => Err(self.fail(NegotiationError::MalformedSubnegotiation { option })),
            },
            Some(TelnetOption::NewEnviron) => match data.first() {
                Some(&TELQUAL_SEND) => {
                    let payload = self.environment_response();
                    append_subnegotiation(reply, option, &payload);
                    Ok(())
                }
                Some(&TELQUAL_IS) | Some(&TELQUAL_INFO) => Ok(()),
                Some(_) => Ok(()),
                None => Err(self.fail(NegotiationError::MalformedSubnegotiation { option })),
            },
            _ => {
                trace!("ignoring subnegotiation for option {option}");
                Ok(())
            }
        }
    }

    /// NEW-ENVIRON IS payload with the device variables
    fn environment_response(&self) -> Vec<u8> {
        let mut payload = vec![TELQUAL_IS];
        if let Some(name) = &self.device.device_name {
            push_variable(&mut payload, ENV_USERVAR, "DEVNAME", name);
        }
        push_variable(&mut payload, ENV_USERVAR, "KBDTYPE", &self.device.keyboard_type);
        push_variable(&mut payload, ENV_USERVAR, "CODEPAGE", &self.device.codepage);
        push_variable(&mut payload, ENV_USERVAR, "CHARSET", &self.device.charset);
        for (name, value) in &self.device.environment {
            let kind = if WELL_KNOWN_VARS.contains(&name.as_str()) {
                ENV_VAR
            } else {
                ENV_USERVAR
            };
            push_variable(&mut payload, kind, name, value);
        }
        payload
    }

    /// Keepalive timing mark; any WILL/WONT TIMING-MARK answers it
    pub fn timing_mark(&mut self) -> Vec<u8> {
        self.mark_outstanding = true;
        vec![IAC, DO, TelnetOption::TimingMark as u8]
    }

    pub fn mark_outstanding(&self) -> bool {
        self.mark_outstanding
    }
}

/// Escape NEW-ENVIRON control bytes inside a name or value
fn push_escaped(out: &mut Vec<u8>, text: &str) {
    for &byte in text.as_bytes() {
        if matches!(byte, ENV_VAR | ENV_VALUE | ENV_ESC | ENV_USERVAR) {
            out.push(ENV_ESC);
        }
        out.push(byte);
    }
}

fn push_variable(out: &mut Vec<u8>, kind: u8, name: &str, value: &str) {
    out.push(kind);
    push_escaped(out, name);
    out.push(ENV_VALUE);
    push_escaped(out, value);
}

/// IAC SB option payload IAC SE, doubling IAC inside the payload
fn append_subnegotiation(out: &mut Vec<u8>, option: u8, payload: &[u8]) {
    out.extend_from_slice(&[IAC, SB, option]);
    escape_iac_into(out, payload);
    out.extend_from_slice(&[IAC, SE]);
}

fn escape_iac_into(out: &mut Vec<u8>, data: &[u8]) {
    for &byte in data {
        if byte == IAC {
            out.push(IAC);
        }
        out.push(byte);
    }
}

/// Frame an outbound record: double IAC and terminate with IAC EOR
pub fn frame_record(record: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(record.len() + 4);
    escape_iac_into(&mut out, record);
    out.extend_from_slice(&[IAC, EOR]);
    out
}
