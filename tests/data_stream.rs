use tn5250r_core::codec::{CodecRegistry, Diagnostics};
use tn5250r_core::error::ProtocolError;
use tn5250r_core::lib5250::codes::*;
use tn5250r_core::lib5250::encoder::{build_record, RECORD_HEADER_LEN};
use tn5250r_core::lib5250::field::{FieldShift, FFW1_ID, FFW2_MANDATORY_ENTER};
use tn5250r_core::lib5250::keys::{apply_key, parse_keys, KeyEffect, Modifiers};
use tn5250r_core::lib5250::{AidKey, DataStreamDecoder, DeviceIdentity, Display, Order};

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(codepage: &str) -> DataStreamDecoder {
        let codec = CodecRegistry::builtin().get(codepage).unwrap();
        DataStreamDecoder::new(codec, Diagnostics::disabled(), DeviceIdentity::default())
    }

    fn put_get(payload: &[u8]) -> Vec<u8> {
        build_record(OPCODE_PUT_GET, 0x00, payload).unwrap()
    }

    /// Sign-on style screen: a title, a 10-character mandatory-enter field
    /// pre-filled with HELLO, and a 5-character numeric field
    fn sign_on() -> Vec<u8> {
        put_get(&[
            ESC, CMD_CLEAR_UNIT,
            ESC, CMD_WRITE_TO_DISPLAY, 0x00, CC2_UNLOCK,
            SBA, 1, 1, SF, FFW1_ID, FFW2_MANDATORY_ENTER, 0x20, 0x00, 0x0A, 0xC8, 0xC5, 0xD3, 0xD3, 0xD6,
            SBA, 3, 1, SF, FFW1_ID | 0x03, 0x00, 0x20, 0x00, 0x05,
            SBA, 5, 2, 0xE2, 0xC9, 0xC7, 0xD5, 0x40, 0xD6, 0xD5,
        ])
    }

    #[test]
    fn test_sign_on_screen_fields() {
        let decoder = decoder("37");
        let mut display = Display::default();
        let outcome = decoder.decode(&mut display, &sign_on()).unwrap();

        assert_eq!(outcome.commands, vec![CommandCode::ClearUnit, CommandCode::WriteToDisplay]);
        assert!(outcome.orders.contains(&Order::SetBufferAddress { row: 1, col: 1 }));
        assert!(outcome.orders.contains(&Order::Text("HELLO".to_string())));

        let fields = display.fields().fields();
        assert_eq!(fields.len(), 2);
        assert_eq!((fields[0].start, fields[0].length), (1, 10));
        assert_eq!(fields[0].shift(), Some(FieldShift::AlphaShift));
        assert!(fields[0].is_mandatory_enter());
        assert_eq!(fields[1].shift(), Some(FieldShift::NumericOnly));
        assert_eq!(display.screen().row_text(4).trim(), "SIGN ON");
        assert_eq!(display.fields().text(display.screen(), 0).trim_end(), "HELLO");
        assert!(!display.oia().is_keyboard_locked());
    }

    #[test]
    fn test_operator_round_trip() {
        let decoder = decoder("37");
        let mut display = Display::default();
        decoder.decode(&mut display, &sign_on()).unwrap();

        // Replace HELLO, tab to the numeric field, fill it and press Enter
        let mut last = KeyEffect::Local;
        for key in parse_keys("[eraseeof]USER1[tab]12345[enter]").unwrap() {
            last = apply_key(&mut display, key, Modifiers::NONE).unwrap();
        }
        assert_eq!(last, KeyEffect::Aid(AidKey::Enter));

        let record = decoder.encoder().encode_aid(&display, AidKey::Enter).unwrap();
        let payload = &record[RECORD_HEADER_LEN..];
        assert_eq!(payload[2], AID_ENTER);
        let mut expected = vec![SBA, 1, 2, 0xE4, 0xE2, 0xC5, 0xD9, 0xF1];
        expected.extend_from_slice(&[SBA, 3, 2, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5]);
        assert_eq!(&payload[3..], &expected[..]);
    }

    #[test]
    fn test_read_input_fields_after_write() {
        let decoder = decoder("37");
        let mut display = Display::default();
        decoder.decode(&mut display, &sign_on()).unwrap();
        let outcome = decoder
            .decode(&mut display, &put_get(&[ESC, CMD_READ_INPUT_FIELDS, 0x00, CC2_UNLOCK]))
            .unwrap();
        assert!(outcome.responses.is_empty());
        assert_eq!(display.read_opcode(), Some(CommandCode::ReadInputFields));
        assert!(!display.oia().is_keyboard_locked());
    }

    #[test]
    fn test_bad_record_keeps_previous_screen() {
        let decoder = decoder("37");
        let mut display = Display::default();
        decoder.decode(&mut display, &sign_on()).unwrap();
        let before = display.clone();

        // Field overlapping the first one
        let bad = put_get(&[
            ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00,
            SBA, 10, 1, 0xC1,
            SBA, 1, 5, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x03,
        ]);
        assert!(matches!(decoder.decode(&mut display, &bad), Err(ProtocolError::FieldOverlap { .. })));
        assert_eq!(display, before);
    }

    #[test]
    fn test_double_byte_host_text() {
        let decoder = decoder("939");
        let mut display = Display::default();
        let data = put_get(&[
            ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00,
            SBA, 2, 1, 0xC1, 0x0E, 0x42, 0xC1, 0x7F, 0x7F, 0x0F, 0xC2,
        ]);
        decoder.decode(&mut display, &data).unwrap();
        let row = display.screen().row_text(1);
        let chars: Vec<char> = row.chars().collect();
        assert_eq!(chars[0], 'A');
        assert!(row.contains('\u{FF21}'));
        assert!(row.contains('\u{FFFD}'));
        assert!(row.contains('B'));
    }
}
