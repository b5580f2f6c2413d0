use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tn5250r_core::codec::CodecRegistry;
use tn5250r_core::config::SessionConfig;
use tn5250r_core::error::{SessionError, ValidationError};
use tn5250r_core::lib5250::codes::*;
use tn5250r_core::lib5250::encoder::build_record;
use tn5250r_core::lib5250::field::{Field, FieldFormat, FFW1_ID};
use tn5250r_core::lib5250::screen::NULL_CHAR;
use tn5250r_core::lib5250::telnet::{frame_record, DO, IAC, WILL};
use tn5250r_core::lib5250::{AidKey, Display, Key, Modifiers, Session};

const NUMERIC_ONLY: u8 = 0x03;

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn numeric_display() -> Display {
        let mut display = Display::default();
        let (screen, fields) = display.screen_and_fields_mut();
        fields
            .define(
                Field::input(81, 5, 0x20, FieldFormat::new(FFW1_ID | NUMERIC_ONLY, 0x00), vec![]),
                screen,
            )
            .unwrap();
        display
    }

    #[test]
    fn test_numeric_field_rejects_whole_input() {
        let mut display = numeric_display();
        let (screen, fields) = display.screen_and_fields_mut();
        let err = fields.set_text(screen, 0, "12a45").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCharacter { ch: 'a', .. }));

        // Nothing was stored, nothing is modified; unwritten cells are nulls
        // and trailing nulls are not part of the text
        assert_eq!(display.fields().text(display.screen(), 0), "");
        assert!(display.screen().text_range(81, 5).chars().all(|ch| ch == NULL_CHAR));
        assert!(display.fields().modified_fields().is_empty());

        let (screen, fields) = display.screen_and_fields_mut();
        fields.set_text(screen, 0, "12345").unwrap();
        assert_eq!(display.fields().text(display.screen(), 0), "12345");
        assert!(display.fields().is_modified(0));
    }

    #[test]
    fn test_overlong_input_is_not_truncated() {
        let mut display = numeric_display();
        let (screen, fields) = display.screen_and_fields_mut();
        assert_eq!(
            fields.set_text(screen, 0, "123456"),
            Err(ValidationError::TooLong { len: 6, max: 5 })
        );
    }

    #[tokio::test]
    async fn test_rejected_input_is_never_transmitted() {
        init_logging();
        let (client, mut host) = tokio::io::duplex(4096);
        let session = Session::start(client, SessionConfig::default(), &CodecRegistry::builtin()).unwrap();

        host.write_all(&[IAC, DO, 24, IAC, DO, 0, IAC, WILL, 0, IAC, DO, 25, IAC, WILL, 25])
            .await
            .unwrap();
        let mut reply = [0u8; 15];
        host.read_exact(&mut reply).await.unwrap();

        let screen = build_record(
            OPCODE_PUT_GET,
            0x00,
            &[
                ESC, CMD_CLEAR_UNIT, ESC, CMD_WRITE_TO_DISPLAY, 0x00, CC2_UNLOCK,
                SBA, 2, 1, SF, FFW1_ID | NUMERIC_ONLY, 0x00, 0x20, 0x00, 0x05,
            ],
        ).unwrap();
        host.write_all(&frame_record(&screen)).await.unwrap();
        session.wait_for_unlock(Duration::from_secs(5)).await.unwrap();

        let err = session.set_field_text(1, 1, "12a45").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::InvalidCharacter { ch: 'a', .. })
        ));
        let err = session.submit_keystroke(Key::Char('a'), Modifiers::NONE).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));

        // Field is still empty, so Enter goes out with no field data
        session
            .submit_keystroke(Key::Aid(AidKey::Enter), Modifiers::NONE)
            .await
            .unwrap();
        let mut record = Vec::new();
        loop {
            let byte = host.read_u8().await.unwrap();
            record.push(byte);
            if record.ends_with(&[IAC, 0xEF]) {
                break;
            }
        }
        assert!(!record.contains(&0x81), "rejected character leaked into the record");
        assert_eq!(&record[record.len() - 5..record.len() - 2], &[2, 2, AID_ENTER]);
        session.disconnect().await;
    }
}
