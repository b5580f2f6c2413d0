use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tn5250r_core::codec::{CodecRegistry, Diagnostics};
use tn5250r_core::config::SessionConfig;
use tn5250r_core::lib5250::codes::*;
use tn5250r_core::lib5250::encoder::build_record;
use tn5250r_core::lib5250::field::FFW1_ID;
use tn5250r_core::lib5250::telnet::{frame_record, DO, IAC, WILL};
use tn5250r_core::lib5250::{AidKey, DataStreamDecoder, DeviceIdentity, Display, Key, Modifiers, Session};

const SESSIONS: u64 = 4;
const RECORDS_PER_SESSION: usize = 40;

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Records for one host: a screen with a field on a row unique to the
    /// session, random text writes, then a final write unlocking the keyboard
    fn host_stream(seed: u64) -> Vec<Vec<u8>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let field_row = 2 + seed as u8;
        let mut records = vec![build_record(
            OPCODE_PUT_GET,
            0x00,
            &[
                ESC, CMD_CLEAR_UNIT, ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00,
                SBA, field_row, 1, SF, FFW1_ID, 0x00, 0x20, 0x00, 0x08,
            ],
        ).unwrap()];
        for _ in 0..RECORDS_PER_SESSION {
            let row = rng.gen_range(10..=24u8);
            let col = rng.gen_range(1..=60u8);
            let mut payload = vec![ESC, CMD_WRITE_TO_DISPLAY, 0x00, 0x00, SBA, row, col];
            let len = rng.gen_range(1..=12);
            payload.extend((0..len).map(|_| rng.gen_range(0xC1..=0xC9u8)));
            records.push(build_record(OPCODE_PUT_GET, 0x00, &payload).unwrap());
        }
        records.push(build_record(
            OPCODE_PUT_GET,
            0x00,
            &[ESC, CMD_WRITE_TO_DISPLAY, 0x00, CC2_UNLOCK, SBA, 1, 1, 0xC1 + seed as u8],
        ).unwrap());
        records
    }

    fn expected_display(records: &[Vec<u8>]) -> Display {
        let codec = CodecRegistry::builtin().get("37").unwrap();
        let decoder = DataStreamDecoder::new(codec, Diagnostics::disabled(), DeviceIdentity::default());
        let mut display = Display::default();
        for record in records {
            decoder.decode(&mut display, record).unwrap();
        }
        display
    }

    /// Play the host side, splitting the byte stream at random points
    async fn play_host(mut host: DuplexStream, records: Vec<Vec<u8>>, seed: u64) -> DuplexStream {
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5250);
        host.write_all(&[IAC, DO, 24, IAC, DO, 0, IAC, WILL, 0, IAC, DO, 25, IAC, WILL, 25])
            .await
            .unwrap();
        let mut reply = [0u8; 15];
        host.read_exact(&mut reply).await.unwrap();

        let bytes: Vec<u8> = records.iter().flat_map(|r| frame_record(r)).collect();
        let mut offset = 0;
        while offset < bytes.len() {
            let end = (offset + rng.gen_range(1..=64)).min(bytes.len());
            host.write_all(&bytes[offset..end]).await.unwrap();
            offset = end;
            if rng.gen_bool(0.3) {
                tokio::time::sleep(Duration::from_micros(rng.gen_range(0..200))).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
        host
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sessions_decode_independently() {
        init_logging();
        let registry = CodecRegistry::builtin();
        let mut sessions = Vec::new();
        let mut hosts = Vec::new();
        for seed in 0..SESSIONS {
            let (client, host) = tokio::io::duplex(256);
            let session = Arc::new(Session::start(client, SessionConfig::default(), &registry).unwrap());
            let records = host_stream(seed);
            hosts.push(tokio::spawn(play_host(host, records, seed)));
            sessions.push(session);
        }

        let waits = sessions
            .iter()
            .map(|session| session.wait_for_unlock(Duration::from_secs(10)));
        for result in join_all(waits).await {
            result.unwrap();
        }

        for (seed, session) in sessions.iter().enumerate() {
            let expected = expected_display(&host_stream(seed as u64));
            let actual = session.display().await;
            assert_eq!(actual.screen().screen_text(), expected.screen().screen_text(), "session {seed}");
            assert_eq!(actual.fields().fields(), expected.fields().fields(), "session {seed}");
            assert_eq!(session.cursor().await, expected.screen().cursor_coords());
        }

        // Each session kept its own field
        let starts: Vec<usize> = join_all(sessions.iter().map(|s| s.fields()))
            .await
            .iter()
            .map(|fields| fields[0].start)
            .collect();
        assert_eq!(starts, vec![81, 161, 241, 321]);

        for session in &sessions {
            session.disconnect().await;
        }
        for host in hosts {
            host.await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_keystrokes_keep_queue_order() {
        init_logging();
        let (client, mut host) = tokio::io::duplex(4096);
        let session = Arc::new(Session::start(client, SessionConfig::default(), &CodecRegistry::builtin()).unwrap());

        host.write_all(&[IAC, DO, 24, IAC, DO, 0, IAC, WILL, 0, IAC, DO, 25, IAC, WILL, 25])
            .await
            .unwrap();
        let mut reply = [0u8; 15];
        host.read_exact(&mut reply).await.unwrap();
        let screen = build_record(
            OPCODE_PUT_GET,
            0x00,
            &[ESC, CMD_CLEAR_UNIT, ESC, CMD_WRITE_TO_DISPLAY, 0x00, CC2_UNLOCK],
        ).unwrap();
        host.write_all(&frame_record(&screen)).await.unwrap();
        session.wait_for_unlock(Duration::from_secs(5)).await.unwrap();

        // SysReq does not lock the keyboard, so many can be in flight
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    session
                        .submit_keystroke(Key::Aid(AidKey::SysReq), Modifiers::NONE)
                        .await
                })
            })
            .collect();
        for task in join_all(tasks).await {
            task.unwrap().unwrap();
        }

        // Eight whole records, each a bare header followed by IAC EOR
        let mut bytes = vec![0u8; 8 * 12];
        host.read_exact(&mut bytes).await.unwrap();
        for chunk in bytes.chunks(12) {
            assert_eq!(&chunk[..4], &[0x00, 0x0A, 0x12, 0xA0]);
            assert_eq!(chunk[7], FLAG_SRQ);
            assert_eq!(&chunk[10..], &[IAC, 0xEF]);
        }
        session.disconnect().await;
    }
}
