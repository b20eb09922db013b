//! Integration tests for the decode-then-translate pipeline.
//!
//! Raw serial bytes go through `Isdv4Decoder`, each pen packet through
//! `translate`, exactly as the bridge does at runtime.

use tablet_core::{
    translate, Axis, Isdv4Decoder, Isdv4Packet, PressureThreshold, SyntheticEvent,
};

/// x=100, y=200, pressure=50, in proximity, tip down.
const PEN_DOWN: [u8; 9] = [0xA1, 0x00, 25, 0x00, 50, 50, 0x00, 0x00, 0x00];
/// Same position, pressure=10, in proximity, tip up.
const PEN_HOVER: [u8; 9] = [0xA0, 0x00, 25, 0x00, 50, 10, 0x00, 0x00, 0x00];
/// Tool left the sensing range.
const PEN_AWAY: [u8; 9] = [0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
/// max_x=24003, max_y=18001, max_pressure=255, firmware 1540.
const QUERY: [u8; 11] = [0xC0, 46, 112, 35, 20, 127, 0x69, 0x00, 0x00, 0x0C, 0x04];

/// Feeds `stream` in `chunk`-sized reads and returns every translated burst.
fn pipeline(stream: &[u8], chunk: usize) -> Vec<Vec<SyntheticEvent>> {
    let threshold = PressureThreshold::new(20).unwrap();
    let mut decoder = Isdv4Decoder::new();
    let mut bursts = Vec::new();
    for piece in stream.chunks(chunk) {
        decoder.push(piece);
        while let Some(packet) = decoder.next_packet() {
            if let Ok(Isdv4Packet::Pen(sample)) = packet {
                bursts.push(translate(&sample, threshold).events().to_vec());
            }
        }
    }
    bursts
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_stroke_split_across_reads() {
    // Arrange
    let mut stream = Vec::new();
    stream.extend_from_slice(&PEN_HOVER);
    stream.extend_from_slice(&PEN_DOWN);
    stream.extend_from_slice(&PEN_AWAY);

    // Act – three bytes per read, so every packet straddles a boundary
    let bursts = pipeline(&stream, 3);

    // Assert
    assert_eq!(bursts.len(), 3);
    assert_eq!(bursts[0].last(), Some(&SyntheticEvent::Sync));
    assert!(bursts[0].contains(&SyntheticEvent::Touch(false)));
    assert_eq!(
        bursts[1],
        vec![
            SyntheticEvent::Abs { axis: Axis::X, value: 100 },
            SyntheticEvent::Abs { axis: Axis::Y, value: 200 },
            SyntheticEvent::Abs { axis: Axis::Pressure, value: 50 },
            SyntheticEvent::Touch(true),
            SyntheticEvent::Sync,
        ]
    );
    assert_eq!(
        bursts[2],
        vec![
            SyntheticEvent::Abs { axis: Axis::Pressure, value: 0 },
            SyntheticEvent::Touch(false),
            SyntheticEvent::Sync,
        ]
    );
}

#[test]
fn test_chunk_size_does_not_change_output() {
    let mut stream = Vec::new();
    for _ in 0..4 {
        stream.extend_from_slice(&PEN_DOWN);
        stream.extend_from_slice(&PEN_HOVER);
    }

    let whole = pipeline(&stream, stream.len());
    for chunk in [1, 2, 5, 9, 64] {
        assert_eq!(pipeline(&stream, chunk), whole, "chunk size {chunk}");
    }
}

#[test]
fn test_line_noise_before_stream_is_skipped() {
    // Arrange – continuation bytes left over from before the handshake
    let mut stream = vec![0x12, 0x34, 0x7F];
    stream.extend_from_slice(&PEN_DOWN);

    // Act
    let bursts = pipeline(&stream, 4);

    // Assert
    assert_eq!(bursts.len(), 1);
    assert!(bursts[0].contains(&SyntheticEvent::Touch(true)));
}

#[test]
fn test_query_response_interleaved_with_pen_packets() {
    // Arrange
    let mut decoder = Isdv4Decoder::new();
    decoder.push(&PEN_DOWN);
    decoder.push(&QUERY);
    decoder.push(&PEN_AWAY);

    // Act
    let packets: Vec<_> = std::iter::from_fn(|| decoder.next_packet())
        .map(|p| p.expect("valid packet"))
        .collect();

    // Assert
    assert_eq!(packets.len(), 3);
    assert!(matches!(packets[0], Isdv4Packet::Pen(s) if s.proximity));
    match packets[1] {
        Isdv4Packet::Query(caps) => {
            let ranges = caps.ranges();
            assert_eq!(ranges.x.max, 24003);
            assert_eq!(ranges.pressure.max, 255);
        }
        other => panic!("expected query response, got {other:?}"),
    }
    assert!(matches!(packets[2], Isdv4Packet::Pen(s) if !s.proximity));
}
