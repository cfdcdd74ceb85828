//! Property-based tests for incremental decoding and response framing

use maxima_driver::framing::{ResponseFramer, StreamDecoder};
use maxima_driver::process::OutputHandler;
use proptest::prelude::*;

fn decode_in_chunks(label: &str, bytes: &[u8], splits: &[usize]) -> String {
    let mut decoder = StreamDecoder::for_label(label).unwrap();
    let mut text = String::new();
    let mut start = 0;
    for &split in splits {
        let end = split.clamp(start, bytes.len());
        decoder.feed(&bytes[start..end], |t| text.push_str(t)).unwrap();
        start = end;
    }
    decoder.feed(&bytes[start..], |t| text.push_str(t)).unwrap();
    decoder.finish(|t| text.push_str(t)).unwrap();
    text
}

proptest! {
    #[test]
    fn test_utf8_chunking_is_invisible(
        s in "\\PC{0,300}",
        mut splits in prop::collection::vec(0usize..1200, 0..8),
    ) {
        splits.sort_unstable();
        prop_assert_eq!(decode_in_chunks("UTF-8", s.as_bytes(), &splits), s);
    }

    #[test]
    fn test_split_multibyte_char_matches_whole(
        prefix in "[a-z]{0,20}",
        c in any::<char>(),
        cut in 1usize..4,
    ) {
        let s = format!("{}{}", prefix, c);
        let split = prefix.len() + cut.min(c.len_utf8());
        prop_assert_eq!(decode_in_chunks("UTF-8", s.as_bytes(), &[split]), s);
    }

    #[test]
    fn test_single_byte_encoding_chunking(
        bytes in prop::collection::vec(0x20u8..0x7f, 0..3000),
        mut splits in prop::collection::vec(0usize..3000, 0..6),
    ) {
        splits.sort_unstable();
        let expected = String::from_utf8(bytes.clone()).unwrap();
        prop_assert_eq!(decode_in_chunks("windows-1252", &bytes, &splits), expected);
    }

    #[test]
    fn test_ascii_rejects_any_high_byte(
        mut bytes in prop::collection::vec(0x20u8..0x7f, 0..500),
        high in 0x80u8..=0xff,
        at in any::<prop::sample::Index>(),
        chunk in 1usize..64,
    ) {
        let pos = at.index(bytes.len() + 1);
        bytes.insert(pos, high);

        let mut decoder = StreamDecoder::for_label("US-ASCII").unwrap();
        let mut failed = false;
        for piece in bytes.chunks(chunk) {
            if decoder.feed(piece, |_| {}).is_err() {
                failed = true;
                break;
            }
        }
        prop_assert!(failed);
    }

    #[test]
    fn test_framer_output_independent_of_chunking(
        lines in prop::collection::vec("[a-z0-9 =]{0,30}", 0..10),
        chunk in 1usize..64,
    ) {
        let mut stream = String::new();
        for line in &lines {
            stream.push_str(line);
            stream.push('\n');
        }
        stream.push_str("(%i9) SENTINEL-XYZ \n(%i10) ");

        let decoder = StreamDecoder::for_label("UTF-8").unwrap();
        let mut framer = ResponseFramer::for_call(decoder, "SENTINEL-XYZ", true);
        framer.call_starting();

        let bytes = stream.as_bytes();
        let mut complete = false;
        for piece in bytes.chunks(chunk) {
            prop_assert!(!complete);
            complete = framer.handle_output(piece).unwrap();
        }
        prop_assert!(complete);

        let (_, output) = framer.into_parts();
        let mut expected: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        expected.push_str("(%i9) ");
        prop_assert_eq!(output.unwrap(), expected);
    }
}
