// tests/decoder_property.rs
//
// However a byte stream is cut into chunks, incremental decoding must give
// the same text as decoding it in one piece.

use proptest::prelude::*;

use cmdexec::exec::decode::{ChunkDecoder, decode_all};
use cmdexec::types::OutputEncoding;

fn encoding_strategy() -> impl Strategy<Value = OutputEncoding> {
    prop_oneof![
        Just(OutputEncoding::Utf8),
        Just(OutputEncoding::Latin1),
        Just(OutputEncoding::Ascii),
        Just(OutputEncoding::Hex),
        Just(OutputEncoding::Base64),
    ]
}

fn decode_in_chunks(encoding: OutputEncoding, bytes: &[u8], cuts: &[usize]) -> String {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.sort_unstable();

    let mut decoder = ChunkDecoder::new(encoding);
    let mut out = String::new();
    let mut start = 0;
    for p in points {
        out.push_str(&decoder.decode(&bytes[start..p]));
        start = p;
    }
    out.push_str(&decoder.decode(&bytes[start..]));
    out.push_str(&decoder.finish());
    out
}

proptest! {
    #[test]
    fn chunking_does_not_change_valid_utf8_text(
        text in "\\PC{0,64}",
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let decoded = decode_in_chunks(OutputEncoding::Utf8, text.as_bytes(), &cuts);
        prop_assert_eq!(decoded, text);
    }

    #[test]
    fn chunking_matches_one_shot_decoding(
        encoding in encoding_strategy(),
        bytes in proptest::collection::vec(any::<u8>(), 0..128),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let chunked = decode_in_chunks(encoding, &bytes, &cuts);
        prop_assert_eq!(chunked, decode_all(encoding, &bytes));
    }
}
