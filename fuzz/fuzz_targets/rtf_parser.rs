#![no_main]

use libfuzzer_sys::fuzz_target;
use rtf::{ParserConfig, ParserState, RtfParser, TextDocument};

// First byte picks a chunk size so streaming replay is exercised too.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    let mut whole = RtfParser::new(TextDocument::new(), ParserConfig::default());
    let whole_state = whole.parse(input);

    let size = usize::from(selector % 16) + 1;
    let mut chunked = RtfParser::new(TextDocument::new(), ParserConfig::default());
    for chunk in input.chunks(size) {
        chunked.push_bytes(chunk);
    }
    let chunked_state = chunked.finish();

    assert_eq!(whole_state, chunked_state);
    if whole_state == ParserState::Accepted {
        assert_eq!(
            whole.document().snapshot_lines(),
            chunked.document().snapshot_lines()
        );
    }
});
