//! Fuzz target for ServerFrame::decode
//!
//! Arbitrary text off the socket must decode to a frame or an error. Frames
//! with an unrecognized `type` land in `ServerFrame::Unknown`.
//!
//! # Invariants
//!
//! - NEVER panic on malformed JSON, wrong field types, or huge ids
//! - Decoding is a pure function of the text

#![no_main]

use libfuzzer_sys::fuzz_target;
use matchhub_proto::ServerFrame;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let first = ServerFrame::decode(&text);
    if let Ok(frame) = &first {
        let _ = frame.kind();
    }
    assert_eq!(first, ServerFrame::decode(&text));
});
