// Copyright (c) Contributors to the envpack project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
fn test_default_is_utf8() {
    let encoding = TextEncoding::resolve(None).unwrap();
    assert_eq!(encoding.name(), "UTF-8");
}

#[rstest]
#[case("utf-8", "UTF-8")]
#[case("UTF8", "UTF-8")]
#[case("latin1", "windows-1252")]
#[case("ascii", "windows-1252")]
#[case("shift_jis", "Shift_JIS")]
#[case("sjis", "Shift_JIS")]
fn test_resolve_known_labels(#[case] label: &str, #[case] expected: &str) {
    let encoding = TextEncoding::resolve(Some(label)).unwrap();
    assert_eq!(encoding.name(), expected);
}

#[rstest]
fn test_invalid_encoding() {
    let result = TextEncoding::resolve(Some("no-such-codec"));
    match result {
        Err(Error::InvalidEncoding(label)) => assert_eq!(label, "no-such-codec"),
        other => panic!("Expected InvalidEncoding, got: {:?}", other),
    }
}

#[rstest]
fn test_decode_shift_jis() {
    let encoding: TextEncoding = "shift_jis".parse().unwrap();
    let bytes = [0x82, 0xa0, b'!'];
    assert_eq!(encoding.decode(&bytes), "あ!");
}

#[rstest]
fn test_decode_replaces_malformed() {
    let encoding = TextEncoding::default();
    let decoded = encoding.decode(b"ok\xff");
    assert!(decoded.starts_with("ok"));
    assert!(decoded.contains('\u{fffd}'));
}
