use std::panic::catch_unwind;

use charset_util::{Error, Guess};
use rstest::rstest;

const SJIS_HELLO: &[u8] = &[0x82, 0xB1, 0x82, 0xF1, 0x82, 0xC9, 0x82, 0xBF, 0x82, 0xED];
const HELLO: &str = "こんにちわ";

#[derive(Debug, Clone, Copy)]
enum Shape {
    Bytes,
    Str,
    Reader,
}

fn encode_as(shape: Shape, text: &str, label: &str) -> charset_util::Result<Vec<u8>> {
    match shape {
        Shape::Bytes => charset_util::encode_bytes(text.as_bytes(), label),
        Shape::Str => charset_util::encode(text, label),
        Shape::Reader => charset_util::encode_reader(text.as_bytes(), label),
    }
}

fn must_encode_as(shape: Shape, text: &str, label: &str) -> Vec<u8> {
    match shape {
        Shape::Bytes => charset_util::must_encode_bytes(text.as_bytes(), label),
        Shape::Str => charset_util::must_encode(text, label),
        Shape::Reader => charset_util::must_encode_reader(text.as_bytes(), label),
    }
}

#[rstest]
#[case::bytes(Shape::Bytes)]
#[case::string(Shape::Str)]
#[case::reader(Shape::Reader)]
fn test_encode_ok(#[case] shape: Shape) {
    assert_eq!(encode_as(shape, HELLO, "Windows-31J").unwrap(), SJIS_HELLO);
    assert_eq!(must_encode_as(shape, HELLO, "Windows-31J"), SJIS_HELLO);
}

#[rstest]
#[case::bytes(Shape::Bytes)]
#[case::string(Shape::Str)]
#[case::reader(Shape::Reader)]
fn test_encode_unknown_label(#[case] shape: Shape) {
    let err = encode_as(shape, HELLO, "unknown").unwrap_err();
    assert!(matches!(err, Error::UnsupportedCharset(ref label) if label == "unknown"));

    assert!(catch_unwind(|| must_encode_as(shape, HELLO, "unknown")).is_err());
}

#[rstest]
#[case::bytes(Shape::Bytes)]
#[case::reader(Shape::Reader)]
fn test_decode_ok(#[case] shape: Shape) {
    let (result, must) = match shape {
        Shape::Reader => (
            charset_util::decode_reader(SJIS_HELLO, "Windows-31J"),
            charset_util::must_decode_reader(SJIS_HELLO, "Windows-31J"),
        ),
        _ => (
            charset_util::decode(SJIS_HELLO, "Windows-31J"),
            charset_util::must_decode(SJIS_HELLO, "Windows-31J"),
        ),
    };
    assert_eq!(result.unwrap(), HELLO);
    assert_eq!(must, HELLO);
}

#[rstest]
#[case::bytes(Shape::Bytes)]
#[case::string(Shape::Str)]
#[case::reader(Shape::Reader)]
fn test_decode_unknown_label(#[case] shape: Shape) {
    let result = match shape {
        Shape::Bytes => charset_util::decode(SJIS_HELLO, "unknown"),
        Shape::Str => charset_util::decode_str("plain", "unknown"),
        Shape::Reader => charset_util::decode_reader(SJIS_HELLO, "unknown"),
    };
    assert!(matches!(result, Err(Error::UnsupportedCharset(_))));

    let panicked = catch_unwind(|| match shape {
        Shape::Bytes => charset_util::must_decode(SJIS_HELLO, "unknown"),
        Shape::Str => charset_util::must_decode_str("plain", "unknown"),
        Shape::Reader => charset_util::must_decode_reader(SJIS_HELLO, "unknown"),
    });
    assert!(panicked.is_err());
}

#[rstest]
#[case("Windows-31J", "素早い茶色の狐が怠惰な犬を飛び越える。ｶﾀｶﾅ")]
#[case("EUC-JP", "日本語のテキスト")]
#[case("ISO-2022-JP", "日本語 and ASCII")]
#[case("EUC-KR", "한국어 텍스트")]
#[case("GBK", "简体中文文本")]
#[case("Big5", "繁體中文文本")]
#[case("KOI8-R", "Русский текст")]
#[case("windows-1252", "Café crème brûlée €")]
#[case("UTF-16LE", "mixed テキスト 😀")]
#[case("UTF-16BE", "mixed テキスト 😀")]
#[case("UTF-8", "mixed テキスト 😀")]
#[case("UTF-8", "\u{feff}x")]
#[case("UTF-16LE", "\u{feff}x")]
#[case("UTF-16BE", "\u{feff}x")]
#[case("windows-1252", "ï»¿abc")]
fn test_round_trip(#[case] label: &str, #[case] text: &str) {
    let bytes = charset_util::encode(text, label).unwrap();
    assert_eq!(charset_util::decode(&bytes, label).unwrap(), text);
}

#[test]
fn test_unmappable_character_is_an_error() {
    let err = charset_util::encode("price: 100€", "Windows-31J").unwrap_err();
    assert!(matches!(err, Error::Unmappable { character: '€', position: 10, .. }));
}

#[test]
fn test_guess_euc_jp() {
    let text = "私たちは日本語の文章を書いています。文字コードの判定がうまくいくかどうか確かめましょう。\
                ひらがなが多い文章のほうが判定しやすいと言われています。";
    let bytes = charset_util::encode(text, "EUC-JP").unwrap();

    let guess = charset_util::guess(&bytes).unwrap();
    assert_eq!(guess.charset(), "EUC-JP");
    assert_eq!(guess.language(), "ja");
    assert_eq!(charset_util::must_guess(&bytes), guess);
}

#[rstest]
#[case::bytes(Shape::Bytes)]
#[case::string(Shape::Str)]
#[case::reader(Shape::Reader)]
fn test_guess_utf8(#[case] shape: Shape) {
    let input = "ああｲｲ\"haa";
    let guess = match shape {
        Shape::Bytes => charset_util::guess(input.as_bytes()),
        Shape::Str => charset_util::guess_str(input),
        Shape::Reader => charset_util::guess_reader(input.as_bytes()),
    }
    .unwrap();

    assert_eq!(guess.charset(), "UTF-8");
    assert_eq!(guess.language(), "");
    assert_eq!(charset_util::must_guess_str(input), guess);
    assert_eq!(charset_util::must_guess_reader(input.as_bytes()), guess);
}

#[test]
fn test_guess_empty_input_fails() {
    assert!(matches!(charset_util::guess(b""), Err(Error::DetectionFailed)));
    assert!(matches!(charset_util::guess_str(""), Err(Error::DetectionFailed)));
}

#[test]
fn test_guess_serializes() {
    let json = serde_json::to_value(Guess::new("EUC-JP", "ja", 80)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "charset": "EUC-JP", "language": "ja", "confidence": 80 })
    );
}
