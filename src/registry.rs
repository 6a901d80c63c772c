//! Label to codec resolution
//!
//! A [`Registry`] maps a textual charset label to an `encoding_rs` codec.
//! [`WhatwgRegistry`] is the default and understands every label listed in
//! the WHATWG Encoding Standard. Any `Fn(&str) -> Option<&'static Encoding>`
//! is also a registry, which makes aliases and test doubles one closure away.

use encoding_rs::Encoding;

/// Resolves charset labels to codecs
pub trait Registry {
    /// Look up the encoding named by `label`, if there is one
    fn lookup(&self, label: &str) -> Option<&'static Encoding>;
}

impl<F> Registry for F
where
    F: Fn(&str) -> Option<&'static Encoding>,
{
    fn lookup(&self, label: &str) -> Option<&'static Encoding> {
        self(label)
    }
}

/// Registry of the WHATWG Encoding Standard labels
///
/// Matching is ASCII case-insensitive and ignores surrounding whitespace,
/// so `"Windows-31J"`, `"windows-31j"` and `" SJIS "` all resolve to
/// Shift_JIS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhatwgRegistry;

impl Registry for WhatwgRegistry {
    fn lookup(&self, label: &str) -> Option<&'static Encoding> {
        Encoding::for_label(label.as_bytes())
    }
}

impl WhatwgRegistry {
    /// Every encoding this registry can resolve to, in name order
    pub fn encodings() -> [&'static Encoding; 40] {
        use encoding_rs::*;

        [
            BIG5,
            EUC_JP,
            EUC_KR,
            GB18030,
            GBK,
            IBM866,
            ISO_2022_JP,
            ISO_8859_10,
            ISO_8859_13,
            ISO_8859_14,
            ISO_8859_15,
            ISO_8859_16,
            ISO_8859_2,
            ISO_8859_3,
            ISO_8859_4,
            ISO_8859_5,
            ISO_8859_6,
            ISO_8859_7,
            ISO_8859_8,
            ISO_8859_8_I,
            KOI8_R,
            KOI8_U,
            MACINTOSH,
            REPLACEMENT,
            SHIFT_JIS,
            UTF_16BE,
            UTF_16LE,
            UTF_8,
            WINDOWS_1250,
            WINDOWS_1251,
            WINDOWS_1252,
            WINDOWS_1253,
            WINDOWS_1254,
            WINDOWS_1255,
            WINDOWS_1256,
            WINDOWS_1257,
            WINDOWS_1258,
            WINDOWS_874,
            X_MAC_CYRILLIC,
            X_USER_DEFINED,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Windows-31J", "Shift_JIS")]
    #[case("sjis", "Shift_JIS")]
    #[case("EUC-JP", "EUC-JP")]
    #[case(" utf8 ", "UTF-8")]
    #[case("latin1", "windows-1252")]
    #[case("ISO-2022-JP", "ISO-2022-JP")]
    fn test_whatwg_labels(#[case] label: &str, #[case] expected: &str) {
        let encoding = WhatwgRegistry.lookup(label).unwrap();
        assert_eq!(encoding.name(), expected);
    }

    #[rstest]
    #[case("unknown")]
    #[case("")]
    #[case("EBCDIC-037")]
    fn test_unknown_labels(#[case] label: &str) {
        assert!(WhatwgRegistry.lookup(label).is_none());
    }

    #[test]
    fn test_every_listed_encoding_resolves_by_name() {
        // "replacement" is only reachable through the labels of the
        // encodings it stands in for
        for encoding in WhatwgRegistry::encodings()
            .into_iter()
            .filter(|encoding| *encoding != encoding_rs::REPLACEMENT)
        {
            assert_eq!(WhatwgRegistry.lookup(encoding.name()), Some(encoding));
        }
    }

    #[test]
    fn test_closure_registry() {
        let aliases = |label: &str| match label {
            "mainframe-jp" => Some(encoding_rs::SHIFT_JIS),
            _ => None,
        };
        assert_eq!(aliases.lookup("mainframe-jp"), Some(encoding_rs::SHIFT_JIS));
        assert_eq!(aliases.lookup("Shift_JIS"), None);
    }
}
