//! Text encodings selected by code pages and Windows font charsets.

use encoding_rs::Encoding;

/// Windows charset id of the symbol charset (`\fcharset2`).
pub const SYMBOL_CHARSET: u8 = 2;

/// Decoding scheme applied to raw text bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextEncoding {
    CodePage(&'static Encoding),
    /// No usable code page; bytes map one-to-one onto U+0000..U+00FF.
    Unknown,
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::CodePage(encoding_rs::WINDOWS_1252)
    }
}

impl TextEncoding {
    /// Encoding for a Windows code page number, if one is supported.
    pub fn from_code_page(code_page: i32) -> Option<TextEncoding> {
        let encoding = match code_page {
            874 => encoding_rs::WINDOWS_874,
            932 => encoding_rs::SHIFT_JIS,
            936 => encoding_rs::GBK,
            949 => encoding_rs::EUC_KR,
            950 => encoding_rs::BIG5,
            1250 => encoding_rs::WINDOWS_1250,
            1251 => encoding_rs::WINDOWS_1251,
            1252 => encoding_rs::WINDOWS_1252,
            1253 => encoding_rs::WINDOWS_1253,
            1254 => encoding_rs::WINDOWS_1254,
            1255 => encoding_rs::WINDOWS_1255,
            1256 => encoding_rs::WINDOWS_1256,
            1257 => encoding_rs::WINDOWS_1257,
            1258 => encoding_rs::WINDOWS_1258,
            866 => encoding_rs::IBM866,
            10000 => encoding_rs::MACINTOSH,
            20866 => encoding_rs::KOI8_R,
            65001 => encoding_rs::UTF_8,
            _ => return None,
        };
        Some(TextEncoding::CodePage(encoding))
    }

    /// Encoding for a `\fcharset` value. The symbol charset never takes part
    /// in code page lookup and decodes as `Unknown`.
    pub fn from_windows_charset(charset: u8) -> Option<TextEncoding> {
        let code_page = match charset {
            0 => 1252,
            SYMBOL_CHARSET => return Some(TextEncoding::Unknown),
            77 => 10000,
            128 => 932,
            129 => 949,
            134 => 936,
            136 => 950,
            161 => 1253,
            162 => 1254,
            163 => 1258,
            177 => 1255,
            178 => 1256,
            186 => 1257,
            204 => 1251,
            222 => 874,
            238 => 1250,
            _ => return None,
        };
        Self::from_code_page(code_page)
    }

    /// Fallback encoding for documents and fonts that do not name one.
    pub fn system_default(ui_language: Option<&str>) -> TextEncoding {
        let primary = ui_language
            .and_then(|tag| tag.split(['-', '_']).next())
            .map(str::to_ascii_lowercase);
        let code_page = match primary.as_deref() {
            Some("ru") | Some("uk") => 1251,
            Some("tr") => 1254,
            _ => 1252,
        };
        Self::from_code_page(code_page).unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::CodePage(encoding) => encoding.name(),
            TextEncoding::Unknown => "unknown",
        }
    }

    pub fn decode_into(self, bytes: &[u8], out: &mut String) {
        match self {
            TextEncoding::CodePage(encoding) => {
                let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
                out.push_str(&text);
            }
            TextEncoding::Unknown => out.extend(bytes.iter().map(|&b| char::from(b))),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        self.decode_into(bytes, &mut out);
        out
    }
}
