use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 colour.
///
/// Accepts `"#RRGGBB"`, `"#RRGGBBAA"`, `[r, g, b]` or `[r, g, b, a]` (0..=255) in JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// The colour as `[r, g, b, a]`.
    pub fn rgba(self) -> [u8; 4] {
        self.0
    }

    /// `#rrggbbaa` spelling.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v[..] {
                [r, g, b] => Ok(Self([r, g, b, 255])),
                [r, g, b, a] => Ok(Self([r, g, b, a])),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() || !(s.len() == 6 || s.len() == 8) {
        return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
    }
    let r = hex_byte(&s[0..2])?;
    let g = hex_byte(&s[2..4])?;
    let b = hex_byte(&s[4..6])?;
    let a = if s.len() == 8 { hex_byte(&s[6..8])? } else { 255 };
    Ok(Color([r, g, b, a]))
}
