// THEORY:
// The `Color` module is the most fundamental unit of the engine. It is a "dumb" data
// container for a single opaque sRGB color plus the text codecs that bring colors in
// from a host surface (CSS-style strings) and send decisions back out (`#rrggbb`).
//
// Key architectural principles:
// 1.  **Data Purity**: A `Color` holds three raw `u8` channels and nothing else. Every
//     derived projection (linear light, XYZ, LAB, HSL) is computed on demand by the
//     `color_space` module; nothing is cached here.
// 2.  **Canonical Identity**: Two samples describe the same color if and only if their
//     quantized channels are equal. `Color::key` renders that identity as the
//     deterministic `rgb(r,g,b)` string used to bucket samples into groups, so `#f00`,
//     `rgb(255, 0, 0)` and `red` all land in the same bucket.
// 3.  **Forgiving Input**: Parsing is strict about what it accepts but the failure is a
//     plain value (`ColorParseError`). Callers decide whether a failure matters; the
//     grouping layer treats it as "skip this sample".

pub mod color {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use thiserror::Error;

    pub type Channel = u8;
    pub type CanonicalColorKey = String;

    /// Named colors understood by `parse_color`, matched case-insensitively.
    const NAMED_COLORS: [(&str, Color); 22] = [
        ("white", Color::new(255, 255, 255)),
        ("black", Color::new(0, 0, 0)),
        ("red", Color::new(255, 0, 0)),
        ("green", Color::new(0, 128, 0)),
        ("blue", Color::new(0, 0, 255)),
        ("yellow", Color::new(255, 255, 0)),
        ("cyan", Color::new(0, 255, 255)),
        ("magenta", Color::new(255, 0, 255)),
        ("gray", Color::new(128, 128, 128)),
        ("grey", Color::new(128, 128, 128)),
        ("orange", Color::new(255, 165, 0)),
        ("purple", Color::new(128, 0, 128)),
        ("pink", Color::new(255, 192, 203)),
        ("brown", Color::new(165, 42, 42)),
        ("navy", Color::new(0, 0, 128)),
        ("teal", Color::new(0, 128, 128)),
        ("olive", Color::new(128, 128, 0)),
        ("maroon", Color::new(128, 0, 0)),
        ("lime", Color::new(0, 255, 0)),
        ("aqua", Color::new(0, 255, 255)),
        ("silver", Color::new(192, 192, 192)),
        ("fuchsia", Color::new(255, 0, 255)),
    ];

    /// CSS keywords that name "no concrete color". They never parse.
    const NON_COLOR_KEYWORDS: [&str; 3] = ["transparent", "inherit", "initial"];

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ColorParseError {
        #[error("empty color string")]
        Empty,
        #[error("invalid hex length")]
        InvalidLength,
        #[error("invalid hex digits")]
        InvalidHex,
        #[error("invalid rgb()/rgba() function")]
        InvalidFunc,
        #[error("component out of range")]
        OutOfRange,
        #[error("`{0}` does not name a concrete color")]
        Keyword(String),
        #[error("unknown color name `{0}`")]
        UnknownName(String),
    }

    /// A "dumb" data container representing a single opaque sRGB color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(from = "[u8; 3]", into = "[u8; 3]")]
    pub struct Color {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Color {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        pub fn channels(&self) -> [Channel; 3] {
            [self.red, self.green, self.blue]
        }

        pub fn max_channel(&self) -> Channel {
            self.red.max(self.green).max(self.blue)
        }

        pub fn min_channel(&self) -> Channel {
            self.red.min(self.green).min(self.blue)
        }

        /// Chroma in channel units: max(R,G,B) - min(R,G,B).
        pub fn spread(&self) -> Channel {
            self.max_channel() - self.min_channel()
        }

        /// The canonical grouping key, `rgb(r,g,b)` without spaces.
        pub fn key(&self) -> CanonicalColorKey {
            format!("rgb({},{},{})", self.red, self.green, self.blue)
        }

        /// Lowercase `#rrggbb`.
        pub fn to_hex(&self) -> String {
            format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        }

        /// Component-wise arithmetic mean, halves rounded up.
        #[must_use]
        pub fn mix(self, other: Color) -> Color {
            let mean = |a: Channel, b: Channel| ((a as u16 + b as u16 + 1) / 2) as Channel;
            Color::new(
                mean(self.red, other.red),
                mean(self.green, other.green),
                mean(self.blue, other.blue),
            )
        }
    }

    impl fmt::Display for Color {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.to_hex())
        }
    }

    impl From<[Channel; 3]> for Color {
        fn from(channels: [Channel; 3]) -> Self {
            Color::new(channels[0], channels[1], channels[2])
        }
    }

    impl From<Color> for [Channel; 3] {
        fn from(color: Color) -> Self {
            color.channels()
        }
    }

    impl FromStr for Color {
        type Err = ColorParseError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            parse_color(s)
        }
    }

    impl TryFrom<&str> for Color {
        type Error = ColorParseError;
        fn try_from(value: &str) -> Result<Self, Self::Error> {
            parse_color(value)
        }
    }

    /// Formats integer channels as lowercase `#rrggbb`.
    pub fn rgb_to_hex(red: Channel, green: Channel, blue: Channel) -> String {
        Color::new(red, green, blue).to_hex()
    }

    /// Parses `#rgb` / `#rrggbb`, with or without the leading `#`.
    pub fn hex_to_rgb(hex: &str) -> Option<Color> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        parse_hex(digits).ok()
    }

    /// Parse a hex color body (the part after `#`).
    ///
    /// The allowed formats are:
    /// * RGB
    /// * RRGGBB
    fn parse_hex(hex: &str) -> Result<Color, ColorParseError> {
        use ColorParseError::*;

        let nibble = |c: u8| -> Option<u8> {
            match c {
                b'0'..=b'9' => Some(c - b'0'),
                b'a'..=b'f' => Some(c - b'a' + 10),
                b'A'..=b'F' => Some(c - b'A' + 10),
                _ => None,
            }
        };

        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => {
                let r = nibble(bytes[0]).ok_or(InvalidHex)?;
                let g = nibble(bytes[1]).ok_or(InvalidHex)?;
                let b = nibble(bytes[2]).ok_or(InvalidHex)?;
                Ok(Color::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let pair = |hi: u8, lo: u8| -> Result<u8, ColorParseError> {
                    let h = nibble(hi).ok_or(InvalidHex)?;
                    let l = nibble(lo).ok_or(InvalidHex)?;
                    Ok(h << 4 | l)
                };
                Ok(Color::new(
                    pair(bytes[0], bytes[1])?,
                    pair(bytes[2], bytes[3])?,
                    pair(bytes[4], bytes[5])?,
                ))
            }
            _ => Err(InvalidLength),
        }
    }

    /// Parse the argument list of `rgb(...)` / `rgba(...)`.
    ///
    /// Three integer channels, optionally followed by an alpha component in [0, 1] written
    /// as plain digits and dots. Alpha is otherwise ignored: the engine only reasons about
    /// opaque color.
    fn parse_css_rgb(args: &str) -> Result<Color, ColorParseError> {
        use ColorParseError::*;

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(InvalidFunc);
        }

        let channel = |token: &str| -> Result<Channel, ColorParseError> {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(InvalidFunc);
            }
            token
                .parse::<u16>()
                .ok()
                .filter(|&v| v <= 255)
                .map(|v| v as Channel)
                .ok_or(OutOfRange)
        };

        let color = Color::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);

        if let Some(alpha) = parts.get(3) {
            if alpha.is_empty() || !alpha.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
                return Err(InvalidFunc);
            }
            let value = alpha.parse::<f32>().map_err(|_| InvalidFunc)?;
            if !(0.0..=1.0).contains(&value) {
                return Err(OutOfRange);
            }
        }

        Ok(color)
    }

    /// Parses a CSS-style color expression: `#rgb`, `#rrggbb`, `rgb(r,g,b)`,
    /// `rgba(r,g,b,a)` or a named color.
    pub fn parse_color(s: &str) -> Result<Color, ColorParseError> {
        use ColorParseError::*;

        let s = s.trim();
        if s.is_empty() {
            return Err(Empty);
        }

        if let Some(rest) = s.strip_prefix('#') {
            return parse_hex(rest.trim());
        }

        let lower = s.to_ascii_lowercase();
        let function_body = lower
            .strip_prefix("rgba")
            .or_else(|| lower.strip_prefix("rgb"))
            .map(str::trim_start);
        if let Some(body) = function_body {
            let args = body
                .strip_prefix('(')
                .and_then(|x| x.strip_suffix(')'))
                .ok_or(InvalidFunc)?;
            return parse_css_rgb(args);
        }

        if NON_COLOR_KEYWORDS.contains(&lower.as_str()) {
            return Err(Keyword(lower));
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
            .ok_or(UnknownName(lower))
    }
}
