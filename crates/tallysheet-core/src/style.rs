use serde::{Deserialize, Serialize};

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "default_alpha")]
    pub a: u8,
}

fn default_alpha() -> u8 {
    255
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Convert to CSS hex color string
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse from CSS hex color string ("#rrggbb" or "#rrggbbaa")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// How the renderer should format a numeric display value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    General,
    Number,
    Currency,
    Percent,
}

/// Cell style attributes. Independent of the cell's raw/value state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<HorizontalAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A single style edit, one variant per attribute of [`CellStyle`].
///
/// `None` payloads clear the attribute back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "attr", content = "value", rename_all = "snake_case")]
pub enum StyleAttr {
    Bold(bool),
    Italic(bool),
    Underline(bool),
    FontSize(Option<u8>),
    Align(Option<HorizontalAlign>),
    TextColor(Option<Color>),
    Background(Option<Color>),
    NumberFormat(Option<NumberFormat>),
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no attribute differs from the default
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }

    /// Apply one attribute edit in place
    pub fn apply(&mut self, attr: StyleAttr) {
        match attr {
            StyleAttr::Bold(v) => self.bold = v,
            StyleAttr::Italic(v) => self.italic = v,
            StyleAttr::Underline(v) => self.underline = v,
            StyleAttr::FontSize(v) => self.font_size = v,
            StyleAttr::Align(v) => self.align = v,
            StyleAttr::TextColor(v) => self.text_color = v,
            StyleAttr::Background(v) => self.background = v,
            StyleAttr::NumberFormat(v) => self.number_format = v,
        }
    }

    /// Builder pattern: apply an attribute edit
    pub fn with(mut self, attr: StyleAttr) -> Self {
        self.apply(attr);
        self
    }

    /// Get the effective font size (default is 13)
    pub fn effective_font_size(&self) -> u8 {
        self.font_size.unwrap_or(13)
    }
}
