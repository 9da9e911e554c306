//! Overlay layout settings

use crate::{caption::DEFAULT_TEMPLATE, Error, Result};
use std::fmt;
use std::str::FromStr;

/// Horizontal anchoring of the caption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HorizontalAlign {
    Left,
    Center,
    #[default]
    Right,
}

/// Vertical anchoring of the caption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl HorizontalAlign {
    /// Numeric code used by the settings store (0 = left, 1 = center, 2 = right)
    pub fn code(self) -> u32 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl VerticalAlign {
    /// Numeric code used by the settings store (0 = top, 1 = middle, 2 = bottom)
    pub fn code(self) -> u32 {
        match self {
            Self::Top => 0,
            Self::Middle => 1,
            Self::Bottom => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

impl TryFrom<u32> for HorizontalAlign {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Left),
            1 => Ok(Self::Center),
            2 => Ok(Self::Right),
            other => Err(Error::InvalidAlign(other)),
        }
    }
}

impl TryFrom<u32> for VerticalAlign {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Top),
            1 => Ok(Self::Middle),
            2 => Ok(Self::Bottom),
            other => Err(Error::InvalidVAlign(other)),
        }
    }
}

impl FromStr for HorizontalAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => other
                .parse::<u32>()
                .map_err(|_| Error::InvalidAlign(u32::MAX))
                .and_then(Self::try_from),
        }
    }
}

impl FromStr for VerticalAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "middle" => Ok(Self::Middle),
            "bottom" => Ok(Self::Bottom),
            other => other
                .parse::<u32>()
                .map_err(|_| Error::InvalidVAlign(u32::MAX))
                .and_then(Self::try_from),
        }
    }
}

impl fmt::Display for HorizontalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VerticalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the overlay needs to know to format and place a caption
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    /// Margin as a percentage of the canvas height (applied on both axes)
    pub margin_percent: i32,
    pub align: HorizontalAlign,
    pub valign: VerticalAlign,
    /// Text size as a fraction; multiplied by `canvas height * 0.01` before measuring
    pub scale: f64,
    /// Caption template, see [`crate::caption`]
    pub template: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_percent: 3,
            align: HorizontalAlign::Right,
            valign: VerticalAlign::Top,
            scale: 0.2,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.margin_percent, 3);
        assert_eq!(layout.align, HorizontalAlign::Right);
        assert_eq!(layout.valign, VerticalAlign::Top);
        assert_eq!(layout.scale, 0.2);
        assert_eq!(layout.template, "&h:&m:&s.&f");
    }

    #[test]
    fn test_codes_roundtrip() {
        for align in [HorizontalAlign::Left, HorizontalAlign::Center, HorizontalAlign::Right] {
            assert_eq!(HorizontalAlign::try_from(align.code()).unwrap(), align);
        }
        for valign in [VerticalAlign::Top, VerticalAlign::Middle, VerticalAlign::Bottom] {
            assert_eq!(VerticalAlign::try_from(valign.code()).unwrap(), valign);
        }
        assert!(matches!(HorizontalAlign::try_from(3), Err(Error::InvalidAlign(3))));
        assert!(matches!(VerticalAlign::try_from(7), Err(Error::InvalidVAlign(7))));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Left".parse::<HorizontalAlign>().unwrap(), HorizontalAlign::Left);
        assert_eq!("1".parse::<HorizontalAlign>().unwrap(), HorizontalAlign::Center);
        assert_eq!("BOTTOM".parse::<VerticalAlign>().unwrap(), VerticalAlign::Bottom);
        assert!("sideways".parse::<VerticalAlign>().is_err());
    }
}
