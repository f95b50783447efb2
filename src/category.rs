//! Saffir-Simpson hurricane wind scale.
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};

/// Upper bounds of each category in m/s, lowest category first.
pub const SAFFIR_SIMPSON_BOUNDS: [f64; 7] = [17.49, 32.92, 42.7, 49.39, 58.13, 70.48, 1000.0];

/// Wind speed (m/s) at which a storm becomes a category 1 hurricane.
pub const HURRICANE_THRESHOLD: f64 = SAFFIR_SIMPSON_BOUNDS[1];

/// Category of a storm from its maximum sustained wind.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, IntoStaticStr, EnumIter)]
pub enum Category {
    #[strum(serialize = "Tropical Depression")]
    TropicalDepression,
    #[strum(serialize = "Tropical Storm")]
    TropicalStorm,
    #[strum(serialize = "Hurricane Cat. 1")]
    Cat1,
    #[strum(serialize = "Hurricane Cat. 2")]
    Cat2,
    #[strum(serialize = "Hurricane Cat. 3")]
    Cat3,
    #[strum(serialize = "Hurricane Cat. 4")]
    Cat4,
    #[strum(serialize = "Hurricane Cat. 5")]
    Cat5,
}

/// Hex colours of the 7-step rainbow scale, one per category in order.
const COLORS: [&str; 7] = [
    "#8000ff", "#2c7ef7", "#2adddd", "#80ffb4", "#d4dd80", "#ff7e41", "#ff0000",
];

impl Category {
    /// Categorize a wind speed in m/s. Returns `None` for NaN or speeds beyond the top of the
    /// scale, which only show up in corrupt data.
    pub fn from_wind_speed(speed: f64) -> Option<Self> {
        SAFFIR_SIMPSON_BOUNDS
            .iter()
            .position(|&upper| speed < upper)
            .and_then(|idx| Category::iter().nth(idx))
    }

    /// The conventional numeric code, -1 for a depression through 5.
    pub fn code(self) -> i8 {
        self as i8 - 1
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn hex_color(self) -> &'static str {
        COLORS[self as usize]
    }

    pub fn rgb(self) -> [u8; 3] {
        hex_to_rgb(self.hex_color())
    }
}

pub(crate) fn hex_to_rgb(hex: &str) -> [u8; 3] {
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
    [channel(1), channel(3), channel(5)]
}
