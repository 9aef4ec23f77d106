//! Supported hardware and their display layouts.

use std::fmt;

use super::display::ByteOrder::{BigEndian as BE, LittleEndian as LE};
use super::display::Display;
use crate::error::{Error, Result};

const CT_V1: &[Display] = &[
    Display::new("left", b'L', 60, 270, 0, 0, LE),
    Display::new("main", b'A', 360, 270, 60, 0, LE),
    Display::new("right", b'R', 60, 270, 420, 0, LE),
    Display::new("dial", b'W', 240, 240, 0, 0, BE),
];

const CT_V2: &[Display] = &[
    Display::new("left", b'M', 60, 270, 0, 0, LE),
    Display::new("main", b'M', 360, 270, 60, 0, LE),
    Display::new("right", b'M', 60, 270, 420, 0, LE),
    Display::new("all", b'M', 480, 270, 0, 0, LE),
    Display::new("dial", b'W', 240, 240, 0, 0, BE),
];

const LIVE: &[Display] = &[
    Display::new("left", b'L', 60, 270, 0, 0, LE),
    Display::new("main", b'A', 360, 270, 0, 0, LE),
    Display::new("right", b'R', 60, 270, 0, 0, LE),
];

const LIVE_S: &[Display] = &[
    Display::new("left", b'M', 60, 270, 0, 0, LE),
    Display::new("main", b'M', 360, 270, 60, 0, LE),
    Display::new("right", b'M', 60, 270, 420, 0, LE),
    Display::new("all", b'M', 480, 270, 0, 0, LE),
];

/// A supported device, selected by USB product ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    CtV1,
    CtV2,
    Live,
    LiveS,
    RazerStreamController,
}

/// (product code, model) pairs.
const PRODUCTS: &[(&str, Model)] = &[
    ("0003", Model::CtV1),
    ("0007", Model::CtV2),
    ("0004", Model::Live),
    ("0006", Model::LiveS),
    ("0d06", Model::RazerStreamController),
];

impl Model {
    /// Look up a model by its product code, four lowercase hex digits.
    pub fn from_product_code(code: &str) -> Result<Self> {
        PRODUCTS
            .iter()
            .find(|(product, _)| product.eq_ignore_ascii_case(code))
            .map(|(_, model)| *model)
            .ok_or_else(|| Error::UnsupportedModel(code.to_string()))
    }

    /// USB product code, the inverse of [`Model::from_product_code`].
    pub fn product_code(self) -> &'static str {
        PRODUCTS
            .iter()
            .find(|(_, model)| *model == self)
            .map(|(code, _)| *code)
            .unwrap_or_default()
    }

    /// Marketing name, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Model::CtV1 => "Loupedeck CT v1",
            Model::CtV2 => "Loupedeck CT v2",
            Model::Live => "Loupedeck Live",
            Model::LiveS => "Loupedeck Live S",
            Model::RazerStreamController => "Razer Stream Controller",
        }
    }

    /// Every display this model exposes.
    pub fn displays(self) -> &'static [Display] {
        match self {
            Model::CtV1 => CT_V1,
            Model::CtV2 => CT_V2,
            Model::Live => LIVE,
            Model::LiveS | Model::RazerStreamController => LIVE_S,
        }
    }

    /// Display by name, e.g. `"main"` or `"dial"`.
    pub fn display(self, name: &str) -> Option<&'static Display> {
        self.displays().iter().find(|display| display.name == name)
    }

    /// Whether the model has the large touch-sensitive rotary knob.
    pub fn has_dial(self) -> bool {
        self.display("dial").is_some()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
