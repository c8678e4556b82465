// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tag storage and typed tag value parsing
//!
//! OSM tag values are free text. Every parser here is lenient: it returns
//! `None` (or `0.0` for heights) on input it cannot read and logs a warning,
//! so a bad tag never stops a building from being generated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag keys consumed by the building pipeline
pub mod keys {
    pub const BUILDING: &str = "building";
    pub const BUILDING_PART: &str = "building:part";
    pub const NAME: &str = "name";
    pub const HEIGHT: &str = "height";
    pub const ELEVATION: &str = "ele";
    pub const BUILDING_LEVELS: &str = "building:levels";
    pub const BUILDING_COLOUR: &str = "building:colour";
    pub const BUILDING_MATERIAL: &str = "building:material";
    pub const ROOF_SHAPE: &str = "roof:shape";
    pub const BUILDING_ROOF_SHAPE: &str = "building:roof:shape";
    pub const ROOF_LEVELS: &str = "roof:levels";
    pub const ROOF_ORIENTATION: &str = "roof:orientation";
    pub const ROOF_DIRECTION: &str = "roof:direction";
    pub const ROOF_MATERIAL: &str = "roof:material";
    pub const ROOF_COLOUR: &str = "roof:colour";
    pub const ROOF_HEIGHT: &str = "roof:height";
    pub const BUILDING_ROOF_HEIGHT: &str = "building:roof:height";
    pub const ROOF_ANGLE: &str = "roof:angle";
    pub const ROOF_RIDGE: &str = "roof:ridge";
    pub const ROOF_EDGE: &str = "roof:edge";
    pub const BUILDING_ROOF_RIDGE: &str = "building:roof:ridge";
    pub const BUILDING_ROOF_EDGE: &str = "building:roof:edge";
    pub const ADDR_HOUSENUMBER: &str = "addr:housenumber";
    pub const ADDR_POSTCODE: &str = "addr:postcode";
    pub const ADDR_STREET: &str = "addr:street";
    pub const ADDR_CITY: &str = "addr:city";
    pub const ADDR_COUNTRY: &str = "addr:country";
}

/// Key/value tags of one element, keys unique
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of the first key present, in the order given
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace a tag, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a float tag, logging values that are present but unreadable
    pub fn float(&self, key: &str) -> Option<f64> {
        let raw = self.get(key)?;
        let parsed = parse_float(raw);
        if parsed.is_none() {
            log::warn!("unparsable value for {key}: {raw:?}");
        }
        parsed
    }

    /// Parse a level count tag, see [`parse_levels`]
    pub fn levels(&self, key: &str) -> Option<i32> {
        let raw = self.get(key)?;
        let parsed = parse_levels(raw);
        if parsed.is_none() {
            log::warn!("unparsable level count for {key}: {raw:?}");
        }
        parsed
    }

    /// Parse an angle tag, see [`parse_angle`]
    pub fn angle(&self, key: &str) -> Option<f64> {
        let raw = self.get(key)?;
        let parsed = parse_angle(raw);
        if parsed.is_none() {
            log::warn!("unparsable angle for {key}: {raw:?}");
        }
        parsed
    }

    /// Parse an integer tag, logging values that are present but unreadable
    pub fn int(&self, key: &str) -> Option<i32> {
        let raw = self.get(key)?;
        let parsed = raw.trim().parse::<i32>().ok();
        if parsed.is_none() {
            log::warn!("unparsable value for {key}: {raw:?}");
        }
        parsed
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse a plain decimal number, accepting surrounding whitespace
#[inline]
pub fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a level count (`building:levels`, `roof:levels`)
///
/// Fractional counts such as `"2.5"` are truncated to whole levels.
pub fn parse_levels(value: &str) -> Option<i32> {
    let value = value.trim();
    value
        .parse::<i32>()
        .ok()
        .or_else(|| parse_float(value).map(|v| v.trunc() as i32))
}

/// Parse a slope angle in degrees, with or without a `°` or `deg` suffix
pub fn parse_angle(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value
        .strip_suffix('°')
        .or_else(|| value.strip_suffix("deg"))
        .unwrap_or(value);
    parse_float(value)
}

/// Parse a length tag into meters
///
/// Accepts plain meters (`"12.5"`), a meter suffix (`"12.5 m"`, `"12.5m"`) and
/// feet/inches (`"6'2\""`, `"6'"`, `"14\""`). Returns `0.0` for anything else,
/// which callers treat as "no usable value".
pub fn parse_height(value: &str) -> f64 {
    let parsed = if let Some(idx) = value.find('m') {
        parse_float(&value[..idx])
    } else if value.contains('\'') || value.contains('"') {
        feet_inches_to_meters(value)
    } else {
        parse_float(value)
    };
    match parsed {
        Some(h) => h,
        None => {
            log::warn!("unparsable height {value:?}");
            0.0
        }
    }
}

fn feet_inches_to_meters(value: &str) -> Option<f64> {
    let (feet, inches) = match value.find('\'') {
        Some(ft_idx) => {
            let feet = parse_float(&value[..ft_idx])?;
            let inches = match value[ft_idx + 1..].find('"') {
                Some(in_idx) => parse_float(&value[ft_idx + 1..ft_idx + 1 + in_idx])?,
                None => 0.0,
            };
            (feet, inches)
        }
        None => {
            let in_idx = value.find('"')?;
            (0.0, parse_float(&value[..in_idx])?)
        }
    };
    Some(0.3048 * feet + 0.0254 * inches)
}

/// Parse a roof direction into degrees clockwise from north
///
/// Numeric values are taken as-is; compass points map to multiples of 22.5°.
pub fn parse_direction(value: &str) -> Option<f64> {
    if let Some(deg) = parse_float(value) {
        return Some(deg);
    }
    let deg = match value.trim() {
        "N" => 0.0,
        "NNE" => 22.5,
        "NE" => 45.0,
        "ENE" => 67.5,
        "E" => 90.0,
        "ESE" => 112.5,
        "SE" => 135.0,
        "SSE" => 157.5,
        "S" => 180.0,
        "SSW" => 202.5,
        "SW" => 225.0,
        "WSW" => 247.5,
        "W" => 270.0,
        "WNW" => 292.5,
        "NW" => 315.0,
        "NNW" => 337.5,
        _ => return None,
    };
    Some(deg)
}

/// Ridge orientation relative to the footprint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoofOrientation {
    /// Ridge parallel to the longest side
    #[default]
    Along,
    /// Ridge parallel to the shortest side
    Across,
}

impl RoofOrientation {
    /// Parse `roof:orientation`, tolerating the common `accross` misspelling
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "along" => Some(RoofOrientation::Along),
            "across" | "accross" => Some(RoofOrientation::Across),
            _ => None,
        }
    }
}

/// Linear RGBA colour with components in `0.0..=1.0`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Component-wise match within `tolerance`, alpha ignored
    pub fn approx_eq(&self, other: &Rgba, tolerance: f32) -> bool {
        (self.r - other.r).abs() <= tolerance
            && (self.g - other.g).abs() <= tolerance
            && (self.b - other.b).abs() <= tolerance
    }
}

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("cream", Rgba::rgb(1.0, 0.99, 0.82)),
    ("sand", Rgba::rgb(0.76, 0.70, 0.50)),
    ("red", Rgba::rgb(1.0, 0.0, 0.0)),
    ("cyan", Rgba::rgb(0.0, 1.0, 1.0)),
    ("aqua", Rgba::rgb(0.0, 1.0, 1.0)),
    ("blue", Rgba::rgb(0.0, 0.0, 1.0)),
    ("darkblue", Rgba::rgb(0.0, 0.0, 0.627)),
    ("lightblue", Rgba::rgb(0.678, 0.847, 0.902)),
    ("purple", Rgba::rgb(0.502, 0.0, 0.502)),
    ("yellow", Rgba::rgb(1.0, 1.0, 0.0)),
    ("lime", Rgba::rgb(0.0, 1.0, 0.0)),
    ("fuchsia", Rgba::rgb(1.0, 0.0, 1.0)),
    ("magenta", Rgba::rgb(1.0, 0.0, 1.0)),
    ("white", Rgba::rgb(1.0, 1.0, 1.0)),
    ("silver", Rgba::rgb(0.753, 0.753, 0.753)),
    ("grey", Rgba::rgb(0.502, 0.502, 0.502)),
    ("gray", Rgba::rgb(0.502, 0.502, 0.502)),
    ("black", Rgba::rgb(0.0, 0.0, 0.0)),
    ("orange", Rgba::rgb(1.0, 0.647, 0.0)),
    ("brown", Rgba::rgb(0.647, 0.165, 0.165)),
    ("maroon", Rgba::rgb(0.502, 0.0, 0.0)),
    ("green", Rgba::rgb(0.0, 0.502, 0.0)),
    ("olive", Rgba::rgb(0.502, 0.502, 0.0)),
    ("navy", Rgba::rgb(0.0, 0.0, 0.502)),
    ("teal", Rgba::rgb(0.0, 0.502, 0.502)),
];

/// Parse an OSM colour value
///
/// Handles `rgb(r,g,b)`, hex (`#rgb`, `#rrggbb`, `#rrggbbaa`) and a set of
/// named colours. Underscores are stripped before name lookup so that
/// `light_blue` matches `lightblue`.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim();
    if let Some(body) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let mut parts = body.split(',').map(|p| p.trim().parse::<u8>());
        let color = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) => Some(Rgba::from_bytes(r, g, b, 255)),
            _ => None,
        };
        if color.is_none() {
            log::warn!("unparsable rgb colour {value:?}");
        }
        return color;
    }

    let name = value.replace('_', "").to_ascii_lowercase();
    if let Some(hex) = name.strip_prefix('#') {
        return parse_hex(hex);
    }
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    let nibble = |c: &str| byte(c).map(|v| v * 17);
    match hex.len() {
        3 => Some(Rgba::from_bytes(
            nibble(&hex[0..1])?,
            nibble(&hex[1..2])?,
            nibble(&hex[2..3])?,
            255,
        )),
        6 => Some(Rgba::from_bytes(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            255,
        )),
        8 => Some(Rgba::from_bytes(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_plain_and_suffix() {
        assert_eq!(parse_height("12.5"), 12.5);
        assert_eq!(parse_height("12.5 m"), 12.5);
        assert_eq!(parse_height("12.5m"), 12.5);
    }

    #[test]
    fn test_height_feet_inches() {
        let h = parse_height("6'2\"");
        assert!((h - (0.3048 * 6.0 + 0.0254 * 2.0)).abs() < 1e-9);
        assert!((h - 1.8796).abs() < 1e-4);
        assert!((parse_height("10'") - 3.048).abs() < 1e-9);
        assert!((parse_height("14\"") - 0.3556).abs() < 1e-9);
    }

    #[test]
    fn test_height_bad_input() {
        assert_eq!(parse_height("abc"), 0.0);
        assert_eq!(parse_height(""), 0.0);
        assert_eq!(parse_height("x'y\""), 0.0);
    }

    #[test]
    fn test_levels_and_angles() {
        assert_eq!(parse_levels(" 3 "), Some(3));
        assert_eq!(parse_levels("2.5"), Some(2));
        assert_eq!(parse_levels("many"), None);
        assert_eq!(parse_angle("30"), Some(30.0));
        assert_eq!(parse_angle("45°"), Some(45.0));
        assert_eq!(parse_angle("12.5 deg"), Some(12.5));
        assert_eq!(parse_angle("steep"), None);
    }

    #[test]
    fn test_direction() {
        assert_eq!(parse_direction("135"), Some(135.0));
        assert_eq!(parse_direction("SSW"), Some(202.5));
        assert_eq!(parse_direction("NNW"), Some(337.5));
        assert_eq!(parse_direction("up"), None);
    }

    #[test]
    fn test_orientation_misspelling() {
        assert_eq!(
            RoofOrientation::parse("accross"),
            Some(RoofOrientation::Across)
        );
        assert_eq!(RoofOrientation::parse("along"), Some(RoofOrientation::Along));
        assert_eq!(RoofOrientation::parse("sideways"), None);
    }

    #[test]
    fn test_colors() {
        assert_eq!(parse_color("cream"), Some(Rgba::rgb(1.0, 0.99, 0.82)));
        assert_eq!(
            parse_color("rgb(114, 200, 251)"),
            Some(Rgba::from_bytes(114, 200, 251, 255))
        );
        assert_eq!(parse_color("#ff0000"), Some(Rgba::rgb(1.0, 0.0, 0.0)));
        assert_eq!(parse_color("#fff"), Some(Rgba::rgb(1.0, 1.0, 1.0)));
        assert_eq!(
            parse_color("light_blue"),
            parse_color("lightblue")
        );
        assert!(parse_color("lightblue").is_some());
        assert_eq!(parse_color("rgb(300,0,0)"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_tags_first_of() {
        let tags: Tags = [("building:roof:shape", "hipped")].into_iter().collect();
        assert_eq!(
            tags.first_of(&[keys::ROOF_SHAPE, keys::BUILDING_ROOF_SHAPE]),
            Some("hipped")
        );
        assert_eq!(tags.float("building:roof:shape"), None);
    }
}
