// Chart color parsing: "#rrggbb", "#rgb" or a basic color name

use anyhow::{anyhow, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map, map_res},
    sequence::{preceded, tuple},
    IResult,
};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default chart color.
pub const DEFAULT_COLOR: &str = "#69b3a2";

/// An opaque RGB color, serialized as a lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChartColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ChartColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb(self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for ChartColor {
    fn default() -> Self {
        Self::new(0x69, 0xb3, 0xa2)
    }
}

impl fmt::Display for ChartColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ChartColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(named) = named_color(s) {
            return Ok(named);
        }
        match all_consuming(hex_color)(s) {
            Ok((_, color)) => Ok(color),
            Err(_) => Err(anyhow!(
                "Invalid color '{}': expected a hex value like {}",
                s,
                DEFAULT_COLOR
            )),
        }
    }
}

impl TryFrom<String> for ChartColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChartColor> for String {
    fn from(color: ChartColor) -> Self {
        color.to_hex()
    }
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Two hex digits as one channel
fn hex_pair(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, is_hex_digit), |s: &str| {
        u8::from_str_radix(s, 16)
    })(input)
}

/// One hex digit doubled ("a" -> 0xaa)
fn hex_single(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(1, 1, is_hex_digit), |s: &str| {
        u8::from_str_radix(s, 16).map(|v| v * 17)
    })(input)
}

/// Parse "#rrggbb" or "#rgb"
pub fn hex_color(input: &str) -> IResult<&str, ChartColor> {
    preceded(
        char('#'),
        alt((
            all_consuming(map(tuple((hex_pair, hex_pair, hex_pair)), |(r, g, b)| {
                ChartColor::new(r, g, b)
            })),
            map(tuple((hex_single, hex_single, hex_single)), |(r, g, b)| {
                ChartColor::new(r, g, b)
            }),
        )),
    )(input)
}

fn named_color(name: &str) -> Option<ChartColor> {
    let color = match name.to_ascii_lowercase().as_str() {
        "red" => ChartColor::new(255, 0, 0),
        "green" => ChartColor::new(0, 255, 0),
        "blue" => ChartColor::new(0, 0, 255),
        "black" => ChartColor::new(0, 0, 0),
        "yellow" => ChartColor::new(255, 255, 0),
        "cyan" => ChartColor::new(0, 255, 255),
        "magenta" => ChartColor::new(255, 0, 255),
        "white" => ChartColor::new(255, 255, 255),
        _ => return None,
    };
    Some(color)
}
