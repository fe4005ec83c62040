//! Unit and style settings declared with `\psset{key=value,...}`

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use thiserror::Error;

use crate::types::UnitScale;

/// Stroke pattern of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

impl FromStr for LineStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            "none" => Ok(LineStyle::None),
            other => Err(UnknownStyle(other.to_string())),
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
            LineStyle::None => "none",
        })
    }
}

/// Interior pattern of a closed shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillStyle {
    #[default]
    None,
    Solid,
    Vlines,
    Hlines,
    Crosshatch,
}

impl FromStr for FillStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Starred variants also fill the background; the painter treats them alike.
        match s.trim_end_matches('*') {
            "none" => Ok(FillStyle::None),
            "solid" => Ok(FillStyle::Solid),
            "vlines" => Ok(FillStyle::Vlines),
            "hlines" => Ok(FillStyle::Hlines),
            "crosshatch" => Ok(FillStyle::Crosshatch),
            _ => Err(UnknownStyle(s.to_string())),
        }
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FillStyle::None => "none",
            FillStyle::Solid => "solid",
            FillStyle::Vlines => "vlines",
            FillStyle::Hlines => "hlines",
            FillStyle::Crosshatch => "crosshatch",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown style {0:?}")]
pub struct UnknownStyle(pub String);

/// Current unit scale and style defaults.
///
/// Style fields left as `None` fall through to each command's own defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub unit: UnitScale,
    pub xunit: UnitScale,
    pub yunit: UnitScale,
    pub runit: UnitScale,
    pub linecolor: Option<String>,
    pub linestyle: Option<LineStyle>,
    pub linewidth: Option<f64>,
    pub fillcolor: Option<String>,
    pub fillstyle: Option<FillStyle>,
}

static PSSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\psset\{([^}]*)\}").expect("valid psset pattern"));

/// The body of a `\psset{...}` declaration in `text`, if any.
pub fn psset_body(text: &str) -> Option<&str> {
    PSSET
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

impl Settings {
    /// Apply the `key=value` pairs of a declaration body.
    ///
    /// Unknown keys and unreadable values leave the settings untouched.
    pub fn declare(&mut self, body: &str) {
        for pair in body.split(',') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "linecolor" => self.linecolor = Some(value.to_string()),
                "fillcolor" => self.fillcolor = Some(value.to_string()),
                "linestyle" => match value.parse() {
                    Ok(style) => self.linestyle = Some(style),
                    Err(err) => crate::log::warn!("psset: {}", err),
                },
                "fillstyle" => match value.parse() {
                    Ok(style) => self.fillstyle = Some(style),
                    Err(err) => crate::log::warn!("psset: {}", err),
                },
                "linewidth" => match value.parse::<f64>() {
                    Ok(width) if width.is_finite() => self.linewidth = Some(width),
                    _ => crate::log::warn!("psset: ignoring linewidth {:?}", value),
                },
                _ if key.starts_with("unit") => {
                    if let Some(scale) = unit_scale(value) {
                        self.unit = scale;
                        self.xunit = scale;
                        self.yunit = scale;
                        self.runit = scale;
                    }
                }
                _ if key.starts_with("xunit") => {
                    if let Some(scale) = unit_scale(value) {
                        self.xunit = scale;
                    }
                }
                _ if key.starts_with("yunit") => {
                    if let Some(scale) = unit_scale(value) {
                        self.yunit = scale;
                    }
                }
                _ if key.starts_with("runit") => {
                    if let Some(scale) = unit_scale(value) {
                        self.runit = scale;
                    }
                }
                _ => crate::log::debug!("psset: ignoring key {:?}", key),
            }
        }
    }
}

fn unit_scale(value: &str) -> Option<UnitScale> {
    match UnitScale::try_new(convert_units(value)) {
        Ok(scale) => Some(scale),
        Err(err) => {
            crate::log::warn!("psset: ignoring unit {:?}: {}", value, err);
            None
        }
    }
}

static LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*([A-Za-z]*)").expect("valid length pattern")
});

/// Convert a length such as `1cm`, `0.5in` or `2` to output units.
///
/// A bare number is read in centimetres. An unknown suffix keeps the number as
/// it is, already in output units. Unreadable text converts to 0.
pub fn convert_units(value: &str) -> f64 {
    let value = value.trim();
    let Some(caps) = LENGTH.captures(value) else {
        crate::log::warn!("cannot read length {:?}", value);
        return 0.0;
    };
    let number: f64 = caps[1].parse().unwrap_or(0.0);
    match &caps[2] {
        "" | "cm" => number * UnitScale::CM.raw(),
        "mm" => number * UnitScale::CM.raw() / 10.0,
        "in" => number * 20.0,
        _ => number,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_known_units() {
        assert_eq!(convert_units("1cm"), 50.0);
        assert_eq!(convert_units("0.5 cm"), 25.0);
        assert_eq!(convert_units("10mm"), 50.0);
        assert_eq!(convert_units("2in"), 40.0);
        assert_eq!(convert_units("2"), 100.0);
    }

    #[test]
    fn convert_unknown_suffix_keeps_number() {
        assert_eq!(convert_units("12pt"), 12.0);
        assert_eq!(convert_units("abc"), 0.0);
        assert_eq!(convert_units(""), 0.0);
    }

    #[test]
    fn declare_units() {
        let mut settings = Settings::default();
        settings.declare("unit=2cm");
        assert_eq!(settings.xunit.raw(), 100.0);
        assert_eq!(settings.yunit.raw(), 100.0);
        assert_eq!(settings.runit.raw(), 100.0);

        settings.declare("xunit=1in, yunit = 0.5cm");
        assert_eq!(settings.xunit.raw(), 20.0);
        assert_eq!(settings.yunit.raw(), 25.0);
        assert_eq!(settings.unit.raw(), 100.0);
    }

    #[test]
    fn declare_styles() {
        let mut settings = Settings::default();
        settings.declare("linecolor=red,fillstyle=solid,linestyle=dashed,linewidth=3");
        assert_eq!(settings.linecolor.as_deref(), Some("red"));
        assert_eq!(settings.fillstyle, Some(FillStyle::Solid));
        assert_eq!(settings.linestyle, Some(LineStyle::Dashed));
        assert_eq!(settings.linewidth, Some(3.0));
    }

    #[test]
    fn declare_ignores_bad_values() {
        let mut settings = Settings::default();
        settings.declare("unit=0cm,linestyle=wavy,linewidth=thick,bogus=1,noequals");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn psset_body_extracts_pairs() {
        assert_eq!(psset_body(r"\psset{unit=1cm}"), Some("unit=1cm"));
        assert_eq!(psset_body(r"\psline(1,1)"), None);
    }

    #[test]
    fn unknown_style_names_the_value() {
        let err = "wavy".parse::<LineStyle>().unwrap_err();
        assert_eq!(err, UnknownStyle("wavy".to_string()));
        assert_eq!(err.to_string(), r#"unknown style "wavy""#);
        assert!("stripes".parse::<FillStyle>().is_err());
    }
}
