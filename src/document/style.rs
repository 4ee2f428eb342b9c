use std::{collections::BTreeMap, fmt, str::FromStr};

const GENERIC_FAMILIES: &[&str] = &["serif", "sans-serif", "monospace"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn name(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alignment {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            "justify" | "full" => Ok(Alignment::Justify),
            _ => Err(()),
        }
    }
}

/// Parses an inline `style` attribute into property/value pairs.
pub fn parse_declarations(source: &str) -> BTreeMap<String, String> {
    let mut declarations = BTreeMap::new();
    for declaration in source.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        if property.is_empty() || value.is_empty() {
            continue;
        }
        declarations.insert(property, value.to_string());
    }
    declarations
}

pub fn serialize_declarations(style: &BTreeMap<String, String>) -> String {
    style
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Integer pixel size of a `font-size` value. Only px and unit-less values
/// resolve; the fractional part is dropped.
pub fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim().to_ascii_lowercase();
    let number = value.strip_suffix("px").unwrap_or(&value).trim();
    let digits: String = number.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let rest = &number[digits.len()..];
    if !rest.is_empty() && !(rest.starts_with('.') && rest[1..].chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    digits.parse().ok().filter(|size| *size > 0)
}

/// First concrete family of a `font-family` list, or `None` when the first
/// entry is a generic keyword.
pub fn primary_font_family(value: &str) -> Option<String> {
    let first = value.split(',').next()?;
    let name: String = first.chars().filter(|c| *c != '"' && *c != '\'').collect();
    let name = name.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("inherit") {
        return None;
    }
    if GENERIC_FAMILIES
        .iter()
        .any(|generic| name.eq_ignore_ascii_case(generic))
    {
        return None;
    }
    Some(name.to_string())
}

/// Quotes family names containing whitespace.
pub fn quote_font_family(name: &str) -> String {
    let name = name.trim();
    if name.contains(char::is_whitespace) && !name.starts_with(['"', '\'']) {
        format!("'{name}'")
    } else {
        name.to_string()
    }
}

pub fn is_default_text_color(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(
        compact.as_str(),
        "" | "inherit" | "initial" | "black" | "#000" | "#000000" | "rgb(0,0,0)"
    )
}

pub fn is_default_background(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(
        compact.as_str(),
        "" | "inherit" | "initial" | "transparent" | "rgba(0,0,0,0)"
    )
}

/// Space separated `text-decoration` keywords.
pub fn decoration_has(value: &str, keyword: &str) -> bool {
    value
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case(keyword))
}

/// Removes `keyword` from a `text-decoration` value; `None` when nothing is left.
pub fn decoration_without(value: &str, keyword: &str) -> Option<String> {
    let rest: Vec<&str> = value
        .split_whitespace()
        .filter(|token| !token.eq_ignore_ascii_case(keyword))
        .collect();
    if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    }
}

pub fn is_bold_weight(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "bold" | "bolder" => true,
        other => other.parse::<u32>().is_ok_and(|weight| weight >= 600),
    }
}
