//! Keyword to tag-filter mapping

use serde::Serialize;

/// Amenity categories with a fixed tag filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    Cafe,
    Restaurant,
    Atm,
    FuelStation,
    Hotel,
}

impl PoiCategory {
    /// Look up the category for a normalized keyword
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "cà phê" | "cafe" => Some(PoiCategory::Cafe),
            "nhà hàng" | "restaurant" => Some(PoiCategory::Restaurant),
            "atm" => Some(PoiCategory::Atm),
            "cây xăng" => Some(PoiCategory::FuelStation),
            "hotel" | "khách sạn" => Some(PoiCategory::Hotel),
            _ => None,
        }
    }

    /// `(key, value)` of the tag this category selects
    #[must_use]
    pub fn tag(&self) -> (&'static str, &'static str) {
        match self {
            PoiCategory::Cafe => ("amenity", "cafe"),
            PoiCategory::Restaurant => ("amenity", "restaurant"),
            PoiCategory::Atm => ("amenity", "atm"),
            PoiCategory::FuelStation => ("amenity", "fuel"),
            PoiCategory::Hotel => ("tourism", "hotel"),
        }
    }
}

/// Tag filter applied to a spatial query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PoiFilter {
    /// Exact category tag
    Category(PoiCategory),
    /// Case-insensitive match on the `name` tag
    NameMatch(String),
    /// Any feature carrying the given key
    HasKey(String),
}

impl PoiFilter {
    /// Filter for a whitelisted keyword: its category when mapped, else a
    /// name match on the keyword itself
    #[must_use]
    pub fn for_keyword(keyword: &str) -> Self {
        PoiCategory::from_keyword(keyword)
            .map_or_else(|| PoiFilter::NameMatch(keyword.to_string()), PoiFilter::Category)
    }

    /// Filter used around a resolved place when no keyword was given
    #[must_use]
    pub fn nearby_attractions() -> Self {
        PoiFilter::HasKey("tourism".to_string())
    }

    /// The tag key whose value describes a match, if the filter implies one
    #[must_use]
    pub fn category_key(&self) -> Option<&str> {
        match self {
            PoiFilter::Category(category) => Some(category.tag().0),
            PoiFilter::HasKey(key) => Some(key.as_str()),
            PoiFilter::NameMatch(_) => None,
        }
    }

    /// Word used in placeholder names for unnamed features
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            PoiFilter::Category(category) => category.tag().1,
            PoiFilter::NameMatch(keyword) => keyword.as_str(),
            PoiFilter::HasKey(key) => key.as_str(),
        }
    }

    /// Render as an Overpass QL tag selector
    #[must_use]
    pub fn to_overpass(&self) -> String {
        match self {
            PoiFilter::Category(category) => {
                let (key, value) = category.tag();
                format!(r#"["{key}"="{value}"]"#)
            }
            PoiFilter::NameMatch(keyword) => {
                format!(r#"["name"~"{}",i]"#, escape(&escape_regex(keyword)))
            }
            PoiFilter::HasKey(key) => format!(r#"["{}"]"#, escape(key)),
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Match the keyword literally inside a POSIX extended regex
fn escape_regex(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
