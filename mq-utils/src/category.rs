//! Garment categories, the slots they occupy and the body regions they cover.
//!
//! Raw category strings arrive from the wardrobe UI in several spellings
//! (Korean labels, capitalised display names, English synonyms). They are
//! normalized once at the boundary; everything downstream works on
//! [`GarmentCategory`] and [`GarmentSlot`].

use std::fmt;

/// Alias table: raw input -> canonical category key.
///
/// Lookup is exact first, then on the lower-cased input.
pub const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("아우터", "outer"),
    ("상의", "top"),
    ("하의", "bottom"),
    ("바지", "bottom"),
    ("치마", "bottom"),
    ("원피스", "dress"),
    ("신발", "shoes"),
    ("Outer", "outer"),
    ("Top", "top"),
    ("Bottom", "bottom"),
    ("outerwear", "outer"),
    ("pants", "bottom"),
    ("skirt", "bottom"),
    ("one-piece", "dress"),
    ("onepiece", "dress"),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GarmentCategory {
    Outer,
    Top,
    Bottom,
    Dress,
    Shoes,
    /// Unmapped input, kept lower-cased.
    Other(String),
}

impl GarmentCategory {
    pub fn from_key(key: &str) -> Self {
        match key {
            "outer" => Self::Outer,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "dress" => Self::Dress,
            "shoes" => Self::Shoes,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Outer => "outer",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Dress => "dress",
            Self::Shoes => "shoes",
            Self::Other(key) => key.as_str(),
        }
    }

    /// Slot this category occupies. Anything unrecognised lands on `top`.
    pub fn slot(&self) -> GarmentSlot {
        match self {
            Self::Outer | Self::Top | Self::Other(_) => GarmentSlot::Top,
            Self::Bottom => GarmentSlot::Bottom,
            Self::Dress => GarmentSlot::Dress,
            Self::Shoes => GarmentSlot::Shoes,
        }
    }

    /// Body region painted for this category.
    pub fn target_region(&self) -> TargetRegion {
        match self {
            Self::Outer | Self::Top => TargetRegion::Upper,
            Self::Bottom => TargetRegion::Lower,
            Self::Dress => TargetRegion::All,
            Self::Shoes => TargetRegion::Upper,
            Self::Other(key) => match key.as_str() {
                "upper" => TargetRegion::Upper,
                "pants" | "skirt" | "lower" => TargetRegion::Lower,
                "onepiece" => TargetRegion::All,
                _ => TargetRegion::Upper,
            },
        }
    }

    /// Korean display label, the reverse direction of [`CATEGORY_ALIASES`].
    pub fn display_label(&self) -> &str {
        match self {
            Self::Outer => "아우터",
            Self::Top => "상의",
            Self::Bottom => "하의",
            Self::Dress => "원피스",
            Self::Shoes => "신발",
            Self::Other(key) => key.as_str(),
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw category string. Total: every input maps to exactly one
/// category, unmapped input falls through lower-cased.
pub fn normalize_category(raw: &str) -> GarmentCategory {
    let raw = raw.trim();
    if let Some(key) = alias_key(raw) {
        return GarmentCategory::from_key(key);
    }
    let lowered = raw.to_lowercase();
    match alias_key(&lowered) {
        Some(key) => GarmentCategory::from_key(key),
        None => GarmentCategory::from_key(&lowered),
    }
}

fn alias_key(raw: &str) -> Option<&'static str> {
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, key)| *key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GarmentSlot {
    Top,
    Bottom,
    Dress,
    Shoes,
}

impl GarmentSlot {
    pub const ALL: [Self; 4] = [Self::Top, Self::Bottom, Self::Shoes, Self::Dress];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Dress => "dress",
            Self::Shoes => "shoes",
        }
    }

    /// Slots that must be emptied before this one is occupied.
    pub const fn conflicts(self) -> &'static [GarmentSlot] {
        match self {
            Self::Dress => &[Self::Top, Self::Bottom],
            Self::Top | Self::Bottom => &[Self::Dress],
            Self::Shoes => &[],
        }
    }

    /// A dress stands in for these slots when they are removed explicitly.
    pub const fn aliased_by_dress(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl fmt::Display for GarmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region tag assigned to each avatar sub-mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyRegion {
    Upper,
    Lower,
    #[default]
    Unclassified,
}

impl BodyRegion {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Region a garment covers when painted onto the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRegion {
    Upper,
    Lower,
    All,
}

impl TargetRegion {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::All => "all",
        }
    }

    pub fn covers(self, region: BodyRegion) -> bool {
        match self {
            Self::All => true,
            Self::Upper => region == BodyRegion::Upper,
            Self::Lower => region == BodyRegion::Lower,
        }
    }
}
