use super::blend::BlendMode;

/// Which part of the frame a filter decorates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCategory {
    /// Mask and eye overlays placed on face landmarks
    Face,
    /// Texture blended into the segmented hair region
    Hair,
    /// Face overlays followed by hair blending
    Combo,
}

impl FilterCategory {
    /// Search order used when resolving asset directories
    pub const ALL: [FilterCategory; 3] = [
        FilterCategory::Face,
        FilterCategory::Hair,
        FilterCategory::Combo,
    ];

    /// Directory name in the asset store
    pub fn dir_name(&self) -> &'static str {
        match self {
            FilterCategory::Face => "face",
            FilterCategory::Hair => "hair",
            FilterCategory::Combo => "combo",
        }
    }
}

/// A selectable filter. Defined once in [`FILTERS`], never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub category: FilterCategory,
    pub blend_mode: BlendMode,
    /// Suggested strength in [0, 1]
    pub default_intensity: f32,
}

const fn filter(
    id: &'static str,
    name: &'static str,
    category: FilterCategory,
    blend_mode: BlendMode,
    default_intensity: f32,
) -> FilterDefinition {
    FilterDefinition {
        id,
        name,
        category,
        blend_mode,
        default_intensity,
    }
}

use BlendMode::*;
use FilterCategory::*;

pub static FILTERS: &[FilterDefinition] = &[
    filter("batman", "Batman", Face, Normal, 1.0),
    filter("tiger", "Tiger", Face, Normal, 0.9),
    filter("cat_eyes", "Cat Eyes", Face, Normal, 0.8),
    filter("masquerade", "Masquerade", Face, Normal, 1.0),
    filter("neon_pink", "Neon Pink", Hair, Screen, 0.8),
    filter("platinum", "Platinum", Hair, SoftLight, 0.7),
    filter("midnight_blue", "Midnight Blue", Hair, Multiply, 0.8),
    filter("fire_red", "Fire Red", Hair, Overlay, 0.85),
    filter("rainbow", "Rainbow", Hair, HardLight, 0.75),
    filter("sunset_glow", "Sunset Glow", Hair, ColorDodge, 0.6),
    filter("charcoal", "Charcoal", Hair, ColorBurn, 0.7),
    filter("glitch", "Glitch", Hair, Difference, 0.5),
    filter("silver_fox", "Silver Fox", Hair, Exclusion, 0.6),
    filter("punk_rocker", "Punk Rocker", Combo, Overlay, 0.9),
    filter("cyber_queen", "Cyber Queen", Combo, Screen, 0.85),
];

pub fn all() -> &'static [FilterDefinition] {
    FILTERS
}

pub fn find(id: &str) -> Option<&'static FilterDefinition> {
    FILTERS.iter().find(|filter| filter.id == id)
}

pub fn by_category(category: FilterCategory) -> impl Iterator<Item = &'static FilterDefinition> {
    FILTERS.iter().filter(move |filter| filter.category == category)
}
