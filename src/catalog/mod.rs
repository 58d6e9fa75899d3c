//! Studio form option catalog.
//!
//! One server-side source of truth for the design-studio form: room types,
//! themes, and color preferences. Pure data, no store access.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoomOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColorOption {
    pub value: &'static str,
    pub label: &'static str,
    pub hex: &'static str,
}

pub const ROOM_TYPES: &[RoomOption] = &[
    RoomOption { value: "bedroom", label: "Bedroom" },
    RoomOption { value: "kitchen", label: "Kitchen" },
    RoomOption { value: "office", label: "Office" },
    RoomOption { value: "living_room", label: "Living Room" },
    RoomOption { value: "bathroom", label: "Bathroom" },
    RoomOption { value: "dining_room", label: "Dining Room" },
    RoomOption { value: "study", label: "Study" },
    RoomOption { value: "outdoor", label: "Outdoor Space" },
];

pub const ROOM_THEMES: &[RoomOption] = &[
    RoomOption { value: "modern", label: "Modern" },
    RoomOption { value: "rustic", label: "Rustic" },
    RoomOption { value: "minimalist", label: "Minimalist" },
    RoomOption { value: "industrial", label: "Industrial" },
    RoomOption { value: "scandinavian", label: "Scandinavian" },
    RoomOption { value: "bohemian", label: "Bohemian" },
    RoomOption { value: "traditional", label: "Traditional" },
    RoomOption { value: "contemporary", label: "Contemporary" },
    RoomOption { value: "coastal", label: "Coastal" },
    RoomOption { value: "eclectic", label: "Eclectic" },
];

pub const COLOR_PREFERENCES: &[ColorOption] = &[
    ColorOption { value: "yellow", label: "Sunny Yellow", hex: "#FFBE0B" },
    ColorOption { value: "orange", label: "Vibrant Orange", hex: "#FB5607" },
    ColorOption { value: "pink", label: "Hot Pink", hex: "#FF006E" },
    ColorOption { value: "purple", label: "Royal Purple", hex: "#8338EC" },
    ColorOption { value: "blue", label: "Ocean Blue", hex: "#3A86FF" },
    ColorOption { value: "neutral", label: "Neutral Tones", hex: "#EEEEEE" },
    ColorOption { value: "green", label: "Natural Green", hex: "#2EC4B6" },
    ColorOption { value: "red", label: "Warm Red", hex: "#E71D36" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_values_are_unique() {
        for options in [ROOM_TYPES, ROOM_THEMES] {
            let mut values: Vec<_> = options.iter().map(|o| o.value).collect();
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), options.len());
        }
    }

    #[test]
    fn colors_carry_hex_swatches() {
        assert!(COLOR_PREFERENCES
            .iter()
            .all(|c| c.hex.starts_with('#') && c.hex.len() == 7));
    }
}
