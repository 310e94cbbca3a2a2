use serde::{Deserialize, Serialize};

/// Substrings that only appear in script-bearing (blueprint) packages.
pub const BLUEPRINT_MARKERS: [&str; 6] = [
    "BlueprintGeneratedClass",
    "/Script/Engine.Blueprint",
    "EdGraph",
    "K2Node",
    "UbergraphPages",
    "WidgetBlueprint",
];

/// Keywords that make a blueprint gameplay-critical.
pub const GAMEPLAY_CRITICAL_KEYWORDS: [&str; 4] = ["GameMode", "Character", "Pawn", "PlayerController"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueprintSubtype {
    GameMode,
    Character,
    Pawn,
    Widget,
    Component,
    Actor,
    Unknown,
}

/// Subtype keywords in priority order; the first one present wins.
const SUBTYPE_KEYWORDS: [(&str, BlueprintSubtype); 6] = [
    ("GameMode", BlueprintSubtype::GameMode),
    ("Character", BlueprintSubtype::Character),
    ("Pawn", BlueprintSubtype::Pawn),
    ("Widget", BlueprintSubtype::Widget),
    ("Component", BlueprintSubtype::Component),
    ("Actor", BlueprintSubtype::Actor),
];

impl BlueprintSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlueprintSubtype::GameMode => "game_mode",
            BlueprintSubtype::Character => "character",
            BlueprintSubtype::Pawn => "pawn",
            BlueprintSubtype::Widget => "widget",
            BlueprintSubtype::Component => "component",
            BlueprintSubtype::Actor => "actor",
            BlueprintSubtype::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BlueprintSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What blueprint detection found in a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintInfo {
    pub subtype: BlueprintSubtype,
    pub gameplay_critical: bool,
}

/// Look for blueprint markers in the name table and the raw content.
pub fn detect<'a>(names: impl IntoIterator<Item = &'a str> + Clone, content: &[u8]) -> Option<BlueprintInfo> {
    let mentions = |keyword: &str| {
        names.clone().into_iter().any(|name| name.contains(keyword)) || contains_bytes(content, keyword.as_bytes())
    };

    if !BLUEPRINT_MARKERS.iter().any(|&marker| mentions(marker)) {
        return None;
    }

    let subtype = SUBTYPE_KEYWORDS
        .iter()
        .find(|&&(keyword, _)| mentions(keyword))
        .map_or(BlueprintSubtype::Unknown, |(_, subtype)| *subtype);
    let gameplay_critical = GAMEPLAY_CRITICAL_KEYWORDS.iter().any(|&keyword| mentions(keyword));

    Some(BlueprintInfo {
        subtype,
        gameplay_critical,
    })
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}
