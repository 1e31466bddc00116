// Classic emoticon catalog
// Fixed at process start and never mutated afterwards.

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmoticonCategory {
    Happy,
    Sad,
    Playful,
    Surprise,
    Gesture,
    Special,
    Cool,
    Angry,
    Confused,
    Love,
    Nature,
}

impl EmoticonCategory {
    pub const ALL: [EmoticonCategory; 11] = [
        EmoticonCategory::Happy,
        EmoticonCategory::Sad,
        EmoticonCategory::Playful,
        EmoticonCategory::Surprise,
        EmoticonCategory::Gesture,
        EmoticonCategory::Special,
        EmoticonCategory::Cool,
        EmoticonCategory::Angry,
        EmoticonCategory::Confused,
        EmoticonCategory::Love,
        EmoticonCategory::Nature,
    ];

    pub fn id(self) -> &'static str {
        match self {
            EmoticonCategory::Happy => "happy",
            EmoticonCategory::Sad => "sad",
            EmoticonCategory::Playful => "playful",
            EmoticonCategory::Surprise => "surprise",
            EmoticonCategory::Gesture => "gesture",
            EmoticonCategory::Special => "special",
            EmoticonCategory::Cool => "cool",
            EmoticonCategory::Angry => "angry",
            EmoticonCategory::Confused => "confused",
            EmoticonCategory::Love => "love",
            EmoticonCategory::Nature => "nature",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EmoticonCategory::Happy => "Happy",
            EmoticonCategory::Sad => "Sad",
            EmoticonCategory::Playful => "Playful",
            EmoticonCategory::Surprise => "Surprise",
            EmoticonCategory::Gesture => "Gestures",
            EmoticonCategory::Special => "Special",
            EmoticonCategory::Cool => "Cool",
            EmoticonCategory::Angry => "Angry",
            EmoticonCategory::Confused => "Confused",
            EmoticonCategory::Love => "Love",
            EmoticonCategory::Nature => "Nature",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            EmoticonCategory::Happy => "#FFD700",
            EmoticonCategory::Sad => "#4169E1",
            EmoticonCategory::Playful => "#FF69B4",
            EmoticonCategory::Surprise => "#FF4500",
            EmoticonCategory::Gesture => "#32CD32",
            EmoticonCategory::Special => "#8A2BE2",
            EmoticonCategory::Cool => "#00CED1",
            EmoticonCategory::Angry => "#DC143C",
            EmoticonCategory::Confused => "#DAA520",
            EmoticonCategory::Love => "#FF1493",
            EmoticonCategory::Nature => "#228B22",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoticon {
    pub id: &'static str,
    pub shortcut: &'static str,
    /// Glyph the presentation layer draws for this shortcut.
    pub glyph: &'static str,
    pub description: &'static str,
    pub category: EmoticonCategory,
}

const fn emoticon(
    id: &'static str,
    shortcut: &'static str,
    glyph: &'static str,
    description: &'static str,
    category: EmoticonCategory,
) -> Emoticon {
    Emoticon { id, shortcut, glyph, description, category }
}

use EmoticonCategory::*;

static CLASSIC: [Emoticon; 32] = [
    emoticon("1", ":)", "😊", "Smile", Happy),
    emoticon("2", ":D", "😃", "Big smile", Happy),
    emoticon("3", ":-)", "😊", "Smile with nose", Happy),
    emoticon("4", "=)", "😊", "Smile alt", Happy),
    emoticon("5", "(h)", "❤️", "Heart", Love),
    emoticon("6", ":(", "😢", "Sad", Sad),
    emoticon("7", ":-(", "😢", "Sad with nose", Sad),
    emoticon("8", ":'(", "😭", "Crying", Sad),
    emoticon("9", ":P", "😛", "Tongue out", Playful),
    emoticon("10", ":-P", "😛", "Tongue out with nose", Playful),
    emoticon("11", ":p", "😛", "Tongue out small", Playful),
    emoticon("12", ";)", "😉", "Wink", Playful),
    emoticon("13", ";-)", "😉", "Wink with nose", Playful),
    emoticon("14", ":O", "😮", "Surprised", Surprise),
    emoticon("15", ":-O", "😮", "Surprised with nose", Surprise),
    emoticon("16", ":o", "😮", "Surprised small", Surprise),
    emoticon("17", "(y)", "👍", "Thumbs up", Gesture),
    emoticon("18", "(n)", "👎", "Thumbs down", Gesture),
    emoticon("19", "(6)", "😈", "Devil", Special),
    emoticon("20", "(a)", "😇", "Angel", Special),
    emoticon("21", "8-)", "😎", "Cool with sunglasses", Cool),
    emoticon("22", "8)", "😎", "Cool", Cool),
    emoticon("23", ":@", "😠", "Angry", Angry),
    emoticon("24", ":-@", "😠", "Angry with nose", Angry),
    emoticon("25", ":S", "😕", "Confused", Confused),
    emoticon("26", ":-S", "😕", "Confused with nose", Confused),
    emoticon("27", ":-*", "😘", "Kiss", Love),
    emoticon("28", ":*", "😘", "Kiss", Love),
    emoticon("29", "(l)", "❤️", "Love heart", Love),
    emoticon("30", "(u)", "💔", "Broken heart", Sad),
    emoticon("31", "(k)", "😘", "Kiss lips", Love),
    emoticon("32", "(f)", "🌸", "Flower", Nature),
];

// Longest shortcut first, catalog order among equal lengths
static BY_LENGTH: Lazy<Vec<&'static Emoticon>> = Lazy::new(|| {
    let mut sorted: Vec<&'static Emoticon> = CLASSIC.iter().collect();
    sorted.sort_by(|a, b| b.shortcut.len().cmp(&a.shortcut.len()));
    sorted
});

/// Every catalog entry in catalog order.
pub fn all() -> &'static [Emoticon] {
    &CLASSIC
}

/// Every catalog entry, longest shortcut first.
pub fn longest_first() -> &'static [&'static Emoticon] {
    &BY_LENGTH
}

pub fn find_by_shortcut(shortcut: &str) -> Option<&'static Emoticon> {
    CLASSIC.iter().find(|e| e.shortcut == shortcut)
}

pub fn by_category(category: EmoticonCategory) -> impl Iterator<Item = &'static Emoticon> {
    CLASSIC.iter().filter(move |e| e.category == category)
}

pub fn categories() -> &'static [EmoticonCategory] {
    &EmoticonCategory::ALL
}
