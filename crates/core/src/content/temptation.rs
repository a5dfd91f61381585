use super::Line;

pub struct Temptation {
    /// The first, deceiving voice.
    pub voice: &'static str,
    /// The second voice.
    pub truth: &'static str,
    /// Whether following the first voice moves the player forward.
    pub leads_to_progress: bool,
}

pub const MAZE_SIZE: usize = 5;
/// Successful moves between two temptations. The first one speaks as soon
/// as the maze opens.
pub const MOVES_PER_TEMPTATION: u32 = 3;

/// Silence before the first voice speaks.
pub const WHISPER_LEAD_MS: u64 = 800;
pub const VOICE_HOLD_MS: u64 = 2500;
/// Gap between the two voices.
pub const VOICE_GAP_MS: u64 = 800;
pub const TRUTH_HOLD_MS: u64 = 2500;

pub const INTRO: &[Line] = &[
    Line::new("The Forbidden Forest. Paths twist and voices whisper.", 3500),
    Line::new("Use the arrows to find your way. Listen carefully.", 3000),
];

pub const TEMPTATIONS: &[Temptation] = &[
    Temptation {
        voice: "You don't need anyone. Go on alone, you are strong enough.",
        truth: "Two are better than one; if one falls, the other lifts him up.",
        leads_to_progress: false,
    },
    Temptation {
        voice: "Take the shortcut through the thorns. It will hurt, but it is faster.",
        truth: "Wait. The path is not always the one that looks shortest.",
        leads_to_progress: true,
    },
    Temptation {
        voice: "Nobody will notice if you leave the lantern behind.",
        truth: "Your word is a lamp to my feet and a light to my path.",
        leads_to_progress: false,
    },
    Temptation {
        voice: "Give up. This forest has no end.",
        truth: "Keep walking. Even in the valley of shadows you are not alone.",
        leads_to_progress: false,
    },
];

pub const FOLLOW_FIRST: &str = "Follow the first voice";
pub const FOLLOW_SECOND: &str = "Follow the second voice";
pub const PATH_OPENS: &str = "The path opens before you.";
pub const WENT_ASTRAY: &str = "You have been here before... the voice led you astray.";

pub const NO_EXIT: &[Line] = &[
    Line::new("There is no exit.", 3000),
    Line::new("You tried every path. You listened to every voice.", 3500),
    Line::new("Maybe the way out is not something you can find alone.", 4000),
];

pub const HELP_LABEL: &str = "Ask for help";

pub const RESCUE: &[Line] = &[
    Line::new("A light breaks through the trees.", 3000),
    Line::new(
        "Asking for help is not weakness. Call to me and I will answer you.",
        4500,
    )
    .with_verse("Jeremiah 33:3"),
];
