use super::Line;

pub struct HuntObject {
    pub key: &'static str,
    pub model: &'static str,
    pub voice: &'static str,
    pub narration: &'static str,
    pub verse: &'static str,
    pub position: [f32; 3],
}

pub const OBJECTS: &[HuntObject] = &[
    HuntObject {
        key: "sword",
        model: "phase1/sword",
        voice: "hat-phase1-sword",
        narration: "Courage is not in the strength of the blade, but in the heart of the one who holds it.",
        verse: "Be strong and courageous - Joshua 1:9",
        position: [-3.0, 0.5, -2.0],
    },
    HuntObject {
        key: "lion",
        model: "phase1/lion",
        voice: "hat-phase1-lion",
        narration: "The lion roars, but there is a greater Lion who has overcome.",
        verse: "The Lion of the tribe of Judah has triumphed - Revelation 5:5",
        position: [3.0, 0.0, -3.0],
    },
    HuntObject {
        key: "wand",
        model: "phase1/wand",
        voice: "hat-phase1-wand",
        narration: "Instruments are useful, but the one who acts is the greater power.",
        verse: "Not by might nor by power, but by my Spirit - Zechariah 4:6",
        position: [-1.5, 1.5, -4.0],
    },
    HuntObject {
        key: "scroll",
        model: "phase1/scroll",
        voice: "hat-phase1-scroll",
        narration: "The Word guides the brave.",
        verse: "Your word is a lamp for my feet - Psalm 119:105",
        position: [1.5, -0.5, -1.5],
    },
    HuntObject {
        key: "key",
        model: "phase1/key",
        voice: "hat-phase1-key",
        narration: "Courage opens doors that fear keeps locked.",
        verse: "Ask and it will be given to you - Matthew 7:7",
        position: [0.0, 2.0, -3.5],
    },
];

pub const INTRO: &[Line] = &[
    Line::new(
        "Here is the Gryffindor common room, where the brave gather.",
        3500,
    )
    .with_voice("hat-phase1-intro"),
    Line::new(
        "But true courage does not come from the heart alone... it comes from something greater.",
        4000,
    ),
    Line::new(
        "Search for the 5 objects hidden in this room. Each one will reveal a truth about courage.",
        4000,
    ),
];

pub const HINT: &str = "Click the golden objects to discover their secrets...";
pub const TIMEOUT_HINT: &str = "Look for the golden glow... the objects are waiting for you.";
pub const ALREADY_FOUND: &str = "You already found this object!";
pub const REVEAL_REST: &str = "The remaining objects reveal themselves to you.";

pub const SAINT_MESSAGE: Line = Line::new(
    "Saint George faced the dragon not by his own strength, but by faith in God. True courage comes from trusting the Lord.",
    6000,
)
.with_voice("hat-phase1-complete");

pub const PORTAL: Line = Line::new(
    "A portal has opened... the next step of the journey awaits.",
    3000,
);

/// Seconds the hunt waits for a click before offering a hint.
pub const HUNT_HINT_AFTER_SECS: u64 = 60;
