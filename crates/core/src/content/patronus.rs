use super::Line;

pub const INTRO: &[Line] = &[
    Line::new("The Dark Forest. The dementors are coming.", 3000),
    Line::new(
        "To cast a Patronus you need your happiest memories... and a light that is not yours.",
        4500,
    ),
];

pub const MEMORIES: &[&str] = &[
    "Your first day of school",
    "A hug from your mother",
    "Laughing with your best friend",
    "Christmas morning with family",
    "The day you were baptized",
    "A walk on the beach at sunset",
];

pub const REQUIRED_MEMORIES: usize = 3;
pub const LIGHT_PER_MEMORY: u32 = 33;

pub const PRAYERS: &[&str] = &[
    "The Lord is my shepherd, I shall not want",
    "Saint Michael the Archangel, defend us in battle",
    "Hail Mary, full of grace",
];

pub const DEMENTOR_COUNT: usize = 5;
/// Length of one confrontation attempt.
pub const CONFRONTATION_SECS: u64 = 20;

pub const CONFRONT: Line = Line::new(
    "Expecto Patronum! Click the dementors to drive them away!",
    2500,
);
pub const VICTORY: Line = Line::new(
    "The light has driven back the darkness. The light shines in the darkness, and the darkness has not overcome it.",
    5000,
)
.with_verse("John 1:5");
pub const RETRY: Line = Line::new(
    "The darkness is still strong... gather your light and try again.",
    3000,
);
