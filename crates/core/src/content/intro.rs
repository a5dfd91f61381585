use super::Line;

pub const LETTER: Line = Line::new(
    "Dear Aurora, you have been accepted for an extraordinary journey...",
    3000,
);

pub const HAT_MODEL: &str = "sorting-hat";

pub const HAT_DIALOGUE: &[Line] = &[
    Line::new("Welcome, Aurora.", 2500).with_voice("hat-intro"),
    Line::new(
        "I am the Sorting Hat, and I will guide you on this extraordinary journey.",
        4000,
    ),
    Line::new(
        "You have been chosen for a special mission... a journey that will test your courage, wisdom, loyalty and faith.",
        5000,
    ),
    Line::new(
        "Along the way you will discover deep truths about the love that conquers death.",
        4500,
    ),
    Line::new("Are you ready?", 2000),
    Line::new("Then let us begin.", 2500),
];
