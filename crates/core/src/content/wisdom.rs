use super::Line;

pub struct Riddle {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub answer: usize,
    pub verse: &'static str,
}

pub const EAGLE_MODEL: &str = "phase2/eagle";

pub const INTRO: &[Line] = &[
    Line::new("Welcome to the Ravenclaw tower, home of the wise.", 3500)
        .with_voice("hat-phase2-intro"),
    Line::new(
        "But true wisdom is not knowing many things... it is knowing the One who knows all things.",
        4500,
    ),
    Line::new("Answer the eagle's riddles and the books will light up.", 3500),
];

pub const RIDDLES: &[Riddle] = &[
    Riddle {
        question: "The more of me you give away, the more of me you have. What am I?",
        options: &["Gold", "Love", "Time", "Silence"],
        answer: 1,
        verse: "Love is patient, love is kind - 1 Corinthians 13:4",
    },
    Riddle {
        question: "I was rejected by the builders, yet I became the cornerstone. What am I?",
        options: &["A wall", "A tower", "The stone", "A door"],
        answer: 2,
        verse: "The stone the builders rejected has become the cornerstone - Psalm 118:22",
    },
    Riddle {
        question: "The beginning of wisdom is not a book nor a teacher. What is it?",
        options: &[
            "The fear of the Lord",
            "A sharp mind",
            "Many years",
            "A famous school",
        ],
        answer: 0,
        verse: "The fear of the Lord is the beginning of wisdom - Proverbs 9:10",
    },
];

pub const WRONG_ANSWER: &str = "Not quite... think again.";
pub const REVEAL_ANSWER: &str = "The eagle whispers the answer:";

pub const VERSE: Line = Line::new(
    "If any of you lacks wisdom, ask God, who gives generously to all - James 1:5",
    5000,
);
