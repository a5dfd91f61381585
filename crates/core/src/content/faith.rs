use super::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moral {
    Ideal,
    Neutral,
    Fail,
}

impl Moral {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ideal => "ideal",
            Self::Neutral => "neutral",
            Self::Fail => "fail",
        }
    }

    /// Particle color used to mark the choice.
    pub fn color(&self) -> u32 {
        match self {
            Self::Ideal => 0xffd700,
            Self::Neutral => 0x88aaff,
            Self::Fail => 0x444444,
        }
    }
}

pub struct MoralOption {
    pub text: &'static str,
    pub moral: Moral,
    pub feedback: &'static str,
}

pub struct Dilemma {
    pub id: &'static str,
    pub question: &'static str,
    pub options: &'static [MoralOption],
    pub reference: &'static str,
}

pub const INTRO: &[Line] = &[
    Line::new("In the dungeons of Slytherin, ambition is tested.", 3500),
    Line::new("Every choice reveals what you trust in.", 3000),
];

pub const DILEMMAS: &[Dilemma] = &[
    Dilemma {
        id: "exam",
        question: "You find the answers to tomorrow's exam. Nobody would ever know.",
        options: &[
            MoralOption {
                text: "Return the answers to the professor",
                moral: Moral::Ideal,
                feedback: "Integrity is doing what is right when nobody is watching.",
            },
            MoralOption {
                text: "Leave them where they are",
                moral: Moral::Neutral,
                feedback: "You did not cheat, but you left the temptation for someone else.",
            },
            MoralOption {
                text: "Use them, just this once",
                moral: Moral::Fail,
                feedback: "A small compromise opens the door to larger ones.",
            },
        ],
        reference: "Whoever can be trusted with very little can also be trusted with much - Luke 16:10",
    },
    Dilemma {
        id: "power",
        question: "A powerful wizard offers you a place at his side, if you abandon your friends.",
        options: &[
            MoralOption {
                text: "Refuse and stay with your friends",
                moral: Moral::Ideal,
                feedback: "What good is it to gain the whole world and lose your soul?",
            },
            MoralOption {
                text: "Ask for time to think",
                moral: Moral::Neutral,
                feedback: "Hesitation gives temptation room to grow.",
            },
            MoralOption {
                text: "Accept the offer",
                moral: Moral::Fail,
                feedback: "Power bought with betrayal is a prison.",
            },
        ],
        reference: "What good is it for someone to gain the whole world, yet forfeit their soul? - Mark 8:36",
    },
    Dilemma {
        id: "credit",
        question: "Your classmate did the hard work, but the professor praises you.",
        options: &[
            MoralOption {
                text: "Tell the professor who really did it",
                moral: Moral::Ideal,
                feedback: "Humility honors others before yourself.",
            },
            MoralOption {
                text: "Say nothing and thank your classmate later",
                moral: Moral::Neutral,
                feedback: "Private gratitude is good, but the truth was left unspoken.",
            },
            MoralOption {
                text: "Accept the praise",
                moral: Moral::Fail,
                feedback: "Glory taken from another never satisfies.",
            },
        ],
        reference: "In humility value others above yourselves - Philippians 2:3",
    },
];

pub const REFLECTION_FAITHFUL: Line = Line::new(
    "You chose to trust rather than grasp. That is the beginning of faith.",
    5000,
);
pub const REFLECTION_LEARNING: Line = Line::new(
    "Every fall is a chance to rise again. Faith is learned step by step.",
    5000,
);

/// Ideal choices needed for the faithful reflection.
pub const FAITHFUL_THRESHOLD: usize = 2;
