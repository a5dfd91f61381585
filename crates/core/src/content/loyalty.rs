use super::Line;

/// One event of the story; `position` is its place in the correct order.
pub struct StoryEvent {
    pub label: &'static str,
    pub position: usize,
}

/// Shown to the player in this (shuffled) order.
pub const STORY_EVENTS: &[StoryEvent] = &[
    StoryEvent {
        label: "Ruth arrives in Bethlehem with Naomi",
        position: 2,
    },
    StoryEvent {
        label: "Naomi loses her husband and sons in Moab",
        position: 0,
    },
    StoryEvent {
        label: "Boaz redeems Ruth and they marry",
        position: 4,
    },
    StoryEvent {
        label: "Ruth promises: where you go, I will go",
        position: 1,
    },
    StoryEvent {
        label: "Ruth gleans in the field of Boaz",
        position: 3,
    },
];

pub const INTRO: &[Line] = &[
    Line::new("This is the Hufflepuff garden, where loyalty grows.", 3500),
    Line::new(
        "Ruth stayed with Naomi when everyone else would have left. Put her story in order.",
        4500,
    ),
];

pub const INCOMPLETE_ORDER: &str = "Fill every position before confirming.";
pub const WRONG_ORDER: &str = "That is not how it happened... try again.";
pub const ORDER_REVEALED: &str = "The garden shows you the true order of the story.";
pub const TREE_GROWS: Line = Line::new("Loyalty makes the tree of life grow.", 3000);

pub struct LoyaltyChoice {
    pub question: &'static str,
    pub options: &'static [&'static str],
    pub explanation: Line,
}

pub const CHOICE: LoyaltyChoice = LoyaltyChoice {
    question: "A friend is being mocked by everyone in the Great Hall. What do you do?",
    options: &[
        "Stand beside your friend",
        "Stay quiet so nobody notices you",
        "Laugh along with the others",
    ],
    explanation: Line::new(
        "A friend loves at all times, and a brother is born for a time of adversity.",
        4000,
    )
    .with_verse("Proverbs 17:17"),
};
