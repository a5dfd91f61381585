use super::Line;

pub const INTRO: &[Line] = &[
    Line::new("The final chamber.", 2500),
    Line::new("Everything you learned has led you here.", 3500),
    Line::new("One last enigma stands between you and the end.", 3500),
];

pub const ENIGMA_SYMBOLS: &[&str] = &["Wand", "Stone", "Cloak", "Lightning", "Serpent", "Stag"];
pub const ENIGMA_SLOTS: usize = 4;
pub const ENIGMA_HINT: &str = "Drag the right symbols into the slots, in the right order...";
pub const ENIGMA_WRONG: &str = "Wrong.";
pub const ENIGMA_SECS: u64 = 60;

pub const MUSIC_STOPS_AT_SECS: u64 = 10;
/// Remaining seconds and the wand light intensity set at that moment.
pub const WAND_LIGHT: &[(u64, f32)] = &[(8, 2.0), (5, 5.0)];
pub const AVADA_AT_SECS: u64 = 3;
pub const KEDAVRA_AT_SECS: u64 = 1;

pub const AVADA: &str = "Avada...";
pub const KEDAVRA: &str = "...Kedavra!";

pub const REVELATION: &[Line] = &[
    Line::silence(2000),
    Line::new("But death did not have the last word.", 3500),
    Line::silence(2000),
    Line::new("There was no puzzle to solve. There never was.", 3500),
    Line::new("You could not save yourself. Nobody can.", 3500),
    Line::silence(1500),
    Line::new("Someone gave his life so that you could live.", 4000),
];

pub const MAIN_MESSAGE: Line = Line::new(
    "For by grace you have been saved through faith, and this is not your own doing; it is the gift of God.",
    8000,
)
.with_verse("Ephesians 2:8");

pub const FINAL_MESSAGE: &[Line] = &[
    Line::new("Your journey is complete, Aurora.", 4000),
    Line::new("Love is stronger than death.", 4000),
    Line::new("Thank you for playing, Aurora.", 4000),
];
