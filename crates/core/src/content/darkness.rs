use super::Line;

pub const RELICS: &[&str] = &["The Elder Wand", "The Resurrection Stone", "The Cloak"];

pub const OPENING: Line = Line::new("Three relics. Three virtues. Three choices.", 3000);

pub const GLITCH_AT_SECS: u64 = 5;
pub const BUTTONS_BREAK_AT_SECS: u64 = 10;
pub const MUSIC_STOPS_AT_SECS: u64 = 15;
pub const INTERFACE_BREAKS_AT_SECS: u64 = 20;
pub const FREEZE_AT_SECS: u64 = 25;
pub const SILENCE_AT_SECS: u64 = 30;

pub const GLITCH_TEXT: &str = "Thr##e rel1cs. Th... v1rt...";
pub const BROKEN_TEXT: &str = "?";
pub const UNRESPONSIVE: &str = "...";

pub const STAY_LABEL: &str = "Stay";

pub const REMAIN: Line = Line::new("Remain in me, as I also remain in you.", 4000)
    .with_verse("John 15:4");
