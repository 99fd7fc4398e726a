use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use log::warn;
use rand::prelude::*;
use rand_pcg::Pcg32;

use zelda1::Patch;

/// Hint slot numbers with fixed meanings.
const MAGICAL_SWORD_HINT_SLOT: u8 = 2;
const LOST_HILLS_HINT_SLOT: u8 = 4;
const DEAD_WOODS_HINT_SLOT: u8 = 8;
const WHITE_SWORD_HINT_SLOT: u8 = 11;

const NUM_HINT_SLOTS: u8 = 38;

/// The NES maps this bank at 0x8000; pointers carry the high bit.
const HINT_POINTER_TABLE_START: usize = 0x4010;
const HINT_DATA_START: usize = 0x405c;
/// End of the hint data region with a safety margin; a hint that would
/// cross it is replaced with a blank.  The hard limit is the bank boundary.
const MAX_HINT_DATA_END: usize = 0x4550;
const HINT_DATA_HARD_END: usize = 0x4582;

const MAX_LINE_LEN: usize = 22;

fn char_to_byte(c: char) -> Option<u8> {
    match c {
        '0'..='9' => Some(c as u8 - b'0'),
        'A'..='Z' => Some(c as u8 - b'A' + 0x0a),
        ' ' => Some(0x24),
        '~' => Some(0x25),
        ',' => Some(0x28),
        '!' => Some(0x29),
        '\'' => Some(0x2a),
        '&' => Some(0x2b),
        '.' => Some(0x2c),
        '"' => Some(0x2d),
        '?' => Some(0x2e),
        '-' => Some(0x2f),
        _ => None,
    }
}

/// Always-included community hints, placed before the shuffled pool.
const PRIORITY_HINTS: &[&[&str]] = &[
    &["HEJ"],
    &["!LFG"],
    &["THIS AIN'T", "YOUR OLD MAN'S", "RANDOMIZER!"],
    &["MEOW MEOW MEOW MEOW"],
    &["STAND CLEAR OF", "THE CLOSING DOORS", "PLEASE"],
    &["GO LOCAL", "SPORTS TEAM!"],
    &["WELCOME TO THE", "COFFEE ZONE"],
    &["HAPPY BIRTHDAY", "TO YOU!"],
    &["READ THE", "WIKI BRO!"],
    &["ARE YOU IN THE", "CATBIRD SEAT?"],
    &["THIS COULD", "BE YOU!"],
    &["YOU GOTTA", "HAVE HEART"],
];

const COMMUNITY_HINTS: &[&[&str]] = &[
    &["DO YOU KNOW WHY", "WE STOPPED THE CAR?"],
    &["I LIKE BIG BOTS", "AND I CANNOT LIE"],
    &["WHY AM I LOCKED", "IN A BASEMENT"],
    &["THAT'S JUST LIKE", "YOUR OPINION MAN"],
    &["THE DUDE ABIDES"],
    &["10TH ENEMY HAS", "THE BOMB"],
    &["STAY AWHILE", "AND LISTEN"],
    &["YOU TEACH ME", "A SPELL"],
    &["YOU KNOW NOTHING"],
    &["THAT'S WHAT", "SHE SAID"],
    &["JUMP IN LAVA FOR", "200 RUPEES"],
    &["BIG BUCKS", "NO WHAMMYS"],
    &["BAGU OWES ME", "20 RUPEES"],
    &["YOU ARE THE", "WEAKEST LINK"],
    &["LINK I AM", "YOUR FATHER"],
    &["THERE'S NO WIFI", "HERE"],
    &["A WILD LINK", "APPEARS"],
    &["WHAT'S THE WIFI", "PASSWORD"],
    &["I'D LIKE TO BUY", "A VOWEL"],
    &["I ONLY KNOW", "ONE SPELL"],
    &["I WENT TO COLLEGE", "FOR THIS"],
    &["WHO PICKED THESE", "FLAGS"],
    &["I FOUND THIS", "IN THE GARBAGE"],
    &["HAVE YOU HEARD", "MY MIXTAPE"],
    &["DOES THIS ROBE", "MAKE ME LOOK FAT?"],
    &["YOU'RE A WIZARD,", "LINK"],
    &["TAKE ANY ROBE", "YOU WANT"],
    &["DON'T MOVE", "I DROPPED A", "CONTACT LENS"],
    &["PLEASE SUPPORT ZSR"],
    &["THIS WON'T HURT", "A BIT"],
    &["FREE YOUR MIND"],
    &["DA NA NA NA", "NAAAAAAAAA"],
    &["NEEDS MORE COWBELL"],
    &["WHICH TIMELINE", "IS THIS?"],
    &["POYO!"],
    &["SPLOOSH KABOOM!"],
    &["SOMEBODY SET UP", "US THE BOMB"],
    &["BAGU SAID WHAT?", "THAT JERK!"],
    &["TRY NOT TO DROWN"],
    &["WHY CAN'T YOU SWIM?"],
    &["WHAT IS YOUR QUEST?"],
    &["TICKETS PLEASE"],
    &["WRAAAAAAFT"],
    &["DO YOU KNOW", "THE MUFFIN MAN"],
    &["CAN WE FIX IT?"],
    &["LINK.EXE HAS", "STOPPED WORKING"],
    &["NO RUNNING BY", "THE POOL"],
    &["HAVE YOU SEEN ERROR", "AROUND?"],
    &["ALIENS ARE REAL"],
    &["BAM BAM BAM"],
    &["HEY! LISTEN!"],
    &["I AM BATMAN"],
    &["I AM GROOT"],
    &["PRAISE THE SUN"],
    &["AM I BEING", "DETAINED?"],
    &["ERROR IS THE", "EVIL TWIN"],
    &["TINGLE TINGLE", "KOOLOO LIMPAH!"],
    &["IS THIS A", "PEDESTAL SEED?"],
    &["EVERYONE GETS", "A BRIDGE"],
    &["STICK THEM WITH", "THE POINTY END"],
    &["HAVE A POGO STICK"],
    &["DO THE SAFETY DANCE"],
    &["EASY MODE ACTIVATED"],
    &["NEVER GONNA GIVE", "YOU UP"],
    &["ARE YOU SANTA CLAUS?"],
    &["SHORYUKEN!"],
    &["TIGER UPPERCUT!"],
    &["NEVER GONNA LET", "YOU DOWN"],
    &["I KNOW NOTHING"],
    &["I LIKE WASTING", "YOUR TIME"],
    &["NOTHING KNOW I"],
    &["TRY TO GET A GUIDE"],
    &["GIT GUD"],
    &["WHAT? YEAH! OKAY!"],
    &["NO HINT FOR YOU"],
    &["SILENCE IS GOLDEN"],
    &["BLESS YOU"],
    &["HOLA!"],
    &["I AM NOT A VIRE", "IN DISGUISE"],
    &["WOAH! DUDE!"],
    &["PAY ME AND", "I'LL TALK"],
    &["THE HINT IS IN", "ANOTHER CASTLE"],
    &["ALL SIGNS POINT", "TO NO"],
    &["QUIT WASTING", "MY TIME"],
    &["DO YOU HAVE", "A DIPLOMA?"],
    &["SHOW ME YOUR", "CREDITS!"],
    &["YOU MUST CONSTRUCT", "ADDITIONAL PYLONS"],
    &["THIS IS FINE"],
    &["GOTTA GO FAST"],
    &["A WINNER IS YOU"],
    &["WATER YOU DOING?"],
    &["HE'S DEAD JIM"],
    &["GET EQUIPPED", "WITH THIS"],
    &["TIS A GOOD DAY"],
    &["CONGRATS!"],
    &["THE POWER IS YOURS"],
    &["GANON IS JEALOUS"],
    &["THE SECRET TO LIFE"],
    &["YAY!"],
    &["DOES NOT SPARK JOY"],
    &["NEEDS FOOD BADLY"],
    &["BADGER BADGER", "BADGER"],
    &["HAPPY DAY!!"],
    &["IT'S TIME!"],
    &["ALL YOU NEED IS"],
    &["THE SECRET WORD IS"],
    &["HAVE ONE ON", "THE HOUSE"],
];

/// Owns the 38 fixed hint slots and renders them into the ROM text bank:
/// encoded lines in a linear data region, two-byte pointers in the slot
/// table.
pub struct HintWriter {
    hints: BTreeMap<u8, Vec<String>>,
}

impl HintWriter {
    pub fn new() -> HintWriter {
        let mut hints = BTreeMap::new();
        // Slot 1 is blank by default.
        hints.insert(1, Vec::new());
        HintWriter { hints }
    }

    pub fn set_hint(&mut self, slot: u8, lines: Vec<String>) {
        debug_assert!((1..=NUM_HINT_SLOTS).contains(&slot));
        self.hints.insert(slot, lines);
    }

    pub fn set_lost_hills_hint(&mut self, directions: &[u8]) {
        let names: Vec<&str> = directions
            .iter()
            .map(|dir| match dir {
                0x08 => "UP",
                0x04 => "DOWN",
                _ => "RIGHT",
            })
            .collect();
        self.set_hint(
            LOST_HILLS_HINT_SLOT,
            vec![
                format!("GO {}, {},", names[0], names[1]),
                format!("{}, {}", names[2], names[3]),
                "THE MOUNTAIN AHEAD".to_string(),
            ],
        );
    }

    pub fn set_dead_woods_hint(&mut self, directions: &[u8]) {
        let names: Vec<&str> = directions
            .iter()
            .map(|dir| match dir {
                0x08 => "NORTH",
                0x02 => "WEST",
                _ => "SOUTH",
            })
            .collect();
        self.set_hint(
            DEAD_WOODS_HINT_SLOT,
            vec![
                format!("GO {}, {},", names[0], names[1]),
                format!("{}, {} TO", names[2], names[3]),
                "THE FOREST OF MAZE".to_string(),
            ],
        );
    }

    pub fn set_white_sword_heart_hint(&mut self, hearts: u32) {
        self.set_hint(
            WHITE_SWORD_HINT_SLOT,
            vec![
                "MASTER USING IT WITH".to_string(),
                format!("{} HEARTS AND YOU", hearts),
                "CAN HAVE THIS".to_string(),
            ],
        );
    }

    pub fn set_magical_sword_heart_hint(&mut self, hearts: u32) {
        self.set_hint(
            MAGICAL_SWORD_HINT_SLOT,
            vec![
                format!("YOU NEED {} HEARTS", hearts),
                "TO WIELD THE BLADE".to_string(),
            ],
        );
    }

    /// Fills every unset slot from the priority list followed by the
    /// shuffled community pool.
    pub fn fill_with_community_hints(&mut self, rng: &mut Pcg32) {
        let mut pool: Vec<&[&str]> = COMMUNITY_HINTS.to_vec();
        pool.shuffle(rng);

        let mut source = PRIORITY_HINTS.iter().chain(pool.iter());
        for slot in 2..=NUM_HINT_SLOTS {
            if self.hints.contains_key(&slot) {
                continue;
            }
            if let Some(hint) = source.next() {
                self.hints
                    .insert(slot, hint.iter().map(|line| line.to_string()).collect());
            }
        }
    }

    /// Blank slot 1 and labeled placeholders everywhere else.
    pub fn fill_with_blank_hints(&mut self) {
        for slot in 2..=NUM_HINT_SLOTS {
            self.hints
                .entry(slot)
                .or_insert_with(|| vec![format!("TEST HINT {:02}", slot)]);
        }
    }

    pub fn build_patch(&self) -> Patch {
        let mut patch = Patch::new();
        let mut data_offset = HINT_DATA_START;

        for slot in 1..=NUM_HINT_SLOTS {
            let lines = match self.hints.get(&slot) {
                Some(lines) => lines,
                // Unset slots are skipped; their pointer stays unwritten.
                None => continue,
            };

            let mut encoded = encode_text(lines);
            if data_offset + encoded.len() >= MAX_HINT_DATA_END {
                warn!(
                    "hint {} would cross the end of the text region ({:#06x}); writing a blank",
                    slot, MAX_HINT_DATA_END
                );
                encoded = encode_text::<&str>(&[]);
            }

            // The pointer is a little-endian bank offset with the high bit
            // set, since the bank maps at 0x8000.
            let bank_offset = data_offset - HINT_POINTER_TABLE_START;
            let mut pointer = [0u8; 2];
            LittleEndian::write_u16(&mut pointer, bank_offset as u16 | 0x8000);
            patch.add(
                HINT_POINTER_TABLE_START + (slot as usize - 1) * 2,
                pointer.to_vec(),
            );
            patch.add(data_offset, encoded.clone());
            data_offset += encoded.len();
        }
        patch
    }
}

/// Encodes 1-3 lines of text.  Line breaks set bit 0x80 (second line) or
/// 0x40 (third line) on the last character of the preceding line; the final
/// character carries both.  A blank hint is a space plus a terminating
/// space.
fn encode_text<S: AsRef<str>>(lines: &[S]) -> Vec<u8> {
    let has_content = lines.iter().any(|line| !line.as_ref().trim().is_empty());
    if !has_content {
        return vec![0x24, 0xe4];
    }

    let mut result = Vec::new();
    let line_count = lines.len();
    for (line_num, line) in lines.iter().enumerate() {
        let mut line = line.as_ref().trim_end().to_string();
        if line.is_empty() {
            continue;
        }
        if line.len() > MAX_LINE_LEN {
            line.truncate(MAX_LINE_LEN);
        }

        // Center the text, biasing left, with at least one pad cell.  Pads
        // use 0x25 so they render as background.
        let available = MAX_LINE_LEN - line.len();
        let left_padding = if available >= 2 {
            available / 2 + 1 + (available % 2)
        } else {
            1
        };
        for _ in 0..left_padding {
            result.push(0x25);
        }

        for c in line.chars() {
            let upper = c.to_ascii_uppercase();
            result.push(char_to_byte(upper).unwrap_or(0x25));
        }

        if line_num + 1 < line_count {
            if line_num == 0 {
                if let Some(last) = result.last_mut() {
                    *last |= 0x80;
                }
            } else if line_num == 1 {
                if let Some(last) = result.last_mut() {
                    *last |= 0x40;
                }
            }
        }
    }

    if let Some(last) = result.last_mut() {
        *last |= 0xc0;
    }
    result
}
