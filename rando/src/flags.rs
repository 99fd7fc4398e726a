use failure::{format_err, Error};

/// Letters of the flagstring alphabet.  Each character encodes its index as
/// three bits, consumed MSB-first in flag declaration order.
const LETTER_MAP: [char; 8] = ['B', 'C', 'D', 'F', 'G', 'H', 'K', 'L'];

macro_rules! define_flags {
    ($($name:ident,)*) => {
        /// The full boolean flag vector.  Field order is the flagstring bit
        /// order; do not reorder fields without breaking existing
        /// flagstrings.
        #[derive(Debug, Default, Clone)]
        pub struct Flags {
            $(pub $name: bool,)*
        }

        impl Flags {
            pub const NAMES: &'static [&'static str] = &[$(stringify!($name)),*];

            pub fn set_by_index(&mut self, index: usize, value: bool) {
                let fields: Vec<&mut bool> = vec![$(&mut self.$name),*];
                if let Some(field) = fields.into_iter().nth(index) {
                    *field = value;
                }
            }
        }
    };
}

define_flags!(
    shuffle_wood_sword_cave_item,
    shuffle_white_sword_cave_item,
    shuffle_magical_sword_cave_item,
    shuffle_letter_cave_item,
    shuffle_armos_item,
    shuffle_coast_item,
    shuffle_shop_arrows,
    shuffle_shop_candle,
    shuffle_shop_ring,
    shuffle_shop_bait,
    shuffle_potion_shop_items,
    shuffle_dungeon_hearts,
    shuffle_minor_dungeon_items,
    avoid_required_hard_combat,
    select_swap,
    randomize_level_text,
    speed_up_text,
    speed_up_dungeon_transitions,
    force_arrow_to_level_nine,
    force_ring_to_level_nine,
    force_wand_to_level_nine,
    force_heart_container_to_level_nine,
    force_two_heart_containers_to_level_nine,
    force_heart_container_to_armos,
    force_heart_container_to_coast,
    force_major_item_to_boss,
    force_major_item_to_triforce_room,
    item_stair_can_have_triforce,
    item_stair_can_have_minor_item,
    extra_raft_blocks,
    extra_power_bracelet_blocks,
    progressive_items,
    add_l4_sword,
    magical_boomerang_does_one_hp_damage,
    magical_boomerang_does_half_hp_damage,
    bait_blocks,
    community_hints,
    randomize_lost_hills,
    randomize_dead_woods,
    randomize_heart_container_requirements,
    randomize_overworld_cave_destinations,
    pin_wood_sword_cave,
    restrict_levels_to_vanilla_screens,
    restrict_levels_to_expanded_screens,
    dont_guarantee_starting_sword_or_wand,
    fast_fill,
    flute_kills_pols_voice,
    like_like_rupees,
    low_hearts_sound,
    four_potion_inventory,
    auto_show_letter,
    increased_standing_items,
    reduced_push_blocks,
    increased_drop_items_in_push_block_rooms,
    increased_drop_items_in_non_push_block_rooms,
);

impl Flags {
    /// Cross-flag sanity checks.  Returns every violation, not just the
    /// first.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.force_heart_container_to_armos && !self.shuffle_armos_item {
            errors.push(
                "force_heart_container_to_armos requires shuffle_armos_item".to_string(),
            );
        }
        if self.force_heart_container_to_coast && !self.shuffle_coast_item {
            errors.push(
                "force_heart_container_to_coast requires shuffle_coast_item".to_string(),
            );
        }
        if self.magical_boomerang_does_one_hp_damage && self.magical_boomerang_does_half_hp_damage {
            errors.push(
                "magical_boomerang_does_one_hp_damage conflicts with \
                 magical_boomerang_does_half_hp_damage"
                    .to_string(),
            );
        }
        if self.increased_standing_items && self.increased_drop_items_in_non_push_block_rooms {
            errors.push(
                "increased_standing_items conflicts with \
                 increased_drop_items_in_non_push_block_rooms"
                    .to_string(),
            );
        }
        if self.reduced_push_blocks && self.increased_drop_items_in_push_block_rooms {
            errors.push(
                "reduced_push_blocks conflicts with increased_drop_items_in_push_block_rooms"
                    .to_string(),
            );
        }
        if self.restrict_levels_to_vanilla_screens && self.restrict_levels_to_expanded_screens {
            errors.push(
                "restrict_levels_to_vanilla_screens conflicts with \
                 restrict_levels_to_expanded_screens"
                    .to_string(),
            );
        }
        errors
    }
}

/// Decodes a flagstring over {B,C,D,F,G,H,K,L} (case-insensitive).  Returns
/// the flags and the normalized (uppercased) string.  Trailing bits beyond
/// the flag count are ignored; missing bits default off.
pub fn parse_flagstring(flagstring: &str) -> Result<(Flags, String), Error> {
    let normalized: String = flagstring.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(format_err!("Flagstring cannot be empty."));
    }

    let mut invalid: Vec<char> = normalized
        .chars()
        .filter(|c| !LETTER_MAP.contains(c))
        .collect();
    invalid.sort();
    invalid.dedup();
    if !invalid.is_empty() {
        let list: Vec<String> = invalid.iter().map(|c| c.to_string()).collect();
        return Err(format_err!(
            "Flagstring contains invalid characters: {}",
            list.join(", ")
        ));
    }

    let mut flags = Flags::default();
    let mut bit_index = 0;
    for c in normalized.chars() {
        let value = LETTER_MAP.iter().position(|&l| l == c).unwrap_or(0) as u8;
        for shift in (0..3).rev() {
            if bit_index < Flags::NAMES.len() {
                flags.set_by_index(bit_index, (value >> shift) & 1 == 1);
            }
            bit_index += 1;
        }
    }

    Ok((flags, normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_flagstring_is_rejected() {
        assert!(parse_flagstring("").is_err());
        assert!(parse_flagstring("   ").is_err());
    }

    #[test]
    fn invalid_characters_are_listed() {
        let err = parse_flagstring("BAXC").unwrap_err().to_string();
        assert!(err.contains("A"));
        assert!(err.contains("X"));
    }

    #[test]
    fn all_b_decodes_to_no_flags() {
        let (flags, normalized) = parse_flagstring("bbbb").unwrap();
        assert_eq!(normalized, "BBBB");
        assert!(!flags.shuffle_wood_sword_cave_item);
        assert!(!flags.shuffle_white_sword_cave_item);
    }

    #[test]
    fn letters_decode_msb_first() {
        // 'L' is index 7 = 0b111: the first three flags come on.
        let (flags, _) = parse_flagstring("L").unwrap();
        assert!(flags.shuffle_wood_sword_cave_item);
        assert!(flags.shuffle_white_sword_cave_item);
        assert!(flags.shuffle_magical_sword_cave_item);
        assert!(!flags.shuffle_letter_cave_item);

        // 'G' is index 4 = 0b100: only the first flag of its triple.
        let (flags, _) = parse_flagstring("BG").unwrap();
        assert!(!flags.shuffle_wood_sword_cave_item);
        assert!(flags.shuffle_letter_cave_item);
        assert!(!flags.shuffle_armos_item);
    }

    #[test]
    fn trailing_bits_are_ignored() {
        let all_on: String = std::iter::repeat('L').take(40).collect();
        let (flags, _) = parse_flagstring(&all_on).unwrap();
        assert!(flags.increased_drop_items_in_non_push_block_rooms);
    }

    #[test]
    fn validate_reports_all_conflicts() {
        let mut flags = Flags::default();
        flags.force_heart_container_to_coast = true;
        flags.force_heart_container_to_armos = true;
        let errors = flags.validate();
        assert_eq!(errors.len(), 2);
    }
}
