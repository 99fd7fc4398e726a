use std::path::Path;

use failure::{format_err, Error};
use log::{debug, info};
use num::FromPrimitive;
use rand::prelude::*;
use rand_pcg::Pcg32;

use zelda1::rommap::RomDataType;
use zelda1::{
    CaveType, DataTable, Item, Patch, RoomAction, CAVE_POSITIONS, DUNGEON_LEVEL_NUMBERS, NUM_ROOMS,
};

use crate::bait_blocker::BaitBlocker;
use crate::flags::Flags;
use crate::hints::HintWriter;
use crate::major::MajorItemRandomizer;
use crate::minor::MinorItemRandomizer;
use crate::overworld::OverworldRandomizer;
use crate::solvers::SolverKind;
use crate::validator::Validator;

pub const VERSION_ROM: &str = "V3.0";

const MAX_ATTEMPTS: u32 = 1000;

/// Cosmetic text edits.
const TEXT_SPEED_ADDRESS: usize = 0x482d;
const LEVEL_TEXT_ADDRESS: usize = 0x1a105;
const LEVEL_TEXT_WORDS: [&str; 7] = [
    "PALACE", "HOUSE-", "BLOCK-", "RANDOM", "CAGE -", "HOME -", "CASTLE",
];

/// Owns the candidate-seed loop: shuffle, validate, reseed until a
/// completable seed emerges, then assemble the full patch.
pub struct Randomizer {
    rom: Vec<u8>,
    seed: u64,
    flags: Flags,
    solver_kind: SolverKind,
}

impl Randomizer {
    pub fn new(rom: Vec<u8>, seed: u64, flags: Flags) -> Randomizer {
        Randomizer {
            rom,
            seed,
            flags,
            solver_kind: SolverKind::RejectionSampling,
        }
    }

    pub fn with_solver(mut self, kind: SolverKind) -> Randomizer {
        self.solver_kind = kind;
        self
    }

    pub fn build_patch(&mut self) -> Result<Patch, Error> {
        let mut data_table = DataTable::new(&self.rom)?;
        info!(
            "input ROM type: {}",
            if data_table.is_z1r() {
                "randomized"
            } else {
                "vanilla"
            }
        );

        let pre_shuffled = {
            let mut overworld = OverworldRandomizer::new(&mut data_table, &self.flags);
            overworld.detect_pre_shuffled_caves()
        };

        self.validate_flag_compatibility(&data_table)?;
        MajorItemRandomizer::validate_flags(&data_table, &self.flags)?;

        let mut candidate_rng = Pcg32::seed_from_u64(self.seed);
        let mut first_attempt = true;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if attempt > MAX_ATTEMPTS {
                return Err(format_err!(
                    "Gave up after trying {} item shuffles. Please try again with a \
                     different seed and/or flag settings.",
                    MAX_ATTEMPTS
                ));
            }

            let candidate_seed = if first_attempt {
                first_attempt = false;
                self.seed
            } else {
                candidate_rng.gen_range(0, 10_000_000_000u64)
            };
            info!("attempt {} with seed {}", attempt, candidate_seed);
            let mut rng = Pcg32::seed_from_u64(candidate_seed);

            data_table.reset_to_vanilla();

            let (lost_hills, dead_woods, overworld_patch) = {
                let mut overworld = OverworldRandomizer::new(&mut data_table, &self.flags);
                overworld.cave_destinations_randomized_in_base_seed = pre_shuffled;
                overworld.randomize_heart_requirements(&mut rng)?;
                let (lost_hills, dead_woods) = overworld.randomize(&mut rng)?;
                (lost_hills, dead_woods, overworld.overworld_patches()?)
            };

            let major_ok = MajorItemRandomizer::new(&mut data_table, &self.flags)
                .randomize(&mut rng, self.solver_kind)?;
            if !major_ok {
                info!("major shuffle failed for seed {}; reseeding", candidate_seed);
                continue;
            }

            let minor_ok = MinorItemRandomizer::new(&mut data_table, &self.flags).randomize(
                candidate_seed,
                &mut rng,
                self.solver_kind,
            )?;
            if !minor_ok {
                info!("minor shuffle failed for seed {}; reseeding", candidate_seed);
                continue;
            }

            self.apply_progressive_items(&mut data_table);

            if self.flags.bait_blocks {
                let mut blocker = BaitBlocker::new(&mut data_table);
                for level_num in DUNGEON_LEVEL_NUMBERS {
                    blocker.block_level(level_num)?;
                }
            }

            self.apply_room_action_flags(&mut data_table);

            let white_hearts = data_table.rom_data_value(RomDataType::WhiteSwordHeartRequirement)?;
            let magical_hearts =
                data_table.rom_data_value(RomDataType::MagicalSwordHeartRequirement)?;
            let valid = Validator::new(&mut data_table, &self.flags, white_hearts, magical_hearts)
                .is_seed_valid()?;
            if !valid {
                info!("seed {} failed validation; reseeding", candidate_seed);
                continue;
            }
            info!("seed {} passed validation", candidate_seed);

            return self.assemble_patch(
                &mut data_table,
                &mut rng,
                overworld_patch,
                lost_hills,
                dead_woods,
                white_hearts,
                magical_hearts,
            );
        }
    }

    /// Incompatibilities with the base ROM itself; these fail before the
    /// attempt loop with a message pointing at the base ROM settings.
    fn validate_flag_compatibility(&self, data_table: &DataTable) -> Result<(), Error> {
        if self.flags.progressive_items {
            for cave_type in [CaveType::WoodSwordCave, CaveType::TakeAny].iter() {
                for item in data_table.cave_items(*cave_type) {
                    if item == Item::BlueCandle || item == Item::RedCandle {
                        return Err(format_err!(
                            "Progressive Items is not compatible with the 'Add Extra \
                             Candles' flag. Your base ROM has a candle in the {:?} cave. \
                             Regenerate the base ROM without extra candles or disable \
                             Progressive Items.",
                            cave_type
                        ));
                    }
                }
            }
        }

        if self.flags.extra_power_bracelet_blocks {
            let any_road = data_table.rom_data_bytes(RomDataType::AnyRoadScreens)?;
            if any_road != RomDataType::AnyRoadScreens.spec().default_value {
                return Err(format_err!(
                    "Extra Power Bracelet Blocks is not compatible with the 'Randomize \
                     Any Roads' flag. Your base ROM has relocated any-road screens \
                     ({:02x?}). Regenerate the base ROM without randomized any roads or \
                     disable Extra Power Bracelet Blocks.",
                    any_road
                ));
            }
        }

        Ok(())
    }

    /// With progressive items on, only the base tier of each family exists;
    /// upper tiers are rewritten wherever they sit.
    fn apply_progressive_items(&self, data_table: &mut DataTable) {
        if !self.flags.progressive_items {
            return;
        }

        let convert = |item: Item| -> Option<Item> {
            match item {
                Item::RedCandle => Some(Item::BlueCandle),
                Item::RedRing => Some(Item::BlueRing),
                Item::SilverArrows => Some(Item::WoodArrows),
                Item::WhiteSword | Item::MagicalSword => Some(Item::WoodSword),
                _ => None,
            }
        };

        let mut conversions = 0;
        // The two level blocks share their room grids, so one pass per grid
        // covers every level.
        for &grid_level in &[1u8, 9u8] {
            for room_num in 0..NUM_ROOMS as u8 {
                if let Some(converted) = convert(data_table.item(grid_level, room_num)) {
                    data_table.set_item(grid_level, room_num, converted);
                    conversions += 1;
                }
            }
        }
        for cave_index in 0x10..=0x25u8 {
            let cave_type = match CaveType::from_u8(cave_index) {
                Some(cave_type) => cave_type,
                None => continue,
            };
            for position in CAVE_POSITIONS {
                if let Some(converted) = convert(data_table.cave_item(cave_type, position)) {
                    data_table.set_cave_item(cave_type, position, converted);
                    conversions += 1;
                }
            }
        }
        info!("applied {} progressive item conversions", conversions);
    }

    /// SecretTrigger rewrites keyed by the room-action flags.  The Triforce
    /// of Power room and stairway rooms are left alone.
    fn apply_room_action_flags(&self, data_table: &mut DataTable) {
        let flags = &self.flags;
        if !(flags.increased_standing_items
            || flags.reduced_push_blocks
            || flags.increased_drop_items_in_push_block_rooms
            || flags.increased_drop_items_in_non_push_block_rooms)
        {
            return;
        }

        for &grid_level in &[1u8, 9u8] {
            for room_num in 0..NUM_ROOMS as u8 {
                let room = *data_table.room(grid_level, room_num);
                if room.is_staircase() {
                    continue;
                }
                if grid_level == 9 && room.item() == Item::TriforceOfPower {
                    continue;
                }

                let action = room.room_action();
                let has_item = room.item() != Item::NO_ITEM;

                let new_action = if flags.increased_standing_items
                    && action == RoomAction::KillingEnemiesOpensShuttersAndDropsItem
                {
                    Some(RoomAction::KillingEnemiesOpensShutters)
                } else if flags.reduced_push_blocks
                    && action == RoomAction::PushingBlockOpensShutters
                {
                    Some(RoomAction::KillingEnemiesOpensShutters)
                } else if flags.increased_drop_items_in_push_block_rooms
                    && !flags.reduced_push_blocks
                    && action == RoomAction::PushingBlockOpensShutters
                    && has_item
                {
                    Some(RoomAction::KillingEnemiesOpensShuttersAndDropsItem)
                } else if flags.increased_drop_items_in_non_push_block_rooms
                    && !flags.increased_standing_items
                    && action == RoomAction::KillingEnemiesOpensShutters
                    && has_item
                {
                    Some(RoomAction::KillingEnemiesOpensShuttersAndDropsItem)
                } else {
                    None
                };

                if let Some(new_action) = new_action {
                    data_table
                        .room_mut(grid_level, room_num)
                        .set_room_action(new_action);
                    debug!(
                        "room {:#04x}: action {:?} -> {:?}",
                        room_num, action, new_action
                    );
                }
            }
        }
    }

    fn assemble_patch(
        &self,
        data_table: &mut DataTable,
        rng: &mut Pcg32,
        overworld_patch: Patch,
        lost_hills: Option<Vec<u8>>,
        dead_woods: Option<Vec<u8>>,
        white_hearts: u32,
        magical_hearts: u32,
    ) -> Result<Patch, Error> {
        // The engine's dungeon no-item code must match what the data model
        // writes into empty rooms.
        data_table.set_rom_data_bytes(
            RomDataType::DungeonNoItemCode,
            RomDataType::DungeonNoItemCode.spec().default_value.to_vec(),
        )?;

        let mut patch = data_table.build_patch();
        patch.extend(overworld_patch);

        // The white sword cave reuses the hint slot normally reserved for
        // the letter cave.
        patch.add(0x45b4, vec![0x54]);

        if self.flags.progressive_items {
            // Class-2 item pickups add one grade instead of taking the max.
            // Replaces the CMP/BCC/STA sequence in the vanilla handler.
            patch.add(0x6d06, vec![0x18, 0x79, 0x57, 0x06, 0xea]);
            // Ring and tunic colors refresh on pickup.
            patch.add(0x6bfb, vec![0x20, 0xe4, 0xff]);
            patch.add(
                0x1fff4,
                vec![0x8e, 0x02, 0x06, 0x8e, 0x72, 0x06, 0xee, 0x4f, 0x03, 0x60],
            );
        }

        if self.flags.magical_boomerang_does_one_hp_damage {
            patch.add_from_hex_string(
                0x7478,
                "A9 50 99 AC 00 BD B2 04 25 09 F0 04 20 C5 7D 60 AD 75 06 0A 0A 0A 0A 85 07 A9 10 95 3D EA",
            )?;
        } else if self.flags.magical_boomerang_does_half_hp_damage {
            patch.add_from_hex_string(
                0x7478,
                "A9 50 99 AC 00 BD B2 04 25 09 F0 04 20 C5 7D 60 AD 75 06 0A 0A 0A EA 85 07 A9 10 95 3D EA",
            )?;
        }

        if self.flags.speed_up_dungeon_transitions {
            // NOPs over the dungeon-vs-overworld scroll branches.
            for &addr in &[0x141f3, 0x1426b, 0x1446b, 0x14478, 0x144ad] {
                patch.add(addr, vec![0xea, 0xea]);
            }
        }

        if self.flags.add_l4_sword {
            // BEQ (sword == 3) becomes BCS (sword >= 3).
            patch.add_from_hex_string(0x7540, "B0")?;
        }

        let mut hint_writer = HintWriter::new();
        if let Some(directions) = &lost_hills {
            hint_writer.set_lost_hills_hint(directions);
        }
        if let Some(directions) = &dead_woods {
            hint_writer.set_dead_woods_hint(directions);
        }
        if self.flags.randomize_heart_container_requirements {
            hint_writer.set_white_sword_heart_hint(white_hearts);
        }
        if self.flags.shuffle_magical_sword_cave_item
            || self.flags.randomize_heart_container_requirements
        {
            hint_writer.set_magical_sword_heart_hint(magical_hearts);
        }
        if self.flags.community_hints {
            hint_writer.fill_with_community_hints(rng);
        } else {
            hint_writer.fill_with_blank_hints();
        }
        patch.extend(hint_writer.build_patch());

        self.add_ips_overlays(&mut patch)?;

        // Everything above participates in the fingerprint; the display
        // machinery below does not.
        let hash_code = patch.hash_code();
        info!("hash code: {}", render_code(&hash_code));
        patch.add(0xafd4, hash_code.to_vec());
        patch.add(0xa4cd, vec![0x4c, 0x90, 0xaf]);
        patch.add_from_hex_string(
            0xafa0,
            "A9008D08 01A20AA9 FF95ACCA D0FBA204 A060BDC3 AF9D4404 98691BA8 \
             9570A920 9584A900 95ACCAD0 E9209D97 A9148514 E61360FF",
        )?;
        // "ZORA" in place of "CODE" on the title screen.
        patch.add_from_hex_string(0x1a129, "23181B0A2424242424242424242424")?;
        // Replace "PRESS START BUTTON" with the branded version line.
        let version_text = format!("  ZORA  {}", VERSION_ROM);
        patch.add(0x1ab40, encode_ascii(&version_text));

        if self.flags.select_swap {
            patch.add(0x1ec4c, vec![0x4c, 0xc0, 0xff]);
            patch.add(
                0x1ffd0,
                vec![
                    0xa9, 0x05, 0x20, 0xac, 0xff, 0xad, 0x56, 0x06, 0xc9, 0x0f, 0xd0, 0x02, 0xa9,
                    0x07, 0xa8, 0xa9, 0x01, 0x20, 0xc8, 0xb7, 0x4c, 0x58, 0xec,
                ],
            );
        }

        if self.flags.randomize_level_text || self.flags.speed_up_text {
            if self.flags.speed_up_text {
                patch.add(TEXT_SPEED_ADDRESS, vec![0x01]);
            }
            let word = if self.flags.randomize_level_text {
                LEVEL_TEXT_WORDS[rng.gen_range(0, LEVEL_TEXT_WORDS.len())]
            } else {
                "LEVEL-"
            };
            patch.add(LEVEL_TEXT_ADDRESS, encode_ascii(word));
        }

        Ok(patch)
    }

    fn add_ips_overlays(&self, patch: &mut Patch) -> Result<(), Error> {
        let overlays: [(bool, &str); 6] = [
            (self.flags.fast_fill, "fast_fill.ips"),
            (self.flags.flute_kills_pols_voice, "flute_kills_pols.ips"),
            (self.flags.like_like_rupees, "like_like_rupees.ips"),
            (self.flags.low_hearts_sound, "low_hearts_sound.ips"),
            (self.flags.four_potion_inventory, "four_potion_inventory.ips"),
            (self.flags.auto_show_letter, "auto_show_letter.ips"),
        ];
        for (enabled, name) in overlays.iter() {
            if *enabled {
                patch.add_from_ips(&Path::new("ips").join(name))?;
            }
        }
        Ok(())
    }
}

/// Title-screen text: digits, letters, space and period; anything else
/// renders as a space.
pub fn encode_ascii(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c.to_ascii_uppercase() {
            '0'..='9' => c as u8 - b'0',
            upper @ 'A'..='Z' => upper as u8 - b'A' + 0x0a,
            '.' => 0x2c,
            _ => 0x24,
        })
        .collect()
}

/// Renders a hash code using the same character set for the log line.
fn render_code(code: &[u8; 4]) -> String {
    code.iter()
        .map(|&byte| match byte {
            0x00..=0x09 => (b'0' + byte) as char,
            0x0a..=0x23 => (b'A' + byte - 0x0a) as char,
            _ => '?',
        })
        .collect()
}
