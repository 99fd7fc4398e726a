use std::time::Duration;

use failure::{format_err, Error};
use log::debug;
use rand::prelude::*;
use rand_pcg::Pcg32;

use zelda1::rommap::RomDataType;
use zelda1::{CaveType, DataTable, Patch, ScreenNum, NUM_SCREENS};

use crate::flags::Flags;
use crate::solvers::{DomainSolver, Solver};

/// The wood sword cave's vanilla screen; if it has moved, the base ROM was
/// itself cave-shuffled.
const VANILLA_WOOD_SWORD_SCREEN: ScreenNum = 0x77;

const LEVEL_CAVES: [CaveType; 9] = [
    CaveType::Level1,
    CaveType::Level2,
    CaveType::Level3,
    CaveType::Level4,
    CaveType::Level5,
    CaveType::Level6,
    CaveType::Level7,
    CaveType::Level8,
    CaveType::Level9,
];

/// First-quest screens that host level entrances in the vanilla layout.
const VANILLA_LEVEL_SCREENS: [ScreenNum; 9] =
    [0x37, 0x3c, 0x74, 0x45, 0x0b, 0x22, 0x42, 0x6d, 0x05];

/// The vanilla nine plus five second-quest level screens.
const EXPANDED_LEVEL_SCREENS: [ScreenNum; 14] = [
    0x37, 0x3c, 0x74, 0x45, 0x0b, 0x22, 0x42, 0x6d, 0x05, 0x34, 0x1b, 0x30, 0x19, 0x00,
];

/// Shuffles cave destinations, recomputes recorder warps, randomizes heart
/// requirements, and draws the Lost Hills / Dead Woods direction sequences.
pub struct OverworldRandomizer<'a> {
    data_table: &'a mut DataTable,
    flags: &'a Flags,
    pub cave_destinations_randomized_in_base_seed: bool,
    lost_hills_enabled: bool,
    dead_woods_enabled: bool,
}

impl<'a> OverworldRandomizer<'a> {
    pub fn new(data_table: &'a mut DataTable, flags: &'a Flags) -> OverworldRandomizer<'a> {
        OverworldRandomizer {
            data_table,
            flags,
            cave_destinations_randomized_in_base_seed: false,
            lost_hills_enabled: false,
            dead_woods_enabled: false,
        }
    }

    pub fn detect_pre_shuffled_caves(&mut self) -> bool {
        let destination = self.data_table.screen_destination(VANILLA_WOOD_SWORD_SCREEN);
        if destination != CaveType::WoodSwordCave {
            self.cave_destinations_randomized_in_base_seed = true;
            debug!("base ROM has shuffled caves; cave shuffle auto-enabled");
            return true;
        }
        false
    }

    pub fn randomize_heart_requirements(&mut self, rng: &mut Pcg32) -> Result<(), Error> {
        if self.flags.randomize_heart_container_requirements {
            let hearts = [4u32, 5, 6][rng.gen_range(0, 3)];
            self.data_table
                .set_rom_data_value(RomDataType::WhiteSwordHeartRequirement, hearts)?;
        }
        if self.flags.shuffle_magical_sword_cave_item
            || self.flags.randomize_heart_container_requirements
        {
            let hearts = [10u32, 11, 12][rng.gen_range(0, 3)];
            self.data_table
                .set_rom_data_value(RomDataType::MagicalSwordHeartRequirement, hearts)?;
        }
        Ok(())
    }

    /// Entry point.  Returns the chosen Lost Hills and Dead Woods direction
    /// sequences for the hint writer.
    pub fn randomize(
        &mut self,
        rng: &mut Pcg32,
    ) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>), Error> {
        if self.flags.randomize_overworld_cave_destinations
            || self.cave_destinations_randomized_in_base_seed
        {
            self.shuffle_cave_destinations(rng)?;
            self.update_recorder_warps()?;
        }

        let lost_hills = if self.flags.randomize_lost_hills {
            Some(self.randomize_lost_hills(rng)?)
        } else {
            None
        };
        let dead_woods = if self.flags.randomize_dead_woods {
            Some(self.randomize_dead_woods(rng)?)
        } else {
            None
        };

        Ok((lost_hills, dead_woods))
    }

    fn shuffle_cave_destinations(&mut self, rng: &mut Pcg32) -> Result<(), Error> {
        let any_road_screens = self.data_table.rom_data_bytes(RomDataType::AnyRoadScreens)?;
        debug!("any-road screens: {:02x?}", any_road_screens);

        let mut screens: Vec<ScreenNum> = Vec::new();
        let mut destinations: Vec<CaveType> = Vec::new();
        for screen_num in 0..NUM_SCREENS as u8 {
            let (_, second_quest_only) = self.data_table.quest_bits(screen_num);
            if second_quest_only {
                continue;
            }
            let destination = self.data_table.screen_destination(screen_num);
            if destination == CaveType::None {
                continue;
            }
            // Walking into a relocated any-road crashes the game.
            if any_road_screens.contains(&screen_num) {
                debug!("excluding any-road screen {:#04x} from shuffle", screen_num);
                continue;
            }
            screens.push(screen_num);
            destinations.push(destination);
        }
        debug!(
            "shuffling {} first-quest screens with destinations",
            screens.len()
        );

        let use_constraints = self.flags.pin_wood_sword_cave
            || self.flags.restrict_levels_to_vanilla_screens
            || self.flags.restrict_levels_to_expanded_screens;

        if use_constraints {
            self.shuffle_with_constraints(rng, &screens, &destinations)
        } else {
            destinations.shuffle(rng);
            for (screen_num, destination) in screens.iter().zip(destinations.iter()) {
                debug!("screen {:#04x} now leads to {:?}", screen_num, destination);
                self.data_table.set_screen_destination(*screen_num, *destination);
            }
            Ok(())
        }
    }

    fn shuffle_with_constraints(
        &mut self,
        rng: &mut Pcg32,
        screens: &[ScreenNum],
        destinations: &[CaveType],
    ) -> Result<(), Error> {
        // The tight restriction flags need the robust backend.
        let mut solver = DomainSolver::new();
        solver.add_permutation_problem(screens.to_vec(), destinations.to_vec(), None);

        if self.flags.pin_wood_sword_cave {
            solver.require(&VANILLA_WOOD_SWORD_SCREEN, &CaveType::WoodSwordCave)?;
            debug!("constraint: wood sword cave pinned to screen 0x77");
        }

        let restricted_pool: Option<&[ScreenNum]> = if self.flags.restrict_levels_to_vanilla_screens
        {
            Some(&VANILLA_LEVEL_SCREENS)
        } else if self.flags.restrict_levels_to_expanded_screens {
            Some(&EXPANDED_LEVEL_SCREENS)
        } else {
            None
        };
        if let Some(pool) = restricted_pool {
            let level_caves: Vec<CaveType> = LEVEL_CAVES
                .iter()
                .filter(|&cave| destinations.contains(cave))
                .cloned()
                .collect();
            let outside_pool: Vec<ScreenNum> = screens
                .iter()
                .filter(|&screen| !pool.contains(screen))
                .cloned()
                .collect();
            solver.forbid_all(&outside_pool, &level_caves)?;
            debug!(
                "constraint: {} level caves forbidden from {} screens",
                level_caves.len(),
                outside_pool.len()
            );
        }

        let solution = solver
            .solve(Some(rng.gen()), Duration::from_secs(10))
            .ok_or_else(|| {
                format_err!("could not find a valid cave shuffle; constraints may be contradictory")
            })?;

        for (screen_num, destination) in solution {
            debug!("screen {:#04x} now leads to {:?}", screen_num, destination);
            self.data_table.set_screen_destination(screen_num, destination);
        }
        Ok(())
    }

    /// The recorder drops Link one screen west of each level entrance, with a
    /// per-screen Y coordinate.  Two screens warp somewhere else entirely.
    fn update_recorder_warps(&mut self) -> Result<(), Error> {
        let mut warp_screens = Vec::new();
        let mut y_coordinates = Vec::new();

        for level_num in 1..=8u8 {
            let cave = LEVEL_CAVES[level_num as usize - 1];
            let mut level_screen = None;
            for screen_num in 0..NUM_SCREENS as u8 {
                if self.data_table.screen_destination(screen_num) == cave {
                    level_screen = Some(screen_num);
                    break;
                }
            }
            let level_screen = level_screen
                .ok_or_else(|| format_err!("no overworld screen leads to level {}", level_num))?;

            let warp_screen = match level_screen {
                0x00 => 0x00,
                0x0e => 0x1d,
                screen => screen - 1,
            };
            let y_coordinate = match level_screen {
                0x3b | 0x0a | 0x41 | 0x05 | 0x08 | 0x09 | 0x2b => 0xad,
                0x6c => 0x5d,
                _ => 0x8d,
            };
            debug!(
                "level {} at screen {:#04x}; recorder warp to {:#04x}",
                level_num, level_screen, warp_screen
            );
            warp_screens.push(warp_screen);
            y_coordinates.push(y_coordinate);
        }

        self.data_table
            .set_rom_data_bytes(RomDataType::RecorderWarpDestinations, warp_screens)?;
        self.data_table
            .set_rom_data_bytes(RomDataType::RecorderWarpYCoordinates, y_coordinates)?;
        Ok(())
    }

    /// Three random steps from {up, down, right}, then up onto the summit.
    fn randomize_lost_hills(&mut self, rng: &mut Pcg32) -> Result<Vec<u8>, Error> {
        const OPTIONS: [u8; 3] = [0x08, 0x04, 0x01];
        let mut directions: Vec<u8> = (0..3).map(|_| OPTIONS[rng.gen_range(0, 3)]).collect();
        directions.push(0x08);
        self.data_table
            .set_rom_data_bytes(RomDataType::LostHillsDirections, directions.clone())?;
        self.lost_hills_enabled = true;
        Ok(directions)
    }

    /// Three random steps from {north, west, south}, then south out of the
    /// woods.
    fn randomize_dead_woods(&mut self, rng: &mut Pcg32) -> Result<Vec<u8>, Error> {
        const OPTIONS: [u8; 3] = [0x08, 0x02, 0x04];
        let mut directions: Vec<u8> = (0..3).map(|_| OPTIONS[rng.gen_range(0, 3)]).collect();
        directions.push(0x04);
        self.data_table
            .set_rom_data_bytes(RomDataType::DeadWoodsDirections, directions.clone())?;
        self.dead_woods_enabled = true;
        Ok(directions)
    }

    /// Fixed overworld map-data edits that accompany the randomized
    /// features, gathered for the final patch.
    pub fn overworld_patches(&self) -> Result<Patch, Error> {
        let mut patch = Patch::new();

        if self.lost_hills_enabled {
            // Annex the two screens east of vanilla level 5.
            patch.add_from_hex_string(0x154d7, "01010101010101")?;
            patch.add_from_hex_string(0x154f1, "09")?;
            patch.add_from_hex_string(0x154f5, "06")?;
            patch.add_from_hex_string(0x155dd, "02")?;
            patch.add_from_hex_string(0x155f5, "51")?;
        }

        if self.dead_woods_enabled {
            // Wall off the three southwest caves and open a westward passage
            // above the woods.
            patch.add_from_hex_string(0x15b08, "29")?;
            patch.add_from_hex_string(0x158f8, "16")?;
        }

        if self.flags.extra_raft_blocks {
            patch.add_from_hex_string(0x154f8, "0C")?;
            patch.add_from_hex_string(0x155f7, "0C 0C")?;
            patch.add_from_hex_string(0x15613, "EB")?;
            patch.add_from_hex_string(0x15615, "AF")?;
            patch.add_from_hex_string(0x15715, "B6")?;
            patch.add_from_hex_string(0x15765, "91 78")?;
            patch.add_from_hex_string(0x1582f, "02 08 0B 0B 0B 0B 0B 0B 0B 0B 01")?;
            patch.add_from_hex_string(0x1592f, "17 17")?;
        }

        if self.flags.extra_power_bracelet_blocks {
            patch.add_from_hex_string(0x1554e, "38")?;
            patch.add_from_hex_string(0x15554, "06E7000000")?;
            patch.add_from_hex_string(0x15649, "00A9")?;
            patch.add_from_hex_string(0x1564e, "B6")?;
            patch.add_from_hex_string(0x1574e, "02")?;
        }

        Ok(patch)
    }
}
