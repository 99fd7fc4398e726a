use std::fmt;
use std::time::Duration;

use failure::{Error, Fail};
use log::{debug, info, warn};
use rand::prelude::*;
use rand_pcg::Pcg32;
use serde::Serialize;

use zelda1::{CaveType, DataTable, Item, LevelNum, RoomNum};

use crate::collector::RoomItemCollector;
use crate::flags::Flags;
use crate::solvers::{create_solver, SolverKind};

/// A shuffleable slot: either a dungeon room or a cave position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Location {
    Dungeon {
        level_num: LevelNum,
        room_num: RoomNum,
    },
    Cave {
        cave_type: CaveType,
        position: u8,
    },
}

impl Location {
    pub fn dungeon(level_num: LevelNum, room_num: RoomNum) -> Location {
        Location::Dungeon {
            level_num,
            room_num,
        }
    }

    pub fn cave(cave_type: CaveType, position: u8) -> Location {
        Location::Cave {
            cave_type,
            position,
        }
    }

    fn is_shop(&self) -> bool {
        match self {
            Location::Cave { cave_type, .. } => cave_type.is_shop(),
            Location::Dungeon { .. } => false,
        }
    }

    fn is_in_level(&self, level: LevelNum) -> bool {
        match self {
            Location::Dungeon { level_num, .. } => *level_num == level,
            Location::Cave { .. } => false,
        }
    }

    fn is_at_cave(&self, cave: CaveType) -> bool {
        match self {
            Location::Cave { cave_type, .. } => *cave_type == cave,
            Location::Dungeon { .. } => false,
        }
    }
}

/// A provably infeasible flag combination.  All detected conflicts are
/// reported together; retrying with another seed cannot help, so the attempt
/// loop is never entered.
#[derive(Debug)]
pub struct ConstraintConflict {
    pub conflicts: Vec<String>,
}

impl fmt::Display for ConstraintConflict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "The requested flag combination cannot be satisfied:")?;
        for conflict in &self.conflicts {
            writeln!(f, "  - {}", conflict)?;
        }
        Ok(())
    }
}

impl Fail for ConstraintConflict {}

/// Cave positions that can join the major shuffle, each gated by a flag.
fn overworld_cave_locations(flags: &Flags) -> Vec<(CaveType, u8, bool)> {
    vec![
        (CaveType::WoodSwordCave, 2, flags.shuffle_wood_sword_cave_item),
        (
            CaveType::WhiteSwordCave,
            2,
            flags.shuffle_white_sword_cave_item,
        ),
        (
            CaveType::MagicalSwordCave,
            2,
            flags.shuffle_magical_sword_cave_item,
        ),
        (CaveType::LetterCave, 2, flags.shuffle_letter_cave_item),
        (CaveType::ArmosItem, 2, flags.shuffle_armos_item),
        (CaveType::CoastItem, 2, flags.shuffle_coast_item),
        (CaveType::Shop1, 2, flags.shuffle_shop_arrows),
        (CaveType::Shop2, 2, flags.shuffle_shop_candle),
        (CaveType::Shop3, 1, flags.shuffle_shop_bait),
        (CaveType::Shop4, 1, flags.shuffle_shop_ring),
        (CaveType::PotionShop, 1, flags.shuffle_potion_shop_items),
        (CaveType::PotionShop, 3, flags.shuffle_potion_shop_items),
    ]
}

/// Inter-dungeon + overworld-cave shuffle of major items.  Minor items,
/// maps, compasses and triforces stay behind for the per-level pass.
pub struct MajorItemRandomizer<'a> {
    data_table: &'a mut DataTable,
    flags: &'a Flags,
}

impl<'a> MajorItemRandomizer<'a> {
    pub fn new(data_table: &'a mut DataTable, flags: &'a Flags) -> MajorItemRandomizer<'a> {
        MajorItemRandomizer { data_table, flags }
    }

    /// Pool membership: majors always; heart containers only when dungeon
    /// hearts are shuffled.
    fn keeps_pair(flags: &Flags, item: Item) -> bool {
        if item == Item::HeartContainer {
            return flags.shuffle_dungeon_hearts;
        }
        item.is_major_item()
    }

    fn collect_pool(
        data_table: &DataTable,
        flags: &Flags,
    ) -> Result<Vec<(Location, Item)>, Error> {
        let mut pool = Vec::new();

        let collector = RoomItemCollector::new(data_table);
        for (level_num, pairs) in collector.collect_all()? {
            for (room_num, item) in pairs {
                if Self::keeps_pair(flags, item) {
                    pool.push((Location::dungeon(level_num, room_num), item));
                }
            }
        }

        for (cave_type, position, enabled) in overworld_cave_locations(flags) {
            if enabled {
                let item = data_table.cave_item(cave_type, position);
                pool.push((Location::cave(cave_type, position), item));
            }
        }

        Ok(pool)
    }

    /// Flag conflicts that no reseeding can fix, checked against the vanilla
    /// pool before the attempt loop.  Every conflict is reported, not just
    /// the first.
    pub fn validate_flags(data_table: &DataTable, flags: &Flags) -> Result<(), Error> {
        let mut conflicts = Vec::new();

        if flags.force_heart_container_to_armos && !flags.shuffle_armos_item {
            conflicts.push(
                "force_heart_container_to_armos requires shuffle_armos_item".to_string(),
            );
        }
        if flags.force_heart_container_to_coast && !flags.shuffle_coast_item {
            conflicts.push(
                "force_heart_container_to_coast requires shuffle_coast_item".to_string(),
            );
        }

        if flags.force_two_heart_containers_to_level_nine {
            let pool = Self::collect_pool(data_table, flags)?;
            let heart_containers = pool
                .iter()
                .filter(|(_, item)| *item == Item::HeartContainer)
                .count();
            if heart_containers < 2 {
                conflicts.push(format!(
                    "force_two_heart_containers_to_level_nine needs at least two heart \
                     containers in the pool, but only {} {} available (enable \
                     shuffle_dungeon_hearts or an overworld heart-container source)",
                    heart_containers,
                    if heart_containers == 1 { "is" } else { "are" },
                ));
            }
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(ConstraintConflict { conflicts }.into())
        }
    }

    /// Runs the shuffle.  Ok(false) means the solver found no assignment for
    /// this seed and the caller should reseed and retry.
    pub fn randomize(&mut self, rng: &mut Pcg32, kind: SolverKind) -> Result<bool, Error> {
        let pool = Self::collect_pool(self.data_table, self.flags)?;
        if pool.is_empty() {
            warn!("no major items found to shuffle");
            return Ok(true);
        }
        info!("found {} major item locations", pool.len());

        let locations: Vec<Location> = pool.iter().map(|(location, _)| *location).collect();
        let items: Vec<Item> = pool.iter().map(|(_, item)| *item).collect();

        let mut solver = create_solver::<Location, Item>(kind);
        solver.add_permutation_problem(locations.clone(), items.clone(), None);
        self.add_constraints(&mut *solver, &locations, &items)?;

        let force_two_hearts = self.flags.force_two_heart_containers_to_level_nine;
        for round in 0..20 {
            let solution = match solver.solve(Some(rng.gen()), Duration::from_secs(10)) {
                Some(solution) => solution,
                None => {
                    warn!("no valid major item shuffle exists for this seed");
                    return Ok(false);
                }
            };

            if force_two_hearts {
                let hearts_in_nine = solution
                    .iter()
                    .filter(|(location, item)| {
                        location.is_in_level(9) && *item == Item::HeartContainer
                    })
                    .count();
                if hearts_in_nine < 2 {
                    debug!(
                        "round {}: only {} heart containers landed in level 9; re-solving",
                        round, hearts_in_nine
                    );
                    solver.add_forbidden_solution(&solution);
                    continue;
                }
            }

            self.write_solution(&solution, rng);
            info!("major item randomization completed");
            return Ok(true);
        }

        warn!("could not place two heart containers in level 9 for this seed");
        Ok(false)
    }

    fn add_constraints(
        &self,
        solver: &mut dyn crate::solvers::Solver<Location, Item>,
        locations: &[Location],
        items: &[Item],
    ) -> Result<(), Error> {
        let shop_locations: Vec<Location> = locations
            .iter()
            .filter(|location| location.is_shop())
            .cloned()
            .collect();
        let dungeon_locations: Vec<Location> = locations
            .iter()
            .filter(|location| matches!(location, Location::Dungeon { .. }))
            .cloned()
            .collect();

        // Shops never sell heart containers.
        if items.contains(&Item::HeartContainer) && !shop_locations.is_empty() {
            solver.forbid_all(&shop_locations, &[Item::HeartContainer])?;
            debug!(
                "constraint: heart containers forbidden from {} shop locations",
                shop_locations.len()
            );
        }

        // With progressive items only the base tiers exist; buying one in a
        // shop could strand the family, so keep them out.
        if self.flags.progressive_items && !shop_locations.is_empty() {
            for item in items {
                if item.is_base_progressive_item() {
                    solver.forbid_all(&shop_locations, &[*item])?;
                }
            }
            debug!("constraint: progressive base items forbidden from shops");
        }

        // The coast slot is guarded by the ladder itself.
        let coast_locations: Vec<Location> = locations
            .iter()
            .filter(|location| location.is_at_cave(CaveType::CoastItem))
            .cloned()
            .collect();
        if items.contains(&Item::Ladder) && !coast_locations.is_empty() {
            solver.forbid_all(&coast_locations, &[Item::Ladder])?;
            debug!("constraint: ladder forbidden from the coast");
        }

        // The dungeon item field is five bits wide; the red potion's code
        // does not fit.
        if items.contains(&Item::RedPotion) && !dungeon_locations.is_empty() {
            solver.forbid_all(&dungeon_locations, &[Item::RedPotion])?;
            debug!("constraint: red potion forbidden from dungeons");
        }

        let level_nine: Vec<Location> = locations
            .iter()
            .filter(|location| location.is_in_level(9))
            .cloned()
            .collect();
        let forced_families: [(bool, &[Item], &str); 4] = [
            (
                self.flags.force_arrow_to_level_nine,
                &[Item::WoodArrows, Item::SilverArrows],
                "arrow",
            ),
            (
                self.flags.force_ring_to_level_nine,
                &[Item::BlueRing, Item::RedRing],
                "ring",
            ),
            (self.flags.force_wand_to_level_nine, &[Item::Wand], "wand"),
            (
                self.flags.force_heart_container_to_level_nine
                    || self.flags.force_two_heart_containers_to_level_nine,
                &[Item::HeartContainer],
                "heart container",
            ),
        ];
        if !level_nine.is_empty() {
            for (enabled, family, name) in forced_families.iter() {
                if !enabled {
                    continue;
                }
                let present: Vec<Item> = family
                    .iter()
                    .filter(|&item| items.contains(item))
                    .cloned()
                    .collect();
                if !present.is_empty() {
                    solver.at_least_one_of(&level_nine, &present)?;
                    debug!("constraint: at least one {} in level 9", name);
                }
            }
        }

        let forced_caves: [(bool, CaveType, &str); 2] = [
            (
                self.flags.force_heart_container_to_armos && self.flags.shuffle_armos_item,
                CaveType::ArmosItem,
                "the Armos",
            ),
            (
                self.flags.force_heart_container_to_coast && self.flags.shuffle_coast_item,
                CaveType::CoastItem,
                "the coast",
            ),
        ];
        for (enabled, cave_type, name) in forced_caves.iter() {
            if !enabled {
                continue;
            }
            let positions: Vec<Location> = locations
                .iter()
                .filter(|location| location.is_at_cave(*cave_type))
                .cloned()
                .collect();
            if !positions.is_empty() && items.contains(&Item::HeartContainer) {
                solver.at_least_one_of(&positions, &[Item::HeartContainer])?;
                debug!("constraint: a heart container must be at {}", name);
            }
        }

        Ok(())
    }

    fn write_solution(&mut self, solution: &[(Location, Item)], rng: &mut Pcg32) {
        for (location, item) in solution {
            match location {
                Location::Dungeon {
                    level_num,
                    room_num,
                } => {
                    self.data_table.set_item(*level_num, *room_num, *item);
                }
                Location::Cave {
                    cave_type,
                    position,
                } => {
                    self.data_table.set_cave_item(*cave_type, *position, *item);
                    debug!(
                        "set cave {:?} position {} to {:?}",
                        cave_type, position, item
                    );
                    if cave_type.is_shop() {
                        let price = shop_price(*item, rng);
                        self.data_table.set_cave_price(*cave_type, *position, price);
                        debug!("priced {:?} at {} rupees", item, price);
                    }
                }
            }
        }
    }
}

/// Shop price tiers: swords, rings and the magical key command the most; the
/// rest is staged down from there.  Drawn uniformly from the caller's RNG.
pub fn shop_price(item: Item, rng: &mut Pcg32) -> u8 {
    match item {
        Item::WoodSword
        | Item::WhiteSword
        | Item::MagicalSword
        | Item::BlueRing
        | Item::RedRing
        | Item::MagicalKey => rng.gen_range(205, 256) as u8,
        Item::Bow | Item::Wand | Item::Ladder => rng.gen_range(80, 121) as u8,
        Item::Recorder | Item::WoodArrows | Item::SilverArrows | Item::HeartContainer => {
            rng.gen_range(60, 101) as u8
        }
        _ => rng.gen_range(40, 81) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg32;
    use zelda1::data_table::testdata::TestRomBuilder;
    use zelda1::rommap;

    fn pcg(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn shop_prices_fall_in_their_tiers() {
        let mut rng = pcg(7);
        for _ in 0..100 {
            let sword = shop_price(Item::WoodSword, &mut rng);
            assert!(sword >= 205);
            let bow = shop_price(Item::Bow, &mut rng);
            assert!((80..=120).contains(&bow));
            let recorder = shop_price(Item::Recorder, &mut rng);
            assert!((60..=100).contains(&recorder));
            let bait = shop_price(Item::Bait, &mut rng);
            assert!((40..=80).contains(&bait));
        }
    }

    fn sparse_world() -> (TestRomBuilder, Flags) {
        let mut builder = TestRomBuilder::new();
        // Level 1: entrance at 0x73 with two connected item rooms.
        builder
            .set_level_start_room(1, 0x73)
            .set_room(1, 0x73, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            .set_room(1, 0x63, [0x04, 0x04, 0x00, 0x00, 0x0a, 0x00])
            .set_room(1, 0x53, [0x24, 0x04, 0x00, 0x00, 0x0d, 0x00]);
        // Shop 1 sells arrows in its middle slot.
        builder.set_cave_data(0x0d, [0x3f, 0x08, 0x3f, 0x00, 0x64, 0x00]);
        let flags = Flags::default();
        (builder, flags)
    }

    #[test]
    fn shuffle_moves_items_between_collected_rooms() {
        let (builder, flags) = sparse_world();
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let mut rng = pcg(11);
        let mut randomizer = MajorItemRandomizer::new(&mut data_table, &flags);
        assert!(randomizer
            .randomize(&mut rng, SolverKind::RejectionSampling)
            .unwrap());

        let mut items = vec![data_table.item(1, 0x63), data_table.item(1, 0x53)];
        items.sort();
        assert_eq!(items, vec![Item::Bow, Item::Ladder]);
    }

    #[test]
    fn shop_items_join_the_pool_and_get_prices() {
        let (builder, mut flags) = sparse_world();
        flags.shuffle_shop_arrows = true;
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let mut rng = pcg(3);
        let mut randomizer = MajorItemRandomizer::new(&mut data_table, &flags);
        assert!(randomizer
            .randomize(&mut rng, SolverKind::RejectionSampling)
            .unwrap());

        let mut items = vec![
            data_table.item(1, 0x63),
            data_table.item(1, 0x53),
            data_table.cave_item(CaveType::Shop1, 2),
        ];
        items.sort();
        assert_eq!(items, vec![Item::WoodArrows, Item::Bow, Item::Ladder]);
        // Whatever landed in the shop was re-priced into its tier.
        let price = data_table.cave_price(CaveType::Shop1, 2);
        assert!((40..=255).contains(&price));
    }

    #[test]
    fn heart_containers_never_land_in_shops() {
        let (mut builder, mut flags) = sparse_world();
        builder.set_room(1, 0x53, [0x24, 0x04, 0x00, 0x00, 0x1a, 0x00]);
        flags.shuffle_shop_arrows = true;
        flags.shuffle_dungeon_hearts = true;

        for seed in 0..25 {
            let mut data_table = DataTable::new(&builder.build()).unwrap();
            let mut rng = pcg(seed);
            let mut randomizer = MajorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(&mut rng, SolverKind::RejectionSampling)
                .unwrap());
            assert_ne!(
                data_table.cave_item(CaveType::Shop1, 2),
                Item::HeartContainer,
                "seed {}",
                seed
            );
        }
    }

    #[test]
    fn ladder_never_lands_on_the_coast() {
        let (mut builder, mut flags) = sparse_world();
        builder.set_byte(rommap::COAST_ITEM_ADDRESS, Item::HeartContainer as u8);
        flags.shuffle_coast_item = true;

        for seed in 0..25 {
            let mut data_table = DataTable::new(&builder.build()).unwrap();
            let mut rng = pcg(seed);
            let mut randomizer = MajorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(&mut rng, SolverKind::RejectionSampling)
                .unwrap());
            assert_ne!(
                data_table.cave_item(CaveType::CoastItem, 2),
                Item::Ladder,
                "seed {}",
                seed
            );
        }
    }

    #[test]
    fn conflicting_heart_flags_are_reported_together() {
        let (builder, mut flags) = sparse_world();
        flags.force_heart_container_to_coast = true;
        flags.force_heart_container_to_armos = true;
        flags.force_two_heart_containers_to_level_nine = true;
        let data_table = DataTable::new(&builder.build()).unwrap();

        let err = MajorItemRandomizer::validate_flags(&data_table, &flags).unwrap_err();
        let conflict = err.downcast_ref::<ConstraintConflict>().unwrap();
        assert_eq!(conflict.conflicts.len(), 3);
    }

    #[test]
    fn progressive_base_items_stay_out_of_shops() {
        let (mut builder, mut flags) = sparse_world();
        // The wood sword cave joins the pool alongside the arrow shop.
        builder.set_cave_data(0x00, [0x3f, 0x01, 0x3f, 0x00, 0x00, 0x00]);
        flags.shuffle_wood_sword_cave_item = true;
        flags.shuffle_shop_arrows = true;
        flags.progressive_items = true;

        for seed in 0..25 {
            let mut data_table = DataTable::new(&builder.build()).unwrap();
            let mut rng = pcg(seed);
            let mut randomizer = MajorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(&mut rng, SolverKind::RejectionSampling)
                .unwrap());
            assert_ne!(
                data_table.cave_item(CaveType::Shop1, 2),
                Item::WoodSword,
                "seed {}",
                seed
            );
        }
    }
}
