use std::time::Duration;

use failure::{format_err, Error};
use log::{debug, error, info};
use rand::prelude::*;
use rand_pcg::Pcg32;

use zelda1::{
    valid_item_positions, DataTable, Item, LevelNum, RoomNum, RoomType, DUNGEON_LEVEL_NUMBERS,
};

use crate::collector::{RoomItemCollector, RoomItemPair};
use crate::flags::Flags;
use crate::solvers::{create_solver, Solver, SolverKind};

/// The vanilla home of the Triforce of Power in level 9.
const TRIFORCE_OF_POWER_ROOM: RoomNum = 0x42;

/// Deterministic per-level solver seed, so changing one level's flags does
/// not scramble the others.
fn level_seed(seed: u64, level_num: LevelNum) -> u64 {
    let salted = (seed + level_num as u64 * 101) % 2_147_483_647;
    if salted == 0 {
        1
    } else {
        salted
    }
}

/// Per-dungeon shuffle of the items the major pass left behind, plus
/// randomization of each room's on-screen item position.
pub struct MinorItemRandomizer<'a> {
    data_table: &'a mut DataTable,
    flags: &'a Flags,
}

impl<'a> MinorItemRandomizer<'a> {
    pub fn new(data_table: &'a mut DataTable, flags: &'a Flags) -> MinorItemRandomizer<'a> {
        MinorItemRandomizer { data_table, flags }
    }

    /// Ok(false) means a level's constraints had no solution for this seed;
    /// the driver retries with a fresh outer seed.
    pub fn randomize(&mut self, seed: u64, rng: &mut Pcg32, kind: SolverKind) -> Result<bool, Error> {
        let pair_lists = RoomItemCollector::new(self.data_table).collect_all()?;

        for level_num in DUNGEON_LEVEL_NUMBERS {
            let pairs = &pair_lists[&level_num];
            self.log_level_inventory(level_num, pairs);

            for (room_num, _) in pairs {
                let room_type = self.data_table.room_type(level_num, *room_num)?;
                let positions = valid_item_positions(room_type);
                if !positions.is_empty() {
                    let position = positions[rng.gen_range(0, positions.len())];
                    self.data_table.set_item_position(level_num, *room_num, position);
                }
            }

            if !self.shuffle_items_within_level(level_num, pairs, seed, kind)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Maps and compasses never move; bombs, keys and five-rupee drops only
    /// join the pool when minor shuffling is on.
    fn joins_pool(&self, item: Item) -> bool {
        if item == Item::Map || item == Item::Compass {
            return false;
        }
        if item.is_minor_dungeon_item() {
            return self.flags.shuffle_minor_dungeon_items;
        }
        true
    }

    fn shuffle_items_within_level(
        &mut self,
        level_num: LevelNum,
        all_pairs: &[RoomItemPair],
        seed: u64,
        kind: SolverKind,
    ) -> Result<bool, Error> {
        let pairs: Vec<RoomItemPair> = all_pairs
            .iter()
            .filter(|(_, item)| self.joins_pool(*item))
            .cloned()
            .collect();
        if pairs.len() < 2 {
            return Ok(true);
        }

        let room_nums: Vec<RoomNum> = pairs.iter().map(|(room_num, _)| *room_num).collect();
        let items: Vec<Item> = pairs.iter().map(|(_, item)| *item).collect();

        let solver_seed = level_seed(seed, level_num);
        let mut solver = create_solver::<RoomNum, Item>(kind);
        solver.add_permutation_problem(room_nums.clone(), items.clone(), Some(solver_seed));

        // The Triforce of Power never leaves its room in level 9.
        if level_num == 9 && items.contains(&Item::TriforceOfPower) {
            let pinned = pairs
                .iter()
                .find(|(room_num, item)| {
                    *room_num == TRIFORCE_OF_POWER_ROOM && *item == Item::TriforceOfPower
                })
                .or_else(|| {
                    pairs
                        .iter()
                        .find(|(_, item)| *item == Item::TriforceOfPower)
                })
                .map(|(room_num, _)| *room_num);
            if let Some(room_num) = pinned {
                solver.require(&room_num, &Item::TriforceOfPower)?;
                debug!(
                    "level 9: Triforce of Power stays in room {:#04x}",
                    room_num
                );
            }
        }

        // An item staircase exists to hand over an item.
        self.forbid_item_in_staircases(&mut *solver, level_num, &room_nums, &items, Item::NO_ITEM)?;

        if !self.flags.item_stair_can_have_triforce && level_num != 9 {
            self.forbid_item_in_staircases(&mut *solver, level_num, &room_nums, &items, Item::Triforce)?;
        }

        if !self.flags.item_stair_can_have_minor_item {
            for item in &items {
                if item.is_minor_dungeon_item() {
                    self.forbid_item_in_staircases(&mut *solver, level_num, &room_nums, &items, *item)?;
                }
            }
        }

        if self.flags.force_major_item_to_boss {
            let boss_rooms = self.rooms_matching(level_num, &room_nums, |data_table, room_num| {
                data_table
                    .room_enemy(level_num, room_num)
                    .map(|enemy| {
                        enemy.is_boss()
                            || data_table
                                .mixed_enemy_group(enemy)
                                .iter()
                                .any(|member| member.is_boss())
                    })
                    .unwrap_or(false)
            });
            self.require_major_item_in(
                &mut *solver,
                level_num,
                &boss_rooms,
                &items,
                "force_major_item_to_boss",
            )?;
        }

        if self.flags.force_major_item_to_triforce_room {
            let triforce_rooms = self.rooms_matching(level_num, &room_nums, |data_table, room_num| {
                data_table
                    .room_type(level_num, room_num)
                    .map(|room_type| room_type == RoomType::TriforceRoom)
                    .unwrap_or(false)
            });
            self.require_major_item_in(
                &mut *solver,
                level_num,
                &triforce_rooms,
                &items,
                "force_major_item_to_triforce_room",
            )?;
        }

        let solution = match solver.solve(Some(solver_seed), Duration::from_secs(1)) {
            Some(solution) => solution,
            None => {
                error!(
                    "level {}: no valid item shuffle exists with current constraints",
                    level_num
                );
                self.log_solver_failure(level_num, &pairs, solver_seed);
                return Ok(false);
            }
        };

        for (room_num, item) in &solution {
            self.data_table.set_item(level_num, *room_num, *item);
            if *item == Item::Triforce {
                self.data_table.update_triforce_location(level_num, *room_num);
            }
        }
        debug!("level {}: found a valid item shuffle", level_num);
        Ok(true)
    }

    fn rooms_matching(
        &self,
        _level_num: LevelNum,
        room_nums: &[RoomNum],
        predicate: impl Fn(&DataTable, RoomNum) -> bool,
    ) -> Vec<RoomNum> {
        room_nums
            .iter()
            .filter(|&&room_num| predicate(self.data_table, room_num))
            .cloned()
            .collect()
    }

    fn forbid_item_in_staircases(
        &self,
        solver: &mut dyn Solver<RoomNum, Item>,
        level_num: LevelNum,
        room_nums: &[RoomNum],
        items: &[Item],
        item: Item,
    ) -> Result<(), Error> {
        if !items.contains(&item) {
            return Ok(());
        }
        for &room_num in room_nums {
            if self.data_table.is_item_staircase(level_num, room_num) {
                solver.forbid(&room_num, &item)?;
            }
        }
        Ok(())
    }

    fn require_major_item_in(
        &self,
        solver: &mut dyn Solver<RoomNum, Item>,
        level_num: LevelNum,
        rooms: &[RoomNum],
        items: &[Item],
        constraint_name: &str,
    ) -> Result<(), Error> {
        let mut majors: Vec<Item> = items
            .iter()
            .filter(|item| item.is_major_item() || **item == Item::Triforce)
            .cloned()
            .collect();
        majors.dedup();
        if majors.is_empty() {
            return Err(format_err!(
                "level {}: no major items available for {}",
                level_num,
                constraint_name
            ));
        }
        if rooms.is_empty() {
            return Err(format_err!(
                "level {}: no rooms match {}",
                level_num,
                constraint_name
            ));
        }
        solver.at_least_one_of(rooms, &majors)
    }

    fn log_level_inventory(&self, level_num: LevelNum, pairs: &[RoomItemPair]) {
        let mut counts: Vec<(Item, usize)> = Vec::new();
        for (_, item) in pairs {
            match counts.iter_mut().find(|(existing, _)| existing == item) {
                Some((_, count)) => *count += 1,
                None => counts.push((*item, 1)),
            }
        }
        counts.sort();
        let summary: Vec<String> = counts
            .iter()
            .map(|(item, count)| format!("{:?}x{}", item, count))
            .collect();
        info!(
            "level {} shuffle inventory: {}",
            level_num,
            summary.join(", ")
        );
    }

    /// Context dump to diagnose why a level's constraints had no solution.
    fn log_solver_failure(&self, level_num: LevelNum, pairs: &[RoomItemPair], solver_seed: u64) {
        error!(
            "level {} solver context: seed={} item_stair_can_have_triforce={} \
             item_stair_can_have_minor_item={} force_major_item_to_boss={} \
             force_major_item_to_triforce_room={}",
            level_num,
            solver_seed,
            self.flags.item_stair_can_have_triforce,
            self.flags.item_stair_can_have_minor_item,
            self.flags.force_major_item_to_boss,
            self.flags.force_major_item_to_triforce_room,
        );
        for (room_num, item) in pairs {
            error!(
                "  room {:#04x}: item={:?} position={:?} type={:?} enemy={:?} staircase={}",
                room_num,
                item,
                self.data_table.item_position(level_num, *room_num),
                self.data_table.room_type(level_num, *room_num).ok(),
                self.data_table.room_enemy(level_num, *room_num).ok(),
                self.data_table.is_item_staircase(level_num, *room_num),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zelda1::data_table::testdata::TestRomBuilder;
    use zelda1::ItemPosition;

    fn pcg(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn level_seed_is_salted_and_nonzero() {
        assert_ne!(level_seed(1000, 1), level_seed(1000, 2));
        assert_eq!(level_seed(1000, 1), 1101);
        assert!(level_seed(2_147_483_647 - 101, 1) >= 1);
    }

    // Level 1 with four connected rooms holding a key, bombs, a map and a
    // bow, plus an item stairway holding a compass.
    fn build_level() -> TestRomBuilder {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(1, 0x73)
            .set_room(1, 0x73, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            .set_room(1, 0x63, [0x04, 0x24, 0x00, 0x00, 0x19, 0x00])
            .set_room(1, 0x53, [0x04, 0x24, 0x00, 0x00, 0x00, 0x00])
            .set_room(1, 0x43, [0x24, 0x20, 0x00, 0x00, 0x17, 0x00])
            .set_room(1, 0x44, [0x24, 0x24, 0x00, 0x1c, 0x0a, 0x00])
            .set_room(1, 0x3f, [0x44, 0x44, 0x00, 0x3f, 0x16, 0x00])
            .set_stairway_list(1, &[0x3f]);
        builder
    }

    #[test]
    fn maps_and_compasses_stay_put() {
        for seed in 0..10 {
            let mut data_table = DataTable::new(&build_level().build()).unwrap();
            let mut flags = Flags::default();
            flags.shuffle_minor_dungeon_items = true;
            let mut rng = pcg(seed);
            let mut randomizer = MinorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(seed, &mut rng, SolverKind::RejectionSampling)
                .unwrap());
            assert_eq!(data_table.item(1, 0x43), Item::Map);
            assert_eq!(data_table.item(1, 0x3f), Item::Compass);
        }
    }

    #[test]
    fn minor_items_stay_put_when_shuffle_is_off() {
        for seed in 0..10 {
            let mut data_table = DataTable::new(&build_level().build()).unwrap();
            let flags = Flags::default();
            let mut rng = pcg(seed);
            let mut randomizer = MinorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(seed, &mut rng, SolverKind::RejectionSampling)
                .unwrap());
            assert_eq!(data_table.item(1, 0x63), Item::Key);
            assert_eq!(data_table.item(1, 0x53), Item::Bombs);
        }
    }

    #[test]
    fn item_positions_are_legal_for_the_room_type() {
        let mut data_table = DataTable::new(&build_level().build()).unwrap();
        let flags = Flags::default();
        let mut rng = pcg(5);
        let mut randomizer = MinorItemRandomizer::new(&mut data_table, &flags);
        assert!(randomizer
            .randomize(5, &mut rng, SolverKind::RejectionSampling)
            .unwrap());
        // 0x44 is a spiral stair room; only corners are legal there.
        let position = data_table.item_position(1, 0x44);
        assert!(
            position == ItemPosition::TopRight || position == ItemPosition::BottomLeft,
            "{:?}",
            position
        );
    }

    #[test]
    fn same_seed_shuffles_identically() {
        let run = |seed: u64| -> Vec<Item> {
            let mut data_table = DataTable::new(&build_level().build()).unwrap();
            let mut flags = Flags::default();
            flags.shuffle_minor_dungeon_items = true;
            let mut rng = pcg(seed);
            let mut randomizer = MinorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(seed, &mut rng, SolverKind::RejectionSampling)
                .unwrap());
            vec![
                data_table.item(1, 0x63),
                data_table.item(1, 0x53),
                data_table.item(1, 0x44),
            ]
        };
        let first = run(123);
        for _ in 0..4 {
            assert_eq!(run(123), first);
        }
    }

    #[test]
    fn triforce_of_power_is_pinned_in_level_nine() {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(9, 0x52)
            .set_room(7, 0x52, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            .set_room(7, 0x42, [0x04, 0x24, 0x00, 0x00, 0x0e, 0x00])
            .set_room(7, 0x32, [0x24, 0x24, 0x00, 0x00, 0x0a, 0x00]);
        for seed in 0..10 {
            let mut data_table = DataTable::new(&builder.build()).unwrap();
            let flags = Flags::default();
            let mut rng = pcg(seed);
            let mut randomizer = MinorItemRandomizer::new(&mut data_table, &flags);
            assert!(randomizer
                .randomize(seed, &mut rng, SolverKind::RejectionSampling)
                .unwrap());
            assert_eq!(data_table.item(9, 0x42), Item::TriforceOfPower, "seed {}", seed);
        }
    }
}
