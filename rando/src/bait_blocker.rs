use std::collections::{BTreeSet, VecDeque};

use failure::Error;
use log::debug;

use zelda1::{DataTable, Direction, LevelNum, RoomNum, WallType};

/// Splits a dungeon into two partitions across the hungry NPC's north wall
/// and solidifies every other crossing, so the only path into the far region
/// runs through the hungry room.
pub struct BaitBlocker<'a> {
    data_table: &'a mut DataTable,
}

impl<'a> BaitBlocker<'a> {
    pub fn new(data_table: &'a mut DataTable) -> BaitBlocker<'a> {
        BaitBlocker { data_table }
    }

    /// Best-effort: returns false when the level has no hungry NPC or its
    /// north wall cannot gate anything.
    pub fn block_level(&mut self, level_num: LevelNum) -> Result<bool, Error> {
        let hungry_room_num = match self.find_hungry_room(level_num) {
            Some(room_num) => room_num,
            None => {
                debug!("level {}: no hungry NPC found", level_num);
                return Ok(false);
            }
        };
        debug!(
            "level {}: hungry NPC in room {:#04x}",
            level_num, hungry_room_num
        );

        let hungry_room = self.data_table.room(level_num, hungry_room_num);
        let north_room_num = match Direction::North.neighbor(hungry_room_num) {
            Some(neighbor) if hungry_room.wall_type(Direction::North) != WallType::SolidWall => {
                neighbor
            }
            _ => {
                debug!(
                    "level {}: hungry room {:#04x} has no usable north exit",
                    level_num, hungry_room_num
                );
                return Ok(false);
            }
        };

        // Partition A spans the hungry room and its other open neighbors;
        // partition B is seeded with the room beyond the north wall.
        let mut partition_a: BTreeSet<RoomNum> = BTreeSet::new();
        let mut partition_b: BTreeSet<RoomNum> = BTreeSet::new();
        partition_a.insert(hungry_room_num);
        partition_b.insert(north_room_num);
        for &direction in &[Direction::West, Direction::East, Direction::South] {
            if hungry_room.wall_type(direction) != WallType::SolidWall {
                if let Some(neighbor) = direction.neighbor(hungry_room_num) {
                    partition_a.insert(neighbor);
                }
            }
        }

        self.expand_partitions(level_num, &mut partition_a, &mut partition_b);
        debug!(
            "level {}: partition A has {} rooms, partition B has {}",
            level_num,
            partition_a.len(),
            partition_b.len()
        );

        let walls_modified =
            self.solidify_boundary(level_num, &partition_a, &partition_b, hungry_room_num);
        debug!("level {}: solidified {} walls", level_num, walls_modified);
        Ok(true)
    }

    fn find_hungry_room(&self, level_num: LevelNum) -> Option<RoomNum> {
        let mut rooms_to_visit = vec![self.data_table.level_start_room(level_num)];
        let mut visited = BTreeSet::new();
        let mut hungry_room = None;

        while let Some(room_num) = rooms_to_visit.pop() {
            if !visited.insert(room_num) {
                continue;
            }
            let room = self.data_table.room(level_num, room_num);
            if room.is_staircase() {
                continue;
            }
            match room.enemy() {
                Ok(enemy) => {
                    if enemy == zelda1::Enemy::HungryGoriya {
                        hungry_room = Some(room_num);
                    }
                }
                Err(_) => {
                    debug!(
                        "level {} room {:#04x}: undecodable enemy; skipping",
                        level_num, room_num
                    );
                    continue;
                }
            }
            for &direction in &Direction::CARDINALS {
                if room.wall_type(direction) != WallType::SolidWall {
                    if let Some(neighbor) = direction.neighbor(room_num) {
                        if !visited.contains(&neighbor) {
                            rooms_to_visit.push(neighbor);
                        }
                    }
                }
            }
        }

        hungry_room
    }

    /// Alternating breadth-first growth; a room belongs to whichever
    /// partition reached it first.
    fn expand_partitions(
        &self,
        level_num: LevelNum,
        partition_a: &mut BTreeSet<RoomNum>,
        partition_b: &mut BTreeSet<RoomNum>,
    ) {
        let mut queue_a: VecDeque<RoomNum> = partition_a.iter().cloned().collect();
        let mut queue_b: VecDeque<RoomNum> = partition_b.iter().cloned().collect();

        while !queue_a.is_empty() || !queue_b.is_empty() {
            if let Some(room_num) = queue_a.pop_front() {
                self.claim_neighbors(level_num, room_num, partition_a, partition_b, &mut queue_a);
            }
            if let Some(room_num) = queue_b.pop_front() {
                self.claim_neighbors(level_num, room_num, partition_b, partition_a, &mut queue_b);
            }
        }
    }

    fn claim_neighbors(
        &self,
        level_num: LevelNum,
        room_num: RoomNum,
        own: &mut BTreeSet<RoomNum>,
        other: &BTreeSet<RoomNum>,
        queue: &mut VecDeque<RoomNum>,
    ) {
        let room = self.data_table.room(level_num, room_num);
        if room.is_staircase() {
            return;
        }
        for &direction in &Direction::CARDINALS {
            if room.wall_type(direction) == WallType::SolidWall {
                continue;
            }
            if let Some(neighbor) = direction.neighbor(room_num) {
                if !own.contains(&neighbor) && !other.contains(&neighbor) {
                    own.insert(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// Both sides of every A-to-B crossing become solid, except the hungry
    /// room's own north wall.
    fn solidify_boundary(
        &mut self,
        level_num: LevelNum,
        partition_a: &BTreeSet<RoomNum>,
        partition_b: &BTreeSet<RoomNum>,
        hungry_room_num: RoomNum,
    ) -> usize {
        let mut walls_modified = 0;

        for &room_num in partition_a {
            if self.data_table.room(level_num, room_num).is_staircase() {
                continue;
            }
            for &direction in &Direction::CARDINALS {
                if self.data_table.wall_type(level_num, room_num, direction) == WallType::SolidWall
                {
                    continue;
                }
                if room_num == hungry_room_num && direction == Direction::North {
                    continue;
                }
                let neighbor = match direction.neighbor(room_num) {
                    Some(neighbor) => neighbor,
                    None => continue,
                };
                if !partition_b.contains(&neighbor) {
                    continue;
                }

                self.data_table
                    .room_mut(level_num, room_num)
                    .set_wall_type(direction, WallType::SolidWall);
                walls_modified += 1;
                debug!(
                    "solidified {:#04x} {:?} -> {:#04x}",
                    room_num, direction, neighbor
                );

                let opposite = direction.inverse();
                let neighbor_room = self.data_table.room(level_num, neighbor);
                if !neighbor_room.is_staircase()
                    && neighbor_room.wall_type(opposite) != WallType::SolidWall
                {
                    self.data_table
                        .room_mut(level_num, neighbor)
                        .set_wall_type(opposite, WallType::SolidWall);
                    walls_modified += 1;
                }
            }
        }

        walls_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zelda1::data_table::testdata::TestRomBuilder;
    use zelda1::Enemy;

    // A 2x2 block of rooms, all interconnected, with the hungry NPC in the
    // southwest corner:
    //
    //   0x33 - 0x34      (partition B once blocked)
    //    |      |
    //   0x43 - 0x44      (partition A; hungry NPC in 0x43)
    //    |
    //   0x53  (entrance)
    fn blocked_level() -> DataTable {
        let open_ns_room = |enemy: u8| [0x00, 0x00, enemy, 0x00, 0x0e, 0x00];
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(5, 0x53)
            .set_room(1, 0x53, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            // 0x43: all four walls open, hungry goriya.
            .set_room(1, 0x43, open_ns_room(Enemy::HungryGoriya as u8))
            // 0x44: west and north open.
            .set_room(1, 0x44, [0x04, 0x04, 0x00, 0x00, 0x0e, 0x00])
            // 0x33: south and east open.
            .set_room(1, 0x33, [0x20, 0x21, 0x00, 0x00, 0x0e, 0x00])
            // 0x34: south and west open.
            .set_room(1, 0x34, [0x20, 0x05, 0x00, 0x00, 0x0e, 0x00]);
        DataTable::new(&builder.build()).unwrap()
    }

    #[test]
    fn crossings_are_sealed_except_the_hungry_north_wall() {
        let mut data_table = blocked_level();
        let mut blocker = BaitBlocker::new(&mut data_table);
        assert!(blocker.block_level(5).unwrap());

        // The hungry room's north wall still opens.
        assert_ne!(
            data_table.wall_type(5, 0x43, Direction::North),
            WallType::SolidWall
        );
        // The other crossing (0x44 <-> 0x34) is sealed from both sides.
        assert_eq!(
            data_table.wall_type(5, 0x44, Direction::North),
            WallType::SolidWall
        );
        assert_eq!(
            data_table.wall_type(5, 0x34, Direction::South),
            WallType::SolidWall
        );
        // Movement inside each partition is untouched.
        assert_ne!(
            data_table.wall_type(5, 0x43, Direction::East),
            WallType::SolidWall
        );
        assert_ne!(
            data_table.wall_type(5, 0x33, Direction::East),
            WallType::SolidWall
        );
    }

    #[test]
    fn level_without_hungry_npc_reports_failure() {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(2, 0x40)
            .set_room(1, 0x40, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00]);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let mut blocker = BaitBlocker::new(&mut data_table);
        assert!(!blocker.block_level(2).unwrap());
    }

    #[test]
    fn solid_north_wall_reports_failure() {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(2, 0x40)
            .set_room(1, 0x40, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            // Hungry room north of the entrance with a solid north wall.
            .set_room(1, 0x30, [0x24, 0x24, Enemy::HungryGoriya as u8, 0x00, 0x0e, 0x00]);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let mut blocker = BaitBlocker::new(&mut data_table);
        assert!(!blocker.block_level(2).unwrap());
    }
}
