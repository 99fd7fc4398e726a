use std::collections::BTreeMap;

use failure::Error;
use log::debug;

use zelda1::{
    DataTable, Direction, Item, LevelNum, RoomNum, RoomType, WallType, DUNGEON_LEVEL_NUMBERS,
};

pub type RoomItemPair = (RoomNum, Item);

/// Flood-fills each dungeon from its start room and returns, per level, the
/// rooms eligible to hold an item together with their current items, in
/// visitation order.
pub struct RoomItemCollector<'a> {
    data_table: &'a DataTable,
}

impl<'a> RoomItemCollector<'a> {
    pub fn new(data_table: &'a DataTable) -> RoomItemCollector<'a> {
        RoomItemCollector { data_table }
    }

    pub fn collect_all(&self) -> Result<BTreeMap<LevelNum, Vec<RoomItemPair>>, Error> {
        let mut collected = BTreeMap::new();
        for level_num in DUNGEON_LEVEL_NUMBERS {
            collected.insert(level_num, self.collect_level(level_num)?);
        }
        Ok(collected)
    }

    pub fn collect_level(&self, level_num: LevelNum) -> Result<Vec<RoomItemPair>, Error> {
        let mut visited: Vec<RoomItemPair> = Vec::new();
        let mut rooms_to_visit = vec![self.data_table.level_start_room(level_num)];

        while let Some(room_num) = rooms_to_visit.pop() {
            let new_rooms = self.visit_room(level_num, room_num, &mut visited)?;
            rooms_to_visit.extend(new_rooms);
        }

        let mut eligible = Vec::new();
        for pair in visited {
            if self.is_possible_item_room(level_num, pair.0)? {
                eligible.push(pair);
            }
        }
        Ok(eligible)
    }

    fn visit_room(
        &self,
        level_num: LevelNum,
        room_num: RoomNum,
        visited: &mut Vec<RoomItemPair>,
    ) -> Result<Vec<RoomNum>, Error> {
        if visited.iter().any(|(num, _)| *num == room_num) {
            return Ok(Vec::new());
        }
        debug!("visiting level {} room {:#04x}", level_num, room_num);

        let room = *self.data_table.room(level_num, room_num);
        visited.push((room_num, room.item()));

        if room.is_staircase() {
            // Staircase rooms are reached through the stairway list, never
            // through walls.
            return Ok(Vec::new());
        }

        let mut rooms_to_visit = Vec::new();
        for &direction in &Direction::CARDINALS {
            if room.wall_type(direction) != WallType::SolidWall {
                if let Some(neighbor) = direction.neighbor(room_num) {
                    rooms_to_visit.push(neighbor);
                }
            }
        }

        if room.has_staircase()? {
            rooms_to_visit.extend(self.visit_stairways(level_num, room_num, visited));
        }

        Ok(rooms_to_visit)
    }

    /// Item stairways contribute their item directly; a transport stairway
    /// contributes its far end as a new room to walk.
    fn visit_stairways(
        &self,
        level_num: LevelNum,
        room_num: RoomNum,
        visited: &mut Vec<RoomItemPair>,
    ) -> Vec<RoomNum> {
        let mut rooms_to_visit = Vec::new();
        for stairway_room_num in self.data_table.level_staircase_rooms(level_num) {
            let left_exit = self.data_table.staircase_left_exit(level_num, stairway_room_num);
            let right_exit = self
                .data_table
                .staircase_right_exit(level_num, stairway_room_num);

            if left_exit == room_num && right_exit == room_num {
                if !visited.iter().any(|(num, _)| *num == stairway_room_num) {
                    visited.push((
                        stairway_room_num,
                        self.data_table.item(level_num, stairway_room_num),
                    ));
                }
            } else if left_exit == room_num && right_exit != room_num {
                rooms_to_visit.push(right_exit);
                break;
            } else if right_exit == room_num && left_exit != room_num {
                rooms_to_visit.push(left_exit);
                break;
            }
        }
        rooms_to_visit
    }

    fn is_possible_item_room(&self, level_num: LevelNum, room_num: RoomNum) -> Result<bool, Error> {
        let room_type = self.data_table.room_type(level_num, room_num)?;

        match room_type {
            RoomType::EntranceRoom | RoomType::TransportStaircase => return Ok(false),
            RoomType::ItemStaircase => return Ok(true),
            _ => (),
        }

        Ok(!self.is_npc_room(level_num, room_num)?)
    }

    fn is_npc_room(&self, level_num: LevelNum, room_num: RoomNum) -> Result<bool, Error> {
        let enemy = self.data_table.room_enemy(level_num, room_num)?;
        if enemy.is_npc() {
            return Ok(true);
        }
        if enemy.is_mixed_enemy_group() {
            return Ok(self
                .data_table
                .mixed_enemy_group(enemy)
                .iter()
                .any(|member| member.is_npc()));
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zelda1::data_table::testdata::TestRomBuilder;
    use zelda1::Enemy;

    // A small level 1: entrance at 0x73, open path north through 0x63 to
    // 0x53; 0x63 also opens west to an NPC room 0x62; 0x53 hosts an item
    // stairway to 0x3f.
    fn small_dungeon() -> DataTable {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(1, 0x73)
            // Entrance room: north open, type ENTRANCE (0x21).
            .set_room(1, 0x73, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            // 0x63: north and south open, west open to NPC room; bow here.
            .set_room(1, 0x63, [0x05, 0x04, 0x00, 0x00, 0x0a, 0x00])
            // 0x62: old man room, east open.
            .set_room(1, 0x62, [0x24, 0x20, 0x0b, 0x80, 0x0e, 0x00])
            // 0x53: south open, spiral stair room with a key.
            .set_room(1, 0x53, [0x24, 0x24, 0x00, 0x1c, 0x19, 0x00])
            // 0x3f: the item staircase, both exits 0x53, holds a compass.
            .set_room(1, 0x3f, [0x53, 0x53, 0x00, 0x3f, 0x16, 0x00])
            .set_stairway_list(1, &[0x3f]);
        DataTable::new(&builder.build()).unwrap()
    }

    #[test]
    fn collects_reachable_rooms_and_stairway_items() {
        let data_table = small_dungeon();
        let collector = RoomItemCollector::new(&data_table);
        let pairs = collector.collect_level(1).unwrap();
        let rooms: Vec<u8> = pairs.iter().map(|(num, _)| *num).collect();

        // Entrance and NPC rooms are excluded; stairway item room included.
        assert!(!rooms.contains(&0x73));
        assert!(!rooms.contains(&0x62));
        assert!(rooms.contains(&0x63));
        assert!(rooms.contains(&0x53));
        assert!(rooms.contains(&0x3f));

        let stair_item = pairs.iter().find(|(num, _)| *num == 0x3f).unwrap().1;
        assert_eq!(stair_item, Item::Compass);
    }

    #[test]
    fn solid_walls_stop_the_flood_fill() {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(2, 0x40)
            .set_room(1, 0x40, [0x24, 0x24, 0x00, 0x21, 0x0e, 0x00]);
        let data_table = DataTable::new(&builder.build()).unwrap();
        let collector = RoomItemCollector::new(&data_table);
        // Only the entrance is reachable, and entrances are filtered out.
        assert!(collector.collect_level(2).unwrap().is_empty());
    }

    #[test]
    fn mixed_groups_with_npcs_are_excluded() {
        let mut builder = TestRomBuilder::new();
        builder
            .set_level_start_room(1, 0x73)
            .set_room(1, 0x73, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            // North room uses mixed group 1 (0x62 = 0x22 + high bit).
            .set_room(1, 0x63, [0x24, 0x24, 0x22, 0x80, 0x0a, 0x00])
            .set_mixed_enemy_group(0, &[Enemy::Stalfos as u8, Enemy::Mugger as u8]);
        let data_table = DataTable::new(&builder.build()).unwrap();
        let collector = RoomItemCollector::new(&data_table);
        assert!(collector.collect_level(1).unwrap().is_empty());
    }
}
