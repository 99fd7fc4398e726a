use failure::{format_err, Error};
use num::FromPrimitive;
use serde::Serialize;

use crate::{Direction, Enemy, Item, ItemPosition, RoomAction, RoomNum, RoomType, WallType};

// Per http://www.bwass.org/romhack/zelda1/zelda1bank6.txt:
// Bytes in table 0 represent:
// xxx. ....	Type of Door on Top Wall
// ...x xx..	Type of Door on Bottom Wall
// .... ..xx	Code for Palette 0 (Outer Border)
// Bytes in table 1 represent:
// xxx. ....	Type of Door on Left Wall
// ...x xx..	Type of Door on Right Wall
// .... ..xx	Code for Palette 1 (Inner Section)

/// Six bytes of bit-packed state for one dungeon room, one byte from each of
/// the six level tables.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Room {
    data: [u8; 6],
    visited: bool,
}

impl Room {
    pub fn new(mut data: [u8; 6]) -> Room {
        // The raw item field 0x03 is the vanilla "no item" sentinel, which
        // collides with the magical sword.  Rewrite it to the post-load
        // no-item code exactly once, here.
        if data[4] & 0x1f == 0x03 {
            data[4] = (data[4] & 0xe0) | Item::NO_ITEM as u8;
        }
        Room {
            data,
            visited: false,
        }
    }

    pub fn rom_data(&self) -> &[u8; 6] {
        &self.data
    }

    fn wall_field(direction: Direction) -> (usize, u8) {
        match direction {
            Direction::West => (1, 5),
            Direction::North => (0, 5),
            Direction::East => (1, 2),
            Direction::South => (0, 2),
            Direction::Staircase => unreachable!("staircase is not a wall"),
        }
    }

    pub fn wall_type(&self, direction: Direction) -> WallType {
        debug_assert!(!self.is_staircase());
        let (table_num, offset) = Self::wall_field(direction);
        WallType::from_bits(self.data[table_num] >> offset)
    }

    /// Sets the wall type for one direction, preserving every other bit of
    /// the byte.
    pub fn set_wall_type(&mut self, direction: Direction, wall_type: WallType) {
        debug_assert!(!self.is_staircase());
        let (table_num, offset) = Self::wall_field(direction);
        let clear_mask = !(0x07 << offset);
        self.data[table_num] = (self.data[table_num] & clear_mask) | ((wall_type as u8) << offset);
    }

    pub fn room_type(&self) -> Result<RoomType, Error> {
        let code = self.data[3] & 0x3f;
        RoomType::from_u8(code).ok_or_else(|| format_err!("unknown room type {:#04x}", code))
    }

    pub fn is_item_staircase(&self) -> bool {
        self.data[3] & 0x3f == RoomType::ItemStaircase as u8
    }

    pub fn is_transport_staircase(&self) -> bool {
        self.data[3] & 0x3f == RoomType::TransportStaircase as u8
    }

    /// Staircase rooms repurpose the wall bytes as exit room numbers and must
    /// not be asked for wall types.
    pub fn is_staircase(&self) -> bool {
        self.is_item_staircase() || self.is_transport_staircase()
    }

    pub fn left_exit(&self) -> RoomNum {
        debug_assert!(self.is_staircase());
        self.data[0] & 0x7f
    }

    pub fn right_exit(&self) -> RoomNum {
        debug_assert!(self.is_staircase());
        self.data[1] & 0x7f
    }

    pub fn item(&self) -> Item {
        // Every 5-bit code has an assigned variant.
        Item::from_u8(self.data[4] & 0x1f).unwrap_or(Item::NO_ITEM)
    }

    pub fn set_item(&mut self, item: Item) {
        debug_assert!((item as u8) < 0x20);
        self.data[4] = (self.data[4] & 0xe0) | (item as u8 & 0x1f);
    }

    pub fn item_position(&self) -> ItemPosition {
        ItemPosition::from_bits(self.data[5] >> 4)
    }

    pub fn set_item_position(&mut self, position: ItemPosition) {
        self.data[5] = (self.data[5] & 0xcf) | ((position as u8) << 4);
    }

    pub fn room_action(&self) -> RoomAction {
        RoomAction::from_bits(self.data[5])
    }

    pub fn set_room_action(&mut self, action: RoomAction) {
        self.data[5] = (self.data[5] & !0x07) | action as u8;
    }

    pub fn enemy(&self) -> Result<Enemy, Error> {
        let mut code = self.data[2] & 0x3f;
        if self.data[3] & 0x80 > 0 {
            code += 0x40;
        }
        Enemy::from_u8(code).ok_or_else(|| format_err!("unknown enemy code {:#04x}", code))
    }

    pub fn has_movable_block_bit(&self) -> bool {
        crate::is_bit_set!(self.data[3], 0x40)
    }

    pub fn has_drop_bit(&self) -> bool {
        crate::is_bit_set!(self.data[5], 0x04) && crate::is_bit_set!(self.data[5], 0x01)
    }

    /// Whether a stairway appears in this room: open-stair layouts always
    /// have one; push-block layouts have one when the movable-block bit is
    /// set and no wall is a shutter (pushing the block opens the shutters
    /// instead of revealing a stair).
    pub fn has_staircase(&self) -> Result<bool, Error> {
        let room_type = self.room_type()?;
        if room_type.has_open_staircase() {
            return Ok(true);
        }
        if room_type.is_staircase_room() {
            return Ok(false);
        }
        for &direction in &Direction::CARDINALS {
            if self.wall_type(direction) == WallType::ShutterDoor {
                return Ok(false);
            }
        }
        Ok(room_type.can_have_push_block() && self.has_movable_block_bit())
    }

    /// A magical sword placed where it can't drop (stairway present, or no
    /// drop bit) never materializes.
    pub fn has_item(&self) -> Result<bool, Error> {
        if self.item() == Item::MagicalSword && (self.has_staircase()? || !self.has_drop_bit()) {
            return Ok(false);
        }
        Ok(true)
    }

    pub fn has_the_beast(&self) -> bool {
        self.enemy().map(|e| e == Enemy::TheBeast).unwrap_or(false)
    }

    pub fn has_digdogger(&self) -> bool {
        match self.enemy() {
            Ok(Enemy::SingleDigdogger) | Ok(Enemy::TripleDigdogger) => true,
            _ => false,
        }
    }

    pub fn has_gohma(&self) -> bool {
        match self.enemy() {
            Ok(Enemy::RedGohma) | Ok(Enemy::BlueGohma) => true,
            _ => false,
        }
    }

    pub fn has_hungry_goriya(&self) -> bool {
        self.enemy()
            .map(|e| e == Enemy::HungryGoriya)
            .unwrap_or(false)
    }

    pub fn has_no_enemies_to_kill(&self) -> bool {
        self.enemy().map(|e| e.needs_no_kill()).unwrap_or(false)
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    pub fn mark_visited(&mut self) {
        self.visited = true;
    }

    pub fn clear_visit_mark(&mut self) {
        self.visited = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_room() -> Room {
        // Open doors all around, plain room type, no item.
        Room::new([0x00, 0x00, 0x00, 0x00, 0x0e, 0x00])
    }

    #[test]
    fn wall_type_round_trip() {
        let mut room = plain_room();
        for &dir in &Direction::CARDINALS {
            room.set_wall_type(dir, WallType::ShutterDoor);
            assert_eq!(room.wall_type(dir), WallType::ShutterDoor);
            room.set_wall_type(dir, WallType::OpenDoor);
            assert_eq!(room.wall_type(dir), WallType::OpenDoor);
        }
    }

    #[test]
    fn set_wall_type_preserves_other_bits() {
        // Palette bits and the opposite wall field must survive a write.
        let mut room = Room::new([0xa3, 0x5b, 0x00, 0x00, 0x0e, 0x00]);
        let before_table0 = room.rom_data()[0];
        room.set_wall_type(Direction::West, WallType::SolidWall);
        assert_eq!(room.rom_data()[0], before_table0);
        assert_eq!(room.rom_data()[1] & !(0x07 << 5), 0x5b & !(0x07 << 5));
        assert_eq!(room.wall_type(Direction::West), WallType::SolidWall);
    }

    #[test]
    fn set_wall_to_current_value_is_identity() {
        let mut room = Room::new([0xa3, 0x5b, 0x00, 0x00, 0x0e, 0x00]);
        let before = *room.rom_data();
        let current = room.wall_type(Direction::North);
        room.set_wall_type(Direction::North, current);
        assert_eq!(*room.rom_data(), before);
    }

    #[test]
    fn item_sentinel_rewritten_on_load() {
        let room = Room::new([0x00, 0x00, 0x00, 0x00, 0xe3, 0x00]);
        assert_eq!(room.item(), Item::NO_ITEM);
        // High bits untouched.
        assert_eq!(room.rom_data()[4] & 0xe0, 0xe0);
    }

    #[test]
    fn set_item_preserves_high_bits() {
        let mut room = Room::new([0x00, 0x00, 0x00, 0x00, 0xa5, 0x00]);
        room.set_item(Item::HeartContainer);
        assert_eq!(room.rom_data()[4] & 0xe0, 0xa0);
        assert_eq!(room.item(), Item::HeartContainer);
    }

    #[test]
    fn item_position_preserves_other_bits() {
        let mut room = Room::new([0x00, 0x00, 0x00, 0x00, 0x0e, 0xc7]);
        room.set_item_position(ItemPosition::BottomLeft);
        assert_eq!(room.rom_data()[5] & 0xcf, 0xc7);
        assert_eq!(room.item_position(), ItemPosition::BottomLeft);
    }

    #[test]
    fn room_action_preserves_other_bits() {
        let mut room = Room::new([0x00, 0x00, 0x00, 0x00, 0x0e, 0xfc]);
        room.set_room_action(RoomAction::TriforceOfPowerOpensShutters);
        assert_eq!(room.rom_data()[5] & !0x07, 0xf8);
        assert_eq!(
            room.room_action(),
            RoomAction::TriforceOfPowerOpensShutters
        );
    }

    #[test]
    fn enemy_high_bit() {
        let room = Room::new([0x00, 0x00, 0x02, 0x80, 0x0e, 0x00]);
        assert_eq!(room.enemy().unwrap(), Enemy::Gleeok1);
    }

    #[test]
    fn unknown_enemy_code_is_an_error() {
        let room = Room::new([0x00, 0x00, 0x19, 0x80, 0x0e, 0x00]);
        assert!(room.enemy().is_err());
    }

    #[test]
    fn staircase_exits() {
        let room = Room::new([0x42, 0x53, 0x00, 0x3e, 0x0e, 0x00]);
        assert!(room.is_transport_staircase());
        assert!(room.is_staircase());
        assert_eq!(room.left_exit(), 0x42);
        assert_eq!(room.right_exit(), 0x53);
    }

    #[test]
    fn shutter_door_suppresses_push_block_staircase() {
        // Maze room with movable block bit, all open doors: has a staircase.
        let mut room = Room::new([0x00, 0x00, 0x00, 0x4c, 0x0e, 0x00]);
        assert!(room.has_staircase().unwrap());
        // Adding a shutter door suppresses it.
        room.set_wall_type(Direction::North, WallType::ShutterDoor);
        assert!(!room.has_staircase().unwrap());
    }

    #[test]
    fn open_staircase_room_types() {
        let room = Room::new([0x00, 0x00, 0x00, 0x1c, 0x0e, 0x00]);
        assert!(room.has_staircase().unwrap());
    }
}
