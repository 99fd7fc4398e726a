use std::collections::BTreeMap;

use failure::{format_err, Error};
use log::debug;
use num::FromPrimitive;

use crate::cave::Cave;
use crate::patch::Patch;
use crate::room::Room;
use crate::rommap::{self, RomDataType};
use crate::util::RomReader;
use crate::{
    CaveType, Direction, Enemy, Item, ItemPosition, LevelNum, RoomNum, RoomType, ScreenNum,
    WallType, CAVE_POSITIONS, NUM_CAVES, NUM_ROOMS, NUM_SCREENS,
};

const CAVE_INDEX_ARMOS: usize = 0x14;
const CAVE_INDEX_COAST: usize = 0x15;

/// Entrance directions as encoded in the terminal stairway-list byte of a
/// previously randomized ROM.
const ENTRANCE_DIRECTIONS: [Direction; 5] = [
    Direction::South,
    Direction::West,
    Direction::North,
    Direction::East,
    Direction::South,
];

/// The single typed window onto the ROM image.  Owns typed copies of every
/// room, cave, per-level info block and overworld table; randomizer
/// components borrow it mutably one at a time and the final patch is derived
/// from its state by [`DataTable::build_patch`].
#[derive(Debug)]
pub struct DataTable {
    rom: Vec<u8>,
    level_1_to_6_raw: Vec<u8>,
    level_7_to_9_raw: Vec<u8>,
    overworld_raw: Vec<u8>,
    level_info_raw: Vec<Vec<u8>>,

    rooms_1_to_6: Vec<Room>,
    rooms_7_to_9: Vec<Room>,
    overworld: Vec<u8>,
    level_info: Vec<Vec<u8>>,
    caves: Vec<Cave>,
    triforce_locations: BTreeMap<LevelNum, RoomNum>,
    rom_data_values: BTreeMap<RomDataType, Vec<u8>>,

    mixed_enemy_groups: Vec<Vec<Enemy>>,
    is_z1r: bool,
}

impl DataTable {
    pub fn new(rom_data: &[u8]) -> Result<DataTable, Error> {
        if rom_data.len() < rommap::ROM_SIZE {
            return Err(format_err!(
                "ROM image is too small ({:#x} bytes; expected at least {:#x})",
                rom_data.len(),
                rommap::ROM_SIZE
            ));
        }

        let level_info_raw = Self::read_level_info(rom_data)?;

        // Race ROMs relocate the level data, so the per-level info reads
        // return bytes outside the 7-bit room space.  Catch that before any
        // room parsing goes off the rails.
        for (level_num, info) in level_info_raw.iter().enumerate() {
            if level_num >= 1 && info[rommap::START_ROOM_OFFSET] >= 0x80 {
                return Err(format_err!(
                    "This appears to be a Race ROM, which is not supported. Race ROMs \
                     use a modified memory layout that prevents the randomizer from \
                     reading level data. Please regenerate the base ROM without the \
                     Race ROM feature."
                ));
            }
        }

        let mut table = DataTable {
            rom: rom_data.to_vec(),
            level_1_to_6_raw: Self::read_block(rom_data, rommap::LEVEL_1_TO_6_DATA)?,
            level_7_to_9_raw: Self::read_block(rom_data, rommap::LEVEL_7_TO_9_DATA)?,
            overworld_raw: Self::read_block(rom_data, rommap::OVERWORLD_DATA)?,
            level_info_raw,
            rooms_1_to_6: Vec::new(),
            rooms_7_to_9: Vec::new(),
            overworld: Vec::new(),
            level_info: Vec::new(),
            caves: Vec::new(),
            triforce_locations: BTreeMap::new(),
            rom_data_values: BTreeMap::new(),
            mixed_enemy_groups: Vec::new(),
            is_z1r: false,
        };
        table.mixed_enemy_groups = table.read_mixed_enemy_groups()?;
        table.is_z1r = table.detect_z1r();
        table.reset_to_vanilla();
        Ok(table)
    }

    fn read_block(rom_data: &[u8], offset: usize) -> Result<Vec<u8>, Error> {
        RomReader::new(rom_data, offset)?.read_bytes(rommap::LEVEL_BLOCK_SIZE)
    }

    fn read_level_info(rom_data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
        let mut blocks = Vec::new();
        for level_num in 0..rommap::NUM_LEVEL_INFO_BLOCKS {
            let offset = rommap::LEVEL_INFO_START + level_num * rommap::LEVEL_INFO_SIZE;
            blocks.push(RomReader::new(rom_data, offset)?.read_bytes(rommap::LEVEL_INFO_SIZE)?);
        }
        Ok(blocks)
    }

    fn read_mixed_enemy_groups(&self) -> Result<Vec<Vec<Enemy>>, Error> {
        let mut groups = Vec::new();
        for group_num in 0..rommap::MIXED_ENEMY_GROUP_COUNT {
            let offset =
                rommap::MIXED_ENEMY_GROUP_TABLE + group_num * rommap::MIXED_ENEMY_GROUP_SIZE;
            let raw = RomReader::new(&self.rom, offset)?
                .read_bytes(rommap::MIXED_ENEMY_GROUP_SIZE)?;
            let mut group = Vec::new();
            for &code in &raw {
                if code == 0xff {
                    break;
                }
                if let Some(enemy) = Enemy::from_u8(code) {
                    group.push(enemy);
                }
            }
            groups.push(group);
        }
        Ok(groups)
    }

    /// A previously randomized ROM records each level's entrance direction as
    /// the terminal byte of its stairway list; the byte is only in [0, 4] on
    /// such ROMs.
    fn detect_z1r(&self) -> bool {
        for info in &self.level_info_raw {
            let list = Self::filtered_stairway_bytes(info);
            match list.last() {
                Some(&val) if val <= 4 => (),
                _ => return false,
            }
        }
        true
    }

    fn filtered_stairway_bytes(info: &[u8]) -> Vec<u8> {
        info[rommap::STAIRWAY_LIST_OFFSET..rommap::STAIRWAY_LIST_OFFSET + rommap::STAIRWAY_LIST_LEN]
            .iter()
            .cloned()
            .filter(|&val| val != 0xff)
            .collect()
    }

    /// Re-parses the pristine raw copies, discarding all mutations.
    pub fn reset_to_vanilla(&mut self) {
        self.rooms_1_to_6 = Self::parse_level_grid(&self.level_1_to_6_raw);
        self.rooms_7_to_9 = Self::parse_level_grid(&self.level_7_to_9_raw);
        self.overworld = self.overworld_raw.clone();
        self.level_info = self.level_info_raw.clone();
        self.caves = Self::parse_caves(&self.overworld_raw, &self.rom);
        self.triforce_locations.clear();
        self.rom_data_values.clear();
    }

    fn parse_level_grid(level_data: &[u8]) -> Vec<Room> {
        let mut rooms = Vec::with_capacity(NUM_ROOMS);
        for room_num in 0..NUM_ROOMS {
            let mut data = [0u8; 6];
            for (table_num, byte) in data.iter_mut().enumerate() {
                *byte = level_data[table_num * rommap::LEVEL_TABLE_SIZE + room_num];
            }
            rooms.push(Room::new(data));
        }
        rooms
    }

    fn parse_caves(overworld_raw: &[u8], rom: &[u8]) -> Vec<Cave> {
        // Cave item and price data live in overworld table 4.
        let cave_raw = &overworld_raw[rommap::LEVEL_TABLE_SIZE * 4..rommap::LEVEL_TABLE_SIZE * 5];
        let mut caves = Vec::with_capacity(NUM_CAVES);
        for cave_num in 0..NUM_CAVES {
            if cave_num == CAVE_INDEX_ARMOS {
                caves.push(Cave::new([
                    0x3f,
                    rom[rommap::ARMOS_ITEM_ADDRESS],
                    0x7f,
                    0x00,
                    0x00,
                    0x00,
                ]));
            } else if cave_num == CAVE_INDEX_COAST {
                caves.push(Cave::new([
                    0x3f,
                    rom[rommap::COAST_ITEM_ADDRESS],
                    0x7f,
                    0x00,
                    0x00,
                    0x00,
                ]));
            } else {
                let mut data = [0u8; 6];
                for byte_num in 0..3 {
                    data[byte_num] = cave_raw[3 * cave_num + byte_num];
                    data[byte_num + 3] = cave_raw[0x3c + 3 * cave_num + byte_num];
                }
                caves.push(Cave::new(data));
            }
        }
        caves
    }

    pub fn is_z1r(&self) -> bool {
        self.is_z1r
    }

    fn rooms(&self, level_num: LevelNum) -> &Vec<Room> {
        debug_assert!((1..=9).contains(&level_num));
        if level_num >= 7 {
            &self.rooms_7_to_9
        } else {
            &self.rooms_1_to_6
        }
    }

    fn rooms_mut(&mut self, level_num: LevelNum) -> &mut Vec<Room> {
        debug_assert!((1..=9).contains(&level_num));
        if level_num >= 7 {
            &mut self.rooms_7_to_9
        } else {
            &mut self.rooms_1_to_6
        }
    }

    pub fn room(&self, level_num: LevelNum, room_num: RoomNum) -> &Room {
        debug_assert!((room_num as usize) < NUM_ROOMS);
        &self.rooms(level_num)[room_num as usize]
    }

    pub fn room_mut(&mut self, level_num: LevelNum, room_num: RoomNum) -> &mut Room {
        debug_assert!((room_num as usize) < NUM_ROOMS);
        &mut self.rooms_mut(level_num)[room_num as usize]
    }

    pub fn item(&self, level_num: LevelNum, room_num: RoomNum) -> Item {
        self.room(level_num, room_num).item()
    }

    pub fn set_item(&mut self, level_num: LevelNum, room_num: RoomNum, item: Item) {
        self.room_mut(level_num, room_num).set_item(item);
        debug!(
            "level {} room {:#04x} item set to {:?}",
            level_num, room_num, item
        );
    }

    pub fn wall_type(
        &self,
        level_num: LevelNum,
        room_num: RoomNum,
        direction: Direction,
    ) -> WallType {
        self.room(level_num, room_num).wall_type(direction)
    }

    pub fn room_type(&self, level_num: LevelNum, room_num: RoomNum) -> Result<RoomType, Error> {
        self.room(level_num, room_num).room_type()
    }

    pub fn room_enemy(&self, level_num: LevelNum, room_num: RoomNum) -> Result<Enemy, Error> {
        let room = self.room(level_num, room_num);
        if room.is_staircase() {
            // The enemy byte is repurposed in staircase rooms.
            return Ok(Enemy::Nothing);
        }
        room.enemy()
    }

    pub fn is_item_staircase(&self, level_num: LevelNum, room_num: RoomNum) -> bool {
        self.room(level_num, room_num).is_item_staircase()
    }

    pub fn staircase_left_exit(&self, level_num: LevelNum, room_num: RoomNum) -> RoomNum {
        self.room(level_num, room_num).left_exit()
    }

    pub fn staircase_right_exit(&self, level_num: LevelNum, room_num: RoomNum) -> RoomNum {
        self.room(level_num, room_num).right_exit()
    }

    pub fn item_position(&self, level_num: LevelNum, room_num: RoomNum) -> ItemPosition {
        self.room(level_num, room_num).item_position()
    }

    pub fn set_item_position(
        &mut self,
        level_num: LevelNum,
        room_num: RoomNum,
        position: ItemPosition,
    ) {
        self.room_mut(level_num, room_num).set_item_position(position);
    }

    pub fn clear_all_visit_markers(&mut self) {
        for room in self
            .rooms_1_to_6
            .iter_mut()
            .chain(self.rooms_7_to_9.iter_mut())
        {
            room.clear_visit_mark();
        }
    }

    pub fn level_start_room(&self, level_num: LevelNum) -> RoomNum {
        self.level_info[level_num as usize][rommap::START_ROOM_OFFSET] & 0x7f
    }

    pub fn level_entrance_direction(&self, level_num: LevelNum) -> Direction {
        if !self.is_z1r {
            return Direction::South;
        }
        match self.raw_stairway_list(level_num).last() {
            Some(&val) => *ENTRANCE_DIRECTIONS
                .get(val as usize)
                .unwrap_or(&Direction::South),
            None => Direction::South,
        }
    }

    fn raw_stairway_list(&self, level_num: LevelNum) -> Vec<u8> {
        let mut list = Self::filtered_stairway_bytes(&self.level_info[level_num as usize]);
        // The vanilla ROM's level 3 data omits its stairway room even though
        // the room exists; repair the list so traversal still finds it.
        // See http://www.romhacking.net/forum/index.php?topic=18750
        if level_num == 3 && list.is_empty() {
            list.push(0x0f);
        }
        list
    }

    /// Stairway rooms for a level: both transport passages and item rooms.
    /// On previously randomized ROMs the terminal entry is the entrance
    /// direction, not a room.
    pub fn level_staircase_rooms(&self, level_num: LevelNum) -> Vec<RoomNum> {
        let mut list = self.raw_stairway_list(level_num);
        if self.is_z1r {
            list.pop();
        }
        list
    }

    pub fn set_level_item_position_coordinates(
        &mut self,
        level_num: LevelNum,
        coordinates: [u8; 4],
    ) {
        let info = &mut self.level_info[level_num as usize];
        info[rommap::ITEM_POSITIONS_OFFSET..rommap::ITEM_POSITIONS_OFFSET + 4]
            .copy_from_slice(&coordinates);
    }

    pub fn start_screen(&self) -> ScreenNum {
        self.level_info[0][rommap::START_ROOM_OFFSET]
    }

    pub fn set_start_screen(&mut self, screen_num: ScreenNum) {
        debug_assert!((screen_num as usize) < NUM_SCREENS);
        self.level_info[0][rommap::START_ROOM_OFFSET] = screen_num;
    }

    pub fn screen_destination(&self, screen_num: ScreenNum) -> CaveType {
        debug_assert!((screen_num as usize) < NUM_SCREENS);
        // Screens flagged second-quest-only are not secrets in this quest.
        if self.overworld[screen_num as usize + 5 * rommap::LEVEL_TABLE_SIZE] & 0x80 > 0 {
            return CaveType::None;
        }
        let destination = self.overworld[screen_num as usize + rommap::LEVEL_TABLE_SIZE] >> 2;
        CaveType::from_u8(destination).unwrap_or(CaveType::None)
    }

    pub fn set_screen_destination(&mut self, screen_num: ScreenNum, cave_type: CaveType) {
        debug_assert!((screen_num as usize) < NUM_SCREENS);
        let index = screen_num as usize + rommap::LEVEL_TABLE_SIZE;
        let lower_bits = self.overworld[index] & 0x03;
        self.overworld[index] = ((cave_type as u8) << 2) | lower_bits;
    }

    /// Overworld table 2: low 6 bits are the enemy code, top 2 a quantity
    /// class.
    pub fn overworld_enemy_data(&self, screen_num: ScreenNum) -> u8 {
        debug_assert!((screen_num as usize) < NUM_SCREENS);
        self.overworld[screen_num as usize + 2 * rommap::LEVEL_TABLE_SIZE]
    }

    pub fn set_overworld_enemy_data(&mut self, screen_num: ScreenNum, enemy_data: u8) {
        debug_assert!((screen_num as usize) < NUM_SCREENS);
        self.overworld[screen_num as usize + 2 * rommap::LEVEL_TABLE_SIZE] = enemy_data;
    }

    pub fn quest_bits(&self, screen_num: ScreenNum) -> (bool, bool) {
        debug_assert!((screen_num as usize) < NUM_SCREENS);
        let byte = self.overworld[screen_num as usize + 5 * rommap::LEVEL_TABLE_SIZE];
        (byte & 0x40 > 0, byte & 0x80 > 0)
    }

    pub fn armos_item_screen(&self) -> ScreenNum {
        self.rom[rommap::ARMOS_SCREEN_ADDRESS]
    }

    fn cave_index(cave_type: CaveType) -> usize {
        debug_assert!(cave_type.is_cave());
        cave_type as usize - 0x10
    }

    pub fn cave_item(&self, cave_type: CaveType, position: u8) -> Item {
        self.caves[Self::cave_index(cave_type)].item(position)
    }

    pub fn set_cave_item(&mut self, cave_type: CaveType, position: u8, item: Item) {
        self.caves[Self::cave_index(cave_type)].set_item(position, item);
    }

    pub fn cave_price(&self, cave_type: CaveType, position: u8) -> u8 {
        self.caves[Self::cave_index(cave_type)].price(position)
    }

    pub fn set_cave_price(&mut self, cave_type: CaveType, position: u8, price: u8) {
        self.caves[Self::cave_index(cave_type)].set_price(position, price);
    }

    pub fn mixed_enemy_group(&self, enemy: Enemy) -> &[Enemy] {
        if !enemy.is_mixed_enemy_group() {
            return &[];
        }
        let index = (enemy as u8 - rommap::MIXED_ENEMY_GROUP_FIRST_CODE) as usize;
        &self.mixed_enemy_groups[index]
    }

    /// Tracks where a level's triforce landed so the compass arrow follows
    /// it.  Item staircases report their host room.
    pub fn update_triforce_location(&mut self, level_num: LevelNum, room_num: RoomNum) {
        let room = self.room(level_num, room_num);
        let target = if room.is_item_staircase() {
            room.left_exit()
        } else {
            room_num
        };
        self.triforce_locations.insert(level_num, target);
    }

    pub fn set_rom_data_bytes(&mut self, ty: RomDataType, bytes: Vec<u8>) -> Result<(), Error> {
        let spec = ty.spec();
        if !spec.writable {
            return Err(format_err!("{:?} is not writable", ty));
        }
        if bytes.len() != spec.size {
            return Err(format_err!(
                "{:?} expects {} bytes, got {}",
                ty,
                spec.size,
                bytes.len()
            ));
        }
        self.rom_data_values.insert(ty, bytes);
        Ok(())
    }

    pub fn set_rom_data_value(&mut self, ty: RomDataType, value: u32) -> Result<(), Error> {
        let encoder = ty
            .spec()
            .encoder
            .ok_or_else(|| format_err!("{:?} has no encoder", ty))?;
        self.set_rom_data_bytes(ty, encoder(value))
    }

    pub fn rom_data_bytes(&self, ty: RomDataType) -> Result<Vec<u8>, Error> {
        if let Some(bytes) = self.rom_data_values.get(&ty) {
            return Ok(bytes.clone());
        }
        let spec = ty.spec();
        if spec.readable {
            return Ok(self.rom[spec.file_offset..spec.file_offset + spec.size].to_vec());
        }
        Ok(spec.default_value.to_vec())
    }

    pub fn rom_data_value(&self, ty: RomDataType) -> Result<u32, Error> {
        let decoder = ty
            .spec()
            .decoder
            .ok_or_else(|| format_err!("{:?} has no decoder", ty))?;
        Ok(decoder(&self.rom_data_bytes(ty)?))
    }

    /// Derives the full patch from the current state.  Not maintained
    /// incrementally; call once after all components have run.
    pub fn build_patch(&self) -> Patch {
        let mut patch = Patch::new();
        self.add_level_grid_patch(&mut patch, rommap::LEVEL_1_TO_6_DATA, &self.rooms_1_to_6);
        self.add_level_grid_patch(&mut patch, rommap::LEVEL_7_TO_9_DATA, &self.rooms_7_to_9);
        self.add_cave_patch(&mut patch);
        self.add_overworld_destination_patch(&mut patch);
        self.add_level_info_patch(&mut patch);

        // Compass arrows for levels 1-8 track the shuffled triforce rooms.
        // Level 9's compass target never changes.
        for level_num in 1..=8u8 {
            if let Some(&room_num) = self.triforce_locations.get(&level_num) {
                patch.add(
                    rommap::COMPASS_ROOM_NUMBER_ADDRESS
                        + (level_num as usize - 1) * rommap::LEVEL_INFO_STRIDE,
                    vec![room_num],
                );
            }
        }

        for (&ty, bytes) in &self.rom_data_values {
            patch.add(ty.spec().file_offset, bytes.clone());
        }
        patch
    }

    fn add_level_grid_patch(&self, patch: &mut Patch, start_address: usize, rooms: &[Room]) {
        for table_num in 0..rommap::NUM_ROOM_TABLES {
            let mut row = Vec::with_capacity(NUM_ROOMS);
            for room in rooms {
                row.push(room.rom_data()[table_num]);
            }
            patch.add(start_address + table_num * rommap::LEVEL_TABLE_SIZE, row);
        }
    }

    fn add_cave_patch(&self, patch: &mut Patch) {
        for (cave_num, cave) in self.caves.iter().enumerate() {
            if cave_num == CAVE_INDEX_ARMOS {
                patch.add(rommap::ARMOS_ITEM_ADDRESS, vec![cave.item(2) as u8]);
            } else if cave_num == CAVE_INDEX_COAST {
                patch.add(rommap::COAST_ITEM_ADDRESS, vec![cave.item(2) as u8]);
            } else {
                // The Cave type preserves the opaque top bits of its item
                // bytes, so whole triples are safe to emit.
                patch.add(
                    rommap::CAVE_ITEM_DATA + 3 * cave_num,
                    cave.item_data().to_vec(),
                );
                patch.add(
                    rommap::CAVE_PRICE_DATA + 3 * cave_num,
                    cave.price_data().to_vec(),
                );
            }
        }
    }

    fn add_overworld_destination_patch(&self, patch: &mut Patch) {
        patch.add(
            rommap::OVERWORLD_DESTINATION_TABLE,
            self.overworld
                [rommap::LEVEL_TABLE_SIZE..2 * rommap::LEVEL_TABLE_SIZE]
                .to_vec(),
        );
    }

    fn add_level_info_patch(&self, patch: &mut Patch) {
        // Only the item-position coordinate quadruple is written back; the
        // rest of each info block round-trips unchanged.
        for (level_num, info) in self.level_info.iter().enumerate() {
            let start = rommap::LEVEL_INFO_START + level_num * rommap::LEVEL_INFO_SIZE;
            patch.add(
                start + rommap::ITEM_POSITIONS_OFFSET,
                info[rommap::ITEM_POSITIONS_OFFSET..rommap::ITEM_POSITIONS_OFFSET + 4].to_vec(),
            );
        }
    }

    /// Items currently sitting in every cave position, for flag-compat
    /// checks.
    pub fn cave_items(&self, cave_type: CaveType) -> Vec<Item> {
        CAVE_POSITIONS
            .map(|position| self.cave_item(cave_type, position))
            .collect()
    }
}

#[doc(hidden)]
pub mod testdata {
    //! Synthetic ROM images for tests.  Real images cannot ship with the
    //! source tree, so tests assemble the handful of regions the DataTable
    //! actually reads.

    use crate::rommap;

    pub struct TestRomBuilder {
        rom: Vec<u8>,
    }

    impl TestRomBuilder {
        pub fn new() -> TestRomBuilder {
            let mut rom = vec![0u8; rommap::ROM_SIZE];
            // Terminate every stairway list and give every level a start
            // room so the image parses as a sane vanilla ROM.
            for level_num in 0..rommap::NUM_LEVEL_INFO_BLOCKS {
                let info = rommap::LEVEL_INFO_START + level_num * rommap::LEVEL_INFO_SIZE;
                for slot in 0..rommap::STAIRWAY_LIST_LEN {
                    rom[info + rommap::STAIRWAY_LIST_OFFSET + slot] = 0xff;
                }
                rom[info + rommap::START_ROOM_OFFSET] = 0x73;
            }
            // Default all mixed groups to empty.
            for index in 0..rommap::MIXED_ENEMY_GROUP_COUNT * rommap::MIXED_ENEMY_GROUP_SIZE {
                rom[rommap::MIXED_ENEMY_GROUP_TABLE + index] = 0xff;
            }
            // All dungeon rooms default to solid walls on all sides and no
            // item, so unset rooms stay inert.
            for block in &[rommap::LEVEL_1_TO_6_DATA, rommap::LEVEL_7_TO_9_DATA] {
                for room_num in 0..crate::NUM_ROOMS {
                    Self::write_room_raw(
                        &mut rom,
                        *block,
                        room_num as u8,
                        [0x24, 0x24, 0x00, 0x00, 0x0e, 0x00],
                    );
                }
            }
            TestRomBuilder { rom }
        }

        fn write_room_raw(rom: &mut [u8], block: usize, room_num: u8, data: [u8; 6]) {
            for (table_num, byte) in data.iter().enumerate() {
                rom[block + table_num * rommap::LEVEL_TABLE_SIZE + room_num as usize] = *byte;
            }
        }

        /// Raw six bytes for one room.  `level_block` is 1 for the 1-6
        /// grid and 7 for the 7-9 grid.
        pub fn set_room(&mut self, level_block: u8, room_num: u8, data: [u8; 6]) -> &mut Self {
            let block = if level_block >= 7 {
                rommap::LEVEL_7_TO_9_DATA
            } else {
                rommap::LEVEL_1_TO_6_DATA
            };
            Self::write_room_raw(&mut self.rom, block, room_num, data);
            self
        }

        pub fn set_level_start_room(&mut self, level_num: u8, room_num: u8) -> &mut Self {
            let info = rommap::LEVEL_INFO_START + level_num as usize * rommap::LEVEL_INFO_SIZE;
            self.rom[info + rommap::START_ROOM_OFFSET] = room_num;
            self
        }

        pub fn set_stairway_list(&mut self, level_num: u8, rooms: &[u8]) -> &mut Self {
            let info = rommap::LEVEL_INFO_START + level_num as usize * rommap::LEVEL_INFO_SIZE;
            for slot in 0..rommap::STAIRWAY_LIST_LEN {
                self.rom[info + rommap::STAIRWAY_LIST_OFFSET + slot] =
                    rooms.get(slot).cloned().unwrap_or(0xff);
            }
            self
        }

        pub fn set_screen_destination(&mut self, screen_num: u8, destination: u8) -> &mut Self {
            let index = rommap::OVERWORLD_DATA + rommap::LEVEL_TABLE_SIZE + screen_num as usize;
            self.rom[index] = destination << 2;
            self
        }

        pub fn set_second_quest_only(&mut self, screen_num: u8) -> &mut Self {
            let index = rommap::OVERWORLD_DATA + 5 * rommap::LEVEL_TABLE_SIZE + screen_num as usize;
            self.rom[index] |= 0x80;
            self
        }

        pub fn set_cave_data(&mut self, cave_num: usize, data: [u8; 6]) -> &mut Self {
            let table = rommap::OVERWORLD_DATA + 4 * rommap::LEVEL_TABLE_SIZE;
            for byte_num in 0..3 {
                self.rom[table + 3 * cave_num + byte_num] = data[byte_num];
                self.rom[table + 0x3c + 3 * cave_num + byte_num] = data[byte_num + 3];
            }
            self
        }

        pub fn set_byte(&mut self, offset: usize, value: u8) -> &mut Self {
            self.rom[offset] = value;
            self
        }

        pub fn set_mixed_enemy_group(&mut self, group_num: usize, codes: &[u8]) -> &mut Self {
            let offset =
                rommap::MIXED_ENEMY_GROUP_TABLE + group_num * rommap::MIXED_ENEMY_GROUP_SIZE;
            for slot in 0..rommap::MIXED_ENEMY_GROUP_SIZE {
                self.rom[offset + slot] = codes.get(slot).cloned().unwrap_or(0xff);
            }
            self
        }

        pub fn build(&self) -> Vec<u8> {
            self.rom.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testdata::TestRomBuilder;
    use super::*;

    #[test]
    fn vanilla_rom_is_not_z1r() {
        let rom = TestRomBuilder::new()
            .set_stairway_list(0, &[0x3c])
            .build();
        let table = DataTable::new(&rom).unwrap();
        assert!(!table.is_z1r());
        assert_eq!(table.level_entrance_direction(1), Direction::South);
    }

    #[test]
    fn z1r_rom_entrance_directions() {
        let mut builder = TestRomBuilder::new();
        for level_num in 0..10 {
            builder.set_stairway_list(level_num, &[0x3c, 0x02]);
        }
        let table = DataTable::new(&builder.build()).unwrap();
        assert!(table.is_z1r());
        assert_eq!(table.level_entrance_direction(4), Direction::North);
        // The entrance-direction byte is not a stairway room.
        assert_eq!(table.level_staircase_rooms(4), vec![0x3c]);
    }

    #[test]
    fn race_rom_is_rejected() {
        let rom = TestRomBuilder::new().set_level_start_room(3, 0xc5).build();
        let err = DataTable::new(&rom).unwrap_err();
        assert!(err.to_string().contains("Race ROM"));
    }

    #[test]
    fn level_3_stairway_repair() {
        let rom = TestRomBuilder::new().build();
        let table = DataTable::new(&rom).unwrap();
        assert_eq!(table.level_staircase_rooms(3), vec![0x0f]);
        assert_eq!(table.level_staircase_rooms(2), Vec::<u8>::new());
    }

    #[test]
    fn screen_destination_round_trip() {
        let rom = TestRomBuilder::new()
            .set_screen_destination(0x77, CaveType::WoodSwordCave as u8)
            .set_screen_destination(0x22, CaveType::Level6 as u8)
            .set_screen_destination(0x30, CaveType::Shop1 as u8)
            .set_second_quest_only(0x30)
            .build();
        let mut table = DataTable::new(&rom).unwrap();
        assert_eq!(table.screen_destination(0x77), CaveType::WoodSwordCave);
        assert_eq!(table.screen_destination(0x22), CaveType::Level6);
        // Second-quest-only screens have no destination in this quest.
        assert_eq!(table.screen_destination(0x30), CaveType::None);

        table.set_screen_destination(0x77, CaveType::Level1);
        assert_eq!(table.screen_destination(0x77), CaveType::Level1);
        table.reset_to_vanilla();
        assert_eq!(table.screen_destination(0x77), CaveType::WoodSwordCave);
    }

    #[test]
    fn cave_items_and_virtual_caves() {
        let rom = TestRomBuilder::new()
            .set_cave_data(0x00, [0x3f, 0x01, 0x3f, 0x00, 0x00, 0x00])
            .set_byte(rommap::ARMOS_ITEM_ADDRESS, Item::PowerBracelet as u8)
            .set_byte(rommap::COAST_ITEM_ADDRESS, Item::HeartContainer as u8)
            .build();
        let mut table = DataTable::new(&rom).unwrap();
        assert_eq!(table.cave_item(CaveType::WoodSwordCave, 2), Item::WoodSword);
        assert_eq!(table.cave_item(CaveType::ArmosItem, 2), Item::PowerBracelet);
        assert_eq!(table.cave_item(CaveType::CoastItem, 2), Item::HeartContainer);

        table.set_cave_item(CaveType::CoastItem, 2, Item::Ladder);
        let patch = table.build_patch();
        assert_eq!(
            patch.data(rommap::COAST_ITEM_ADDRESS),
            Some(&[Item::Ladder as u8][..])
        );
    }

    #[test]
    fn room_mutations_round_trip_through_patch() {
        let rom = TestRomBuilder::new().build();
        let mut table = DataTable::new(&rom).unwrap();
        table.set_item(1, 0x45, Item::Bow);
        table
            .room_mut(1, 0x45)
            .set_wall_type(Direction::North, WallType::BombHole);

        let patch = table.build_patch();
        let row = patch.data(rommap::LEVEL_1_TO_6_DATA + 4 * rommap::LEVEL_TABLE_SIZE);
        assert_eq!(row.unwrap()[0x45] & 0x1f, Item::Bow as u8);

        let mut image = rom.clone();
        patch.apply(&mut image);
        let reparsed = DataTable::new(&image).unwrap();
        assert_eq!(reparsed.item(1, 0x45), Item::Bow);
        assert_eq!(
            reparsed.wall_type(1, 0x45, Direction::North),
            WallType::BombHole
        );
    }

    #[test]
    fn mixed_enemy_groups_read_from_rom() {
        let rom = TestRomBuilder::new()
            .set_mixed_enemy_group(0, &[Enemy::PolsVoice as u8, Enemy::RedKeese as u8])
            .build();
        let table = DataTable::new(&rom).unwrap();
        assert_eq!(
            table.mixed_enemy_group(Enemy::MixedEnemyGroup1),
            &[Enemy::PolsVoice, Enemy::RedKeese]
        );
        assert!(table.mixed_enemy_group(Enemy::MixedEnemyGroup2).is_empty());
        assert!(table.mixed_enemy_group(Enemy::TheBeast).is_empty());
    }

    #[test]
    fn named_region_values_flow_into_patch() {
        let rom = TestRomBuilder::new().build();
        let mut table = DataTable::new(&rom).unwrap();
        table
            .set_rom_data_value(RomDataType::WhiteSwordHeartRequirement, 6)
            .unwrap();
        assert_eq!(
            table
                .rom_data_value(RomDataType::WhiteSwordHeartRequirement)
                .unwrap(),
            6
        );
        let patch = table.build_patch();
        let spec = RomDataType::WhiteSwordHeartRequirement.spec();
        assert_eq!(patch.data(spec.file_offset), Some(&[0x50][..]));
    }

    #[test]
    fn overworld_enemy_data_round_trip() {
        let rom = TestRomBuilder::new().build();
        let mut table = DataTable::new(&rom).unwrap();
        table.set_overworld_enemy_data(0x21, 0xc5);
        assert_eq!(table.overworld_enemy_data(0x21), 0xc5);
        table.reset_to_vanilla();
        assert_eq!(table.overworld_enemy_data(0x21), 0x00);
    }

    #[test]
    fn start_screen_round_trip() {
        let rom = TestRomBuilder::new().build();
        let mut table = DataTable::new(&rom).unwrap();
        assert_eq!(table.start_screen(), 0x73);
        table.set_start_screen(0x2a);
        assert_eq!(table.start_screen(), 0x2a);
    }

    #[test]
    fn item_position_coordinates_flow_into_patch() {
        let rom = TestRomBuilder::new().build();
        let mut table = DataTable::new(&rom).unwrap();
        table.set_level_item_position_coordinates(4, [0x11, 0x22, 0x33, 0x44]);
        let patch = table.build_patch();
        let addr = rommap::LEVEL_INFO_START
            + 4 * rommap::LEVEL_INFO_SIZE
            + rommap::ITEM_POSITIONS_OFFSET;
        assert_eq!(patch.data(addr), Some(&[0x11, 0x22, 0x33, 0x44][..]));
    }

    #[test]
    fn write_only_regions_fall_back_to_defaults() {
        let rom = TestRomBuilder::new().build();
        let table = DataTable::new(&rom).unwrap();
        assert_eq!(
            table
                .rom_data_bytes(RomDataType::LostHillsDirections)
                .unwrap(),
            vec![0x08, 0x08, 0x08, 0x08]
        );
    }
}
