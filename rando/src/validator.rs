use failure::Error;
use log::{debug, info, warn};
use std::collections::BTreeSet;

use zelda1::{
    accessible_item_positions, CaveType, DataTable, Direction, Enemy, Item, LevelNum, Room,
    RoomAction, RoomNum, RoomType, ScreenNum, WallType, CAVE_POSITIONS, DUNGEON_LEVEL_NUMBERS,
    NUM_SCREENS,
};

use crate::flags::Flags;
use crate::inventory::Inventory;

/// The coast item sits on this shoreline screen.
const COAST_SCREEN: ScreenNum = 0x5f;

/// Item requirement guarding entry to an overworld screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Open,
    Bomb,
    Ladder,
    LadderBomb,
    Raft,
    RaftBomb,
    Candle,
    Recorder,
    PowerBracelet,
    PowerBraceletBomb,
    LostHillsHint,
    DeadWoodsHint,
}

/// First-quest screen gating.  Everything not listed is walkable from the
/// start.
fn base_block_type(screen_num: ScreenNum) -> BlockType {
    match screen_num {
        // Bombable cave mouths, including the level 9 entrance.
        0x05 | 0x07 | 0x13 | 0x16 | 0x1e | 0x26 | 0x27 | 0x2d | 0x67 | 0x71 | 0x78 | 0x7c => {
            BlockType::Bomb
        }
        // Burnable bushes, including the level 8 entrance.
        0x28 | 0x47 | 0x51 | 0x56 | 0x5b | 0x62 | 0x63 | 0x68 | 0x6d => BlockType::Candle,
        // Raft docks: the level 4 island and the northern heart island.
        0x45 | 0x55 => BlockType::Raft,
        // The level 7 pond drains for the recorder.
        0x42 => BlockType::Recorder,
        // Pushable boulder on the Death Mountain exit.
        0x11 => BlockType::PowerBracelet,
        _ => BlockType::Open,
    }
}

/// Decides whether the current DataTable permits a full playthrough: an
/// inventory fixed point over overworld access, cave pickups and per-level
/// dungeon walks.
pub struct Validator<'a> {
    data_table: &'a mut DataTable,
    flags: &'a Flags,
    inventory: Inventory,
    white_sword_hearts: u32,
    magical_sword_hearts: u32,
}

impl<'a> Validator<'a> {
    pub fn new(
        data_table: &'a mut DataTable,
        flags: &'a Flags,
        white_sword_hearts: u32,
        magical_sword_hearts: u32,
    ) -> Validator<'a> {
        Validator {
            data_table,
            flags,
            inventory: Inventory::new(),
            white_sword_hearts,
            magical_sword_hearts,
        }
    }

    fn block_type(&self, screen_num: ScreenNum) -> BlockType {
        if screen_num == COAST_SCREEN {
            return BlockType::Ladder;
        }
        if self.flags.randomize_lost_hills && (0x0b..=0x0d).contains(&screen_num) {
            return BlockType::LostHillsHint;
        }
        if self.flags.randomize_dead_woods && (0x70..=0x72).contains(&screen_num) {
            return BlockType::DeadWoodsHint;
        }
        if self.flags.extra_raft_blocks {
            match screen_num {
                0x34 | 0x44 | 0x0f | 0x0e | 0x1f => return BlockType::Raft,
                // Already bomb-blocked, so the raft comes on top.
                0x1e => return BlockType::RaftBomb,
                _ => (),
            }
        }
        if self.flags.extra_power_bracelet_blocks {
            match screen_num {
                0x00 | 0x01 | 0x02 | 0x03 | 0x10 | 0x12 | 0x13 => {
                    return BlockType::PowerBraceletBomb;
                }
                _ => (),
            }
        }
        base_block_type(screen_num)
    }

    fn can_access_screen(&self, screen_num: ScreenNum) -> bool {
        match self.block_type(screen_num) {
            BlockType::Open => true,
            // Bombs are farmed from enemies, so a weapon stands in for them.
            BlockType::Bomb => self.inventory.has_sword_or_wand(),
            BlockType::Ladder => self.inventory.has(Item::Ladder),
            BlockType::LadderBomb => {
                self.inventory.has_sword_or_wand() && self.inventory.has(Item::Ladder)
            }
            BlockType::Raft => self.inventory.has(Item::Raft),
            BlockType::RaftBomb => {
                self.inventory.has_sword_or_wand() && self.inventory.has(Item::Raft)
            }
            BlockType::Candle => self.inventory.has_candle(),
            BlockType::Recorder => self.inventory.has(Item::Recorder),
            BlockType::PowerBracelet => self.inventory.has(Item::PowerBracelet),
            BlockType::PowerBraceletBomb => {
                self.inventory.has_sword_or_wand() && self.inventory.has(Item::PowerBracelet)
            }
            BlockType::LostHillsHint => self.inventory.has(Item::LostHillsHint),
            BlockType::DeadWoodsHint => self.inventory.has(Item::DeadWoodsHint),
        }
    }

    /// Reachable destinations in screen order, deduplicated.  Visiting a
    /// hint region grants its virtual item even when the destination was
    /// already seen.
    fn accessible_destinations(&mut self) -> Vec<CaveType> {
        let mut seen = BTreeSet::new();
        let mut destinations = Vec::new();

        for screen_num in 0..NUM_SCREENS as u8 {
            if !self.can_access_screen(screen_num) {
                continue;
            }
            let destination = if screen_num == COAST_SCREEN {
                CaveType::CoastItem
            } else if screen_num == self.data_table.armos_item_screen() {
                CaveType::ArmosItem
            } else {
                self.data_table.screen_destination(screen_num)
            };
            if destination == CaveType::None {
                continue;
            }

            if destination == CaveType::LostHillsHint {
                self.inventory
                    .add_item(Item::LostHillsHint, destination as u8, 1);
            }
            if destination == CaveType::DeadWoodsHint {
                self.inventory
                    .add_item(Item::DeadWoodsHint, destination as u8, 1);
            }

            if seen.insert(destination) {
                destinations.push(destination);
            }
        }
        destinations
    }

    pub fn is_seed_valid(&mut self) -> Result<bool, Error> {
        debug!("starting seed validation");

        if !self.flags.dont_guarantee_starting_sword_or_wand
            && !self.has_accessible_sword_or_wand()
        {
            info!("no sword or wand reachable from an open screen");
            return Ok(false);
        }

        // A level whose entrance screen number equals its start room number
        // corrupts the entry transition.
        for level_num in DUNGEON_LEVEL_NUMBERS {
            let start_room = self.data_table.level_start_room(level_num);
            for screen_num in 0..NUM_SCREENS as u8 {
                let destination = self.data_table.screen_destination(screen_num);
                if destination.level_num() == Some(level_num) {
                    if screen_num == start_room {
                        warn!(
                            "invalid seed: level {} start room {:#04x} equals its entrance screen",
                            level_num, start_room
                        );
                        return Ok(false);
                    }
                    break;
                }
            }
        }

        self.inventory.reset();
        self.inventory.set_still_making_progress();
        let mut iterations = 0;

        while self.inventory.still_making_progress() {
            iterations += 1;
            self.inventory.clear_making_progress();
            self.data_table.clear_all_visit_markers();

            for destination in self.accessible_destinations() {
                if let Some(level_num) = destination.level_num() {
                    if level_num == 9 && self.inventory.triforce_count() < 8 {
                        debug!(
                            "level 9 skipped: {} of 8 triforces",
                            self.inventory.triforce_count()
                        );
                        continue;
                    }
                    self.process_level(level_num)?;
                } else if self.can_get_items_from_cave(destination) {
                    for position in CAVE_POSITIONS {
                        let item = self.data_table.cave_item(destination, position);
                        self.inventory.add_item(item, destination as u8, position);
                    }
                }
            }

            if iterations > 100 {
                warn!("validation exceeded 100 iterations without converging");
                return Ok(false);
            }
        }

        if !self.inventory.has(Item::KidnappedRescued) {
            info!("seed invalid: the kidnapped is never rescued");
            return Ok(false);
        }
        if !self.has_all_important_items() {
            info!("seed invalid: rescued but important items are unreachable");
            return Ok(false);
        }
        info!("seed is valid");
        Ok(true)
    }

    fn can_get_items_from_cave(&self, cave_type: CaveType) -> bool {
        match cave_type {
            CaveType::WhiteSwordCave => {
                self.inventory.heart_count() as u32 >= self.white_sword_hearts
            }
            CaveType::MagicalSwordCave => {
                self.inventory.heart_count() as u32 >= self.magical_sword_hearts
            }
            CaveType::PotionShop => self.inventory.has(Item::Letter),
            CaveType::CoastItem => self.inventory.has(Item::Ladder),
            // The armos statue can end up behind the new raft blocks.
            CaveType::ArmosItem => {
                !self.flags.extra_raft_blocks || self.inventory.has(Item::Raft)
            }
            _ => true,
        }
    }

    /// Walks a dungeon from its entrance.  State is keyed by (room, entry
    /// direction) because chute rooms admit different exits per entry.
    fn process_level(&mut self, level_num: LevelNum) -> Result<(), Error> {
        let mut visited: BTreeSet<(RoomNum, Direction)> = BTreeSet::new();
        let mut rooms_to_visit = vec![(
            self.data_table.level_start_room(level_num),
            self.data_table.level_entrance_direction(level_num),
        )];

        while let Some((room_num, entry_direction)) = rooms_to_visit.pop() {
            if !visited.insert((room_num, entry_direction)) {
                continue;
            }
            let new_rooms = self.visit_room(level_num, room_num, entry_direction)?;
            rooms_to_visit.extend(new_rooms);
        }
        Ok(())
    }

    fn visit_room(
        &mut self,
        level_num: LevelNum,
        room_num: RoomNum,
        entry_direction: Direction,
    ) -> Result<Vec<(RoomNum, Direction)>, Error> {
        let room = *self.data_table.room(level_num, room_num);
        debug!("visiting level {} room {:#04x}", level_num, room_num);

        // Items are collected once per room, not once per entry direction.
        if !room.is_visited() {
            self.data_table.room_mut(level_num, room_num).mark_visited();
            let can_collect = self.can_get_room_item(entry_direction, &room)?;
            if can_collect && room.has_item()? {
                self.inventory.add_item(room.item(), level_num, room_num);
            }
            if room.has_the_beast() && can_collect {
                self.inventory
                    .add_item(Item::BeastDefeated, level_num, room_num);
            }
            if self.room_enemy_is(&room, Enemy::TheKidnapped) {
                self.inventory
                    .add_item(Item::KidnappedRescued, level_num, room_num);
            }
        }

        let mut new_rooms = Vec::new();
        for &exit_direction in &Direction::CARDINALS {
            if self.can_move(entry_direction, exit_direction, level_num, room_num, &room)? {
                if let Some(neighbor) = exit_direction.neighbor(room_num) {
                    new_rooms.push((neighbor, exit_direction.inverse()));
                }
            }
        }

        if !room.has_staircase()? {
            return Ok(new_rooms);
        }

        for stairway_room_num in self.data_table.level_staircase_rooms(level_num) {
            let stairway_room = *self.data_table.room(level_num, stairway_room_num);
            let left_exit = stairway_room.left_exit();
            let right_exit = stairway_room.right_exit();

            if left_exit == room_num && right_exit == room_num {
                self.inventory
                    .add_item(stairway_room.item(), level_num, stairway_room_num);
            } else if left_exit == room_num && right_exit != room_num {
                new_rooms.push((right_exit, Direction::Staircase));
                break;
            } else if right_exit == room_num && left_exit != room_num {
                new_rooms.push((left_exit, Direction::Staircase));
                break;
            }
        }
        Ok(new_rooms)
    }

    fn room_enemy_is(&self, room: &Room, enemy: Enemy) -> bool {
        room.enemy().map(|e| e == enemy).unwrap_or(false)
    }

    /// Whether the room's item can be picked up when entering from the given
    /// direction: the drop must be reachable (water/chute partitioning) and
    /// drop-bit items need the room cleared first.
    fn can_get_room_item(&self, entry_direction: Direction, room: &Room) -> Result<bool, Error> {
        if room.has_drop_bit() && !self.can_defeat_enemies(room)? {
            return Ok(false);
        }
        let room_type = room.room_type()?;
        if room_type.is_staircase_room() {
            return Ok(true);
        }
        let reachable = accessible_item_positions(
            room_type,
            entry_direction,
            self.inventory.has(Item::Ladder),
        );
        Ok(reachable.contains(&room.item_position()))
    }

    fn actual_enemies(&self, enemy: Enemy) -> Vec<Enemy> {
        if enemy.is_mixed_enemy_group() {
            self.data_table.mixed_enemy_group(enemy).to_vec()
        } else {
            vec![enemy]
        }
    }

    fn contains_enemy(&self, room_enemy: Enemy, candidates: &[Enemy]) -> bool {
        self.actual_enemies(room_enemy)
            .iter()
            .any(|enemy| candidates.contains(enemy))
    }

    fn can_defeat_enemies(&self, room: &Room) -> Result<bool, Error> {
        if room.has_no_enemies_to_kill() {
            return Ok(true);
        }
        let room_enemy = room.enemy()?;
        let actual = self.actual_enemies(room_enemy);

        if room.has_the_beast() && !self.inventory.has_bow_silver_arrows_and_sword() {
            return Ok(false);
        }
        if room.has_digdogger() && !self.inventory.has_recorder_and_reusable_weapon() {
            return Ok(false);
        }
        if room.has_gohma() && !self.inventory.has_bow_and_arrows() {
            return Ok(false);
        }
        if self.contains_enemy(room_enemy, &[Enemy::RedWizzrobe, Enemy::BlueWizzrobe])
            && !self.inventory.has_sword()
        {
            return Ok(false);
        }
        if room_enemy.is_gleeok_or_patra() && !self.inventory.has_sword_or_wand() {
            return Ok(false);
        }
        let all_zero_hp = !actual.is_empty() && actual.iter().all(|enemy| enemy.has_zero_hp());
        if all_zero_hp && !self.inventory.has_reusable_weapon_or_boomerang() {
            return Ok(false);
        }
        if room.has_hungry_goriya() && !self.inventory.has(Item::Bait) {
            return Ok(false);
        }
        if self.contains_enemy(room_enemy, &[Enemy::PolsVoice])
            && !(self.inventory.has_sword_or_wand() || self.inventory.has_bow_and_arrows())
        {
            return Ok(false);
        }
        if self.flags.avoid_required_hard_combat
            && self.contains_enemy(
                room_enemy,
                &[
                    Enemy::Gleeok1,
                    Enemy::Gleeok2,
                    Enemy::Gleeok3,
                    Enemy::Gleeok4,
                    Enemy::Patra1,
                    Enemy::Patra2,
                    Enemy::BlueDarknut,
                    Enemy::BlueWizzrobe,
                ],
            )
            && !(self.inventory.has_ring() && self.inventory.has(Item::WhiteSword))
        {
            return Ok(false);
        }

        Ok(self.inventory.has_reusable_weapon())
    }

    /// Layouts that separate their doors regardless of inventory.
    fn path_unconditionally_obstructed(
        room_type: RoomType,
        entry: Direction,
        exit: Direction,
    ) -> bool {
        let along = |direction: Direction, axis: [Direction; 2]| {
            direction == axis[0] || direction == axis[1] || direction == Direction::Staircase
        };
        match room_type {
            // The chute is a corridor; its side doors only lead back out.
            RoomType::VerticalChuteRoom => {
                if along(entry, [Direction::North, Direction::South]) {
                    !along(exit, [Direction::North, Direction::South])
                } else {
                    exit != entry
                }
            }
            RoomType::HorizontalChuteRoom => {
                if along(entry, [Direction::West, Direction::East]) {
                    !along(exit, [Direction::West, Direction::East])
                } else {
                    exit != entry
                }
            }
            // The T's stem never touches the north door.
            RoomType::TRoom => entry == Direction::North || exit == Direction::North,
            _ => false,
        }
    }

    /// Water partitions per moat layout; the ladder bridges everything.
    fn path_obstructed_by_water(
        room_type: RoomType,
        entry: Direction,
        exit: Direction,
        has_ladder: bool,
    ) -> bool {
        if has_ladder {
            return false;
        }
        let region = |direction: Direction| -> u8 {
            match room_type {
                RoomType::VerticalMoatRoom => (direction == Direction::East) as u8,
                RoomType::HorizontalMoatRoom => (direction == Direction::North) as u8,
                RoomType::DoubleMoatRoom => match direction {
                    Direction::North => 1,
                    Direction::South => 2,
                    _ => 0,
                },
                RoomType::LavaMoatRoom => match direction {
                    Direction::West => 1,
                    Direction::North | Direction::East => 2,
                    _ => 0,
                },
                _ => 0,
            }
        };
        match room_type {
            RoomType::VerticalMoatRoom
            | RoomType::HorizontalMoatRoom
            | RoomType::DoubleMoatRoom
            | RoomType::LavaMoatRoom => region(entry) != region(exit),
            _ => false,
        }
    }

    fn can_move(
        &mut self,
        entry_direction: Direction,
        exit_direction: Direction,
        level_num: LevelNum,
        room_num: RoomNum,
        room: &Room,
    ) -> Result<bool, Error> {
        let room_type = room.room_type()?;
        if Self::path_unconditionally_obstructed(room_type, entry_direction, exit_direction) {
            return Ok(false);
        }
        if Self::path_obstructed_by_water(
            room_type,
            entry_direction,
            exit_direction,
            self.inventory.has(Item::Ladder),
        ) {
            return Ok(false);
        }

        // The hungry NPC has no shutter; he just won't budge northward until
        // fed.
        if exit_direction == Direction::North
            && room.has_hungry_goriya()
            && !self.inventory.has(Item::Bait)
        {
            debug!("the hungry NPC is still hungry");
            return Ok(false);
        }

        let wall_type = room.wall_type(exit_direction);

        if wall_type == WallType::ShutterDoor {
            if room.room_action() == RoomAction::TriforceOfPowerOpensShutters {
                return Ok(self.inventory.has(Item::BeastDefeated));
            }
            if !self.can_defeat_enemies(room)? {
                return Ok(false);
            }
        }

        if wall_type == WallType::SolidWall {
            return Ok(false);
        }

        if wall_type.is_locked_door()
            && !self
                .inventory
                .door_already_opened(level_num, room_num, exit_direction)
        {
            if !self.inventory.has_key() {
                return Ok(false);
            }
            self.inventory.use_key(level_num, room_num, exit_direction);
        }

        if wall_type == WallType::BombHole && !self.inventory.has_sword_or_wand() {
            return Ok(false);
        }

        Ok(true)
    }

    /// Unless disabled, either the wood-sword cave or the letter cave must
    /// sit behind an open screen and contain a starting weapon.
    fn has_accessible_sword_or_wand(&self) -> bool {
        for screen_num in 0..NUM_SCREENS as u8 {
            if self.block_type(screen_num) != BlockType::Open {
                continue;
            }
            let destination = self.data_table.screen_destination(screen_num);
            if destination != CaveType::WoodSwordCave && destination != CaveType::LetterCave {
                continue;
            }
            for position in CAVE_POSITIONS {
                if self
                    .data_table
                    .cave_item(destination, position)
                    .is_sword_or_wand()
                {
                    return true;
                }
            }
        }
        false
    }

    fn has_all_important_items(&self) -> bool {
        const IMPORTANT_ITEMS: [Item; 23] = [
            Item::WoodSword,
            Item::WhiteSword,
            Item::MagicalSword,
            Item::Bait,
            Item::Recorder,
            Item::BlueCandle,
            Item::RedCandle,
            Item::WoodArrows,
            Item::SilverArrows,
            Item::Bow,
            Item::MagicalKey,
            Item::Raft,
            Item::Ladder,
            Item::Wand,
            Item::Book,
            Item::BlueRing,
            Item::RedRing,
            Item::PowerBracelet,
            Item::Letter,
            Item::WoodBoomerang,
            Item::MagicalBoomerang,
            Item::LostHillsHint,
            Item::DeadWoodsHint,
        ];
        for item in IMPORTANT_ITEMS.iter() {
            if !self.inventory.has(*item) {
                warn!("seed is missing {:?}", item);
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
pub mod tests_support {
    use zelda1::data_table::testdata::TestRomBuilder;
    use zelda1::{CaveType, Enemy, Item};

    pub fn cave_bytes(items: [Item; 3]) -> [u8; 6] {
        [
            items[0] as u8,
            items[1] as u8,
            items[2] as u8,
            0x00,
            0x00,
            0x00,
        ]
    }

    /// A tiny but fully completable world: every important item sits in an
    /// open-screen cave, the hint regions are reachable, and level 1 holds
    /// the kidnapped two rooms in.
    pub fn completable_world() -> TestRomBuilder {
        let mut builder = TestRomBuilder::new();
        builder
            .set_screen_destination(0x30, CaveType::WoodSwordCave as u8)
            .set_screen_destination(0x31, CaveType::TakeAny as u8)
            .set_screen_destination(0x32, CaveType::Shop1 as u8)
            .set_screen_destination(0x33, CaveType::Shop2 as u8)
            .set_screen_destination(0x35, CaveType::Shop3 as u8)
            .set_screen_destination(0x36, CaveType::Shop4 as u8)
            .set_screen_destination(0x37, CaveType::MoneyMakingGame as u8)
            .set_screen_destination(0x38, CaveType::LostHillsHint as u8)
            .set_screen_destination(0x39, CaveType::DeadWoodsHint as u8)
            .set_screen_destination(0x3a, CaveType::Level1 as u8)
            .set_cave_data(
                0x00,
                cave_bytes([Item::WoodSword, Item::WhiteSword, Item::MagicalSword]),
            )
            .set_cave_data(
                0x01,
                cave_bytes([Item::Letter, Item::WoodBoomerang, Item::MagicalBoomerang]),
            )
            .set_cave_data(
                0x0d,
                cave_bytes([Item::Bait, Item::Recorder, Item::BlueCandle]),
            )
            .set_cave_data(
                0x0e,
                cave_bytes([Item::RedCandle, Item::WoodArrows, Item::SilverArrows]),
            )
            .set_cave_data(0x0f, cave_bytes([Item::Bow, Item::MagicalKey, Item::Raft]))
            .set_cave_data(0x10, cave_bytes([Item::Ladder, Item::Wand, Item::Book]))
            .set_cave_data(
                0x06,
                cave_bytes([Item::BlueRing, Item::RedRing, Item::PowerBracelet]),
            )
            // Level 1: entrance, then the kidnapped one room north.
            .set_level_start_room(1, 0x73)
            .set_room(1, 0x73, [0x04, 0x24, 0x00, 0x21, 0x0e, 0x00])
            .set_room(
                1,
                0x63,
                [0x24, 0x24, Enemy::TheKidnapped as u8, 0x00, 0x0e, 0x00],
            );
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::{cave_bytes, completable_world};
    use super::*;
    use zelda1::data_table::testdata::TestRomBuilder;
    use zelda1::Cave;

    fn validator_flags() -> Flags {
        let mut flags = Flags::default();
        flags.dont_guarantee_starting_sword_or_wand = true;
        flags
    }

    #[test]
    fn chute_rooms_obstruct_perpendicular_travel() {
        assert!(Validator::path_unconditionally_obstructed(
            RoomType::VerticalChuteRoom,
            Direction::East,
            Direction::North
        ));
        assert!(!Validator::path_unconditionally_obstructed(
            RoomType::VerticalChuteRoom,
            Direction::North,
            Direction::South
        ));
        assert!(!Validator::path_unconditionally_obstructed(
            RoomType::VerticalChuteRoom,
            Direction::East,
            Direction::East
        ));
        assert!(Validator::path_unconditionally_obstructed(
            RoomType::TRoom,
            Direction::South,
            Direction::North
        ));
        assert!(!Validator::path_unconditionally_obstructed(
            RoomType::TRoom,
            Direction::West,
            Direction::East
        ));
    }

    #[test]
    fn moat_rooms_need_the_ladder_to_cross() {
        assert!(Validator::path_obstructed_by_water(
            RoomType::HorizontalMoatRoom,
            Direction::South,
            Direction::North,
            false
        ));
        assert!(!Validator::path_obstructed_by_water(
            RoomType::HorizontalMoatRoom,
            Direction::South,
            Direction::North,
            true
        ));
        assert!(!Validator::path_obstructed_by_water(
            RoomType::HorizontalMoatRoom,
            Direction::West,
            Direction::East,
            false
        ));
        assert!(Validator::path_obstructed_by_water(
            RoomType::DoubleMoatRoom,
            Direction::North,
            Direction::South,
            false
        ));
        assert!(!Validator::path_obstructed_by_water(
            RoomType::PlainRoom,
            Direction::North,
            Direction::South,
            false
        ));
    }

    #[test]
    fn locked_doors_need_and_spend_keys() {
        let mut builder = TestRomBuilder::new();
        // Room with a locked north door (wall code 5).
        builder.set_room(1, 0x44, [0xa4, 0x00, 0x00, 0x00, 0x0e, 0x00]);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = validator_flags();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);

        let room = *validator.data_table.room(1, 0x44);
        assert!(!validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());

        validator.inventory.add_item(Item::Key, 1, 0x50);
        assert!(validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());
        // The same door never charges twice.
        assert!(validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());
        // A different locked door has no key left to consume.
        let other = *validator.data_table.room(1, 0x44);
        assert!(validator
            .can_move(Direction::South, Direction::North, 1, 0x45, &other)
            .unwrap()
            == false);
    }

    #[test]
    fn shutter_doors_follow_the_room_action() {
        let mut builder = TestRomBuilder::new();
        // North shutter (wall code 7), beast-gated room action 3.
        builder.set_room(1, 0x44, [0xe4, 0x00, 0x00, 0x00, 0x0e, 0x03]);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = validator_flags();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        let room = *validator.data_table.room(1, 0x44);

        assert!(!validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());
        validator.inventory.add_item(Item::BeastDefeated, 9, 0x30);
        assert!(validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());
    }

    #[test]
    fn hungry_npc_blocks_north_until_fed() {
        let mut builder = TestRomBuilder::new();
        builder.set_room(
            1,
            0x44,
            [0x00, 0x00, Enemy::HungryGoriya as u8, 0x00, 0x0e, 0x00],
        );
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = validator_flags();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        let room = *validator.data_table.room(1, 0x44);

        assert!(!validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());
        // East is open regardless.
        assert!(validator
            .can_move(Direction::South, Direction::East, 1, 0x44, &room)
            .unwrap());
        validator.inventory.add_item(Item::Bait, 0x1f, 1);
        assert!(validator
            .can_move(Direction::South, Direction::North, 1, 0x44, &room)
            .unwrap());
    }

    #[test]
    fn boss_combat_requirements() {
        let mut builder = TestRomBuilder::new();
        builder.set_room(1, 0x40, [0x24, 0x24, Enemy::TheBeast as u8, 0x00, 0x0e, 0x00]);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = validator_flags();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        let room = *validator.data_table.room(1, 0x40);

        assert!(!validator.can_defeat_enemies(&room).unwrap());
        validator.inventory.add_item(Item::WoodSword, 0x10, 2);
        validator.inventory.add_item(Item::Bow, 1, 1);
        validator.inventory.add_item(Item::SilverArrows, 1, 2);
        assert!(validator.can_defeat_enemies(&room).unwrap());
    }

    #[test]
    fn cave_entry_gating() {
        let builder = TestRomBuilder::new();
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = validator_flags();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);

        assert!(!validator.can_get_items_from_cave(CaveType::WhiteSwordCave));
        assert!(!validator.can_get_items_from_cave(CaveType::CoastItem));
        assert!(!validator.can_get_items_from_cave(CaveType::PotionShop));
        assert!(validator.can_get_items_from_cave(CaveType::Shop1));

        validator.inventory.add_item(Item::HeartContainer, 1, 1);
        validator.inventory.add_item(Item::HeartContainer, 1, 2);
        assert!(validator.can_get_items_from_cave(CaveType::WhiteSwordCave));
        validator.inventory.add_item(Item::Ladder, 1, 3);
        assert!(validator.can_get_items_from_cave(CaveType::CoastItem));
        validator.inventory.add_item(Item::Letter, 1, 4);
        assert!(validator.can_get_items_from_cave(CaveType::PotionShop));
    }

    #[test]
    fn completable_world_validates() {
        let mut data_table = DataTable::new(&completable_world().build()).unwrap();
        let flags = Flags::default();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        assert!(validator.is_seed_valid().unwrap());
    }

    #[test]
    fn world_without_the_kidnapped_fails() {
        let mut builder = completable_world();
        builder.set_room(1, 0x63, [0x24, 0x24, 0x00, 0x00, 0x0e, 0x00]);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = Flags::default();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        assert!(!validator.is_seed_valid().unwrap());
    }

    #[test]
    fn missing_important_item_fails() {
        let mut builder = completable_world();
        // Drop the ladder out of the world.
        builder.set_cave_data(0x10, cave_bytes([Item::Rupee, Item::Wand, Item::Book]));
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = Flags::default();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        assert!(!validator.is_seed_valid().unwrap());
    }

    #[test]
    fn sword_guarantee_check_requires_an_open_weapon_cave() {
        let mut builder = TestRomBuilder::new();
        // The wood sword cave exists but only behind a bomb screen.
        builder
            .set_screen_destination(0x07, CaveType::WoodSwordCave as u8)
            .set_cave_data(0x00, cave_bytes([Item::Rupee, Item::WoodSword, Item::Rupee]));
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = Flags::default();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        assert!(!validator.is_seed_valid().unwrap());
    }

    #[test]
    fn entrance_screen_matching_start_room_fails() {
        let mut builder = completable_world();
        // Move level 1's entrance onto the screen numbered like its start
        // room.
        builder.set_screen_destination(0x3a, CaveType::None as u8);
        builder.set_screen_destination(0x73, CaveType::Level1 as u8);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = Flags::default();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        assert!(!validator.is_seed_valid().unwrap());
    }

    #[test]
    fn coast_item_requires_ladder_first() {
        // The coast holds the only ladder: it can never be picked up.
        let mut builder = completable_world();
        builder.set_cave_data(0x10, cave_bytes([Item::Rupee, Item::Wand, Item::Book]));
        builder.set_byte(zelda1::rommap::COAST_ITEM_ADDRESS, Item::Ladder as u8);
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let flags = Flags::default();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        assert!(!validator.is_seed_valid().unwrap());
    }

    #[test]
    fn take_any_heart_containers_do_not_satisfy_sword_caves() {
        let builder = TestRomBuilder::new();
        let mut data_table = DataTable::new(&builder.build()).unwrap();
        let cave = Cave::new([0x3f, Item::HeartContainer as u8, 0x3f, 0, 0, 0]);
        assert_eq!(cave.item(2), Item::HeartContainer);
        let flags = validator_flags();
        let mut validator = Validator::new(&mut data_table, &flags, 5, 12);
        validator
            .inventory
            .add_item(Item::HeartContainer, CaveType::TakeAny as u8, 1);
        assert_eq!(validator.inventory.heart_count(), 3);
    }
}
