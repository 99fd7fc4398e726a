use std::collections::BTreeSet;

use log::debug;

use zelda1::{CaveType, Direction, Item, LevelNum, RoomNum};

const MAX_HEART_CONTAINERS: u8 = 16;

/// The validator's model of the player's holdings.  Tracks items, hearts,
/// keys, per-level triforces, and which locked doors already consumed a key
/// so revisits are free.
pub struct Inventory {
    items: BTreeSet<Item>,
    item_locations: BTreeSet<(u8, u8)>,
    keys_used: BTreeSet<(LevelNum, RoomNum, Direction)>,
    num_heart_containers: u8,
    num_keys: u32,
    triforce_levels: Vec<LevelNum>,
    still_making_progress: bool,
}

impl Inventory {
    pub fn new() -> Inventory {
        Inventory {
            items: BTreeSet::new(),
            item_locations: BTreeSet::new(),
            keys_used: BTreeSet::new(),
            num_heart_containers: 3,
            num_keys: 0,
            triforce_levels: Vec::new(),
            still_making_progress: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Inventory::new();
    }

    pub fn set_still_making_progress(&mut self) {
        self.still_making_progress = true;
    }

    pub fn clear_making_progress(&mut self) {
        self.still_making_progress = false;
    }

    pub fn still_making_progress(&self) -> bool {
        self.still_making_progress
    }

    /// Adds an item found at a location.  `location_type` is a level number
    /// (1-9) or a CaveType code; `sub_location` a room number or cave
    /// position.  Each location grants its item once.
    pub fn add_item(&mut self, item: Item, location_type: u8, sub_location: u8) {
        match item {
            Item::OverworldNoItem
            | Item::Map
            | Item::Compass
            | Item::MagicalShield
            | Item::Bombs
            | Item::FiveRupees
            | Item::SingleHeart
            | Item::TriforceOfPower => return,
            _ => (),
        }

        let unique_id = (location_type, sub_location);
        if self.item_locations.contains(&unique_id) && item != Item::KidnappedRescued {
            return;
        }
        self.item_locations.insert(unique_id);
        self.set_still_making_progress();

        match item {
            Item::HeartContainer => {
                // Take-Any rooms trade hearts for choices; their containers
                // don't count.
                if location_type == CaveType::TakeAny as u8 {
                    return;
                }
                if self.num_heart_containers < MAX_HEART_CONTAINERS {
                    self.num_heart_containers += 1;
                }
                debug!(
                    "found heart container; now have {}",
                    self.num_heart_containers
                );
                return;
            }
            Item::Triforce => {
                if !self.triforce_levels.contains(&location_type) {
                    self.triforce_levels.push(location_type);
                    debug!(
                        "found triforce in level {}; now have {}",
                        location_type,
                        self.triforce_levels.len()
                    );
                }
                return;
            }
            Item::Key => {
                self.num_keys += 1;
                return;
            }
            _ => (),
        }

        debug!("found {:?}", item);

        // Progressive pickups: a repeat of a base item upgrades the family.
        if item == Item::WoodSword && self.items.contains(&Item::WhiteSword) {
            self.items.insert(Item::MagicalSword);
        } else if item == Item::WoodSword && self.items.contains(&Item::WoodSword) {
            self.items.insert(Item::WhiteSword);
        } else if item == Item::BlueRing && self.items.contains(&Item::BlueRing) {
            self.items.insert(Item::RedRing);
        } else if item == Item::BlueCandle && self.items.contains(&Item::BlueCandle) {
            self.items.insert(Item::RedCandle);
        } else if item == Item::WoodArrows && self.items.contains(&Item::WoodArrows) {
            self.items.insert(Item::SilverArrows);
        } else {
            self.items.insert(item);
        }
    }

    pub fn has(&self, item: Item) -> bool {
        self.items.contains(&item)
    }

    pub fn heart_count(&self) -> u8 {
        self.num_heart_containers
    }

    pub fn triforce_count(&self) -> usize {
        self.triforce_levels.len()
    }

    pub fn has_key(&self) -> bool {
        self.has(Item::MagicalKey) || self.num_keys > 0
    }

    /// A door opened once stays open; revisits are free.
    pub fn door_already_opened(
        &self,
        level_num: LevelNum,
        room_num: RoomNum,
        exit: Direction,
    ) -> bool {
        self.keys_used.contains(&(level_num, room_num, exit))
    }

    /// Spends a key at a door unless the magical key is owned or this exact
    /// door was already opened.
    pub fn use_key(&mut self, level_num: LevelNum, room_num: RoomNum, exit: Direction) {
        if self.has(Item::MagicalKey) {
            return;
        }
        if self.keys_used.contains(&(level_num, room_num, exit)) {
            return;
        }
        if self.num_keys > 0 {
            self.num_keys -= 1;
            self.keys_used.insert((level_num, room_num, exit));
        }
    }

    pub fn has_sword(&self) -> bool {
        self.has(Item::WoodSword) || self.has(Item::WhiteSword)
    }

    pub fn has_sword_or_wand(&self) -> bool {
        self.has_sword() || self.has(Item::Wand)
    }

    pub fn has_reusable_weapon(&self) -> bool {
        self.has_sword_or_wand() || self.has(Item::RedCandle)
    }

    pub fn has_reusable_weapon_or_boomerang(&self) -> bool {
        self.has_reusable_weapon() || self.has_boomerang()
    }

    pub fn has_recorder_and_reusable_weapon(&self) -> bool {
        self.has(Item::Recorder) && self.has_reusable_weapon()
    }

    pub fn has_bow_and_arrows(&self) -> bool {
        self.has(Item::Bow) && (self.has(Item::WoodArrows) || self.has(Item::SilverArrows))
    }

    pub fn has_bow_silver_arrows_and_sword(&self) -> bool {
        self.has_sword() && self.has(Item::Bow) && self.has(Item::SilverArrows)
    }

    pub fn has_candle(&self) -> bool {
        self.has(Item::BlueCandle) || self.has(Item::RedCandle)
    }

    pub fn has_boomerang(&self) -> bool {
        self.has(Item::WoodBoomerang) || self.has(Item::MagicalBoomerang)
    }

    pub fn has_ring(&self) -> bool {
        self.has(Item::BlueRing) || self.has(Item::RedRing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_three_hearts() {
        let inventory = Inventory::new();
        assert_eq!(inventory.heart_count(), 3);
        assert!(!inventory.still_making_progress());
    }

    #[test]
    fn location_grants_only_once() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::Key, 1, 0x10);
        inventory.add_item(Item::Key, 1, 0x10);
        inventory.add_item(Item::Key, 1, 0x11);
        assert!(inventory.has_key());
        inventory.use_key(1, 0x20, Direction::North);
        inventory.use_key(1, 0x21, Direction::North);
        assert!(!inventory.has_key());
    }

    #[test]
    fn key_is_not_double_charged_for_the_same_door() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::Key, 1, 0x10);
        inventory.use_key(2, 0x33, Direction::East);
        inventory.use_key(2, 0x33, Direction::East);
        assert_eq!(inventory.num_keys, 0);
        // A different direction through the same room is a different door.
        inventory.add_item(Item::Key, 1, 0x11);
        inventory.use_key(2, 0x33, Direction::North);
        assert_eq!(inventory.num_keys, 0);
    }

    #[test]
    fn magical_key_never_depletes() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::MagicalKey, 1, 0x10);
        for room in 0..50 {
            inventory.use_key(1, room, Direction::North);
            assert!(inventory.has_key());
        }
    }

    #[test]
    fn progressive_sword_upgrades() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::WoodSword, 0x10, 2);
        assert!(inventory.has_sword());
        assert!(!inventory.has(Item::WhiteSword));
        inventory.add_item(Item::WoodSword, 0x12, 2);
        assert!(inventory.has(Item::WhiteSword));
        inventory.add_item(Item::WoodSword, 0x13, 2);
        assert!(inventory.has(Item::MagicalSword));
    }

    #[test]
    fn progressive_candle_ring_arrow_upgrades() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::BlueCandle, 1, 1);
        inventory.add_item(Item::BlueCandle, 1, 2);
        assert!(inventory.has(Item::RedCandle));
        inventory.add_item(Item::BlueRing, 2, 1);
        inventory.add_item(Item::BlueRing, 2, 2);
        assert!(inventory.has(Item::RedRing));
        inventory.add_item(Item::WoodArrows, 3, 1);
        inventory.add_item(Item::WoodArrows, 3, 2);
        assert!(inventory.has(Item::SilverArrows));
    }

    #[test]
    fn take_any_heart_containers_do_not_count() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::HeartContainer, CaveType::TakeAny as u8, 1);
        assert_eq!(inventory.heart_count(), 3);
        inventory.add_item(Item::HeartContainer, 4, 0x60);
        assert_eq!(inventory.heart_count(), 4);
    }

    #[test]
    fn triforce_counts_per_level() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::Triforce, 1, 0x30);
        inventory.add_item(Item::Triforce, 1, 0x31);
        inventory.add_item(Item::Triforce, 2, 0x30);
        assert_eq!(inventory.triforce_count(), 2);
    }

    #[test]
    fn ignored_items_make_no_progress() {
        let mut inventory = Inventory::new();
        inventory.add_item(Item::Map, 1, 0x10);
        inventory.add_item(Item::TriforceOfPower, 9, 0x42);
        assert!(!inventory.still_making_progress());
    }
}
