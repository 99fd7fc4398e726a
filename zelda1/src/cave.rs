use num::FromPrimitive;
use serde::Serialize;

use crate::Item;

/// Six bytes of cave state: three item fields followed by three price
/// fields.  Positions are 1-indexed, matching how the game numbers the cave
/// slots.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Cave {
    data: [u8; 6],
}

impl Cave {
    pub fn new(data: [u8; 6]) -> Cave {
        Cave { data }
    }

    pub fn item(&self, position: u8) -> Item {
        debug_assert!((1..=3).contains(&position));
        let code = self.data[position as usize - 1] & 0x3f;
        Item::from_u8(code).unwrap_or(Item::OverworldNoItem)
    }

    /// The two highest bits of each item byte are opaque display state and
    /// survive every write.
    pub fn set_item(&mut self, position: u8, item: Item) {
        debug_assert!((1..=3).contains(&position));
        let index = position as usize - 1;
        self.data[index] = (self.data[index] & 0xc0) | (item as u8 & 0x3f);
    }

    pub fn price(&self, position: u8) -> u8 {
        debug_assert!((1..=3).contains(&position));
        self.price_data()[position as usize - 1]
    }

    pub fn set_price(&mut self, position: u8, price: u8) {
        debug_assert!((1..=3).contains(&position));
        self.data[position as usize + 2] = price;
    }

    pub fn item_data(&self) -> [u8; 3] {
        [self.data[0], self.data[1], self.data[2]]
    }

    /// One legacy price triple is silently healed on read, a data quirk kept
    /// for wire compatibility with older base ROMs.
    pub fn price_data(&self) -> [u8; 3] {
        if self.data[3..6] == [0x00, 0x0a, 0x00] {
            return [0x00, 0x1e, 0x00];
        }
        [self.data[3], self.data[4], self.data[5]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_round_trip() {
        let mut cave = Cave::new([0x3f, 0x3f, 0x3f, 0x00, 0x00, 0x00]);
        cave.set_item(2, Item::WhiteSword);
        assert_eq!(cave.item(2), Item::WhiteSword);
        assert_eq!(cave.item(1), Item::OverworldNoItem);
        assert_eq!(cave.item(3), Item::OverworldNoItem);
    }

    #[test]
    fn set_item_preserves_high_bits() {
        let mut cave = Cave::new([0xff, 0x80, 0x40, 0x00, 0x00, 0x00]);
        cave.set_item(1, Item::Bait);
        cave.set_item(2, Item::Bait);
        cave.set_item(3, Item::Bait);
        assert_eq!(cave.item_data(), [0xc4, 0x84, 0x44]);
    }

    #[test]
    fn legacy_price_triple_is_healed() {
        let cave = Cave::new([0x3f, 0x3f, 0x3f, 0x00, 0x0a, 0x00]);
        assert_eq!(cave.price_data(), [0x00, 0x1e, 0x00]);
        assert_eq!(cave.price(2), 0x1e);
    }

    #[test]
    fn normal_prices_pass_through() {
        let mut cave = Cave::new([0x3f, 0x3f, 0x3f, 0x14, 0x50, 0x64]);
        assert_eq!(cave.price_data(), [0x14, 0x50, 0x64]);
        cave.set_price(1, 0xff);
        assert_eq!(cave.price(1), 0xff);
    }
}
