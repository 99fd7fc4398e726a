pub mod cave;
pub mod data_table;
pub mod patch;
pub mod room;
pub mod rommap;
mod util;

pub use cave::Cave;
pub use data_table::DataTable;
pub use patch::Patch;
pub use room::Room;

use num_derive::FromPrimitive;
use serde::Serialize;

pub type LevelNum = u8;
pub type RoomNum = u8;
pub type ScreenNum = u8;

pub const NUM_ROOMS: usize = 0x80;
pub const NUM_SCREENS: usize = 0x80;
pub const NUM_CAVES: usize = 0x16;
pub const DUNGEON_LEVEL_NUMBERS: core::ops::RangeInclusive<u8> = 1..=9;
pub const CAVE_POSITIONS: core::ops::RangeInclusive<u8> = 1..=3;

#[macro_export]
macro_rules! is_bit_set {
    ($value:expr, $test:expr) => {
        ($value & $test) == $test
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Direction {
    North,
    West,
    Staircase,
    East,
    South,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::West,
        Direction::North,
        Direction::East,
        Direction::South,
    ];

    /// Room-grid offset.  Rooms are laid out 16 per row, so north/south move
    /// by a full row and east/west by one.
    pub fn offset(self) -> i16 {
        match self {
            Direction::North => -0x10,
            Direction::West => -0x01,
            Direction::Staircase => 0,
            Direction::East => 0x01,
            Direction::South => 0x10,
        }
    }

    pub fn inverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::Staircase => Direction::Staircase,
        }
    }

    /// The room on the far side of this wall, or None when stepping off the
    /// 128-room grid.
    pub fn neighbor(self, room_num: RoomNum) -> Option<RoomNum> {
        let num = room_num as i16 + self.offset();
        if (0..NUM_ROOMS as i16).contains(&num) {
            Some(num as RoomNum)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum WallType {
    OpenDoor = 0,
    SolidWall = 1,
    WalkThroughWall1 = 2,
    WalkThroughWall2 = 3,
    BombHole = 4,
    LockedDoor1 = 5,
    LockedDoor2 = 6,
    ShutterDoor = 7,
}

impl WallType {
    /// All eight 3-bit codes are assigned, so decoding is total.
    pub fn from_bits(bits: u8) -> WallType {
        match bits & 0x07 {
            0 => WallType::OpenDoor,
            1 => WallType::SolidWall,
            2 => WallType::WalkThroughWall1,
            3 => WallType::WalkThroughWall2,
            4 => WallType::BombHole,
            5 => WallType::LockedDoor1,
            6 => WallType::LockedDoor2,
            _ => WallType::ShutterDoor,
        }
    }

    pub fn is_locked_door(self) -> bool {
        self == WallType::LockedDoor1 || self == WallType::LockedDoor2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum Item {
    Bombs = 0x00,
    WoodSword = 0x01,
    WhiteSword = 0x02,
    MagicalSword = 0x03,
    Bait = 0x04,
    Recorder = 0x05,
    BlueCandle = 0x06,
    RedCandle = 0x07,
    WoodArrows = 0x08,
    SilverArrows = 0x09,
    Bow = 0x0a,
    MagicalKey = 0x0b,
    Raft = 0x0c,
    Ladder = 0x0d,
    TriforceOfPower = 0x0e,
    FiveRupees = 0x0f,
    Wand = 0x10,
    Book = 0x11,
    BlueRing = 0x12,
    RedRing = 0x13,
    PowerBracelet = 0x14,
    Letter = 0x15,
    Compass = 0x16,
    Map = 0x17,
    Rupee = 0x18,
    Key = 0x19,
    HeartContainer = 0x1a,
    Triforce = 0x1b,
    MagicalShield = 0x1c,
    WoodBoomerang = 0x1d,
    MagicalBoomerang = 0x1e,
    BluePotion = 0x1f,
    RedPotion = 0x20,
    SingleHeart = 0x22,
    Fairy = 0x23,
    OverworldNoItem = 0x3f,
    // Virtual items have no in-ROM representation; the validator uses them to
    // model progress events.
    BeastDefeated = 0x98,
    KidnappedRescued = 0x99,
    LostHillsHint = 0x9a,
    DeadWoodsHint = 0x9b,
}

impl Item {
    /// The post-load "no item" code in dungeon rooms.  The raw 0x03 sentinel
    /// is rewritten to 0x0e when a room is parsed, and the 0x1785f engine
    /// patch teaches the game the same code.  0x0e is also the Triforce of
    /// Power, which never leaves its vanilla room in level 9.
    pub const NO_ITEM: Item = Item::TriforceOfPower;

    pub fn is_major_item(self) -> bool {
        match self {
            Item::WoodSword
            | Item::WhiteSword
            | Item::MagicalSword
            | Item::Recorder
            | Item::BlueCandle
            | Item::RedCandle
            | Item::WoodArrows
            | Item::SilverArrows
            | Item::Bow
            | Item::MagicalKey
            | Item::Raft
            | Item::Ladder
            | Item::Wand
            | Item::Book
            | Item::BlueRing
            | Item::RedRing
            | Item::PowerBracelet
            | Item::WoodBoomerang
            | Item::MagicalBoomerang => true,
            _ => false,
        }
    }

    /// Minor dungeon items that may join the intra-level shuffle.  Maps and
    /// compasses are not minor items; they never leave their rooms.
    pub fn is_minor_dungeon_item(self) -> bool {
        match self {
            Item::Bombs | Item::FiveRupees | Item::Key => true,
            _ => false,
        }
    }

    pub fn is_progressive_upgrade_item(self) -> bool {
        match self {
            Item::WoodSword
            | Item::WhiteSword
            | Item::MagicalSword
            | Item::BlueCandle
            | Item::RedCandle
            | Item::WoodArrows
            | Item::SilverArrows
            | Item::BlueRing
            | Item::RedRing => true,
            _ => false,
        }
    }

    /// The base tier of each progressive family.  Only these exist in the
    /// pool when progressive items are on.
    pub fn is_base_progressive_item(self) -> bool {
        match self {
            Item::WoodSword | Item::BlueCandle | Item::WoodArrows | Item::BlueRing => true,
            _ => false,
        }
    }

    pub fn is_sword_or_wand(self) -> bool {
        match self {
            Item::WoodSword | Item::WhiteSword | Item::MagicalSword | Item::Wand => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum RoomType {
    PlainRoom = 0x00,
    SpikeTrapRoom = 0x01,
    FourShortRoom = 0x02,
    FourTallRoom = 0x03,
    AquamentusRoom = 0x04,
    GleeokRoom = 0x05,
    GohmaRoom = 0x06,
    ThreeRows = 0x07,
    ReverseC = 0x08,
    CircleWall = 0x09,
    DoubleBlock = 0x0a,
    LavaMoatRoom = 0x0b,
    MazeRoom = 0x0c,
    GridRoom = 0x0d,
    VerticalChuteRoom = 0x0e,
    HorizontalChuteRoom = 0x0f,
    VerticalRows = 0x10,
    ZigzagRoom = 0x11,
    TRoom = 0x12,
    VerticalMoatRoom = 0x13,
    CircleMoatRoom = 0x14,
    PointlessMoatRoom = 0x15,
    ChevyRoom = 0x16,
    Nsu = 0x17,
    HorizontalMoatRoom = 0x18,
    DoubleMoatRoom = 0x19,
    DiamondStairRoom = 0x1a,
    NarrowStairRoom = 0x1b,
    SpiralStairRoom = 0x1c,
    DoubleSixBlockRoom = 0x1d,
    SingleSixBlockRoom = 0x1e,
    FivePairRoom = 0x1f,
    TurnstileRoom = 0x20,
    EntranceRoom = 0x21,
    SingleBlockRoom = 0x22,
    TwoFireballRoom = 0x23,
    FourFireballRoom = 0x24,
    DesertRoom = 0x25,
    BlackRoom = 0x26,
    ZeldaRoom = 0x27,
    GannonRoom = 0x28,
    TriforceRoom = 0x29,
    TransportStaircase = 0x3e,
    ItemStaircase = 0x3f,
}

impl RoomType {
    pub fn has_open_staircase(self) -> bool {
        match self {
            RoomType::DiamondStairRoom | RoomType::NarrowStairRoom | RoomType::SpiralStairRoom => {
                true
            }
            _ => false,
        }
    }

    pub fn can_have_push_block(self) -> bool {
        match self {
            RoomType::SpikeTrapRoom
            | RoomType::GohmaRoom
            | RoomType::ThreeRows
            | RoomType::ReverseC
            | RoomType::CircleWall
            | RoomType::DoubleBlock
            | RoomType::MazeRoom
            | RoomType::GridRoom
            | RoomType::ZigzagRoom
            | RoomType::FivePairRoom
            | RoomType::SingleBlockRoom => true,
            _ => false,
        }
    }

    pub fn is_staircase_room(self) -> bool {
        self == RoomType::ItemStaircase || self == RoomType::TransportStaircase
    }
}

/// On-screen location of a room's item (2 bits in table 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum ItemPosition {
    Middle = 0,
    TopRight = 1,
    BottomLeft = 2,
    Right = 3,
}

impl ItemPosition {
    pub fn from_bits(bits: u8) -> ItemPosition {
        match bits & 0x03 {
            0 => ItemPosition::Middle,
            1 => ItemPosition::TopRight,
            2 => ItemPosition::BottomLeft,
            _ => ItemPosition::Right,
        }
    }
}

/// Item positions that a given room layout can legally use.
pub fn valid_item_positions(room_type: RoomType) -> &'static [ItemPosition] {
    use ItemPosition::*;
    const ALL: &[ItemPosition] = &[Middle, TopRight, BottomLeft, Right];
    const NO_RIGHT: &[ItemPosition] = &[Middle, TopRight, BottomLeft];
    const CORNERS: &[ItemPosition] = &[TopRight, BottomLeft];
    match room_type {
        RoomType::PlainRoom
        | RoomType::FourShortRoom
        | RoomType::FourTallRoom
        | RoomType::DoubleBlock
        | RoomType::VerticalChuteRoom
        | RoomType::HorizontalChuteRoom
        | RoomType::VerticalMoatRoom
        | RoomType::HorizontalMoatRoom
        | RoomType::DoubleMoatRoom
        | RoomType::DoubleSixBlockRoom
        | RoomType::TwoFireballRoom
        | RoomType::DesertRoom
        | RoomType::BlackRoom => ALL,
        RoomType::SpikeTrapRoom
        | RoomType::ReverseC
        | RoomType::LavaMoatRoom
        | RoomType::TRoom
        | RoomType::CircleMoatRoom
        | RoomType::TriforceRoom => NO_RIGHT,
        RoomType::AquamentusRoom => &[Right, Middle, BottomLeft],
        RoomType::GleeokRoom => &[BottomLeft, Middle, Right],
        RoomType::GohmaRoom => &[Middle, TopRight],
        RoomType::ThreeRows
        | RoomType::CircleWall
        | RoomType::GridRoom
        | RoomType::VerticalRows
        | RoomType::PointlessMoatRoom
        | RoomType::SpiralStairRoom => CORNERS,
        RoomType::MazeRoom => &[Right, TopRight, BottomLeft],
        RoomType::ZigzagRoom | RoomType::ChevyRoom | RoomType::Nsu => &[Middle, Right],
        RoomType::DiamondStairRoom => &[TopRight, BottomLeft, Right],
        RoomType::NarrowStairRoom => &[Middle, BottomLeft, Right],
        RoomType::SingleSixBlockRoom => &[Right, TopRight, BottomLeft],
        RoomType::FivePairRoom => &[Right, BottomLeft, TopRight],
        RoomType::TurnstileRoom => &[Right],
        RoomType::EntranceRoom | RoomType::ZeldaRoom => &[Middle],
        RoomType::SingleBlockRoom => &[Right, TopRight, BottomLeft],
        RoomType::FourFireballRoom | RoomType::GannonRoom => &[Middle, Right],
        RoomType::TransportStaircase | RoomType::ItemStaircase => &[],
    }
}

/// Item positions reachable from a given entry door.  Water and chute rooms
/// partition the floor, so the set depends on the entry direction and on
/// whether the ladder is owned.  Stairway entries pop up inside the room and
/// reach everything the layout allows.
pub fn accessible_item_positions(
    room_type: RoomType,
    entry: Direction,
    has_ladder: bool,
) -> &'static [ItemPosition] {
    use ItemPosition::*;
    match room_type {
        RoomType::LavaMoatRoom => match entry {
            Direction::South => {
                if has_ladder {
                    &[BottomLeft, Middle]
                } else {
                    &[Middle]
                }
            }
            Direction::West => {
                if has_ladder {
                    &[BottomLeft, Middle]
                } else {
                    &[BottomLeft]
                }
            }
            Direction::Staircase => valid_item_positions(room_type),
            _ => &[TopRight],
        },
        RoomType::VerticalChuteRoom => match entry {
            Direction::West => &[BottomLeft],
            Direction::East => &[Right, TopRight],
            _ => &[Middle],
        },
        RoomType::HorizontalChuteRoom => match entry {
            Direction::South => &[BottomLeft],
            Direction::North => &[Right, TopRight],
            _ => &[Middle, Right],
        },
        RoomType::TRoom => match entry {
            Direction::South => &[Middle],
            _ => &[TopRight, BottomLeft],
        },
        RoomType::VerticalMoatRoom => {
            if has_ladder {
                &[Middle, TopRight, BottomLeft, Right]
            } else if entry == Direction::East {
                &[Right, TopRight]
            } else {
                &[Middle, BottomLeft]
            }
        }
        RoomType::HorizontalMoatRoom => {
            if has_ladder {
                &[Middle, TopRight, BottomLeft, Right]
            } else if entry == Direction::North {
                &[TopRight]
            } else {
                &[Middle, BottomLeft, Right]
            }
        }
        RoomType::CircleMoatRoom => {
            if has_ladder {
                &[Middle, TopRight, BottomLeft]
            } else {
                &[TopRight, BottomLeft]
            }
        }
        RoomType::ChevyRoom => {
            if has_ladder {
                &[Middle, Right]
            } else if entry == Direction::East {
                &[Right]
            } else {
                &[]
            }
        }
        RoomType::DoubleMoatRoom => {
            if has_ladder {
                &[Middle, TopRight, BottomLeft, Right]
            } else if entry == Direction::West || entry == Direction::East {
                &[Middle, Right]
            } else {
                &[]
            }
        }
        _ => valid_item_positions(room_type),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum Enemy {
    Nothing = 0x00,
    BlueLynel = 0x01,
    RedLynel = 0x02,
    BlueMoblin = 0x03,
    RedMoblin = 0x04,
    BlueGoriya = 0x05,
    RedGoriya = 0x06,
    RedOctorok1 = 0x07,
    RedOctorok2 = 0x08,
    BlueOctorok1 = 0x09,
    BlueOctorok2 = 0x0a,
    RedDarknut = 0x0b,
    BlueDarknut = 0x0c,
    BlueTektite = 0x0d,
    RedTektite = 0x0e,
    BlueLever = 0x0f,
    RedLever = 0x10,
    Vire = 0x12,
    Zol = 0x13,
    Gel1 = 0x14,
    Gel2 = 0x15,
    PolsVoice = 0x16,
    LikeLike = 0x17,
    Peahat = 0x1a,
    BlueKeese = 0x1b,
    RedKeese = 0x1c,
    DarkKeese = 0x1d,
    Armos = 0x1e,
    FallingRocks = 0x1f,
    FallingRock = 0x20,
    Ghini1 = 0x21,
    Ghini2 = 0x22,
    RedWizzrobe = 0x23,
    BlueWizzrobe = 0x24,
    Wallmaster = 0x27,
    Rope = 0x28,
    Stalfos = 0x2a,
    Bubble = 0x2b,
    BlueBubble = 0x2c,
    RedBubble = 0x2d,
    Gibdo = 0x30,
    TripleDodongo = 0x31,
    SingleDodongo = 0x32,
    BlueGohma = 0x33,
    RedGohma = 0x34,
    RupeeBoss = 0x35,
    HungryGoriya = 0x36,
    TheKidnapped = 0x37,
    TripleDigdogger = 0x38,
    SingleDigdogger = 0x39,
    RedLanmola = 0x3a,
    BlueLanmola = 0x3b,
    Manhandala = 0x3c,
    Aquamentus = 0x3d,
    TheBeast = 0x3e,
    Moldorm = 0x41,
    Gleeok1 = 0x42,
    Gleeok2 = 0x43,
    Gleeok3 = 0x44,
    Gleeok4 = 0x45,
    Patra2 = 0x47,
    Patra1 = 0x48,
    ThreePairsOfTraps = 0x49,
    CornerTraps = 0x4a,
    OldMan = 0x4b,
    OldMan2 = 0x4c,
    OldMan3 = 0x4d,
    OldMan4 = 0x4e,
    BombUpgrader = 0x4f,
    OldMan5 = 0x50,
    Mugger = 0x51,
    OldMan6 = 0x52,
    // Codes 0x62-0x7f address mixed enemy groups whose membership is read
    // from a ROM-resident table at load time.
    MixedEnemyGroup1 = 0x62,
    MixedEnemyGroup2 = 0x63,
    MixedEnemyGroup3 = 0x64,
    MixedEnemyGroup4 = 0x65,
    MixedEnemyGroup5 = 0x66,
    MixedEnemyGroup6 = 0x67,
    MixedEnemyGroup7 = 0x68,
    MixedEnemyGroup8 = 0x69,
    MixedEnemyGroup9 = 0x6a,
    MixedEnemyGroup10 = 0x6b,
    MixedEnemyGroup11 = 0x6c,
    MixedEnemyGroup12 = 0x6d,
    MixedEnemyGroup13 = 0x6e,
    MixedEnemyGroup14 = 0x6f,
    MixedEnemyGroup15 = 0x70,
    MixedEnemyGroup16 = 0x71,
    MixedEnemyGroup17 = 0x72,
    MixedEnemyGroup18 = 0x73,
    MixedEnemyGroup19 = 0x74,
    MixedEnemyGroup20 = 0x75,
    MixedEnemyGroup21 = 0x76,
    MixedEnemyGroup22 = 0x77,
    MixedEnemyGroup23 = 0x78,
    MixedEnemyGroup24 = 0x79,
    MixedEnemyGroup25 = 0x7a,
    MixedEnemyGroup26 = 0x7b,
    MixedEnemyGroup27 = 0x7c,
    MixedEnemyGroup28 = 0x7d,
    MixedEnemyGroup29 = 0x7e,
    MixedEnemyGroup30 = 0x7f,
}

impl Enemy {
    pub fn is_mixed_enemy_group(self) -> bool {
        (self as u8) >= 0x62 && (self as u8) <= 0x7f
    }

    pub fn is_gleeok_or_patra(self) -> bool {
        match self {
            Enemy::Gleeok1
            | Enemy::Gleeok2
            | Enemy::Gleeok3
            | Enemy::Gleeok4
            | Enemy::Patra1
            | Enemy::Patra2 => true,
            _ => false,
        }
    }

    /// NPC rooms never hold a room item.
    pub fn is_npc(self) -> bool {
        match self {
            Enemy::OldMan
            | Enemy::OldMan2
            | Enemy::OldMan3
            | Enemy::OldMan4
            | Enemy::OldMan5
            | Enemy::OldMan6
            | Enemy::BombUpgrader
            | Enemy::Mugger
            | Enemy::HungryGoriya
            | Enemy::TheKidnapped => true,
            _ => false,
        }
    }

    pub fn is_boss(self) -> bool {
        match self {
            Enemy::Aquamentus
            | Enemy::TripleDodongo
            | Enemy::SingleDodongo
            | Enemy::BlueGohma
            | Enemy::RedGohma
            | Enemy::TripleDigdogger
            | Enemy::SingleDigdogger
            | Enemy::RedLanmola
            | Enemy::BlueLanmola
            | Enemy::Manhandala
            | Enemy::Moldorm
            | Enemy::TheBeast => true,
            _ => self.is_gleeok_or_patra(),
        }
    }

    pub fn has_zero_hp(self) -> bool {
        match self {
            Enemy::Gel1 | Enemy::Gel2 | Enemy::BlueKeese | Enemy::RedKeese | Enemy::DarkKeese => {
                true
            }
            _ => false,
        }
    }

    pub fn needs_no_kill(self) -> bool {
        match self {
            Enemy::Bubble
            | Enemy::ThreePairsOfTraps
            | Enemy::CornerTraps
            | Enemy::OldMan
            | Enemy::TheKidnapped
            | Enemy::Nothing => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum CaveType {
    None = 0x00,
    Level1 = 0x01,
    Level2 = 0x02,
    Level3 = 0x03,
    Level4 = 0x04,
    Level5 = 0x05,
    Level6 = 0x06,
    Level7 = 0x07,
    Level8 = 0x08,
    Level9 = 0x09,
    WoodSwordCave = 0x10,
    TakeAny = 0x11,
    WhiteSwordCave = 0x12,
    MagicalSwordCave = 0x13,
    AnyRoad = 0x14,
    LostHillsHint = 0x15,
    MoneyMakingGame = 0x16,
    DoorRepair = 0x17,
    LetterCave = 0x18,
    DeadWoodsHint = 0x19,
    PotionShop = 0x1a,
    HintShop1 = 0x1b,
    HintShop2 = 0x1c,
    Shop1 = 0x1d,
    Shop2 = 0x1e,
    Shop3 = 0x1f,
    Shop4 = 0x20,
    MediumSecret = 0x21,
    LargeSecret = 0x22,
    SmallSecret = 0x23,
    // Virtual caves backed by standalone ROM addresses.
    ArmosItem = 0x24,
    CoastItem = 0x25,
}

impl CaveType {
    pub fn is_level(self) -> bool {
        let val = self as u8;
        val >= 0x01 && val <= 0x09
    }

    pub fn level_num(self) -> Option<LevelNum> {
        if self.is_level() {
            Some(self as u8)
        } else {
            None
        }
    }

    /// Caves that sell their inventory.  Shop positions get prices written
    /// when the randomizer places an item there.
    pub fn is_shop(self) -> bool {
        match self {
            CaveType::Shop1
            | CaveType::Shop2
            | CaveType::Shop3
            | CaveType::Shop4
            | CaveType::PotionShop => true,
            _ => false,
        }
    }

    pub fn is_cave(self) -> bool {
        (self as u8) >= 0x10
    }
}

/// Event that opens shuttered doors or reveals a stairway in a room.  Stored
/// in the low 3 bits of room table 5; the disassembly calls these
/// SecretTrigger codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, Serialize)]
#[repr(u8)]
pub enum RoomAction {
    NothingOpensShutters = 0,
    KillingEnemiesOpensShutters = 1,
    KillingRingleaderKillsEnemiesAndOpensShutters = 2,
    TriforceOfPowerOpensShutters = 3,
    PushingBlockOpensShutters = 4,
    PushingBlockMakesStairwayVisible = 5,
    DefeatingNpcOpensShutters = 6,
    KillingEnemiesOpensShuttersAndDropsItem = 7,
}

impl RoomAction {
    pub fn from_bits(bits: u8) -> RoomAction {
        match bits & 0x07 {
            0 => RoomAction::NothingOpensShutters,
            1 => RoomAction::KillingEnemiesOpensShutters,
            2 => RoomAction::KillingRingleaderKillsEnemiesAndOpensShutters,
            3 => RoomAction::TriforceOfPowerOpensShutters,
            4 => RoomAction::PushingBlockOpensShutters,
            5 => RoomAction::PushingBlockMakesStairwayVisible,
            6 => RoomAction::DefeatingNpcOpensShutters,
            _ => RoomAction::KillingEnemiesOpensShuttersAndDropsItem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_neighbors() {
        assert_eq!(Direction::North.neighbor(0x45), Some(0x35));
        assert_eq!(Direction::South.neighbor(0x45), Some(0x55));
        assert_eq!(Direction::West.neighbor(0x45), Some(0x44));
        assert_eq!(Direction::East.neighbor(0x45), Some(0x46));
        assert_eq!(Direction::North.neighbor(0x05), None);
        assert_eq!(Direction::South.neighbor(0x7f), None);
    }

    #[test]
    fn direction_inverse() {
        for &dir in &Direction::CARDINALS {
            assert_eq!(dir.inverse().inverse(), dir);
        }
        assert_eq!(Direction::Staircase.inverse(), Direction::Staircase);
    }

    #[test]
    fn wall_type_from_bits_is_total() {
        for bits in 0..8u8 {
            assert_eq!(WallType::from_bits(bits) as u8, bits);
        }
    }

    #[test]
    fn no_item_aliases_triforce_of_power() {
        assert_eq!(Item::NO_ITEM as u8, 0x0e);
    }

    #[test]
    fn chute_room_positions_depend_on_entry() {
        let from_east =
            accessible_item_positions(RoomType::VerticalChuteRoom, Direction::East, false);
        let from_north =
            accessible_item_positions(RoomType::VerticalChuteRoom, Direction::North, false);
        assert!(!from_east.contains(&ItemPosition::Middle));
        assert_eq!(from_north, &[ItemPosition::Middle]);
    }

    #[test]
    fn moat_rooms_open_up_with_ladder() {
        let without =
            accessible_item_positions(RoomType::HorizontalMoatRoom, Direction::North, false);
        let with = accessible_item_positions(RoomType::HorizontalMoatRoom, Direction::North, true);
        assert_eq!(without, &[ItemPosition::TopRight]);
        assert_eq!(with.len(), 4);
    }

    #[test]
    fn progressive_item_families() {
        assert!(Item::WoodSword.is_base_progressive_item());
        assert!(!Item::WhiteSword.is_base_progressive_item());
        assert!(Item::WhiteSword.is_progressive_upgrade_item());
        assert!(Item::RedRing.is_progressive_upgrade_item());
        assert!(!Item::Raft.is_progressive_upgrade_item());
    }

    #[test]
    fn mixed_group_codes() {
        assert!(Enemy::MixedEnemyGroup1.is_mixed_enemy_group());
        assert!(Enemy::MixedEnemyGroup30.is_mixed_enemy_group());
        assert!(!Enemy::TheBeast.is_mixed_enemy_group());
    }
}
