//! ROM layout constants.  All `*_ADDRESS`/`*_DATA` values are file offsets:
//! they include the 16-byte iNES header.  The CPU address of a byte is its
//! file offset minus [`NES_HEADER_SIZE`].

pub const NES_HEADER_SIZE: usize = 0x10;

/// 128 KiB of PRG data plus the iNES header.
pub const ROM_SIZE: usize = 0x20010;

#[macro_export]
macro_rules! file_offset {
    ($cpu_address:expr) => {
        $cpu_address + $crate::rommap::NES_HEADER_SIZE
    };
}

pub const LEVEL_TABLE_SIZE: usize = 0x80;
pub const NUM_ROOM_TABLES: usize = 6;
pub const LEVEL_BLOCK_SIZE: usize = LEVEL_TABLE_SIZE * NUM_ROOM_TABLES;

pub const OVERWORLD_DATA: usize = file_offset!(0x18400);
pub const LEVEL_1_TO_6_DATA: usize = file_offset!(0x18700);
pub const LEVEL_7_TO_9_DATA: usize = file_offset!(0x18a00);

/// Overworld table 1, the per-screen cave destinations.
pub const OVERWORLD_DESTINATION_TABLE: usize = OVERWORLD_DATA + LEVEL_TABLE_SIZE;

pub const CAVE_ITEM_DATA: usize = file_offset!(0x18600);
pub const CAVE_PRICE_DATA: usize = file_offset!(0x1863c);

pub const ARMOS_ITEM_ADDRESS: usize = file_offset!(0x10cf5);
pub const ARMOS_SCREEN_ADDRESS: usize = file_offset!(0x10cb2);
pub const COAST_ITEM_ADDRESS: usize = file_offset!(0x1788a);

/// Ten 0xfc-byte per-level info blocks; block 0 is the overworld.
pub const LEVEL_INFO_START: usize = file_offset!(0x19300);
pub const LEVEL_INFO_SIZE: usize = 0xfc;
pub const NUM_LEVEL_INFO_BLOCKS: usize = 10;
pub const ITEM_POSITIONS_OFFSET: usize = 0x29;
pub const START_ROOM_OFFSET: usize = 0x2f;
pub const STAIRWAY_LIST_OFFSET: usize = 0x34;
pub const STAIRWAY_LIST_LEN: usize = 10;

/// Compass-arrow room numbers for levels 1-8, one byte per level at this
/// stride.  Level 9's compass target never changes.
pub const COMPASS_ROOM_NUMBER_ADDRESS: usize = file_offset!(0x1942c);
pub const LEVEL_INFO_STRIDE: usize = 0xfc;

/// Mixed-enemy-group rosters: 30 eight-byte records, each a 0xff-terminated
/// list of enemy codes, indexed by `enemy_code - 0x62`.
pub const MIXED_ENEMY_GROUP_TABLE: usize = file_offset!(0x14a00);
pub const MIXED_ENEMY_GROUP_COUNT: usize = 30;
pub const MIXED_ENEMY_GROUP_SIZE: usize = 8;
pub const MIXED_ENEMY_GROUP_FIRST_CODE: u8 = 0x62;

/// Named ROM regions the randomizer reads and writes without dedicated
/// accessors.  Addressed through [`RomDataType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RomDataType {
    WhiteSwordHeartRequirement,
    MagicalSwordHeartRequirement,
    AnyRoadScreens,
    RecorderWarpDestinations,
    RecorderWarpYCoordinates,
    LostHillsDirections,
    DeadWoodsDirections,
    DungeonNoItemCode,
}

pub struct RomDataSpec {
    pub cpu_address: usize,
    pub file_offset: usize,
    pub size: usize,
    pub readable: bool,
    pub writable: bool,
    pub default_value: &'static [u8],
    pub encoder: Option<fn(u32) -> Vec<u8>>,
    pub decoder: Option<fn(&[u8]) -> u32>,
}

/// Heart requirements are stored as `(hearts - 1) * 16`.
pub fn encode_heart_requirement(hearts: u32) -> Vec<u8> {
    vec![((hearts - 1) * 16) as u8]
}

pub fn decode_heart_requirement(data: &[u8]) -> u32 {
    (data[0] as u32) / 16 + 1
}

impl RomDataType {
    pub const ALL: [RomDataType; 8] = [
        RomDataType::WhiteSwordHeartRequirement,
        RomDataType::MagicalSwordHeartRequirement,
        RomDataType::AnyRoadScreens,
        RomDataType::RecorderWarpDestinations,
        RomDataType::RecorderWarpYCoordinates,
        RomDataType::LostHillsDirections,
        RomDataType::DeadWoodsDirections,
        RomDataType::DungeonNoItemCode,
    ];

    pub fn spec(self) -> &'static RomDataSpec {
        match self {
            RomDataType::WhiteSwordHeartRequirement => &WHITE_SWORD_HEART_REQUIREMENT_SPEC,
            RomDataType::MagicalSwordHeartRequirement => &MAGICAL_SWORD_HEART_REQUIREMENT_SPEC,
            RomDataType::AnyRoadScreens => &ANY_ROAD_SCREENS_SPEC,
            RomDataType::RecorderWarpDestinations => &RECORDER_WARP_DESTINATIONS_SPEC,
            RomDataType::RecorderWarpYCoordinates => &RECORDER_WARP_Y_COORDINATES_SPEC,
            RomDataType::LostHillsDirections => &LOST_HILLS_DIRECTIONS_SPEC,
            RomDataType::DeadWoodsDirections => &DEAD_WOODS_DIRECTIONS_SPEC,
            RomDataType::DungeonNoItemCode => &DUNGEON_NO_ITEM_CODE_SPEC,
        }
    }
}

static WHITE_SWORD_HEART_REQUIREMENT_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x48fd,
    file_offset: file_offset!(0x48fd),
    size: 1,
    readable: true,
    writable: true,
    default_value: &[0x40],
    encoder: Some(encode_heart_requirement),
    decoder: Some(decode_heart_requirement),
};

static MAGICAL_SWORD_HEART_REQUIREMENT_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x4906,
    file_offset: file_offset!(0x4906),
    size: 1,
    readable: true,
    writable: true,
    default_value: &[0xb0],
    encoder: Some(encode_heart_requirement),
    decoder: Some(decode_heart_requirement),
};

static ANY_ROAD_SCREENS_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x19334,
    file_offset: file_offset!(0x19334),
    size: 4,
    readable: true,
    writable: true,
    default_value: &[0x1d, 0x23, 0x49, 0x79],
    encoder: None,
    decoder: None,
};

static RECORDER_WARP_DESTINATIONS_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x6010,
    file_offset: file_offset!(0x6010),
    size: 8,
    readable: true,
    writable: true,
    default_value: &[0x36, 0x3b, 0x73, 0x44, 0x0a, 0x21, 0x41, 0x6c],
    encoder: None,
    decoder: None,
};

static RECORDER_WARP_Y_COORDINATES_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x6119,
    file_offset: file_offset!(0x6119),
    size: 8,
    readable: false,
    writable: true,
    default_value: &[0x8d, 0xad, 0x8d, 0x8d, 0xad, 0x8d, 0xad, 0x5d],
    encoder: None,
    decoder: None,
};

static LOST_HILLS_DIRECTIONS_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x6d9b,
    file_offset: file_offset!(0x6d9b),
    size: 4,
    readable: false,
    writable: true,
    default_value: &[0x08, 0x08, 0x08, 0x08],
    encoder: None,
    decoder: None,
};

static DEAD_WOODS_DIRECTIONS_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x6d97,
    file_offset: file_offset!(0x6d97),
    size: 4,
    readable: false,
    writable: true,
    default_value: &[0x08, 0x02, 0x04, 0x02],
    encoder: None,
    decoder: None,
};

static DUNGEON_NO_ITEM_CODE_SPEC: RomDataSpec = RomDataSpec {
    cpu_address: 0x1784f,
    file_offset: file_offset!(0x1784f),
    size: 1,
    readable: false,
    writable: true,
    default_value: &[0x0e],
    encoder: None,
    decoder: None,
};
