/// Number of pockets on the American wheel (`0`, `00`, `1`-`36`).
pub const POCKET_COUNT: usize = 38;

/// Internal index used for the `00` pocket.
pub const DOUBLE_ZERO: u8 = 37;

/// Pocket order around the American wheel, clockwise from `0`.
pub const WHEEL_ORDER: [u8; POCKET_COUNT] = [
    0, 28, 9, 26, 30, 11, 7, 20, 32, 17, 5, 22, 34, 15, 3, 24, 36, 13, 1, DOUBLE_ZERO, 27, 10,
    25, 29, 12, 8, 19, 31, 18, 6, 21, 33, 16, 4, 23, 35, 14, 2,
];

/// Red numbers on the wheel. Every other number in 1-36 is black.
pub const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Racetrack sector: voisins du zero.
pub const VOISINS: [u8; 17] = [22, 18, 29, 7, 28, 12, 35, 3, 26, 0, 32, 15, 19, 4, 21, 2, 25];

/// Racetrack sector: tiers du cylindre.
pub const TIERS: [u8; 12] = [27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33];

/// Racetrack sector: orphelins.
pub const ORPHELINS: [u8; 8] = [1, 20, 14, 31, 9, 17, 34, 6];

/// Selectable chip denominations.
pub const AVAILABLE_CHIPS: [u64; 7] = [1, 5, 10, 15, 25, 50, 100];

/// Chip selected when a table is created.
pub const DEFAULT_CHIP: u64 = 5;

/// Default balance for a fresh table.
pub const STARTING_BALANCE: u64 = 25_000;

/// Default currency label reported on bridge messages.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Number of most recent winning pockets kept in the history.
pub const HISTORY_LIMIT: usize = 50;

/// Number of entries kept on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Storage key for the saved bet layout.
pub const SAVED_LAYOUT_KEY: &str = "saved_layout";

/// Default number of wheel neighbours on each side for a neighbours bet.
pub const DEFAULT_NEIGHBOR_SPAN: usize = 2;
