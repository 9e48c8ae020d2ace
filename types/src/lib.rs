pub mod roulette;

pub use roulette::{
    BetId, BetRejection, BetType, LayoutError, Notice, PlacedBet, Pocket, PocketColor,
    QuantumMultiplier, RoundId, RoundPhase, RoundSnapshot, Severity, UserStats,
    AVAILABLE_CHIPS, DEFAULT_CHIP, DEFAULT_CURRENCY, HISTORY_LIMIT, LEADERBOARD_SIZE,
    POCKET_COUNT, SAVED_LAYOUT_KEY, STARTING_BALANCE,
};
