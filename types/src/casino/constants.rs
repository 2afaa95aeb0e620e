/// Smallest stake any game accepts
pub const MIN_BET: u64 = 10;

/// Balance granted when no saved balance exists
pub const STARTING_BALANCE: u64 = 10_000;

/// Number of rounds kept in the game history (newest first)
pub const HISTORY_LIMIT: usize = 50;

/// Number of final multipliers kept in the crash history
pub const CRASH_HISTORY_LIMIT: usize = 10;

/// Undrained notifications kept by a session; older ones are dropped.
pub const EVENT_LIMIT: usize = 100;

/// Crash multiplier increment per tick, in hundredths
pub const CRASH_TICK_STEP: u32 = 1;

/// Lowest crash point, in hundredths (1.00x)
pub const CRASH_POINT_MIN: u32 = 100;

/// Width of the crash point range, in hundredths ([1.00x, 11.00x))
pub const CRASH_POINT_SPAN: u32 = 1_000;

/// Default delay between crash ticks, in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Dealer draws while below this score
pub const DEALER_STANDS_ON: u8 = 17;

/// Slots in a roulette wheel (0 plus 1-36)
pub const ROULETTE_SLOTS: u8 = 37;

/// Roulette payouts (total return per unit staked on the selection)
pub const ROULETTE_COLOR_PAYOUT: u64 = 2;
pub const ROULETTE_GREEN_PAYOUT: u64 = 14;
pub const ROULETTE_NUMBER_PAYOUT: u64 = 36;

/// Persistence keys
pub const BALANCE_KEY: &str = "steakBalance";
pub const HISTORY_KEY: &str = "steakGameHistory";
pub const STATS_KEY: &str = "steakUserStats";
