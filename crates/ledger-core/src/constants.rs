pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const DEFAULT_DIFFICULTY: usize = 2;
pub const DEFAULT_BATCH_SIZE: usize = 2;
pub const DEFAULT_MINING_REWARD: u64 = 100;
