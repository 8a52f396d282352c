pub mod block;
pub mod clock;
pub mod miner;
pub mod model;
pub mod pow;
pub mod validator;

pub use block::Block;
pub use miner::mine_next_block;
pub use model::Ledger;
pub use validator::validate_chain;

/// Default Proof-of-Work difficulty (number of leading zero hex chars).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// A SHA-256 hex digest has 64 characters, so no proof can beat this.
pub const MAX_DIFFICULTY: u32 = 64;

/// Previous-hash sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Proof stored in the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Genesis timestamp; fixed so every node derives the same genesis hash.
pub const GENESIS_TIMESTAMP: i64 = 0;

/// Reward paid to the node that mints a block.
pub const MINING_REWARD: u64 = 1;

/// Sender address of reward transactions.
pub const MINING_REWARD_SENDER: &str = "0";

/// Bumped whenever the canonical block encoding changes.
pub const CANONICAL_ENCODING_VERSION: u32 = 1;

/// How often a node restarts a proof search after the tip moved.
pub const MAX_MINING_ATTEMPTS: usize = 3;
