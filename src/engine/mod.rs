// Pulse Wallet Engine
// Configuration plus the wallet session core.

pub mod config;
pub mod wallet;
