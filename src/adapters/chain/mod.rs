//! EVM chain adapter: token balance reads through an ethers HTTP provider

mod balances;

pub use balances::ChainBalanceReader;
