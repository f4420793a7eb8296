pub mod account;
pub mod error;
pub mod genesis;
pub mod state_manager;

pub use account::{AccountState, EMPTY_CODE_HASH, EMPTY_TRIE_ROOT};
pub use error::StateError;
pub use genesis::{Genesis, GenesisAccount, GenesisError};
pub use state_manager::StateManager;
