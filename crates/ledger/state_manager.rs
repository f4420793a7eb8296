use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use sha3::{Digest, Keccak256};
use statum_rlp::decode::RLPDecode;
use statum_rlp::encode::RLPEncode;
use statum_trie::{CheckpointDB, NodeHash, Trie, TrieDB, TrieError, EMPTY_TRIE_HASH};
use tracing::debug;

use crate::account::{AccountState, EMPTY_CODE_HASH};
use crate::error::StateError;
use crate::genesis::Genesis;

fn keccak(data: &[u8]) -> H256 {
    H256::from_slice(Keccak256::new_with_prefix(data).finalize().as_slice())
}

/// Checkpointable view over an account ledger backed by authenticated tries.
///
/// All trie keys are secured: addresses and storage slots are keccak-hashed
/// before they touch a trie. Contract code lives in the same backing store
/// as the trie nodes, addressed by its digest.
///
/// Storage tries share the state trie's checkpointed store, so a single
/// checkpoint/commit/revert scope covers account and storage writes alike.
pub struct StateManager {
    db: Arc<dyn TrieDB>,
    store: Arc<CheckpointDB>,
    trie: Trie,
    /// Storage tries opened since the last revert or root change.
    storage_tries: HashMap<Address, Trie>,
    account_cache: HashMap<Address, AccountState>,
    /// Storage values as first read, per account. Survives checkpoints and
    /// is only dropped on explicit request or on a root change.
    original_storage: HashMap<Address, HashMap<H256, U256>>,
    touched: HashSet<Address>,
    /// Touched sets saved at each open checkpoint, in lockstep with the trie.
    touched_stack: Vec<HashSet<Address>>,
}

impl StateManager {
    /// Creates a manager over an empty state.
    pub fn new(db: Arc<dyn TrieDB>) -> Self {
        let store = Arc::new(CheckpointDB::new(db.clone()));
        let trie = Trie::from_store(store.clone(), *EMPTY_TRIE_HASH);
        Self {
            db,
            store,
            trie,
            storage_tries: HashMap::new(),
            account_cache: HashMap::new(),
            original_storage: HashMap::new(),
            touched: HashSet::new(),
            touched_stack: Vec::new(),
        }
    }

    /// Creates a manager positioned at an existing state root.
    pub fn open(db: Arc<dyn TrieDB>, root: H256) -> Result<Self, StateError> {
        let mut manager = Self::new(db);
        manager.set_state_root(root)?;
        Ok(manager)
    }

    /// Retrieves an account, defaulting to an empty account if the address
    /// holds none.
    pub fn get_account(&mut self, address: Address) -> Result<AccountState, StateError> {
        if let Some(account) = self.account_cache.get(&address) {
            return Ok(account.clone());
        }
        let account = match self.trie.get(&hash_address(&address))? {
            Some(rlp) => AccountState::decode(&rlp)?,
            None => AccountState::default(),
        };
        self.account_cache.insert(address, account.clone());
        Ok(account)
    }

    pub fn put_account(&mut self, address: Address, account: AccountState) -> Result<(), StateError> {
        self.trie
            .insert(hash_address(&address), account.encode_to_vec())?;
        self.account_cache.insert(address, account);
        Ok(())
    }

    pub fn delete_account(&mut self, address: Address) -> Result<(), StateError> {
        self.trie.remove(hash_address(&address))?;
        self.account_cache.remove(&address);
        self.storage_tries.remove(&address);
        Ok(())
    }

    /// Whether the address holds an account in the trie. Reads through to
    /// the trie, bypassing the account cache.
    pub fn account_exists(&self, address: Address) -> Result<bool, StateError> {
        Ok(self.trie.get(&hash_address(&address))?.is_some())
    }

    /// Whether the account at the address is empty (or missing entirely).
    pub fn account_is_empty(&mut self, address: Address) -> Result<bool, StateError> {
        Ok(self.get_account(address)?.is_empty())
    }

    /// Stores the given code and points the account's code hash at it.
    pub fn put_contract_code(&mut self, address: Address, code: Bytes) -> Result<(), StateError> {
        let code_hash = keccak(&code);
        if code_hash != EMPTY_CODE_HASH {
            self.store.put(NodeHash::from(code_hash), code.to_vec())?;
        }
        let mut account = self.get_account(address)?;
        account.code_hash = code_hash;
        self.put_account(address, account)
    }

    pub fn get_contract_code(&mut self, address: Address) -> Result<Bytes, StateError> {
        let account = self.get_account(address)?;
        self.get_code_by_hash(account.code_hash)
    }

    pub fn get_code_by_hash(&self, code_hash: H256) -> Result<Bytes, StateError> {
        if code_hash == EMPTY_CODE_HASH {
            return Ok(Bytes::new());
        }
        let code = self
            .store
            .get(NodeHash::from(code_hash))?
            .ok_or(TrieError::MissingNode(code_hash))?;
        Ok(Bytes::from(code))
    }

    /// Opens (or returns the already opened) storage trie for the account.
    fn storage_trie(&mut self, address: Address) -> Result<&mut Trie, StateError> {
        let root = if self.storage_tries.contains_key(&address) {
            None
        } else {
            Some(self.get_account(address)?.storage_root)
        };
        let store = self.store.clone();
        Ok(self
            .storage_tries
            .entry(address)
            .or_insert_with(|| Trie::from_store(store, root.unwrap_or(*EMPTY_TRIE_HASH))))
    }

    /// Retrieves the value at a storage slot, zero if the slot is unset.
    pub fn get_contract_storage(&mut self, address: Address, slot: H256) -> Result<U256, StateError> {
        let value = match self.storage_trie(address)?.get(&hash_slot(&slot))? {
            Some(rlp) => U256::decode(&rlp)?,
            None => U256::zero(),
        };
        Ok(value)
    }

    /// Stores a value at a storage slot and refreshes the account's storage
    /// root. Storing zero unsets the slot.
    pub fn put_contract_storage(
        &mut self,
        address: Address,
        slot: H256,
        value: U256,
    ) -> Result<(), StateError> {
        let trie = self.storage_trie(address)?;
        if value.is_zero() {
            trie.remove(hash_slot(&slot))?;
        } else {
            trie.insert(hash_slot(&slot), value.encode_to_vec())?;
        }
        let storage_root = trie.hash();
        let mut account = self.get_account(address)?;
        account.storage_root = storage_root;
        self.put_account(address, account)
    }

    /// Unsets every storage slot of the account.
    pub fn clear_contract_storage(&mut self, address: Address) -> Result<(), StateError> {
        self.storage_tries.remove(&address);
        let mut account = self.get_account(address)?;
        account.storage_root = *EMPTY_TRIE_HASH;
        self.put_account(address, account)
    }

    /// Value of a slot as of the first time it was read since the cache was
    /// last cleared, regardless of writes made since.
    pub fn get_original_contract_storage(
        &mut self,
        address: Address,
        slot: H256,
    ) -> Result<U256, StateError> {
        if let Some(value) = self
            .original_storage
            .get(&address)
            .and_then(|slots| slots.get(&slot))
        {
            return Ok(*value);
        }
        let value = self.get_contract_storage(address, slot)?;
        self.original_storage
            .entry(address)
            .or_default()
            .insert(slot, value);
        Ok(value)
    }

    pub fn clear_original_storage_cache(&mut self) {
        self.original_storage.clear();
    }

    /// Dumps the account's storage as hex-encoded hashed-key/value pairs.
    pub fn dump_storage(&mut self, address: Address) -> Result<BTreeMap<String, String>, StateError> {
        let account = self.get_account(address)?;
        let trie = Trie::from_store(self.store.clone(), account.storage_root);
        let mut dump = BTreeMap::new();
        for (key, value) in trie.into_iter().content() {
            dump.insert(hex::encode(key), hex::encode(value));
        }
        Ok(dump)
    }

    /// Marks the account as touched, making it a candidate for deletion in
    /// [`cleanup_touched_accounts`](Self::cleanup_touched_accounts).
    pub fn touch_account(&mut self, address: Address) {
        self.touched.insert(address);
    }

    pub fn touched_accounts(&self) -> &HashSet<Address> {
        &self.touched
    }

    /// Deletes every touched account that exists and is empty, then clears
    /// the touched set.
    pub fn cleanup_touched_accounts(&mut self) -> Result<(), StateError> {
        let touched = std::mem::take(&mut self.touched);
        for address in touched {
            if self.account_exists(address)? && self.get_account(address)?.is_empty() {
                self.delete_account(address)?;
            }
        }
        Ok(())
    }

    /// Opens a checkpoint scope covering accounts, storage, code and the
    /// touched set.
    pub fn checkpoint(&mut self) -> Result<(), StateError> {
        self.trie.checkpoint()?;
        self.touched_stack.push(self.touched.clone());
        debug!(depth = self.trie.checkpoint_depth(), "state checkpoint");
        Ok(())
    }

    /// Closes the newest checkpoint scope, keeping its writes.
    pub fn commit(&mut self) -> Result<(), StateError> {
        self.trie.commit()?;
        self.touched_stack.pop().ok_or(TrieError::NoCheckpoint)?;
        debug!(depth = self.trie.checkpoint_depth(), "state commit");
        Ok(())
    }

    /// Closes the newest checkpoint scope, undoing every account, storage
    /// and code write made since, and restoring the touched set.
    pub fn revert(&mut self) -> Result<(), StateError> {
        self.trie.revert()?;
        self.touched = self.touched_stack.pop().ok_or(TrieError::NoCheckpoint)?;
        // caches may hold reverted data
        self.account_cache.clear();
        self.storage_tries.clear();
        debug!(depth = self.trie.checkpoint_depth(), "state revert");
        Ok(())
    }

    pub fn checkpoint_depth(&self) -> usize {
        self.trie.checkpoint_depth()
    }

    /// Current state root. Refused while checkpoints are open unless
    /// `force` is set, since the root is not durable yet.
    pub fn get_state_root(&self, force: bool) -> Result<H256, StateError> {
        if !force && self.trie.checkpoint_depth() > 0 {
            return Err(StateError::UncommittedCheckpoints);
        }
        Ok(self.trie.hash())
    }

    /// Moves the manager to a different state root, dropping all caches.
    /// Only allowed with no open checkpoints.
    pub fn set_state_root(&mut self, root: H256) -> Result<(), StateError> {
        if self.trie.checkpoint_depth() > 0 {
            return Err(StateError::UncommittedCheckpoints);
        }
        self.trie.set_root(root).map_err(|err| match err {
            TrieError::MissingNode(_) => StateError::InvalidStateRoot(root),
            other => StateError::Trie(other),
        })?;
        self.account_cache.clear();
        self.storage_tries.clear();
        self.original_storage.clear();
        self.touched.clear();
        Ok(())
    }

    /// Independent manager over the same backing store, positioned at the
    /// last fully committed root, with no open checkpoints.
    pub fn copy(&self) -> Result<StateManager, StateError> {
        Self::open(self.db.clone(), self.trie.committed_root())
    }

    /// Initializes the state with plain balance allocations.
    /// Returns the resulting state root.
    pub fn generate_genesis(
        &mut self,
        alloc: impl IntoIterator<Item = (Address, U256)>,
    ) -> Result<H256, StateError> {
        if self.trie.checkpoint_depth() > 0 {
            return Err(StateError::UncommittedCheckpoints);
        }
        for (address, balance) in alloc {
            let account = AccountState {
                balance,
                ..Default::default()
            };
            self.put_account(address, account)?;
        }
        Ok(self.trie.hash())
    }

    /// Initializes the state from a genesis allocation, including code and
    /// storage. Returns the resulting state root.
    pub fn generate_canonical_genesis(&mut self, genesis: &Genesis) -> Result<H256, StateError> {
        if self.trie.checkpoint_depth() > 0 {
            return Err(StateError::UncommittedCheckpoints);
        }
        for (address, alloc) in &genesis.alloc {
            let account = AccountState {
                nonce: alloc.nonce.into(),
                balance: alloc.balance,
                ..Default::default()
            };
            self.put_account(*address, account)?;
            if !alloc.code.is_empty() {
                self.put_contract_code(*address, alloc.code.clone())?;
            }
            for (slot, value) in &alloc.storage {
                let value = U256::from_big_endian(value.as_bytes());
                if !value.is_zero() {
                    self.put_contract_storage(*address, *slot, value)?;
                }
            }
        }
        let root = self.trie.hash();
        debug!(accounts = genesis.alloc.len(), root = %root, "genesis state initialized");
        Ok(root)
    }
}

fn hash_address(address: &Address) -> Vec<u8> {
    Keccak256::new_with_prefix(address.as_bytes())
        .finalize()
        .to_vec()
}

fn hash_slot(slot: &H256) -> Vec<u8> {
    Keccak256::new_with_prefix(slot.as_bytes())
        .finalize()
        .to_vec()
}
