// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-process log and ledger.
//!
//! Back the devnet node and serve as test doubles. Each keeps call counters
//! so tests can assert what a submission touched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use anchor_kernel::{ConsensusTimestamp, Hash256};

use super::{
    AnchorCallArgs, AnchorEvent, AppendLog, AppendReceipt, BindingOutcome, CallReceipt, Ledger,
    LookupArgs, TxStatus, FN_ANCHOR_PROOF, FN_LOOKUP_PROOF,
};
use crate::errors::AnchorError;

/// One message in a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub sequence_number: u64,
    pub timestamp: ConsensusTimestamp,
    pub message: Vec<u8>,
}

/// Per-topic message lists with strictly increasing consensus timestamps.
#[derive(Debug, Default)]
pub(crate) struct TopicStore {
    topics: HashMap<String, Vec<StoredMessage>>,
    last_timestamp: ConsensusTimestamp,
}

impl TopicStore {
    /// Next consensus timestamp: wall clock, bumped past the previous one.
    pub(crate) fn next_timestamp(&mut self) -> ConsensusTimestamp {
        let now = ConsensusTimestamp::now();
        let ts = if now > self.last_timestamp { now } else { self.last_timestamp.successor() };
        self.last_timestamp = ts;
        ts
    }

    pub(crate) fn next_sequence(&self, topic_id: &str) -> u64 {
        self.topics.get(topic_id).map_or(1, |msgs| msgs.len() as u64 + 1)
    }

    pub(crate) fn insert(&mut self, topic_id: &str, stored: StoredMessage) {
        if stored.timestamp > self.last_timestamp {
            self.last_timestamp = stored.timestamp;
        }
        self.topics.entry(topic_id.to_string()).or_default().push(stored);
    }

    pub(crate) fn get(&self, topic_id: &str, timestamp: ConsensusTimestamp) -> Option<&StoredMessage> {
        let msgs = self.topics.get(topic_id)?;
        msgs.binary_search_by(|m| m.timestamp.cmp(&timestamp))
            .ok()
            .map(|idx| &msgs[idx])
    }

    pub(crate) fn len(&self) -> usize {
        self.topics.values().map(Vec::len).sum()
    }
}

pub(crate) fn check_message_size(message: &[u8], limit: usize) -> Result<(), AnchorError> {
    if message.is_empty() {
        return Err(AnchorError::AppendFailure("empty message".into()));
    }
    if message.len() > limit {
        return Err(AnchorError::AppendFailure(format!(
            "message of {} bytes exceeds the {} byte limit",
            message.len(),
            limit
        )));
    }
    Ok(())
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AnchorError> {
    mutex
        .lock()
        .map_err(|_| AnchorError::Internal("service state lock poisoned".into()))
}

#[derive(Debug)]
pub struct InMemoryLog {
    store: Mutex<TopicStore>,
    max_message_bytes: usize,
    appends: AtomicUsize,
    reads: AtomicUsize,
}

impl InMemoryLog {
    pub fn new(max_message_bytes: usize) -> Self {
        Self {
            store: Mutex::new(TopicStore::default()),
            max_message_bytes,
            appends: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    /// Append attempts, including rejected ones.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn message_count(&self) -> usize {
        self.store.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl AppendLog for InMemoryLog {
    fn append(&self, topic_id: &str, message: &[u8]) -> Result<AppendReceipt, AnchorError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        check_message_size(message, self.max_message_bytes)?;

        let mut store = lock(&self.store)?;
        let receipt = AppendReceipt {
            sequence_number: store.next_sequence(topic_id),
            timestamp: store.next_timestamp(),
        };
        store.insert(
            topic_id,
            StoredMessage {
                sequence_number: receipt.sequence_number,
                timestamp: receipt.timestamp,
                message: message.to_vec(),
            },
        );
        tracing::debug!(topic = topic_id, seq = receipt.sequence_number, ts = %receipt.timestamp, "appended");
        Ok(receipt)
    }

    fn read_at(&self, topic_id: &str, timestamp: ConsensusTimestamp) -> Result<Option<Vec<u8>>, AnchorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let store = lock(&self.store)?;
        Ok(store.get(topic_id, timestamp).map(|m| m.message.clone()))
    }
}

#[derive(Debug, Clone)]
struct Binding {
    inputs_hash: Hash256,
    rule_hash: Hash256,
    uri: String,
    transaction_id: String,
}

#[derive(Debug, Default)]
struct LedgerState {
    bindings: HashMap<Hash256, Binding>,
    transactions: HashMap<String, CallReceipt>,
    last_timestamp: ConsensusTimestamp,
    queries: u64,
}

impl LedgerState {
    /// Transaction ids follow `payer@seconds.nanos`.
    fn next_transaction_id(&mut self, payer: &str) -> String {
        let now = ConsensusTimestamp::now();
        let ts = if now > self.last_timestamp { now } else { self.last_timestamp.successor() };
        self.last_timestamp = ts;
        format!("{}@{}", payer, ts)
    }
}

/// A single deployed anchor contract.
#[derive(Debug)]
pub struct InMemoryLedger {
    contract_id: String,
    payer_id: String,
    state: Mutex<LedgerState>,
    calls: AtomicUsize,
    anchor_calls: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new(contract_id: impl Into<String>, payer_id: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            payer_id: payer_id.into(),
            state: Mutex::new(LedgerState::default()),
            calls: AtomicUsize::new(0),
            anchor_calls: AtomicUsize::new(0),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    /// All contract calls, lookups included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `anchorProof` calls only.
    pub fn anchor_call_count(&self) -> usize {
        self.anchor_calls.load(Ordering::SeqCst)
    }

    pub fn binding_count(&self) -> usize {
        self.state.lock().map(|s| s.bindings.len()).unwrap_or(0)
    }

    fn replay_event(proof_hash: Hash256, binding: &Binding) -> AnchorEvent {
        AnchorEvent {
            outcome: BindingOutcome::Replay,
            proof_hash,
            inputs_hash: Some(binding.inputs_hash),
            rule_hash: Some(binding.rule_hash),
            uri: binding.uri.clone(),
            bound_transaction: Some(binding.transaction_id.clone()),
        }
    }

    fn anchor(&self, state: &mut LedgerState, args: &[u8]) -> CallReceipt {
        let transaction_id = state.next_transaction_id(&self.payer_id);
        let receipt = match AnchorCallArgs::from_slice(args) {
            Err(e) => {
                tracing::debug!(tx = %transaction_id, "anchorProof reverted: {}", e);
                CallReceipt { transaction_id: transaction_id.clone(), status: TxStatus::Reverted, events: vec![] }
            }
            Ok(args) => {
                let event = match state.bindings.get(&args.proof_hash) {
                    Some(existing) => Self::replay_event(args.proof_hash, existing),
                    None => {
                        state.bindings.insert(
                            args.proof_hash,
                            Binding {
                                inputs_hash: args.inputs_hash,
                                rule_hash: args.rule_hash,
                                uri: args.uri.clone(),
                                transaction_id: transaction_id.clone(),
                            },
                        );
                        AnchorEvent {
                            outcome: BindingOutcome::Fresh,
                            proof_hash: args.proof_hash,
                            inputs_hash: Some(args.inputs_hash),
                            rule_hash: Some(args.rule_hash),
                            uri: args.uri,
                            bound_transaction: None,
                        }
                    }
                };
                CallReceipt {
                    transaction_id: transaction_id.clone(),
                    status: TxStatus::Success,
                    events: vec![event.to_ledger_event()],
                }
            }
        };
        state.transactions.insert(transaction_id, receipt.clone());
        receipt
    }

    fn lookup(&self, state: &mut LedgerState, args: &[u8]) -> CallReceipt {
        state.queries += 1;
        let transaction_id = format!("query-{}", state.queries);
        match LookupArgs::from_slice(args) {
            Err(_) => CallReceipt { transaction_id, status: TxStatus::Reverted, events: vec![] },
            Ok(args) => CallReceipt {
                transaction_id,
                status: TxStatus::Success,
                events: state
                    .bindings
                    .get(&args.proof_hash)
                    .map(|b| Self::replay_event(args.proof_hash, b).to_ledger_event())
                    .into_iter()
                    .collect(),
            },
        }
    }
}

impl Ledger for InMemoryLedger {
    fn call(&self, contract_id: &str, function: &str, args: &[u8]) -> Result<CallReceipt, AnchorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.state)?;

        if contract_id != self.contract_id {
            let transaction_id = state.next_transaction_id(&self.payer_id);
            return Ok(CallReceipt { transaction_id, status: TxStatus::InvalidContractId, events: vec![] });
        }

        match function {
            FN_ANCHOR_PROOF => {
                self.anchor_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.anchor(&mut state, args))
            }
            FN_LOOKUP_PROOF => Ok(self.lookup(&mut state, args)),
            _ => {
                let transaction_id = state.next_transaction_id(&self.payer_id);
                let receipt = CallReceipt { transaction_id: transaction_id.clone(), status: TxStatus::InvalidSelector, events: vec![] };
                state.transactions.insert(transaction_id, receipt.clone());
                Ok(receipt)
            }
        }
    }

    fn transaction(&self, transaction_id: &str) -> Result<Option<CallReceipt>, AnchorError> {
        let state = lock(&self.state)?;
        Ok(state.transactions.get(transaction_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_kernel::binding::CanonicalHashSet;

    fn hashes(seed: u8) -> CanonicalHashSet {
        CanonicalHashSet {
            proof_hash: Hash256([seed; 32]),
            inputs_hash: Hash256([seed.wrapping_add(1); 32]),
            rule_hash: Hash256([seed.wrapping_add(2); 32]),
        }
    }

    #[test]
    fn test_log_timestamps_strictly_increase() {
        let log = InMemoryLog::new(1024);
        let a = log.append("0.0.1", b"first").unwrap();
        let b = log.append("0.0.1", b"second").unwrap();
        let c = log.append("0.0.2", b"other").unwrap();

        assert!(a.timestamp < b.timestamp && b.timestamp < c.timestamp);
        assert_eq!((a.sequence_number, b.sequence_number, c.sequence_number), (1, 2, 1));
        assert_eq!(log.read_at("0.0.1", b.timestamp).unwrap(), Some(b"second".to_vec()));
        assert_eq!(log.read_at("0.0.2", b.timestamp).unwrap(), None);
    }

    #[test]
    fn test_log_enforces_message_cap() {
        let log = InMemoryLog::new(4);
        assert!(log.append("0.0.1", b"1234").is_ok());
        assert!(matches!(log.append("0.0.1", b"12345"), Err(AnchorError::AppendFailure(_))));
        assert_eq!(log.message_count(), 1);
        assert_eq!(log.append_count(), 2);
    }

    #[test]
    fn test_ledger_distinguishes_fresh_and_replay() {
        let ledger = InMemoryLedger::new("0.0.5005", "0.0.1001");
        let args = AnchorCallArgs::new(&hashes(1), "hcs://0.0.6006/1.000000001").to_bytes().unwrap();

        let first = ledger.call("0.0.5005", FN_ANCHOR_PROOF, &args).unwrap();
        let fresh = AnchorEvent::from_receipt(&first).unwrap().unwrap();
        assert_eq!(fresh.outcome, BindingOutcome::Fresh);

        let other = AnchorCallArgs::new(&hashes(1), "hcs://0.0.6006/2.000000000").to_bytes().unwrap();
        let second = ledger.call("0.0.5005", FN_ANCHOR_PROOF, &other).unwrap();
        let replay = AnchorEvent::from_receipt(&second).unwrap().unwrap();
        assert_eq!(replay.outcome, BindingOutcome::Replay);
        assert_eq!(replay.uri, "hcs://0.0.6006/1.000000001");
        assert_eq!(replay.bound_transaction.as_deref(), Some(first.transaction_id.as_str()));
        assert_eq!(ledger.binding_count(), 1);
    }

    #[test]
    fn test_lookup_is_read_only() {
        let ledger = InMemoryLedger::new("0.0.5005", "0.0.1001");
        let lookup = LookupArgs { proof_hash: Hash256([7; 32]) }.to_bytes().unwrap();

        let miss = ledger.call("0.0.5005", FN_LOOKUP_PROOF, &lookup).unwrap();
        assert!(miss.status.is_success());
        assert!(miss.events.is_empty());
        assert_eq!(ledger.transaction(&miss.transaction_id).unwrap(), None);
        assert_eq!(ledger.binding_count(), 0);

        let args = AnchorCallArgs::new(&hashes(7), "hcs://0.0.6006/1").to_bytes().unwrap();
        ledger.call("0.0.5005", FN_ANCHOR_PROOF, &args).unwrap();
        let hit = ledger.call("0.0.5005", FN_LOOKUP_PROOF, &lookup).unwrap();
        let event = AnchorEvent::from_receipt(&hit).unwrap().unwrap();
        assert_eq!(event.outcome, BindingOutcome::Replay);
        assert_eq!(event.inputs_hash, Some(Hash256([8; 32])));
    }

    #[test]
    fn test_ledger_statuses() {
        let ledger = InMemoryLedger::new("0.0.5005", "0.0.1001");
        let wrong_contract = ledger.call("0.0.9999", FN_ANCHOR_PROOF, b"{}").unwrap();
        assert_eq!(wrong_contract.status, TxStatus::InvalidContractId);

        let bad_selector = ledger.call("0.0.5005", "burn", b"{}").unwrap();
        assert_eq!(bad_selector.status, TxStatus::InvalidSelector);
        assert!(ledger.transaction(&bad_selector.transaction_id).unwrap().is_some());

        let bad_args = ledger.call("0.0.5005", FN_ANCHOR_PROOF, b"{\"proofHash\":1}").unwrap();
        assert_eq!(bad_args.status, TxStatus::Reverted);
        assert_eq!(ledger.call_count(), 3);
        assert_eq!(ledger.anchor_call_count(), 2);
    }
}
