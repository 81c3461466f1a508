use std::{
    collections::{HashSet, VecDeque},
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use ethers::types::{TxHash, U256};
use uuid::Uuid;

use crate::models::{
    settlement::{OperationStage, SettlementKind, SettlementRecord},
    token::format_units,
};

const MAX_RECORDS: usize = 1_000;

/// In-memory trail of claim and sell invocations. Records which legs went
/// out so a payment that was never paid back can be found by hand.
#[derive(Debug, Default)]
pub struct SettlementJournal {
    records: Mutex<VecDeque<SettlementRecord>>,
}

impl SettlementJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<SettlementRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self, kind: SettlementKind, user_address: &str, amount: U256) -> Uuid {
        let now = Utc::now();
        let record = SettlementRecord {
            id: Uuid::new_v4(),
            kind,
            user_address: user_address.to_string(),
            amount: format_units(amount, 18),
            first_leg_hash: None,
            first_leg_confirmed: false,
            second_leg_hash: None,
            stage: OperationStage::Idle,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        let id = record.id;

        let mut records = self.records();
        if records.len() == MAX_RECORDS {
            records.pop_front();
        }
        records.push_back(record);
        id
    }

    fn update<F: FnOnce(&mut SettlementRecord)>(&self, id: Uuid, f: F) {
        if let Some(record) = self.records().iter_mut().find(|r| r.id == id) {
            f(record);
            record.updated_at = Utc::now();
        }
    }

    /// Terminal stages are final; later transitions are ignored.
    pub fn advance(&self, id: Uuid, stage: OperationStage) {
        self.update(id, |r| {
            if !r.stage.is_terminal() {
                r.stage = stage;
            }
        });
    }

    pub fn record_first_leg(&self, id: Uuid, hash: TxHash) {
        self.update(id, |r| r.first_leg_hash = Some(hash));
    }

    pub fn confirm_first_leg(&self, id: Uuid) {
        self.update(id, |r| r.first_leg_confirmed = true);
    }

    pub fn record_second_leg(&self, id: Uuid, hash: TxHash) {
        self.update(id, |r| r.second_leg_hash = Some(hash));
    }

    pub fn succeed(&self, id: Uuid) {
        self.advance(id, OperationStage::Succeeded);
    }

    pub fn fail(&self, id: Uuid, reason: &str) {
        self.update(id, |r| {
            r.stage = OperationStage::Failed;
            r.failure_reason = Some(reason.to_string());
        });
    }

    pub fn get(&self, id: Uuid) -> Option<SettlementRecord> {
        self.records().iter().find(|r| r.id == id).cloned()
    }

    /// Newest first.
    pub fn snapshot(&self) -> Vec<SettlementRecord> {
        self.records().iter().rev().cloned().collect()
    }

    pub fn stranded(&self) -> Vec<SettlementRecord> {
        self.records()
            .iter()
            .rev()
            .filter(|r| r.is_stranded())
            .cloned()
            .collect()
    }
}

/// User transfers already taken by a sell. Unlike the journal this is never
/// trimmed, so a transfer can back at most one payout.
#[derive(Debug, Default)]
pub struct SpentTransfers {
    hashes: Mutex<HashSet<TxHash>>,
}

impl SpentTransfers {
    pub fn new() -> Self {
        Self::default()
    }

    fn hashes(&self) -> MutexGuard<'_, HashSet<TxHash>> {
        self.hashes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns false if `hash` is already taken.
    pub fn take(&self, hash: TxHash) -> bool {
        self.hashes().insert(hash)
    }

    /// Hand back a transfer whose payout was never sent.
    pub fn release(&self, hash: TxHash) {
        self.hashes().remove(&hash);
    }
}
