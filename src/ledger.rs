use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

use crate::error::{RevenueError, Result};
use crate::export::{build_report, ReportGrid};
use crate::importer::{parse_batch, BatchReport, ImporterKind};
use crate::models::{Category, Transaction};
use crate::reports::{summarize, Summary};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Deduplicated, insertion-ordered set of transactions for one session.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    ids: HashSet<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    pub added: usize,
    pub duplicates: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        if !self.ids.contains(id) {
            return None;
        }
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Append every transaction whose id is new, in batch order.
    pub fn merge(&mut self, batch: Vec<Transaction>) -> MergeResult {
        let mut result = MergeResult::default();
        for txn in batch {
            if self.ids.insert(txn.id.clone()) {
                self.transactions.push(txn);
                result.added += 1;
            } else {
                result.duplicates += 1;
            }
        }
        info!(
            "merged batch: {} added, {} duplicates skipped",
            result.added, result.duplicates
        );
        result
    }
}

pub fn merge_into_ledger(mut ledger: Ledger, batch: Vec<Transaction>) -> Ledger {
    ledger.merge(batch);
    ledger
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct Override {
    #[serde(default)]
    pub deduction: f64,
    #[serde(default)]
    pub deleted: bool,
}

/// User edits keyed by transaction id, layered over the immutable ledger.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeMap<String, Override>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, id: &str) -> Override {
        self.0.get(id).copied().unwrap_or_default()
    }

    pub fn deduction(&self, id: &str) -> f64 {
        self.get(id).deduction
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.get(id).deleted
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Override)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn entry(&mut self, id: &str) -> &mut Override {
        self.0.entry(id.to_string()).or_default()
    }

    fn prune(&mut self, id: &str) {
        if self.0.get(id).is_some_and(|o| *o == Override::default()) {
            self.0.remove(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// One month/category pill, e.g. "Sep 2025 OPD Consult".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub key: String,
    pub label: String,
    pub count: usize,
}

pub fn filter_key(txn: &Transaction) -> String {
    format!("{}|{}", txn.month_year, txn.category.tag())
}

pub fn filter_label(txn: &Transaction) -> String {
    format!("{} {}", txn.month_year, txn.category.tag())
}

/// Unique month/category filters present in `transactions`, sorted by label.
pub fn available_filters(transactions: &[Transaction]) -> Vec<FilterOption> {
    let mut by_key: BTreeMap<String, FilterOption> = BTreeMap::new();
    for txn in transactions {
        by_key
            .entry(filter_key(txn))
            .or_insert_with(|| FilterOption {
                key: filter_key(txn),
                label: filter_label(txn),
                count: 0,
            })
            .count += 1;
    }
    let mut options: Vec<FilterOption> = by_key.into_values().collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

/// An empty selection means every filter is active. Selections match either
/// the key or the label, case-insensitively.
pub fn matches_filters(txn: &Transaction, active: &[String]) -> bool {
    if active.is_empty() {
        return true;
    }
    let key = filter_key(txn);
    let label = filter_label(txn);
    active
        .iter()
        .any(|a| a.eq_ignore_ascii_case(&key) || a.eq_ignore_ascii_case(&label))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct IngestReport {
    pub batch: BatchReport,
    pub merge: MergeResult,
}

/// Everything a single working session holds in memory.
pub struct Session {
    ledger: Ledger,
    overrides: Overrides,
    pub salary: f64,
    pub months: u32,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ledger: Ledger::new(),
            overrides: Overrides::new(),
            salary: settings.salary,
            months: settings.months,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Parse files in order and merge the successful ones into the ledger.
    pub fn ingest(&mut self, files: &[PathBuf], format: Option<ImporterKind>) -> IngestReport {
        let mut batch = parse_batch(files, format);
        let incoming = std::mem::take(&mut batch.transactions);
        let offered = incoming.len();
        let before = self.ledger.len();
        self.ledger = merge_into_ledger(std::mem::take(&mut self.ledger), incoming);
        let added = self.ledger.len() - before;
        IngestReport {
            batch,
            merge: MergeResult {
                added,
                duplicates: offered - added,
            },
        }
    }

    fn ipd_transaction(&self, id: &str) -> Result<&Transaction> {
        let txn = self
            .ledger
            .get(id)
            .ok_or_else(|| RevenueError::UnknownTransaction(id.to_string()))?;
        if txn.category != Category::Ipd {
            return Err(RevenueError::NotIpd(id.to_string()));
        }
        Ok(txn)
    }

    pub fn set_deduction(&mut self, id: &str, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(RevenueError::InvalidOverride(format!(
                "deduction for {id} must be a non-negative amount, got {amount}"
            )));
        }
        self.ipd_transaction(id)?;
        self.overrides.entry(id).deduction = amount;
        self.overrides.prune(id);
        Ok(())
    }

    /// Flip the soft-delete flag and return the new state.
    pub fn toggle_deleted(&mut self, id: &str) -> Result<bool> {
        self.ipd_transaction(id)?;
        let entry = self.overrides.entry(id);
        entry.deleted = !entry.deleted;
        let deleted = entry.deleted;
        self.overrides.prune(id);
        Ok(deleted)
    }

    pub fn set_deleted(&mut self, id: &str, deleted: bool) -> Result<()> {
        if self.overrides.is_deleted(id) != deleted {
            self.toggle_deleted(id)?;
        }
        Ok(())
    }

    /// Apply a whole overrides map, checking every entry against the ledger.
    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        for (id, o) in overrides.iter() {
            self.set_deduction(id, o.deduction)?;
            self.set_deleted(id, o.deleted)?;
        }
        Ok(())
    }

    pub fn view(&self, active: &[String]) -> Vec<Transaction> {
        self.ledger
            .transactions()
            .iter()
            .filter(|t| matches_filters(t, active))
            .cloned()
            .collect()
    }

    pub fn summary(&self, active: &[String]) -> Summary {
        summarize(&self.view(active), &self.overrides)
    }

    pub fn report(&self, active: &[String]) -> Result<ReportGrid> {
        build_report(&self.view(active), self.salary, self.months, &self.overrides)
    }
}
