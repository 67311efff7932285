use crate::ledger::Overrides;
use crate::models::{Category, Transaction};

/// Procedures above this gross amount count as emergency procedures.
pub const EMERGENCY_THRESHOLD: f64 = 1600.0;

/// Flat withholding applied to the incentive before payout.
pub const TDS_RATE: f64 = 0.10;

pub fn is_dressing(service_name: &str) -> bool {
    let name = service_name.to_lowercase();
    name.contains("dressing") || name.contains("suture removal")
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Ipd,
    Consultations,
    Procedures,
    Dressings,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::Ipd,
        Segment::Consultations,
        Segment::Procedures,
        Segment::Dressings,
    ];

    pub fn of(txn: &Transaction) -> Self {
        match txn.category {
            Category::Ipd => Self::Ipd,
            Category::OpdConsultation => Self::Consultations,
            Category::OpdProcedure if is_dressing(&txn.service_name) => Self::Dressings,
            Category::OpdProcedure => Self::Procedures,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Ipd => "IPD Sections",
            Self::Consultations => "OPD Consultations",
            Self::Procedures => "OPD Procedures",
            Self::Dressings => "OPD Dressings",
        }
    }
}

/// Listing filter over the ledger. `Dressing` matches on service name alone,
/// whatever the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFilter {
    All,
    Ipd,
    Consult,
    Dressing,
    Proc,
}

impl SegmentFilter {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "ipd" => Some(Self::Ipd),
            "consult" => Some(Self::Consult),
            "dressing" => Some(Self::Dressing),
            "proc" => Some(Self::Proc),
            _ => None,
        }
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Ipd => txn.category == Category::Ipd,
            Self::Consult => txn.category == Category::OpdConsultation,
            Self::Dressing => is_dressing(&txn.service_name),
            Self::Proc => {
                txn.category == Category::OpdProcedure && !is_dressing(&txn.service_name)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Summary {
    pub transactions: usize,
    pub deleted: usize,
    pub total_revenue: f64,
    pub ipd_share: f64,
    pub consult_share: f64,
    /// All OPD procedures, dressings included.
    pub procedure_share: f64,
    pub dressing_share: f64,
    pub other_procedure_share: f64,
    pub admissions: usize,
    pub consultations: usize,
    pub emergency_procedures: usize,
    pub dressings: usize,
}

/// Non-deleted procedure lines that are large or involve suturing.
pub fn is_emergency_procedure(txn: &Transaction) -> bool {
    txn.gross_amount > EMERGENCY_THRESHOLD || txn.service_name.to_lowercase().contains("suturing")
}

/// Share totals and counts over `transactions`, skipping soft-deleted lines.
pub fn summarize(transactions: &[Transaction], overrides: &Overrides) -> Summary {
    let mut s = Summary {
        transactions: transactions.len(),
        ..Default::default()
    };
    for txn in transactions {
        if overrides.is_deleted(&txn.id) {
            s.deleted += 1;
            continue;
        }
        let share = txn.calculated_share;
        s.total_revenue += share;
        match Segment::of(txn) {
            Segment::Ipd => {
                s.ipd_share += share;
                s.admissions += 1;
            }
            Segment::Consultations => {
                s.consult_share += share;
                s.consultations += 1;
            }
            Segment::Procedures => {
                s.procedure_share += share;
                s.other_procedure_share += share;
                if is_emergency_procedure(txn) {
                    s.emergency_procedures += 1;
                }
            }
            Segment::Dressings => {
                s.procedure_share += share;
                s.dressing_share += share;
                s.dressings += 1;
            }
        }
    }
    s
}

// ---------------------------------------------------------------------------
// Payout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Financials {
    pub total_revenue: f64,
    pub salary: f64,
    pub months: u32,
    pub total_deduction: f64,
    pub incentive: f64,
    pub net_payout: f64,
}

impl Financials {
    pub fn compute(total_revenue: f64, salary: f64, months: u32) -> Self {
        let total_deduction = salary * months as f64;
        let incentive = total_revenue - total_deduction;
        Self {
            total_revenue,
            salary,
            months,
            total_deduction,
            incentive,
            net_payout: incentive * (1.0 - TDS_RATE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;

    fn txn(id: &str, category: Category, service: &str, gross: f64) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: "01/09/2025".to_string(),
            month_year: "Sep 2025".to_string(),
            sort_date: None,
            patient_name: "P".to_string(),
            service_name: service.to_string(),
            category,
            gross_amount: gross,
            calculated_share: gross * category.share_rate(),
            source_file: "f.xlsx".to_string(),
            source_type: SourceType::OpdProcedure,
        }
    }

    #[test]
    fn test_segment_of() {
        assert_eq!(Segment::of(&txn("a", Category::Ipd, "Dressing", 1.0)), Segment::Ipd);
        assert_eq!(
            Segment::of(&txn("b", Category::OpdConsultation, "Consult", 1.0)),
            Segment::Consultations
        );
        assert_eq!(
            Segment::of(&txn("c", Category::OpdProcedure, "Suture Removal", 1.0)),
            Segment::Dressings
        );
        assert_eq!(
            Segment::of(&txn("d", Category::OpdProcedure, "Suturing", 1.0)),
            Segment::Procedures
        );
    }

    #[test]
    fn test_summarize_partitions_shares() {
        let txns = vec![
            txn("a", Category::Ipd, "IPD Treatment", 10000.0),
            txn("b", Category::OpdConsultation, "Consultation", 500.0),
            txn("c", Category::OpdProcedure, "Wound Dressing", 400.0),
            txn("d", Category::OpdProcedure, "Incision and drainage", 2000.0),
            txn("e", Category::OpdProcedure, "Suturing of wound", 800.0),
            txn("f", Category::OpdProcedure, "Foreign body removal", 1000.0),
        ];
        let s = summarize(&txns, &Overrides::new());
        assert_eq!(s.ipd_share, 2000.0);
        assert_eq!(s.consult_share, 350.0);
        assert_eq!(s.dressing_share, 200.0);
        assert_eq!(s.other_procedure_share, 1900.0);
        assert_eq!(s.procedure_share, 2100.0);
        assert_eq!(s.total_revenue, 4450.0);
        assert_eq!(s.admissions, 1);
        assert_eq!(s.consultations, 1);
        assert_eq!(s.emergency_procedures, 2);
        assert_eq!(s.dressings, 1);
        assert_eq!(s.transactions, 6);
        assert_eq!(s.deleted, 0);
    }

    #[test]
    fn test_segment_filter() {
        let dressing_consult = txn("a", Category::OpdConsultation, "Dressing review", 1.0);
        assert!(SegmentFilter::Dressing.matches(&dressing_consult));
        assert!(SegmentFilter::Consult.matches(&dressing_consult));
        assert!(!SegmentFilter::Proc.matches(&dressing_consult));
        assert!(SegmentFilter::Proc.matches(&txn("b", Category::OpdProcedure, "I&D", 1.0)));
        assert_eq!(SegmentFilter::from_key("PROC"), Some(SegmentFilter::Proc));
        assert_eq!(SegmentFilter::from_key("lab"), None);
    }

    #[test]
    fn test_financials() {
        let f = Financials::compute(400000.0, 250000.0, 1);
        assert_eq!(f.total_deduction, 250000.0);
        assert_eq!(f.incentive, 150000.0);
        assert_eq!(f.net_payout, 135000.0);

        let f = Financials::compute(400000.0, 250000.0, 2);
        assert_eq!(f.incentive, -100000.0);
        assert_eq!(f.net_payout, -90000.0);
    }
}
