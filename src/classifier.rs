//! Decides which billing lines count as clinician-attributable revenue.

/// Service types that are pass-through costs as a whole. Compared exactly.
pub const EXCLUDED_SERVICE_TYPES: &[&str] =
    &["Laboratory", "Radiology", "Pharmacy", "Consumables", "Ambulance"];

/// Case-insensitive substrings of service names that are never creditable.
pub const EXCLUDED_KEYWORDS: &[&str] = &[
    // Radiology & imaging
    "X-Ray", "X Ray", "Xray", "Chest X", "Extremities", "Joints", "Bones",
    "CT Scan", "NCCT", "CECT", "HRCT", "CT Head", "CT Chest", "CT PNS", "Ct Face",
    "MRI", "MR Scan", "Mammography", "OPG",
    "Ultrasound", "USG", "Sonography", "Doppler", "Echo", "Echocardiography",
    // Non-lab diagnostics
    "ECG", "Electrocardiogram", "TMT", "Holter", "PFT", "Uroflowmetry",
    "EEG", "EMG", "NCV", "Audiometry",
    // Nursing and consumable procedures
    "Injection", "Inj ", "IM/IV", "Cannula", "Cath", "Catheterisation", "Ryle Tube",
    "Nebuliser", "Nebulization", "Steam", "Enema", "Physiotherapy", "Physio",
    "Dressing Charge",
    "Iv Set", "Iv Fluid", "Infusion", "Cut Down", "Suture Removal Charge",
    // Administrative and hospital overhead
    "Registration", "Admission", "File Charge", "Card", "Renewal",
    "Bed Charge", "Room Rent", "Nursing", "DMO", "RMO", "Ambulance",
    "Diet", "Food", "Beverage", "MLC", "Biomedical", "Service Charge",
    // Laboratory, for rows whose service type is not set
    "Blood", "Urine", "Stool", "Culture", "Biospy", "Pathology", "Sample", "Test", "Profile",
    "Sugar", "Glucose", "Hemoglobin", "CBC", "Platelet", "Creatinine",
    // Pharmacy and consumables
    "Drug", "Medicine", "Tablet", "Cap ", "Syringe", "Gloves", "Mask", "Cotton", "Bandage",
];

/// The keyword that excludes `service_name`, if any.
pub fn matching_keyword(service_name: &str) -> Option<&'static str> {
    let name = service_name.to_lowercase();
    EXCLUDED_KEYWORDS
        .iter()
        .find(|kw| name.contains(&kw.to_lowercase()))
        .copied()
}

pub fn is_excluded(service_name: &str, service_type: &str) -> bool {
    if service_name.is_empty() {
        return true;
    }
    if EXCLUDED_SERVICE_TYPES.contains(&service_type) {
        return true;
    }
    matching_keyword(service_name).is_some()
}
