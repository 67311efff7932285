/// Group an integer string the Indian way: last three digits, then pairs.
fn group_indian(int_part: &str) -> String {
    let len = int_part.len();
    if len <= 3 {
        return int_part.to_string();
    }
    let (head, tail) = int_part.split_at(len - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Format a float as rupees with Indian digit grouping: ₹1,23,456.78
pub fn rupees(val: f64) -> String {
    let negative = val < 0.0;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = group_indian(int_part);
    if negative {
        format!("-₹{grouped}.{dec_part}")
    } else {
        format!("₹{grouped}.{dec_part}")
    }
}

/// Whole-rupee variant for dashboard figures: ₹1,23,457
pub fn rupees_rounded(val: f64) -> String {
    let rounded = val.round();
    let grouped = group_indian(&format!("{}", rounded.abs() as u64));
    if rounded < 0.0 {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupees_formatting() {
        assert_eq!(rupees(1234.5), "₹1,234.50");
        assert_eq!(rupees(123456.78), "₹1,23,456.78");
        assert_eq!(rupees(10000000.0), "₹1,00,00,000.00");
        assert_eq!(rupees(-500.0), "-₹500.00");
        assert_eq!(rupees(0.0), "₹0.00");
    }

    #[test]
    fn test_rupees_rounded() {
        assert_eq!(rupees_rounded(123456.78), "₹1,23,457");
        assert_eq!(rupees_rounded(-90000.0), "-₹90,000");
        assert_eq!(rupees_rounded(350.0), "₹350");
    }
}
