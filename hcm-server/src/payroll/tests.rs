use super::*;
use shared::models::{Compensation, Employee};

fn policy() -> PayrollPolicy {
    PayrollPolicy::from_config(&Config::for_tests())
}

fn employee(compensation: Option<Compensation>) -> Employee {
    Employee {
        id: 1,
        tenant_id: "acme".into(),
        employee_code: "E1".into(),
        user_id: None,
        manager_id: None,
        personal_info: Default::default(),
        company_info: Default::default(),
        bank_info: Default::default(),
        compensation,
        documents: vec![],
        qualifications: vec![],
        previous_employment: vec![],
        status: Default::default(),
        onboarding_step: 1,
        created_at: 0,
        updated_at: 0,
    }
}

fn request() -> PayrollCreate {
    PayrollCreate {
        employee_id: 1,
        month: 3,
        year: 2025,
        basic_salary: None,
        allowances: None,
        deductions: None,
        currency: None,
        country: None,
    }
}

#[test]
fn test_default_structure_breakdown() {
    let p = policy();
    let structure = p.resolve(&employee(None), &request());
    let b = p.compute(&structure, &p.default_rule("India").brackets).unwrap();

    assert_eq!(b.gross_salary, 112_500.0);
    assert_eq!(b.taxable_income, 105_000.0);
    assert_eq!(b.tax, 11_550.0);
    assert_eq!(b.total_deductions, 20_750.0);
    assert_eq!(b.net_salary, 91_750.0);
    assert_eq!(structure.currency, "INR");
    assert_eq!(structure.country, "India");
}

#[test]
fn test_tax_rounds_half_away_from_zero() {
    let rate = tax::flat(0.11);
    // 50 x 0.11 = 5.5 -> 6
    let b = compute(50.0, &[], &[], &rate).unwrap();
    assert_eq!(b.tax, 6.0);
    assert_eq!(b.net_salary, 44.0);

    let b = compute(1_000.10, &[], &[], &rate).unwrap();
    assert_eq!(b.tax, 110.0);
    assert_eq!(b.net_salary, 890.1);
}

#[test]
fn test_compensation_wins_over_request() {
    let p = policy();
    let comp = Compensation {
        annual_ctc: 1_200_000.0,
        monthly_basic: 60_000.0,
        allowances: vec![],
        deductions: vec![],
        currency: Some("USD".into()),
    };
    let mut req = request();
    req.basic_salary = Some(1.0);
    req.currency = Some("EUR".into());

    let structure = p.resolve(&employee(Some(comp)), &req);
    assert_eq!(structure.basic_salary, 60_000.0);
    assert_eq!(structure.currency, "USD");
    assert!(structure.allowances.is_empty());

    // Without compensation the request overrides apply
    let structure = p.resolve(&employee(None), &req);
    assert_eq!(structure.basic_salary, 1.0);
    assert_eq!(structure.currency, "EUR");
    assert_eq!(structure.allowances.len(), 3);
}

#[test]
fn test_country_drives_currency_and_brackets() {
    let p = policy();
    let mut req = request();
    req.country = Some("united kingdom".into());

    let structure = p.resolve(&employee(None), &req);
    assert_eq!(structure.country, "UK");
    assert_eq!(structure.currency, "GBP");

    let rule = p.default_rule("uk");
    assert!(rule.is_default);
    assert_eq!(rule.currency, "GBP");

    // Default structure: taxable 105000 over 0-50000 at 0% and the rest at 20%
    let brackets = vec![
        TaxBracket { min: 0.0, max: Some(50_000.0), rate: 0.0 },
        TaxBracket { min: 50_000.0, max: None, rate: 0.2 },
    ];
    let b = p.compute(&structure, &brackets).unwrap();
    assert_eq!(b.taxable_income, 105_000.0);
    assert_eq!(b.tax, 11_000.0);
    assert_eq!(b.net_salary, 112_500.0 - 9_200.0 - 11_000.0);
}

#[test]
fn test_invalid_amounts_rejected() {
    let rate = tax::flat(0.11);
    let err = compute(-1.0, &[], &[], &rate).unwrap_err();
    assert_eq!(err.code, ErrorCode::PayrollInvalidAmount);

    let bad = [Allowance {
        name: "HRA".into(),
        amount: f64::NAN,
        taxable: true,
    }];
    assert!(compute(100.0, &bad, &[], &rate).is_err());
}

#[test]
fn test_transitions() {
    use PayrollStatus::*;
    assert!(can_transition(Draft, Processed));
    assert!(can_transition(Processed, Paid));
    assert!(can_transition(Processed, Cancelled));
    assert!(!can_transition(Draft, Paid));
    assert!(!can_transition(Paid, Cancelled));
    assert!(!can_transition(Cancelled, Draft));

    assert_eq!(sources_of(Cancelled), vec![Draft, Processed]);
    assert_eq!(sources_of(Paid), vec![Processed]);
}

#[test]
fn test_period_validation() {
    assert!(validate_period(1, 2025).is_ok());
    assert!(validate_period(12, 2100).is_ok());
    assert_eq!(validate_period(13, 2025).unwrap_err().code, ErrorCode::PayrollInvalidPeriod);
    assert_eq!(validate_period(0, 2025).unwrap_err().code, ErrorCode::PayrollInvalidPeriod);
    assert_eq!(validate_period(6, 1999).unwrap_err().code, ErrorCode::PayrollInvalidPeriod);
}

#[test]
fn test_payslip_lines_and_currency() {
    let p = policy();
    let emp = employee(None);
    let structure = p.resolve(&emp, &request());
    let breakdown = p.compute(&structure, &p.default_rule(&structure.country).brackets).unwrap();
    let record = draft(&emp, 3, 2025, structure, breakdown);
    assert_eq!(record.status, PayrollStatus::Draft);
    assert_eq!(record.tenant_id, "acme");

    let slip = payslip(&record, &emp);
    // Basic + three allowances
    assert_eq!(slip.earnings.len(), 4);
    assert_eq!(slip.earnings[0].amount, 75_000.0);
    // PF, professional tax, income tax
    assert_eq!(slip.deductions.len(), 3);
    assert_eq!(slip.deductions.last().unwrap().amount, 11_550.0);
    let deducted: f64 = slip.deductions.iter().map(|d| d.amount).sum();
    assert_eq!(deducted, slip.total_deductions);
    assert_eq!(slip.currency, "INR");
    assert_eq!(slip.net_salary, 91_750.0);
}
