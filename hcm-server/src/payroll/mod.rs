//! Payroll calculation using rust_decimal for precision
//!
//! All arithmetic is done in `Decimal`, then converted to `f64` for
//! storage/serialization. Amounts keep 2 decimal places; tax is rounded to
//! whole currency units.

pub mod tax;

use rust_decimal::prelude::*;
use shared::models::{
    Allowance, Deduction, Employee, Payroll, PayrollCreate, PayrollStatus, Payslip,
    PayslipEmployee, PayslipLine, TaxBracket, TaxRule,
};
use shared::util::{now_millis, snowflake_id};

use crate::core::Config;
use crate::utils::{AppError, AppResult, ErrorCode};

const DECIMAL_PLACES: u32 = 2;

/// Upper bound for any single amount
const MAX_AMOUNT: f64 = 1_000_000_000.0;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Amounts must be finite, non-negative and below the cap
fn require_amount(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 || value > MAX_AMOUNT {
        return Err(AppError::with_message(
            ErrorCode::PayrollInvalidAmount,
            format!("{} must be a non-negative amount, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// Salary inputs for one payroll record
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryStructure {
    pub basic_salary: f64,
    pub allowances: Vec<Allowance>,
    pub deductions: Vec<Deduction>,
    pub currency: String,
    pub country: String,
}

/// Computed amounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollBreakdown {
    pub gross_salary: f64,
    pub taxable_income: f64,
    pub tax: f64,
    pub total_deductions: f64,
    pub net_salary: f64,
}

/// Fallback tax rate plus the structure used when an employee has no
/// compensation
#[derive(Debug, Clone)]
pub struct PayrollPolicy {
    /// Flat rate for countries the tenant has no brackets for
    pub tax_rate: f64,
    pub default_structure: SalaryStructure,
}

impl PayrollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tax_rate: config.payroll_tax_rate,
            default_structure: SalaryStructure {
                basic_salary: 75_000.0,
                allowances: vec![
                    allowance("HRA", 30_000.0, true),
                    allowance("Transport", 5_000.0, false),
                    allowance("Medical", 2_500.0, false),
                ],
                deductions: vec![deduction("PF", 9_000.0), deduction("Professional Tax", 200.0)],
                currency: config.payroll_currency.clone(),
                country: config.payroll_country.clone(),
            },
        }
    }

    /// Salary source: the employee's compensation, else request overrides,
    /// else the defaults. Currency falls back to the country's own before
    /// the configured default.
    pub fn resolve(&self, employee: &Employee, request: &PayrollCreate) -> SalaryStructure {
        let defaults = &self.default_structure;
        let country = request
            .country
            .as_deref()
            .map(|c| tax::find_country(c).map_or_else(|| c.trim().to_string(), |k| k.code.to_string()))
            .unwrap_or_else(|| defaults.country.clone());
        let fallback_currency = || {
            request
                .currency
                .clone()
                .or_else(|| tax::find_country(&country).map(|c| c.currency.to_string()))
                .unwrap_or_else(|| defaults.currency.clone())
        };

        if let Some(comp) = &employee.compensation {
            return SalaryStructure {
                basic_salary: comp.monthly_basic,
                allowances: comp.allowances.clone(),
                deductions: comp.deductions.clone(),
                currency: comp.currency.clone().unwrap_or_else(fallback_currency),
                country,
            };
        }

        SalaryStructure {
            basic_salary: request.basic_salary.unwrap_or(defaults.basic_salary),
            allowances: request
                .allowances
                .clone()
                .unwrap_or_else(|| defaults.allowances.clone()),
            deductions: request
                .deductions
                .clone()
                .unwrap_or_else(|| defaults.deductions.clone()),
            currency: fallback_currency(),
            country,
        }
    }

    /// Brackets for a country the tenant has not configured: the flat
    /// fallback rate
    pub fn default_rule(&self, country: &str) -> TaxRule {
        let known = tax::find_country(country);
        TaxRule {
            country: known.map_or_else(|| country.trim().to_string(), |c| c.code.to_string()),
            currency: known.map_or_else(
                || self.default_structure.currency.clone(),
                |c| c.currency.to_string(),
            ),
            brackets: tax::flat(self.tax_rate),
            is_default: true,
            updated_by: None,
            updated_at: None,
        }
    }

    pub fn compute(
        &self,
        structure: &SalaryStructure,
        brackets: &[TaxBracket],
    ) -> AppResult<PayrollBreakdown> {
        compute(
            structure.basic_salary,
            &structure.allowances,
            &structure.deductions,
            brackets,
        )
    }
}

fn allowance(name: &str, amount: f64, taxable: bool) -> Allowance {
    Allowance {
        name: name.to_string(),
        amount,
        taxable,
    }
}

fn deduction(name: &str, amount: f64) -> Deduction {
    Deduction {
        name: name.to_string(),
        amount,
    }
}

/// gross = basic + allowances; taxable = basic + taxable allowances;
/// tax = brackets over taxable (whole units); net = gross - (deductions + tax)
pub fn compute(
    basic_salary: f64,
    allowances: &[Allowance],
    deductions: &[Deduction],
    brackets: &[TaxBracket],
) -> AppResult<PayrollBreakdown> {
    require_amount(basic_salary, "basic_salary")?;
    for a in allowances {
        require_amount(a.amount, &format!("allowance '{}'", a.name))?;
    }
    for d in deductions {
        require_amount(d.amount, &format!("deduction '{}'", d.name))?;
    }

    let basic = to_decimal(basic_salary);
    let all_allowances: Decimal = allowances.iter().map(|a| to_decimal(a.amount)).sum();
    let taxable_allowances: Decimal = allowances
        .iter()
        .filter(|a| a.taxable)
        .map(|a| to_decimal(a.amount))
        .sum();
    let listed_deductions: Decimal = deductions.iter().map(|d| to_decimal(d.amount)).sum();

    let gross = basic + all_allowances;
    let taxable = basic + taxable_allowances;
    let tax = tax::progressive_tax(taxable, brackets)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let total_deductions = listed_deductions + tax;
    let net = gross - total_deductions;

    Ok(PayrollBreakdown {
        gross_salary: to_f64(gross),
        taxable_income: to_f64(taxable),
        tax: to_f64(tax),
        total_deductions: to_f64(total_deductions),
        net_salary: to_f64(net),
    })
}

/// draft -> processed -> paid; draft | processed -> cancelled
pub fn can_transition(from: PayrollStatus, to: PayrollStatus) -> bool {
    use PayrollStatus::*;
    matches!(
        (from, to),
        (Draft, Processed) | (Processed, Paid) | (Draft, Cancelled) | (Processed, Cancelled)
    )
}

/// Statuses a record may be in before moving to `to`
pub fn sources_of(to: PayrollStatus) -> Vec<PayrollStatus> {
    [
        PayrollStatus::Draft,
        PayrollStatus::Processed,
        PayrollStatus::Paid,
        PayrollStatus::Cancelled,
    ]
    .into_iter()
    .filter(|from| can_transition(*from, to))
    .collect()
}

pub fn validate_period(month: i32, year: i32) -> AppResult<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::with_message(
            ErrorCode::PayrollInvalidPeriod,
            format!("Month must be between 1 and 12, got {}", month),
        ));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::with_message(
            ErrorCode::PayrollInvalidPeriod,
            format!("Year must be between {} and {}, got {}", MIN_YEAR, MAX_YEAR, year),
        ));
    }
    Ok(())
}

/// New draft record for one employee and period
pub fn draft(
    employee: &Employee,
    month: i32,
    year: i32,
    structure: SalaryStructure,
    breakdown: PayrollBreakdown,
) -> Payroll {
    let now = now_millis();
    Payroll {
        id: snowflake_id(),
        tenant_id: employee.tenant_id.clone(),
        employee_id: employee.id,
        month,
        year,
        basic_salary: structure.basic_salary,
        allowances: structure.allowances,
        deductions: structure.deductions,
        gross_salary: breakdown.gross_salary,
        taxable_income: breakdown.taxable_income,
        tax: breakdown.tax,
        total_deductions: breakdown.total_deductions,
        net_salary: breakdown.net_salary,
        currency: structure.currency,
        country: structure.country,
        status: PayrollStatus::Draft,
        payment_date: None,
        payslip_url: None,
        processed_by: None,
        processed_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Payslip view of a record; amounts and currency are shown as stored
pub fn payslip(payroll: &Payroll, employee: &Employee) -> Payslip {
    let mut earnings = vec![PayslipLine {
        name: "Basic Salary".to_string(),
        amount: payroll.basic_salary,
    }];
    earnings.extend(payroll.allowances.iter().map(|a| PayslipLine {
        name: a.name.clone(),
        amount: a.amount,
    }));

    let mut deductions: Vec<PayslipLine> = payroll
        .deductions
        .iter()
        .map(|d| PayslipLine {
            name: d.name.clone(),
            amount: d.amount,
        })
        .collect();
    deductions.push(PayslipLine {
        name: "Income Tax".to_string(),
        amount: payroll.tax,
    });

    Payslip {
        payroll_id: payroll.id,
        employee: PayslipEmployee {
            id: employee.id,
            employee_code: employee.employee_code.clone(),
            name: employee.personal_info.full_name(),
            department: employee.company_info.department.clone(),
            designation: employee.company_info.designation.clone(),
        },
        month: payroll.month,
        year: payroll.year,
        earnings,
        deductions,
        gross_salary: payroll.gross_salary,
        taxable_income: payroll.taxable_income,
        tax: payroll.tax,
        total_deductions: payroll.total_deductions,
        net_salary: payroll.net_salary,
        currency: payroll.currency.clone(),
        country: payroll.country.clone(),
        status: payroll.status,
        payment_date: payroll.payment_date.clone(),
    }
}

#[cfg(test)]
mod tests;
