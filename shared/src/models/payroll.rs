//! Payroll Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PayrollStatus {
    #[default]
    Draft,
    Processed,
    Paid,
    Cancelled,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "draft",
            PayrollStatus::Processed => "processed",
            PayrollStatus::Paid => "paid",
            PayrollStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allowance {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub taxable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    pub name: String,
    pub amount: f64,
}

/// Monthly payroll record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payroll {
    pub id: i64,
    pub tenant_id: String,
    pub employee_id: i64,
    pub month: i32,
    pub year: i32,
    pub basic_salary: f64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub allowances: Vec<Allowance>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub deductions: Vec<Deduction>,
    pub gross_salary: f64,
    pub taxable_income: f64,
    pub tax: f64,
    /// Deductions plus tax
    pub total_deductions: f64,
    pub net_salary: f64,
    pub currency: String,
    pub country: String,
    pub status: PayrollStatus,
    pub payment_date: Option<String>,
    pub payslip_url: Option<String>,
    pub processed_by: Option<i64>,
    pub processed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Generate payroll for one employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollCreate {
    pub employee_id: i64,
    pub month: i32,
    pub year: i32,
    pub basic_salary: Option<f64>,
    pub allowances: Option<Vec<Allowance>>,
    pub deductions: Option<Vec<Deduction>>,
    pub currency: Option<String>,
    pub country: Option<String>,
}

/// Generate payroll for every active employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPayrollRequest {
    pub month: i32,
    pub year: i32,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkItemStatus {
    Created,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPayrollItem {
    pub employee_id: i64,
    pub employee_code: String,
    pub status: BulkItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payroll_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Per-employee outcome of a bulk run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPayrollReport {
    pub month: i32,
    pub year: i32,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<BulkPayrollItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    /// Defaults to today (business date)
    pub payment_date: Option<String>,
}

/// Totals for one currency; amounts are never converted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CurrencyTotals {
    pub currency: String,
    pub count: i64,
    pub total_gross: f64,
    pub total_tax: f64,
    pub total_deductions: f64,
    pub total_net: f64,
    pub average_gross: f64,
    pub average_net: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollStatusCounts {
    pub draft: i64,
    pub processed: i64,
    pub paid: i64,
    pub cancelled: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollStats {
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub by_currency: Vec<CurrencyTotals>,
    pub status_counts: PayrollStatusCounts,
    /// Current active headcount, not limited to the period
    pub active_employees: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipLine {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipEmployee {
    pub id: i64,
    pub employee_code: String,
    pub name: String,
    pub department: String,
    pub designation: String,
}

/// Rendered payslip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payslip {
    pub payroll_id: i64,
    pub employee: PayslipEmployee,
    pub month: i32,
    pub year: i32,
    pub earnings: Vec<PayslipLine>,
    pub deductions: Vec<PayslipLine>,
    pub gross_salary: f64,
    pub taxable_income: f64,
    pub tax: f64,
    pub total_deductions: f64,
    pub net_salary: f64,
    pub currency: String,
    pub country: String,
    pub status: PayrollStatus,
    pub payment_date: Option<String>,
}

/// One progressive band; `max: None` means no upper bound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min: f64,
    pub max: Option<f64>,
    /// Fraction, e.g. 0.2 for 20%
    pub rate: f64,
}

/// Tax brackets applied to one country's payroll in a tenant
///
/// Bracket bounds are per pay period, matched against monthly taxable
/// income.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TaxRule {
    pub country: String,
    pub currency: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub brackets: Vec<TaxBracket>,
    /// Set when the tenant has not stored its own brackets yet
    #[cfg_attr(feature = "db", sqlx(default))]
    pub is_default: bool,
    pub updated_by: Option<i64>,
    pub updated_at: Option<i64>,
}

/// PUT /api/payroll/tax-rules/{country}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRuleUpdate {
    pub currency: Option<String>,
    pub brackets: Vec<TaxBracket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedCountry {
    pub code: &'static str,
    pub name: &'static str,
    pub currency: &'static str,
}
