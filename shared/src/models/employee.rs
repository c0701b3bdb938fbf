//! Employee Model

use serde::{Deserialize, Serialize};

use super::payroll::{Allowance, Deduction};
use super::user::Role;

/// Employment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    Terminated,
    Absconded,
    OnLeave,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Intern,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub department: String,
    pub designation: String,
    #[serde(default)]
    pub date_of_joining: Option<String>,
    #[serde(default)]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub work_location: Option<String>,
    #[serde(default)]
    pub shift: Option<String>,
    #[serde(default)]
    pub probation_period_months: u32,
    #[serde(default)]
    pub confirmation_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankInfo {
    pub bank_name: String,
    pub account_number: String,
    pub routing_number: String,
    pub account_type: String,
    pub ifsc_code: Option<String>,
    pub swift_code: Option<String>,
}

/// Per-employee salary structure used by payroll generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    #[serde(default)]
    pub annual_ctc: f64,
    /// Monthly basic salary
    pub monthly_basic: f64,
    #[serde(default)]
    pub allowances: Vec<Allowance>,
    #[serde(default)]
    pub deductions: Vec<Deduction>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub url: String,
    pub uploaded_at: i64,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Qualification {
    pub degree: String,
    pub institution: String,
    pub year: Option<i32>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviousEmployment {
    pub company: String,
    pub designation: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,
    pub tenant_id: String,
    pub employee_code: String,
    pub user_id: Option<i64>,
    /// Reporting manager (employee id)
    pub manager_id: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub personal_info: PersonalInfo,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub company_info: CompanyInfo,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub bank_info: BankInfo,
    #[cfg_attr(feature = "db", sqlx(json(nullable)))]
    pub compensation: Option<Compensation>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub documents: Vec<EmployeeDocument>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub qualifications: Vec<Qualification>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub previous_employment: Vec<PreviousEmployment>,
    pub status: EmployeeStatus,
    pub onboarding_step: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Login account created together with an employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeAccount {
    pub password: String,
    pub role: Option<Role>,
}

/// Create employee payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub employee_code: String,
    pub manager_id: Option<i64>,
    pub personal_info: PersonalInfo,
    pub company_info: CompanyInfo,
    #[serde(default)]
    pub bank_info: BankInfo,
    pub compensation: Option<Compensation>,
    #[serde(default)]
    pub qualifications: Vec<Qualification>,
    #[serde(default)]
    pub previous_employment: Vec<PreviousEmployment>,
    pub status: Option<EmployeeStatus>,
    /// When present a user account is created in the same transaction
    pub account: Option<EmployeeAccount>,
}

/// Update employee payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    pub employee_code: Option<String>,
    pub manager_id: Option<i64>,
    pub personal_info: Option<PersonalInfo>,
    pub company_info: Option<CompanyInfo>,
    pub bank_info: Option<BankInfo>,
    pub compensation: Option<Compensation>,
    pub qualifications: Option<Vec<Qualification>>,
    pub previous_employment: Option<Vec<PreviousEmployment>>,
    pub status: Option<EmployeeStatus>,
    pub onboarding_step: Option<i64>,
}

impl EmployeeUpdate {
    /// True when anything other than `personal_info` is set
    pub fn touches_restricted_fields(&self) -> bool {
        self.employee_code.is_some()
            || self.manager_id.is_some()
            || self.company_info.is_some()
            || self.bank_info.is_some()
            || self.compensation.is_some()
            || self.qualifications.is_some()
            || self.previous_employment.is_some()
            || self.status.is_some()
            || self.onboarding_step.is_some()
    }
}

/// Add document payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDocumentCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub url: String,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

/// Result of `DELETE /api/employees/{id}`; exactly one flag is set
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmployeeRemoval {
    pub id: i64,
    pub deleted: bool,
    pub terminated: bool,
}

/// Headcount summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub on_leave: i64,
    pub departments: Vec<DepartmentCount>,
}
