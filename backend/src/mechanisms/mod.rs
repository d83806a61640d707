//! Generational transition mechanisms
//!
//! Each mechanism is a set of pure functions over one generation's rows.
//! The orchestrator owns the trial state and calls them in order:
//!
//! ```text
//! For each generation t >= 1:
//! 1. income        earn_income + gain_income   (rows t-1 → row t, pre-tax)
//! 2. neighborhood  policy.assign + census      (uses pre-tax income of t)
//! 3. tax           collect_taxes               (row t becomes post-tax)
//! 4. human capital develop_human_capital       (row t → capital for t+1)
//! ```

pub mod human_capital;
pub mod income;
pub mod neighborhood;
pub mod tax;

pub use human_capital::{develop_human_capital, HumanCapitalUpdate, SkillFormation};
pub use income::{earn_income, gain_income, IncomeUpdate};
pub use neighborhood::{census, Census, NeighborhoodError, NeighborhoodPolicy};
pub use tax::{collect_taxes, TaxOutcome};
