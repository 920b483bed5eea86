//! Amortizing loan with monthly debt service, aggregated per year.

/// Monthly annuity payment for a loan of `principal` at `annual_rate_pct`
/// over `term_years`.
///
/// A zero rate degenerates to straight division of the principal over the
/// number of payments.
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, term_years: u32) -> f64 {
    if principal <= 0.0 || term_years == 0 {
        return 0.0;
    }
    let n = f64::from(term_years * 12);
    let r = annual_rate_pct / 100.0 / 12.0;
    if r == 0.0 {
        principal / n
    } else {
        principal * r / (1.0 - (1.0 + r).powf(-n))
    }
}

/// Outstanding-balance tracker for an amortizing loan.
///
/// Debt is serviced monthly but reported per project year; the final
/// payment's principal portion is clamped to the remaining balance so the
/// loan closes exactly at zero.
#[derive(Debug, Clone)]
pub struct LoanSchedule {
    monthly_rate: f64,
    payment: f64,
    term_years: u32,
    balance: f64,
}

/// Interest and principal paid within one project year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebtService {
    pub interest: f64,
    pub principal: f64,
}

impl LoanSchedule {
    /// Creates a schedule for `amount` at `annual_rate_pct` over
    /// `term_years`. A non-positive amount yields an inert schedule that
    /// reports zero service every year.
    pub fn new(amount: f64, annual_rate_pct: f64, term_years: u32) -> Self {
        let amount = amount.max(0.0);
        Self {
            monthly_rate: annual_rate_pct / 100.0 / 12.0,
            payment: monthly_payment(amount, annual_rate_pct, term_years),
            term_years,
            balance: amount,
        }
    }

    /// Remaining principal.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Services twelve months of debt for project year `year` (1-based)
    /// and returns the interest and principal paid.
    pub fn year_service(&mut self, year: u32) -> DebtService {
        let mut service = DebtService::default();
        if year > self.term_years || self.balance <= 0.0 {
            return service;
        }
        for _ in 0..12 {
            if self.balance <= 0.0 {
                break;
            }
            let interest = self.balance * self.monthly_rate;
            let principal = (self.payment - interest).min(self.balance);
            self.balance -= principal;
            service.interest += interest;
            service.principal += principal;
        }
        service
    }
}
