//! Output guarantees checked on every query result before it is serialized.

use utility_client::{
    db::{
        customer_queries::CustomerCount,
        energy_queries::{
            DailyEnergyReport, MonthlyEnergyReport, TopConsumer, YearlyEnergyReport,
            TOP_CONSUMERS_LIMIT,
        },
        payment_queries::{PaymentTotal, YearlyPaymentTotals},
        utility_queries::UtilityInfo,
    },
    domain::{CustomerTypeBreakdown, YearPeriod, HOURS},
};

use super::args::{Issue, IssueCode, PathSegment, ValidationError};

pub trait ResponseContract {
    fn issues(&self) -> Vec<Issue>;

    fn check(&self) -> Result<(), ValidationError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<Issue>,
}

impl Checker {
    fn fail(&mut self, path: Vec<PathSegment>, message: impl Into<String>) {
        self.issues.push(Issue::new(IssueCode::Custom, path, message));
    }

    fn finite(&mut self, path: Vec<PathSegment>, value: f64) {
        if !value.is_finite() {
            self.fail(path, "Expected finite number");
        }
    }

    fn energy(&mut self, path: Vec<PathSegment>, value: f64) {
        if !value.is_finite() {
            self.fail(path, "Expected finite number");
        } else if value < 0.0 {
            self.fail(path, "Number must be greater than or equal to 0");
        }
    }

    fn breakdown(&mut self, base: &[PathSegment], by_type: &CustomerTypeBreakdown<f64>) {
        for (customer_type, value) in by_type.entries() {
            self.energy(at(base, &[customer_type.as_str().into()]), value);
        }
    }

    fn top_consumers(&mut self, consumers: &[TopConsumer]) {
        if consumers.len() > TOP_CONSUMERS_LIMIT {
            self.fail(
                vec!["topConsumers".into()],
                format!("Array must contain at most {TOP_CONSUMERS_LIMIT} element(s)"),
            );
        }
        for (i, consumer) in consumers.iter().enumerate() {
            self.energy(at(&[], &["topConsumers".into(), i.into(), "totalKWh".into()]), consumer.total_kwh);
        }
        if consumers.windows(2).any(|w| w[1].total_kwh > w[0].total_kwh) {
            self.fail(vec!["topConsumers".into()], "Consumers must be ordered by totalKWh descending");
        }
    }

    fn twelve_months<'a>(&mut self, year: &YearPeriod, labels: impl ExactSizeIterator<Item = &'a str>) {
        if labels.len() != 12 {
            self.fail(vec!["months".into()], "Array must contain exactly 12 element(s)");
            return;
        }
        for ((i, label), expected) in labels.enumerate().zip(year.months()) {
            if label != expected.to_string() {
                self.fail(
                    vec!["months".into(), i.into(), "month".into()],
                    format!("Expected '{expected}', received '{label}'"),
                );
            }
        }
    }
}

fn at(base: &[PathSegment], rest: &[PathSegment]) -> Vec<PathSegment> {
    base.iter().chain(rest).cloned().collect()
}

impl ResponseContract for UtilityInfo {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        if self.name.is_empty() {
            c.fail(vec!["name".into()], "Required");
        }
        if let Some(kw) = self.total_installed_capacity_kw {
            c.finite(vec!["totalInstalledCapacitykW".into()], kw);
        }
        for (i, component) in self.system_components.iter().enumerate() {
            c.finite(vec!["systemComponents".into(), i.into(), "capacity".into()], component.capacity);
        }
        c.issues
    }
}

impl ResponseContract for CustomerCount {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        let bucketed = self.customer_type.sum();
        if self.total_customers < bucketed {
            c.fail(
                vec!["totalCustomers".into()],
                format!("Total {} is below the per-type sum {bucketed}", self.total_customers),
            );
        }
        if let Some(utility) = &self.utility {
            for mut issue in utility.issues() {
                issue.path.insert(0, "utility".into());
                c.issues.push(issue);
            }
        }
        c.issues
    }
}

impl ResponseContract for Vec<PaymentTotal> {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        for (i, total) in self.iter().enumerate() {
            c.finite(vec![i.into(), "totalAmount".into()], total.total_amount);
            c.finite(vec![i.into(), "totalKWh".into()], total.total_kwh);
        }
        c.issues
    }
}

impl ResponseContract for YearlyPaymentTotals {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        c.finite(vec!["totalAmount".into()], self.total_amount);
        c.finite(vec!["totalKWh".into()], self.total_kwh);
        match self.year.parse::<YearPeriod>() {
            Ok(year) => c.twelve_months(&year, self.months.iter().map(|m| m.month.as_str())),
            Err(_) => c.fail(vec!["year".into()], "Year must be in the format YYYY"),
        }
        for (i, month) in self.months.iter().enumerate() {
            c.finite(vec!["months".into(), i.into(), "totalAmount".into()], month.total_amount);
            c.finite(vec!["months".into(), i.into(), "totalKWh".into()], month.total_kwh);
        }
        c.issues
    }
}

impl ResponseContract for DailyEnergyReport {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        c.energy(vec!["totalKWh".into()], self.total_kwh);
        c.breakdown(&["consumptionByCustomerType".into()], &self.consumption_by_customer_type);
        if self.hourly_consumption.len() != HOURS.len() {
            c.fail(vec!["hourlyConsumption".into()], "Array must contain exactly 24 element(s)");
        }
        for (i, (slot, hour)) in self.hourly_consumption.iter().zip(HOURS).enumerate() {
            if slot.hour != hour {
                c.fail(
                    vec!["hourlyConsumption".into(), i.into(), "hour".into()],
                    format!("Expected '{hour}', received '{}'", slot.hour),
                );
            }
            c.energy(vec!["hourlyConsumption".into(), i.into(), "energyKWh".into()], slot.energy_kwh);
        }
        c.issues
    }
}

impl ResponseContract for MonthlyEnergyReport {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        c.energy(vec!["totalKWh".into()], self.total_kwh);
        c.breakdown(&["consumptionByCustomerType".into()], &self.consumption_by_customer_type);
        c.top_consumers(&self.top_consumers);
        c.issues
    }
}

impl ResponseContract for YearlyEnergyReport {
    fn issues(&self) -> Vec<Issue> {
        let mut c = Checker::default();
        c.energy(vec!["totalKWh".into()], self.total_kwh);
        c.breakdown(&["consumptionByCustomerType".into()], &self.consumption_by_customer_type);
        match self.year.parse::<YearPeriod>() {
            Ok(year) => c.twelve_months(&year, self.months.iter().map(|m| m.month.as_str())),
            Err(_) => c.fail(vec!["year".into()], "Year must be in the format YYYY"),
        }
        for (i, month) in self.months.iter().enumerate() {
            let base = [PathSegment::from("months"), i.into()];
            c.energy(at(&base, &["totalKWh".into()]), month.total_kwh);
            c.breakdown(
                &at(&base, &["consumptionByCustomerType".into()]),
                &month.consumption_by_customer_type,
            );
        }
        c.top_consumers(&self.top_consumers);
        c.issues
    }
}
