use std::{fmt, ops::AddAssign};

use serde::{Deserialize, Serialize};

/// Closed set of customer categories encoded in customer codes and payment
/// external ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Residential,
    Commercial,
    Industrial,
    #[serde(rename = "Public Facility")]
    PublicFacility,
    Other,
}

impl CustomerType {
    pub const ALL: [CustomerType; 5] = [
        CustomerType::Residential,
        CustomerType::Commercial,
        CustomerType::Industrial,
        CustomerType::PublicFacility,
        CustomerType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::Industrial => "Industrial",
            Self::PublicFacility => "Public Facility",
            Self::Other => "Other",
        }
    }

    /// Exact, case-sensitive match against the tag stored in the data.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per known customer type. Every type is always present, so a
/// freshly created breakdown is the zero-filled response shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerTypeBreakdown<T> {
    #[serde(rename = "Residential")]
    pub residential: T,
    #[serde(rename = "Commercial")]
    pub commercial: T,
    #[serde(rename = "Industrial")]
    pub industrial: T,
    #[serde(rename = "Public Facility")]
    pub public_facility: T,
    #[serde(rename = "Other")]
    pub other: T,
}

impl<T: Copy + Default + AddAssign> CustomerTypeBreakdown<T> {
    pub fn get(&self, customer_type: CustomerType) -> T {
        match customer_type {
            CustomerType::Residential => self.residential,
            CustomerType::Commercial => self.commercial,
            CustomerType::Industrial => self.industrial,
            CustomerType::PublicFacility => self.public_facility,
            CustomerType::Other => self.other,
        }
    }

    pub fn add(&mut self, customer_type: CustomerType, value: T) {
        let slot = match customer_type {
            CustomerType::Residential => &mut self.residential,
            CustomerType::Commercial => &mut self.commercial,
            CustomerType::Industrial => &mut self.industrial,
            CustomerType::PublicFacility => &mut self.public_facility,
            CustomerType::Other => &mut self.other,
        };
        *slot += value;
    }

    pub fn entries(&self) -> [(CustomerType, T); 5] {
        CustomerType::ALL.map(|t| (t, self.get(t)))
    }

    pub fn sum(&self) -> T {
        let mut total = T::default();
        for (_, value) in self.entries() {
            total += value;
        }
        total
    }

    pub fn merge(&mut self, other: &Self) {
        for (t, value) in other.entries() {
            self.add(t, value);
        }
    }
}

/// Whether rows whose type tag is missing or outside [`CustomerType::ALL`]
/// still count toward grand totals. They never get a bucket of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedTypePolicy {
    #[default]
    Include,
    Exclude,
}

/// Folds grouped `(tag, value)` rows into a zero-filled breakdown plus a
/// grand total governed by an [`UnrecognizedTypePolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTally<T> {
    pub by_type: CustomerTypeBreakdown<T>,
    pub total: T,
    pub unrecognized_rows: usize,
    policy: UnrecognizedTypePolicy,
}

impl<T: Copy + Default + AddAssign> TypeTally<T> {
    pub fn new(policy: UnrecognizedTypePolicy) -> Self {
        Self {
            by_type: CustomerTypeBreakdown::default(),
            total: T::default(),
            unrecognized_rows: 0,
            policy,
        }
    }

    pub fn record(&mut self, tag: Option<&str>, value: T) {
        match tag.and_then(CustomerType::from_tag) {
            Some(customer_type) => {
                self.by_type.add(customer_type, value);
                self.total += value;
            }
            None => {
                self.unrecognized_rows += 1;
                if self.policy == UnrecognizedTypePolicy::Include {
                    self.total += value;
                }
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.by_type.merge(&other.by_type);
        self.total += other.total;
        self.unrecognized_rows += other.unrecognized_rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_exactly() {
        assert_eq!(CustomerType::from_tag("Public Facility"), Some(CustomerType::PublicFacility));
        assert_eq!(CustomerType::from_tag("residential"), None);
        assert_eq!(CustomerType::from_tag(""), None);
    }

    #[test]
    fn breakdown_serializes_every_type_with_display_names() {
        let mut breakdown = CustomerTypeBreakdown::<u64>::default();
        breakdown.add(CustomerType::Commercial, 3);

        let json = serde_json::to_value(breakdown).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Residential": 0,
                "Commercial": 3,
                "Industrial": 0,
                "Public Facility": 0,
                "Other": 0
            })
        );
    }

    #[test]
    fn include_policy_counts_unknown_tags_in_total_only() {
        let mut tally = TypeTally::<u64>::new(UnrecognizedTypePolicy::Include);
        tally.record(Some("Residential"), 4);
        tally.record(Some("Agricultural"), 2);
        tally.record(None, 1);

        assert_eq!(tally.by_type.residential, 4);
        assert_eq!(tally.by_type.sum(), 4);
        assert_eq!(tally.total, 7);
        assert_eq!(tally.unrecognized_rows, 2);
    }

    #[test]
    fn exclude_policy_keeps_total_equal_to_buckets() {
        let mut tally = TypeTally::<f64>::new(UnrecognizedTypePolicy::Exclude);
        tally.record(Some("Industrial"), 10.5);
        tally.record(Some("Agricultural"), 2.0);

        assert_eq!(tally.total, 10.5);
        assert_eq!(tally.total, tally.by_type.sum());
    }

    #[test]
    fn policy_parses_from_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: UnrecognizedTypePolicy,
        }
        let w: Wrapper = serde_json::from_str(r#"{"policy":"exclude"}"#).unwrap();
        assert_eq!(w.policy, UnrecognizedTypePolicy::Exclude);
    }
}
