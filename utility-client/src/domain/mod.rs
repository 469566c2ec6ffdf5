pub mod customer;
pub mod customer_type;
pub mod energy;
pub mod meter;
pub mod payment;
pub mod period;
pub mod utility;

pub use customer::{BalanceCredit, Customer, MonetaryValue};
pub use customer_type::{CustomerType, CustomerTypeBreakdown, TypeTally, UnrecognizedTypePolicy};
pub use energy::{DailyEnergySummary, HourlyEnergyReading, HOURS};
pub use meter::{Coordinates, Meter, MeterPhase, OperatingMode};
pub use payment::{MonetaryAmount, Payment, PaymentStatus};
pub use period::{DayPeriod, MonthPeriod, PeriodError, YearPeriod};
pub use utility::{Location, PopulationServed, SystemComponent, SystemType, Utility};
