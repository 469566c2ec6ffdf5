//! Accepted inputs and guaranteed outputs of every tool.

pub mod args;
pub mod requests;
pub mod responses;

pub use args::{parse_args, Issue, IssueCode, PathSegment, ValidationError};
pub use requests::{
    CustomersCountRequest, UtilityDayRequest, UtilityMonthRequest, UtilityRequest,
    UtilityYearRequest,
};
pub use responses::ResponseContract;
