pub mod breakdown;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod resolver;
pub mod schedule;
pub mod scholarship;
pub mod service;
pub mod transactions;
pub mod types;

// re-export key types
pub use breakdown::{
    count_installments, Adjustments, BreakdownCalculator, InstallmentCounts, ItemBreakdown,
    OverallSummary, PaymentBreakdown, ReconciliationIssue, SemesterBreakdown,
};
pub use config::{FeeStructure, FeeStructureBuilder, FeeStructureRecord, SchedulePolicy};
pub use decimal::{Money, Rate};
pub use errors::{FeeError, Result};
pub use events::{Event, EventStore};
pub use resolver::{FeeRepository, FeeStructureResolver, InMemoryFeeRepository};
pub use schedule::{
    from_plan_specific_json, to_plan_specific_json, FlatScheduleDates, PaymentSchedule,
    ScheduleDateOverride, ScheduleGenerator, ScheduleItem,
};
pub use scholarship::Scholarship;
pub use service::{BreakdownRequest, FeeScheduleService};
pub use transactions::{PaymentMethod, PaymentTransaction, TransactionStatus};
pub use types::{
    CohortId, ItemKey, PaymentPlan, PaymentStatus, ScholarshipId, StudentId, TransactionId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
