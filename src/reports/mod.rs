// Reports module - read-only views derived from the transaction history

pub mod dashboard;

pub use dashboard::{
    build_dashboard, category_allocation, class_allocation, value_positions, DashboardSummary,
    PositionRow, ValuedPosition,
};
