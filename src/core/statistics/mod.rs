pub mod collector;
pub mod precision;
pub mod sink;

pub use collector::{
    FinalReport, IntervalSample, ServerReport, SourceReport, SourceStatistics, StatisticsCollector, StatsSnapshot,
};
pub use precision::{required_iterations, PrecisionTarget};
pub use sink::{NullSink, StatisticsSink};
