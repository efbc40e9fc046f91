pub mod buffer;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod event_calendar;
pub mod execution;
pub mod job;
pub mod sampler;
pub mod server;
pub mod simulation_engine;
pub mod statistics;
pub mod types;

#[cfg(test)]
mod tests;
