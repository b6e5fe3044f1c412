/// Run/pause/single-step control surface for an external viewer
pub mod control;
/// Newline-delimited JSON log of optimization generations
pub mod history;
