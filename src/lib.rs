//! Application layer for swarmsim: run control for external viewers and
//! generation history logging. The simulation and optimization engine
//! lives in `swarmsim_core`; the shared data types in `swarmsim_data`.

pub mod app;
