//! Run control for an external visualization consumer.
//!
//! The viewer never touches the simulator or its buffer layout: it issues
//! start/pause/single-step commands over a channel and reads pose
//! snapshots from a shared slot. The simulation itself runs on a
//! background thread that owns the Simulator exclusively.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use swarmsim_core::simulator::{SimulationState, Simulator};

/// Commands accepted by the simulation thread.
pub enum ControlCommand {
    /// Run continuously until paused.
    Start,
    /// Halt after the current step.
    Pause,
    /// Advance exactly one step while paused.
    Step,
    /// Stop the thread.
    Shutdown,
}

/// Handle to a simulation running on its own thread.
pub struct SimulationServer {
    command_tx: Sender<ControlCommand>,
    state: Arc<Mutex<SimulationState>>,
    thread: Option<JoinHandle<()>>,
}

impl SimulationServer {
    /// Initializes the worlds and parks the simulation paused, waiting
    /// for commands.
    #[must_use]
    pub fn launch(mut sim: Simulator, target_distance: f32, seed: u64) -> Self {
        sim.init_worlds(target_distance, seed);
        let (command_tx, command_rx) = mpsc::channel();
        let state = Arc::new(Mutex::new(sim.get_state()));
        let shared = Arc::clone(&state);
        let thread = thread::spawn(move || control_loop(sim, &command_rx, &shared));
        Self {
            command_tx,
            state,
            thread: Some(thread),
        }
    }

    pub fn start(&self) {
        let _ = self.command_tx.send(ControlCommand::Start);
    }

    pub fn pause(&self) {
        let _ = self.command_tx.send(ControlCommand::Pause);
    }

    pub fn step(&self) {
        let _ = self.command_tx.send(ControlCommand::Step);
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SimulationState {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Stops the simulation thread and waits for it to exit.
    pub fn shutdown(&mut self) {
        let _ = self.command_tx.send(ControlCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SimulationServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn control_loop(
    mut sim: Simulator,
    command_rx: &Receiver<ControlCommand>,
    state: &Arc<Mutex<SimulationState>>,
) {
    let mut running = false;
    loop {
        // Paused: block on the channel. Running: drain without blocking so
        // stepping continues between commands.
        let command = if running {
            match command_rx.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return,
            }
        } else {
            match command_rx.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            }
        };

        match command {
            Some(ControlCommand::Start) => running = true,
            Some(ControlCommand::Pause) => running = false,
            Some(ControlCommand::Step) => {
                sim.step();
                publish(state, &sim);
            }
            Some(ControlCommand::Shutdown) => return,
            None => {}
        }

        if running {
            sim.step();
            publish(state, &sim);
        }
    }
}

fn publish(state: &Arc<Mutex<SimulationState>>, sim: &Simulator) {
    *state.lock().unwrap_or_else(|e| e.into_inner()) = sim.get_state();
}
