//! Quantum foam local simulator
//!
//! A [`Backend`](foam_hal::Backend) that samples the entangled-pair source
//! circuit on an exact two-qubit statevector, so the randomness service can
//! run end to end without a remote device.
//!
//! # Features
//!
//! - **Exact amplitudes**: sampling noise comes only from the finite shot count
//! - **Every basis**: Pauli, rotated and Bell-diagonal measurement settings
//! - **Simulated latency**: results stay `Pending` for a configurable delay
//!
//! # Example
//!
//! ```ignore
//! use foam_adapter_sim::SimulatorBackend;
//! use foam_hal::{Backend, Basis, PollPolicy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new();
//!
//!     let basis = Basis::parse("XY")?;
//!     let handle = backend.submit(&basis, 50).await?;
//!     let histogram = backend.wait(&handle, &PollPolicy::default()).await?;
//!
//!     println!("{} shots", histogram.total());
//!     Ok(())
//! }
//! ```

mod circuit;
mod simulator;
mod statevector;

pub use simulator::{SimulatorBackend, SimulatorConfig};
