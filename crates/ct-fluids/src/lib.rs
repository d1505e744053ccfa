//! ct-fluids: gas property service for trainflow.
//!
//! Provides:
//! - Natural gas species data (critical constants, ideal-gas cp)
//! - Composition handling (pure fluids and mixtures)
//! - Thermodynamic state representation
//! - `FluidModel` trait for property calculations
//! - `VirialGasModel`, a self-contained virial equation of state for mixtures
//! - `FluidStream`, the immutable stream passed between process units
//! - CoolProp backend for pure fluids (feature `coolprop`)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ct_fluids::{Composition, FluidStream, VirialGasModel};
//! use ct_core::units::{bara, k};
//!
//! let stream = FluidStream::create_stream_from_standard_rate(
//!     Arc::new(VirialGasModel::new()),
//!     Composition::dry_gas(),
//!     bara(30.0),
//!     k(300.0),
//!     1.0e6,
//! )
//! .unwrap();
//! assert!(stream.actual_rate() > 0.0);
//! ```

pub mod composition;
#[cfg(feature = "coolprop")]
pub mod coolprop;
pub mod error;
pub mod model;
pub mod species;
pub mod state;
pub mod stream;
pub mod virial;

pub use composition::Composition;
#[cfg(feature = "coolprop")]
pub use coolprop::CoolPropModel;
pub use error::{FluidError, FluidResult};
pub use model::{FluidModel, ThermoPropertyPack};
pub use species::Species;
pub use state::{SpecEnthalpy, StateInput, ThermoState};
pub use stream::FluidStream;
pub use virial::VirialGasModel;
