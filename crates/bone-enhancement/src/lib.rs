//! Umbrella crate for the bone enhancement workspace.
//!
//! Re-exports the volume types, the preprocessing and Hessian stages and the
//! enhancement measures, so a pipeline can be written against one crate:
//!
//! ```no_run
//! use bone_enhancement::{
//!     KrcahConfig, KrcahMeasure, MultiScaleConfig, Polarity, PreprocessConfig, Volume, Dims3,
//!     enhance_multiscale, krcah_preprocess,
//! };
//!
//! # fn main() -> Result<(), bone_enhancement::Error> {
//! let ct = Volume::new_fill(Dims3::new(32, 32, 32), 0.0f64);
//! let sharpened = krcah_preprocess(&ct, &PreprocessConfig::default())?;
//! let measure = KrcahMeasure::new(KrcahConfig {
//!     polarity: Polarity::Dark,
//!     ..KrcahConfig::default()
//! })?;
//! let cfg = MultiScaleConfig {
//!     sigmas: vec![0.75, 1.0],
//!     ..MultiScaleConfig::default()
//! };
//! let out = enhance_multiscale(&sharpened, &measure, None, &cfg)?;
//! for scale in &out.scales {
//!     println!("sigma {} alpha {}", scale.sigma, scale.functor.params().alpha());
//! }
//! # Ok(())
//! # }
//! ```

pub use be_core::*;
pub use be_filter::*;
pub use be_hessian::*;
pub use be_measure::*;
