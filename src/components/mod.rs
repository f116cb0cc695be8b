pub mod backends;
pub mod bounds;
pub mod engine;
pub mod grid;
pub mod profile;
pub mod resample;
pub mod sink;
pub mod source;
pub mod transforms;
pub mod validation;
pub mod window;

pub use bounds::{GeoBounds, PixelWindow};
pub use engine::{BlockReport, LogObserver, MergeObserver, MergeSummary, Merger};
pub use grid::{DestinationGrid, MergeOptions, Resolution};
pub use profile::{OutputProfile, ProfileOverrides, SourceProfile};
pub use sink::{RasterDriver, RasterSink};
pub use source::RasterSource;
pub use transforms::{GeoTransform, RoundOp};
pub use window::ReadStrategy;

use num::{Num, NumCast};
use std::fmt::Debug;

/// Pixel sample type of a raster.
pub trait DataType: Num + NumCast + Copy + PartialOrd + Send + Sync + Debug + 'static {
    /// Name used in profiles, e.g. `uint8`.
    const NAME: &'static str;

    fn to_sample(self) -> f64;

    /// Integers are rounded and saturated.
    fn from_sample(sample: f64) -> Self;
}

macro_rules! integer_data_type {
    ($($t:ty => $name:literal),*) => {
        $(impl DataType for $t {
            const NAME: &'static str = $name;
            fn to_sample(self) -> f64 {
                self as f64
            }
            fn from_sample(sample: f64) -> Self {
                sample.round() as $t
            }
        })*
    };
}

macro_rules! float_data_type {
    ($($t:ty => $name:literal),*) => {
        $(impl DataType for $t {
            const NAME: &'static str = $name;
            fn to_sample(self) -> f64 {
                self as f64
            }
            fn from_sample(sample: f64) -> Self {
                sample as $t
            }
        })*
    };
}

integer_data_type!(u8 => "uint8", u16 => "uint16", i16 => "int16", u32 => "uint32", i32 => "int32");
float_data_type!(f32 => "float32", f64 => "float64");
