//! Source adapters: fetch, extract, and normalize every upstream source
//! into the shared envelope shape, plus the registry and batch refresh
//! that tie them to the report store.

mod ana;
mod business_hours;
mod error;
mod fields;
mod html;
mod nearest;
mod refresh;
mod registry;
mod tokaikisen;
mod typhoon;
mod umisora;
mod wave;
mod wind;

pub use ana::AnaSource;
pub use business_hours::BusinessHoursSource;
pub use error::SourceError;
pub use refresh::{refresh_all, refresh_all_with, RefreshOutcome};
pub use registry::{default_refresh_keys, run_source, SourceContext, SourceKey};
pub use tokaikisen::TokaikisenSource;
pub use typhoon::TyphoonSource;
pub use umisora::UmisoraSource;
pub use wave::WaveSource;
pub use wind::WindSource;
