//! Position filters applied before alignments are written.
//!
//! * [`WindowFilter`] drops SNPs in dense clusters.
//! * [`FilterRegions`] drops curated positions per contig and group.
//! * [`remove_identical_calls`] drops columns shared by every strain.

mod identical;
mod regions;
mod window;

pub use identical::remove_identical_calls;
pub use regions::{parse_region, FilterRegions, FILTERED_REGIONS_DIR};
pub use window::{WindowFilter, DEFAULT_THRESHOLD, DEFAULT_WINDOW_SIZE};
