//! Output sinks for scraped listings.
//!
//! - [`text`]: merges `"<company> | <link>"` lines into a sorted flat file
//! - [`json`]: optional per-run snapshot including descriptions
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── github-scrape.txt
//! └── linkedIn-scrape.txt
//!
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── github.json
//!     └── linkedin.json
//! ```

pub mod json;
pub mod text;
