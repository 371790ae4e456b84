//! phototidy - sort photo and video collections by type and date
//!
//! Files sharing a name up to the first dot (a photo, its RAW and its edits)
//! form a group. Each group gets one type and one date, taken from EXIF
//! capture time where available, and all of its files move together into
//! `<Type>/<YYYY-MM-DD>/`.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_info;
pub mod file_organizer;
pub mod grouping;
pub mod logging;
pub mod metadata;
pub mod output;
pub mod planner;
pub mod progress;
pub mod reducer;
pub mod scanner;

pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use error::{ExtractError, MoveError, OrganizeError, OrganizeResult};
pub use file_category::{Category, FileMapper};
pub use file_info::FileDescriptor;
pub use file_organizer::{FileOrganizer, MoveReport};
pub use grouping::Group;
pub use planner::{DestinationPlan, PlanEntry};
pub use reducer::GroupVerdict;

pub use cli::{OrganizeCommand, RunOptions, build_plan, run_cli};
