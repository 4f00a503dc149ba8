pub mod error;
pub mod hashing;
pub mod links;
pub mod model;
pub mod parser;
pub mod scan_config;
pub mod scanner;
pub mod sync;
pub mod sync_state;

pub use error::SyncError;

pub use parser::{
    parse_markdown, ParsedDoc,
    frontmatter::{strip_frontmatter, Metadata},
    inline::segment,
};

pub use model::{Annotations, Block, Color, ImageSource, Span};

pub use links::{LinkIndex, LinkResolver};

pub use scan_config::ScanConfig;
pub use scanner::{ScanResult, Scanner};

pub use sync::{SyncOptions, SyncOutcome, SyncSummary, Synchronizer};
pub use sync_state::{FileEntry, JsonStateStore, StateStore, SyncState};
