//! Console state pieces owned by `App`

pub mod clock;
pub mod execution;
pub mod output;
pub mod status;
pub mod tabs;

pub use clock::Clock;
pub use execution::{outcome_lines, SubmitControl};
pub use output::{LineKind, OutputLine, OutputLog, Viewport};
pub use status::{StatusPanel, StatusPoller, StatusSnapshot};
pub use tabs::Tab;
