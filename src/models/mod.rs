pub mod job;
pub mod paper;
pub mod period;

pub use job::{Job, JobStatus};
pub use paper::{PaperIndex, PaperRecord};
pub use period::{now_stamp, today_key, Mode, PeriodKey};
