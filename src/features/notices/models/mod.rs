mod notice;
mod notice_read;
mod target;

pub use notice::{NewNotice, Notice, NoticeChanges};
pub use notice_read::NoticeRead;
pub use target::{NoticeTarget, TargetType};
