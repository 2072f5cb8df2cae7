pub mod authorization;
mod notice_service;
pub mod visibility;

pub use notice_service::NoticeService;
