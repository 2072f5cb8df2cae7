mod notice_dto;

pub use notice_dto::{
    CreateNoticeDto, ListNoticesQuery, NoticeDetailDto, NoticeResponseDto, ReadReceiptDto,
    ReadStatusDto, UnreadCountDto, UpdateNoticeDto,
};
