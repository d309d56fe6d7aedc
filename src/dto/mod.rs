pub mod candidate_dto;
pub mod offer_dto;
