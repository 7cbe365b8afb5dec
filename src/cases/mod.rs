pub mod caselist;
pub mod pairing;
