//! The two wire messages this crate speaks: the diff request and the diff
//! response. Transport framing around them is the embedding application's
//! business.

pub mod message_sml;
