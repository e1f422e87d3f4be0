//! Readers for sign descriptor documents.

pub mod descriptor;

pub use descriptor::{
    BackgroundDescriptor, BulbDescriptor, GroupDescriptor, ParseError, ParseResult,
    RejectedEntry, SignDescriptor,
};
