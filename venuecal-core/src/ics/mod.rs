//! ICS boundary: conversion between canonical records and iCalendar.
//!
//! The engine owns no wire format; this module converts to and from the
//! `icalendar` crate's representation at the edges of the data flow.

mod generate;
mod parse;

pub use generate::generate_calendar;
pub use parse::parse_records;
