// SQLite module - a `Driver` backed by rusqlite
//
// - params: conversion between handle values and SQLite values
// - query: result extraction into buffered rows
// - driver: the `Driver` implementation

pub mod driver;
pub mod params;
pub mod query;

pub use driver::SqliteDriver;
pub use query::build_raw_result;
