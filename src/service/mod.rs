// service/mod.rs

pub mod handler;

pub use self::handler::{QueryType, RequestHandler};
