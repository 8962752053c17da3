pub mod encoder;
pub mod guard;
pub mod parser;
pub mod picture;
pub mod writer;
