pub mod builtin;
pub mod compiler;
pub mod dictionary;
pub mod exception;
pub mod host;
pub mod inner;
pub mod messages;
pub mod numeric;
pub mod outer;
