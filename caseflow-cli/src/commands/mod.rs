pub mod ping;
pub mod scan;
pub mod sync;
pub mod trigger;
