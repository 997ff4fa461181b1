#[cfg(test)]
mod mock;
mod unix;

#[cfg(test)]
pub use mock::{MockProcessManager, Reaction, Script};
pub use unix::UnixProcessManager;
