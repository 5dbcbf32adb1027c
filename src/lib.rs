pub mod case;
pub mod config;
pub mod forwarder;
pub mod peer;
pub mod queue;
pub mod subprocess;
pub mod wire;

#[cfg(test)]
mod test;
