pub mod base;
pub mod configs;
pub mod openrouter;
pub mod sse;

#[cfg(test)]
pub mod mock;
