pub mod export;
pub mod input;
pub mod presenter;
pub mod session;
pub mod state;
pub mod tree;
