pub mod agent;
pub mod analysis;
pub mod classifier;
pub mod flow;
pub mod generator;
pub mod policy;
pub mod provider;
pub mod question;
pub mod session;
pub mod speech;
