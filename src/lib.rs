pub mod autopilot;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ghost;
pub mod high_score_store;
pub mod maze;
pub mod movement;
pub mod pathfinding;
pub mod phase;
pub mod player;
pub mod rng;
pub mod server_protocol;
pub mod types;
