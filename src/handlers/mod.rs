// handlers/mod.rs
//
// duties: the /api/duties resource
// system: service info and health probes
pub mod duties;
pub mod system;
