pub mod guards;
pub mod router;
pub mod routes;

pub use router::{NylahState, nylah_router};
