/// Router Module Index
///
/// Splits the routing table by audience. Access control for the catalog is
/// applied per handler by the gate, because the series routes mix admin-only,
/// signed-in and ungated operations under one prefix.

/// Routes open to everyone: health check and the application root.
pub mod public;

/// The `/series` resource.
pub mod series;
