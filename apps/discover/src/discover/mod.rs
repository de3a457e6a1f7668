// Discovery pipeline: context loading, term mixing, and paged marketplace search.
// The pipeline never writes goods; saving is a separate lifecycle call.

pub mod handle;
pub mod handlers;
pub mod session;
