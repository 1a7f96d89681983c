mod clock;
mod limiter;
mod sweep;
pub use clock::*;
pub use limiter::*;
pub use sweep::*;
