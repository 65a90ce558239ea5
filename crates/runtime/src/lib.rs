pub mod debounce;
pub mod frame;
pub mod timer;
pub mod tween;

pub use debounce::*;
pub use frame::*;
pub use timer::*;
pub use tween::*;
