pub mod native;
pub mod store;

pub use native::NativeRuntime;
pub use store::{ParamError, ParamId, ParameterStore, RuntimeStatus};
