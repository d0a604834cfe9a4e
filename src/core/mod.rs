pub mod request;
pub mod response;
pub mod sniff;

pub use request::{
    Body, CUSTOM_HOST_VARIABLE, DEFAULT_SERVER_ADDRESS, EventTranslator, RequestContext,
    RequestContextExt,
};
pub use response::{ResponseCapture, ResponseWriter};
