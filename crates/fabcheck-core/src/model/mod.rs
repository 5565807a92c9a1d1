pub mod device;
pub mod mac;
pub mod port;

pub use device::{Device, DeviceRole, Host};
pub use mac::{MacAddress, MacParseError};
pub use port::{Nos, Port};
