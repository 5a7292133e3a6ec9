mod addr;
pub use addr::IpAddress;

mod error;
pub use error::{AddrError, AddrResult};

pub mod hash;

pub mod ipv4;

pub mod ipv6;
pub use ipv6::{AddrType, CidrNetworkV6};

mod mac;
pub use mac::MacAddress;

pub mod masks;
pub use masks::fetch_mask;

pub mod octets;
pub use octets::ByteArray16;
