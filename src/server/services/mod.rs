pub mod origin_services;
pub mod relay_services;

pub use origin_services::DynOriginService;
