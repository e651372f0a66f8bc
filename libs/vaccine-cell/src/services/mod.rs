pub mod vaccine;

pub use vaccine::VaccineService;
