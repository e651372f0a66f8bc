pub mod shift;

pub use shift::ShiftService;
