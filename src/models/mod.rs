pub mod booking;
pub mod seat;

pub use booking::{Booking, BookingWithSeat};
pub use seat::Seat;
