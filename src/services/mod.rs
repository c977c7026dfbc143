pub mod booking_form;
pub mod booking_validation;
pub mod bookings;
pub mod calendar;
pub mod checkout;
pub mod due_date;
pub mod lifecycle;
pub mod occupancy;
pub mod proration;
