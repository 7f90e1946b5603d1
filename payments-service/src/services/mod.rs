pub mod razorpay;
pub mod repository;

pub use razorpay::{PaymentVerification, RazorpayClient};
pub use repository::PaymentsRepository;
