//! Order lifecycle: checkout, owner-scoped reads, and admin status changes.
//!
//! Domain types and rules live in `order`; `store` is the persistence port;
//! `service` is the use-case layer the HTTP handlers call.

pub mod error;
pub mod events;
pub mod invoice;
pub mod order;
pub mod payment;
pub mod service;
pub mod store;

pub use error::OrderError;
pub use events::{OrderEvent, OrderPlaced, OrderStatusChanged};
pub use invoice::{Invoice, InvoiceLine};
pub use order::{
    Address, LineItem, NewOrder, Order, OrderStatus, TrackingEvent, TrackingInfo, TransitionPolicy, compute_total,
};
pub use payment::{
    CASH_ON_DELIVERY, Capture, CaptureRequest, CaptureSummary, PaymentDetails, PaymentError, PaymentGateway,
    SimulatedPaymentGateway, is_cash_on_delivery,
};
pub use service::{OrderService, PlaceOrder, SetTracking, UpdateStatus};
pub use store::{InMemoryOrderStore, OrderStore};
