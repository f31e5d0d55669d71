pub mod consumer;
pub mod observer;

pub use consumer::OrderConsumer;
pub use observer::StreamObserver;
