mod payment_gateway;
mod payment_orchestrator;

pub use payment_gateway::PaymentGateway;
pub use payment_orchestrator::PaymentOrchestrator;
