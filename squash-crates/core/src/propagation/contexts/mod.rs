mod propagation_context;

pub use propagation_context::PropagationContext;
