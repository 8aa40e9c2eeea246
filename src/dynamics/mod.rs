//! Simulation dynamics: force generators, integration and contact resolution.

pub mod forces;
pub mod integrator;
pub mod solver;

pub use forces::{
    AnchoredBungeeForce, AnchoredFakeStiffSpringForce, AnchoredSpringForce, BungeeForce, DragForce,
    FakeStiffSpringForce, ForceGenerator, ForceGeneratorId, ForceRegistry, GravityForce, ParticleForce,
    SpringForce,
};
pub use integrator::Integrator;
pub use solver::{ContactResolver, ResolverStepMetrics};
